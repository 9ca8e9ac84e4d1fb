pub mod controllers;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod infrastructure;
