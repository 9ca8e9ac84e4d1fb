pub mod dispatcher;
pub mod executor;

pub use dispatcher::{Dispatcher, Route};
pub use executor::JobExecutor;
