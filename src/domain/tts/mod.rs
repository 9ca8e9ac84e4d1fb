pub mod cost;
pub mod language;
pub mod segmenter;
pub mod voices;

pub use cost::weighted_cost;
pub use language::{classify, normalize_language, LanguageClass, HIGH_RESOURCE_LANGUAGES};
pub use segmenter::Segmenter;
pub use voices::Voice;
