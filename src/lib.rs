pub mod config;
pub mod models;
pub mod processing;
pub mod utils;
pub mod passport_extractor;

pub use config::ExtractorConfig;
pub use passport_extractor::{Extraction, PassportExtractor, Sources};
