pub mod data;
pub mod profiles;

pub use data::*;
pub use profiles::{OcrProfile, SegmentationMode};
