pub mod engine;
pub mod extractors;
pub mod preprocess;
pub mod merge;
pub mod mrz;
pub mod names;
pub mod ocr;

pub use engine::{OcrEngine, TesseractEngine};
pub use extractors::{DateShape, FieldExtractor};
pub use preprocess::{ImageProcessor, ProcessedImage};
pub use merge::MergeEngine;
pub use mrz::{MrzParser, MrzReader, TesseractMrzReader};
pub use names::NameNormalizer;
pub use ocr::{OcrProcessor, TextCorpus};
