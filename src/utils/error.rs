use thiserror::Error;

#[derive(Debug, Error)]
pub enum PassportError {
    #[error("Image processing error: {0}")]
    ImageProcessingError(String),
    #[error("MRZ extraction error: {0}")]
    MrzExtractionError(String),
    #[error("MRZ parsing error: {0}")]
    MrzParsingError(String),
    #[error("OCR error: {0}")]
    OcrError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
