use crate::models::{OcrProfile, SegmentationMode};
use crate::processing::preprocess::ProcessedImage;
use crate::utils::PassportError;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tesseract::{PageSegMode, Tesseract};

/// A text recognition backend: one call per (image, profile) pair.
pub trait OcrEngine {
    fn recognize(&self, image: &ProcessedImage, profile: &OcrProfile) -> Result<String, PassportError>;
}

impl<E: OcrEngine + ?Sized> OcrEngine for &E {
    fn recognize(&self, image: &ProcessedImage, profile: &OcrProfile) -> Result<String, PassportError> {
        (**self).recognize(image, profile)
    }
}

/// Tesseract through libtesseract, reading PNG bytes via a temporary file.
#[derive(Debug, Clone, Default)]
pub struct TesseractEngine {
    tessdata_dir: Option<String>,
}

impl TesseractEngine {
    pub fn new(tessdata_dir: Option<PathBuf>) -> Self {
        TesseractEngine {
            tessdata_dir: tessdata_dir.map(|dir| dir.to_string_lossy().into_owned()),
        }
    }

    /// Run one recognition pass, optionally restricted to `whitelist` characters.
    pub fn read_text(
        &self,
        png: &[u8],
        languages: &str,
        mode: SegmentationMode,
        whitelist: Option<&str>,
    ) -> Result<String, PassportError> {
        let mut temp_file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|e| PassportError::OcrError(format!("Failed to create temporary file: {}", e)))?;
        temp_file
            .write_all(png)
            .map_err(|e| PassportError::OcrError(format!("Failed to write temporary file: {}", e)))?;

        self.read_file(&temp_file, languages, mode, whitelist)
    }

    fn read_file(
        &self,
        temp_file: &NamedTempFile,
        languages: &str,
        mode: SegmentationMode,
        whitelist: Option<&str>,
    ) -> Result<String, PassportError> {
        let path_str = temp_file
            .path()
            .to_str()
            .ok_or_else(|| PassportError::OcrError("Could not convert path to string".to_string()))?;

        let mut tess = Tesseract::new(self.tessdata_dir.as_deref(), Some(languages))
            .map_err(|e| PassportError::OcrError(format!("Failed to initialize Tesseract ({}): {}", languages, e)))?;

        if let Some(chars) = whitelist {
            tess = tess
                .set_variable("tessedit_char_whitelist", chars)
                .map_err(|e| PassportError::OcrError(format!("Failed to set Tesseract variable: {}", e)))?;
        }

        tess.set_page_seg_mode(page_seg_mode(mode));

        let mut tess = tess
            .set_image(path_str)
            .map_err(|e| PassportError::OcrError(format!("Failed to set image: {}", e)))?;

        tess.get_text()
            .map_err(|e| PassportError::OcrError(format!("Failed to extract text: {}", e)))
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &ProcessedImage, profile: &OcrProfile) -> Result<String, PassportError> {
        self.read_text(image.as_png(), &profile.languages, profile.segmentation, None)
    }
}

fn page_seg_mode(mode: SegmentationMode) -> PageSegMode {
    match mode {
        SegmentationMode::Auto => PageSegMode::PsmAuto,
        SegmentationMode::SingleColumn => PageSegMode::PsmSingleColumn,
        SegmentationMode::SingleBlock => PageSegMode::PsmSingleBlock,
        SegmentationMode::SparseText => PageSegMode::PsmSparseText,
    }
}
