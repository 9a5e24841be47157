use serde::{Deserialize, Serialize};

/// Layout assumption handed to the recognition engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    /// Fully automatic page segmentation (psm 3)
    Auto,
    /// Single column of text of variable sizes (psm 4)
    SingleColumn,
    /// Single uniform block of text (psm 6)
    SingleBlock,
    /// As much text as possible in no particular order (psm 11)
    SparseText,
}

impl SegmentationMode {
    pub fn psm(&self) -> u8 {
        match self {
            SegmentationMode::Auto => 3,
            SegmentationMode::SingleColumn => 4,
            SegmentationMode::SingleBlock => 6,
            SegmentationMode::SparseText => 11,
        }
    }
}

/// One recognition attempt of the OCR ensemble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrProfile {
    pub name: String,
    pub segmentation: SegmentationMode,
    /// Tesseract language set, e.g. `eng` or `kor+eng`
    pub languages: String,
}

impl OcrProfile {
    pub fn new(name: &str, segmentation: SegmentationMode, languages: &str) -> Self {
        OcrProfile {
            name: name.to_string(),
            segmentation,
            languages: languages.to_string(),
        }
    }

    /// Profiles run over every processed passport page, in order.
    pub fn default_ensemble() -> Vec<OcrProfile> {
        vec![
            OcrProfile::new("block-eng", SegmentationMode::SingleBlock, "eng"),
            OcrProfile::new("column-eng", SegmentationMode::SingleColumn, "eng"),
            OcrProfile::new("auto-eng", SegmentationMode::Auto, "eng"),
            OcrProfile::new("column-kor", SegmentationMode::SingleColumn, "kor+eng"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ensemble_order() {
        let psms: Vec<u8> = OcrProfile::default_ensemble()
            .iter()
            .map(|p| p.segmentation.psm())
            .collect();
        assert_eq!(psms, vec![6, 4, 3, 4]);
    }

    #[test]
    fn profiles_deserialize_from_snake_case() {
        let profile: OcrProfile = serde_json::from_str(
            r#"{"name":"sparse","segmentation":"sparse_text","languages":"eng"}"#,
        )
        .unwrap();
        assert_eq!(profile.segmentation, SegmentationMode::SparseText);
    }
}
