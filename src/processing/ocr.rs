use crate::models::OcrProfile;
use crate::processing::engine::OcrEngine;
use crate::processing::preprocess::ProcessedImage;

/// Raw text of every successful recognition pass, in profile order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextCorpus {
    blocks: Vec<String>,
}

impl TextCorpus {
    pub fn from_blocks(blocks: Vec<String>) -> Self {
        TextCorpus { blocks }
    }

    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    /// The blocks joined with newlines, as scanned by the field extractor.
    pub fn text(&self) -> String {
        self.blocks.join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.blocks.iter().all(|block| block.trim().is_empty())
    }
}

pub struct OcrProcessor;

impl OcrProcessor {
    /// Run `engine` once per profile over the same image. Failed passes are
    /// skipped; when all of them fail the corpus is empty.
    pub fn run_ensemble<E: OcrEngine>(
        engine: &E,
        image: &ProcessedImage,
        profiles: &[OcrProfile],
    ) -> TextCorpus {
        let blocks: Vec<String> = profiles
            .iter()
            .filter_map(|profile| match engine.recognize(image, profile) {
                Ok(text) => {
                    log::debug!(
                        "OCR pass '{}' (psm {}, {}) returned {} chars",
                        profile.name,
                        profile.segmentation.psm(),
                        profile.languages,
                        text.len()
                    );
                    Some(text)
                }
                Err(e) => {
                    log::warn!("OCR pass '{}' failed: {}", profile.name, e);
                    None
                }
            })
            .collect();

        if blocks.is_empty() && !profiles.is_empty() {
            log::warn!("All {} OCR passes failed, corpus is empty", profiles.len());
        }

        TextCorpus::from_blocks(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SegmentationMode;
    use crate::utils::PassportError;
    use std::cell::RefCell;

    /// Answers by profile name and records the call order.
    struct ScriptedEngine {
        answers: Vec<(&'static str, Option<&'static str>)>,
        calls: RefCell<Vec<String>>,
    }

    impl OcrEngine for ScriptedEngine {
        fn recognize(&self, _image: &ProcessedImage, profile: &OcrProfile) -> Result<String, PassportError> {
            self.calls.borrow_mut().push(profile.name.clone());
            match self.answers.iter().find(|(name, _)| *name == profile.name) {
                Some((_, Some(text))) => Ok(text.to_string()),
                _ => Err(PassportError::OcrError(format!("{} unavailable", profile.name))),
            }
        }
    }

    fn image() -> ProcessedImage {
        ProcessedImage::from_png(Vec::new(), 1, 1)
    }

    fn profiles() -> Vec<OcrProfile> {
        vec![
            OcrProfile::new("a", SegmentationMode::SingleBlock, "eng"),
            OcrProfile::new("b", SegmentationMode::SingleColumn, "eng"),
            OcrProfile::new("c", SegmentationMode::Auto, "eng"),
            OcrProfile::new("d", SegmentationMode::SingleColumn, "kor+eng"),
        ]
    }

    #[test]
    fn failed_passes_are_skipped_in_order() {
        let engine = ScriptedEngine {
            answers: vec![("a", None), ("b", Some("second")), ("c", None), ("d", Some("fourth"))],
            calls: RefCell::new(Vec::new()),
        };

        let corpus = OcrProcessor::run_ensemble(&engine, &image(), &profiles());

        assert_eq!(corpus.blocks(), &["second".to_string(), "fourth".to_string()]);
        assert_eq!(corpus.text(), "second\nfourth");
        assert_eq!(*engine.calls.borrow(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn all_failures_give_empty_corpus() {
        let engine = ScriptedEngine {
            answers: vec![],
            calls: RefCell::new(Vec::new()),
        };

        let corpus = OcrProcessor::run_ensemble(&engine, &image(), &profiles());

        assert!(corpus.blocks().is_empty());
        assert_eq!(corpus.text(), "");
        assert!(corpus.is_blank());
    }

    #[test]
    fn empty_successful_output_is_kept() {
        let engine = ScriptedEngine {
            answers: vec![("a", Some("")), ("b", Some("text"))],
            calls: RefCell::new(Vec::new()),
        };

        let corpus = OcrProcessor::run_ensemble(&engine, &image(), &profiles()[..2]);

        assert_eq!(corpus.blocks().len(), 2);
        assert!(!corpus.is_blank());
    }
}
