use crate::config::ExtractorConfig;
use crate::models::{MrzFields, OutputRecord, VisualFields};
use crate::processing::*;
use std::path::Path;

/// Which branches of the pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sources {
    #[default]
    Both,
    MrzOnly,
    VisualOnly,
}

/// Everything one run produced, for callers that want more than the record.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub mrz: MrzFields,
    pub corpus: Option<TextCorpus>,
    pub visual: VisualFields,
    pub record: OutputRecord,
}

pub struct PassportExtractor<E: OcrEngine, M: MrzReader> {
    engine: E,
    mrz_reader: M,
    config: ExtractorConfig,
}

impl PassportExtractor<TesseractEngine, TesseractMrzReader> {
    pub fn with_tesseract(config: ExtractorConfig) -> Self {
        let engine = TesseractEngine::new(config.tessdata_dir.clone());
        let mrz_reader = TesseractMrzReader::new(engine.clone(), &config.mrz_language);
        PassportExtractor::new(engine, mrz_reader, config)
    }
}

impl<E: OcrEngine, M: MrzReader> PassportExtractor<E, M> {
    pub fn new(engine: E, mrz_reader: M, config: ExtractorConfig) -> Self {
        PassportExtractor {
            engine,
            mrz_reader,
            config,
        }
    }

    /// Extract the merged record for one passport image. Never fails: a
    /// branch that cannot run contributes nothing.
    pub fn extract(&self, image_path: &Path) -> OutputRecord {
        self.run(image_path, Sources::Both).record
    }

    pub fn run(&self, image_path: &Path, sources: Sources) -> Extraction {
        log::info!("Extracting passport fields from {}", image_path.display());

        // Step 1: MRZ branch on the original image
        let mrz = match sources {
            Sources::VisualOnly => MrzFields::new(),
            _ => NameNormalizer::apply(&self.read_mrz(image_path)),
        };

        // Step 2: visual branch on the preprocessed image
        let (corpus, visual) = match sources {
            Sources::MrzOnly => (None, VisualFields::new()),
            _ => self.read_visual(image_path),
        };

        // Step 3: reconcile
        let record = MergeEngine::merge(&mrz, &visual);
        if record.is_all_null() {
            log::warn!("No field could be extracted from {}", image_path.display());
        }

        Extraction {
            mrz,
            corpus,
            visual,
            record,
        }
    }

    fn read_mrz(&self, image_path: &Path) -> MrzFields {
        match self.mrz_reader.read(image_path) {
            Ok(fields) => {
                log::info!("MRZ read successfully");
                fields
            }
            Err(e) => {
                log::warn!("MRZ branch failed: {}", e);
                MrzFields::failed(e.to_string())
            }
        }
    }

    fn read_visual(&self, image_path: &Path) -> (Option<TextCorpus>, VisualFields) {
        let processed = match ImageProcessor::process_image(image_path, &self.config.preprocess) {
            Ok(processed) => processed,
            Err(e) => {
                log::warn!("Skipping visual OCR: {}", e);
                return (None, VisualFields::new());
            }
        };

        let corpus = OcrProcessor::run_ensemble(&self.engine, &processed, &self.config.profiles);
        if corpus.is_blank() {
            log::warn!("OCR ensemble produced no text for {}", image_path.display());
            return (Some(corpus), VisualFields::new());
        }
        log::debug!("OCR corpus:\n{}", corpus.text());

        let visual = FieldExtractor::extract(&corpus.text());
        log::info!("Visual OCR found {} field(s)", visual.len());
        (Some(corpus), visual)
    }
}
