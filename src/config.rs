use crate::models::OcrProfile;
use crate::utils::PassportError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MAX_SCALE_FACTOR: f32 = 8.0;
pub const MAX_THRESHOLD_RADIUS: u32 = 255;

/// Image preparation parameters for the visual OCR pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub scale_factor: f32,
    pub blur_sigma: f32,
    pub threshold_radius: u32,
    pub threshold_bias: u8,
    pub close_radius: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        PreprocessConfig {
            scale_factor: 2.0,
            blur_sigma: 0.8,
            threshold_radius: 5,
            threshold_bias: 2,
            close_radius: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Tesseract data directory; `None` defers to `TESSDATA_PREFIX`.
    pub tessdata_dir: Option<PathBuf>,
    pub profiles: Vec<OcrProfile>,
    pub mrz_language: String,
    pub preprocess: PreprocessConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            tessdata_dir: None,
            profiles: OcrProfile::default_ensemble(),
            mrz_language: "eng".to_string(),
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PassportError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PassportError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, PassportError> {
        let config: ExtractorConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the language set of every ensemble profile.
    pub fn with_languages(mut self, languages: &str) -> Self {
        for profile in &mut self.profiles {
            profile.languages = languages.to_string();
        }
        self
    }

    pub fn with_tessdata_dir(mut self, dir: PathBuf) -> Self {
        self.tessdata_dir = Some(dir);
        self
    }

    pub fn validate(&self) -> Result<(), PassportError> {
        if self.profiles.is_empty() {
            return Err(PassportError::ConfigError(
                "at least one OCR profile is required".to_string(),
            ));
        }
        if let Some(profile) = self.profiles.iter().find(|p| p.languages.trim().is_empty()) {
            return Err(PassportError::ConfigError(format!(
                "profile '{}' has no language set",
                profile.name
            )));
        }
        let scale = self.preprocess.scale_factor;
        if scale.is_nan() || scale <= 0.0 || scale > MAX_SCALE_FACTOR {
            return Err(PassportError::ConfigError(format!(
                "scale_factor must be in (0, {}], got {}",
                MAX_SCALE_FACTOR, scale
            )));
        }
        if self.preprocess.threshold_radius > MAX_THRESHOLD_RADIUS {
            return Err(PassportError::ConfigError(format!(
                "threshold_radius must be at most {}, got {}",
                MAX_THRESHOLD_RADIUS, self.preprocess.threshold_radius
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ExtractorConfig::from_json(r#"{"mrz_language":"mrz"}"#).unwrap();
        assert_eq!(config.mrz_language, "mrz");
        assert_eq!(config.profiles.len(), 4);
        assert_eq!(config.preprocess.scale_factor, 2.0);
    }

    #[test]
    fn empty_profile_list_is_rejected() {
        let err = ExtractorConfig::from_json(r#"{"profiles":[]}"#).unwrap_err();
        assert!(matches!(err, PassportError::ConfigError(_)));
    }

    #[test]
    fn oversized_preprocessing_is_rejected() {
        for raw in [
            r#"{"preprocess":{"scale_factor":1000.0}}"#,
            r#"{"preprocess":{"scale_factor":0.0}}"#,
            r#"{"preprocess":{"threshold_radius":100000}}"#,
        ] {
            let err = ExtractorConfig::from_json(raw).unwrap_err();
            assert!(matches!(err, PassportError::ConfigError(_)), "{}", raw);
        }

        let mut config = ExtractorConfig::default();
        config.preprocess.scale_factor = f32::INFINITY;
        assert!(config.validate().is_err());
        config.preprocess.scale_factor = MAX_SCALE_FACTOR;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn language_override_applies_to_every_profile() {
        let config = ExtractorConfig::default().with_languages("kor");
        assert!(config.profiles.iter().all(|p| p.languages == "kor"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tessdata_dir":"/opt/tessdata"}}"#).unwrap();
        let config = ExtractorConfig::load(file.path()).unwrap();
        assert_eq!(config.tessdata_dir, Some(PathBuf::from("/opt/tessdata")));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = ExtractorConfig::load("/nonexistent/passport.json").unwrap_err();
        assert!(matches!(err, PassportError::ConfigError(_)));
    }
}
