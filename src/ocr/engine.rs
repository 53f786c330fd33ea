//! OCR engine abstraction and backends.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::OcrError;

/// Text recognized in one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    /// 0–100.
    pub confidence: f32,
}

/// Something that can read text out of image files.
///
/// Calls are blocking; the job runner keeps them off the async runtime.
pub trait OcrEngine: Send + Sync {
    /// Warm up the engine. A failure here aborts the batch.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`OcrError`] if the engine cannot be used at all.
    fn prepare(&self) -> Result<(), OcrError> {
        Ok(())
    }

    /// Recognize text in `path`, reporting 0–100 progress through
    /// `on_progress` when the backend can.
    ///
    /// # Errors
    ///
    /// Returns [`OcrError::File`] for problems with this image, or a fatal
    /// variant if the engine itself broke.
    fn recognize(&self, path: &Path, on_progress: &dyn Fn(u8)) -> Result<Recognition, OcrError>;
}

/// Engine used when the crate is built without an OCR backend.
#[derive(Debug, Clone, Default)]
pub struct UnavailableEngine;

impl OcrEngine for UnavailableEngine {
    fn prepare(&self) -> Result<(), OcrError> {
        Err(OcrError::EngineUnavailable(
            "built without an OCR backend (enable the `tesseract` feature)".to_string(),
        ))
    }

    fn recognize(&self, _path: &Path, _on_progress: &dyn Fn(u8)) -> Result<Recognition, OcrError> {
        Err(OcrError::EngineUnavailable(
            "built without an OCR backend".to_string(),
        ))
    }
}

/// Tesseract backend settings.
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    /// Language code(s), e.g. `eng` or `eng+deu`.
    pub language: String,
    /// Directory with `*.traineddata`; tesseract's default when `None`.
    pub tessdata_dir: Option<PathBuf>,
}

impl TesseractConfig {
    /// Build from the runtime configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            language: config.ocr_language.clone(),
            tessdata_dir: config.tessdata_dir.clone(),
        }
    }
}

#[cfg(feature = "tesseract")]
pub use tesseract::TesseractEngine;

#[cfg(feature = "tesseract")]
mod tesseract {
    use std::path::Path;

    use leptess::LepTess;

    use super::{OcrEngine, Recognition, TesseractConfig};
    use crate::error::OcrError;

    /// Tesseract via `leptess`.
    ///
    /// Each call builds its own tesseract handle, so the engine is shareable
    /// across threads.
    #[derive(Debug, Clone)]
    pub struct TesseractEngine {
        config: TesseractConfig,
    }

    impl TesseractEngine {
        #[must_use]
        pub const fn new(config: TesseractConfig) -> Self {
            Self { config }
        }

        fn open(&self) -> Result<LepTess, OcrError> {
            let data_path = self
                .config
                .tessdata_dir
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned());

            LepTess::new(data_path.as_deref(), &self.config.language).map_err(|e| {
                OcrError::EngineUnavailable(format!(
                    "failed to initialize tesseract for '{}': {e:?}",
                    self.config.language
                ))
            })
        }
    }

    impl OcrEngine for TesseractEngine {
        fn prepare(&self) -> Result<(), OcrError> {
            self.open().map(drop)
        }

        fn recognize(
            &self,
            path: &Path,
            on_progress: &dyn Fn(u8),
        ) -> Result<Recognition, OcrError> {
            let mut tess = self.open()?;
            on_progress(0);

            tess.set_image(path)
                .map_err(|e| OcrError::file(path, format!("cannot load image: {e:?}")))?;
            on_progress(40);

            let text = tess
                .get_utf8_text()
                .map_err(|e| OcrError::file(path, format!("invalid text output: {e}")))?;

            #[allow(clippy::cast_precision_loss)]
            let confidence = tess.mean_text_conf().clamp(0, 100) as f32;
            on_progress(100);

            Ok(Recognition {
                text: text.trim().to_string(),
                confidence,
            })
        }
    }
}

/// Pick the engine this build supports.
#[must_use]
pub fn default_engine(config: &Config) -> Arc<dyn OcrEngine> {
    #[cfg(feature = "tesseract")]
    {
        Arc::new(TesseractEngine::new(TesseractConfig::from_config(config)))
    }

    #[cfg(not(feature = "tesseract"))]
    {
        let settings = TesseractConfig::from_config(config);
        tracing::debug!(language = %settings.language, "No OCR backend compiled in");
        Arc::new(UnavailableEngine)
    }
}
