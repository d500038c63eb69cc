use crate::error::PixiError;
use image::DynamicImage;

/// Text extracted from one image
#[derive(Debug, Clone)]
pub struct Extraction {
    pub text: String,
    pub confidence: f32,
    pub warnings: Vec<String>,
}

/// Trait that all OCR engines must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Run OCR over a decoded image and return the transcription
    fn extract(&self, image: &DynamicImage) -> Result<Extraction, PixiError>;

    /// Get supported MIME types
    fn supported_formats(&self) -> Vec<String>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}
