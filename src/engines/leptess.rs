//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based OCR engine. Better for noisy/messy images like phone
//! photos. Uses tesseract-static crate for static linking (no system
//! dependencies). Downloads tessdata (training data) automatically on first
//! use.

use crate::config::Config;
use crate::engine::{Extraction, OcrEngine};
use crate::error::PixiError;
use image::DynamicImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tesseract_static::tesseract::Tesseract;

/// Tesseract OCR Engine
pub struct LeptessEngine {
    /// Path to tessdata directory
    tessdata_path: String,
    /// Language the engine runs with
    ocr_language: String,
}

impl LeptessEngine {
    /// Create a new Tesseract-based OCR engine
    pub fn new(config: &Config) -> Result<Self, PixiError> {
        let ocr_language = config.ocr_language.clone();

        let tessdata_path = ensure_tessdata_available(&ocr_language)?;

        // Test initialization validates that tessdata is actually usable
        let test_tess = Tesseract::new(Some(&tessdata_path), Some(&ocr_language)).map_err(|e| {
            PixiError::Initialization(format!("Failed to initialize Tesseract: {}", e))
        })?;
        drop(test_tess);

        tracing::info!(
            "Leptess engine initialized (tessdata: {}, language: {})",
            tessdata_path,
            ocr_language
        );

        Ok(Self {
            tessdata_path,
            ocr_language,
        })
    }
}

impl OcrEngine for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - better for noisy/messy images like phone photos"
    }

    fn extract(&self, image: &DynamicImage) -> Result<Extraction, PixiError> {
        let rgb_img = image.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        // BMP is always supported by leptonica, so hand the image over as BMP
        let mut bmp_data = Vec::new();
        {
            let mut cursor = std::io::Cursor::new(&mut bmp_data);
            rgb_img
                .write_to(&mut cursor, image::ImageFormat::Bmp)
                .map_err(|e| PixiError::Extraction(format!("failed to convert to BMP: {}", e)))?;
        }

        tracing::debug!(
            "Processing image: {}x{}, BMP size: {} bytes",
            width,
            height,
            bmp_data.len()
        );

        let mut tess = Tesseract::new(Some(&self.tessdata_path), Some(&self.ocr_language))
            .map_err(|e| PixiError::Extraction(format!("failed to create Tesseract: {}", e)))?;

        tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            PixiError::Extraction(format!(
                "failed to set image ({}x{}, {} bytes): {}",
                width,
                height,
                bmp_data.len(),
                e
            ))
        })?;

        tess = tess
            .recognize()
            .map_err(|e| PixiError::Extraction(format!("failed to recognize text: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| PixiError::Extraction(format!("failed to get text: {}", e)))?;

        // Tesseract reports confidence on a 0-100 scale
        let confidence = tess.mean_text_conf() as f32 / 100.0;

        Ok(Extraction {
            text: text.trim().to_string(),
            confidence,
            warnings: Vec::new(),
        })
    }

    fn supported_formats(&self) -> Vec<String> {
        vec!["image/png".to_string(), "image/jpeg".to_string()]
    }

    fn supported_languages(&self) -> Vec<String> {
        // Tesseract supports many languages - return common ones
        // Users can install additional language packs
        vec![
            "eng".to_string(),
            "deu".to_string(),
            "fra".to_string(),
            "spa".to_string(),
            "hin".to_string(),
            "mar".to_string(),
            "guj".to_string(),
            "tam".to_string(),
            "tel".to_string(),
            "kan".to_string(),
        ]
    }
}

// ============================================================================
// Tessdata download helpers
// ============================================================================

/// Ensure tessdata is available, downloading if needed
fn ensure_tessdata_available(language: &str) -> Result<String, PixiError> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pixiread")
        .join("tessdata");

    std::fs::create_dir_all(&cache_dir).map_err(|e| {
        PixiError::Initialization(format!("Failed to create tessdata directory: {}", e))
    })?;

    let traineddata_file = format!("{}.traineddata", language);
    let traineddata_path = cache_dir.join(&traineddata_file);

    if !traineddata_path.exists() {
        let url = tessdata_url(language);
        tracing::info!(
            "Downloading tessdata for '{}' (this may take a moment)...",
            language
        );
        download_file(&url, &traineddata_path)?;
        tracing::info!("Downloaded tessdata to {:?}", traineddata_path);
    } else {
        tracing::info!("Using cached tessdata from {:?}", cache_dir);
    }

    // Tesseract expects the directory, not the file
    cache_dir
        .to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| PixiError::Initialization("Invalid tessdata path".to_string()))
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // Use tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), PixiError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| PixiError::Initialization(format!("Failed to download tessdata: {}", e)))?;

    let mut file = File::create(path).map_err(|e| {
        PixiError::Initialization(format!("Failed to create tessdata file: {}", e))
    })?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        PixiError::Initialization(format!("Failed to read tessdata response: {}", e))
    })?;

    file.write_all(&buffer)
        .map_err(|e| PixiError::Initialization(format!("Failed to write tessdata file: {}", e)))?;

    Ok(())
}
