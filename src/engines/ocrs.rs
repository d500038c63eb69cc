//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies
//! required. Downloads neural network models automatically on first use.

use crate::config::Config;
use crate::engine::{Extraction, OcrEngine};
use crate::error::PixiError;
use image::DynamicImage;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// OCR Engine wrapping the ocrs library
pub struct OcrsEngine {
    engine: Arc<OcrsOcrEngine>,
}

impl OcrsEngine {
    /// Create a new engine, downloading models if needed
    pub fn new(_config: &Config) -> Result<Self, PixiError> {
        let detection_model_path =
            ensure_model_downloaded(DETECTION_MODEL_URL, "text-detection.rten")?;
        let recognition_model_path =
            ensure_model_downloaded(RECOGNITION_MODEL_URL, "text-recognition.rten")?;

        let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
            PixiError::Initialization(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
            PixiError::Initialization(format!("Failed to load recognition model: {}", e))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| PixiError::Initialization(format!("Failed to create OCR engine: {}", e)))?;

        tracing::info!("ocrs engine initialized successfully");

        Ok(Self {
            engine: Arc::new(engine),
        })
    }
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - fast, no system dependencies required"
    }

    fn extract(&self, image: &DynamicImage) -> Result<Extraction, PixiError> {
        // ocrs wants raw RGB bytes in HWC layout
        let rgb_img = image.to_rgb8();
        let dimensions = rgb_img.dimensions();

        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions)
            .map_err(|e| PixiError::Extraction(format!("failed to create image source: {}", e)))?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| PixiError::Extraction(format!("failed to prepare input: {}", e)))?;

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .map_err(|e| PixiError::Extraction(format!("failed to detect words: {}", e)))?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| PixiError::Extraction(format!("failed to recognize text: {}", e)))?;

        let text: String = line_texts
            .iter()
            .filter_map(|line| line.as_ref())
            .map(|line| {
                line.words()
                    .map(|word| word.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n");

        let confidence = estimate_confidence(&text);

        Ok(Extraction {
            text,
            confidence,
            warnings: Vec::new(),
        })
    }

    fn supported_formats(&self) -> Vec<String> {
        vec!["image/png".to_string(), "image/jpeg".to_string()]
    }

    fn supported_languages(&self) -> Vec<String> {
        // ocrs currently only supports English/Latin alphabet
        vec!["eng".to_string()]
    }
}

// ============================================================================
// Confidence scoring heuristics
// ============================================================================

/// Estimate a confidence score from text-quality heuristics.
///
/// ocrs does not report per-character confidence, so the recognized text is
/// scored for patterns that correlate with OCR quality.
fn estimate_confidence(text: &str) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    if text.len() < 5 {
        return 0.5; // Too short to judge accurately
    }

    let char_score = score_char_mix(text);
    let word_score = score_word_shape(text);
    let whitespace_score = score_whitespace(text);
    let repetition_score = score_repetition(text);

    let confidence =
        0.40 * char_score + 0.30 * word_score + 0.15 * whitespace_score + 0.15 * repetition_score;

    confidence.clamp(0.0, 1.0)
}

/// Penalize text with many special/control characters or few letters.
fn score_char_mix(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }

    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    let special = text
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !c.is_ascii_punctuation())
        .count();

    let special_ratio = special as f32 / total as f32;
    let special_penalty = 1.0 - (special_ratio * 10.0).min(1.0);

    let letter_ratio = letters as f32 / total as f32;
    let letter_score = (letter_ratio * 1.5).min(1.0);

    special_penalty * 0.6 + letter_score * 0.4
}

/// Garbled OCR often produces single-character "words" or very long runs.
fn score_word_shape(text: &str) -> f32 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.5;
    }

    let total_len: usize = words.iter().map(|w| w.len()).sum();
    let avg_len = total_len as f32 / words.len() as f32;

    // Ideal average word length: 4-8 chars
    let avg_score = match avg_len as usize {
        0..=1 => 0.3,
        2..=3 => 0.7,
        4..=8 => 1.0,
        9..=12 => 0.8,
        _ => 0.4,
    };

    let single_count = words.iter().filter(|w| w.len() == 1).count();
    let single_ratio = single_count as f32 / words.len() as f32;
    let single_penalty = 1.0 - (single_ratio * 1.5).min(0.5);

    avg_score * single_penalty
}

/// Normal text runs ~10-25% whitespace.
fn score_whitespace(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }

    let whitespace = text.chars().filter(|c| c.is_whitespace()).count();
    let ratio = (whitespace as f32 / total as f32) * 100.0;

    match ratio as usize {
        0..=5 => 0.5,
        6..=10 => 0.8,
        11..=25 => 1.0,
        26..=40 => 0.7,
        _ => 0.3,
    }
}

/// Runs like "aaaa" or "####" usually mean the recognizer got confused.
fn score_repetition(text: &str) -> f32 {
    let mut max_repeat = 1;
    let mut current = 1;
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if Some(c) == prev && !c.is_whitespace() {
            current += 1;
            max_repeat = max_repeat.max(current);
        } else {
            current = 1;
        }
        prev = Some(c);
    }

    match max_repeat {
        1..=3 => 1.0,
        4..=5 => 0.8,
        6..=10 => 0.5,
        _ => 0.2,
    }
}

// ============================================================================
// Model download helpers
// ============================================================================

/// Ensure model is downloaded and return its path
fn ensure_model_downloaded(url: &str, filename: &str) -> Result<PathBuf, PixiError> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pixiread");

    std::fs::create_dir_all(&cache_dir).map_err(|e| {
        PixiError::Initialization(format!("Failed to create cache directory: {}", e))
    })?;

    let model_path = cache_dir.join(filename);

    if !model_path.exists() {
        tracing::info!("Downloading {} (this may take a moment)...", filename);
        download_file(url, &model_path)?;
        tracing::info!("Downloaded {} to {:?}", filename, model_path);
    } else {
        tracing::info!("Using cached model from {:?}", model_path);
    }

    Ok(model_path)
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), PixiError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| PixiError::Initialization(format!("Failed to download model: {}", e)))?;

    let mut file = File::create(path)
        .map_err(|e| PixiError::Initialization(format!("Failed to create model file: {}", e)))?;

    let buffer = response
        .into_body()
        .read_to_vec()
        .map_err(|e| PixiError::Initialization(format!("Failed to read response body: {}", e)))?;

    file.write_all(&buffer)
        .map_err(|e| PixiError::Initialization(format!("Failed to write model file: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(estimate_confidence(""), 0.0);
    }

    #[test]
    fn short_text_scores_half() {
        assert_eq!(estimate_confidence("Hi"), 0.5);
        assert_eq!(estimate_confidence("Test"), 0.5);
    }

    #[test]
    fn clean_text_scores_high() {
        let text = "Hello World OCR Test 12345";
        let confidence = estimate_confidence(text);
        assert!(confidence > 0.7, "Expected > 0.7, got {}", confidence);
    }

    #[test]
    fn garbled_text_scores_low() {
        // Lots of special characters indicates bad OCR
        let text = "§±®©¥€£¢¤";
        let confidence = estimate_confidence(text);
        assert!(confidence < 0.5, "Expected < 0.5, got {}", confidence);
    }

    #[test]
    fn repeated_chars_lower_the_score() {
        let text = "Hello aaaaaaaaaaaa World";
        let confidence = estimate_confidence(text);
        assert!(confidence < 0.9, "Expected < 0.9, got {}", confidence);
    }

    #[test]
    fn single_char_words_lower_the_score() {
        let text = "a b c d e f g h i j k l m n o p";
        let confidence = estimate_confidence(text);
        assert!(confidence < 0.7, "Expected < 0.7, got {}", confidence);
    }

    #[test]
    fn normal_sentence_scores_well() {
        let text = "The quick brown fox jumps over the lazy dog.";
        let confidence = estimate_confidence(text);
        assert!(confidence > 0.75, "Expected > 0.75, got {}", confidence);
    }

    #[test]
    fn char_mix_flags_special_soup() {
        let score = score_char_mix("§±®©¥€£¢¤ƒ");
        assert!(score < 0.5, "Expected < 0.5, got {}", score);
    }

    #[test]
    fn word_shape_likes_normal_words() {
        let score = score_word_shape("Hello World Test");
        assert!(score > 0.8, "Expected > 0.8, got {}", score);
    }

    #[test]
    fn repetition_detector_fires_on_runs() {
        assert_eq!(score_repetition("Hello World"), 1.0);
        let score = score_repetition("Hellooooo World");
        assert!(score < 1.0, "Expected < 1.0, got {}", score);
    }
}
