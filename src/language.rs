//! The closed set of translation targets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PixiError;

/// Target language for the translation branch.
///
/// `None` is the sentinel selector value meaning "skip translation"; it never
/// reaches the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    None,
    Hindi,
    Marathi,
    Gujarati,
    Tamil,
    Telugu,
    Kannada,
    French,
    Spanish,
    German,
}

impl Language {
    /// Every selectable target, sentinel excluded.
    pub const CHOICES: [Language; 9] = [
        Language::Hindi,
        Language::Marathi,
        Language::Gujarati,
        Language::Tamil,
        Language::Telugu,
        Language::Kannada,
        Language::French,
        Language::Spanish,
        Language::German,
    ];

    pub fn is_none(self) -> bool {
        matches!(self, Language::None)
    }

    /// English name as it appears in translation prompts.
    pub fn as_str(self) -> &'static str {
        match self {
            Language::None => "none",
            Language::Hindi => "Hindi",
            Language::Marathi => "Marathi",
            Language::Gujarati => "Gujarati",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Kannada => "Kannada",
            Language::French => "French",
            Language::Spanish => "Spanish",
            Language::German => "German",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = PixiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Language::None),
            "hindi" => Ok(Language::Hindi),
            "marathi" => Ok(Language::Marathi),
            "gujarati" => Ok(Language::Gujarati),
            "tamil" => Ok(Language::Tamil),
            "telugu" => Ok(Language::Telugu),
            "kannada" => Ok(Language::Kannada),
            "french" => Ok(Language::French),
            "spanish" => Ok(Language::Spanish),
            "german" => Ok(Language::German),
            _ => Err(PixiError::UnknownLanguage(s.trim().to_string())),
        }
    }
}
