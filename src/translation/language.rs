// Language normalization - maps user-supplied language tokens to ISO codes

use serde::{Deserialize, Serialize};

/// Supported language pairs, code then display name. The table is a
/// bijection: every code and every name appears exactly once.
const LANGUAGES: &[(&str, &str)] = &[
    ("en", "english"),
    ("es", "spanish"),
    ("fr", "french"),
    ("de", "german"),
    ("it", "italian"),
    ("pt", "portuguese"),
    ("zh", "chinese"),
    ("ja", "japanese"),
    ("ko", "korean"),
    ("ru", "russian"),
    ("ar", "arabic"),
    ("hi", "hindi"),
    ("nl", "dutch"),
    ("sv", "swedish"),
    ("no", "norwegian"),
    ("da", "danish"),
    ("fi", "finnish"),
    ("pl", "polish"),
    ("cs", "czech"),
    ("hu", "hungarian"),
    ("el", "greek"),
    ("tr", "turkish"),
    ("he", "hebrew"),
    ("th", "thai"),
    ("vi", "vietnamese"),
    ("id", "indonesian"),
    ("ms", "malay"),
    ("tl", "tagalog"),
    ("uk", "ukrainian"),
    ("bg", "bulgarian"),
    ("ro", "romanian"),
    ("hr", "croatian"),
    ("sr", "serbian"),
    ("sk", "slovak"),
    ("sl", "slovenian"),
    ("lt", "lithuanian"),
    ("lv", "latvian"),
    ("et", "estonian"),
];

/// A normalized language: lowercase ISO-style code plus display name.
/// The `auto` sentinel means "detect the source language at translation
/// time" and is only valid on the source side of a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LanguageSpec {
    pub code: String,
    pub name: String,
}

impl LanguageSpec {
    /// Sentinel for an unspecified source language
    pub fn auto() -> Self {
        Self {
            code: "auto".to_string(),
            name: "auto-detect".to_string(),
        }
    }

    pub fn is_auto(&self) -> bool {
        self.code == "auto"
    }
}

impl std::fmt::Display for LanguageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LanguageError {
    #[error(
        "unknown language '{0}': use a supported code (es, fr, de, ...) or name (spanish, french, german, ...)"
    )]
    UnknownLanguage(String),
}

/// Pure lookup of language tokens. No I/O, fully deterministic.
pub struct LanguageResolver;

impl LanguageResolver {
    /// Normalize a language code or name (case-insensitive) into a
    /// `LanguageSpec`. `auto` yields the detect-at-translation sentinel.
    /// Tokens outside the supported set fail; there is no guessing.
    pub fn normalize(token: &str) -> Result<LanguageSpec, LanguageError> {
        let wanted = token.trim().to_lowercase();

        if wanted == "auto" {
            return Ok(LanguageSpec::auto());
        }

        for (code, name) in LANGUAGES {
            if wanted == *code || wanted == *name {
                return Ok(LanguageSpec {
                    code: (*code).to_string(),
                    name: (*name).to_string(),
                });
            }
        }

        Err(LanguageError::UnknownLanguage(token.trim().to_string()))
    }

    /// All supported codes, for help output
    pub fn supported_codes() -> impl Iterator<Item = &'static str> {
        LANGUAGES.iter().map(|(c, _)| *c)
    }
}
