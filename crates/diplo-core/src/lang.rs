//! UI language and bilingual label resolution

use serde::{Deserialize, Serialize};

/// Display language of the atlas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ja,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Ja => "ja",
            Language::En => "en",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ja" | "jp" => Some(Language::Ja),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    /// Sentinel shown when no label can be resolved
    pub fn unknown_label(&self) -> &'static str {
        match self {
            Language::Ja => "不明",
            Language::En => "Unknown",
        }
    }
}

/// Resolve a bilingual label: preferred language, then the other one, then "unknown".
pub fn pick_label(ja: &str, en: &str, lang: Language) -> String {
    let (first, second) = match lang {
        Language::En => (en, ja),
        Language::Ja => (ja, en),
    };
    if !is_blank(first) {
        first.to_string()
    } else if !is_blank(second) {
        second.to_string()
    } else {
        lang.unknown_label().to_string()
    }
}

/// Remove `<i>` markup carried by literature titles.
pub fn strip_italics(label: &str) -> String {
    label.replace("<i>", "").replace("</i>", "")
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
