//! Locale identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Locales an agent can carry language resources for.
///
/// The string forms match the folder names used in language directories and
/// the codes the remote platform expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "en")]
    En,
    #[serde(rename = "en_US")]
    EnUs,
    #[serde(rename = "en_GB")]
    EnGb,
    #[serde(rename = "it")]
    It,
    #[serde(rename = "es")]
    Es,
    #[serde(rename = "es_ES")]
    EsEs,
    #[serde(rename = "es_419")]
    Es419,
    #[serde(rename = "de")]
    De,
    #[serde(rename = "fr")]
    Fr,
    #[serde(rename = "nl")]
    Nl,
    #[serde(rename = "zh")]
    Zh,
    #[serde(rename = "zh_CN")]
    ZhCn,
    #[serde(rename = "zh_HK")]
    ZhHk,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 13] = [
        LanguageCode::En,
        LanguageCode::EnUs,
        LanguageCode::EnGb,
        LanguageCode::It,
        LanguageCode::Es,
        LanguageCode::EsEs,
        LanguageCode::Es419,
        LanguageCode::De,
        LanguageCode::Fr,
        LanguageCode::Nl,
        LanguageCode::Zh,
        LanguageCode::ZhCn,
        LanguageCode::ZhHk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::EnUs => "en_US",
            LanguageCode::EnGb => "en_GB",
            LanguageCode::It => "it",
            LanguageCode::Es => "es",
            LanguageCode::EsEs => "es_ES",
            LanguageCode::Es419 => "es_419",
            LanguageCode::De => "de",
            LanguageCode::Fr => "fr",
            LanguageCode::Nl => "nl",
            LanguageCode::Zh => "zh",
            LanguageCode::ZhCn => "zh_CN",
            LanguageCode::ZhHk => "zh_HK",
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageCode::ALL
            .iter()
            .find(|code| code.as_str() == s)
            .copied()
            .ok_or_else(|| {
                ApiError::LanguageError(format!(
                    "Unrecognized language code '{}' (must be one of: {})",
                    s,
                    LanguageCode::ALL.map(|c| c.as_str()).join(", ")
                ))
            })
    }
}
