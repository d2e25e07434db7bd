//! Field types shared between the CLI surface and the API client.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// UI locale, sent to the backend as the `Accept-Language` header.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Locale {
    En,
    Ar,
}

impl Default for Locale {
    fn default() -> Self {
        Locale::En
    }
}

/// Header value for the locale.
pub fn format_locale(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "en",
        Locale::Ar => "ar",
    }
}
