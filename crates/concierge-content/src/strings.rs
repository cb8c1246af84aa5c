//! Built-in bilingual string tables compiled into the binary.
//!
//! These back every lookup so the menu always renders, even when no content
//! directory or URL is configured or a load fails.

use std::collections::HashMap;
use std::sync::LazyLock;

use concierge_core::Language;

/// Localization key to display text.
pub type StringTable = HashMap<String, String>;

static BUILTIN_EN: LazyLock<StringTable> =
    LazyLock::new(|| parse_builtin(include_str!("../assets/strings.en.json"), Language::En));

static BUILTIN_VI: LazyLock<StringTable> =
    LazyLock::new(|| parse_builtin(include_str!("../assets/strings.vi.json"), Language::Vi));

fn parse_builtin(raw: &str, language: Language) -> StringTable {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::error!(language = %language, error = %e, "Built-in string table is malformed");
        StringTable::new()
    })
}

/// The compiled-in table for `language`.
pub fn builtin(language: Language) -> &'static StringTable {
    match language {
        Language::En => &BUILTIN_EN,
        Language::Vi => &BUILTIN_VI,
    }
}

/// Parse a string table file. Non-string values are rejected.
pub fn parse_table(raw: &str) -> Result<StringTable, serde_json::Error> {
    serde_json::from_str(raw)
}
