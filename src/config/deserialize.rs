// ABOUTME: Custom serde helpers for config fields.
// ABOUTME: Accepts codes that older config files wrote as bare numbers.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextEntry {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

/// Deserialize a string that may have been written as an integer (`"BIN": 412345`).
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = match TextEntry::deserialize(deserializer)? {
        TextEntry::Text(s) => s,
        TextEntry::Unsigned(n) => n.to_string(),
        TextEntry::Signed(n) => n.to_string(),
    };

    if text.trim().is_empty() {
        return Err(serde::de::Error::custom("value cannot be empty"));
    }
    Ok(text)
}
