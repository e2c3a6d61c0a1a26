//! eCFR API response types.

use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder substituted for missing version key fields.
pub const KEY_PLACEHOLDER: &str = "-";

/// Envelope of `GET /titles.json`.
#[derive(Debug, Deserialize)]
pub struct TitlesResponse {
    pub titles: Vec<Title>,
}

/// A top-level numbered title of the CFR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub latest_amended_on: Option<String>,
    #[serde(default)]
    pub latest_issue_date: Option<String>,
    #[serde(default)]
    pub up_to_date_as_of: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub reserved: bool,
}

impl Title {
    /// Cache and URL key for this title (the bare number).
    pub fn key(&self) -> String {
        self.number.to_string()
    }
}

/// Envelope of `GET /versions/title-N.json`.
#[derive(Debug, Deserialize)]
pub struct VersionsResponse {
    pub content_versions: Vec<Version>,
}

/// A dated content unit (section, appendix, ...) within a title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Version {
    #[serde(default, deserialize_with = "string_or_number")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub part: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub subpart: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub amendment_date: Option<String>,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub substantive: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub removed: bool,
}

impl Version {
    /// Composite identity `title/part/subpart/identifier/date`.
    ///
    /// Missing fields become `-`; a missing title falls back to `owner`.
    pub fn cache_key(&self, owner: &str) -> String {
        let title = present(&self.title).unwrap_or(owner);
        let field = |value: &Option<String>| present(value).unwrap_or(KEY_PLACEHOLDER).to_string();
        format!(
            "{}/{}/{}/{}/{}",
            title,
            field(&self.part),
            field(&self.subpart),
            field(&self.identifier),
            field(&self.date)
        )
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Accept JSON strings or numbers for identifier-like fields.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

/// Read an optional flag, treating `null` as unset.
fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Envelope of the admin API `GET /agencies.json`.
#[derive(Debug, Deserialize)]
pub struct AgenciesResponse {
    pub agencies: Vec<Agency>,
}

/// A federal agency from the eCFR admin directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agency {
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub children: Vec<Agency>,
}
