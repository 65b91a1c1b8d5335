use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Composite correlation key: `{prefix}-{countryCode}-{docType}`.
///
/// The country segment is always lowercase, matching the queue names
/// provisioned for the stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashId(String);

impl HashId {
    /// Build the key for one document-type stream of one country.
    pub fn new(prefix: &str, country_code: &str, doc_type: &str) -> Self {
        Self(format!(
            "{}-{}-{}",
            prefix,
            country_code.to_lowercase(),
            doc_type
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether one of the key's `-` separated segments is the given country.
    pub fn belongs_to_country(&self, country_code: &str) -> bool {
        let country = country_code.to_lowercase();
        self.0.split('-').any(|segment| segment == country)
    }
}

impl From<String> for HashId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for HashId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for HashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One processing cycle of one `hashId`.
///
/// Attributes other than the well-known ones are carried through untouched
/// so that downstream consumers see the record as it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalRecord {
    pub hash_id: HashId,
    /// Sort key, `YYYY-MM-DD HH:MM:SS.mmm`.
    pub exec_date_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_date_time: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl OperationalRecord {
    pub fn new(hash_id: impl Into<HashId>, exec_date_time: impl Into<String>) -> Self {
        Self {
            hash_id: hash_id.into(),
            exec_date_time: exec_date_time.into(),
            is_status: None,
            from_date_time: None,
            to_date_time: None,
            attributes: Map::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.is_status = Some(status.into());
        self
    }

    pub fn with_window(mut self, from: Option<&str>, to: Option<&str>) -> Self {
        self.from_date_time = from.map(String::from);
        self.to_date_time = to.map(String::from);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Whether the record carries the given status.
    pub fn has_status(&self, status: &str) -> bool {
        self.is_status.as_deref() == Some(status)
    }
}
