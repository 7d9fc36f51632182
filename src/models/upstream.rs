//! Records as returned by the WorldCat Discovery `brief-bibs` endpoint.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamSearch {
    #[serde(deserialize_with = "null_as_default")]
    pub number_of_records: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub brief_records: Vec<UpstreamRecord>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub oclc_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub creator: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub publisher: String,
    #[serde(deserialize_with = "null_as_default")]
    pub isbns: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub issns: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub general_format: String,
}

// The API sends `null` for fields a record does not have.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl UpstreamRecord {
    /// First ISBN, else first ISSN.
    pub fn identifier(&self) -> Option<&str> {
        self.isbns
            .first()
            .or_else(|| self.issns.first())
            .map(String::as_str)
    }
}

/// Query parameters of one brief-bibs call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefBibsQuery {
    pub q: String,
    pub offset: u32,
    pub limit: u32,
    pub held_by_symbol: String,
    pub db_ids: String,
    pub order_by: String,
}
