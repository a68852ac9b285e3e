use serde::Deserialize;
use serde_with::{serde_as, NoneAsEmptyString};

/// Body of `POST /api/entries`. Fields stay raw until the engine validates them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateEntryRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub direction: Option<String>,
    pub city: Option<String>,
}

/// Query string of `GET /api/entries`. Empty parameters count as absent.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    #[serde_as(as = "NoneAsEmptyString")]
    pub datetime: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    pub range: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    pub direction: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    pub city: Option<String>,
}
