use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Message;
use super::ProviderName;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    pub provider: ProviderName,
    pub created_at: i64,
    pub updated_at: i64,
    pub messages: Vec<Message>,
}

/// On disk shape of `index.json`.
#[derive(Default, Debug, Serialize, Deserialize)]
pub struct SessionIndex {
    pub sessions: Vec<Session>,
}
