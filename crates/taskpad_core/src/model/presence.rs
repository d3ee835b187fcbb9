use crate::model::SourcePercentages;
use serde::{Deserialize, Serialize};

/// The state one participant shares with the rest of the room.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    pub content: String,
    pub content_source: SourcePercentages,
}
