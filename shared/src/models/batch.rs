//! Batch records as stored by the host

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded quantity of physical items sharing a lineage, location and lot date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    pub id: Uuid,
    /// Display label, usually a lot code such as "BLU-0042"
    pub name: String,
    /// Count of physical items currently represented by this row
    pub quantity: u64,
    #[serde(default)]
    pub genetic_id: Option<Uuid>,
    #[serde(default)]
    pub genetic_name: Option<String>,
    #[serde(default)]
    pub location_id: Option<Uuid>,
    #[serde(default)]
    pub room_id: Option<Uuid>,
    /// Batch this row was split or derived from
    #[serde(default)]
    pub parent_batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    /// Nominal lot date; `created_at` is used when absent
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: BatchStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BatchRecord {
    /// A row holding no units is terminal whatever its status says
    pub fn is_exhausted(&self) -> bool {
        self.quantity == 0
    }

    /// Date used for grouping: `start_date`, falling back to `created_at`
    pub fn lot_timestamp(&self) -> DateTime<Utc> {
        self.start_date.unwrap_or(self.created_at)
    }

    /// Physical location, preferring the location over the room
    pub fn effective_location(&self) -> Option<Uuid> {
        self.location_id.or(self.room_id)
    }
}

/// Lifecycle tag of a batch row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    #[default]
    Active,
    Discarded,
    Transferred,
    #[serde(untagged)]
    Other(String),
}

impl BatchStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BatchStatus::Active => "active",
            BatchStatus::Discarded => "discarded",
            BatchStatus::Transferred => "transferred",
            BatchStatus::Other(s) => s.as_str(),
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "active" => BatchStatus::Active,
            "discarded" => BatchStatus::Discarded,
            "transferred" => BatchStatus::Transferred,
            _ => BatchStatus::Other(s.to_string()),
        })
    }
}
