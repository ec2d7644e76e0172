use serde::{Deserialize, Serialize};

/// One document per named sequence in the `counters` collection.
/// Reserved with a single `$inc` upsert so concurrent allocations
/// never observe the same value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub seq: i64,
}

pub const DOCTOR_ID_SEQUENCE: &str = "doctor_id";
