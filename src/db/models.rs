use serde::{Deserialize, Serialize};

/// One completed video analysis. Immutable once stored; the id is derived
/// from the creation timestamp and the history list keeps most recent first.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AnalysisRecord {
    pub id: String,
    pub video_url: String,
    pub title: String,
    pub timestamp: String,
    pub report: String,
}
