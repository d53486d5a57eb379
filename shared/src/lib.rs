use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Verdict the detector assigns to an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Label {
    Real,
    Fake,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalyzeResponse {
    pub prediction: Label,
    /// Percentage string with two decimals, e.g. "87.34%".
    pub confidence: String,
}
