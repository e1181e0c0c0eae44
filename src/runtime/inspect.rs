//! `container inspect` output

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Status string reported for a live container
pub const STATUS_RUNNING: &str = "running";

/// Network attachment of an inspected container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAttachment {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub gateway: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub network: String,
}

/// One inspection record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectData {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub networks: Vec<NetworkAttachment>,
}

impl InspectData {
    /// Check if the container is running
    pub fn is_running(&self) -> bool {
        self.status == STATUS_RUNNING
    }
}

/// Decode inspect output.
///
/// The runtime prints a JSON array for the queried name. An empty array means
/// no such container and yields `None`.
pub fn parse_inspect_output(stdout: &[u8]) -> Result<Option<InspectData>> {
    let records: Vec<InspectData> = serde_json::from_slice(stdout)?;
    Ok(records.into_iter().next())
}
