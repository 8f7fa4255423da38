// ABOUTME: Operation request and response contract for node agents.
// ABOUTME: Mirrors the agent upload protocol field for field.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::task::AfterAction;
use crate::types::ProjectId;

/// Response code a node agent returns on success; anything else is failure.
pub const SUCCESS_CODE: i32 = 200;

/// One artifact delivery request for a single project on a single node.
///
/// Optional fields are omitted from the serialized form entirely, matching
/// the agent's expectations: `strip_components` only accompanies an unzip,
/// and `sleep_time` is only sent by ordered rollouts so the agent can
/// reason about pacing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// The artifact to deliver.
    pub file: PathBuf,

    /// Which project on the remote node to update.
    #[serde(rename = "id")]
    pub project: ProjectId,

    /// Sub-path within the project's storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_name: Option<String>,

    /// Decompress the artifact on arrival.
    pub unzip: bool,

    /// Leading path segments to strip when unpacking. Present only when
    /// `unzip` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip_components: Option<u32>,

    /// Wipe the target directory before writing.
    pub clear_old: bool,

    /// Post-upload action, as the agent's numeric code. Absent means the
    /// agent takes no action after writing files.
    #[serde(rename = "after", skip_serializing_if = "Option::is_none")]
    pub after_action: Option<AfterAction>,

    /// Stop the running process before overwriting its files.
    pub close_first: bool,

    /// Inter-step delay in seconds, informational, ordered rollouts only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_time: Option<u64>,
}

/// Structured response from a node agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub code: i32,
    #[serde(default, rename = "msg")]
    pub message: String,
}

impl AgentResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: message.into(),
        }
    }

    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}
