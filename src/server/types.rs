// HTTP request/response bodies

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;

pub const STATUS_OK: u8 = 0;
pub const STATUS_ERROR: u8 = 1;

pub const MSG_INDEX: &str = "Object Readability Service";
pub const MSG_SUCCESS: &str = "success";
pub const MSG_MODEL_LOADED: &str = "Model and tokenizer loaded successfully";

/// Envelope shared by every route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    pub status: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<AnalysisResult>,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: STATUS_OK,
            output: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: STATUS_ERROR,
            output: None,
        }
    }

    pub fn with_output(mut self, output: AnalysisResult) -> Self {
        self.output = Some(output);
        self
    }
}

/// Body of `POST /load`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadRequest {
    #[serde(default)]
    pub model: Option<String>,
}

/// Body of `POST /object_analysis`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub objeto: Option<String>,
}
