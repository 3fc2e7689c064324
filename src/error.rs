use rmcp::model::{CallToolResult, Content};

use crate::api::BitbucketError;

/// Failure of a single tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0} is required")]
    MissingParam(&'static str),

    #[error("Invalid value for {field}: {message}")]
    InvalidParam {
        field: &'static str,
        message: String,
    },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Api(#[from] BitbucketError),
}

impl ToolError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ToolError::InvalidParam {
            field,
            message: message.into(),
        }
    }

    /// Render as the `is_error` result the client sees.
    pub fn into_call_result(self) -> CallToolResult {
        CallToolResult::error(vec![Content::text(format!("Error: {}", self))])
    }
}
