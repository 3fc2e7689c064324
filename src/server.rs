use std::sync::Arc;

use rmcp::model::*;
use rmcp::service::{RequestContext, RoleServer};
use rmcp::ServerHandler;

use crate::api::BitbucketClient;
use crate::config::ServerConfig;
use crate::error::ToolError;
use crate::tools::{self, ToolContext};

#[derive(Debug, Clone)]
pub struct BitbucketServer {
    context: Arc<ToolContext>,
}

impl BitbucketServer {
    pub fn new(client: BitbucketClient, config: ServerConfig) -> Self {
        Self {
            context: Arc::new(ToolContext::new(client, config)),
        }
    }

    /// Run one tool by name. Failures come back as an `is_error` result,
    /// never as a protocol error.
    pub async fn call(&self, name: &str, arguments: JsonObject) -> CallToolResult {
        tracing::info!(tool = name, "Tool call");

        let outcome = match tools::find(name) {
            Some(spec) => (spec.handler)(&self.context, arguments).await,
            None => Err(ToolError::UnknownTool(name.to_string())),
        };

        match outcome {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                e.into_call_result()
            }
        }
    }
}

impl ServerHandler for BitbucketServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mcp-bitbucket".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Bitbucket Cloud server. Use bitbucket_list_pull_requests/bitbucket_get_pull_request \
                 for PRs, bitbucket_get_pr_commits and bitbucket_get_pr_diff to review changes, \
                 the comment and task tools to discuss a PR, and the branch tools to inspect or \
                 create branches. workspace and repo_slug fall back to the configured defaults."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(tools::tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = request.arguments.unwrap_or_default();
        Ok(self.call(request.name.as_ref(), arguments).await)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use wiremock::matchers::{basic_auth, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::ClientConfig;
    use crate::tools::test_support::{args, config};

    fn make_server(mock: &MockServer, default_repo: Option<&str>) -> BitbucketServer {
        let config = config(default_repo);
        let client = BitbucketClient::new(
            ClientConfig::new(config.credentials.clone()).base_url(mock.uri()),
        )
        .unwrap();
        BitbucketServer::new(client, config)
    }

    fn text_of(result: &CallToolResult) -> (String, bool) {
        let value = serde_json::to_value(result).unwrap();
        let text = value["content"][0]["text"].as_str().unwrap().to_string();
        let is_error = value["isError"].as_bool().unwrap_or(false);
        (text, is_error)
    }

    #[tokio::test]
    async fn test_create_branch_success() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repositories/ws/web/refs/branches"))
            .and(basic_auth("user", "pass"))
            .and(body_json(json!({"name": "feature/x", "target": {"hash": "abc123"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "name": "feature/x",
                "target": {"hash": "abc123"}
            })))
            .expect(1)
            .mount(&mock)
            .await;

        let server = make_server(&mock, None);
        let result = server
            .call(
                "bitbucket_create_branch",
                args(json!({
                    "workspace": "ws",
                    "repo_slug": "web",
                    "branch_name": "feature/x",
                    "target_hash": "abc123"
                })),
            )
            .await;

        let (text, is_error) = text_of(&result);
        assert!(!is_error);
        assert_eq!(text, "Branch 'feature/x' created successfully at commit abc123");
    }

    #[tokio::test]
    async fn test_create_branch_missing_hash_makes_no_request() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&mock)
            .await;

        let server = make_server(&mock, Some("web"));
        let result = server
            .call(
                "bitbucket_create_branch",
                args(json!({"branch_name": "feature/x"})),
            )
            .await;

        let (text, is_error) = text_of(&result);
        assert!(is_error);
        assert!(text.contains("target_hash is required"));
        assert_eq!(text, "Error: target_hash is required");
        assert!(mock.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_default_workspace_and_repo() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/ws/web/pullrequests/4/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"size": 0, "values": []})))
            .expect(1)
            .mount(&mock)
            .await;

        let server = make_server(&mock, Some("web"));
        let result = server
            .call(
                "bitbucket_list_pr_tasks",
                args(json!({"workspace": "", "pr_id": 4})),
            )
            .await;

        let (text, is_error) = text_of(&result);
        assert!(!is_error);
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({"total": 0, "tasks": []}));
    }

    #[tokio::test]
    async fn test_missing_repo_without_default() {
        let mock = MockServer::start().await;
        let server = make_server(&mock, None);
        let result = server
            .call("bitbucket_list_branches", JsonObject::new())
            .await;

        let (text, is_error) = text_of(&result);
        assert!(is_error);
        assert_eq!(text, "Error: repo_slug is required");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let mock = MockServer::start().await;
        let server = make_server(&mock, Some("web"));
        let result = server.call("bitbucket_merge_everything", JsonObject::new()).await;

        let (text, is_error) = text_of(&result);
        assert!(is_error);
        assert_eq!(text, "Error: Unknown tool: bitbucket_merge_everything");
    }

    #[tokio::test]
    async fn test_api_error_is_reported_as_text() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/ws/web/pullrequests/999"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "type": "error",
                "error": {"message": "Pull request not found"}
            })))
            .mount(&mock)
            .await;

        let server = make_server(&mock, Some("web"));
        let result = server
            .call("bitbucket_get_pull_request", args(json!({"pr_id": 999})))
            .await;

        let (text, is_error) = text_of(&result);
        assert!(is_error);
        assert_eq!(text, "Error: Resource not found: Pull request not found");
    }

    #[tokio::test]
    async fn test_rate_limit_message() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/ws/web/refs/branches"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "30")
                    .set_body_json(json!({"message": "Rate limit exceeded"})),
            )
            .mount(&mock)
            .await;

        let server = make_server(&mock, Some("web"));
        let result = server.call("bitbucket_list_branches", JsonObject::new()).await;

        let (text, is_error) = text_of(&result);
        assert!(is_error);
        assert_eq!(text, "Error: Rate limit exceeded");
    }

    #[tokio::test]
    async fn test_wrong_argument_type() {
        let mock = MockServer::start().await;
        let server = make_server(&mock, Some("web"));
        let result = server
            .call("bitbucket_get_task", args(json!({"pr_id": "five", "task_id": 1})))
            .await;

        let (text, is_error) = text_of(&result);
        assert!(is_error);
        assert!(text.starts_with("Error: Invalid arguments:"));
    }

    #[test]
    fn test_get_info() {
        let mock_config = config(None);
        let client = BitbucketClient::new(mock_config.client_config()).unwrap();
        let server = BitbucketServer::new(client, mock_config);
        let info = server.get_info();
        assert_eq!(info.server_info.name, "mcp-bitbucket");
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("bitbucket_list_pull_requests"));
    }
}
