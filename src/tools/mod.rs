//! The MCP tool catalog.
//!
//! Each tool is a [`ToolSpec`]: its name, description, input schema and the
//! handler that runs it. Handlers parse their own arguments, apply the
//! workspace/repository defaults from [`ServerConfig`], call the API and
//! return the text sent back to the client.

mod branches;
mod comments;
mod pullrequests;
mod tasks;

use futures::future::BoxFuture;
use rmcp::model::{JsonObject, Tool};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};

use crate::api::BitbucketClient;
use crate::config::ServerConfig;
use crate::error::ToolError;

/// Shared state handed to every tool invocation.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub client: BitbucketClient,
    pub config: ServerConfig,
}

impl ToolContext {
    pub fn new(client: BitbucketClient, config: ServerConfig) -> Self {
        Self { client, config }
    }

    /// Workspace and repository for a call, falling back to the configured
    /// defaults when the arguments leave them out.
    pub(crate) fn repository(&self, scope: RepoScope) -> Result<(String, String), ToolError> {
        let workspace = present(scope.workspace).unwrap_or_else(|| self.config.workspace.clone());
        let repo_slug = present(scope.repo_slug)
            .or_else(|| self.config.default_repo.clone())
            .ok_or(ToolError::MissingParam("repo_slug"))?;
        Ok((workspace, repo_slug))
    }
}

pub type ToolFuture<'a> = BoxFuture<'a, Result<String, ToolError>>;
pub type ToolHandler = for<'a> fn(&'a ToolContext, JsonObject) -> ToolFuture<'a>;

pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: fn() -> JsonObject,
    pub handler: ToolHandler,
}

impl ToolSpec {
    pub fn tool(&self) -> Tool {
        Tool::new(self.name, self.description, (self.input_schema)())
    }
}

pub fn catalog() -> impl Iterator<Item = &'static ToolSpec> {
    [
        pullrequests::TOOLS,
        comments::TOOLS,
        tasks::TOOLS,
        branches::TOOLS,
    ]
    .into_iter()
    .flatten()
}

pub fn find(name: &str) -> Option<&'static ToolSpec> {
    catalog().find(|spec| spec.name == name)
}

pub fn tools() -> Vec<Tool> {
    catalog().map(ToolSpec::tool).collect()
}

// -- Argument handling --

/// `workspace` / `repo_slug`, accepted by every tool.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RepoScope {
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub repo_slug: Option<String>,
}

pub(crate) fn parse_args<T: DeserializeOwned>(args: JsonObject) -> Result<T, ToolError> {
    Ok(serde_json::from_value(Value::Object(args))?)
}

/// Empty strings count as absent.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub(crate) fn require_str(value: Option<String>, field: &'static str) -> Result<String, ToolError> {
    present(value).ok_or(ToolError::MissingParam(field))
}

/// Identifiers arrive as JSON numbers; zero counts as absent.
pub(crate) fn require_id(value: Option<Number>, field: &'static str) -> Result<u64, ToolError> {
    match value {
        None => Err(ToolError::MissingParam(field)),
        Some(number) => match positive_integer(&number) {
            Some(0) => Err(ToolError::MissingParam(field)),
            Some(id) => Ok(id),
            None => Err(ToolError::invalid(field, "must be a positive integer")),
        },
    }
}

pub(crate) fn optional_pagelen(value: Option<Number>) -> Result<Option<u32>, ToolError> {
    let Some(number) = value else {
        return Ok(None);
    };
    match positive_integer(&number) {
        Some(0) => Ok(None),
        Some(n) => u32::try_from(n)
            .map(Some)
            .map_err(|_| ToolError::invalid("pagelen", "is too large")),
        None => Err(ToolError::invalid("pagelen", "must be a positive integer")),
    }
}

fn positive_integer(number: &Number) -> Option<u64> {
    if let Some(n) = number.as_u64() {
        return Some(n);
    }
    number
        .as_f64()
        .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
        .map(|f| f as u64)
}

pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, ToolError> {
    Ok(serde_json::to_string_pretty(value)?)
}

// -- Schemas --

pub(crate) fn string_property(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

pub(crate) fn number_property(description: &str) -> Value {
    json!({ "type": "number", "description": description })
}

pub(crate) fn enum_property(values: &[&str], description: &str) -> Value {
    json!({ "type": "string", "enum": values, "description": description })
}

pub(crate) fn workspace_property() -> Value {
    string_property("Bitbucket workspace ID")
}

pub(crate) fn repo_slug_property() -> Value {
    string_property("Repository slug")
}

pub(crate) fn pr_id_property() -> Value {
    number_property("Pull request ID")
}

pub(crate) fn object_schema(properties: Vec<(&str, Value)>, required: &[&str]) -> JsonObject {
    let properties: JsonObject = properties
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect();

    let mut schema = JsonObject::new();
    schema.insert("type".to_string(), Value::from("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    schema.insert("required".to_string(), json!(required));
    schema
}

/// Schema shared by the tools that take only a pull request.
pub(crate) fn pull_request_schema() -> JsonObject {
    object_schema(
        vec![
            ("workspace", workspace_property()),
            ("repo_slug", repo_slug_property()),
            ("pr_id", pr_id_property()),
        ],
        &["workspace", "repo_slug", "pr_id"],
    )
}


#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    const EXPECTED_TOOLS: [&str; 15] = [
        "bitbucket_list_pull_requests",
        "bitbucket_get_pull_request",
        "bitbucket_get_pr_commits",
        "bitbucket_get_pr_diff",
        "bitbucket_list_pr_comments",
        "bitbucket_get_comment",
        "bitbucket_create_comment",
        "bitbucket_delete_comment",
        "bitbucket_list_pr_tasks",
        "bitbucket_get_task",
        "bitbucket_create_task",
        "bitbucket_update_task",
        "bitbucket_list_branches",
        "bitbucket_get_branch",
        "bitbucket_create_branch",
    ];

    #[test]
    fn test_catalog_is_exhaustive() {
        let names: Vec<&str> = catalog().map(|spec| spec.name).collect();
        assert_eq!(names, EXPECTED_TOOLS);

        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len());

        for name in EXPECTED_TOOLS {
            let spec = find(name).unwrap_or_else(|| panic!("missing tool {name}"));
            let schema = (spec.input_schema)();
            assert_eq!(schema["type"], "object", "{name}");
            assert!(schema["properties"].is_object(), "{name}");
            let required = schema["required"].as_array().unwrap();
            assert!(required.contains(&json!("workspace")), "{name}");
            assert!(required.contains(&json!("repo_slug")), "{name}");
            for field in required {
                let field = field.as_str().unwrap();
                assert!(
                    schema["properties"].get(field).is_some(),
                    "{name} requires undeclared {field}"
                );
            }
            assert!(!spec.description.is_empty());
        }
    }

    #[test]
    fn test_find_unknown() {
        assert!(find("bitbucket_delete_repository").is_none());
    }

    #[test]
    fn test_tools_carry_schema() {
        let tools = tools();
        assert_eq!(tools.len(), 15);
        let update = tools
            .iter()
            .find(|tool| tool.name == "bitbucket_update_task")
            .unwrap();
        assert_eq!(
            update.input_schema["properties"]["state"],
            json!({
                "type": "string",
                "enum": ["RESOLVED", "UNRESOLVED"],
                "description": "New task state"
            })
        );
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id(Some(Number::from(42)), "pr_id").unwrap(), 42);
        assert_eq!(
            require_id(Number::from_f64(7.0), "pr_id").unwrap(),
            7
        );
        assert_eq!(
            require_id(None, "pr_id").unwrap_err().to_string(),
            "pr_id is required"
        );
        assert_eq!(
            require_id(Some(Number::from(0)), "task_id")
                .unwrap_err()
                .to_string(),
            "task_id is required"
        );
        assert!(matches!(
            require_id(Number::from_f64(1.5), "pr_id"),
            Err(ToolError::InvalidParam { field: "pr_id", .. })
        ));
        assert!(matches!(
            require_id(Some(Number::from(-3)), "pr_id"),
            Err(ToolError::InvalidParam { .. })
        ));
    }

    #[test]
    fn test_optional_pagelen() {
        assert_eq!(optional_pagelen(None).unwrap(), None);
        assert_eq!(optional_pagelen(Some(Number::from(25))).unwrap(), Some(25));
        assert_eq!(optional_pagelen(Some(Number::from(0))).unwrap(), None);
        assert!(optional_pagelen(Some(Number::from(u64::MAX))).is_err());
    }

    #[test]
    fn test_present_treats_empty_as_absent() {
        assert_eq!(present(Some(String::new())), None);
        assert_eq!(present(Some("x".to_string())).as_deref(), Some("x"));
        assert_eq!(
            require_str(Some(String::new()), "content")
                .unwrap_err()
                .to_string(),
            "content is required"
        );
    }
}
