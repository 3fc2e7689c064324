use rmcp::model::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::api::models::{Branch, BranchTarget, CreateBranch, ListOptions};
use crate::error::ToolError;

use super::{
    number_property, object_schema, optional_pagelen, parse_args, repo_slug_property,
    require_str, string_property, to_pretty_json, workspace_property, RepoScope, ToolContext,
    ToolSpec,
};

pub(super) const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "bitbucket_list_branches",
        description: "List all branches in a repository.",
        input_schema: list_branches_schema,
        handler: |ctx, args| Box::pin(list_branches(ctx, args)),
    },
    ToolSpec {
        name: "bitbucket_get_branch",
        description: "Get details of a specific branch.",
        input_schema: get_branch_schema,
        handler: |ctx, args| Box::pin(get_branch(ctx, args)),
    },
    ToolSpec {
        name: "bitbucket_create_branch",
        description: "Create a new branch from a specific commit.",
        input_schema: create_branch_schema,
        handler: |ctx, args| Box::pin(create_branch(ctx, args)),
    },
];

fn list_branches_schema() -> JsonObject {
    object_schema(
        vec![
            ("workspace", workspace_property()),
            ("repo_slug", repo_slug_property()),
            (
                "pagelen",
                number_property("Number of items per page (default: 50)"),
            ),
        ],
        &["workspace", "repo_slug"],
    )
}

fn get_branch_schema() -> JsonObject {
    object_schema(
        vec![
            ("workspace", workspace_property()),
            ("repo_slug", repo_slug_property()),
            ("branch_name", string_property("Branch name")),
        ],
        &["workspace", "repo_slug", "branch_name"],
    )
}

fn create_branch_schema() -> JsonObject {
    object_schema(
        vec![
            ("workspace", workspace_property()),
            ("repo_slug", repo_slug_property()),
            ("branch_name", string_property("New branch name")),
            ("target_hash", string_property("Commit hash to branch from")),
        ],
        &["workspace", "repo_slug", "branch_name", "target_hash"],
    )
}

#[derive(Debug, Deserialize)]
struct BranchArgs {
    #[serde(flatten)]
    scope: RepoScope,
    #[serde(default)]
    branch_name: Option<String>,
    #[serde(default)]
    target_hash: Option<String>,
    #[serde(default)]
    pagelen: Option<Number>,
}

#[derive(Debug, Serialize)]
struct TargetView<'a> {
    hash: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<&'a str>,
    author: &'a str,
    message: &'a str,
}

impl<'a> From<&'a BranchTarget> for TargetView<'a> {
    fn from(target: &'a BranchTarget) -> Self {
        Self {
            hash: &target.hash,
            date: target.date.as_deref(),
            author: target.author.display_name(),
            message: &target.message,
        }
    }
}

#[derive(Debug, Serialize)]
struct BranchSummary<'a> {
    name: &'a str,
    target: TargetView<'a>,
}

#[derive(Debug, Serialize)]
struct BranchList<'a> {
    total: u64,
    branches: Vec<BranchSummary<'a>>,
}

#[derive(Debug, Serialize)]
struct BranchDetails<'a> {
    name: &'a str,
    target: TargetView<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_merge_strategy: Option<&'a str>,
    merge_strategies: &'a [String],
}

impl<'a> From<&'a Branch> for BranchDetails<'a> {
    fn from(branch: &'a Branch) -> Self {
        Self {
            name: &branch.name,
            target: TargetView::from(&branch.target),
            default_merge_strategy: branch.default_merge_strategy.as_deref(),
            merge_strategies: &branch.merge_strategies,
        }
    }
}

async fn list_branches(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: BranchArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let options = ListOptions {
        pagelen: optional_pagelen(args.pagelen)?,
        ..Default::default()
    };

    let page = ctx
        .client
        .branches(&workspace, &repo_slug)
        .list(&options)
        .await?;

    to_pretty_json(&BranchList {
        total: page.size,
        branches: page
            .values
            .iter()
            .map(|branch| BranchSummary {
                name: &branch.name,
                target: TargetView::from(&branch.target),
            })
            .collect(),
    })
}

async fn get_branch(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: BranchArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let branch_name = require_str(args.branch_name, "branch_name")?;

    let branch = ctx
        .client
        .branches(&workspace, &repo_slug)
        .get(&branch_name)
        .await?;
    to_pretty_json(&BranchDetails::from(&branch))
}

async fn create_branch(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: BranchArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let branch_name = require_str(args.branch_name, "branch_name")?;
    let target_hash = require_str(args.target_hash, "target_hash")?;

    let branch = ctx
        .client
        .branches(&workspace, &repo_slug)
        .create(&CreateBranch::new(branch_name, target_hash))
        .await?;
    Ok(format!(
        "Branch '{}' created successfully at commit {}",
        branch.name, branch.target.hash
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::tools::test_support::{args, context};

    fn branch_json(name: &str) -> Value {
        json!({
            "name": name,
            "target": {
                "hash": "def456",
                "date": "2024-05-01T00:00:00+00:00",
                "author": {"raw": "Frank <frank@example.com>", "user": {"display_name": "Frank"}},
                "message": "Bump version"
            },
            "merge_strategies": ["merge_commit", "squash", "fast_forward"],
            "default_merge_strategy": "merge_commit"
        })
    }

    #[tokio::test]
    async fn test_list_branches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/ws/web/refs/branches"))
            .and(query_param("pagelen", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "size": 1,
                "values": [branch_json("main")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(&server, Some("web"));
        let text = list_branches(&ctx, args(json!({"pagelen": 5}))).await.unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({
                "total": 1,
                "branches": [{
                    "name": "main",
                    "target": {
                        "hash": "def456",
                        "date": "2024-05-01T00:00:00+00:00",
                        "author": "Frank",
                        "message": "Bump version"
                    }
                }]
            })
        );
    }

    #[tokio::test]
    async fn test_get_branch_with_slash() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/ws/web/refs/branches/release%2F2.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(branch_json("release/2.0")))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(&server, Some("web"));
        let text = get_branch(&ctx, args(json!({"branch_name": "release/2.0"})))
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["name"], "release/2.0");
        assert_eq!(value["default_merge_strategy"], "merge_commit");
        assert_eq!(
            value["merge_strategies"],
            json!(["merge_commit", "squash", "fast_forward"])
        );
    }

    #[tokio::test]
    async fn test_get_branch_requires_name() {
        let server = MockServer::start().await;
        let ctx = context(&server, Some("web"));
        let err = get_branch(&ctx, args(json!({}))).await.unwrap_err();
        assert_eq!(err.to_string(), "branch_name is required");
    }
}
