use rmcp::model::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::api::models::{Comment, CreateComment, InlineInfo, ListOptions};
use crate::error::ToolError;

use super::{
    number_property, object_schema, parse_args, pr_id_property, pull_request_schema,
    repo_slug_property, require_id, require_str, string_property, to_pretty_json,
    workspace_property, RepoScope, ToolContext, ToolSpec,
};

pub(super) const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "bitbucket_list_pr_comments",
        description: "List all comments on a pull request.",
        input_schema: pull_request_schema,
        handler: |ctx, args| Box::pin(list_pr_comments(ctx, args)),
    },
    ToolSpec {
        name: "bitbucket_get_comment",
        description: "Get a specific comment by ID.",
        input_schema: get_comment_schema,
        handler: |ctx, args| Box::pin(get_comment(ctx, args)),
    },
    ToolSpec {
        name: "bitbucket_create_comment",
        description: "Create a new comment on a pull request. Supports markdown formatting.",
        input_schema: create_comment_schema,
        handler: |ctx, args| Box::pin(create_comment(ctx, args)),
    },
    ToolSpec {
        name: "bitbucket_delete_comment",
        description: "Delete a comment from a pull request.",
        input_schema: delete_comment_schema,
        handler: |ctx, args| Box::pin(delete_comment(ctx, args)),
    },
];

fn comment_id_schema(comment_id_description: &str) -> JsonObject {
    object_schema(
        vec![
            ("workspace", workspace_property()),
            ("repo_slug", repo_slug_property()),
            ("pr_id", pr_id_property()),
            ("comment_id", number_property(comment_id_description)),
        ],
        &["workspace", "repo_slug", "pr_id", "comment_id"],
    )
}

fn get_comment_schema() -> JsonObject {
    comment_id_schema("Comment ID")
}

fn delete_comment_schema() -> JsonObject {
    comment_id_schema("Comment ID to delete")
}

fn create_comment_schema() -> JsonObject {
    object_schema(
        vec![
            ("workspace", workspace_property()),
            ("repo_slug", repo_slug_property()),
            ("pr_id", pr_id_property()),
            (
                "content",
                string_property("Comment content (markdown supported)"),
            ),
        ],
        &["workspace", "repo_slug", "pr_id", "content"],
    )
}

#[derive(Debug, Deserialize)]
struct CommentArgs {
    #[serde(flatten)]
    scope: RepoScope,
    #[serde(default)]
    pr_id: Option<Number>,
    #[serde(default)]
    comment_id: Option<Number>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct InlineView<'a> {
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<u64>,
}

#[derive(Debug, Serialize)]
struct CommentSummary<'a> {
    id: u64,
    content: &'a str,
    author: &'a str,
    created_on: &'a str,
    updated_on: &'a str,
    deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline: Option<InlineView<'a>>,
}

impl<'a> From<&'a Comment> for CommentSummary<'a> {
    fn from(comment: &'a Comment) -> Self {
        Self {
            id: comment.id,
            content: &comment.content.raw,
            author: &comment.user.display_name,
            created_on: &comment.created_on,
            updated_on: &comment.updated_on,
            deleted: comment.deleted,
            inline: comment.inline.as_ref().map(|inline| InlineView {
                path: &inline.path,
                from: inline.from,
                to: inline.to,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct CommentList<'a> {
    total: u64,
    comments: Vec<CommentSummary<'a>>,
}

#[derive(Debug, Serialize)]
struct CommentBody<'a> {
    raw: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CommentDetails<'a> {
    id: u64,
    content: CommentBody<'a>,
    author: &'a str,
    created_on: &'a str,
    updated_on: &'a str,
    deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline: Option<&'a InlineInfo>,
}

impl<'a> From<&'a Comment> for CommentDetails<'a> {
    fn from(comment: &'a Comment) -> Self {
        Self {
            id: comment.id,
            content: CommentBody {
                raw: &comment.content.raw,
                html: comment.content.html.as_deref(),
            },
            author: &comment.user.display_name,
            created_on: &comment.created_on,
            updated_on: &comment.updated_on,
            deleted: comment.deleted,
            inline: comment.inline.as_ref(),
        }
    }
}

async fn list_pr_comments(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: CommentArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let pr_id = require_id(args.pr_id, "pr_id")?;

    let page = ctx
        .client
        .comments(&workspace, &repo_slug)
        .list(pr_id, &ListOptions::default())
        .await?;

    to_pretty_json(&CommentList {
        total: page.size,
        comments: page.values.iter().map(CommentSummary::from).collect(),
    })
}

async fn get_comment(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: CommentArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let pr_id = require_id(args.pr_id, "pr_id")?;
    let comment_id = require_id(args.comment_id, "comment_id")?;

    let comment = ctx
        .client
        .comments(&workspace, &repo_slug)
        .get(pr_id, comment_id)
        .await?;
    to_pretty_json(&CommentDetails::from(&comment))
}

async fn create_comment(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: CommentArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let pr_id = require_id(args.pr_id, "pr_id")?;
    let content = require_str(args.content, "content")?;

    let comment = ctx
        .client
        .comments(&workspace, &repo_slug)
        .create(pr_id, &CreateComment::new(content))
        .await?;
    Ok(format!("Comment created successfully with ID {}", comment.id))
}

async fn delete_comment(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: CommentArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let pr_id = require_id(args.pr_id, "pr_id")?;
    let comment_id = require_id(args.comment_id, "comment_id")?;

    ctx.client
        .comments(&workspace, &repo_slug)
        .delete(pr_id, comment_id)
        .await?;
    Ok(format!("Comment {} deleted successfully", comment_id))
}
