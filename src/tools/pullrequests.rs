use rmcp::model::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::api::models::{
    Commit, ListOptions, ListPullRequestsOptions, Participant, PullRequest, PullRequestState,
};
use crate::error::ToolError;

use super::{
    enum_property, number_property, object_schema, optional_pagelen, parse_args, present,
    pull_request_schema, repo_slug_property, require_id, to_pretty_json, workspace_property,
    RepoScope, ToolContext, ToolSpec,
};

pub(super) const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "bitbucket_list_pull_requests",
        description: "List pull requests for a Bitbucket repository. Returns PR titles, IDs, states, authors, and descriptions.",
        input_schema: list_pull_requests_schema,
        handler: |ctx, args| Box::pin(list_pull_requests(ctx, args)),
    },
    ToolSpec {
        name: "bitbucket_get_pull_request",
        description: "Get detailed information about a specific pull request including description, reviewers, participants, and status.",
        input_schema: pull_request_schema,
        handler: |ctx, args| Box::pin(get_pull_request(ctx, args)),
    },
    ToolSpec {
        name: "bitbucket_get_pr_commits",
        description: "Get the list of commits included in a pull request.",
        input_schema: pull_request_schema,
        handler: |ctx, args| Box::pin(get_pr_commits(ctx, args)),
    },
    ToolSpec {
        name: "bitbucket_get_pr_diff",
        description: "Get the diff for a pull request showing all code changes.",
        input_schema: pull_request_schema,
        handler: |ctx, args| Box::pin(get_pr_diff(ctx, args)),
    },
];

fn list_pull_requests_schema() -> JsonObject {
    let states: Vec<&str> = PullRequestState::ALL.iter().map(|s| s.as_str()).collect();
    object_schema(
        vec![
            ("workspace", workspace_property()),
            ("repo_slug", repo_slug_property()),
            (
                "state",
                enum_property(&states, "Filter by PR state (optional)"),
            ),
            (
                "pagelen",
                number_property("Number of items per page (default: 50)"),
            ),
        ],
        &["workspace", "repo_slug"],
    )
}

// -- Arguments --

#[derive(Debug, Deserialize)]
struct ListArgs {
    #[serde(flatten)]
    scope: RepoScope,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    pagelen: Option<Number>,
}

#[derive(Debug, Deserialize)]
struct PullRequestArgs {
    #[serde(flatten)]
    scope: RepoScope,
    #[serde(default)]
    pr_id: Option<Number>,
}

fn parse_state(value: Option<String>) -> Result<Option<PullRequestState>, ToolError> {
    match present(value) {
        None => Ok(None),
        Some(raw) => PullRequestState::parse(&raw).map(Some).ok_or_else(|| {
            ToolError::invalid(
                "state",
                format!("expected one of OPEN, MERGED, DECLINED, SUPERSEDED, got '{}'", raw),
            )
        }),
    }
}

// -- Projections --

#[derive(Debug, Serialize)]
struct PullRequestSummary<'a> {
    id: u64,
    title: &'a str,
    state: PullRequestState,
    author: &'a str,
    created_on: &'a str,
    updated_on: &'a str,
    source_branch: &'a str,
    destination_branch: &'a str,
    comment_count: u64,
    task_count: u64,
}

impl<'a> From<&'a PullRequest> for PullRequestSummary<'a> {
    fn from(pr: &'a PullRequest) -> Self {
        Self {
            id: pr.id,
            title: &pr.title,
            state: pr.state,
            author: &pr.author.display_name,
            created_on: &pr.created_on,
            updated_on: &pr.updated_on,
            source_branch: &pr.source.branch.name,
            destination_branch: &pr.destination.branch.name,
            comment_count: pr.comment_count,
            task_count: pr.task_count,
        }
    }
}

#[derive(Debug, Serialize)]
struct PullRequestList<'a> {
    total: u64,
    pull_requests: Vec<PullRequestSummary<'a>>,
}

#[derive(Debug, Serialize)]
struct ParticipantView<'a> {
    name: &'a str,
    role: &'a str,
    approved: bool,
}

impl<'a> From<&'a Participant> for ParticipantView<'a> {
    fn from(participant: &'a Participant) -> Self {
        Self {
            name: &participant.user.display_name,
            role: &participant.role,
            approved: participant.approved,
        }
    }
}

#[derive(Debug, Serialize)]
struct PullRequestDetails<'a> {
    id: u64,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    state: PullRequestState,
    author: &'a str,
    created_on: &'a str,
    updated_on: &'a str,
    source_branch: &'a str,
    destination_branch: &'a str,
    comment_count: u64,
    task_count: u64,
    reviewers: Vec<&'a str>,
    participants: Vec<ParticipantView<'a>>,
}

impl<'a> From<&'a PullRequest> for PullRequestDetails<'a> {
    fn from(pr: &'a PullRequest) -> Self {
        Self {
            id: pr.id,
            title: &pr.title,
            description: pr.description.as_deref(),
            state: pr.state,
            author: &pr.author.display_name,
            created_on: &pr.created_on,
            updated_on: &pr.updated_on,
            source_branch: &pr.source.branch.name,
            destination_branch: &pr.destination.branch.name,
            comment_count: pr.comment_count,
            task_count: pr.task_count,
            reviewers: pr
                .reviewers
                .iter()
                .map(|r| r.display_name.as_str())
                .collect(),
            participants: pr.participants.iter().map(ParticipantView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CommitView<'a> {
    hash: &'a str,
    message: &'a str,
    author: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<&'a str>,
}

impl<'a> From<&'a Commit> for CommitView<'a> {
    fn from(commit: &'a Commit) -> Self {
        Self {
            hash: &commit.hash,
            message: &commit.message,
            author: &commit.author.raw,
            date: commit.date.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CommitList<'a> {
    total: u64,
    commits: Vec<CommitView<'a>>,
}

// -- Handlers --

async fn list_pull_requests(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: ListArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let options = ListPullRequestsOptions {
        list: ListOptions {
            pagelen: optional_pagelen(args.pagelen)?,
            ..Default::default()
        },
        state: parse_state(args.state)?,
    };

    let page = ctx
        .client
        .pull_requests(&workspace, &repo_slug)
        .list(&options)
        .await?;

    to_pretty_json(&PullRequestList {
        total: page.size,
        pull_requests: page.values.iter().map(PullRequestSummary::from).collect(),
    })
}

async fn get_pull_request(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: PullRequestArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let pr_id = require_id(args.pr_id, "pr_id")?;

    let pr = ctx
        .client
        .pull_requests(&workspace, &repo_slug)
        .get(pr_id)
        .await?;
    to_pretty_json(&PullRequestDetails::from(&pr))
}

async fn get_pr_commits(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: PullRequestArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let pr_id = require_id(args.pr_id, "pr_id")?;

    let page = ctx
        .client
        .pull_requests(&workspace, &repo_slug)
        .commits(pr_id, &ListOptions::default())
        .await?;

    to_pretty_json(&CommitList {
        total: page.size,
        commits: page.values.iter().map(CommitView::from).collect(),
    })
}

async fn get_pr_diff(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: PullRequestArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let pr_id = require_id(args.pr_id, "pr_id")?;

    Ok(ctx
        .client
        .pull_requests(&workspace, &repo_slug)
        .diff(pr_id)
        .await?)
}
