use rmcp::model::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::api::models::{CreateTask, ListOptions, RawContent, Task, TaskState, UpdateTask};
use crate::error::ToolError;

use super::{
    enum_property, number_property, object_schema, parse_args, pr_id_property, present,
    pull_request_schema, repo_slug_property, require_id, require_str, string_property,
    to_pretty_json, workspace_property, RepoScope, ToolContext, ToolSpec,
};

pub(super) const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "bitbucket_list_pr_tasks",
        description: "List all tasks on a pull request.",
        input_schema: pull_request_schema,
        handler: |ctx, args| Box::pin(list_pr_tasks(ctx, args)),
    },
    ToolSpec {
        name: "bitbucket_get_task",
        description: "Get a specific task by ID.",
        input_schema: get_task_schema,
        handler: |ctx, args| Box::pin(get_task(ctx, args)),
    },
    ToolSpec {
        name: "bitbucket_create_task",
        description: "Create a new task on a pull request.",
        input_schema: create_task_schema,
        handler: |ctx, args| Box::pin(create_task(ctx, args)),
    },
    ToolSpec {
        name: "bitbucket_update_task",
        description: "Update a task state (RESOLVED or UNRESOLVED) or content.",
        input_schema: update_task_schema,
        handler: |ctx, args| Box::pin(update_task(ctx, args)),
    },
];

fn get_task_schema() -> JsonObject {
    object_schema(
        vec![
            ("workspace", workspace_property()),
            ("repo_slug", repo_slug_property()),
            ("pr_id", pr_id_property()),
            ("task_id", number_property("Task ID")),
        ],
        &["workspace", "repo_slug", "pr_id", "task_id"],
    )
}

fn create_task_schema() -> JsonObject {
    object_schema(
        vec![
            ("workspace", workspace_property()),
            ("repo_slug", repo_slug_property()),
            ("pr_id", pr_id_property()),
            ("content", string_property("Task content/description")),
        ],
        &["workspace", "repo_slug", "pr_id", "content"],
    )
}

fn update_task_schema() -> JsonObject {
    let states: Vec<&str> = TaskState::ALL.iter().map(|s| s.as_str()).collect();
    object_schema(
        vec![
            ("workspace", workspace_property()),
            ("repo_slug", repo_slug_property()),
            ("pr_id", pr_id_property()),
            ("task_id", number_property("Task ID to update")),
            ("state", enum_property(&states, "New task state")),
        ],
        &["workspace", "repo_slug", "pr_id", "task_id", "state"],
    )
}

#[derive(Debug, Deserialize)]
struct TaskArgs {
    #[serde(flatten)]
    scope: RepoScope,
    #[serde(default)]
    pr_id: Option<Number>,
    #[serde(default)]
    task_id: Option<Number>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

fn require_state(value: Option<String>) -> Result<TaskState, ToolError> {
    let raw = present(value).ok_or(ToolError::MissingParam("state"))?;
    TaskState::parse(&raw).ok_or_else(|| {
        ToolError::invalid(
            "state",
            format!("expected RESOLVED or UNRESOLVED, got '{}'", raw),
        )
    })
}

#[derive(Debug, Serialize)]
struct TaskView<'a> {
    id: u64,
    content: &'a str,
    state: TaskState,
    creator: &'a str,
    created_on: &'a str,
    updated_on: &'a str,
}

impl<'a> From<&'a Task> for TaskView<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: task.id,
            content: &task.content.raw,
            state: task.state,
            creator: &task.creator.display_name,
            created_on: &task.created_on,
            updated_on: &task.updated_on,
        }
    }
}

#[derive(Debug, Serialize)]
struct TaskList<'a> {
    total: u64,
    tasks: Vec<TaskView<'a>>,
}

async fn list_pr_tasks(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: TaskArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let pr_id = require_id(args.pr_id, "pr_id")?;

    let page = ctx
        .client
        .tasks(&workspace, &repo_slug)
        .list(pr_id, &ListOptions::default())
        .await?;

    to_pretty_json(&TaskList {
        total: page.size,
        tasks: page.values.iter().map(TaskView::from).collect(),
    })
}

async fn get_task(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: TaskArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let pr_id = require_id(args.pr_id, "pr_id")?;
    let task_id = require_id(args.task_id, "task_id")?;

    let task = ctx
        .client
        .tasks(&workspace, &repo_slug)
        .get(pr_id, task_id)
        .await?;
    to_pretty_json(&TaskView::from(&task))
}

async fn create_task(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: TaskArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let pr_id = require_id(args.pr_id, "pr_id")?;
    let content = require_str(args.content, "content")?;

    let task = ctx
        .client
        .tasks(&workspace, &repo_slug)
        .create(
            pr_id,
            &CreateTask {
                content: RawContent::new(content),
            },
        )
        .await?;
    Ok(format!("Task created successfully with ID {}", task.id))
}

async fn update_task(ctx: &ToolContext, args: JsonObject) -> Result<String, ToolError> {
    let args: TaskArgs = parse_args(args)?;
    let (workspace, repo_slug) = ctx.repository(args.scope)?;
    let pr_id = require_id(args.pr_id, "pr_id")?;
    let task_id = require_id(args.task_id, "task_id")?;
    let state = require_state(args.state)?;

    ctx.client
        .tasks(&workspace, &repo_slug)
        .update(
            pr_id,
            task_id,
            &UpdateTask {
                state: Some(state),
                content: None,
            },
        )
        .await?;
    Ok(format!("Task {} updated to {}", task_id, state.as_str()))
}
