//! Wire types for the Bitbucket Cloud 2.0 API.
//!
//! Only the fields this crate reads are modelled; serde ignores the rest.
//! Fields the API omits in some responses are optional or defaulted.

use serde::{Deserialize, Serialize};

/// Envelope returned by every list endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pagelen: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct User {
    pub display_name: String,
    pub uuid: Option<String>,
    pub nickname: Option<String>,
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RenderedContent {
    #[serde(default)]
    pub raw: String,
    #[serde(default)]
    pub markup: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestState {
    Open,
    Merged,
    Declined,
    Superseded,
}

impl PullRequestState {
    pub const ALL: [PullRequestState; 4] = [
        PullRequestState::Open,
        PullRequestState::Merged,
        PullRequestState::Declined,
        PullRequestState::Superseded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestState::Open => "OPEN",
            PullRequestState::Merged => "MERGED",
            PullRequestState::Declined => "DECLINED",
            PullRequestState::Superseded => "SUPERSEDED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_str() == value)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BranchName {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommitRef {
    pub hash: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RepositoryRef {
    pub name: String,
    pub full_name: String,
    pub uuid: Option<String>,
}

/// Source or destination side of a pull request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BranchInfo {
    pub branch: BranchName,
    #[serde(default)]
    pub commit: Option<CommitRef>,
    #[serde(default)]
    pub repository: Option<RepositoryRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Participant {
    pub user: User,
    pub role: String,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub participated_on: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub state: PullRequestState,
    pub author: User,
    pub source: BranchInfo,
    pub destination: BranchInfo,
    #[serde(default)]
    pub merge_commit: Option<CommitRef>,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub task_count: u64,
    #[serde(default)]
    pub close_source_branch: bool,
    #[serde(default)]
    pub closed_by: Option<User>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub created_on: String,
    #[serde(default)]
    pub updated_on: String,
    #[serde(default)]
    pub reviewers: Vec<User>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

/// Author line of a commit. `user` is only present when Bitbucket could map
/// the raw author to an account.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CommitAuthor {
    pub raw: String,
    pub user: Option<User>,
}

impl CommitAuthor {
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|user| user.display_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.raw)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Commit {
    pub hash: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub author: CommitAuthor,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub parents: Vec<CommitRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InlineInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommentParent {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Comment {
    pub id: u64,
    pub content: RenderedContent,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub created_on: String,
    #[serde(default)]
    pub updated_on: String,
    #[serde(default)]
    pub inline: Option<InlineInfo>,
    #[serde(default)]
    pub parent: Option<CommentParent>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub pending: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Resolved,
    Unresolved,
}

impl TaskState {
    pub const ALL: [TaskState; 2] = [TaskState::Resolved, TaskState::Unresolved];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Resolved => "RESOLVED",
            TaskState::Unresolved => "UNRESOLVED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_str() == value)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Task {
    pub id: u64,
    pub content: RenderedContent,
    pub state: TaskState,
    #[serde(default)]
    pub creator: User,
    #[serde(default)]
    pub created_on: String,
    #[serde(default)]
    pub updated_on: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BranchTarget {
    pub hash: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub author: CommitAuthor,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub parents: Vec<CommitRef>,
    #[serde(default)]
    pub repository: Option<RepositoryRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Branch {
    pub name: String,
    pub target: BranchTarget,
    #[serde(default)]
    pub default_merge_strategy: Option<String>,
    #[serde(default)]
    pub merge_strategies: Vec<String>,
}

// -- Request bodies --

#[derive(Debug, Clone, Serialize)]
pub struct RawContent {
    pub raw: String,
}

impl RawContent {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchSelector {
    pub branch: BranchName,
}

impl BranchSelector {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            branch: BranchName { name: name.into() },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountRef {
    pub uuid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePullRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: BranchSelector,
    pub destination: BranchSelector,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reviewers: Vec<AccountRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_source_branch: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdatePullRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewers: Option<Vec<AccountRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_source_branch: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    MergeCommit,
    Squash,
    FastForward,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_source_branch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_strategy: Option<MergeStrategy>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateComment {
    pub content: RawContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<CommentParent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<InlineInfo>,
}

impl CreateComment {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            content: RawContent::new(raw),
            parent: None,
            inline: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateComment {
    pub content: RawContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTask {
    pub content: RawContent,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<TaskState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<RawContent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateBranch {
    pub name: String,
    pub target: CommitRef,
}

impl CreateBranch {
    pub fn new(name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: CommitRef { hash: hash.into() },
        }
    }
}

// -- Query options --

/// Query parameters shared by list endpoints. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub page: Option<u32>,
    pub pagelen: Option<u32>,
    /// BBQL filter expression.
    pub q: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPullRequestsOptions {
    pub list: ListOptions,
    pub state: Option<PullRequestState>,
}
