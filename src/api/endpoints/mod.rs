//! Resource handlers for pull requests, comments, tasks and branches.
//!
//! Handlers borrow the client and carry the `{workspace}/{repo_slug}` scope,
//! the same way `client.pull_requests("ws", "repo").get(1)` reads.

pub mod branches;
pub mod comments;
pub mod pullrequests;
pub mod tasks;

use url::form_urlencoded;

use super::models::{ListOptions, ListPullRequestsOptions};

pub use branches::BranchHandler;
pub use comments::CommentHandler;
pub use pullrequests::PullRequestHandler;
pub use tasks::TaskHandler;

/// Percent-encode a single path segment. Slashes inside branch names become
/// `%2F` so they stay one segment.
pub(crate) fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

pub(crate) fn repository_path(workspace: &str, repo_slug: &str) -> String {
    format!(
        "/repositories/{}/{}",
        encode_segment(workspace),
        encode_segment(repo_slug)
    )
}

/// Ordered query parameters; empty means no `?` at all.
#[derive(Debug, Default)]
pub(crate) struct Query {
    pairs: Vec<(&'static str, String)>,
}

impl Query {
    pub(crate) fn push(&mut self, key: &'static str, value: Option<impl ToString>) -> &mut Self {
        if let Some(value) = value {
            self.pairs.push((key, value.to_string()));
        }
        self
    }

    pub(crate) fn pagination(&mut self, options: &ListOptions) -> &mut Self {
        self.push("page", options.page).push("pagelen", options.pagelen)
    }

    pub(crate) fn filters(&mut self, options: &ListOptions) -> &mut Self {
        self.push("q", options.q.as_deref())
            .push("sort", options.sort.as_deref())
    }

    /// Append the query (if any) to `path`.
    pub(crate) fn apply(&self, path: String) -> String {
        if self.pairs.is_empty() {
            return path;
        }
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        format!("{}?{}", path, serializer.finish())
    }
}

pub(crate) fn list_query(options: &ListOptions) -> Query {
    let mut query = Query::default();
    query.pagination(options).filters(options);
    query
}

pub(crate) fn pull_request_query(options: &ListPullRequestsOptions) -> Query {
    let mut query = Query::default();
    query
        .pagination(&options.list)
        .push("state", options.state.map(|s| s.as_str()))
        .filters(&options.list);
    query
}
