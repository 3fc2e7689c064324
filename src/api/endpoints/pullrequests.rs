use crate::api::client::BitbucketClient;
use crate::api::error::BitbucketError;
use crate::api::models::{
    Commit, CreatePullRequest, ListOptions, ListPullRequestsOptions, MergeOptions,
    PaginatedResponse, Participant, PullRequest, UpdatePullRequest,
};
use crate::api::pagination::{get_all_pages, PaginationOptions};

use super::{pull_request_query, repository_path, Query};

/// Pull request operations for one repository.
pub struct PullRequestHandler<'c> {
    client: &'c BitbucketClient,
    base: String,
}

impl BitbucketClient {
    pub fn pull_requests(&self, workspace: &str, repo_slug: &str) -> PullRequestHandler<'_> {
        PullRequestHandler {
            client: self,
            base: format!("{}/pullrequests", repository_path(workspace, repo_slug)),
        }
    }
}

impl PullRequestHandler<'_> {
    fn path(&self, pr_id: u64) -> String {
        format!("{}/{}", self.base, pr_id)
    }

    pub async fn list(
        &self,
        options: &ListPullRequestsOptions,
    ) -> Result<PaginatedResponse<PullRequest>, BitbucketError> {
        let path = pull_request_query(options).apply(self.base.clone());
        self.client.get(&path).await
    }

    /// Collect every matching pull request across pages.
    ///
    /// `page`/`pagelen` in `options.list` are overridden by `pagination`.
    pub async fn list_all(
        &self,
        options: &ListPullRequestsOptions,
        pagination: PaginationOptions,
    ) -> Result<Vec<PullRequest>, BitbucketError> {
        get_all_pages(
            |page, pagelen| {
                let options = ListPullRequestsOptions {
                    list: ListOptions {
                        page: Some(page),
                        pagelen: Some(pagelen),
                        ..options.list.clone()
                    },
                    state: options.state,
                };
                async move { self.list(&options).await }
            },
            pagination,
        )
        .await
    }

    pub async fn get(&self, pr_id: u64) -> Result<PullRequest, BitbucketError> {
        self.client.get(&self.path(pr_id)).await
    }

    pub async fn create(&self, body: &CreatePullRequest) -> Result<PullRequest, BitbucketError> {
        self.client.post(&self.base, Some(body)).await
    }

    pub async fn update(
        &self,
        pr_id: u64,
        body: &UpdatePullRequest,
    ) -> Result<PullRequest, BitbucketError> {
        self.client.put(&self.path(pr_id), body).await
    }

    pub async fn decline(&self, pr_id: u64) -> Result<PullRequest, BitbucketError> {
        let path = format!("{}/decline", self.path(pr_id));
        self.client.post::<(), _>(&path, None).await
    }

    /// Approve as the authenticated user.
    pub async fn approve(&self, pr_id: u64) -> Result<Participant, BitbucketError> {
        let path = format!("{}/approve", self.path(pr_id));
        self.client.post::<(), _>(&path, None).await
    }

    pub async fn unapprove(&self, pr_id: u64) -> Result<(), BitbucketError> {
        let path = format!("{}/approve", self.path(pr_id));
        self.client.delete(&path).await
    }

    pub async fn merge(
        &self,
        pr_id: u64,
        options: Option<&MergeOptions>,
    ) -> Result<PullRequest, BitbucketError> {
        let path = format!("{}/merge", self.path(pr_id));
        self.client.post(&path, options).await
    }

    pub async fn commits(
        &self,
        pr_id: u64,
        options: &ListOptions,
    ) -> Result<PaginatedResponse<Commit>, BitbucketError> {
        let mut query = Query::default();
        query.pagination(options);
        let path = query.apply(format!("{}/commits", self.path(pr_id)));
        self.client.get(&path).await
    }

    pub async fn diff(&self, pr_id: u64) -> Result<String, BitbucketError> {
        self.client
            .get_text(&format!("{}/diff", self.path(pr_id)))
            .await
    }

    pub async fn patch(&self, pr_id: u64) -> Result<String, BitbucketError> {
        self.client
            .get_text(&format!("{}/patch", self.path(pr_id)))
            .await
    }
}
