use crate::api::client::BitbucketClient;
use crate::api::error::BitbucketError;
use crate::api::models::{CreateTask, ListOptions, PaginatedResponse, Task, UpdateTask};
use crate::api::pagination::{get_all_pages, PaginationOptions};

use super::{encode_segment, list_query, repository_path};

/// Pull request task operations for one repository.
///
/// The collection name under `/pullrequests/{id}/` comes from
/// [`ClientConfig::tasks_segment`](crate::api::ClientConfig::tasks_segment).
pub struct TaskHandler<'c> {
    client: &'c BitbucketClient,
    base: String,
}

impl BitbucketClient {
    pub fn tasks(&self, workspace: &str, repo_slug: &str) -> TaskHandler<'_> {
        TaskHandler {
            client: self,
            base: format!("{}/pullrequests", repository_path(workspace, repo_slug)),
        }
    }
}

impl TaskHandler<'_> {
    fn collection(&self, pr_id: u64) -> String {
        format!(
            "{}/{}/{}",
            self.base,
            pr_id,
            encode_segment(self.client.tasks_segment())
        )
    }

    fn path(&self, pr_id: u64, task_id: u64) -> String {
        format!("{}/{}", self.collection(pr_id), task_id)
    }

    pub async fn list(
        &self,
        pr_id: u64,
        options: &ListOptions,
    ) -> Result<PaginatedResponse<Task>, BitbucketError> {
        let path = list_query(options).apply(self.collection(pr_id));
        self.client.get(&path).await
    }

    pub async fn list_all(
        &self,
        pr_id: u64,
        pagination: PaginationOptions,
    ) -> Result<Vec<Task>, BitbucketError> {
        get_all_pages(
            |page, pagelen| {
                let options = ListOptions {
                    page: Some(page),
                    pagelen: Some(pagelen),
                    ..Default::default()
                };
                async move { self.list(pr_id, &options).await }
            },
            pagination,
        )
        .await
    }

    pub async fn get(&self, pr_id: u64, task_id: u64) -> Result<Task, BitbucketError> {
        self.client.get(&self.path(pr_id, task_id)).await
    }

    pub async fn create(&self, pr_id: u64, body: &CreateTask) -> Result<Task, BitbucketError> {
        self.client.post(&self.collection(pr_id), Some(body)).await
    }

    /// Change a task's state and/or content.
    pub async fn update(
        &self,
        pr_id: u64,
        task_id: u64,
        body: &UpdateTask,
    ) -> Result<Task, BitbucketError> {
        self.client.put(&self.path(pr_id, task_id), body).await
    }

    pub async fn delete(&self, pr_id: u64, task_id: u64) -> Result<(), BitbucketError> {
        self.client.delete(&self.path(pr_id, task_id)).await
    }
}
