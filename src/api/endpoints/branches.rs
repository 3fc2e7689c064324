use crate::api::client::BitbucketClient;
use crate::api::error::BitbucketError;
use crate::api::models::{Branch, CreateBranch, ListOptions, PaginatedResponse};
use crate::api::pagination::{get_all_pages, PaginationOptions};

use super::{encode_segment, list_query, repository_path};

/// Branch operations for one repository.
pub struct BranchHandler<'c> {
    client: &'c BitbucketClient,
    base: String,
}

impl BitbucketClient {
    pub fn branches(&self, workspace: &str, repo_slug: &str) -> BranchHandler<'_> {
        BranchHandler {
            client: self,
            base: format!("{}/refs/branches", repository_path(workspace, repo_slug)),
        }
    }
}

impl BranchHandler<'_> {
    fn path(&self, name: &str) -> String {
        format!("{}/{}", self.base, encode_segment(name))
    }

    pub async fn list(
        &self,
        options: &ListOptions,
    ) -> Result<PaginatedResponse<Branch>, BitbucketError> {
        let path = list_query(options).apply(self.base.clone());
        self.client.get(&path).await
    }

    pub async fn list_all(
        &self,
        pagination: PaginationOptions,
    ) -> Result<Vec<Branch>, BitbucketError> {
        get_all_pages(
            |page, pagelen| {
                let options = ListOptions {
                    page: Some(page),
                    pagelen: Some(pagelen),
                    ..Default::default()
                };
                async move { self.list(&options).await }
            },
            pagination,
        )
        .await
    }

    pub async fn get(&self, name: &str) -> Result<Branch, BitbucketError> {
        self.client.get(&self.path(name)).await
    }

    pub async fn create(&self, body: &CreateBranch) -> Result<Branch, BitbucketError> {
        self.client.post(&self.base, Some(body)).await
    }

    pub async fn delete(&self, name: &str) -> Result<(), BitbucketError> {
        self.client.delete(&self.path(name)).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::auth::Credentials;
    use crate::api::client::{BitbucketClient, ClientConfig};
    use crate::api::models::{CreateBranch, ListOptions};
    use crate::api::pagination::PaginationOptions;

    const BRANCHES_PATH: &str = "/repositories/ws/repo/refs/branches";

    fn client_for(server: &MockServer) -> BitbucketClient {
        let config = ClientConfig::new(Credentials::new("user", "pass")).base_url(server.uri());
        BitbucketClient::new(config).unwrap()
    }

    fn branch_json(name: &str) -> serde_json::Value {
        json!({
            "name": name,
            "target": {
                "hash": "abc123",
                "date": "2024-01-01T00:00:00+00:00",
                "author": {"raw": "Eve <eve@example.com>", "user": {"display_name": "Eve"}},
                "message": "Initial commit"
            },
            "merge_strategies": ["merge_commit", "squash"],
            "default_merge_strategy": "squash",
            "type": "branch"
        })
    }

    #[tokio::test]
    async fn test_get_encodes_slashes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/feature%2Flogin", BRANCHES_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(branch_json("feature/login")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let branch = client.branches("ws", "repo").get("feature/login").await.unwrap();
        assert_eq!(branch.name, "feature/login");
        assert_eq!(branch.target.author.display_name(), "Eve");
        assert_eq!(branch.default_merge_strategy.as_deref(), Some("squash"));
    }

    #[tokio::test]
    async fn test_list_with_query_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(BRANCHES_PATH))
            .and(query_param("q", r#"name ~ "release""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "size": 1,
                "values": [branch_json("release/1.0")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let options = ListOptions {
            q: Some(r#"name ~ "release""#.to_string()),
            ..Default::default()
        };
        let page = client.branches("ws", "repo").list(&options).await.unwrap();
        assert_eq!(page.values[0].name, "release/1.0");
    }

    #[tokio::test]
    async fn test_list_all_respects_max_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(BRANCHES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "size": 100,
                "next": "https://api.bitbucket.org/2.0/more?page=99",
                "values": [branch_json("main")]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let branches = client
            .branches("ws", "repo")
            .list_all(PaginationOptions {
                max_pages: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(branches.len(), 2);
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(BRANCHES_PATH))
            .and(body_json(json!({"name": "feature/x", "target": {"hash": "abc123"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(branch_json("feature/x")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/feature%2Fx", BRANCHES_PATH)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let handler = client.branches("ws", "repo");
        let branch = handler
            .create(&CreateBranch::new("feature/x", "abc123"))
            .await
            .unwrap();
        assert_eq!(branch.target.hash, "abc123");

        handler.delete("feature/x").await.unwrap();
    }
}
