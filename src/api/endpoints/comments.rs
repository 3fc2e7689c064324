use crate::api::client::BitbucketClient;
use crate::api::error::BitbucketError;
use crate::api::models::{
    Comment, CreateComment, ListOptions, PaginatedResponse, UpdateComment,
};
use crate::api::pagination::{get_all_pages, PaginationOptions};

use super::{list_query, repository_path};

/// Pull request comment operations for one repository.
pub struct CommentHandler<'c> {
    client: &'c BitbucketClient,
    base: String,
}

impl BitbucketClient {
    pub fn comments(&self, workspace: &str, repo_slug: &str) -> CommentHandler<'_> {
        CommentHandler {
            client: self,
            base: format!("{}/pullrequests", repository_path(workspace, repo_slug)),
        }
    }
}

impl CommentHandler<'_> {
    fn collection(&self, pr_id: u64) -> String {
        format!("{}/{}/comments", self.base, pr_id)
    }

    fn path(&self, pr_id: u64, comment_id: u64) -> String {
        format!("{}/{}", self.collection(pr_id), comment_id)
    }

    pub async fn list(
        &self,
        pr_id: u64,
        options: &ListOptions,
    ) -> Result<PaginatedResponse<Comment>, BitbucketError> {
        let path = list_query(options).apply(self.collection(pr_id));
        self.client.get(&path).await
    }

    pub async fn list_all(
        &self,
        pr_id: u64,
        pagination: PaginationOptions,
    ) -> Result<Vec<Comment>, BitbucketError> {
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

    pub async fn get(&self, pr_id: u64, comment_id: u64) -> Result<Comment, BitbucketError> {
        self.client.get(&self.path(pr_id, comment_id)).await
    }

    pub async fn create(&self, pr_id: u64, body: &CreateComment) -> Result<Comment, BitbucketError> {
        self.client.post(&self.collection(pr_id), Some(body)).await
    }

    pub async fn update(
        &self,
        pr_id: u64,
        comment_id: u64,
        body: &UpdateComment,
    ) -> Result<Comment, BitbucketError> {
        self.client.put(&self.path(pr_id, comment_id), body).await
    }

    pub async fn delete(&self, pr_id: u64, comment_id: u64) -> Result<(), BitbucketError> {
        self.client.delete(&self.path(pr_id, comment_id)).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::auth::Credentials;
    use crate::api::client::{BitbucketClient, ClientConfig};
    use crate::api::error::ErrorKind;
    use crate::api::models::{CreateComment, ListOptions, RawContent, UpdateComment};
    use crate::api::pagination::PaginationOptions;

    const COMMENTS_PATH: &str = "/repositories/ws/repo/pullrequests/42/comments";

    fn client_for(server: &MockServer) -> BitbucketClient {
        let config = ClientConfig::new(Credentials::new("user", "pass")).base_url(server.uri());
        BitbucketClient::new(config).unwrap()
    }

    fn comment_json(id: u64, raw: &str) -> serde_json::Value {
        json!({
            "id": id,
            "content": {"raw": raw, "markup": "markdown", "html": format!("<p>{}</p>", raw)},
            "user": {"display_name": "Carol"},
            "created_on": "2024-03-01T10:00:00+00:00",
            "updated_on": "2024-03-01T10:00:00+00:00",
            "deleted": false,
            "type": "pullrequest_comment"
        })
    }

    #[tokio::test]
    async fn test_list_with_sort_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(COMMENTS_PATH))
            .and(query_param("sort", "-created_on"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "size": 1,
                "values": [comment_json(1, "LGTM")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let options = ListOptions {
            sort: Some("-created_on".to_string()),
            ..Default::default()
        };
        let page = client.comments("ws", "repo").list(42, &options).await.unwrap();
        assert_eq!(page.values[0].content.raw, "LGTM");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), Some("sort=-created_on"));
    }

    #[tokio::test]
    async fn test_list_all_stops_on_empty_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(COMMENTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "size": 0,
                "next": "https://api.bitbucket.org/2.0/x?page=2",
                "values": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let comments = client
            .comments("ws", "repo")
            .list_all(42, PaginationOptions::default())
            .await
            .unwrap();
        assert!(comments.is_empty());
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMMENTS_PATH))
            .and(body_json(json!({"content": {"raw": "Nice work"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(comment_json(7, "Nice work")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("{}/7", COMMENTS_PATH)))
            .and(body_json(json!({"content": {"raw": "Nicer work"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(comment_json(7, "Nicer work")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/7", COMMENTS_PATH)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let handler = client.comments("ws", "repo");

        let created = handler.create(42, &CreateComment::new("Nice work")).await.unwrap();
        assert_eq!(created.id, 7);

        let updated = handler
            .update(
                42,
                7,
                &UpdateComment {
                    content: RawContent::new("Nicer work"),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.content.raw, "Nicer work");

        handler.delete(42, 7).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_missing_comment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/99", COMMENTS_PATH)))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"type": "error", "error": {"message": "No such comment"}})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.comments("ws", "repo").get(42, 99).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Resource not found: No such comment");
    }
}
