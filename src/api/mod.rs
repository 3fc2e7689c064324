//! Typed client for the Bitbucket Cloud REST API 2.0.
//!
//! ```no_run
//! # async fn run() -> Result<(), mcp_bitbucket::api::BitbucketError> {
//! use mcp_bitbucket::api::{BitbucketClient, ClientConfig, Credentials};
//!
//! let client = BitbucketClient::new(ClientConfig::new(Credentials::new("me", "app-password")))?;
//! let pr = client.pull_requests("my-team", "my-repo").get(1).await?;
//! println!("{}", pr.title);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod pagination;

pub use auth::{AuthProvider, Credentials};
pub use client::{BitbucketClient, ClientConfig};
pub use error::{BitbucketError, ErrorKind};
pub use pagination::{extract_page_from_url, get_all_pages, PaginationOptions};
