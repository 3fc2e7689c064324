//! MCP server that lets LLMs work with Bitbucket Cloud repositories.
//!
//! Provides tools for reviewing pull requests (details, commits, diffs),
//! managing PR comments and tasks, and listing or creating branches. The
//! [`api`] module is a standalone typed client for the Bitbucket REST API 2.0.

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod tools;
