//! Draining Bitbucket's cursor pagination.

use std::future::Future;
use std::sync::LazyLock;

use regex::Regex;

use super::error::BitbucketError;
use super::models::PaginatedResponse;

static PAGE_PARAM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]page=(\d+)").expect("Failed to compile page param regex"));

/// Where to start and how far to go when collecting every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationOptions {
    pub page: u32,
    pub pagelen: u32,
    /// Upper bound on fetch calls, reached silently.
    pub max_pages: u32,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            page: 1,
            pagelen: 50,
            max_pages: 10,
        }
    }
}

/// Fetch pages until the server stops handing out a `next` cursor, a page
/// comes back empty, or `max_pages` fetches have been made.
///
/// `fetch_page` receives the page number and page length to request. Errors
/// from it are returned as-is and abort the drain.
pub async fn get_all_pages<T, F, Fut>(
    mut fetch_page: F,
    options: PaginationOptions,
) -> Result<Vec<T>, BitbucketError>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Result<PaginatedResponse<T>, BitbucketError>>,
{
    let mut results = Vec::new();
    let mut current_page = options.page;

    for _ in 0..options.max_pages {
        let response = fetch_page(current_page, options.pagelen).await?;
        let exhausted = response.next.is_none() || response.values.is_empty();
        results.extend(response.values);

        if exhausted {
            break;
        }
        match current_page.checked_add(1) {
            Some(next) => current_page = next,
            None => break,
        }
    }

    tracing::debug!(
        items = results.len(),
        last_page = current_page,
        "Collected paginated results"
    );
    Ok(results)
}

/// Page number encoded in a `next`/`previous` URL, or 1 if there is none.
pub fn extract_page_from_url(url: &str) -> u32 {
    PAGE_PARAM_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1)
}
