//! Bounded pagination over list-style remote calls.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RemoteResult;

/// One page of a list-style call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// Follow continuation tokens until none is returned or `max_pages` pages
/// have been fetched. Hitting the cap truncates the result without error.
pub async fn collect_pages<T, F, Fut>(max_pages: u32, mut fetch: F) -> RemoteResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = RemoteResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    let cap = max_pages.max(1);

    for page_number in 1..=cap {
        let page = fetch(token.take()).await?;
        items.extend(page.items);

        match page.next_token {
            Some(next) if !next.is_empty() => {
                if page_number == cap {
                    warn!(max_pages = cap, fetched = items.len(), "page cap reached, truncating");
                    break;
                }
                token = Some(next);
            }
            _ => break,
        }
    }

    Ok(items)
}
