//! Tag primitives built on the tag sub-API.

use std::collections::BTreeMap;

use fdsync_core::Tag;
use tracing::debug;

use crate::api::FraudDetectorApi;
use crate::error::RemoteResult;
use crate::paging::collect_pages;

/// Every tag attached to `resource_arn`, in the order the store reports them.
pub async fn list_all_tags(
    api: &dyn FraudDetectorApi,
    resource_arn: &str,
    max_pages: u32,
) -> RemoteResult<Vec<Tag>> {
    collect_pages(max_pages, move |token| {
        api.list_tags_for_resource(resource_arn, token)
    })
    .await
}

fn as_map(tags: &[Tag]) -> BTreeMap<&str, &str> {
    tags.iter()
        .map(|t| (t.key.as_str(), t.value.as_str()))
        .collect()
}

/// Make the tags on `resource_arn` equal `desired`.
///
/// Returns `false` when they already matched and nothing was sent.
/// Otherwise every attached key is removed before the desired set is applied.
pub async fn sync_tags(
    api: &dyn FraudDetectorApi,
    resource_arn: &str,
    desired: &[Tag],
    max_pages: u32,
) -> RemoteResult<bool> {
    let attached = list_all_tags(api, resource_arn, max_pages).await?;
    if as_map(&attached) == as_map(desired) {
        return Ok(false);
    }

    debug!(
        resource_arn,
        attached = attached.len(),
        desired = desired.len(),
        "re-syncing tags"
    );

    if !attached.is_empty() {
        let keys: Vec<String> = attached.into_iter().map(|t| t.key).collect();
        api.untag_resource(resource_arn, &keys).await?;
    }
    if !desired.is_empty() {
        api.tag_resource(resource_arn, desired).await?;
    }
    Ok(true)
}
