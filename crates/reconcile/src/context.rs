//! Per-invocation handle on the remote store plus its tuning.

use std::time::Duration;

use fdsync_core::config::RemoteTuning;
use fdsync_core::Tag;
use fdsync_remote::tags::{list_all_tags, sync_tags};
use fdsync_remote::{
    collect_pages, DetectorRecord, DetectorVersionSummary, FraudDetectorApi, RuleQuery,
    RuleRecord,
};

use crate::error::Result;

#[derive(Clone, Copy)]
pub(crate) struct Ctx<'a> {
    pub api: &'a dyn FraudDetectorApi,
    pub max_pages: u32,
    pub delay: Duration,
}

impl<'a> Ctx<'a> {
    pub fn new(api: &'a dyn FraudDetectorApi, tuning: &RemoteTuning) -> Self {
        Self {
            api,
            max_pages: tuning.max_pages,
            delay: Duration::from_millis(tuning.consistency_delay_ms),
        }
    }

    pub async fn detectors(&self) -> Result<Vec<DetectorRecord>> {
        let api = self.api;
        Ok(collect_pages(self.max_pages, move |token| api.get_detectors(None, token)).await?)
    }

    pub async fn versions(&self, detector_id: &str) -> Result<Vec<DetectorVersionSummary>> {
        let api = self.api;
        Ok(collect_pages(self.max_pages, move |token| {
            api.describe_detector(detector_id, token)
        })
        .await?)
    }

    pub async fn rules(&self, query: &RuleQuery) -> Result<Vec<RuleRecord>> {
        let api = self.api;
        Ok(collect_pages(self.max_pages, move |token| api.get_rules(query, token)).await?)
    }

    /// Tags on `arn`, or `None` when there are none to report.
    pub async fn tags_of(&self, arn: Option<&str>) -> Result<Option<Vec<Tag>>> {
        let Some(arn) = arn else {
            return Ok(None);
        };
        let tags = list_all_tags(self.api, arn, self.max_pages).await?;
        Ok((!tags.is_empty()).then_some(tags))
    }

    /// Make the tags on `arn` match `desired`; unset means no tags.
    pub async fn sync_tags(&self, arn: Option<&str>, desired: Option<&[Tag]>) -> Result<()> {
        if let Some(arn) = arn {
            sync_tags(self.api, arn, desired.unwrap_or_default(), self.max_pages).await?;
        }
        Ok(())
    }
}
