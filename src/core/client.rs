//! Hacker News API client.
//!
//! API documentation: <https://github.com/HackerNews/API>
//!
//! Each call keeps the raw response in a last-response slot so tests can
//! inspect status, headers and body after the typed result is returned.

use crate::config::EnvironmentConfig;
use crate::core::transport::{RecordedResponse, Requester};
use crate::domain::{Item, ItemId};
use crate::utils::error::{ApiError, Result};
use crate::utils::validation::Validate;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub const TOP_STORIES_ENDPOINT: &str = "topstories.json";
pub const DEFAULT_DETAILS_LIMIT: i64 = 10;

pub fn item_endpoint(item_id: ItemId) -> String {
    format!("item/{}.json", item_id)
}

#[derive(Debug)]
pub struct HackerNewsApi {
    requester: Requester,
    last_response: Mutex<Option<RecordedResponse>>,
}

impl HackerNewsApi {
    pub fn new(config: &EnvironmentConfig) -> Result<Self> {
        config.validate()?;
        let timeout = Duration::try_from_secs_f64(config.timeout).map_err(|e| {
            ApiError::InvalidConfigValue {
                field: "timeout".to_string(),
                value: config.timeout.to_string(),
                reason: e.to_string(),
            }
        })?;
        let requester = Requester::builder()
            .base_url(&config.base_url)
            .timeout(timeout)
            .max_retries(config.max_retries)
            .backoff_factor(config.backoff_factor)
            .build()?;
        Ok(Self::with_requester(requester))
    }

    pub fn with_requester(requester: Requester) -> Self {
        Self {
            requester,
            last_response: Mutex::new(None),
        }
    }

    pub fn requester(&self) -> &Requester {
        &self.requester
    }

    fn slot(&self) -> MutexGuard<'_, Option<RecordedResponse>> {
        self.last_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn fetch(&self, endpoint: &str) -> Result<RecordedResponse> {
        let response = self.requester.get(endpoint)?;
        *self.slot() = Some(response.clone());
        response.error_for_status()?;
        Ok(response)
    }

    /// Top story IDs in rank order (up to 500).
    ///
    /// A positive `limit` keeps the first `limit` IDs. Zero, negative and absent
    /// limits return the whole listing; the service does not reject them either.
    pub fn get_top_stories(&self, limit: Option<i64>) -> Result<Vec<ItemId>> {
        let response = self.fetch(TOP_STORIES_ENDPOINT)?;
        let mut story_ids: Vec<ItemId> = response.json()?;

        if let Some(limit) = limit.filter(|l| *l > 0) {
            story_ids.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        tracing::debug!(count = story_ids.len(), ?limit, "Fetched top stories");
        Ok(story_ids)
    }

    /// Fetches one item. The service answers `null` for IDs it does not know,
    /// which surfaces here as [`ApiError::ItemNotFound`].
    pub fn get_item(&self, item_id: i64) -> Result<Item> {
        if item_id < 0 {
            return Err(ApiError::InvalidItemId { item_id });
        }

        let response = self.fetch(&item_endpoint(item_id))?;

        match response.json::<Value>()? {
            Value::Null => Err(ApiError::ItemNotFound { item_id }),
            Value::Object(fields) => Ok(Item::from(fields)),
            other => Err(ApiError::Schema {
                entity: "Item",
                violations: vec![format!("expected a JSON object, got {}", other)],
            }),
        }
    }

    /// Top stories resolved to full items. Items that fail to load are logged
    /// and skipped; a failure to load the listing itself is returned.
    pub fn get_top_stories_with_details(&self, limit: i64) -> Result<Vec<Item>> {
        let story_ids = self.get_top_stories(Some(limit))?;
        let mut stories = Vec::with_capacity(story_ids.len());

        for story_id in story_ids {
            match self.get_item(story_id) {
                Ok(story) => stories.push(story),
                Err(e) => {
                    tracing::warn!(story_id, error = %e, "Failed to fetch story, skipping");
                }
            }
        }

        Ok(stories)
    }

    pub fn get_last_response(&self) -> Option<RecordedResponse> {
        self.slot().clone()
    }

    pub fn get_status_code(&self) -> Option<u16> {
        self.slot().as_ref().map(RecordedResponse::status_code)
    }

    pub fn get_headers(&self) -> Option<HeaderMap> {
        self.slot().as_ref().map(|r| r.headers.clone())
    }

    pub fn get_response_text(&self) -> Option<String> {
        self.slot().as_ref().map(|r| r.body.clone())
    }

    pub fn close(&mut self) {
        self.requester.close();
    }
}
