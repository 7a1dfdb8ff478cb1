//! Shared fixture: an httpmock server playing the Hacker News v0 API.
#![allow(dead_code)]

use hn_contract::utils::logger;
use hn_contract::{EnvironmentConfig, HackerNewsApi};
use httpmock::prelude::*;
use serde_json::{json, Value};

pub const TOP_STORY_ID: i64 = 41_000_500;
/// Second-ranked story; the top story has no comments yet.
pub const COMMENTED_STORY_ID: i64 = 41_000_499;
pub const COMMENT_IDS: [i64; 3] = [41_000_612, 41_000_650, 41_000_701];
pub const NON_EXISTENT_ID: i64 = 999_999_999;
pub const LISTING_LEN: i64 = 120;
pub const STORY_TIME: i64 = 1_760_000_000;

pub fn top_story_ids() -> Vec<i64> {
    (0..LISTING_LEN).map(|rank| TOP_STORY_ID - rank).collect()
}

pub fn top_story() -> Value {
    json!({
        "by": "rustacean",
        "descendants": 0,
        "id": TOP_STORY_ID,
        "score": 87,
        "time": STORY_TIME + 1_800,
        "title": "Show HN: A contract test harness for public REST APIs",
        "type": "story",
        "url": "https://example.com/contract-harness"
    })
}

pub fn commented_story() -> Value {
    json!({
        "by": "pg",
        "descendants": 5,
        "id": COMMENTED_STORY_ID,
        "kids": COMMENT_IDS,
        "score": 412,
        "time": STORY_TIME,
        "title": "Ask HN: What are you working on?",
        "text": "Curious what side projects people have going this month.",
        "type": "story"
    })
}

pub fn comment(id: i64, offset: i64) -> Value {
    json!({
        "by": format!("commenter{}", offset),
        "id": id,
        "kids": [id + 1_000],
        "parent": COMMENTED_STORY_ID,
        "text": "I&#x27;m rewriting our API contract tests. <i>Slowly.</i>",
        "time": STORY_TIME + 60 * offset,
        "type": "comment"
    })
}

fn respond_json(then: httpmock::Then, body: String) {
    then.status(200)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(body);
}

pub struct FakeHackerNews {
    pub server: MockServer,
}

impl FakeHackerNews {
    pub fn start() -> Self {
        logger::init_test_logger();
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/v0/topstories.json");
            respond_json(then, json!(top_story_ids()).to_string());
        });
        server.mock(|when, then| {
            when.method(GET).path(format!("/v0/item/{}.json", TOP_STORY_ID));
            respond_json(then, top_story().to_string());
        });
        server.mock(|when, then| {
            when.method(GET)
                .path(format!("/v0/item/{}.json", COMMENTED_STORY_ID));
            respond_json(then, commented_story().to_string());
        });
        for (offset, id) in COMMENT_IDS.iter().enumerate() {
            let offset = i64::try_from(offset).unwrap() + 1;
            server.mock(|when, then| {
                when.method(GET).path(format!("/v0/item/{}.json", id));
                respond_json(then, comment(*id, offset).to_string());
            });
        }
        for missing in [NON_EXISTENT_ID, 0] {
            server.mock(|when, then| {
                when.method(GET).path(format!("/v0/item/{}.json", missing));
                respond_json(then, "null".to_string());
            });
        }

        Self { server }
    }

    pub fn config(&self) -> EnvironmentConfig {
        let mut config = EnvironmentConfig::new(self.server.url("/v0/"));
        config.backoff_factor = 0.0;
        config
    }

    pub fn api(&self) -> HackerNewsApi {
        HackerNewsApi::new(&self.config()).unwrap()
    }
}
