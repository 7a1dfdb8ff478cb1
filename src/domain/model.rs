use crate::domain::schema;
use crate::utils::error::{ApiError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

pub type ItemId = i64;

pub const TOP_STORIES_MAX: usize = 500;

/// An item exactly as the service returned it: story, comment, job, poll or pollopt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(Map<String, Value>);

impl From<Map<String, Value>> for Item {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl Item {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    pub fn id(&self) -> Option<ItemId> {
        self.get("id").and_then(Value::as_i64)
    }

    /// The `type` tag.
    pub fn kind(&self) -> Option<&str> {
        self.get("type").and_then(Value::as_str)
    }

    pub fn by(&self) -> Option<&str> {
        self.get("by").and_then(Value::as_str)
    }

    pub fn time(&self) -> Option<i64> {
        self.get("time").and_then(Value::as_i64)
    }

    pub fn parent(&self) -> Option<ItemId> {
        self.get("parent").and_then(Value::as_i64)
    }

    /// Child IDs in ranked order; empty when the item has none.
    pub fn kids(&self) -> Vec<ItemId> {
        self.get("kids")
            .and_then(Value::as_array)
            .map(|kids| kids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default()
    }

    pub fn has_kids(&self) -> bool {
        !self.kids().is_empty()
    }

    pub fn is_deleted(&self) -> bool {
        self.get("deleted").and_then(Value::as_bool).unwrap_or(false)
            || self.get("dead").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn parse<T: Schema>(&self) -> Result<T> {
        T::from_item(self)
    }
}

/// A typed view of an [`Item`]. The raw fields are checked against
/// [`Schema::json_schema`] first; serde only builds the typed value.
pub trait Schema: DeserializeOwned {
    const ENTITY: &'static str;

    fn json_schema() -> Value;

    fn from_item(item: &Item) -> Result<Self> {
        let instance = Value::Object(item.fields().clone());
        schema::check_instance(Self::ENTITY, &Self::json_schema(), &instance)?;

        serde_json::from_value(instance).map_err(|e| ApiError::Schema {
            entity: Self::ENTITY,
            violations: vec![e.to_string()],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: String,
    pub by: String,
    pub time: i64,
    pub title: String,
    pub score: i64,
    pub descendants: i64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub kids: Option<Vec<ItemId>>,
}

impl Story {
    pub fn kids(&self) -> &[ItemId] {
        self.kids.as_deref().unwrap_or_default()
    }
}

impl Schema for Story {
    const ENTITY: &'static str = "Story";

    fn json_schema() -> Value {
        schema::story_schema()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: String,
    pub by: String,
    pub time: i64,
    pub text: String,
    pub parent: ItemId,
    #[serde(default)]
    pub kids: Option<Vec<ItemId>>,
}

impl Schema for Comment {
    const ENTITY: &'static str = "Comment";

    fn json_schema() -> Value {
        schema::comment_schema()
    }
}

/// The ranked top stories listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopStories(Vec<ItemId>);

impl TopStories {
    /// Accepts 1 to 500 positive IDs.
    pub fn new(stories: Vec<ItemId>) -> Result<Self> {
        let instance = Value::from(stories);
        schema::check_instance("TopStories", &schema::top_stories_schema(), &instance)?;
        let stories = serde_json::from_value(instance)?;
        Ok(Self(stories))
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_duplicates(&self) -> bool {
        let unique: HashSet<_> = self.0.iter().collect();
        unique.len() != self.0.len()
    }
}
