// Domain layer: item schemas and the rules the contract suite asserts on them.

pub mod model;
pub mod rules;
pub mod schema;

pub use model::{Comment, Item, ItemId, Schema, Story, TopStories, TOP_STORIES_MAX};
