pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::ProbeArgs;
pub use config::{ApiConfig, EnvironmentConfig};

pub use crate::core::{
    client::HackerNewsApi,
    transport::{RecordedResponse, RequestOptions, Requester, RetryPolicy},
};
pub use domain::{Comment, Item, ItemId, Schema, Story, TopStories};
pub use utils::error::{ApiError, Result};
