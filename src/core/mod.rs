pub mod client;
pub mod transport;

pub use crate::domain::{Item, ItemId};
pub use crate::utils::error::Result;
pub use client::HackerNewsApi;
pub use transport::{RecordedResponse, RequestOptions, Requester, RetryPolicy};
