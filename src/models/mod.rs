//! Data models for harvested documents and feed articles.

mod article;
mod harvest;

pub use article::FeedArticle;
pub use harvest::{FailureReason, HarvestStatus, HarvestedPdf};
