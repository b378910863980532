// src/services/mod.rs

//! Crawl services: fetching, extraction, pagination, and scheduling.

pub mod extract;
pub mod fetcher;
pub mod scheduler;
pub mod walker;

pub use fetcher::{FetchOutcome, Fetcher, RetryPolicy};
pub use scheduler::DownloadScheduler;
pub use walker::PaginationWalker;
