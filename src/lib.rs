// src/lib.rs

//! dictcrawl Library
//!
//! Harvests a word-definition site: walks the paginated browse index to
//! discover terms, then downloads each term's definition page once into
//! a content-addressed on-disk cache.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
