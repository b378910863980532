//! Cache persistence for browse and definition pages.
//!
//! ## Directory Structure
//!
//! ```text
//! cache/
//! ├── browse/                       # raw browse pages, hex(word) filenames
//! │   ├── 61
//! │   └── 62
//! └── dict/                         # compressed definition pages, sharded
//!     ├── 61
//!     └── 6170.d/
//!         └── 706c.d/
//!             └── 65-1b4f0e98.zst
//! ```

pub mod cache;
pub mod path;

// Re-export for convenience
pub use cache::PageCache;
pub use path::{browse_key, dict_rel_path, word_from_key};
