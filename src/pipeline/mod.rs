//! Pipeline entry points for crawler operations.
//!
//! - `run_browse`: Walk the paginated browse index into the cache
//! - `run_download`: Drain the browse cache through the download pool

pub mod browse;
pub mod download;

pub use browse::run_browse;
pub use download::run_download;
