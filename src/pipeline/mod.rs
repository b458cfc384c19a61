//! Pipeline entry points for crawler operations.
//!
//! - `run_crawl`: expand the seed network and fetch timelines
//! - `run_validate`: check configuration and credentials

pub mod crawl;
pub mod validate;

pub use crawl::{CrawlOptions, run_crawl};
pub use validate::run_validate;
