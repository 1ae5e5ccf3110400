//! Extractors: where fresh CRM records come from.
//!
//! The scraping itself happens outside crmsync. An extractor only fetches
//! the document the scraper produced and validates it:
//!
//! ```text
//! {"success": true, "objectType": "leads", "count": 2, "records": [...]}
//! {"success": false, "error": "..."}
//! ```
//!
//! Three adapters are provided:
//! - **file** - a captured response document on disk
//! - **command** - a bridge program printing the document to stdout
//! - **http** - a bridge endpoint returning the document

pub mod command;
pub mod factory;
pub mod file;
pub mod http;
pub mod provider;
pub mod types;

pub use command::CommandExtractor;
pub use factory::create_extractor;
pub use file::FileExtractor;
pub use http::HttpExtractor;
pub use provider::{BoxedExtractor, Extractor};
pub use types::{Extraction, ExtractorInfo, ExtractorKind, ExtractorResponse};
