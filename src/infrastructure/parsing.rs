//! Markdown parsing for listing pages and detail pages
//!
//! The fetch backend returns page content as markdown, so every parser here
//! is regex-driven and pure: identical input always yields identical output,
//! and malformed input degrades to fewer results, never to an error.

pub mod brand_list;
pub mod phone_list;
pub mod spec_extractor;

pub use brand_list::parse_brand_listing;
pub use phone_list::{brand_pagination_url, parse_phone_links};
pub use spec_extractor::SpecExtractor;
