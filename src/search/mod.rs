//! Search Module
//!
//! Client for NCBI E-utilities, used by the gateway routes:
//! - `esearch` with `usehistory=y` to open a result set on the history server
//! - `esummary` to page through it by `WebEnv` + `query_key`
//! - `efetch` (XML only) for full article records
//!
//! The history server keeps the result set, so later pages never re-run the
//! full-text query.

pub mod eutils;
pub mod pubmed_xml;

pub use eutils::{EutilsClient, EutilsError, SearchInfo, NCBI_BASE};
pub use pubmed_xml::parse_pubmed_articles;
