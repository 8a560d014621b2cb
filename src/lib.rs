//! wikilinks: external-link extraction from Wikipedia dumps
//!
//! This crate turns a Wikipedia XML dump into a list of rarely-cited external
//! link targets, in four single-pass batch steps:
//!
//! 1. **Extract** -- Stream the bzip2-compressed dump, and for every page in the
//!    main namespace write one `url, title` line per external link in its wikitext
//! 2. **Count** -- Tally how many link lines cite each hostname; write the table as JSON
//! 3. **Filter** -- Keep only the link lines whose hostname is cited at most N times
//! 4. **Robots** -- Check candidate URLs against each host's robots.txt
//!
//! # Architecture
//!
//! - **Streaming XML parsing** -- Never loads the dump into memory; one page's
//!   title, namespace and text are the only state held
//! - **Lazy link scanning** -- Links are pulled out of the wikitext one at a time
//!   and written straight to a buffered sink
//! - **Fail fast** -- The link scanner accepts any wikitext, while a broken
//!   archive or any XML well-formedness error (bad entity included) aborts
//!   the run after flushing what was already written
//!
//! # Key Modules
//!
//! - [`parser`] -- Streaming XML reader with multistream BZ2 decompression
//! - [`content`] -- External link scanner over wikitext
//! - [`extract`] -- Extraction loop and link-file writer
//! - [`domains`] -- Hostname counting
//! - [`filter`] -- Threshold filtering of link lines
//! - [`robots`] -- robots.txt fetching and matching
//! - [`models`] -- Page body, link record, link-line helpers
//! - [`stats`] -- Counters reported by each pass
//! - [`error`] -- Error taxonomy
//! - [`config`] -- Constants and default paths
//!
//! # Example Usage
//!
//! ```bash
//! wikilinks extract -i enwiki-latest-pages-articles-multistream.xml.bz2 -o article_links.txt
//! wikilinks count-domains -i article_links.txt -o domain_counts.json
//! wikilinks filter -i article_links.txt -c domain_counts.json -o target_links.txt --threshold 1000
//! wikilinks robots -i urls.txt -o allowed_urls.txt
//! ```

pub mod config;
pub mod content;
pub mod domains;
pub mod error;
pub mod extract;
pub mod filter;
pub mod models;
pub mod parser;
pub mod robots;
pub mod stats;

pub use error::{Error, Result};
