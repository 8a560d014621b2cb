/// Namespace id of main/article pages
pub const MAIN_NAMESPACE: &str = "0";

/// Progress update interval (tick every N article bodies)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Batch marker interval in article bodies
pub const BATCH_INTERVAL: u64 = 100_000;

/// Progress tick interval for the line-oriented passes (count, filter)
pub const LINE_PROGRESS_INTERVAL: u64 = 100_000;

/// Batch marker interval for the line-oriented passes
pub const LINE_BATCH_INTERVAL: u64 = 5_000_000;

/// Hostnames cited more often than this are not considered rare
pub const DEFAULT_DOMAIN_THRESHOLD: u64 = 1000;

/// Agent name that robots.txt rules are evaluated for
pub const ROBOTS_USER_AGENT: &str = "*";

/// User-Agent header sent when fetching robots.txt
pub const HTTP_USER_AGENT: &str = concat!("wikilinks/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout for robots.txt fetches
pub const ROBOTS_TIMEOUT_SECS: u64 = 30;

/// Buffer size for the decompressed dump stream
pub const READ_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Buffer size for line-oriented writers
pub const WRITE_BUFFER_CAPACITY: usize = 128 * 1024;

pub const DEFAULT_DUMP_PATH: &str = "enwiki-latest-pages-articles-multistream.xml.bz2";
pub const DEFAULT_LINKS_PATH: &str = "article_links.txt";
pub const DEFAULT_COUNTS_PATH: &str = "domain_counts.json";
pub const DEFAULT_TARGETS_PATH: &str = "target_links.txt";
pub const DEFAULT_URLS_PATH: &str = "urls.txt";
