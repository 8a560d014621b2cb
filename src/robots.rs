//! robots.txt permission checks for candidate target URLs.
//!
//! One policy is fetched and cached per hostname; URLs are then matched with
//! the Google-compatible matcher from the `robotstxt` crate.

use crate::config::{HTTP_USER_AGENT, ROBOTS_TIMEOUT_SECS};
use crate::error::Result;
use crate::stats::LineStats;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// What a host's robots.txt response means for crawling it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsPolicy {
    AllowAll,
    DisallowAll,
    Rules(String),
}

impl RobotsPolicy {
    /// 401/403 forbid everything, any other 4xx means there is no robots.txt,
    /// and a server error leaves us with nothing to go on.
    pub fn from_response(status: u16, body: String) -> Self {
        match status {
            200..=299 => RobotsPolicy::Rules(body),
            401 | 403 => RobotsPolicy::DisallowAll,
            400..=499 => RobotsPolicy::AllowAll,
            _ => RobotsPolicy::DisallowAll,
        }
    }

    pub fn allows(&self, user_agent: &str, url: &str) -> bool {
        match self {
            RobotsPolicy::AllowAll => true,
            RobotsPolicy::DisallowAll => false,
            RobotsPolicy::Rules(body) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(body, user_agent, url)
            }
        }
    }
}

/// `{scheme}://{host}/robots.txt` for the URL's host, without port or path.
pub fn robots_url(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(format!("{}://{}/robots.txt", url.scheme(), host))
}

pub struct RobotsChecker {
    client: Client,
    user_agent: String,
    policies: FxHashMap<String, RobotsPolicy>,
}

impl RobotsChecker {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(HTTP_USER_AGENT)
            .timeout(Duration::from_secs(ROBOTS_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
            policies: FxHashMap::default(),
        })
    }

    /// Seeds the cache, so the host is never fetched.
    pub(crate) fn insert_policy(&mut self, host: &str, policy: RobotsPolicy) {
        self.policies.insert(host.to_string(), policy);
    }

    pub fn cached_hosts(&self) -> usize {
        self.policies.len()
    }

    async fn fetch_policy(&self, robots_url: &str) -> RobotsPolicy {
        let response = match self.client.get(robots_url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = robots_url, error = %e, "robots.txt fetch failed, disallowing host");
                return RobotsPolicy::DisallowAll;
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => {
                debug!(url = robots_url, status, "Fetched robots.txt");
                RobotsPolicy::from_response(status, body)
            }
            Err(e) => {
                warn!(url = robots_url, error = %e, "robots.txt body unreadable, disallowing host");
                RobotsPolicy::DisallowAll
            }
        }
    }

    /// `None` when the URL has no host to ask; otherwise whether the host's
    /// robots.txt lets our agent fetch it.
    pub async fn is_allowed(&mut self, url: &str) -> Option<bool> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_string();

        if !self.policies.contains_key(&host) {
            let robots_url = robots_url(&parsed)?;
            let policy = self.fetch_policy(&robots_url).await;
            self.policies.insert(host.clone(), policy);
        }

        let policy = self.policies.get(&host)?;
        Some(policy.allows(&self.user_agent, url))
    }
}

/// Writes each input URL that robots.txt allows, in input order.
pub async fn check_urls<R: BufRead, W: Write>(
    input: R,
    checker: &mut RobotsChecker,
    output: &mut W,
) -> Result<LineStats> {
    let mut stats = LineStats::new();

    for line in input.lines() {
        let line = line?;
        let url = line.trim();
        if url.is_empty() {
            continue;
        }
        stats.inc_read();

        match checker.is_allowed(url).await {
            Some(true) => {
                writeln!(output, "{}", url)?;
                stats.inc_accepted();
            }
            Some(false) => debug!(url, "Disallowed by robots.txt"),
            None => {
                warn!(url, "Skipping URL without a host");
                stats.inc_without_host();
            }
        }
    }

    Ok(stats)
}

/// Runs the check on a single-threaded runtime; requests go out one at a time.
pub fn run_robots(input: &str, output: Option<&str>, user_agent: &str) -> Result<LineStats> {
    let reader = BufReader::new(File::open(input)?);
    let mut writer: BufWriter<Box<dyn Write>> = match output {
        Some(path) => BufWriter::new(Box::new(File::create(path)?)),
        None => BufWriter::new(Box::new(io::stdout().lock())),
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut checker = RobotsChecker::new(user_agent)?;
    let outcome = rt.block_on(check_urls(reader, &mut checker, &mut writer));
    let flushed = writer.flush();
    let stats = outcome?;
    flushed?;

    info!(
        urls = stats.lines_read,
        allowed = stats.lines_accepted,
        hosts = checker.cached_hosts(),
        "robots.txt check finished"
    );
    Ok(stats)
}
