use std::fmt;

/// One `text` element's worth of page data, as seen when the element closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBody {
    pub title: Option<String>,
    pub namespace: Option<String>,
    /// `None` for empty or self-closed `text` elements
    pub text: Option<String>,
}

/// A single external link found in an article, written as `"{url}, {title}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord<'a> {
    pub url: &'a str,
    pub title: &'a str,
}

impl fmt::Display for LinkRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Titles go out verbatim; consumers split on the first comma only.
        write!(f, "{}, {}", self.url, self.title)
    }
}

/// Returns the URL field of a link-file line: everything before the first
/// comma, trimmed.
pub fn url_field(line: &str) -> &str {
    match memchr::memchr(b',', line.as_bytes()) {
        Some(idx) => line[..idx].trim(),
        None => line.trim(),
    }
}

/// Lowercased hostname of a URL, or `None` when the URL has no host.
///
/// The host is cut out of the `//authority` part without validating it: the
/// port and the host's characters are not checked and unicode hosts stay as
/// written, so every line with an authority counts toward some host.
/// Protocol-relative URLs (`//host/path`) have a host too.
pub fn hostname(url: &str) -> Option<String> {
    let rest = strip_scheme(url.trim());
    let authority = rest.strip_prefix("//")?;
    let authority = match authority.find(['/', '?', '#']) {
        Some(end) => &authority[..end],
        None => authority,
    };

    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let host = match host_port.split_once('[') {
        // IPv6 literal: whatever sits between the brackets
        Some((_, bracketed)) => bracketed.split_once(']').map_or(bracketed, |(h, _)| h),
        None => host_port.split_once(':').map_or(host_port, |(h, _)| h),
    };

    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

/// Drops a leading `scheme:` when the prefix is a well-formed scheme name.
fn strip_scheme(url: &str) -> &str {
    match url.split_once(':') {
        Some((scheme, rest))
            if scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
        {
            rest
        }
        _ => url,
    }
}
