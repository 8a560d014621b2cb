use once_cell::sync::Lazy;
use regex::Regex;

/// Schemes that may start a bare link in running text. All of them require `//`.
static FREE_SCHEME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:https?|ftps?|git|gopher|ircs?|mms|nntp|redis|sftp|ssh|svn|telnet|worldwind)://",
    )
    .unwrap()
});

/// Schemes accepted inside `[...]`, plus protocol-relative `//host`.
static BRACKET_SCHEME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:https?|ftps?|git|gopher|ircs?|mms|nntp|redis|sftp|ssh|svn|telnet|worldwind)://|(?:bitcoin|geo|magnet|mailto|news|sips?|sms|tel|urn|xmpp):|//)",
    )
    .unwrap()
});

/// Tags whose bodies are never parsed as markup.
const VERBATIM_TAGS: [&[u8]; 5] = [b"nowiki", b"pre", b"math", b"source", b"syntaxhighlight"];

/// Returns the external link targets of a wikitext string, in order of
/// appearance.
///
/// Recognizes `[url]`, `[url label]` and bare URLs. Internal `[[links]]`,
/// comments and the bodies of verbatim tags such as `<nowiki>` are skipped.
/// The scan never fails; markup it cannot make sense of is treated as text.
pub fn external_links(text: &str) -> ExternalLinks<'_> {
    ExternalLinks {
        text,
        pos: 0,
        template_depth: 0,
    }
}

/// Lazy iterator over external links, see [`external_links`].
///
/// `pos` only ever rests on an ASCII byte or the end of the text, so every
/// slice taken at it is on a char boundary.
pub struct ExternalLinks<'a> {
    text: &'a str,
    pos: usize,
    template_depth: usize,
}

impl<'a> Iterator for ExternalLinks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();

        while self.pos < bytes.len() {
            let i = self.pos;
            let rest = &bytes[i..];

            match bytes[i] {
                b'<' => {
                    self.pos = match skip_hidden(rest) {
                        Some(len) => i + len,
                        None => i + 1,
                    };
                }
                b'{' if rest.starts_with(b"{{") => {
                    self.template_depth += 1;
                    self.pos = i + 2;
                }
                b'}' if rest.starts_with(b"}}") => {
                    self.template_depth = self.template_depth.saturating_sub(1);
                    self.pos = i + 2;
                }
                b'[' if rest.starts_with(b"[[") => {
                    self.pos = i + 2;
                }
                b'[' => {
                    if let Some((url, consumed)) = bracketed_link(&self.text[i + 1..]) {
                        self.pos = i + 1 + consumed;
                        return Some(url);
                    }
                    // an unclosed bracket is plain text; its URL may still be a bare link
                    self.pos = i + 1;
                }
                b if is_word_byte(b) => {
                    let word_start = i == 0 || !is_word_byte(bytes[i - 1]);
                    if word_start && b.is_ascii_alphabetic() {
                        if let Some(url) = free_link(&self.text[i..], self.template_depth > 0) {
                            self.pos = i + url.len();
                            return Some(url);
                        }
                    }
                    self.pos = i + word_len(rest);
                }
                _ => self.pos = i + 1,
            }
        }

        None
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

fn word_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|&b| !is_word_byte(b))
        .unwrap_or(bytes.len())
}

/// Bytes that end a URL in both bracketed and bare form.
fn ends_url(bytes: &[u8], idx: usize) -> bool {
    match bytes[idx] {
        b if b.is_ascii_whitespace() => true,
        b'[' | b']' | b'<' | b'>' | b'"' => true,
        b'\'' => bytes.get(idx + 1) == Some(&b'\''),
        _ => false,
    }
}

/// Parses the inside of `[...]`. Returns the URL and the number of bytes
/// consumed through the closing bracket.
fn bracketed_link(after: &str) -> Option<(&str, usize)> {
    let scheme = BRACKET_SCHEME_REGEX.find(after)?;
    let bytes = after.as_bytes();

    let mut end = scheme.end();
    while end < bytes.len() && !ends_url(bytes, end) {
        end += 1;
    }
    if end == scheme.end() {
        return None;
    }

    match bytes.get(end) {
        Some(b']') => Some((&after[..end], end + 1)),
        Some(b' ') | Some(b'\t') => {
            // the label runs to the closing bracket, which must be on the same line
            let label = &bytes[end..];
            let close = label.iter().position(|&b| b == b']' || b == b'\n')?;
            if label[close] == b']' {
                Some((&after[..end], end + close + 1))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Matches a bare URL at the start of `rest`, trimming the punctuation that
/// usually belongs to the surrounding sentence.
fn free_link(rest: &str, in_template: bool) -> Option<&str> {
    let scheme = FREE_SCHEME_REGEX.find(rest)?;
    let bytes = rest.as_bytes();

    let mut end = scheme.end();
    while end < bytes.len() {
        if ends_url(bytes, end) || matches!(bytes[end], b'{' | b'}') {
            break;
        }
        if in_template && bytes[end] == b'|' {
            break;
        }
        end += 1;
    }

    let mut url = &rest[..end];
    loop {
        if let Some(stripped) = url.strip_suffix([',', ';', '.', ':', '!', '?']) {
            url = stripped;
        } else if url.ends_with(')') && !url.contains('(') {
            url = &url[..url.len() - 1];
        } else {
            break;
        }
    }

    if url.len() > scheme.end() {
        Some(url)
    } else {
        None
    }
}

/// Length of a comment or verbatim tag block starting at `<`, if there is one.
fn skip_hidden(rest: &[u8]) -> Option<usize> {
    if rest.starts_with(b"<!--") {
        // an unterminated comment hides the rest of the page
        return Some(find(rest, b"-->", 4).map_or(rest.len(), |idx| idx + 3));
    }

    let name_len = rest[1..]
        .iter()
        .position(|b| !b.is_ascii_alphabetic())
        .unwrap_or(rest.len() - 1);
    let name = &rest[1..1 + name_len];
    if !VERBATIM_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(name)) {
        return None;
    }

    let open_end = rest.iter().position(|&b| b == b'>')?;
    if rest[open_end - 1] == b'/' {
        return Some(open_end + 1);
    }

    let mut search = open_end + 1;
    while let Some(idx) = find(rest, b"</", search) {
        let candidate = &rest[idx + 2..];
        let name_ends = candidate
            .get(name.len())
            .map_or(true, |b| !b.is_ascii_alphabetic());
        if candidate.len() >= name.len()
            && candidate[..name.len()].eq_ignore_ascii_case(name)
            && name_ends
        {
            let close = rest[idx..].iter().position(|&b| b == b'>')?;
            return Some(idx + close + 1);
        }
        search = idx + 2;
    }

    // unclosed verbatim tags are treated as text
    None
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|idx| idx + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(text: &str) -> Vec<&str> {
        external_links(text).collect()
    }

    #[test]
    fn bracketed_with_and_without_label() {
        let text = "See [http://example.com Example Site] and [http://other.org].";
        assert_eq!(links(text), vec!["http://example.com", "http://other.org"]);
    }

    #[test]
    fn bracketed_links_keep_paths_and_queries() {
        let text = "[https://www.rust-lang.org/learn?x=1#top Official website]";
        assert_eq!(links(text), vec!["https://www.rust-lang.org/learn?x=1#top"]);
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(links("[HTTP://Example.com x]"), vec!["HTTP://Example.com"]);
    }

    #[test]
    fn bracketed_non_slash_schemes() {
        let text = "[mailto:info@example.com write] [news:comp.lang.rust]";
        assert_eq!(
            links(text),
            vec!["mailto:info@example.com", "news:comp.lang.rust"]
        );
    }

    #[test]
    fn protocol_relative_only_in_brackets() {
        let text = "[//example.org/path label] and //bare.org/x";
        assert_eq!(links(text), vec!["//example.org/path"]);
    }

    #[test]
    fn plain_brackets_are_not_links() {
        assert!(links("a [citation needed] here [1]").is_empty());
    }

    #[test]
    fn internal_links_are_not_external() {
        assert!(links("[[Rust (programming language)|Rust]] and [[Python]]").is_empty());
    }

    #[test]
    fn free_link_in_running_text() {
        let text = "Visit http://example.com/page for details.";
        assert_eq!(links(text), vec!["http://example.com/page"]);
    }

    #[test]
    fn free_link_drops_trailing_punctuation() {
        let text = "Sources: http://a.com/x, https://b.org/y. And ftp://c.net/z!";
        assert_eq!(
            links(text),
            vec!["http://a.com/x", "https://b.org/y", "ftp://c.net/z"]
        );
    }

    #[test]
    fn free_link_parenthesis_handling() {
        let text = "(see http://a.com/x) and http://en.wiki.org/Foo_(bar)";
        assert_eq!(
            links(text),
            vec!["http://a.com/x", "http://en.wiki.org/Foo_(bar)"]
        );
    }

    #[test]
    fn free_link_needs_word_boundary() {
        assert!(links("xhttp://a.com").is_empty());
    }

    #[test]
    fn free_link_needs_something_after_scheme() {
        assert!(links("the http:// prefix").is_empty());
    }

    #[test]
    fn template_parameters_end_at_pipe() {
        let text = "{{cite web|url=http://a.com/story|title=Story|archive-url=https://web.archive.org/x}}";
        assert_eq!(
            links(text),
            vec!["http://a.com/story", "https://web.archive.org/x"]
        );
    }

    #[test]
    fn pipe_outside_templates_is_part_of_url() {
        assert_eq!(links("http://a.com/a|b"), vec!["http://a.com/a|b"]);
    }

    #[test]
    fn links_inside_refs_are_found() {
        let text = "Claim.<ref>[http://a.com/src Source]</ref><ref name=\"b\">http://b.com</ref>";
        assert_eq!(links(text), vec!["http://a.com/src", "http://b.com"]);
    }

    #[test]
    fn comments_hide_links() {
        let text = "<!-- [http://hidden.com] --> [http://shown.com]";
        assert_eq!(links(text), vec!["http://shown.com"]);
    }

    #[test]
    fn unterminated_comment_hides_rest() {
        assert!(links("<!-- http://hidden.com").is_empty());
    }

    #[test]
    fn nowiki_hides_links() {
        let text = "<nowiki>[http://hidden.com]</nowiki> <NoWiki/>http://shown.com";
        assert_eq!(links(text), vec!["http://shown.com"]);
    }

    #[test]
    fn pre_and_source_hide_links() {
        let text = "<pre>http://a.com</pre><source lang=\"bash\">curl http://b.com</source>[http://c.com]";
        assert_eq!(links(text), vec!["http://c.com"]);
    }

    #[test]
    fn verbatim_close_tag_must_match_whole_name() {
        // `</prefix>` does not close a `<pre>` block
        let text = "<pre>http://a.com</prefix> http://b.com</pre> http://c.com";
        assert_eq!(links(text), vec!["http://c.com"]);
    }

    #[test]
    fn unclosed_bracket_degrades_to_free_link() {
        let text = "[http://a.com/x broken\nnext line";
        assert_eq!(links(text), vec!["http://a.com/x"]);
    }

    #[test]
    fn urls_end_at_bold_markup() {
        assert_eq!(links("'''http://a.com/x'''"), vec!["http://a.com/x"]);
    }

    #[test]
    fn multibyte_text_is_handled() {
        let text = "Café – voir http://exemple.fr/été et [https://日本.jp 日本]";
        assert_eq!(links(text), vec!["http://exemple.fr/été", "https://日本.jp"]);
    }

    #[test]
    fn links_are_returned_in_order() {
        let text = "[http://one.com] http://two.com {{x|u=http://three.com}} [http://four.com 4]";
        assert_eq!(
            links(text),
            vec![
                "http://one.com",
                "http://two.com",
                "http://three.com",
                "http://four.com"
            ]
        );
    }

    #[test]
    fn iterator_is_lazy() {
        let mut it = external_links("[http://a.com] [http://b.com]");
        assert_eq!(it.next(), Some("http://a.com"));
        assert_eq!(it.next(), Some("http://b.com"));
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn empty_text() {
        assert!(links("").is_empty());
    }
}
