use crate::config::{BATCH_INTERVAL, MAIN_NAMESPACE, PROGRESS_INTERVAL, WRITE_BUFFER_CAPACITY};
use crate::content::external_links;
use crate::error::Result;
use crate::models::LinkRecord;
use crate::parser::DumpReader;
use crate::stats::ExtractionStats;
use indicatif::ProgressBar;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Line sink for link records: one `"{url}, {title}\n"` per link, in the
/// order they are written.
pub struct LinkWriter<W: Write> {
    inner: BufWriter<W>,
}

impl LinkWriter<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> LinkWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::with_capacity(WRITE_BUFFER_CAPACITY, inner),
        }
    }

    pub fn write_record(&mut self, record: &LinkRecord<'_>) -> Result<()> {
        writeln!(self.inner, "{}", record)?;
        Ok(())
    }

    /// Flushes buffered lines and hands back the underlying writer.
    pub fn finish(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}

/// Streams the dump at `input` and writes every external link of every
/// main-namespace page to `output`.
///
/// The output is flushed whether or not the pass succeeds, so a failed run
/// leaves everything written up to the failure on disk.
pub fn run_extraction(input: &str, output: &str, limit: Option<u64>) -> Result<ExtractionStats> {
    let reader = DumpReader::open(input)?;
    let mut sink = LinkWriter::create(output)?;

    info!("Extracting external links from: {}", input);

    let outcome = extract_links(reader, &mut sink, limit);
    let flushed = sink.finish();
    let stats = outcome?;
    flushed?;

    info!(
        pages = stats.pages_seen,
        articles = stats.articles_scanned,
        links = stats.links_written,
        "Extraction finished"
    );
    Ok(stats)
}

/// Core loop: filters the reader to the main namespace and writes one record
/// per link. `limit` caps the number of article bodies processed.
pub fn extract_links<R: BufRead, W: Write>(
    reader: DumpReader<R>,
    sink: &mut LinkWriter<W>,
    limit: Option<u64>,
) -> Result<ExtractionStats> {
    let mut reader = reader.with_namespace(MAIN_NAMESPACE);
    let mut stats = ExtractionStats::new();
    let pb = ProgressBar::new_spinner();

    for body in reader.by_ref() {
        let body = body?;
        stats.inc_articles();

        if let Some(text) = &body.text {
            let title = body.title.as_deref().unwrap_or("");
            let mut found = 0;
            for url in external_links(text) {
                sink.write_record(&LinkRecord { url, title })?;
                found += 1;
            }
            stats.add_links(found);
        }

        let done = stats.articles_scanned;
        if done % PROGRESS_INTERVAL == 0 {
            pb.set_message(format!("{} articles", done));
            pb.tick();
        }
        if done % BATCH_INTERVAL == 0 {
            info!(batch = done / BATCH_INTERVAL, links = stats.links_written, "Batch (100k) done");
        }

        if limit.is_some_and(|l| done >= l) {
            debug!(limit = done, "Page limit reached");
            break;
        }
    }

    pb.finish_and_clear();
    stats.pages_seen = reader.pages_seen();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn extract(xml: &str, limit: Option<u64>) -> (String, ExtractionStats) {
        let mut sink = LinkWriter::new(Vec::new());
        let stats = extract_links(DumpReader::from_reader(xml.as_bytes()), &mut sink, limit).unwrap();
        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        (out, stats)
    }

    fn page(title: &str, ns: &str, text: &str) -> String {
        format!(
            "<page><title>{}</title><ns>{}</ns><revision><text>{}</text></revision></page>",
            title, ns, text
        )
    }

    #[test]
    fn end_to_end_example() {
        let xml = format!(
            "<mediawiki>{}</mediawiki>",
            page("Example", "0", "See [http://example.com Example Site] and [http://other.org].")
        );
        let (out, stats) = extract(&xml, None);
        assert_eq!(out, "http://example.com, Example\nhttp://other.org, Example\n");
        assert_eq!(stats.links_written, 2);
        assert_eq!(stats.articles_scanned, 1);
    }

    #[test]
    fn non_article_namespace_is_ignored() {
        let xml = format!(
            "<mediawiki>{}</mediawiki>",
            page("Example", "1", "See [http://example.com Example Site] and [http://other.org].")
        );
        let (out, stats) = extract(&xml, None);
        assert!(out.is_empty());
        assert_eq!(stats.articles_scanned, 0);
        assert_eq!(stats.pages_seen, 1);
    }

    #[test]
    fn titles_follow_their_pages() {
        let xml = format!(
            "<mediawiki>{}{}{}</mediawiki>",
            page("First", "0", "[http://one.com]"),
            page("Talk:First", "1", "[http://talk.com]"),
            page("Second", "0", "http://two.com and [http://three.com x]")
        );
        let (out, _) = extract(&xml, None);
        assert_eq!(
            out,
            "http://one.com, First\nhttp://two.com, Second\nhttp://three.com, Second\n"
        );
    }

    #[test]
    fn empty_text_produces_nothing() {
        let xml = "<mediawiki><page><title>E</title><ns>0</ns><revision><text/></revision></page></mediawiki>";
        let (out, stats) = extract(xml, None);
        assert!(out.is_empty());
        assert_eq!(stats.articles_scanned, 1);
        assert_eq!(stats.links_written, 0);
    }

    #[test]
    fn missing_title_is_written_empty() {
        let xml = "<mediawiki><page><ns>0</ns><text>[http://a.com]</text></page></mediawiki>";
        let (out, _) = extract(xml, None);
        assert_eq!(out, "http://a.com, \n");
    }

    #[test]
    fn limit_stops_after_n_articles() {
        let xml = format!(
            "<mediawiki>{}{}{}</mediawiki>",
            page("A", "0", "[http://a.com]"),
            page("B", "0", "[http://b.com]"),
            page("C", "0", "[http://c.com]")
        );
        let (out, stats) = extract(&xml, Some(2));
        assert_eq!(out, "http://a.com, A\nhttp://b.com, B\n");
        assert_eq!(stats.articles_scanned, 2);
    }

    #[test]
    fn unknown_entity_stops_the_pass() {
        let xml = format!(
            "<mediawiki>{}{}{}</mediawiki>",
            page("Good", "0", "[http://good.com]"),
            page("Bad", "0", "&nosuchentity; [http://bad.com]"),
            page("Later", "0", "[http://later.com]")
        );
        let mut sink = LinkWriter::new(Vec::new());
        let result = extract_links(DumpReader::from_reader(xml.as_bytes()), &mut sink, None);
        assert!(matches!(result, Err(Error::Parse { .. })));
        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert_eq!(out, "http://good.com, Good\n");
    }

    #[test]
    fn bare_ampersand_in_title_stops_the_pass() {
        let xml = format!("<mediawiki>{}</mediawiki>", page("AT&T", "0", "[http://att.com]"));
        let mut sink = LinkWriter::new(Vec::new());
        let result = extract_links(DumpReader::from_reader(xml.as_bytes()), &mut sink, None);
        assert!(matches!(result, Err(Error::Parse { .. })));
        // nothing is written under a wrong or missing title
        assert!(sink.finish().unwrap().is_empty());
    }

    #[test]
    fn parse_error_propagates() {
        let xml = format!("<mediawiki>{}</page></mediawiki>", page("A", "0", "[http://a.com]"));
        let mut sink = LinkWriter::new(Vec::new());
        let result = extract_links(DumpReader::from_reader(xml.as_bytes()), &mut sink, None);
        assert!(result.is_err());
        // links found before the failure are still in the sink
        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert_eq!(out, "http://a.com, A\n");
    }

    #[test]
    fn link_writer_creates_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("links.txt");
        let mut writer = LinkWriter::create(&path).unwrap();
        writer
            .write_record(&LinkRecord { url: "http://a.com", title: "A" })
            .unwrap();
        writer.finish().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "http://a.com, A\n");
    }
}
