use crate::config::{LINE_BATCH_INTERVAL, LINE_PROGRESS_INTERVAL, WRITE_BUFFER_CAPACITY};
use crate::domains::DomainCounts;
use crate::error::{Error, Result};
use crate::models::{hostname, url_field};
use crate::stats::LineStats;
use indicatif::ProgressBar;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use tracing::info;

/// Copies through the link lines whose hostname is cited at most `threshold`
/// times. Lines are written byte-for-byte, line terminator included.
///
/// Every hostname in `input` must be present in `counts`; a missing one means
/// the two files come from different runs and fails with [`Error::MissingKey`].
pub fn filter_links<R: BufRead, W: Write>(
    mut input: R,
    counts: &DomainCounts,
    threshold: u64,
    output: &mut W,
) -> Result<LineStats> {
    let mut stats = LineStats::new();
    let mut line = String::new();
    let pb = ProgressBar::new_spinner();

    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        stats.inc_read();

        match hostname(url_field(&line)) {
            Some(host) => {
                let count = counts.get(&host).ok_or(Error::MissingKey(host))?;
                if count <= threshold {
                    output.write_all(line.as_bytes())?;
                    stats.inc_accepted();
                }
            }
            None => stats.inc_without_host(),
        }

        let done = stats.lines_read;
        if done % LINE_PROGRESS_INTERVAL == 0 {
            pb.set_message(format!("{} lines", done));
            pb.tick();
        }
        if done % LINE_BATCH_INTERVAL == 0 {
            info!(lines = done, kept = stats.lines_accepted, "Filtering links");
        }
    }

    pb.finish_and_clear();
    Ok(stats)
}

pub fn run_filter(links: &str, counts: &str, output: &str, threshold: u64) -> Result<LineStats> {
    let counts = DomainCounts::load(counts)?;
    info!(hosts = counts.len(), threshold, "Loaded domain counts");

    let reader = BufReader::new(File::open(links)?);
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_CAPACITY, File::create(output)?);

    let outcome = filter_links(reader, &counts, threshold, &mut writer);
    let flushed = writer.flush();
    let stats = outcome?;
    flushed?;

    info!(
        read = stats.lines_read,
        kept = stats.lines_accepted,
        "Rare links written to {}",
        output
    );
    Ok(stats)
}
