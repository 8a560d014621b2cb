use crate::config::{LINE_BATCH_INTERVAL, LINE_PROGRESS_INTERVAL, WRITE_BUFFER_CAPACITY};
use crate::error::Result;
use crate::models::{hostname, url_field};
use crate::stats::LineStats;
use indicatif::ProgressBar;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use tracing::info;

/// Hostname -> number of link lines citing it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainCounts {
    counts: FxHashMap<String, u64>,
}

impl DomainCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, host: &str) {
        // avoid allocating the key for hosts we've already seen
        if let Some(count) = self.counts.get_mut(host) {
            *count += 1;
        } else {
            self.counts.insert(host.to_string(), 1);
        }
    }

    pub fn get(&self, host: &str) -> Option<u64> {
        self.counts.get(host).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn load(path: &str) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Writes a flat JSON object with keys sorted, so reruns are byte-identical.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        let sorted: BTreeMap<&str, u64> = self
            .counts
            .iter()
            .map(|(host, count)| (host.as_str(), *count))
            .collect();
        serde_json::to_writer(writer, &sorted)?;
        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_CAPACITY, File::create(path)?);
        self.write_json(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for DomainCounts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Counts the hostnames of every line of a link file.
pub fn count_domains<R: BufRead>(input: R) -> Result<(DomainCounts, LineStats)> {
    let mut counts = DomainCounts::new();
    let mut stats = LineStats::new();
    let pb = ProgressBar::new_spinner();

    for line in input.lines() {
        let line = line?;
        stats.inc_read();

        match hostname(url_field(&line)) {
            Some(host) => {
                counts.record(&host);
                stats.inc_accepted();
            }
            None => stats.inc_without_host(),
        }

        let done = stats.lines_read;
        if done % LINE_PROGRESS_INTERVAL == 0 {
            pb.set_message(format!("{} lines", done));
            pb.tick();
        }
        if done % LINE_BATCH_INTERVAL == 0 {
            info!(lines = done, hosts = counts.len(), "Counting domains");
        }
    }

    pb.finish_and_clear();
    Ok((counts, stats))
}

pub fn run_count_domains(input: &str, output: &str) -> Result<LineStats> {
    info!("Counting domains in: {}", input);
    let reader = BufReader::new(File::open(input)?);
    let (counts, stats) = count_domains(reader)?;
    counts.save(output)?;

    info!(
        lines = stats.lines_read,
        hosts = counts.len(),
        "Domain counts written to {}",
        output
    );
    Ok(stats)
}
