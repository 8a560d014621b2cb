/// Statistics collected during the extraction pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractionStats {
    pub pages_seen: u64,
    pub articles_scanned: u64,
    pub links_written: u64,
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_articles(&mut self) {
        self.articles_scanned += 1;
    }

    pub fn add_links(&mut self, count: u64) {
        self.links_written += count;
    }
}

/// Statistics for the line-oriented passes (count, filter, robots)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineStats {
    pub lines_read: u64,
    /// Lines counted, kept or allowed, depending on the pass
    pub lines_accepted: u64,
    /// Lines without a usable hostname
    pub lines_without_host: u64,
}

impl LineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_read(&mut self) {
        self.lines_read += 1;
    }

    pub fn inc_accepted(&mut self) {
        self.lines_accepted += 1;
    }

    pub fn inc_without_host(&mut self) {
        self.lines_without_host += 1;
    }
}
