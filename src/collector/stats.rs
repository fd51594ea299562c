//! Run statistics

use crate::collector::ingester::IngestReport;
use std::time::Duration;

/// Summary of a finished collection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Ladder pages requested, including the final empty one
    pub pages: u32,

    /// Ladder entries processed
    pub entries: u64,

    /// Match ids returned by the match listings
    pub matches_listed: u64,

    /// Match ids already present in the store
    pub matches_skipped: u64,

    /// Matches fetched and persisted
    pub matches_stored: u64,

    /// Total size of the persisted records
    pub bytes_stored: u64,

    pub elapsed: Duration,
}

impl RunStats {
    /// Adds the result of one processed ladder entry
    pub fn record_entry(&mut self, report: &IngestReport) {
        self.entries += 1;
        self.matches_listed += report.listed as u64;
        self.matches_skipped += report.skipped as u64;
        self.matches_stored += report.stored as u64;
        self.bytes_stored += report.bytes;
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_run_statistics(stats: &RunStats) {
    println!("=== Collection Statistics ===\n");
    println!("  Ladder pages requested: {}", stats.pages);
    println!("  Entries processed: {}", stats.entries);
    println!("  Match ids listed: {}", stats.matches_listed);
    println!("  Already stored: {}", stats.matches_skipped);
    println!(
        "  Newly stored: {} ({} bytes)",
        stats.matches_stored, stats.bytes_stored
    );
    println!("  Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
}
