//! Statistics over a crawled registry
//!
//! Summaries are reported through `tracing` so they never mix with the
//! JSON written to stdout.

use crate::state::{Registry, Slot};

/// Registry statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStatistics {
    /// Slots excluding the reserved slot 0
    pub total_ids: u64,

    /// Ids that produced a record
    pub present: u64,

    /// Ids the directory reported as nonexistent
    pub absent: u64,

    /// Ids never resolved
    pub pending: u64,

    /// Records carrying rank attributes
    pub ranked: u64,

    /// Total degrees across all records
    pub degrees: u64,

    /// Total advisor references across all degrees
    pub advisor_links: u64,
}

/// Computes statistics for `registry`
pub fn compute_statistics(registry: &Registry) -> RegistryStatistics {
    let mut stats = RegistryStatistics::default();

    for (id, slot) in registry.iter() {
        if id == 0 {
            continue;
        }
        stats.total_ids += 1;
        match slot {
            Slot::Pending => stats.pending += 1,
            Slot::Absent => stats.absent += 1,
            Slot::Present(record) => {
                stats.present += 1;
                if record.rank.is_some() {
                    stats.ranked += 1;
                }
                stats.degrees += record.degrees.len() as u64;
                stats.advisor_links += record
                    .degrees
                    .iter()
                    .map(|degree| degree.advisors.len() as u64)
                    .sum::<u64>();
            }
        }
    }

    stats
}

/// Formats statistics as a multi-line report
pub fn format_statistics(stats: &RegistryStatistics) -> String {
    let share = |count: u64| {
        if stats.total_ids > 0 {
            (count as f64 / stats.total_ids as f64) * 100.0
        } else {
            0.0
        }
    };

    let mut report = String::from("=== Harvest Statistics ===\n");
    report.push_str(&format!("  Known ids: {}\n", stats.total_ids));
    report.push_str(&format!(
        "  Records: {} ({:.1}%)\n",
        stats.present,
        share(stats.present)
    ));
    report.push_str(&format!(
        "  Nonexistent: {} ({:.1}%)\n",
        stats.absent,
        share(stats.absent)
    ));
    if stats.pending > 0 {
        report.push_str(&format!("  Unresolved: {}\n", stats.pending));
    }
    report.push_str(&format!("  Degrees: {}\n", stats.degrees));
    report.push_str(&format!("  Advisor links: {}\n", stats.advisor_links));
    report.push_str(&format!("  Ranked records: {}", stats.ranked));
    report
}

/// Logs the statistics report line by line at info level
pub fn log_statistics(stats: &RegistryStatistics) {
    for line in format_statistics(stats).lines() {
        tracing::info!("{}", line);
    }
}
