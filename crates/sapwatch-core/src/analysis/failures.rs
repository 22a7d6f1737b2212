use std::collections::BTreeMap;

use crate::DecodeFailureSummary;
use crate::protocols::sap::error::SapDecodeError;

const MAX_EXAMPLES: usize = 3;

#[derive(Debug, Default)]
pub(crate) struct FailureTally {
    by_kind: BTreeMap<&'static str, KindStats>,
}

#[derive(Debug, Default)]
struct KindStats {
    count: u64,
    examples: Vec<String>,
}

impl FailureTally {
    pub fn record(&mut self, err: &SapDecodeError, context: String) {
        let stats = self.by_kind.entry(err.kind()).or_default();
        stats.count += 1;
        if stats.examples.len() < MAX_EXAMPLES {
            stats.examples.push(format!("{context}: {err}"));
        }
    }

    pub fn total(&self) -> u64 {
        self.by_kind.values().map(|stats| stats.count).sum()
    }

    /// Summaries sorted by kind.
    pub fn into_summaries(self) -> Vec<DecodeFailureSummary> {
        self.by_kind
            .into_iter()
            .map(|(kind, stats)| DecodeFailureSummary {
                kind: kind.to_string(),
                count: stats.count,
                examples: stats.examples,
            })
            .collect()
    }
}
