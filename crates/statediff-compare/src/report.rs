//! Serializable presentations of comparison results.
//!
//! Shared by the CLI's JSON output and the HTTP server so both speak the
//! same shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statediff_types::Version;

use crate::diff::DiffOutcome;
use crate::display::KeyDisplay;
use crate::pair::ModuleReport;
use crate::stats::Stats;

/// Status of a module comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Identical,
    HashMismatchOnly,
    Diverged,
}

/// A [`ModuleReport`] with keys rendered for people.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReportView {
    pub module: String,
    pub version: Version,
    pub left_hash: String,
    pub right_hash: String,
    pub status: DiffStatus,
    pub message: String,
    pub only_left: Vec<KeyDisplay>,
    pub only_right: Vec<KeyDisplay>,
    pub differing: Vec<KeyDisplay>,
}

impl From<&ModuleReport> for ModuleReportView {
    fn from(report: &ModuleReport) -> Self {
        let render = |keys: &[Vec<u8>]| -> Vec<KeyDisplay> {
            keys.iter().map(|k| KeyDisplay::new(k)).collect()
        };
        let (status, message, only_left, only_right, differing) = match &report.outcome {
            DiffOutcome::Identical => (
                DiffStatus::Identical,
                format!("no differences found in {}", report.module),
                Vec::new(),
                Vec::new(),
                Vec::new(),
            ),
            DiffOutcome::HashMismatchOnly => (
                DiffStatus::HashMismatchOnly,
                "keys and values are the same, but the root hashes differ; the same \
                 set/remove operations were likely applied in a different order"
                    .to_string(),
                Vec::new(),
                Vec::new(),
                Vec::new(),
            ),
            DiffOutcome::Diverged(diff) => (
                DiffStatus::Diverged,
                format!(
                    "found {} differing keys in {} at version {}",
                    diff.len(),
                    report.module,
                    report.version
                ),
                render(&diff.only_left),
                render(&diff.only_right),
                render(&diff.differing),
            ),
        };

        Self {
            module: report.module.clone(),
            version: report.version,
            left_hash: report.left_hash.to_hex(),
            right_hash: report.right_hash.to_hex(),
            status,
            message,
            only_left,
            only_right,
            differing,
        }
    }
}

/// Store statistics with printable prefix labels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsView {
    pub count: u64,
    pub prefixes: BTreeMap<String, u64>,
}

impl From<&Stats> for StatsView {
    fn from(stats: &Stats) -> Self {
        Self {
            count: stats.count,
            prefixes: stats.labeled_histogram(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::KeyDiff;
    use statediff_types::RootHash;

    fn report(outcome: DiffOutcome) -> ModuleReport {
        ModuleReport {
            module: "bank".into(),
            version: 7,
            left_hash: RootHash::digest(b"l"),
            right_hash: RootHash::digest(b"r"),
            outcome,
        }
    }

    #[test]
    fn identical_view() {
        let view = ModuleReportView::from(&report(DiffOutcome::Identical));
        assert_eq!(view.status, DiffStatus::Identical);
        assert!(view.message.contains("no differences"));
        assert!(view.differing.is_empty());
    }

    #[test]
    fn hash_mismatch_view_explains_ordering() {
        let view = ModuleReportView::from(&report(DiffOutcome::HashMismatchOnly));
        assert_eq!(view.status, DiffStatus::HashMismatchOnly);
        assert!(view.message.contains("different order"));
    }

    #[test]
    fn diverged_view_renders_keys() {
        let outcome = DiffOutcome::Diverged(KeyDiff {
            only_left: vec![b"acc:alice".to_vec()],
            only_right: vec![],
            differing: vec![vec![0x01]],
        });
        let view = ModuleReportView::from(&report(outcome));
        assert_eq!(view.status, DiffStatus::Diverged);
        assert_eq!(view.only_left[0].pretty.as_deref(), Some("acc:alice"));
        assert_eq!(view.differing[0].hex, "01");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "diverged");
        assert_eq!(json["version"], 7);
    }

    #[test]
    fn stats_view_labels_prefixes() {
        let mut stats = Stats::default();
        stats.count = 3;
        stats.prefix_histogram.insert(b's', 2);
        stats.prefix_histogram.insert(0x00, 1);
        let view = StatsView::from(&stats);
        assert_eq!(view.prefixes.get("s"), Some(&2));
        assert_eq!(view.prefixes.get("0x00"), Some(&1));
    }
}
