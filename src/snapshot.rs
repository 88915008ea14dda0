//! JSON snapshots of the upstream graph, plus the built-in demo graph.

use std::fs;
use std::path::Path;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::calibration::{
    CalibrationEntry, CalibrationKind, CalibrationLog, CalibrationValue, UserProfile,
};
use crate::config::LayoutConfig;
use crate::error::SnapshotError;
use crate::model::{Edge, Node};

const MAX_MASTERY: u8 = 100;
const MIN_FREQUENCY: u8 = 1;
const MAX_FREQUENCY: u8 = 10;

/// Everything the host needs to start a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<CalibrationLog>,
}

impl GraphSnapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let raw = fs::read_to_string(path).map_err(|source| SnapshotError::io(path, source))?;
        let mut snapshot: Self =
            serde_json::from_str(&raw).map_err(|source| SnapshotError::parse(path, source))?;
        snapshot.clamp_ranges();

        tracing::info!(
            path = %path.display(),
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            logs = snapshot.logs.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Pulls producer values back into mastery 0-100 and frequency 1-10.
    fn clamp_ranges(&mut self) {
        for node in &mut self.nodes {
            let mastery = node.mastery.min(MAX_MASTERY);
            let frequency = node.frequency.clamp(MIN_FREQUENCY, MAX_FREQUENCY);
            if mastery != node.mastery || frequency != node.frequency {
                tracing::warn!(
                    id = %node.id,
                    mastery = node.mastery,
                    frequency = node.frequency,
                    "node values out of range, clamping"
                );
                node.mastery = mastery;
                node.frequency = frequency;
            }
        }
    }

    /// A small machine-learning concept graph with one seeded profile log.
    pub fn sample() -> Self {
        let now = Utc::now();
        let seeded_at = now - Duration::seconds(500);

        let nodes = vec![
            Node::new("1", "Neural Networks", 85, 8)
                .with_description("Computing systems inspired by biological neural networks."),
            Node::new("2", "Backpropagation", 45, 5)
                .with_description("Algorithm for training feedforward neural networks."),
            Node::new("3", "Gradient Descent", 60, 6).with_description(
                "Optimization algorithm for finding a local minimum of a differentiable function.",
            ),
            Node::new("4", "Activation Function", 90, 3)
                .with_description("Function that decides the output of a neural network node."),
            Node::new("5", "Overfitting", 30, 7)
                .with_description(
                    "An analysis that matches a particular data set too closely and generalizes poorly.",
                )
                .flagged(),
            Node::new("6", "Python", 95, 9).with_description("A high-level programming language."),
            Node::new("7", "TensorFlow", 50, 4)
                .with_description("End-to-end open source platform for machine learning."),
        ];
        let edges = [("1", "2"), ("1", "4"), ("2", "3"), ("5", "1"), ("6", "7"), ("7", "1")]
            .into_iter()
            .map(|(source, target)| Edge::new(source, target))
            .collect();

        let profile = UserProfile {
            last_update: Some(now),
            ..UserProfile::new(65.0, 42.0, 78.0)
        };
        let seed_model = UserProfile {
            last_update: Some(seeded_at),
            ..UserProfile::new(60.0, 40.0, 70.0)
        };
        let seed_user = UserProfile {
            last_update: Some(seeded_at),
            ..UserProfile::new(65.0, 42.0, 78.0)
        };
        let logs = vec![CalibrationLog {
            id: "log_init".to_owned(),
            timestamp: seeded_at,
            entry: CalibrationEntry {
                kind: CalibrationKind::Profile,
                target_id: None,
                model_value: CalibrationValue::Profile(seed_model),
                user_value: CalibrationValue::Profile(seed_user),
                reason: "I feel more confident than the model assessed.".to_owned(),
                disagreement_index: 15.0,
                likert_trust: Some(4),
            },
        }];

        Self {
            nodes,
            edges,
            profile: Some(profile),
            logs,
        }
    }
}

/// Reads layout constants from JSON. Missing fields keep their defaults.
pub fn load_layout_config(path: &Path) -> Result<LayoutConfig, SnapshotError> {
    let raw = fs::read_to_string(path).map_err(|source| SnapshotError::io(path, source))?;
    let config: LayoutConfig =
        serde_json::from_str(&raw).map_err(|source| SnapshotError::parse(path, source))?;
    Ok(config.sanitized())
}
