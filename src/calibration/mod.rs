//! Capture of user disagreement with the system's assessments.
//!
//! A calibration compares a model-asserted value with a user-asserted one,
//! derives a disagreement index, and emits exactly one log entry per
//! submission. Node calibrations are authoritative: the user's value
//! overwrites the node's mastery and flags the node.

mod evidence;
mod node;
mod profile;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{NodeId, NodeUpdate};

pub use evidence::{EvidenceExport, EvidenceLog};
pub use node::{DraftWarning, NodeCalibration, NodeDraft};
pub use profile::{
    AlignmentBand, Dimension, ProfileCalibration, UserProfile, DEFAULT_LIKERT_TRUST,
    DEFAULT_PROFILE_REASON,
};

/// Distance between a model value and a user value.
pub trait Disagreement {
    fn disagreement_index(&self, other: &Self) -> f64;
}

impl Disagreement for f64 {
    fn disagreement_index(&self, other: &Self) -> f64 {
        (self - other).abs()
    }
}

impl Disagreement for u8 {
    fn disagreement_index(&self, other: &Self) -> f64 {
        (f64::from(*self) - f64::from(*other)).abs()
    }
}

/// `|model - user|` for scalars, summed per dimension for profiles.
pub fn disagreement_index<T: Disagreement + ?Sized>(model: &T, user: &T) -> f64 {
    model.disagreement_index(user)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationKind {
    Profile,
    Node,
}

/// Either a single score or a whole profile, as asserted by one side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CalibrationValue {
    Score(f64),
    Profile(UserProfile),
}

/// A calibration as emitted by the core, before the log owner stamps it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationEntry {
    #[serde(rename = "type")]
    pub kind: CalibrationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<NodeId>,
    pub model_value: CalibrationValue,
    pub user_value: CalibrationValue,
    #[serde(default)]
    pub reason: String,
    pub disagreement_index: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likert_trust: Option<u8>,
}

/// An immutable, stamped calibration record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationLog {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub entry: CalibrationEntry,
}

/// Collaborators that receive calibration output.
///
/// Delivery is fire-and-forget: the core neither retries nor learns whether
/// the sink stored anything.
pub trait CalibrationSink {
    fn on_node_update(&mut self, id: &str, update: NodeUpdate);

    fn on_log_calibration(&mut self, entry: CalibrationEntry);
}

impl<T: CalibrationSink + ?Sized> CalibrationSink for &mut T {
    fn on_node_update(&mut self, id: &str, update: NodeUpdate) {
        (**self).on_node_update(id, update);
    }

    fn on_log_calibration(&mut self, entry: CalibrationEntry) {
        (**self).on_log_calibration(entry);
    }
}

/// Where a single calibration interaction stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CalibrationState {
    #[default]
    Idle,
    Editing,
    Submitted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_index_is_absolute_difference() {
        assert_eq!(disagreement_index(&70.0, &55.0), 15.0);
        assert_eq!(disagreement_index(&55.0, &70.0), 15.0);
        assert_eq!(disagreement_index(&60_u8, &90_u8), 30.0);
        assert_eq!(disagreement_index(&42_u8, &42_u8), 0.0);
    }

    #[test]
    fn entry_json_matches_log_shape() {
        let entry = CalibrationEntry {
            kind: CalibrationKind::Node,
            target_id: Some("3".to_owned()),
            model_value: CalibrationValue::Score(60.0),
            user_value: CalibrationValue::Score(90.0),
            reason: "I use it daily".to_owned(),
            disagreement_index: 30.0,
            likert_trust: None,
        };

        let json = serde_json::to_value(&entry).expect("serializable");
        assert_eq!(json["type"], "Node");
        assert_eq!(json["targetId"], "3");
        assert_eq!(json["modelValue"], 60.0);
        assert_eq!(json["disagreementIndex"], 30.0);
        assert!(json.get("likertTrust").is_none());

        let back: CalibrationEntry = serde_json::from_value(json).expect("deserializable");
        assert_eq!(back, entry);
    }

    #[test]
    fn log_flattens_entry_fields() {
        let raw = r#"{
            "id": "log_init",
            "timestamp": "2025-01-01T10:00:00Z",
            "type": "Profile",
            "modelValue": {"cognition": 60, "affect": 40, "behavior": 70},
            "userValue": {"cognition": 65, "affect": 42, "behavior": 78},
            "reason": "more confident than assessed",
            "disagreementIndex": 15,
            "likertTrust": 4
        }"#;

        let log: CalibrationLog = serde_json::from_str(raw).expect("valid log json");
        assert_eq!(log.entry.kind, CalibrationKind::Profile);
        assert_eq!(log.entry.likert_trust, Some(4));
        match (&log.entry.model_value, &log.entry.user_value) {
            (CalibrationValue::Profile(model), CalibrationValue::Profile(user)) => {
                assert_eq!(disagreement_index(model, user), 15.0);
            }
            other => panic!("expected profile values, got {other:?}"),
        }
    }
}
