use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    CalibrationEntry, CalibrationKind, CalibrationSink, CalibrationState, CalibrationValue,
    Disagreement,
};

pub const DEFAULT_PROFILE_REASON: &str = "User submitted calibration";
pub const DEFAULT_LIKERT_TRUST: u8 = 3;

const HIGH_ALIGNMENT_BELOW: f64 = 20.0;
const SEVERE_DIVERGENCE_ABOVE: f64 = 50.0;

/// The learner profile along three named dimensions, each 0-100.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub cognition: f64,
    pub affect: f64,
    pub behavior: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn new(cognition: f64, affect: f64, behavior: f64) -> Self {
        Self {
            cognition,
            affect,
            behavior,
            last_update: None,
        }
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Cognition => self.cognition,
            Dimension::Affect => self.affect,
            Dimension::Behavior => self.behavior,
        }
    }

    pub fn set(&mut self, dimension: Dimension, value: f64) {
        let value = if value.is_finite() { value.clamp(0.0, 100.0) } else { 0.0 };
        match dimension {
            Dimension::Cognition => self.cognition = value,
            Dimension::Affect => self.affect = value,
            Dimension::Behavior => self.behavior = value,
        }
    }
}

impl Disagreement for UserProfile {
    fn disagreement_index(&self, other: &Self) -> f64 {
        Dimension::ALL
            .iter()
            .map(|&dimension| (self.get(dimension) - other.get(dimension)).abs())
            .sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    Cognition,
    Affect,
    Behavior,
}

impl Dimension {
    pub const ALL: [Self; 3] = [Self::Cognition, Self::Affect, Self::Behavior];

    pub fn label(self) -> &'static str {
        match self {
            Self::Cognition => "Cognition",
            Self::Affect => "Affect",
            Self::Behavior => "Behavior",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignmentBand {
    HighAlignment,
    DivergenceDetected,
}

impl AlignmentBand {
    pub fn of(total_delta: f64) -> Self {
        if total_delta < HIGH_ALIGNMENT_BELOW {
            Self::HighAlignment
        } else {
            Self::DivergenceDetected
        }
    }
}

/// Self-assessment of the whole profile against the model's profile.
#[derive(Clone, Debug)]
pub struct ProfileCalibration {
    model: UserProfile,
    self_assessed: UserProfile,
    reason: String,
    likert_trust: u8,
    state: CalibrationState,
}

impl ProfileCalibration {
    pub fn new(model: UserProfile) -> Self {
        Self {
            self_assessed: model.clone(),
            model,
            reason: String::new(),
            likert_trust: DEFAULT_LIKERT_TRUST,
            state: CalibrationState::Idle,
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn model(&self) -> &UserProfile {
        &self.model
    }

    pub fn self_assessed(&self) -> &UserProfile {
        &self.self_assessed
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn likert_trust(&self) -> u8 {
        self.likert_trust
    }

    /// Points the form at a newer model profile, keeping the user's edits.
    pub fn rebase(&mut self, model: UserProfile) {
        self.model = model;
    }

    pub fn set_dimension(&mut self, dimension: Dimension, value: f64) {
        self.self_assessed.set(dimension, value);
        self.state = CalibrationState::Editing;
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.reason = reason.into();
        self.state = CalibrationState::Editing;
    }

    /// Trust in the model's assessment on a 1-5 Likert scale.
    pub fn set_likert_trust(&mut self, trust: u8) {
        self.likert_trust = trust.clamp(1, 5);
        self.state = CalibrationState::Editing;
    }

    pub fn total_delta(&self) -> f64 {
        self.model.disagreement_index(&self.self_assessed)
    }

    pub fn alignment(&self) -> AlignmentBand {
        AlignmentBand::of(self.total_delta())
    }

    pub fn is_severe(&self) -> bool {
        self.total_delta() > SEVERE_DIVERGENCE_ABOVE
    }

    /// Emits a profile log entry. Profiles have no node to overwrite.
    pub fn submit(&mut self, sink: &mut impl CalibrationSink) -> CalibrationEntry {
        let reason = if self.reason.trim().is_empty() {
            DEFAULT_PROFILE_REASON.to_owned()
        } else {
            self.reason.clone()
        };

        let entry = CalibrationEntry {
            kind: CalibrationKind::Profile,
            target_id: None,
            model_value: CalibrationValue::Profile(self.model.clone()),
            user_value: CalibrationValue::Profile(self.self_assessed.clone()),
            reason,
            disagreement_index: self.total_delta(),
            likert_trust: Some(self.likert_trust),
        };
        tracing::info!(
            disagreement = entry.disagreement_index,
            trust = self.likert_trust,
            "profile calibration submitted"
        );

        sink.on_log_calibration(entry.clone());
        self.state = CalibrationState::Submitted;
        entry
    }

    pub fn acknowledge(&mut self) {
        if self.state == CalibrationState::Submitted {
            self.state = CalibrationState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::disagreement_index;
    use crate::model::NodeUpdate;

    #[derive(Default)]
    struct Recorder {
        updates: usize,
        logs: Vec<CalibrationEntry>,
    }

    impl CalibrationSink for Recorder {
        fn on_node_update(&mut self, _id: &str, _update: NodeUpdate) {
            self.updates += 1;
        }

        fn on_log_calibration(&mut self, entry: CalibrationEntry) {
            self.logs.push(entry);
        }
    }

    #[test]
    fn profile_index_sums_dimensions() {
        let model = UserProfile::new(60.0, 40.0, 70.0);
        let user = UserProfile::new(65.0, 42.0, 78.0);
        assert_eq!(disagreement_index(&model, &user), 15.0);
        assert_eq!(disagreement_index(&user, &model), 15.0);
    }

    #[test]
    fn set_clamps_into_range() {
        let mut profile = UserProfile::default();
        profile.set(Dimension::Affect, 140.0);
        profile.set(Dimension::Behavior, f64::NAN);
        assert_eq!(profile.affect, 100.0);
        assert_eq!(profile.behavior, 0.0);
    }

    #[test]
    fn alignment_bands() {
        let mut calibration = ProfileCalibration::new(UserProfile::new(65.0, 42.0, 78.0));
        assert_eq!(calibration.alignment(), AlignmentBand::HighAlignment);

        calibration.set_dimension(Dimension::Cognition, 90.0);
        assert_eq!(calibration.total_delta(), 25.0);
        assert_eq!(calibration.alignment(), AlignmentBand::DivergenceDetected);
        assert!(!calibration.is_severe());

        calibration.set_dimension(Dimension::Behavior, 40.0);
        assert!(calibration.is_severe());
    }

    #[test]
    fn submit_logs_profile_with_defaults() {
        let mut calibration = ProfileCalibration::new(UserProfile::new(60.0, 40.0, 70.0));
        let mut sink = Recorder::default();
        calibration.set_dimension(Dimension::Cognition, 65.0);
        calibration.set_dimension(Dimension::Affect, 42.0);
        calibration.set_dimension(Dimension::Behavior, 78.0);
        calibration.set_likert_trust(9);

        let entry = calibration.submit(&mut sink);
        assert_eq!(entry.kind, CalibrationKind::Profile);
        assert_eq!(entry.reason, DEFAULT_PROFILE_REASON);
        assert_eq!(entry.disagreement_index, 15.0);
        assert_eq!(entry.likert_trust, Some(5));
        assert_eq!(entry.target_id, None);
        assert_eq!(sink.logs.len(), 1);
        assert_eq!(sink.updates, 0);
        assert_eq!(calibration.state(), CalibrationState::Submitted);

        calibration.acknowledge();
        assert_eq!(calibration.state(), CalibrationState::Idle);
    }
}
