use crate::model::{Node, NodeId, NodeUpdate};

use super::{
    CalibrationEntry, CalibrationKind, CalibrationSink, CalibrationState, CalibrationValue,
    disagreement_index,
};

/// Soft validation notes. None of them blocks a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftWarning {
    EmptyReason,
    ValueUnchanged,
}

/// The user's pending assessment of one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeDraft {
    pub target_id: NodeId,
    pub model_value: u8,
    pub user_value: u8,
    pub reason: String,
}

impl NodeDraft {
    pub fn disagreement_index(&self) -> f64 {
        disagreement_index(&self.model_value, &self.user_value)
    }

    pub fn warnings(&self) -> Vec<DraftWarning> {
        let mut warnings = Vec::new();
        if self.reason.trim().is_empty() {
            warnings.push(DraftWarning::EmptyReason);
        }
        if self.user_value == self.model_value {
            warnings.push(DraftWarning::ValueUnchanged);
        }
        warnings
    }
}

/// One "disagree" interaction on a node: Idle, Editing, Submitted, Idle.
#[derive(Clone, Debug, Default)]
pub struct NodeCalibration {
    state: CalibrationState,
    draft: Option<NodeDraft>,
}

impl NodeCalibration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Opens the form for `node`, starting the slider at its current mastery.
    pub fn begin(&mut self, node: &Node) {
        self.draft = Some(NodeDraft {
            target_id: node.id.clone(),
            model_value: node.mastery,
            user_value: node.mastery,
            reason: String::new(),
        });
        self.state = CalibrationState::Editing;
    }

    pub fn draft(&self) -> Option<&NodeDraft> {
        self.draft.as_ref().filter(|_| self.state == CalibrationState::Editing)
    }

    pub fn set_user_value(&mut self, value: u8) {
        if let Some(draft) = self.editing_draft() {
            draft.user_value = value.min(100);
        }
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) {
        if let Some(draft) = self.editing_draft() {
            draft.reason = reason.into();
        }
    }

    fn editing_draft(&mut self) -> Option<&mut NodeDraft> {
        if self.state != CalibrationState::Editing {
            return None;
        }
        self.draft.as_mut()
    }

    pub fn cancel(&mut self) {
        self.draft = None;
        self.state = CalibrationState::Idle;
    }

    /// Emits the log entry, then overwrites the node's mastery and flags it.
    ///
    /// Returns `None` when no draft is being edited.
    pub fn submit(&mut self, sink: &mut impl CalibrationSink) -> Option<CalibrationEntry> {
        if self.state != CalibrationState::Editing {
            return None;
        }
        let draft = self.draft.take()?;

        let warnings = draft.warnings();
        if !warnings.is_empty() {
            tracing::debug!(node = %draft.target_id, ?warnings, "submitting calibration with notes");
        }

        let entry = CalibrationEntry {
            kind: CalibrationKind::Node,
            target_id: Some(draft.target_id.clone()),
            model_value: CalibrationValue::Score(f64::from(draft.model_value)),
            user_value: CalibrationValue::Score(f64::from(draft.user_value)),
            reason: draft.reason,
            disagreement_index: disagreement_index(&draft.model_value, &draft.user_value),
            likert_trust: None,
        };
        tracing::info!(
            node = %draft.target_id,
            model = draft.model_value,
            user = draft.user_value,
            disagreement = entry.disagreement_index,
            "node calibration submitted"
        );

        sink.on_log_calibration(entry.clone());
        sink.on_node_update(
            &draft.target_id,
            NodeUpdate {
                mastery: Some(draft.user_value),
                is_flagged: Some(true),
                ..Default::default()
            },
        );

        self.state = CalibrationState::Submitted;
        Some(entry)
    }

    /// Returns a submitted interaction to idle.
    pub fn acknowledge(&mut self) {
        if self.state == CalibrationState::Submitted {
            self.state = CalibrationState::Idle;
        }
    }
}
