use cognisync_graph::calibration::{
    CalibrationEntry, CalibrationKind, CalibrationSink, Dimension, EvidenceLog, NodeCalibration,
    ProfileCalibration, UserProfile, disagreement_index,
};
use cognisync_graph::{GraphSnapshot, Node, NodeUpdate};

#[derive(Default)]
struct Host {
    nodes: Vec<Node>,
    updates: Vec<(String, NodeUpdate)>,
    evidence: EvidenceLog,
}

impl CalibrationSink for Host {
    fn on_node_update(&mut self, id: &str, update: NodeUpdate) {
        if let Some(node) = self.nodes.iter_mut().find(|node| node.id == id) {
            update.apply_to(node);
        }
        self.updates.push((id.to_owned(), update));
    }

    fn on_log_calibration(&mut self, entry: CalibrationEntry) {
        self.evidence.append(entry);
    }
}

#[test]
fn node_calibration_overwrites_and_logs_once() {
    let mut host = Host {
        nodes: vec![Node::new("3", "Gradient Descent", 60, 6)],
        ..Default::default()
    };

    let mut calibration = NodeCalibration::new();
    calibration.begin(&host.nodes[0]);
    calibration.set_user_value(90);
    calibration.submit(&mut host);

    assert_eq!(host.updates.len(), 1);
    assert_eq!(host.updates[0].1.mastery, Some(90));
    assert_eq!(host.updates[0].1.is_flagged, Some(true));
    assert_eq!(host.evidence.len(), 1);
    assert_eq!(host.evidence.entries()[0].entry.disagreement_index, 30.0);

    assert_eq!(host.nodes[0].mastery, 90);
    assert!(host.nodes[0].is_flagged);
}

#[test]
fn disagreement_index_is_symmetric() {
    assert_eq!(disagreement_index(&60_u8, &90_u8), 30.0);
    assert_eq!(disagreement_index(&90_u8, &60_u8), 30.0);

    let model = UserProfile::new(60.0, 40.0, 70.0);
    let user = UserProfile::new(65.0, 42.0, 78.0);
    assert_eq!(disagreement_index(&model, &user), 15.0);
}

#[test]
fn profile_calibration_logs_without_node_update() {
    let mut host = Host::default();
    let mut calibration = ProfileCalibration::new(UserProfile::new(65.0, 42.0, 78.0));
    calibration.set_dimension(Dimension::Affect, 80.0);
    calibration.submit(&mut host);

    assert!(host.updates.is_empty());
    let log = &host.evidence.entries()[0];
    assert_eq!(log.entry.kind, CalibrationKind::Profile);
    assert_eq!(log.entry.disagreement_index, 38.0);
    assert_eq!(log.entry.likert_trust, Some(3));
    assert!(log.id.starts_with("cal_"));
}

#[test]
fn evidence_keeps_seeded_logs_and_prepends() {
    let snapshot = GraphSnapshot::sample();
    let mut host = Host {
        evidence: EvidenceLog::with_entries(snapshot.logs.clone()),
        nodes: snapshot.nodes.clone(),
        ..Default::default()
    };

    let mut calibration = NodeCalibration::new();
    calibration.begin(&host.nodes[4]);
    calibration.set_user_value(55);
    calibration.set_reason("Reviewed regularization last week");
    calibration.submit(&mut host);

    let ids: Vec<_> = host.evidence.entries().iter().map(|log| log.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids[0].starts_with("cal_"));
    assert_eq!(ids[1], "log_init");
    assert_eq!(host.evidence.entries()[0].entry.target_id.as_deref(), Some("5"));
}

#[test]
fn export_round_trips_through_file() {
    let snapshot = GraphSnapshot::sample();
    let evidence = EvidenceLog::with_entries(snapshot.logs);

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("cognisync_research_export.json");
    evidence.export_to(&path).expect("export succeeds");

    let raw = std::fs::read_to_string(&path).expect("readable");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(json["logs"][0]["id"], "log_init");
    assert_eq!(json["logs"][0]["likertTrust"], 4);
    assert_eq!(json["logs"][0]["modelValue"]["cognition"], 60.0);
}
