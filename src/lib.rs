//! Force-directed knowledge graph layout with mastery calibration capture.
//!
//! The [`layout::LayoutEngine`] owns the simulation and a
//! [`positions::PositionStore`] that outlives data refreshes and view
//! remounts. [`interaction::InteractionController`] maps pointer gestures to
//! pins and selections, [`highlight`] dims nodes for a search term, and
//! [`calibration`] turns user disagreement into log entries and node updates.

pub mod calibration;
pub mod config;
pub mod error;
pub mod highlight;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod positions;
pub mod render;
pub mod snapshot;
mod util;

pub use config::LayoutConfig;
pub use error::SnapshotError;
pub use layout::{LayoutEngine, SyncOutcome};
pub use model::{Edge, MasteryBand, Node, NodeId, NodeUpdate};
pub use positions::{PositionRecord, PositionStore};
pub use snapshot::GraphSnapshot;
