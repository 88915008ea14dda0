mod details;
mod panels;

pub(super) use details::draw_node_details;
pub(super) use panels::{draw_evidence, draw_legend, draw_profile_calibration};
