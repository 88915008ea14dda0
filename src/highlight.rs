use crate::model::Node;

pub const MATCH_OPACITY: f32 = 1.0;
pub const DIMMED_OPACITY: f32 = 0.1;

/// Paint opacity for a node name under the current search term.
///
/// An empty term matches everything. Otherwise the name must contain the
/// term case-insensitively.
pub fn visibility(name: &str, search_term: &str) -> f32 {
    if search_term.is_empty() || name_matches(name, &search_term.to_lowercase()) {
        MATCH_OPACITY
    } else {
        DIMMED_OPACITY
    }
}

fn name_matches(name: &str, lowered_term: &str) -> bool {
    name.to_lowercase().contains(lowered_term)
}

/// Opacity for every node, in input order. Lowercases the term once.
pub fn opacities<'a>(nodes: impl IntoIterator<Item = &'a Node>, search_term: &str) -> Vec<f32> {
    let lowered = search_term.to_lowercase();
    nodes
        .into_iter()
        .map(|node| {
            if lowered.is_empty() || name_matches(&node.name, &lowered) {
                MATCH_OPACITY
            } else {
                DIMMED_OPACITY
            }
        })
        .collect()
}
