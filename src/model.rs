use serde::{Deserialize, Serialize};

pub type NodeId = String;

/// A concept in the learner's knowledge graph, as supplied by the upstream producer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// System assessment, 0-100.
    pub mastery: u8,
    /// How often the concept surfaced, 1-10. Drives rendered size only.
    pub frequency: u8,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_flagged: bool,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, mastery: u8, frequency: u8) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mastery,
            frequency,
            description: String::new(),
            is_flagged: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn flagged(mut self) -> Self {
        self.is_flagged = true;
        self
    }

    pub fn band(&self) -> MasteryBand {
        MasteryBand::of(self.mastery)
    }
}

/// Undirected for layout purposes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Partial update pushed back to the node producer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastery: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_flagged: Option<bool>,
}

impl NodeUpdate {
    pub fn apply_to(&self, node: &mut Node) {
        if let Some(name) = &self.name {
            node.name.clone_from(name);
        }
        if let Some(mastery) = self.mastery {
            node.mastery = mastery;
        }
        if let Some(frequency) = self.frequency {
            node.frequency = frequency;
        }
        if let Some(description) = &self.description {
            node.description.clone_from(description);
        }
        if let Some(is_flagged) = self.is_flagged {
            node.is_flagged = is_flagged;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MasteryBand {
    Weak,
    Developing,
    Mastered,
}

impl MasteryBand {
    pub fn of(mastery: u8) -> Self {
        if mastery < 50 {
            Self::Weak
        } else if mastery < 80 {
            Self::Developing
        } else {
            Self::Mastered
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Weak => "Weak",
            Self::Developing => "Developing",
            Self::Mastered => "Mastered",
        }
    }
}
