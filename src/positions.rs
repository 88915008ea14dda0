use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

/// Last known placement of a node, owned by [`PositionStore`].
#[derive(Clone, Debug, PartialEq)]
pub struct PositionRecord {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub fx: Option<f32>,
    pub fy: Option<f32>,
}

impl PositionRecord {
    pub fn free(id: impl Into<String>, position: Vec2) -> Self {
        Self {
            id: id.into(),
            x: position.x,
            y: position.y,
            fx: None,
            fy: None,
        }
    }

    pub fn position(&self) -> Vec2 {
        vec2(self.x, self.y)
    }

    /// Pinned coordinates, when both axes are held.
    pub fn pin(&self) -> Option<Vec2> {
        match (self.fx, self.fy) {
            (Some(fx), Some(fy)) => Some(vec2(fx, fy)),
            _ => None,
        }
    }
}

/// Keyed memory of where every node id was last seen.
///
/// Records are never evicted: an id that disappears from the upstream
/// snapshot and later returns picks up where it left off.
#[derive(Clone, Debug, Default)]
pub struct PositionStore {
    records: HashMap<String, PositionRecord>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&PositionRecord> {
        self.records.get(id)
    }

    pub fn set(&mut self, id: &str, record: PositionRecord) {
        if let Some(existing) = self.records.get_mut(id) {
            *existing = record;
        } else {
            self.records.insert(id.to_owned(), record);
        }
    }

    /// Writes a position in place, allocating only the first time an id is seen.
    pub(crate) fn record(&mut self, id: &str, position: Vec2, pin: Option<Vec2>) {
        let (fx, fy) = match pin {
            Some(pin) => (Some(pin.x), Some(pin.y)),
            None => (None, None),
        };

        if let Some(existing) = self.records.get_mut(id) {
            existing.x = position.x;
            existing.y = position.y;
            existing.fx = fx;
            existing.fy = fy;
        } else {
            self.records.insert(
                id.to_owned(),
                PositionRecord {
                    id: id.to_owned(),
                    x: position.x,
                    y: position.y,
                    fx,
                    fy,
                },
            );
        }
    }

    /// Clears any pin on `id`, keeping its last position as the resting seed.
    pub fn release(&mut self, id: &str) -> Option<Vec2> {
        let record = self.records.get_mut(id)?;
        record.fx = None;
        record.fy = None;
        Some(record.position())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
