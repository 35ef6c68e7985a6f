use std::collections::HashMap;

use crate::models::Bike;

/// Insertion-ordered map from bike id to bike.
///
/// Replacing an existing id keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct BikeMap {
    entries: HashMap<String, Bike>,
    order: Vec<String>,
}

impl BikeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bikes(bikes: impl IntoIterator<Item = Bike>) -> Self {
        let mut map = Self::new();
        for bike in bikes {
            map.insert(bike);
        }
        map
    }

    /// Insert or replace a bike, returning the previous value for its id.
    pub fn insert(&mut self, bike: Bike) -> Option<Bike> {
        let id = bike.id().to_string();
        let previous = self.entries.insert(id.clone(), bike);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    pub fn get(&self, id: &str) -> Option<&Bike> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Bike> {
        let removed = self.entries.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    /// Keep only the bikes for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Bike) -> bool) {
        let entries = &mut self.entries;
        self.order.retain(|id| {
            let keep_it = entries.get(id).map(&mut keep).unwrap_or(false);
            if !keep_it {
                entries.remove(id);
            }
            keep_it
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Replace the whole contents with `bikes`.
    pub fn replace_all(&mut self, bikes: impl IntoIterator<Item = Bike>) {
        self.clear();
        for bike in bikes {
            self.insert(bike);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bike> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Owned copy of every bike, in insertion order.
    pub fn values(&self) -> Vec<Bike> {
        self.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
