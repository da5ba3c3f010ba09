//! Per-user notification category preferences.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::category::NotificationCategory;

/// Category → enabled flags for one user.
///
/// Stored as a JSON object on the user record, e.g. `{"like": false}`.
/// Categories without an entry are enabled, so newly introduced
/// categories are opt-out rather than silently hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceMap(BTreeMap<NotificationCategory, bool>);

impl PreferenceMap {
    /// An empty map: every category enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the given category should be delivered.
    pub fn is_enabled(&self, category: NotificationCategory) -> bool {
        self.0.get(&category).copied().unwrap_or(true)
    }

    /// Explicit flag for a category, if one is stored.
    pub fn get(&self, category: NotificationCategory) -> Option<bool> {
        self.0.get(&category).copied()
    }

    /// Store an explicit flag for a category.
    pub fn set(&mut self, category: NotificationCategory, enabled: bool) {
        self.0.insert(category, enabled);
    }

    /// Builder-style variant of [`PreferenceMap::set`].
    pub fn with(mut self, category: NotificationCategory, enabled: bool) -> Self {
        self.set(category, enabled);
        self
    }

    /// Overlay `changes`; categories not mentioned keep their value.
    pub fn merge(&mut self, changes: &PreferenceMap) {
        self.0.extend(changes.iter());
    }

    /// Iterate over the explicitly stored entries.
    pub fn iter(&self) -> impl Iterator<Item = (NotificationCategory, bool)> + '_ {
        self.0.iter().map(|(c, e)| (*c, *e))
    }
}

impl FromIterator<(NotificationCategory, bool)> for PreferenceMap {
    fn from_iter<I: IntoIterator<Item = (NotificationCategory, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
