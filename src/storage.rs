//! Saved-component storage.
//!
//! In-memory CRUD for captured trees the operator chose to keep, plus the
//! access-token slot backing the authentication tools. Persistence to disk
//! is an external collaborator's concern; everything here lives for the
//! process.

// ============================================================================
// Imports
// ============================================================================

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::model::ExtractedNode;

// ============================================================================
// SavedComponent
// ============================================================================

/// A captured tree saved under a name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedComponent {
    /// Storage id.
    pub id: String,

    /// Operator-chosen name.
    pub name: String,

    /// When the component was saved.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// The captured tree.
    pub data: ExtractedNode,
}

/// Listing entry: everything but the tree itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSummary {
    /// Storage id.
    pub id: String,

    /// Operator-chosen name.
    pub name: String,

    /// When the component was saved.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// Node count of the stored tree.
    #[serde(rename = "nodeCount")]
    pub node_count: usize,
}

impl From<&SavedComponent> for ComponentSummary {
    fn from(component: &SavedComponent) -> Self {
        Self {
            id: component.id.clone(),
            name: component.name.clone(),
            created_at: component.created_at,
            node_count: component.data.node_count(),
        }
    }
}

// ============================================================================
// ComponentStore
// ============================================================================

/// In-memory component store keyed by id, addressable by id or name.
#[derive(Default)]
pub struct ComponentStore {
    entries: RwLock<FxHashMap<String, SavedComponent>>,
}

impl ComponentStore {
    /// Creates an empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves a captured tree under a name and returns the stored record.
    pub fn save(&self, name: impl Into<String>, data: ExtractedNode) -> SavedComponent {
        let component = SavedComponent {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: Utc::now(),
            data,
        };

        debug!(id = %component.id, name = %component.name, "Component saved");
        self.entries
            .write()
            .insert(component.id.clone(), component.clone());
        component
    }

    /// Looks a component up by id, falling back to name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<SavedComponent> {
        let entries = self.entries.read();
        entries
            .get(key)
            .or_else(|| entries.values().find(|c| c.name == key))
            .cloned()
    }

    /// Lists summaries, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<ComponentSummary> {
        let mut summaries: Vec<ComponentSummary> =
            self.entries.read().values().map(Into::into).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        summaries
    }

    /// Deletes a component by id or name. Returns whether anything was
    /// removed.
    pub fn delete(&self, key: &str) -> bool {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            return true;
        }
        let id = entries
            .values()
            .find(|c| c.name == key)
            .map(|c| c.id.clone());
        match id {
            Some(id) => entries.remove(&id).is_some(),
            None => false,
        }
    }

    /// Number of stored components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

// ============================================================================
// AuthStore
// ============================================================================

/// Process-lifetime access-token slot.
#[derive(Default)]
pub struct AuthStore {
    token: RwLock<Option<String>>,
}

impl AuthStore {
    /// Creates an empty slot.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the access token, replacing any prior one.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Clears the stored token.
    pub fn clear(&self) {
        *self.token.write() = None;
    }

    /// Returns `true` if a token is stored.
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
