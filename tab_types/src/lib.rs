//! # Tab Types
//!
//! This crate defines the tab payload schemas carried over the message
//! channel, and the conversions between the host's native tab records
//! and the descriptor shape the far side expects.
//!
//! ## Philosophy
//!
//! - **Two shapes, one meaning**: the host keeps its own record; the
//!   wire carries the descriptor; conversions are total and lossless for
//!   the fields both sides share
//! - **Schema is contract**: descriptor field names are pinned by
//!   contract tests and never leak the host's internal naming
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - Window bookkeeping (the window id is supplied at conversion time)
//! - Navigation or tab mutation
//! - A picture of tab state kept fresh behind the caller's back

use serde::{Deserialize, Serialize};
use std::fmt;

/// The wire-facing tab object
///
/// Serialized in the camelCase shape the far side of the channel
/// expects; `window_id` crosses as `windowId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabDescriptor {
    /// Stable numeric identity of the tab
    pub id: u64,
    /// Zero-based position within its window
    pub index: u32,
    /// Window the tab belongs to
    pub window_id: u64,
    /// Mirrors `active`; the host has no separate highlight notion
    pub highlighted: bool,
    /// Whether this is the window's selected tab
    pub active: bool,
    pub pinned: bool,
    pub url: String,
    pub title: String,
    pub incognito: bool,
}

/// The host's native tab record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTab {
    pub id: u64,
    pub index: u32,
    pub location: String,
    pub label: String,
    pub active: bool,
    pub pinned: bool,
    pub private_browsing: bool,
}

impl HostTab {
    /// Converts to the wire shape, placing the tab in `window_id`
    pub fn to_descriptor(&self, window_id: u64) -> TabDescriptor {
        TabDescriptor {
            id: self.id,
            index: self.index,
            window_id,
            highlighted: self.active,
            active: self.active,
            pinned: self.pinned,
            url: self.location.clone(),
            title: self.label.clone(),
            incognito: self.private_browsing,
        }
    }

    /// Reconstructs a host record from the wire shape
    ///
    /// The window id and the highlight flag have no host-side
    /// counterpart and are dropped.
    pub fn from_descriptor(descriptor: &TabDescriptor) -> Self {
        Self {
            id: descriptor.id,
            index: descriptor.index,
            location: descriptor.url.clone(),
            label: descriptor.title.clone(),
            active: descriptor.active,
            pinned: descriptor.pinned,
            private_browsing: descriptor.incognito,
        }
    }
}

impl fmt::Display for HostTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab {} [{}] {}", self.id, self.index, self.location)
    }
}

/// Host-side table of live tabs for one window
///
/// Descriptors arriving over the channel name tabs by id; the registry
/// resolves those ids back to the live records.
#[derive(Debug, Default)]
pub struct TabRegistry {
    window_id: u64,
    tabs: Vec<HostTab>,
}

impl TabRegistry {
    /// Creates an empty registry for `window_id`
    pub fn new(window_id: u64) -> Self {
        Self {
            window_id,
            tabs: Vec::new(),
        }
    }

    /// The window this registry describes
    pub fn window_id(&self) -> u64 {
        self.window_id
    }

    /// Adds a tab, replacing any existing record with the same id
    pub fn insert(&mut self, tab: HostTab) {
        self.tabs.retain(|existing| existing.id != tab.id);
        self.tabs.push(tab);
    }

    /// Removes and returns the tab with `id`, if present
    pub fn remove(&mut self, id: u64) -> Option<HostTab> {
        let position = self.tabs.iter().position(|tab| tab.id == id)?;
        Some(self.tabs.remove(position))
    }

    /// Looks up the tab with `id`
    pub fn find(&self, id: u64) -> Option<&HostTab> {
        self.tabs.iter().find(|tab| tab.id == id)
    }

    /// The window's selected tab, if any
    pub fn active(&self) -> Option<&HostTab> {
        self.tabs.iter().find(|tab| tab.active)
    }

    /// Wire-shape snapshot of every tab, ordered by index
    pub fn descriptors(&self) -> Vec<TabDescriptor> {
        let mut descriptors: Vec<TabDescriptor> = self
            .tabs
            .iter()
            .map(|tab| tab.to_descriptor(self.window_id))
            .collect();
        descriptors.sort_by_key(|descriptor| descriptor.index);
        descriptors
    }

    /// Number of tabs in the registry
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Checks if the registry has no tabs
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}
