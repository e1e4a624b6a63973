// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Identifiers for stored nodes and write batches.
//!
//! A `NodeId` is allocated by the node store and never reused while the store
//! is alive, so a stem removed from the tree leaves no dangling handle that
//! could later point at a different stem. A `BatchId` groups the writes of
//! one user action into a single undoable unit.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Handle of a node in the store (the root node or a stem)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier shared by every write belonging to one user action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Create a new random batch id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a fresh uid for a content item
pub fn content_uid() -> String {
    Uuid::new_v4().simple().to_string()
}
