// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! The node store contract and an in-memory implementation.
//!
//! The layout engine only needs a handful of primitives from the persisted
//! graph: read a stem's attributes, list a node's children, write a stem back
//! and group writes into batches. `NodeStore` captures exactly that.
//! `MemoryStore` implements it for tests and for the command-line tool; it
//! records every write with its batch so callers can check that one user
//! action produced one batch.

use super::ids::{BatchId, NodeId};
use super::stem::StemNode;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Primitives the layout engine needs from the persisted graph
pub trait NodeStore {
    /// The distinguished root node that owns depth-0 stems
    fn root(&self) -> NodeId;

    /// Attributes of a stem
    fn stem(&self, id: NodeId) -> Result<StemNode, StoreError>;

    /// Targets of the outgoing "child" edges of a node
    fn children(&self, id: NodeId) -> Result<Vec<NodeId>, StoreError>;

    /// Start a new group of writes
    fn new_batch_id(&mut self) -> BatchId {
        BatchId::new()
    }

    /// Write a stem's attributes
    fn save_stem(&mut self, id: NodeId, stem: &StemNode, batch: BatchId)
    -> Result<(), StoreError>;

    /// Create a stem and its child edge from `parent`
    fn create_stem(
        &mut self,
        parent: NodeId,
        stem: StemNode,
        batch: BatchId,
    ) -> Result<NodeId, StoreError>;

    /// Remove a stem, its subtree and the edge from its parent
    fn delete_stem(&mut self, id: NodeId, batch: BatchId) -> Result<(), StoreError>;
}

/// What a logged write did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// One entry of the write log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub batch: BatchId,
    pub node: NodeId,
    pub kind: ChangeKind,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredNode {
    /// None for the root node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stem: Option<StemNode>,
    #[serde(default)]
    children: Vec<NodeId>,
}

/// In-memory node store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStore {
    root: NodeId,
    next_id: u64,
    nodes: BTreeMap<NodeId, StoredNode>,
    #[serde(skip)]
    log: Vec<Change>,
}

impl MemoryStore {
    /// A store holding only the root node
    pub fn new() -> Self {
        let root = NodeId::new(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(root, StoredNode::default());
        Self {
            root,
            next_id: 1,
            nodes,
            log: Vec::new(),
        }
    }

    /// Convenience for building fixtures: create a stem in its own batch.
    pub fn add_stem(&mut self, parent: NodeId, stem: StemNode) -> Result<NodeId, StoreError> {
        let batch = self.new_batch_id();
        self.create_stem(parent, stem, batch)
    }

    /// Every write so far, oldest first
    pub fn log(&self) -> &[Change] {
        &self.log
    }

    /// Distinct batch ids in the order they were first used
    pub fn batches(&self) -> Vec<BatchId> {
        let mut batches: Vec<BatchId> = Vec::new();
        for change in &self.log {
            if !batches.contains(&change.batch) {
                batches.push(change.batch);
            }
        }
        batches
    }

    /// Number of stems, excluding the root
    pub fn stem_count(&self) -> usize {
        self.nodes.values().filter(|n| n.stem.is_some()).count()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        let store: Self = serde_json::from_str(text)?;
        if !store.nodes.contains_key(&store.root) {
            return Err(StoreError::MissingNode(store.root));
        }
        Ok(store)
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    fn record(&mut self, batch: BatchId, node: NodeId, kind: ChangeKind) {
        self.log.push(Change {
            batch,
            node,
            kind,
            at: Utc::now(),
        });
    }

    fn node(&self, id: NodeId) -> Result<&StoredNode, StoreError> {
        self.nodes.get(&id).ok_or(StoreError::MissingNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut StoredNode, StoreError> {
        self.nodes.get_mut(&id).ok_or(StoreError::MissingNode(id))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore for MemoryStore {
    fn root(&self) -> NodeId {
        self.root
    }

    fn stem(&self, id: NodeId) -> Result<StemNode, StoreError> {
        self.node(id)?.stem.clone().ok_or(StoreError::NotAStem(id))
    }

    fn children(&self, id: NodeId) -> Result<Vec<NodeId>, StoreError> {
        Ok(self.node(id)?.children.clone())
    }

    fn save_stem(
        &mut self,
        id: NodeId,
        stem: &StemNode,
        batch: BatchId,
    ) -> Result<(), StoreError> {
        let node = self.node_mut(id)?;
        if node.stem.is_none() {
            return Err(StoreError::NotAStem(id));
        }
        node.stem = Some(stem.clone());
        self.record(batch, id, ChangeKind::Updated);
        Ok(())
    }

    fn create_stem(
        &mut self,
        parent: NodeId,
        stem: StemNode,
        batch: BatchId,
    ) -> Result<NodeId, StoreError> {
        let id = NodeId::new(self.next_id);
        self.node_mut(parent)?.children.push(id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            StoredNode {
                stem: Some(stem),
                children: Vec::new(),
            },
        );
        self.record(batch, id, ChangeKind::Created);
        Ok(id)
    }

    fn delete_stem(&mut self, id: NodeId, batch: BatchId) -> Result<(), StoreError> {
        if id == self.root {
            return Err(StoreError::NotAStem(id));
        }
        self.node(id)?;

        for node in self.nodes.values_mut() {
            node.children.retain(|c| *c != id);
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                pending.extend(node.children);
                self.record(batch, next, ChangeKind::Deleted);
            }
        }
        Ok(())
    }
}
