// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Error types shared by the model, layout and editing layers.

use crate::model::NodeId;
use thiserror::Error;

/// Persisted text that could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("expected 9 transform entries, found {found} in {text:?}")]
    TransformLength { found: usize, text: String },

    #[error("invalid number {token:?} in transform")]
    TransformNumber { token: String },
}

/// The stem tree is inconsistent with itself.
///
/// These indicate a corrupted store rather than bad user input, so layout
/// stops instead of guessing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("stem {0:?} is not part of the layout")]
    UnknownStem(NodeId),

    #[error("link between stem {stem:?} and parent {parent:?} cannot be resolved")]
    DanglingParent { stem: NodeId, parent: NodeId },

    #[error("stem {parent:?} has no child with index {index}")]
    NoChildAtIndex { parent: NodeId, index: usize },

    #[error("content {uid:?} not found on stem {stem:?}")]
    UnknownContent { stem: NodeId, uid: String },

    #[error("stem {0:?} is reachable along more than one path")]
    Cycle(NodeId),
}

/// Failures reported by the node store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("node {0:?} does not exist")]
    MissingNode(NodeId),

    #[error("node {0:?} is not a stem")]
    NotAStem(NodeId),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A config file that could not be read or parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Umbrella error for engine operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Invariant(#[from] InvariantError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
