// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Persisted data model: stems, their content, transforms and the store

pub mod content;
pub mod ids;
pub mod stem;
pub mod store;
pub mod transform;

pub use content::{ContentItem, ImageContent, StrokeContent, StrokePoint, TextContent};
pub use ids::{BatchId, NodeId};
pub use stem::StemNode;
pub use store::{MemoryStore, NodeStore};
pub use transform::{Transform, Trs};
