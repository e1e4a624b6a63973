// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Nexus: lay out a stored mind map and report its geometry

fn main() -> anyhow::Result<()> {
    nexus::run()
}
