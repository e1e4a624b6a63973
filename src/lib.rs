// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Nexus: layout and geometry engine for an ink mind-mapping canvas
//!
//! Stems form a tree of independently transformed branches. [`layout`]
//! derives their placement, tails and ordering from the stored attributes,
//! [`ink`] turns pen samples into compact strokes and back into outlines,
//! and [`editing`] drives both from pointer input.

pub mod config;
pub mod editing;
pub mod error;
pub mod ink;
pub mod layout;
pub mod model;
pub mod settings;

pub use config::Config;
pub use error::{Error, Result};

use anyhow::Context;
use layout::StemLayout;
use model::{MemoryStore, NodeId};
use std::path::PathBuf;

/// Command-line options
#[derive(Debug, Default)]
struct Args {
    map: Option<PathBuf>,
    config: Option<PathBuf>,
}

/// Entry point for the `nexus` binary
pub fn run() -> anyhow::Result<()> {
    // Can be controlled via RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nexus=info".parse().context("bad log directive")?),
        )
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::discover(),
    };

    let store = match &args.map {
        Some(path) => {
            tracing::info!("Loading map from: {}", path.display());
            MemoryStore::load(path)
                .with_context(|| format!("failed to load map {}", path.display()))?
        }
        None => {
            tracing::info!("No map given, starting empty");
            MemoryStore::new()
        }
    };

    let layout = StemLayout::load(&store, &config).context("map is inconsistent")?;
    for line in report(&layout)? {
        println!("{line}");
    }
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            _ if arg.starts_with("--") => {
                tracing::error!("Usage: nexus [map.json] [--config path]");
                anyhow::bail!("unknown option {arg}");
            }
            _ if parsed.map.is_none() => parsed.map = Some(PathBuf::from(arg)),
            _ => anyhow::bail!("more than one map given"),
        }
    }
    Ok(parsed)
}

/// One line per stem, indented by depth
fn report(layout: &StemLayout) -> Result<Vec<String>> {
    let mut lines = vec![format!("{} stems", layout.len())];
    for id in layout.preorder() {
        lines.push(describe(layout, id)?);
    }
    Ok(lines)
}

fn describe(layout: &StemLayout, id: NodeId) -> Result<String> {
    let stem = layout.get(id)?;
    let scene = layout.scene_transform(id)?;
    let base = scene.map_point(kurbo::Point::ZERO);
    let tip = scene.map_point(layout.tip(id)?);
    let color = layout.branch_color(id)?.to_rgba8();
    Ok(format!(
        "{indent}{id} [{index}] dir {dir:+} base ({bx:.1}, {by:.1}) tip ({tx:.1}, {ty:.1}) \
         #{r:02x}{g:02x}{b:02x} {items} items",
        indent = "  ".repeat(stem.depth),
        index = stem.index,
        dir = layout.direction(id)?,
        bx = base.x,
        by = base.y,
        tx = tip.x,
        ty = tip.y,
        r = color.r,
        g = color.g,
        b = color.b,
        items = stem.node.content.len(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeStore, StemNode};
    use kurbo::Vec2;

    fn args(list: &[&str]) -> anyhow::Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_map_and_config() {
        let parsed = args(&["map.json", "--config", "nexus.toml"]).unwrap();
        assert_eq!(parsed.map, Some(PathBuf::from("map.json")));
        assert_eq!(parsed.config, Some(PathBuf::from("nexus.toml")));
        assert!(args(&[]).unwrap().map.is_none());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--verbose"]).is_err());
        assert!(args(&["a.json", "b.json"]).is_err());
    }

    #[test]
    fn report_lists_stems_by_depth() {
        let mut store = MemoryStore::new();
        let root = store.root();
        let top = store.add_stem(root, StemNode::default()).unwrap();
        store
            .add_stem(top, StemNode::at(Vec2::new(10.0, 0.0), -1.0))
            .unwrap();
        let layout = StemLayout::load(&store, &Config::default()).unwrap();

        let lines = report(&layout).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "2 stems");
        assert!(lines[1].starts_with("#1 [0] dir +1"));
        assert!(lines[2].starts_with("  #2 [0] dir -1"));
        assert!(lines[2].contains("#999999"));
    }
}
