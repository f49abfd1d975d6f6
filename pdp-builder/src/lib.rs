// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Command-line front end of the PDP mapper.
//!
//! The builder reads a network description, maps it onto nodes, declares the
//! memory every node needs and writes one image file per node. Stage 0 files
//! hold the whole fixed memory of a node (`<label>.img`). Later stages only
//! hold the regions that change (`<label>.stage<N>.img`).
//!
//! Node labels contain `/`, which is replaced with `-` in file names.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use log::{debug, info};
use pdp_image::accountant::ResourceTable;
use pdp_image::keys::SequentialKeyAllocator;
use pdp_image::mapping::Mapping;
use pdp_image::stage::{Stage, StageId};
use pdp_model::network::Network;
use regex::Regex;

use crate::settings::Settings;

pub mod settings;

/// First routing key handed out to node partitions.
pub const KEY_BASE: u32 = 0;

/// Build the stage described by the settings.
#[must_use]
pub fn stage_from_settings(settings: &Settings) -> Stage {
    let id = StageId(settings.stage.unwrap_or(0));
    let mut stage = if settings.test.unwrap_or(false) {
        Stage::testing(id)
    } else {
        Stage::training(id)
    };
    stage.run_ticks = settings.run_ticks;
    stage
}

/// Map the network and write the images of every selected node.
///
/// Returns the paths written, in node order.
pub fn run(settings: &Settings) -> Result<Vec<PathBuf>> {
    let network_path = settings.network_path()?;
    let network = Rc::new(Network::from_file(network_path)?);
    let mapping = Mapping::new(network)?;
    println!("{mapping}");

    let mut table = ResourceTable::new();
    mapping.declare_resources(&mut table)?;
    println!("{table}");

    let filter = Regex::new(settings.node_filter_regex.as_deref().unwrap_or(""))
        .context("Invalid node filter")?;
    let out_dir = settings.out_dir();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Unable to create {}", out_dir.display()))?;

    let stage = stage_from_settings(settings);
    let mut written = Vec::new();
    if stage.id == StageId(0) {
        let keys = SequentialKeyAllocator::new(mapping.topology(), KEY_BASE)?;
        for image in mapping.generate(&keys, &stage)? {
            if !filter.is_match(&image.label) {
                continue;
            }
            debug!("{image}");
            let path = out_dir.join(image.file_name());
            write_file(&path, &image.to_bytes())?;
            written.push(path);
        }
    } else {
        for update in mapping.regenerate(&stage)? {
            if !filter.is_match(&update.label) {
                continue;
            }
            let path = out_dir.join(update.file_name());
            write_file(&path, &update.to_bytes()?)?;
            written.push(path);
        }
    }

    info!(
        "Wrote {} files for {stage} to {}",
        written.len(),
        out_dir.display()
    );
    Ok(written)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Unable to write {}", path.display()))
}
