// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Map a PDP network and write the memory image of every node.
//!
//! For example, run using:
//!   cargo run --bin pdp-builder -- --network demos/rand10x40.yaml
//! --out-dir images --stdout-level debug

use anyhow::Result;
use log::LevelFilter;
use pdp_builder::run;
use pdp_builder::settings::Settings;
use simplelog::{ConfigBuilder, SimpleLogger};

fn main() -> Result<()> {
    let settings = Settings::parse_all_sources()?;

    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    SimpleLogger::init(settings.level(), config)?;

    let written = run(&settings)?;
    println!("{} files written", written.len());
    Ok(())
}
