// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::fs;
use std::path::{Path, PathBuf};

use pdp_builder::settings::Settings;
use pdp_builder::{run, stage_from_settings};
use pdp_image::stage::StageId;
use pdp_model::test_helpers::CHAIN_YAML;
use tempfile::{TempDir, tempdir};

fn settings_for(dir: &TempDir) -> Settings {
    let network = dir.path().join("chain.yaml");
    fs::write(&network, CHAIN_YAML).unwrap();
    Settings {
        network: Some(network),
        out_dir: Some(dir.path().join("images")),
        ..Settings::default()
    }
}

fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn writes_one_image_per_node() {
    let dir = tempdir().unwrap();
    let settings = settings_for(&dir);
    let written = run(&settings).unwrap();

    assert_eq!(written.len(), 9);
    let names = names(&written);
    assert!(names.contains(&"s_core0-0.img".to_string()));
    assert!(names.contains(&"w_core2-0_1-0.img".to_string()));

    let output = dir.path().join("images").join("t_core2-0.img");
    assert_eq!(fs::metadata(output).unwrap().len(), 3580);
}

#[test]
fn filter_selects_nodes() {
    let dir = tempdir().unwrap();
    let settings = Settings {
        node_filter_regex: Some("^t_".to_string()),
        ..settings_for(&dir)
    };
    let written = run(&settings).unwrap();
    assert_eq!(
        names(&written),
        vec!["t_core0-0.img", "t_core1-0.img", "t_core2-0.img"]
    );
}

#[test]
fn later_stage_writes_updates() {
    let dir = tempdir().unwrap();
    let settings = Settings {
        stage: Some(1),
        test: Some(true),
        node_filter_regex: Some("s_core0".to_string()),
        ..settings_for(&dir)
    };
    let written = run(&settings).unwrap();
    assert_eq!(names(&written), vec!["s_core0-0.stage1.img"]);

    // one region header and a 12 byte stage block
    let bytes = fs::read(&written[0]).unwrap();
    assert_eq!(bytes.len(), 12 + 12);
}

#[test]
fn stage_follows_settings() {
    let settings = Settings {
        stage: Some(3),
        test: Some(true),
        run_ticks: Some(100),
        ..Settings::default()
    };
    let stage = stage_from_settings(&settings);
    assert_eq!(stage.id, StageId(3));
    assert!(!stage.training);
    assert_eq!(stage.run_ticks, Some(100));

    assert!(stage_from_settings(&Settings::default()).training);
}

#[test]
fn settings_file_is_overridden_by_command_line() {
    let dir = tempdir().unwrap();
    let conf = dir.path().join("pdp.toml");
    fs::write(&conf, "network = \"from_file.yaml\"\nstage = 4\n").unwrap();

    let cli = Settings {
        conf: Some(conf),
        stage: Some(2),
        network: None,
        out_dir: None,
        run_ticks: None,
        test: None,
        node_filter_regex: None,
        stdout_level: None,
    };
    let settings = Settings::from_sources(cli).unwrap();
    assert_eq!(settings.network.as_deref(), Some(Path::new("from_file.yaml")));
    assert_eq!(settings.stage, Some(2));
    assert_eq!(settings.test, Some(false));
}

#[test]
#[should_panic(expected = "Settings file missing.toml not found")]
fn missing_settings_file() {
    let cli = Settings {
        conf: Some(PathBuf::from("missing.toml")),
        ..Settings::default()
    };
    Settings::from_sources(cli).unwrap();
}

#[test]
#[should_panic(expected = "Unable to read")]
fn missing_network_file() {
    let dir = tempdir().unwrap();
    let settings = Settings {
        network: Some(dir.path().join("absent.yaml")),
        out_dir: Some(dir.path().join("images")),
        ..Settings::default()
    };
    run(&settings).unwrap();
}
