// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use approx::assert_relative_eq;
use pdp_image::mapping::Mapping;
use pdp_image::recording::{FileRecordings, RecordingChannel, read_recording};
use pdp_model::fixed::{FixedKind, encode};
use pdp_model::test_helpers::{chain_network, wide_network};
use tempfile::tempdir;

fn output_bytes(values: &[f64]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|v| {
            let raw = encode(*v, FixedKind::ShortActivation).unwrap() as i16;
            raw.to_le_bytes()
        })
        .collect()
}

#[test]
fn read_back_outputs() {
    let dir = tempdir().unwrap();
    let recordings = FileRecordings::new(dir.path().to_path_buf());

    let tick0 = [0.25; 10];
    let tick1 = [0.75, 0.5, 0.25, 0.0, 0.125, 0.0625, 0.5, 0.5, 0.5, 0.5];
    let mut data = output_bytes(&tick0);
    data.extend(output_bytes(&tick1));
    std::fs::write(recordings.path("t_core2/0", RecordingChannel::Outputs), data).unwrap();

    let mapping = Mapping::new(Rc::new(chain_network())).unwrap();
    let outputs = mapping.read_outputs(&recordings).unwrap();
    assert_eq!(outputs.len(), 1);

    let (label, rows) = &outputs[0];
    assert_eq!(label, "t_core2/0");
    assert_eq!(rows.len(), 2);
    for (value, expected) in rows[1].iter().zip(tick1) {
        assert_relative_eq!(value.unwrap(), expected, epsilon = FixedKind::ShortActivation.resolution());
    }
}

#[test]
fn raw_channel_read() {
    let dir = tempdir().unwrap();
    let recordings = FileRecordings::new(dir.path().to_path_buf());
    let path = recordings.path("t_core3/0", RecordingChannel::TestResults);
    assert!(path.ends_with("t_core3-0.test_results.rec"));

    std::fs::write(&path, [1, 0, 0, 0, 2, 0, 0, 0, 32, 0, 0, 0, 2, 0, 0, 0]).unwrap();
    let data = read_recording(&recordings, "t_core3/0", RecordingChannel::TestResults).unwrap();
    assert_eq!(data.len(), 16);
}

#[test]
#[should_panic(expected = "Recording outputs of t_core2/0 is missing data")]
fn missing_recording_fails() {
    let dir = tempdir().unwrap();
    let recordings = FileRecordings::new(dir.path().to_path_buf());
    let mapping = Mapping::new(Rc::new(wide_network())).unwrap();
    mapping.read_outputs(&recordings).unwrap();
}
