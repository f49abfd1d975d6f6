// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::path::Path;

use pdp_model::network::Network;

#[test]
#[should_panic(expected = "Group 'Hidden' has zero units")]
fn zero_unit_group() {
    Network::from_string(
        "
groups:
  - label: Input
    units: 4
    kind: [input]
  - label: Hidden
    units: 0
  - label: Output
    units: 4
    kind: [output]
",
    )
    .unwrap();
}

#[test]
#[should_panic(expected = "Duplicate group label 'Input'")]
fn duplicate_group_label() {
    Network::from_string(
        "
groups:
  - label: Input
    units: 4
    kind: [input]
  - label: Input
    units: 4
    kind: [output]
",
    )
    .unwrap();
}

#[test]
#[should_panic(expected = "Network has no output group")]
fn missing_output_group() {
    Network::from_string(
        "
groups:
  - label: Input
    units: 4
    kind: [input]
",
    )
    .unwrap();
}

#[test]
#[should_panic(expected = "No group 'Nowhere'")]
fn link_to_unknown_group() {
    Network::from_string(
        "
groups:
  - label: Input
    units: 4
    kind: [input]
  - label: Output
    units: 4
    kind: [output]
links:
  - from: Input
    to: Nowhere
",
    )
    .unwrap();
}

#[test]
#[should_panic(expected = "form a cycle involving 'A', 'B'")]
fn cycle_between_groups() {
    Network::from_string(
        "
groups:
  - label: Input
    units: 4
    kind: [input]
  - label: A
    units: 4
  - label: B
    units: 4
  - label: Output
    units: 4
    kind: [output]
links:
  - from: Input
    to: A
  - from: A
    to: B
  - from: B
    to: A
  - from: B
    to: Output
",
    )
    .unwrap();
}

#[test]
#[should_panic(expected = "Duplicate link from 'Input' to 'Output'")]
fn duplicate_link() {
    Network::from_string(
        "
groups:
  - label: Input
    units: 4
    kind: [input]
  - label: Output
    units: 4
    kind: [output]
links:
  - from: Input
    to: Output
  - from: Input
    to: Output
",
    )
    .unwrap();
}

#[test]
#[should_panic(expected = "Group 'Input' in output chain is not an output group")]
fn output_chain_with_non_output_group() {
    Network::from_string(
        "
groups:
  - label: Input
    units: 4
    kind: [input]
  - label: Output
    units: 4
    kind: [output]
output_chain: [Input, Output]
",
    )
    .unwrap();
}

#[test]
#[should_panic(expected = "Output group 'Second' missing from output chain")]
fn output_chain_missing_group() {
    Network::from_string(
        "
groups:
  - label: Input
    units: 4
    kind: [input]
  - label: First
    units: 4
    kind: [output]
  - label: Second
    units: 4
    kind: [output]
output_chain: [First]
",
    )
    .unwrap();
}

#[test]
#[should_panic(expected = "has 3 inputs for group 'Input' with 4 units")]
fn wrong_input_length() {
    Network::from_string(
        "
groups:
  - label: Input
    units: 4
    kind: [input]
  - label: Output
    units: 4
    kind: [output]
examples:
  examples:
    - events:
        - inputs:
            Input: [1, 0, 1]
",
    )
    .unwrap();
}

#[test]
#[should_panic(expected = "has targets for group 'Input' which cannot take them")]
fn targets_for_input_group() {
    Network::from_string(
        "
groups:
  - label: Input
    units: 2
    kind: [input]
  - label: Output
    units: 2
    kind: [output]
examples:
  examples:
    - events:
        - targets:
            Input: [1, 0]
",
    )
    .unwrap();
}

#[test]
#[should_panic(expected = "Unknown output process 'tanh'")]
fn unknown_function_label() {
    Network::from_string(
        "
groups:
  - label: Input
    units: 2
    kind: [input]
  - label: Output
    units: 2
    kind: [output]
    out_procs: [tanh]
",
    )
    .unwrap();
}

#[test]
#[should_panic(expected = "Unable to read")]
fn missing_file() {
    Network::from_file(Path::new("/this/file/does/not/exist.yaml")).unwrap();
}

const TWO_GROUPS: &str = "
network:
  ticks_per_interval: 1
groups:
  - label: Input
    units: 4
    kind: [input]
  - label: Output
    units: 4
    kind: [output]
links:
  - from: Input
    to: Output
";

#[test]
#[should_panic(expected = "Event of example 'long' lasts 10000000000 intervals, too many ticks")]
fn event_too_long() {
    let yaml = format!(
        "{TWO_GROUPS}examples:
  examples:
    - name: long
      events:
        - max_time: 1.0e10
        - max_time: 1.0e10
"
    );
    Network::from_string(&yaml).unwrap();
}

#[test]
#[should_panic(expected = "Example 'example0' runs for 6000000000 ticks, more than 4294967295")]
fn example_ticks_overflow() {
    let yaml = format!(
        "{TWO_GROUPS}examples:
  examples:
    - events:
        - max_time: 3.0e9
        - max_time: 3.0e9
"
    );
    Network::from_string(&yaml).unwrap();
}

#[test]
#[should_panic(expected = "Examples run for 4294967295 ticks, leaving none for the initial state")]
fn no_tick_left_for_initial_state() {
    let yaml = format!(
        "{TWO_GROUPS}examples:
  examples:
    - events:
        - max_time: 4294967295
"
    );
    Network::from_string(&yaml).unwrap();
}
