// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Networks shared by the tests of the mapping crates.

use crate::network::Network;

/// Input:10 -> Hidden:50 -> Output:10, one subgroup each, with two examples.
/// The subgroup limit is raised so Hidden fits in one subgroup.
pub const CHAIN_YAML: &str = "
network:
  name: rand10x40
  net_type: continuous
  intervals: 4
  ticks_per_interval: 5
  num_updates: 10
  train_group_crit: 0.2
  max_subgroup_units: 64
groups:
  - label: Input
    units: 10
    kind: [input]
  - label: Hidden
    units: 50
    in_procs: [in_integr]
  - label: Output
    units: 10
    kind: [output]
links:
  - from: Input
    to: Hidden
  - from: Hidden
    to: Output
examples:
  max_time: 1.0
  examples:
    - name: ex0
      events:
        - inputs:
            Input: [1, 0, 1, 0, 1, 0, 1, 0, 1, 0]
          targets:
            Output: [0, 1, 0, 1, 0, 1, 0, 1, 0, 1]
    - name: ex1
      events:
        - inputs:
            Input: [0, 1, 0, 1, 0, 1, 0, 1, 0, 1]
          targets:
            Output: [1, 0, 1, 0, 1, 0, 1, 0, ~, .nan]
        - max_time: 2.0
          targets:
            Output: [1, 1, 1, 1, 1, 0, 0, 0, 0, 0]
";

/// Build the three group chain.
#[must_use]
pub fn chain_network() -> Network {
    match Network::from_string(CHAIN_YAML) {
        Ok(network) => network,
        Err(e) => panic!("{e}"),
    }
}

/// The chain with a recurrent link on the hidden group.
#[must_use]
pub fn recurrent_chain_network() -> Network {
    let yaml = CHAIN_YAML.replace("links:\n", "links:\n  - from: Hidden\n    to: Hidden\n");
    match Network::from_string(&yaml) {
        Ok(network) => network,
        Err(e) => panic!("{e}"),
    }
}

/// Several subgroups per group and two output groups in a chain.
///
/// Input:40 (32+8), Hidden:70 (32+32+6), OutA:20, OutB:40 (32+8).
pub const WIDE_YAML: &str = "
network:
  name: wide
  train_group_crit: 0.1
  test_group_crit: 0.05
groups:
  - label: Input
    units: 40
    kind: [input]
  - label: Hidden
    units: 70
  - label: OutA
    units: 20
    kind: [output]
    train_crit: 0.3
  - label: OutB
    units: 40
    kind: [output]
    error_function: squared
    criterion_function: max
links:
  - from: Input
    to: Hidden
  - from: Hidden
    to: OutA
  - from: Hidden
    to: OutB
output_chain: [OutB, OutA]
examples:
  examples:
    - name: only
      events:
        - inputs:
            Input: [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
                    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
";

#[must_use]
pub fn wide_network() -> Network {
    match Network::from_string(WIDE_YAML) {
        Ok(network) => network,
        Err(e) => panic!("{e}"),
    }
}

/// Input:4 -> Hidden:6, plus an Output:3 group that no link feeds. There is
/// no example set.
pub const UNFED_OUTPUT_YAML: &str = "
network:
  name: unfed
groups:
  - label: Input
    units: 4
    kind: [input]
  - label: Hidden
    units: 6
  - label: Output
    units: 3
    kind: [output]
links:
  - from: Input
    to: Hidden
";

#[must_use]
pub fn unfed_output_network() -> Network {
    match Network::from_string(UNFED_OUTPUT_YAML) {
        Ok(network) => network,
        Err(e) => panic!("{e}"),
    }
}
