// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::fmt;

use crate::topology_error;
use crate::types::PdpResult;

/// Default upper bound on the units handled by one node of each role.
pub const MAX_SUBGROUP_UNITS: u32 = 32;

/// A contiguous, capacity-bounded slice of a group's units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subgroup {
    pub index: usize,
    pub first_unit: u32,
    pub units: u32,
}

/// Split `units` into subgroups of at most `max_units`, in order.
pub fn partition_units(label: &str, units: u32, max_units: u32) -> PdpResult<Vec<Subgroup>> {
    if units == 0 {
        return topology_error!(format!("Group '{label}' has zero units"));
    }
    if max_units == 0 {
        return topology_error!("Maximum subgroup units must be non-zero");
    }

    let mut subgroups = Vec::new();
    let mut first_unit = 0;
    while first_unit < units {
        let size = max_units.min(units - first_unit);
        subgroups.push(Subgroup {
            index: subgroups.len(),
            first_unit,
            units: size,
        });
        first_unit += size;
    }
    Ok(subgroups)
}

/// One layer of the network.
#[derive(Clone, Debug)]
pub struct Group {
    /// Declaration index, which is also the group number seen by nodes.
    pub id: usize,
    pub label: String,
    pub units: u32,
    pub is_input: bool,
    pub is_output: bool,
    pub out_procs: Vec<u8>,
    pub in_procs: Vec<u8>,
    pub criterion_function: u8,
    pub error_function: u8,
    pub weak_clamp_strength: f64,
    pub soft_clamp_strength: f64,
    pub init_output: f64,
    pub init_net: f64,
    pub train_criterion: Option<f64>,
    pub test_criterion: Option<f64>,
    pub(crate) subgroups: Vec<Subgroup>,
}

impl Group {
    #[must_use]
    pub fn subgroups(&self) -> &[Subgroup] {
        &self.subgroups
    }

    #[must_use]
    pub fn num_subgroups(&self) -> usize {
        self.subgroups.len()
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        !self.is_input && !self.is_output
    }

    #[must_use]
    pub fn is_last_subgroup(&self, subgroup: usize) -> bool {
        subgroup + 1 == self.subgroups.len()
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let role = match (self.is_input, self.is_output) {
            (true, true) => "input/output",
            (true, false) => "input",
            (false, true) => "output",
            (false, false) => "hidden",
        };
        write!(
            f,
            "{} ({role}, {} units in {} subgroups)",
            self.label,
            self.units,
            self.subgroups.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_is_exact_and_ordered() {
        let subgroups = partition_units("Hidden", 70, 32).unwrap();
        let sizes: Vec<u32> = subgroups.iter().map(|s| s.units).collect();
        assert_eq!(sizes, vec![32, 32, 6]);
        assert_eq!(subgroups[2].first_unit, 64);
        assert_eq!(subgroups[2].index, 2);
    }

    #[test]
    fn single_subgroup_when_under_limit() {
        let subgroups = partition_units("Output", 10, 32).unwrap();
        assert_eq!(subgroups.len(), 1);
        assert_eq!(subgroups[0].units, 10);
    }

    #[test]
    #[should_panic(expected = "Group 'Empty' has zero units")]
    fn zero_units_rejected() {
        partition_units("Empty", 0, 32).unwrap();
    }
}
