// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::builder::{
    build_example_set, build_groups, build_links, build_output_chain, build_params,
};
use crate::config::{NetworkConfig, NetworkSection};
use crate::example::ExampleSet;
use crate::group::Group;
use crate::types::{PdpError, PdpResult};
use crate::{config_error, topology_error};

/// Global parameters shared by every node.
#[derive(Clone, Debug)]
pub struct NetworkParams {
    pub name: String,
    pub net_type: u8,
    pub intervals: u32,
    pub ticks_per_interval: u32,
    pub num_updates: u32,
    pub train_group_crit: Option<f64>,
    pub test_group_crit: Option<f64>,
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub momentum: f64,
    pub update_function: u8,
    pub timeout: u32,
    pub timer_tick_period_us: u32,
    pub seed: u64,
    pub init_weight_range: f64,
    pub max_subgroup_units: u32,
    pub node_memory_limit: Option<u64>,
}

/// A connection from every unit of one group to every unit of another.
#[derive(Clone, Debug)]
pub struct Link {
    pub id: usize,
    pub from: usize,
    pub to: usize,
    /// Initial weights, source units by destination units.
    pub weights: Option<Vec<Vec<Option<f64>>>>,
}

impl Link {
    #[must_use]
    pub fn is_self_link(&self) -> bool {
        self.from == self.to
    }
}

pub struct Network {
    params: NetworkParams,
    groups: Vec<Group>,
    links: Vec<Link>,
    output_chain: Vec<usize>,
    example_set: ExampleSet,
    global_max_ticks: u32,
}

impl Network {
    pub fn from_file(network_path: &Path) -> PdpResult<Self> {
        let s = std::fs::read_to_string(network_path).map_err(|e| {
            PdpError::Config(format!("Unable to read {}: {e}", network_path.display()))
        })?;
        Network::from_string(&s)
    }

    pub fn from_string(network_config: &str) -> PdpResult<Self> {
        let cfg: NetworkConfig = serde_yaml::from_str(network_config)
            .map_err(|e| PdpError::Config(format!("serde_yaml::from_str failed: {e}")))?;
        Network::build(&cfg)
    }

    fn build(cfg: &NetworkConfig) -> PdpResult<Self> {
        let default_section = NetworkSection::default();
        let params = build_params(cfg.network.as_ref().unwrap_or(&default_section))?;
        let groups = build_groups(&cfg.groups, params.max_subgroup_units)?;

        let mut groups_idx_by_label = HashMap::new();
        for group in &groups {
            if groups_idx_by_label
                .insert(group.label.clone(), group.id)
                .is_some()
            {
                return topology_error!(format!("Duplicate group label '{}'", group.label));
            }
        }

        if !groups.iter().any(|g| g.is_input) {
            return topology_error!("Network has no input group");
        }
        if !groups.iter().any(|g| g.is_output) {
            return topology_error!("Network has no output group");
        }

        let links = build_links(
            cfg.links.as_deref().unwrap_or_default(),
            &groups,
            &groups_idx_by_label,
        )?;
        check_acyclic(&groups, &links)?;

        let output_chain =
            build_output_chain(cfg.output_chain.as_deref(), &groups, &groups_idx_by_label)?;
        let example_set =
            build_example_set(cfg.examples.as_ref(), &groups, &groups_idx_by_label)?;

        let mut max_example_ticks = 0;
        for example in &example_set.examples {
            let ticks =
                example_set.example_ticks(example, params.ticks_per_interval, params.intervals)?;
            max_example_ticks = max_example_ticks.max(ticks);
        }
        // One extra tick for the initial state
        let Some(global_max_ticks) = max_example_ticks.checked_add(1) else {
            return config_error!(format!(
                "Examples run for {max_example_ticks} ticks, leaving none for the initial state"
            ));
        };

        let network = Network {
            params,
            groups,
            links,
            output_chain,
            example_set,
            global_max_ticks,
        };
        info!("{network}");
        Ok(network)
    }

    #[must_use]
    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[must_use]
    pub fn group(&self, id: usize) -> &Group {
        &self.groups[id]
    }

    #[must_use]
    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// The group that collects the network-wide local delta sum.
    #[must_use]
    pub fn first_group(&self) -> &Group {
        &self.groups[0]
    }

    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Links feeding `group`, in declaration order.
    pub fn links_into(&self, group: usize) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.to == group)
    }

    /// Output groups in the order they pass convergence results along.
    #[must_use]
    pub fn output_chain(&self) -> &[usize] {
        &self.output_chain
    }

    #[must_use]
    pub fn is_first_output_group(&self, group: usize) -> bool {
        self.output_chain.first() == Some(&group)
    }

    #[must_use]
    pub fn is_last_output_group(&self, group: usize) -> bool {
        self.output_chain.last() == Some(&group)
    }

    #[must_use]
    pub fn example_set(&self) -> &ExampleSet {
        &self.example_set
    }

    /// Ticks needed by the longest example, including the initial tick.
    #[must_use]
    pub fn global_max_ticks(&self) -> u32 {
        self.global_max_ticks
    }

    /// Initial weights of a link as a source units by destination units
    /// matrix. Weights not given in the network description are drawn from a
    /// generator seeded by the network seed and the link, so repeated builds
    /// produce the same values.
    #[must_use]
    pub fn initial_weights(&self, link: &Link) -> Vec<Vec<Option<f64>>> {
        if let Some(weights) = &link.weights {
            return weights.clone();
        }

        let rows = self.groups[link.from].units as usize;
        let cols = self.groups[link.to].units as usize;
        let range = self.params.init_weight_range.abs();
        if range == 0.0 {
            return vec![vec![Some(0.0); cols]; rows];
        }

        let mut rng = StdRng::seed_from_u64(self.params.seed.wrapping_add(link.id as u64));
        debug!(
            "Drawing {rows}x{cols} initial weights for link {} in +/-{range}",
            link.id
        );
        (0..rows)
            .map(|_| (0..cols).map(|_| Some(rng.gen_range(-range..=range))).collect())
            .collect()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Network '{}':", self.params.name)?;
        for group in &self.groups {
            writeln!(f, "  {group}")?;
        }
        for link in &self.links {
            writeln!(
                f,
                "  {} -> {}",
                self.groups[link.from].label, self.groups[link.to].label
            )?;
        }
        write!(
            f,
            "  {} examples, {} events, {} max ticks",
            self.example_set.num_examples(),
            self.example_set.num_events(),
            self.global_max_ticks
        )
    }
}

/// Links between distinct groups must form a DAG. Self links are allowed.
fn check_acyclic(groups: &[Group], links: &[Link]) -> PdpResult {
    let mut in_degree = vec![0usize; groups.len()];
    for link in links.iter().filter(|l| !l.is_self_link()) {
        in_degree[link.to] += 1;
    }

    let mut ready: Vec<usize> = (0..groups.len()).filter(|&g| in_degree[g] == 0).collect();
    let mut visited = 0;
    while let Some(group) = ready.pop() {
        visited += 1;
        for link in links
            .iter()
            .filter(|l| l.from == group && !l.is_self_link())
        {
            in_degree[link.to] -= 1;
            if in_degree[link.to] == 0 {
                ready.push(link.to);
            }
        }
    }

    if visited != groups.len() {
        let cycle: Vec<String> = groups
            .iter()
            .filter(|g| in_degree[g.id] > 0)
            .map(|g| format!("'{}'", g.label))
            .collect();
        return topology_error!(format!(
            "Links between groups form a cycle involving {}",
            cycle.join(", ")
        ));
    }
    Ok(())
}
