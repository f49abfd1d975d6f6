// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Per-node memory images.
//!
//! A node image is the ordered list of regions a node owns, each at the
//! offset planned by the [accountant](crate::accountant). Regions written at
//! load time carry their content; reserved regions are only sized.

use std::fmt;

use log::{debug, trace};
use pdp_model::{accounting_error, encoding_error};
use pdp_model::network::Network;
use pdp_model::types::PdpResult;
use pdp_topology::builder::Topology;
use pdp_topology::channel::ChannelKind;
use pdp_topology::node::Role;

use crate::accountant::{NodeResources, RegionPlan, plan, resources};
use crate::blocks::{EventBlock, ExampleBlock, ExampleSetBlock, NetworkBlock, SystemBlock};
use crate::keys::KeyAllocator;
use crate::stage::{Stage, StageId};
use crate::vertex::Vertex;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionId {
    System,
    Network,
    Core,
    ExampleSet,
    Examples,
    Events,
    Inputs,
    Targets,
    Weights,
    Routing,
    Stage,
    RecordingInfo,
    History,
    Recording,
}

impl RegionId {
    /// Region number used by the node runtime.
    #[must_use]
    pub const fn id(self) -> u32 {
        self as u32
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            RegionId::System => "system",
            RegionId::Network => "network",
            RegionId::Core => "core",
            RegionId::ExampleSet => "example_set",
            RegionId::Examples => "examples",
            RegionId::Events => "events",
            RegionId::Inputs => "inputs",
            RegionId::Targets => "targets",
            RegionId::Weights => "weights",
            RegionId::Routing => "routing",
            RegionId::Stage => "stage",
            RegionId::RecordingInfo => "recording_info",
            RegionId::History => "history",
            RegionId::Recording => "recording",
        }
    }

    /// Reserved regions are filled in by the runtime.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        matches!(self, RegionId::History | RegionId::Recording)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub id: RegionId,
    pub offset: u64,
    pub size: u64,
    pub write_order: Option<usize>,
    /// Content of written regions.
    pub data: Option<Vec<u8>>,
}

/// File name stem for a node label.
#[must_use]
pub fn file_stem(label: &str) -> String {
    label.replace('/', "-")
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeImage {
    pub label: String,
    pub role: Role,
    pub stage: StageId,
    pub regions: Vec<Region>,
    pub resources: NodeResources,
}

impl NodeImage {
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.img", file_stem(&self.label))
    }

    /// The fixed memory of the node as laid out at load time. Reserved
    /// regions are zero.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.resources.fixed_bytes as usize);
        for region in &self.regions {
            match &region.data {
                Some(data) => bytes.extend_from_slice(data),
                None => bytes.resize(bytes.len() + region.size as usize, 0),
            }
        }
        bytes
    }
}

impl fmt::Display for NodeImage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} ({}), stage {}:", self.label, self.role, self.stage)?;
        for region in &self.regions {
            let kind = if region.data.is_some() { "" } else { " reserved" };
            writeln!(
                f,
                "  {:>2} {:<14} @{:#08x} {:>8} bytes{kind}",
                region.id.id(),
                region.id.name(),
                region.offset,
                region.size
            )?;
        }
        Ok(())
    }
}

/// Regions rewritten when a node moves to a new stage.
#[derive(Clone, Debug, PartialEq)]
pub struct StageUpdate {
    pub label: String,
    pub stage: StageId,
    pub regions: Vec<Region>,
}

impl StageUpdate {
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.stage{}.img", file_stem(&self.label), self.stage)
    }

    /// Each region as its id, offset and size words followed by its content.
    pub fn to_bytes(&self) -> PdpResult<Vec<u8>> {
        let mut bytes = Vec::new();
        for region in &self.regions {
            bytes.extend_from_slice(&region.id.id().to_le_bytes());
            bytes.extend_from_slice(&self.word(region, "offset", region.offset)?.to_le_bytes());
            bytes.extend_from_slice(&self.word(region, "size", region.size)?.to_le_bytes());
            if let Some(data) = &region.data {
                bytes.extend_from_slice(data);
            }
        }
        Ok(bytes)
    }

    fn word(&self, region: &Region, name: &str, value: u64) -> PdpResult<u32> {
        match u32::try_from(value) {
            Ok(v) => Ok(v),
            Err(_) => encoding_error!(format!(
                "Region {} {name} {value} of {} does not fit in 32 bits",
                region.id, self.label
            )),
        }
    }
}

/// Region contents that do not depend on the node.
pub struct SharedRegions {
    network: Vec<u8>,
    example_set: Vec<u8>,
    examples: Vec<u8>,
    events: Vec<u8>,
    stage: Vec<u8>,
    run_ticks: u32,
    stage_id: StageId,
}

impl SharedRegions {
    pub fn new(network: &Network, stage: &Stage) -> PdpResult<Self> {
        let params = network.params();
        let example_set = network.example_set();

        let num_write_blks = network
            .groups()
            .iter()
            .filter(|g| g.is_output)
            .map(|g| g.num_subgroups() as u32)
            .sum();
        let network_block = NetworkBlock {
            net_type: params.net_type,
            ticks_per_int: params.ticks_per_interval,
            global_max_ticks: network.global_max_ticks(),
            num_write_blks,
            timeout: params.timeout,
        }
        .encode()?;

        let example_set_block = ExampleSetBlock {
            num_examples: example_set.num_examples(),
            max_time: example_set.max_time,
            min_time: example_set.min_time,
            grace_time: example_set.grace_time,
        }
        .encode()?;

        let mut examples = Vec::new();
        let mut ev_idx = 0;
        for (num, example) in example_set.examples.iter().enumerate() {
            examples.extend(
                ExampleBlock {
                    num,
                    num_events: example.events.len(),
                    ev_idx,
                    freq: example.frequency,
                }
                .encode()?,
            );
            ev_idx += example.events.len();
        }

        let mut events = Vec::new();
        for (it_idx, event) in example_set.events().enumerate() {
            events.extend(
                EventBlock {
                    max_time: event.max_time,
                    min_time: event.min_time,
                    grace_time: event.grace_time,
                    it_idx,
                }
                .encode()?,
            );
        }

        Ok(Self {
            network: network_block,
            example_set: example_set_block,
            examples,
            events,
            stage: stage.block(network)?.encode()?,
            run_ticks: stage.run_ticks(network)?,
            stage_id: stage.id,
        })
    }
}

/// Routing region: one key per channel slot, zero for kinds the node does
/// not originate.
pub fn routing_region(
    vertex: &dyn Vertex,
    topology: &Topology,
    keys: &dyn KeyAllocator,
) -> PdpResult<Vec<u8>> {
    let node = vertex.node();
    let mut bytes = Vec::with_capacity(4 * ChannelKind::ALL.len());
    for kind in ChannelKind::ALL {
        let key = if topology.originates(node.id, kind) {
            keys.key_for(&node.label, kind)?
        } else {
            0
        };
        trace!("{} {kind} key {key:#010x}", node.label);
        bytes.extend_from_slice(&key.to_le_bytes());
    }
    Ok(bytes)
}

fn region_content(
    vertex: &dyn Vertex,
    id: RegionId,
    topology: &Topology,
    keys: &dyn KeyAllocator,
    shared: &SharedRegions,
) -> PdpResult<Option<Vec<u8>>> {
    let params = vertex.network().params();
    let data = match id {
        RegionId::System => SystemBlock {
            timer_period_us: params.timer_tick_period_us,
            time_scale_factor: 1,
            proc_type: vertex.node().role.proc_code(),
        }
        .encode()?,
        RegionId::Network => shared.network.clone(),
        RegionId::Core => vertex.core_block()?,
        RegionId::ExampleSet => shared.example_set.clone(),
        RegionId::Examples => shared.examples.clone(),
        RegionId::Events => shared.events.clone(),
        RegionId::Inputs | RegionId::Targets | RegionId::Weights => vertex.data(id)?,
        RegionId::Routing => routing_region(vertex, topology, keys)?,
        RegionId::Stage => shared.stage.clone(),
        RegionId::RecordingInfo => recording_info(vertex, shared)?,
        RegionId::History | RegionId::Recording => return Ok(None),
    };
    Ok(Some(data))
}

fn recording_info(vertex: &dyn Vertex, shared: &SharedRegions) -> PdpResult<Vec<u8>> {
    match vertex.recording() {
        Some(plan) => plan.descriptor(shared.run_ticks),
        None => Ok(Vec::new()),
    }
}

fn check_size(vertex: &dyn Vertex, region: &RegionPlan, data: Option<&[u8]>) -> PdpResult {
    if let Some(data) = data {
        if data.len() as u64 != region.size {
            return accounting_error!(format!(
                "Region {} of {} declared {} bytes but wrote {}",
                region.id,
                vertex.node().label,
                region.size,
                data.len()
            ));
        }
    }
    Ok(())
}

/// Write the full memory image of one node.
pub fn write_image(
    vertex: &dyn Vertex,
    topology: &Topology,
    keys: &dyn KeyAllocator,
    shared: &SharedRegions,
) -> PdpResult<NodeImage> {
    let resources = resources(vertex)?;
    let mut regions = Vec::new();
    for region in plan(vertex) {
        let data = region_content(vertex, region.id, topology, keys, shared)?;
        check_size(vertex, &region, data.as_deref())?;
        regions.push(Region {
            id: region.id,
            offset: region.offset,
            size: region.size,
            write_order: region.write_order,
            data,
        });
    }

    let image = NodeImage {
        label: vertex.node().label.clone(),
        role: vertex.node().role,
        stage: shared.stage_id,
        regions,
        resources,
    };
    debug!(
        "Wrote {} regions for {} ({} bytes)",
        image.regions.len(),
        image.label,
        resources.fixed_bytes
    );
    Ok(image)
}

/// Rewrite the stage region, and the recording descriptor of recording
/// nodes, at their original offsets.
pub fn write_stage_update(vertex: &dyn Vertex, shared: &SharedRegions) -> PdpResult<StageUpdate> {
    let mut regions = Vec::new();
    for region in plan(vertex) {
        let data = match region.id {
            RegionId::Stage => shared.stage.clone(),
            RegionId::RecordingInfo => recording_info(vertex, shared)?,
            _ => continue,
        };
        let data = Some(data);
        check_size(vertex, &region, data.as_deref())?;
        regions.push(Region {
            id: region.id,
            offset: region.offset,
            size: region.size,
            write_order: region.write_order,
            data,
        });
    }
    Ok(StageUpdate {
        label: vertex.node().label.clone(),
        stage: shared.stage_id,
        regions,
    })
}
