// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The mapped network: topology, one vertex per node, and the images they
//! produce.

use std::fmt;
use std::rc::Rc;

use log::info;
use pdp_model::network::Network;
use pdp_model::types::PdpResult;
use pdp_topology::builder::Topology;
use pdp_topology::scoreboard::verify;

use crate::accountant::{ResourceSink, resources};
use crate::keys::KeyAllocator;
use crate::recording::{RecordingChannel, RecordingSource, decode_outputs, read_recording};
use crate::regions::{NodeImage, SharedRegions, StageUpdate, write_image, write_stage_update};
use crate::stage::Stage;
use crate::vertex::{Vertex, create};

/// Recorded outputs of one output subgroup, one row per tick.
pub type RecordedOutputs = Vec<(String, Vec<Vec<Option<f64>>>)>;

pub struct Mapping {
    network: Rc<Network>,
    topology: Topology,
    vertices: Vec<Rc<dyn Vertex>>,
}

impl Mapping {
    /// Build and verify the topology of a network and create its vertices.
    pub fn new(network: Rc<Network>) -> PdpResult<Self> {
        let topology = Topology::build(&network)?;
        verify(&network, &topology)?;

        let vertices = topology
            .nodes()
            .iter()
            .map(|node| create(&network, node))
            .collect();
        Ok(Self {
            network,
            topology,
            vertices,
        })
    }

    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn vertices(&self) -> &[Rc<dyn Vertex>] {
        &self.vertices
    }

    pub fn vertex(&self, label: &str) -> PdpResult<&Rc<dyn Vertex>> {
        let node = self.topology.node_from_label(label)?;
        Ok(&self.vertices[node.id.0])
    }

    /// Tell the placement service how much memory every node needs.
    pub fn declare_resources(&self, sink: &mut dyn ResourceSink) -> PdpResult {
        for vertex in &self.vertices {
            sink.declare(&vertex.node().label, resources(vertex.as_ref())?)?;
        }
        Ok(())
    }

    /// Memory images of every node for the first stage. Either all images
    /// are produced or none.
    pub fn generate(&self, keys: &dyn KeyAllocator, stage: &Stage) -> PdpResult<Vec<NodeImage>> {
        let shared = SharedRegions::new(&self.network, stage)?;
        let images = self
            .vertices
            .iter()
            .map(|vertex| write_image(vertex.as_ref(), &self.topology, keys, &shared))
            .collect::<PdpResult<Vec<_>>>()?;
        info!("Generated {} node images for {stage}", images.len());
        Ok(images)
    }

    /// Stage-dependent regions of every node for a later stage.
    pub fn regenerate(&self, stage: &Stage) -> PdpResult<Vec<StageUpdate>> {
        let shared = SharedRegions::new(&self.network, stage)?;
        let updates = self
            .vertices
            .iter()
            .map(|vertex| write_stage_update(vertex.as_ref(), &shared))
            .collect::<PdpResult<Vec<_>>>()?;
        info!("Regenerated {} nodes for {stage}", updates.len());
        Ok(updates)
    }

    /// Read back and decode the outputs recorded by every output node.
    pub fn read_outputs(&self, source: &dyn RecordingSource) -> PdpResult<RecordedOutputs> {
        let mut outputs = Vec::new();
        for vertex in &self.vertices {
            let Some(plan) = vertex.recording() else {
                continue;
            };
            let label = &vertex.node().label;
            let data = read_recording(source, label, RecordingChannel::Outputs)?;
            outputs.push((label.clone(), decode_outputs(&data, plan.units)?));
        }
        Ok(outputs)
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.topology)
    }
}
