// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::fmt;

use crate::node::NodeId;

/// Number of channel kinds, which is also the number of routing-key slots of
/// every node.
pub const NUM_CHANNEL_KINDS: usize = 6;

/// Message classes, in routing-key slot order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelKind {
    /// Activations and partial nets moving up the network.
    Forward,
    /// Errors and partial deltas moving down the network.
    Backprop,
    /// Weight node to the threshold that fed it, once its forward work is done.
    ForwardSync,
    /// Global termination broadcast.
    Stop,
    /// Partial link delta sums reduced to one scalar.
    LocalDeltaSum,
    /// Convergence partials collected by the stop node.
    Criterion,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; NUM_CHANNEL_KINDS] = [
        ChannelKind::Forward,
        ChannelKind::Backprop,
        ChannelKind::ForwardSync,
        ChannelKind::Stop,
        ChannelKind::LocalDeltaSum,
        ChannelKind::Criterion,
    ];

    /// Position of the kind's key in a routing-key region.
    #[must_use]
    pub const fn slot(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ChannelKind::Forward => "fwd",
            ChannelKind::Backprop => "bkp",
            ChannelKind::ForwardSync => "fds",
            ChannelKind::Stop => "stp",
            ChannelKind::LocalDeltaSum => "lds",
            ChannelKind::Criterion => "crt",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A directed message path between two nodes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub src: NodeId,
    pub dst: NodeId,
    pub kind: ChannelKind,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -{}-> {}", self.src, self.kind, self.dst)
    }
}
