// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::fmt;

use crate::channel::ChannelKind;

/// Index of a node in its [Topology](crate::builder::Topology).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Weight,
    Sum,
    Input,
    Threshold,
}

impl Role {
    /// Processor type code expected by the node runtime.
    #[must_use]
    pub const fn proc_code(self) -> u32 {
        match self {
            Role::Weight => 0,
            Role::Sum => 1,
            Role::Threshold => 2,
            Role::Input => 3,
        }
    }

    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Role::Weight => 'w',
            Role::Sum => 's',
            Role::Input => 'i',
            Role::Threshold => 't',
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::Weight => {
                write!(f, "Weight")
            }
            Role::Sum => {
                write!(f, "Sum")
            }
            Role::Input => {
                write!(f, "Input")
            }
            Role::Threshold => {
                write!(f, "Threshold")
            }
        }
    }
}

/// A (group, subgroup) pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubgroupRef {
    pub group: usize,
    pub subgroup: usize,
}

impl fmt::Display for SubgroupRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.subgroup)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub role: Role,
    /// The subgroup this node computes for. For a Weight node this is the
    /// destination of its weight block.
    pub at: SubgroupRef,
    /// Source subgroup of a Weight node.
    pub from: Option<SubgroupRef>,
    /// Network link realised by a Weight node.
    pub link: Option<usize>,
    pub label: String,
}

impl Node {
    pub(crate) fn new(id: NodeId, role: Role, at: SubgroupRef) -> Self {
        Self {
            id,
            role,
            at,
            from: None,
            link: None,
            label: format!("{}_core{at}", role.prefix()),
        }
    }

    pub(crate) fn new_weight(id: NodeId, at: SubgroupRef, from: SubgroupRef, link: usize) -> Self {
        Self {
            id,
            role: Role::Weight,
            at,
            from: Some(from),
            link: Some(link),
            label: format!("w_core{at}_{from}"),
        }
    }

    /// Name of the outgoing endpoint for one channel kind, unique across the
    /// topology.
    #[must_use]
    pub fn endpoint(&self, kind: ChannelKind) -> String {
        match self.from {
            Some(from) => format!("{}_{}{}_{from}", kind.name(), self.role.prefix(), self.at),
            None => format!("{}_{}{}", kind.name(), self.role.prefix(), self.at),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_endpoints() {
        let at = SubgroupRef {
            group: 2,
            subgroup: 1,
        };
        let from = SubgroupRef {
            group: 1,
            subgroup: 0,
        };
        let t = Node::new(NodeId(7), Role::Threshold, at);
        assert_eq!(t.label, "t_core2/1");
        assert_eq!(t.endpoint(ChannelKind::Stop), "stp_t2/1");

        let w = Node::new_weight(NodeId(0), at, from, 3);
        assert_eq!(w.label, "w_core2/1_1/0");
        assert_eq!(w.endpoint(ChannelKind::Forward), "fwd_w2/1_1/0");
    }
}
