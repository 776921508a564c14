use std::collections::VecDeque;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::collector::CollectorMap;
use crate::utils::NameGenerator;

/// Index of a node within its [Graph]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn get(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// The outermost selection of a query.
    Root,
    /// A nested selection; relates to its parent through a `with` rule.
    SubRoot,
}

/// One selection in the query: a table to read, the conditions on it, and the
/// scalar fields to project.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionNode {
    /// Identifier as written in the source.
    pub name: String,
    /// Unique lowercase alias, used verbatim as the SQL table alias.
    pub key: String,
    pub parent_name: Option<String>,
    pub parent_key: Option<String>,
    pub kind: NodeKind,
    /// Bare identifiers from the node's argument list.
    pub attrs: Vec<String>,
    /// Node-level conditions, keyed by argument tag.
    pub rules: CollectorMap,
    /// Scalar fields in declaration order; each may carry field-level
    /// conditions.
    pub records: CollectorMap,
    /// One sub-document per returned row; written only during re-assembly.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub result: Vec<Map<String, Value>>,
    children: Vec<NodeId>,
}

impl SelectionNode {
    /// Adds a bare attribute, ignoring duplicates.
    pub fn add_attr(&mut self, attr: impl Into<String>) {
        let attr = attr.into();
        if !self.attrs.contains(&attr) {
            self.attrs.push(attr);
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The parsed query: a flat arena of selection nodes with the root at index
/// zero and child edges in declaration order. Nodes are addressable by their
/// unique alias and findable by name.
#[derive(Debug, Clone, Serialize)]
pub struct Graph {
    nodes: Vec<SelectionNode>,
    #[serde(skip)]
    aliases: NameGenerator,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            nodes: Vec::new(),
            aliases: NameGenerator::new("t"),
        }
    }

    fn add_node(
        &mut self,
        kind: NodeKind,
        name: String,
        parent: Option<(String, String)>,
    ) -> NodeId {
        let (parent_name, parent_key) = match parent {
            Some((name, key)) => (Some(name), Some(key)),
            None => (None, None),
        };
        let node = SelectionNode {
            name,
            key: self.aliases.gen(),
            parent_name,
            parent_key,
            kind,
            attrs: Vec::new(),
            rules: CollectorMap::new(),
            records: CollectorMap::new(),
            result: Vec::new(),
            children: Vec::new(),
        };
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_root(&mut self, name: impl Into<String>) -> NodeId {
        self.add_node(NodeKind::Root, name.into(), None)
    }

    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let (parent_name, parent_key) = {
            let p = self.node(parent);
            (p.name.clone(), p.key.clone())
        };
        let id = self.add_node(NodeKind::SubRoot, name.into(), Some((parent_name, parent_key)));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    pub fn node(&self, id: NodeId) -> &SelectionNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SelectionNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Looks a node up by its unique alias.
    pub fn get(&self, key: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.key == key).map(NodeId)
    }

    /// First node carrying `name`, in creation order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Depth-first pre-order from the root, children in declaration order.
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root().into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev());
        }
        order
    }

    /// Breadth-first from the root, children in declaration order.
    pub fn breadth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue: VecDeque<NodeId> = self.root().into_iter().collect();
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(self.node(id).children.iter());
        }
        order
    }
}
