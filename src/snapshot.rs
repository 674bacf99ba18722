use petgraph::{graph::NodeIndex, visit::EdgeRef, Direction};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    ops::Deref,
};

use crate::{
    nodeid::NodeId,
    paths,
    properties::{EdgeKind, NodeKind, TypeLabel, TAG_LABEL, TYPE_PROPERTY},
    workspace::Note,
};

pub const ELLIPSIS: &str = "...";

/// Truncate `title` to `max` characters followed by [ELLIPSIS]. A `max` of 0 disables
/// truncation.
pub fn cut_title(title: &str, max: usize) -> String {
    if max == 0 || title.chars().count() <= max {
        return title.to_string();
    }
    let mut cut = title.chars().take(max).collect::<String>();
    cut.push_str(ELLIPSIS);
    cut
}

/// One node of a [GraphSnapshot]. Serializes as the `NodeRecord` wire shape
/// (`{id, type, title, properties, tags}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub group: TypeLabel,
    pub title: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Node {
    pub fn from_note(note: &Note, title_max_length: usize) -> Node {
        let group = match note.properties.get(TYPE_PROPERTY).and_then(|v| v.as_str()) {
            Some(declared) if note.is_document() && !declared.trim().is_empty() => {
                TypeLabel::new(declared.trim())
            }
            _ => TypeLabel::new(note.resource_type.as_str()),
        };
        Node {
            id: NodeId::Note(note.path.clone()),
            group,
            title: cut_title(&note.display_title(), title_max_length),
            properties: note.properties.clone(),
            tags: note.tags.clone(),
        }
    }

    pub fn folder(path: &str, title: &str, title_max_length: usize) -> Node {
        Node::synthetic(NodeId::Folder(path.to_string()), title, title_max_length)
    }

    pub fn tag(label: &str, title_max_length: usize) -> Node {
        Node::synthetic(
            NodeId::Tag(label.to_string()),
            &format!("#{label}"),
            title_max_length,
        )
    }

    /// A placeholder is titled with its raw path.
    pub fn placeholder(path: &str, title_max_length: usize) -> Node {
        Node::synthetic(NodeId::Placeholder(path.to_string()), path, title_max_length)
    }

    fn synthetic(id: NodeId, title: &str, title_max_length: usize) -> Node {
        Node {
            group: TypeLabel::from(id.kind()),
            id,
            title: cut_title(title, title_max_length),
            properties: Map::new(),
            tags: Vec::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.id.kind()
    }

    /// True for notes named after one of `index_names` (a folder's landing page).
    pub fn is_index_document<S: AsRef<str>>(&self, index_names: &[S]) -> bool {
        match &self.id {
            NodeId::Note(path) => paths::is_index_document(path, index_names),
            _ => false,
        }
    }

    pub fn is_tag(&self) -> bool {
        self.group.as_str() == TAG_LABEL
    }
}

/// A typed, directed relation. Identity is the `(source, target, kind)` triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, kind: EdgeKind) -> Edge {
        Edge {
            source,
            target,
            kind,
        }
    }

    pub fn is_self_edge(&self) -> bool {
        self.source == self.target
    }

    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -{}-> {}", self.source, self.kind, self.target)
    }
}

/// The `{nodeInfo, links}` wire shape handed to the visualization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphData {
    pub node_info: BTreeMap<NodeId, Node>,
    pub links: Vec<Edge>,
}

/// Immutable result of one synthesis pass.
///
/// Construction sweeps out any edge whose endpoint is missing from the node table, so every
/// snapshot satisfies the endpoint invariant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphSnapshot {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeSet<Edge>,
}

impl GraphSnapshot {
    pub fn new(nodes: BTreeMap<NodeId, Node>, mut edges: BTreeSet<Edge>) -> GraphSnapshot {
        edges.retain(|edge| {
            let keep = !edge.is_self_edge()
                && nodes.contains_key(&edge.source)
                && nodes.contains_key(&edge.target);
            if !keep {
                tracing::debug!("[GraphSnapshot] dropping edge with invalid endpoints: {edge}");
            }
            keep
        });
        GraphSnapshot { nodes, edges }
    }

    pub fn empty() -> GraphSnapshot {
        GraphSnapshot::default()
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn edges(&self) -> &BTreeSet<Edge> {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Resolve a wire id against the node table. A bare path matches a note first, then a
    /// placeholder.
    pub fn find(&self, wire: &str) -> Option<&Node> {
        let id = wire.parse::<NodeId>().ok()?;
        match id {
            NodeId::Note(path) => self
                .nodes
                .get(&NodeId::Note(path.clone()))
                .or_else(|| self.nodes.get(&NodeId::Placeholder(path))),
            other => self.nodes.get(&other),
        }
    }

    /// Edges whose endpoints are not in the node table. Always empty for a constructed
    /// snapshot.
    pub fn find_orphaned_edges(&self) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|edge| {
                !self.nodes.contains_key(&edge.source) || !self.nodes.contains_key(&edge.target)
            })
            .collect()
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }

    pub fn to_graph_data(&self) -> GraphData {
        GraphData {
            node_info: self.nodes.clone(),
            links: self.edges.iter().cloned().collect(),
        }
    }

    /// Hand-off graph for the external layout engine.
    pub fn as_graph(&self) -> LinkGraph {
        let mut graph = LinkGraph::default();
        for id in self.nodes.keys() {
            graph.add_node(id);
        }
        for edge in self.edges.iter() {
            graph.add_edge(edge);
        }
        graph
    }
}

impl From<GraphData> for GraphSnapshot {
    fn from(data: GraphData) -> Self {
        GraphSnapshot::new(data.node_info, data.links.into_iter().collect())
    }
}

/// A petgraph view over a set of edges, with an id to index map.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    graph: petgraph::Graph<NodeId, EdgeKind>,
    index: BTreeMap<NodeId, NodeIndex>,
}

impl LinkGraph {
    pub fn from_edges<'a, I: IntoIterator<Item = &'a Edge>>(edges: I) -> LinkGraph {
        let mut graph = LinkGraph::default();
        for edge in edges {
            graph.add_edge(edge);
        }
        graph
    }

    pub fn as_graph(&self) -> &petgraph::Graph<NodeId, EdgeKind> {
        &self.graph
    }

    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    fn add_node(&mut self, id: &NodeId) -> NodeIndex {
        if let Some(idx) = self.index.get(id) {
            return *idx;
        }
        let idx = self.graph.add_node(id.clone());
        self.index.insert(id.clone(), idx);
        idx
    }

    fn add_edge(&mut self, edge: &Edge) {
        let source = self.add_node(&edge.source);
        let target = self.add_node(&edge.target);
        self.graph.add_edge(source, target, edge.kind);
    }

    /// Distinct neighbours of `id` in either direction.
    pub fn neighbors(&self, id: &NodeId) -> BTreeSet<NodeId> {
        let Some(idx) = self.index_of(id) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors_undirected(idx)
            .filter(|n| *n != idx)
            .map(|n| self.graph[n].clone())
            .collect()
    }

    /// Edges incident to `id`, in either direction.
    pub fn incident_edges(&self, id: &NodeId) -> Vec<Edge> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        [Direction::Outgoing, Direction::Incoming]
            .into_iter()
            .flat_map(|direction| self.graph.edges_directed(idx, direction))
            .map(|edge| {
                Edge::new(
                    self.graph[edge.source()].clone(),
                    self.graph[edge.target()].clone(),
                    *edge.weight(),
                )
            })
            .collect()
    }
}

impl Deref for LinkGraph {
    type Target = petgraph::Graph<NodeId, EdgeKind>;
    fn deref(&self) -> &petgraph::Graph<NodeId, EdgeKind> {
        &self.graph
    }
}
