//! Display states for nodes and links, derived from hover, selection and liveness.
//!
//! Nothing here is cached across queries except the [Adjacency] index, which the view rebuilds
//! once per reconcile so that focus propagation is proportional to node degree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::{
    nodeid::NodeId,
    snapshot::{Edge, LinkGraph},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayState {
    Regular,
    Highlighted,
    Lessened,
    Hidden,
}

/// Neighbour and incident-edge index over the live links.
#[derive(Debug, Clone, Default)]
pub struct Adjacency(LinkGraph);

impl Adjacency {
    pub fn from_links<'a, I: IntoIterator<Item = &'a Edge>>(links: I) -> Adjacency {
        Adjacency(LinkGraph::from_edges(links))
    }

    pub fn neighbors(&self, id: &NodeId) -> BTreeSet<NodeId> {
        self.0.neighbors(id)
    }

    pub fn incident_edges(&self, id: &NodeId) -> Vec<Edge> {
        self.0.incident_edges(id)
    }

    pub fn degree(&self, id: &NodeId) -> usize {
        self.neighbors(id).len()
    }
}

/// The selected node set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(BTreeSet<NodeId>);

impl Selection {
    /// Apply one select gesture.
    ///
    /// * `None` without append clears the set; with append it is a no-op.
    /// * `Some(x)` without append replaces the set with `{x}`.
    /// * `Some(x)` with append toggles membership of `x`.
    pub fn select(&mut self, node: Option<NodeId>, append: bool) {
        match (node, append) {
            (None, false) => self.0.clear(),
            (None, true) => {}
            (Some(id), false) => {
                self.0.clear();
                self.0.insert(id);
            }
            (Some(id), true) => {
                if !self.0.remove(&id) {
                    self.0.insert(id);
                }
            }
        }
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.0.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.0.iter()
    }

    /// Drop ids for which `keep` is false. Returns the number removed.
    pub fn retain<F: FnMut(&NodeId) -> bool>(&mut self, keep: F) -> usize {
        let before = self.0.len();
        self.0.retain(keep);
        before - self.0.len()
    }
}

/// Nodes and links highlighted by the current hover and selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Focus {
    pub nodes: BTreeSet<NodeId>,
    pub links: BTreeSet<Edge>,
    active: bool,
}

impl Focus {
    pub fn compute(hover: Option<&NodeId>, selection: &Selection, adjacency: &Adjacency) -> Focus {
        let mut focus = Focus {
            active: hover.is_some() || !selection.is_empty(),
            ..Default::default()
        };
        for id in hover.into_iter().chain(selection.iter()) {
            focus.nodes.insert(id.clone());
            focus.nodes.extend(adjacency.neighbors(id));
            focus.links.extend(adjacency.incident_edges(id));
        }
        focus
    }

    /// True when a hover target or selection exists, whether or not it is live.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn node_state(&self, id: &NodeId, live: bool) -> DisplayState {
        if !live {
            DisplayState::Hidden
        } else if self.nodes.contains(id) {
            DisplayState::Highlighted
        } else if self.active {
            DisplayState::Lessened
        } else {
            DisplayState::Regular
        }
    }

    pub fn link_state(&self, edge: &Edge, live: bool) -> DisplayState {
        if !live {
            DisplayState::Hidden
        } else if self.links.contains(edge) {
            DisplayState::Highlighted
        } else if self.active {
            DisplayState::Lessened
        } else {
            DisplayState::Regular
        }
    }

    pub fn decoration(&self) -> Decoration {
        Decoration {
            highlighted_ids: self.nodes.iter().cloned().collect(),
            focus_links: self.links.iter().cloned().collect(),
        }
    }
}

/// Outbound highlight set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decoration {
    pub highlighted_ids: Vec<NodeId>,
    pub focus_links: Vec<Edge>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::EdgeKind;
    use test_log::test;

    fn note(path: &str) -> NodeId {
        NodeId::Note(path.to_string())
    }

    #[test]
    fn test_selection_toggle_semantics() {
        let mut selection = Selection::default();
        selection.select(Some(note("/a")), false);
        selection.select(Some(note("/b")), true);
        assert_eq!(selection.len(), 2);
        selection.select(Some(note("/a")), true);
        assert!(!selection.contains(&note("/a")));
        assert!(selection.contains(&note("/b")));
        selection.select(None, true);
        assert_eq!(selection.len(), 1);
        selection.select(Some(note("/c")), false);
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec![&note("/c")]);
        selection.select(None, false);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_focus_propagates_to_neighbors() {
        let a = note("/a");
        let b = note("/b");
        let c = note("/c");
        let ab = Edge::new(a.clone(), b.clone(), EdgeKind::Reference);
        let bc = Edge::new(b.clone(), c.clone(), EdgeKind::Reference);
        let adjacency = Adjacency::from_links([&ab, &bc]);

        let idle = Focus::compute(None, &Selection::default(), &adjacency);
        assert!(!idle.is_active());
        assert_eq!(idle.node_state(&a, true), DisplayState::Regular);
        assert_eq!(idle.node_state(&a, false), DisplayState::Hidden);

        let hovered = Focus::compute(Some(&a), &Selection::default(), &adjacency);
        assert_eq!(hovered.node_state(&a, true), DisplayState::Highlighted);
        assert_eq!(hovered.node_state(&b, true), DisplayState::Highlighted);
        assert_eq!(hovered.node_state(&c, true), DisplayState::Lessened);
        assert_eq!(hovered.link_state(&ab, true), DisplayState::Highlighted);
        assert_eq!(hovered.link_state(&bc, true), DisplayState::Lessened);
        assert_eq!(hovered.link_state(&bc, false), DisplayState::Hidden);

        let decoration = hovered.decoration();
        assert_eq!(decoration.highlighted_ids, vec![a, b]);
        assert_eq!(decoration.focus_links, vec![ab]);
    }

    #[test]
    fn test_degree_counts_distinct_neighbors() {
        let a = note("/a");
        let b = note("/b");
        let links = [
            Edge::new(a.clone(), b.clone(), EdgeKind::Reference),
            Edge::new(b.clone(), a.clone(), EdgeKind::Reference),
            Edge::new(a.clone(), b.clone(), EdgeKind::Structural),
        ];
        let adjacency = Adjacency::from_links(links.iter());
        assert_eq!(adjacency.degree(&a), 1);
        assert_eq!(adjacency.incident_edges(&a).len(), 3);
    }
}
