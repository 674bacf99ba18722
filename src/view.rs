//! [RenderState], the per-panel view model.
//!
//! The render state holds the last [GraphSnapshot] and the live (render-ready) subset of it.
//! Every mutation goes through a method here, and each one leaves the adjacency index, focus
//! sets and filters consistent with the live data before returning.

use std::collections::BTreeSet;

use crate::{
    diff::{reconcile, Filters, RenderDelta},
    highlight::{Adjacency, Decoration, DisplayState, Focus, Selection},
    nodeid::NodeId,
    painter::Painter,
    properties::{NodeKind, TypeLabel, TAG_LABEL},
    snapshot::{Edge, GraphSnapshot},
    style::{self, GraphStyle, NodeColors},
};

#[derive(Debug, Default)]
pub struct RenderState {
    snapshot: GraphSnapshot,
    live_nodes: Vec<NodeId>,
    live_node_set: BTreeSet<NodeId>,
    live_links: Vec<Edge>,
    live_link_set: BTreeSet<Edge>,
    hover: Option<NodeId>,
    selection: Selection,
    filters: Filters,
    style: GraphStyle,
    index_names: Vec<String>,
    adjacency: Adjacency,
    focus: Focus,
}

impl RenderState {
    pub fn new(style: GraphStyle, index_names: Vec<String>) -> RenderState {
        let mut filters = Filters::default();
        filters.sync_link_kinds(&style);
        RenderState {
            style,
            index_names,
            filters,
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    pub fn live_nodes(&self) -> &[NodeId] {
        &self.live_nodes
    }

    pub fn live_links(&self) -> &[Edge] {
        &self.live_links
    }

    pub fn hover_node(&self) -> Option<&NodeId> {
        self.hover.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn style(&self) -> &GraphStyle {
        &self.style
    }

    pub fn set_index_names(&mut self, index_names: Vec<String>) {
        self.index_names = index_names;
    }

    pub fn is_live(&self, id: &NodeId) -> bool {
        self.live_node_set.contains(id)
    }

    /// Map a wire id from the panel to a node of the current snapshot.
    pub fn resolve(&self, wire: &str) -> Option<NodeId> {
        self.snapshot.find(wire).map(|node| node.id.clone())
    }

    /// Replace the graph with a new synthesis result and reconcile against it.
    pub fn refresh(&mut self, snapshot: GraphSnapshot) -> RenderDelta {
        self.snapshot = snapshot;
        self.filters.sync_types(&self.snapshot);
        self.filters.sync_link_kinds(&self.style);
        self.apply()
    }

    pub fn set_type_visible(&mut self, label: TypeLabel, visible: bool) -> RenderDelta {
        self.filters.set_type_visible(label, visible);
        self.filters.sync_link_kinds(&self.style);
        self.apply()
    }

    pub fn update_style(&mut self, style: GraphStyle) -> RenderDelta {
        self.style = style;
        self.filters.sync_link_kinds(&self.style);
        self.apply()
    }

    fn apply(&mut self) -> RenderDelta {
        let delta = reconcile(self.live_nodes.iter(), &self.snapshot, &self.filters);

        let removed = delta.nodes_to_remove.iter().collect::<BTreeSet<_>>();
        self.live_nodes.retain(|id| !removed.contains(id));
        self.live_nodes.extend(delta.nodes_to_add.iter().cloned());
        self.live_node_set = self.live_nodes.iter().cloned().collect();
        self.live_links = delta.live_links.clone();
        self.live_link_set = self.live_links.iter().cloned().collect();

        self.clear_stale();
        self.adjacency = Adjacency::from_links(self.live_links.iter());
        self.refocus();
        tracing::debug!(
            "[RenderState] +{} -{} nodes, {} live links",
            delta.nodes_to_add.len(),
            delta.nodes_to_remove.len(),
            delta.live_links.len()
        );
        delta
    }

    /// Hover and selection may only name nodes of the current table.
    fn clear_stale(&mut self) {
        let snapshot = &self.snapshot;
        if self.hover.as_ref().is_some_and(|id| !snapshot.contains(id)) {
            tracing::debug!("[RenderState] clearing stale hover {:?}", self.hover);
            self.hover = None;
        }
        let cleared = self.selection.retain(|id| snapshot.contains(id));
        if cleared > 0 {
            tracing::debug!("[RenderState] cleared {cleared} stale selected node(s)");
        }
    }

    fn refocus(&mut self) {
        self.focus = Focus::compute(self.hover.as_ref(), &self.selection, &self.adjacency);
    }

    /// Set or clear the hover target. Ids unknown to the node table clear it.
    pub fn hover(&mut self, node: Option<NodeId>) -> Decoration {
        self.hover = node.filter(|id| self.snapshot.contains(id));
        self.refocus();
        self.decoration()
    }

    /// Apply a select gesture (see [Selection::select]). Ids unknown to the node table are
    /// treated as `None`.
    pub fn select(&mut self, node: Option<NodeId>, append: bool) -> Decoration {
        let node = node.filter(|id| self.snapshot.contains(id));
        self.selection.select(node, append);
        self.refocus();
        self.decoration()
    }

    pub fn decoration(&self) -> Decoration {
        self.focus.decoration()
    }

    pub fn node_state(&self, id: &NodeId) -> DisplayState {
        self.focus.node_state(id, self.is_live(id))
    }

    pub fn link_state(&self, edge: &Edge) -> DisplayState {
        self.focus.link_state(edge, self.live_link_set.contains(edge))
    }

    pub fn node_colors(&self, id: &NodeId) -> Option<NodeColors> {
        let node = self.snapshot.get(id)?;
        Some(self.style.node_colors(node, self.node_state(id)))
    }

    pub fn link_color(&self, edge: &Edge) -> style::Color {
        let both_tags = edge.source.kind() == NodeKind::Tag && edge.target.kind() == NodeKind::Tag;
        self.style.link_color(
            edge,
            self.link_state(edge),
            both_tags,
            self.filters.is_type_visible(TAG_LABEL),
        )
    }

    pub fn link_width(&self, edge: &Edge) -> f32 {
        self.style.link_width(edge.kind)
    }

    pub fn particle_width(&self, edge: &Edge) -> f32 {
        self.style.particle_width(self.link_state(edge))
    }

    pub fn link_strength(&self, edge: &Edge) -> Option<f32> {
        self.style.link_strength(edge.kind)
    }

    pub fn node_size(&self, id: &NodeId) -> f32 {
        style::node_size(self.adjacency.degree(id))
    }

    /// Queue the disc and (zoom permitting) the label of one node at layout position `(x, y)`.
    /// Hidden and unknown nodes draw nothing.
    pub fn paint_node(&self, painter: &mut Painter, id: &NodeId, x: f32, y: f32, zoom: f32) {
        let Some(node) = self.snapshot.get(id) else {
            tracing::debug!("[RenderState] no info for node {id}, skipping");
            return;
        };
        let state = self.node_state(id);
        if state == DisplayState::Hidden {
            return;
        }
        let size = self.node_size(id);
        let colors = self.style.node_colors(node, state);
        painter.circle(x, y, size, colors.fill, colors.border);
        if style::label_visible(node, zoom, &self.index_names) {
            painter.text(
                &node.title,
                x,
                y + size + 1.0,
                self.style.font_size / zoom,
                &self.style.font_family,
                style::label_color(colors.fill, state, zoom),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        properties::EdgeKind,
        snapshot::Node,
        style::StylePatch,
        workspace::Note,
    };
    use test_log::test;

    fn graph() -> GraphSnapshot {
        let a = Node::from_note(&Note::new("/ws/a.md"), 24);
        let b = Node::from_note(&Note::new("/ws/b.md"), 24);
        let t = Node::tag("t", 24);
        let edges = [
            Edge::new(a.id.clone(), b.id.clone(), EdgeKind::Reference),
            Edge::new(a.id.clone(), t.id.clone(), EdgeKind::Tag),
        ];
        GraphSnapshot::new(
            [a, b, t].into_iter().map(|n| (n.id.clone(), n)).collect(),
            edges.into_iter().collect(),
        )
    }

    fn note(path: &str) -> NodeId {
        NodeId::Note(path.to_string())
    }

    #[test]
    fn test_refresh_applies_delta_in_place() {
        let mut state = RenderState::new(GraphStyle::default(), vec!["README.md".to_string()]);
        let delta = state.refresh(graph());
        assert_eq!(delta.nodes_to_add.len(), 3);
        assert_eq!(state.live_nodes().len(), 3);
        assert_eq!(state.live_links().len(), 2);

        let delta = state.set_type_visible(TypeLabel::from("tag"), false);
        assert_eq!(delta.nodes_to_remove, vec![NodeId::Tag("t".into())]);
        assert_eq!(state.live_nodes(), &[note("/ws/a.md"), note("/ws/b.md")]);
        assert_eq!(state.live_links().len(), 1);

        let delta = state.refresh(graph());
        assert!(!delta.changes_nodes());
    }

    #[test]
    fn test_stale_hover_and_selection_are_cleared() {
        let mut state = RenderState::default();
        state.refresh(graph());
        state.hover(Some(note("/ws/a.md")));
        state.select(Some(note("/ws/b.md")), false);
        assert!(state.hover_node().is_some());

        state.refresh(GraphSnapshot::empty());
        assert!(state.hover_node().is_none());
        assert!(state.selection().is_empty());
        assert_eq!(state.decoration(), Decoration::default());
    }

    #[test]
    fn test_hidden_type_keeps_selection_of_known_node() {
        let mut state = RenderState::default();
        state.refresh(graph());
        state.select(Some(NodeId::Tag("t".into())), false);
        state.set_type_visible(TypeLabel::from("tag"), false);
        assert!(state.selection().contains(&NodeId::Tag("t".into())));
        assert_eq!(
            state.node_state(&NodeId::Tag("t".into())),
            DisplayState::Hidden
        );
        assert_eq!(state.node_state(&note("/ws/b.md")), DisplayState::Lessened);
    }

    #[test]
    fn test_hover_decorates_neighbors_and_links() {
        let mut state = RenderState::default();
        state.refresh(graph());
        let decoration = state.hover(Some(note("/ws/b.md")));
        assert_eq!(
            decoration.highlighted_ids,
            vec![note("/ws/a.md"), note("/ws/b.md")]
        );
        let reference = Edge::new(note("/ws/a.md"), note("/ws/b.md"), EdgeKind::Reference);
        let tag = Edge::new(note("/ws/a.md"), NodeId::Tag("t".into()), EdgeKind::Tag);
        assert_eq!(state.link_state(&reference), DisplayState::Highlighted);
        assert_eq!(state.link_state(&tag), DisplayState::Lessened);
        assert_eq!(state.particle_width(&reference), state.style().particle_width);
        assert_eq!(state.link_color(&reference), state.style().highlighted_foreground);

        assert!(state.hover(Some(note("/ws/nope.md"))).highlighted_ids.is_empty());
    }

    #[test]
    fn test_style_update_hides_reference_links() {
        let mut state = RenderState::default();
        state.refresh(graph());
        state.update_style(GraphStyle::merged(&StylePatch {
            show_reference_links: Some(false),
            ..Default::default()
        }));
        assert_eq!(state.live_links().len(), 1);
        assert_eq!(state.live_links()[0].kind, EdgeKind::Tag);
    }

    #[test]
    fn test_paint_node_skips_hidden_and_labels_at_zoom() {
        let mut state = RenderState::default();
        state.refresh(graph());
        let mut painter = Painter::new();
        state.paint_node(&mut painter, &note("/ws/a.md"), 0.0, 0.0, 2.0);
        assert_eq!(painter.len(), 3);

        let mut painter = Painter::new();
        state.paint_node(&mut painter, &note("/ws/a.md"), 0.0, 0.0, 0.2);
        assert_eq!(painter.len(), 2);

        state.set_type_visible(TypeLabel::from("note"), false);
        let mut painter = Painter::new();
        state.paint_node(&mut painter, &note("/ws/a.md"), 0.0, 0.0, 2.0);
        assert!(painter.is_empty());
    }
}
