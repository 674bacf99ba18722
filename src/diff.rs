use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    nodeid::NodeId,
    properties::{EdgeKind, EnumSet, TypeLabel, TAG_LABEL},
    snapshot::{Edge, GraphSnapshot},
    style::GraphStyle,
};

/// Type and link-kind visibility for one panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    pub visible_types: BTreeMap<TypeLabel, bool>,
    pub link_kinds: EnumSet<EdgeKind>,
}

impl Default for Filters {
    fn default() -> Self {
        Filters {
            visible_types: BTreeMap::new(),
            link_kinds: EnumSet::all(),
        }
    }
}

impl Filters {
    /// Visibility of a label. Labels not tracked yet report their default.
    pub fn is_type_visible(&self, label: &str) -> bool {
        self.visible_types
            .get(label)
            .copied()
            .unwrap_or_else(|| TypeLabel::new(label).default_visibility())
    }

    pub fn set_type_visible(&mut self, label: TypeLabel, visible: bool) {
        self.visible_types.insert(label, visible);
    }

    pub fn is_link_visible(&self, kind: EdgeKind) -> bool {
        self.link_kinds.contains(kind)
    }

    /// Track exactly the labels present in `snapshot`: new labels start at their default
    /// visibility, labels that disappeared are forgotten.
    pub fn sync_types(&mut self, snapshot: &GraphSnapshot) {
        let present = snapshot
            .nodes()
            .values()
            .map(|node| node.group.clone())
            .collect::<BTreeSet<_>>();
        self.visible_types.retain(|label, _| present.contains(label));
        for label in present {
            let visible = label.default_visibility();
            self.visible_types.entry(label).or_insert(visible);
        }
    }

    /// Derive the enabled link kinds from the style toggles and tag visibility.
    pub fn sync_link_kinds(&mut self, style: &GraphStyle) {
        let tags_visible = self.is_type_visible(TAG_LABEL);
        self.link_kinds = EdgeKind::all()
            .iter()
            .copied()
            .filter(|kind| style.shows_link(*kind, tags_visible))
            .collect();
    }
}

/// Node additions and removals against the previous live set, plus the full live link list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderDelta {
    pub nodes_to_add: Vec<NodeId>,
    pub nodes_to_remove: Vec<NodeId>,
    pub live_links: Vec<Edge>,
}

impl RenderDelta {
    pub fn changes_nodes(&self) -> bool {
        !self.nodes_to_add.is_empty() || !self.nodes_to_remove.is_empty()
    }
}

/// The ids of `snapshot` that pass the type filter, in snapshot order.
pub fn visible_nodes<'a>(
    snapshot: &'a GraphSnapshot,
    filters: &'a Filters,
) -> impl Iterator<Item = &'a NodeId> {
    snapshot
        .nodes()
        .values()
        .filter(|node| filters.is_type_visible(node.group.as_str()))
        .map(|node| &node.id)
}

/// Compute the minimal node delta from `prev` to the filtered `snapshot`. Links are recomputed
/// in full: a link is live when its kind is enabled and both endpoints are visible.
pub fn reconcile<'p, I>(prev: I, snapshot: &GraphSnapshot, filters: &Filters) -> RenderDelta
where
    I: IntoIterator<Item = &'p NodeId>,
{
    let visible = visible_nodes(snapshot, filters).collect::<BTreeSet<_>>();
    let prev = prev.into_iter().collect::<Vec<_>>();
    let prev_set = prev.iter().copied().collect::<BTreeSet<_>>();

    let nodes_to_remove = prev
        .iter()
        .filter(|id| !visible.contains(**id))
        .map(|id| (*id).clone())
        .collect();
    let nodes_to_add = visible_nodes(snapshot, filters)
        .filter(|id| !prev_set.contains(id))
        .cloned()
        .collect();
    let live_links = snapshot
        .edges()
        .iter()
        .filter(|edge| {
            filters.is_link_visible(edge.kind)
                && visible.contains(&edge.source)
                && visible.contains(&edge.target)
        })
        .cloned()
        .collect();

    RenderDelta {
        nodes_to_add,
        nodes_to_remove,
        live_links,
    }
}
