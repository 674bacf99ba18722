//! The graph synthesis pass: workspace notes and connections in, [GraphSnapshot] out.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    config::GraphConfig,
    error::NotegraphError,
    identity::IdentityResolver,
    nodeid::NodeId,
    paths,
    properties::EdgeKind,
    snapshot::{Edge, GraphSnapshot, Node},
    workspace::{Connection, WorkspaceSource},
};

/// Decides which paths are left out of the graph entirely. Paths are full and normalized
/// (`/ws/.git/x.md`), not relative to the workspace root.
pub trait Exclude: Send + Sync {
    fn is_excluded(&self, path: &str) -> bool;
}

impl<F> Exclude for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_excluded(&self, path: &str) -> bool {
        self(path)
    }
}

/// Excludes any path with a segment starting with the prefix character. The default prefix is
/// `.`, so `/ws/.git/x.md`, `/ws/a/.obsidian/b.md` and everything under `/home/me/.notes` are
/// excluded while `/ws/a/b.c/x.md` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiddenSegments(pub char);

impl Default for HiddenSegments {
    fn default() -> Self {
        HiddenSegments('.')
    }
}

impl Exclude for HiddenSegments {
    fn is_excluded(&self, path: &str) -> bool {
        paths::has_hidden_segment(path, self.0)
    }
}

/// Counts reported at the end of a pass.
#[derive(Debug, Default)]
struct PassStats {
    skipped_notes: usize,
    excluded_connections: usize,
    dropped_connections: usize,
}

pub struct GraphSynthesizer {
    config: GraphConfig,
}

impl GraphSynthesizer {
    pub fn new(config: GraphConfig) -> Self {
        GraphSynthesizer { config }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// The exclusion predicate implied by the config's hidden prefix.
    pub fn default_exclude(&self) -> HiddenSegments {
        HiddenSegments(self.config.hidden_prefix)
    }

    /// Build a snapshot from the current workspace content.
    ///
    /// Only failures to enumerate notes or connections are errors. A workspace without a root
    /// produces an empty snapshot, and individual notes or connections that cannot be placed
    /// are skipped.
    #[tracing::instrument(skip_all)]
    pub async fn synthesize<W: WorkspaceSource>(
        &self,
        source: &W,
        exclude: &dyn Exclude,
    ) -> Result<GraphSnapshot, NotegraphError> {
        let Some(root) = source.root().map(|root| paths::normalize(&root)) else {
            tracing::warn!("[GraphSynthesizer] no workspace root, producing an empty graph");
            return Ok(GraphSnapshot::empty());
        };

        let notes = source.list_notes().await?;
        let connections = source.list_connections().await?;
        let max = self.config.title_max_length;

        let mut resolver = IdentityResolver::new(source, &self.config, exclude, Some(root.clone()));
        let mut nodes: BTreeMap<NodeId, Node> = BTreeMap::new();
        let mut edges: BTreeSet<Edge> = BTreeSet::new();
        let mut children: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        let mut stats = PassStats::default();

        for note in notes.iter() {
            if resolver.is_excluded(&note.path) {
                tracing::debug!("[GraphSynthesizer] excluding {}", note.path);
                continue;
            }
            let Some(dir) = paths::parent(&note.path) else {
                tracing::warn!(
                    "[GraphSynthesizer] skipping note {:?}: no containing directory",
                    note.path
                );
                stats.skipped_notes += 1;
                continue;
            };
            let id = NodeId::Note(note.path.clone());
            nodes
                .entry(id.clone())
                .or_insert_with(|| Node::from_note(note, max));
            children.entry(dir.to_string()).or_default().push(id.clone());

            for tag in note.tags.iter() {
                if let Some(tag_id) = resolver.resolve_tag(&mut nodes, &mut edges, tag) {
                    link(&mut edges, Edge::new(id.clone(), tag_id, EdgeKind::Tag));
                }
            }
        }

        for connection in connections.iter() {
            if resolver.is_excluded(&connection.source) || resolver.is_excluded(&connection.target)
            {
                stats.excluded_connections += 1;
                continue;
            }
            let source_id = endpoint(
                &mut nodes,
                &connection.source,
                connection.source_is_placeholder,
                max,
            );
            let target_id = endpoint(
                &mut nodes,
                &connection.target,
                connection.target_is_placeholder,
                max,
            );
            match (source_id, target_id) {
                (Some(source_id), Some(target_id)) => {
                    link(
                        &mut edges,
                        Edge::new(source_id, target_id, EdgeKind::Reference),
                    );
                }
                _ => {
                    log_dropped(connection);
                    stats.dropped_connections += 1;
                }
            }
        }

        // Structural pass. Parents discovered while linking are queued so the chain reaches
        // the root even through folders that hold no notes of their own.
        let mut pending: BTreeSet<String> = children.keys().cloned().collect();
        if !resolver.is_excluded(&root) {
            pending.insert(root.clone());
        }
        let mut visited: BTreeSet<String> = BTreeSet::new();
        while let Some(dir) = pending.pop_first() {
            if !visited.insert(dir.clone()) {
                continue;
            }
            let representative = resolver.resolve_folder(&mut nodes, &dir).await;
            for child in children.get(&dir).into_iter().flatten() {
                link(
                    &mut edges,
                    Edge::new(representative.clone(), child.clone(), EdgeKind::Structural),
                );
            }

            if dir == root {
                continue;
            }
            let Some(parent) = paths::parent(&dir) else {
                continue;
            };
            if !paths::is_within(parent, &root) || resolver.is_excluded(parent) {
                continue;
            }
            let parent_representative = resolver.resolve_folder(&mut nodes, parent).await;
            link(
                &mut edges,
                Edge::new(parent_representative, representative, EdgeKind::Structural),
            );
            if !visited.contains(parent) {
                pending.insert(parent.to_string());
            }
        }

        let snapshot = GraphSnapshot::new(nodes, edges);
        tracing::info!(
            "[GraphSynthesizer] {} nodes, {} edges ({} notes skipped, {} connections excluded, {} dropped)",
            snapshot.nodes().len(),
            snapshot.edges().len(),
            stats.skipped_notes,
            stats.excluded_connections,
            stats.dropped_connections,
        );
        Ok(snapshot)
    }
}

/// Insert an edge unless it would loop back onto its source.
fn link(edges: &mut BTreeSet<Edge>, edge: Edge) {
    if !edge.is_self_edge() {
        edges.insert(edge);
    }
}

/// The node id a connection endpoint refers to. Existing notes win; a placeholder endpoint
/// without a note gets a placeholder node. Anything else has no node.
fn endpoint(
    nodes: &mut BTreeMap<NodeId, Node>,
    path: &str,
    is_placeholder: bool,
    max: usize,
) -> Option<NodeId> {
    let note = NodeId::Note(path.to_string());
    if nodes.contains_key(&note) {
        return Some(note);
    }
    if !is_placeholder {
        return None;
    }
    let placeholder = NodeId::Placeholder(path.to_string());
    nodes
        .entry(placeholder.clone())
        .or_insert_with(|| Node::placeholder(path, max));
    Some(placeholder)
}

fn log_dropped(connection: &Connection) {
    tracing::debug!(
        "[GraphSynthesizer] dropping connection {} -> {}: endpoint has no node",
        connection.source,
        connection.target
    );
}
