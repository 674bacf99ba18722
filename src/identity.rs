//! Canonical identities for folders and tags.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
    config::GraphConfig,
    nodeid::NodeId,
    paths,
    properties::{EdgeKind, TagMode},
    snapshot::{Edge, Node},
    synthesis::Exclude,
    workspace::WorkspaceSource,
};

pub const DEFAULT_ROOT_TITLE: &str = "Workspace";

/// Resolves folders to their representative node and tags to their tag node, inserting node
/// metadata into the pass's node table.
///
/// Results are memoized, and node table inserts never overwrite an existing entry, so repeated
/// resolution of the same path or label is idempotent. A resolver serves exactly one synthesis
/// pass; lookups happen one at a time.
pub struct IdentityResolver<'a, W: WorkspaceSource> {
    source: &'a W,
    config: &'a GraphConfig,
    exclude: &'a dyn Exclude,
    root: Option<String>,
    folders: HashMap<String, NodeId>,
}

impl<'a, W: WorkspaceSource> IdentityResolver<'a, W> {
    pub fn new(
        source: &'a W,
        config: &'a GraphConfig,
        exclude: &'a dyn Exclude,
        root: Option<String>,
    ) -> Self {
        IdentityResolver {
            source,
            config,
            exclude,
            root,
            folders: HashMap::new(),
        }
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// True when `path` is excluded. The predicate sees the full normalized path, so a hidden
    /// directory above the workspace root excludes everything below it.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.is_excluded(&paths::normalize(path))
    }

    fn is_root(&self, folder: &str) -> bool {
        self.root.as_deref() == Some(folder)
    }

    fn root_title(&self) -> String {
        self.config
            .root_title
            .clone()
            .or_else(|| self.source.root_name())
            .unwrap_or_else(|| DEFAULT_ROOT_TITLE.to_string())
    }

    /// Resolve the representative node of `folder`: its first non-excluded index document if
    /// one exists, otherwise a synthetic [NodeId::Folder].
    pub async fn resolve_folder(
        &mut self,
        nodes: &mut BTreeMap<NodeId, Node>,
        folder: &str,
    ) -> NodeId {
        if let Some(id) = self.folders.get(folder) {
            return id.clone();
        }

        let max = self.config.title_max_length;
        for index_name in self.config.index_names.iter() {
            let candidate = paths::join(folder, index_name);
            if self.is_excluded(&candidate) {
                continue;
            }
            match self.source.lookup(&candidate).await {
                Ok(Some(note)) => {
                    let id = NodeId::Note(note.path.clone());
                    nodes
                        .entry(id.clone())
                        .or_insert_with(|| Node::from_note(&note, max));
                    self.folders.insert(folder.to_string(), id.clone());
                    return id;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        "[IdentityResolver] lookup of {candidate} failed, treating as missing: {e}"
                    );
                }
            }
        }

        let title = if self.is_root(folder) {
            self.root_title()
        } else {
            paths::basename(folder).to_string()
        };
        let id = NodeId::Folder(folder.to_string());
        nodes
            .entry(id.clone())
            .or_insert_with(|| Node::folder(folder, &title, max));
        self.folders.insert(folder.to_string(), id.clone());
        id
    }

    /// Resolve the tag node a note links to. In [TagMode::Hierarchical] the ancestors of a
    /// `/`-separated label are created too, chained with tag edges from parent to child.
    /// Returns `None` for a blank label.
    pub fn resolve_tag(
        &mut self,
        nodes: &mut BTreeMap<NodeId, Node>,
        edges: &mut BTreeSet<Edge>,
        label: &str,
    ) -> Option<NodeId> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        let max = self.config.title_max_length;
        match self.config.tag_mode {
            TagMode::Flat => {
                let id = NodeId::Tag(label.to_string());
                nodes
                    .entry(id.clone())
                    .or_insert_with(|| Node::tag(label, max));
                Some(id)
            }
            TagMode::Hierarchical => {
                let mut parent: Option<NodeId> = None;
                let mut prefix = String::new();
                for segment in paths::segments(label) {
                    if !prefix.is_empty() {
                        prefix.push('/');
                    }
                    prefix.push_str(segment);
                    let id = NodeId::Tag(prefix.clone());
                    nodes
                        .entry(id.clone())
                        .or_insert_with(|| Node::tag(&prefix, max));
                    if let Some(parent) = parent {
                        edges.insert(Edge::new(parent, id.clone(), EdgeKind::Tag));
                    }
                    parent = Some(id);
                }
                parent
            }
        }
    }
}
