pub use enumset::EnumSet;
/// [crate::properties] contains the closed vocabularies used by the graph: node kinds, the
/// filter-grouping [TypeLabel], and edge kinds.
use enumset::*;
use serde::{Deserialize, Serialize};
use std::{
    borrow::Borrow,
    fmt::{Display, Formatter},
};

/// Default label for notes that declare no `type` property.
pub const NOTE_LABEL: &str = "note";
pub const PLACEHOLDER_LABEL: &str = "placeholder";
pub const FOLDER_LABEL: &str = "folder";
pub const TAG_LABEL: &str = "tag";

/// Declared resource types that begin hidden until the user enables them.
pub const HIDDEN_BY_DEFAULT: &[&str] = &["image", "attachment"];

/// The property a note uses to override its filter group.
pub const TYPE_PROPERTY: &str = "type";
/// The property a note uses to override its type colour.
pub const COLOR_PROPERTY: &str = "color";

/// [NodeKind] is the structural kind of a node. It decides how the synthesizer treats the node;
/// the user-facing grouping lives in [TypeLabel].
#[derive(Debug, Default, Serialize, Deserialize, PartialOrd, Ord, Hash, EnumSetType)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A user-authored note (or other workspace resource).
    #[default]
    Note,
    /// The target of a reference that has no note yet.
    Placeholder,
    /// A synthetic node standing in for a folder without an index document.
    Folder,
    /// A synthetic node for one tag label.
    Tag,
}

impl NodeKind {
    pub fn all() -> &'static [NodeKind] {
        &[
            NodeKind::Note,
            NodeKind::Placeholder,
            NodeKind::Folder,
            NodeKind::Tag,
        ]
    }

    /// Wire label used when a node carries no declared type.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Note => NOTE_LABEL,
            NodeKind::Placeholder => PLACEHOLDER_LABEL,
            NodeKind::Folder => FOLDER_LABEL,
            NodeKind::Tag => TAG_LABEL,
        }
    }

    /// Whether labels for this kind are drawn at every zoom level.
    pub fn always_labelled(&self) -> bool {
        matches!(self, NodeKind::Folder)
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The filter-grouping label of a node (`type` on the wire).
///
/// For synthetic nodes this is the kind label. For notes it is the declared `type` property when
/// present, otherwise the resource type (`note`, `image`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeLabel(String);

impl TypeLabel {
    pub fn new<S: Into<String>>(label: S) -> Self {
        TypeLabel(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Visibility a label starts with when it first appears in a snapshot.
    pub fn default_visibility(&self) -> bool {
        !HIDDEN_BY_DEFAULT.contains(&self.0.as_str())
    }

    pub fn is_tag(&self) -> bool {
        self.0 == TAG_LABEL
    }
}

impl From<NodeKind> for TypeLabel {
    fn from(kind: NodeKind) -> Self {
        TypeLabel(kind.label().to_string())
    }
}

impl From<&str> for TypeLabel {
    fn from(label: &str) -> Self {
        TypeLabel(label.to_string())
    }
}

impl Borrow<str> for TypeLabel {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for TypeLabel {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// [EdgeKind] types an [crate::snapshot::Edge].
#[derive(Debug, Serialize, Deserialize, PartialOrd, Ord, Hash, EnumSetType)]
#[serde(rename_all = "lowercase")]
#[enumset(serialize_repr = "list")]
pub enum EdgeKind {
    /// An explicit link between two notes (or a note and a placeholder).
    Reference,
    /// Folder hierarchy: representative node to contained note or to a parent representative.
    Structural,
    /// A note to one of its tag nodes, or a parent tag to a sub tag.
    Tag,
}

impl EdgeKind {
    pub fn all() -> &'static [EdgeKind] {
        &[EdgeKind::Reference, EdgeKind::Structural, EdgeKind::Tag]
    }
}

impl Display for EdgeKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            EdgeKind::Reference => write!(f, "reference"),
            EdgeKind::Structural => write!(f, "structural"),
            EdgeKind::Tag => write!(f, "tag"),
        }
    }
}

/// How tag labels containing `/` are turned into nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    /// One node per distinct label.
    #[default]
    Flat,
    /// `a/b/c` becomes the chain `a -> a/b -> a/b/c`.
    Hierarchical,
}
