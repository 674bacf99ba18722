/// [crate::nodeid] contains [NodeId], the canonical identity of every node in a
/// [crate::snapshot::GraphSnapshot].
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::{error::NotegraphError, properties::NodeKind};

pub const FOLDER_SCHEME: &str = "folder:";
pub const TAG_SCHEME: &str = "tag:";

/// Canonical node identity.
///
/// The four variants partition the id namespace. Internally they never compare equal to each
/// other; at the wire boundary they serialize to the flat string convention the visualization
/// expects: a note or placeholder is its raw path, a synthetic folder is `folder:<path>` and a
/// tag is `tag:<label>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeId {
    Note(String),
    Folder(String),
    Tag(String),
    Placeholder(String),
}

impl NodeId {
    /// The kind of node this identity denotes.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeId::Note(_) => NodeKind::Note,
            NodeId::Folder(_) => NodeKind::Folder,
            NodeId::Tag(_) => NodeKind::Tag,
            NodeId::Placeholder(_) => NodeKind::Placeholder,
        }
    }

    /// The path for path-backed ids (note, folder, placeholder).
    pub fn path(&self) -> Option<&str> {
        match self {
            NodeId::Note(path) | NodeId::Folder(path) | NodeId::Placeholder(path) => Some(path),
            NodeId::Tag(_) => None,
        }
    }

    /// The wire string for this id.
    pub fn wire(&self) -> String {
        self.to_string()
    }

    /// True if `wire` is the serialized form of this id.
    pub fn matches_wire(&self, wire: &str) -> bool {
        match self {
            NodeId::Note(path) | NodeId::Placeholder(path) => path == wire,
            NodeId::Folder(path) => wire.strip_prefix(FOLDER_SCHEME) == Some(path.as_str()),
            NodeId::Tag(label) => wire.strip_prefix(TAG_SCHEME) == Some(label.as_str()),
        }
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            NodeId::Note(path) | NodeId::Placeholder(path) => write!(f, "{path}"),
            NodeId::Folder(path) => write!(f, "{FOLDER_SCHEME}{path}"),
            NodeId::Tag(label) => write!(f, "{TAG_SCHEME}{label}"),
        }
    }
}

impl FromStr for NodeId {
    type Err = NotegraphError;

    /// Parse a wire id. Bare paths parse as [NodeId::Note]: the wire format does not carry the
    /// placeholder distinction, use [crate::snapshot::GraphSnapshot::find] to resolve a wire id
    /// against a concrete node table.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(NotegraphError::Serialization(
                "[NodeId] cannot generate a node id from an empty string.".to_string(),
            ));
        }
        if let Some(path) = s.strip_prefix(FOLDER_SCHEME) {
            Ok(NodeId::Folder(path.to_string()))
        } else if let Some(label) = s.strip_prefix(TAG_SCHEME) {
            Ok(NodeId::Tag(label.to_string()))
        } else {
            Ok(NodeId::Note(s.to_string()))
        }
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
