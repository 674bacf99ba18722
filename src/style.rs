use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use crate::{
    error::NotegraphError,
    highlight::DisplayState,
    properties::{EdgeKind, COLOR_PROPERTY, NOTE_LABEL, TAG_LABEL},
    snapshot::{Edge, Node},
};

/// An RGBA colour compared by value, so structurally equal colours batch together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    /// Same colour with alpha replaced by `opacity` (0.0 to 1.0).
    pub fn with_opacity(self, opacity: f32) -> Color {
        Color {
            a: (opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    pub fn opacity(&self) -> f32 {
        self.a as f32 / 255.0
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

fn parse_hex_digit(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

fn parse_hex(hex: &str) -> Option<Color> {
    let bytes = hex.as_bytes();
    let digits = bytes
        .iter()
        .map(|c| parse_hex_digit(*c))
        .collect::<Option<Vec<u8>>>()?;
    match digits.as_slice() {
        [r, g, b] => Some(Color::rgb(r * 17, g * 17, b * 17)),
        [r, g, b, a] => Some(Color::rgba(r * 17, g * 17, b * 17, a * 17)),
        [r1, r2, g1, g2, b1, b2] => Some(Color::rgb(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
        [r1, r2, g1, g2, b1, b2, a1, a2] => Some(Color::rgba(
            r1 * 16 + r2,
            g1 * 16 + g2,
            b1 * 16 + b2,
            a1 * 16 + a2,
        )),
        _ => None,
    }
}

fn parse_functional(args: &str, with_alpha: bool) -> Option<Color> {
    let parts = args.split(',').map(str::trim).collect::<Vec<_>>();
    let channel = |s: &str| s.parse::<f32>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
    match (parts.as_slice(), with_alpha) {
        ([r, g, b], false) => Some(Color::rgb(channel(*r)?, channel(*g)?, channel(*b)?)),
        ([r, g, b, a], true) => {
            let alpha = a.parse::<f32>().ok()?;
            Some(Color::rgb(channel(*r)?, channel(*g)?, channel(*b)?).with_opacity(alpha))
        }
        _ => None,
    }
}

impl FromStr for Color {
    type Err = NotegraphError;

    /// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)` and
    /// a handful of names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let parsed = if let Some(hex) = lower.strip_prefix('#') {
            parse_hex(hex)
        } else if let Some(args) = lower
            .strip_prefix("rgba(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            parse_functional(args, true)
        } else if let Some(args) = lower
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            parse_functional(args, false)
        } else {
            match lower.as_str() {
                "transparent" => Some(Color::TRANSPARENT),
                "black" => Some(Color::rgb(0, 0, 0)),
                "white" => Some(Color::rgb(255, 255, 255)),
                "red" => Some(Color::rgb(255, 0, 0)),
                _ => None,
            }
        };
        parsed.ok_or_else(|| NotegraphError::Serialization(format!("invalid color {trimmed:?}")))
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = NotegraphError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> String {
        color.to_string()
    }
}

/// Fill and border of one node for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeColors {
    pub fill: Color,
    pub border: Color,
}

pub const LESSENED_NODE_OPACITY: f32 = 0.05;
pub const LESSENED_LINK_OPACITY: f32 = 0.5;
pub const STRUCTURAL_LINK_WIDTH: f32 = 2.5;
/// Labels of ordinary nodes appear from this zoom level on.
pub const LABEL_ZOOM_THRESHOLD: f32 = 0.5;

/// Fully resolved visual style of a graph panel (`didUpdateStyle` payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStyle {
    pub background: Color,
    pub font_size: f32,
    pub font_family: String,
    pub line_color: Color,
    pub line_width: f32,
    pub particle_width: f32,
    pub highlighted_foreground: Color,
    /// Colour per type label. `note` is the fallback for unknown labels.
    pub node: BTreeMap<String, Color>,
    pub show_structural_links: bool,
    pub show_reference_links: bool,
    pub structural_line_color: Color,
    pub structural_force_strength: f32,
}

pub static DEFAULT_STYLE: Lazy<GraphStyle> = Lazy::new(|| GraphStyle {
    background: Color::rgb(0x20, 0x20, 0x20),
    font_size: 10.0,
    font_family: "Sans-Serif".to_string(),
    line_color: Color::rgb(0x27, 0x7d, 0xa1),
    line_width: 0.2,
    particle_width: 1.0,
    highlighted_foreground: Color::rgb(0xf9, 0xc7, 0x4f),
    node: BTreeMap::from([
        ("note".to_string(), Color::rgb(0x27, 0x7d, 0xa1)),
        ("placeholder".to_string(), Color::rgb(0x54, 0x54, 0x54)),
        ("tag".to_string(), Color::rgb(0xf9, 0xc7, 0x4f)),
        ("folder".to_string(), Color::rgb(0xc5, 0x86, 0xc0)),
    ]),
    show_structural_links: true,
    show_reference_links: true,
    structural_line_color: Color::rgb(0x88, 0x88, 0x88),
    structural_force_strength: 1.0,
});

impl Default for GraphStyle {
    fn default() -> Self {
        DEFAULT_STYLE.clone()
    }
}

/// Partial style, as found in configuration. Unset fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePatch {
    pub background: Option<Color>,
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub line_color: Option<Color>,
    pub line_width: Option<f32>,
    pub particle_width: Option<f32>,
    pub highlighted_foreground: Option<Color>,
    pub node: BTreeMap<String, Color>,
    pub show_structural_links: Option<bool>,
    pub show_reference_links: Option<bool>,
    pub structural_line_color: Option<Color>,
    pub structural_force_strength: Option<f32>,
}

impl GraphStyle {
    /// Layer `patch` over the defaults. Without an explicit line colour the patch's note colour
    /// is used for lines.
    pub fn merged(patch: &StylePatch) -> GraphStyle {
        let defaults = &*DEFAULT_STYLE;
        let mut node = defaults.node.clone();
        node.extend(patch.node.iter().map(|(k, v)| (k.clone(), *v)));
        GraphStyle {
            background: patch.background.unwrap_or(defaults.background),
            font_size: patch.font_size.unwrap_or(defaults.font_size),
            font_family: patch
                .font_family
                .clone()
                .unwrap_or_else(|| defaults.font_family.clone()),
            line_color: patch
                .line_color
                .or_else(|| patch.node.get(NOTE_LABEL).copied())
                .unwrap_or(defaults.line_color),
            line_width: patch.line_width.unwrap_or(defaults.line_width),
            particle_width: patch.particle_width.unwrap_or(defaults.particle_width),
            highlighted_foreground: patch
                .highlighted_foreground
                .unwrap_or(defaults.highlighted_foreground),
            node,
            show_structural_links: patch
                .show_structural_links
                .unwrap_or(defaults.show_structural_links),
            show_reference_links: patch
                .show_reference_links
                .unwrap_or(defaults.show_reference_links),
            structural_line_color: patch
                .structural_line_color
                .unwrap_or(defaults.structural_line_color),
            structural_force_strength: patch
                .structural_force_strength
                .unwrap_or(defaults.structural_force_strength),
        }
    }

    pub fn type_color(&self, group: &str) -> Color {
        self.node
            .get(group)
            .or_else(|| self.node.get(NOTE_LABEL))
            .copied()
            .unwrap_or(DEFAULT_STYLE.line_color)
    }

    /// Whether links of `kind` are drawn at all. Tag links follow the tag type filter.
    pub fn shows_link(&self, kind: EdgeKind, tags_visible: bool) -> bool {
        match kind {
            EdgeKind::Structural => self.show_structural_links,
            EdgeKind::Reference => self.show_reference_links,
            EdgeKind::Tag => tags_visible,
        }
    }

    pub fn node_colors(&self, node: &Node, state: DisplayState) -> NodeColors {
        let type_fill = node
            .properties
            .get(COLOR_PROPERTY)
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<Color>().ok())
            .unwrap_or_else(|| self.type_color(node.group.as_str()));
        match state {
            DisplayState::Regular => NodeColors {
                fill: type_fill,
                border: type_fill,
            },
            DisplayState::Lessened => {
                let faded = type_fill.with_opacity(LESSENED_NODE_OPACITY);
                NodeColors {
                    fill: faded,
                    border: faded,
                }
            }
            DisplayState::Highlighted => NodeColors {
                fill: type_fill,
                border: self.highlighted_foreground,
            },
            DisplayState::Hidden => {
                let hidden = type_fill.with_opacity(0.0);
                NodeColors {
                    fill: hidden,
                    border: hidden,
                }
            }
        }
    }

    /// Stroke colour of a link. `both_tags` is set when both endpoints are tag nodes.
    pub fn link_color(
        &self,
        edge: &Edge,
        state: DisplayState,
        both_tags: bool,
        tags_visible: bool,
    ) -> Color {
        let base = match edge.kind {
            EdgeKind::Structural if self.show_structural_links => {
                return self.structural_line_color;
            }
            EdgeKind::Reference if self.show_reference_links => {
                if both_tags {
                    self.type_color(TAG_LABEL)
                } else {
                    self.line_color
                }
            }
            EdgeKind::Tag if tags_visible => self.type_color(TAG_LABEL),
            _ => return Color::TRANSPARENT,
        };
        match state {
            DisplayState::Regular => base,
            DisplayState::Highlighted => self.highlighted_foreground,
            DisplayState::Lessened => {
                let line = if edge.kind == EdgeKind::Tag {
                    base
                } else {
                    self.line_color
                };
                line.with_opacity(LESSENED_LINK_OPACITY)
            }
            DisplayState::Hidden => Color::TRANSPARENT,
        }
    }

    pub fn link_width(&self, kind: EdgeKind) -> f32 {
        match kind {
            EdgeKind::Structural => STRUCTURAL_LINK_WIDTH,
            _ => self.line_width,
        }
    }

    pub fn particle_width(&self, state: DisplayState) -> f32 {
        match state {
            DisplayState::Highlighted => self.particle_width,
            _ => 0.0,
        }
    }

    /// Force strength override for the layout engine; `None` keeps the layout default.
    pub fn link_strength(&self, kind: EdgeKind) -> Option<f32> {
        match kind {
            EdgeKind::Structural if self.show_structural_links => {
                Some(self.structural_force_strength)
            }
            _ => None,
        }
    }
}

fn scale_linear(value: f32, domain: (f32, f32), range: (f32, f32)) -> f32 {
    let t = ((value - domain.0) / (domain.1 - domain.0)).clamp(0.0, 1.0);
    range.0 + t * (range.1 - range.0)
}

/// Node radius from its neighbour count.
pub fn node_size(neighbors: usize) -> f32 {
    scale_linear(neighbors as f32, (0.0, 30.0), (0.5, 2.0))
}

/// Base label opacity at a zoom level.
pub fn label_opacity(zoom: f32) -> f32 {
    scale_linear(zoom, (1.2, 2.0), (0.0, 1.0))
}

/// Label colour for a node drawn with `fill`.
pub fn label_color(fill: Color, state: DisplayState, zoom: f32) -> Color {
    let opacity = match state {
        DisplayState::Regular => label_opacity(zoom),
        DisplayState::Highlighted => 1.0,
        DisplayState::Lessened => label_opacity(zoom).min(fill.opacity()),
        DisplayState::Hidden => 0.0,
    };
    fill.with_opacity(opacity)
}

pub fn label_visible<S: AsRef<str>>(node: &Node, zoom: f32, index_names: &[S]) -> bool {
    zoom >= LABEL_ZOOM_THRESHOLD || node.kind().always_labelled() || node.is_index_document(index_names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{nodeid::NodeId, workspace::Note};
    use test_log::test;

    #[test]
    fn test_color_parsing() {
        assert_eq!("#888".parse::<Color>().unwrap(), Color::rgb(0x88, 0x88, 0x88));
        assert_eq!(
            "#277DA1".parse::<Color>().unwrap(),
            Color::rgb(0x27, 0x7d, 0xa1)
        );
        assert_eq!(
            "rgba(0,0,0,0)".parse::<Color>().unwrap(),
            Color::TRANSPARENT
        );
        assert_eq!(
            "rgb(255, 0, 0)".parse::<Color>().unwrap(),
            "red".parse::<Color>().unwrap()
        );
        assert!("#12".parse::<Color>().is_err());
        assert!("blurple".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_value_equality_and_display() {
        let a = Color::rgb(1, 2, 3).with_opacity(0.5);
        let b = "#01020380".parse::<Color>().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "#01020380");
        assert_eq!(Color::rgb(1, 2, 3).to_string(), "#010203");
        let json = serde_json::to_string(&Color::rgb(255, 255, 255)).unwrap();
        assert_eq!(json, "\"#ffffff\"");
    }

    #[test]
    fn test_merged_style_layers_patch() {
        let patch = StylePatch {
            node: BTreeMap::from([("note".to_string(), Color::rgb(1, 1, 1))]),
            show_structural_links: Some(false),
            ..Default::default()
        };
        let style = GraphStyle::merged(&patch);
        assert_eq!(style.line_color, Color::rgb(1, 1, 1));
        assert_eq!(style.type_color("note"), Color::rgb(1, 1, 1));
        assert_eq!(style.type_color("tag"), DEFAULT_STYLE.type_color("tag"));
        assert_eq!(style.type_color("project"), Color::rgb(1, 1, 1));
        assert!(!style.show_structural_links);
        assert_eq!(style.link_strength(EdgeKind::Structural), None);

        let explicit = StylePatch {
            line_color: Some(Color::rgb(2, 2, 2)),
            ..patch
        };
        assert_eq!(GraphStyle::merged(&explicit).line_color, Color::rgb(2, 2, 2));
    }

    #[test]
    fn test_node_colors_by_state() {
        let style = GraphStyle::default();
        let node = Node::from_note(&Note::new("/ws/a.md"), 24);
        let note_color = style.type_color("note");
        assert_eq!(
            style.node_colors(&node, DisplayState::Regular),
            NodeColors {
                fill: note_color,
                border: note_color
            }
        );
        let lessened = style.node_colors(&node, DisplayState::Lessened);
        assert_eq!(lessened.fill.a, 13);
        let highlighted = style.node_colors(&node, DisplayState::Highlighted);
        assert_eq!(highlighted.border, style.highlighted_foreground);
        assert!(style
            .node_colors(&node, DisplayState::Hidden)
            .fill
            .is_transparent());

        let custom = Node::from_note(&Note::new("/ws/b.md").with_property("color", "#ff0000"), 24);
        assert_eq!(
            style.node_colors(&custom, DisplayState::Regular).fill,
            Color::rgb(255, 0, 0)
        );
    }

    #[test]
    fn test_link_color_and_geometry() {
        let style = GraphStyle::default();
        let a = NodeId::Note("/a".into());
        let b = NodeId::Note("/b".into());
        let reference = Edge::new(a.clone(), b.clone(), EdgeKind::Reference);
        let structural = Edge::new(a.clone(), b.clone(), EdgeKind::Structural);
        let tag = Edge::new(a, NodeId::Tag("t".into()), EdgeKind::Tag);

        assert_eq!(
            style.link_color(&structural, DisplayState::Lessened, false, true),
            style.structural_line_color
        );
        assert_eq!(
            style.link_color(&reference, DisplayState::Regular, false, true),
            style.line_color
        );
        assert_eq!(
            style.link_color(&reference, DisplayState::Highlighted, false, true),
            style.highlighted_foreground
        );
        assert_eq!(
            style.link_color(&reference, DisplayState::Lessened, false, true).a,
            128
        );
        assert_eq!(
            style.link_color(&tag, DisplayState::Regular, false, false),
            Color::TRANSPARENT
        );
        assert_eq!(
            style.link_color(&tag, DisplayState::Regular, false, true),
            style.type_color("tag")
        );
        assert_eq!(style.link_width(EdgeKind::Structural), 2.5);
        assert_eq!(style.link_width(EdgeKind::Reference), style.line_width);
        assert_eq!(style.particle_width(DisplayState::Regular), 0.0);
        assert_eq!(style.link_strength(EdgeKind::Structural), Some(1.0));
        assert_eq!(style.link_strength(EdgeKind::Reference), None);
    }

    #[test]
    fn test_scales_clamp() {
        assert_eq!(node_size(0), 0.5);
        assert_eq!(node_size(15), 1.25);
        assert_eq!(node_size(100), 2.0);
        assert_eq!(label_opacity(1.0), 0.0);
        assert!((label_opacity(1.6) - 0.5).abs() < 1e-5);
        assert_eq!(label_opacity(3.0), 1.0);
    }

    #[test]
    fn test_label_visibility() {
        let names = ["README.md", "index.md"];
        let note = Node::from_note(&Note::new("/ws/a.md"), 24);
        let readme = Node::from_note(&Note::new("/ws/README.md"), 24);
        let folder = Node::folder("/ws/f", "f", 24);
        assert!(!label_visible(&note, 0.2, &names));
        assert!(label_visible(&note, 0.5, &names));
        assert!(label_visible(&readme, 0.2, &names));
        assert!(label_visible(&folder, 0.2, &names));
    }
}
