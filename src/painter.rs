//! Per-frame draw batching.
//!
//! A [Painter] collects circles and labels while the frame's nodes are visited, then flushes
//! them to a [DrawSurface] grouped by colour so the surface sees one colour switch per group.

use std::collections::BTreeMap;

use crate::style::Color;

/// Stroke width used for node outlines.
pub const OUTLINE_WIDTH: f32 = 0.5;
/// Fill radius relative to the outline radius.
pub const FILL_RATIO: f32 = 0.8;

/// The drawing primitives a render target must provide.
pub trait DrawSurface {
    fn set_color(&mut self, color: Color);
    fn set_font(&mut self, size: f32, family: &str);
    fn stroke_circle(&mut self, x: f32, y: f32, radius: f32, line_width: f32);
    fn fill_circle(&mut self, x: f32, y: f32, radius: f32);
    fn fill_text(&mut self, text: &str, x: f32, y: f32);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Circle {
    x: f32,
    y: f32,
    radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Label {
    text: String,
    x: f32,
    y: f32,
    size: f32,
    family: String,
    color: Color,
}

#[derive(Debug, Default)]
pub struct Painter {
    outlines: BTreeMap<Color, Vec<Circle>>,
    fills: BTreeMap<Color, Vec<Circle>>,
    labels: Vec<Label>,
}

impl Painter {
    pub fn new() -> Self {
        Painter::default()
    }

    /// Queue a node disc: an outline at `radius` in `border` and a fill at 80% of `radius`.
    pub fn circle(&mut self, x: f32, y: f32, radius: f32, fill: Color, border: Color) -> &mut Self {
        if !border.is_transparent() {
            self.outlines
                .entry(border)
                .or_default()
                .push(Circle { x, y, radius });
        }
        if !fill.is_transparent() {
            self.fills.entry(fill).or_default().push(Circle {
                x,
                y,
                radius: radius * FILL_RATIO,
            });
        }
        self
    }

    pub fn text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        size: f32,
        family: &str,
        color: Color,
    ) -> &mut Self {
        if !color.is_transparent() {
            self.labels.push(Label {
                text: text.to_string(),
                x,
                y,
                size,
                family: family.to_string(),
                color,
            });
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.outlines.is_empty() && self.fills.is_empty() && self.labels.is_empty()
    }

    /// Number of queued primitives.
    pub fn len(&self) -> usize {
        self.outlines.values().map(Vec::len).sum::<usize>()
            + self.fills.values().map(Vec::len).sum::<usize>()
            + self.labels.len()
    }

    /// Flush outlines, then fills, then labels, and clear the buffers.
    pub fn paint<S: DrawSurface + ?Sized>(&mut self, surface: &mut S) {
        for (color, circles) in std::mem::take(&mut self.outlines) {
            surface.set_color(color);
            for c in circles {
                surface.stroke_circle(c.x, c.y, c.radius, OUTLINE_WIDTH);
            }
        }
        for (color, circles) in std::mem::take(&mut self.fills) {
            surface.set_color(color);
            for c in circles {
                surface.fill_circle(c.x, c.y, c.radius);
            }
        }
        let mut color: Option<Color> = None;
        let mut font: Option<(f32, String)> = None;
        for label in std::mem::take(&mut self.labels) {
            if color != Some(label.color) {
                surface.set_color(label.color);
                color = Some(label.color);
            }
            let same_font = font
                .as_ref()
                .map(|(size, family)| *size == label.size && *family == label.family)
                .unwrap_or(false);
            if !same_font {
                surface.set_font(label.size, &label.family);
                font = Some((label.size, label.family.clone()));
            }
            surface.fill_text(&label.text, label.x, label.y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Color(Color),
        Font(f32, String),
        Stroke(f32),
        Fill(f32),
        Text(String),
    }

    #[derive(Default)]
    struct Recorder(Vec<Call>);

    impl DrawSurface for Recorder {
        fn set_color(&mut self, color: Color) {
            self.0.push(Call::Color(color));
        }
        fn set_font(&mut self, size: f32, family: &str) {
            self.0.push(Call::Font(size, family.to_string()));
        }
        fn stroke_circle(&mut self, _x: f32, _y: f32, radius: f32, _line_width: f32) {
            self.0.push(Call::Stroke(radius));
        }
        fn fill_circle(&mut self, _x: f32, _y: f32, radius: f32) {
            self.0.push(Call::Fill(radius));
        }
        fn fill_text(&mut self, text: &str, _x: f32, _y: f32) {
            self.0.push(Call::Text(text.to_string()));
        }
    }

    #[test]
    fn test_flush_groups_by_color_value() {
        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);
        let mut painter = Painter::new();
        painter
            .circle(0.0, 0.0, 1.0, red, blue)
            .circle(1.0, 1.0, 2.0, Color::rgb(255, 0, 0), blue)
            .text("a", 0.0, 0.0, 10.0, "Sans", red)
            .text("b", 0.0, 0.0, 10.0, "Sans", red)
            .text("c", 0.0, 0.0, 10.0, "Sans", blue);
        let mut surface = Recorder::default();
        painter.paint(&mut surface);
        assert_eq!(
            surface.0,
            vec![
                Call::Color(blue),
                Call::Stroke(1.0),
                Call::Stroke(2.0),
                Call::Color(red),
                Call::Fill(0.8),
                Call::Fill(1.6),
                Call::Color(red),
                Call::Font(10.0, "Sans".to_string()),
                Call::Text("a".to_string()),
                Call::Text("b".to_string()),
                Call::Color(blue),
                Call::Text("c".to_string()),
            ]
        );
        assert!(painter.is_empty());
    }

    #[test]
    fn test_transparent_primitives_are_dropped() {
        let mut painter = Painter::new();
        painter.circle(0.0, 0.0, 1.0, Color::TRANSPARENT, Color::TRANSPARENT);
        painter.text("hidden", 0.0, 0.0, 10.0, "Sans", Color::rgb(1, 2, 3).with_opacity(0.0));
        assert!(painter.is_empty());
        painter.circle(0.0, 0.0, 1.0, Color::TRANSPARENT, Color::rgb(1, 1, 1));
        assert_eq!(painter.len(), 1);
        let mut surface = Recorder::default();
        painter.paint(&mut surface);
        painter.paint(&mut surface);
        assert_eq!(surface.0.len(), 2);
    }
}
