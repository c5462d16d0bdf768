//! Drawable shape definitions and their local-space bounding boxes.

use super::color::{Color, WHITE};
use super::image::{ImageAsset, ImageCache};
use super::text::{DEFAULT_FONT, MetricsCache, TextMetrics};
use crate::util::{BoundingBox, Point, bounds_of_points};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Horizontal anchor of a text run relative to its `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Start,
    Left,
    Center,
    End,
    Right,
}

impl TextAlign {
    /// Distance from the anchor back to the left edge for a run of `width`.
    pub fn offset(self, width: f64) -> f64 {
        match self {
            TextAlign::Start | TextAlign::Left => 0.0,
            TextAlign::Center => width / 2.0,
            TextAlign::End | TextAlign::Right => width,
        }
    }
}

/// Vertical anchor of a text run relative to its `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TextBaseline {
    #[default]
    Alphabetic,
    Top,
    Hanging,
    Middle,
    Ideographic,
    Bottom,
}

/// Represents a drawable primitive.
///
/// Coordinates are in the local space of the enclosing transform. Colors left
/// unset are not painted; circles and ellipses fill white unless told otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Circle {
        #[serde(default)]
        cx: f64,
        #[serde(default)]
        cy: f64,
        radius: f64,
        #[serde(default = "default_fill")]
        fill: Option<Color>,
        #[serde(default)]
        stroke: Option<Color>,
        #[serde(default = "default_line_width")]
        line_width: f64,
    },
    Ellipse {
        #[serde(default)]
        cx: f64,
        #[serde(default)]
        cy: f64,
        radius_x: f64,
        radius_y: f64,
        /// Rotation in radians about the center.
        #[serde(default)]
        rotation: f64,
        #[serde(default = "default_fill")]
        fill: Option<Color>,
        #[serde(default)]
        stroke: Option<Color>,
        #[serde(default = "default_line_width")]
        line_width: f64,
    },
    Rect {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        width: f64,
        height: f64,
        #[serde(default)]
        fill: Option<Color>,
        #[serde(default)]
        stroke: Option<Color>,
        #[serde(default = "default_line_width")]
        line_width: f64,
    },
    /// Invisible unless `stroke` is set.
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        #[serde(default)]
        stroke: Option<Color>,
        #[serde(default = "default_line_width")]
        line_width: f64,
    },
    Polygon {
        points: Vec<Point>,
        /// Defaults to closed when a fill is given.
        #[serde(default)]
        closed: Option<bool>,
        #[serde(default)]
        fill: Option<Color>,
        #[serde(default)]
        stroke: Option<Color>,
        #[serde(default = "default_line_width")]
        line_width: f64,
    },
    Text {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        text: String,
        #[serde(default = "default_font")]
        font: String,
        #[serde(default)]
        align: TextAlign,
        #[serde(default)]
        baseline: TextBaseline,
        #[serde(default)]
        max_width: Option<f64>,
        #[serde(default)]
        fill: Option<Color>,
        #[serde(default)]
        stroke: Option<Color>,
        #[serde(default = "default_line_width")]
        line_width: f64,
    },
    /// PNG image; natural size is used for any omitted dimension.
    Image {
        src: PathBuf,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        height: Option<f64>,
    },
}

fn default_fill() -> Option<Color> {
    Some(WHITE)
}

fn default_line_width() -> f64 {
    1.0
}

fn default_font() -> String {
    DEFAULT_FONT.to_string()
}

/// Caches shared by every shape declaration.
#[derive(Debug, Default)]
pub struct ShapeResources {
    pub metrics: MetricsCache,
    pub images: ImageCache,
}

impl ShapeResources {
    /// Resources resolving relative image paths against `asset_dir`.
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            metrics: MetricsCache::new(),
            images: ImageCache::new(asset_dir),
        }
    }
}

/// Stroke padding for shapes that only grow when a stroke is actually drawn.
fn stroke_extent(stroke: &Option<Color>, line_width: f64) -> f64 {
    if stroke.is_some() && line_width > 0.0 {
        line_width
    } else {
        0.0
    }
}

impl Shape {
    /// Returns the image asset this shape paints, loading it if needed.
    pub fn image_asset(&self, resources: &mut ShapeResources) -> Option<ImageAsset> {
        match self {
            Shape::Image { src, .. } => Some(resources.images.load(src)),
            _ => None,
        }
    }

    /// Computes the local-space bounding box.
    ///
    /// Text measures through the metrics cache (zero-size box when it cannot
    /// be measured); images use their natural size for omitted dimensions.
    pub fn bounding_box(&self, resources: &mut ShapeResources) -> BoundingBox {
        match self {
            Shape::Circle {
                cx,
                cy,
                radius,
                line_width,
                ..
            } => {
                let half = line_width / 2.0;
                let size = radius * 2.0 + line_width;
                BoundingBox::new(cx - radius - half, cy - radius - half, size, size)
            }
            Shape::Ellipse {
                cx,
                cy,
                radius_x,
                radius_y,
                rotation,
                line_width,
                ..
            } => ellipse_box(*cx, *cy, *radius_x, *radius_y, *rotation, *line_width),
            Shape::Rect {
                x,
                y,
                width,
                height,
                stroke,
                line_width,
                ..
            } => {
                let extent = stroke_extent(stroke, *line_width);
                BoundingBox::new(
                    x - extent / 2.0,
                    y - extent / 2.0,
                    width + extent,
                    height + extent,
                )
            }
            Shape::Line {
                x1,
                y1,
                x2,
                y2,
                line_width,
                ..
            } => BoundingBox::from_min_max(x1.min(*x2), y1.min(*y2), x1.max(*x2), y1.max(*y2))
                .inflate(line_width / 2.0),
            Shape::Polygon {
                points,
                stroke,
                line_width,
                ..
            } => match bounds_of_points(points) {
                Some(bounds) => bounds.inflate(stroke_extent(stroke, *line_width) / 2.0),
                None => BoundingBox::default(),
            },
            Shape::Text {
                x,
                y,
                text,
                font,
                align,
                baseline,
                max_width,
                stroke,
                line_width,
                ..
            } => match resources.metrics.measure(text, font) {
                Some(metrics) => text_box(
                    *x,
                    *y,
                    &metrics,
                    *align,
                    *baseline,
                    *max_width,
                    stroke_extent(stroke, *line_width),
                ),
                None => BoundingBox::new(*x, *y, 0.0, 0.0),
            },
            Shape::Image {
                x,
                y,
                width,
                height,
                ..
            } => {
                let asset = self.image_asset(resources).unwrap_or_else(ImageAsset::missing);
                BoundingBox::new(
                    *x,
                    *y,
                    width.unwrap_or(asset.natural_width()),
                    height.unwrap_or(asset.natural_height()),
                )
            }
        }
    }
}

/// Ellipse bounds; under rotation the four axis end points are rotated and
/// their extent taken.
fn ellipse_box(cx: f64, cy: f64, rx: f64, ry: f64, rotation: f64, line_width: f64) -> BoundingBox {
    let half = line_width / 2.0;
    if rotation == 0.0 {
        return BoundingBox::new(
            cx - rx - half,
            cy - ry - half,
            rx * 2.0 + line_width,
            ry * 2.0 + line_width,
        );
    }

    let (sin, cos) = rotation.sin_cos();
    let rotated = [(rx, 0.0), (-rx, 0.0), (0.0, ry), (0.0, -ry)]
        .map(|(px, py)| Point::new(px * cos - py * sin, px * sin + py * cos));
    match bounds_of_points(&rotated) {
        Some(bounds) => BoundingBox::new(
            cx + bounds.x - half,
            cy + bounds.y - half,
            bounds.width + line_width,
            bounds.height + line_width,
        ),
        None => BoundingBox::new(cx, cy, 0.0, 0.0),
    }
}

fn text_box(
    x: f64,
    y: f64,
    metrics: &TextMetrics,
    align: TextAlign,
    baseline: TextBaseline,
    max_width: Option<f64>,
    stroke_extent: f64,
) -> BoundingBox {
    let mut width = metrics.width;
    let height = metrics.ink_height();
    let mut box_x = x - align.offset(width);
    let box_y = match baseline {
        TextBaseline::Middle => y - height / 2.0,
        TextBaseline::Bottom | TextBaseline::Ideographic => y - height,
        TextBaseline::Top | TextBaseline::Hanging => y,
        TextBaseline::Alphabetic => y - metrics.ascent,
    };

    if let Some(max) = max_width {
        if max < width {
            box_x += align.offset(width) - align.offset(max);
            width = max;
        }
    }

    BoundingBox::new(
        box_x - stroke_extent / 2.0,
        box_y - stroke_extent / 2.0,
        width + stroke_extent,
        height + stroke_extent,
    )
}
