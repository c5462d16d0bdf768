//! Cairo-based rendering functions for shapes.

use super::color::Color;
use super::context::DrawContext;
use super::image::ImageAsset;
use super::shape::{Shape, TextAlign, TextBaseline};
use super::text::{create_layout, layout_metrics};
use crate::error::DrawError;
use crate::util::Point;
use std::f64::consts::PI;

/// Renders a single shape.
///
/// `image` is the preloaded asset for [`Shape::Image`]; it is ignored for
/// every other variant. All colors are scaled by the context's global alpha.
pub fn render_shape(
    ctx: &DrawContext,
    shape: &Shape,
    image: Option<&ImageAsset>,
) -> Result<(), DrawError> {
    match shape {
        Shape::Circle {
            cx,
            cy,
            radius,
            fill,
            stroke,
            line_width,
        } => {
            let cr = ctx.cairo();
            cr.new_path();
            cr.arc(*cx, *cy, radius.max(0.0), 0.0, PI * 2.0);
            fill_and_stroke(ctx, *fill, *stroke, *line_width)
        }
        Shape::Ellipse {
            cx,
            cy,
            radius_x,
            radius_y,
            rotation,
            fill,
            stroke,
            line_width,
        } => render_ellipse(
            ctx,
            *cx,
            *cy,
            *radius_x,
            *radius_y,
            *rotation,
            *fill,
            *stroke,
            *line_width,
        ),
        Shape::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
            line_width,
        } => {
            let cr = ctx.cairo();
            cr.new_path();
            cr.rectangle(*x, *y, *width, *height);
            fill_and_stroke(ctx, *fill, *stroke, *line_width)
        }
        Shape::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
            line_width,
        } => {
            let cr = ctx.cairo();
            cr.new_path();
            cr.move_to(*x1, *y1);
            cr.line_to(*x2, *y2);
            fill_and_stroke(ctx, None, *stroke, *line_width)
        }
        Shape::Polygon {
            points,
            closed,
            fill,
            stroke,
            line_width,
        } => render_polygon(ctx, points, *closed, *fill, *stroke, *line_width),
        Shape::Text {
            x,
            y,
            text,
            font,
            align,
            baseline,
            max_width,
            fill,
            stroke,
            line_width,
        } => render_text(
            ctx,
            TextRun {
                x: *x,
                y: *y,
                text,
                font,
                align: *align,
                baseline: *baseline,
                max_width: *max_width,
            },
            *fill,
            *stroke,
            *line_width,
        ),
        Shape::Image {
            x, y, width, height, ..
        } => {
            let Some(asset) = image else {
                return Ok(());
            };
            let Some(surface) = asset.surface() else {
                return Ok(());
            };
            let w = width.unwrap_or(asset.natural_width());
            let h = height.unwrap_or(asset.natural_height());
            ctx.paint_image(surface, *x, *y, w, h)?;
            Ok(())
        }
    }
}

/// Fills then strokes the current path, and always clears it afterwards.
fn fill_and_stroke(
    ctx: &DrawContext,
    fill: Option<Color>,
    stroke: Option<Color>,
    line_width: f64,
) -> Result<(), DrawError> {
    let cr = ctx.cairo();
    if let Some(color) = fill {
        ctx.set_source_color(color);
        cr.fill_preserve()?;
    }
    if let Some(color) = stroke {
        if line_width > 0.0 {
            ctx.set_source_color(color);
            cr.set_line_width(line_width);
            cr.stroke_preserve()?;
        }
    }
    cr.new_path();
    Ok(())
}

/// Render an ellipse using Cairo's arc with scaling
#[allow(clippy::too_many_arguments)]
fn render_ellipse(
    ctx: &DrawContext,
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    rotation: f64,
    fill: Option<Color>,
    stroke: Option<Color>,
    line_width: f64,
) -> Result<(), DrawError> {
    if rx <= 0.0 || ry <= 0.0 {
        return Ok(());
    }

    let cr = ctx.cairo();
    cr.new_path();
    cr.save()?;
    cr.translate(cx, cy);
    cr.rotate(rotation);
    cr.scale(rx, ry);
    cr.arc(0.0, 0.0, 1.0, 0.0, 2.0 * PI);
    cr.restore()?;

    fill_and_stroke(ctx, fill, stroke, line_width)
}

fn render_polygon(
    ctx: &DrawContext,
    points: &[Point],
    closed: Option<bool>,
    fill: Option<Color>,
    stroke: Option<Color>,
    line_width: f64,
) -> Result<(), DrawError> {
    let closed = closed.unwrap_or(fill.is_some());
    let required = if closed { 3 } else { 2 };
    if points.len() < required {
        return Ok(());
    }

    let cr = ctx.cairo();
    cr.new_path();
    cr.move_to(points[0].x, points[0].y);
    for point in &points[1..] {
        cr.line_to(point.x, point.y);
    }
    if closed {
        cr.close_path();
    }

    let fill = if closed { fill } else { None };
    fill_and_stroke(ctx, fill, stroke, line_width)
}

struct TextRun<'a> {
    x: f64,
    y: f64,
    text: &'a str,
    font: &'a str,
    align: TextAlign,
    baseline: TextBaseline,
    max_width: Option<f64>,
}

/// Renders a text run anchored at `(x, y)` using Pango.
///
/// The run is positioned by its alignment and baseline, and squeezed
/// horizontally about the anchor when it is wider than `max_width`.
fn render_text(
    ctx: &DrawContext,
    run: TextRun<'_>,
    fill: Option<Color>,
    stroke: Option<Color>,
    line_width: f64,
) -> Result<(), DrawError> {
    if run.text.is_empty() {
        return Ok(());
    }
    if matches!(run.max_width, Some(max) if max <= 0.0 || max.is_nan()) {
        return Ok(());
    }

    let cr = ctx.cairo();
    cr.save()?;
    let drawn = (|| -> Result<(), DrawError> {
        let layout = create_layout(cr, run.text, run.font);
        let metrics = layout_metrics(&layout);

        cr.translate(run.x, run.y);
        if let Some(max) = run.max_width {
            if metrics.width > max && metrics.width > 0.0 {
                cr.scale(max / metrics.width, 1.0);
            }
        }

        let left = -run.align.offset(metrics.width);
        let top = match run.baseline {
            TextBaseline::Top | TextBaseline::Hanging => 0.0,
            TextBaseline::Middle => -metrics.logical_height / 2.0,
            TextBaseline::Bottom | TextBaseline::Ideographic => -metrics.logical_height,
            TextBaseline::Alphabetic => -metrics.baseline,
        };

        if let Some(color) = fill {
            ctx.set_source_color(color);
            cr.move_to(left, top);
            pangocairo::functions::show_layout(cr, &layout);
        }

        if let Some(color) = stroke {
            if line_width > 0.0 {
                cr.new_path();
                cr.move_to(left, top);
                pangocairo::functions::layout_path(cr, &layout);
                ctx.set_source_color(color);
                cr.set_line_width(line_width);
                cr.stroke()?;
            }
        }
        cr.new_path();
        Ok(())
    })();
    cr.restore()?;
    drawn
}
