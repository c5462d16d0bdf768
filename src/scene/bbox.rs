//! Maps local-space bounding boxes through a transform list.
//!
//! The result is a conservative axis-aligned box in the ambient space: exact
//! under translate + scale, an over-approximation under rotation. Per-node
//! pivots are ignored here (scale and rotation are taken about `(0, 0)`),
//! which differs from how [`TransformList::apply`] places pixels. The box
//! feeds invalidation only.

use super::transform::TransformList;
use crate::util::{BoundingBox, Point, bounds_of_points};

/// Applies the net scale, then the net rotation, then the net translation
/// of `transforms` to `point`.
pub fn transform_point(point: Point, transforms: &TransformList) -> Point {
    let net = transforms.accumulate();

    let mut x = point.x * net.scale_x;
    let mut y = point.y * net.scale_y;

    if net.angle != 0.0 {
        let (sin, cos) = net.angle.sin_cos();
        let rx = x * cos - y * sin;
        let ry = x * sin + y * cos;
        x = rx;
        y = ry;
    }

    Point::new(x + net.translate_x, y + net.translate_y)
}

/// Transforms the four corners of `bbox` and returns their axis-aligned bounds.
///
/// An empty transform list returns `bbox` unchanged.
pub fn transform_box(bbox: BoundingBox, transforms: &TransformList) -> BoundingBox {
    if transforms.is_empty() {
        return bbox;
    }

    let corners = bbox.corners().map(|corner| transform_point(corner, transforms));
    bounds_of_points(&corners).unwrap_or(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::transform::{TransformStep, TransformSpec, compose};
    use crate::scene::transform::AccumulatedTransform;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-6;

    fn assert_box_close(actual: BoundingBox, expected: BoundingBox) {
        assert!((actual.x - expected.x).abs() < EPS, "x: {actual:?} vs {expected:?}");
        assert!((actual.y - expected.y).abs() < EPS, "y: {actual:?} vs {expected:?}");
        assert!((actual.width - expected.width).abs() < EPS, "w: {actual:?} vs {expected:?}");
        assert!((actual.height - expected.height).abs() < EPS, "h: {actual:?} vs {expected:?}");
    }

    #[test]
    fn empty_list_is_identity() {
        for bbox in [
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            BoundingBox::new(-3.5, 7.25, 0.0, 4.0),
            BoundingBox::new(1e6, -1e6, 2.0, 0.0),
        ] {
            assert_eq!(transform_box(bbox, &TransformList::empty()), bbox);
        }
    }

    #[test]
    fn translate_and_scale_are_exact() {
        let (_, list) = compose(
            &TransformSpec {
                translate: Some(crate::scene::Translate { x: 5.0, y: -5.0 }),
                scale: Some(crate::scene::Scale {
                    x: 2.0,
                    y: 3.0,
                    origin: None,
                }),
                rotate: None,
            },
            &AccumulatedTransform::IDENTITY,
        );
        let out = transform_box(BoundingBox::new(1.0, 1.0, 4.0, 2.0), &list);
        assert_box_close(out, BoundingBox::new(7.0, -2.0, 8.0, 6.0));
    }

    #[test]
    fn scale_then_quarter_turn() {
        let list = TransformList::from_steps(vec![
            TransformStep::Scale {
                x: 2.0,
                y: 2.0,
                origin: None,
            },
            TransformStep::Rotate {
                angle: FRAC_PI_2,
                origin: None,
            },
        ]);
        let out = transform_box(BoundingBox::new(0.0, 0.0, 10.0, 10.0), &list);
        assert_box_close(out, BoundingBox::new(-20.0, 0.0, 20.0, 20.0));
    }

    #[test]
    fn rotation_over_approximates() {
        let list = TransformList::from_steps(vec![TransformStep::Rotate {
            angle: std::f64::consts::FRAC_PI_4,
            origin: None,
        }]);
        let out = transform_box(BoundingBox::new(-1.0, -1.0, 2.0, 2.0), &list);
        let diagonal = 2.0_f64.sqrt() * 2.0;
        assert_box_close(
            out,
            BoundingBox::new(-diagonal / 2.0, -diagonal / 2.0, diagonal, diagonal),
        );
    }

    #[test]
    fn degenerate_box_stays_degenerate() {
        let (_, list) = compose(&TransformSpec::scale(4.0, 4.0), &AccumulatedTransform::IDENTITY);
        let out = transform_box(BoundingBox::new(2.0, 2.0, 0.0, 0.0), &list);
        assert!(out.is_degenerate());
        assert_box_close(out, BoundingBox::new(8.0, 8.0, 0.0, 0.0));
    }

    #[test]
    fn pivots_are_ignored() {
        let pivoted = TransformList::from_steps(vec![TransformStep::Scale {
            x: 2.0,
            y: 2.0,
            origin: Some(Point::new(50.0, 50.0)),
        }]);
        let plain = TransformList::from_steps(vec![TransformStep::Scale {
            x: 2.0,
            y: 2.0,
            origin: None,
        }]);
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(transform_box(bbox, &pivoted), transform_box(bbox, &plain));
    }
}
