use layerkit::Engine;
use layerkit::draw::{BLUE, Color, DrawContext, GREEN, RED, Shape, WHITE, render_shape};
use layerkit::error::{DrawError, RegistryError};
use layerkit::registry::{
    ImageCanvas, PrimitiveId, PrimitiveRecord, ShapeParams, SurfaceHandle, SurfaceOptions,
};
use layerkit::render::{CompositeFrame, DrawErrorPolicy, Pixel, read_pixel};
use layerkit::scene::{DeclareScope, GroupSpec};
use layerkit::util::{BoundingBox, Size};
use std::cell::RefCell;
use std::rc::Rc;

fn canvas(width: u32, height: u32) -> ImageCanvas {
    ImageCanvas::new(Size::new(width, height), 1.0).unwrap()
}

fn rect(x: f64, y: f64, width: f64, height: f64, color: Color) -> Shape {
    Shape::Rect {
        x,
        y,
        width,
        height,
        fill: Some(color),
        stroke: None,
        line_width: 1.0,
    }
}

fn rect_record(id: PrimitiveId, surface: &str, z_index: i32, shape: Shape) -> PrimitiveRecord {
    let bbox = match &shape {
        Shape::Rect {
            x,
            y,
            width,
            height,
            ..
        } => BoundingBox::new(*x, *y, *width, *height),
        _ => BoundingBox::default(),
    };
    PrimitiveRecord::new(
        id,
        surface,
        ShapeParams::new(1.0, z_index, bbox),
        move |ctx: &mut DrawContext| render_shape(ctx, &shape, None),
    )
}

fn pixel(engine: &Engine, surface: &str, x: i32, y: i32) -> Pixel {
    let image = engine.registry().surface(surface).unwrap().snapshot().unwrap();
    read_pixel(&image, x, y).unwrap()
}

#[test]
fn primitives_paint_in_ascending_z_order() {
    let mut engine = Engine::new();
    engine.register_surface("main", canvas(10, 10), 1.0, None).unwrap();

    let order = Rc::new(RefCell::new(Vec::new()));
    for z_index in [3, 1, 2] {
        let id = engine.registry_mut().issue_id();
        let seen = Rc::clone(&order);
        let record = PrimitiveRecord::new(
            id,
            "main",
            ShapeParams::new(1.0, z_index, BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
            move |_ctx: &mut DrawContext| {
                seen.borrow_mut().push(z_index);
                Ok(())
            },
        );
        engine.registry_mut().set_primitive(record).unwrap();
    }

    engine.pump().unwrap();
    assert_eq!(*order.borrow(), vec![1, 2, 3]);
}

#[test]
fn later_z_index_covers_earlier_pixels() {
    let mut engine = Engine::new();
    engine.register_surface("main", canvas(10, 10), 1.0, None).unwrap();

    for (z_index, color) in [(2, BLUE), (1, RED)] {
        let id = engine.registry_mut().issue_id();
        let record = rect_record(id, "main", z_index, rect(0.0, 0.0, 10.0, 10.0, color));
        engine.registry_mut().set_primitive(record).unwrap();
    }

    engine.pump().unwrap();
    let top = pixel(&engine, "main", 5, 5);
    assert_eq!((top.r, top.b, top.a), (0, 255, 255));
}

#[test]
fn opacity_multiplies_surface_group_and_primitive() {
    let mut engine = Engine::new();
    engine.register_surface("main", canvas(8, 8), 0.5, None).unwrap();

    let scope = DeclareScope::root()
        .within_surface("main")
        .within_group(&GroupSpec {
            opacity: 0.5,
            ..GroupSpec::default()
        });
    let id = engine.registry_mut().issue_id();
    let shape = rect(0.0, 0.0, 8.0, 8.0, WHITE);
    let record = scope
        .declare(
            id,
            ShapeParams::new(1.0, 0, BoundingBox::new(0.0, 0.0, 8.0, 8.0)),
            move |ctx| render_shape(ctx, &shape, None),
        )
        .unwrap();
    assert_eq!(record.params.opacity, 0.5);
    engine.registry_mut().set_primitive(record).unwrap();

    engine.pump().unwrap();
    let alpha = pixel(&engine, "main", 4, 4).a as i32;
    assert!((alpha - 64).abs() <= 1, "alpha was {alpha}");
}

#[test]
fn primitive_moves_between_surfaces() {
    let mut engine = Engine::new();
    engine.register_surface("a", canvas(10, 10), 1.0, None).unwrap();
    engine.register_surface("b", canvas(10, 10), 1.0, None).unwrap();

    let id = engine.registry_mut().issue_id();
    let shape = rect(0.0, 0.0, 10.0, 10.0, GREEN);
    engine
        .registry_mut()
        .set_primitive(rect_record(id, "a", 0, shape.clone()))
        .unwrap();
    engine.pump().unwrap();
    assert_eq!(pixel(&engine, "a", 5, 5).a, 255);

    engine
        .registry_mut()
        .set_primitive(rect_record(id, "b", 0, shape))
        .unwrap();
    assert_eq!(engine.registry().owner_of(id), Some("b"));
    assert_eq!(engine.registry().primitives_on("a").len(), 0);
    assert_eq!(engine.registry().primitives_on("b").len(), 1);

    let report = engine.pump().unwrap();
    assert_eq!(report.painted, vec!["a".to_string(), "b".to_string()]);
    assert!(pixel(&engine, "a", 5, 5).is_transparent());
    assert_eq!(pixel(&engine, "b", 5, 5).a, 255);
}

#[test]
fn registration_is_idempotent() {
    let mut engine = Engine::new();
    assert!(engine.register_surface("main", canvas(4, 4), 0.25, None).unwrap());
    assert!(!engine.register_surface("main", canvas(8, 8), 1.0, None).unwrap());

    let surface = engine.registry().surface("main").unwrap();
    assert_eq!(engine.registry().surface_count(), 1);
    assert_eq!(surface.opacity(), 0.25);
    assert_eq!(surface.size(), Size::new(4, 4));
}

#[test]
fn unregister_drops_primitives_but_keeps_ids() {
    let mut engine = Engine::new();
    engine.register_surface("main", canvas(4, 4), 1.0, None).unwrap();
    let id = engine.registry_mut().issue_id();
    engine
        .registry_mut()
        .set_primitive(rect_record(id, "main", 0, rect(0.0, 0.0, 4.0, 4.0, RED)))
        .unwrap();

    assert!(engine.registry_mut().unregister_surface("main"));
    assert!(engine.registry().surface("main").is_none());
    assert!(engine.registry().primitive(id).is_none());
    assert!(engine.registry().is_live(id));

    let report = engine.pump().unwrap();
    assert!(report.painted.is_empty());

    let err = engine
        .registry_mut()
        .set_primitive(rect_record(id, "main", 0, rect(0.0, 0.0, 4.0, 4.0, RED)))
        .unwrap_err();
    assert!(matches!(err, RegistryError::MissingRegistry(_)));
}

#[test]
fn resize_discards_pixels_and_repaints_in_full() {
    let mut engine = Engine::new();
    engine.register_surface("main", canvas(10, 10), 1.0, None).unwrap();
    let id = engine.registry_mut().issue_id();
    engine
        .registry_mut()
        .set_primitive(rect_record(id, "main", 0, rect(0.0, 0.0, 10.0, 10.0, RED)))
        .unwrap();
    engine.pump().unwrap();
    assert!(!engine.registry().surface("main").unwrap().is_dirty());

    engine
        .registry_mut()
        .resize_surface("main", Size::new(20, 20))
        .unwrap();
    let surface = engine.registry().surface("main").unwrap();
    assert!(surface.is_dirty());
    assert_eq!(
        surface.pending_regions(),
        vec![BoundingBox::new(0.0, 0.0, 20.0, 20.0)]
    );
    assert!(pixel(&engine, "main", 5, 5).is_transparent());

    engine.pump().unwrap();
    assert_eq!(pixel(&engine, "main", 5, 5).a, 255);
    assert!(pixel(&engine, "main", 15, 15).is_transparent());
}

#[test]
fn compositor_sees_damage_and_skips_implicit_clear() {
    let regions = Rc::new(RefCell::new(Vec::new()));
    let calls = Rc::new(RefCell::new(0));
    let compositor = {
        let regions = Rc::clone(&regions);
        let calls = Rc::clone(&calls);
        move |frame: &mut CompositeFrame<'_>| -> Result<(), DrawError> {
            regions.borrow_mut().push(frame.dirty_regions.to_vec());
            *calls.borrow_mut() += 1;
            if *calls.borrow() == 1 {
                frame.draw_all()?;
            }
            Ok(())
        }
    };

    let mut engine = Engine::new();
    engine
        .register_surface_with(
            "main",
            canvas(10, 10),
            SurfaceOptions::default().with_compositor(compositor),
        )
        .unwrap();
    let first = engine.registry_mut().issue_id();
    engine
        .registry_mut()
        .set_primitive(rect_record(first, "main", 0, rect(0.0, 0.0, 4.0, 4.0, RED)))
        .unwrap();
    engine.pump().unwrap();

    let second = engine.registry_mut().issue_id();
    engine
        .registry_mut()
        .set_primitive(rect_record(second, "main", 0, rect(6.0, 6.0, 2.0, 2.0, RED)))
        .unwrap();
    engine.pump().unwrap();

    let regions = regions.borrow();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0], vec![BoundingBox::new(0.0, 0.0, 10.0, 10.0)]);
    assert_eq!(regions[1], vec![BoundingBox::new(6.0, 6.0, 2.0, 2.0)]);

    assert_eq!(pixel(&engine, "main", 1, 1).a, 255);
    assert!(pixel(&engine, "main", 7, 7).is_transparent());
}

#[test]
fn unbalanced_compositor_state_is_restored() {
    let mut calls = 0;
    let compositor = move |frame: &mut CompositeFrame<'_>| -> Result<(), DrawError> {
        calls += 1;
        if calls == 1 {
            frame.context.save()?;
            frame.context.translate(100.0, 100.0);
            return Ok(());
        }
        frame.draw_all()
    };

    let mut engine = Engine::new();
    engine
        .register_surface("main", canvas(10, 10), 1.0, Some(Box::new(compositor)))
        .unwrap();
    let id = engine.registry_mut().issue_id();
    engine
        .registry_mut()
        .set_primitive(rect_record(id, "main", 0, rect(0.0, 0.0, 10.0, 10.0, RED)))
        .unwrap();
    assert!(engine.pump().unwrap().is_clean());
    assert!(pixel(&engine, "main", 5, 5).is_transparent());

    engine
        .registry_mut()
        .set_surface_opacity("main", 0.5)
        .unwrap();
    assert!(engine.pump().unwrap().is_clean());
    let alpha = pixel(&engine, "main", 5, 5).a as i32;
    assert!((alpha - 128).abs() <= 1, "alpha was {alpha}");
}

#[test]
fn open_save_in_primitive_does_not_leak_into_the_next() {
    let mut engine = Engine::new();
    engine.register_surface("main", canvas(10, 10), 1.0, None).unwrap();

    let registry = engine.registry_mut();
    let leaky = registry.issue_id();
    registry
        .set_primitive(PrimitiveRecord::new(
            leaky,
            "main",
            ShapeParams::new(1.0, 0, BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
            |ctx: &mut DrawContext| -> Result<(), DrawError> {
                ctx.translate(100.0, 100.0);
                ctx.save()?;
                ctx.set_global_alpha(0.0);
                Ok(())
            },
        ))
        .unwrap();
    let cover = registry.issue_id();
    registry
        .set_primitive(rect_record(cover, "main", 1, rect(0.0, 0.0, 10.0, 10.0, RED)))
        .unwrap();

    assert!(engine.pump().unwrap().is_clean());
    let painted = pixel(&engine, "main", 5, 5);
    assert_eq!((painted.r, painted.a), (255, 255));

    engine
        .registry_mut()
        .set_surface_opacity("main", 0.5)
        .unwrap();
    assert!(engine.pump().unwrap().is_clean());
    let alpha = pixel(&engine, "main", 5, 5).a as i32;
    assert!((alpha - 128).abs() <= 1, "alpha was {alpha}");
}

fn recording(
    id: PrimitiveId,
    surface: &str,
    label: usize,
    log: &Rc<RefCell<Vec<usize>>>,
) -> PrimitiveRecord {
    let log = Rc::clone(log);
    PrimitiveRecord::new(
        id,
        surface,
        ShapeParams::new(1.0, 0, BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
        move |_ctx: &mut DrawContext| {
            log.borrow_mut().push(label);
            Ok(())
        },
    )
}

#[test]
fn equal_z_index_paints_in_declaration_order() {
    let mut engine = Engine::new();
    engine.register_surface("main", canvas(4, 4), 1.0, None).unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    let ids: Vec<PrimitiveId> = (0..64).map(|_| engine.registry_mut().issue_id()).collect();
    for (label, id) in ids.iter().rev().enumerate() {
        engine
            .registry_mut()
            .set_primitive(recording(*id, "main", label, &log))
            .unwrap();
    }

    engine.pump().unwrap();
    assert_eq!(*log.borrow(), (0..64).collect::<Vec<_>>());
}

#[test]
fn replacing_a_primitive_keeps_its_paint_slot() {
    let mut engine = Engine::new();
    engine.register_surface("main", canvas(4, 4), 1.0, None).unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    let ids: Vec<PrimitiveId> = (0..3).map(|_| engine.registry_mut().issue_id()).collect();
    for (label, id) in ids.iter().enumerate() {
        engine
            .registry_mut()
            .set_primitive(recording(*id, "main", label, &log))
            .unwrap();
    }
    engine.pump().unwrap();
    assert_eq!(*log.borrow(), vec![0, 1, 2]);

    log.borrow_mut().clear();
    engine
        .registry_mut()
        .set_primitive(recording(ids[0], "main", 10, &log))
        .unwrap();
    engine.pump().unwrap();
    assert_eq!(*log.borrow(), vec![10, 1, 2]);
}

#[test]
fn moved_primitive_paints_last_on_its_new_surface() {
    let mut engine = Engine::new();
    engine.register_surface("a", canvas(4, 4), 1.0, None).unwrap();
    engine.register_surface("b", canvas(4, 4), 1.0, None).unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    let mover = engine.registry_mut().issue_id();
    engine
        .registry_mut()
        .set_primitive(recording(mover, "a", 0, &log))
        .unwrap();
    for label in [1, 2] {
        let id = engine.registry_mut().issue_id();
        engine
            .registry_mut()
            .set_primitive(recording(id, "b", label, &log))
            .unwrap();
    }
    engine.pump().unwrap();

    log.borrow_mut().clear();
    engine
        .registry_mut()
        .set_primitive(recording(mover, "b", 0, &log))
        .unwrap();
    engine.pump().unwrap();
    assert_eq!(*log.borrow(), vec![1, 2, 0]);
    assert_eq!(engine.registry().owner_of(mover), Some("b"));
}

struct BrokenHandle;

impl SurfaceHandle for BrokenHandle {
    fn logical_size(&self) -> Size {
        Size::new(1, 1)
    }

    fn scale_factor(&self) -> f64 {
        1.0
    }

    fn acquire_context(&mut self) -> Result<cairo::Context, cairo::Error> {
        Err(cairo::Error::NoMemory)
    }

    fn resize(&mut self, _size: Size) -> Result<(), cairo::Error> {
        Ok(())
    }

    fn snapshot(&self) -> Result<cairo::ImageSurface, cairo::Error> {
        Err(cairo::Error::NoMemory)
    }
}

#[test]
fn failed_context_acquisition_registers_nothing() {
    let mut engine = Engine::new();
    let err = engine
        .register_surface("broken", BrokenHandle, 1.0, None)
        .unwrap_err();
    assert_eq!(err.name, "broken");
    assert_eq!(engine.registry().surface_count(), 0);
    assert!(!engine.render_loop().is_running());
}

fn failing_middle(policy: DrawErrorPolicy) -> (Engine, PrimitiveId) {
    let mut engine = Engine::new().with_policy(policy);
    engine.register_surface("main", canvas(12, 4), 1.0, None).unwrap();

    let registry = engine.registry_mut();
    let left = registry.issue_id();
    registry
        .set_primitive(rect_record(left, "main", 0, rect(0.0, 0.0, 4.0, 4.0, RED)))
        .unwrap();

    let broken = registry.issue_id();
    registry
        .set_primitive(PrimitiveRecord::new(
            broken,
            "main",
            ShapeParams::new(1.0, 1, BoundingBox::new(4.0, 0.0, 4.0, 4.0)),
            |_ctx: &mut DrawContext| Err(DrawError::Callback("boom".into())),
        ))
        .unwrap();

    let right = registry.issue_id();
    registry
        .set_primitive(rect_record(right, "main", 2, rect(8.0, 0.0, 4.0, 4.0, RED)))
        .unwrap();
    (engine, broken)
}

#[test]
fn draw_failure_aborts_surface_by_default() {
    let (mut engine, broken) = failing_middle(DrawErrorPolicy::default());
    let report = engine.pump().unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].surface, "main");
    assert_eq!(report.errors[0].primitive, Some(broken));
    assert_eq!(pixel(&engine, "main", 1, 1).a, 255);
    assert!(pixel(&engine, "main", 10, 1).is_transparent());
    assert!(!engine.registry().surface("main").unwrap().is_dirty());
    assert!(engine.render_loop().is_running());
}

#[test]
fn skip_policy_paints_remaining_primitives() {
    let (mut engine, broken) = failing_middle(DrawErrorPolicy::SkipPrimitive);
    let report = engine.pump().unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].primitive, Some(broken));
    assert_eq!(pixel(&engine, "main", 1, 1).a, 255);
    assert_eq!(pixel(&engine, "main", 10, 1).a, 255);
}
