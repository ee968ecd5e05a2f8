use super::*;
use crate::animation::value::Color;

fn draw_with<F: FnOnce(&mut DrawContext<'_>)>(props: &Props, f: F) {
    let mut surface = Surface::new(4, 4).unwrap();
    let assets = AssetStore::empty();
    let mut ctx = DrawContext::new(&mut surface, Tick(7), 2, 0.5, Rng::new(1), None, props, &assets);
    f(&mut ctx);
}

#[test]
fn registry_register_get_replace() {
    let mut reg = BlueprintRegistry::new();
    assert!(!reg.contains("dot"));
    reg.register("dot", |_: &mut DrawContext<'_>| -> TickreelResult<()> { Ok(()) });
    assert!(reg.contains("dot"));
    assert!(reg.get("dot").is_some());
    reg.register("dot", |_: &mut DrawContext<'_>| -> TickreelResult<()> {
        Err(crate::foundation::error::TickreelError::evaluation("replaced"))
    });
    assert_eq!(reg.ids().collect::<Vec<_>>(), vec!["dot"]);
}

#[test]
fn builtins_are_listed() {
    let reg = BlueprintRegistry::with_builtins();
    for id in ["solid", "circle", "image", "spectrum", "particles"] {
        assert!(reg.contains(id), "{id}");
    }
    assert!(format!("{reg:?}").contains("solid"));
}

#[test]
fn prop_helpers_fall_back_to_defaults() {
    let mut props = Props::new();
    props.insert("size".into(), PropValue::Number(3.0));
    props.insert("tint".into(), PropValue::Color(Color::rgba(1, 2, 3, 4)));
    props.insert("label".into(), PropValue::Str("hi".into()));
    props.insert("on".into(), PropValue::Bool(true));
    draw_with(&props, |ctx| {
        assert_eq!((ctx.width, ctx.height), (4, 4));
        assert_eq!(ctx.tick, Tick(7));
        assert_eq!(ctx.number("size", 0.0), 3.0);
        assert_eq!(ctx.number("label", 9.0), 9.0);
        assert_eq!(ctx.color("tint", Color::rgba(0, 0, 0, 0)), Color::rgba(1, 2, 3, 4));
        assert_eq!(ctx.string("label"), Some("hi"));
        assert!(ctx.flag("on", false));
        assert!(!ctx.flag("missing", false));
        assert!(ctx.image("nothing").is_none());
    });
}

#[test]
fn registered_closure_draws() {
    let mut reg = BlueprintRegistry::new();
    reg.register("fill", |ctx: &mut DrawContext<'_>| -> TickreelResult<()> {
        let r = ctx.surface.rect();
        ctx.surface.fill_rect(r, Color::rgba(9, 9, 9, 255));
        Ok(())
    });
    let props = Props::new();
    let mut surface = Surface::new(2, 2).unwrap();
    let assets = AssetStore::empty();
    {
        let mut ctx = DrawContext::new(&mut surface, Tick(0), 0, 0.0, Rng::new(0), None, &props, &assets);
        reg.get("fill").unwrap().draw(&mut ctx).unwrap();
    }
    assert_eq!(surface.finish().unwrap().pixel(1, 1), Some([9, 9, 9, 255]));
}
