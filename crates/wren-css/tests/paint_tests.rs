//! Paint scheduling tests: stacking order, frame diffing, damage scope,
//! and viewport culling.

use wren_css::{
    ApproximateFontMetrics, DisplayList, ItemKind, LayoutEngine, Origin, Stylesheet, Viewport,
    compute_styles, paint, parse_stylesheet, resolve_styles, ua_stylesheet,
};
use wren_dom::DocumentHandle;
use wren_html::{NullResourceSink, NullScriptHost, parse_document};

const VIEWPORT: Viewport = Viewport::new(800.0, 600.0);

fn parse(html: &str) -> DocumentHandle {
    parse_document(html, &mut NullScriptHost, &mut NullResourceSink)
}

fn rules_with(css: &str) -> Stylesheet {
    let mut rules = ua_stylesheet().clone();
    rules.append(parse_stylesheet(css, Origin::Author));
    rules
}

struct Frame {
    engine: LayoutEngine,
    styles: wren_css::StyleMap,
    list: DisplayList,
}

fn first_frame(document: &DocumentHandle, rules: &Stylesheet) -> Frame {
    let state = document.state();
    let styles = compute_styles(&state.tree, rules);
    let mut engine = LayoutEngine::new();
    let layout = engine.layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);
    let (list, _) = paint(
        &layout,
        &state.tree,
        &styles,
        VIEWPORT,
        (0.0, 0.0),
        &DisplayList::default(),
    );
    Frame {
        engine,
        styles,
        list,
    }
}

#[test]
fn backgrounds_paint_before_their_text() {
    let document = parse(r#"<div id="a">words</div>"#);
    let frame = first_frame(&document, &rules_with("#a { background: silver }"));

    assert_eq!(frame.list.len(), 2);
    assert!(matches!(frame.list.items[0].kind, ItemKind::Rect { .. }));
    assert!(matches!(frame.list.items[1].kind, ItemKind::Text { .. }));
}

#[test]
fn explicit_stacking_levels_reorder_painting() {
    let document = parse(
        r#"<div id="top">above</div><div id="low">below</div>"#,
    );
    let frame = first_frame(
        &document,
        &rules_with(
            "#top { background: red; z-index: 5 } #low { background: blue; z-index: -1 }",
        ),
    );

    let stackings: Vec<i32> = frame.list.items.iter().map(|item| item.stacking).collect();
    let mut sorted = stackings.clone();
    sorted.sort_unstable();
    assert_eq!(stackings, sorted);
    assert_eq!(stackings.first(), Some(&-1));
    assert_eq!(stackings.last(), Some(&5));
}

#[test]
fn unchanged_frame_produces_no_damage() {
    let document = parse("<p>steady</p>");
    let rules = rules_with("");
    let mut frame = first_frame(&document, &rules);

    let state = document.state();
    let layout = frame
        .engine
        .layout(&state.tree, &frame.styles, VIEWPORT, &ApproximateFontMetrics);
    let (next, damage) = paint(
        &layout,
        &state.tree,
        &frame.styles,
        VIEWPORT,
        (0.0, 0.0),
        &frame.list,
    );
    assert_eq!(next, frame.list);
    assert!(damage.is_empty());
}

#[test]
fn color_change_damages_only_the_changed_paragraph() {
    let document = parse(r#"<p id="first">one two</p><p id="second">three four</p>"#);
    let rules = rules_with(".hot { color: red }");
    let mut frame = first_frame(&document, &rules);

    let first = document.element_by_id("first").expect("parsed");
    let second = document.element_by_id("second").expect("parsed");
    document.set_attribute(second, "class", "hot");
    let dirty = document.state_mut().tracker.take();

    // The untouched paragraph carries no dirty marks at all.
    assert!(!dirty.flags(first).any());

    frame.engine.invalidate(&dirty);
    let state = document.state();
    let styles = resolve_styles(&state.tree, &rules, &dirty, &frame.styles);
    let layout = frame
        .engine
        .layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);
    let (_, damage) = paint(&layout, &state.tree, &styles, VIEWPORT, (0.0, 0.0), &frame.list);

    assert!(!damage.is_empty());
    let second_bounds = layout.find(second).expect("box").subtree_bounds();
    let first_bounds = layout.find(first).expect("box").subtree_bounds();
    let damage_bounds = damage.bounding_box();
    assert!(second_bounds.union(&damage_bounds) == second_bounds);
    assert!(!damage.intersects(&first_bounds));
}

#[test]
fn offscreen_boxes_are_culled_until_scrolled_into_view() {
    let document = parse(r#"<div id="far">distant</div>"#);
    let rules = rules_with("#far { background: teal; margin-top: 2000px; height: 50px }");

    let state = document.state();
    let styles = compute_styles(&state.tree, &rules);
    let mut engine = LayoutEngine::new();
    let layout = engine.layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);

    let (visible, _) = paint(
        &layout,
        &state.tree,
        &styles,
        VIEWPORT,
        (0.0, 0.0),
        &DisplayList::default(),
    );
    assert!(visible.is_empty());

    // Scrolling down brings the box in; it enters the frame as new damage.
    let (scrolled, damage) = paint(
        &layout,
        &state.tree,
        &styles,
        VIEWPORT,
        (0.0, 1800.0),
        &visible,
    );
    assert_eq!(scrolled.len(), 2);
    assert!(!damage.is_empty());
}
