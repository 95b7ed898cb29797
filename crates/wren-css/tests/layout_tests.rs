//! Layout engine tests: block flow, incremental scope reuse, and replaced
//! sizing.

use wren_css::{
    ApproximateFontMetrics, BoxType, LayoutEngine, Origin, Stylesheet, Viewport, compute_styles,
    parse_stylesheet, ua_stylesheet,
};
use wren_dom::{ChangeKind, DocumentHandle};
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

#[test]
fn geometry_serializes_for_state_dumps() {
    let document = parse(r#"<body><p id="p">text</p></body>"#);
    let state = document.state();
    let styles = compute_styles(&state.tree, ua_stylesheet());

    let mut engine = LayoutEngine::new();
    let layout = engine.layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);

    let value = serde_json::to_value(&layout).expect("geometry serializes");
    // The synthetic root box carries the document node's id.
    assert_eq!(value["node"], serde_json::json!(0));
    assert!(value["children"].is_array());
}

#[test]
fn block_boxes_fill_available_width_minus_margins() {
    let document = parse(r#"<body><p id="p">text</p></body>"#);
    let state = document.state();
    let styles = compute_styles(&state.tree, ua_stylesheet());

    let mut engine = LayoutEngine::new();
    let layout = engine.layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);

    let body = state.tree.elements_by_tag_name("body")[0];
    let body_box = layout.find(body).expect("body box");
    // UA sheet: body { margin: 8px }.
    assert!((body_box.dimensions.content.width - 784.0).abs() < f32::EPSILON);
    assert!((body_box.dimensions.content.x - 8.0).abs() < f32::EPSILON);

    let p = state.tree.element_by_id("p").expect("parsed");
    let p_box = layout.find(p).expect("p box");
    assert!((p_box.dimensions.content.width - 784.0).abs() < f32::EPSILON);
}

#[test]
fn explicit_sizes_override_filling() {
    let document = parse(r#"<div id="sized">x</div>"#);
    let state = document.state();
    let styles = compute_styles(
        &state.tree,
        &rules_with("#sized { width: 200px; height: 100px }"),
    );

    let mut engine = LayoutEngine::new();
    let layout = engine.layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);
    let sized = document.element_by_id("sized").expect("parsed");
    let sized_box = layout.find(sized).expect("box");
    assert!((sized_box.dimensions.content.width - 200.0).abs() < f32::EPSILON);
    assert!((sized_box.dimensions.content.height - 100.0).abs() < f32::EPSILON);
}

#[test]
fn unset_block_height_sums_children_extents() {
    let document = parse(
        r#"<div id="outer"><div id="a"></div><div id="b"></div></div>"#,
    );
    let state = document.state();
    let styles = compute_styles(
        &state.tree,
        &rules_with("#a { height: 30px } #b { height: 50px; margin: 10px 0px }"),
    );

    let mut engine = LayoutEngine::new();
    let layout = engine.layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);
    let outer = document.element_by_id("outer").expect("parsed");
    let outer_box = layout.find(outer).expect("box");
    // 30 + (10 + 50 + 10)
    assert!((outer_box.dimensions.content.height - 100.0).abs() < f32::EPSILON);
}

#[test]
fn display_none_subtree_produces_no_boxes() {
    let document = parse(r#"<p id="kept">a</p><div id="gone"><p id="inner">b</p></div>"#);
    let state = document.state();
    let styles = compute_styles(&state.tree, &rules_with("#gone { display: none }"));

    let mut engine = LayoutEngine::new();
    let layout = engine.layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);
    assert!(layout.find(document.element_by_id("kept").expect("kept")).is_some());
    assert!(layout.find(document.element_by_id("gone").expect("gone")).is_none());
    assert!(layout.find(document.element_by_id("inner").expect("inner")).is_none());
}

#[test]
fn text_wraps_within_a_narrow_block() {
    let document = parse(r#"<div id="narrow">aaaa bbbb cccc dddd eeee ffff</div>"#);
    let state = document.state();
    let styles = compute_styles(&state.tree, &rules_with("#narrow { width: 100px }"));

    let mut engine = LayoutEngine::new();
    let layout = engine.layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);
    let narrow = document.element_by_id("narrow").expect("parsed");
    let narrow_box = layout.find(narrow).expect("box");

    let fragments = narrow_box
        .children
        .iter()
        .filter(|child| matches!(child.box_type, BoxType::Text { .. }))
        .count();
    assert!(fragments > 1, "expected wrapped text, got {fragments} fragment(s)");
    // Height covers all the lines.
    let line_count = u32::try_from(fragments).unwrap_or(u32::MAX);
    let line_count_f = line_count as f32;
    assert!(narrow_box.dimensions.content.height >= 19.0 * line_count_f);
}

#[test]
fn replaced_box_uses_placeholder_until_resource_arrives() {
    let document = parse(r#"<p><img id="pic" src="a.jpg"></p>"#);
    let state = document.state();
    let styles = compute_styles(&state.tree, ua_stylesheet());
    let pic = document.element_by_id("pic").expect("parsed");

    let mut engine = LayoutEngine::new();
    let layout = engine.layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);
    let placeholder = layout.find(pic).expect("box");
    assert!(matches!(placeholder.box_type, BoxType::Replaced { .. }));
    assert!(placeholder.dimensions.content.is_empty());
    drop(state);

    // The decoded image arrives: record its intrinsic size and dirty the
    // node the way resource arrival does.
    engine.set_intrinsic_size(pic, 120.0, 60.0);
    document.mutate(pic, ChangeKind::ReplacedSize);
    let dirty = document.state_mut().tracker.take();
    engine.invalidate(&dirty);

    let state = document.state();
    let relayout = engine.layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);
    let sized = relayout.find(pic).expect("box");
    assert!((sized.dimensions.content.width - 120.0).abs() < f32::EPSILON);
    assert!((sized.dimensions.content.height - 60.0).abs() < f32::EPSILON);
}

#[test]
fn width_attribute_scales_height_by_intrinsic_ratio() {
    let document = parse(r#"<p><img id="pic" src="a.jpg" width="60"></p>"#);
    let state = document.state();
    let styles = compute_styles(&state.tree, ua_stylesheet());
    let pic = document.element_by_id("pic").expect("parsed");

    let mut engine = LayoutEngine::new();
    engine.set_intrinsic_size(pic, 120.0, 80.0);
    let layout = engine.layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);
    let pic_box = layout.find(pic).expect("box");
    assert!((pic_box.dimensions.content.width - 60.0).abs() < f32::EPSILON);
    assert!((pic_box.dimensions.content.height - 40.0).abs() < f32::EPSILON);
}

#[test]
fn clean_sibling_scope_is_reused_not_relaid_out() {
    let document = parse(
        r#"<div id="left"><p>stable text</p></div><div id="right"><p>other text</p></div>"#,
    );
    let rules = ua_stylesheet().clone();
    let styles = {
        let state = document.state();
        compute_styles(&state.tree, &rules)
    };

    let mut engine = LayoutEngine::new();
    let (first, right_before) = {
        let state = document.state();
        let layout = engine.layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);
        let right = document.element_by_id("right").expect("parsed");
        (
            engine.scopes_computed(),
            layout.find(right).expect("box").clone(),
        )
    };

    // Mutate text inside the left scope only.
    let left = document.element_by_id("left").expect("parsed");
    let left_p = {
        let state = document.state();
        state.tree.children(left)[0]
    };
    document.set_text_content(left_p, "changed text content");
    let dirty = document.state_mut().tracker.take();
    engine.invalidate(&dirty);

    let state = document.state();
    let styles = wren_css::resolve_styles(&state.tree, &rules, &dirty, &styles);
    let layout = engine.layout(&state.tree, &styles, VIEWPORT, &ApproximateFontMetrics);

    // Recomputed scopes: the root chain and the left div (and its p), but
    // never the right div.
    let recomputed = engine.scopes_computed() - first;
    assert!(recomputed >= 2);
    assert!(recomputed < first, "right scope was re-laid out");

    let right = document.element_by_id("right").expect("parsed");
    assert_eq!(layout.find(right).expect("box"), &right_before);
}
