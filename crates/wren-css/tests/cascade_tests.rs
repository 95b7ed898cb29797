//! Cascade and style resolution tests.

use wren_css::{
    ColorValue, DisplayValue, Origin, Stylesheet, compute_styles, parse_stylesheet,
    resolve_styles, ua_stylesheet,
};
use wren_dom::DocumentHandle;
use wren_html::{NullResourceSink, NullScriptHost, parse_document};

fn parse(html: &str) -> DocumentHandle {
    parse_document(html, &mut NullScriptHost, &mut NullResourceSink)
}

fn rules_with(css: &str) -> Stylesheet {
    let mut rules = ua_stylesheet().clone();
    rules.append(parse_stylesheet(css, Origin::Author));
    rules
}

#[test]
fn author_rules_override_user_agent_rules() {
    let document = parse("<head></head>");
    let state = document.state();
    let head = state.tree.elements_by_tag_name("head")[0];

    let ua_only = compute_styles(&state.tree, ua_stylesheet());
    assert_eq!(ua_only[&head].display, DisplayValue::None);

    let styles = compute_styles(&state.tree, &rules_with("head { display: block }"));
    assert_eq!(styles[&head].display, DisplayValue::Block);
}

#[test]
fn higher_specificity_wins() {
    let document = parse(r#"<div class="note" id="main">x</div>"#);
    let state = document.state();
    let div = state.tree.elements_by_tag_name("div")[0];

    let styles = compute_styles(
        &state.tree,
        &rules_with(
            "#main { color: red } .note { color: blue } div { color: green }",
        ),
    );
    assert_eq!(styles[&div].color, ColorValue::rgb(255, 0, 0));
}

#[test]
fn source_order_breaks_specificity_ties() {
    let document = parse("<p>x</p>");
    let state = document.state();
    let p = state.tree.elements_by_tag_name("p")[0];

    let styles = compute_styles(
        &state.tree,
        &rules_with("p { color: red } p { color: blue }"),
    );
    assert_eq!(styles[&p].color, ColorValue::rgb(0, 0, 255));
}

#[test]
fn color_and_font_size_inherit_through_the_tree() {
    let document = parse("<div><p><span>deep</span></p></div>");
    let state = document.state();
    let span = state.tree.elements_by_tag_name("span")[0];

    let styles = compute_styles(
        &state.tree,
        &rules_with("div { color: navy; font-size: 20px }"),
    );
    assert_eq!(styles[&span].color, ColorValue::rgb(0, 0, 128));
    assert!((styles[&span].font_size - 20.0).abs() < f32::EPSILON);
    // Background does not inherit.
    assert!(styles[&span].background.is_transparent());
}

#[test]
fn display_none_excludes_the_whole_subtree() {
    let document = parse(r#"<div id="gone"><p><span>hidden</span></p></div><p>kept</p>"#);
    let state = document.state();
    let gone = state.tree.element_by_id("gone").expect("parsed");
    let span = state.tree.elements_by_tag_name("span")[0];

    let styles = compute_styles(&state.tree, &rules_with("#gone { display: none }"));
    assert_eq!(styles[&gone].display, DisplayValue::None);
    assert!(!styles.contains_key(&span));
    // The sibling paragraph is unaffected.
    assert_eq!(styles.len(), 2);
}

#[test]
fn resolution_is_idempotent() {
    let document = parse(r#"<div class="a"><p>one</p><p class="b">two</p></div>"#);
    let state = document.state();
    let rules = rules_with(".a { color: red } .b { font-size: 24px }");

    let first = compute_styles(&state.tree, &rules);
    let second = compute_styles(&state.tree, &rules);
    assert_eq!(first, second);
}

#[test]
fn incremental_resolution_recomputes_only_dirty_subtrees() {
    let document = parse(r#"<div id="left"><span>a</span></div><div id="right"><span>b</span></div>"#);
    let rules = rules_with(".hot { color: red }");

    let first = {
        let state = document.state();
        compute_styles(&state.tree, &rules)
    };
    let left = document.element_by_id("left").expect("parsed");
    let right = document.element_by_id("right").expect("parsed");
    assert_eq!(first[&left].color, ColorValue::BLACK);

    document.set_attribute(left, "class", "hot");
    let dirty = document.state_mut().tracker.take();

    let state = document.state();
    let second = resolve_styles(&state.tree, &rules, &dirty, &first);
    assert_eq!(second[&left].color, ColorValue::rgb(255, 0, 0));
    // The clean sibling subtree kept its previous style.
    assert_eq!(second[&right], first[&right]);
    let right_span = state.tree.children(right)[0];
    assert_eq!(second[&right_span], first[&right_span]);
}
