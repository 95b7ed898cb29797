//! Tree builder tests: document shape, error recovery, subresource
//! discovery, and the inline-script suspension contract.

use wren_dom::{DocumentHandle, NodeId, NodeType};
use wren_html::{
    FetchRequest, NullResourceSink, NullScriptHost, ResourceKind, ResourceSink, ScriptError,
    ScriptHost, parse_document,
};

fn parse(html: &str) -> DocumentHandle {
    parse_document(html, &mut NullScriptHost, &mut NullResourceSink)
}

#[derive(Default)]
struct RecordingSink {
    requests: Vec<FetchRequest>,
}

impl ResourceSink for RecordingSink {
    fn request(&mut self, request: FetchRequest) {
        self.requests.push(request);
    }
}

#[test]
fn builds_sibling_elements_under_the_root() {
    let document = parse(r#"<p>Hi</p><div><img src="a.jpg"/></div>"#);
    let state = document.state();

    let roots = state.tree.children(NodeId::ROOT);
    assert_eq!(roots.len(), 2);

    let p = roots[0];
    assert_eq!(state.tree.as_element(p).map(|e| e.tag_name.as_str()), Some("p"));
    let p_children = state.tree.children(p);
    assert_eq!(p_children.len(), 1);
    assert_eq!(state.tree.as_text(p_children[0]), Some("Hi"));

    let div = roots[1];
    let div_children = state.tree.children(div);
    assert_eq!(div_children.len(), 1);
    let img = div_children[0];
    assert_eq!(
        state.tree.as_element(img).map(|e| e.tag_name.as_str()),
        Some("img")
    );
    assert!(state.tree.children(img).is_empty());
}

#[test]
fn every_node_points_back_at_its_parent() {
    let document = parse("<div><p>a<span>b</span></p></div>");
    let state = document.state();
    for id in state.tree.subtree(NodeId::ROOT) {
        for &child in state.tree.children(id) {
            assert_eq!(state.tree.parent(child), Some(id));
        }
    }
}

#[test]
fn stray_end_tag_is_ignored() {
    let document = parse("<p>a</div>b</p>");
    let state = document.state();
    let p = state.tree.children(NodeId::ROOT)[0];
    assert_eq!(state.tree.text_content(p), "ab");
}

#[test]
fn end_tag_implicitly_closes_inner_elements() {
    let document = parse("<div><span>x</div><p>y</p>");
    let state = document.state();
    let roots = state.tree.children(NodeId::ROOT);
    assert_eq!(roots.len(), 2);
    assert_eq!(
        state.tree.as_element(roots[1]).map(|e| e.tag_name.as_str()),
        Some("p")
    );
    // The p is a sibling of the div, not a child of the span.
    assert_eq!(state.tree.parent(roots[1]), Some(NodeId::ROOT));
}

#[test]
fn document_level_whitespace_is_dropped() {
    let document = parse("  \n<p>x</p>\n  ");
    let state = document.state();
    assert_eq!(state.tree.children(NodeId::ROOT).len(), 1);
}

#[test]
fn void_elements_take_no_children() {
    let document = parse("<div><br>after</div>");
    let state = document.state();
    let div = state.tree.children(NodeId::ROOT)[0];
    let children = state.tree.children(div);
    assert_eq!(children.len(), 2);
    assert!(state.tree.children(children[0]).is_empty());
    assert_eq!(state.tree.as_text(children[1]), Some("after"));
}

#[test]
fn comment_splits_text_nodes() {
    let document = parse("<div>a<!--c-->b</div>");
    let state = document.state();
    let div = state.tree.children(NodeId::ROOT)[0];
    let children = state.tree.children(div);
    assert_eq!(children.len(), 3);
    assert_eq!(state.tree.as_text(children[0]), Some("a"));
    assert!(matches!(
        state.tree.get(children[1]).map(|n| &n.node_type),
        Some(NodeType::Comment(_))
    ));
    assert_eq!(state.tree.as_text(children[2]), Some("b"));
}

#[test]
fn discovers_subresources_without_blocking() {
    let mut sink = RecordingSink::default();
    let document = parse_document(
        concat!(
            r#"<link rel="stylesheet" href="site.css">"#,
            r#"<link rel="icon" href="fav.ico">"#,
            r#"<img src="a.jpg">"#,
            r#"<script src="app.js"></script>"#,
        ),
        &mut NullScriptHost,
        &mut sink,
    );

    let kinds: Vec<ResourceKind> = sink.requests.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ResourceKind::Stylesheet,
            ResourceKind::Image,
            ResourceKind::Script
        ]
    );
    assert_eq!(sink.requests[0].url, "site.css");
    // Parsing finished: all four elements are in the tree regardless of
    // whether any resource ever arrives.
    assert_eq!(document.state().tree.children(NodeId::ROOT).len(), 4);
}

/// Script host that records what the document looked like at execution
/// time and performs a mutation that later markup must coexist with.
#[derive(Default)]
struct ProbingHost {
    runs: Vec<String>,
    paragraphs_at_run: usize,
}

impl ScriptHost for ProbingHost {
    fn execute(
        &mut self,
        source: &str,
        document: &DocumentHandle,
    ) -> Result<(), ScriptError> {
        self.runs.push(source.to_string());
        self.paragraphs_at_run = document.elements_by_tag_name("p").len();
        if let Some(target) = document.element_by_id("target") {
            document.set_text_content(target, "mutated");
        }
        Ok(())
    }
}

#[test]
fn inline_script_suspends_parsing_and_sees_the_partial_document() {
    let mut host = ProbingHost::default();
    let document = parse_document(
        r#"<p id="target">old</p><script>touch()</script><p>after</p>"#,
        &mut host,
        &mut NullResourceSink,
    );

    assert_eq!(host.runs, vec!["touch()".to_string()]);
    // At execution time only the first paragraph existed.
    assert_eq!(host.paragraphs_at_run, 1);
    // The script's mutation landed, and parsing resumed afterwards.
    let target = document.element_by_id("target").expect("target kept");
    assert_eq!(document.text_content(target), "mutated");
    assert_eq!(document.elements_by_tag_name("p").len(), 2);
    // Script mutations go through the tracker like any other.
    assert!(document.state().tracker.has_pending());
}

#[test]
fn external_script_is_fetched_not_executed() {
    let mut host = ProbingHost::default();
    let mut sink = RecordingSink::default();
    let document = parse_document(
        r#"<script src="app.js">inline_ignored()</script>"#,
        &mut host,
        &mut sink,
    );

    assert!(host.runs.is_empty());
    assert_eq!(sink.requests.len(), 1);
    assert_eq!(sink.requests[0].kind, ResourceKind::Script);
    assert!(document.element_by_id("anything").is_none());
}

#[test]
fn failing_script_does_not_stop_parsing() {
    struct FailingHost;
    impl ScriptHost for FailingHost {
        fn execute(
            &mut self,
            _source: &str,
            _document: &DocumentHandle,
        ) -> Result<(), ScriptError> {
            Err(ScriptError::Execution("boom".to_string()))
        }
    }

    let document = parse_document(
        "<script>bad</script><p>still here</p>",
        &mut FailingHost,
        &mut NullResourceSink,
    );
    assert_eq!(document.elements_by_tag_name("p").len(), 1);
}
