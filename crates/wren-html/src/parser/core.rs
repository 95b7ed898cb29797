//! The tree builder: token stream in, document tree out.

use wren_common::warning::warn_once;
use wren_dom::{AttributesMap, DocumentHandle, ElementData, NodeId, NodeType};

use super::{FetchRequest, ResourceKind, ResourceSink, ScriptHost};
use crate::tokenizer::{Token, Tokenizer};

/// Elements that never take children and are never pushed onto the stack.
const VOID_ELEMENTS: &[&str] = &["img", "br", "hr", "meta", "link", "input"];

/// Stack-based tree construction.
///
/// The builder inserts under the innermost open element, implicitly closes
/// elements skipped over by a matching end tag, and ignores end tags with
/// no open counterpart. It never fails: every recovery path inserts less
/// rather than erroring.
pub struct TreeBuilder<'a> {
    document: DocumentHandle,
    script_host: &'a mut dyn ScriptHost,
    resource_sink: &'a mut dyn ResourceSink,
    /// Open elements, innermost last, with their tag names for end tag
    /// matching without a tree borrow.
    open_elements: Vec<(NodeId, String)>,
    /// The open inline `script` element whose source will run when its end
    /// tag arrives. External scripts (`src` attribute) never set this.
    open_script: Option<NodeId>,
    finished: bool,
}

impl<'a> TreeBuilder<'a> {
    /// Create a builder inserting into `document`.
    pub fn new(
        document: DocumentHandle,
        script_host: &'a mut dyn ScriptHost,
        resource_sink: &'a mut dyn ResourceSink,
    ) -> Self {
        Self {
            document,
            script_host,
            resource_sink,
            open_elements: Vec::new(),
            open_script: None,
            finished: false,
        }
    }

    /// Whether the end-of-input token has been processed.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drive the builder from a tokenizer until end of input or, while
    /// streaming, until the tokenizer starves. Safe to call again after
    /// feeding more input.
    pub fn run(&mut self, tokenizer: &mut Tokenizer) {
        while let Some(token) = tokenizer.next() {
            self.process(token);
            if self.finished {
                return;
            }
        }
    }

    /// Process a single token.
    pub fn process(&mut self, token: Token) {
        match token {
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => self.handle_start_tag(&name, attributes, self_closing),
            Token::EndTag { name } => self.handle_end_tag(&name),
            Token::Text { data } => self.append_text(&data),
            Token::Comment { data } => self.append_comment(&data),
            Token::EndOfInput => self.handle_end_of_input(),
        }
    }

    fn current_parent(&self) -> NodeId {
        self.open_elements
            .last()
            .map_or(NodeId::ROOT, |(id, _)| *id)
    }

    fn handle_start_tag(
        &mut self,
        name: &str,
        attributes: Vec<crate::tokenizer::Attribute>,
        self_closing: bool,
    ) {
        let attrs: AttributesMap = attributes
            .into_iter()
            .map(|attr| (attr.name, attr.value))
            .collect();
        let parent = self.current_parent();
        let node = {
            let mut state = self.document.state_mut();
            let node = state.tree.alloc(NodeType::Element(ElementData {
                tag_name: name.to_string(),
                attrs,
            }));
            state.tree.append_child(parent, node);
            node
        };

        self.discover_resources(node, name);

        if self_closing || VOID_ELEMENTS.contains(&name) {
            return;
        }
        if name == "script" && self.document.attribute(node, "src").is_none() {
            self.open_script = Some(node);
        }
        self.open_elements.push((node, name.to_string()));
    }

    /// Issue fetch requests for subresources referenced by the new element.
    fn discover_resources(&mut self, node: NodeId, name: &str) {
        let request = match name {
            "img" => self
                .document
                .attribute(node, "src")
                .map(|url| FetchRequest {
                    node,
                    url,
                    kind: ResourceKind::Image,
                }),
            "script" => self
                .document
                .attribute(node, "src")
                .map(|url| FetchRequest {
                    node,
                    url,
                    kind: ResourceKind::Script,
                }),
            "link" => {
                let is_stylesheet = self
                    .document
                    .attribute(node, "rel")
                    .is_some_and(|rel| rel.eq_ignore_ascii_case("stylesheet"));
                if is_stylesheet {
                    self.document
                        .attribute(node, "href")
                        .map(|url| FetchRequest {
                            node,
                            url,
                            kind: ResourceKind::Stylesheet,
                        })
                } else {
                    None
                }
            }
            _ => None,
        };
        if let Some(request) = request {
            self.resource_sink.request(request);
        }
    }

    fn handle_end_tag(&mut self, name: &str) {
        let Some(depth) = self
            .open_elements
            .iter()
            .rposition(|(_, tag)| tag == name)
        else {
            warn_once("HTML", &format!("stray end tag '</{name}>' ignored"));
            return;
        };
        // Implicitly close anything opened above the match.
        while self.open_elements.len() > depth {
            if let Some((node, _)) = self.open_elements.pop()
                && self.open_script == Some(node)
            {
                self.open_script = None;
                self.execute_script(node);
            }
        }
    }

    /// Run an inline script while the parse is suspended. The document
    /// borrow is released before the host is entered, so the script sees
    /// and mutates the same tree the builder is constructing.
    fn execute_script(&mut self, node: NodeId) {
        let source = self.document.text_content(node);
        if source.trim().is_empty() {
            return;
        }
        if let Err(error) = self.script_host.execute(&source, &self.document) {
            warn_once("JS", &format!("inline script failed: {error}"));
        }
    }

    fn append_text(&mut self, data: &str) {
        let parent = self.current_parent();
        // Inter-element whitespace at the document level carries nothing.
        if parent == NodeId::ROOT && data.trim().is_empty() {
            return;
        }
        let mut state = self.document.state_mut();
        // Merge into a trailing text sibling so consecutive tokenizer runs
        // form one node.
        let last_child = state.tree.children(parent).last().copied();
        if let Some(last) = last_child
            && let Some(node) = state.tree.get_mut(last)
            && let NodeType::Text(existing) = &mut node.node_type
        {
            existing.push_str(data);
            return;
        }
        let node = state.tree.alloc(NodeType::Text(data.to_string()));
        state.tree.append_child(parent, node);
    }

    fn append_comment(&mut self, data: &str) {
        let parent = self.current_parent();
        let mut state = self.document.state_mut();
        let node = state.tree.alloc(NodeType::Comment(data.to_string()));
        state.tree.append_child(parent, node);
    }

    fn handle_end_of_input(&mut self) {
        // Unterminated inline scripts are never executed.
        if let Some(node) = self.open_script.take()
            && self.open_elements.iter().any(|(id, _)| *id == node)
        {
            warn_once("HTML", "unterminated script element; source discarded");
        }
        self.open_elements.clear();
        self.finished = true;
    }
}
