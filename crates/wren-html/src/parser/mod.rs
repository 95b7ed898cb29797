//! Tree construction over the token stream.
//!
//! The tree builder owns nothing: it works against a shared
//! [`DocumentHandle`] and two collaborator traits. [`ScriptHost`] is called
//! synchronously when an inline `script` element closes (the suspension
//! contract: tokenization pauses, the script runs against the live document,
//! then tokenization resumes). [`ResourceSink`] receives non-blocking
//! [`FetchRequest`]s for subresources the builder discovers (`img[src]`,
//! `script[src]`, `link[rel=stylesheet]`).

mod core;

pub use core::TreeBuilder;

use thiserror::Error;
use wren_dom::{DocumentHandle, NodeId};

use crate::tokenizer::Tokenizer;

/// What a discovered subresource will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A replaced image (`img[src]`).
    Image,
    /// An external script (`script[src]`).
    Script,
    /// An external stylesheet (`link[rel=stylesheet][href]`).
    Stylesheet,
}

/// A subresource discovered during tree construction.
///
/// Requests are fire-and-forget from the builder's point of view: issuing
/// one never blocks parsing, and the response (if any) re-enters the
/// pipeline as an ordinary document mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// The element that referenced the resource.
    pub node: NodeId,
    /// The resource URL exactly as written in the attribute.
    pub url: String,
    /// What the resource will be used for.
    pub kind: ResourceKind,
}

/// Script execution failure. Never fatal to parsing: the builder logs the
/// failure and resumes tokenization.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script failed to parse or threw during execution.
    #[error("script execution failed: {0}")]
    Execution(String),
}

/// Executes inline scripts while the parser is suspended.
///
/// The document handle passed in is the same one the builder is
/// constructing into, so mutations made by the script are visible to the
/// rest of the parse (and are recorded by the invalidation tracker).
pub trait ScriptHost {
    /// Run one inline script source against the live document.
    ///
    /// # Errors
    /// Returns an error if the script fails to parse or execute.
    fn execute(&mut self, source: &str, document: &DocumentHandle) -> Result<(), ScriptError>;
}

/// A script host that ignores every script.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullScriptHost;

impl ScriptHost for NullScriptHost {
    fn execute(&mut self, _source: &str, _document: &DocumentHandle) -> Result<(), ScriptError> {
        Ok(())
    }
}

/// Receives subresource fetch requests discovered during parsing.
pub trait ResourceSink {
    /// Accept one discovered subresource request.
    fn request(&mut self, request: FetchRequest);
}

/// A resource sink that drops every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResourceSink;

impl ResourceSink for NullResourceSink {
    fn request(&mut self, _request: FetchRequest) {}
}

/// Parse a complete document in one call.
///
/// Convenience over [`TreeBuilder`] for callers that have the whole input
/// up front. Scripts run through `script_host` as they are encountered;
/// discovered subresources go to `resource_sink`.
pub fn parse_document(
    html: &str,
    script_host: &mut dyn ScriptHost,
    resource_sink: &mut dyn ResourceSink,
) -> DocumentHandle {
    let document = DocumentHandle::new();
    let mut tokenizer = Tokenizer::new(html);
    let mut builder = TreeBuilder::new(document.clone(), script_host, resource_sink);
    builder.run(&mut tokenizer);
    document
}
