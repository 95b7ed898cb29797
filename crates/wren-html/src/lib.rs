//! Markup tokenizer and tree builder for the Wren rendering pipeline.
//!
//! # Scope
//!
//! This crate implements the front half of the pipeline:
//! - **Tokenizer** - a finite-state machine turning markup text into a lazy
//!   token sequence, with a verbatim raw-text mode for `script`/`style`
//!   content and discard-to-next-tag resynchronization on malformed input
//! - **Tree Builder** - stack-based tree construction over the shared
//!   [`wren_dom::DocumentHandle`], including the parser-blocking script
//!   suspension contract and non-blocking subresource discovery
//!
//! Error recovery is best-effort by design: no input is fatal. Stray end
//! tags are ignored, malformed tag syntax resynchronizes at the next `<`,
//! and a failing script never stops tree construction.

/// Tree construction over the token stream.
pub mod parser;
/// Markup tokenizer state machine.
pub mod tokenizer;

pub use parser::{
    FetchRequest, NullResourceSink, NullScriptHost, ResourceKind, ResourceSink, ScriptError,
    ScriptHost, TreeBuilder, parse_document,
};
pub use tokenizer::{Attribute, Token, Tokenizer};
