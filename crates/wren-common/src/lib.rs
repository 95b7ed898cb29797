//! Common utilities for the Wren rendering pipeline.
//!
//! This crate provides shared infrastructure used by every pipeline stage:
//! - **Warning System** - deduplicated colored terminal output for
//!   unsupported or malformed input
//! - **Net** - blocking HTTP fetch helpers and `data:` URL decoding
//! - **URL** - base-relative URL resolution for subresources
//! - **Image** - decoded RGBA image container shared by layout and paint

pub mod image;
pub mod net;
pub mod url;
pub mod warning;
