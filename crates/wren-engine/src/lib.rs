//! Document loading and rendering pipeline for the Wren renderer.
//!
//! # Scope
//!
//! - **Document loading** - read a file or fetch a URL, parse it with
//!   scripts executing inline
//! - **Coalesced frames** - any number of mutations between flushes
//!   collapse into one restyle→relayout→repaint pass
//! - **Resource integration** - images, external stylesheets, and external
//!   scripts arrive off-thread and re-enter as tracked mutations
//! - **Software rendering** - damage-scoped rasterization to an RGBA
//!   surface
//!
//! # Concurrency
//!
//! The document, its styles, geometry, and display list all live on the
//! pipeline thread behind a single shared handle. The only cross-thread
//! boundary is the resource channel: workers fetch and decode, the
//! pipeline applies. Navigation bumps a generation counter so a slow fetch
//! from a previous document can never touch the current one.

mod font_metrics;
mod resources;
mod surface;

pub use font_metrics::{FontdueMetrics, load_system_font};
pub use resources::{ResourceEvent, ResourceLoader};
pub use surface::Surface;

pub use wren_css as css;
pub use wren_dom as dom;
pub use wren_html as html;
pub use wren_js as js;

use std::collections::HashMap;
use std::fs;

use fontdue::Font;
use thiserror::Error;
use wren_common::image::LoadedImage;
use wren_common::net;
use wren_common::warning::clear_warnings;
use wren_css::{
    ApproximateFontMetrics, DamageRegion, DisplayList, LayoutBox, LayoutEngine, Origin, StyleMap,
    Stylesheet, Viewport, extract_style_content, paint, parse_stylesheet, resolve_styles,
    ua_stylesheet,
};
use wren_dom::{ChangeKind, DocumentHandle, DocumentState};
use wren_html::{FetchRequest, ResourceSink, ScriptHost, parse_document};
use wren_js::BoaScriptEngine;

/// Failure to obtain a document's markup.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The local file could not be read.
    #[error("file error: {0}")]
    File(String),
    /// The URL could not be fetched.
    #[error("network error: {0}")]
    Network(String),
}

/// Collects the fetch requests the tree builder discovers, for dispatch
/// once parsing finishes.
#[derive(Default)]
struct CollectingSink {
    requests: Vec<FetchRequest>,
}

impl ResourceSink for CollectingSink {
    fn request(&mut self, request: FetchRequest) {
        self.requests.push(request);
    }
}

/// One document's rendering state and the machinery to keep it current.
///
/// The pipeline owns everything derived from the document: the rule set,
/// computed styles, geometry, and the last frame's display list. Callers
/// mutate through the [`DocumentHandle`] (or let scripts and resources do
/// it) and then call [`flush`](Self::flush); however many mutations
/// accumulated, exactly one pass runs.
pub struct Pipeline {
    document: DocumentHandle,
    scripts: BoaScriptEngine,
    rules: Stylesheet,
    styles: StyleMap,
    engine: LayoutEngine,
    layout: Option<LayoutBox>,
    display_list: DisplayList,
    viewport: Viewport,
    scroll: (f32, f32),
    needs_frame: bool,
    frames: u64,
    font: Option<Font>,
    images: HashMap<String, LoadedImage>,
    loader: ResourceLoader,
    base_url: Option<String>,
}

impl Pipeline {
    /// An empty pipeline for the given viewport.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            document: DocumentHandle::new(),
            scripts: BoaScriptEngine::new(),
            rules: ua_stylesheet().clone(),
            styles: StyleMap::new(),
            engine: LayoutEngine::new(),
            layout: None,
            display_list: DisplayList::default(),
            viewport,
            scroll: (0.0, 0.0),
            needs_frame: false,
            frames: 0,
            font: load_system_font(),
            images: HashMap::new(),
            loader: ResourceLoader::new(),
            base_url: None,
        }
    }

    /// Load a document from a file path or URL and navigate to it.
    ///
    /// # Errors
    /// Returns a [`LoadError`] if the file cannot be read or the URL
    /// cannot be fetched. Malformed markup is never an error.
    pub fn load(&mut self, path: &str) -> Result<(), LoadError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            let html = net::fetch_text(path).map_err(|e| LoadError::Network(e.to_string()))?;
            self.navigate(&html, Some(path));
        } else {
            let html = fs::read_to_string(path)
                .map_err(|e| LoadError::File(format!("failed to read '{path}': {e}")))?;
            self.navigate(&html, None);
        }
        Ok(())
    }

    /// Parse `html` as the new current document, dropping every piece of
    /// state derived from the previous one.
    ///
    /// Inline scripts execute during the parse, with tokenization
    /// suspended while each runs. Discovered subresources are dispatched
    /// to worker threads after the parse completes; their completions
    /// apply on later [`pump`](Self::pump) calls.
    pub fn navigate(&mut self, html: &str, base_url: Option<&str>) {
        clear_warnings();
        self.loader.begin_generation();
        self.engine.clear();
        self.styles = StyleMap::new();
        self.layout = None;
        self.display_list = DisplayList::default();
        self.images.clear();
        self.scroll = (0.0, 0.0);
        self.base_url = base_url.map(ToString::to_string);
        self.scripts = BoaScriptEngine::new();

        let mut sink = CollectingSink::default();
        self.document = parse_document(html, &mut self.scripts, &mut sink);

        let mut rules = ua_stylesheet().clone();
        let inline_css = extract_style_content(&self.document.state().tree);
        rules.append(parse_stylesheet(&inline_css, Origin::Author));
        self.rules = rules;

        for request in sink.requests {
            self.loader.dispatch(request, self.base_url.as_deref());
        }
        self.needs_frame = true;
    }

    /// Apply every resource completion that has arrived, as tracked
    /// mutations. Returns the number applied.
    pub fn pump(&mut self) -> usize {
        let events = self.loader.poll();
        let applied = events.len();
        for event in events {
            self.apply_event(event);
        }
        applied
    }

    fn apply_event(&mut self, event: ResourceEvent) {
        match event {
            ResourceEvent::ImageLoaded { node, src, image } => {
                let (width, height) = image.dimensions_f32();
                self.engine.set_intrinsic_size(node, width, height);
                let _ = self.images.insert(src, image);
                self.document.mutate(node, ChangeKind::ReplacedSize);
            }
            ResourceEvent::StylesheetLoaded { css } => {
                self.rules.append(parse_stylesheet(&css, Origin::Author));
                let mut state = self.document.state_mut();
                let DocumentState { tree, tracker } = &mut *state;
                tracker.invalidate_all_styles(tree);
            }
            ResourceEvent::ScriptLoaded { source } => {
                if let Err(err) = self.scripts.execute(&source, &self.document) {
                    wren_common::warning::warn_once(
                        "script",
                        &format!("external script failed: {err}"),
                    );
                }
            }
            ResourceEvent::Failed { url, error } => {
                wren_common::warning::warn_once(
                    "net",
                    &format!("failed to load '{url}': {error}"),
                );
            }
        }
    }

    /// Fetches still in flight for the current document.
    #[must_use]
    pub const fn pending_resources(&self) -> usize {
        self.loader.outstanding()
    }

    /// Run one coalesced restyle→relayout→repaint pass.
    ///
    /// Consumes the accumulated dirty set; recomputation is bounded to the
    /// dirty subtrees and scopes it names. With nothing dirty and a
    /// current frame, this is a no-op returning empty damage.
    pub fn flush(&mut self) -> DamageRegion {
        let dirty = self.document.state_mut().tracker.take();
        if dirty.is_empty() && !self.needs_frame && self.layout.is_some() {
            return DamageRegion::default();
        }

        self.engine.invalidate(&dirty);
        let state = self.document.state();
        let styles = resolve_styles(&state.tree, &self.rules, &dirty, &self.styles);
        let layout = match self.font.as_ref() {
            Some(font) => self.engine.layout(
                &state.tree,
                &styles,
                self.viewport,
                &FontdueMetrics::new(font),
            ),
            None => self
                .engine
                .layout(&state.tree, &styles, self.viewport, &ApproximateFontMetrics),
        };
        let (list, damage) = paint(
            &layout,
            &state.tree,
            &styles,
            self.viewport,
            self.scroll,
            &self.display_list,
        );
        drop(state);

        self.styles = styles;
        self.layout = Some(layout);
        self.display_list = list;
        self.needs_frame = false;
        self.frames += 1;
        damage
    }

    /// Rasterize the current display list into `surface`, scoped to
    /// `damage` when given.
    pub fn present(&self, surface: &mut Surface, damage: Option<&DamageRegion>) {
        for (src, image) in &self.images {
            surface.set_image(src, image.clone());
        }
        surface.present(&self.display_list, damage, self.scroll);
    }

    /// Change the scroll offset. Takes effect at the next flush, where
    /// newly visible boxes enter the display list as damage.
    pub fn set_scroll(&mut self, x: f32, y: f32) {
        self.scroll = (x, y);
        self.needs_frame = true;
    }

    /// The current document.
    #[must_use]
    pub const fn document(&self) -> &DocumentHandle {
        &self.document
    }

    /// The last flushed display list.
    #[must_use]
    pub const fn display_list(&self) -> &DisplayList {
        &self.display_list
    }

    /// The last flushed geometry tree.
    #[must_use]
    pub const fn layout(&self) -> Option<&LayoutBox> {
        self.layout.as_ref()
    }

    /// Computed styles from the last flush.
    #[must_use]
    pub const fn styles(&self) -> &StyleMap {
        &self.styles
    }

    /// How many passes have run.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// The configured viewport.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Decoded images keyed by their `src` attribute.
    #[must_use]
    pub const fn images(&self) -> &HashMap<String, LoadedImage> {
        &self.images
    }
}
