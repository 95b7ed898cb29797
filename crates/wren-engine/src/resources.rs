//! Concurrent subresource loading.
//!
//! Fetch requests discovered during parsing are dispatched to detached
//! worker threads; each completion comes back over an `mpsc` channel as a
//! [`ResourceEvent`] tagged with the generation it was issued under. The
//! pipeline thread drains the channel between frames and applies each
//! event as an ordinary tracked mutation, so workers never touch the
//! document tree themselves. Events from a previous generation (an earlier
//! navigation) are discarded on receipt.

use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use wren_common::image::LoadedImage;
use wren_common::net::{FetchError, fetch_bytes};
use wren_common::url::resolve_url;
use wren_dom::NodeId;
use wren_html::{FetchRequest, ResourceKind};

/// A completed subresource fetch, ready to apply on the pipeline thread.
pub enum ResourceEvent {
    /// An image decoded successfully.
    ImageLoaded {
        /// The `img` element that referenced it.
        node: NodeId,
        /// The `src` attribute as written (the paint-time lookup key).
        src: String,
        /// The decoded pixels and intrinsic size.
        image: LoadedImage,
    },
    /// An external stylesheet's text arrived.
    StylesheetLoaded {
        /// The stylesheet text.
        css: String,
    },
    /// An external script's source arrived.
    ScriptLoaded {
        /// The script source.
        source: String,
    },
    /// The fetch or decode failed. The referencing element keeps its
    /// placeholder; the document is otherwise undisturbed.
    Failed {
        /// The resolved URL that failed.
        url: String,
        /// What went wrong.
        error: FetchError,
    },
}

struct Envelope {
    generation: u64,
    event: ResourceEvent,
}

/// Dispatches fetches to worker threads and collects their completions.
pub struct ResourceLoader {
    sender: Sender<Envelope>,
    receiver: Receiver<Envelope>,
    generation: u64,
    outstanding: usize,
}

impl Default for ResourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLoader {
    /// A loader with no outstanding requests.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver,
            generation: 0,
            outstanding: 0,
        }
    }

    /// Start a new generation (navigation). Completions issued under any
    /// earlier generation will be discarded when they arrive.
    pub fn begin_generation(&mut self) {
        self.generation += 1;
        self.outstanding = 0;
    }

    /// Requests of the current generation still in flight. Every fetch
    /// completes with an event, success or failure, so this reaches zero.
    #[must_use]
    pub const fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// The current generation number.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Fetch one subresource on a worker thread. Never blocks.
    ///
    /// The URL is resolved against `base_url` for the fetch; images keep
    /// the attribute value as their lookup key.
    pub fn dispatch(&mut self, request: FetchRequest, base_url: Option<&str>) {
        let resolved = resolve_url(&request.url, base_url);
        let sender = self.sender.clone();
        let generation = self.generation;
        self.outstanding += 1;
        let _ = thread::spawn(move || {
            let event = fetch_event(&request, &resolved);
            let _ = sender.send(Envelope { generation, event });
        });
    }

    /// Drain every completion that has arrived, discarding stale ones.
    pub fn poll(&mut self) -> Vec<ResourceEvent> {
        let mut events = Vec::new();
        while let Ok(envelope) = self.receiver.try_recv() {
            if envelope.generation == self.generation {
                self.outstanding = self.outstanding.saturating_sub(1);
                events.push(envelope.event);
            }
        }
        events
    }
}

/// Run one fetch to completion. Every dispatch produces exactly one
/// event, failures included.
fn fetch_event(request: &FetchRequest, resolved: &str) -> ResourceEvent {
    let result = match request.kind {
        ResourceKind::Image => fetch_bytes(resolved)
            .and_then(|bytes| LoadedImage::decode(&bytes))
            .map(|image| ResourceEvent::ImageLoaded {
                node: request.node,
                src: request.url.clone(),
                image,
            }),
        ResourceKind::Stylesheet => {
            fetch_utf8(resolved).map(|css| ResourceEvent::StylesheetLoaded { css })
        }
        ResourceKind::Script => {
            fetch_utf8(resolved).map(|source| ResourceEvent::ScriptLoaded { source })
        }
    };
    result.unwrap_or_else(|error| ResourceEvent::Failed {
        url: resolved.to_string(),
        error,
    })
}

/// Fetch a text resource. Goes through [`fetch_bytes`] so `data:` URLs
/// decode locally.
fn fetch_utf8(url: &str) -> Result<String, FetchError> {
    let bytes = fetch_bytes(url)?;
    String::from_utf8(bytes).map_err(|e| FetchError::Body(format!("invalid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn css_request(url: &str) -> FetchRequest {
        FetchRequest {
            node: NodeId::ROOT,
            url: url.to_string(),
            kind: ResourceKind::Stylesheet,
        }
    }

    fn poll_until(
        loader: &mut ResourceLoader,
        mut accept: impl FnMut(&ResourceEvent) -> bool,
    ) -> bool {
        for _ in 0..200 {
            if loader.poll().iter().any(&mut accept) {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn data_url_stylesheet_round_trips() {
        let mut loader = ResourceLoader::new();
        // base64 of "p { color: red }"
        loader.dispatch(
            css_request("data:text/css;base64,cCB7IGNvbG9yOiByZWQgfQ=="),
            None,
        );
        assert_eq!(loader.outstanding(), 1);
        let seen = poll_until(&mut loader, |event| {
            matches!(event, ResourceEvent::StylesheetLoaded { css } if css.contains("color: red"))
        });
        assert!(seen);
        assert_eq!(loader.outstanding(), 0);
    }

    #[test]
    fn completions_from_a_previous_generation_are_discarded() {
        let mut loader = ResourceLoader::new();
        // base64 of "p { color: red }" — issued before the navigation.
        loader.dispatch(
            css_request("data:text/css;base64,cCB7IGNvbG9yOiByZWQgfQ=="),
            None,
        );
        loader.begin_generation();
        // base64 of "em { color: lime }" — issued after.
        loader.dispatch(
            css_request("data:text/css;base64,ZW0geyBjb2xvcjogbGltZSB9"),
            None,
        );

        let mut stale_seen = false;
        let mut fresh_seen = false;
        for _ in 0..200 {
            for event in loader.poll() {
                if let ResourceEvent::StylesheetLoaded { css } = event {
                    stale_seen |= css.contains("red");
                    fresh_seen |= css.contains("lime");
                }
            }
            if fresh_seen {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(fresh_seen, "current-generation completion never arrived");
        assert!(!stale_seen, "stale completion leaked through");
    }

    #[test]
    fn failed_fetches_complete_with_a_failure_event() {
        let mut loader = ResourceLoader::new();
        loader.dispatch(css_request("data:text/css;base64,%%%not-base64%%%"), None);
        let seen = poll_until(&mut loader, |event| {
            matches!(event, ResourceEvent::Failed { .. })
        });
        assert!(seen);
        assert_eq!(loader.outstanding(), 0);
    }
}
