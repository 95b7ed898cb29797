//! JavaScript execution for the Wren rendering pipeline.
//!
//! Uses [Boa](https://boajs.dev/) as the JavaScript engine and implements
//! the parser's [`ScriptHost`] contract: when the tree builder closes an
//! inline `<script>` element it calls [`BoaScriptEngine::execute`]
//! synchronously, the script runs against the live [`DocumentHandle`], and
//! parsing resumes afterwards. Mutations the script makes go through the
//! handle's tracked mutation methods, so they invalidate derived state the
//! same way any other change does.
//!
//! # Globals
//!
//! - `console` - `log`, `warn`, `error`
//! - `document` - `getElementById`, `getElementsByTagName`, `createElement`,
//!   `createTextNode`, plus element wrappers with attribute and text access
//!
//! # Example
//!
//! ```ignore
//! use wren_js::BoaScriptEngine;
//!
//! let mut engine = BoaScriptEngine::new();
//! let document = parse_document(html, &mut engine, &mut sink);
//! ```

mod globals;

use boa_engine::{Context, Source};
use wren_dom::DocumentHandle;
use wren_html::{ScriptError, ScriptHost};

/// A Boa context bound to one document's lifetime.
///
/// Scripts in the same document share a global object, so state declared by
/// an earlier script is visible to later ones.
struct DocumentRealm {
    context: Context,
    document: DocumentHandle,
}

/// JavaScript engine for inline scripts.
///
/// [§ 8.1.6 JavaScript execution context](https://html.spec.whatwg.org/multipage/webappapis.html)
///
/// The realm is created lazily on the first script of a document and
/// replaced when a different document comes through (navigation).
#[derive(Default)]
pub struct BoaScriptEngine {
    realm: Option<DocumentRealm>,
}

impl BoaScriptEngine {
    /// Create an engine with no realm yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn realm_for(&mut self, document: &DocumentHandle) -> Result<&mut DocumentRealm, ScriptError> {
        let existing = self
            .realm
            .take()
            .filter(|realm| realm.document.ptr_eq(document));
        let realm = match existing {
            Some(realm) => realm,
            None => {
                let mut context = Context::default();
                globals::register_globals(&mut context, document).map_err(|err| {
                    ScriptError::Execution(format!("global registration failed: {err}"))
                })?;
                DocumentRealm {
                    context,
                    document: document.clone(),
                }
            }
        };
        Ok(self.realm.insert(realm))
    }
}

impl ScriptHost for BoaScriptEngine {
    fn execute(&mut self, source: &str, document: &DocumentHandle) -> Result<(), ScriptError> {
        let realm = self.realm_for(document)?;
        realm
            .context
            .eval(Source::from_bytes(source))
            .map(|_| ())
            .map_err(|err| ScriptError::Execution(err.to_string()))
    }
}
