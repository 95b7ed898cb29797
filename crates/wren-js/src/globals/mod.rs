//! JavaScript global objects.
//!
//! Registered once per realm, when the first script of a document runs.
//!
//! - `console` - [Console Standard](https://console.spec.whatwg.org/)
//! - `document` - [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)

mod console;
mod document;

use boa_engine::{Context, JsResult};
use wren_dom::DocumentHandle;

/// Register all global objects on the context.
///
/// [§ 8.1.6.1 Realms and their counterparts](https://html.spec.whatwg.org/multipage/webappapis.html#realms-settings-objects-global-objects)
///
/// # Errors
/// Returns an error if a global property cannot be defined on the realm.
pub fn register_globals(context: &mut Context, document: &DocumentHandle) -> JsResult<()> {
    console::register_console(context)?;
    document::register_document(context, document)
}
