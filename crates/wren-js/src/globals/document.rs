//! Document interface implementation.
//!
//! [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
//!
//! The `document` global and the element wrappers it hands out carry a
//! [`DocumentHandle`] as Boa native data. Every mutating method routes
//! through the handle's tracked mutation API, so script changes are
//! invalidated exactly like changes from any other source. The handle is a
//! single-threaded `Rc` the garbage collector never needs to trace, hence
//! the ignored fields.

use boa_engine::object::ObjectInitializer;
use boa_engine::object::builtins::JsArray;
use boa_engine::property::Attribute;
use boa_engine::{
    Context, JsArgs, JsData, JsError, JsNativeError, JsObject, JsResult, JsString, JsValue,
    NativeFunction, js_string,
};
use boa_gc::{Finalize, Trace};
use wren_dom::{DocumentHandle, NodeId};

/// Native state behind the `document` global.
#[derive(Clone, Trace, Finalize, JsData)]
struct DocumentRef {
    #[unsafe_ignore_trace]
    document: DocumentHandle,
}

/// Native state behind an element or text-node wrapper.
#[derive(Clone, Trace, Finalize, JsData)]
struct NodeRef {
    #[unsafe_ignore_trace]
    document: DocumentHandle,
    #[unsafe_ignore_trace]
    node: NodeId,
}

/// Register the `document` global object on the context.
///
/// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
///
/// # Errors
/// Returns an error if the `document` property cannot be defined.
pub fn register_document(context: &mut Context, document: &DocumentHandle) -> JsResult<()> {
    let object = ObjectInitializer::with_native_data(
        DocumentRef {
            document: document.clone(),
        },
        context,
    )
    .function(
        NativeFunction::from_copy_closure(get_element_by_id),
        js_string!("getElementById"),
        1,
    )
    .function(
        NativeFunction::from_copy_closure(get_elements_by_tag_name),
        js_string!("getElementsByTagName"),
        1,
    )
    .function(
        NativeFunction::from_copy_closure(create_element),
        js_string!("createElement"),
        1,
    )
    .function(
        NativeFunction::from_copy_closure(create_text_node),
        js_string!("createTextNode"),
        1,
    )
    .build();

    context.register_global_property(js_string!("document"), object, Attribute::all())
}

/// Build the wrapper object for one node.
///
/// Wrappers are created per lookup; two lookups of the same element yield
/// distinct objects over the same [`NodeId`].
fn wrap_node(document: &DocumentHandle, node: NodeId, context: &mut Context) -> JsObject {
    let tag = document.tag_name(node);
    let mut initializer = ObjectInitializer::with_native_data(
        NodeRef {
            document: document.clone(),
            node,
        },
        context,
    );
    let _ = initializer
        .function(
            NativeFunction::from_copy_closure(get_attribute),
            js_string!("getAttribute"),
            1,
        )
        .function(
            NativeFunction::from_copy_closure(set_attribute),
            js_string!("setAttribute"),
            2,
        )
        .function(
            NativeFunction::from_copy_closure(get_text_content),
            js_string!("getTextContent"),
            0,
        )
        .function(
            NativeFunction::from_copy_closure(set_text_content),
            js_string!("setTextContent"),
            1,
        )
        .function(
            NativeFunction::from_copy_closure(append_child),
            js_string!("appendChild"),
            1,
        )
        .function(
            NativeFunction::from_copy_closure(remove_node),
            js_string!("remove"),
            0,
        );
    if let Some(tag) = tag {
        // [§ 4.9 Interface Element]: tagName is uppercase for HTML elements.
        let _ = initializer.property(
            js_string!("tagName"),
            JsString::from(tag.to_ascii_uppercase()),
            Attribute::READONLY | Attribute::ENUMERABLE,
        );
    }
    initializer.build()
}

fn this_document(this: &JsValue) -> JsResult<DocumentHandle> {
    this.as_object()
        .and_then(|object| {
            object
                .downcast_ref::<DocumentRef>()
                .map(|data| data.document.clone())
        })
        .ok_or_else(|| type_error("`this` is not the document"))
}

fn this_node(this: &JsValue) -> JsResult<NodeRef> {
    this.as_object()
        .and_then(|object| {
            object
                .downcast_ref::<NodeRef>()
                .map(|data| NodeRef::clone(&data))
        })
        .ok_or_else(|| type_error("`this` is not a document node"))
}

fn type_error(message: &str) -> JsError {
    JsError::from(JsNativeError::typ().with_message(message.to_string()))
}

fn string_arg(args: &[JsValue], index: usize, context: &mut Context) -> JsResult<String> {
    args.get_or_undefined(index)
        .to_string(context)
        .map(|s| s.to_std_string_escaped())
}

/// [§ 5.1 getElementById](https://dom.spec.whatwg.org/#dom-nonelementparentnode-getelementbyid)
fn get_element_by_id(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let document = this_document(this)?;
    let id = string_arg(args, 0, context)?;
    if id.is_empty() {
        return Ok(JsValue::null());
    }
    Ok(document
        .element_by_id(&id)
        .map_or_else(JsValue::null, |node| {
            wrap_node(&document, node, context).into()
        }))
}

/// [§ 4.5 getElementsByTagName](https://dom.spec.whatwg.org/#dom-document-getelementsbytagname)
///
/// Returns a plain array snapshot, not a live collection.
fn get_elements_by_tag_name(
    this: &JsValue,
    args: &[JsValue],
    context: &mut Context,
) -> JsResult<JsValue> {
    let document = this_document(this)?;
    let tag = string_arg(args, 0, context)?;
    let wrappers: Vec<JsValue> = document
        .elements_by_tag_name(&tag)
        .into_iter()
        .map(|node| wrap_node(&document, node, context).into())
        .collect();
    Ok(JsArray::from_iter(wrappers, context).into())
}

/// [§ 4.5 createElement](https://dom.spec.whatwg.org/#dom-document-createelement)
fn create_element(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let document = this_document(this)?;
    let tag = string_arg(args, 0, context)?;
    if tag.is_empty() {
        return Err(type_error("createElement requires a tag name"));
    }
    let node = document.create_element(&tag);
    Ok(wrap_node(&document, node, context).into())
}

/// [§ 4.5 createTextNode](https://dom.spec.whatwg.org/#dom-document-createtextnode)
fn create_text_node(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let document = this_document(this)?;
    let data = string_arg(args, 0, context)?;
    let node = document.create_text(&data);
    Ok(wrap_node(&document, node, context).into())
}

/// [§ 4.9 getAttribute](https://dom.spec.whatwg.org/#dom-element-getattribute)
fn get_attribute(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let node = this_node(this)?;
    let name = string_arg(args, 0, context)?;
    Ok(node
        .document
        .attribute(node.node, &name)
        .map_or_else(JsValue::null, |value| JsString::from(value).into()))
}

/// [§ 4.9 setAttribute](https://dom.spec.whatwg.org/#dom-element-setattribute)
fn set_attribute(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let node = this_node(this)?;
    let name = string_arg(args, 0, context)?;
    let value = string_arg(args, 1, context)?;
    node.document.set_attribute(node.node, &name, &value);
    Ok(JsValue::undefined())
}

/// Concatenated descendant text, like `textContent`.
fn get_text_content(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let node = this_node(this)?;
    Ok(JsString::from(node.document.text_content(node.node)).into())
}

/// Replace the node's content with one text child, like `textContent = v`.
fn set_text_content(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let node = this_node(this)?;
    let text = string_arg(args, 0, context)?;
    node.document.set_text_content(node.node, &text);
    Ok(JsValue::undefined())
}

/// [§ 4.4 appendChild](https://dom.spec.whatwg.org/#dom-node-appendchild)
fn append_child(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let parent = this_node(this)?;
    let child_value = args.get_or_undefined(0);
    let child = child_value
        .as_object()
        .and_then(|object| object.downcast_ref::<NodeRef>().map(|data| data.node))
        .ok_or_else(|| type_error("appendChild expects a document node"))?;
    parent.document.append_child(parent.node, child);
    Ok(child_value.clone())
}

/// [§ 4.9 remove](https://dom.spec.whatwg.org/#dom-childnode-remove)
fn remove_node(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let node = this_node(this)?;
    let parent = node.document.state().tree.parent(node.node);
    if let Some(parent) = parent {
        node.document.remove_child(parent, node.node);
    }
    Ok(JsValue::undefined())
}
