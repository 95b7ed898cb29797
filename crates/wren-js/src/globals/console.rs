//! Console API implementation.
//!
//! [Console Standard](https://console.spec.whatwg.org/)
//!
//! `console.log` and `console.warn` go to stdout, `console.error` to
//! stderr, each with a prefix so script output is distinguishable from the
//! pipeline's own diagnostics.

use boa_engine::{
    Context, JsResult, JsValue, NativeFunction, js_string, object::ObjectInitializer,
    property::Attribute,
};

/// Register the `console` global object on the context.
///
/// [§ 1.1 Logging](https://console.spec.whatwg.org/#logging)
///
/// # Errors
/// Returns an error if the `console` property cannot be defined.
pub fn register_console(context: &mut Context) -> JsResult<()> {
    let console = ObjectInitializer::new(context)
        .function(
            NativeFunction::from_copy_closure(console_log),
            js_string!("log"),
            0,
        )
        .function(
            NativeFunction::from_copy_closure(console_warn),
            js_string!("warn"),
            0,
        )
        .function(
            NativeFunction::from_copy_closure(console_error),
            js_string!("error"),
            0,
        )
        .build();

    context.register_global_property(js_string!("console"), console, Attribute::all())
}

/// [§ 1.1.1 log](https://console.spec.whatwg.org/#log)
fn console_log(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let output = format_console_args(args, context)?;
    println!("[JS] {output}");
    Ok(JsValue::undefined())
}

/// [§ 1.1.3 warn](https://console.spec.whatwg.org/#warn)
fn console_warn(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let output = format_console_args(args, context)?;
    println!("[JS WARN] {output}");
    Ok(JsValue::undefined())
}

/// [§ 1.1.2 error](https://console.spec.whatwg.org/#error)
fn console_error(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let output = format_console_args(args, context)?;
    eprintln!("[JS ERROR] {output}");
    Ok(JsValue::undefined())
}

/// Stringify each argument and join with spaces.
///
/// [§ 2.1 Formatter](https://console.spec.whatwg.org/#formatter)
fn format_console_args(args: &[JsValue], context: &mut Context) -> JsResult<String> {
    let strings: Result<Vec<String>, _> = args
        .iter()
        .map(|arg| arg.to_string(context).map(|s| s.to_std_string_escaped()))
        .collect();

    Ok(strings?.join(" "))
}
