//! User-agent stylesheet.
//!
//! [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html)
//!
//! Lowest cascade origin: any author rule overrides these regardless of
//! specificity.

use std::sync::OnceLock;

use crate::parser::{Origin, Stylesheet, parse_stylesheet};

/// Default rules for the elements the engine renders. A small subset of
/// the suggested default style sheet.
const UA_CSS: &str = "
head, link, meta, script, style, title { display: none; }

html, body, div, p, h1, h2, h3, h4, h5, h6, ul, ol, li,
header, footer, section, article, nav, aside, pre, blockquote {
    display: block;
}

span, a, em, strong, b, i, u, small, code, label, img { display: inline; }

body { margin: 8px; }
p { margin: 16px 0px; }
h1 { font-size: 32px; margin: 21px 0px; }
h2 { font-size: 24px; margin: 20px 0px; }
h3 { font-size: 19px; margin: 19px 0px; }
blockquote { margin: 16px 40px; }
";

/// The parsed user-agent stylesheet. Parsed once, shared after.
pub fn ua_stylesheet() -> &'static Stylesheet {
    static SHEET: OnceLock<Stylesheet> = OnceLock::new();
    SHEET.get_or_init(|| parse_stylesheet(UA_CSS, Origin::UserAgent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::DisplayValue;

    #[test]
    fn ua_sheet_parses_and_hides_metadata_elements() {
        let sheet = ua_stylesheet();
        assert!(!sheet.rules.is_empty());
        assert!(sheet.rules.iter().all(|r| r.origin == Origin::UserAgent));

        let hide = &sheet.rules[0];
        let mut style = crate::style::ComputedStyle::default();
        for declaration in &hide.declarations {
            assert!(style.apply_declaration(&declaration.name, &declaration.value));
        }
        assert_eq!(style.display, DisplayValue::None);
    }
}
