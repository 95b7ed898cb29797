//! Stylesheet parsing.
//!
//! [CSS Syntax Level 3 § 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing)
//!
//! A single-pass rule parser: comments are stripped, at-rules are skipped
//! whole, selectors that fail to parse are dropped individually, and
//! declarations are kept as raw name/value pairs (validated when applied
//! during the cascade). Parsing never fails; worst case is an empty sheet.

use serde::Serialize;
use wren_common::warning::warn_once;

use crate::selector::{ParsedSelector, parse_selector};

/// Where a rule entered the cascade. Ordered: later origins win.
///
/// [CSS Cascading § 6.1](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Origin {
    /// Built-in defaults; lowest precedence.
    UserAgent,
    /// Document-supplied rules (`<style>`, linked sheets).
    Author,
}

/// One `name: value` pair, unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name.
    pub name: String,
    /// Raw value text, trimmed.
    pub value: String,
}

/// A style rule: selectors, declarations, and its cascade position.
/// Immutable once loaded.
#[derive(Debug, Clone)]
pub struct StyleRule {
    /// Alternative selectors; the rule applies if any matches.
    pub selectors: Vec<ParsedSelector>,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
    /// Cascade origin.
    pub origin: Origin,
    /// Position among all loaded rules; breaks specificity ties.
    pub source_order: u32,
}

/// An ordered collection of style rules.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    /// Rules in source order.
    pub rules: Vec<StyleRule>,
}

impl Stylesheet {
    /// Append another sheet's rules, renumbering them after this sheet's.
    pub fn append(&mut self, other: Self) {
        let base = u32::try_from(self.rules.len()).unwrap_or(u32::MAX);
        for (i, mut rule) in other.rules.into_iter().enumerate() {
            rule.source_order = base.saturating_add(u32::try_from(i).unwrap_or(u32::MAX));
            self.rules.push(rule);
        }
    }
}

/// Parse stylesheet text into rules with the given origin.
#[must_use]
pub fn parse_stylesheet(css: &str, origin: Origin) -> Stylesheet {
    let source = strip_comments(css);
    let mut rules = Vec::new();
    let mut order: u32 = 0;

    let mut rest = source.as_str();
    while let Some(open) = rest.find('{') {
        let prelude = &rest[..open];
        let Some(close) = find_block_end(&rest[open..]) else {
            warn_once("CSS", "unclosed block at end of stylesheet");
            break;
        };
        let body = &rest[open + 1..open + close];
        rest = &rest[open + close + 1..];

        // At-rules (media queries, keyframes, …) are out of scope; the
        // whole block is skipped.
        if prelude.trim_start().starts_with('@') {
            warn_once("CSS", "at-rules are not supported; block skipped");
            continue;
        }

        let selectors: Vec<ParsedSelector> = prelude
            .split(',')
            .filter_map(|raw| {
                let parsed = parse_selector(raw);
                if parsed.is_none() && !raw.trim().is_empty() {
                    warn_once("CSS", &format!("unsupported selector '{}' dropped", raw.trim()));
                }
                parsed
            })
            .collect();
        if selectors.is_empty() {
            continue;
        }

        let declarations = parse_declarations(body);
        if declarations.is_empty() {
            continue;
        }

        rules.push(StyleRule {
            selectors,
            declarations,
            origin,
            source_order: order,
        });
        order += 1;
    }

    Stylesheet { rules }
}

/// Split a declaration block into name/value pairs. Entries without a
/// colon are dropped with a warning.
fn parse_declarations(body: &str) -> Vec<Declaration> {
    body.split(';')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            let Some((name, value)) = entry.split_once(':') else {
                warn_once("CSS", &format!("malformed declaration '{entry}' dropped"));
                return None;
            };
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            if name.is_empty() || value.is_empty() {
                warn_once("CSS", &format!("malformed declaration '{entry}' dropped"));
                return None;
            }
            Some(Declaration { name, value })
        })
        .collect()
}

/// Index of the `}` closing the block whose `{` starts `block`, handling
/// nesting (for skipped at-rules).
fn find_block_end(block: &str) -> Option<usize> {
    let mut depth = 0_u32;
    for (i, c) in block.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start..].find("*/") {
            Some(end) => rest = &rest[start + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rules_in_source_order() {
        let sheet = parse_stylesheet("p { color: red; } div { color: blue; }", Origin::Author);
        assert_eq!(sheet.rules.len(), 2);
        assert_eq!(sheet.rules[0].source_order, 0);
        assert_eq!(sheet.rules[1].source_order, 1);
        assert_eq!(sheet.rules[0].declarations[0].name, "color");
    }

    #[test]
    fn drops_malformed_declarations_keeps_rest() {
        let sheet = parse_stylesheet("p { color red; width: 10px }", Origin::Author);
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].declarations.len(), 1);
        assert_eq!(sheet.rules[0].declarations[0].name, "width");
    }

    #[test]
    fn skips_at_rules_whole() {
        let css = "@media screen { p { color: red; } } div { color: blue; }";
        let sheet = parse_stylesheet(css, Origin::Author);
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].selectors.len(), 1);
    }

    #[test]
    fn strips_comments() {
        let sheet = parse_stylesheet("/* note */ p { /* inner */ color: red; }", Origin::Author);
        assert_eq!(sheet.rules.len(), 1);
    }

    #[test]
    fn selector_list_drops_only_bad_entries() {
        let sheet = parse_stylesheet("p, a:hover, div { color: red; }", Origin::Author);
        assert_eq!(sheet.rules[0].selectors.len(), 2);
    }

    #[test]
    fn append_renumbers_source_order() {
        let mut first = parse_stylesheet("p { color: red; }", Origin::Author);
        let second = parse_stylesheet("div { color: blue; }", Origin::Author);
        first.append(second);
        assert_eq!(first.rules[1].source_order, 1);
    }
}
