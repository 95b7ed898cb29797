//! Style resolution: selector matching and the cascade.
//!
//! [CSS Cascading Level 4 § 6](https://www.w3.org/TR/css-cascade-4/#cascading)

use std::collections::HashMap;

use wren_common::warning::warn_once;
use wren_dom::{DirtySet, DomTree, NodeId};

use crate::parser::{Origin, Stylesheet};
use crate::selector::Specificity;
use crate::style::{ComputedStyle, DisplayValue};

/// Resolved styles per element node. Elements inside a `display: none`
/// subtree have no entry.
pub type StyleMap = HashMap<NodeId, ComputedStyle>;

/// Resolve styles for the whole tree from scratch.
#[must_use]
pub fn compute_styles(tree: &DomTree, rules: &Stylesheet) -> StyleMap {
    resolve_styles(tree, rules, &DirtySet::default(), &StyleMap::new())
}

/// Resolve styles incrementally: nodes that are not style-dirty keep their
/// previous computed style untouched. An empty `previous` map means first
/// run and recomputes everything.
///
/// Resolving twice over unchanged inputs yields an identical map.
#[must_use]
pub fn resolve_styles(
    tree: &DomTree,
    rules: &Stylesheet,
    dirty: &DirtySet,
    previous: &StyleMap,
) -> StyleMap {
    let mut styles = StyleMap::new();
    let first_run = previous.is_empty();
    for &child in tree.children(NodeId::ROOT) {
        resolve_node(
            tree, rules, child, None, dirty, previous, first_run, &mut styles,
        );
    }
    styles
}

#[allow(clippy::too_many_arguments, reason = "internal recursion carries the pass context")]
fn resolve_node(
    tree: &DomTree,
    rules: &Stylesheet,
    id: NodeId,
    parent_style: Option<&ComputedStyle>,
    dirty: &DirtySet,
    previous: &StyleMap,
    first_run: bool,
    styles: &mut StyleMap,
) {
    if tree.as_element(id).is_none() {
        return;
    }

    // A clean node keeps its previous style; attribute changes dirty the
    // whole subtree, so inherited-value changes always reach here dirty.
    let style = if !first_run
        && !dirty.style_dirty(id)
        && let Some(kept) = previous.get(&id)
    {
        kept.clone()
    } else {
        style_for_element(tree, rules, id, parent_style)
    };

    // `display: none` removes the subtree from rendering entirely: no
    // entries for descendants.
    if style.display == DisplayValue::None {
        let _ = styles.insert(id, style);
        return;
    }

    for &child in tree.children(id) {
        resolve_node(
            tree,
            rules,
            child,
            Some(&style),
            dirty,
            previous,
            first_run,
            styles,
        );
    }
    let _ = styles.insert(id, style);
}

/// Compute one element's style: gather matching rules, order them by
/// (origin, specificity, source order) ascending, and apply declarations
/// so later entries win property-by-property.
///
/// [§ 6.1 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
fn style_for_element(
    tree: &DomTree,
    rules: &Stylesheet,
    id: NodeId,
    parent_style: Option<&ComputedStyle>,
) -> ComputedStyle {
    let mut matched: Vec<(Origin, Specificity, u32, &crate::parser::StyleRule)> = Vec::new();
    for rule in &rules.rules {
        let best = rule
            .selectors
            .iter()
            .filter(|selector| selector.matches(tree, id))
            .map(|selector| selector.specificity)
            .max();
        if let Some(specificity) = best {
            matched.push((rule.origin, specificity, rule.source_order, rule));
        }
    }
    matched.sort_by_key(|&(origin, specificity, order, _)| (origin, specificity, order));

    let mut style = ComputedStyle::inherited_from(parent_style);
    for (_, _, _, rule) in matched {
        for declaration in &rule.declarations {
            if !style.apply_declaration(&declaration.name, &declaration.value) {
                warn_once(
                    "CSS",
                    &format!(
                        "declaration '{}: {}' dropped",
                        declaration.name, declaration.value
                    ),
                );
            }
        }
    }
    style
}
