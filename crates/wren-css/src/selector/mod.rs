//! Selector parsing, matching, and specificity.
//!
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/)
//!
//! Supported: type, class, ID, and universal simple selectors; compound
//! selectors; descendant and child combinators. Anything else fails to
//! parse and the parser drops that selector (never the whole rule list).

use wren_dom::{DomTree, ElementData, NodeId};

/// A single condition on one element.
///
/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// `div`, `p`, … — matches by tag name.
    Type(String),
    /// `.class` — matches a whitespace-separated class token.
    Class(String),
    /// `#id` — matches the id attribute.
    Id(String),
    /// `*` — matches any element.
    Universal,
}

impl SimpleSelector {
    /// Whether this condition holds for the element.
    #[must_use]
    pub fn matches(&self, element: &ElementData) -> bool {
        match self {
            Self::Type(name) => element.tag_name.eq_ignore_ascii_case(name),
            Self::Class(class) => element.classes().any(|c| c == class),
            Self::Id(id) => element.id() == Some(id.as_str()),
            Self::Universal => true,
        }
    }
}

/// A sequence of simple selectors applying to one element simultaneously.
///
/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    /// The conditions; all must hold.
    pub simple_selectors: Vec<SimpleSelector>,
}

impl CompoundSelector {
    fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        tree.as_element(id)
            .is_some_and(|element| self.simple_selectors.iter().all(|s| s.matches(element)))
    }
}

/// Relationship between adjacent compound selectors.
///
/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `A B`: B is an arbitrary descendant of A.
    Descendant,
    /// `A > B`: B is a direct child of A.
    Child,
}

/// A chain of compound selectors joined by combinators.
///
/// The subject is the rightmost compound; the ancestor chain is stored
/// right-to-left so matching walks upward from the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound selector; the element it matches is the
    /// element the whole selector represents.
    pub subject: CompoundSelector,
    /// `(combinator, compound)` pairs going left from the subject.
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Selector weight: (ID count, class count, type count).
///
/// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

/// A parsed selector with its precomputed specificity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelector {
    /// The compound/combinator chain.
    pub complex: ComplexSelector,
    /// Cascade weight.
    pub specificity: Specificity,
}

impl ParsedSelector {
    /// Match this selector against an element with full tree context.
    ///
    /// [§ 4.1 Match a selector against an element](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element)
    #[must_use]
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        self.complex.subject.matches(tree, id)
            && matches_ancestor_chain(tree, id, &self.complex.ancestors)
    }
}

/// Match the remaining combinator links walking upward from `from`.
///
/// A descendant link may bind to any matching ancestor; committing to the
/// nearest one can wrongly reject the rest of the chain (consider
/// `section > div span` against `section > div > div > span`), so every
/// candidate binding is tried before giving up.
fn matches_ancestor_chain(
    tree: &DomTree,
    from: NodeId,
    links: &[(Combinator, CompoundSelector)],
) -> bool {
    let Some(((combinator, compound), rest)) = links.split_first() else {
        return true;
    };
    match combinator {
        Combinator::Child => tree.parent(from).is_some_and(|parent| {
            compound.matches(tree, parent) && matches_ancestor_chain(tree, parent, rest)
        }),
        Combinator::Descendant => tree
            .ancestors(from)
            .filter(|&ancestor| compound.matches(tree, ancestor))
            .any(|ancestor| matches_ancestor_chain(tree, ancestor, rest)),
    }
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

const fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit() || c == '-'
}

/// Parse one selector. Returns `None` for syntax this engine does not
/// support; the caller drops the selector and keeps going.
#[must_use]
pub fn parse_selector(raw: &str) -> Option<ParsedSelector> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut compounds: Vec<CompoundSelector> = Vec::new();
    let mut combinators: Vec<Combinator> = Vec::new();
    let mut current: Vec<SimpleSelector> = Vec::new();

    let mut chars = trimmed.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '.' | '#' => {
                let mut name = String::new();
                while chars.peek().copied().is_some_and(is_ident_char) {
                    name.extend(chars.next());
                }
                if name.is_empty() {
                    return None;
                }
                current.push(if c == '.' {
                    SimpleSelector::Class(name)
                } else {
                    SimpleSelector::Id(name)
                });
            }
            '*' => current.push(SimpleSelector::Universal),
            '>' => {
                if current.is_empty() {
                    return None;
                }
                compounds.push(CompoundSelector {
                    simple_selectors: std::mem::take(&mut current),
                });
                combinators.push(Combinator::Child);
                while chars.peek().copied().is_some_and(char::is_whitespace) {
                    let _ = chars.next();
                }
            }
            c if c.is_whitespace() => {
                while chars.peek().copied().is_some_and(char::is_whitespace) {
                    let _ = chars.next();
                }
                match chars.peek() {
                    // Trailing whitespace, or whitespace around an explicit
                    // combinator handled by its own arm.
                    None | Some('>') => {}
                    Some(_) => {
                        if current.is_empty() {
                            return None;
                        }
                        compounds.push(CompoundSelector {
                            simple_selectors: std::mem::take(&mut current),
                        });
                        combinators.push(Combinator::Descendant);
                    }
                }
            }
            c if is_ident_start(c) => {
                let mut name = String::from(c);
                while chars.peek().copied().is_some_and(is_ident_char) {
                    name.extend(chars.next());
                }
                current.push(SimpleSelector::Type(name.to_ascii_lowercase()));
            }
            _ => return None,
        }
    }
    if !current.is_empty() {
        compounds.push(CompoundSelector {
            simple_selectors: current,
        });
    }
    if compounds.is_empty() || compounds.len() != combinators.len() + 1 {
        return None;
    }

    let subject = compounds.pop()?;
    let ancestors: Vec<(Combinator, CompoundSelector)> =
        combinators.into_iter().zip(compounds).rev().collect();

    let complex = ComplexSelector { subject, ancestors };
    let specificity = specificity_of(&complex);
    Some(ParsedSelector {
        complex,
        specificity,
    })
}

/// [§ 17](https://www.w3.org/TR/selectors-4/#specificity-rules): count IDs,
/// then classes, then types; the universal selector counts nothing.
fn specificity_of(complex: &ComplexSelector) -> Specificity {
    let mut spec = Specificity::default();
    let compounds = std::iter::once(&complex.subject)
        .chain(complex.ancestors.iter().map(|(_, compound)| compound));
    for compound in compounds {
        for simple in &compound.simple_selectors {
            match simple {
                SimpleSelector::Id(_) => spec.0 += 1,
                SimpleSelector::Class(_) => spec.1 += 1,
                SimpleSelector::Type(_) => spec.2 += 1,
                SimpleSelector::Universal => {}
            }
        }
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use wren_dom::{AttributesMap, NodeType};

    fn element(tree: &mut DomTree, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut map = AttributesMap::new();
        for &(name, value) in attrs {
            map.set(name, value);
        }
        let id = tree.alloc(NodeType::Element(ElementData {
            tag_name: tag.to_string(),
            attrs: map,
        }));
        tree.append_child(parent, id);
        id
    }

    #[test]
    fn class_selector_matches_any_token() {
        let mut tree = DomTree::new();
        let p = element(&mut tree, NodeId::ROOT, "p", &[("class", "note highlight")]);
        assert!(parse_selector(".note").expect("parses").matches(&tree, p));
        assert!(parse_selector(".highlight").expect("parses").matches(&tree, p));
        assert!(!parse_selector(".high").expect("parses").matches(&tree, p));
    }

    #[test]
    fn descendant_matching_tries_every_candidate_ancestor() {
        // section > div > div > span: the nearest div ancestor of the span
        // fails the `section >` link, the outer one satisfies it.
        let mut tree = DomTree::new();
        let section = element(&mut tree, NodeId::ROOT, "section", &[]);
        let outer = element(&mut tree, section, "div", &[]);
        let inner = element(&mut tree, outer, "div", &[]);
        let span = element(&mut tree, inner, "span", &[]);

        let selector = parse_selector("section > div span").expect("parses");
        assert!(selector.matches(&tree, span));

        // Without the section wrapper no binding works.
        let mut bare = DomTree::new();
        let top = element(&mut bare, NodeId::ROOT, "div", &[]);
        let mid = element(&mut bare, top, "div", &[]);
        let leaf = element(&mut bare, mid, "span", &[]);
        assert!(!selector.matches(&bare, leaf));
    }

    #[test]
    fn parses_compound_selector() {
        let selector = parse_selector("div.note#main").expect("parses");
        assert_eq!(selector.specificity, Specificity(1, 1, 1));
        assert!(selector.complex.ancestors.is_empty());
        assert_eq!(selector.complex.subject.simple_selectors.len(), 3);
    }

    #[test]
    fn parses_descendant_and_child_chains() {
        let selector = parse_selector("div > p span").expect("parses");
        assert_eq!(
            selector
                .complex
                .ancestors
                .iter()
                .map(|(c, _)| *c)
                .collect::<Vec<_>>(),
            vec![Combinator::Descendant, Combinator::Child]
        );
    }

    #[test]
    fn rejects_unsupported_syntax() {
        assert!(parse_selector("a:hover").is_none());
        assert!(parse_selector("[href]").is_none());
        assert!(parse_selector("> p").is_none());
        assert!(parse_selector("").is_none());
    }

    #[test]
    fn specificity_orders_id_over_class_over_type() {
        let id = parse_selector("#a").expect("parses").specificity;
        let class = parse_selector(".a.b.c").expect("parses").specificity;
        let ty = parse_selector("div span p em").expect("parses").specificity;
        assert!(id > class);
        assert!(class > ty);
    }
}
