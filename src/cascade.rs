use crate::debug::DebugLogger;
use crate::property::{Property, build_declaration_string, parse_declarations};
use crate::rule::Rule;
use crate::specificity::Specificity;
use kuchiki::NodeRef;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::rc::Rc;

/// The selector failed to parse; the rule carrying it is skipped.
#[derive(Debug)]
pub struct SelectorError {
    selector: String,
}

impl SelectorError {
    pub fn selector(&self) -> &str {
        &self.selector
    }
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid selector: {}", self.selector)
    }
}

impl std::error::Error for SelectorError {}

/// Selector resolution capability. The cascade stays agnostic of the
/// matching algorithm; swapping the matcher swaps the selector dialect.
pub trait SelectorMatcher {
    /// The ordered set of elements under `root` matching `selector`, or a
    /// parse failure.
    fn resolve(&self, root: &NodeRef, selector: &str) -> Result<Vec<NodeRef>, SelectorError>;
}

/// Default matcher backed by the HTML tree library's own selector engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomMatcher;

impl SelectorMatcher for DomMatcher {
    fn resolve(&self, root: &NodeRef, selector: &str) -> Result<Vec<NodeRef>, SelectorError> {
        match root.select(selector) {
            Ok(matches) => Ok(matches.map(|m| m.as_node().clone()).collect()),
            Err(()) => Err(SelectorError {
                selector: selector.to_string(),
            }),
        }
    }
}

struct Winner {
    property: Property,
    specificity: Specificity,
    order: usize,
}

struct ElementEntry {
    node: NodeRef,
    winners: Vec<Winner>,
}

impl ElementEntry {
    /// Offer a candidate declaration from a rule processed in ascending
    /// `(specificity, order)`. Ties go to the newcomer, which is how
    /// document order breaks ties between rules of equal specificity.
    fn offer(&mut self, property: &Property, specificity: Specificity, order: usize) {
        let position = self
            .winners
            .iter()
            .position(|winner| winner.property.name().eq_ignore_ascii_case(property.name()));

        let Some(position) = position else {
            self.winners.push(Winner {
                property: property.clone(),
                specificity,
                order,
            });
            return;
        };

        let existing = &self.winners[position];
        let existing_important = existing.property.is_important();
        let new_important = property.is_important();

        // existing importance wins regardless of specificity
        if existing_important && !new_important {
            return;
        }

        let overrule = (!existing_important && new_important)
            || (specificity, order) >= (existing.specificity, existing.order);
        if overrule {
            // re-insert at the back, like a freshly written declaration
            self.winners.remove(position);
            self.winners.push(Winner {
                property: property.clone(),
                specificity,
                order,
            });
        }
    }
}

/// Per-conversion accumulator of winning declarations, keyed by element
/// identity. Two elements with identical markup must accumulate
/// independently, so the key is the node's allocation address; the stored
/// `NodeRef` pins the allocation for the accumulator's lifetime.
#[derive(Default)]
struct Accumulator {
    entries: HashMap<usize, ElementEntry>,
    touched: Vec<usize>,
}

impl Accumulator {
    fn entry(&mut self, node: &NodeRef) -> &mut ElementEntry {
        let key = Rc::as_ptr(&node.0) as usize;
        match self.entries.entry(key) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                self.touched.push(key);
                vacant.insert(ElementEntry {
                    node: node.clone(),
                    winners: Vec::new(),
                })
            }
        }
    }

    fn into_entries(mut self) -> Vec<ElementEntry> {
        self.touched
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .collect()
    }
}

/// Resolve the cascade over the whole tree and write the result into each
/// touched element's `style` attribute.
///
/// Rules are processed lowest-priority first so that later offers overwrite
/// earlier ones per property; pre-existing inline declarations are merged
/// last. An invalid selector skips its one rule and never aborts the pass.
pub(crate) fn apply_rules(
    root: &NodeRef,
    rules: &[Rule],
    matcher: &dyn SelectorMatcher,
    debug: Option<&DebugLogger>,
) {
    let mut sorted: Vec<&Rule> = rules.iter().collect();
    sorted.sort_by(|a, b| {
        a.specificity()
            .cmp(&b.specificity())
            .then_with(|| a.order().cmp(&b.order()))
    });

    let mut accumulator = Accumulator::default();

    for rule in sorted {
        let elements = match matcher.resolve(root, rule.selector()) {
            Ok(elements) => elements,
            Err(error) => {
                if let Some(logger) = debug {
                    logger.selector_skipped(error.selector());
                }
                continue;
            }
        };

        if let Some(logger) = debug {
            logger.selector_matched(rule.selector(), elements.len());
        }

        for element in &elements {
            let entry = accumulator.entry(element);
            for property in rule.properties() {
                entry.offer(property, rule.specificity(), rule.order());
            }
        }
    }

    let entries = accumulator.into_entries();
    if let Some(logger) = debug {
        logger.elements_styled(entries.len());
    }
    for entry in entries {
        let properties: Vec<Property> = entry
            .winners
            .into_iter()
            .map(|winner| winner.property)
            .collect();
        inline_properties_on_element(&entry.node, &properties);
    }
}

/// Merge computed stylesheet winners with an element's pre-existing inline
/// declarations and write the final `style` attribute.
///
/// Precedence: an inline declaration beats a non-important stylesheet
/// winner of the same name; a stylesheet winner marked `!important` beats a
/// non-important inline declaration; an inline declaration that is itself
/// `!important` beats everything. An empty merged set removes the `style`
/// attribute rather than leaving `style=""`.
pub fn inline_properties_on_element(element: &NodeRef, properties: &[Property]) {
    let Some(data) = element.as_element() else {
        return;
    };

    let existing_inline = data
        .attributes
        .borrow()
        .get("style")
        .map(parse_declarations)
        .unwrap_or_default();

    let merged = merge_with_inline(&existing_inline, properties);

    let mut attributes = data.attributes.borrow_mut();
    if merged.is_empty() {
        attributes.remove("style");
    } else {
        attributes.insert("style", build_declaration_string(&merged));
    }
}

/// Parse an element's current `style` attribute into declarations.
pub fn inline_styles(element: &NodeRef) -> Vec<Property> {
    element
        .as_element()
        .and_then(|data| data.attributes.borrow().get("style").map(parse_declarations))
        .unwrap_or_default()
}

fn merge_with_inline(existing_inline: &[Property], incoming: &[Property]) -> Vec<Property> {
    let mut merged: Vec<Property> = Vec::new();

    for property in incoming {
        let rival = existing_inline
            .iter()
            .find(|inline| inline.name().eq_ignore_ascii_case(property.name()));
        match rival {
            None => merged.push(property.clone()),
            Some(inline) => {
                if property.is_important() && !inline.is_important() {
                    merged.push(property.clone());
                }
            }
        }
    }

    for inline in existing_inline {
        let beaten = incoming.iter().any(|property| {
            property.name().eq_ignore_ascii_case(inline.name())
                && property.is_important()
                && !inline.is_important()
        });
        if !beaten {
            merged.push(inline.clone());
        }
    }

    merged
}
