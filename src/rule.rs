use crate::property::{Property, parse_declarations};
use crate::specificity::Specificity;

/// One selector paired with its declarations, specificity, and the 1-based
/// position of its originating block in the stylesheet. Comma-separated
/// selectors of the same block become separate rules sharing `order` and
/// the same property list.
#[derive(Debug, Clone)]
pub struct Rule {
    selector: String,
    properties: Vec<Property>,
    specificity: Specificity,
    order: usize,
}

impl Rule {
    pub fn new(
        selector: impl Into<String>,
        properties: Vec<Property>,
        specificity: Specificity,
        order: usize,
    ) -> Self {
        Rule {
            selector: selector.into(),
            properties,
            specificity,
            order,
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn specificity(&self) -> Specificity {
        self.specificity
    }

    pub fn order(&self) -> usize {
        self.order
    }
}

/// Split cleaned stylesheet text into rules.
///
/// Blocks are separated by `}`; a block without `{` is not a rule and is
/// dropped. The output is in stylesheet order, NOT sorted by priority;
/// sorting is the cascade resolver's job.
pub(crate) fn rules_from_css(cleaned: &str) -> Vec<Rule> {
    let mut rules = Vec::new();

    for (index, block) in cleaned.split('}').enumerate() {
        let Some((selector_part, declaration_part)) = block.split_once('{') else {
            continue;
        };
        let properties = parse_declarations(declaration_part);
        let order = index + 1;

        for selector in selector_part.split(',') {
            let selector = selector.trim();
            if selector.is_empty() {
                continue;
            }
            rules.push(Rule::new(
                selector,
                properties.clone(),
                Specificity::from_selector(selector),
                order,
            ));
        }
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_one_rule_per_selector_sharing_block_order() {
        let rules = rules_from_css("h1, .title { color: red; } p { margin: 0; }");
        assert_eq!(rules.len(), 3);

        assert_eq!(rules[0].selector(), "h1");
        assert_eq!(rules[1].selector(), ".title");
        assert_eq!(rules[0].order(), rules[1].order());
        assert_eq!(rules[2].selector(), "p");
        assert_eq!(rules[2].order(), 2);

        assert_eq!(rules[0].properties(), rules[1].properties());
        assert_ne!(rules[0].specificity(), rules[1].specificity());
    }

    #[test]
    fn specificity_is_computed_per_individual_selector() {
        let rules = rules_from_css("a, #nav a { color: blue; }");
        assert_eq!(rules[0].specificity().values(), (0, 0, 1));
        assert_eq!(rules[1].specificity().values(), (1, 0, 1));
    }

    #[test]
    fn blocks_without_braces_are_dropped() {
        let rules = rules_from_css("    a { color: red; }  stray text ");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selector(), "a");
    }

    #[test]
    fn empty_stylesheet_yields_no_rules() {
        assert!(rules_from_css("").is_empty());
        assert!(rules_from_css("   ").is_empty());
    }

    #[test]
    fn properties_keep_parse_order_and_duplicates() {
        let rules = rules_from_css("a { color: red; color: blue; padding: 0; }");
        let values: Vec<&str> = rules[0]
            .properties()
            .iter()
            .map(|p| p.value())
            .collect();
        assert_eq!(values, vec!["red", "blue", "0"]);
    }
}
