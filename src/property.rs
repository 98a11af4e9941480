/// One `name: value` declaration, as found in a rule block or a `style`
/// attribute. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: String,
    value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Property {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// `!important` is a marker inside the value, not a separate field.
    pub fn is_important(&self) -> bool {
        self.value.to_ascii_lowercase().contains("!important")
    }

    pub fn to_declaration(&self) -> String {
        format!("{}: {};", self.name, self.value)
    }
}

/// Split a declaration block into candidate declaration strings.
///
/// Splits on `;`, then re-joins any candidate that starts with `base64,`:
/// that semicolon belonged to a `url(data:...)` payload, not to the
/// declaration grammar. Never fails; empty input yields an empty vec.
pub fn split_into_declarations(text: &str) -> Vec<String> {
    let trimmed = text.trim().trim_end_matches(';');
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut declarations: Vec<String> = Vec::new();
    for candidate in trimmed.split(';') {
        let candidate = candidate.trim();
        if candidate.starts_with("base64,") {
            if let Some(previous) = declarations.last_mut() {
                previous.push(';');
                previous.push_str(candidate);
                continue;
            }
        }
        declarations.push(candidate.to_string());
    }
    declarations
}

/// Parse one candidate declaration. `None` means "not a valid declaration";
/// callers skip it silently.
pub fn parse_declaration(text: &str) -> Option<Property> {
    let (name, value) = text.split_once(':')?;
    let name = name.trim();
    let value = value.trim();
    if name.is_empty() || value.is_empty() {
        return None;
    }
    Some(Property::new(name, value))
}

pub fn parse_declarations(text: &str) -> Vec<Property> {
    split_into_declarations(text)
        .iter()
        .filter_map(|candidate| parse_declaration(candidate))
        .collect()
}

/// Exact inverse of the declaration split: `"name: value;"` pairs joined by
/// single spaces, input order preserved. This is the serialization written
/// back into `style` attributes.
pub fn build_declaration_string(properties: &[Property]) -> String {
    properties
        .iter()
        .map(Property::to_declaration)
        .collect::<Vec<_>>()
        .join(" ")
}
