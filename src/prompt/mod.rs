use crate::elements::{ElementSet, Field};

/// Appended to every assembled prompt.
pub const QUALITY_ENHANCERS: [&str; 3] = ["high quality", "detailed", "professional"];

/// Joins the populated elements into one comma-separated prompt.
///
/// The subject goes first and bare, the other elements follow in canonical
/// order as `label: value`, and the quality enhancers close the list. Values
/// are passed through untouched, commas included, so the result is meant for
/// people and models to read rather than to be split apart again.
pub fn assemble(elements: &ElementSet) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(Field::ALL.len() + QUALITY_ENHANCERS.len());

    for (field, value) in elements.populated() {
        match field.prompt_label() {
            Some(label) => parts.push(format!("{label}: {value}")),
            None => parts.push(value.to_string()),
        }
    }

    parts.extend(QUALITY_ENHANCERS.iter().map(|token| token.to_string()));
    parts.join(", ")
}
