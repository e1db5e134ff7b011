use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    elements::{ElementSet, Field},
    providers::{ChatModel, ChatRequest},
};

const MAX_TOKENS: u32 = 400;
// Low: the answer is parsed by machine, not read by people.
const TEMPERATURE: f32 = 0.3;

const SYSTEM_INSTRUCTION: &str = "You are an expert at analysing images and extracting the elements of an image-generation prompt.\n\
Take the description of an image and split it into these 8 elements:\n\
1. subject\n\
2. composition\n\
3. style\n\
4. lighting\n\
5. color\n\
6. mood\n\
7. details\n\
8. context\n\
\n\
Answer with a JSON object that uses exactly these keys.";

/// Recovers an [`ElementSet`] from a free-text image description.
#[derive(Clone)]
pub struct ReverseEngineer {
    model: Arc<dyn ChatModel>,
}

impl ReverseEngineer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Never fails: a failed request yields an empty element set.
    pub async fn reverse(&self, description: &str) -> ElementSet {
        let request = ChatRequest {
            system: SYSTEM_INSTRUCTION.to_string(),
            user: format!("Analyse the following image: {description}"),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        match self.model.complete(request).await {
            Ok(response) => parse_elements(&response),
            Err(err) => {
                warn!(target: "reverse_engineer", error = %err, "reverse engineering request failed");
                ElementSet::default()
            }
        }
    }
}

/// Reads a model answer as JSON when possible, otherwise line by line.
pub fn parse_elements(response: &str) -> ElementSet {
    if let Some(elements) = extract_json(response) {
        return elements;
    }

    debug!(
        target: "reverse_engineer",
        "no usable JSON object in response, scanning lines"
    );
    scan_lines(response)
}

// Outermost brace pair, so fenced or prefixed JSON still parses. Unknown keys
// make the whole object unusable.
fn extract_json(response: &str) -> Option<ElementSet> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<ElementSet>(&response[start..=end]) {
        Ok(elements) => Some(elements),
        Err(err) => {
            debug!(target: "reverse_engineer", error = %err, "rejected JSON candidate");
            None
        }
    }
}

// The first field whose keyword appears on a line claims it, in canonical
// order, and takes whatever follows the line's last colon.
fn scan_lines(response: &str) -> ElementSet {
    let mut elements = ElementSet::default();

    for line in response.lines() {
        let line = line.trim().to_lowercase();
        let matched = Field::ALL
            .into_iter()
            .find(|field| line.contains(field.key()) || line.contains(field.native_label()));

        if let Some(field) = matched {
            let value = line.rsplit(':').next().unwrap_or_default().trim();
            elements.set(field, value);
        }
    }

    elements
}
