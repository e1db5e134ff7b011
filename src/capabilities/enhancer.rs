use std::sync::Arc;

use tracing::{debug, warn};

use crate::providers::{ChatModel, ChatRequest};

pub const DEFAULT_TARGET_USE: &str = "general";

const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.7;

/// Asks a chat model to elaborate a basic prompt for a given use.
///
/// Enhancement is best effort: any failure is logged and the basic prompt is
/// handed back unchanged.
#[derive(Clone)]
pub struct PromptEnhancer {
    model: Arc<dyn ChatModel>,
}

impl PromptEnhancer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn enhance(&self, basic_prompt: &str, target_use: &str) -> String {
        let target_use = match target_use.trim() {
            "" => DEFAULT_TARGET_USE,
            other => other,
        };

        let request = ChatRequest {
            system: system_instruction(target_use),
            user: format!("Improve the following prompt: {basic_prompt}"),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        match self.model.complete(request).await {
            Ok(text) if !text.trim().is_empty() => {
                debug!(target: "enhancer", target_use, "prompt enhanced");
                text.trim().to_string()
            }
            Ok(_) => {
                warn!(target: "enhancer", "model returned an empty prompt, keeping the basic prompt");
                basic_prompt.to_string()
            }
            Err(err) => {
                warn!(target: "enhancer", error = %err, "prompt enhancement failed, keeping the basic prompt");
                basic_prompt.to_string()
            }
        }
    }
}

fn system_instruction(target_use: &str) -> String {
    format!(
        "You are an expert at writing high-quality prompts for AI image generation systems.\n\
         Your task is to take a basic prompt and improve it for this purpose: {target_use}\n\
         \n\
         Guidelines:\n\
         1. Add relevant technical details (resolution, photographic style and so on).\n\
         2. Use keywords known to produce high-quality results.\n\
         3. Add specific instructions for composition and lighting.\n\
         4. Keep the prompt clear and well structured.\n\
         5. Add negative prompts for things that should not appear.\n\
         \n\
         Return only the improved prompt, without any explanation."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::testing::ScriptedChat;

    #[tokio::test]
    async fn returns_trimmed_completion() {
        let chat = Arc::new(ScriptedChat::replying("\n  a majestic red fox, 8k  \n"));
        let enhancer = PromptEnhancer::new(chat.clone());

        let enhanced = enhancer.enhance("red fox, high quality", "marketing").await;

        assert_eq!(enhanced, "a majestic red fox, 8k");
        let request = chat.last_request();
        assert!(request.system.contains("for this purpose: marketing"));
        assert!(request.user.ends_with("red fox, high quality"));
        assert_eq!(request.max_tokens, 300);
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn failure_returns_basic_prompt() {
        let enhancer = PromptEnhancer::new(Arc::new(ScriptedChat::failing("401 unauthorized")));
        let basic = "cat, style: sketch, high quality, detailed, professional";

        assert_eq!(enhancer.enhance(basic, DEFAULT_TARGET_USE).await, basic);
    }

    #[tokio::test]
    async fn empty_completion_returns_basic_prompt() {
        let enhancer = PromptEnhancer::new(Arc::new(ScriptedChat::replying("   ")));
        assert_eq!(enhancer.enhance("cat", "art").await, "cat");
    }

    #[tokio::test]
    async fn blank_target_use_falls_back_to_general() {
        let chat = Arc::new(ScriptedChat::replying("ok"));
        PromptEnhancer::new(chat.clone()).enhance("cat", "  ").await;
        assert!(chat.last_request().system.contains("for this purpose: general"));
    }
}
