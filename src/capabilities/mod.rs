mod campaign;
mod enhancer;
mod image;
mod reverse;

pub use campaign::CampaignBuilder;
pub use enhancer::{DEFAULT_TARGET_USE, PromptEnhancer};
pub use image::ImageRequester;
pub use reverse::ReverseEngineer;

use std::sync::Arc;

use crate::providers::{ChatModel, ImageModel};

/// Every external-model capability, wired to one chat and one image backend.
#[derive(Clone)]
pub struct Capabilities {
    pub enhancer: PromptEnhancer,
    pub reverse_engineer: ReverseEngineer,
    pub images: ImageRequester,
}

impl Capabilities {
    pub fn new(chat: Arc<dyn ChatModel>, images: Arc<dyn ImageModel>) -> Self {
        Self {
            enhancer: PromptEnhancer::new(chat.clone()),
            reverse_engineer: ReverseEngineer::new(chat),
            images: ImageRequester::new(images),
        }
    }

    pub fn campaign(&self) -> CampaignBuilder {
        CampaignBuilder::new(self.enhancer.clone())
    }
}
