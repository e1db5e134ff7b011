use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::{
    errors::Result,
    providers::{ImageModel, ImageQuality, ImageRequest, ImageSize},
};

/// Turns a final prompt into an image URL with a single generation call.
#[derive(Clone)]
pub struct ImageRequester {
    model: Arc<dyn ImageModel>,
}

impl ImageRequester {
    pub fn new(model: Arc<dyn ImageModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Returns the URL of the first generated image, or `None` when the call
    /// fails or produces nothing. Failures are logged, never raised.
    pub async fn request_image(
        &self,
        prompt: &str,
        size: ImageSize,
        quality: ImageQuality,
    ) -> Option<String> {
        let request = ImageRequest {
            prompt: prompt.to_string(),
            size,
            quality,
            count: 1,
        };

        match self.model.generate(request).await {
            Ok(images) => {
                if let Some(revised) = images.first().and_then(|image| image.revised_prompt.as_deref()) {
                    debug!(target: "image_requester", revised_prompt = %revised, "provider revised the prompt");
                }
                let url = images.into_iter().next().and_then(|image| image.url);
                match &url {
                    Some(url) => info!(target: "image_requester", %size, %quality, "image generated: {url}"),
                    None => warn!(target: "image_requester", "image service returned no result"),
                }
                url
            }
            Err(err) => {
                warn!(target: "image_requester", error = %err, "image generation failed");
                None
            }
        }
    }

    pub async fn download(&self, url: &str) -> Result<Bytes> {
        self.model.fetch(url).await
    }
}
