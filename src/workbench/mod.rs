//! Interactive front end over the prompt pipeline.
//!
//! The [`Workbench`] owns the form and the status line and is only touched by
//! the loop that drives it. Slow model calls run on spawned tasks that report
//! back through a [`WorkerEvent`] channel; the owning loop applies each event.
//! Nothing stops an operator from starting two calls at once, in which case
//! whichever finishes last wins.

mod command;
mod session;

pub use command::{Command, HELP};
pub use session::run_session;

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    capabilities::{Capabilities, DEFAULT_TARGET_USE},
    elements::{ElementSet, Field, Preset},
    errors::{AppError, Result},
    prompt, templates,
    providers::{ImageQuality, ImageSize},
};

pub const READY: &str = "ready";
const MISSING_SUBJECT: &str = "please enter at least a subject";

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Enhanced { basic: String, enhanced: String },
    ImageFinished { url: Option<String> },
    Reversed { elements: ElementSet },
}

pub struct Workbench {
    form: ElementSet,
    basic_prompt: Option<String>,
    enhanced_prompt: Option<String>,
    last_image_url: Option<String>,
    status: String,
    image_size: ImageSize,
    image_quality: ImageQuality,
    capabilities: Capabilities,
    events: mpsc::UnboundedSender<WorkerEvent>,
    in_flight: usize,
}

impl Workbench {
    pub fn new(capabilities: Capabilities) -> (Self, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let workbench = Self {
            form: ElementSet::default(),
            basic_prompt: None,
            enhanced_prompt: None,
            last_image_url: None,
            status: READY.to_string(),
            image_size: ImageSize::default(),
            image_quality: ImageQuality::default(),
            capabilities,
            events,
            in_flight: 0,
        };
        (workbench, receiver)
    }

    pub fn form(&self) -> &ElementSet {
        &self.form
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn basic_prompt(&self) -> Option<&str> {
        self.basic_prompt.as_deref()
    }

    pub fn enhanced_prompt(&self) -> Option<&str> {
        self.enhanced_prompt.as_deref()
    }

    pub fn last_image_url(&self) -> Option<&str> {
        self.last_image_url.as_deref()
    }

    /// Background calls started but not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn set_image_options(&mut self, size: ImageSize, quality: ImageQuality) {
        self.image_size = size;
        self.image_quality = quality;
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.form.set(field, value);
        self.status = format!("{field} updated");
    }

    pub fn generate_prompt(&mut self) -> Result<String> {
        let prompt = self.assemble_checked()?;
        self.basic_prompt = Some(prompt.clone());
        self.enhanced_prompt = None;
        self.status = "basic prompt created".to_string();
        Ok(prompt)
    }

    /// Starts an enhancement in the background.
    pub fn enhance(&mut self, target_use: Option<&str>) -> Result<()> {
        let basic = self.assemble_checked()?;
        self.basic_prompt = Some(basic.clone());

        let enhancer = self.capabilities.enhancer.clone();
        let target_use = target_use.unwrap_or(DEFAULT_TARGET_USE).to_string();
        let events = self.events.clone();
        tokio::spawn(async move {
            let enhanced = enhancer.enhance(&basic, &target_use).await;
            let _ = events.send(WorkerEvent::Enhanced { basic, enhanced });
        });
        self.in_flight += 1;

        self.status = "enhancing prompt...".to_string();
        Ok(())
    }

    /// Starts image generation from the enhanced prompt, or the basic one.
    pub fn request_image(&mut self) -> Result<()> {
        let basic = self.assemble_checked()?;
        let prompt = self.enhanced_prompt.clone().unwrap_or(basic);

        let images = self.capabilities.images.clone();
        let (size, quality) = (self.image_size, self.image_quality);
        let events = self.events.clone();
        tokio::spawn(async move {
            let url = images.request_image(&prompt, size, quality).await;
            let _ = events.send(WorkerEvent::ImageFinished { url });
        });
        self.in_flight += 1;

        self.status = "generating image (this can take a while)...".to_string();
        Ok(())
    }

    pub fn reverse(&mut self, description: &str) {
        let engineer = self.capabilities.reverse_engineer.clone();
        let description = description.to_string();
        let events = self.events.clone();
        tokio::spawn(async move {
            let elements = engineer.reverse(&description).await;
            let _ = events.send(WorkerEvent::Reversed { elements });
        });
        self.in_flight += 1;

        self.status = "analysing description...".to_string();
    }

    pub async fn save_template(&mut self, path: &Path) -> Result<()> {
        match templates::save(&self.form, path).await {
            Ok(()) => {
                self.status = format!("template saved to {}", path.display());
                Ok(())
            }
            Err(err) => {
                self.status = "saving the template failed".to_string();
                Err(err)
            }
        }
    }

    pub async fn load_template(&mut self, path: &Path) -> Result<()> {
        match templates::load(path).await {
            Ok(elements) => {
                self.replace_form(elements);
                self.status = format!("template loaded from {}", path.display());
                Ok(())
            }
            Err(err) => {
                self.status = "loading the template failed".to_string();
                Err(err)
            }
        }
    }

    pub fn load_example(&mut self, preset: Preset) {
        self.replace_form(preset.elements());
        self.status = format!("example loaded: {}", preset.name());
    }

    pub fn clear(&mut self) {
        self.replace_form(ElementSet::default());
        self.last_image_url = None;
        self.status = "all fields cleared".to_string();
    }

    /// Folds a finished background call into the visible state.
    pub fn apply(&mut self, event: WorkerEvent) {
        debug!(target: "workbench", ?event, "worker finished");
        self.in_flight = self.in_flight.saturating_sub(1);
        match event {
            WorkerEvent::Enhanced { basic, enhanced } => {
                self.status = if enhanced == basic {
                    "enhancement unavailable, kept the basic prompt".to_string()
                } else {
                    "prompt enhanced".to_string()
                };
                self.basic_prompt = Some(basic);
                self.enhanced_prompt = Some(enhanced);
            }
            WorkerEvent::ImageFinished { url: Some(url) } => {
                self.last_image_url = Some(url);
                self.status = "image created".to_string();
            }
            WorkerEvent::ImageFinished { url: None } => {
                self.status = "image generation failed".to_string();
            }
            WorkerEvent::Reversed { elements } => {
                if elements.is_empty() {
                    warn!(target: "workbench", "reverse engineering produced no elements");
                    self.status = "could not extract any elements".to_string();
                } else {
                    let count = elements.populated().count();
                    self.replace_form(elements);
                    self.status = format!("extracted {count} elements");
                }
            }
        }
    }

    fn replace_form(&mut self, elements: ElementSet) {
        self.form = elements;
        self.basic_prompt = None;
        self.enhanced_prompt = None;
    }

    fn assemble_checked(&mut self) -> Result<String> {
        if !self.form.has_subject() {
            self.status = MISSING_SUBJECT.to_string();
            return Err(AppError::invalid_input(MISSING_SUBJECT));
        }
        Ok(prompt::assemble(&self.form))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::capabilities::testing::{ScriptedChat, ScriptedImages};
    use tempfile::tempdir;

    fn workbench(
        chat: ScriptedChat,
        images: ScriptedImages,
    ) -> (Workbench, mpsc::UnboundedReceiver<WorkerEvent>) {
        Workbench::new(Capabilities::new(Arc::new(chat), Arc::new(images)))
    }

    fn offline() -> (Workbench, mpsc::UnboundedReceiver<WorkerEvent>) {
        workbench(ScriptedChat::failing("offline"), ScriptedImages::failing("offline"))
    }

    #[tokio::test]
    async fn rejects_actions_without_subject() {
        let (mut bench, mut events) = offline();
        bench.set_field(Field::Style, "sketch");

        assert!(matches!(bench.generate_prompt(), Err(AppError::InvalidInput(_))));
        assert!(bench.enhance(None).is_err());
        assert!(bench.request_image().is_err());
        assert_eq!(bench.status(), MISSING_SUBJECT);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn generates_basic_prompt() {
        let (mut bench, _events) = offline();
        bench.set_field(Field::Subject, "owl");

        let prompt = bench.generate_prompt().unwrap();

        assert_eq!(prompt, "owl, high quality, detailed, professional");
        assert_eq!(bench.basic_prompt(), Some(prompt.as_str()));
        assert_eq!(bench.status(), "basic prompt created");
    }

    #[tokio::test]
    async fn enhancement_result_is_applied_by_owner() {
        let (mut bench, mut events) =
            workbench(ScriptedChat::replying("an owl at dusk, 8k"), ScriptedImages::failing("-"));
        bench.set_field(Field::Subject, "owl");

        bench.enhance(Some("poster")).unwrap();
        assert_eq!(bench.status(), "enhancing prompt...");
        assert!(bench.enhanced_prompt().is_none());
        assert_eq!(bench.in_flight(), 1);

        let event = events.recv().await.unwrap();
        bench.apply(event);

        assert_eq!(bench.in_flight(), 0);
        assert_eq!(bench.enhanced_prompt(), Some("an owl at dusk, 8k"));
        assert_eq!(bench.status(), "prompt enhanced");
    }

    #[tokio::test]
    async fn failed_enhancement_keeps_basic_prompt() {
        let (mut bench, mut events) = offline();
        bench.load_example(Preset::Cat);

        bench.enhance(None).unwrap();
        let event = events.recv().await.unwrap();
        bench.apply(event);

        assert_eq!(bench.enhanced_prompt(), bench.basic_prompt());
        assert_eq!(bench.status(), "enhancement unavailable, kept the basic prompt");
    }

    #[tokio::test]
    async fn image_uses_enhanced_prompt_when_present() {
        let images = Arc::new(ScriptedImages::with_urls(&["https://img.example/owl.png"]));
        let capabilities = Capabilities::new(Arc::new(ScriptedChat::replying("refined owl")), images.clone());
        let (mut bench, mut events) = Workbench::new(capabilities);
        bench.set_field(Field::Subject, "owl");

        bench.enhance(None).unwrap();
        let event = events.recv().await.unwrap();
        bench.apply(event);

        bench.request_image().unwrap();
        let event = events.recv().await.unwrap();
        bench.apply(event);

        assert_eq!(bench.last_image_url(), Some("https://img.example/owl.png"));
        assert_eq!(bench.status(), "image created");
        assert_eq!(images.requests.lock().unwrap()[0].prompt, "refined owl");
    }

    #[tokio::test]
    async fn failed_image_updates_status_only() {
        let (mut bench, mut events) = offline();
        bench.set_field(Field::Subject, "owl");

        bench.request_image().unwrap();
        let event = events.recv().await.unwrap();
        bench.apply(event);

        assert!(bench.last_image_url().is_none());
        assert_eq!(bench.status(), "image generation failed");
    }

    #[tokio::test]
    async fn reverse_fills_the_form() {
        let (mut bench, mut events) = workbench(
            ScriptedChat::replying(r#"{"subject": "cat", "style": "realistic"}"#),
            ScriptedImages::failing("-"),
        );

        bench.reverse("a cat photo");
        let event = events.recv().await.unwrap();
        bench.apply(event);

        assert_eq!(bench.form().subject, "cat");
        assert_eq!(bench.form().style, "realistic");
        assert_eq!(bench.status(), "extracted 2 elements");
    }

    #[tokio::test]
    async fn empty_reverse_leaves_form_alone() {
        let (mut bench, _events) = offline();
        bench.set_field(Field::Subject, "owl");

        bench.apply(WorkerEvent::Reversed {
            elements: ElementSet::default(),
        });

        assert_eq!(bench.form().subject, "owl");
        assert_eq!(bench.status(), "could not extract any elements");
    }

    #[tokio::test]
    async fn template_save_load_and_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("landscape.json");
        let (mut bench, _events) = offline();

        bench.load_example(Preset::Landscape);
        bench.save_template(&path).await.unwrap();
        bench.clear();
        assert!(bench.form().is_empty());
        assert_eq!(bench.status(), "all fields cleared");

        bench.load_template(&path).await.unwrap();
        assert_eq!(bench.form(), &Preset::Landscape.elements());

        let missing = dir.path().join("missing.json");
        assert!(bench.load_template(&missing).await.is_err());
        assert_eq!(bench.status(), "loading the template failed");
        assert_eq!(bench.form(), &Preset::Landscape.elements());
    }
}
