mod capabilities;
mod config;
mod elements;
mod errors;
mod prompt;
mod providers;
mod templates;
mod util;
mod workbench;

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::{Args, Parser, Subcommand};
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

use crate::{
    capabilities::{Capabilities, CampaignBuilder, DEFAULT_TARGET_USE},
    config::AppConfig,
    elements::{Composition, ElementSet, Field, Lighting, Mood, Preset, Style},
    errors::{AppError, Result},
    providers::{ImageQuality, ImageSize, OpenAiProvider},
    util::{ArtifactWriter, ImageArtifact, format_local, now_local},
    workbench::{Workbench, run_session},
};

const USAGE_EXAMPLES: &str = "\
Usage examples:

1. Basic prompt:
   prompt-forge generate --subject \"white persian cat\" --style \"professional photography\" --mood calm

2. Enhance the prompt and generate an image:
   prompt-forge generate --subject \"white persian cat\" --enhance --generate-image --download

3. Save a template:
   prompt-forge generate --subject \"mountain landscape\" --style \"oil painting\" --save-template mountain.json

4. Load a template:
   prompt-forge generate --load-template mountain.json

5. Start from a ready-made example:
   prompt-forge generate --example cat

6. Recover the elements of an image description:
   prompt-forge reverse \"a cat sitting on a sofa in a designer living room\"

7. Marketing campaign prompts:
   prompt-forge campaign \"eco coffee shop\" --color \"#2E8B57\" --color \"#DEB887\"";

/// Structured prompt builder for AI image generation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// OpenAI API key (defaults to OPENAI_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a prompt from the eight elements
    Generate(GenerateArgs),
    /// Split a free-text image description into the eight elements
    Reverse(ReverseArgs),
    /// Produce enhanced prompts for a marketing campaign
    Campaign(CampaignArgs),
    /// Line-oriented workbench with background model calls
    Interactive(ImageArgs),
    /// Print usage examples
    Examples,
    /// List the available choices for composition, style, lighting and mood
    Vocab,
}

#[derive(Args, Debug)]
struct ElementArgs {
    /// What or who is in the image
    #[arg(long)]
    subject: Option<String>,

    #[arg(long)]
    composition: Option<Composition>,

    #[arg(long)]
    style: Option<Style>,

    #[arg(long)]
    lighting: Option<Lighting>,

    /// Desired colors
    #[arg(long)]
    colors: Option<String>,

    #[arg(long)]
    mood: Option<Mood>,

    /// Extra details to include or leave out
    #[arg(long)]
    details: Option<String>,

    /// What the image is for
    #[arg(long)]
    context: Option<String>,
}

impl ElementArgs {
    fn apply_to(self, elements: &mut ElementSet) {
        let overrides = [
            (Field::Subject, self.subject),
            (Field::Composition, self.composition.map(|v| v.to_string())),
            (Field::Style, self.style.map(|v| v.to_string())),
            (Field::Lighting, self.lighting.map(|v| v.to_string())),
            (Field::Color, self.colors),
            (Field::Mood, self.mood.map(|v| v.to_string())),
            (Field::Details, self.details),
            (Field::Context, self.context),
        ];

        for (field, value) in overrides {
            if let Some(value) = value {
                elements.set(field, value);
            }
        }
    }
}

#[derive(Args, Debug)]
struct ImageArgs {
    /// Image size
    #[arg(long, value_enum, default_value_t)]
    size: ImageSize,

    /// Image quality
    #[arg(long, value_enum, default_value_t)]
    quality: ImageQuality,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    elements: ElementArgs,

    /// Start from a ready-made example
    #[arg(long, value_enum)]
    example: Option<Preset>,

    /// Start from a saved template
    #[arg(long, conflicts_with = "example")]
    load_template: Option<PathBuf>,

    /// Save the elements as a template
    #[arg(long)]
    save_template: Option<PathBuf>,

    /// Refine the prompt with the language model
    #[arg(long)]
    enhance: bool,

    /// What the enhanced prompt is for
    #[arg(long, default_value = DEFAULT_TARGET_USE)]
    target_use: String,

    /// Generate an image from the final prompt
    #[arg(long)]
    generate_image: bool,

    #[command(flatten)]
    image: ImageArgs,

    /// Download the generated image into the artifacts directory
    #[arg(long, requires = "generate_image")]
    download: bool,
}

#[derive(Args, Debug)]
struct ReverseArgs {
    /// Free-text description of the image
    description: String,

    /// Save the recovered elements as a template
    #[arg(long)]
    save_template: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CampaignArgs {
    /// Kind of business the campaign is for
    business_type: String,

    /// Brand color, repeatable
    #[arg(long = "color")]
    colors: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        api_key,
        config,
        command,
        ..
    } = cli;

    match command {
        Commands::Examples => {
            println!("{USAGE_EXAMPLES}");
            Ok(())
        }
        Commands::Vocab => {
            print_vocabulary();
            Ok(())
        }
        command => {
            let config = AppConfig::load(config.as_deref(), api_key)?;
            match command {
                Commands::Generate(args) => generate(&config, args).await,
                Commands::Reverse(args) => reverse(&config, args).await,
                Commands::Campaign(args) => campaign(&config, args).await,
                Commands::Interactive(args) => interactive(&config, args).await,
                Commands::Examples | Commands::Vocab => Ok(()),
            }
        }
    }
}

fn connect(config: &AppConfig) -> Result<Capabilities> {
    config.require_api_key()?;
    let provider = Arc::new(OpenAiProvider::from_config(&config.openai)?);
    info!(
        target: "cli",
        chat_model = %config.openai.chat_model,
        image_model = %config.openai.image_model,
        "model provider ready"
    );
    Ok(Capabilities::new(provider.clone(), provider))
}

async fn generate(config: &AppConfig, args: GenerateArgs) -> Result<()> {
    let capabilities = if args.enhance || args.generate_image {
        Some(connect(config)?)
    } else {
        None
    };

    let mut elements = if let Some(preset) = args.example {
        println!("Loaded example: {}", preset.name());
        preset.elements()
    } else if let Some(path) = &args.load_template {
        let elements = templates::load(path).await?;
        println!("Loaded template: {}", path.display());
        elements
    } else {
        ElementSet::default()
    };
    args.elements.apply_to(&mut elements);

    if !elements.has_subject() {
        return Err(AppError::invalid_input(
            "please enter at least a subject (--subject)",
        ));
    }

    let basic_prompt = prompt::assemble(&elements);
    println!("Basic prompt:\n{basic_prompt}\n");

    let mut final_prompt = basic_prompt;
    if let Some(capabilities) = capabilities.as_ref().filter(|_| args.enhance) {
        final_prompt = capabilities
            .enhancer
            .enhance(&final_prompt, &args.target_use)
            .await;
        println!("Enhanced prompt:\n{final_prompt}\n");
    }

    if let Some(path) = &args.save_template {
        templates::save(&elements, path).await?;
        println!("Template saved to: {}", path.display());
    }

    if let Some(capabilities) = capabilities.as_ref().filter(|_| args.generate_image) {
        println!("Generating image...");
        let requester = &capabilities.images;
        let Some(url) = requester
            .request_image(&final_prompt, args.image.size, args.image.quality)
            .await
        else {
            println!("Image generation failed");
            return Ok(());
        };
        println!("Image created: {url}");

        if args.download {
            let data = requester.download(&url).await?;
            let writer = ArtifactWriter::new(config.artifacts_dir.clone()).await?;
            let path = writer
                .persist(&ImageArtifact {
                    data,
                    prompt: final_prompt,
                    model: requester.model_name().to_string(),
                    size: args.image.size,
                    quality: args.image.quality,
                    source_url: url,
                })
                .await?;
            println!("Image saved to: {}", path.display());
        }
    }

    Ok(())
}

async fn reverse(config: &AppConfig, args: ReverseArgs) -> Result<()> {
    let capabilities = connect(config)?;
    let elements = capabilities
        .reverse_engineer
        .reverse(&args.description)
        .await;

    if elements.is_empty() {
        warn!(target: "cli", "no elements could be recovered from the description");
        println!("Could not extract any elements");
        return Ok(());
    }

    for field in Field::ALL {
        println!("{:>12}: {}", field.key(), elements.get(field));
    }

    if elements.has_subject() {
        println!("\nPrompt:\n{}", prompt::assemble(&elements));
    }

    if let Some(path) = &args.save_template {
        templates::save(&elements, path).await?;
        println!("Template saved to: {}", path.display());
    }

    Ok(())
}

async fn campaign(config: &AppConfig, args: CampaignArgs) -> Result<()> {
    if args.business_type.trim().is_empty() {
        return Err(AppError::invalid_input("the business type must not be empty"));
    }

    let builder: CampaignBuilder = connect(config)?.campaign();
    let prompts = builder
        .build_campaign(&args.business_type, &args.colors)
        .await;

    for (asset, prompt) in prompts {
        println!("[{asset}]\n{prompt}\n");
    }

    Ok(())
}

async fn interactive(config: &AppConfig, args: ImageArgs) -> Result<()> {
    let capabilities = connect(config)?;
    let (mut workbench, events) = Workbench::new(capabilities);
    workbench.set_image_options(args.size, args.quality);

    let input = BufReader::new(tokio::io::stdin());
    run_session(workbench, events, input, std::io::stdout()).await
}

fn print_vocabulary() {
    fn list(name: &str, values: impl Iterator<Item = &'static str>) {
        println!("{name}:");
        for value in values {
            println!("  {value}");
        }
    }

    list("composition", Composition::ALL.iter().map(|v| v.as_str()));
    list("style", Style::ALL.iter().map(|v| v.as_str()));
    list("lighting", Lighting::ALL.iter().map(|v| v.as_str()));
    list("mood", Mood::ALL.iter().map(|v| v.as_str()));
    list("example", Preset::ALL.iter().map(|v| v.name()));
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_timer(LocalTimer)
        .init();
}

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = now_local();
        write!(w, "{}", format_local(&now, "%Y-%m-%d %H:%M:%S%:z"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn offline_config() -> AppConfig {
        AppConfig {
            openai: crate::config::OpenAiConfig {
                api_key: None,
                base_url: "http://localhost:9/v1".into(),
                chat_model: "gpt-4".into(),
                image_model: "dall-e-3".into(),
                request_timeout: None,
            },
            artifacts_dir: PathBuf::from("artifacts"),
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags_override_example() {
        let cli = Cli::parse_from([
            "prompt-forge",
            "generate",
            "--example",
            "cat",
            "--style",
            "3D render",
            "--colors",
            "pastel",
        ]);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.example, Some(Preset::Cat));

        let mut elements = args.example.unwrap().elements();
        args.elements.apply_to(&mut elements);
        assert_eq!(elements.style, "3D render");
        assert_eq!(elements.color, "pastel");
        assert_eq!(elements.subject, "white persian cat");
    }

    #[test]
    fn enumerated_flags_reject_free_text() {
        let result = Cli::try_parse_from(["prompt-forge", "generate", "--subject", "x", "--mood", "gloomy"]);
        assert!(result.is_err());
    }

    #[test]
    fn image_options_default() {
        let cli = Cli::parse_from(["prompt-forge", "generate", "--subject", "x", "--generate-image"]);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.image.size, ImageSize::Square);
        assert_eq!(args.image.quality, ImageQuality::Standard);
        assert_eq!(args.target_use, "general");
        assert!(!args.download);
    }

    #[test]
    fn download_requires_image_generation() {
        let result = Cli::try_parse_from(["prompt-forge", "generate", "--subject", "x", "--download"]);
        assert!(result.is_err());
    }

    #[test]
    fn campaign_collects_colors() {
        let cli = Cli::parse_from([
            "prompt-forge",
            "campaign",
            "bakery",
            "--color",
            "#fff",
            "--color",
            "#000",
        ]);
        let Commands::Campaign(args) = cli.command else {
            panic!("expected campaign");
        };
        assert_eq!(args.business_type, "bakery");
        assert_eq!(args.colors, ["#fff", "#000"]);
    }

    #[tokio::test]
    async fn generate_without_subject_is_rejected_before_any_call() {
        let config = offline_config();
        let cli = Cli::parse_from(["prompt-forge", "generate", "--style", "sketch"]);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };

        let result = generate(&config, args).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn missing_credentials_stop_model_commands() {
        let config = offline_config();
        let cli = Cli::parse_from(["prompt-forge", "generate", "--subject", "x", "--enhance"]);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };

        let result = generate(&config, args).await;
        assert!(matches!(result, Err(AppError::MissingConfig(_))));
    }
}
