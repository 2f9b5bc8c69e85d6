//! Moodlight CLI - emotion to environment server and tools

use clap::{Parser, Subcommand};
use colored::Colorize;
use moodlight::error::Result;
use moodlight::provider::create_provider;
use moodlight::{
    presets, Config, FixSuggestion, GenerateRequest, Generator, MoodlightError, Normalizer,
    NormalizerProfile, Server,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "moodlight")]
#[command(about = "Moodlight - emotion to room environment mapping")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,

        /// Normalizer profile YAML (overrides MOODLIGHT_PROFILE)
        #[arg(long)]
        profile: Option<PathBuf>,
    },

    /// Send one prompt upstream and print the normalized output
    Generate {
        /// Model name, e.g. gpt-4o-mini
        #[arg(short, long)]
        model: String,

        /// System prompt text
        #[arg(short, long, conflicts_with = "preset")]
        system: Option<String>,

        /// Built-in system prompt, by name or number (see `presets`)
        #[arg(long)]
        preset: Option<String>,

        /// Completion backend (openai, mock)
        #[arg(long, default_value = "openai")]
        provider: String,

        /// Normalizer profile YAML
        #[arg(long)]
        profile: Option<PathBuf>,

        /// User prompt
        prompt: String,
    },

    /// Normalize a model response read from a file or stdin
    Normalize {
        /// User prompt used for comfort cues and music seeding
        #[arg(long, default_value = "")]
        prompt: String,

        /// Normalizer profile YAML
        #[arg(long)]
        profile: Option<PathBuf>,

        /// JSON file, or `-` for stdin
        file: Option<String>,
    },

    /// List built-in system prompts
    Presets,
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let result = match cli.command {
        Commands::Serve { addr, profile } => serve(&config, &addr, profile.as_deref()).await,
        Commands::Generate {
            model,
            system,
            preset,
            provider,
            profile,
            prompt,
        } => {
            generate(
                &config,
                &provider,
                profile.as_deref(),
                GenerateRequest {
                    model,
                    system,
                    prompt,
                },
                preset.as_deref(),
            )
            .await
        }
        Commands::Normalize {
            prompt,
            profile,
            file,
        } => normalize(&config, profile.as_deref(), file.as_deref(), &prompt),
        Commands::Presets => {
            list_presets();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

/// `--profile` wins over `MOODLIGHT_PROFILE`; neither means built-in.
fn load_profile(config: &Config, cli_path: Option<&Path>) -> Result<NormalizerProfile> {
    match cli_path.or(config.profile_path.as_deref()) {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading normalizer profile");
            NormalizerProfile::load(path)
        }
        None => Ok(NormalizerProfile::default()),
    }
}

async fn serve(config: &Config, addr: &str, profile: Option<&Path>) -> Result<()> {
    let normalizer = Normalizer::new(load_profile(config, profile)?);
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; /generate will answer 500");
    }

    println!("{} Listening on {}", "→".cyan(), format!("http://{addr}").cyan().bold());
    Server::new(config, normalizer).run(addr).await
}

async fn generate(
    config: &Config,
    provider: &str,
    profile: Option<&Path>,
    mut req: GenerateRequest,
    preset: Option<&str>,
) -> Result<()> {
    if let Some(key) = preset {
        req.system = Some(presets::find(key)?.text.to_string());
    }

    let normalizer = Arc::new(Normalizer::new(load_profile(config, profile)?));
    let provider = create_provider(provider, config)?;
    eprintln!(
        "{} Using provider: {} | model: {}",
        "→".cyan(),
        provider.name().cyan().bold(),
        req.model.cyan()
    );

    let generator = Generator::new(provider, normalizer)
        .with_weather(moodlight::weather::WeatherClient::new(config.weather_url.clone()));
    let response = generator.generate(&req).await?;

    println!("{}", response.output);
    if let Some(usage) = response.usage {
        eprintln!(
            "  {} prompt {} | completion {} | total {}",
            "Tokens:".dimmed(),
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.total_tokens
        );
    }
    Ok(())
}

fn normalize(
    config: &Config,
    profile: Option<&Path>,
    file: Option<&str>,
    prompt: &str,
) -> Result<()> {
    let text = match file {
        None | Some("-") => std::io::read_to_string(std::io::stdin())?,
        Some(path) => std::fs::read_to_string(path)?,
    };

    let value: serde_json::Value = serde_json::from_str(&text)?;
    if !value.is_object() {
        return Err(MoodlightError::bad_request("Input must be a JSON object"));
    }

    let normalizer = Normalizer::new(load_profile(config, profile)?);
    let normalized = normalizer.normalize_value(&value, prompt);

    println!("{}", normalized.to_pretty_json());
    if normalized.repaired {
        eprintln!(
            "{} repaired ({} / {:?})",
            "✓".green(),
            normalized.quadrant,
            normalized.variant
        );
    } else {
        eprintln!("{} already normalized", "✓".green());
    }
    Ok(())
}

fn list_presets() {
    for (i, preset) in presets::PRESETS.iter().enumerate() {
        println!(
            "  {} {:<10} {}",
            format!("{}.", i + 1).cyan(),
            preset.name.bold(),
            preset.summary
        );
    }
}
