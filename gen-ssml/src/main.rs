//! gen-ssml - Split text and SSML documents into synthesis-sized chunks

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{LevelFilter, info};
use serde::Serialize;
use ssml_text::{Document, EditorConfig, Position, Prosody};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gen-ssml")]
#[command(about = "Split text and SSML documents into synthesis-sized chunks", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug output
    #[arg(short, long, default_value_t = false, global = true)]
    debug: bool,

    /// Override the configured chunk limit
    #[arg(long, global = true)]
    limit: Option<usize>,

    /// Override the configured elastic allowance
    #[arg(long, global = true)]
    elastic: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a text or SSML file (.ssml/.xml take the SSML path)
    File {
        /// Path to the input file
        path: PathBuf,

        /// Text encoding label (utf-8, big5, utf-16le, ...)
        #[arg(long, default_value = "utf-8")]
        encoding: String,

        /// Print chunks as JSON
        #[arg(long)]
        json: bool,
    },
    /// Chunk inline text, optionally with [:N秒] / 字[:ph] shorthand
    Text {
        /// The text to chunk
        text: String,

        /// Expand shorthand annotations
        #[arg(long)]
        shorthand: bool,

        /// Speaking rate (0.8-1.2, default 1.0)
        #[arg(long, default_value = "1.0")]
        rate: f64,

        /// Pitch in semitones (-2 to 2, default 0)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pitch: i32,

        /// Volume in dB (-6.0 to 6.0, default 0.0)
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        volume: f64,

        /// Print chunks as JSON
        #[arg(long)]
        json: bool,
    },
    /// Chunk an inline SSML document
    Ssml {
        /// The SSML markup
        markup: String,

        /// Print chunks as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the default chunk limit
    SetLimit {
        /// Maximum characters per chunk
        value: usize,
    },
    /// Set the default elastic allowance
    SetElastic {
        /// Escaping cost tolerated on the last chunk
        value: usize,
    },
}

/// One chunk in `--json` output.
#[derive(Debug, Serialize)]
struct ChunkOutput<'a> {
    index: usize,
    length: usize,
    text: &'a str,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let mut config = EditorConfig::load().context("Failed to load configuration")?;
    if let Some(limit) = args.limit {
        config.text_limit = limit;
    }
    if let Some(elastic) = args.elastic {
        config.elastic_value = elastic;
    }

    let mut document = Document::new(&config)
        .context("Invalid chunk budget")?
        .with_listener(|name: &str| info!("Voice changed to {}", name));

    let json = match &args.command {
        Commands::File {
            path,
            encoding,
            json,
        } => {
            document
                .open_text_file(path, encoding, Position::End)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            *json
        }
        Commands::Text {
            text,
            shorthand,
            rate,
            pitch,
            volume,
            json,
        } => {
            let prosody = Prosody::new(*rate, *pitch, *volume)?;
            if *shorthand {
                document.add_shorthand_text(text, &prosody, Position::End)?;
            } else if prosody.is_default() {
                document.add_text(text, Position::End)?;
            } else {
                document.insert_prosody(text, &prosody, Position::End)?;
            }
            *json
        }
        Commands::Ssml { markup, json } => {
            document
                .add_ssml_text(markup, Position::End)
                .context("Failed to chunk SSML")?;
            *json
        }
        Commands::Config { action } => return handle_config_command(action),
    };

    println!("{}", format_chunks(&document, json)?);
    Ok(())
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn format_chunks(document: &Document, json: bool) -> Result<String> {
    if json {
        let chunks: Vec<ChunkOutput<'_>> = document
            .paragraphs()
            .iter()
            .enumerate()
            .map(|(index, p)| ChunkOutput {
                index,
                length: p.len(),
                text: p.text(),
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&chunks)?);
    }

    Ok(document.to_string().trim_end().to_string())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = EditorConfig::load()?;
            println!("Configuration file: {:?}", EditorConfig::config_path()?);
            println!();
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::SetLimit { value } => {
            let mut config = EditorConfig::load()?;
            config.text_limit = (*value).max(1);
            config.save()?;
            println!("Default chunk limit set to: {}", config.text_limit);
        }
        ConfigAction::SetElastic { value } => {
            let mut config = EditorConfig::load()?;
            config.elastic_value = *value;
            config.save()?;
            println!("Default elastic allowance set to: {}", config.elastic_value);
        }
    }
    Ok(())
}
