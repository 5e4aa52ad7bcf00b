//! Command line interface definition

use clap::{Parser, Subcommand};
use pokeshop_types::RenderEnvironment;
use std::path::PathBuf;

/// pokeshop-entry - Host server composing the Pokémon shop from its micro-frontends
#[derive(Parser)]
#[command(name = "pokeshop-entry")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Host server composing the Pokémon shop from its micro-frontends")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Metadata source origin (repeatable, replaces configured sources)
    #[arg(long = "metadata-source", global = true, value_name = "URL")]
    pub metadata_sources: Vec<String>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the shop pages
    Serve {
        /// Address to listen on
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Directory of static assets
        #[arg(long, value_name = "DIR")]
        static_dir: Option<PathBuf>,

        /// Directory of page templates
        #[arg(long, value_name = "DIR")]
        template_dir: Option<PathBuf>,
    },

    /// Compose a single template and print the document
    Render {
        /// Template file
        template: PathBuf,

        /// Placeholder value substituted into the template
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        set: Vec<(String, String)>,

        /// Render environment
        #[arg(long, value_enum)]
        environment: Option<RenderEnvironment>,

        /// Write the document to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Register metadata sources and print the merged event map
    Metadata,
}

/// Parse a `key=value` pair; the value may itself contain `=`
fn parse_key_value(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{input}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{input}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
