//! Command-line interface for gqlhttp.
//!
//! # Usage
//!
//! ```bash
//! # Validate schemas
//! gqlhttp check schema.graphql
//!
//! # Serve a schema with static data and the playground
//! gqlhttp serve --schema schema.graphql --root-value data.json --playground
//! ```

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use gqlhttp::server::{self, ServerConfig};
use gqlhttp::{Handler, HandlerOptions, Schema, SchemaError};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "gqlhttp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve a schema over HTTP
    Serve(ServeArgs),

    /// Check schema files for errors
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ServeArgs {
    /// Schema file path
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Host to bind to
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "4000")]
    pub port: u16,

    /// Path of the GraphQL endpoint
    #[arg(long, default_value = "/graphql")]
    pub path: String,

    /// Serve the playground to browsers
    #[arg(long)]
    pub playground: bool,

    /// JSON file used as the root value
    #[arg(long)]
    pub root_value: Option<PathBuf>,

    /// JSON file used as the context value
    #[arg(long)]
    pub context_value: Option<PathBuf>,
}

/// Runs a synchronous command.
pub fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Check { files } => check_files(&files, cli.verbose),
        Commands::Serve(_) => {
            eprintln!("{} serve must be run on the async runtime", "Error:".red().bold());
            Ok(1)
        }
    }
}

fn load_schema(path: &Path) -> Result<Result<Schema, SchemaError>, std::io::Error> {
    let source = std::fs::read_to_string(path)?;
    Ok(Schema::parse(&source))
}

fn check_files(files: &[PathBuf], verbose: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let mut has_errors = false;

    for file in files {
        if verbose {
            println!("{} {}", "Checking".blue(), file.display());
        }

        match load_schema(file)? {
            Ok(_) => {
                if verbose {
                    println!("{} {}", "OK".green(), file.display());
                }
            }
            Err(SchemaError::Invalid(diagnostics)) => {
                has_errors = true;
                eprintln!("{} {}", "Error".red().bold(), file.display());
                for line in diagnostics.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    if has_errors {
        Ok(1)
    } else {
        println!(
            "{} {} file(s) checked",
            "Success:".green().bold(),
            files.len()
        );
        Ok(0)
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&source)?)
}

/// Builds the handler options of `serve`.
pub fn handler_options(args: &ServeArgs) -> Result<HandlerOptions, Box<dyn std::error::Error>> {
    let mut options = HandlerOptions::new().playground(args.playground);
    if let Some(path) = &args.root_value {
        options = options.root_value(read_json(path)?);
    }
    if let Some(path) = &args.context_value {
        options = options.context_value(read_json(path)?);
    }
    Ok(options)
}

/// Serves a schema until the process is interrupted.
pub async fn serve(args: ServeArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let schema = match load_schema(&args.schema)? {
        Ok(schema) => schema,
        Err(err) => {
            eprintln!("{} {}", "Error:".red().bold(), err);
            return Ok(1);
        }
    };

    let handler = Handler::from_schema(schema, handler_options(&args)?);
    let config = ServerConfig::new()
        .host(args.host)
        .port(args.port)
        .path(args.path);

    server::run(&config, handler, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;
    Ok(0)
}
