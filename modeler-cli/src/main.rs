//! Modeler CLI - Command line interface for AI Modeler
//!
//! Turns text prompts into modeling plans and previews them against an
//! in-memory scene.

mod commands;

use clap::{Parser, Subcommand};
use modeler_core::{Config, Secrets, Unit};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{PlanArgs, PresetsArgs, RunArgs};

/// AI Modeler: prompt driven 3D modeling plans
#[derive(Parser, Debug)]
#[command(name = "modeler")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Planner service base URL (overrides config and env)
    #[arg(long, global = true, env = "MODELER_PLANNER_URL")]
    planner_url: Option<String>,

    /// Default unit: M, CM or MM (overrides config and MODELER_DEFAULT_UNIT)
    #[arg(short, long, global = true)]
    unit: Option<Unit>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Turn a prompt into a plan without executing it
    #[command(visible_alias = "p")]
    Plan(PlanArgs),

    /// Plan a prompt and execute it against a preview scene
    #[command(visible_alias = "r")]
    Run(RunArgs),

    /// List material presets
    Presets(PresetsArgs),

    /// Show current configuration
    Config {
        /// Create a secrets file template for the planner API key
        #[arg(long)]
        init_secrets: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.planner_url.clone(), cli.unit)?;

    if cli.verbose {
        tracing::info!(
            planner_url = ?config.planner.base_url,
            default_unit = %config.modeling.default_unit,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("modeler {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Plan(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Run(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Presets(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::Config { init_secrets: true }) => {
            let path = Secrets::create_template()?;
            println!("Created secrets template at {}", path.display());
            println!("Add your planner API key there, or set MODELER_API_KEY.");
        }
        Some(Commands::Config { init_secrets: false }) => {
            println!("Modeler Configuration");
            println!("=====================");
            println!();
            println!("Modeling:");
            println!("  default_unit: {}", config.modeling.default_unit);
            println!();
            println!("Planner:");
            println!(
                "  base_url: {}",
                config
                    .planner
                    .base_url
                    .as_deref()
                    .unwrap_or("(not set - using rules compiler)")
            );
            println!("  timeout: {:?}", config.planner.timeout);
            println!("  max_attempts: {}", config.planner.max_attempts);
            println!("  backoff: {:?}", config.planner.backoff);
            println!();
            println!("Materials:");
            match config.materials.presets_path {
                Some(ref path) => println!("  presets_path: {}", path.display()),
                None => println!("  presets_path: (built-in presets)"),
            }
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
            if let Some(path) = Secrets::default_secrets_path() {
                println!("Secrets file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - run `modeler config --init-secrets`)");
                }
            }
        }
        None => {
            println!("AI Modeler - Prompt driven 3D modeling plans");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
