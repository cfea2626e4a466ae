//! CLI entry point for nucleus-rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nucleus-rs")]
#[command(version)]
#[command(about = "Render template pages with front-matter, global data and generated pages", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Source and pipeline flags shared by commands
#[derive(clap::Args)]
struct SourceArgs {
    /// Source directory holding the page templates
    #[arg(default_value = nucleus_rs::DEFAULT_SOURCE_DIR)]
    src: String,

    /// Output directory
    #[arg(short, long, default_value = nucleus_rs::DEFAULT_OUTPUT_DIR)]
    out: String,

    /// Directory of global data files
    #[arg(long)]
    data: Option<PathBuf>,

    /// Base directory for includes and extends
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Glob selecting source files, relative to the source directory
    #[arg(short, long)]
    pattern: Option<String>,

    /// Options file (defaults to nucleus.yml in the base directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Abort on the first template error
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render all pages into the output directory
    #[command(alias = "b")]
    Build(SourceArgs),

    /// List the pages a build would produce
    Pages(SourceArgs),

    /// Remove the output directory
    Clean {
        /// Output directory
        #[arg(short, long, default_value = nucleus_rs::DEFAULT_OUTPUT_DIR)]
        out: String,
    },
}

fn load(base_dir: &std::path::Path, args: SourceArgs) -> Result<nucleus_rs::Nucleus> {
    let mut nucleus = match &args.config {
        Some(path) => {
            let options = nucleus_rs::config::PipelineOptions::load(base_dir.join(path))?;
            nucleus_rs::Nucleus::with_options(base_dir, &args.src, &args.out, options)
        }
        None => nucleus_rs::Nucleus::new(base_dir, &args.src, &args.out)?,
    };

    if let Some(data) = args.data {
        nucleus.options.data_path = Some(base_dir.join(data));
    }
    if let Some(templates) = args.templates {
        nucleus.options.template_root_path = Some(base_dir.join(templates));
    }
    if let Some(pattern) = args.pattern {
        nucleus.pattern = pattern;
    }
    if args.strict {
        nucleus.options.strict = true;
    }

    Ok(nucleus)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "nucleus_rs=debug,info"
    } else {
        "nucleus_rs=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Build(args) => {
            let nucleus = load(&base_dir, args)?;
            tracing::info!("Building {:?} -> {:?}", nucleus.source_dir, nucleus.output_dir);

            let report = nucleus.build()?;
            println!(
                "Rendered {} of {} pages into {:?}",
                report.rendered.len(),
                report.pages.len(),
                nucleus.output_dir
            );

            if report.has_errors() {
                anyhow::bail!("{} file(s) failed to build", report.errors.len());
            }
        }

        Commands::Pages(args) => {
            let nucleus = load(&base_dir, args)?;
            nucleus_rs::commands::pages::run(&nucleus)?;
        }

        Commands::Clean { out } => {
            let nucleus =
                nucleus_rs::Nucleus::new(&base_dir, nucleus_rs::DEFAULT_SOURCE_DIR, &out)?;
            tracing::info!("Cleaning output folder...");
            nucleus.clean()?;
            println!("Cleaned successfully!");
        }
    }

    Ok(())
}
