use anyhow::Context;
use clap::{Parser, Subcommand};
use clubhouse_core::config::{LogFormat, LoggingConfig};
use clubhouse_core::{Category, ClubConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "clubhouse", version, about = "Bridge club membership manager")]
struct Cli {
    /// Path to clubhouse.yaml. Defaults apply when omitted.
    #[arg(long, short = 'c', global = true, env = "CLUBHOUSE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the web dashboard (default).
    Serve,

    /// Create missing tables in the configured database.
    InitDb,

    /// Write members to an .xlsx file.
    Export {
        /// Output file.
        #[arg(long, short = 'o')]
        out: PathBuf,

        /// Only export one category (slug, English or Greek label).
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },

    /// Import members from an .xlsx file.
    Import {
        /// Workbook to read.
        file: PathBuf,

        /// YAML column mapping. Headers are matched automatically when omitted.
        #[arg(long, short = 'm')]
        mapping: Option<PathBuf>,

        /// Sheet to import. Defaults to the first sheet.
        #[arg(long, short = 's')]
        sheet: Option<String>,
    },

    /// Validate the configuration and environment without starting anything.
    CheckConfig {
        /// Also open a connection and ping the database.
        #[arg(long, default_value_t = false)]
        connect: bool,
    },
}

fn parse_category(value: &str) -> Result<Category, String> {
    Category::parse(value).ok_or_else(|| format!("unknown category '{}'", value))
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match config.format {
        LogFormat::Full => builder.init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ClubConfig::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load config file: {}", path.display()),
        None => "Failed to load default configuration".to_string(),
    })?;
    init_logging(&config.logging);

    match cli.cmd.unwrap_or(Command::Serve) {
        Command::Serve => commands::serve::run(config).await?,
        Command::InitDb => commands::init_db::run(config).await?,
        Command::Export { out, category } => {
            commands::export::run(config, &out, category).await?
        }
        Command::Import {
            file,
            mapping,
            sheet,
        } => commands::import::run(config, &file, mapping.as_deref(), sheet.as_deref()).await?,
        Command::CheckConfig { connect } => {
            commands::check::run(&config, cli.config.as_deref(), connect).await?
        }
    }

    Ok(())
}
