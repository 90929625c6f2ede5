//! New API Exporter CLI
//!
//! CLI tool for exporting a New API database to the EZ-API intermediate
//! format.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use newapi_export::mapping::channel_kind_name;
use newapi_export::schema::validate_file;
use newapi_export::{
    create_repository, EntityKind, ExportConfig, Pipeline, PipelineOptions, SourceConfig,
    SourceRepository,
};

/// Warnings printed after an export unless `--verbose` is set.
const MAX_WARNINGS_SHOWN: usize = 10;

#[derive(Parser)]
#[command(name = "newapi-export")]
#[command(version)]
#[command(about = "Export a New API database to the EZ-API intermediate format", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export channels, users, tokens and abilities to a JSON file
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file path
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include users and tokens (as masters and keys)
        #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
        include_tokens: Option<bool>,

        /// Include abilities (as bindings)
        #[arg(long)]
        include_abilities: bool,

        /// Run the export without writing the output file
        #[arg(long)]
        dry_run: bool,
    },

    /// Show database statistics
    Stats {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Validate an export file
    Validate {
        /// Export file path
        file: PathBuf,
    },

    /// Generate example configuration
    Init {
        /// Source type (mysql, sqlite)
        #[arg(short, long)]
        source: String,

        /// Output file path
        #[arg(short, long, default_value = "newapi-export.yaml")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database type (mysql or sqlite)
    #[arg(long, default_value = "mysql")]
    source_type: String,

    /// MySQL DSN (user:pass@tcp(host:port)/dbname) or mysql:// URL
    #[arg(long, env = "NEWAPI_SOURCE_DSN", hide_env_values = true)]
    source_dsn: Option<String>,

    /// SQLite database file path
    #[arg(long, value_name = "FILE")]
    source_path: Option<PathBuf>,
}

impl SourceArgs {
    fn load(&self) -> anyhow::Result<ExportConfig> {
        if let Some(path) = &self.config {
            info!("Loading configuration from {:?}", path);
            return Ok(ExportConfig::from_file(path)?);
        }
        let source = SourceConfig::from_flags(
            &self.source_type,
            self.source_dsn.as_deref(),
            self.source_path.as_deref(),
        )?;
        Ok(ExportConfig::new(source))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Export {
            source,
            output,
            include_tokens,
            include_abilities,
            dry_run,
        } => {
            let mut config = source.load()?;
            if let Some(output) = output {
                config.options.output = output;
            }
            if let Some(include_tokens) = include_tokens {
                config.options.include_tokens = include_tokens;
            }
            if include_abilities {
                config.options.include_abilities = true;
            }
            if dry_run {
                config.options.dry_run = true;
            }
            config.validate()?;

            let mut repository = connect(&config).await?;
            let outcome = run_export(repository.as_ref(), &config, cli.verbose).await;
            repository.close().await?;
            outcome?;
        }
        Commands::Stats { source } => {
            let config = source.load()?;
            config.validate()?;

            let mut repository = connect(&config).await?;
            let outcome = show_stats(repository.as_ref(), cli.verbose).await;
            repository.close().await?;
            outcome?;
        }
        Commands::Validate { file } => {
            validate_export(&file)?;
        }
        Commands::Init { source, output } => {
            generate_config(&source, &output)?;
        }
    }

    Ok(())
}

async fn connect(config: &ExportConfig) -> anyhow::Result<Box<dyn SourceRepository>> {
    let mut repository = create_repository(config)?;
    repository
        .connect()
        .await
        .context("failed to connect to database")?;
    repository
        .ping()
        .await
        .context("database connection test failed")?;
    info!("Database connection successful");
    Ok(repository)
}

async fn run_export(
    repository: &dyn SourceRepository,
    config: &ExportConfig,
    verbose: bool,
) -> anyhow::Result<()> {
    let stats = repository
        .stats()
        .await
        .context("failed to get database stats")?;

    println!("Database: {}", config.source.type_name());
    println!("  Channels:  {}", stats.channels);
    println!("  Tokens:    {}", stats.tokens);
    println!("  Users:     {}", stats.users);
    println!("  Abilities: {}", stats.abilities);
    println!();

    let options = PipelineOptions {
        show_progress: true,
        ..PipelineOptions::from(&config.options)
    };
    let result = Pipeline::new(repository, options)
        .run()
        .await
        .context("export failed")?;

    let summary = result.summary();
    println!("📦 Export Summary:");
    println!("   Providers: {}", summary.providers);
    println!("   Masters:   {}", summary.masters);
    println!("   Keys:      {}", summary.keys);
    println!("   Bindings:  {}", summary.bindings);
    println!("   Warnings:  {}", summary.warnings);

    if !result.warnings.is_empty() {
        println!();
        println!("⚠️  Warnings:");
        for (i, warning) in result.warnings.iter().enumerate() {
            if i >= MAX_WARNINGS_SHOWN && !verbose {
                println!(
                    "   ... and {} more (use --verbose to see all)",
                    result.warnings.len() - MAX_WARNINGS_SHOWN
                );
                break;
            }
            println!("   - {}", warning);
        }
    }

    if config.options.dry_run {
        println!();
        println!("Dry run complete. No file written.");
        return Ok(());
    }

    let written = result
        .write_to(&config.options.output)
        .context("failed to write output file")?;

    println!();
    println!("✅ Export saved to: {}", config.options.output.display());
    println!("   File size: {}", format_bytes(written));

    Ok(())
}

async fn show_stats(repository: &dyn SourceRepository, verbose: bool) -> anyhow::Result<()> {
    let stats = repository.stats().await.context("failed to get stats")?;

    println!("📊 Database Statistics ({})", repository.source_type());
    println!("   Channels:  {}", stats.channels);
    println!("   Tokens:    {}", stats.tokens);
    println!("   Users:     {}", stats.users);
    println!("   Abilities: {}", stats.abilities);

    if verbose {
        println!();
        println!("   Active entities:");
        for (label, kind) in [
            ("channels", EntityKind::Channel),
            ("tokens", EntityKind::Token),
            ("users", EntityKind::User),
            ("abilities", EntityKind::Ability),
        ] {
            let count = repository.count_active(kind).await?;
            println!("     Active {:<10} {}", format!("{}:", label), count);
        }

        let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
        for channel in repository.fetch_channels().await? {
            *by_kind.entry(channel_kind_name(channel.kind)).or_default() += 1;
        }
        if !by_kind.is_empty() {
            println!();
            println!("   Channels by type:");
            for (name, count) in by_kind {
                println!("     - {}: {}", name, count);
            }
        }
    }

    Ok(())
}

fn validate_export(path: &Path) -> anyhow::Result<()> {
    info!("Validating export file {:?}", path);

    let report = validate_file(path)?;

    println!("Version: {}", report.version);
    println!(
        "Source: {} (exported at: {})",
        report.source_type.as_deref().unwrap_or("unknown"),
        report.exported_at.as_deref().unwrap_or("unknown")
    );
    println!();
    println!("Data counts:");
    println!("   Providers: {}", report.summary.providers);
    println!("   Masters:   {}", report.summary.masters);
    println!("   Keys:      {}", report.summary.keys);
    println!("   Bindings:  {}", report.summary.bindings);
    if report.summary.warnings > 0 {
        println!();
        println!("Warnings: {}", report.summary.warnings);
    }
    println!();
    println!("✅ File is valid");

    Ok(())
}

fn generate_config(source: &str, output: &Path) -> anyhow::Result<()> {
    let template = match source.to_lowercase().as_str() {
        "mysql" => MYSQL_TEMPLATE,
        "sqlite" => SQLITE_TEMPLATE,
        other => anyhow::bail!("Unknown source type: {} (supported: mysql, sqlite)", other),
    };

    std::fs::write(output, template)?;
    println!("✅ Generated configuration: {}", output.display());
    println!(
        "   Edit the file and run: newapi-export export --config {}",
        output.display()
    );

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefix = ['K', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {}B", bytes as f64 / div as f64, prefix)
}

const MYSQL_TEMPLATE: &str = r#"# New API Export Configuration - MySQL Source

source:
  type: mysql
  # mysql:// URL or the DSN New API itself uses (SQL_DSN)
  url: root:password@tcp(localhost:3306)/new-api

options:
  include_tokens: true
  include_abilities: false
  output: export.json
  dry_run: false
  connect_retries: 3
"#;

const SQLITE_TEMPLATE: &str = r#"# New API Export Configuration - SQLite Source

source:
  type: sqlite
  path: ./one-api.db

options:
  include_tokens: true
  include_abilities: false
  output: export.json
  dry_run: false
  connect_retries: 3
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_templates_parse() {
        for template in [MYSQL_TEMPLATE, SQLITE_TEMPLATE] {
            let config: ExportConfig = serde_yaml::from_str(template).unwrap();
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
