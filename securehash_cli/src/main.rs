use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

use securehash_cli::config::{AppConfig, ConfigManager, get_config};
use securehash_cli::file_discovery::{FileDiscoveryOptions, expand_paths};
use securehash_cli::output::{FileReport, OutputFormat, create_formatter};
use securehash_cli::progress::{self, provider::progress_for};
use securehash_cli::terminal::Terminal;
use securehash_core::{
    AlgorithmKind, AlgorithmRegistry, BatchConfig, BatchCoordinator, HashEngine,
};

/// Exit status after a Ctrl-C cancelled the run
const EXIT_CANCELLED: i32 = 130;

#[derive(Parser)]
#[command(name = "securehash")]
#[command(author, version, about = "SecureHash - multi-algorithm file and text hashing", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format (defaults to output.default_format from the config)
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Algorithm registry document to load
    #[arg(long, global = true, value_name = "FILE")]
    registry: Option<PathBuf>,

    /// Disable progress bar display
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash a piece of text (UTF-8)
    Text {
        /// Text to hash
        text: String,

        /// Algorithm name from the registry (repeatable, default: all)
        #[arg(short, long = "algorithm", value_name = "NAME")]
        algorithms: Vec<String>,
    },

    /// Hash file(s) and directories
    File {
        /// Files or directories to hash
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Algorithm name from the registry (repeatable, default: all)
        #[arg(short, long = "algorithm", value_name = "NAME")]
        algorithms: Vec<String>,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Include patterns (glob patterns, can be specified multiple times)
        #[arg(short = 'i', long = "include", value_name = "PATTERN")]
        include_patterns: Vec<String>,

        /// Exclude patterns (glob patterns, can be specified multiple times, overrides includes)
        #[arg(short = 'e', long = "exclude", value_name = "PATTERN")]
        exclude_patterns: Vec<String>,

        /// Stop at the first file that fails
        #[arg(long)]
        fail_fast: bool,
    },

    /// List the algorithms in the registry
    List,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Get a configuration value
    Get {
        /// Configuration key (e.g., engine.chunk_size)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., engine.chunk_size)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration values
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("securehash_core", log::LevelFilter::Debug)
            .filter_module("securehash_cli", log::LevelFilter::Debug)
            .filter_module("securehash", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let mut config = get_config().context("Failed to load configuration")?;
    config.apply_cli_overrides(
        cli.registry,
        cli.format.map(|f| f.as_str().to_string()),
        cli.no_progress,
    );
    let format = OutputFormat::from_string(&config.output.default_format)
        .context("Invalid output.default_format")?;

    match cli.command {
        Commands::Text { text, algorithms } => {
            text_command(&config, format, text, algorithms).await?;
        }
        Commands::File {
            paths,
            algorithms,
            recursive,
            include_patterns,
            exclude_patterns,
            fail_fast,
        } => {
            let options = FileDiscoveryOptions::new()
                .with_include_patterns(include_patterns)
                .with_exclude_patterns(exclude_patterns)
                .with_recursive(recursive);
            file_command(&config, format, paths, algorithms, options, fail_fast).await?;
        }
        Commands::List => {
            list_command(&config, format)?;
        }
        Commands::Config { command } => {
            config_command(command, &config)?;
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

fn build_engine(config: &AppConfig) -> Result<Arc<HashEngine>> {
    let registry_path = config.registry.registry_path();
    let binaries_dir = config.registry.binaries_dir();
    log::debug!(
        "Loading registry {} (binaries in {})",
        registry_path.display(),
        binaries_dir.display()
    );

    let registry = AlgorithmRegistry::load(&registry_path, &binaries_dir);
    let engine = HashEngine::new(Arc::new(registry), config.engine.clone())
        .context("Invalid engine configuration")?;
    Ok(Arc::new(engine))
}

/// Requested names, or every registry name when none were given
fn select_algorithms(engine: &HashEngine, requested: Vec<String>) -> Result<Vec<String>> {
    let registry = engine.registry();
    if requested.is_empty() {
        return Ok(registry.names().into_iter().map(String::from).collect());
    }

    for name in &requested {
        if registry.get(name).is_none() {
            anyhow::bail!(
                "Unknown algorithm '{}'. Available: {}",
                name,
                registry.names().join(", ")
            );
        }
    }
    Ok(requested)
}

fn print_rendered(rendered: &str) {
    if rendered.ends_with('\n') {
        print!("{rendered}");
    } else {
        println!("{rendered}");
    }
}

async fn text_command(
    config: &AppConfig,
    format: OutputFormat,
    text: String,
    algorithms: Vec<String>,
) -> Result<()> {
    let engine = build_engine(config)?;
    let algorithms = select_algorithms(&engine, algorithms)?;

    let results = engine.hash_text(&algorithms, &text).await;

    let color = Terminal::detect().color_output(config.output.color_enabled);
    let formatter = create_formatter(format, color);
    print_rendered(&formatter.format_text(&results)?);

    let failed = results.iter().filter(|(_, entry)| entry.is_error()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} algorithm(s) failed", failed, results.len());
    }
    Ok(())
}

async fn file_command(
    config: &AppConfig,
    format: OutputFormat,
    paths: Vec<PathBuf>,
    algorithms: Vec<String>,
    options: FileDiscoveryOptions,
    fail_fast: bool,
) -> Result<()> {
    let engine = build_engine(config)?;
    let algorithms = select_algorithms(&engine, algorithms)?;

    if paths.iter().any(|p| p.is_dir()) {
        eprintln!("{}", "Discovering files...".bold().cyan());
    }
    let files = expand_paths(&paths, &options).context("File discovery failed")?;
    if files.is_empty() {
        eprintln!("{}", "No matching files found.".yellow());
        return Ok(());
    }
    if files.len() > 1 {
        eprintln!("Found {} file(s) to hash", files.len());
    }

    let terminal = Terminal::detect();
    let show_progress = terminal.show_progress(config.output.progress_enabled);
    let (progress_provider, progress_rx) = progress_for(show_progress);
    let progress_handle = progress_rx.map(|rx| tokio::spawn(progress::render_progress(rx)));

    // Ctrl-C cancels in-flight work, helpers included
    let interrupt = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n{}", "Cancelling...".yellow());
                if !engine.cancel().await {
                    log::warn!("Helper process did not exit in time");
                }
            }
        })
    };

    let batch_config = BatchConfig {
        continue_on_error: !fail_fast,
        ..BatchConfig::default()
    };
    let mut handle = BatchCoordinator::new(Arc::clone(&engine))
        .with_config(batch_config)
        .spawn(files, algorithms, progress_provider);

    let mut reports = Vec::new();
    while let Some(outcome) = handle.next().await {
        reports.push(FileReport::from(outcome));
    }
    let summary = handle.join().await.context("Batch task failed")?;
    interrupt.abort();

    // The batch completes the provider, which closes the channel
    if let Some(handle) = progress_handle {
        let _ = handle.await;
    }

    let formatter = create_formatter(format, terminal.color_output(config.output.color_enabled));
    print_rendered(&formatter.format_files(&reports)?);

    if format == OutputFormat::Text && terminal.show_summary() && summary.total > 1 {
        let total_size: u64 = reports
            .iter()
            .filter_map(|r| match r {
                FileReport::Hashed(result) => Some(result.file_size),
                _ => None,
            })
            .sum();
        eprintln!("\n{}", "Summary:".bold().green());
        eprintln!(
            "Files: {} completed, {} failed, {} cancelled, {} skipped",
            summary.completed, summary.failed, summary.cancelled, summary.skipped
        );
        eprintln!("Total size: {}", progress::format_bytes(total_size));
        eprintln!(
            "Total time: {}",
            progress::format_duration(summary.total_time)
        );
        eprintln!(
            "Average throughput: {}",
            progress::format_throughput(progress::utils::throughput_mbps(
                total_size,
                summary.total_time
            ))
        );
    }

    if summary.cancelled > 0 {
        eprintln!("{}", "Cancelled".yellow());
        std::process::exit(EXIT_CANCELLED);
    }
    if summary.failed > 0 {
        anyhow::bail!("{} of {} file(s) failed", summary.failed, summary.total);
    }
    Ok(())
}

fn list_command(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let registry = AlgorithmRegistry::load(
        &config.registry.registry_path(),
        &config.registry.binaries_dir(),
    );

    let rows: Vec<(String, &'static str, String)> = registry
        .iter()
        .map(|descriptor| match descriptor.kind() {
            AlgorithmKind::InProcess { digest_id } => {
                (descriptor.name().to_string(), "in-process", digest_id.clone())
            }
            AlgorithmKind::ExternalProcess { executable, args } => {
                let mut target = executable.display().to_string();
                for arg in args {
                    target.push(' ');
                    target.push_str(arg);
                }
                (descriptor.name().to_string(), "external", target)
            }
        })
        .collect();

    match format {
        OutputFormat::Text => {
            let width = rows.iter().map(|(name, _, _)| name.len()).max().unwrap_or(0);
            for (name, kind, target) in &rows {
                println!("{}  {:<10}  {}", format!("{name:<width$}").yellow(), kind, target);
            }
        }
        OutputFormat::Json => {
            let values: Vec<_> = rows
                .iter()
                .map(|(name, kind, target)| {
                    serde_json::json!({ "name": name, "kind": kind, "target": target })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["name", "kind", "target"])?;
            for (name, kind, target) in &rows {
                writer.write_record([name.as_str(), *kind, target.as_str()])?;
            }
            writer.flush()?;
        }
    }

    Ok(())
}

fn config_command(command: ConfigCommand, effective: &AppConfig) -> Result<()> {
    let mut manager = ConfigManager::new();

    match command {
        ConfigCommand::Show => {
            let rendered =
                toml::to_string_pretty(effective).context("Failed to render configuration")?;
            print!("{rendered}");
        }
        ConfigCommand::Path => {
            println!("{}", manager.get_config_path().display());
        }
        ConfigCommand::Get { key } => {
            println!("{}", manager.get(&key)?);
        }
        ConfigCommand::Set { key, value } => {
            manager.set(&key, &value)?;
            eprintln!("{}", format!("Set {key} = {value}").green());
            eprintln!(
                "Configuration saved to: {}",
                manager.get_config_path().display()
            );
        }
        ConfigCommand::List => {
            let items = manager.list()?;
            eprintln!("{}", "Configuration:".bold().blue());
            eprintln!("Config file: {}", manager.get_config_path().display());
            eprintln!();

            let mut current_section = String::new();
            for (key, value) in items {
                let (section, rest) = key.split_once('.').unwrap_or(("general", key.as_str()));
                if section != current_section {
                    println!("[{}]", section.yellow());
                    current_section = section.to_string();
                }
                println!("  {} = {}", rest.cyan(), value);
            }
        }
    }

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
