// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, Context};
use log::{info, warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use subalign::app_config::{self, Config, MatchStrategy, OutputFormat};
use subalign::app_controller::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for MatchStrategy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliStrategy {
    Greedy,
    Exclusive,
}

impl From<CliStrategy> for MatchStrategy {
    fn from(cli_strategy: CliStrategy) -> Self {
        match cli_strategy {
            CliStrategy::Greedy => MatchStrategy::Greedy,
            CliStrategy::Exclusive => MatchStrategy::Exclusive,
        }
    }
}

/// CLI Wrapper for OutputFormat to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliFormat {
    Json,
    Srt,
    Tsv,
}

impl From<CliFormat> for OutputFormat {
    fn from(cli_format: CliFormat) -> Self {
        match cli_format {
            CliFormat::Json => OutputFormat::Json,
            CliFormat::Srt => OutputFormat::Srt,
            CliFormat::Tsv => OutputFormat::Tsv,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Align a source subtitle file with a target subtitle file
    Align(AlignArgs),

    /// Align every <title>.<source>.srt / <title>.<target>.srt pair in a directory
    Folder(FolderArgs),

    /// Check that the embedding model endpoint is reachable
    Check {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions for subalign
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by every command that needs a configuration
#[derive(Args, Debug)]
struct CommonArgs {
    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'zh')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<CliFormat>,

    /// Match assignment strategy
    #[arg(long, value_enum)]
    strategy: Option<CliStrategy>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug)]
struct AlignArgs {
    /// Subtitle file in the source language
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Subtitle file in the target language
    #[arg(value_name = "TARGET")]
    target: PathBuf,

    /// Output file (default: <title>.<src>-<tgt>.aligned.<format> next to SOURCE)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct FolderArgs {
    /// Directory to scan recursively
    #[arg(value_name = "DIR")]
    input_dir: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    #[command(flatten)]
    common: CommonArgs,
}

/// subalign - bilingual subtitle aligner
///
/// Pairs the captions of two subtitle tracks in different languages using
/// start times, multilingual sentence embeddings and shared named entities.
#[derive(Parser, Debug)]
#[command(name = "subalign")]
#[command(version)]
#[command(about = "Bilingual subtitle aligner")]
#[command(long_about = "subalign pairs the captions of two subtitle tracks in different languages.

EXAMPLES:
    subalign align movie.en.srt movie.zh.srt              # Align using default config
    subalign align -f --format srt movie.en.srt movie.zh.srt
    subalign align -s en -t fr --strategy exclusive a.srt b.srt -o pairs.tsv --format tsv
    subalign folder -s en -t zh /movies/                  # Align every movie.en.srt/movie.zh.srt pair
    subalign check                                        # Test the embedding endpoint
    subalign completions bash > subalign.bash             # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

MODELS:
    Embeddings and optional LLM entity extraction are served by Ollama
    (default: http://localhost:11434, model paraphrase-multilingual).")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger itself lets everything through; set_max_level does the filtering
        log::set_boxed_logger(Box::new(CustomLogger::new(LevelFilter::Trace)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌",
            Level::Warn => "🚧",
            Level::Info => " ",
            Level::Debug => "🔍",
            Level::Trace => "📋",
        }
    }

    // @returns: ANSI colour code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the configuration says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subalign", &mut std::io::stdout());
            Ok(())
        }
        Commands::Check { common } => {
            let config = load_config(&common)?;
            let controller = Controller::with_config(config)?;
            let description = controller.check_connection().await?;
            info!("Connection OK: {}", description);
            Ok(())
        }
        Commands::Align(args) => {
            let config = load_config(&args.common)?;
            let controller = Controller::with_config(config)?;
            controller
                .run(args.source, args.target, args.output, args.force_overwrite)
                .await?;
            Ok(())
        }
        Commands::Folder(args) => {
            let config = load_config(&args.common)?;
            let controller = Controller::with_config(config)?;
            let summary = controller.run_folder(args.input_dir, args.force_overwrite).await?;
            if summary.failed > 0 {
                return Err(anyhow::anyhow!("{} track pair(s) failed to align", summary.failed));
            }
            Ok(())
        }
    }
}

// Load or create the configuration, then apply command line overrides
fn load_config(options: &CommonArgs) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let config_path = Path::new(&options.config_path);
    let mut config = if config_path.exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", options.config_path);

        let config = Config::default();
        config.save(config_path)
            .with_context(|| format!("Failed to write default config to file: {}", options.config_path))?;
        config
    };

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(format) = &options.format {
        config.output.format = format.clone().into();
    }
    if let Some(strategy) = &options.strategy {
        config.alignment.strategy = strategy.clone().into();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    Ok(config)
}
