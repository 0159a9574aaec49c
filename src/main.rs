use autoclassify::classify::{Classification, Classifier, LineOption, OptionType};
use autoclassify::cli::{Cli, Commands, ConfigAction};
use autoclassify::config::{Config, ConfigValidator};
use autoclassify::error::{ClassifyError, Result};
use autoclassify::model::FailureLineContext;
use autoclassify::session::{
    sessions_for_lines, ClassificationInput, EditState, LineSession, LineStatus,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Classify {
            file,
            previous,
            json,
            all,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_classify(&config, &file, previous.as_deref(), json, all)?;
        }
        Commands::Batch { file, json } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_batch(&config, &file, json)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, cli.profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = if verbose {
        "autoclassify=debug"
    } else {
        "autoclassify=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// One line of `batch` output
#[derive(Serialize)]
struct LineReport<'a> {
    line_id: &'a str,
    state: EditState,
    status: LineStatus,
    can_save: bool,
    input: Option<ClassificationInput>,
    classification: Option<&'a Classification>,
}

impl<'a> LineReport<'a> {
    fn new(session: &'a LineSession) -> Self {
        Self {
            line_id: session.line_id(),
            state: session.state(),
            status: session.status(true),
            can_save: session.can_save(true),
            input: session.input(),
            classification: session.classification(),
        }
    }
}

fn cmd_classify(
    config: &Config,
    file: &Path,
    previous: Option<&Path>,
    json: bool,
    all: bool,
) -> Result<()> {
    let classifier = Classifier::new(config)?;
    let context: FailureLineContext = read_json(file)?;
    let previous = previous
        .map(read_json::<FailureLineContext>)
        .transpose()?;

    tracing::info!("Classifying line {}", context.id);
    let session = LineSession::new(&classifier, &context, previous.as_ref());

    if json {
        print_json(&LineReport::new(&session))?;
    } else {
        print_line(&context, &session, all);
    }

    Ok(())
}

fn cmd_batch(config: &Config, file: &Path, json: bool) -> Result<()> {
    let classifier = Classifier::new(config)?;
    let lines: Vec<FailureLineContext> = read_json(file)?;
    if lines.is_empty() {
        return Err(anyhow::anyhow!("No failure lines in {:?}", file).into());
    }

    tracing::info!("Classifying {} lines from {}", lines.len(), file.display());
    let sessions = sessions_for_lines(&classifier, &lines);

    if json {
        let reports: Vec<LineReport> = sessions.iter().map(LineReport::new).collect();
        print_json(&reports)?;
        return Ok(());
    }

    for (context, session) in lines.iter().zip(&sessions) {
        print_line(context, session, false);
        println!();
    }

    let pending = sessions
        .iter()
        .filter(|s| s.state() != EditState::Verified)
        .count();
    let editable = sessions
        .iter()
        .filter(|s| s.state() == EditState::Editable)
        .count();
    println!(
        "✓ {} lines classified ({} unverified, {} need review)",
        sessions.len(),
        pending,
        editable
    );

    Ok(())
}

fn print_line(context: &FailureLineContext, session: &LineSession, all: bool) {
    let location = context
        .line_number
        .map(|n| format!(" (log line {})", n))
        .unwrap_or_default();
    println!("Line {}{}: {}", context.id, location, context.search_text);
    println!("  Status: {}", session.status(true).as_str());

    let Some(classification) = session.classification() else {
        if session.is_verified_ignore() {
            println!("  Verified as ignored");
        }
        return;
    };

    let default_id = classification.default_option_id.as_str();
    let listed: Vec<&LineOption> = if all {
        classification.options.iter().collect()
    } else {
        classification.visible_options().collect()
    };
    for option in listed {
        println!("{}", format_option(option, option.id == default_id));
    }
    if !all && classification.has_hidden() {
        let hidden = classification.options.iter().filter(|o| o.hidden).count();
        println!("    ... {} more hidden (use --all)", hidden);
    }
    for option in classification.extra_options.iter() {
        println!("{}", format_option(option, option.id == default_id));
    }
    println!("  Default: {} ({:?})", default_id, classification.reason);
}

fn format_option(option: &LineOption, is_default: bool) -> String {
    let marker = if is_default { '*' } else { ' ' };
    let score = option
        .score
        .map(|s| format!("{:.2}", s))
        .unwrap_or_else(|| "  - ".to_string());

    let mut row = format!("  {} [{}] {:<16}", marker, score, option.option_type.as_str());
    match option.option_type {
        OptionType::ClassifiedFailure | OptionType::UnstructuredBug => {
            match option.bug_number {
                Some(bug) => row.push_str(&format!(" bug {}", bug)),
                None => row.push_str(" (no bug)"),
            }
            if let Some(summary) = option.bug_summary.as_deref().filter(|s| !s.is_empty()) {
                row.push_str(&format!("  {}", summary));
            }
            if let Some(resolution) = option.bug_resolution.as_deref().filter(|r| !r.is_empty()) {
                row.push_str(&format!(" [{}]", resolution));
            }
        }
        OptionType::Manual | OptionType::Ignore => {}
    }
    if option.is_best {
        row.push_str(" (best)");
    }
    if option.hidden {
        row.push_str(" (hidden)");
    }
    if !option.selectable {
        row.push_str(" (not selectable)");
    }
    row
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, profile)?;
            let content = toml::to_string_pretty(&config)?;
            println!("{}", content);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Profiles: {}", config.profiles.len());
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| ClassifyError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
        ConfigAction::Path => {
            println!("{}", Config::default_path()?.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let mut config = if path.exists() {
        Config::load(&path)?
    } else {
        tracing::warn!(
            "Config file not found, using defaults. Run 'autoclassify config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;
        config
    };

    if let Some(profile) = profile {
        config.apply_profile(&profile)?;
    }

    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| ClassifyError::Io {
        source: e,
        context: format!("Failed to read input file: {:?}", path),
    })?;
    serde_json::from_str(&content).map_err(|e| ClassifyError::Json {
        source: e,
        context: format!("Failed to parse input file: {:?}", path),
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ClassifyError::Json {
        source: e,
        context: "Failed to serialize output".to_string(),
    })?;
    println!("{}", json);
    Ok(())
}
