use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ibmtf::config::{Config, SETTABLE_KEYS};
use ibmtf::error::ProviderError;
use ibmtf::ibm::http::format_api_error;
use ibmtf::ibm::IbmSession;
use ibmtf::provider::{self, ResourceState};
use ibmtf::schema::{get_schema, get_type_names, SchemaKind};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage IBM Cloud VPN gateways, private DNS load balancers and monitors,
/// and container registry namespaces
#[derive(Parser, Debug)]
#[command(name = "ibmtf", version = ibmtf::VERSION, about, long_about = None)]
struct Args {
    /// IBM Cloud region to use
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a resource, or update it when a state document is given
    Apply {
        /// Resource type, e.g. ibm_dns_glb_monitor
        #[arg(short = 't', long = "type")]
        type_name: String,
        /// Configuration document (JSON or YAML, `-` for stdin)
        #[arg(short, long)]
        config: PathBuf,
        /// Current state document
        #[arg(short, long)]
        state: Option<PathBuf>,
    },
    /// Re-read a resource; prints null when it no longer exists
    Refresh {
        #[arg(short = 't', long = "type")]
        type_name: String,
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Delete a resource
    Destroy {
        #[arg(short = 't', long = "type")]
        type_name: String,
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Check whether a resource still exists
    Exists {
        #[arg(short = 't', long = "type")]
        type_name: String,
        #[arg(short, long)]
        state: PathBuf,
    },
    /// Read a data source
    Query {
        #[arg(short = 't', long = "type")]
        type_name: String,
        /// Filter document; omit for none
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the schema of a resource or data source
    Schema { type_name: String },
    /// List known type names
    Types {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Show or change persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Persist a setting
    Set { key: String, value: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Resource,
    DataSource,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ibmtf {} started with log level: {:?}", ibmtf::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("ibmtf").join("ibmtf.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".ibmtf").join("ibmtf.log");
    }
    PathBuf::from("ibmtf.log")
}

/// Read a JSON or YAML document from a file, or stdin for `-`
fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?
    };
    // YAML is a superset of JSON
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}

fn print<T: Serialize>(format: OutputFormat, value: &T) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn session(config: &Config) -> Result<IbmSession> {
    IbmSession::new(config).context("Failed to build IBM Cloud session")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let mut config = Config::load();
    if let Some(region) = &args.region {
        config.region = Some(region.clone());
    }

    if let Err(err) = run(args, config).await {
        tracing::error!("{:#}", err);
        if let Some(ProviderError::Api { source, .. }) = err.downcast_ref::<ProviderError>() {
            eprintln!("Hint: {}", format_api_error(source));
        }
        return Err(err);
    }
    Ok(())
}

async fn run(args: Args, config: Config) -> Result<()> {
    match args.command {
        Command::Apply {
            type_name,
            config: config_path,
            state,
        } => {
            let desired: Map<String, Value> = read_document(&config_path)?;
            let prior: Option<ResourceState> = state.as_deref().map(read_document).transpose()?;
            let session = session(&config)?;
            let result = provider::apply(&session, &type_name, prior.as_ref(), desired).await?;
            print(args.output, &result)
        }
        Command::Refresh { type_name, state } => {
            let state: ResourceState = read_document(&state)?;
            let session = session(&config)?;
            let result = provider::refresh(&session, &type_name, &state).await?;
            print(args.output, &result)
        }
        Command::Destroy { type_name, state } => {
            let state: ResourceState = read_document(&state)?;
            let session = session(&config)?;
            provider::destroy(&session, &type_name, &state).await?;
            eprintln!("Destroyed {} {}", type_name, state.id);
            Ok(())
        }
        Command::Exists { type_name, state } => {
            let state: ResourceState = read_document(&state)?;
            let session = session(&config)?;
            let found = provider::exists(&session, &type_name, &state).await?;
            print(args.output, &found)
        }
        Command::Query {
            type_name,
            config: filter,
        } => {
            let filter: Map<String, Value> = match filter {
                Some(path) => read_document(&path)?,
                None => Map::new(),
            };
            let session = session(&config)?;
            let result = provider::query(&session, &type_name, filter).await?;
            print(args.output, &result)
        }
        Command::Schema { type_name } => {
            let Some(def) = get_schema(&type_name) else {
                bail!("Unknown type: {}", type_name);
            };
            print(args.output, def)
        }
        Command::Types { kind } => {
            let kinds = match kind {
                Some(KindArg::Resource) => vec![SchemaKind::Resource],
                Some(KindArg::DataSource) => vec![SchemaKind::DataSource],
                None => vec![SchemaKind::Resource, SchemaKind::DataSource],
            };
            for kind in kinds {
                for name in get_type_names(kind) {
                    println!("{}", name);
                }
            }
            Ok(())
        }
        Command::Config { action } => match action {
            ConfigAction::Show => {
                let mut shown = config.clone();
                if shown.iam_token.is_some() {
                    shown.iam_token = Some("********".to_string());
                }
                print(args.output, &shown)
            }
            ConfigAction::Set { key, value } => {
                let path = Config::config_path().context("No config directory available")?;
                let mut stored = Config::load_from(&path);
                stored.set(&key, &value).with_context(|| {
                    format!("Settable keys: {}", SETTABLE_KEYS.join(", "))
                })?;
                stored.save_to(&path)?;
                eprintln!("Saved {} to {:?}", key, path);
                Ok(())
            }
        },
    }
}
