use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use vortex_core::backend::{ConnectionState, ProcessSupervisor};
use vortex_core::bootstrap;
use vortex_core::context::AppContext;
use vortex_core::engine::Everything3;
use vortex_core::instance::{self, InstanceCommand, InstanceEvent, SingleInstanceCoordinator};
use vortex_core::output;
use vortex_core::query::SearchMode;
use vortex_core::utils::{get_config_path, AppConfig};

#[derive(Parser)]
#[command(name = "vortex")]
#[command(about = "Quick-launch panel backed by an external file-search engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Use this config file instead of the one in the app data directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the panel host (default): one instance, engine kept warm, queries read from stdin
    Run,
    /// Run a single search and print the results
    Search {
        /// Keyword to search for
        keyword: String,

        /// Restrict the search to this folder (repeatable)
        #[arg(short, long = "folder")]
        folders: Vec<PathBuf>,

        /// Kinds of entries to match
        #[arg(short, long, value_enum, default_value_t = ModeArg::All)]
        mode: ModeArg,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Seconds to wait for the engine to connect and load its database
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
    /// Control the engine process
    Engine {
        #[command(subcommand)]
        action: EngineAction,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Ask the running instance to bring its window to the front
    Focus,
}

#[derive(Subcommand)]
enum EngineAction {
    /// Launch the private engine instance
    Start,
    /// Ask the private engine instance to exit
    Stop,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Write the effective configuration to the config file
    Init,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    All,
    Files,
    Folders,
}

impl From<ModeArg> for SearchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::All => SearchMode::All,
            ModeArg::Files => SearchMode::FilesOnly,
            ModeArg::Folders => SearchMode::FoldersOnly,
        }
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    let color = !cli.no_color;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_host(config, color)?,
        Commands::Search {
            keyword,
            folders,
            mode,
            json,
            timeout,
        } => run_search(
            config,
            keyword,
            folders,
            mode.into(),
            json,
            color,
            Duration::from_secs(timeout),
        )?,
        Commands::Engine { action } => {
            let mut supervisor = ProcessSupervisor::new(
                config.engine.executable_path(),
                config.engine.instance_name.clone(),
            );
            match action {
                EngineAction::Start => supervisor.start()?,
                EngineAction::Stop => supervisor.stop()?,
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::Path => match &cli.config {
                Some(path) => println!("{}", path.display()),
                None => println!("{}", get_config_path()?.display()),
            },
            ConfigAction::Init => match &cli.config {
                Some(path) => {
                    config.save_to(path)?;
                    println!("Wrote {}", path.display());
                }
                None => {
                    config.save()?;
                    println!("Wrote {}", get_config_path()?.display());
                }
            },
        },
        Commands::Focus => {
            instance::send_command(config.single_instance.port, InstanceCommand::FocusWindow)
                .context("No running instance to focus")?;
        }
    }

    Ok(())
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vortex=info,vortex_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_engine(config: &AppConfig) -> Result<Arc<Everything3>> {
    let library = config.engine.sdk_library_path();
    let api = Everything3::load(&library)?;
    Ok(Arc::new(api))
}

fn run_host(config: AppConfig, color: bool) -> Result<()> {
    bootstrap::check_environment(&config.engine)?;

    let (events_tx, events_rx) = mpsc::channel();
    let mut coordinator = SingleInstanceCoordinator::new(config.single_instance.port, events_tx);
    if !coordinator.start() {
        // Another instance owns the panel and has been asked to show itself
        return Ok(());
    }

    let api = load_engine(&config)?;
    let mut ctx = AppContext::new(config, api);
    ctx.hold_instance_lock(coordinator);
    ctx.start_engine()?;

    // Stand-in for the UI thread: focus requests arrive here
    thread::Builder::new()
        .name("vortex-ui".to_string())
        .spawn(move || {
            for event in events_rx {
                match event {
                    InstanceEvent::FocusWindow => {
                        info!("bringing window to front");
                        eprintln!("vortex: focus requested by another launch");
                    }
                }
            }
        })
        .context("Failed to start UI event thread")?;

    eprintln!("vortex: ready; type a search and press Enter (Ctrl+D to quit)");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let records = ctx.query_builder().search_for(line).query();
        output::print_records(&records, color)?;
    }

    ctx.shutdown();
    Ok(())
}

fn run_search(
    config: AppConfig,
    keyword: String,
    folders: Vec<PathBuf>,
    mode: SearchMode,
    json: bool,
    color: bool,
    timeout: Duration,
) -> Result<()> {
    bootstrap::check_environment(&config.engine)?;

    let api = load_engine(&config)?;
    let mut ctx = AppContext::new(config, api);
    ctx.start_engine()?;

    let deadline = Instant::now() + timeout;
    match ctx.connection().wait(timeout) {
        ConnectionState::Connected => wait_until_ready(&ctx, deadline),
        state => warn!(?state, "engine did not connect"),
    }

    let records = ctx
        .query_builder()
        .search_for(keyword)
        .in_folders(folders)
        .mode(mode)
        .query();

    if json {
        output::print_records_json(&records)?;
    } else {
        output::print_records(&records, color)?;
    }

    ctx.shutdown();
    Ok(())
}

/// Poll until the engine has loaded its database or the deadline passes
fn wait_until_ready(ctx: &AppContext, deadline: Instant) {
    let Some(client) = ctx.connection().client() else {
        return;
    };

    while !client.is_ready() {
        if Instant::now() >= deadline {
            warn!("engine database still loading; results may be empty");
            return;
        }
        thread::sleep(Duration::from_millis(200));
    }
}
