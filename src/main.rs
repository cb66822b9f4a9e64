use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use morph::auth::{self, AuthStorage};
use morph::banner::{BannerInfo, print_banner, print_session_summary};
use morph::commands::{CommandRegistry, CommandResult, SessionInfo, StateChange};
use morph::config::{CREATIVITY_KEY, Config, MODE_KEY, MODEL_KEY, ensure_db_dir};
use morph::consts::{API_KEY_ENV_VARS, DEFAULT_MODEL, PROVIDER, default_db_path, format_bytes};
use morph::engine::transform::TransformEngine;
use morph::events::Event;
use morph::generator::gemini::GeminiGenerator;
use morph::image::SourceImage;
use morph::mode::{Creativity, Mode};
use morph::spinner::Spinner;

#[derive(Parser)]
#[command(
    name = "morph",
    version,
    about = "Same subject, new story. Image transformations from the terminal."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Source image to load at startup (png, jpeg, webp)
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Transformation mode: character or style
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Creativity for character mode, 0.0-1.0 or a percentage
    #[arg(short, long)]
    creativity: Option<Creativity>,

    /// Gemini image model ID
    #[arg(long)]
    model: Option<String>,

    /// SQLite database for credentials and preferences (default: ~/.morph/morph.db)
    #[arg(short, long)]
    db: Option<String>,

    /// Save every generated image into this directory
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Run a single transformation and exit (requires --image)
    #[arg(short, long)]
    run: Option<String>,

    /// Debug logging for morph (RUST_LOG overrides)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Store a Gemini API key
    Login {
        /// API key (prompted for when omitted)
        #[arg(long)]
        key: Option<String>,
    },
    /// Remove the stored Gemini API key
    Logout,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,morph=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| default_db_path().to_string_lossy().to_string());
    ensure_db_dir(&db_path)?;

    if let Some(command) = &cli.command {
        return match command {
            Command::Login { key } => handle_login(&db_path, key.as_deref()),
            Command::Logout => handle_logout(&db_path),
        };
    }

    // CLI flags win over stored preferences, which win over defaults.
    let config = Config::open(&db_path)?;
    let model = match cli.model.clone() {
        Some(model) => model,
        None => config
            .get(MODEL_KEY)?
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
    };
    let mode = match cli.mode {
        Some(mode) => mode,
        None => config.get_parsed::<Mode>(MODE_KEY)?.unwrap_or_default(),
    };
    let creativity = match cli.creativity {
        Some(creativity) => creativity,
        None => config
            .get_parsed::<Creativity>(CREATIVITY_KEY)?
            .unwrap_or_default(),
    };

    let auth = AuthStorage::open(&db_path)?;
    let mut auth_status = auth::auth_status(&auth, PROVIDER, API_KEY_ENV_VARS)?;
    let generator = GeminiGenerator::new(Some(model), auth);

    let mut engine = TransformEngine::new(Box::new(generator));
    engine.set_mode(mode);
    engine.set_creativity(creativity);
    tokio::spawn(log_events(engine.events().subscribe()));

    if let Some(path) = &cli.image {
        let image = SourceImage::from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        engine.upload(image);
    }

    // Single transformation mode
    if let Some(instruction) = cli.run {
        engine.set_instruction(instruction);
        let out = cli.out.unwrap_or_else(|| PathBuf::from("."));
        let ok = generate(&mut engine, Some(&out)).await;
        print_session_summary(engine.generations(), engine.session_usage());
        if !ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    let image_label = match engine.source() {
        Some(image) => format!("{} ({})", image.mime_type(), format_bytes(image.bytes().len())),
        None => "none".to_string(),
    };
    let model_name = engine.model_name().await;
    print_banner(&BannerInfo {
        provider: PROVIDER,
        model: &model_name,
        auth_status: &auth_status,
        mode: engine.mode(),
        creativity: engine.creativity(),
        image: &image_label,
        db: &db_path,
    });

    let registry = CommandRegistry::new();

    // Async stdin so Ctrl+C is caught at the prompt too
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\nmorph> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {e}");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let model_name = engine.model_name().await;
        let provider_name = engine.provider_name().await;
        let result = {
            let info = SessionInfo {
                provider: &provider_name,
                model: &model_name,
                auth_status: &auth_status,
                usage: engine.session_usage(),
                db_path: &db_path,
                engine: Some(&engine),
            };
            registry.dispatch(input, &info).await
        };

        match result {
            CommandResult::NotACommand => {
                engine.set_instruction(input);
                generate(&mut engine, cli.out.as_deref()).await;
            }
            CommandResult::Handled => {}
            CommandResult::StateChanged(change) => {
                apply_change(change, &mut engine, &config, &db_path, &mut auth_status).await;
            }
            CommandResult::Quit => break,
        }
    }

    print_session_summary(engine.generations(), engine.session_usage());
    Ok(())
}

/// Submit the current inputs with a spinner. Returns whether an image came back.
async fn generate(engine: &mut TransformEngine, out: Option<&Path>) -> bool {
    let spinner = Spinner::start("generating");
    let result = engine.submit().await;
    let elapsed = spinner.stop().await;

    match result {
        Ok(image) => {
            println!(
                "\n=> {} ({}) in {:.1}s",
                image.mime_type,
                format_bytes(image.bytes.len()),
                elapsed.as_secs_f32()
            );
            if let Some(dir) = out {
                match image.save_to(dir, "generated") {
                    Ok(path) => println!("   saved {}", path.display()),
                    Err(e) => eprintln!("   ✗ failed to save: {e}"),
                }
            } else {
                println!("   /save to write it to disk");
            }
            true
        }
        Err(e) => {
            eprintln!("\nerror: {e}");
            false
        }
    }
}

async fn apply_change(
    change: StateChange,
    engine: &mut TransformEngine,
    config: &Config,
    db_path: &str,
    auth_status: &mut String,
) {
    match change {
        StateChange::Auth(status) => *auth_status = status,
        StateChange::Upload(image) => engine.upload(image),
        StateChange::Mode(mode) => {
            engine.set_mode(mode);
            persist(config, MODE_KEY, mode.as_str());
        }
        StateChange::Creativity(creativity) => {
            engine.set_creativity(creativity);
            persist(config, CREATIVITY_KEY, &creativity.value().to_string());
        }
        StateChange::Model(model) => match AuthStorage::open(db_path) {
            Ok(auth) => {
                persist(config, MODEL_KEY, &model);
                engine
                    .set_generator(Box::new(GeminiGenerator::new(Some(model), auth)))
                    .await;
            }
            Err(e) => eprintln!("  ✗ failed to switch model: {e:#}"),
        },
    }
}

fn persist(config: &Config, key: &str, value: &str) {
    if let Err(e) = config.set(key, value) {
        tracing::warn!(key, "failed to save preference: {e:#}");
    }
}

async fn log_events(mut rx: broadcast::Receiver<Event>) {
    loop {
        match rx.recv().await {
            Ok(event) => tracing::debug!(?event, "engine event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "event log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn handle_login(db_path: &str, key: Option<&str>) -> anyhow::Result<()> {
    let key = match key {
        Some(key) => key.to_string(),
        None => {
            println!("Logging in to Gemini...\n");
            println!("Create a key at https://aistudio.google.com/apikey\n");
            print!("Paste your API key: ");
            io::stdout().flush()?;
            let mut key = String::new();
            io::stdin().read_line(&mut key)?;
            key
        }
    };

    auth::login(db_path, PROVIDER, &key)?;
    println!("✓ Logged in to Gemini successfully!");
    println!("  Credentials saved to {db_path}");
    Ok(())
}

fn handle_logout(db_path: &str) -> anyhow::Result<()> {
    auth::logout(db_path, PROVIDER)?;
    println!("✓ Logged out from Gemini.");
    Ok(())
}
