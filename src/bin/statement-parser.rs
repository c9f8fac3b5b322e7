//! CLI binary for statement-parser.
//!
//! A thin shim over the library crate: maps CLI flags to
//! `ExtractionConfig`, drives a `Session`, and prints the rendered view.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use statement_parser::{
    render_state, AppState, ExtractionConfig, ExtractionConfigBuilder, Phase, SelectionError,
    Session, SessionObserver,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

// ── Spinner observer ─────────────────────────────────────────────────────────

/// Shows a spinner while the session is `Processing` and clears it on the
/// way out.
struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        Arc::new(Self { bar })
    }
}

impl SessionObserver for SpinnerObserver {
    fn on_state_change(&self, state: &AppState) {
        match state.phase {
            Phase::Processing => {
                self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                self.bar.reset();
                let name = state
                    .selected_input
                    .as_ref()
                    .map(|i| i.file_name.as_str())
                    .unwrap_or("document");
                self.bar.set_message(format!("Analyzing {name}…"));
                self.bar.enable_steady_tick(Duration::from_millis(80));
            }
            Phase::Success | Phase::Error => self.bar.finish_and_clear(),
            Phase::Idle => {}
        }
    }

    fn on_notice(&self, notice: &SelectionError) {
        // Notices only arrive while idle, when the spinner is not drawn.
        eprintln!("{} {}", yellow("⚠"), notice);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Parse one statement
  statement-parser statement.pdf

  # Machine-readable output
  statement-parser --json statement.pdf > statement.json

  # Parse several statements one after another (one path per line)
  ls ~/statements/*.pdf | statement-parser --interactive

  # Use a different model
  statement-parser --model gemini-2.5-pro statement.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (API_KEY is accepted too)
  STATEMENT_PARSER_MODEL  Override model ID (default gemini-2.5-flash)
  RUST_LOG                Override the log filter

The statement PDF is uploaded to the Gemini API. Nothing is stored locally.
"#;

/// Extract issuer, balance, due date and transactions from credit-card statement PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "statement-parser",
    version,
    about = "Extract structured data from credit-card statement PDFs using Gemini",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Statement PDF to parse. Omit with --interactive.
    #[arg(required_unless_present = "interactive")]
    input: Option<PathBuf>,

    /// Read statement paths from stdin, one per line, resetting between them.
    #[arg(long)]
    interactive: bool,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model ID.
    #[arg(long, env = "STATEMENT_PARSER_MODEL")]
    model: Option<String>,

    /// Base URL of the Generative Language API.
    #[arg(long, env = "STATEMENT_PARSER_ENDPOINT")]
    endpoint: Option<String>,

    /// Sampling temperature (0.0–2.0). Service default when unset.
    #[arg(long, env = "STATEMENT_PARSER_TEMPERATURE")]
    temperature: Option<f32>,

    /// Timeout for the service call in seconds.
    #[arg(long, env = "STATEMENT_PARSER_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Print the extracted record as JSON instead of the text view.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "STATEMENT_PARSER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "STATEMENT_PARSER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, env = "STATEMENT_PARSER_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Keep library INFO logs quiet while the spinner is drawn.
    let show_progress = shows_progress(&cli);
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build session ────────────────────────────────────────────────────
    let config = build_config(&cli).context("Invalid configuration")?;
    let mut session = Session::new(config).context("Failed to create session")?;
    if show_progress {
        session = session.with_observer(SpinnerObserver::new());
    }

    if cli.interactive {
        return run_interactive(&cli, &mut session).await;
    }

    let Some(ref input) = cli.input else {
        anyhow::bail!("No input file given");
    };
    let ok = parse_one(&cli, &mut session, input).await?;
    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn shows_progress(cli: &Cli) -> bool {
    !cli.quiet && !cli.no_progress && !cli.json
}

/// Select, extract and print one statement. Returns whether it succeeded.
async fn parse_one(cli: &Cli, session: &mut Session, input: &Path) -> Result<bool> {
    if let Err(notice) = session.select_file(input) {
        // With the spinner installed the observer has printed it already.
        if !shows_progress(cli) {
            eprintln!("{} {}", yellow("⚠"), notice);
        }
        return Ok(false);
    }

    let state = session
        .extract()
        .await
        .context("Could not start extraction")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match state.phase {
        Phase::Success if cli.json => {
            let json = serde_json::to_string_pretty(&state.result)
                .context("Failed to serialise result")?;
            writeln!(handle, "{json}").context("Failed to write to stdout")?;
        }
        Phase::Success => {
            handle
                .write_all(render_state(state).as_bytes())
                .context("Failed to write to stdout")?;
            if !cli.quiet {
                eprintln!("{} parsed {}", green("✔"), input.display());
            }
        }
        _ => {
            eprint!("{}", red(&render_state(state)));
        }
    }

    Ok(state.phase == Phase::Success)
}

/// One statement per stdin line; reset between statements.
async fn run_interactive(cli: &Cli, session: &mut Session) -> Result<ExitCode> {
    let stdin = io::stdin();
    let mut all_ok = true;

    if !cli.quiet {
        eprint!("{}", render_state(session.state()));
    }

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let path = line.trim();
        if path.is_empty() {
            continue;
        }

        let ok = parse_one(cli, session, Path::new(path)).await?;
        all_ok &= ok;

        // "Parse another statement": only Success/Error can be reset; a
        // rejected file leaves the session idle already.
        if matches!(session.phase(), Phase::Success | Phase::Error) {
            session.reset().context("Failed to reset session")?;
        }
        if !cli.quiet {
            eprintln!();
        }
    }

    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    // Start from the environment so API_KEY still works as a fallback.
    let mut builder = ExtractionConfigBuilder::from_config(ExtractionConfig::from_env())
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint.clone());
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }

    Ok(builder.build()?)
}
