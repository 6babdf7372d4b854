use std::path::PathBuf;
use std::process::ExitCode;

use abacus::calculator::{
    Base, DisplayValue, Editor, Evaluator, Key, Mode, Outcome, calculate, convert_between_bases,
};
use abacus::config::Settings;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "abacus", version, about = "Exact calculator with programmer bases")]
struct Cli {
    /// Settings file (defaults to <config dir>/abacus/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// Flags that override the settings file.
#[derive(Debug, clap::Args)]
struct Overrides {
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Base for literals and output; implies programmer mode
    #[arg(long, value_enum)]
    base: Option<Base>,

    /// Digits after the decimal point
    #[arg(long)]
    precision: Option<u32>,

    /// Show results as fractions where possible
    #[arg(long)]
    fractions: bool,

    /// Group digits (thousands separator, or base grouping)
    #[arg(long)]
    separator: bool,
}

impl Overrides {
    fn apply(&self, settings: &mut Settings) {
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(base) = self.base {
            settings.base = base;
            if self.mode.is_none() {
                settings.mode = Mode::Programmer;
            }
        }
        if let Some(precision) = self.precision {
            settings.precision = precision.min(abacus::config::MAX_PRECISION);
        }
        settings.use_fractions |= self.fractions;
        settings.use_thousands_separator |= self.separator;
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate an expression
    Eval {
        #[arg(allow_hyphen_values = true)]
        expression: String,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Convert a single value between bases
    Convert {
        #[arg(allow_hyphen_values = true)]
        value: String,
        #[arg(long, value_enum)]
        from: Base,
        #[arg(long, value_enum)]
        to: Base,
    },
    /// Replay keypad presses, e.g. `abacus keys 1 2 + 3 =`
    Keys {
        /// Key labels; use lowercase `c` for the hex digit C
        #[arg(required = true, allow_hyphen_values = true)]
        keys: Vec<String>,
        #[command(flatten)]
        overrides: Overrides,
    },
}

#[derive(Debug, Serialize)]
struct ConvertReport<'a> {
    value: &'a str,
    from: Base,
    to: Base,
    result: String,
}

#[derive(Debug, Serialize)]
struct KeysReport {
    input: String,
    display: String,
    error: Option<abacus::error::Failure>,
    open_parentheses: usize,
    values: Vec<DisplayValue>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}

fn run_eval(expression: &str, settings: &Settings, json: bool) -> Result<bool> {
    let evaluator = Evaluator::new();
    let outcome = calculate(expression, settings, &evaluator);
    if json {
        print_json(&outcome)?;
    } else {
        match &outcome {
            Outcome::Success { display, .. } => println!("{display}"),
            Outcome::Failure { message, .. } => eprintln!("{message}"),
        }
    }
    Ok(outcome.is_success())
}

fn run_convert(value: &str, from: Base, to: Base, json: bool) -> Result<bool> {
    let result = convert_between_bases(value, from, to);
    let ok = result != abacus::calculator::OVERFLOW;
    if json {
        print_json(&ConvertReport { value, from, to, result })?;
    } else {
        println!("{result}");
    }
    Ok(ok)
}

fn run_keys(labels: &[String], settings: Settings, json: bool) -> Result<bool> {
    let evaluator = Evaluator::new();
    let mut editor = Editor::new(settings);
    for label in labels {
        let key: Key = label.parse().with_context(|| format!("Cannot press '{label}'"))?;
        debug!(?key, "press");
        editor.press(key, &evaluator);
    }

    let state = editor.editing_state();
    let ok = state.error.is_none();
    if json {
        print_json(&KeysReport {
            input: state.input.clone(),
            display: editor.display(),
            error: state.error.as_ref().map(|e| e.failure()),
            open_parentheses: editor.parens().count(),
            values: editor.display_values(&evaluator),
        })?;
    } else if ok {
        println!("{}{}", editor.display(), editor.parens().ghost_suffix());
        if let Some(notice) = editor.notice() {
            eprintln!("{notice}");
        }
    } else {
        eprintln!("{}", editor.display());
    }
    Ok(ok)
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    let ok = match &cli.command {
        Command::Eval {
            expression,
            overrides,
        } => {
            overrides.apply(&mut settings);
            run_eval(expression, &settings, cli.json)?
        }
        Command::Convert { value, from, to } => run_convert(value, *from, *to, cli.json)?,
        Command::Keys { keys, overrides } => {
            overrides.apply(&mut settings);
            run_keys(keys, settings, cli.json)?
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
