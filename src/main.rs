//! gridpilot: voice-command desktop control
//!
//! Maps recognized spoken phrases onto mouse-grid targeting, clipboard
//! slots, and the element file-browser helper. The recognizer itself is
//! external: phrases arrive one per line on stdin (or via `exec`), and
//! command feedback goes back on stdout/stderr.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::{Parser, Subcommand};

use gridpilot::clipboard::ClipboardSlots;
use gridpilot::config::Config;
use gridpilot::dispatch::{self, CommandError, DispatchResult, Dispatcher};
use gridpilot::element::ElementClient;
use gridpilot::overlay::{OverlayProvider, ProcessOverlayProvider};
use gridpilot::pointer::{EnigoPointer, PointerInput};

#[derive(Parser)]
#[command(name = "gridpilot")]
struct Cli {
    /// Alternate config file (default: config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Dispatch a single phrase and exit
    Exec {
        /// The phrase, as the recognizer reported it
        phrase: Vec<String>,
    },
    /// Print the spoken-command catalog
    Commands,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if matches!(cli.command, Some(Command::Commands)) {
        dispatch::print_catalog();
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref());
    let pointer = EnigoPointer::new().context("pointer backend")?;
    let overlays = ProcessOverlayProvider::new(config.grids.clone());
    let element = ElementClient::new(&config.element).context("element client")?;
    let clipboard = ClipboardSlots::load(&config.element.clipboard_path);
    let mut dispatcher = Dispatcher::new(config, pointer, overlays, element, clipboard);

    match cli.command {
        Some(Command::Exec { phrase }) => {
            let phrase = phrase.join(" ");
            report(&phrase, dispatcher.dispatch(&phrase));
        }
        _ => run_loop(&mut dispatcher)?,
    }
    Ok(())
}

/// Read phrases line by line until EOF or interrupt.
fn run_loop<P, V>(dispatcher: &mut Dispatcher<P, V>) -> anyhow::Result<()>
where
    P: PointerInput,
    V: OverlayProvider,
{
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("interrupt handler")?;
    }

    eprintln!("listening for phrases on stdin ('commands' subcommand lists them)");
    for line in io::stdin().lock().lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let line = line.context("stdin")?;
        let phrase = line.trim();
        if phrase.is_empty() {
            continue;
        }
        report(phrase, dispatcher.dispatch(phrase));
    }
    Ok(())
}

/// Feedback channel: outcomes for the user, one line per phrase.
fn report(phrase: &str, result: Result<DispatchResult, CommandError>) {
    match result {
        Ok(DispatchResult::Handled(Some(message))) => println!("{}", message),
        Ok(DispatchResult::Handled(None)) => {}
        Ok(DispatchResult::Unrecognized) => eprintln!("no command matched: {:?}", phrase),
        Err(e) => eprintln!("command failed: {}", e),
    }
}
