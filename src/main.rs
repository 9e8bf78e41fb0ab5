//! HealFlow Signal Console
//!
//! Headless radar: polls the signal repository and logs the board and the
//! selected signal's lifecycle view whenever they change. Operator commands
//! are read from stdin; Ctrl-C or `quit` stops it.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use healflow::console::HealConsole;
use healflow::repository::{
    HttpSignalRepository, InMemorySignalRepository, SignalAction, SignalRepository,
};
use healflow::sync::{ConsoleEvent, NoticeLevel};
use healflow::utils::init_logging;
use healflow::{SyncConfig, Vote};

// ──────────────────────────────────────────────────────────────────────────────
// MAIN ENTRY POINT
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let config = SyncConfig::from_env().context("Invalid HealFlow configuration")?;
    init_logging().context("Failed to set tracing subscriber")?;

    println!("\n{}", "═".repeat(60));
    println!("HEALFLOW // SYSTEM_RADAR v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", "═".repeat(60));

    let repository: Arc<dyn SignalRepository> = if config.demo {
        println!("Source: seeded in-memory repository (demo)");
        Arc::new(InMemorySignalRepository::seeded())
    } else {
        println!("Source: {}", config.base_url);
        Arc::new(HttpSignalRepository::new(&config).context("Failed to build HTTP client")?)
    };
    println!("Poll interval: {:?}", config.poll_interval);
    println!("Commands: select <id> | clear | heal | accept | reject | vote +/- | quit");
    println!("{}\n", "═".repeat(60));

    let console = HealConsole::new(repository, &config);
    let console = Arc::new(console);
    let mut events = console.subscribe();
    let mut commands = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    console.start().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
            line = commands.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if !handle_command(&console, line.trim()) {
                        break;
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "Failed to read command, input disabled");
                    stdin_open = false;
                }
            },
            event = events.recv() => match event {
                Ok(event) => report(&console, event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Console fell behind on events"),
                Err(RecvError::Closed) => break,
            }
        }
    }

    console.stop().await;
    Ok(())
}

/// Returns false when the operator asked to quit.
fn handle_command(console: &Arc<HealConsole>, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let action = match (parts.next(), parts.next()) {
        (None, _) => return true,
        (Some("quit" | "exit"), _) => return false,
        (Some("select"), Some(id)) => {
            console.select(id);
            return true;
        }
        (Some("clear"), _) => {
            console.clear_selection();
            return true;
        }
        (Some("heal"), _) => SignalAction::Heal,
        (Some("accept"), _) => SignalAction::Accept,
        (Some("reject"), _) => SignalAction::Reject,
        (Some("vote"), Some("+")) => SignalAction::Feedback(Vote::Positive),
        (Some("vote"), Some("-")) => SignalAction::Feedback(Vote::Negative),
        _ => {
            println!("Unknown command: '{line}'");
            return true;
        }
    };

    // Run in the background so polling and input stay responsive.
    let console = console.clone();
    tokio::spawn(async move {
        if let Err(e) = console.dispatch_selected(action).await {
            if e.is_contract_violation() {
                warn!("Rejected: {e}");
            }
        }
    });
    true
}

fn report(console: &HealConsole, event: ConsoleEvent) {
    match event {
        ConsoleEvent::SnapshotChanged { signals } => {
            info!(signals, "Board updated");
            for row in console.board() {
                let marker = if row.selected { ">" } else { " " };
                info!(
                    "{marker} [{:<13}] {:<16} FRQ_{}",
                    row.badge.label(),
                    row.merchant,
                    row.frequency
                );
            }
            report_view(console);
        }
        ConsoleEvent::SelectionChanged { .. } | ConsoleEvent::InFlightChanged { .. } => {
            report_view(console)
        }
        ConsoleEvent::Notice(notice) => match notice.level {
            NoticeLevel::Error => warn!("ACTION_FAILED: {}", notice.message),
            NoticeLevel::Warning => warn!("{}", notice.message),
            NoticeLevel::Info => info!("{}", notice.message),
        },
    }
}

fn report_view(console: &HealConsole) {
    let view = console.view();
    let actions: Vec<_> = view.enabled_actions.iter().map(|a| format!("{a:?}")).collect();
    info!(
        signal = view.signal_id.as_ref().map(|id| id.as_str()).unwrap_or("-"),
        status = %view.status_label,
        in_flight = view.in_flight,
        actions = %actions.join(","),
        "Selected signal"
    );
    if let Some(text) = &view.diagnosis_text {
        for line in text.lines() {
            info!("  {line}");
        }
    }
}
