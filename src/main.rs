use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use flowscope::analysis::report::{generate_json_report, generate_text_report, print_summary};
use flowscope::config;
use flowscope::console::{ScriptOptions, Session};
use flowscope::topology::TopologyModel;

/// Topology analytics engine and operator console for traffic-flow networks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a topology document to load at startup
    #[arg(short, long)]
    topology: Option<PathBuf>,

    /// Command script to run once the session is up
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Seed for the synthetic traffic generator (overrides the document)
    #[arg(long)]
    seed: Option<u64>,

    /// Interval between automatic windows, e.g. "1s" or "250ms" (overrides the document)
    #[arg(long, value_parser = humantime::parse_duration)]
    tick_interval: Option<Duration>,

    /// Halt a running script on its first failed command
    #[arg(long)]
    halt_on_error: bool,

    /// Write a JSON analytics report on exit
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write a plain-text analytics report on exit
    #[arg(long)]
    report_text: Option<PathBuf>,

    /// Do not read stdin; run the startup script to completion and exit
    #[arg(long)]
    batch: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting flowscope");

    let (model, doc_settings) = match &args.topology {
        Some(path) => {
            let (model, settings) = config::load_model(path)
                .wrap_err_with(|| format!("Failed to load topology '{}'", path.display()))?;
            info!(
                "Startup topology: {} nodes, {} links, {} groups",
                model.node_count(),
                model.link_count(),
                model.group_count()
            );
            (model, settings)
        }
        None => (TopologyModel::new(), None),
    };

    let settings = doc_settings.unwrap_or_default();
    let seed = args.seed.unwrap_or(settings.seed);
    let tick_interval = args.tick_interval.unwrap_or(settings.tick_interval);
    if tick_interval.is_zero() {
        return Err(eyre!("tick interval must be positive"));
    }
    info!(
        "Traffic seed {}, tick interval {}",
        seed,
        humantime::format_duration(tick_interval)
    );

    let mut session = Session::with_model(model, seed);
    if args.halt_on_error {
        session.set_script_options(ScriptOptions {
            continue_on_error: false,
        });
    }

    if let Some(script) = &args.script {
        if !session.execute_line(&format!("run {}", script.display())) {
            warn!("Startup script was not accepted");
        }
    }

    if args.batch {
        drain_script(&mut session)?;
    } else {
        interactive_loop(&mut session, tick_interval)?;
    }

    if args.report.is_some() || args.report_text.is_some() {
        let report = session.build_report();
        if let Some(path) = &args.report {
            generate_json_report(&report, path)?;
        }
        if let Some(path) = &args.report_text {
            generate_text_report(&report, path)?;
        }
    } else if args.batch {
        print_summary(&session.build_report());
    }

    info!("Session closed at window {}", session.window_index());
    Ok(())
}

/// Print every transcript line produced since the last flush.
fn flush_transcript(session: &mut Session) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in session.transcript_mut().drain_unflushed() {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}

/// Run the queued script to completion, sleeping through its delays.
fn drain_script(session: &mut Session) -> Result<()> {
    while session.script_running() {
        session.pump_scripts(Instant::now());
        flush_transcript(session)?;
        if let Some(deadline) = session.next_deadline() {
            thread::sleep(deadline.saturating_duration_since(Instant::now()));
        }
    }
    flush_transcript(session)?;
    Ok(())
}

/// Read console lines from stdin while keeping the simulation clock and
/// any running script moving. Stdin is read on a helper thread so a
/// script delay never blocks the operator and vice versa.
fn interactive_loop(session: &mut Session, tick_interval: Duration) -> Result<()> {
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut next_tick = Instant::now() + tick_interval;
    loop {
        session.pump_scripts(Instant::now());
        flush_transcript(session)?;

        let mut deadline = next_tick;
        if let Some(script_deadline) = session.next_deadline() {
            if script_deadline < deadline {
                deadline = script_deadline;
            }
        }
        let timeout = deadline.saturating_duration_since(Instant::now());

        match rx.recv_timeout(timeout) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "exit" || trimmed == "quit" {
                    break;
                }
                session.execute_line(&line);
                flush_transcript(session)?;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if Instant::now() >= next_tick {
                    session.advance(1);
                    next_tick += tick_interval;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                // Stdin closed; let a running script finish before exiting.
                drain_script(session)?;
                break;
            }
        }
    }
    flush_transcript(session)?;
    Ok(())
}
