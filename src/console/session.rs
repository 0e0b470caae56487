//! The console session: single owner of all mutable engine state.
//!
//! A [`Session`] owns the topology model, the current sample window and
//! its aggregates, the transcript, the traffic generator, and at most
//! one running script. All mutation flows through [`Session::execute_line`],
//! which processes one command to completion before the next can be
//! accepted; analytics verbs recompute from the current model/metrics
//! snapshot and never mutate. Script delays are handled by polling, so
//! a waiting script never blocks interactive commands.

use std::path::Path;
use std::time::Instant;

use crate::analysis::paths::analyze_paths;
use crate::analysis::report::AnalyticsReport;
use crate::analysis::structure::{
    find_default_bottlenecks, BoundaryAnalysis, ConnectivityMatrix, TopologyOverview,
};
use crate::config;
use crate::console::command::{help_lines, parse_command, Command, CommandError};
use crate::console::interpreter::{self, Transcript};
use crate::console::script::{Script, ScriptDue, ScriptOptions, ScriptRunner};
use crate::flow::{EdgeMetrics, FlowWindow};
use crate::sim::TrafficGenerator;
use crate::topology::TopologyModel;

/// One interactive/scripted console session over a topology.
pub struct Session {
    model: TopologyModel,
    window: FlowWindow,
    metrics: EdgeMetrics,
    transcript: Transcript,
    generator: TrafficGenerator,
    script: Option<ScriptRunner>,
    script_options: ScriptOptions,
    /// True while a script step is being executed by the pump.
    in_script_step: bool,
    /// Set when a script step requested its own abort.
    abort_requested: bool,
    window_index: u64,
}

impl Session {
    pub fn new(seed: u64) -> Self {
        Session::with_model(TopologyModel::new(), seed)
    }

    pub fn with_model(model: TopologyModel, seed: u64) -> Self {
        Session {
            model,
            window: FlowWindow::new(0),
            metrics: EdgeMetrics::default(),
            transcript: Transcript::new(),
            generator: TrafficGenerator::new(seed),
            script: None,
            script_options: ScriptOptions::default(),
            in_script_step: false,
            abort_requested: false,
            window_index: 0,
        }
    }

    pub fn model(&self) -> &TopologyModel {
        &self.model
    }

    pub fn metrics(&self) -> &EdgeMetrics {
        &self.metrics
    }

    /// The current sample window (the flow store).
    pub fn window(&self) -> &FlowWindow {
        &self.window
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn window_index(&self) -> u64 {
        self.window_index
    }

    pub fn set_script_options(&mut self, options: ScriptOptions) {
        self.script_options = options;
    }

    /// True while a script is loaded or one of its steps is executing.
    pub fn script_running(&self) -> bool {
        self.script.is_some() || self.in_script_step
    }

    /// Deadline of the running script's pending delay, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.script.as_ref().and_then(|r| r.deadline())
    }

    /// Execute one console line to completion.
    ///
    /// The raw line is echoed to the transcript before any result or
    /// error line. Returns whether the command succeeded; failures are
    /// reported in the transcript and never propagate.
    pub fn execute_line(&mut self, line: &str) -> bool {
        let raw = line.trim();
        if raw.is_empty() {
            return true;
        }
        self.transcript.push(format!("> {}", raw));
        match parse_command(raw) {
            Ok(command) => self.dispatch(command),
            Err(err) => {
                log::warn!("Rejected command '{}': {}", raw, err);
                self.transcript.push(format!("Error: {}", err));
                false
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> bool {
        let result: Result<Vec<String>, CommandError> = match &command {
            Command::NodeAdd {
                id,
                kind,
                attrs,
                unknown_attrs,
            } => interpreter::add_node(&mut self.model, id, *kind, attrs, unknown_attrs),
            Command::NodeRemove { id } => interpreter::remove_node(&mut self.model, id),
            Command::NodeSet {
                id,
                attrs,
                unknown_attrs,
            } => interpreter::set_node(&mut self.model, id, attrs, unknown_attrs),
            Command::LinkAdd { from, to } => interpreter::add_link(&mut self.model, from, to),
            Command::LinkRemove { from, to } => interpreter::remove_link(&mut self.model, from, to),
            Command::GroupAdd { name, members } => {
                interpreter::add_group(&mut self.model, name, members)
            }
            Command::GroupRemove { name } => interpreter::remove_group(&mut self.model, name),
            Command::Paths { filter } => {
                let analysis = analyze_paths(&self.model, &self.metrics);
                Ok(interpreter::render_paths(&analysis, *filter))
            }
            Command::Summary => {
                let analysis = analyze_paths(&self.model, &self.metrics);
                Ok(interpreter::render_summary(&analysis))
            }
            Command::Matrix => Ok(interpreter::render_matrix(&ConnectivityMatrix::build(
                &self.model,
            ))),
            Command::Groups => Ok(interpreter::render_groups(&BoundaryAnalysis::analyze(
                &self.model,
            ))),
            Command::Bottlenecks => Ok(interpreter::render_bottlenecks(
                &find_default_bottlenecks(&self.model, &self.metrics),
            )),
            Command::Topo => Ok(interpreter::render_topo(&TopologyOverview::build(
                &self.model,
            ))),
            Command::Tick { count } => {
                self.advance(*count);
                Ok(vec![format!(
                    "Advanced {} window(s), now at window {}",
                    count, self.window_index
                )])
            }
            Command::Load { path } => self.load_topology(path),
            Command::Run { path } => self.start_script(path),
            Command::Abort => self.abort_script(),
            Command::Help => Ok(help_lines()),
        };

        match result {
            Ok(lines) => {
                self.transcript.extend(lines);
                true
            }
            Err(err) => {
                log::warn!("Command failed: {}", err);
                self.transcript.push(format!("Error: {}", err));
                false
            }
        }
    }

    /// Advance the simulation by `count` windows, replacing the sample
    /// store wholesale each time.
    pub fn advance(&mut self, count: u32) {
        for _ in 0..count {
            self.window_index += 1;
            let window = self.generator.next_window(&self.model, self.window_index);
            self.metrics = EdgeMetrics::from_window(&window);
            self.window = window;
        }
    }

    /// Accept a full window from an external producer.
    pub fn ingest_window(&mut self, window: FlowWindow) {
        self.window_index = window.index();
        self.metrics = EdgeMetrics::from_window(&window);
        self.window = window;
    }

    fn load_topology(&mut self, path: &str) -> Result<Vec<String>, CommandError> {
        let (model, _settings) = config::load_model(Path::new(path))?;
        self.model.replace(model);
        log::info!("Topology replaced from {}", path);
        Ok(vec![format!(
            "Loaded topology from {} ({} nodes, {} links)",
            path,
            self.model.node_count(),
            self.model.link_count()
        )])
    }

    fn start_script(&mut self, path: &str) -> Result<Vec<String>, CommandError> {
        if self.script_running() {
            return Err(CommandError::validation("a script is already running"));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| CommandError::not_found(format!("script '{}': {}", path, e)))?;
        let script = Script::parse(path, &text)
            .map_err(|e| CommandError::validation(format!("script '{}': {}", path, e)))?;
        let commands = script.command_count();
        self.script = Some(ScriptRunner::new(script, self.script_options));
        log::info!("Script '{}' queued with {} command(s)", path, commands);
        Ok(vec![format!(
            "Running script {} ({} commands)",
            path, commands
        )])
    }

    fn abort_script(&mut self) -> Result<Vec<String>, CommandError> {
        if self.in_script_step {
            // A script step is aborting its own script; the pump emits
            // the marker once the current step completes.
            self.abort_requested = true;
            return Ok(vec![]);
        }
        if self.script.take().is_some() {
            log::info!("Script aborted");
            Ok(vec!["[script] aborted".to_string()])
        } else {
            Err(CommandError::validation("no script is running"))
        }
    }

    /// Drive the running script at time `now`: execute every step that
    /// is due, then stop at the next delay or the end of the script.
    pub fn pump_scripts(&mut self, now: Instant) {
        let Some(mut runner) = self.script.take() else {
            return;
        };
        if runner.mark_started() {
            log::info!("Script '{}' started", runner.name());
            self.transcript.push("[script] start");
        }

        let mut finished = false;
        loop {
            match runner.next_due(now) {
                ScriptDue::Command(line) => {
                    self.in_script_step = true;
                    let ok = self.execute_line(&line);
                    self.in_script_step = false;

                    if self.abort_requested {
                        self.abort_requested = false;
                        log::info!("Script '{}' aborted by its own step", runner.name());
                        self.transcript.push("[script] aborted");
                        finished = true;
                        break;
                    }
                    if !runner.absorb_result(ok) {
                        self.transcript.push("[script] end");
                        finished = true;
                        break;
                    }
                }
                ScriptDue::Wait(_) => break,
                ScriptDue::Finished => {
                    log::info!("Script '{}' finished", runner.name());
                    self.transcript.push("[script] end");
                    finished = true;
                    break;
                }
            }
        }
        if !finished {
            self.script = Some(runner);
        }
    }

    /// Build the full analytics report from the current snapshot.
    pub fn build_report(&self) -> AnalyticsReport {
        AnalyticsReport::build(&self.model, &self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    use crate::flow::FlowSample;
    use crate::topology::EdgeId;

    fn lines(session: &Session) -> Vec<&str> {
        session
            .transcript()
            .lines()
            .iter()
            .map(|s| s.as_str())
            .collect()
    }

    #[test]
    fn test_echo_then_result_line() {
        let mut session = Session::new(1);
        assert!(session.execute_line("node add TestNode Service capacity=100"));
        assert_eq!(
            lines(&session),
            vec![
                "> node add TestNode Service capacity=100",
                "Added node TestNode (Service)",
            ]
        );
    }

    #[test]
    fn test_duplicate_add_reports_error_and_keeps_one() {
        let mut session = Session::new(1);
        session.execute_line("node add TestNode Service capacity=100");
        assert!(!session.execute_line("node add TestNode Service capacity=100"));
        let all = lines(&session);
        assert_eq!(all[2], "> node add TestNode Service capacity=100");
        assert_eq!(all[3], "Error: validation failed: node 'TestNode' already exists");
        assert_eq!(session.model().node_count(), 1);
    }

    #[test]
    fn test_unknown_verb_echoed_and_rejected() {
        let mut session = Session::new(1);
        assert!(!session.execute_line("teleport x"));
        assert_eq!(
            lines(&session),
            vec!["> teleport x", "Error: syntax error: unknown verb 'teleport'"]
        );
    }

    #[test]
    fn test_empty_line_produces_no_transcript() {
        let mut session = Session::new(1);
        assert!(session.execute_line("   "));
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_cascade_removal_transcript() {
        let mut session = Session::new(1);
        session.execute_line("node add a Source");
        session.execute_line("node add b Service");
        session.execute_line("node add c Sink");
        session.execute_line("link add a b");
        session.execute_line("link add b c");
        session.execute_line("node remove b");
        let all = lines(&session);
        let tail = &all[all.len() - 4..];
        assert_eq!(
            tail,
            &[
                "> node remove b",
                "Removed link a -> b",
                "Removed link b -> c",
                "Removed node b",
            ]
        );
        assert_eq!(session.model().link_count(), 0);
    }

    #[test]
    fn test_tick_populates_metrics() {
        let mut session = Session::new(7);
        session.execute_line("node add src Source");
        session.execute_line("node add dst Sink");
        session.execute_line("link add src dst");
        assert!(session.execute_line("tick 3"));
        assert_eq!(session.window_index(), 3);
        assert_eq!(session.metrics().window(), 3);
        assert!(!session.metrics().is_empty());
        let all = lines(&session);
        assert_eq!(*all.last().unwrap(), "Advanced 3 window(s), now at window 3");
    }

    #[test]
    fn test_seeded_sessions_replay_identically() {
        let commands = [
            "node add src Source",
            "node add dst Sink",
            "link add src dst",
            "tick 2",
            "summary",
        ];
        let mut a = Session::new(99);
        let mut b = Session::new(99);
        for cmd in commands {
            a.execute_line(cmd);
            b.execute_line(cmd);
        }
        assert_eq!(a.transcript().lines(), b.transcript().lines());
    }

    #[test]
    fn test_ingest_window_feeds_analytics() {
        let mut session = Session::new(1);
        session.execute_line("node add in Ingress");
        session.execute_line("node add out Sink");
        session.execute_line("link add in out");

        let mut window = FlowWindow::new(10);
        window.record(EdgeId::new("in", "out"), FlowSample::new(18.0, 5.0, 2.0));
        session.ingest_window(window);

        assert_eq!(session.window_index(), 10);
        assert!(session.execute_line("summary"));
        let all = lines(&session);
        assert!(all
            .iter()
            .any(|l| l.starts_with("Traffic summary: 1 paths (1 active, 1 problematic)")));
    }

    #[test]
    fn test_load_replaces_model() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"nodes:\n  - id: x\n    kind: Source\n  - id: y\n    kind: Sink\nlinks:\n  - from: x\n    to: y\n",
        )
        .unwrap();

        let mut session = Session::new(1);
        session.execute_line("node add old Service");
        let cmd = format!("load {}", file.path().display());
        assert!(session.execute_line(&cmd));
        assert!(session.model().has_node("x"));
        assert!(!session.model().has_node("old"));
        let all = lines(&session);
        assert!(all.last().unwrap().contains("(2 nodes, 1 links)"));
    }

    #[test]
    fn test_load_failure_keeps_previous_model() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"nodes:\n  - id: x\n    kind: Source\nlinks:\n  - from: x\n    to: ghost\n",
        )
        .unwrap();

        let mut session = Session::new(1);
        session.execute_line("node add old Service");
        let cmd = format!("load {}", file.path().display());
        assert!(!session.execute_line(&cmd));
        // The previous topology is untouched.
        assert!(session.model().has_node("old"));
        assert_eq!(session.model().node_count(), 1);
        let all = lines(&session);
        assert!(all
            .last()
            .unwrap()
            .starts_with("Error: structural integrity violation:"));
    }

    #[test]
    fn test_load_missing_file() {
        let mut session = Session::new(1);
        assert!(!session.execute_line("load /does/not/exist.yaml"));
        assert!(lines(&session).last().unwrap().starts_with("Error:"));
    }

    fn script_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_script_markers_bracket_commands() {
        let file = script_file("node add a Source\nnode add z Sink\nlink add a z\n");
        let mut session = Session::new(1);
        let cmd = format!("run {}", file.path().display());
        assert!(session.execute_line(&cmd));
        session.pump_scripts(Instant::now());

        let all = lines(&session);
        assert!(all[0].starts_with("> run "));
        assert!(all[1].starts_with("Running script "));
        assert_eq!(all[2], "[script] start");
        assert_eq!(all[3], "> node add a Source");
        assert_eq!(all[4], "Added node a (Source)");
        assert_eq!(all[5], "> node add z Sink");
        assert_eq!(all[6], "Added node z (Sink)");
        assert_eq!(all[7], "> link add a z");
        assert_eq!(all[8], "Added link a -> z");
        assert_eq!(*all.last().unwrap(), "[script] end");
        assert!(!session.script_running());
    }

    #[test]
    fn test_script_continue_on_error_by_default() {
        let file = script_file("node add a Source\nnode add a Source\nnode add z Sink\n");
        let mut session = Session::new(1);
        session.execute_line(&format!("run {}", file.path().display()));
        session.pump_scripts(Instant::now());

        // The duplicate fails but the third command still runs.
        assert!(session.model().has_node("z"));
        let all = lines(&session);
        assert!(all.iter().any(|l| l.starts_with("Error:")));
        assert_eq!(*all.last().unwrap(), "[script] end");
    }

    #[test]
    fn test_script_halt_on_error_policy() {
        let file = script_file("node add a Source\nnode add a Source\nnode add z Sink\n");
        let mut session = Session::new(1);
        session.set_script_options(ScriptOptions {
            continue_on_error: false,
        });
        session.execute_line(&format!("run {}", file.path().display()));
        session.pump_scripts(Instant::now());

        assert!(!session.model().has_node("z"));
        assert!(!session.script_running());
        assert_eq!(*lines(&session).last().unwrap(), "[script] end");
    }

    #[test]
    fn test_script_delay_suspends_without_blocking() {
        let file = script_file("node add a Source\n@delay 10s\nnode add z Sink\n");
        let mut session = Session::new(1);
        session.execute_line(&format!("run {}", file.path().display()));

        let start = Instant::now();
        session.pump_scripts(start);
        assert!(session.model().has_node("a"));
        assert!(!session.model().has_node("z"));
        assert!(session.script_running());
        let deadline = session.next_deadline().unwrap();
        assert!(deadline > start);

        // Interactive commands still execute while the script waits.
        assert!(session.execute_line("node add mid Service"));
        assert!(session.model().has_node("mid"));

        // Nothing happens before the deadline.
        session.pump_scripts(start + Duration::from_secs(5));
        assert!(!session.model().has_node("z"));

        session.pump_scripts(deadline);
        assert!(session.model().has_node("z"));
        assert!(!session.script_running());
        assert_eq!(*lines(&session).last().unwrap(), "[script] end");
    }

    #[test]
    fn test_abort_between_steps() {
        let file = script_file("node add a Source\n@delay 10s\nnode add z Sink\n");
        let mut session = Session::new(1);
        session.execute_line(&format!("run {}", file.path().display()));
        session.pump_scripts(Instant::now());
        assert!(session.script_running());

        assert!(session.execute_line("abort"));
        assert!(!session.script_running());
        let all = lines(&session);
        assert_eq!(*all.last().unwrap(), "[script] aborted");
        // The model keeps what the last completed command produced.
        assert!(session.model().has_node("a"));
        assert!(!session.model().has_node("z"));

        // Nothing left to pump.
        session.pump_scripts(Instant::now() + Duration::from_secs(60));
        assert!(!session.model().has_node("z"));
    }

    #[test]
    fn test_abort_without_script_is_error() {
        let mut session = Session::new(1);
        assert!(!session.execute_line("abort"));
        assert_eq!(
            *lines(&session).last().unwrap(),
            "Error: validation failed: no script is running"
        );
    }

    #[test]
    fn test_script_can_abort_itself() {
        let file = script_file("node add a Source\nabort\nnode add z Sink\n");
        let mut session = Session::new(1);
        session.execute_line(&format!("run {}", file.path().display()));
        session.pump_scripts(Instant::now());

        assert!(session.model().has_node("a"));
        assert!(!session.model().has_node("z"));
        assert!(!session.script_running());
        let all = lines(&session);
        assert_eq!(*all.last().unwrap(), "[script] aborted");
    }

    #[test]
    fn test_run_while_running_rejected() {
        let file = script_file("node add a Source\n@delay 10s\nnode add z Sink\n");
        let mut session = Session::new(1);
        session.execute_line(&format!("run {}", file.path().display()));
        session.pump_scripts(Instant::now());

        let second = script_file("node add b Source\n");
        assert!(!session.execute_line(&format!("run {}", second.path().display())));
        assert_eq!(
            *lines(&session).last().unwrap(),
            "Error: validation failed: a script is already running"
        );
    }

    #[test]
    fn test_run_missing_script_file() {
        let mut session = Session::new(1);
        assert!(!session.execute_line("run /does/not/exist.fs"));
        assert!(lines(&session)
            .last()
            .unwrap()
            .starts_with("Error: not found: script"));
    }

    #[test]
    fn test_run_script_with_bad_directive() {
        let file = script_file("node add a Source\n@pause 1s\n");
        let mut session = Session::new(1);
        assert!(!session.execute_line(&format!("run {}", file.path().display())));
        let last = lines(&session).last().unwrap().to_string();
        assert!(last.starts_with("Error: validation failed: script"));
        assert!(last.contains("unknown directive"));
        assert!(!session.script_running());
    }

    #[test]
    fn test_help_verb() {
        let mut session = Session::new(1);
        assert!(session.execute_line("help"));
        let all = lines(&session);
        assert_eq!(all[0], "> help");
        assert_eq!(all[1], "Available commands:");
        assert!(all.len() > 10);
    }

    #[test]
    fn test_analytics_verbs_do_not_mutate() {
        let mut session = Session::new(3);
        session.execute_line("node add src Source");
        session.execute_line("node add dst Sink");
        session.execute_line("link add src dst");
        session.execute_line("tick");
        let model_before = session.model().clone();

        for verb in ["paths", "paths top", "summary", "matrix", "groups", "bottlenecks", "topo"] {
            assert!(session.execute_line(verb), "verb '{}' should succeed", verb);
        }
        assert_eq!(*session.model(), model_before);
        assert_eq!(session.window_index(), 1);
    }

    #[test]
    fn test_build_report_matches_session_state() {
        let mut session = Session::new(5);
        session.execute_line("node add src Source");
        session.execute_line("node add dst Sink");
        session.execute_line("link add src dst");
        session.execute_line("tick 2");
        let report = session.build_report();
        assert_eq!(report.window, 2);
        assert_eq!(report.overview.total_nodes, 2);
        assert_eq!(report.path_analysis.paths.len(), 1);
    }
}
