//! Script parsing and the poll-driven script runner.
//!
//! A script is an ordered list of console command lines with optional
//! `@delay <duration>` directives between them. The runner holds no
//! thread and never blocks: the owning session polls it with the
//! current time, executes whatever step is due, and uses the reported
//! deadline to decide how long it may sleep. Delays therefore suspend
//! only the script's own continuation; interactive commands and
//! analytics stay fully available while a script waits.

use std::time::{Duration, Instant};

use thiserror::Error;

/// Script text errors, reported with 1-based line numbers.
#[derive(Debug, Error, PartialEq)]
pub enum ScriptError {
    #[error("line {line}: invalid delay directive: {reason}")]
    BadDirective { line: usize, reason: String },
    #[error("line {line}: unknown directive '@{directive}'")]
    UnknownDirective { line: usize, directive: String },
}

/// One step of a parsed script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    /// A console command line, passed to the interpreter verbatim.
    Command(String),
    /// Suspend the script for the given duration.
    Delay(Duration),
}

/// A parsed script ready to run.
#[derive(Debug, Clone)]
pub struct Script {
    name: String,
    steps: Vec<ScriptStep>,
}

impl Script {
    /// Parse script text. Blank lines and `#` comments are skipped;
    /// `@delay <duration>` becomes a delay step (durations use forms
    /// like `500ms`, `2s`, `1m 30s`); everything else is a command.
    pub fn parse(name: &str, text: &str) -> Result<Script, ScriptError> {
        let mut steps = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix('@') {
                let (directive, arg) = match rest.split_once(char::is_whitespace) {
                    Some((d, a)) => (d, a.trim()),
                    None => (rest, ""),
                };
                match directive {
                    "delay" => {
                        if arg.is_empty() {
                            return Err(ScriptError::BadDirective {
                                line: i + 1,
                                reason: "missing duration".to_string(),
                            });
                        }
                        let delay = humantime::parse_duration(arg).map_err(|e| {
                            ScriptError::BadDirective {
                                line: i + 1,
                                reason: e.to_string(),
                            }
                        })?;
                        steps.push(ScriptStep::Delay(delay));
                    }
                    other => {
                        return Err(ScriptError::UnknownDirective {
                            line: i + 1,
                            directive: other.to_string(),
                        });
                    }
                }
            } else {
                steps.push(ScriptStep::Command(line.to_string()));
            }
        }
        Ok(Script {
            name: name.to_string(),
            steps,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    /// Number of command steps (delays excluded).
    pub fn command_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, ScriptStep::Command(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Execution policy for a script run.
#[derive(Debug, Clone, Copy)]
pub struct ScriptOptions {
    /// Keep executing after a failed command. On by default; failures
    /// stay visible in the transcript either way.
    pub continue_on_error: bool,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        ScriptOptions {
            continue_on_error: true,
        }
    }
}

/// What the runner wants from its owner at a given poll.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptDue {
    /// This command line is due now; execute it and report the result
    /// via [`ScriptRunner::absorb_result`].
    Command(String),
    /// Nothing to do before the deadline.
    Wait(Instant),
    /// The script has no further steps.
    Finished,
}

/// Poll-driven executor state for one script.
#[derive(Debug)]
pub struct ScriptRunner {
    script: Script,
    options: ScriptOptions,
    cursor: usize,
    started: bool,
    finished: bool,
    resume_at: Option<Instant>,
}

impl ScriptRunner {
    pub fn new(script: Script, options: ScriptOptions) -> Self {
        ScriptRunner {
            script,
            options,
            cursor: 0,
            started: false,
            finished: false,
            resume_at: None,
        }
    }

    pub fn name(&self) -> &str {
        self.script.name()
    }

    /// Marks the runner started; true only on the first call, which is
    /// when the owner should emit the start marker.
    pub fn mark_started(&mut self) -> bool {
        if self.started {
            false
        } else {
            self.started = true;
            true
        }
    }

    /// Advance to the next due step at time `now`.
    pub fn next_due(&mut self, now: Instant) -> ScriptDue {
        if self.finished {
            return ScriptDue::Finished;
        }
        if let Some(deadline) = self.resume_at {
            if now < deadline {
                return ScriptDue::Wait(deadline);
            }
            self.resume_at = None;
        }
        match self.script.steps.get(self.cursor) {
            None => {
                self.finished = true;
                ScriptDue::Finished
            }
            Some(ScriptStep::Delay(delay)) => {
                self.cursor += 1;
                let deadline = now + *delay;
                self.resume_at = Some(deadline);
                ScriptDue::Wait(deadline)
            }
            Some(ScriptStep::Command(line)) => {
                let line = line.clone();
                self.cursor += 1;
                ScriptDue::Command(line)
            }
        }
    }

    /// Report the result of an executed command. Returns false when the
    /// failure halts the script under the current policy.
    pub fn absorb_result(&mut self, ok: bool) -> bool {
        if !ok && !self.options.continue_on_error {
            log::warn!("Script '{}' halted by failed command", self.name());
            self.finished = true;
            return false;
        }
        true
    }

    /// Deadline of a pending delay, if the runner is waiting on one.
    pub fn deadline(&self) -> Option<Instant> {
        if self.finished {
            None
        } else {
            self.resume_at
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
