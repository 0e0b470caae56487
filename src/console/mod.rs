//! Operator console: command grammar, execution, scripting, sessions.
//!
//! The console is the only writer of topology state. Commands arrive as
//! text lines (interactive or scripted), are parsed into typed
//! [`Command`]s, and are executed one at a time against a [`Session`].

pub mod command;
pub mod interpreter;
pub mod script;
pub mod session;

pub use command::{parse_command, Command, CommandError};
pub use interpreter::Transcript;
pub use script::{Script, ScriptError, ScriptOptions, ScriptRunner};
pub use session::Session;
