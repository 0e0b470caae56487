//! Console command grammar.
//!
//! Commands are single text lines of the form `<verb> <args...>` with
//! case-sensitive verbs, whitespace-delimited arguments, and trailing
//! `key=value` attributes for structured fields. Parsing yields a typed
//! [`Command`]; nothing here touches the topology.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::analysis::types::PathFilter;
use crate::config::LoadError;
use crate::topology::{ModelError, NodeAttribute, NodeKind};

/// Identifiers for nodes and groups: leading letter, then letters,
/// digits, `_`, `-`, or `.`.
static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.-]*$").expect("identifier regex is valid"));

/// Errors surfaced by command parsing and execution.
///
/// Syntax errors are parse failures; everything else is expressed
/// through the model's own taxonomy so execution failures and parse-time
/// validation read the same in the transcript.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl CommandError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CommandError::Model(ModelError::Validation(msg.into()))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CommandError::Model(ModelError::NotFound(msg.into()))
    }

    pub fn syntax(msg: impl Into<String>) -> Self {
        CommandError::Syntax(msg.into())
    }
}

/// A parsed console command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    NodeAdd {
        id: String,
        kind: NodeKind,
        attrs: Vec<NodeAttribute>,
        /// Attribute keys this version does not recognize; reported as
        /// diagnostics, not errors.
        unknown_attrs: Vec<String>,
    },
    NodeRemove {
        id: String,
    },
    NodeSet {
        id: String,
        attrs: Vec<NodeAttribute>,
        unknown_attrs: Vec<String>,
    },
    LinkAdd {
        from: String,
        to: String,
    },
    LinkRemove {
        from: String,
        to: String,
    },
    GroupAdd {
        name: String,
        members: Vec<String>,
    },
    GroupRemove {
        name: String,
    },
    Paths {
        filter: PathFilter,
    },
    Summary,
    Matrix,
    Groups,
    Bottlenecks,
    Topo,
    Tick {
        count: u32,
    },
    Load {
        path: String,
    },
    Run {
        path: String,
    },
    Abort,
    Help,
}

/// Parse one command line into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = tokens.split_first() else {
        return Err(CommandError::syntax("empty command"));
    };

    match verb {
        "node" => parse_node(args),
        "link" => parse_link(args),
        "group" => parse_group(args),
        "paths" => parse_paths(args),
        "summary" => expect_no_args("summary", args).map(|_| Command::Summary),
        "matrix" => expect_no_args("matrix", args).map(|_| Command::Matrix),
        "groups" => expect_no_args("groups", args).map(|_| Command::Groups),
        "bottlenecks" => expect_no_args("bottlenecks", args).map(|_| Command::Bottlenecks),
        "topo" => expect_no_args("topo", args).map(|_| Command::Topo),
        "tick" => parse_tick(args),
        "load" => parse_path_arg("load", args).map(|path| Command::Load { path }),
        "run" => parse_path_arg("run", args).map(|path| Command::Run { path }),
        "abort" => expect_no_args("abort", args).map(|_| Command::Abort),
        "help" => expect_no_args("help", args).map(|_| Command::Help),
        other => Err(CommandError::syntax(format!("unknown verb '{}'", other))),
    }
}

fn expect_no_args(verb: &str, args: &[&str]) -> Result<(), CommandError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandError::syntax(format!(
            "'{}' takes no arguments",
            verb
        )))
    }
}

fn parse_path_arg(verb: &str, args: &[&str]) -> Result<String, CommandError> {
    match args {
        [path] => Ok(path.to_string()),
        _ => Err(CommandError::syntax(format!("usage: {} <file>", verb))),
    }
}

fn validate_ident(what: &str, ident: &str) -> Result<String, CommandError> {
    if IDENT_RE.is_match(ident) {
        Ok(ident.to_string())
    } else {
        Err(CommandError::validation(format!(
            "invalid {} '{}': must start with a letter and use only letters, digits, '_', '-', '.'",
            what, ident
        )))
    }
}

fn parse_attrs(tokens: &[&str]) -> Result<(Vec<NodeAttribute>, Vec<String>), CommandError> {
    let mut attrs = Vec::new();
    let mut unknown = Vec::new();
    for token in tokens {
        let Some((key, value)) = token.split_once('=') else {
            return Err(CommandError::syntax(format!(
                "malformed attribute '{}': expected key=value",
                token
            )));
        };
        match NodeAttribute::parse(key, value) {
            Ok(Some(attr)) => attrs.push(attr),
            Ok(None) => unknown.push(key.to_string()),
            Err(msg) => return Err(CommandError::validation(msg)),
        }
    }
    Ok((attrs, unknown))
}

fn parse_node(args: &[&str]) -> Result<Command, CommandError> {
    match args.split_first() {
        Some((&"add", rest)) => {
            let [id, kind, attr_tokens @ ..] = rest else {
                return Err(CommandError::syntax(
                    "usage: node add <id> <kind> [attr=value ...]",
                ));
            };
            let id = validate_ident("node id", id)?;
            let kind = NodeKind::parse(kind).ok_or_else(|| {
                let expected: Vec<&str> = NodeKind::ALL.iter().map(|k| k.as_str()).collect();
                CommandError::validation(format!(
                    "unknown node kind '{}' (expected one of: {})",
                    kind,
                    expected.join(", ")
                ))
            })?;
            let (attrs, unknown_attrs) = parse_attrs(attr_tokens)?;
            Ok(Command::NodeAdd {
                id,
                kind,
                attrs,
                unknown_attrs,
            })
        }
        Some((&"remove", rest)) => match rest {
            [id] => Ok(Command::NodeRemove { id: id.to_string() }),
            _ => Err(CommandError::syntax("usage: node remove <id>")),
        },
        Some((&"set", rest)) => {
            let [id, attr_tokens @ ..] = rest else {
                return Err(CommandError::syntax(
                    "usage: node set <id> <attr=value ...>",
                ));
            };
            if attr_tokens.is_empty() {
                return Err(CommandError::syntax(
                    "usage: node set <id> <attr=value ...>",
                ));
            }
            let (attrs, unknown_attrs) = parse_attrs(attr_tokens)?;
            Ok(Command::NodeSet {
                id: id.to_string(),
                attrs,
                unknown_attrs,
            })
        }
        _ => Err(CommandError::syntax("usage: node <add|remove|set> ...")),
    }
}

fn parse_link(args: &[&str]) -> Result<Command, CommandError> {
    match args {
        ["add", from, to] => Ok(Command::LinkAdd {
            from: from.to_string(),
            to: to.to_string(),
        }),
        ["remove", from, to] => Ok(Command::LinkRemove {
            from: from.to_string(),
            to: to.to_string(),
        }),
        _ => Err(CommandError::syntax(
            "usage: link <add|remove> <from> <to>",
        )),
    }
}

fn parse_group(args: &[&str]) -> Result<Command, CommandError> {
    match args.split_first() {
        Some((&"add", rest)) => {
            let [name, members @ ..] = rest else {
                return Err(CommandError::syntax(
                    "usage: group add <name> <member ...>",
                ));
            };
            if members.is_empty() {
                return Err(CommandError::syntax(
                    "usage: group add <name> <member ...>",
                ));
            }
            let name = validate_ident("group name", name)?;
            Ok(Command::GroupAdd {
                name,
                members: members.iter().map(|m| m.to_string()).collect(),
            })
        }
        Some((&"remove", rest)) => match rest {
            [name] => Ok(Command::GroupRemove {
                name: name.to_string(),
            }),
            _ => Err(CommandError::syntax("usage: group remove <name>")),
        },
        _ => Err(CommandError::syntax("usage: group <add|remove> ...")),
    }
}

fn parse_paths(args: &[&str]) -> Result<Command, CommandError> {
    let filter = match args {
        [] => PathFilter::All,
        [name] => PathFilter::parse(name).ok_or_else(|| {
            CommandError::validation(format!(
                "unknown path filter '{}' (expected one of: all, critical, lossy, top)",
                name
            ))
        })?,
        _ => return Err(CommandError::syntax("usage: paths [all|critical|lossy|top]")),
    };
    Ok(Command::Paths { filter })
}

fn parse_tick(args: &[&str]) -> Result<Command, CommandError> {
    let count = match args {
        [] => 1,
        [count] => count
            .parse::<u32>()
            .ok()
            .filter(|c| *c >= 1)
            .ok_or_else(|| {
                CommandError::validation(format!(
                    "tick count must be a positive integer, got '{}'",
                    count
                ))
            })?,
        _ => return Err(CommandError::syntax("usage: tick [count]")),
    };
    Ok(Command::Tick { count })
}

/// Static enumeration of available verbs for `help`.
pub fn help_lines() -> Vec<String> {
    vec![
        "Available commands:".to_string(),
        "  node add <id> <kind> [attr=value ...]   add a node (kinds: Source, Ingress, Service, Sink)".to_string(),
        "  node remove <id>                        remove a node and its links".to_string(),
        "  node set <id> <attr=value ...>          update node attributes (capacity, processing)".to_string(),
        "  link add <from> <to>                    add a directed link".to_string(),
        "  link remove <from> <to>                 remove a link".to_string(),
        "  group add <name> <member ...>           define a boundary group".to_string(),
        "  group remove <name>                     remove a boundary group".to_string(),
        "  paths [all|critical|lossy|top]          show path statistics".to_string(),
        "  summary                                 show the traffic summary".to_string(),
        "  matrix                                  show the connectivity matrix".to_string(),
        "  groups                                  show boundary-crossing analysis".to_string(),
        "  bottlenecks                             show overloaded nodes".to_string(),
        "  topo                                    show the topology overview".to_string(),
        "  tick [count]                            advance the traffic simulation".to_string(),
        "  load <file>                             replace the topology from a document".to_string(),
        "  run <file>                              run a command script".to_string(),
        "  abort                                   abort the running script".to_string(),
        "  help                                    show this list".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_add() {
        let cmd = parse_command("node add web1 Service capacity=200 processing=1.5").unwrap();
        assert_eq!(
            cmd,
            Command::NodeAdd {
                id: "web1".to_string(),
                kind: NodeKind::Service,
                attrs: vec![
                    NodeAttribute::Capacity(200.0),
                    NodeAttribute::Processing(1.5)
                ],
                unknown_attrs: vec![],
            }
        );
    }

    #[test]
    fn test_parse_node_add_unknown_attr_collected() {
        let cmd = parse_command("node add web1 Service color=red capacity=10").unwrap();
        match cmd {
            Command::NodeAdd {
                attrs,
                unknown_attrs,
                ..
            } => {
                assert_eq!(attrs, vec![NodeAttribute::Capacity(10.0)]);
                assert_eq!(unknown_attrs, vec!["color".to_string()]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_node_add_bad_kind_is_validation() {
        let err = parse_command("node add web1 Router").unwrap_err();
        assert!(matches!(err, CommandError::Model(ModelError::Validation(_))));
        assert!(err.to_string().contains("unknown node kind 'Router'"));
    }

    #[test]
    fn test_parse_node_add_bad_id() {
        let err = parse_command("node add 1web Service").unwrap_err();
        assert!(matches!(err, CommandError::Model(ModelError::Validation(_))));
    }

    #[test]
    fn test_parse_node_add_malformed_attr_value() {
        let err = parse_command("node add web1 Service capacity=fast").unwrap_err();
        assert!(matches!(err, CommandError::Model(ModelError::Validation(_))));
        assert!(err.to_string().contains("capacity must be a number"));
    }

    #[test]
    fn test_parse_node_add_attr_without_equals() {
        let err = parse_command("node add web1 Service capacity").unwrap_err();
        assert!(matches!(err, CommandError::Syntax(_)));
    }

    #[test]
    fn test_parse_node_remove_and_set() {
        assert_eq!(
            parse_command("node remove web1").unwrap(),
            Command::NodeRemove {
                id: "web1".to_string()
            }
        );
        assert_eq!(
            parse_command("node set web1 capacity=50").unwrap(),
            Command::NodeSet {
                id: "web1".to_string(),
                attrs: vec![NodeAttribute::Capacity(50.0)],
                unknown_attrs: vec![],
            }
        );
        assert!(matches!(
            parse_command("node set web1").unwrap_err(),
            CommandError::Syntax(_)
        ));
    }

    #[test]
    fn test_parse_link_commands() {
        assert_eq!(
            parse_command("link add a b").unwrap(),
            Command::LinkAdd {
                from: "a".to_string(),
                to: "b".to_string()
            }
        );
        assert_eq!(
            parse_command("link remove a b").unwrap(),
            Command::LinkRemove {
                from: "a".to_string(),
                to: "b".to_string()
            }
        );
        assert!(matches!(
            parse_command("link add a").unwrap_err(),
            CommandError::Syntax(_)
        ));
    }

    #[test]
    fn test_parse_group_commands() {
        assert_eq!(
            parse_command("group add front lb1 lb2").unwrap(),
            Command::GroupAdd {
                name: "front".to_string(),
                members: vec!["lb1".to_string(), "lb2".to_string()],
            }
        );
        assert!(matches!(
            parse_command("group add front").unwrap_err(),
            CommandError::Syntax(_)
        ));
        assert_eq!(
            parse_command("group remove front").unwrap(),
            Command::GroupRemove {
                name: "front".to_string()
            }
        );
    }

    #[test]
    fn test_parse_paths_filters() {
        assert_eq!(
            parse_command("paths").unwrap(),
            Command::Paths {
                filter: PathFilter::All
            }
        );
        assert_eq!(
            parse_command("paths top").unwrap(),
            Command::Paths {
                filter: PathFilter::Top
            }
        );
        let err = parse_command("paths best").unwrap_err();
        assert!(matches!(err, CommandError::Model(ModelError::Validation(_))));
    }

    #[test]
    fn test_parse_tick() {
        assert_eq!(parse_command("tick").unwrap(), Command::Tick { count: 1 });
        assert_eq!(parse_command("tick 5").unwrap(), Command::Tick { count: 5 });
        assert!(matches!(
            parse_command("tick zero").unwrap_err(),
            CommandError::Model(ModelError::Validation(_))
        ));
        assert!(matches!(
            parse_command("tick 0").unwrap_err(),
            CommandError::Model(ModelError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_verb_is_syntax_error() {
        let err = parse_command("teleport web1").unwrap_err();
        assert!(matches!(err, CommandError::Syntax(_)));
        assert_eq!(err.to_string(), "syntax error: unknown verb 'teleport'");
    }

    #[test]
    fn test_verbs_are_case_sensitive() {
        assert!(matches!(
            parse_command("Node add web1 Service").unwrap_err(),
            CommandError::Syntax(_)
        ));
        assert!(matches!(
            parse_command("HELP").unwrap_err(),
            CommandError::Syntax(_)
        ));
    }

    #[test]
    fn test_kind_is_case_insensitive() {
        let cmd = parse_command("node add web1 service").unwrap();
        assert!(matches!(
            cmd,
            Command::NodeAdd {
                kind: NodeKind::Service,
                ..
            }
        ));
    }

    #[test]
    fn test_simple_verbs_reject_extra_args() {
        assert!(matches!(
            parse_command("summary now").unwrap_err(),
            CommandError::Syntax(_)
        ));
        assert!(matches!(
            parse_command("help me").unwrap_err(),
            CommandError::Syntax(_)
        ));
    }

    #[test]
    fn test_load_and_run_take_one_path() {
        assert_eq!(
            parse_command("load topo.yaml").unwrap(),
            Command::Load {
                path: "topo.yaml".to_string()
            }
        );
        assert_eq!(
            parse_command("run warmup.fs").unwrap(),
            Command::Run {
                path: "warmup.fs".to_string()
            }
        );
        assert!(matches!(
            parse_command("load").unwrap_err(),
            CommandError::Syntax(_)
        ));
    }

    #[test]
    fn test_help_enumerates_every_verb() {
        let help = help_lines().join("\n");
        for verb in [
            "node add", "node remove", "node set", "link add", "link remove", "group add",
            "group remove", "paths", "summary", "matrix", "groups", "bottlenecks", "topo",
            "tick", "load", "run", "abort", "help",
        ] {
            assert!(help.contains(verb), "help should mention '{}'", verb);
        }
    }
}
