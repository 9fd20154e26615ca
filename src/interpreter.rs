//! The command interpreter: one line of text in, one validated invocation out.
//!
//! The grammar is deliberately small: one command per line, space-delimited.
//!
//! ```text
//! print <text...>
//! load_network <file>
//! clear_evidence <node>
//! get_belief <node>
//! set_evidence <node> <int-state>
//! observe <node> <float-value>
//! ```
//!
//! Blank lines and lines starting with `;` are comments. The interpreter is
//! stateless; line numbers are threaded through by the caller so script
//! errors can cite them.

use crate::protocol::Request;
use std::fmt::{Display, Formatter};

/// A parsed, validated command line, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// Local echo of the carried text; never touches the channel.
    Print(String),
    /// A command that performs one request/reply round trip.
    Remote(Request),
}

/// A local grammar error, detected before any network traffic.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The verb/arity combination matches no known command.
    UnknownCommand {
        /// The offending line, untrimmed.
        line: String,
        /// 1-based line number when replaying a script.
        line_no: Option<usize>,
    },
    /// The verb and arity matched, but an argument failed numeric parsing.
    InvalidArgument {
        /// The offending line, untrimmed.
        line: String,
        /// 1-based line number when replaying a script.
        line_no: Option<usize>,
        /// Why the argument was rejected.
        reason: String,
    },
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCommand { line, line_no } => match line_no {
                Some(n) => write!(f, "unknown command at line {n}: \"{}\"", line.trim()),
                None => write!(f, "unknown command: \"{}\"", line.trim()),
            },
            Self::InvalidArgument {
                line,
                line_no,
                reason,
            } => match line_no {
                Some(n) => {
                    write!(f, "invalid argument at line {n}: \"{}\" ({reason})", line.trim())
                }
                None => write!(f, "invalid argument: \"{}\" ({reason})", line.trim()),
            },
        }
    }
}

impl std::error::Error for ParseError {}

/// Builds a wire request from the tokens following the verb.
type Constructor = fn(&[&str]) -> Result<Request, String>;

/// The command table: `(verb, arity) → constructor`.
///
/// Dispatch requires both the verb and the argument count to match, so a
/// known verb with the wrong arity is an unknown command, exactly like an
/// unknown verb. Adding a command is one new row.
static COMMANDS: &[(&str, usize, Constructor)] = &[
    ("load_network", 1, |args| {
        Ok(Request::LoadNetwork {
            file: args[0].to_string(),
        })
    }),
    ("clear_evidence", 1, |args| {
        Ok(Request::ClearEvidence {
            node: args[0].to_string(),
        })
    }),
    ("get_belief", 1, |args| {
        Ok(Request::GetBelief {
            node: args[0].to_string(),
        })
    }),
    ("set_evidence", 2, |args| {
        Ok(Request::SetEvidence {
            node: args[0].to_string(),
            state: args[1].parse::<i64>().map_err(|e| e.to_string())?,
        })
    }),
    ("observe", 2, |args| {
        Ok(Request::Observe {
            node: args[0].to_string(),
            value: args[1].parse::<f64>().map_err(|e| e.to_string())?,
        })
    }),
];

/// Parse one line into an invocation.
///
/// Returns `Ok(None)` for blank lines and `;` comments (nothing to do, not
/// an error). `line_no` is the 1-based script line number, if any; it is
/// carried into errors verbatim.
pub fn parse(line: &str, line_no: Option<usize>) -> Result<Option<Invocation>, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(';') {
        return Ok(None);
    }

    // Split on single spaces; runs of spaces yield empty tokens.
    let tokens: Vec<&str> = trimmed.split(' ').collect();

    // `print` is exempt from arity checking: everything after the verb is
    // echoed back, rejoined with single spaces.
    if tokens[0] == "print" {
        return Ok(Some(Invocation::Print(tokens[1..].join(" "))));
    }

    let args = &tokens[1..];
    let entry = COMMANDS
        .iter()
        .find(|(verb, arity, _)| *verb == tokens[0] && *arity == args.len());

    match entry {
        None => Err(ParseError::UnknownCommand {
            line: line.to_string(),
            line_no,
        }),
        Some((_, _, build)) => match build(args) {
            Ok(request) => Ok(Some(Invocation::Remote(request))),
            Err(reason) => Err(ParseError::InvalidArgument {
                line: line.to_string(),
                line_no,
                reason,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(line: &str) -> Invocation {
        parse(line, None).unwrap().unwrap()
    }

    #[test]
    fn test_single_argument_verbs() {
        assert_eq!(
            parse_ok("load_network net.xml"),
            Invocation::Remote(Request::LoadNetwork {
                file: "net.xml".to_string()
            })
        );
        assert_eq!(
            parse_ok("clear_evidence rain"),
            Invocation::Remote(Request::ClearEvidence {
                node: "rain".to_string()
            })
        );
        assert_eq!(
            parse_ok("get_belief rain"),
            Invocation::Remote(Request::GetBelief {
                node: "rain".to_string()
            })
        );
    }

    #[test]
    fn test_two_argument_verbs() {
        assert_eq!(
            parse_ok("set_evidence rain 3"),
            Invocation::Remote(Request::SetEvidence {
                node: "rain".to_string(),
                state: 3
            })
        );
        assert_eq!(
            parse_ok("observe temp 0.5"),
            Invocation::Remote(Request::Observe {
                node: "temp".to_string(),
                value: 0.5
            })
        );
    }

    #[test]
    fn test_blank_and_comment_lines_skip() {
        assert_eq!(parse("", None), Ok(None));
        assert_eq!(parse("   ", None), Ok(None));
        assert_eq!(parse(";anything", None), Ok(None));
        assert_eq!(parse("  ; indented comment", None), Ok(None));
    }

    #[test]
    fn test_print_rejoins_arguments() {
        assert_eq!(parse_ok("print a b c"), Invocation::Print("a b c".to_string()));
        // `print` alone echoes an empty line rather than failing.
        assert_eq!(parse_ok("print"), Invocation::Print(String::new()));
    }

    #[test]
    fn test_unknown_verb() {
        assert!(matches!(
            parse("bogus arg", None),
            Err(ParseError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_known_verb_wrong_arity_is_unknown() {
        assert!(matches!(
            parse("set_evidence rain", None),
            Err(ParseError::UnknownCommand { .. })
        ));
        assert!(matches!(
            parse("get_belief a b", None),
            Err(ParseError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_non_numeric_state_is_invalid_argument() {
        assert!(matches!(
            parse("set_evidence rain x", None),
            Err(ParseError::InvalidArgument { .. })
        ));
        assert!(matches!(
            parse("observe temp warm", None),
            Err(ParseError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_error_rendering_cites_line_number() {
        let err = parse("bogus arg", Some(3)).unwrap_err();
        assert_eq!(err.to_string(), "unknown command at line 3: \"bogus arg\"");

        let err = parse("bogus arg", None).unwrap_err();
        assert_eq!(err.to_string(), "unknown command: \"bogus arg\"");
    }

    #[test]
    fn test_error_keeps_untrimmed_line() {
        let err = parse("  bogus  ", Some(7)).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownCommand {
                line: "  bogus  ".to_string(),
                line_no: Some(7),
            }
        );
        // Rendering trims for display.
        assert_eq!(err.to_string(), "unknown command at line 7: \"bogus\"");
    }
}
