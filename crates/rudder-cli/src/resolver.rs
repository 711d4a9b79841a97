//! Interactive fallback for missing command arguments.
//!
//! With `--interactive`, arguments omitted on the command line are
//! asked for on the terminal; without it, a missing required argument
//! is a validation error before any cluster call.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use rudder_core::{OpsError, OpsResult};

pub struct ParameterResolver<R> {
    interactive: bool,
    input: R,
}

impl ParameterResolver<io::BufReader<io::Stdin>> {
    pub fn from_stdin(interactive: bool) -> Self {
        Self {
            interactive,
            input: io::BufReader::new(io::stdin()),
        }
    }
}

impl<R: BufRead> ParameterResolver<R> {
    #[cfg(test)]
    fn with_input(interactive: bool, input: R) -> Self {
        Self { interactive, input }
    }

    /// Resolve a required argument: flag value, else prompt, else
    /// validation error.
    pub fn require<T: FromStr>(&mut self, value: Option<T>, name: &str) -> OpsResult<T> {
        if let Some(value) = value {
            return Ok(value);
        }
        if !self.interactive {
            return Err(OpsError::Validation(format!(
                "missing {name}; pass it as an argument or run with --interactive"
            )));
        }
        let answer = self.ask(name)?;
        if answer.is_empty() {
            return Err(OpsError::Validation(format!("missing {name}")));
        }
        answer
            .parse()
            .map_err(|_| OpsError::Validation(format!("invalid {name}: '{answer}'")))
    }

    /// Resolve an optional argument; a blank interactive answer leaves
    /// it unset.
    pub fn optional(&mut self, value: Option<String>, name: &str) -> OpsResult<Option<String>> {
        if value.is_some() || !self.interactive {
            return Ok(value);
        }
        let answer = self.ask(name)?;
        Ok((!answer.is_empty()).then_some(answer))
    }

    fn ask(&mut self, name: &str) -> OpsResult<String> {
        eprint!("{name}: ");
        let _ = io::stderr().flush();
        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .map_err(|e| OpsError::Validation(format!("cannot read {name}: {e}")))?;
        Ok(line.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn flag_value_wins_without_prompting() {
        let mut resolver = ParameterResolver::with_input(true, Cursor::new("ignored\n"));
        let value: String = resolver.require(Some("api".to_string()), "name").unwrap();
        assert_eq!(value, "api");
    }

    #[test]
    fn missing_required_fails_when_not_interactive() {
        let mut resolver = ParameterResolver::with_input(false, Cursor::new(""));
        let err = resolver.require::<String>(None, "deployment name").unwrap_err();
        assert!(matches!(err, OpsError::Validation(_)));
    }

    #[test]
    fn prompts_when_interactive() {
        let mut resolver = ParameterResolver::with_input(true, Cursor::new("worker\n"));
        let value: String = resolver.require(None, "deployment name").unwrap();
        assert_eq!(value, "worker");
    }

    #[test]
    fn parses_prompted_numbers() {
        let mut resolver = ParameterResolver::with_input(true, Cursor::new("5\n"));
        let value: u32 = resolver.require(None, "replicas").unwrap();
        assert_eq!(value, 5);
    }

    #[test]
    fn unparsable_answer_is_a_validation_error() {
        let mut resolver = ParameterResolver::with_input(true, Cursor::new("lots\n"));
        let err = resolver.require::<u32>(None, "replicas").unwrap_err();
        assert!(matches!(err, OpsError::Validation(_)));
    }

    #[test]
    fn blank_optional_answer_stays_unset() {
        let mut resolver = ParameterResolver::with_input(true, Cursor::new("\n"));
        assert_eq!(resolver.optional(None, "namespace").unwrap(), None);
    }

    #[test]
    fn optional_is_skipped_when_not_interactive() {
        let mut resolver = ParameterResolver::with_input(false, Cursor::new("prod\n"));
        assert_eq!(resolver.optional(None, "namespace").unwrap(), None);
    }
}
