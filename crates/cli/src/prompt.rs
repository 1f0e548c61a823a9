//! Interactive confirmation on the terminal.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use tracing::warn;

use planar_core::catalog::RunMetadata;
use planar_core::VersionGate;

/// Parse a yes/no answer. `None` for anything unrecognized.
pub fn boolify(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().chars().next() {
        Some('y' | 't' | '1') => Some(true),
        Some('n' | 'f' | '0') => Some(false),
        _ => None,
    }
}

/// Ask until a recognizable answer arrives. An empty line or end of input
/// counts as no.
pub fn ask_yes_no<R: BufRead, W: Write>(question: &str, input: &mut R, output: &mut W) -> bool {
    loop {
        if write!(output, "{} [y/N] ", question)
            .and_then(|_| output.flush())
            .is_err()
        {
            return false;
        }

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => return false,
            Ok(_) => {}
        }
        if line.trim().is_empty() {
            return false;
        }
        if let Some(answer) = boolify(&line) {
            return answer;
        }
    }
}

/// Asks the operator on stdin whether to continue with an unsupported
/// catalog version.
pub struct StdinVersionGate;

#[async_trait]
impl VersionGate for StdinVersionGate {
    async fn confirm_version_drift(&self, remote: &RunMetadata, supported: &str) -> bool {
        let question = format!(
            "Catalog version {} differs from supported version {}. Continue?",
            remote.version, supported
        );

        let answer = tokio::task::spawn_blocking(move || {
            let stdin = io::stdin();
            let stdout = io::stdout();
            ask_yes_no(&question, &mut stdin.lock(), &mut stdout.lock())
        })
        .await;

        match answer {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Prompt failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_boolify() {
        for yes in ["y", "Yes", "t", "TRUE", "1"] {
            assert_eq!(boolify(yes), Some(true), "{yes}");
        }
        for no in ["n", "No", "f", "false", "0"] {
            assert_eq!(boolify(no), Some(false), "{no}");
        }
        assert_eq!(boolify("maybe"), None);
        assert_eq!(boolify(""), None);
    }

    #[test]
    fn test_empty_answer_is_no() {
        let mut output = Vec::new();
        assert!(!ask_yes_no("Go?", &mut Cursor::new("\n"), &mut output));
        assert_eq!(String::from_utf8(output).unwrap(), "Go? [y/N] ");
    }

    #[test]
    fn test_invalid_answer_asks_again() {
        let mut output = Vec::new();
        assert!(ask_yes_no("Go?", &mut Cursor::new("what\nyes\n"), &mut output));
        assert_eq!(String::from_utf8(output).unwrap(), "Go? [y/N] Go? [y/N] ");
    }

    #[test]
    fn test_end_of_input_is_no() {
        let mut output = Vec::new();
        assert!(!ask_yes_no("Go?", &mut Cursor::new(""), &mut output));
    }
}
