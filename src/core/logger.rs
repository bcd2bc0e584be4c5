//! Hook output formatting.
//!
//! Every line the hook prints is tagged with `pre-commit:` and the block is
//! framed by a blank tagged line on each side, so hook output stands out from
//! whatever git prints around it:
//!
//! ```text
//! pre-commit:
//! pre-commit: The `lint` check (1/2) did not pass.
//! pre-commit:
//! ```

use console::{style, StyledObject};

/// Tag prepended to every line.
pub const PREFIX: &str = "pre-commit:";

/// 256-color palette index of the neutral tag color.
const NEUTRAL_COLOR: u8 = 166;

/// A message handed to the formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A single text, split on line breaks.
    Text(String),
    /// Pre-split lines; each may still contain line breaks.
    Lines(Vec<String>),
}

impl Message {
    /// Returns the individual lines of the message.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Text(text) => split_lines(text),
            Self::Lines(lines) => lines.iter().flat_map(|line| split_lines(line)).collect(),
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<String>> for Message {
    fn from(lines: Vec<String>) -> Self {
        Self::Lines(lines)
    }
}

impl From<&[&str]> for Message {
    fn from(lines: &[&str]) -> Self {
        Self::Lines(lines.iter().map(|line| (*line).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Message {
    fn from(lines: [&str; N]) -> Self {
        Self::from(&lines[..])
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Formats and prints hook output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Logger {
    /// Suppress all output.
    pub silent: bool,
    /// Colorize the tag.
    pub colors: bool,
}

impl Logger {
    /// Creates a logger.
    #[must_use]
    pub const fn new(silent: bool, colors: bool) -> Self {
        Self { silent, colors }
    }

    /// Turns a message into tagged display lines.
    ///
    /// A non-zero `code` marks the content lines as a failure report.
    #[must_use]
    pub fn format(&self, message: &Message, code: i32) -> Vec<String> {
        let separator = join(&self.tag(false), "");
        let content = self.tag(code != 0);

        let mut lines = Vec::new();
        lines.push(separator.clone());
        for line in message.lines() {
            lines.push(join(&content, &line));
        }
        lines.push(separator);
        lines
    }

    /// Prints formatted lines: stderr for failures, stdout otherwise.
    pub fn emit(&self, lines: &[String], code: i32) {
        if self.silent {
            return;
        }

        for line in lines {
            if code == 0 {
                println!("{line}");
            } else {
                eprintln!("{line}");
            }
        }
    }

    fn tag(&self, failure: bool) -> String {
        let tag: StyledObject<&str> = if failure {
            style(PREFIX).red()
        } else {
            style(PREFIX).color256(NEUTRAL_COLOR)
        };
        tag.force_styling(self.colors).to_string()
    }
}

fn join(tag: &str, line: &str) -> String {
    format!("{tag} {line}")
}
