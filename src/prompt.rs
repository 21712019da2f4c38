//! User confirmation and text input.
//!
//! Workflows never read the terminal directly; they ask a [`Prompter`], so
//! the same code runs interactively, under `--yes`, or from a test script.

use std::collections::VecDeque;
use std::io::{self, BufRead};

use console::{Term, style};
use tracing::debug;

/// Source of answers at confirmation points.
pub trait Prompter {
    /// Ask a yes/no question. Anything but an explicit yes is a no.
    fn confirm(&mut self, question: &str) -> bool;

    /// Ask for a line of text. `None` on end of input.
    fn input(&mut self, prompt: &str) -> Option<String>;
}

/// Reads answers from the controlling terminal; questions go to stderr.
#[derive(Debug)]
pub struct TerminalPrompter {
    term: Term,
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalPrompter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn ask(&self, prompt: &str) -> Option<String> {
        self.term.write_str(prompt).ok()?;
        self.term.flush().ok()?;
        let line = if self.term.is_term() {
            self.term.read_line()
        } else {
            // Piped answers; zero bytes read means end of input
            let mut buf = String::new();
            io::stdin().lock().read_line(&mut buf).and_then(|n| {
                if n == 0 {
                    Err(io::Error::from(io::ErrorKind::UnexpectedEof))
                } else {
                    Ok(buf)
                }
            })
        };
        match line {
            Ok(line) => Some(line.trim().to_string()),
            Err(e) => {
                debug!(error = %e, "Input closed");
                None
            }
        }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, question: &str) -> bool {
        let prompt = format!("{} {} ", question, style("[y/N]").dim());
        self.ask(&prompt)
            .is_some_and(|answer| is_yes(&answer))
    }

    fn input(&mut self, prompt: &str) -> Option<String> {
        self.ask(&format!("{prompt} "))
    }
}

/// Answers every confirmation the same way (`--yes`, or non-interactive
/// runs). Text input is never available.
#[derive(Debug, Clone, Copy)]
pub struct FixedPrompter(pub bool);

impl Prompter for FixedPrompter {
    fn confirm(&mut self, question: &str) -> bool {
        debug!(question, answer = self.0, "Auto-answered confirmation");
        self.0
    }

    fn input(&mut self, _prompt: &str) -> Option<String> {
        None
    }
}

/// Replays queued answers; records every question asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    confirmations: VecDeque<bool>,
    inputs: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn confirm_with(mut self, answer: bool) -> Self {
        self.confirmations.push_back(answer);
        self
    }

    #[must_use]
    pub fn input_with(mut self, line: &str) -> Self {
        self.inputs.push_back(line.to_string());
        self
    }

    /// Questions asked so far, in order.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    /// An exhausted script answers no.
    fn confirm(&mut self, question: &str) -> bool {
        self.asked.push(question.to_string());
        self.confirmations.pop_front().unwrap_or(false)
    }

    fn input(&mut self, prompt: &str) -> Option<String> {
        self.asked.push(prompt.to_string());
        self.inputs.pop_front()
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
