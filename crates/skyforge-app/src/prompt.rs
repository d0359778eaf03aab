//! Yes/no questions on the console.

use std::io::{BufRead, Write};

/// Something that can ask the user a yes/no question.
pub trait Prompter {
    /// Ask `question`. `None` means no answer could be read.
    fn confirm(&mut self, question: &str) -> Option<bool>;
}

/// Prompter over any line reader and writer (stdin/stdout in production).
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn confirm(&mut self, question: &str) -> Option<bool> {
        write!(self.output, "{question} (Y/N): ").ok()?;
        self.output.flush().ok()?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(is_yes(&line)),
        }
    }
}

/// `y` or `yes`, any case, surrounding whitespace ignored.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Resolve a question: an explicit flag wins, non-interactive runs answer
/// no, otherwise the user is asked. Unreadable input counts as no.
pub fn decide(
    flag: Option<bool>,
    non_interactive: bool,
    prompter: &mut dyn Prompter,
    question: &str,
) -> bool {
    if let Some(answer) = flag {
        return answer;
    }
    if non_interactive {
        return false;
    }
    match prompter.confirm(question) {
        Some(answer) => answer,
        None => {
            tracing::warn!("no answer to \"{question}\" (input error), assuming no");
            false
        }
    }
}
