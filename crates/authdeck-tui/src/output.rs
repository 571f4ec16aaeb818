//! Output log: timestamped result lines for the bottom pane.

use chrono::{DateTime, Local};

/// Cap on retained lines; the screen never shows more than a handful.
const MAX_LINES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct OutputLine {
    pub at: DateTime<Local>,
    pub kind: OutputKind,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct OutputState {
    lines: Vec<OutputLine>,
}

impl OutputState {
    pub fn push(&mut self, kind: OutputKind, text: impl Into<String>) {
        self.lines.push(OutputLine {
            at: Local::now(),
            kind,
            text: text.into(),
        });
        if self.lines.len() > MAX_LINES {
            let excess = self.lines.len() - MAX_LINES;
            self.lines.drain(..excess);
        }
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(OutputKind::Success, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(OutputKind::Error, text);
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(OutputKind::Info, text);
    }

    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }

    /// The most recent `n` lines, oldest first.
    pub fn tail(&self, n: usize) -> &[OutputLine] {
        let start = self.lines.len().saturating_sub(n);
        &self.lines[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_returns_most_recent() {
        let mut output = OutputState::default();
        for i in 0..5 {
            output.info(format!("line {i}"));
        }
        let tail = output.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].text, "line 3");
        assert_eq!(tail[1].text, "line 4");
    }

    #[test]
    fn test_lines_are_capped() {
        let mut output = OutputState::default();
        for i in 0..(MAX_LINES + 10) {
            output.info(format!("line {i}"));
        }
        assert_eq!(output.lines().len(), MAX_LINES);
        assert_eq!(output.lines()[0].text, "line 10");
    }
}
