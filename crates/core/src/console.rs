use crate::traits::LineSource;
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Reads lines from the process stdin.
pub struct StdinLines {
    lines: Option<Lines<BufReader<Stdin>>>,
}

impl StdinLines {
    pub fn new() -> Self {
        Self {
            lines: Some(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for StdinLines {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LineSource for StdinLines {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        match self.lines.as_mut() {
            Some(lines) => lines.next_line().await,
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        self.lines = None;
    }
}

/// Pre-recorded input, used to drive a session without a terminal.
#[derive(Debug, Default)]
pub struct ScriptedLines {
    pending: VecDeque<String>,
    consumed: usize,
    closed: bool,
}

impl ScriptedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pending: lines.into_iter().map(Into::into).collect(),
            consumed: 0,
            closed: false,
        }
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl LineSource for ScriptedLines {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        if self.closed {
            return Ok(None);
        }

        let next = self.pending.pop_front();
        if next.is_some() {
            self.consumed += 1;
        }
        Ok(next)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
