//! JSON-lines event source

use crate::types::event::Event;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Reads one [`Event`] per line, skipping blank lines
pub struct EventReader<R> {
    reader: R,
    line: String,
    line_number: usize,
}

impl EventReader<BufReader<File>> {
    /// Open an event file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open event file {}", path.display()))?;
        info!(path = %path.display(), "Reading events");
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> EventReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
        }
    }

    /// Line number of the most recently read line
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let trimmed = self.line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(
                        serde_json::from_str(trimmed)
                            .with_context(|| format!("Malformed event on line {}", self.line_number)),
                    );
                }
                Err(e) => return Some(Err(e).context("Failed to read event line")),
            }
        }
    }
}
