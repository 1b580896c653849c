// document.rs
//!
//! Line-level view of a config file. The text is split on `\n` only, so a
//! CRLF file keeps its `\r` at the end of each line and joins back unchanged.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{SwitchError, SwitchResult};
use crate::parser::{self, Sections};

pub const LINE_SEPARATOR: char = '\n';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    lines: Vec<String>,
}

impl ConfigDocument {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split(LINE_SEPARATOR).map(str::to_string).collect(),
        }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Reads `path` as UTF-8 text.
    pub fn read(path: &Path) -> SwitchResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| SwitchError::from_read(path, e))?;
        debug!(path = %path.display(), bytes = text.len(), "config read");
        Ok(Self::from_text(&text))
    }

    /// Overwrites `path` with the full document text.
    pub fn write(&self, path: &Path) -> SwitchResult<()> {
        let text = self.to_text();
        fs::write(path, &text).map_err(|source| SwitchError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = text.len(), "config written");
        Ok(())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn sections(&self) -> Sections {
        parser::parse(&self.to_text())
    }
}
