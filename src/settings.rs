use crate::error::{Result, SimplifyError};
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT: &str = "./output.txt";

/// File locations for a simplification session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub embeddings: Option<PathBuf>,
    pub vocabulary: Option<PathBuf>,
    pub output: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            embeddings: None,
            vocabulary: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl Settings {
    /// Point output back at `./output.txt`.
    pub fn reset_output(&mut self) {
        self.output = PathBuf::from(DEFAULT_OUTPUT);
    }

    /// Names of the required paths that are still unset.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.embeddings.is_none() {
            missing.push("word embedding file");
        }
        if self.vocabulary.is_none() {
            missing.push("common word file");
        }
        missing
    }

    /// Append one line to the output file, creating it if needed.
    pub fn append_output(&self, text: &str) -> Result<()> {
        let io_err = |source: io::Error| SimplifyError::Io {
            path: self.output.clone(),
            source,
        };
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output)
            .map_err(io_err)?;
        writeln!(f, "{text}").map_err(io_err)
    }
}

fn show(path: Option<&Path>) -> String {
    path.map_or_else(|| "Not Set".to_string(), |p| p.display().to_string())
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Word embedding file: {}", show(self.embeddings.as_deref()))?;
        writeln!(f, "Common word file: {}", show(self.vocabulary.as_deref()))?;
        write!(f, "Output file: {}", self.output.display())
    }
}
