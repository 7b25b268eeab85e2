use std::fs;
use std::path::Path;
use log::{info, warn};

/// Ordered class names; a label's position is its class index.
///
/// The table length is the score vector width the model must produce for
/// decoding to succeed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// Loads one label per non-blank line, preserving file order.
    ///
    /// A missing or unreadable file yields an empty table; decoding against
    /// it then fails with a label count mismatch.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read(path) {
            Ok(bytes) => {
                let table = Self::parse(&String::from_utf8_lossy(&bytes));
                info!("Loaded {} labels from {:?}", table.len(), path);
                table
            }
            Err(e) => {
                warn!("Label file {:?} could not be read ({}), using an empty label table", path, e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Self {
        Self::from_labels(content.lines())
    }

    /// Builds a table from labels in class-index order. Blank entries are
    /// dropped and surrounding whitespace is trimmed.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|l| l.as_ref().trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Class index of `label`, if present.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
