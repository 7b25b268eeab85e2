use std::collections::HashMap;
use std::fs;
use std::path::Path;
use log::{info, warn};

/// Immutable mapping from normalized token to integer index.
///
/// Built once from a `word_index.txt` style file, where each line holds a
/// token and its index separated by whitespace:
///
/// ```text
/// feel 2
/// happy 14
/// ```
///
/// Indices need not be contiguous or unique. When a token appears more than
/// once, the last occurrence wins.
/// Largest index a feature vector carries exactly (`f32` has a 24-bit significand).
pub const MAX_INDEX: u32 = 1 << 24;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyTable {
    word_index: HashMap<String, u32>,
}

impl VocabularyTable {
    /// Creates an empty table; every token will fall back to the OOV index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a vocabulary file.
    ///
    /// Malformed lines are skipped. A missing or unreadable file yields an
    /// empty table rather than an error.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Vocabulary file {:?} could not be read ({}), using an empty vocabulary", path, e);
                return Self::new();
            }
        };

        let (table, skipped) = Self::parse(&String::from_utf8_lossy(&bytes));
        info!(
            "Loaded {} vocabulary entries from {:?} ({} malformed lines skipped)",
            table.len(), path, skipped
        );
        table
    }

    /// Parses vocabulary text, returning the table and the number of
    /// non-blank lines that were skipped as malformed.
    pub fn parse(content: &str) -> (Self, usize) {
        let mut word_index = HashMap::new();
        let mut skipped = 0;

        for line in content.lines() {
            let mut fields = line.split_whitespace();
            let entry = match (fields.next(), fields.next(), fields.next()) {
                (None, _, _) => continue,
                (Some(token), Some(index), None) => index
                    .parse::<u32>()
                    .ok()
                    .filter(|&i| i <= MAX_INDEX)
                    .map(|i| (token, i)),
                _ => None,
            };
            match entry {
                Some((token, index)) => {
                    word_index.insert(token.to_string(), index);
                }
                None => skipped += 1,
            }
        }

        (Self { word_index }, skipped)
    }

    /// Builds a table from in-memory `(token, index)` pairs; later pairs
    /// overwrite earlier ones. Indices are not range-checked here; ones above
    /// [`MAX_INDEX`] reach the model rounded.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            word_index: pairs.into_iter().map(|(t, i)| (t.into(), i)).collect(),
        }
    }

    /// Looks up the index of an already normalized token.
    pub fn get(&self, token: &str) -> Option<u32> {
        self.word_index.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.word_index.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.word_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_pairs() {
        let (table, skipped) = VocabularyTable::parse("hello 5\nworld\t7\n");
        assert_eq!(skipped, 0);
        assert_eq!(table.get("hello"), Some(5));
        assert_eq!(table.get("world"), Some(7));
        assert_eq!(table.get("missing"), None);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let content = "good 1\nnoindex\nbad -3\nthree fields 4\nalso notanumber\n\n   \nfine 2\n";
        let (table, skipped) = VocabularyTable::parse(content);
        assert_eq!(table.len(), 2);
        assert_eq!(skipped, 4);
        assert_eq!(table.get("good"), Some(1));
        assert_eq!(table.get("fine"), Some(2));
    }

    #[test]
    fn test_index_beyond_f32_precision_is_malformed() {
        let (table, skipped) = VocabularyTable::parse("edge 16777216\nover 16777217\n");
        assert_eq!(skipped, 1);
        assert_eq!(table.get("edge"), Some(MAX_INDEX));
        assert!(!table.contains("over"));
    }

    #[test]
    fn test_last_duplicate_wins() {
        let (table, _) = VocabularyTable::parse("joy 3\njoy 9\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("joy"), Some(9));
    }

    #[test]
    fn test_crlf_lines() {
        let (table, skipped) = VocabularyTable::parse("sad 4\r\nangry 6\r\n");
        assert_eq!(skipped, 0);
        assert_eq!(table.get("sad"), Some(4));
        assert_eq!(table.get("angry"), Some(6));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let table = VocabularyTable::load("/nonexistent/path/word_index.txt");
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "i 1").unwrap();
        writeln!(file, "feel 2").unwrap();
        writeln!(file, "garbage").unwrap();
        file.flush().unwrap();

        let table = VocabularyTable::load(file.path());
        assert_eq!(table.len(), 2);
        assert!(table.contains("feel"));
    }
}
