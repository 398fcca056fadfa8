use crate::error::{Result, SimplifyError};
use crate::metric::Metric;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Read-only view of the word tables the simplifier works from.
///
/// All lookups are case-insensitive.
pub trait WordSource {
    fn vector(&self, word: &str) -> Option<&[f64]>;

    fn has_vector(&self, word: &str) -> bool {
        self.vector(word).is_some()
    }

    /// Is `word` in the common-word vocabulary?
    fn is_common(&self, word: &str) -> bool;

    /// Every (token, vector) pair, in a stable order.
    fn entries(&self) -> impl Iterator<Item = (&str, &[f64])>;
}

/// Outcome of reading one of the input files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} loaded, {} skipped", self.loaded, self.skipped)
    }
}

// Word embeddings plus the common-word vocabulary.
#[derive(Debug, Default)]
pub struct WordVectors {
    words: Vec<String>,               // vocabulary - index to word map
    word_map: HashMap<String, usize>, // word to index map
    vectors: Vec<Vec<f64>>,           // one row per word, same index as `words`
    dims: usize,                      // dimension of the first row loaded
    common: HashSet<String>,          // lowercase common words
}

impl WordVectors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn common_len(&self) -> usize {
        self.common.len()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn get_word(&self, idx: usize) -> &str {
        &self.words[idx]
    }

    pub fn get_index(&self, word: &str) -> Option<usize> {
        self.word_map.get(&word.to_lowercase()).copied()
    }

    /// Add or replace the vector for `word`. A replaced word keeps its position.
    pub fn insert(&mut self, word: &str, vector: Vec<f64>) {
        let word = word.to_lowercase();
        if self.words.is_empty() {
            self.dims = vector.len();
        } else if vector.len() != self.dims {
            tracing::warn!(
                "vector for '{word}' has dimension {} which differs from initial dimension {}",
                vector.len(),
                self.dims
            );
        }

        match self.word_map.get(&word) {
            Some(&idx) => self.vectors[idx] = vector,
            None => {
                self.word_map.insert(word.clone(), self.words.len());
                self.words.push(word);
                self.vectors.push(vector);
            }
        }
    }

    pub fn add_common(&mut self, word: &str) {
        self.common.insert(word.to_lowercase());
    }

    /// Read `token v1 v2 ... vN` rows, separated by commas and/or whitespace.
    pub fn load_embeddings(&mut self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let path = path.as_ref();
        let io_err = |source: io::Error| SimplifyError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = fs::File::open(path).map_err(io_err)?;
        let report = self.read_embeddings(BufReader::new(file)).map_err(io_err)?;
        tracing::info!("{}: {report} word embeddings", path.display());
        Ok(report)
    }

    /// Like [`WordVectors::load_embeddings`], from any buffered reader.
    ///
    /// Lines with fewer than two fields or a non-numeric component are skipped
    /// and counted. Blank lines are ignored.
    pub fn read_embeddings<R: BufRead>(&mut self, reader: R) -> io::Result<LoadReport> {
        let mut report = LoadReport::default();

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty());

            let Some(word) = parts.next() else {
                continue;
            };
            let values = match parts.map(str::parse::<f64>).collect::<Result<Vec<f64>, _>>() {
                Ok(values) if !values.is_empty() => values,
                Ok(_) => {
                    tracing::warn!("line {}: skipping malformed line '{line}'", lineno + 1);
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("line {}: skipping invalid value ({e}) in '{line}'", lineno + 1);
                    report.skipped += 1;
                    continue;
                }
            };

            self.insert(word, values);
            report.loaded += 1;
        }

        Ok(report)
    }

    /// Read the common-word vocabulary, one word per line.
    pub fn load_vocabulary(&mut self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let path = path.as_ref();
        let io_err = |source: io::Error| SimplifyError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = fs::File::open(path).map_err(io_err)?;
        let report = self.read_vocabulary(BufReader::new(file)).map_err(io_err)?;
        tracing::info!("{}: {report} common words", path.display());
        Ok(report)
    }

    pub fn read_vocabulary<R: BufRead>(&mut self, reader: R) -> io::Result<LoadReport> {
        let mut report = LoadReport::default();
        for line in reader.lines() {
            let line = line?;
            let word = line.trim();
            if !word.is_empty() {
                self.add_common(word);
                report.loaded += 1;
            }
        }
        Ok(report)
    }

    /// Rank the common words closest to `word` under `metric`, best first.
    ///
    /// Returns `None` when `word` has no vector. The word itself and pairs with
    /// no comparable score are left out.
    pub fn nearest_common(&self, word: &str, metric: Metric, n: usize) -> Option<Vec<(usize, f64)>> {
        let target_idx = self.get_index(word)?;
        let target = &self.vectors[target_idx];

        // Collect all scores in parallel
        let mut scores: Vec<(usize, f64)> = self
            .vectors
            .par_iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx && self.common.contains(&self.words[*i]))
            .filter_map(|(i, v)| metric.score(target, v).map(|s| (i, s)))
            .collect();

        let best_first = |a: &(usize, f64), b: &(usize, f64)| -> Ordering {
            if metric.higher_is_better() {
                b.1.total_cmp(&a.1)
            } else {
                a.1.total_cmp(&b.1)
            }
        };

        // Partial sort first when only a few of many results are wanted.
        if n < scores.len() {
            scores.select_nth_unstable_by(n, best_first);
            scores.truncate(n);
        }
        scores.sort_by(best_first);

        Some(scores)
    }
}

impl WordSource for WordVectors {
    fn vector(&self, word: &str) -> Option<&[f64]> {
        self.get_index(word).map(|idx| self.vectors[idx].as_slice())
    }

    fn is_common(&self, word: &str) -> bool {
        self.common.contains(&word.to_lowercase())
    }

    fn entries(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.words
            .iter()
            .zip(&self.vectors)
            .map(|(w, v)| (w.as_str(), v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn reads_comma_and_space_separated_rows() {
        let mut wv = WordVectors::new();
        let data = "Happy 1.0 0.0\ncontent,0.9,0.1\nsad, -1.0 ,0.0\n\n";
        let report = wv.read_embeddings(Cursor::new(data)).unwrap();

        assert_eq!(report, LoadReport { loaded: 3, skipped: 0 });
        assert_eq!(wv.len(), 3);
        assert_eq!(wv.dims(), 2);
        assert_eq!(wv.vector("happy"), Some(&[1.0, 0.0][..]));
        assert_eq!(wv.vector("HAPPY"), Some(&[1.0, 0.0][..]));
        assert_eq!(wv.vector("sad"), Some(&[-1.0, 0.0][..]));
        assert!(!wv.has_vector("joyful"));
    }

    #[test]
    fn skips_malformed_rows() {
        let mut wv = WordVectors::new();
        let data = "lonely\ngood 0.5 x\nfine 0.1 0.2\n";
        let report = wv.read_embeddings(Cursor::new(data)).unwrap();

        assert_eq!(report, LoadReport { loaded: 1, skipped: 2 });
        assert!(wv.has_vector("fine"));
        assert!(!wv.has_vector("good"));
        assert!(!wv.has_vector("lonely"));
    }

    #[test]
    fn keeps_ragged_rows_and_replaces_duplicates() {
        let mut wv = WordVectors::new();
        wv.read_embeddings(Cursor::new("a 1 2\nb 1 2 3\nA 5 6\n"))
            .unwrap();

        assert_eq!(wv.len(), 2);
        assert_eq!(wv.get_index("a"), Some(0));
        assert_eq!(wv.vector("a"), Some(&[5.0, 6.0][..]));
        assert_eq!(wv.vector("b").map(<[f64]>::len), Some(3));
        let order: Vec<_> = wv.entries().map(|(w, _)| w).collect();
        assert_eq!(order, ["a", "b"]);
    }

    #[test]
    fn vocabulary_is_lowercased_and_trimmed() {
        let mut wv = WordVectors::new();
        let report = wv
            .read_vocabulary(Cursor::new("The\n  of \n\nAND\n"))
            .unwrap();
        assert_eq!(report.loaded, 3);
        assert_eq!(wv.common_len(), 3);
        assert!(wv.is_common("the"));
        assert!(wv.is_common("Of"));
        assert!(wv.is_common("and"));
        assert!(!wv.is_common("but"));
    }

    #[test]
    fn loads_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let emb = dir.path().join("embeddings.txt");
        let voc = dir.path().join("google-1000.txt");
        writeln!(fs::File::create(&emb).unwrap(), "happy 1 0\ncontent 0.9 0.1").unwrap();
        writeln!(fs::File::create(&voc).unwrap(), "content").unwrap();

        let mut wv = WordVectors::new();
        assert_eq!(wv.load_embeddings(&emb).unwrap().loaded, 2);
        assert_eq!(wv.load_vocabulary(&voc).unwrap().loaded, 1);
        assert!(wv.is_common("content"));

        let missing = dir.path().join("nope.txt");
        let err = wv.load_embeddings(&missing).unwrap_err();
        assert!(matches!(err, SimplifyError::Io { ref path, .. } if path == &missing));
    }

    #[test]
    fn nearest_common_ranks_best_first() {
        let mut wv = WordVectors::new();
        wv.read_embeddings(Cursor::new(
            "happy 1 0\ncontent 0.9 0.1\nsad -1 0\nglad 0.8 0.2\nzero 0 0\n",
        ))
        .unwrap();
        for w in ["content", "sad", "glad", "zero", "happy"] {
            wv.add_common(w);
        }

        let ranked = wv.nearest_common("happy", Metric::Cosine, 10).unwrap();
        let words: Vec<_> = ranked.iter().map(|(i, _)| wv.get_word(*i)).collect();
        // "zero" has no defined cosine and "happy" is the query itself
        assert_eq!(words, ["content", "glad", "sad"]);

        let ranked = wv.nearest_common("happy", Metric::Euclidean, 1).unwrap();
        assert_eq!(wv.get_word(ranked[0].0), "content");

        assert!(wv.nearest_common("unknown", Metric::Cosine, 5).is_none());
    }
}
