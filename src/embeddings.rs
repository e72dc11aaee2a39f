//! Pre-trained Word Vectors (GloVe)
//!
//! Loads word vectors from the plain-text GloVe format and answers
//! nearest-neighbour queries by cosine similarity.
//!
//! ## File Format
//!
//! One word per line, the word followed by its vector components, separated by
//! whitespace. There is no header:
//!
//! ```text
//! the 0.418 0.24968 -0.41242 0.1217 ...
//! , 0.013441 0.23682 -0.16899 0.40951 ...
//! ```
//!
//! ## Cosine Similarity
//!
//! ```text
//! cos(a, b) = (a · b) / (|a| |b|)
//! ```
//!
//! If every row is normalized to unit length once, a query only needs one
//! dot product per row: the whole search is `normalized @ query`. The
//! normalized copy is computed on the first query and reused afterwards.
//!
//! This is an exact brute-force search over all rows, followed by a full sort.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wordbag::PretrainedEmbeddings;
//!
//! let glove = PretrainedEmbeddings::load("glove.6B.100d.txt")?;
//! if let Some(neighbors) = glove.most_similar("python", 10) {
//!     for n in neighbors {
//!         println!("{:>12}  {:.3}", n.word, n.similarity);
//!     }
//! }
//! # Ok::<(), wordbag::WordbagError>(())
//! ```

use rayon::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{Result, WordbagError};
use crate::tensor::{dot, l2_norm, normalize_in_place, Tensor};

/// A word paired with its similarity to a query
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub word: String,
    pub similarity: f32,
}

/// Table of pre-trained word vectors
///
/// Rows keep file order. `words[row]` is the inverse of `index[word]`.
#[derive(Debug)]
pub struct PretrainedEmbeddings {
    words: Vec<String>,
    index: HashMap<String, usize>,
    vectors: Tensor,
    normalized: OnceLock<Tensor>,
}

impl PretrainedEmbeddings {
    /// Build a table from words and a matching `[words.len(), dim]` matrix
    ///
    /// Fails if the row count is wrong, a value is not finite, or a word repeats.
    pub fn from_parts(words: Vec<String>, vectors: Tensor) -> Result<Self> {
        if vectors.shape.len() != 2 || vectors.shape[0] != words.len() {
            return Err(WordbagError::ShapeMismatch(format!(
                "{} words but vector matrix has shape {:?}",
                words.len(),
                vectors.shape
            )));
        }
        if vectors.data.iter().any(|v| !v.is_finite()) {
            return Err(WordbagError::InvalidInput(
                "vector matrix contains NaN or infinite values".to_string(),
            ));
        }
        let mut index = HashMap::with_capacity(words.len());
        for (row, word) in words.iter().enumerate() {
            if index.insert(word.clone(), row).is_some() {
                return Err(WordbagError::InvalidInput(format!("duplicate word '{}'", word)));
            }
        }
        Ok(Self {
            words,
            index,
            vectors,
            normalized: OnceLock::new(),
        })
    }

    /// Load every vector from a GloVe text file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_limited(path, None)
    }

    /// Load at most `max_words` vectors (the files are frequency-sorted)
    pub fn load_limited<P: AsRef<Path>>(path: P, max_words: Option<usize>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        log::info!("Loading word vectors from {}", path.as_ref().display());
        Self::from_reader(BufReader::new(file), max_words)
    }

    /// Parse GloVe text from any buffered reader
    ///
    /// The first non-blank line fixes the dimension. A line with a different
    /// dimension, or a component that is not a finite number (`NaN` and `inf`
    /// included), is a [`WordbagError::Parse`].
    /// A word seen before is skipped with a warning, so each word keeps its
    /// first vector.
    pub fn from_reader<R: BufRead>(reader: R, max_words: Option<usize>) -> Result<Self> {
        let mut words = Vec::new();
        let mut index = HashMap::new();
        let mut data = Vec::new();
        let mut dim = None;

        for (line_idx, line) in reader.lines().enumerate() {
            if max_words.is_some_and(|max| words.len() >= max) {
                break;
            }
            let line = line?;
            let line_no = line_idx + 1;

            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };

            let start = data.len();
            for field in fields {
                let value = field.parse::<f32>().ok().filter(|v| v.is_finite());
                let Some(value) = value else {
                    return Err(WordbagError::Parse {
                        line: line_no,
                        message: format!("invalid vector component '{}'", field),
                    });
                };
                data.push(value);
            }
            let found = data.len() - start;

            let expected = *dim.get_or_insert(found);
            if found != expected || found == 0 {
                return Err(WordbagError::Parse {
                    line: line_no,
                    message: format!(
                        "expected {} components for '{}', found {}",
                        expected, word, found
                    ),
                });
            }

            if index.contains_key(word) {
                log::warn!("line {}: duplicate word '{}' skipped", line_no, word);
                data.truncate(start);
                continue;
            }
            index.insert(word.to_string(), words.len());
            words.push(word.to_string());
        }

        let dim = dim.unwrap_or(0);
        log::info!("Loaded {} word vectors of dimension {}", words.len(), dim);

        Ok(Self {
            vectors: Tensor::new(data, vec![words.len(), dim]),
            words,
            index,
            normalized: OnceLock::new(),
        })
    }

    /// Number of words in the table
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Vector dimension
    pub fn dim(&self) -> usize {
        self.vectors.shape[1]
    }

    /// Vector for `word`, or `None` if the word is not in the table
    pub fn get(&self, word: &str) -> Option<&[f32]> {
        self.row_of(word).map(|row| self.vectors.row(row))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Row index of `word`
    pub fn row_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    /// Word stored at `row`
    pub fn word(&self, row: usize) -> Option<&str> {
        self.words.get(row).map(String::as_str)
    }

    /// All words in row order
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Raw `[len, dim]` vector matrix
    pub fn vectors(&self) -> &Tensor {
        &self.vectors
    }

    /// Unit-norm copy of the vector matrix, computed once
    pub fn normalized(&self) -> &Tensor {
        self.normalized.get_or_init(|| {
            log::debug!("Normalizing {} word vectors", self.len());
            self.vectors.normalize_rows()
        })
    }

    /// The `k` rows most similar to an arbitrary query vector
    ///
    /// Results are sorted by decreasing cosine similarity. When `k` exceeds
    /// the table size every row is returned.
    ///
    /// # Panics
    ///
    /// Panics if `query.len() != self.dim()`
    pub fn most_similar_to(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        self.rank(query, k, &[])
    }

    /// The `k` words most similar to `word`, the word itself included
    ///
    /// Returns `None` if `word` is not in the table.
    pub fn most_similar(&self, word: &str, k: usize) -> Option<Vec<Neighbor>> {
        let query = self.get(word)?;
        Some(self.rank(query, k, &[]))
    }

    /// Solve "a is to b as c is to ?" by ranking against `b - a + c`
    ///
    /// The three input words are excluded from the results. Returns `None`
    /// if any of them is missing.
    ///
    /// ```text
    /// analogy("man", "king", "woman") -> queen, ...
    /// ```
    pub fn analogy(&self, a: &str, b: &str, c: &str, k: usize) -> Option<Vec<Neighbor>> {
        let normalized = self.normalized();
        let rows = [self.row_of(a)?, self.row_of(b)?, self.row_of(c)?];
        let query: Vec<f32> = (0..self.dim())
            .map(|j| {
                normalized.row(rows[1])[j] - normalized.row(rows[0])[j]
                    + normalized.row(rows[2])[j]
            })
            .collect();
        Some(self.rank(&query, k, &rows))
    }

    fn rank(&self, query: &[f32], k: usize, exclude: &[usize]) -> Vec<Neighbor> {
        assert_eq!(
            query.len(),
            self.dim(),
            "Query has {} components, table has dimension {}",
            query.len(),
            self.dim()
        );
        let mut unit = query.to_vec();
        normalize_in_place(&mut unit);

        let normalized = self.normalized();
        let mut scored: Vec<(usize, f32)> = (0..self.len())
            .into_par_iter()
            .filter(|row| !exclude.contains(row))
            .map(|row| (row, dot(normalized.row(row), &unit)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
            .into_iter()
            .take(k)
            .map(|(row, similarity)| Neighbor {
                word: self.words[row].clone(),
                similarity,
            })
            .collect()
    }
}

/// Cosine similarity of two vectors; 0.0 if either is all zeros
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let denom = l2_norm(a) * l2_norm(b);
    if denom == 0.0 {
        0.0
    } else {
        dot(a, b) / denom
    }
}
