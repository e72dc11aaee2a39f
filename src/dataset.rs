//! 20 Newsgroups Corpus Loading
//!
//! Reads the "bydate" distribution of the 20 Newsgroups benchmark from disk.
//! The archive unpacks into one directory per split, with one sub-directory
//! per newsgroup and one file per message:
//!
//! ```text
//! <root>/
//!   20news-bydate-train/
//!     alt.atheism/49960
//!     alt.atheism/51060
//!     ...
//!     talk.religion.misc/...
//!   20news-bydate-test/
//!     ...
//! ```
//!
//! Category directories are sorted by name and a document's label is the
//! position of its category in that sorted list, so `alt.atheism` is 0 and
//! `talk.religion.misc` is 19.
//!
//! ## Cleaning
//!
//! Messages carry headers, quoted replies and signatures that make the task
//! artificially easy (a classifier can learn e-mail addresses instead of
//! topics). [`Remove`] strips any combination of them.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, WordbagError};

/// Directory holding the training split
pub const TRAIN_DIR: &str = "20news-bydate-train";
/// Directory holding the test split
pub const TEST_DIR: &str = "20news-bydate-test";
/// Shuffle seed used when none is given
pub const DEFAULT_SHUFFLE_SEED: u64 = 42;

/// One message of the corpus
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub text: String,
    pub label: usize,
    pub label_name: String,
}

/// Which split to load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subset {
    Train,
    Test,
    /// Train followed by test
    All,
}

/// Parts of each message to strip while loading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Remove {
    pub headers: bool,
    pub footers: bool,
    pub quotes: bool,
}

impl Remove {
    /// Strip headers, signature blocks and quoted replies
    pub fn all() -> Self {
        Self {
            headers: true,
            footers: true,
            quotes: true,
        }
    }
}

/// A loaded split: documents plus the ordered category names
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub documents: Vec<Document>,
    /// `target_names[label]` is the category of that label
    pub target_names: Vec<String>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn num_classes(&self) -> usize {
        self.target_names.len()
    }

    /// Borrow all message texts in order
    pub fn texts(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.text.as_str()).collect()
    }

    /// All labels in order
    pub fn labels(&self) -> Vec<usize> {
        self.documents.iter().map(|d| d.label).collect()
    }

    /// Number of documents per label
    ///
    /// Documents whose label has no entry in `target_names` are not counted.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.target_names.len()];
        for doc in &self.documents {
            if let Some(count) = counts.get_mut(doc.label) {
                *count += 1;
            }
        }
        counts
    }
}

/// Loader for the on-disk 20 Newsgroups corpus
///
/// # Example
///
/// ```rust,no_run
/// use wordbag::dataset::{NewsgroupsLoader, Remove, Subset};
///
/// let loader = NewsgroupsLoader::new("data/20news")
///     .with_remove(Remove::all());
/// let train = loader.load(Subset::Train)?;
/// let test = loader.load(Subset::Test)?;
/// println!("{} train / {} test documents", train.len(), test.len());
/// # Ok::<(), wordbag::WordbagError>(())
/// ```
#[derive(Debug, Clone)]
pub struct NewsgroupsLoader {
    root: PathBuf,
    categories: Option<Vec<String>>,
    remove: Remove,
    shuffle_seed: Option<u64>,
}

impl NewsgroupsLoader {
    /// Loader rooted at the directory containing the `20news-bydate-*` folders
    ///
    /// Defaults: all categories, nothing removed, shuffled with seed 42.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            categories: None,
            remove: Remove::default(),
            shuffle_seed: Some(DEFAULT_SHUFFLE_SEED),
        }
    }

    /// Restrict loading to a subset of categories
    ///
    /// Labels are positions in the sorted list of the selected categories.
    pub fn with_categories<S: AsRef<str>>(mut self, categories: &[S]) -> Self {
        self.categories = Some(categories.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    pub fn with_remove(mut self, remove: Remove) -> Self {
        self.remove = remove;
        self
    }

    /// Shuffle with the given seed, or keep directory order with `None`
    pub fn with_shuffle(mut self, seed: Option<u64>) -> Self {
        self.shuffle_seed = seed;
        self
    }

    /// Load a split from disk
    pub fn load(&self, subset: Subset) -> Result<Dataset> {
        let mut dataset = match subset {
            Subset::Train => self.load_dir(TRAIN_DIR)?,
            Subset::Test => self.load_dir(TEST_DIR)?,
            Subset::All => {
                let mut train = self.load_dir(TRAIN_DIR)?;
                let test = self.load_dir(TEST_DIR)?;
                if train.target_names != test.target_names {
                    return Err(WordbagError::Dataset(
                        "train and test splits have different categories".into(),
                    ));
                }
                train.documents.extend(test.documents);
                train
            }
        };

        if let Some(seed) = self.shuffle_seed {
            let mut rng = StdRng::seed_from_u64(seed);
            dataset.documents.shuffle(&mut rng);
        }

        log::info!(
            "Loaded {:?} split: {} documents in {} categories",
            subset,
            dataset.len(),
            dataset.num_classes()
        );
        Ok(dataset)
    }

    fn load_dir(&self, split_dir: &str) -> Result<Dataset> {
        let split_path = self.root.join(split_dir);
        if !split_path.is_dir() {
            return Err(WordbagError::Dataset(format!(
                "{} is not a directory",
                split_path.display()
            )));
        }

        let mut target_names = sorted_entries(&split_path, |p| p.is_dir())?
            .into_iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect::<Vec<_>>();

        if let Some(wanted) = &self.categories {
            for name in wanted {
                if !target_names.contains(name) {
                    return Err(WordbagError::Dataset(format!(
                        "unknown category '{}' in {}",
                        name,
                        split_path.display()
                    )));
                }
            }
            target_names.retain(|name| wanted.contains(name));
        }

        let mut documents = Vec::new();
        for (label, name) in target_names.iter().enumerate() {
            for file in sorted_entries(&split_path.join(name), |p| p.is_file())? {
                let raw = decode_latin1(&fs::read(&file)?);
                documents.push(Document {
                    text: self.clean(&raw),
                    label,
                    label_name: name.clone(),
                });
            }
            log::debug!("{}: {} ({} documents so far)", split_dir, name, documents.len());
        }

        Ok(Dataset {
            documents,
            target_names,
        })
    }

    fn clean(&self, text: &str) -> String {
        let mut text = text.to_string();
        if self.remove.headers {
            text = strip_headers(&text);
        }
        if self.remove.footers {
            text = strip_footer(&text);
        }
        if self.remove.quotes {
            text = strip_quotes(&text);
        }
        text
    }
}

/// Directory entries matching `keep`, sorted by path
fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if keep(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

/// Decode bytes as Latin-1 (every byte maps to the code point of equal value)
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Drop the message header: everything before the first blank line
///
/// A message with no blank line is treated as all header and becomes empty.
pub fn strip_headers(text: &str) -> String {
    match text.split_once("\n\n") {
        Some((_, body)) => body.to_string(),
        None => String::new(),
    }
}

/// Drop lines that quote another message or attribute a quote
pub fn strip_quotes(text: &str) -> String {
    const ATTRIBUTIONS: [&str; 5] = ["writes in", "writes:", "wrote:", "says:", "said:"];
    const PREFIXES: [&str; 4] = ["In article", "Quoted from", "|", ">"];

    text.split('\n')
        .filter(|line| {
            !ATTRIBUTIONS.iter().any(|a| line.contains(a))
                && !PREFIXES.iter().any(|p| line.starts_with(p))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drop the signature block
///
/// Cuts at the last line that is blank or made only of dashes. If that line
/// is the first line, the text is returned unchanged.
pub fn strip_footer(text: &str) -> String {
    let lines: Vec<&str> = text.trim().split('\n').collect();
    let cut = lines
        .iter()
        .rposition(|line| line.trim().trim_matches('-').is_empty());
    match cut {
        Some(idx) if idx > 0 => lines[..idx].join("\n"),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_corpus(root: &Path) {
        let files = [
            (TRAIN_DIR, "sci.space", "1", "Subject: orbit\n\nthe shuttle reached orbit"),
            (TRAIN_DIR, "sci.space", "2", "Subject: moon\n\nlunar lander\n--\nsig"),
            (TRAIN_DIR, "rec.autos", "1", "Subject: cars\n\n> old quote\nengine torque"),
            (TEST_DIR, "sci.space", "3", "Subject: mars\n\nrover on mars"),
            (TEST_DIR, "rec.autos", "2", "Subject: tires\n\ntire pressure"),
        ];
        for (split, cat, name, body) in files {
            let dir = root.join(split).join(cat);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(name), body).unwrap();
        }
    }

    #[test]
    fn test_labels_follow_sorted_categories() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let ds = NewsgroupsLoader::new(dir.path())
            .with_shuffle(None)
            .load(Subset::Train)
            .unwrap();
        assert_eq!(ds.target_names, vec!["rec.autos", "sci.space"]);
        assert_eq!(ds.labels(), vec![0, 1, 1]);
        assert_eq!(ds.class_counts(), vec![1, 2]);
        assert_eq!(ds.documents[1].label_name, "sci.space");
    }

    #[test]
    fn test_remove_all() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let ds = NewsgroupsLoader::new(dir.path())
            .with_shuffle(None)
            .with_remove(Remove::all())
            .load(Subset::Train)
            .unwrap();
        assert_eq!(ds.documents[0].text, "engine torque");
        assert_eq!(ds.documents[2].text, "lunar lander");
    }

    #[test]
    fn test_category_subset_and_all() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let ds = NewsgroupsLoader::new(dir.path())
            .with_categories(&["sci.space"])
            .load(Subset::All)
            .unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.target_names, vec!["sci.space"]);
        assert!(ds.labels().iter().all(|&l| l == 0));
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let result = NewsgroupsLoader::new(dir.path())
            .with_categories(&["comp.graphics"])
            .load(Subset::Train);
        assert!(matches!(result, Err(WordbagError::Dataset(_))));
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let a = NewsgroupsLoader::new(dir.path()).load(Subset::All).unwrap();
        let b = NewsgroupsLoader::new(dir.path()).load(Subset::All).unwrap();
        assert_eq!(a.documents, b.documents);
    }

    #[test]
    fn test_strip_headers() {
        assert_eq!(strip_headers("From: a\nSubject: b\n\nbody\n\nmore"), "body\n\nmore");
        assert_eq!(strip_headers("no blank line"), "");
    }

    #[test]
    fn test_strip_quotes() {
        let text = "In article <1@x> bob writes:\n> quoted\n| also quoted\nmy reply";
        assert_eq!(strip_quotes(text), "my reply");
    }

    #[test]
    fn test_strip_quotes_keeps_body_text() {
        let text = "He writes drivers for Linux.\n\
                    She rewrites the kernel\n\
                    alice writes in <2@y>:\n\
                    bob writes: hi";
        assert_eq!(
            strip_quotes(text),
            "He writes drivers for Linux.\nShe rewrites the kernel"
        );
    }

    #[test]
    fn test_class_counts_ignore_unknown_labels() {
        let doc = |label: usize| Document {
            text: String::new(),
            label,
            label_name: String::new(),
        };
        let dataset = Dataset {
            documents: vec![doc(0), doc(1), doc(1), doc(7)],
            target_names: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(dataset.class_counts(), vec![1, 2]);
    }

    #[test]
    fn test_strip_footer() {
        assert_eq!(strip_footer("body line\n-----\nJohn Doe"), "body line");
        assert_eq!(strip_footer("single line"), "single line");
    }

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode_latin1(&[0x63, 0x61, 0x66, 0xe9]), "café");
    }
}
