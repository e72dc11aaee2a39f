//! Wordbag: Text Classification with Word Embeddings
//!
//! Newsgroup topic classification implemented from scratch in Rust: a
//! word-level tokenizer, sequence padding, an averaged-embedding classifier
//! (with a convolutional variant) trained with hand-written backward passes,
//! and pre-trained GloVe vectors for similarity queries and transfer learning.
//!
//! # Modules
//!
//! - [`dataset`] - 20 Newsgroups corpus loading and cleaning
//! - [`tokenizer`] - Frequency-ranked word tokenizer
//! - [`padding`] - Fixed-length sequences
//! - [`layers`] - Embedding, pooling, convolution, dense and dropout layers
//! - [`model`] - The classifier and its checkpoint format
//! - [`train`] - Mini-batch training with Adam, evaluation
//! - [`embeddings`] - GloVe loading and nearest-neighbour queries
//! - [`transfer`] - Embedding matrix from pre-trained vectors
//! - [`metrics`] - Accuracy and confusion matrix
//! - [`projection`] - 2-D projection and SVG plots of word vectors
//!
//! # Example
//!
//! ```rust,no_run
//! use wordbag::dataset::{NewsgroupsLoader, Subset};
//! use wordbag::model::{ClassifierConfig, TextClassifier};
//! use wordbag::padding::{pad_sequences, Truncating};
//! use wordbag::train::{evaluate, fit, TrainingConfig};
//! use wordbag::WordTokenizer;
//!
//! let loader = NewsgroupsLoader::new("data/20news-bydate");
//! let train = loader.load(Subset::Train)?;
//! let test = loader.load(Subset::Test)?;
//!
//! let mut tokenizer = WordTokenizer::new(Some(20_000));
//! tokenizer.fit_on_texts(&train.texts());
//! let x_train = pad_sequences(&tokenizer.texts_to_sequences(&train.texts()), 1000, Truncating::Pre);
//! let x_test = pad_sequences(&tokenizer.texts_to_sequences(&test.texts()), 1000, Truncating::Pre);
//!
//! let mut model = TextClassifier::new(ClassifierConfig::default())?;
//! fit(&mut model, &x_train, &train.labels(), &TrainingConfig::default())?;
//! let result = evaluate(&model, &x_test, &test.labels(), 128)?;
//! println!("test accuracy: {:.3}", result.accuracy);
//! # Ok::<(), wordbag::WordbagError>(())
//! ```

pub mod dataset;
pub mod embeddings;
pub mod error;
pub mod gradients;
pub mod layers;
pub mod metrics;
pub mod model;
pub mod optimizer;
pub mod padding;
pub mod projection;
pub mod tensor;
pub mod tokenizer;
pub mod train;
pub mod training_logger;
pub mod transfer;

// Re-export main types for convenience
pub use dataset::{Dataset, Document, NewsgroupsLoader, Remove, Subset};
pub use embeddings::{cosine_similarity, Neighbor, PretrainedEmbeddings};
pub use error::{Result, WordbagError};
pub use metrics::{accuracy, ConfusionMatrix};
pub use model::{ClassifierConfig, EncoderConfig, TextClassifier};
pub use padding::{pad_sequences, Truncating, PAD_INDEX};
pub use tensor::Tensor;
pub use tokenizer::{TokenizerStats, WordTokenizer};
pub use train::{evaluate, fit, Evaluation, History, TrainingConfig};
pub use training_logger::TrainingLogger;
pub use transfer::{build_embedding_matrix, TransferMatrix};
