//! Text Classifier
//!
//! A document classifier built from the layers in [`crate::layers`]:
//!
//! ```text
//! word ids  [batch, max_len]
//!     │
//!     ▼
//! embedding [batch, max_len, dim]
//!     │
//!     ▼
//! encoder   [batch, features]      average pool, masked average pool,
//!     │                            or conv1d → ReLU → max pool
//!     ▼
//! hidden    [batch, hidden_units]  optional dense + ReLU
//!     │
//!     ▼
//! dropout                          training only
//!     │
//!     ▼
//! output    [batch, num_classes]   dense + softmax
//! ```
//!
//! The averaged-embedding model is the bag-of-words baseline: word order is
//! thrown away and a document is the mean of its word vectors. The
//! convolutional encoder looks at `kernel_size` consecutive words at a time.
//!
//! ## Parameter Order
//!
//! Parameters are always listed in the same order: embedding, convolution
//! (weight, bias), hidden (weight, bias), output (weight, bias). Layers that
//! the config leaves out are skipped. [`ClassifierGradients::tensors`] follows
//! the order of [`TextClassifier::trainable_parameters_mut`], and checkpoints
//! store [`TextClassifier::parameters`] in that order.
//!
//! ## Checkpoint Format
//!
//! ```text
//! b"WORDBAG_CKPT"  magic
//! u8               version (1)
//! u32 + bytes      ClassifierConfig as JSON
//! tensors          u32 rank, u32 dims..., u32 len, f32 values (little-endian)
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WordbagError};
use crate::layers::{
    cross_entropy, relu_backward, relu_forward, softmax_cross_entropy_backward,
    AveragePooling, AveragePoolingCache, Conv1dCache, DropoutCache, LinearCache, MaxPooling,
    MaxPoolingCache, TrainableConv1d, TrainableDropout, TrainableEmbedding, TrainableLinear,
};
use crate::tensor::Tensor;

const CHECKPOINT_MAGIC: &[u8; 12] = b"WORDBAG_CKPT";
const CHECKPOINT_VERSION: u8 = 1;

/// Batch size used by `predict_proba`
const PREDICT_BATCH: usize = 256;

/// How the sequence of word vectors is reduced to one vector per document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncoderConfig {
    /// Mean over all positions, padding included
    Average,
    /// Mean over non-padding positions only
    MaskedAverage,
    /// 1-D convolution, ReLU, then global max pooling
    Convolution { filters: usize, kernel_size: usize },
}

/// Classifier hyperparameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Rows in the embedding table (tokenizer `num_words`)
    pub vocab_size: usize,
    pub embedding_dim: usize,
    /// Length every input row is padded to
    pub max_len: usize,
    pub num_classes: usize,
    pub encoder: EncoderConfig,
    /// Optional dense + ReLU layer between the encoder and the output
    pub hidden_units: Option<usize>,
    pub dropout_rate: f32,
    /// When false the embedding table is never updated
    pub trainable_embeddings: bool,
    /// Seed for weight initialization
    pub seed: u64,
}

impl Default for ClassifierConfig {
    /// 20 000 words, 50-dimensional embeddings, 1000 tokens, 20 newsgroups
    fn default() -> Self {
        Self {
            vocab_size: 20_000,
            embedding_dim: 50,
            max_len: 1000,
            num_classes: 20,
            encoder: EncoderConfig::Average,
            hidden_units: None,
            dropout_rate: 0.0,
            trainable_embeddings: true,
            seed: 42,
        }
    }
}

impl ClassifierConfig {
    /// Small model for quick experiments and tests
    pub fn tiny() -> Self {
        Self {
            vocab_size: 2_000,
            embedding_dim: 16,
            max_len: 200,
            ..Self::default()
        }
    }

    /// Convolutional encoder: 128 filters of width 5, then a 128-unit hidden layer
    pub fn convolutional() -> Self {
        Self {
            encoder: EncoderConfig::Convolution {
                filters: 128,
                kernel_size: 5,
            },
            hidden_units: Some(128),
            dropout_rate: 0.5,
            ..Self::default()
        }
    }

    /// Frozen embedding table of `dim`-dimensional pre-trained vectors
    pub fn glove(dim: usize) -> Self {
        Self {
            embedding_dim: dim,
            trainable_embeddings: false,
            ..Self::default()
        }
    }

    /// Check that the hyperparameters describe a buildable model
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(WordbagError::InvalidConfig(msg));
        if self.vocab_size < 2 {
            return invalid(format!(
                "vocab_size must be at least 2 (padding + one word), got {}",
                self.vocab_size
            ));
        }
        if self.embedding_dim == 0 {
            return invalid("embedding_dim must be positive".to_string());
        }
        if self.max_len == 0 {
            return invalid("max_len must be positive".to_string());
        }
        if self.num_classes < 2 {
            return invalid(format!("num_classes must be at least 2, got {}", self.num_classes));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return invalid(format!("dropout_rate must be in [0, 1), got {}", self.dropout_rate));
        }
        if self.hidden_units == Some(0) {
            return invalid("hidden_units must be positive when set".to_string());
        }
        if let EncoderConfig::Convolution {
            filters,
            kernel_size,
        } = self.encoder
        {
            if filters == 0 {
                return invalid("filters must be positive".to_string());
            }
            if kernel_size == 0 || kernel_size > self.max_len {
                return invalid(format!(
                    "kernel_size must be in 1..={}, got {}",
                    self.max_len, kernel_size
                ));
            }
        }
        Ok(())
    }
}

enum SequenceEncoder {
    Average(AveragePooling),
    Convolution {
        conv: TrainableConv1d,
        pool: MaxPooling,
    },
}

enum EncoderCache {
    Average(AveragePoolingCache),
    Convolution {
        conv: Conv1dCache,
        pre_activation: Tensor,
        pool: MaxPoolingCache,
    },
}

struct HiddenCache {
    linear: LinearCache,
    pre_activation: Tensor,
}

/// Everything the backward pass needs from one forward pass
pub struct ClassifierCache {
    ids: Vec<Vec<usize>>,
    encoder: EncoderCache,
    hidden: Option<HiddenCache>,
    dropout: DropoutCache,
    output: LinearCache,
    /// Softmax output `[batch, num_classes]`
    pub probs: Tensor,
}

/// Weight and bias gradients of a dense or convolution layer
pub struct DenseGradients {
    pub weight: Tensor,
    pub bias: Tensor,
}

/// Gradients for every trainable parameter of a [`TextClassifier`]
pub struct ClassifierGradients {
    /// `None` when the embedding table is frozen
    pub embedding: Option<Tensor>,
    pub conv: Option<DenseGradients>,
    pub hidden: Option<DenseGradients>,
    pub output: DenseGradients,
}

impl ClassifierGradients {
    /// Gradient tensors in parameter order
    pub fn tensors(&self) -> Vec<&Tensor> {
        let mut tensors = Vec::new();
        tensors.extend(self.embedding.as_ref());
        for layer in [&self.conv, &self.hidden].into_iter().flatten() {
            tensors.push(&layer.weight);
            tensors.push(&layer.bias);
        }
        tensors.push(&self.output.weight);
        tensors.push(&self.output.bias);
        tensors
    }

    /// Mutable gradient tensors in parameter order
    pub fn tensors_mut(&mut self) -> Vec<&mut Tensor> {
        let mut tensors = Vec::new();
        tensors.extend(self.embedding.as_mut());
        for layer in [&mut self.conv, &mut self.hidden].into_iter().flatten() {
            tensors.push(&mut layer.weight);
            tensors.push(&mut layer.bias);
        }
        tensors.push(&mut self.output.weight);
        tensors.push(&mut self.output.bias);
        tensors
    }
}

/// Embedding-based document classifier
pub struct TextClassifier {
    config: ClassifierConfig,
    embedding: TrainableEmbedding,
    encoder: SequenceEncoder,
    hidden: Option<TrainableLinear>,
    dropout: TrainableDropout,
    output: TrainableLinear,
}

impl TextClassifier {
    /// Build a randomly initialized classifier
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.seed;

        let mut embedding = TrainableEmbedding::new(config.vocab_size, config.embedding_dim, seed);
        embedding.trainable = config.trainable_embeddings;

        let (encoder, mut features) = match config.encoder {
            EncoderConfig::Average => (
                SequenceEncoder::Average(AveragePooling::new(false)),
                config.embedding_dim,
            ),
            EncoderConfig::MaskedAverage => (
                SequenceEncoder::Average(AveragePooling::new(true)),
                config.embedding_dim,
            ),
            EncoderConfig::Convolution {
                filters,
                kernel_size,
            } => (
                SequenceEncoder::Convolution {
                    conv: TrainableConv1d::new(
                        config.embedding_dim,
                        filters,
                        kernel_size,
                        seed.wrapping_add(1),
                    ),
                    pool: MaxPooling,
                },
                filters,
            ),
        };

        let hidden = config.hidden_units.map(|units| {
            let layer = TrainableLinear::new(features, units, seed.wrapping_add(2));
            features = units;
            layer
        });

        let model = Self {
            dropout: TrainableDropout::new(config.dropout_rate),
            output: TrainableLinear::new(features, config.num_classes, seed.wrapping_add(3)),
            embedding,
            encoder,
            hidden,
            config,
        };
        log::debug!(
            "Built classifier with {} parameters ({} trainable)",
            model.num_parameters(),
            model.num_trainable_parameters()
        );
        Ok(model)
    }

    /// Build a classifier whose embedding table is a pre-trained matrix
    ///
    /// The matrix must be `[vocab_size, embedding_dim]`. It is frozen unless
    /// `config.trainable_embeddings` is set.
    pub fn with_pretrained_embeddings(config: ClassifierConfig, matrix: Tensor) -> Result<Self> {
        let expected = vec![config.vocab_size, config.embedding_dim];
        if matrix.shape != expected {
            return Err(WordbagError::ShapeMismatch(format!(
                "embedding matrix is {:?}, config expects {:?}",
                matrix.shape, expected
            )));
        }
        let mut model = Self::new(config)?;
        model.embedding = TrainableEmbedding::from_matrix(matrix, model.config.trainable_embeddings);
        Ok(model)
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// The embedding table `[vocab_size, embedding_dim]`
    pub fn embedding_weights(&self) -> &Tensor {
        &self.embedding.weight
    }

    pub fn embeddings_trainable(&self) -> bool {
        self.embedding.trainable
    }

    /// Check a batch before it reaches the layers
    fn check_batch(&self, ids: &[Vec<usize>]) -> Result<()> {
        if ids.is_empty() {
            return Err(WordbagError::InvalidInput("empty batch".to_string()));
        }
        for (i, row) in ids.iter().enumerate() {
            if row.len() != self.config.max_len {
                return Err(WordbagError::InvalidInput(format!(
                    "row {} has length {}, expected max_len {} (pad the sequences first)",
                    i,
                    row.len(),
                    self.config.max_len
                )));
            }
            if let Some(&id) = row.iter().find(|&&id| id >= self.config.vocab_size) {
                return Err(WordbagError::InvalidInput(format!(
                    "row {} contains word index {} but vocab_size is {}",
                    i, id, self.config.vocab_size
                )));
            }
        }
        Ok(())
    }

    /// Forward pass
    ///
    /// Pass a random generator to train (dropout active) or `None` for
    /// inference. Returns softmax probabilities `[batch, num_classes]`.
    pub fn forward(
        &self,
        ids: &[Vec<usize>],
        rng: Option<&mut StdRng>,
    ) -> Result<(Tensor, ClassifierCache)> {
        self.check_batch(ids)?;

        let embedded = self.embedding.forward(ids);

        let (mut x, encoder) = match &self.encoder {
            SequenceEncoder::Average(pool) => {
                let (pooled, cache) = pool.forward(&embedded, ids);
                (pooled, EncoderCache::Average(cache))
            }
            SequenceEncoder::Convolution { conv, pool } => {
                let (conv_out, conv_cache) = conv.forward(&embedded);
                let (pooled, pool_cache) = pool.forward(&relu_forward(&conv_out));
                let cache = EncoderCache::Convolution {
                    conv: conv_cache,
                    pre_activation: conv_out,
                    pool: pool_cache,
                };
                (pooled, cache)
            }
        };

        let hidden = match &self.hidden {
            Some(layer) => {
                let (h, linear) = layer.forward(&x);
                x = relu_forward(&h);
                Some(HiddenCache {
                    linear,
                    pre_activation: h,
                })
            }
            None => None,
        };

        let (dropped, dropout) = self.dropout.forward(&x, rng);
        let (logits, output) = self.output.forward(&dropped);
        let probs = logits.softmax_rows();

        let cache = ClassifierCache {
            ids: ids.to_vec(),
            encoder,
            hidden,
            dropout,
            output,
            probs: probs.clone(),
        };
        Ok((probs, cache))
    }

    /// Mean cross-entropy of `probs` against integer labels
    pub fn compute_loss(&self, probs: &Tensor, labels: &[usize]) -> f32 {
        cross_entropy(probs, labels)
    }

    /// Backward pass from the cross-entropy loss to every trainable parameter
    ///
    /// # Panics
    ///
    /// Panics if a label is `>= num_classes` or the label count differs from
    /// the batch size
    pub fn backward(&self, labels: &[usize], cache: &ClassifierCache) -> ClassifierGradients {
        let grad_logits = softmax_cross_entropy_backward(&cache.probs, labels);

        let out = self.output.backward(&grad_logits, &cache.output);
        let mut grad = self.dropout.backward(&out.x, &cache.dropout);

        let hidden = match (&self.hidden, &cache.hidden) {
            (Some(layer), Some(hc)) => {
                let g = relu_backward(&grad, &hc.pre_activation);
                let lg = layer.backward(&g, &hc.linear);
                grad = lg.x;
                Some(DenseGradients {
                    weight: lg.weight,
                    bias: lg.bias,
                })
            }
            _ => None,
        };

        let (grad_seq, conv) = match (&self.encoder, &cache.encoder) {
            (SequenceEncoder::Average(pool), EncoderCache::Average(pc)) => {
                (pool.backward(&grad, pc), None)
            }
            (
                SequenceEncoder::Convolution { conv, pool },
                EncoderCache::Convolution {
                    conv: cc,
                    pre_activation,
                    pool: pc,
                },
            ) => {
                let g = relu_backward(&pool.backward(&grad, pc), pre_activation);
                let cg = conv.backward(&g, cc);
                let dense = DenseGradients {
                    weight: cg.weight,
                    bias: cg.bias,
                };
                (cg.x, Some(dense))
            }
            _ => unreachable!("encoder cache comes from a different encoder"),
        };

        ClassifierGradients {
            embedding: self.embedding.backward(&grad_seq, &cache.ids),
            conv,
            hidden,
            output: DenseGradients {
                weight: out.weight,
                bias: out.bias,
            },
        }
    }

    /// Class probabilities for padded sequences (inference, no dropout)
    pub fn predict_proba(&self, ids: &[Vec<usize>]) -> Result<Tensor> {
        let classes = self.config.num_classes;
        let mut data = Vec::with_capacity(ids.len() * classes);
        for chunk in ids.chunks(PREDICT_BATCH) {
            let (probs, _) = self.forward(chunk, None)?;
            data.extend(probs.data);
        }
        Ok(Tensor::new(data, vec![ids.len(), classes]))
    }

    /// Most probable class for each padded sequence
    pub fn predict(&self, ids: &[Vec<usize>]) -> Result<Vec<usize>> {
        Ok(self.predict_proba(ids)?.argmax_rows())
    }

    /// Every parameter tensor in parameter order, frozen ones included
    pub fn parameters(&self) -> Vec<&Tensor> {
        let mut params = vec![&self.embedding.weight];
        if let SequenceEncoder::Convolution { conv, .. } = &self.encoder {
            params.push(&conv.linear.weight);
            params.push(&conv.linear.bias);
        }
        if let Some(hidden) = &self.hidden {
            params.push(&hidden.weight);
            params.push(&hidden.bias);
        }
        params.push(&self.output.weight);
        params.push(&self.output.bias);
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = vec![&mut self.embedding.weight];
        if let SequenceEncoder::Convolution { conv, .. } = &mut self.encoder {
            params.push(&mut conv.linear.weight);
            params.push(&mut conv.linear.bias);
        }
        if let Some(hidden) = &mut self.hidden {
            params.push(&mut hidden.weight);
            params.push(&mut hidden.bias);
        }
        params.push(&mut self.output.weight);
        params.push(&mut self.output.bias);
        params
    }

    /// Parameters the optimizer updates, matching [`ClassifierGradients::tensors`]
    pub fn trainable_parameters(&self) -> Vec<&Tensor> {
        let skip = usize::from(!self.embedding.trainable);
        self.parameters().into_iter().skip(skip).collect()
    }

    /// Mutable parameters the optimizer updates
    pub fn trainable_parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let skip = usize::from(!self.embedding.trainable);
        self.parameters_mut().into_iter().skip(skip).collect()
    }

    pub fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|t| t.numel()).sum()
    }

    pub fn num_trainable_parameters(&self) -> usize {
        self.trainable_parameters().iter().map(|t| t.numel()).sum()
    }

    /// Per-layer table of output shapes and parameter counts
    pub fn summary(&self) -> String {
        let c = &self.config;
        let mut rows: Vec<(String, String, usize)> = vec![(
            "embedding (Embedding)".to_string(),
            format!("(None, {}, {})", c.max_len, c.embedding_dim),
            self.embedding.weight.numel(),
        )];
        match &self.encoder {
            SequenceEncoder::Average(pool) => {
                let name = if pool.mask_padding {
                    "pooling (MaskedAverage)"
                } else {
                    "pooling (GlobalAverage)"
                };
                rows.push((name.to_string(), format!("(None, {})", c.embedding_dim), 0));
            }
            SequenceEncoder::Convolution { conv, .. } => {
                rows.push((
                    "conv1d (Conv1D)".to_string(),
                    format!("(None, {}, {})", conv.output_len(c.max_len), conv.filters()),
                    conv.linear.num_parameters(),
                ));
                rows.push((
                    "pooling (GlobalMax)".to_string(),
                    format!("(None, {})", conv.filters()),
                    0,
                ));
            }
        }
        if let Some(hidden) = &self.hidden {
            rows.push((
                "hidden (Dense, ReLU)".to_string(),
                format!("(None, {})", hidden.out_features()),
                hidden.num_parameters(),
            ));
        }
        if c.dropout_rate > 0.0 {
            let features = self.output.in_features();
            rows.push((format!("dropout ({})", c.dropout_rate), format!("(None, {})", features), 0));
        }
        rows.push((
            "output (Dense, softmax)".to_string(),
            format!("(None, {})", c.num_classes),
            self.output.num_parameters(),
        ));

        let rule = "=".repeat(66);
        let mut out = format!("{:<30}{:<22}{:>14}\n{}\n", "Layer (type)", "Output Shape", "Param #", rule);
        for (name, shape, params) in rows {
            out.push_str(&format!("{:<30}{:<22}{:>14}\n", name, shape, params));
        }
        let total = self.num_parameters();
        let trainable = self.num_trainable_parameters();
        out.push_str(&format!("{}\n", rule));
        out.push_str(&format!("Total params: {}\n", total));
        out.push_str(&format!("Trainable params: {}\n", trainable));
        out.push_str(&format!("Non-trainable params: {}\n", total - trainable));
        out
    }

    /// Save config and all weights to a binary checkpoint
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut file = BufWriter::new(File::create(path)?);

        file.write_all(CHECKPOINT_MAGIC)?;
        file.write_all(&[CHECKPOINT_VERSION])?;

        let config_json = serde_json::to_vec(&self.config)?;
        file.write_all(&(config_json.len() as u32).to_le_bytes())?;
        file.write_all(&config_json)?;

        for tensor in self.parameters() {
            write_tensor(&mut file, tensor)?;
        }
        file.flush()?;

        log::info!(
            "Saved classifier checkpoint to {} ({} parameters)",
            path.display(),
            self.num_parameters()
        );
        Ok(())
    }

    /// Load a classifier saved with [`TextClassifier::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = BufReader::new(File::open(path)?);

        let mut magic = [0u8; 12];
        file.read_exact(&mut magic)?;
        if &magic != CHECKPOINT_MAGIC {
            return Err(WordbagError::InvalidInput(format!(
                "{} is not a wordbag checkpoint",
                path.display()
            )));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != CHECKPOINT_VERSION {
            return Err(WordbagError::InvalidInput(format!(
                "unsupported checkpoint version {}",
                version[0]
            )));
        }

        let config_len = read_u32(&mut file)? as usize;
        let mut config_json = vec![0u8; config_len];
        file.read_exact(&mut config_json)?;
        let config: ClassifierConfig = serde_json::from_slice(&config_json)?;

        let mut model = Self::new(config)?;
        for param in model.parameters_mut() {
            let tensor = read_tensor(&mut file)?;
            if tensor.shape != param.shape {
                return Err(WordbagError::ShapeMismatch(format!(
                    "checkpoint tensor {:?} does not fit parameter {:?}",
                    tensor.shape, param.shape
                )));
            }
            *param = tensor;
        }

        log::info!("Loaded classifier checkpoint from {}", path.display());
        Ok(model)
    }
}

fn write_tensor<W: Write>(w: &mut W, tensor: &Tensor) -> Result<()> {
    w.write_all(&(tensor.shape.len() as u32).to_le_bytes())?;
    for &dim in &tensor.shape {
        w.write_all(&(dim as u32).to_le_bytes())?;
    }
    w.write_all(&(tensor.data.len() as u32).to_le_bytes())?;
    for &val in &tensor.data {
        w.write_all(&val.to_le_bytes())?;
    }
    Ok(())
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut bytes = [0u8; 4];
    r.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_tensor<R: Read>(r: &mut R) -> Result<Tensor> {
    let rank = read_u32(r)? as usize;
    let mut shape = Vec::with_capacity(rank);
    for _ in 0..rank {
        shape.push(read_u32(r)? as usize);
    }

    let len = read_u32(r)? as usize;
    if len != shape.iter().product::<usize>() {
        return Err(WordbagError::ShapeMismatch(format!(
            "tensor of shape {:?} stored with {} values",
            shape, len
        )));
    }
    let mut bytes = vec![0u8; len * 4];
    r.read_exact(&mut bytes)?;
    let data = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(Tensor::new(data, shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn small_config(encoder: EncoderConfig) -> ClassifierConfig {
        ClassifierConfig {
            vocab_size: 10,
            embedding_dim: 4,
            max_len: 6,
            num_classes: 3,
            encoder,
            ..ClassifierConfig::default()
        }
    }

    fn batch() -> Vec<Vec<usize>> {
        vec![vec![1, 2, 3, 0, 0, 0], vec![4, 5, 6, 7, 8, 9]]
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        for encoder in [
            EncoderConfig::Average,
            EncoderConfig::MaskedAverage,
            EncoderConfig::Convolution {
                filters: 5,
                kernel_size: 3,
            },
        ] {
            let model = TextClassifier::new(small_config(encoder)).unwrap();
            let (probs, _) = model.forward(&batch(), None).unwrap();
            assert_eq!(probs.shape, vec![2, 3]);
            for i in 0..2 {
                let sum: f32 = probs.row(i).iter().sum();
                assert!((sum - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_bad_batches_are_errors() {
        let model = TextClassifier::new(small_config(EncoderConfig::Average)).unwrap();
        assert!(matches!(
            model.forward(&[vec![1, 2]], None),
            Err(WordbagError::InvalidInput(_))
        ));
        assert!(matches!(
            model.forward(&[vec![1, 2, 3, 4, 5, 10]], None),
            Err(WordbagError::InvalidInput(_))
        ));
        assert!(model.forward(&[], None).is_err());
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = small_config(EncoderConfig::Convolution {
            filters: 4,
            kernel_size: 7,
        });
        assert!(config.validate().is_err());
        config.encoder = EncoderConfig::Average;
        config.dropout_rate = 1.0;
        assert!(config.validate().is_err());
        config.dropout_rate = 0.2;
        config.num_classes = 1;
        assert!(TextClassifier::new(config).is_err());
    }

    #[test]
    fn test_gradients_match_trainable_parameters() {
        let mut config = small_config(EncoderConfig::Convolution {
            filters: 5,
            kernel_size: 2,
        });
        config.hidden_units = Some(7);
        config.dropout_rate = 0.3;
        let mut model = TextClassifier::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let (_, cache) = model.forward(&batch(), Some(&mut rng)).unwrap();
        let grads = model.backward(&[0, 2], &cache);

        let grad_shapes: Vec<Vec<usize>> = grads.tensors().iter().map(|t| t.shape.clone()).collect();
        let param_shapes: Vec<Vec<usize>> = model
            .trainable_parameters_mut()
            .iter()
            .map(|t| t.shape.clone())
            .collect();
        assert_eq!(grad_shapes.len(), 7);
        assert_eq!(grad_shapes, param_shapes);
    }

    #[test]
    fn test_frozen_embedding_has_no_gradient() {
        let mut config = small_config(EncoderConfig::Average);
        config.trainable_embeddings = false;
        let model = TextClassifier::new(config).unwrap();
        let (_, cache) = model.forward(&batch(), None).unwrap();
        let grads = model.backward(&[1, 1], &cache);
        assert!(grads.embedding.is_none());
        assert_eq!(grads.tensors().len(), 2);
        assert_eq!(model.trainable_parameters().len(), 2);
        assert_eq!(model.num_trainable_parameters(), 4 * 3 + 3);
    }

    #[test]
    fn test_pretrained_matrix_shape_is_checked() {
        let config = small_config(EncoderConfig::Average);
        let wrong = Tensor::zeros(vec![10, 5]);
        assert!(matches!(
            TextClassifier::with_pretrained_embeddings(config.clone(), wrong),
            Err(WordbagError::ShapeMismatch(_))
        ));
        let matrix = Tensor::new((0..40).map(|v| v as f32).collect(), vec![10, 4]);
        let model = TextClassifier::with_pretrained_embeddings(config, matrix.clone()).unwrap();
        assert_eq!(model.embedding_weights(), &matrix);
    }

    #[test]
    fn test_summary_counts_parameters() {
        let mut config = small_config(EncoderConfig::Average);
        config.hidden_units = Some(8);
        let model = TextClassifier::new(config).unwrap();
        let summary = model.summary();
        assert!(summary.contains("hidden (Dense, ReLU)"));
        // 10*4 embedding + 4*8+8 hidden + 8*3+3 output
        assert!(summary.contains("Total params: 107"));
        assert!(summary.contains("Non-trainable params: 0"));
    }

    #[test]
    fn test_checkpoint_round_trip() {
        let mut config = small_config(EncoderConfig::Convolution {
            filters: 3,
            kernel_size: 2,
        });
        config.hidden_units = Some(4);
        let model = TextClassifier::new(config).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.ckpt");
        model.save(&path).unwrap();

        let loaded = TextClassifier::load(&path).unwrap();
        assert_eq!(loaded.config(), model.config());
        assert_eq!(
            loaded.predict_proba(&batch()).unwrap(),
            model.predict_proba(&batch()).unwrap()
        );
    }

    #[test]
    fn test_load_rejects_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_model.bin");
        std::fs::write(&path, b"SOMETHING_ELSE_ENTIRELY").unwrap();
        assert!(TextClassifier::load(&path).is_err());
    }
}
