//! Neural Network Layers
//!
//! The layers that make up the text classifier. Each provides an explicit
//! forward and backward pass.
//!
//! ## Layers
//!
//! - **embedding**: Word index lookup table
//! - **pooling**: Average and max pooling over the sequence
//! - **conv1d**: Sliding-window n-gram detectors
//! - **linear**: Fully connected layer
//! - **activation**: ReLU and softmax cross-entropy
//! - **dropout**: Dropout regularization
//!
//! ## Design Pattern
//!
//! ```rust,ignore
//! impl TrainableLayer {
//!     pub fn new(...) -> Self { }
//!     pub fn forward(&self, x: &Tensor) -> (Tensor, Cache) { }
//!     pub fn backward(&self, grad: &Tensor, cache: &Cache) -> Gradients { }
//! }
//! ```
//!
//! The cache holds whatever the backward pass needs, so nothing is stored on
//! the layer itself and inference and training share one code path.

pub mod activation;
pub mod conv1d;
pub mod dropout;
pub mod embedding;
pub mod linear;
pub mod pooling;

pub use activation::{cross_entropy, relu_backward, relu_forward, softmax_cross_entropy_backward};
pub use conv1d::{Conv1dCache, Conv1dGradients, TrainableConv1d};
pub use dropout::{DropoutCache, TrainableDropout};
pub use embedding::TrainableEmbedding;
pub use linear::{uniform_init, LinearCache, LinearGradients, TrainableLinear};
pub use pooling::{AveragePooling, AveragePoolingCache, MaxPooling, MaxPoolingCache};
