//! A dense matrix engine and a sigmoid MLP trained by manual backpropagation.
//!
//! `dense-mlp` builds a fully-connected feed-forward network from first principles: no
//! numerics or autodiff library, just a small row-major [`Matrix`] type and a network that
//! composes it.
//!
//! # Design
//!
//! - Value semantics: every [`Matrix`] operation returns a new matrix. Operands are never
//!   aliased or mutated (the one exception is [`Matrix::fill`]).
//! - Clear contracts: shape preconditions are checked and reported as
//!   [`Error::DimensionMismatch`] instead of panicking.
//! - One sample at a time: [`Mlp::forward`] caches per-layer activations and the following
//!   [`Mlp::backprop`] consumes them to update weights and biases in place.
//! - Explicit randomness: an [`Initializer`] owns a single generator for its lifetime.
//!
//! # Data layout and shapes
//!
//! - Scalars are `f64`.
//! - Inputs, targets and outputs are column matrices of shape `(width, 1)`.
//! - Layer `i` has weights `(layer_widths[i + 1], layer_widths[i])` and biases
//!   `(layer_widths[i + 1], 1)`.
//!
//! # Numeric anomalies
//!
//! The network never clips or rescales on its own. Poll [`Mlp::has_nan`] /
//! [`Mlp::has_abnormal`] after training steps and react (stop, lower the learning rate with
//! [`Mlp::set_learning_rate`], or opt in to [`Mlp::with_gradient_clipping`]).
//!
//! # Quick start
//!
//! ```rust
//! use dense_mlp::{Matrix, Mlp};
//!
//! # fn main() -> dense_mlp::Result<()> {
//! let mut mlp = Mlp::new_with_seed(&[1, 8, 8, 8, 1], 0.2, 0)?;
//!
//! let x = Matrix::column(&[1.2]);
//! let y = Matrix::column(&[1.2_f64.sin().powi(2)]);
//!
//! let y_hat = mlp.forward(&x)?;
//! let _loss = dense_mlp::loss::squared_error(&y_hat, &y)?;
//! mlp.backprop(&y)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Training loop
//!
//! ```rust
//! use dense_mlp::train::{self, TrainConfig};
//! use dense_mlp::{MlpBuilder, SineSquared};
//!
//! # fn main() -> dense_mlp::Result<()> {
//! let mut mlp = MlpBuilder::uniform_hidden(1, 1, 8, 3)?
//!     .learning_rate(0.2)?
//!     .build_with_seed(0)?;
//! let mut sampler = SineSquared::seeded(1);
//! let mut records = Vec::new();
//!
//! let cfg = TrainConfig {
//!     iterations: 500,
//!     ..TrainConfig::default()
//! };
//! let report = train::fit(&mut mlp, &mut sampler, &mut records, &cfg)?;
//! assert_eq!(records.len(), 500);
//! assert!(report.last_window_mean.is_finite());
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
pub mod data;
pub mod error;
pub mod init;
pub mod loss;
pub(crate) mod matmul;
pub mod matrix;
pub mod metrics;
pub mod mlp;
pub mod train;

pub use activation::{sigmoid, sigmoid_grad_from_output};
pub use builder::MlpBuilder;
pub use data::{Sampler, SineSquared};
pub use error::{Error, Result};
pub use init::{Init, Initializer};
pub use matrix::Matrix;
pub use metrics::LossWindow;
pub use mlp::Mlp;
pub use train::{AnomalyPolicy, FitReport, TrainConfig, TrainRecord};
