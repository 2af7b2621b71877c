//! Model builder.
//!
//! `MlpBuilder` spells out the layer widths of a network (input, hidden layers, output)
//! together with its learning rate, then builds an [`Mlp`] from a seed, an existing
//! [`Initializer`] or OS entropy.

use crate::{Error, Initializer, Mlp, Result};

/// Step size used when none is set: the value the sine-squared demo trains with.
///
/// Tuned for the `[1, 8, 8, 8, 1]` sigmoid network on `sin(x)^2`, not a general-purpose
/// default. Wider or deeper networks usually want something far smaller, e.g. `0.001`.
pub const DEFAULT_LEARNING_RATE: f64 = 0.2;

#[derive(Debug, Clone)]
/// Builder for an `Mlp`.
///
/// Example:
///
/// ```rust
/// use dense_mlp::MlpBuilder;
///
/// # fn main() -> dense_mlp::Result<()> {
/// let mlp = MlpBuilder::new(1)?
///     .add_layer(8)?
///     .add_layer(1)?
///     .learning_rate(0.2)?
///     .build_with_seed(0)?;
/// assert_eq!(mlp.layer_widths(), &[1, 8, 1]);
/// # Ok(())
/// # }
/// ```
pub struct MlpBuilder {
    layer_widths: Vec<usize>,
    learning_rate: f64,
    clip_gradients: bool,
}

impl MlpBuilder {
    /// Start building an MLP that accepts inputs of shape `(input_dim, 1)`.
    pub fn new(input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidShape("input_dim must be > 0".to_owned()));
        }
        Ok(Self {
            layer_widths: vec![input_dim],
            learning_rate: DEFAULT_LEARNING_RATE,
            clip_gradients: false,
        })
    }

    /// `hidden_layers` layers of `hidden_units` each between `input_dim` and `output_dim`.
    pub fn uniform_hidden(
        input_dim: usize,
        output_dim: usize,
        hidden_units: usize,
        hidden_layers: usize,
    ) -> Result<Self> {
        let mut b = Self::new(input_dim)?;
        for _ in 0..hidden_layers {
            b = b.add_layer(hidden_units)?;
        }
        b.add_layer(output_dim)
    }

    /// Append a sigmoid layer with `width` outputs.
    pub fn add_layer(mut self, width: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::InvalidShape("layer width must be > 0".to_owned()));
        }
        self.layer_widths.push(width);
        Ok(self)
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Result<Self> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {learning_rate}"
            )));
        }
        self.learning_rate = learning_rate;
        Ok(self)
    }

    /// See [`Mlp::with_gradient_clipping`].
    pub fn gradient_clipping(mut self, enabled: bool) -> Self {
        self.clip_gradients = enabled;
        self
    }

    #[inline]
    pub fn layer_widths(&self) -> &[usize] {
        &self.layer_widths
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Result<Mlp> {
        let mut init = Initializer::new(seed);
        self.build_with_initializer(&mut init)
    }

    /// Build using OS entropy.
    pub fn build(self) -> Result<Mlp> {
        let mut init = Initializer::from_entropy();
        self.build_with_initializer(&mut init)
    }

    /// Build drawing parameters from `init`.
    pub fn build_with_initializer(self, init: &mut Initializer) -> Result<Mlp> {
        if self.layer_widths.len() < 2 {
            return Err(Error::InvalidShape(
                "mlp must have at least one layer".to_owned(),
            ));
        }
        let mlp = Mlp::new_with_initializer(&self.layer_widths, self.learning_rate, init)?;
        Ok(mlp.with_gradient_clipping(self.clip_gradients))
    }
}
