use crate::activation::{sigmoid, sigmoid_grad_from_output};
use crate::{Error, Init, Initializer, Matrix, Result};

/// Where the network is in its forward/backprop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    ReadyForForward,
    /// The activation cache holds a forward result that has not been consumed yet.
    ReadyForBackprop,
}

/// Fully-connected feed-forward network with sigmoid layers.
///
/// Layer `i` maps `layer_widths[i]` inputs to `layer_widths[i + 1]` outputs:
/// `a[i + 1] = sigmoid(W[i] * a[i] + b[i])`.
///
/// Every call to [`Mlp::forward`] must be followed by exactly one call to
/// [`Mlp::backprop`] before the next training step; the activation cache written by
/// `forward` is consumed by `backprop`.
#[derive(Debug, Clone)]
pub struct Mlp {
    layer_widths: Vec<usize>,
    /// `weights[i]` has shape `(layer_widths[i + 1], layer_widths[i])`.
    weights: Vec<Matrix>,
    /// `biases[i]` has shape `(layer_widths[i + 1], 1)`.
    biases: Vec<Matrix>,
    /// `activations[0]` is the last input, `activations[i + 1]` the output of layer `i`.
    activations: Vec<Matrix>,
    learning_rate: f64,
    clip_gradients: bool,
    phase: Phase,
}

impl Mlp {
    /// Build a network with parameters drawn from an entropy-seeded [`Initializer`].
    pub fn new(layer_widths: &[usize], learning_rate: f64) -> Result<Self> {
        let mut init = Initializer::from_entropy();
        Self::new_with_initializer(layer_widths, learning_rate, &mut init)
    }

    pub fn new_with_seed(layer_widths: &[usize], learning_rate: f64, seed: u64) -> Result<Self> {
        let mut init = Initializer::new(seed);
        Self::new_with_initializer(layer_widths, learning_rate, &mut init)
    }

    /// Build a network whose weights and biases are drawn with [`Init::Normal`] from `init`.
    pub fn new_with_initializer(
        layer_widths: &[usize],
        learning_rate: f64,
        init: &mut Initializer,
    ) -> Result<Self> {
        validate_widths(layer_widths)?;

        let mut weights = Vec::with_capacity(layer_widths.len() - 1);
        let mut biases = Vec::with_capacity(layer_widths.len() - 1);
        for w in layer_widths.windows(2) {
            let in_dim = w[0];
            let out_dim = w[1];
            weights.push(init.init(Init::Normal, out_dim, in_dim)?);
            biases.push(init.init(Init::Normal, out_dim, 1)?);
        }

        Self::from_parts(weights, biases, learning_rate)
    }

    /// Build a network from known parameters.
    ///
    /// `weights[i]` must have shape `(out_i, in_i)` with `in_{i+1} == out_i`, and
    /// `biases[i]` must have shape `(out_i, 1)`.
    pub fn from_parts(
        weights: Vec<Matrix>,
        biases: Vec<Matrix>,
        learning_rate: f64,
    ) -> Result<Self> {
        validate_learning_rate(learning_rate)?;
        if weights.is_empty() {
            return Err(Error::InvalidShape(
                "mlp must have at least one layer".to_owned(),
            ));
        }
        if weights.len() != biases.len() {
            return Err(Error::InvalidShape(format!(
                "{} weight matrices but {} bias vectors",
                weights.len(),
                biases.len()
            )));
        }

        let mut layer_widths = Vec::with_capacity(weights.len() + 1);
        layer_widths.push(weights[0].cols());
        for (i, (w, b)) in weights.iter().zip(&biases).enumerate() {
            let in_dim = layer_widths[i];
            if w.cols() != in_dim {
                return Err(Error::InvalidShape(format!(
                    "layer {i} weights {:?} expect {} inputs, previous layer has {in_dim} outputs",
                    w.shape(),
                    w.cols()
                )));
            }
            if b.shape() != (w.rows(), 1) {
                return Err(Error::InvalidShape(format!(
                    "layer {i} biases {:?} do not match expected ({}, 1)",
                    b.shape(),
                    w.rows()
                )));
            }
            layer_widths.push(w.rows());
        }
        validate_widths(&layer_widths)?;

        let activations = layer_widths.iter().map(|&n| Matrix::new(n, 1)).collect();

        tracing::debug!(
            layer_widths = ?layer_widths,
            learning_rate,
            "built mlp"
        );

        Ok(Self {
            layer_widths,
            weights,
            biases,
            activations,
            learning_rate,
            clip_gradients: false,
            phase: Phase::ReadyForForward,
        })
    }

    /// Opt in to zeroing tiny gradient entries (see [`Matrix::clip`]) before the
    /// learning-rate scaling in [`Mlp::backprop`]. Off by default.
    pub fn with_gradient_clipping(mut self, enabled: bool) -> Self {
        self.clip_gradients = enabled;
        self
    }

    #[inline]
    pub fn layer_widths(&self) -> &[usize] {
        &self.layer_widths
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.layer_widths[0]
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.layer_widths[self.layer_widths.len() - 1]
    }

    #[inline]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Change the step size, e.g. after observing a numeric anomaly.
    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        validate_learning_rate(learning_rate)?;
        self.learning_rate = learning_rate;
        Ok(())
    }

    #[inline]
    pub fn clip_gradients(&self) -> bool {
        self.clip_gradients
    }

    #[inline]
    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[Matrix] {
        &self.biases
    }

    /// Cached activations from the most recent forward pass.
    #[inline]
    pub fn activations(&self) -> &[Matrix] {
        &self.activations
    }

    /// Returns true if a forward result is waiting to be consumed by `backprop`.
    #[inline]
    pub fn is_ready_for_backprop(&self) -> bool {
        self.phase == Phase::ReadyForBackprop
    }

    /// Returns true if any weight or bias is NaN.
    pub fn has_nan(&self) -> bool {
        self.weights.iter().chain(&self.biases).any(Matrix::has_nan)
    }

    /// Returns true if any weight or bias is abnormal (see [`Matrix::has_abnormal`]).
    pub fn has_abnormal(&self) -> bool {
        self.weights.iter().chain(&self.biases).any(Matrix::has_abnormal)
    }

    /// Forward pass for a single sample.
    ///
    /// `input` must have shape `(input_dim, 1)`. Caches every layer's activation and
    /// returns a copy of the output, shape `(output_dim, 1)`.
    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        self.check_column(input, self.input_dim(), "input")?;

        self.activations[0] = input.clone();
        for i in 0..self.num_layers() {
            let out = self.layer_forward(i, &self.activations[i])?;
            self.activations[i + 1] = out;
        }
        self.phase = Phase::ReadyForBackprop;

        Ok(self.activations[self.num_layers()].clone())
    }

    /// Evaluate the network without touching the activation cache.
    pub fn predict(&self, input: &Matrix) -> Result<Matrix> {
        self.check_column(input, self.input_dim(), "input")?;

        let mut a = input.clone();
        for i in 0..self.num_layers() {
            a = self.layer_forward(i, &a)?;
        }
        Ok(a)
    }

    /// Single-sample parameter update from the cached forward pass.
    ///
    /// The output error is `target - prediction`. Walking layers from last to first, the
    /// error handed to layer `i - 1` is `W[i]^T * error`, taken before layer `i`'s sigmoid
    /// derivative is applied. Each layer then moves by
    /// `grad = lr * (error ⊙ a[i+1] ⊙ (1 - a[i+1]))`: `b[i] += grad`,
    /// `W[i] += grad * a[i]^T`.
    ///
    /// Fails with [`Error::InvalidState`] unless a `forward` call is pending, and with
    /// [`Error::DimensionMismatch`] if `target` is not `(output_dim, 1)`. Parameters are
    /// left untouched on failure.
    pub fn backprop(&mut self, target: &Matrix) -> Result<()> {
        if self.phase != Phase::ReadyForBackprop {
            return Err(Error::InvalidState(
                "backprop requires a preceding forward pass".to_owned(),
            ));
        }
        self.check_column(target, self.output_dim(), "target")?;

        let mut error = target.sub(&self.activations[self.num_layers()])?;

        for i in (0..self.num_layers()).rev() {
            let prev_error = self.weights[i].transpose().matmul(&error)?;

            let local = self.activations[i + 1].map(sigmoid_grad_from_output);
            let mut grad = error.mul_elementwise(&local)?;
            if self.clip_gradients {
                grad = grad.clip();
            }
            let grad = grad.scale(self.learning_rate);
            let weight_grad = grad.matmul(&self.activations[i].transpose())?;

            self.biases[i] = self.biases[i].add(&grad)?;
            self.weights[i] = self.weights[i].add(&weight_grad)?;
            error = prev_error;
        }

        self.phase = Phase::ReadyForForward;
        Ok(())
    }

    fn layer_forward(&self, i: usize, input: &Matrix) -> Result<Matrix> {
        let z = self.weights[i].matmul(input)?.add(&self.biases[i])?;
        Ok(z.map(sigmoid))
    }

    fn check_column(&self, m: &Matrix, rows: usize, what: &str) -> Result<()> {
        if m.shape() != (rows, 1) {
            return Err(Error::DimensionMismatch(format!(
                "{what} shape {:?} does not match expected ({rows}, 1)",
                m.shape()
            )));
        }
        Ok(())
    }
}

fn validate_widths(layer_widths: &[usize]) -> Result<()> {
    if layer_widths.len() < 2 {
        return Err(Error::InvalidShape(
            "layer widths must include input and output dims".to_owned(),
        ));
    }
    if layer_widths.contains(&0) {
        return Err(Error::InvalidShape(format!(
            "all layer widths must be > 0, got {layer_widths:?}"
        )));
    }
    Ok(())
}

fn validate_learning_rate(learning_rate: f64) -> Result<()> {
    if !(learning_rate.is_finite() && learning_rate > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "learning rate must be finite and > 0, got {learning_rate}"
        )));
    }
    Ok(())
}
