//! Single-sample training loop.
//!
//! [`fit`] repeatedly draws a sample, runs `forward` then `backprop`, computes the
//! squared-error loss of the pre-update prediction and hands one [`TrainRecord`] per
//! iteration to a [`RecordSink`].

use std::io::Write;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::data::Sampler;
use crate::metrics::LossWindow;
use crate::{Error, Mlp, Result, loss};

/// What the loop does when parameters turn NaN or abnormal (see `Mlp::has_abnormal`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnomalyPolicy {
    /// Do not poll parameters.
    Ignore,
    /// Log a warning at the start of every anomalous streak and keep training.
    #[default]
    Warn,
    /// Like `Warn`, but stop with [`Error::NumericAnomaly`] as soon as a NaN appears.
    AbortOnNan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    /// Number of forward/backprop steps.
    pub iterations: usize,
    /// Size of the first/last loss windows in the report.
    pub window: usize,
    /// Emit a progress log every `log_every` iterations; `0` disables it.
    pub log_every: usize,
    pub anomaly_policy: AnomalyPolicy,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            iterations: 20_000,
            window: 100,
            log_every: 1_000,
            anomaly_policy: AnomalyPolicy::Warn,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::InvalidConfig("iterations must be > 0".to_owned()));
        }
        if self.window == 0 {
            return Err(Error::InvalidConfig("window must be > 0".to_owned()));
        }
        Ok(())
    }
}

/// One training step as seen by the loop.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TrainRecord {
    /// 1-based.
    pub iteration: usize,
    /// Squared error of `prediction` against `target`.
    pub loss: f64,
    pub input: Vec<f64>,
    pub target: Vec<f64>,
    /// Output of `forward`, taken before the `backprop` update.
    pub prediction: Vec<f64>,
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub iterations: usize,
    /// Mean loss over the first `window` iterations.
    pub first_window_mean: f64,
    /// Mean loss over the last `window` iterations.
    pub last_window_mean: f64,
    pub final_loss: f64,
    /// Iterations after which the parameters were NaN or abnormal.
    pub anomalous_steps: usize,
}

/// Destination for per-iteration training records.
pub trait RecordSink {
    fn record(&mut self, record: &TrainRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn record(&mut self, _record: &TrainRecord) -> Result<()> {
        Ok(())
    }
}

impl RecordSink for Vec<TrainRecord> {
    fn record(&mut self, record: &TrainRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Plain-text log: one line per iteration, `loss input target prediction`, space separated
/// (multi-element columns are flattened in order).
#[derive(Debug)]
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for TextSink<W> {
    fn record(&mut self, record: &TrainRecord) -> Result<()> {
        let mut line = record.loss.to_string();
        for v in record
            .input
            .iter()
            .chain(&record.target)
            .chain(&record.prediction)
        {
            line.push(' ');
            line.push_str(&v.to_string());
        }
        line.push('\n');
        self.out
            .write_all(line.as_bytes())
            .map_err(|e| Error::Io(format!("failed to write record {}: {e}", record.iteration)))
    }

    fn flush(&mut self) -> Result<()> {
        self.out
            .flush()
            .map_err(|e| Error::Io(format!("failed to flush records: {e}")))
    }
}

/// One JSON object per line (feature: `serde`).
#[cfg(feature = "serde")]
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    out: W,
}

#[cfg(feature = "serde")]
impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(feature = "serde")]
impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn record(&mut self, record: &TrainRecord) -> Result<()> {
        serde_json::to_writer(&mut self.out, record).map_err(|e| {
            Error::Io(format!("failed to serialize record {}: {e}", record.iteration))
        })?;
        self.out
            .write_all(b"\n")
            .map_err(|e| Error::Io(format!("failed to write record {}: {e}", record.iteration)))
    }

    fn flush(&mut self) -> Result<()> {
        self.out
            .flush()
            .map_err(|e| Error::Io(format!("failed to flush records: {e}")))
    }
}

/// Train `mlp` for `cfg.iterations` single-sample steps drawn from `sampler`.
pub fn fit<S, K>(
    mlp: &mut Mlp,
    sampler: &mut S,
    sink: &mut K,
    cfg: &TrainConfig,
) -> Result<FitReport>
where
    S: Sampler + ?Sized,
    K: RecordSink + ?Sized,
{
    cfg.validate()?;
    if sampler.input_dim() != mlp.input_dim() {
        return Err(Error::DimensionMismatch(format!(
            "sampler input_dim {} does not match model input_dim {}",
            sampler.input_dim(),
            mlp.input_dim()
        )));
    }
    if sampler.target_dim() != mlp.output_dim() {
        return Err(Error::DimensionMismatch(format!(
            "sampler target_dim {} does not match model output_dim {}",
            sampler.target_dim(),
            mlp.output_dim()
        )));
    }

    let mut first = LossWindow::new(cfg.window)?;
    let mut last = LossWindow::new(cfg.window)?;
    let mut final_loss = 0.0;
    let mut anomalous = false;
    let mut anomalous_steps = 0;

    tracing::info!(
        layer_widths = ?mlp.layer_widths(),
        learning_rate = mlp.learning_rate(),
        iterations = cfg.iterations,
        "training started"
    );

    for iteration in 1..=cfg.iterations {
        let (x, y) = sampler.sample();
        let y_hat = mlp.forward(&x)?;
        mlp.backprop(&y)?;

        let loss = loss::squared_error(&y_hat, &y)?;
        sink.record(&TrainRecord {
            iteration,
            loss,
            input: x.into_vec(),
            target: y.into_vec(),
            prediction: y_hat.into_vec(),
        })?;

        if !first.is_full() {
            first.push(loss);
        }
        last.push(loss);
        final_loss = loss;

        if cfg.anomaly_policy != AnomalyPolicy::Ignore {
            let nan = mlp.has_nan();
            let abnormal = nan || mlp.has_abnormal();
            if abnormal {
                anomalous_steps += 1;
                if nan && cfg.anomaly_policy == AnomalyPolicy::AbortOnNan {
                    return Err(Error::NumericAnomaly(format!(
                        "parameters contain NaN after iteration {iteration}"
                    )));
                }
                if !anomalous {
                    tracing::warn!(iteration, nan, "parameters became abnormal");
                }
            }
            anomalous = abnormal;
        }

        if cfg.log_every > 0 && iteration.is_multiple_of(cfg.log_every) {
            tracing::info!(
                iteration,
                window_mean_loss = last.mean().unwrap_or(final_loss),
                "training progress"
            );
        }
    }
    sink.flush()?;

    let report = FitReport {
        iterations: cfg.iterations,
        first_window_mean: first.mean().unwrap_or(0.0),
        last_window_mean: last.mean().unwrap_or(0.0),
        final_loss,
        anomalous_steps,
    };
    tracing::info!(
        first_window_mean = report.first_window_mean,
        last_window_mean = report.last_window_mean,
        anomalous_steps = report.anomalous_steps,
        "training finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::Matrix;
    use crate::data::{Cycle, SineSquared};

    fn small_cfg(iterations: usize) -> TrainConfig {
        TrainConfig {
            iterations,
            window: 10,
            log_every: 0,
            anomaly_policy: AnomalyPolicy::Warn,
        }
    }

    #[test]
    fn config_validation() {
        assert!(TrainConfig::default().validate().is_ok());
        let cfg = TrainConfig {
            iterations: 0,
            ..TrainConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
        let cfg = TrainConfig {
            window: 0,
            ..TrainConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn records_one_entry_per_iteration() {
        let mut mlp = Mlp::new_with_seed(&[1, 4, 1], 0.2, 0).unwrap();
        let mut sampler = SineSquared::seeded(1);
        let mut records: Vec<TrainRecord> = Vec::new();

        let report = fit(&mut mlp, &mut sampler, &mut records, &small_cfg(25)).unwrap();

        assert_eq!(records.len(), 25);
        assert_eq!(report.iterations, 25);
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.iteration, i + 1);
            let expected = (r.target[0] - r.prediction[0]).powi(2);
            assert!((r.loss - expected).abs() < 1e-15);
        }
        assert_eq!(report.final_loss, records[24].loss);

        let first: f64 = records[..10].iter().map(|r| r.loss).sum::<f64>() / 10.0;
        let last: f64 = records[15..].iter().map(|r| r.loss).sum::<f64>() / 10.0;
        assert!((report.first_window_mean - first).abs() < 1e-12);
        assert!((report.last_window_mean - last).abs() < 1e-12);
        assert!(!mlp.is_ready_for_backprop());
    }

    #[test]
    fn rejects_sampler_model_mismatch() {
        let mut mlp = Mlp::new_with_seed(&[2, 1], 0.2, 0).unwrap();
        let mut sampler = SineSquared::seeded(1);
        let err = fit(&mut mlp, &mut sampler, &mut NullSink, &small_cfg(5)).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch(_)));
    }

    #[test]
    fn text_sink_writes_space_separated_lines() {
        let mut sink = TextSink::new(Vec::new());
        sink.record(&TrainRecord {
            iteration: 1,
            loss: 0.25,
            input: vec![1.5],
            target: vec![0.5],
            prediction: vec![0.0],
        })
        .unwrap();
        sink.flush().unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "0.25 1.5 0.5 0\n");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_lines_sink_writes_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let record = TrainRecord {
            iteration: 3,
            loss: 0.5,
            input: vec![1.0],
            target: vec![0.0],
            prediction: vec![0.5],
        };
        sink.record(&record).unwrap();
        sink.record(&record).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let v: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(v["iteration"], 3);
        assert_eq!(v["prediction"][0], 0.5);
    }

    #[test]
    fn abort_on_nan_stops_training() {
        let mut mlp = Mlp::from_parts(
            vec![Matrix::column(&[f64::NAN])],
            vec![Matrix::column(&[0.0])],
            0.1,
        )
        .unwrap();
        let mut sampler =
            Cycle::new(vec![(Matrix::column(&[1.0]), Matrix::column(&[0.5]))]).unwrap();

        let cfg = TrainConfig {
            anomaly_policy: AnomalyPolicy::AbortOnNan,
            ..small_cfg(5)
        };
        let mut records: Vec<TrainRecord> = Vec::new();
        let err = fit(&mut mlp, &mut sampler, &mut records, &cfg).unwrap_err();
        assert!(matches!(err, Error::NumericAnomaly(_)));
        assert_eq!(records.len(), 1);

        // The default policy only reports.
        let cfg = small_cfg(5);
        let report = fit(&mut mlp, &mut sampler, &mut NullSink, &cfg).unwrap();
        assert_eq!(report.anomalous_steps, 5);
    }
}
