use dense_mlp::train::{self, NullSink, TrainConfig};
use dense_mlp::{
    AnomalyPolicy, Error, LossWindow, Matrix, Mlp, MlpBuilder, Sampler, SineSquared, loss,
    sigmoid,
};

// Convergence varies a lot across seeds, so the runs below are pinned.
const MODEL_SEED: u64 = 7;
const SAMPLE_SEED: u64 = 11;

#[test]
fn sine_squared_loss_drops_over_training() {
    let mut mlp = MlpBuilder::uniform_hidden(1, 1, 8, 3)
        .unwrap()
        .learning_rate(0.2)
        .unwrap()
        .build_with_seed(MODEL_SEED)
        .unwrap();
    assert_eq!(mlp.layer_widths(), &[1, 8, 8, 8, 1]);

    let mut sampler = SineSquared::seeded(SAMPLE_SEED);
    let cfg = TrainConfig {
        iterations: 20_000,
        window: 100,
        log_every: 0,
        anomaly_policy: AnomalyPolicy::AbortOnNan,
    };

    let report = train::fit(&mut mlp, &mut sampler, &mut NullSink, &cfg).unwrap();

    assert!(
        report.last_window_mean * 10.0 < report.first_window_mean,
        "first={} last={}",
        report.first_window_mean,
        report.last_window_mean
    );
    assert!(!mlp.has_nan());
}

#[test]
fn hand_driven_loop_matches_the_forward_backprop_contract() {
    // Same seeds as the `fit` run above; the hand loop must trace the same trajectory.
    let mut mlp = Mlp::new_with_seed(&[1, 8, 8, 8, 1], 0.2, MODEL_SEED).unwrap();
    let mut sampler = SineSquared::seeded(SAMPLE_SEED);
    let mut first = LossWindow::new(100).unwrap();
    let mut last = LossWindow::new(100).unwrap();

    for _ in 0..20_000 {
        let (x, y) = sampler.sample();
        let y_hat = mlp.forward(&x).unwrap();
        assert_eq!(y_hat.shape(), (1, 1));
        mlp.backprop(&y).unwrap();

        let l = loss::squared_error(&y_hat, &y).unwrap();
        if !first.is_full() {
            first.push(l);
        }
        last.push(l);
    }

    let first = first.mean().unwrap();
    let last = last.mean().unwrap();
    assert!(last * 10.0 < first, "first={first} last={last}");
}

#[test]
fn single_layer_update_matches_hand_computation() {
    let (w0, b0, x, t, lr) = (-0.35_f64, 0.8_f64, 1.7_f64, 0.1_f64, 0.3_f64);
    let mut mlp = Mlp::from_parts(vec![Matrix::column(&[w0])], vec![Matrix::column(&[b0])], lr)
        .unwrap();
    assert_eq!(mlp.layer_widths(), &[1, 1]);

    let y_hat = sigmoid(w0 * x + b0);
    let error = t - y_hat;
    let grad = error * y_hat * (1.0 - y_hat) * lr;

    mlp.forward(&Matrix::column(&[x])).unwrap();
    mlp.backprop(&Matrix::column(&[t])).unwrap();

    let eps = 1e-12;
    assert!((mlp.weights()[0][(0, 0)] - (w0 + grad * x)).abs() < eps);
    assert!((mlp.biases()[0][(0, 0)] - (b0 + grad)).abs() < eps);
}

#[test]
fn forward_shape_law() {
    let widths = [3, 5, 4, 2];
    let mut mlp = Mlp::new_with_seed(&widths, 0.1, 0).unwrap();

    let out = mlp.forward(&Matrix::column(&[0.1, 0.2, 0.3])).unwrap();
    assert_eq!(out.shape(), (2, 1));
    assert!(out.as_slice().iter().all(|&v| v > 0.0 && v < 1.0));

    for rows in [1, 2, 4, 7] {
        let err = mlp.forward(&Matrix::new(rows, 1)).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch(_)), "rows={rows}");
    }
}

#[test]
fn one_backprop_per_forward() {
    let mut mlp = Mlp::new_with_seed(&[2, 3, 1], 0.1, 0).unwrap();
    let x = Matrix::column(&[0.5, 0.5]);
    let t = Matrix::column(&[1.0]);

    assert!(matches!(mlp.backprop(&t), Err(Error::InvalidState(_))));
    mlp.forward(&x).unwrap();
    mlp.backprop(&t).unwrap();
    assert!(matches!(mlp.backprop(&t), Err(Error::InvalidState(_))));
    mlp.forward(&x).unwrap();
    mlp.backprop(&t).unwrap();
}
