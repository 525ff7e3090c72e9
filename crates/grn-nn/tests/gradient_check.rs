//! Finite-difference gradient checks for GrnLayer.
//!
//! Loss: L = Σ dy · y with a fixed random dy, so ∂L/∂x is exactly what
//! backward writes into the bottom diff.

use grn_core::filler::{Filler, GaussianFiller, UniformFiller};
use grn_core::Blob;
use grn_nn::{Backend, GrnConfig, GrnLayer, Layer};

const STEP: f64 = 1e-6;

fn loss(layer: &mut GrnLayer<f64>, x: &Blob<f64>, y: &mut Blob<f64>, dy: &[f64]) -> f64 {
    layer.forward(&[x], &mut [&mut *y]).unwrap();
    y.data().iter().zip(dy).map(|(a, b)| a * b).sum()
}

/// Numerical gradient via central finite differences.
fn numerical_grad(layer: &mut GrnLayer<f64>, x: &Blob<f64>, dy: &[f64]) -> Vec<f64> {
    let mut probe = x.clone();
    let mut y = Blob::default();
    layer.reshape(&[&probe], &mut [&mut y]).unwrap();

    let mut grad = vec![0.0f64; x.count()];
    for i in 0..x.count() {
        let orig = probe.data()[i];
        probe.data_mut()[i] = orig + STEP;
        let fp = loss(layer, &probe, &mut y, dy);
        probe.data_mut()[i] = orig - STEP;
        let fm = loss(layer, &probe, &mut y, dy);
        probe.data_mut()[i] = orig;
        grad[i] = (fp - fm) / (2.0 * STEP);
    }
    grad
}

fn analytic_grad(layer: &mut GrnLayer<f64>, x: &Blob<f64>, dy: &[f64]) -> Vec<f64> {
    let mut bottom = x.clone();
    let mut y = Blob::default();
    layer.setup(&[&bottom], &mut [&mut y]).unwrap();
    layer.forward(&[&bottom], &mut [&mut y]).unwrap();
    y.set_diff(dy).unwrap();
    layer.backward(&[&y], &[true], &mut [&mut bottom]).unwrap();
    bottom.diff().to_vec()
}

fn check_close(analytic: &[f64], numerical: &[f64], tol: f64, name: &str) {
    assert_eq!(analytic.len(), numerical.len(), "{name}: length mismatch");
    for i in 0..analytic.len() {
        let abs_err = (analytic[i] - numerical[i]).abs();
        // Use absolute tolerance for near-zero values
        if abs_err < 1e-7 {
            continue;
        }
        let scale = numerical[i].abs().max(analytic[i].abs()).max(1e-7);
        let rel = abs_err / scale;
        assert!(
            rel < tol,
            "{name}[{i}]: analytic={:.9}, numerical={:.9}, rel_err={:.3e}",
            analytic[i],
            numerical[i],
            rel
        );
    }
}

fn run_check(shape: &[usize], bias: f64, backend: Backend, seed: u64) {
    let mut x = Blob::<f64>::zeros(shape);
    GaussianFiller::new(0.0, 1.0, seed).fill(&mut x);
    let mut top = Blob::<f64>::zeros(shape);
    UniformFiller::new(-1.0, 1.0, seed + 1).unwrap().fill(&mut top);
    let dy = top.data().to_vec();

    let mut layer = GrnLayer::new(GrnConfig::new(bias).with_backend(backend)).unwrap();
    let analytic = analytic_grad(&mut layer, &x, &dy);
    let numerical = numerical_grad(&mut layer, &x, &dy);
    check_close(
        &analytic,
        &numerical,
        1e-4,
        &format!("shape={shape:?} bias={bias} backend={backend}"),
    );
}

#[test]
fn test_gradient_unit_bias() {
    run_check(&[2, 3, 4, 5], 1.0, Backend::Cpu, 1);
}

#[test]
fn test_gradient_small_bias() {
    run_check(&[2, 4, 3, 3], 1e-3, Backend::Cpu, 2);
}

#[test]
fn test_gradient_zero_bias() {
    // Gaussian inputs are never an exact all-zero channel vector
    run_check(&[1, 5, 2, 3], 0.0, Backend::Cpu, 3);
}

#[test]
fn test_gradient_large_bias() {
    run_check(&[3, 2, 2, 2], 11.0, Backend::Cpu, 4);
}

#[test]
fn test_gradient_single_channel() {
    run_check(&[2, 1, 3, 3], 0.5, Backend::Cpu, 5);
}

#[test]
fn test_gradient_embeddings() {
    // (N, C) input: every sample is one spatial position
    run_check(&[4, 8], 0.1, Backend::Cpu, 6);
}

#[test]
fn test_gradient_parallel_backend() {
    run_check(&[4, 3, 3, 3], 1.0, Backend::Parallel, 7);
}

#[test]
fn test_gradient_matches_closed_form() {
    // x = [3, 4], bias 0, dy = [1, 1]  →  dx = [0.032, -0.024]
    let x = Blob::from_data(&[3.0, 4.0], &[1, 2, 1, 1]).unwrap();
    let mut layer = GrnLayer::new(GrnConfig::new(0.0)).unwrap();
    let analytic = analytic_grad(&mut layer, &x, &[1.0, 1.0]);
    let numerical = numerical_grad(&mut layer, &x, &[1.0, 1.0]);
    check_close(&analytic, &[0.032, -0.024], 1e-9, "closed form");
    check_close(&analytic, &numerical, 1e-5, "finite difference");
}
