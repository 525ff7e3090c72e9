//! Benchmark: GRN forward/backward, serial vs batch-parallel kernel.

use std::time::Instant;

use grn_core::filler::{Filler, GaussianFiller};
use grn_core::{Blob, Element};
use grn_nn::{Backend, GrnConfig, GrnLayer, Layer};

struct Timing {
    forward: f64,
    backward: f64,
}

fn bench(backend: Backend, shape: [usize; 4], iters: usize) -> Timing {
    let mut layer = GrnLayer::<f32>::new(GrnConfig::new(1e-6).with_backend(backend))
        .expect("valid config");
    let mut x = Blob::<f32>::zeros(&shape);
    GaussianFiller::new(0.0, 1.0, 17).fill(&mut x);
    let mut y = Blob::default();
    layer.setup(&[&x], &mut [&mut y]).expect("setup");
    y.fill_diff(1.0);

    // warmup
    layer.forward(&[&x], &mut [&mut y]).expect("forward");

    let start = Instant::now();
    for _ in 0..iters {
        layer.forward(&[&x], &mut [&mut y]).expect("forward");
    }
    let forward = start.elapsed().as_secs_f64() / iters as f64;

    let start = Instant::now();
    for _ in 0..iters {
        layer.backward(&[&y], &[true], &mut [&mut x]).expect("backward");
    }
    let backward = start.elapsed().as_secs_f64() / iters as f64;

    Timing { forward, backward }
}

fn gbps(shape: [usize; 4], passes: usize, secs: f64) -> f64 {
    let bytes = f32::DTYPE.storage_bytes(shape.iter().product()) * passes;
    bytes as f64 / secs / 1e9
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("=== GRN Benchmark ===");
    println!("rayon threads: {}\n", Backend::Parallel.threads());

    let shapes: &[[usize; 4]] = &[
        [1, 64, 56, 56],
        [8, 64, 56, 56],
        [8, 256, 28, 28],
        [32, 512, 14, 14],
        [64, 2048, 1, 1],
    ];

    println!(
        "{:<20} {:>11} {:>11} {:>11} {:>11} {:>9} {:>9}",
        "Shape", "Fwd (ms)", "Fwd par", "Bwd (ms)", "Bwd par", "Speedup", "Fwd GB/s"
    );
    println!("{}", "-".repeat(88));

    for &shape in shapes {
        let numel: usize = shape.iter().product();
        let iters = (50_000_000 / numel).clamp(3, 200);

        let serial = bench(Backend::Cpu, shape, iters);
        let parallel = bench(Backend::Parallel, shape, iters);
        let speedup = (serial.forward + serial.backward) / (parallel.forward + parallel.backward);

        println!(
            "{:<20} {:>11.3} {:>11.3} {:>11.3} {:>11.3} {:>8.2}x {:>9.2}",
            format!("{:?}", shape),
            serial.forward * 1e3,
            parallel.forward * 1e3,
            serial.backward * 1e3,
            parallel.backward * 1e3,
            speedup,
            // forward reads x and writes y, squares
            gbps(shape, 3, parallel.forward),
        );
    }
}
