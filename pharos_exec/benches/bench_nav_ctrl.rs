//! # Navigation Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use motion_if::Location;
use pharos_lib::navigate::{ctrl, NavParams};

fn nav_ctrl_benchmark(c: &mut Criterion) {
    let params = NavParams::default();

    let here = Location::new(30.2655183, -97.7690083);
    let targets: Vec<Location> = (0..64)
        .map(|i| {
            let ang = i as f64 * std::f64::consts::TAU / 64.0;
            here.offset_by(ang.cos() * (i as f64 + 1.0), ang.sin() * (i as f64 + 1.0))
        })
        .collect();

    c.bench_function("locate_target", |b| {
        b.iter(|| {
            for t in &targets {
                black_box(ctrl::locate_target(black_box(&here), 0.3, t));
            }
        })
    });

    c.bench_function("control_law", |b| {
        b.iter(|| {
            for t in &targets {
                let dir = ctrl::locate_target(&here, 0.3, t);
                let v = ctrl::calc_controlled_velocity(
                    &params,
                    dir.distance_m,
                    black_box(1.8),
                    dir.heading_error_rad,
                );
                black_box(ctrl::calc_controlled_heading(&params, v, dir.heading_error_rad));
            }
        })
    });
}

criterion_group!(benches, nav_ctrl_benchmark);
criterion_main!(benches);
