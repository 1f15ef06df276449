//! Option ledger costs:
//! - capture of a `setsockopt` entry
//! - full replay of a small ledger onto a live socket

use std::cell::RefCell;
use std::ffi::c_int;
use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use handoff_bench::{BenchSocket, BenchStats, level_label};
use handoff_core::sockopts::{FIOASYNC, SockOpts};

fn bench_capture(c: &mut Criterion) {
    let one = 1 as c_int;
    let stats = RefCell::new(BenchStats::default());
    let mut group = c.benchmark_group("sockopts_hotpath");
    group.throughput(Throughput::Elements(1));
    group.bench_function(BenchmarkId::new("capture_option", level_label()), |b| {
        b.iter_custom(|iters| {
            let mut opts = SockOpts::new();
            let start = Instant::now();
            for _ in 0..iters {
                opts.capture_option(libc::SOL_SOCKET, libc::SO_REUSEADDR, &one.to_ne_bytes());
            }
            let dur = start.elapsed().max(Duration::from_nanos(1));
            black_box(opts.len());
            stats.borrow_mut().record(iters, dur);
            dur
        });
    });
    group.finish();
    stats.borrow().report("SOCKOPTS_BENCH", "capture_option");
}

fn bench_replay(c: &mut Criterion) {
    let (Some(old), Some(new)) = (BenchSocket::tcp(), BenchSocket::tcp()) else {
        return;
    };
    let one = (1 as c_int).to_ne_bytes();
    let off = (0 as c_int).to_ne_bytes();

    let stats = RefCell::new(BenchStats::default());
    let mut group = c.benchmark_group("sockopts_hotpath");
    group.throughput(Throughput::Elements(1));
    group.bench_function(BenchmarkId::new("replay_three_entries", level_label()), |b| {
        b.iter_custom(|iters| {
            let mut total = Duration::ZERO;
            for _ in 0..iters {
                let mut opts = SockOpts::new();
                opts.capture_option(libc::SOL_SOCKET, libc::SO_REUSEADDR, &one);
                opts.capture_option(libc::SOL_SOCKET, libc::SO_KEEPALIVE, &one);
                opts.capture_ioctl(FIOASYNC, &off);

                let start = Instant::now();
                black_box(opts.replay_host(old.0, new.0).is_ok());
                total += start.elapsed();
            }
            let dur = total.max(Duration::from_nanos(1));
            stats.borrow_mut().record(iters, dur);
            dur
        });
    });
    group.finish();
    stats.borrow().report("SOCKOPTS_BENCH", "replay_three_entries");
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(1))
        .measurement_time(Duration::from_secs(2))
        .sample_size(60);
    targets = bench_capture, bench_replay
);
criterion_main!(benches);
