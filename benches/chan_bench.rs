use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rc_containers::{Chan, Channel, SyncChan};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn bench_local_round_trip(c: &mut Criterion) {
    c.bench_function("chan::local_send_recv_100k", |b| {
        let ch = Chan::new(64);
        b.iter(|| {
            let mut sum = 0u64;
            for i in 0..100_000u64 {
                let _ = ch.try_send(i);
                sum = sum.wrapping_add(ch.try_recv().unwrap_or(0));
            }
            black_box(sum)
        })
    });
}

fn bench_sync_uncontended(c: &mut Criterion) {
    c.bench_function("chan::sync_send_recv_100k_one_thread", |b| {
        let ch = SyncChan::new(64);
        b.iter(|| {
            let mut sum = 0u64;
            for i in 0..100_000u64 {
                let _ = ch.try_send(i);
                sum = sum.wrapping_add(ch.try_recv().unwrap_or(0));
            }
            black_box(sum)
        })
    });
}

fn bench_sync_producer_consumer(c: &mut Criterion) {
    c.bench_function("chan::sync_spsc_100k_cap_64", |b| {
        b.iter(|| {
            let ch = Arc::new(SyncChan::new(64));
            let tx = {
                let ch = Arc::clone(&ch);
                thread::spawn(move || {
                    for i in 0..100_000u64 {
                        if ch.send(i).is_err() {
                            break;
                        }
                    }
                    ch.close();
                })
            };
            let mut sum = 0u64;
            while let Some(v) = ch.recv() {
                sum = sum.wrapping_add(v);
            }
            let _ = tx.join();
            black_box(sum)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_local_round_trip,
              bench_sync_uncontended,
              bench_sync_producer_consumer
}
criterion_main!(benches);
