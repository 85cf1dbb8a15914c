use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use boundbuf::{BoundedBuffer, PutOutcome, TakeOutcome};

fn main() {
    divan::main();
}

#[global_allocator]
static ALLOC: divan::AllocProfiler = divan::AllocProfiler::system();

const ITEMS: u64 = 10_000;

#[divan::bench(args = [1, 8, 64, 1024])]
fn bench_put_take_single_thread(bencher: divan::Bencher, capacity: usize) {
    let buffer = BoundedBuffer::new(capacity).unwrap();
    bencher.bench_local(move || {
        for value in 0..ITEMS {
            let _ = black_box(buffer.put(value));
            black_box(buffer.take());
        }
    });
}

#[divan::bench(
    args = [(1, 1), (1, 64), (4, 64), (8, 1024)]
)]
fn bench_handoff(bencher: divan::Bencher, (consumers, capacity): (usize, usize)) {
    bencher
        .with_inputs(|| Arc::new(BoundedBuffer::new(capacity).unwrap()))
        .bench_values(|buffer| {
            let handles: Vec<_> = (0..consumers)
                .map(|_| {
                    let buffer = buffer.clone();
                    thread::spawn(move || {
                        let mut taken = 0u64;
                        while let TakeOutcome::Taken { value, .. } = buffer.take() {
                            taken += black_box(value) & 1;
                        }
                        taken
                    })
                })
                .collect();

            for value in 0..ITEMS {
                if let PutOutcome::Rejected(_) = buffer.put(value) {
                    break;
                }
            }
            buffer.trigger_shutdown();

            for handle in handles {
                black_box(handle.join().unwrap());
            }
        });
}
