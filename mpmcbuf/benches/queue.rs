use std::hint::black_box;
use std::sync::Arc;

use mpmcbuf::Queue;

fn main() {
    divan::main();
}

#[global_allocator]
static ALLOC: divan::AllocProfiler = divan::AllocProfiler::system();

#[derive(Clone, Copy, Default)]
#[allow(dead_code)]
struct Payload([u64; 14]);

#[divan::bench(threads = [1, 2, 4, 8], args = [1024, 1 << 16])]
fn bench_push_pop(bencher: divan::Bencher, capacity: usize) {
    let queue = Arc::new(Queue::<Payload>::with_capacity(capacity).unwrap());
    bencher.bench(|| {
        for _ in 0..1000 {
            let _ = queue.push(black_box(Payload::default()));
            black_box(queue.pop());
        }
    });
}

#[divan::bench(args = [1024])]
fn bench_push_until_full(bencher: divan::Bencher, capacity: usize) {
    bencher
        .with_inputs(|| Queue::<Payload>::with_capacity(capacity).unwrap())
        .bench_local_values(|queue| {
            while queue.push(black_box(Payload::default())).is_ok() {}
            queue
        });
}

#[divan::bench(args = [1024])]
fn bench_drain(bencher: divan::Bencher, capacity: usize) {
    bencher
        .with_inputs(|| {
            let queue = Queue::<Payload>::with_capacity(capacity).unwrap();
            while queue.push(Payload::default()).is_ok() {}
            queue
        })
        .bench_local_values(|queue| queue.drain().count());
}
