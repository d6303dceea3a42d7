use std::sync::Arc;

use bencher::{benchmark_group, benchmark_main, Bencher};
use rxreplay::prelude::*;

fn fan_out_inline(b: &mut Bencher) {
  let source = Observable::<u64, ()>::create();
  for _ in 0..16 {
    source.subscribe_fn(|v: u64| {
      bencher::black_box(v);
    });
  }
  let mut n = 0;
  b.iter(|| {
    n += 1;
    source.send_new_value(n);
  });
}

fn replay_history(b: &mut Bencher) {
  let source = Observable::<u64, ()>::create();
  (0..1024).for_each(|v| source.send_new_value(v));
  let sink = Arc::new(FnObserver::new(|v: u64| {
    bencher::black_box(v);
  }));
  b.iter(|| source.subscribe(sink.clone()).dispose());
}

benchmark_group!(benches, fan_out_inline, replay_history);
benchmark_main!(benches);
