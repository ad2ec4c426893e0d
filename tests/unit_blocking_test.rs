// tests/unit_blocking_test.rs
//
// Direct tests of the bounded blocking-work pool (§5): it runs a closure
// and returns its result, and it caps concurrently *running* closures at
// the configured `n_threads` rather than letting a burst run unbounded.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cerver::core::blocking::BlockingPool;

#[tokio::test]
async fn runs_closure_and_returns_result() {
    let pool = BlockingPool::new(2);
    let out = pool.run(|| 2 + 2).await.unwrap();
    assert_eq!(out, 4);
}

#[tokio::test]
async fn bounds_concurrent_execution_to_n_threads() {
    let pool = Arc::new(BlockingPool::new(1));
    let concurrent = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pool = pool.clone();
        let concurrent = concurrent.clone();
        let max_seen = max_seen.clone();
        handles.push(tokio::spawn(async move {
            pool.run(move || {
                let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(20));
                concurrent.fetch_sub(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
}
