//! Cancellation of in-flight hashing
#![cfg(unix)]

mod common;

use common::{engine_with, engine_with_config, wait_for_child};
use securehash_core::{
    BatchCoordinator, CallbackProvider, EngineConfig, NullProvider, Outcome, ProgressUpdate,
};
use securehash_test_utils::{FakeHelper, TestFileBuilder, pid_alive};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn cancel_during_in_process_pass_yields_no_result() {
    let mut files = TestFileBuilder::new().unwrap();
    let path = files.generate_test_file("big.bin", 512 * 1024).unwrap();
    let engine = engine_with(vec![]);

    // Cancel from inside the first progress report
    let token = engine.cancel_token();
    let provider = CallbackProvider::new(move |update| {
        if matches!(update, ProgressUpdate::Hash { .. }) {
            token.cancel();
        }
    });

    let outcome = engine
        .hash_file(&path, &["SHA-256", "MD5"], &provider)
        .await
        .unwrap();
    assert!(outcome.is_cancelled());
}

#[tokio::test]
async fn cancel_while_helper_blocks_on_input() {
    let helpers = FakeHelper::new().unwrap();
    let engine = engine_with(vec![helpers.sleeper("Sleepy")]);
    let mut files = TestFileBuilder::new().unwrap();
    // Larger than any pipe buffer so the write loop blocks
    let path = files.generate_test_file("big.bin", 4 * 1024 * 1024).unwrap();

    let task = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.hash_file(&path, &["Sleepy"], &NullProvider).await })
    };

    let pid = wait_for_child(&engine).await;
    assert!(pid_alive(pid));

    let started = Instant::now();
    assert!(engine.cancel().await, "helper should be gone");
    assert!(started.elapsed() < Duration::from_secs(5));

    let outcome = task.await.unwrap().unwrap();
    assert!(outcome.is_cancelled());
    assert_eq!(engine.live_child_pid(), None);
    assert!(!pid_alive(pid), "helper {pid} leaked");
}

#[tokio::test]
async fn helper_ignoring_sigterm_is_killed() {
    let helpers = FakeHelper::new().unwrap();
    let config = EngineConfig {
        terminate_grace_ms: 200,
        ..EngineConfig::test()
    };
    let engine = engine_with_config(vec![helpers.stubborn("Stubborn")], config);
    let mut files = TestFileBuilder::new().unwrap();
    let path = files.generate_test_file("big.bin", 4 * 1024 * 1024).unwrap();

    let task = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.hash_file(&path, &["Stubborn"], &NullProvider).await })
    };

    let pid = wait_for_child(&engine).await;
    assert!(engine.cancel().await);

    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome.map(|_| ()), Outcome::Cancelled);
    assert!(!pid_alive(pid), "helper {pid} survived");
}

#[tokio::test]
async fn cancel_skips_remaining_helpers() {
    let helpers = FakeHelper::new().unwrap();
    let engine = engine_with(vec![
        helpers.sleeper("First"),
        helpers.printing("Second", "00"),
    ]);
    let mut files = TestFileBuilder::new().unwrap();
    let path = files.generate_test_file("input.bin", 16).unwrap();

    let task = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .hash_file(&path, &["SHA-256", "First", "Second"], &NullProvider)
                .await
        })
    };

    wait_for_child(&engine).await;
    engine.cancel().await;

    assert!(task.await.unwrap().unwrap().is_cancelled());
    assert_eq!(engine.live_child_pid(), None);
}

#[tokio::test]
async fn batch_cancel_marks_remaining_files() {
    let helpers = FakeHelper::new().unwrap();
    let engine = engine_with(vec![helpers.sleeper("Sleepy")]);
    let mut files = TestFileBuilder::new().unwrap();
    let inputs = vec![
        files.generate_test_file("a.bin", 16).unwrap(),
        files.generate_test_file("b.bin", 16).unwrap(),
        files.generate_test_file("c.bin", 16).unwrap(),
    ];

    let mut handle = BatchCoordinator::new(Arc::clone(&engine)).spawn(
        inputs,
        vec!["Sleepy".to_string()],
        Arc::new(NullProvider),
    );

    wait_for_child(&engine).await;
    assert!(handle.cancel().await);

    let mut cancelled = 0;
    while let Some(result) = handle.next().await {
        assert!(matches!(result.outcome, Ok(Outcome::Cancelled)));
        cancelled += 1;
    }
    assert_eq!(cancelled, 3);

    let summary = handle.join().await.unwrap();
    assert_eq!(summary.cancelled, 3);
    assert_eq!(summary.completed, 0);
}

#[tokio::test]
async fn engine_is_reusable_after_reset() {
    let helpers = FakeHelper::new().unwrap();
    let engine = engine_with(vec![helpers.printing("Printer", "beef")]);
    let mut files = TestFileBuilder::new().unwrap();
    let path = files.generate_test_file("input.bin", 16).unwrap();

    engine.cancel().await;
    assert!(
        engine
            .hash_file(&path, &["Printer"], &NullProvider)
            .await
            .unwrap()
            .is_cancelled()
    );

    engine.reset_cancellation();
    let result = engine
        .hash_file(&path, &["Printer"], &NullProvider)
        .await
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(result.digests.digest("Printer"), Some("beef"));
}
