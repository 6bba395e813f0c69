//! Text path: per-algorithm isolation and bounded helper waits

mod common;

use common::{engine_with, engine_with_config};
use securehash_core::{AlgorithmDescriptor, EngineConfig, hashing};

#[tokio::test]
async fn text_in_process_digests_use_utf8_bytes() {
    let engine = engine_with(vec![]);
    let text = "grüße, 世界";

    let results = engine.hash_text(&["SHA-256", "CRC-32"], text).await;

    assert_eq!(
        results.digest("SHA-256").unwrap(),
        hashing::hash_bytes("sha256", text.as_bytes()).unwrap()
    );
    assert_eq!(
        results.digest("CRC-32").unwrap(),
        hashing::hash_bytes("crc32", text.as_bytes()).unwrap()
    );
}

#[tokio::test]
async fn text_failures_become_error_entries() {
    let engine = engine_with(vec![
        AlgorithmDescriptor::external("Ghost", "/nonexistent/bin/ghost-hash").unwrap(),
    ]);

    let results = engine.hash_text(&["Ghost", "MD5", "Unknown"], "hello").await;

    assert_eq!(results.len(), 3);
    assert_eq!(
        results.digest("MD5"),
        Some("5d41402abc4b2a76b9719d911017c592")
    );
    let ghost = results.get("Ghost").unwrap().to_string();
    assert!(ghost.starts_with("Error: "), "{ghost}");
    assert!(results.get("Unknown").unwrap().is_error());
}

#[cfg(unix)]
mod helpers {
    use super::*;
    use securehash_test_utils::FakeHelper;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn text_helper_gets_buffer_without_size_argument() {
        let helpers = FakeHelper::new().unwrap();
        let engine = engine_with(vec![
            helpers.byte_counter("Counter"),
            helpers.size_echo("Sized"),
        ]);

        let results = engine.hash_text(&["Counter", "Sized"], "abcdef").await;

        assert_eq!(results.digest("Counter"), Some("6"));
        assert_eq!(results.digest("Sized"), Some("size-"));
    }

    #[tokio::test]
    async fn text_helper_timeout_only_affects_that_algorithm() {
        let helpers = FakeHelper::new().unwrap();
        let config = EngineConfig {
            text_timeout_secs: 1,
            terminate_grace_ms: 200,
            ..EngineConfig::test()
        };
        let engine = engine_with_config(vec![helpers.sleeper("Sleepy")], config);

        let started = Instant::now();
        let results = engine.hash_text(&["Sleepy", "SHA-1"], "abc").await;

        assert!(started.elapsed() < Duration::from_secs(10));
        let entry = results.get("Sleepy").unwrap().to_string();
        assert!(entry.contains("timed out"), "{entry}");
        assert_eq!(
            results.digest("SHA-1"),
            Some("a9993e364706816aba3e25717850c26c9cd0d89d")
        );
        assert_eq!(engine.live_child_pid(), None);
    }

    #[tokio::test]
    async fn text_helper_failure_is_isolated() {
        let helpers = FakeHelper::new().unwrap();
        let engine = engine_with(vec![
            helpers.failing("Broken", 1),
            helpers.printing("Printer", "c0ffee"),
        ]);

        let results = engine
            .hash_text(&["Broken", "Printer", "SHA-256"], "payload")
            .await;

        assert!(results.get("Broken").unwrap().is_error());
        assert_eq!(results.digest("Printer"), Some("c0ffee"));
        assert!(results.digest("SHA-256").is_some());
    }
}
