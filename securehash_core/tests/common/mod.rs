//! Common test utilities for integration tests

#![allow(dead_code)]

use securehash_core::{AlgorithmDescriptor, AlgorithmRegistry, EngineConfig, HashEngine};
use std::sync::Arc;
use std::time::Duration;

/// In-process descriptors every test engine carries
pub fn standard_descriptors() -> Vec<AlgorithmDescriptor> {
    vec![
        AlgorithmDescriptor::in_process("CRC-32", "crc32"),
        AlgorithmDescriptor::in_process("MD5", "md5"),
        AlgorithmDescriptor::in_process("SHA-1", "sha1"),
        AlgorithmDescriptor::in_process("SHA-256", "sha256"),
        AlgorithmDescriptor::in_process("SHA-512", "sha512"),
    ]
}

/// Engine over the standard descriptors plus `extra`
pub fn engine_with(extra: Vec<AlgorithmDescriptor>) -> Arc<HashEngine> {
    engine_with_config(extra, EngineConfig::test())
}

pub fn engine_with_config(extra: Vec<AlgorithmDescriptor>, config: EngineConfig) -> Arc<HashEngine> {
    let mut descriptors = standard_descriptors();
    descriptors.extend(extra);
    let registry = AlgorithmRegistry::new(descriptors).expect("unique names");
    Arc::new(HashEngine::new(Arc::new(registry), config).expect("valid config"))
}

/// Poll until the engine has a live helper, returning its PID
pub async fn wait_for_child(engine: &HashEngine) -> u32 {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(pid) = engine.live_child_pid() {
            return pid;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "helper never started"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
