//! Algorithm registry: the immutable set of descriptors the engine resolves
//! names against
//!
//! The registry is built once (usually from an `algorithms.json` document)
//! and shared behind an `Arc`. Nothing mutates it after construction.

use crate::error::{DigestError, ValidationError};
use crate::{Error, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// How an algorithm is computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlgorithmKind {
    /// Streaming accumulator inside this process
    InProcess { digest_id: String },
    /// Helper program fed on stdin
    ExternalProcess {
        executable: PathBuf,
        args: Vec<String>,
    },
}

/// One registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlgorithmDescriptor {
    name: String,
    #[serde(flatten)]
    kind: AlgorithmKind,
}

impl AlgorithmDescriptor {
    /// Describe an in-process algorithm
    pub fn in_process(name: impl Into<String>, digest_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AlgorithmKind::InProcess {
                digest_id: digest_id.into(),
            },
        }
    }

    /// Describe a helper-backed algorithm; the executable path must not be empty
    pub fn external(name: impl Into<String>, executable: impl Into<PathBuf>) -> Result<Self> {
        let name = name.into();
        let executable = executable.into();
        if executable.as_os_str().is_empty() {
            return Err(ValidationError::invalid_descriptor(&name, "empty executable path").into());
        }
        Ok(Self {
            name,
            kind: AlgorithmKind::ExternalProcess {
                executable,
                args: Vec::new(),
            },
        })
    }

    /// Leading arguments passed to the helper before the size argument
    pub fn with_args<I, S>(mut self, new_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let AlgorithmKind::ExternalProcess { args, .. } = &mut self.kind {
            *args = new_args.into_iter().map(Into::into).collect();
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AlgorithmKind {
        &self.kind
    }

    pub fn is_in_process(&self) -> bool {
        matches!(self.kind, AlgorithmKind::InProcess { .. })
    }
}

/// On-disk registry document
#[derive(Debug, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    algorithms: Vec<AlgorithmRecord>,
}

#[derive(Debug, Deserialize)]
struct AlgorithmRecord {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    hashlib_name: Option<String>,
    executable: Option<String>,
    #[serde(default)]
    args: Vec<String>,
}

impl AlgorithmRecord {
    fn into_descriptor(self, binaries_dir: &Path) -> Result<AlgorithmDescriptor> {
        match self.kind.as_str() {
            "hashlib" => {
                let digest_id = self
                    .hashlib_name
                    .filter(|id| !id.trim().is_empty())
                    .ok_or_else(|| ValidationError::missing_field("hashlib_name"))?;
                Ok(AlgorithmDescriptor::in_process(self.name, digest_id))
            }
            "executable" => {
                let executable = self
                    .executable
                    .filter(|exe| !exe.trim().is_empty())
                    .ok_or_else(|| ValidationError::missing_field("executable"))?;
                Ok(
                    AlgorithmDescriptor::external(self.name, binaries_dir.join(executable))?
                        .with_args(self.args),
                )
            }
            other => Err(ValidationError::invalid_descriptor(
                &self.name,
                &format!("unknown type '{other}'"),
            )
            .into()),
        }
    }
}

/// Immutable registry of algorithm descriptors, in declaration order
#[derive(Debug, Clone)]
pub struct AlgorithmRegistry {
    descriptors: Vec<AlgorithmDescriptor>,
    index: HashMap<String, usize>,
}

impl AlgorithmRegistry {
    /// Build a registry, rejecting duplicate names
    pub fn new(descriptors: Vec<AlgorithmDescriptor>) -> Result<Self> {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (position, descriptor) in descriptors.iter().enumerate() {
            if index.insert(descriptor.name.clone(), position).is_some() {
                return Err(ValidationError::duplicate_name(&descriptor.name).into());
            }
        }
        Ok(Self { descriptors, index })
    }

    /// The fixed set used when no usable registry document exists
    pub fn fallback() -> Self {
        let descriptors = vec![
            AlgorithmDescriptor::in_process("SHA-256", "sha256"),
            AlgorithmDescriptor::in_process("SHA-384", "sha384"),
            AlgorithmDescriptor::in_process("SHA-512", "sha512"),
        ];
        let index = descriptors
            .iter()
            .enumerate()
            .map(|(position, d)| (d.name.clone(), position))
            .collect();
        Self { descriptors, index }
    }

    /// Strictly parse a registry document; any invalid record is an error
    pub fn parse(json: &str, binaries_dir: &Path) -> Result<Self> {
        let document: RegistryDocument = serde_json::from_str(json).map_err(|e| {
            Error::Validation(ValidationError::invalid_configuration(&format!(
                "registry is not valid JSON: {e}"
            )))
        })?;

        let descriptors = document
            .algorithms
            .into_iter()
            .map(|record| record.into_descriptor(binaries_dir))
            .collect::<Result<Vec<_>>>()?;

        Self::new(descriptors)
    }

    /// Load a registry document leniently
    ///
    /// Invalid records are skipped with a warning. A missing or unreadable
    /// file, malformed JSON, or a document with no usable record yields
    /// [`AlgorithmRegistry::fallback`].
    pub fn load(path: &Path, binaries_dir: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                warn!(
                    "Could not read algorithm registry {}: {e}; using default algorithms",
                    path.display()
                );
                return Self::fallback();
            }
        };

        let document: RegistryDocument = match serde_json::from_str(&json) {
            Ok(document) => document,
            Err(e) => {
                warn!(
                    "Invalid JSON in algorithm registry {}: {e}; using default algorithms",
                    path.display()
                );
                return Self::fallback();
            }
        };

        let mut descriptors: Vec<AlgorithmDescriptor> = Vec::new();
        for record in document.algorithms {
            let name = record.name.clone();
            match record.into_descriptor(binaries_dir) {
                Ok(descriptor) if descriptors.iter().any(|d| d.name == descriptor.name) => {
                    warn!("Skipping duplicate algorithm '{name}' in registry");
                }
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) => warn!("Skipping algorithm '{name}': {e}"),
            }
        }

        if descriptors.is_empty() {
            warn!(
                "Algorithm registry {} has no usable entries; using default algorithms",
                path.display()
            );
            return Self::fallback();
        }

        debug!(
            "Loaded {} algorithms from {}",
            descriptors.len(),
            path.display()
        );
        // Names were deduplicated above
        Self::new(descriptors).unwrap_or_else(|_| Self::fallback())
    }

    /// Get a descriptor by name
    pub fn get(&self, name: &str) -> Option<&AlgorithmDescriptor> {
        self.index.get(name).map(|&position| &self.descriptors[position])
    }

    /// Get a descriptor by name or fail with `UnknownAlgorithm`
    pub fn resolve(&self, name: &str) -> Result<&AlgorithmDescriptor> {
        self.get(name)
            .ok_or_else(|| DigestError::unknown_algorithm(name).into())
    }

    /// All algorithm names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlgorithmDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::fallback()
    }
}
