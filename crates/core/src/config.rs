use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Knobs for one extraction run. Every field has a default, so a config file
/// only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Package prefixes of the analysed project. Empty means every class
    /// counts as in-project.
    pub project_packages: Vec<String>,
    /// Method-name fragments that mark an object creation.
    pub constructor_markers: Vec<String>,
    /// Built-in collection types counted as data-structure interactions.
    pub collection_types: Vec<String>,
    /// Fold `Outer$1` style anonymous classes into `Outer` before extracting.
    pub merge_anonymous_classes: bool,
    /// Class-name fragments dropped from recorded-object tables.
    pub excluded_class_patterns: Vec<String>,
}

const DEFAULT_COLLECTION_TYPES: &[&str] = &[
    "java.util.ArrayList",
    "java.util.LinkedList",
    "java.util.Vector",
    "java.util.Stack",
    "java.util.ArrayDeque",
    "java.util.PriorityQueue",
    "java.util.HashMap",
    "java.util.LinkedHashMap",
    "java.util.TreeMap",
    "java.util.Hashtable",
    "java.util.WeakHashMap",
    "java.util.IdentityHashMap",
    "java.util.EnumMap",
    "java.util.HashSet",
    "java.util.LinkedHashSet",
    "java.util.TreeSet",
    "java.util.EnumSet",
    "java.util.BitSet",
    "java.util.Arrays",
    "java.util.Collections",
    "java.util.concurrent.ConcurrentHashMap",
    "java.util.concurrent.CopyOnWriteArrayList",
    "java.util.concurrent.ConcurrentLinkedQueue",
    "java.util.concurrent.LinkedBlockingQueue",
    "java.util.concurrent.ArrayBlockingQueue",
];

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            project_packages: Vec::new(),
            constructor_markers: vec!["<init>".to_string(), "<clinit>".to_string()],
            collection_types: DEFAULT_COLLECTION_TYPES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            merge_anonymous_classes: true,
            excluded_class_patterns: vec!["Test".to_string()],
        }
    }
}

impl ExtractorConfig {
    /// Load a JSON config file; absent fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_slice(&data).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn is_project_class(&self, class_name: &str) -> bool {
        self.project_packages.is_empty()
            || self
                .project_packages
                .iter()
                .any(|pkg| class_name.starts_with(pkg.as_str()))
    }

    pub fn is_constructor(&self, method_name: &str) -> bool {
        self.constructor_markers
            .iter()
            .any(|marker| method_name.contains(marker.as_str()))
    }

    /// Exact match, or an inner class of a collection type (`HashMap$Node`).
    pub fn is_collection_type(&self, class_name: &str) -> bool {
        self.collection_types.iter().any(|ty| {
            class_name == ty.as_str()
                || class_name
                    .strip_prefix(ty.as_str())
                    .is_some_and(|rest| rest.starts_with('$'))
        })
    }

    pub fn is_excluded(&self, class_name: &str) -> bool {
        self.excluded_class_patterns
            .iter()
            .any(|pattern| class_name.contains(pattern.as_str()))
    }
}
