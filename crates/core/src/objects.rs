//! Recorded-object features from JProfiler "Recorded Objects" CSV exports.

use std::collections::BTreeMap;
use std::io::Read;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ExtractorConfig;
use crate::dataset::Cell;
use crate::features::{UNDEFINED, ratio, round};
use crate::preprocess::normalize_class_name;

#[derive(Debug, Error)]
pub enum ObjectsError {
    #[error("invalid recorded-objects CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of a recorded-objects export. Other columns are ignored.
#[derive(Debug, Deserialize)]
struct RecordedObjectRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Instance Count")]
    instance_count: u64,
    #[serde(rename = "Size (bytes)", default)]
    size_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectCounts {
    pub instances: u64,
    pub size_bytes: u64,
}

/// Instance counts per class from one or more snapshots of the same kind
/// (all recorded objects, or only the garbage-collected ones).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSnapshot {
    classes: BTreeMap<String, ObjectCounts>,
}

impl ObjectSnapshot {
    /// Read one CSV export.
    ///
    /// Names are normalized before rows are summed: the `[ ]` array marker
    /// is stripped, classes matching an excluded pattern are dropped and
    /// anonymous classes fold into their outer class.
    pub fn from_csv_reader<R: Read>(
        reader: R,
        config: &ExtractorConfig,
    ) -> Result<Self, ObjectsError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut snapshot = Self::default();
        let mut dropped = 0usize;

        for row in rdr.deserialize::<RecordedObjectRow>() {
            let row = row?;
            // One `[ ]` marks an array of the class; `Foo[ ][ ]` stays `Foo[ ]`.
            let name = row.name.strip_suffix("[ ]").unwrap_or(row.name.as_str()).trim_end();
            if config.is_excluded(name) {
                dropped += 1;
                continue;
            }
            let name = if config.merge_anonymous_classes {
                normalize_class_name(name).into_owned()
            } else {
                name.to_string()
            };
            snapshot.add(
                name,
                ObjectCounts {
                    instances: row.instance_count,
                    size_bytes: row.size_bytes,
                },
            );
        }

        debug!(
            classes = snapshot.len(),
            dropped, "recorded-objects snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn from_csv(data: &[u8], config: &ExtractorConfig) -> Result<Self, ObjectsError> {
        Self::from_csv_reader(data, config)
    }

    pub fn add(&mut self, class_name: String, counts: ObjectCounts) {
        let entry = self.classes.entry(class_name).or_default();
        entry.instances += counts.instances;
        entry.size_bytes += counts.size_bytes;
    }

    /// Sum another snapshot into this one.
    pub fn merge(&mut self, other: ObjectSnapshot) {
        for (name, counts) in other.classes {
            self.add(name, counts);
        }
    }

    pub fn get(&self, class_name: &str) -> Option<ObjectCounts> {
        self.classes.get(class_name).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Allocation features of one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectFeatures {
    pub class_name: String,
    pub num_objects_total: u64,
    pub num_objects_deallocated: u64,
    pub perc_deallocated: f64,
    /// Average instance size in kB (1 kB = 1000 bytes).
    pub avg_object_size: f64,
}

impl ObjectFeatures {
    pub const COLUMNS: &'static [&'static str] = &[
        "numObjectsTotal",
        "numObjectsDeallocated",
        "percDeallocated",
        "avgObjectSize",
    ];

    pub fn new(class_name: impl Into<String>, all: ObjectCounts, gc: ObjectCounts) -> Self {
        let avg_object_size = if all.instances == 0 {
            UNDEFINED
        } else {
            round(all.size_bytes as f64 / (all.instances as f64 * 1000.0))
        };
        Self {
            class_name: class_name.into(),
            num_objects_total: all.instances,
            num_objects_deallocated: gc.instances,
            perc_deallocated: ratio(gc.instances, all.instances),
            avg_object_size,
        }
    }

    /// Fill for a class that was never instantiated while recording: the
    /// counts are genuinely zero, the deallocation share is undefined.
    pub fn absent(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            num_objects_total: 0,
            num_objects_deallocated: 0,
            perc_deallocated: UNDEFINED,
            avg_object_size: 0.0,
        }
    }

    pub fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Count(self.num_objects_total),
            Cell::Count(self.num_objects_deallocated),
            Cell::Value(self.perc_deallocated),
            Cell::Value(self.avg_object_size),
        ]
    }
}

/// Object features for every class of the "all objects" snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectTable {
    rows: BTreeMap<String, ObjectFeatures>,
}

impl ObjectTable {
    /// Classes come from `all`; classes missing from `gc` count zero
    /// deallocations.
    pub fn build(all: &ObjectSnapshot, gc: &ObjectSnapshot) -> Self {
        let rows = all
            .classes
            .iter()
            .map(|(name, counts)| {
                let freed = gc.get(name).unwrap_or_default();
                (name.clone(), ObjectFeatures::new(name.clone(), *counts, freed))
            })
            .collect();
        Self { rows }
    }

    pub fn get(&self, class_name: &str) -> Option<&ObjectFeatures> {
        self.rows.get(class_name)
    }

    pub fn rows(&self) -> impl Iterator<Item = &ObjectFeatures> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
