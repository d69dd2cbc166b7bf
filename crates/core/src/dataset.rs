//! Assembly of the final per-class dataset from the individual feature tables.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, warn};

use crate::features::{ClassFeatures, FeatureTable};
use crate::labels::Labels;
use crate::objects::{ObjectFeatures, ObjectTable};

/// One value of a dataset row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Count(u64),
    Value(f64),
}

impl Cell {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cell::Text(s) => serde_json::Value::from(s.as_str()),
            Cell::Count(n) => serde_json::Value::from(*n),
            Cell::Value(v) => serde_json::Value::from(*v),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Count(n) => write!(f, "{n}"),
            Cell::Value(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub calls: ClassFeatures,
    pub objects: Option<ObjectFeatures>,
    pub label: Option<String>,
}

impl DatasetRow {
    pub fn class_name(&self) -> &str {
        &self.calls.class_name
    }
}

/// Call-tree features, optionally joined with object features and labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
    has_objects: bool,
    has_labels: bool,
}

impl Dataset {
    pub fn new(table: FeatureTable) -> Self {
        Self {
            rows: table
                .into_rows()
                .into_iter()
                .map(|calls| DatasetRow {
                    calls,
                    objects: None,
                    label: None,
                })
                .collect(),
            has_objects: false,
            has_labels: false,
        }
    }

    /// Left join on the call-tree classes. Classes never instantiated while
    /// recording get [`ObjectFeatures::absent`].
    pub fn with_objects(mut self, objects: &ObjectTable) -> Self {
        let mut filled = 0usize;
        for row in &mut self.rows {
            let features = match objects.get(row.class_name()) {
                Some(features) => features.clone(),
                None => {
                    filled += 1;
                    ObjectFeatures::absent(row.class_name())
                }
            };
            row.objects = Some(features);
        }
        debug!(
            rows = self.rows.len(),
            filled, "joined recorded-object features"
        );
        self.has_objects = true;
        self
    }

    /// Inner join: rows without a label are dropped.
    pub fn with_labels(mut self, labels: &Labels) -> Self {
        let present: HashSet<&str> = self.rows.iter().map(DatasetRow::class_name).collect();
        let missing: Vec<&str> = labels
            .class_names()
            .into_iter()
            .filter(|name| !present.contains(name))
            .collect();
        if !missing.is_empty() {
            warn!(
                missing = missing.len(),
                labelled = labels.len(),
                "labelled classes absent from the call tree"
            );
            debug!(classes = ?missing, "absent labelled classes");
        }

        self.rows.retain_mut(|row| match labels.get(row.class_name()) {
            Some(label) => {
                row.label = Some(label.to_string());
                true
            }
            None => false,
        });
        self.has_labels = true;
        self
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = vec!["className"];
        columns.extend_from_slice(ClassFeatures::COLUMNS);
        if self.has_objects {
            columns.extend_from_slice(ObjectFeatures::COLUMNS);
        }
        if self.has_labels {
            columns.push("label");
        }
        columns
    }

    /// Rows as cells, in [`Self::columns`] order.
    pub fn records(&self) -> impl Iterator<Item = Vec<Cell>> + '_ {
        self.rows.iter().map(|row| {
            let mut cells = vec![Cell::Text(row.calls.class_name.clone())];
            cells.extend(row.calls.cells());
            if self.has_objects {
                match &row.objects {
                    Some(objects) => cells.extend(objects.cells()),
                    None => cells.extend(ObjectFeatures::absent(row.class_name()).cells()),
                }
            }
            if self.has_labels {
                cells.push(Cell::Text(row.label.clone().unwrap_or_default()));
            }
            cells
        })
    }
}
