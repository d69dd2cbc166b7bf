//! Ground-truth class-role labels.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LabelsError {
    #[error("invalid labels CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("labels CSV has no `{0}` column")]
    MissingColumn(&'static str),
}

/// Convert a source path (`\src\com\acme\Outer.Inner.java`) to the profiler's
/// class notation (`com.acme.Outer$Inner`).
pub fn convert_source_path(path: &str) -> String {
    let path = path.trim();
    let path = path.strip_suffix(".java").unwrap_or(path);
    let path = path.trim_start_matches(['\\', '/']);
    let path = path
        .strip_prefix("src")
        .and_then(|rest| rest.strip_prefix(['\\', '/']))
        .unwrap_or(path);
    path.replace('.', "$").replace(['\\', '/'], ".")
}

/// Class name to role label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    labels: BTreeMap<String, String>,
}

impl Labels {
    /// Parse a label CSV.
    ///
    /// Needs a `label` column and either `className` (profiler notation) or
    /// `fullpathname` (source paths, converted with [`convert_source_path`]).
    /// The delimiter is `;` when the header has no `,`.
    pub fn from_csv(data: &[u8]) -> Result<Self, LabelsError> {
        let header = data.split(|b| *b == b'\n').next().unwrap_or_default();
        let delimiter = if !header.contains(&b',') && header.contains(&b';') {
            b';'
        } else {
            b','
        };

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(data);
        let headers = rdr.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h == name);

        let label_idx = column("label").ok_or(LabelsError::MissingColumn("label"))?;
        let (name_idx, convert) = match (column("className"), column("fullpathname")) {
            (Some(idx), _) => (idx, false),
            (None, Some(idx)) => (idx, true),
            (None, None) => return Err(LabelsError::MissingColumn("className")),
        };

        let mut labels = Self::default();
        for record in rdr.records() {
            let record = record?;
            let (Some(raw_name), Some(label)) = (record.get(name_idx), record.get(label_idx))
            else {
                continue;
            };
            if raw_name.is_empty() || label.is_empty() {
                continue;
            }
            let class_name = if convert {
                convert_source_path(raw_name)
            } else {
                raw_name.to_string()
            };
            labels.insert(class_name, label.to_string());
        }

        debug!(classes = labels.len(), "labels loaded");
        Ok(labels)
    }

    pub fn insert(&mut self, class_name: String, label: String) {
        if let Some(previous) = self.labels.get(&class_name)
            && *previous != label
        {
            warn!(class = %class_name, %previous, %label, "conflicting labels, keeping the last");
        }
        self.labels.insert(class_name, label);
    }

    pub fn get(&self, class_name: &str) -> Option<&str> {
        self.labels.get(class_name).map(String::as_str)
    }

    /// The labelled classes; used as the allow-list of a dataset.
    pub fn class_names(&self) -> Vec<&str> {
        self.labels.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
