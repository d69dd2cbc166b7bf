use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::dataset::Cell;

/// Finalized call-tree features of one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFeatures {
    pub class_name: String,
    pub num_int_calls: u64,
    pub num_ext_calls: u64,
    pub ratio_internal_external: f64,
    pub num_incoming_calls: u64,
    pub num_outgoing_calls: u64,
    pub ratio_incoming_outgoing: f64,
    pub num_unique_incoming_calls: u64,
    pub num_unique_outgoing_calls: u64,
    pub incoming_calls_inside: u64,
    pub incoming_calls_outside: u64,
    pub outgoing_calls_inside: u64,
    pub outgoing_calls_outside: u64,
    pub num_objects_created: u64,
    pub perc_object_creation: f64,
    pub num_leaves: u64,
    pub perc_leaves: f64,
    pub num_data_structure_calls: u64,
    pub perc_data_structure_calls: f64,
    pub avg_exec_time: f64,
    pub avg_depth: f64,
}

impl ClassFeatures {
    /// Column names, in output order, excluding `className`.
    pub const COLUMNS: &'static [&'static str] = &[
        "numIntCalls",
        "numExtCalls",
        "ratioInternalExternal",
        "numIncomingCalls",
        "numOutgoingCalls",
        "ratioIncomingOutgoing",
        "numUniqueIncomingCalls",
        "numUniqueOutgoingCalls",
        "incomingCallsInside",
        "incomingCallsOutside",
        "outgoingCallsInside",
        "outgoingCallsOutside",
        "numObjectsCreated",
        "percObjectCreation",
        "numLeaves",
        "percLeaves",
        "numDataStructureCalls",
        "percDataStructureCalls",
        "avgExecTime",
        "avgDepth",
    ];

    /// Values matching [`Self::COLUMNS`].
    pub fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Count(self.num_int_calls),
            Cell::Count(self.num_ext_calls),
            Cell::Value(self.ratio_internal_external),
            Cell::Count(self.num_incoming_calls),
            Cell::Count(self.num_outgoing_calls),
            Cell::Value(self.ratio_incoming_outgoing),
            Cell::Count(self.num_unique_incoming_calls),
            Cell::Count(self.num_unique_outgoing_calls),
            Cell::Count(self.incoming_calls_inside),
            Cell::Count(self.incoming_calls_outside),
            Cell::Count(self.outgoing_calls_inside),
            Cell::Count(self.outgoing_calls_outside),
            Cell::Count(self.num_objects_created),
            Cell::Value(self.perc_object_creation),
            Cell::Count(self.num_leaves),
            Cell::Value(self.perc_leaves),
            Cell::Count(self.num_data_structure_calls),
            Cell::Value(self.perc_data_structure_calls),
            Cell::Value(self.avg_exec_time),
            Cell::Value(self.avg_depth),
        ]
    }
}

/// Feature rows ordered by class name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    rows: Vec<ClassFeatures>,
}

impl FeatureTable {
    pub fn new(mut rows: Vec<ClassFeatures>) -> Self {
        rows.sort_by(|a, b| a.class_name.cmp(&b.class_name));
        Self { rows }
    }

    pub fn rows(&self) -> &[ClassFeatures] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ClassFeatures> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, class_name: &str) -> Option<&ClassFeatures> {
        self.rows
            .binary_search_by(|row| row.class_name.as_str().cmp(class_name))
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Keep only the rows whose class is in `allowed`.
    ///
    /// Runs on finalized rows, so calls to and from dropped classes stay
    /// counted in the rows that remain.
    pub fn retain_classes<S: AsRef<str>>(&mut self, allowed: &[S]) {
        let allowed: HashSet<&str> = allowed.iter().map(S::as_ref).collect();
        self.rows
            .retain(|row| allowed.contains(row.class_name.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ClassAccumulator;

    fn table() -> FeatureTable {
        FeatureTable::new(vec![
            ClassAccumulator::default().finalize("b.B"),
            ClassAccumulator::default().finalize("a.A"),
            ClassAccumulator::default().finalize("c.C"),
        ])
    }

    #[test]
    fn rows_are_sorted() {
        let names: Vec<_> = table()
            .rows()
            .iter()
            .map(|r| r.class_name.clone())
            .collect();
        assert_eq!(names, vec!["a.A", "b.B", "c.C"]);
    }

    #[test]
    fn retain_drops_unlisted_rows() {
        let mut t = table();
        t.retain_classes(&["c.C", "a.A", "z.Missing"]);
        assert_eq!(t.len(), 2);
        assert!(t.get("b.B").is_none());
        assert!(t.get("c.C").is_some());
    }

    #[test]
    fn empty_allow_list_empties_table() {
        let mut t = table();
        t.retain_classes::<&str>(&[]);
        assert!(t.is_empty());
    }

    #[test]
    fn cells_match_columns() {
        let row = ClassAccumulator::default().finalize("a.A");
        assert_eq!(row.cells().len(), ClassFeatures::COLUMNS.len());
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let row = ClassAccumulator::default().finalize("a.A");
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["className"], "a.A");
        assert_eq!(json["ratioInternalExternal"], -1.0);
    }
}
