use std::collections::{BTreeMap, BTreeSet};

use super::table::{ClassFeatures, FeatureTable};
use super::{UNDEFINED, ratio, round};

/// Running totals for one class, filled while walking the call tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassAccumulator {
    /// Calls from the class to itself.
    pub num_int_calls: u64,
    /// Calls from the class to any other class.
    pub num_ext_calls: u64,
    pub outgoing_calls_inside: u64,
    pub outgoing_calls_outside: u64,
    pub num_incoming_calls: u64,
    pub incoming_calls_inside: u64,
    pub incoming_calls_outside: u64,
    pub unique_callees: BTreeSet<String>,
    pub unique_callers: BTreeSet<String>,
    pub num_leaves: u64,
    pub total_self_time: u64,
    /// Sum of `count * depth` over the class's own nodes.
    pub total_depth: u64,
    /// Sum of the class's own invocation counts; denominator of the averages.
    pub invocations: u64,
    pub num_objects_created: u64,
    pub num_data_structure_calls: u64,
}

impl ClassAccumulator {
    pub fn num_outgoing_calls(&self) -> u64 {
        self.num_int_calls + self.num_ext_calls
    }

    fn average(&self, total: u64) -> f64 {
        if self.invocations == 0 {
            UNDEFINED
        } else {
            round(total as f64 / self.invocations as f64)
        }
    }

    pub fn finalize(&self, class_name: &str) -> ClassFeatures {
        let outgoing = self.num_outgoing_calls();
        ClassFeatures {
            class_name: class_name.to_string(),
            num_int_calls: self.num_int_calls,
            num_ext_calls: self.num_ext_calls,
            ratio_internal_external: ratio(self.num_int_calls, self.num_ext_calls),
            num_incoming_calls: self.num_incoming_calls,
            num_outgoing_calls: outgoing,
            ratio_incoming_outgoing: ratio(self.num_incoming_calls, outgoing),
            num_unique_incoming_calls: self.unique_callers.len() as u64,
            num_unique_outgoing_calls: self.unique_callees.len() as u64,
            incoming_calls_inside: self.incoming_calls_inside,
            incoming_calls_outside: self.incoming_calls_outside,
            outgoing_calls_inside: self.outgoing_calls_inside,
            outgoing_calls_outside: self.outgoing_calls_outside,
            num_objects_created: self.num_objects_created,
            perc_object_creation: ratio(self.num_objects_created, outgoing),
            num_leaves: self.num_leaves,
            perc_leaves: ratio(self.num_leaves, self.invocations),
            num_data_structure_calls: self.num_data_structure_calls,
            perc_data_structure_calls: ratio(self.num_data_structure_calls, outgoing),
            avg_exec_time: self.average(self.total_self_time),
            avg_depth: self.average(self.total_depth),
        }
    }
}

/// The per-class accumulators of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulation {
    classes: BTreeMap<String, ClassAccumulator>,
}

impl Accumulation {
    /// One zeroed accumulator per class name.
    pub fn with_classes<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            classes: names
                .into_iter()
                .map(|name| (name.to_string(), ClassAccumulator::default()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn get(&self, class_name: &str) -> Option<&ClassAccumulator> {
        self.classes.get(class_name)
    }

    /// Accumulator for `class_name`, created on first use.
    pub fn entry(&mut self, class_name: &str) -> &mut ClassAccumulator {
        self.classes.entry(class_name.to_string()).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClassAccumulator)> {
        self.classes.iter().map(|(name, acc)| (name.as_str(), acc))
    }

    /// Derive the feature rows. Pure: the accumulation is left untouched, so
    /// finalizing twice gives identical tables.
    pub fn finalize(&self) -> FeatureTable {
        FeatureTable::new(
            self.classes
                .iter()
                .map(|(name, acc)| acc.finalize(name))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outgoing_is_internal_plus_external() {
        let acc = ClassAccumulator {
            num_int_calls: 4,
            num_ext_calls: 6,
            ..Default::default()
        };
        let row = acc.finalize("a.A");
        assert_eq!(row.num_outgoing_calls, 10);
        assert_eq!(row.ratio_internal_external, 0.667);
    }

    #[test]
    fn zeroed_accumulator_yields_sentinels() {
        let row = ClassAccumulator::default().finalize("a.Ghost");
        assert_eq!(row.num_outgoing_calls, 0);
        assert_eq!(row.ratio_internal_external, UNDEFINED);
        assert_eq!(row.ratio_incoming_outgoing, UNDEFINED);
        assert_eq!(row.perc_object_creation, UNDEFINED);
        assert_eq!(row.perc_leaves, UNDEFINED);
        assert_eq!(row.perc_data_structure_calls, UNDEFINED);
        assert_eq!(row.avg_exec_time, UNDEFINED);
        assert_eq!(row.avg_depth, UNDEFINED);
    }

    #[test]
    fn averages_divide_by_invocations() {
        let acc = ClassAccumulator {
            invocations: 3,
            total_self_time: 10,
            total_depth: 7,
            num_leaves: 1,
            ..Default::default()
        };
        let row = acc.finalize("a.A");
        assert_eq!(row.avg_exec_time, 3.333);
        assert_eq!(row.avg_depth, 2.333);
        assert_eq!(row.perc_leaves, 0.333);
    }

    #[test]
    fn entry_creates_lazily() {
        let mut acc = Accumulation::with_classes(["a.A"]);
        acc.entry("a.B").num_int_calls += 1;
        assert_eq!(acc.len(), 2);
        assert_eq!(acc.get("a.B").map(|a| a.num_int_calls), Some(1));
        assert_eq!(acc.get("a.A"), Some(&ClassAccumulator::default()));
    }
}
