use proptest::prelude::*;
use rolemine_core::features::UNDEFINED;
use rolemine_core::{CallNode, CallTree, CallTreeExtractor};

const CLASSES: &[&str] = &["a.Model", "a.View", "a.Controller", "java.util.ArrayList"];
const METHODS: &[&str] = &["<init>", "run", "add", "update"];

fn node() -> impl Strategy<Value = CallNode> {
    let leaf = (0..CLASSES.len(), 0..METHODS.len(), 1u64..50, 0u64..1_000).prop_map(
        |(class, method, count, self_time)| {
            CallNode::new(CLASSES[class], METHODS[method], count).with_self_time(self_time)
        },
    );
    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            0..CLASSES.len(),
            0..METHODS.len(),
            1u64..50,
            prop::collection::vec(inner, 1..4),
        )
            .prop_map(|(class, method, count, children)| {
                children
                    .into_iter()
                    .fold(CallNode::new(CLASSES[class], METHODS[method], count), |parent, child| {
                        parent.with_child(child)
                    })
            })
    })
}

fn tree() -> impl Strategy<Value = CallTree> {
    prop::collection::vec(node(), 0..3).prop_map(CallTree::new)
}

proptest! {
    #[test]
    fn one_accumulator_per_distinct_class(tree in tree()) {
        let accumulation = CallTreeExtractor::default().extract(&tree);
        prop_assert_eq!(accumulation.len(), tree.class_names().len());
    }

    #[test]
    fn outgoing_is_internal_plus_external(tree in tree()) {
        let table = CallTreeExtractor::default().extract(&tree).finalize();
        for row in table.rows() {
            prop_assert_eq!(row.num_outgoing_calls, row.num_int_calls + row.num_ext_calls);
            prop_assert_eq!(
                row.num_ext_calls,
                row.outgoing_calls_inside + row.outgoing_calls_outside
            );
            prop_assert_eq!(
                row.num_incoming_calls,
                row.incoming_calls_inside + row.incoming_calls_outside
            );
        }
    }

    #[test]
    fn ratios_are_finite_or_undefined(tree in tree()) {
        let table = CallTreeExtractor::default().extract(&tree).finalize();
        for row in table.rows() {
            let ratios = [
                row.ratio_internal_external,
                row.ratio_incoming_outgoing,
                row.perc_object_creation,
                row.perc_leaves,
                row.perc_data_structure_calls,
                row.avg_exec_time,
                row.avg_depth,
            ];
            for value in ratios {
                prop_assert!(value.is_finite());
                prop_assert!(value >= 0.0 || value == UNDEFINED);
            }
            if row.num_outgoing_calls == 0 {
                prop_assert_eq!(row.ratio_incoming_outgoing, UNDEFINED);
                prop_assert_eq!(row.perc_object_creation, UNDEFINED);
            }
        }
    }

    #[test]
    fn finalize_is_repeatable(tree in tree()) {
        let accumulation = CallTreeExtractor::default().extract(&tree);
        prop_assert_eq!(accumulation.finalize(), accumulation.finalize());
    }
}
