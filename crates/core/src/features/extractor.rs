use std::collections::BTreeSet;

use tracing::{debug, info};

use super::accumulator::Accumulation;
use crate::config::ExtractorConfig;
use crate::model::{CallNode, CallTree};

/// Walks a call tree and accumulates per-class call statistics.
#[derive(Debug, Clone, Default)]
pub struct CallTreeExtractor {
    config: ExtractorConfig,
}

impl CallTreeExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Accumulate raw counts for every class in `tree`.
    ///
    /// All classes are registered up front, so a callee is always present
    /// when its incoming calls are recorded. The synthetic root sits at
    /// depth 0; its children are the first real invocations at depth 1.
    pub fn extract(&self, tree: &CallTree) -> Accumulation {
        let mut acc = Accumulation::with_classes(tree.class_names());
        debug!(classes = acc.len(), "registered classes");

        // Explicit stack: exported call chains can be thousands of levels deep.
        let mut stack: Vec<(&CallNode, u64)> = tree.roots.iter().map(|node| (node, 1)).collect();
        while let Some((node, depth)) = stack.pop() {
            self.visit(node, depth, &mut acc);
            for child in &node.children {
                self.record_call(node, child, &mut acc);
                stack.push((child, depth + 1));
            }
        }

        info!(
            classes = acc.len(),
            roots = tree.roots.len(),
            "call tree accumulated"
        );
        acc
    }

    /// Counters of the invoked class itself.
    fn visit(&self, node: &CallNode, depth: u64, acc: &mut Accumulation) {
        let own = acc.entry(&node.class_name);
        own.invocations += node.count;
        own.total_self_time += node.self_time;
        own.total_depth += node.count * depth;
        if node.leaf {
            own.num_leaves += node.count;
        }
    }

    fn record_call(&self, caller: &CallNode, callee: &CallNode, acc: &mut Accumulation) {
        let count = callee.count;

        if callee.class_name == caller.class_name {
            let own = acc.entry(&caller.class_name);
            own.num_int_calls += count;
            insert_name(&mut own.unique_callees, &caller.class_name);
            insert_name(&mut own.unique_callers, &caller.class_name);
        } else {
            let callee_inside = self.config.is_project_class(&callee.class_name);
            let caller_inside = self.config.is_project_class(&caller.class_name);

            let from = acc.entry(&caller.class_name);
            from.num_ext_calls += count;
            if callee_inside {
                from.outgoing_calls_inside += count;
            } else {
                from.outgoing_calls_outside += count;
            }
            insert_name(&mut from.unique_callees, &callee.class_name);

            let to = acc.entry(&callee.class_name);
            to.num_incoming_calls += count;
            if caller_inside {
                to.incoming_calls_inside += count;
            } else {
                to.incoming_calls_outside += count;
            }
            insert_name(&mut to.unique_callers, &caller.class_name);
        }

        if self.config.is_constructor(&callee.method_name) {
            acc.entry(&caller.class_name).num_objects_created += count;
        }
        if self.config.is_collection_type(&callee.class_name) {
            acc.entry(&caller.class_name).num_data_structure_calls += count;
        }
    }
}

fn insert_name(set: &mut BTreeSet<String>, name: &str) {
    if !set.contains(name) {
        set.insert(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::UNDEFINED;

    fn project_config() -> ExtractorConfig {
        ExtractorConfig {
            project_packages: vec!["com.acme".to_string()],
            ..ExtractorConfig::default()
        }
    }

    #[test]
    fn single_leaf_child() {
        let tree = CallTree::new(vec![CallNode::new("A", "run", 5)]);
        let table = CallTreeExtractor::default().extract(&tree).finalize();
        assert_eq!(table.len(), 1);
        let a = table.get("A").unwrap();
        assert_eq!(a.num_leaves, 5);
        assert_eq!(a.num_outgoing_calls, 0);
        assert_eq!(a.ratio_internal_external, UNDEFINED);
        assert_eq!(a.avg_depth, 1.0);
        assert_eq!(a.perc_leaves, 1.0);
    }

    #[test]
    fn self_call_counts_as_internal() {
        let tree = CallTree::new(vec![
            CallNode::new("A", "outer", 3).with_child(CallNode::new("A", "inner", 2)),
        ]);
        let acc = CallTreeExtractor::default().extract(&tree);
        let a = acc.get("A").unwrap();
        assert_eq!(a.num_int_calls, 2);
        assert_eq!(a.num_leaves, 2);
        assert_eq!(a.invocations, 5);
        // 3 * depth 1 + 2 * depth 2
        assert_eq!(a.total_depth, 7);
        assert_eq!(a.unique_callers.len(), 1);
        assert_eq!(a.unique_callees.len(), 1);
    }

    #[test]
    fn external_calls_split_by_project_membership() {
        let tree = CallTree::new(vec![
            CallNode::new("com.acme.Controller", "handle", 1)
                .with_child(CallNode::new("com.acme.Model", "update", 4))
                .with_child(CallNode::new("java.lang.StringBuilder", "append", 6)),
            CallNode::new("javax.swing.Timer", "fire", 1)
                .with_child(CallNode::new("com.acme.Model", "tick", 2)),
        ]);
        let acc = CallTreeExtractor::new(project_config()).extract(&tree);

        let controller = acc.get("com.acme.Controller").unwrap();
        assert_eq!(controller.num_ext_calls, 10);
        assert_eq!(controller.outgoing_calls_inside, 4);
        assert_eq!(controller.outgoing_calls_outside, 6);
        assert_eq!(controller.unique_callees.len(), 2);

        let model = acc.get("com.acme.Model").unwrap();
        assert_eq!(model.num_incoming_calls, 6);
        assert_eq!(model.incoming_calls_inside, 4);
        assert_eq!(model.incoming_calls_outside, 2);
        assert_eq!(model.unique_callers.len(), 2);

        let builder = acc.get("java.lang.StringBuilder").unwrap();
        assert_eq!(builder.num_incoming_calls, 6);
        assert_eq!(builder.incoming_calls_inside, 6);
    }

    #[test]
    fn constructor_and_collection_calls() {
        let tree = CallTree::new(vec![
            CallNode::new("com.acme.Factory", "build", 1)
                .with_child(CallNode::new("com.acme.Part", "<init>", 3))
                .with_child(CallNode::new("java.util.ArrayList", "<init>", 1))
                .with_child(CallNode::new("java.util.ArrayList", "add", 3))
                .with_child(CallNode::new("java.util.HashMap$Node", "getKey", 1)),
        ]);
        let table = CallTreeExtractor::default().extract(&tree).finalize();
        let factory = table.get("com.acme.Factory").unwrap();
        assert_eq!(factory.num_objects_created, 4);
        assert_eq!(factory.num_data_structure_calls, 5);
        assert_eq!(factory.num_outgoing_calls, 8);
        assert_eq!(factory.perc_object_creation, 0.5);
        assert_eq!(factory.perc_data_structure_calls, 0.625);
    }

    #[test]
    fn top_level_nodes_have_no_caller() {
        let tree = CallTree::new(vec![
            CallNode::new("A", "a", 1),
            CallNode::new("B", "b", 1),
        ]);
        let table = CallTreeExtractor::default().extract(&tree).finalize();
        for row in table.rows() {
            assert_eq!(row.num_incoming_calls, 0);
            assert_eq!(row.ratio_incoming_outgoing, UNDEFINED);
        }
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let mut node = CallNode::new("B", "leaf", 1);
        for level in 0..50_000 {
            let class = if level % 2 == 0 { "A" } else { "B" };
            node = CallNode::new(class, "step", 1).with_child(node);
        }
        let tree = CallTree::new(vec![node]);

        let acc = CallTreeExtractor::default().extract(&tree);
        let a = acc.get("A").unwrap();
        let b = acc.get("B").unwrap();
        assert_eq!(a.invocations + b.invocations, 50_001);
        assert_eq!(a.num_ext_calls + b.num_ext_calls, 50_000);
        assert_eq!(b.num_leaves, 1);
    }

    #[test]
    fn execution_time_is_averaged_per_invocation() {
        let tree = CallTree::new(vec![
            CallNode::new("A", "a", 2)
                .with_self_time(10)
                .with_child(CallNode::new("B", "b", 4).with_self_time(3)),
        ]);
        let table = CallTreeExtractor::default().extract(&tree).finalize();
        assert_eq!(table.get("A").unwrap().avg_exec_time, 5.0);
        assert_eq!(table.get("B").unwrap().avg_exec_time, 0.75);
        assert_eq!(table.get("B").unwrap().avg_depth, 2.0);
    }
}
