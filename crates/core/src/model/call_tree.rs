use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One recorded invocation in a class-aggregated profiler call tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallNode {
    /// Fully qualified class name (`com.example.Outer$Inner`).
    pub class_name: String,
    pub method_name: String,
    /// How many times this call path was recorded.
    pub count: u64,
    /// Self time (exclusive of children), in profiler units.
    pub self_time: u64,
    pub leaf: bool,
    #[serde(default)]
    pub children: Vec<CallNode>,
}

impl CallNode {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>, count: u64) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            count,
            self_time: 0,
            leaf: true,
            children: Vec::new(),
        }
    }

    pub fn with_self_time(mut self, self_time: u64) -> Self {
        self.self_time = self_time;
        self
    }

    /// Append a callee. The node stops being a leaf.
    pub fn with_child(mut self, child: CallNode) -> Self {
        self.leaf = false;
        self.children.push(child);
        self
    }
}

// Deep call chains would otherwise drop recursively, one frame per level.
impl Drop for CallNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// A call tree rooted at a synthetic root without class identity.
///
/// Only the root's children are stored; the root itself is implicit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTree {
    pub roots: Vec<CallNode>,
}

impl CallTree {
    pub fn new(roots: Vec<CallNode>) -> Self {
        Self { roots }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth-first, pre-order walk over every non-root node.
    pub fn for_each_node<'a>(&'a self, mut visit: impl FnMut(&'a CallNode)) {
        let mut stack: Vec<&CallNode> = self.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            visit(node);
            stack.extend(node.children.iter().rev());
        }
    }

    pub fn node_count(&self) -> usize {
        let mut n = 0;
        self.for_each_node(|_| n += 1);
        n
    }

    /// Distinct class names reachable in the tree, sorted.
    pub fn class_names(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.for_each_node(|node| {
            names.insert(node.class_name.as_str());
        });
        names
    }
}
