//! Call-tree cleanup applied before feature extraction.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::ExtractorConfig;
use crate::model::{CallNode, CallTree};

/// `$` followed by digits: a compiler-generated anonymous class segment.
#[allow(clippy::expect_used)]
static ANONYMOUS_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\d+").expect("static regex"));

/// Strip anonymous class segments so `Outer$1` and `Outer$Inner$2` fold into
/// `Outer` and `Outer$Inner`. Named inner classes are left alone.
pub fn normalize_class_name(class_name: &str) -> Cow<'_, str> {
    ANONYMOUS_SEGMENT.replace_all(class_name, "")
}

/// Join several exported trees under one synthetic root.
pub fn combine(trees: impl IntoIterator<Item = CallTree>) -> CallTree {
    let mut combined = CallTree::default();
    // Top-level nodes of every export become siblings under the shared root.
    for tree in trees {
        combined.roots.extend(tree.roots);
    }
    combined
}

/// Rename every node of an anonymous class to its enclosing class.
///
/// Returns how many nodes were renamed.
pub fn merge_anonymous_classes(tree: &mut CallTree) -> usize {
    let mut renamed = 0;
    let mut stack: Vec<&mut CallNode> = tree.roots.iter_mut().collect();
    while let Some(node) = stack.pop() {
        // Plain class names keep their existing String.
        if ANONYMOUS_SEGMENT.is_match(&node.class_name) {
            node.class_name = normalize_class_name(&node.class_name).into_owned();
            renamed += 1;
        }
        stack.extend(node.children.iter_mut());
    }
    renamed
}

/// Combine the exported trees of one project and apply the configured
/// class-name cleanup.
pub fn prepare(trees: impl IntoIterator<Item = CallTree>, config: &ExtractorConfig) -> CallTree {
    let mut tree = combine(trees);
    // Listeners and runnables (`View$1`) count towards the class declaring them.
    if config.merge_anonymous_classes {
        let renamed = merge_anonymous_classes(&mut tree);
        debug!(renamed, "merged anonymous classes");
    }
    tree
}
