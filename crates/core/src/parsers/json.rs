use serde::Deserialize;
use thiserror::Error;

use crate::model::CallTree;

#[derive(Debug, Error)]
pub enum JsonParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("call tree has no roots")]
    Empty,
}

/// Parse the serde form of a [`CallTree`] (`{"roots": [...]}`).
///
/// Every call level nests two JSON levels (node object and `children`
/// array), so serde_json's recursion limit is lifted and the stack grows on
/// demand instead.
pub fn parse_json(data: &[u8]) -> Result<CallTree, JsonParseError> {
    let mut de = serde_json::Deserializer::from_slice(data);
    de.disable_recursion_limit();
    let tree = CallTree::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    if tree.is_empty() {
        return Err(JsonParseError::Empty);
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CallNode;

    #[test]
    fn parse_nested_tree() {
        let json = r#"{
            "roots": [
                {"class_name": "a.Main", "method_name": "main", "count": 1, "self_time": 5, "leaf": false,
                 "children": [
                    {"class_name": "a.Util", "method_name": "help", "count": 4, "self_time": 2, "leaf": true}
                 ]}
            ]
        }"#;
        let tree = parse_json(json.as_bytes()).unwrap();
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.roots[0].children[0].class_name, "a.Util");
        assert!(tree.roots[0].children[0].children.is_empty());
    }

    #[test]
    fn missing_field_errors() {
        let json = r#"{"roots": [{"class_name": "a.Main", "count": 1, "self_time": 0, "leaf": true}]}"#;
        let err = parse_json(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("method_name"));
    }

    #[test]
    fn round_trips_deep_tree() {
        let mut node = CallNode::new("a.Leaf", "run", 3);
        for depth in 0..200 {
            node = CallNode::new(format!("a.C{}", depth % 5), "call", 1).with_child(node);
        }
        let original = CallTree::new(vec![node]);
        let data = serde_json::to_vec(&original).unwrap();

        let tree = parse_json(&data).unwrap();
        assert_eq!(tree.node_count(), 201);
        assert_eq!(tree, original);
    }

    #[test]
    fn trailing_data_errors() {
        let json = br#"{"roots": [{"class_name": "a.A", "method_name": "m", "count": 1, "self_time": 0, "leaf": true}]} {}"#;
        assert!(matches!(parse_json(json), Err(JsonParseError::Json(_))));
    }

    #[test]
    fn empty_roots_errors() {
        assert!(matches!(
            parse_json(br#"{"roots": []}"#),
            Err(JsonParseError::Empty)
        ));
    }
}
