use serde_yaml::Value;

/// Decoded YAML reduced to the shapes workflow extraction cares about.
///
/// Mapping keys keep document order; non-scalar keys are dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    Null,
    Scalar(String),
    List(Vec<DocNode>),
    Mapping(Vec<(String, DocNode)>),
}

impl From<Value> for DocNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => DocNode::Null,
            Value::Bool(b) => DocNode::Scalar(b.to_string()),
            Value::Number(n) => DocNode::Scalar(n.to_string()),
            Value::String(s) => DocNode::Scalar(s),
            Value::Sequence(seq) => DocNode::List(seq.into_iter().map(DocNode::from).collect()),
            Value::Mapping(map) => DocNode::Mapping(
                map.into_iter()
                    .filter_map(|(key, value)| Some((key_text(key)?, DocNode::from(value))))
                    .collect(),
            ),
            Value::Tagged(tagged) => DocNode::from(tagged.value),
        }
    }
}

fn key_text(key: Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => key_text(tagged.value),
        _ => None,
    }
}

impl DocNode {
    pub fn get(&self, key: &str) -> Option<&DocNode> {
        self.entries()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// First present key out of a set of equivalent spellings.
    pub fn get_any(&self, keys: &[&str]) -> Option<&DocNode> {
        keys.iter().find_map(|key| self.get(key))
    }

    pub fn entries(&self) -> &[(String, DocNode)] {
        match self {
            DocNode::Mapping(entries) => entries,
            _ => &[],
        }
    }

    pub fn items(&self) -> &[DocNode] {
        match self {
            DocNode::List(items) => items,
            _ => &[],
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            DocNode::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, DocNode::Mapping(_))
    }

    /// A scalar, or the scalar items of a list.
    pub fn scalars(&self) -> Vec<&str> {
        match self {
            DocNode::Scalar(s) => vec![s.as_str()],
            DocNode::List(items) => items.iter().filter_map(DocNode::as_scalar).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(yaml: &str) -> DocNode {
        DocNode::from(serde_yaml::from_str::<Value>(yaml).unwrap())
    }

    #[test]
    fn test_mapping_preserves_order() {
        let doc = node("b: 1\na: two\nc: [x, y]\n");
        let keys: Vec<&str> = doc.entries().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(doc.get("b").and_then(DocNode::as_scalar), Some("1"));
        assert_eq!(doc.get("c").unwrap().scalars(), vec!["x", "y"]);
    }

    #[test]
    fn test_non_mapping_accessors_are_empty() {
        let doc = node("- a\n- b\n");
        assert!(doc.entries().is_empty());
        assert!(doc.get("a").is_none());
        assert_eq!(doc.items().len(), 2);
        assert!(DocNode::Null.scalars().is_empty());
    }

    #[test]
    fn test_bool_keys_become_text() {
        let doc = node("true: push\n");
        assert_eq!(doc.get_any(&["on", "true"]).and_then(DocNode::as_scalar), Some("push"));
    }
}
