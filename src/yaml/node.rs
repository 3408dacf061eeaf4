//! Tree node produced by the `.pairs` parser.

use serde::Serialize;

/// A keyed entry in the parsed tree.
///
/// Children keep their source order. Duplicate keys are stored as separate
/// siblings; [`Node::get`] only ever sees the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Key of the node, `None` only for the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,

    /// Value lines joined with `\n`.
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
}

impl Node {
    /// Create a node with the given key and no value.
    pub fn new(key: Option<String>) -> Self {
        Self {
            key,
            value: None,
            children: Vec::new(),
        }
    }

    /// Create the keyless root of a tree.
    pub fn root() -> Self {
        Self::new(None)
    }

    /// Create a node with a key.
    pub fn keyed(key: impl Into<String>) -> Self {
        Self::new(Some(key.into()))
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn set_key(&mut self, key: Option<String>) {
        self.key = key;
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Overwrite the value.
    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Append a child after the existing ones.
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// First child with the given key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.key() == Some(key))
    }

    /// Whether any child has the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.children.iter().any(|c| c.key() == Some(key))
    }

    /// Number of immediate children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Append a trimmed line to the value, separated by a newline when a
    /// non-empty value is already present.
    pub fn append_value(&mut self, line: &str) {
        let line = line.trim();
        match self.value.as_mut() {
            Some(existing) if !existing.is_empty() => {
                existing.push('\n');
                existing.push_str(line);
            }
            _ => self.value = Some(line.to_string()),
        }
    }
}
