use serde_json::Value;

/// Generic tree a provider response is normalized into before mapping.
///
/// Follows the xmltodict conventions: attributes are `@name` keys, text next
/// to child elements is `#text`, repeated children become a `List`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderNode {
    Null,
    Text(String),
    List(Vec<ProviderNode>),
    /// Keys in document order for XML; JSON objects arrive sorted by key
    Map(Vec<(String, ProviderNode)>),
}

impl ProviderNode {
    /// Child of a map by key; `None` for every other shape
    pub fn get(&self, key: &str) -> Option<&ProviderNode> {
        match self {
            ProviderNode::Map(entries) => entries
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, node)| node),
            _ => None,
        }
    }

    /// Walk nested maps along `keys`
    pub fn path(&self, keys: &[&str]) -> Option<&ProviderNode> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ProviderNode::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ProviderNode::Null)
    }

    /// Null, blank text, or an empty list/map
    pub fn is_empty(&self) -> bool {
        match self {
            ProviderNode::Null => true,
            ProviderNode::Text(text) => text.is_empty(),
            ProviderNode::List(items) => items.is_empty(),
            ProviderNode::Map(entries) => entries.is_empty(),
        }
    }

    /// Plain text content: lists are space-joined, maps contribute their `#text`
    pub fn flatten_text(&self) -> String {
        match self {
            ProviderNode::Null => String::new(),
            ProviderNode::Text(text) => text.clone(),
            ProviderNode::List(items) => items
                .iter()
                .map(ProviderNode::flatten_text)
                .collect::<Vec<_>>()
                .join(" "),
            ProviderNode::Map(_) => self
                .get("#text")
                .map(ProviderNode::flatten_text)
                .unwrap_or_default(),
        }
    }
}

impl From<Value> for ProviderNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ProviderNode::Null,
            Value::Bool(b) => ProviderNode::Text(b.to_string()),
            Value::Number(n) => ProviderNode::Text(n.to_string()),
            Value::String(s) => ProviderNode::Text(s),
            Value::Array(items) => {
                ProviderNode::List(items.into_iter().map(ProviderNode::from).collect())
            }
            Value::Object(map) => ProviderNode::Map(
                map.into_iter()
                    .map(|(key, value)| (key, ProviderNode::from(value)))
                    .collect(),
            ),
        }
    }
}
