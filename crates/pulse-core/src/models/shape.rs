use serde_json::Value;

/// The closed set of shapes a profile-source field can take.
///
/// Profile payloads embed identifiers inconsistently: a mapping of link names
/// to URLs, a list of URLs, or a list of such mappings. Numbers, booleans and
/// nulls are kept as `Scalar` and never inspected.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldShape {
    Text(String),
    List(Vec<FieldShape>),
    /// Keyed mapping; entries keep their payload order.
    Map(Vec<(String, FieldShape)>),
    Scalar(Value),
}

impl FieldShape {
    pub fn from_value(v: &Value) -> Self {
        match v {
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_value).collect()),
            Value::Object(obj) => Self::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::from_value(v)))
                    .collect(),
            ),
            other => Self::Scalar(other.clone()),
        }
    }

    /// Visit the strings of a link-bearing field in payload order and return
    /// the first `Some` produced by `f`.
    ///
    /// Only three layouts are read: the string values of a mapping, the string
    /// elements of a list, and the string values of mappings held in a list.
    /// A bare string and anything nested under a mapping value are skipped.
    pub fn find_link_text<T, F>(&self, mut f: F) -> Option<T>
    where
        F: FnMut(&str) -> Option<T>,
    {
        match self {
            Self::Map(entries) => entries.iter().find_map(|(_, v)| v.as_text().and_then(&mut f)),
            Self::List(items) => items.iter().find_map(|item| match item {
                Self::Text(s) => f(s.as_str()),
                Self::Map(entries) => entries
                    .iter()
                    .find_map(|(_, v)| v.as_text().and_then(&mut f)),
                _ => None,
            }),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key when this shape is a mapping.
    pub fn get(&self, key: &str) -> Option<&FieldShape> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collect_all(shape: &FieldShape) -> Vec<String> {
        let mut seen = Vec::new();
        let _: Option<()> = shape.find_link_text(|s: &str| {
            seen.push(s.to_string());
            None
        });
        seen
    }

    #[test]
    fn classifies_json_values() {
        let shape = FieldShape::from_value(&json!({
            "name": "Nature",
            "pages": [1, "2"],
            "year": 2015
        }));
        assert_eq!(shape.get("name").and_then(FieldShape::as_text), Some("Nature"));
        assert!(matches!(shape.get("pages"), Some(FieldShape::List(_))));
        assert!(matches!(shape.get("year"), Some(FieldShape::Scalar(_))));
    }

    #[test]
    fn map_entries_keep_payload_order() {
        let shape = FieldShape::from_value(&json!({"z": "first", "a": "second"}));
        assert_eq!(collect_all(&shape), vec!["first", "second"]);
    }

    #[test]
    fn reads_only_link_layouts() {
        let list = FieldShape::from_value(&json!([
            "top",
            {"link": "inner", "rank": 1},
            ["nested list"],
            {"nested": {"deep": "too deep"}}
        ]));
        assert_eq!(collect_all(&list), vec!["top", "inner"]);

        let map = FieldShape::from_value(&json!({
            "html": "direct",
            "versions": ["under a map"],
            "more": {"deep": "under a map"}
        }));
        assert_eq!(collect_all(&map), vec!["direct"]);
    }

    #[test]
    fn bare_string_is_not_read() {
        let shape = FieldShape::from_value(&json!("10.5555/bare"));
        assert!(collect_all(&shape).is_empty());
    }

    #[test]
    fn stops_at_first_hit() {
        let shape = FieldShape::from_value(&json!(["a", "b", "c"]));
        let hit = shape.find_link_text(|s: &str| (s != "a").then(|| s.to_uppercase()));
        assert_eq!(hit.as_deref(), Some("B"));
    }
}
