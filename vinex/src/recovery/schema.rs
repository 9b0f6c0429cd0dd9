use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::schemas::LANGUAGE_CODES;

/// Declarative shape of a record a generator is asked to produce.
///
/// Schemas are plain data: the built-ins live in [`super::schemas`] and more
/// can be loaded from JSON files, so a new call site adds a declaration rather
/// than a new parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    pub name: String,
    /// Canonical, ordered language codes every language map is rebuilt with.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    pub root: Node,
}

fn default_languages() -> Vec<String> {
    LANGUAGE_CODES.iter().map(|c| c.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Any JSON value, accepted as-is.
    Flat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
    },
    /// Object keyed by language code with text values.
    LanguageMap,
    List {
        item: Box<Node>,
    },
    Object {
        fields: Vec<FieldSpec>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub node: Node,
}

impl Node {
    pub fn flat() -> Self {
        Self::Flat { default: None }
    }

    pub fn flat_or(default: Value) -> Self {
        Self::Flat {
            default: Some(default),
        }
    }

    pub fn list(item: Node) -> Self {
        Self::List {
            item: Box::new(item),
        }
    }

    pub fn object(fields: Vec<FieldSpec>) -> Self {
        Self::Object { fields }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Flat { .. } => "value",
            Self::LanguageMap => "language map",
            Self::List { .. } => "list",
            Self::Object { .. } => "object",
        }
    }
}

impl FieldSpec {
    pub fn required(key: impl Into<String>, node: Node) -> Self {
        Self {
            key: key.into(),
            required: true,
            node,
        }
    }

    pub fn optional(key: impl Into<String>, node: Node) -> Self {
        Self {
            key: key.into(),
            required: false,
            node,
        }
    }
}

impl ExtractionSchema {
    pub fn new<L, S>(name: impl Into<String>, languages: L, root: Node) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            languages: languages.into_iter().map(Into::into).collect(),
            root,
        }
    }

    pub fn object<L, S>(name: impl Into<String>, languages: L, fields: Vec<FieldSpec>) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, languages, Node::object(fields))
    }

    pub fn language_map<L, S>(name: impl Into<String>, languages: L) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, languages, Node::LanguageMap)
    }

    /// Validate `value` and repair what is repairable.
    ///
    /// On failure returns every offending path, not just the first one.
    pub fn validate(&self, value: Value) -> Result<Value, Vec<String>> {
        let mut violations = Vec::new();
        let repaired = self.check(&self.root, value, "", &mut violations);
        if violations.is_empty() {
            Ok(repaired)
        } else {
            Err(violations)
        }
    }

    fn check(&self, node: &Node, value: Value, path: &str, violations: &mut Vec<String>) -> Value {
        match (node, value) {
            (Node::Flat { .. }, value) => value,
            (Node::LanguageMap, Value::Object(map)) => {
                Value::Object(self.repair_language_map(map, path, violations))
            }
            (Node::List { item }, Value::Array(items)) => Value::Array(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| self.check(item, v, &format!("{path}[{i}]"), violations))
                    .collect(),
            ),
            (Node::Object { fields }, Value::Object(map)) => {
                Value::Object(self.check_fields(fields, map, path, violations))
            }
            (node, _) => {
                violations.push(expected(path, node.kind()));
                Value::Null
            }
        }
    }

    fn check_fields(
        &self,
        fields: &[FieldSpec],
        mut map: Map<String, Value>,
        path: &str,
        violations: &mut Vec<String>,
    ) -> Map<String, Value> {
        for field in fields {
            let field_path = join(path, &field.key);
            let present = map.get(&field.key).is_some_and(|v| !v.is_null());

            if present {
                if let Some(slot) = map.get_mut(&field.key) {
                    let current = std::mem::take(slot);
                    *slot = self.check(&field.node, current, &field_path, violations);
                }
            } else if field.required {
                violations.push(field_path);
            } else {
                map.insert(field.key.clone(), self.absent_value(&field.node));
            }
        }
        map
    }

    /// Value substituted for an absent optional field.
    fn absent_value(&self, node: &Node) -> Value {
        match node {
            Node::Flat { default } => default.clone().unwrap_or(Value::Null),
            Node::LanguageMap => Value::Object(
                self.languages
                    .iter()
                    .map(|code| (code.clone(), Value::String(String::new())))
                    .collect(),
            ),
            Node::List { .. } => Value::Array(Vec::new()),
            Node::Object { fields } => Value::Object(
                fields
                    .iter()
                    .filter(|f| !f.required)
                    .map(|f| (f.key.clone(), self.absent_value(&f.node)))
                    .collect(),
            ),
        }
    }

    /// Rebuild a language map with exactly the declared codes, in order.
    fn repair_language_map(
        &self,
        mut map: Map<String, Value>,
        path: &str,
        violations: &mut Vec<String>,
    ) -> Map<String, Value> {
        let mut repaired = Map::with_capacity(self.languages.len());
        for code in &self.languages {
            let text = match map.remove(code) {
                Some(Value::String(s)) => s,
                None | Some(Value::Null) => String::new(),
                Some(Value::Bool(b)) => b.to_string(),
                Some(Value::Number(n)) => n.to_string(),
                Some(_) => {
                    violations.push(expected(&join(path, code), "text"));
                    String::new()
                }
            };
            repaired.insert(code.clone(), Value::String(text));
        }
        repaired
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn expected(path: &str, kind: &str) -> String {
    let at = if path.is_empty() { "<root>" } else { path };
    format!("{at} (expected {kind})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn listing() -> ExtractionSchema {
        ExtractionSchema::object(
            "listing",
            ["en", "ru"],
            vec![
                FieldSpec::required(
                    "text",
                    Node::object(vec![
                        FieldSpec::required("title", Node::LanguageMap),
                        FieldSpec::optional("description", Node::LanguageMap),
                    ]),
                ),
                FieldSpec::optional(
                    "options",
                    Node::list(Node::object(vec![
                        FieldSpec::required("label", Node::LanguageMap),
                        FieldSpec::optional("code", Node::flat()),
                    ])),
                ),
                FieldSpec::optional("year", Node::flat_or(json!(0))),
            ],
        )
    }

    #[test]
    fn test_optional_fields_are_filled() {
        let value = listing()
            .validate(json!({"text": {"title": {"en": "Car"}}}))
            .unwrap();

        assert_eq!(
            value,
            json!({
                "text": {
                    "title": {"en": "Car", "ru": ""},
                    "description": {"en": "", "ru": ""}
                },
                "options": [],
                "year": 0
            })
        );
    }

    #[test]
    fn test_all_missing_paths_reported() {
        let missing = listing()
            .validate(json!({
                "text": {},
                "options": [{"label": {"en": "ABS"}}, {"code": "x"}, {"code": "y"}]
            }))
            .unwrap_err();

        assert_eq!(
            missing,
            vec!["text.title", "options[1].label", "options[2].label"]
        );
    }

    #[test]
    fn test_language_map_drops_undeclared_codes_and_orders() {
        let schema = ExtractionSchema::language_map("t", ["ru", "en", "ko"]);
        let value = schema
            .validate(json!({"ko": "차", "fr": "voiture", "en": "car"}))
            .unwrap();

        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["ru", "en", "ko"]);
        assert_eq!(value, json!({"ru": "", "en": "car", "ko": "차"}));
    }

    #[test]
    fn test_language_map_scalars_become_text() {
        let schema = ExtractionSchema::language_map("t", ["en", "ru"]);
        let value = schema.validate(json!({"en": 2019, "ru": null})).unwrap();
        assert_eq!(value, json!({"en": "2019", "ru": ""}));
    }

    #[test]
    fn test_language_map_nested_value_is_violation() {
        let schema = ExtractionSchema::language_map("t", ["en"]);
        let missing = schema.validate(json!({"en": {"text": "car"}})).unwrap_err();
        assert_eq!(missing, vec!["en (expected text)"]);
    }

    #[test]
    fn test_wrong_type_is_violation() {
        let missing = listing()
            .validate(json!({"text": "just a string", "options": {}}))
            .unwrap_err();
        assert_eq!(
            missing,
            vec!["text (expected object)", "options (expected list)"]
        );
    }

    #[test]
    fn test_root_must_be_object() {
        let schema = ExtractionSchema::language_map("t", ["en"]);
        let missing = schema.validate(json!([1, 2])).unwrap_err();
        assert_eq!(missing, vec!["<root> (expected language map)"]);
    }

    #[test]
    fn test_null_required_field_counts_as_missing() {
        let schema = ExtractionSchema::object(
            "c",
            Vec::<String>::new(),
            vec![FieldSpec::required("name", Node::flat())],
        );
        assert_eq!(
            schema.validate(json!({"name": null})).unwrap_err(),
            vec!["name"]
        );
    }

    #[test]
    fn test_schema_deserializes_from_json() {
        let schema: ExtractionSchema = serde_json::from_value(json!({
            "name": "plate",
            "root": {
                "kind": "object",
                "fields": [
                    {"key": "number", "required": true, "kind": "flat"},
                    {"key": "region", "kind": "flat", "default": "unknown"},
                    {"key": "notes", "kind": "list", "item": {"kind": "flat"}}
                ]
            }
        }))
        .unwrap();

        assert_eq!(schema.languages, default_languages());
        let value = schema.validate(json!({"number": "A123BC"})).unwrap();
        assert_eq!(
            value,
            json!({"number": "A123BC", "region": "unknown", "notes": []})
        );
    }
}
