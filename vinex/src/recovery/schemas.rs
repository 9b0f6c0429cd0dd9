//! Built-in extraction schemas and the registry that serves them.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use super::schema::{ExtractionSchema, FieldSpec, Node};
use crate::error::{Result, VinexError};

/// Canonical language codes, in the order language maps are emitted.
pub const LANGUAGE_CODES: [&str; 5] = ["ru", "en", "uz", "kz", "ko"];

pub fn language_name(code: &str) -> Option<&'static str> {
    match code {
        "ru" => Some("Russian"),
        "en" => Some("English"),
        "uz" => Some("Uzbek"),
        "kz" => Some("Kazakh"),
        "ko" => Some("Korean"),
        _ => None,
    }
}

pub fn is_language_code(code: &str) -> bool {
    LANGUAGE_CODES.contains(&code)
}

pub const VIN_FIELDS: &str = "vin_fields";
pub const CONSIGNEE: &str = "consignee";
pub const TRANSLATION: &str = "translation";
pub const VEHICLE_LISTING: &str = "vehicle_listing";
pub const LISTING_OPTIONS: &str = "listing_options";

/// Keys read off a vehicle registration document.
pub const VIN_FIELD_KEYS: [&str; 6] = [
    "vin",
    "car_model",
    "manufacturer",
    "engine_cc",
    "weight",
    "manufacture_date",
];

pub fn vin_fields() -> ExtractionSchema {
    ExtractionSchema::object(
        VIN_FIELDS,
        LANGUAGE_CODES,
        VIN_FIELD_KEYS
            .iter()
            .map(|key| FieldSpec::optional(*key, Node::flat_or(Value::Null)))
            .collect(),
    )
}

pub fn consignee() -> ExtractionSchema {
    ExtractionSchema::object(
        CONSIGNEE,
        LANGUAGE_CODES,
        vec![
            FieldSpec::required("consignee_name", Node::flat()),
            FieldSpec::required("consignee_address", Node::flat()),
        ],
    )
}

/// A bare language map over exactly `targets`.
pub fn translation<S: AsRef<str>>(targets: &[S]) -> ExtractionSchema {
    ExtractionSchema::language_map(
        TRANSLATION,
        targets.iter().map(|t| t.as_ref().to_string()),
    )
}

fn listing_option() -> Node {
    Node::object(vec![
        FieldSpec::required("label", Node::LanguageMap),
        FieldSpec::optional("code", Node::flat()),
    ])
}

pub fn vehicle_listing() -> ExtractionSchema {
    ExtractionSchema::object(
        VEHICLE_LISTING,
        LANGUAGE_CODES,
        vec![
            FieldSpec::required(
                "text",
                Node::object(vec![
                    FieldSpec::required("title", Node::LanguageMap),
                    FieldSpec::optional("description", Node::LanguageMap),
                ]),
            ),
            FieldSpec::required(
                "specs",
                Node::object(vec![
                    FieldSpec::optional("year", Node::flat()),
                    FieldSpec::optional("mileage", Node::flat()),
                    FieldSpec::optional("fuel", Node::flat()),
                    FieldSpec::optional("transmission", Node::flat()),
                ]),
            ),
            FieldSpec::optional("options", Node::list(listing_option())),
        ],
    )
}

pub fn listing_options() -> ExtractionSchema {
    ExtractionSchema::object(
        LISTING_OPTIONS,
        LANGUAGE_CODES,
        vec![FieldSpec::optional("options", Node::list(listing_option()))],
    )
}

/// Named schemas available to request handlers.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, ExtractionSchema>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SchemaRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self {
            schemas: BTreeMap::new(),
        };
        for schema in [
            vin_fields(),
            consignee(),
            translation(&LANGUAGE_CODES),
            vehicle_listing(),
            listing_options(),
        ] {
            registry.insert(schema);
        }
        registry
    }

    /// Built-ins plus every `*.json` schema found in `dir`.
    pub fn with_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut registry = Self::builtin();
        registry.load_dir(dir)?;
        Ok(registry)
    }

    pub fn insert(&mut self, schema: ExtractionSchema) -> Option<ExtractionSchema> {
        self.schemas.insert(schema.name.clone(), schema)
    }

    pub fn get(&self, name: &str) -> Option<&ExtractionSchema> {
        self.schemas.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Load schema files from `dir`. A file replaces a same-named schema.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in &paths {
            let contents = std::fs::read_to_string(path)?;
            let schema: ExtractionSchema = serde_json::from_str(&contents).map_err(|e| {
                VinexError::Validation(format!("invalid schema file {}: {e}", path.display()))
            })?;
            if let Some(code) = schema.languages.iter().find(|c| !is_language_code(c)) {
                return Err(VinexError::Validation(format!(
                    "schema file {} declares unknown language code '{code}'",
                    path.display()
                )));
            }
            tracing::info!(schema = %schema.name, path = %path.display(), "Loaded extraction schema");
            if self.insert(schema).is_some() {
                tracing::warn!(path = %path.display(), "Schema file overrides an existing schema");
            }
        }

        Ok(paths.len())
    }
}
