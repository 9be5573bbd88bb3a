// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Property-bag document.
//!
//! Hydrated hits become [`Document`]s: an ordered map of properties where an
//! embedded property holds one or many sub-documents. Each document tracks
//! which fields were changed since it was last cleaned, whether it has been
//! persisted, per-field validation errors and the alias of the repository it
//! came from.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::types::TypeRef;
use crate::error::OdmError;

/// A single property value
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Value(Value),
    One(Box<Document>),
    Many(Vec<Document>),
}

impl Property {
    /// Plain JSON rendering (embedded documents become objects)
    pub fn to_json(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::One(doc) => doc.to_json(),
            Self::Many(docs) => Value::Array(docs.iter().map(Document::to_json).collect()),
        }
    }
}

impl From<Value> for Property {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Document> for Property {
    fn from(doc: Document) -> Self {
        Self::One(Box::new(doc))
    }
}

impl From<Vec<Document>> for Property {
    fn from(docs: Vec<Document>) -> Self {
        Self::Many(docs)
    }
}

impl Serialize for Property {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::One(doc) => doc.serialize(serializer),
            Self::Many(docs) => docs.serialize(serializer),
        }
    }
}

/// Construction options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Start with no dirty fields
    pub mark_clean: bool,
    /// Document has not been persisted yet
    pub mark_new: bool,
    /// Alias of the repository the document belongs to
    pub source: Option<String>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            mark_clean: false,
            mark_new: true,
            source: None,
        }
    }
}

impl DocumentOptions {
    /// Options for a document loaded from a search hit
    pub fn persisted(source: impl Into<String>) -> Self {
        Self {
            mark_clean: true,
            mark_new: false,
            source: Some(source.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    doc_type: TypeRef,
    properties: IndexMap<String, Property>,
    errors: IndexMap<String, Vec<String>>,
    dirty: BTreeSet<String>,
    is_new: bool,
    source: Option<String>,
}

impl Document {
    /// Generic document from plain JSON data
    pub fn new(data: Map<String, Value>, options: DocumentOptions) -> Self {
        let properties = data
            .into_iter()
            .map(|(k, v)| (k, Property::Value(v)))
            .collect();
        Self::from_properties(TypeRef::Generic, properties, options)
    }

    /// Document of `doc_type` from already-built properties
    pub fn from_properties(
        doc_type: TypeRef,
        properties: IndexMap<String, Property>,
        options: DocumentOptions,
    ) -> Self {
        let dirty = if options.mark_clean {
            BTreeSet::new()
        } else {
            properties.keys().cloned().collect()
        };
        Self {
            doc_type,
            properties,
            errors: IndexMap::new(),
            dirty,
            is_new: options.mark_new,
            source: options.source,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Properties
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Plain value of `name` (`None` for missing or embedded properties)
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        match self.properties.get(name) {
            Some(Property::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Single embedded document at `name`
    pub fn get_one(&self, name: &str) -> Option<&Document> {
        match self.properties.get(name) {
            Some(Property::One(doc)) => Some(doc),
            _ => None,
        }
    }

    /// Embedded document list at `name`
    pub fn get_many(&self, name: &str) -> Option<&[Document]> {
        match self.properties.get(name) {
            Some(Property::Many(docs)) => Some(docs),
            _ => None,
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn properties(&self) -> &IndexMap<String, Property> {
        &self.properties
    }

    /// Set a property, marking it dirty when the value changes
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Property>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        if self.properties.get(&name) != Some(&value) {
            self.dirty.insert(name.clone());
            self.properties.insert(name, value);
        }
        self
    }

    pub fn set_many<K, V>(&mut self, values: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<Property>,
    {
        for (name, value) in values {
            self.set(name, value);
        }
        self
    }

    /// Document id, when present as a string or number
    pub fn id(&self) -> Option<String> {
        match self.get_value("id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    pub fn doc_type(&self) -> &TypeRef {
        &self.doc_type
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // State
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn set_new(&mut self, is_new: bool) -> &mut Self {
        self.is_new = is_new;
        self
    }

    /// Forget dirty fields and errors
    pub fn clean(&mut self) -> &mut Self {
        self.dirty.clear();
        self.errors.clear();
        self
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn is_field_dirty(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }

    pub fn dirty_fields(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    pub fn errors(&self) -> &IndexMap<String, Vec<String>> {
        &self.errors
    }

    pub fn field_errors(&self, name: &str) -> &[String] {
        self.errors.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_errors(&self) -> bool {
        self.errors.values().any(|e| !e.is_empty())
    }

    /// Replace the error list of each given field
    pub fn set_errors<K, E>(&mut self, errors: impl IntoIterator<Item = (K, Vec<E>)>) -> &mut Self
    where
        K: Into<String>,
        E: Into<String>,
    {
        for (field, messages) in errors {
            self.errors
                .insert(field.into(), messages.into_iter().map(Into::into).collect());
        }
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, source: impl Into<String>) -> &mut Self {
        self.source = Some(source.into());
        self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Conversion
    // ═══════════════════════════════════════════════════════════════════════════

    /// Plain JSON object of all properties
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.properties
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Deserialize the properties into a typed struct
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, OdmError> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.properties.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_new_defaults() {
        let doc = Document::new(data(json!({"name": "mark"})), DocumentOptions::default());

        assert!(doc.is_new());
        assert!(doc.is_dirty());
        assert!(doc.is_field_dirty("name"));
        assert!(doc.source().is_none());
        assert_eq!(doc.doc_type(), &TypeRef::Generic);
    }

    #[test]
    fn test_persisted_options() {
        let doc = Document::new(
            data(json!({"id": "7", "name": "mark"})),
            DocumentOptions::persisted("users"),
        );

        assert!(!doc.is_new());
        assert!(!doc.is_dirty());
        assert_eq!(doc.source(), Some("users"));
        assert_eq!(doc.id().as_deref(), Some("7"));
    }

    #[test]
    fn test_set_tracks_changes_only() {
        let mut doc = Document::new(
            data(json!({"name": "mark", "age": 35})),
            DocumentOptions::persisted("users"),
        );

        doc.set("name", json!("mark"));
        assert!(!doc.is_dirty());

        doc.set("age", json!(36));
        assert!(doc.is_field_dirty("age"));
        assert_eq!(doc.get_value("age"), Some(&json!(36)));

        doc.clean();
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_set_many() {
        let mut doc = Document::new(Map::new(), DocumentOptions::persisted("users"));
        doc.set_many([("a", json!(1)), ("b", json!(2))]);

        assert_eq!(doc.dirty_fields().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_errors() {
        let mut doc = Document::new(Map::new(), DocumentOptions::default());
        assert!(!doc.has_errors());

        doc.set_errors([("email", vec!["is required", "must be valid"])]);
        assert!(doc.has_errors());
        assert_eq!(doc.field_errors("email").len(), 2);
        assert!(doc.field_errors("name").is_empty());

        doc.clean();
        assert!(!doc.has_errors());
    }

    #[test]
    fn test_embedded_properties() {
        let address = Document::new(
            data(json!({"city": "Lisbon"})),
            DocumentOptions::persisted("users"),
        );
        let mut props = IndexMap::new();
        props.insert("name".to_string(), Property::Value(json!("mark")));
        props.insert("address".to_string(), Property::from(address.clone()));
        props.insert("tags".to_string(), Property::Many(vec![address.clone()]));

        let doc = Document::from_properties(
            TypeRef::named("User"),
            props,
            DocumentOptions::persisted("users"),
        );

        assert_eq!(doc.get_one("address"), Some(&address));
        assert_eq!(doc.get_many("tags").map(<[Document]>::len), Some(1));
        assert!(doc.get_value("address").is_none());
        assert_eq!(
            doc.to_json(),
            json!({"name": "mark", "address": {"city": "Lisbon"}, "tags": [{"city": "Lisbon"}]})
        );
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let doc = Document::new(
            data(json!({"b": 1, "a": [1, 2]})),
            DocumentOptions::default(),
        );
        assert_eq!(serde_json::to_value(&doc).unwrap(), doc.to_json());
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"b":1,"a":[1,2]}"#);
    }

    #[test]
    fn test_deserialize_typed() {
        #[derive(Deserialize)]
        struct User {
            name: String,
            age: u32,
        }

        let doc = Document::new(
            data(json!({"name": "mark", "age": 35, "extra": true})),
            DocumentOptions::default(),
        );
        let user: User = doc.deserialize().unwrap();
        assert_eq!(user.name, "mark");
        assert_eq!(user.age, 35);

        let err = doc.deserialize::<Vec<u32>>();
        assert!(matches!(err, Err(OdmError::Serialization(_))));
    }

    #[test]
    fn test_numeric_id() {
        let doc = Document::new(data(json!({"id": 42})), DocumentOptions::default());
        assert_eq!(doc.id().as_deref(), Some("42"));
    }
}
