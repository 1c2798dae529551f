//! MVSTORE - Entity Model
//! The minimal field model carried as an MVCC payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Id, VersionStamp};

/// A single typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Field {
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Uuid(Uuid),
    Object(EntityObject),
}

/// Named fields, also used for nested objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityObject {
    fields: BTreeMap<String, Field>,
}

impl EntityObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the one it replaced.
    pub fn set_field(&mut self, name: impl Into<String>, value: Field) -> Option<Field> {
        self.fields.insert(name.into(), value)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// All fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// An entity as written by callers. The version is assigned by the write pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: Id,
    version: Option<VersionStamp>,
    fields: EntityObject,
}

impl Entity {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            version: None,
            fields: EntityObject::new(),
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn version(&self) -> Option<VersionStamp> {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: VersionStamp) {
        self.version = Some(version);
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Field) -> Option<Field> {
        self.fields.set_field(name, value)
    }

    /// Builder form of `set_field`.
    pub fn with_field(mut self, name: impl Into<String>, value: Field) -> Self {
        self.fields.set_field(name, value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.field(name)
    }

    pub fn fields(&self) -> &EntityObject {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_field_returns_previous() {
        let mut object = EntityObject::new();
        assert_eq!(object.set_field("verb", Field::String("go".into())), None);
        let old = object.set_field("verb", Field::String("stop".into()));
        assert_eq!(old, Some(Field::String("go".into())));
        assert_eq!(object.len(), 1);
    }

    #[test]
    fn test_nested_object() {
        let mut actor = EntityObject::new();
        actor.set_field("displayName", Field::String("Erin".into()));

        let entity = Entity::new(Id::new("activity"))
            .with_field("actor", Field::Object(actor.clone()))
            .with_field("content", Field::String("bragh".into()));

        match entity.field("actor") {
            Some(Field::Object(inner)) => assert_eq!(inner, &actor),
            other => panic!("unexpected field {:?}", other),
        }
        let names: Vec<&str> = entity.fields().fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["actor", "content"]);
    }

    #[test]
    fn test_new_entity_has_no_version() {
        assert!(Entity::new(Id::new("user")).version().is_none());
    }
}
