//! Structural checks run before any I/O.

use crate::codec;
use crate::error::{Result, StoreError};
use crate::model::{Entity, EntityObject, Field};
use crate::types::{Id, VersionStamp};

use super::entity::{MvccEntity, Payload};

/// An id needs a type name and a non-nil uuid.
pub fn verify_identity(id: &Id) -> Result<()> {
    if id.kind().is_empty() {
        return Err(StoreError::validation("id type is required"));
    }
    if id.uuid().is_nil() {
        return Err(StoreError::validation("id uuid is required"));
    }
    Ok(())
}

pub fn verify_version(version: VersionStamp) -> Result<()> {
    if version.is_nil() {
        return Err(StoreError::validation("version is required"));
    }
    Ok(())
}

/// Id and version must be valid; a payload, when present, must belong to the same id.
pub fn verify_mvcc_entity_optional_entity(entity: &MvccEntity) -> Result<()> {
    verify_identity(entity.id())?;
    verify_version(entity.version())?;
    if let Some(payload) = entity.entity() {
        if payload.id() != entity.id() {
            return Err(StoreError::validation(format!(
                "payload id {} does not match version id {}",
                payload.id(),
                entity.id()
            )));
        }
    }
    Ok(())
}

/// As above, and the payload must be present.
pub fn verify_mvcc_entity_with_entity(entity: &MvccEntity) -> Result<()> {
    verify_mvcc_entity_optional_entity(entity)?;
    match entity.payload() {
        Payload::Present(_) => Ok(()),
        _ => Err(StoreError::validation("entity payload is required")),
    }
}

/// Field names must be non-empty, recursively, and the encoded entity
/// must fit in `max_size` bytes.
pub fn verify_entity_write(entity: &Entity, max_size: usize) -> Result<()> {
    verify_identity(entity.id())?;
    verify_field_names(entity.fields())?;
    let size = codec::encode(entity)?.len();
    if size > max_size {
        return Err(StoreError::validation(format!(
            "entity {} is {} bytes, limit is {}",
            entity.id(),
            size,
            max_size
        )));
    }
    Ok(())
}

fn verify_field_names(object: &EntityObject) -> Result<()> {
    for (name, value) in object.fields() {
        if name.is_empty() {
            return Err(StoreError::validation("field name is required"));
        }
        if let Field::Object(nested) = value {
            verify_field_names(nested)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_identity_rules() {
        assert!(verify_identity(&Id::new("user")).is_ok());
        assert!(verify_identity(&Id::new("")).unwrap_err().is_validation());
        assert!(verify_identity(&Id::from_parts(Uuid::nil(), "user"))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_nil_version_rejected() {
        let entity = MvccEntity::new(Id::new("user"), VersionStamp::nil(), Payload::Pending);
        assert!(verify_mvcc_entity_optional_entity(&entity)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_payload_required() {
        let entity = MvccEntity::new(Id::new("user"), VersionStamp::new(), Payload::Pending);
        assert!(verify_mvcc_entity_optional_entity(&entity).is_ok());
        assert!(verify_mvcc_entity_with_entity(&entity).is_err());
    }

    #[test]
    fn test_payload_id_must_match() {
        let entity = MvccEntity::new(
            Id::new("user"),
            VersionStamp::new(),
            Payload::Present(Entity::new(Id::new("user"))),
        );
        assert!(verify_mvcc_entity_optional_entity(&entity).is_err());
    }

    #[test]
    fn test_entity_write_rules() {
        let mut nested = EntityObject::new();
        nested.set_field("", Field::Long(1));
        let entity = Entity::new(Id::new("user")).with_field("inner", Field::Object(nested));
        assert!(verify_entity_write(&entity, 1024).is_err());

        let big = Entity::new(Id::new("user")).with_field("blob", Field::String("x".repeat(200)));
        assert!(verify_entity_write(&big, 1024).is_ok());
        assert!(verify_entity_write(&big, 100).is_err());
    }
}
