//! Error types for Versa

use crate::model::{FieldType, MethodSet};
use crate::version::{ApiVersion, VersionParseError};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while assembling a [`VersionBundle`](crate::VersionBundle)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
    #[error("a version bundle needs at least one version")]
    Empty,
    #[error("version {0} is declared more than once")]
    Duplicate(ApiVersion),
    #[error("versions are not sorted correctly: {older} is listed before {newer}, please sort them newest first")]
    NotSorted { newer: ApiVersion, older: ApiVersion },
    #[error("the oldest version {0} cannot have any version changes because there is nothing older to migrate to")]
    OldestHasChanges(ApiVersion),
    #[error("version change \"{0}\" is bound to more than one version")]
    ChangeBoundTwice(String),
    #[error("version change \"{0}\" has no description")]
    MissingDescription(String),
    #[error(transparent)]
    Parse(#[from] VersionParseError),
    #[error("version {0} is not part of this bundle")]
    UnknownVersion(ApiVersion),
}

/// Errors in the head model itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("schema \"{schema}\" inherits from \"{parent}\" which is not registered")]
    UnknownParent { schema: String, parent: String },
    #[error("schema \"{0}\" has a cyclic parent chain")]
    ParentCycle(String),
    #[error("schema \"{0}\" is registered twice")]
    DuplicateSchema(String),
    #[error("enum \"{0}\" is registered twice")]
    DuplicateEnum(String),
    #[error("could not import JSON schema \"{name}\": {reason}")]
    Import { name: String, reason: String },
}

/// An instruction of a version change cannot be applied to the models of its version
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("\"{schema}\" used in \"{change}\" is not a registered schema.")]
    UnknownSchema { schema: String, change: String },

    #[error("You tried to add a field \"{field}\" to \"{schema}\" in \"{change}\" but there is already a field with that name.")]
    FieldAlreadyExists {
        schema: String,
        field: String,
        change: String,
    },

    #[error("You tried to delete a field \"{field}\" from \"{schema}\" in \"{change}\" but it doesn't have such a field.")]
    DeleteMissingField {
        schema: String,
        field: String,
        change: String,
    },

    #[error("You tried to change the type of field \"{field}\" from \"{schema}\" in \"{change}\" but it doesn't have such a field.")]
    ChangeMissingField {
        schema: String,
        field: String,
        change: String,
    },

    #[error("You tried to change the name of field \"{field}\" from \"{schema}\" in \"{change}\" but it already has that name.")]
    FieldNameUnchanged {
        schema: String,
        field: String,
        change: String,
    },

    #[error("You tried to change the name of field \"{field}\" from \"{schema}\" to \"{new_name}\" in \"{change}\" but there is already a field with that name.")]
    FieldNameTaken {
        schema: String,
        field: String,
        new_name: String,
        change: String,
    },

    #[error("You tried to change the type of field \"{field}\" to \"{ty}\" from \"{schema}\" in \"{change}\" but it already has type \"{ty}\"")]
    FieldTypeUnchanged {
        schema: String,
        field: String,
        ty: FieldType,
        change: String,
    },

    #[error("You tried to change the attribute \"{attribute}\" of field \"{field}\" from \"{schema}\" to {value} in \"{change}\" but it already has that value.")]
    FieldAttributeUnchanged {
        schema: String,
        field: String,
        attribute: String,
        value: Value,
        change: String,
    },

    #[error("You tried to delete the attribute \"{attribute}\" of field \"{field}\" from \"{schema}\" in \"{change}\" but it doesn't have that attribute.")]
    FieldAttributeMissing {
        schema: String,
        field: String,
        attribute: String,
        change: String,
    },

    #[error("Unknown field attribute \"{attribute}\" used in \"{change}\".")]
    UnknownAttribute { attribute: String, change: String },

    #[error("The value {value} is not valid for the attribute \"{attribute}\" of field \"{field}\" from \"{schema}\" in \"{change}\".")]
    InvalidAttributeValue {
        schema: String,
        field: String,
        attribute: String,
        value: Value,
        change: String,
    },

    #[error("You tried to change the name of \"{schema}\" in \"{change}\" but it already has that name.")]
    SchemaNameUnchanged { schema: String, change: String },

    #[error("You tried to rename \"{schema}\" to \"{name}\" in \"{change}\" but \"{other}\" is already exposed under that name.")]
    SchemaNameTaken {
        schema: String,
        name: String,
        other: String,
        change: String,
    },

    #[error("\"{enum_name}\" used in \"{change}\" is not a registered enum.")]
    UnknownEnum { enum_name: String, change: String },

    #[error("You tried to add a member \"{member}\" to \"{enum_name}\" in \"{change}\" but there is already a member with that value.")]
    EnumMemberUnchanged {
        enum_name: String,
        member: String,
        change: String,
    },

    #[error("You tried to delete a member \"{member}\" from \"{enum_name}\" in \"{change}\" but it doesn't have such a member.")]
    EnumMemberMissing {
        enum_name: String,
        member: String,
        change: String,
    },

    #[error("Endpoint \"[{methods}] {path}\" you tried to {action} in \"{change}\" doesn't exist in a newer version.")]
    EndpointNotFound {
        path: String,
        methods: MethodSet,
        action: &'static str,
        change: String,
    },

    #[error("You tried to restore endpoint \"[{methods}] {path}\" in \"{change}\" but it already exists.")]
    EndpointAlreadyExists {
        path: String,
        methods: MethodSet,
        change: String,
    },

    #[error("You tried to change the attribute \"{attribute}\" of endpoint \"[{methods}] {path}\" in \"{change}\" but it already has that value.")]
    EndpointAttributeUnchanged {
        path: String,
        methods: MethodSet,
        attribute: &'static str,
        change: String,
    },

    #[error("Endpoint \"[{methods}] {path}\" is defined more than once after applying \"{change}\".")]
    EndpointConflict {
        path: String,
        methods: MethodSet,
        change: String,
    },
}

/// A request or response migration failed
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The migration refused the payload
    #[error("{0}")]
    Rejected(String),
    /// The payload could not be (de)serialized inside a migration
    #[error("invalid body: {0}")]
    Body(#[from] serde_json::Error),
}

impl MigrationError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// Single violation found while validating a body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Dotted path to the offending value (`address.city`, `tags.2`)
    pub field: String,
    /// Machine readable code (`missing`, `type`, `max_length`, ...)
    pub code: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Body validation against a versioned schema failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("schema \"{0}\" does not exist in this version")]
    UnknownSchema(String),
    #[error("body failed validation with {} violation(s)", .0.len())]
    Invalid(Vec<FieldViolation>),
}

impl ValidationError {
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Invalid(violations) => violations,
            Self::UnknownSchema(_) => &[],
        }
    }
}
