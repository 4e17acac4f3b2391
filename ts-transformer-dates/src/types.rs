//! Type-resolution interface supplied by the host compiler

use crate::syntax::{CallExpression, TypeNode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Opaque handle to a fully resolved type, owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

/// A property of a structured type as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    /// Declared type syntax. `None` for properties without an annotation.
    #[serde(rename = "type", default)]
    pub declared_type: Option<TypeNode>,
}

impl Property {
    pub fn new(name: impl Into<String>, declared_type: TypeNode) -> Self {
        Self {
            name: name.into(),
            declared_type: Some(declared_type),
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    #[default]
    Function,
    Method,
    /// `@callback`/`@typedef` signature that only exists in documentation.
    JsDocSignature,
}

/// The declaration a call's resolved signature points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureDeclaration {
    #[serde(default)]
    pub kind: DeclarationKind,
    /// File that contains the declaration.
    pub source_file: PathBuf,
    /// Declared name. Anonymous declarations have none.
    #[serde(default)]
    pub name: Option<String>,
}

impl SignatureDeclaration {
    pub fn function(source_file: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            kind: DeclarationKind::Function,
            source_file: source_file.into(),
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub declaration: Option<SignatureDeclaration>,
}

/// Read-only queries over the whole program's type information.
///
/// Implemented by the host. Every query is total: a miss is reported as
/// `None` or an empty list, never as an error.
pub trait TypeResolver {
    /// Properties of `ty`, in the order the host enumerates them.
    fn properties_of_type(&self, ty: TypeId) -> Vec<Property>;

    /// Resolve type syntax to a type. `None` when the node cannot be resolved.
    fn type_from_type_node(&self, node: &TypeNode) -> Option<TypeId>;

    /// `ty` with `null` and `undefined` removed.
    fn non_nullable_type(&self, ty: TypeId) -> TypeId;

    fn type_to_string(&self, ty: TypeId) -> String;

    /// True for class and interface types.
    fn is_class_or_interface(&self, ty: TypeId) -> bool;

    /// Signature the call resolves to, looked up in the unit `containing_file`.
    fn resolved_signature(
        &self,
        call: &CallExpression,
        containing_file: &Path,
    ) -> Option<Signature>;
}
