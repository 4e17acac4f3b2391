//! In-memory type table implementing [`TypeResolver`].
//!
//! Hosts that precompute their type information (or tests) describe the
//! program's interfaces, classes and call bindings here, either through the
//! builder methods or from a JSON document:
//!
//! ```json
//! {
//!   "types": [
//!     { "name": "Payload", "kind": "interface", "properties": [
//!       { "name": "createdAt", "type": { "kind": "reference", "name": "Date" } }
//!     ] }
//!   ],
//!   "calls": [
//!     { "file": "/src/app.ts", "call": 12,
//!       "declaration": { "source_file": "/lib/index.d.ts", "name": "toDates" } }
//!   ]
//! }
//! ```
//!
//! Calls are bound by the host's [`NodeId`]. A binding keyed on `callee`
//! text instead only applies to calls with a synthetic id.

use crate::error::{Result, TransformerError};
use crate::syntax::{CallExpression, NodeId, TypeNode};
use crate::types::{Property, Signature, SignatureDeclaration, TypeId, TypeResolver};
use crate::utils::normalize_path;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Keywords that resolve to primitive (non-structured) types.
pub const PRIMITIVE_KEYWORDS: &[&str] = &[
    "string",
    "number",
    "boolean",
    "bigint",
    "symbol",
    "object",
    "null",
    "undefined",
    "void",
    "any",
    "unknown",
    "never",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    #[default]
    Interface,
    Class,
}

/// A class or interface declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,
    #[serde(default)]
    pub kind: ObjectKind,
    /// Base types whose properties are inherited after the own properties.
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl TypeDeclaration {
    pub fn interface(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Interface,
            extends: Vec::new(),
            properties,
        }
    }

    pub fn class(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self {
            kind: ObjectKind::Class,
            ..Self::interface(name, properties)
        }
    }

    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.extends.push(base.into());
        self
    }
}

/// Binds one call expression in a file to the declaration it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallBinding {
    pub file: PathBuf,
    /// Host id of the call expression.
    #[serde(default)]
    pub call: Option<NodeId>,
    /// Callee text (`name`, `ns.name`) for calls the host could not give an
    /// id to. Ignored when `call` is set.
    #[serde(default)]
    pub callee: Option<String>,
    pub declaration: SignatureDeclaration,
}

/// Serialized form of a [`TypeTable`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeTableDocument {
    #[serde(default)]
    pub types: Vec<TypeDeclaration>,
    #[serde(default)]
    pub calls: Vec<CallBinding>,
}

#[derive(Debug, Clone)]
enum TypeKind {
    Primitive(String),
    Object(TypeDeclaration),
    /// Inline object literal type.
    Anonymous(Vec<Property>),
    Array(TypeId),
    Union(Vec<TypeId>),
    Intersection(Vec<TypeId>),
}

#[derive(Debug)]
pub struct TypeTable {
    types: RefCell<Vec<TypeKind>>,
    named: HashMap<String, TypeId>,
    arrays: RefCell<HashMap<TypeId, TypeId>>,
    unions: RefCell<HashMap<Vec<TypeId>, TypeId>>,
    intersections: RefCell<HashMap<Vec<TypeId>, TypeId>>,
    literals: RefCell<HashMap<Vec<Property>, TypeId>>,
    calls: HashMap<(PathBuf, NodeId), SignatureDeclaration>,
    callees: HashMap<(PathBuf, String), SignatureDeclaration>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    /// Table holding the primitive keywords and the builtin `Date` interface.
    pub fn new() -> Self {
        let mut table = Self {
            types: RefCell::new(Vec::new()),
            named: HashMap::new(),
            arrays: RefCell::new(HashMap::new()),
            unions: RefCell::new(HashMap::new()),
            intersections: RefCell::new(HashMap::new()),
            literals: RefCell::new(HashMap::new()),
            calls: HashMap::new(),
            callees: HashMap::new(),
        };

        for keyword in PRIMITIVE_KEYWORDS {
            let id = table.push(TypeKind::Primitive(keyword.to_string()));
            table.named.insert(keyword.to_string(), id);
        }
        table.declare(TypeDeclaration::interface("Date", Vec::new()));

        table
    }

    pub fn from_document(document: TypeTableDocument) -> Self {
        let mut table = Self::new();
        for declaration in document.types {
            table.declare(declaration);
        }
        for binding in document.calls {
            table.add_call_binding(binding);
        }
        table
    }

    /// Declare a class or interface. Redeclaring an existing structured type
    /// merges the new properties and bases into it.
    pub fn declare(&mut self, declaration: TypeDeclaration) -> TypeId {
        if let Some(&id) = self.named.get(&declaration.name) {
            if let Some(TypeKind::Object(existing)) = self.types.get_mut().get_mut(id.0 as usize) {
                existing.properties.extend(declaration.properties);
                existing.extends.extend(declaration.extends);
                return id;
            }
        }

        let name = declaration.name.clone();
        let id = self.push(TypeKind::Object(declaration));
        self.named.insert(name, id);
        id
    }

    pub fn add_call_binding(&mut self, binding: CallBinding) {
        let file = normalize_path(&binding.file);
        match (binding.call, binding.callee) {
            (Some(id), _) => {
                self.calls.insert((file, id), binding.declaration);
            }
            (None, Some(callee)) => {
                self.callees.insert((file, callee), binding.declaration);
            }
            (None, None) => warn!(
                "Call binding in {} names neither a call id nor a callee; ignored",
                file.display()
            ),
        }
    }

    pub fn interface(mut self, name: impl Into<String>, properties: Vec<Property>) -> Self {
        self.declare(TypeDeclaration::interface(name, properties));
        self
    }

    pub fn class(mut self, name: impl Into<String>, properties: Vec<Property>) -> Self {
        self.declare(TypeDeclaration::class(name, properties));
        self
    }

    pub fn with_declaration(mut self, declaration: TypeDeclaration) -> Self {
        self.declare(declaration);
        self
    }

    pub fn bind_call(
        mut self,
        file: impl Into<PathBuf>,
        call: NodeId,
        declaration: SignatureDeclaration,
    ) -> Self {
        self.add_call_binding(CallBinding {
            file: file.into(),
            call: Some(call),
            callee: None,
            declaration,
        });
        self
    }

    /// Bind by callee text; only consulted for calls with a synthetic id.
    pub fn bind_callee(
        mut self,
        file: impl Into<PathBuf>,
        callee: impl Into<String>,
        declaration: SignatureDeclaration,
    ) -> Self {
        self.add_call_binding(CallBinding {
            file: file.into(),
            call: None,
            callee: Some(callee.into()),
            declaration,
        });
        self
    }

    /// Id of a declared type or primitive keyword.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.named.get(name).copied()
    }

    fn push(&self, kind: TypeKind) -> TypeId {
        let mut types = self.types.borrow_mut();
        let id = TypeId(types.len() as u32);
        types.push(kind);
        id
    }

    fn kind(&self, ty: TypeId) -> Option<TypeKind> {
        self.types.borrow().get(ty.0 as usize).cloned()
    }

    fn array_of(&self, element: TypeId) -> TypeId {
        let existing = self.arrays.borrow().get(&element).copied();
        if let Some(id) = existing {
            return id;
        }
        let id = self.push(TypeKind::Array(element));
        self.arrays.borrow_mut().insert(element, id);
        id
    }

    fn union_of(&self, members: Vec<TypeId>) -> TypeId {
        let mut flat: Vec<TypeId> = Vec::new();
        for member in members {
            let nested = match self.kind(member) {
                Some(TypeKind::Union(nested)) => nested,
                _ => vec![member],
            };
            for id in nested {
                if !flat.contains(&id) {
                    flat.push(id);
                }
            }
        }

        if let [single] = flat.as_slice() {
            return *single;
        }

        let existing = self.unions.borrow().get(&flat).copied();
        if let Some(id) = existing {
            return id;
        }
        let id = self.push(TypeKind::Union(flat.clone()));
        self.unions.borrow_mut().insert(flat, id);
        id
    }

    fn intersection_of(&self, members: Vec<TypeId>) -> TypeId {
        let mut flat: Vec<TypeId> = Vec::new();
        for member in members {
            let nested = match self.kind(member) {
                Some(TypeKind::Intersection(nested)) => nested,
                _ => vec![member],
            };
            for id in nested {
                if !flat.contains(&id) {
                    flat.push(id);
                }
            }
        }

        if let [single] = flat.as_slice() {
            return *single;
        }

        let existing = self.intersections.borrow().get(&flat).copied();
        if let Some(id) = existing {
            return id;
        }
        let id = self.push(TypeKind::Intersection(flat.clone()));
        self.intersections.borrow_mut().insert(flat, id);
        id
    }

    fn literal_of(&self, members: &[Property]) -> TypeId {
        let existing = self.literals.borrow().get(members).copied();
        if let Some(id) = existing {
            return id;
        }
        let id = self.push(TypeKind::Anonymous(members.to_vec()));
        self.literals.borrow_mut().insert(members.to_vec(), id);
        id
    }

    fn is_nullish(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), Some(TypeKind::Primitive(name)) if name == "null" || name == "undefined")
    }

    fn never(&self) -> TypeId {
        self.named["never"]
    }

    fn join_members(&self, members: &[TypeId], separator: &str) -> String {
        members
            .iter()
            .map(|m| self.type_to_string(*m))
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn collect_properties(&self, ty: TypeId, seen: &mut HashSet<TypeId>, out: &mut Vec<Property>) {
        if !seen.insert(ty) {
            return;
        }
        let push = |out: &mut Vec<Property>, properties: Vec<Property>| {
            for property in properties {
                if !out.iter().any(|p| p.name == property.name) {
                    out.push(property);
                }
            }
        };

        match self.kind(ty) {
            Some(TypeKind::Object(declaration)) => {
                push(out, declaration.properties);
                for base in &declaration.extends {
                    if let Some(base_id) = self.lookup(base) {
                        self.collect_properties(base_id, seen, out);
                    }
                }
            }
            Some(TypeKind::Anonymous(members)) => push(out, members),
            Some(TypeKind::Intersection(members)) => {
                for member in members {
                    self.collect_properties(member, seen, out);
                }
            }
            _ => {}
        }
    }
}

impl TypeResolver for TypeTable {
    fn properties_of_type(&self, ty: TypeId) -> Vec<Property> {
        let mut properties = Vec::new();
        self.collect_properties(ty, &mut HashSet::new(), &mut properties);
        properties
    }

    fn type_from_type_node(&self, node: &TypeNode) -> Option<TypeId> {
        match node {
            TypeNode::Keyword { name } => self.lookup(name),
            TypeNode::Reference { name, args } => match (name.as_str(), args.as_slice()) {
                ("Array" | "ReadonlyArray", [element]) => {
                    let element = self.type_from_type_node(element)?;
                    Some(self.array_of(element))
                }
                _ => self.lookup(name),
            },
            TypeNode::Array { element } => {
                let element = self.type_from_type_node(element)?;
                Some(self.array_of(element))
            }
            TypeNode::Union { members } => {
                let members = members
                    .iter()
                    .map(|m| self.type_from_type_node(m))
                    .collect::<Option<Vec<_>>>()?;
                Some(self.union_of(members))
            }
            TypeNode::Intersection { members } => {
                let members = members
                    .iter()
                    .map(|m| self.type_from_type_node(m))
                    .collect::<Option<Vec<_>>>()?;
                Some(self.intersection_of(members))
            }
            TypeNode::TypeLiteral { members } => Some(self.literal_of(members)),
            TypeNode::Parenthesized { inner } => self.type_from_type_node(inner),
            TypeNode::Opaque { .. } => None,
        }
    }

    fn non_nullable_type(&self, ty: TypeId) -> TypeId {
        match self.kind(ty) {
            Some(TypeKind::Union(members)) => {
                let kept: Vec<TypeId> = members
                    .into_iter()
                    .filter(|m| !self.is_nullish(*m))
                    .collect();
                if kept.is_empty() {
                    self.never()
                } else {
                    self.union_of(kept)
                }
            }
            _ if self.is_nullish(ty) => self.never(),
            _ => ty,
        }
    }

    fn type_to_string(&self, ty: TypeId) -> String {
        match self.kind(ty) {
            Some(TypeKind::Primitive(name)) => name,
            Some(TypeKind::Object(declaration)) => declaration.name,
            Some(TypeKind::Anonymous(members)) => TypeNode::literal(members).to_string(),
            Some(TypeKind::Array(element)) => match self.kind(element) {
                Some(TypeKind::Union(_) | TypeKind::Intersection(_)) => {
                    format!("({})[]", self.type_to_string(element))
                }
                _ => format!("{}[]", self.type_to_string(element)),
            },
            Some(TypeKind::Union(members)) => self.join_members(&members, " | "),
            Some(TypeKind::Intersection(members)) => members
                .iter()
                .map(|m| match self.kind(*m) {
                    Some(TypeKind::Union(_)) => format!("({})", self.type_to_string(*m)),
                    _ => self.type_to_string(*m),
                })
                .collect::<Vec<_>>()
                .join(" & "),
            None => "unknown".to_string(),
        }
    }

    fn is_class_or_interface(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), Some(TypeKind::Object(_)))
    }

    fn resolved_signature(
        &self,
        call: &CallExpression,
        containing_file: &Path,
    ) -> Option<Signature> {
        let file = normalize_path(containing_file);
        let declaration = if call.id.is_synthetic() {
            self.callees.get(&(file, call.callee_text()?))
        } else {
            self.calls.get(&(file, call.id))
        };
        declaration.map(|declaration| Signature {
            declaration: Some(declaration.clone()),
        })
    }
}

pub fn parse_type_table_file<P: AsRef<Path>>(path: P) -> Result<TypeTable> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| TransformerError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_type_table_content(&content)
}

pub fn parse_type_table_content(content: &str) -> Result<TypeTable> {
    let document: TypeTableDocument = serde_json::from_str(content)?;
    Ok(TypeTable::from_document(document))
}
