//! Timestamp path discovery: walks a type's structured fields and collects
//! the field paths that lead to timestamp-typed values.

use crate::syntax::{Node, NodeRef, TypeNode};
use crate::types::{TypeId, TypeResolver};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{trace, warn};

/// Field names from the root type down to one timestamp-typed field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    /// `["owner", "joinedAt"]` as an array literal node.
    pub fn to_literal(&self) -> NodeRef {
        Node::array(self.0.iter().map(|s| Node::string(s.as_str())).collect())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self
            .0
            .iter()
            .map(|s| serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s)))
            .collect();
        write!(f, "[{}]", quoted.join(", "))
    }
}

/// Every timestamp path of one call site's type argument, in property
/// enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSet(Vec<FieldPath>);

impl PathSet {
    pub fn paths(&self) -> &[FieldPath] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldPath> {
        self.0.iter()
    }

    /// `[["createdAt"], ["owner", "joinedAt"]]` as an array literal node.
    pub fn to_literal(&self) -> NodeRef {
        Node::array(self.0.iter().map(FieldPath::to_literal).collect())
    }
}

impl From<Vec<FieldPath>> for PathSet {
    fn from(paths: Vec<FieldPath>) -> Self {
        Self(paths)
    }
}

impl fmt::Display for PathSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        write!(f, "[{}]", paths.join(", "))
    }
}

/// What a property's declared type resolved to, after unwrapping arrays and
/// dropping `null`/`undefined`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// A type whose fields are not inspected, named by its stringified form.
    Leaf(String),
    /// A class or interface to recurse into.
    Structured(TypeId),
}

/// Strip any number of array wrappers: `T[]`, `Array<T>`, `ReadonlyArray<T>`,
/// and the parentheses around them.
pub fn unwrap_array_type(mut node: &TypeNode) -> &TypeNode {
    loop {
        node = match node {
            TypeNode::Array { element } => element.as_ref(),
            TypeNode::Parenthesized { inner } => inner.as_ref(),
            TypeNode::Reference { name, args }
                if args.len() == 1 && (name == "Array" || name == "ReadonlyArray") =>
            {
                &args[0]
            }
            _ => return node,
        };
    }
}

/// Resolve a declared field type into a [`FieldType`]. `None` when the host
/// cannot resolve it.
///
/// A type whose name is `timestamp_type` is always a leaf, even when the host
/// models it as an interface (as `Date` is).
pub fn classify_field(
    resolver: &dyn TypeResolver,
    declared: &TypeNode,
    timestamp_type: &str,
) -> Option<FieldType> {
    let ty = resolver.type_from_type_node(unwrap_array_type(declared))?;
    let ty = resolver.non_nullable_type(ty);
    let name = resolver.type_to_string(ty);

    if name != timestamp_type && resolver.is_class_or_interface(ty) {
        Some(FieldType::Structured(ty))
    } else {
        Some(FieldType::Leaf(name))
    }
}

pub struct TimestampPathFinder<'a> {
    resolver: &'a dyn TypeResolver,
    timestamp_type: &'a str,
}

impl<'a> TimestampPathFinder<'a> {
    pub fn new(resolver: &'a dyn TypeResolver, timestamp_type: &'a str) -> Self {
        Self {
            resolver,
            timestamp_type,
        }
    }

    pub fn discover(&self, ty: TypeId) -> PathSet {
        self.discover_with_prefix(ty, &FieldPath::root())
    }

    pub fn discover_with_prefix(&self, ty: TypeId, prefix: &FieldPath) -> PathSet {
        let mut on_path = HashSet::new();
        let mut paths = Vec::new();
        self.walk(ty, prefix, &mut on_path, &mut paths);
        PathSet(paths)
    }

    fn walk(
        &self,
        ty: TypeId,
        prefix: &FieldPath,
        on_path: &mut HashSet<TypeId>,
        paths: &mut Vec<FieldPath>,
    ) {
        // A type already on the recursion path contributes nothing more.
        if !on_path.insert(ty) {
            warn!(
                "Cyclic type '{}' reached at {}; not descending again",
                self.resolver.type_to_string(ty),
                prefix
            );
            return;
        }

        for property in self.resolver.properties_of_type(ty) {
            let Some(declared) = &property.declared_type else {
                trace!("Skipping '{}': no declared type", property.name);
                continue;
            };

            match classify_field(self.resolver, declared, self.timestamp_type) {
                Some(FieldType::Leaf(name)) if name == self.timestamp_type => {
                    paths.push(prefix.child(&property.name));
                }
                Some(FieldType::Structured(inner)) => {
                    self.walk(inner, &prefix.child(&property.name), on_path, paths);
                }
                Some(FieldType::Leaf(name)) => {
                    trace!("Skipping '{}': leaf type {}", property.name, name);
                }
                None => {
                    trace!("Skipping '{}': unresolved type {}", property.name, declared);
                }
            }
        }

        on_path.remove(&ty);
    }
}

/// Collect the timestamp paths reachable from `ty`.
pub fn discover_timestamp_paths(
    ty: TypeId,
    resolver: &dyn TypeResolver,
    timestamp_type: &str,
) -> PathSet {
    TimestampPathFinder::new(resolver, timestamp_type).discover(ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{TypeDeclaration, TypeTable};
    use crate::types::Property;

    fn date() -> TypeNode {
        TypeNode::reference("Date")
    }

    fn paths_of(table: &TypeTable, name: &str) -> Vec<Vec<String>> {
        let ty = table.lookup(name).expect("type should be declared");
        discover_timestamp_paths(ty, table, "Date")
            .iter()
            .map(|p| p.segments().to_vec())
            .collect()
    }

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_timestamp_fields() {
        let table = TypeTable::new()
            .interface("Inner", vec![Property::new("count", TypeNode::keyword("number"))])
            .interface(
                "Outer",
                vec![
                    Property::new("name", TypeNode::keyword("string")),
                    Property::new("inner", TypeNode::reference("Inner")),
                ],
            );
        assert!(paths_of(&table, "Outer").is_empty());
    }

    #[test]
    fn test_direct_field() {
        let table = TypeTable::new().interface(
            "Payload",
            vec![
                Property::new("createdAt", date()),
                Property::new("name", TypeNode::keyword("string")),
            ],
        );
        assert_eq!(paths_of(&table, "Payload"), vec![path(&["createdAt"])]);
    }

    #[test]
    fn test_nested_field() {
        let table = TypeTable::new()
            .interface("Owner", vec![Property::new("joinedAt", date())])
            .class("Payload", vec![Property::new("owner", TypeNode::reference("Owner"))]);
        assert_eq!(paths_of(&table, "Payload"), vec![path(&["owner", "joinedAt"])]);
    }

    #[test]
    fn test_array_of_timestamps_is_one_path() {
        let table = TypeTable::new().interface(
            "Payload",
            vec![
                Property::new("tags", TypeNode::array(date())),
                Property::new("matrix", TypeNode::array(TypeNode::array(date()))),
                Property::new("generic", TypeNode::generic("ReadonlyArray", vec![date()])),
            ],
        );
        assert_eq!(
            paths_of(&table, "Payload"),
            vec![path(&["tags"]), path(&["matrix"]), path(&["generic"])]
        );
    }

    #[test]
    fn test_nullable_timestamp() {
        let table = TypeTable::new().interface(
            "Payload",
            vec![
                Property::new(
                    "maybe",
                    TypeNode::union(vec![date(), TypeNode::keyword("null")]),
                ),
                Property::new(
                    "either",
                    TypeNode::union(vec![date(), TypeNode::keyword("string")]),
                ),
            ],
        );
        assert_eq!(paths_of(&table, "Payload"), vec![path(&["maybe"])]);
    }

    #[test]
    fn test_array_of_structured_recurses() {
        let table = TypeTable::new()
            .interface("Event", vec![Property::new("at", date())])
            .interface(
                "Log",
                vec![Property::new(
                    "events",
                    TypeNode::array(TypeNode::union(vec![
                        TypeNode::reference("Event"),
                        TypeNode::keyword("undefined"),
                    ])),
                )],
            );
        assert_eq!(paths_of(&table, "Log"), vec![path(&["events", "at"])]);
    }

    #[test]
    fn test_unresolved_and_untyped_fields_are_skipped() {
        let table = TypeTable::new().interface(
            "Payload",
            vec![
                Property::new("generic", TypeNode::reference("T")),
                Property::untyped("inferred"),
                Property::new("createdAt", date()),
            ],
        );
        assert_eq!(paths_of(&table, "Payload"), vec![path(&["createdAt"])]);
    }

    #[test]
    fn test_self_referential_type_is_truncated() {
        let table = TypeTable::new()
            .interface(
                "Node",
                vec![
                    Property::new("at", date()),
                    Property::new(
                        "child",
                        TypeNode::union(vec![TypeNode::reference("Node"), TypeNode::keyword("undefined")]),
                    ),
                    Property::new("peer", TypeNode::reference("Peer")),
                ],
            )
            .interface(
                "Peer",
                vec![
                    Property::new("seenAt", date()),
                    Property::new("back", TypeNode::reference("Node")),
                ],
            );
        assert_eq!(
            paths_of(&table, "Node"),
            vec![path(&["at"]), path(&["peer", "seenAt"])]
        );
    }

    #[test]
    fn test_shared_type_reached_twice_is_walked_twice() {
        let table = TypeTable::new()
            .interface("Stamp", vec![Property::new("at", date())])
            .interface(
                "Pair",
                vec![
                    Property::new("left", TypeNode::reference("Stamp")),
                    Property::new("right", TypeNode::reference("Stamp")),
                ],
            );
        assert_eq!(
            paths_of(&table, "Pair"),
            vec![path(&["left", "at"]), path(&["right", "at"])]
        );
    }

    #[test]
    fn test_inherited_fields_and_prefix() {
        let table = TypeTable::new()
            .interface("Audited", vec![Property::new("updatedAt", date())])
            .with_declaration(
                TypeDeclaration::class("Doc", vec![Property::new("title", TypeNode::keyword("string"))])
                    .extends("Audited"),
            );
        let ty = table.lookup("Doc").unwrap();
        let found = TimestampPathFinder::new(&table, "Date")
            .discover_with_prefix(ty, &FieldPath::new(["payload"]));
        assert_eq!(found.paths(), &[FieldPath::new(["payload", "updatedAt"])]);
    }

    #[test]
    fn test_custom_timestamp_type() {
        let table = TypeTable::new()
            .class("Instant", vec![Property::new("epoch", TypeNode::keyword("number"))])
            .interface(
                "Payload",
                vec![
                    Property::new("at", TypeNode::reference("Instant")),
                    Property::new("legacy", date()),
                ],
            );
        let ty = table.lookup("Payload").unwrap();
        let found = discover_timestamp_paths(ty, &table, "Instant");
        assert_eq!(found.paths(), &[FieldPath::new(["at"])]);
    }

    #[test]
    fn test_cardinality_matches_reachable_leaves() {
        // Tree of depth 3 with two timestamp leaves and one structured child
        // per level.
        let mut table = TypeTable::new();
        for level in 0..3 {
            let mut properties = vec![
                Property::new("a", date()),
                Property::new("b", TypeNode::union(vec![date(), TypeNode::keyword("null")])),
                Property::new("c", TypeNode::keyword("number")),
            ];
            if level < 2 {
                properties.push(Property::new("next", TypeNode::reference(format!("L{}", level + 1))));
            }
            table.declare(TypeDeclaration::interface(format!("L{}", level), properties));
        }
        let ty = table.lookup("L0").unwrap();
        let found = discover_timestamp_paths(ty, &table, "Date");
        assert_eq!(found.len(), 6);
        assert!(found.iter().all(|p| p.segments().last().map_or(false, |s| s == "a" || s == "b")));
    }

    #[test]
    fn test_inline_literal_root_is_walked() {
        let table = TypeTable::new().interface("Owner", vec![Property::new("joinedAt", date())]);
        let root = TypeNode::literal(vec![
            Property::new("createdAt", date()),
            Property::new("owner", TypeNode::reference("Owner")),
            Property::new("name", TypeNode::keyword("string")),
        ]);
        let ty = table.type_from_type_node(&root).expect("literal resolves");

        let found = discover_timestamp_paths(ty, &table, "Date");
        assert_eq!(
            found.paths(),
            &[FieldPath::new(["createdAt"]), FieldPath::new(["owner", "joinedAt"])]
        );
    }

    #[test]
    fn test_nested_inline_literal_is_a_leaf() {
        let table = TypeTable::new().interface(
            "Payload",
            vec![
                Property::new(
                    "meta",
                    TypeNode::literal(vec![Property::new("seenAt", date())]),
                ),
                Property::new("at", date()),
            ],
        );
        assert_eq!(paths_of(&table, "Payload"), vec![path(&["at"])]);

        let meta = TypeNode::literal(vec![Property::new("seenAt", date())]);
        assert_eq!(
            classify_field(&table, &meta, "Date"),
            Some(FieldType::Leaf("{ seenAt: Date }".to_string()))
        );
    }

    #[test]
    fn test_parenthesized_array_elements() {
        let table = TypeTable::new().interface(
            "Payload",
            vec![
                Property::new(
                    "maybe",
                    TypeNode::array(TypeNode::parenthesized(TypeNode::union(vec![
                        date(),
                        TypeNode::keyword("null"),
                    ]))),
                ),
                Property::new(
                    "wrapped",
                    TypeNode::array(TypeNode::parenthesized(TypeNode::array(date()))),
                ),
                Property::new(
                    "keys",
                    TypeNode::Opaque {
                        text: "keyof Payload".to_string(),
                    },
                ),
            ],
        );
        assert_eq!(
            paths_of(&table, "Payload"),
            vec![path(&["maybe"]), path(&["wrapped"])]
        );
    }

    #[test]
    fn test_display_forms() {
        let set = PathSet::from(vec![
            FieldPath::new(["createdAt"]),
            FieldPath::new(["owner", "joinedAt"]),
        ]);
        assert_eq!(set.to_string(), r#"[["createdAt"], ["owner", "joinedAt"]]"#);
        assert_eq!(PathSet::default().to_string(), "[]");
    }
}
