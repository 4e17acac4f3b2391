//! Marker matching by resolved identity.
//!
//! An import matches when its specifier resolves to the marker's runtime
//! artifact; a call matches when its resolved signature is declared in the
//! marker's declaration file under the marker's name. Local names never
//! take part, so `import { toDates as td }` still matches and a `toDates`
//! imported from anywhere else does not. Paths are compared lexically and,
//! when they exist, after following symlinks.

use crate::config::MarkerIdentity;
use crate::resolve::ModuleResolver;
use crate::syntax::{CallExpression, ImportDeclaration, Node};
use crate::types::{DeclarationKind, TypeResolver};
use crate::utils::same_file;
use std::path::Path;
use tracing::trace;

pub struct MarkerMatcher<'a> {
    marker: &'a MarkerIdentity,
    modules: &'a dyn ModuleResolver,
    types: &'a dyn TypeResolver,
}

impl<'a> MarkerMatcher<'a> {
    pub fn new(
        marker: &'a MarkerIdentity,
        modules: &'a dyn ModuleResolver,
        types: &'a dyn TypeResolver,
    ) -> Self {
        Self {
            marker,
            modules,
            types,
        }
    }

    /// The import declaration in `node`, if it loads the marker module.
    pub fn match_import<'n>(
        &self,
        node: &'n Node,
        containing_file: &Path,
    ) -> Option<&'n ImportDeclaration> {
        let import = node.as_import()?;
        let resolved = self
            .modules
            .resolve(&import.module_specifier, containing_file)?;

        if same_file(&resolved, &self.marker.implementation) {
            Some(import)
        } else {
            None
        }
    }

    /// The call expression in `node`, if it calls the marker function.
    pub fn match_call<'n>(
        &self,
        node: &'n Node,
        containing_file: &Path,
    ) -> Option<&'n CallExpression> {
        let call = node.as_call()?;

        let Some(signature) = self.types.resolved_signature(call, containing_file) else {
            trace!("Unresolved signature for call {:?}", call.callee_text());
            return None;
        };
        let declaration = signature.declaration?;

        let matches = declaration.kind != DeclarationKind::JsDocSignature
            && same_file(&declaration.source_file, &self.marker.declaration)
            && declaration.name.as_deref() == Some(self.marker.function.as_str());

        matches.then_some(call)
    }

    pub fn is_marker_import(&self, node: &Node, containing_file: &Path) -> bool {
        self.match_import(node, containing_file).is_some()
    }

    pub fn is_marker_call(&self, node: &Node, containing_file: &Path) -> bool {
        self.match_call(node, containing_file).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::TypeTable;
    use crate::resolve::StaticModuleResolver;
    use crate::syntax::{ImportClause, ImportSpecifier, NodeId, TypeNode};
    use crate::types::SignatureDeclaration;
    use std::rc::Rc;

    const APP: &str = "/project/src/app.ts";
    const INDEX_JS: &str = "/project/node_modules/ts-transformer-dates/index.js";
    const INDEX_DTS: &str = "/project/node_modules/ts-transformer-dates/index.d.ts";

    fn marker() -> MarkerIdentity {
        MarkerIdentity::new(INDEX_JS, INDEX_DTS)
    }

    fn modules() -> StaticModuleResolver {
        StaticModuleResolver::new()
            .with_package("ts-transformer-dates", INDEX_JS)
            .with_package("other-dates", "/project/node_modules/other-dates/index.js")
            .with_file(
                "/project/node_modules/ts-transformer-dates/index",
                "/project/node_modules/ts-transformer-dates/./index.js",
            )
    }

    fn import(specifier: &str, alias: &str) -> Node {
        Node::Import(ImportDeclaration {
            clause: Some(ImportClause {
                named: vec![ImportSpecifier {
                    name: "toDates".to_string(),
                    alias: Some(alias.to_string()),
                }],
                ..ImportClause::default()
            }),
            module_specifier: specifier.to_string(),
        })
    }

    fn call(id: u32, callee: &str) -> Node {
        Node::Call(CallExpression {
            id: NodeId(id),
            callee: Node::identifier(callee),
            type_arguments: vec![TypeNode::reference("Payload")],
            arguments: vec![Node::identifier("data")],
        })
    }

    #[test]
    fn test_import_matches_by_resolved_path() {
        let marker = marker();
        let modules = modules();
        let types = TypeTable::new();
        let matcher = MarkerMatcher::new(&marker, &modules, &types);

        let app = Path::new(APP);
        assert!(matcher.is_marker_import(&import("ts-transformer-dates", "td"), app));
        assert!(matcher.is_marker_import(
            &import("../node_modules/ts-transformer-dates/index", "toDates"),
            app
        ));
        assert!(!matcher.is_marker_import(&import("other-dates", "toDates"), app));
        assert!(!matcher.is_marker_import(&import("not-installed", "toDates"), app));
        assert!(!matcher.is_marker_import(&call(1, "toDates"), app));
    }

    #[test]
    fn test_call_matches_by_declaration_identity() {
        let marker = marker();
        let modules = modules();
        let types = TypeTable::new()
            .bind_call(APP, NodeId(1), SignatureDeclaration::function(INDEX_DTS, "toDates"))
            .bind_call(
                APP,
                NodeId(2),
                SignatureDeclaration::function("/project/node_modules/other-dates/index.d.ts", "toDates"),
            )
            .bind_call(APP, NodeId(3), SignatureDeclaration::function(INDEX_DTS, "toDatesByArray"));
        let matcher = MarkerMatcher::new(&marker, &modules, &types);

        let app = Path::new(APP);
        assert!(matcher.is_marker_call(&call(1, "td"), app));
        assert!(!matcher.is_marker_call(&call(2, "toDates"), app));
        assert!(!matcher.is_marker_call(&call(3, "wrongName"), app));
        assert!(!matcher.is_marker_call(&call(4, "toDates"), app));
    }

    #[test]
    fn test_custom_marker_function_name() {
        let marker = marker().with_function("parseDates");
        let modules = modules();
        let types = TypeTable::new()
            .bind_call(APP, NodeId(1), SignatureDeclaration::function(INDEX_DTS, "parseDates"))
            .bind_call(APP, NodeId(2), SignatureDeclaration::function(INDEX_DTS, "toDates"));
        let matcher = MarkerMatcher::new(&marker, &modules, &types);

        let app = Path::new(APP);
        assert!(matcher.is_marker_call(&call(1, "parseDates"), app));
        assert!(!matcher.is_marker_call(&call(2, "toDates"), app));
    }

    #[test]
    fn test_jsdoc_and_anonymous_declarations_never_match() {
        let marker = marker();
        let modules = modules();
        let types = TypeTable::new()
            .bind_call(
                APP,
                NodeId(1),
                SignatureDeclaration {
                    kind: DeclarationKind::JsDocSignature,
                    source_file: INDEX_DTS.into(),
                    name: Some("toDates".to_string()),
                },
            )
            .bind_call(
                APP,
                NodeId(2),
                SignatureDeclaration {
                    kind: DeclarationKind::Function,
                    source_file: INDEX_DTS.into(),
                    name: None,
                },
            );
        let matcher = MarkerMatcher::new(&marker, &modules, &types);

        let app = Path::new(APP);
        assert!(!matcher.is_marker_call(&call(1, "documented"), app));
        assert!(!matcher.is_marker_call(&call(2, "anonymous"), app));
    }

    #[test]
    fn test_match_call_returns_the_call() {
        let marker = marker();
        let modules = modules();
        let types =
            TypeTable::new().bind_call(APP, NodeId(7), SignatureDeclaration::function(INDEX_DTS, "toDates"));
        let matcher = MarkerMatcher::new(&marker, &modules, &types);

        let node = Rc::new(call(7, "toDates"));
        let matched = matcher.match_call(&node, Path::new(APP)).expect("should match");
        assert_eq!(matched.id, NodeId(7));
    }
}
