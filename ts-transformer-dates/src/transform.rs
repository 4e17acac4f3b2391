//! Per-unit rewrite of marker imports and marker calls.
//!
//! ```text
//! import { toDates } from "ts-transformer-dates";
//! const user = toDates<User>(json);
//! ```
//! becomes
//! ```text
//! var transformerDates_1 = require("ts-transformer-dates");
//! const user = transformerDates_1.toDatesByArray(json, [["createdAt"], ["profile", "birthday"]]);
//! ```

use crate::analysis::{unwrap_array_type, PathSet, TimestampPathFinder};
use crate::config::TransformConfig;
use crate::matcher::MarkerMatcher;
use crate::resolve::ModuleResolver;
use crate::syntax::{CallExpression, Node, NodeRef, SourceFile, VarKind};
use crate::types::TypeResolver;
use crate::utils::{identifier_words, unique_name};
use std::collections::BTreeSet;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Result of rewriting one compilation unit.
#[derive(Debug, Clone)]
pub struct UnitRewrite {
    pub file: SourceFile,
    /// Generated binding for the runtime module in this unit.
    pub binding: String,
    /// Marker imports found (only the first one is kept as a module load).
    pub imports_rewritten: usize,
    pub calls_rewritten: usize,
    /// Verbatim nodes mentioning a marker import's local name. Calls in
    /// there cannot be rewritten.
    pub opaque_marker_references: usize,
}

impl UnitRewrite {
    pub fn changed(&self) -> bool {
        self.imports_rewritten > 0 || self.calls_rewritten > 0
    }
}

/// State threaded through the visit of one unit.
struct RewriteContext<'u> {
    file_name: &'u Path,
    binding: String,
    /// Local names the unit's marker imports bind.
    marker_names: BTreeSet<String>,
    imports_rewritten: usize,
    calls_rewritten: usize,
    opaque_marker_references: usize,
}

pub struct DatesTransformer<'p> {
    types: &'p dyn TypeResolver,
    modules: &'p dyn ModuleResolver,
    config: TransformConfig,
}

impl<'p> DatesTransformer<'p> {
    pub fn new(
        types: &'p dyn TypeResolver,
        modules: &'p dyn ModuleResolver,
        config: TransformConfig,
    ) -> Self {
        Self {
            types,
            modules,
            config,
        }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    pub fn transform(&self, unit: &SourceFile) -> SourceFile {
        self.rewrite_unit(unit).file
    }

    pub fn rewrite_unit(&self, unit: &SourceFile) -> UnitRewrite {
        let matcher = MarkerMatcher::new(&self.config.marker, self.modules, self.types);
        let marker_names = unit
            .statements
            .iter()
            .filter_map(|statement| matcher.match_import(statement, &unit.file_name))
            .filter_map(|import| import.clause.as_ref())
            .flat_map(|clause| clause.local_names().map(str::to_string))
            .collect();
        let mut ctx = RewriteContext {
            file_name: &unit.file_name,
            binding: unique_name(&self.config.runtime.binding_prefix, &unit.identifiers()),
            marker_names,
            imports_rewritten: 0,
            calls_rewritten: 0,
            opaque_marker_references: 0,
        };

        let mut statements: Vec<NodeRef> = unit
            .statements
            .iter()
            .filter_map(|statement| self.visit(statement, &matcher, &mut ctx))
            .collect();

        // The marker was reached without a direct import (e.g. through a
        // re-exporting module): the binding still has to be defined.
        if ctx.calls_rewritten > 0 && ctx.imports_rewritten == 0 {
            statements.insert(0, self.module_load_statement(&ctx.binding));
        }

        debug!(
            "Rewrote {}: {} marker import(s), {} marker call(s)",
            unit.file_name.display(),
            ctx.imports_rewritten,
            ctx.calls_rewritten
        );

        UnitRewrite {
            file: SourceFile {
                file_name: unit.file_name.clone(),
                statements,
            },
            binding: ctx.binding,
            imports_rewritten: ctx.imports_rewritten,
            calls_rewritten: ctx.calls_rewritten,
            opaque_marker_references: ctx.opaque_marker_references,
        }
    }

    /// `None` removes the node from its statement list.
    fn visit(
        &self,
        node: &NodeRef,
        matcher: &MarkerMatcher<'_>,
        ctx: &mut RewriteContext<'_>,
    ) -> Option<NodeRef> {
        if let Some(import) = matcher.match_import(node, ctx.file_name) {
            ctx.imports_rewritten += 1;
            if ctx.imports_rewritten > 1 {
                debug!(
                    "Dropping repeated marker import '{}' in {}",
                    import.module_specifier,
                    ctx.file_name.display()
                );
                return None;
            }
            debug!(
                "Replacing marker import '{}' in {} with {}",
                import.module_specifier,
                ctx.file_name.display(),
                ctx.binding
            );
            return Some(self.module_load_statement(&ctx.binding));
        }

        if let Some(call) = matcher.match_call(node, ctx.file_name) {
            if let Some(rewritten) = self.rewrite_call(call, matcher, ctx) {
                return Some(rewritten);
            }
        }

        if let Node::Verbatim { text } = node.as_ref() {
            if identifier_words(text).any(|word| ctx.marker_names.contains(word)) {
                ctx.opaque_marker_references += 1;
                warn!(
                    "Verbatim text in {} mentions the marker and is left unrewritten: {}",
                    ctx.file_name.display(),
                    text
                );
            }
        }

        Some(Node::map_children(node, &mut |child: &NodeRef| {
            self.visit(child, matcher, ctx)
        }))
    }

    fn visit_expression(
        &self,
        node: &NodeRef,
        matcher: &MarkerMatcher<'_>,
        ctx: &mut RewriteContext<'_>,
    ) -> NodeRef {
        self.visit(node, matcher, ctx)
            .unwrap_or_else(|| Rc::clone(node))
    }

    /// `<binding>.toDatesByArray(payload, paths[, options])`, or `None` when
    /// the call lacks a type argument or a payload.
    fn rewrite_call(
        &self,
        call: &CallExpression,
        matcher: &MarkerMatcher<'_>,
        ctx: &mut RewriteContext<'_>,
    ) -> Option<NodeRef> {
        let Some(type_argument) = call.type_arguments.first() else {
            trace!(
                "Marker call {:?} in {} has no type argument; left as-is",
                call.callee_text(),
                ctx.file_name.display()
            );
            return None;
        };
        let payload = call.arguments.first()?;

        let paths = match self.types.type_from_type_node(unwrap_array_type(type_argument)) {
            Some(ty) => TimestampPathFinder::new(self.types, &self.config.types.timestamp).discover(ty),
            None => {
                trace!("Type argument {} is unresolved", type_argument);
                PathSet::default()
            }
        };
        debug!(
            "Marker call <{}> in {}: {}",
            type_argument,
            ctx.file_name.display(),
            paths
        );

        let mut arguments = vec![
            self.visit_expression(payload, matcher, ctx),
            paths.to_literal(),
        ];
        if let Some(options) = call.arguments.get(1) {
            arguments.push(self.visit_expression(options, matcher, ctx));
        }

        ctx.calls_rewritten += 1;

        Some(Node::call(
            Node::property_access(
                Node::identifier(ctx.binding.as_str()),
                self.config.runtime.function.as_str(),
            ),
            arguments,
        ))
    }

    /// `var <binding> = require("<runtime module>");`
    fn module_load_statement(&self, binding: &str) -> NodeRef {
        Node::var(
            VarKind::Var,
            binding,
            Node::call(
                Node::identifier("require"),
                vec![Node::string(self.config.runtime.module.as_str())],
            ),
        )
    }
}

/// Host-facing factory: one transformer per program, returning the per-unit
/// `tree -> tree` function.
pub fn transformer_factory<'p>(
    types: &'p dyn TypeResolver,
    modules: &'p dyn ModuleResolver,
    config: TransformConfig,
) -> impl Fn(&SourceFile) -> SourceFile + 'p {
    let transformer = DatesTransformer::new(types, modules, config);
    move |unit: &SourceFile| transformer.transform(unit)
}
