//! Syntax tree handed over by the host compiler for one compilation unit.
//!
//! Nodes are immutable and shared through [`NodeRef`]. Rewriting never
//! touches a node in place: [`Node::map_children`] builds a new parent only
//! when at least one child changed, so untouched subtrees keep their
//! original allocation.
//!
//! Constructs without a dedicated variant are handed over as a
//! [`Node::Fragment`]: printed text pieces interleaved with child nodes, so
//! expressions inside them are still visited.

use crate::types::Property;
use crate::utils::identifier_words;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

pub type NodeRef = Rc<Node>;

/// Host identity of a call expression, used by the type resolver to find
/// the call's resolved signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Id carried by nodes built by this pass rather than parsed by the host.
    pub const SYNTHETIC: NodeId = NodeId(u32::MAX);

    pub fn is_synthetic(self) -> bool {
        self == Self::SYNTHETIC
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::SYNTHETIC
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub file_name: PathBuf,
    #[serde(default)]
    pub statements: Vec<NodeRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    #[default]
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn keyword(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_annotation: Option<TypeNode>,
    #[serde(default)]
    pub initializer: Option<NodeRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_annotation: Option<TypeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSpecifier {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl ImportSpecifier {
    /// Name the import is bound to inside the importing file.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportClause {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub named: Vec<ImportSpecifier>,
}

impl ImportClause {
    /// Every name the clause binds in the importing file.
    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.default
            .as_deref()
            .into_iter()
            .chain(self.namespace.as_deref())
            .chain(self.named.iter().map(ImportSpecifier::local_name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDeclaration {
    /// `None` for side-effect imports (`import "m";`).
    #[serde(default)]
    pub clause: Option<ImportClause>,
    pub module_specifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpression {
    #[serde(default)]
    pub id: NodeId,
    pub callee: NodeRef,
    #[serde(default)]
    pub type_arguments: Vec<TypeNode>,
    #[serde(default)]
    pub arguments: Vec<NodeRef>,
}

impl CallExpression {
    /// Dotted text of the callee (`toDates`, `lib.toDates`), or `None` when
    /// the callee is not a plain name or property chain.
    pub fn callee_text(&self) -> Option<String> {
        dotted_name(&self.callee)
    }
}

fn dotted_name(node: &Node) -> Option<String> {
    match node {
        Node::Identifier { name } => Some(name.clone()),
        Node::PropertyAccess { object, name } => {
            dotted_name(object).map(|prefix| format!("{}.{}", prefix, name))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectProperty {
    pub name: String,
    pub value: NodeRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Import(ImportDeclaration),
    Variable {
        #[serde(default)]
        var_kind: VarKind,
        declarations: Vec<VariableDeclaration>,
    },
    Expression {
        expression: NodeRef,
    },
    Return {
        #[serde(default)]
        value: Option<NodeRef>,
    },
    Function {
        name: String,
        #[serde(default)]
        is_async: bool,
        #[serde(default)]
        params: Vec<Parameter>,
        #[serde(default)]
        return_type: Option<TypeNode>,
        #[serde(default)]
        body: Vec<NodeRef>,
    },
    Block {
        statements: Vec<NodeRef>,
    },
    /// `export <declaration>`
    Export {
        declaration: NodeRef,
    },
    /// `export default <expression>;`
    ExportDefault {
        expression: NodeRef,
    },
    If {
        condition: NodeRef,
        then_branch: NodeRef,
        #[serde(default)]
        else_branch: Option<NodeRef>,
    },
    For {
        #[serde(default)]
        init: Option<NodeRef>,
        #[serde(default)]
        condition: Option<NodeRef>,
        #[serde(default)]
        update: Option<NodeRef>,
        body: NodeRef,
    },
    /// `for (<var_kind> <binding> of <iterable>)`
    ForOf {
        #[serde(default)]
        var_kind: VarKind,
        binding: String,
        iterable: NodeRef,
        body: NodeRef,
    },
    While {
        condition: NodeRef,
        body: NodeRef,
    },
    Try {
        block: Vec<NodeRef>,
        #[serde(default)]
        catch_param: Option<String>,
        #[serde(default)]
        handler: Option<Vec<NodeRef>>,
        #[serde(default)]
        finalizer: Option<Vec<NodeRef>>,
    },
    Throw {
        value: NodeRef,
    },
    Class {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        extends: Option<NodeRef>,
        #[serde(default)]
        members: Vec<NodeRef>,
    },
    Method {
        name: String,
        #[serde(default)]
        is_static: bool,
        #[serde(default)]
        is_async: bool,
        #[serde(default)]
        params: Vec<Parameter>,
        #[serde(default)]
        return_type: Option<TypeNode>,
        #[serde(default)]
        body: Vec<NodeRef>,
    },
    ClassField {
        name: String,
        #[serde(default)]
        is_static: bool,
        #[serde(default, rename = "type")]
        type_annotation: Option<TypeNode>,
        #[serde(default)]
        initializer: Option<NodeRef>,
    },
    Comment {
        text: String,
    },
    /// Raw source text, printed back as-is and never inspected. Only
    /// constructs without marker calls inside may be handed over this way.
    Verbatim {
        text: String,
    },
    /// Any other construct: its parts print in order, `Verbatim` parts as
    /// raw text, and every part is visited.
    Fragment {
        parts: Vec<NodeRef>,
    },
    Identifier {
        name: String,
    },
    String {
        value: String,
    },
    Number {
        value: String,
    },
    Array {
        elements: Vec<NodeRef>,
    },
    Object {
        properties: Vec<ObjectProperty>,
    },
    PropertyAccess {
        object: NodeRef,
        name: String,
    },
    ElementAccess {
        object: NodeRef,
        index: NodeRef,
    },
    Call(CallExpression),
    New {
        callee: NodeRef,
        #[serde(default)]
        arguments: Vec<NodeRef>,
    },
    Await {
        expression: NodeRef,
    },
    /// `<condition> ? <when_true> : <when_false>`
    Conditional {
        condition: NodeRef,
        when_true: NodeRef,
        when_false: NodeRef,
    },
    /// Infix operator, assignments included.
    Binary {
        operator: String,
        left: NodeRef,
        right: NodeRef,
    },
    /// Prefix operator (`!x`, `typeof x`).
    Unary {
        operator: String,
        operand: NodeRef,
    },
    Arrow {
        #[serde(default)]
        is_async: bool,
        #[serde(default)]
        params: Vec<Parameter>,
        body: NodeRef,
    },
}

impl Node {
    pub fn identifier(name: impl Into<String>) -> NodeRef {
        Rc::new(Node::Identifier { name: name.into() })
    }

    pub fn string(value: impl Into<String>) -> NodeRef {
        Rc::new(Node::String {
            value: value.into(),
        })
    }

    pub fn verbatim(text: impl Into<String>) -> NodeRef {
        Rc::new(Node::Verbatim { text: text.into() })
    }

    pub fn array(elements: Vec<NodeRef>) -> NodeRef {
        Rc::new(Node::Array { elements })
    }

    pub fn property_access(object: NodeRef, name: impl Into<String>) -> NodeRef {
        Rc::new(Node::PropertyAccess {
            object,
            name: name.into(),
        })
    }

    /// Synthesized call without type arguments.
    pub fn call(callee: NodeRef, arguments: Vec<NodeRef>) -> NodeRef {
        Rc::new(Node::Call(CallExpression {
            id: NodeId::SYNTHETIC,
            callee,
            type_arguments: Vec::new(),
            arguments,
        }))
    }

    pub fn expression_statement(expression: NodeRef) -> NodeRef {
        Rc::new(Node::Expression { expression })
    }

    pub fn var(var_kind: VarKind, name: impl Into<String>, initializer: NodeRef) -> NodeRef {
        Rc::new(Node::Variable {
            var_kind,
            declarations: vec![VariableDeclaration {
                name: name.into(),
                type_annotation: None,
                initializer: Some(initializer),
            }],
        })
    }

    pub fn as_call(&self) -> Option<&CallExpression> {
        match self {
            Node::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_import(&self) -> Option<&ImportDeclaration> {
        match self {
            Node::Import(import) => Some(import),
            _ => None,
        }
    }

    /// Visit every direct child node in source order.
    pub fn for_each_child(&self, f: &mut dyn FnMut(&NodeRef)) {
        fn opt(node: &Option<NodeRef>, f: &mut dyn FnMut(&NodeRef)) {
            if let Some(node) = node {
                f(node);
            }
        }

        match self {
            Node::Variable { declarations, .. } => {
                for declaration in declarations {
                    opt(&declaration.initializer, f);
                }
            }
            Node::Expression { expression }
            | Node::ExportDefault { expression }
            | Node::Await { expression } => f(expression),
            Node::Export { declaration } => f(declaration),
            Node::Return { value } => opt(value, f),
            Node::Throw { value } => f(value),
            Node::Function { body, .. } | Node::Method { body, .. } => body.iter().for_each(|n| f(n)),
            Node::Block { statements } => statements.iter().for_each(|n| f(n)),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                f(condition);
                f(then_branch);
                opt(else_branch, f);
            }
            Node::For {
                init,
                condition,
                update,
                body,
            } => {
                opt(init, f);
                opt(condition, f);
                opt(update, f);
                f(body);
            }
            Node::ForOf { iterable, body, .. } => {
                f(iterable);
                f(body);
            }
            Node::While { condition, body } => {
                f(condition);
                f(body);
            }
            Node::Try {
                block,
                handler,
                finalizer,
                ..
            } => {
                block.iter().for_each(|n| f(n));
                handler.iter().flatten().for_each(|n| f(n));
                finalizer.iter().flatten().for_each(|n| f(n));
            }
            Node::Class {
                extends, members, ..
            } => {
                opt(extends, f);
                members.iter().for_each(|n| f(n));
            }
            Node::ClassField { initializer, .. } => opt(initializer, f),
            Node::Fragment { parts } => parts.iter().for_each(|n| f(n)),
            Node::Array { elements } => elements.iter().for_each(|n| f(n)),
            Node::Object { properties } => properties.iter().for_each(|p| f(&p.value)),
            Node::PropertyAccess { object, .. } => f(object),
            Node::ElementAccess { object, index } => {
                f(object);
                f(index);
            }
            Node::Call(call) => {
                f(&call.callee);
                call.arguments.iter().for_each(|n| f(n));
            }
            Node::New { callee, arguments } => {
                f(callee);
                arguments.iter().for_each(|n| f(n));
            }
            Node::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                f(condition);
                f(when_true);
                f(when_false);
            }
            Node::Binary { left, right, .. } => {
                f(left);
                f(right);
            }
            Node::Unary { operand, .. } => f(operand),
            Node::Arrow { body, .. } => f(body),
            Node::Import(_)
            | Node::Comment { .. }
            | Node::Verbatim { .. }
            | Node::Identifier { .. }
            | Node::String { .. }
            | Node::Number { .. } => {}
        }
    }

    /// Rebuild `node` with every child passed through `f`.
    ///
    /// `f` returning `None` removes the child from statement lists (blocks,
    /// bodies, class members, fragment parts). In single-child positions
    /// `None` keeps the original child. The returned node is `node` itself
    /// when nothing changed.
    pub fn map_children<F>(node: &NodeRef, f: &mut F) -> NodeRef
    where
        F: FnMut(&NodeRef) -> Option<NodeRef>,
    {
        let mut changed = false;
        let c = &mut changed;

        let rebuilt = match node.as_ref() {
            Node::Variable {
                var_kind,
                declarations,
            } => Node::Variable {
                var_kind: *var_kind,
                declarations: declarations
                    .iter()
                    .map(|d| VariableDeclaration {
                        name: d.name.clone(),
                        type_annotation: d.type_annotation.clone(),
                        initializer: map_opt(&d.initializer, f, c),
                    })
                    .collect(),
            },
            Node::Expression { expression } => Node::Expression {
                expression: map_one(expression, f, c),
            },
            Node::ExportDefault { expression } => Node::ExportDefault {
                expression: map_one(expression, f, c),
            },
            Node::Export { declaration } => Node::Export {
                declaration: map_one(declaration, f, c),
            },
            Node::Return { value } => Node::Return {
                value: map_opt(value, f, c),
            },
            Node::Throw { value } => Node::Throw {
                value: map_one(value, f, c),
            },
            Node::Function {
                name,
                is_async,
                params,
                return_type,
                body,
            } => Node::Function {
                name: name.clone(),
                is_async: *is_async,
                params: params.clone(),
                return_type: return_type.clone(),
                body: map_list(body, f, c),
            },
            Node::Method {
                name,
                is_static,
                is_async,
                params,
                return_type,
                body,
            } => Node::Method {
                name: name.clone(),
                is_static: *is_static,
                is_async: *is_async,
                params: params.clone(),
                return_type: return_type.clone(),
                body: map_list(body, f, c),
            },
            Node::Block { statements } => Node::Block {
                statements: map_list(statements, f, c),
            },
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => Node::If {
                condition: map_one(condition, f, c),
                then_branch: map_one(then_branch, f, c),
                else_branch: map_opt(else_branch, f, c),
            },
            Node::For {
                init,
                condition,
                update,
                body,
            } => Node::For {
                init: map_opt(init, f, c),
                condition: map_opt(condition, f, c),
                update: map_opt(update, f, c),
                body: map_one(body, f, c),
            },
            Node::ForOf {
                var_kind,
                binding,
                iterable,
                body,
            } => Node::ForOf {
                var_kind: *var_kind,
                binding: binding.clone(),
                iterable: map_one(iterable, f, c),
                body: map_one(body, f, c),
            },
            Node::While { condition, body } => Node::While {
                condition: map_one(condition, f, c),
                body: map_one(body, f, c),
            },
            Node::Try {
                block,
                catch_param,
                handler,
                finalizer,
            } => Node::Try {
                block: map_list(block, f, c),
                catch_param: catch_param.clone(),
                handler: handler.as_ref().map(|h| map_list(h, f, c)),
                finalizer: finalizer.as_ref().map(|h| map_list(h, f, c)),
            },
            Node::Class {
                name,
                extends,
                members,
            } => Node::Class {
                name: name.clone(),
                extends: map_opt(extends, f, c),
                members: map_list(members, f, c),
            },
            Node::ClassField {
                name,
                is_static,
                type_annotation,
                initializer,
            } => Node::ClassField {
                name: name.clone(),
                is_static: *is_static,
                type_annotation: type_annotation.clone(),
                initializer: map_opt(initializer, f, c),
            },
            Node::Fragment { parts } => Node::Fragment {
                parts: map_list(parts, f, c),
            },
            Node::Array { elements } => Node::Array {
                elements: elements.iter().map(|e| map_one(e, f, c)).collect(),
            },
            Node::Object { properties } => Node::Object {
                properties: properties
                    .iter()
                    .map(|p| ObjectProperty {
                        name: p.name.clone(),
                        value: map_one(&p.value, f, c),
                    })
                    .collect(),
            },
            Node::PropertyAccess { object, name } => Node::PropertyAccess {
                object: map_one(object, f, c),
                name: name.clone(),
            },
            Node::ElementAccess { object, index } => Node::ElementAccess {
                object: map_one(object, f, c),
                index: map_one(index, f, c),
            },
            Node::Call(call) => Node::Call(CallExpression {
                id: call.id,
                callee: map_one(&call.callee, f, c),
                type_arguments: call.type_arguments.clone(),
                arguments: call.arguments.iter().map(|a| map_one(a, f, c)).collect(),
            }),
            Node::New { callee, arguments } => Node::New {
                callee: map_one(callee, f, c),
                arguments: arguments.iter().map(|a| map_one(a, f, c)).collect(),
            },
            Node::Await { expression } => Node::Await {
                expression: map_one(expression, f, c),
            },
            Node::Conditional {
                condition,
                when_true,
                when_false,
            } => Node::Conditional {
                condition: map_one(condition, f, c),
                when_true: map_one(when_true, f, c),
                when_false: map_one(when_false, f, c),
            },
            Node::Binary {
                operator,
                left,
                right,
            } => Node::Binary {
                operator: operator.clone(),
                left: map_one(left, f, c),
                right: map_one(right, f, c),
            },
            Node::Unary { operator, operand } => Node::Unary {
                operator: operator.clone(),
                operand: map_one(operand, f, c),
            },
            Node::Arrow {
                is_async,
                params,
                body,
            } => Node::Arrow {
                is_async: *is_async,
                params: params.clone(),
                body: map_one(body, f, c),
            },
            Node::Import(_)
            | Node::Comment { .. }
            | Node::Verbatim { .. }
            | Node::Identifier { .. }
            | Node::String { .. }
            | Node::Number { .. } => return node.clone(),
        };

        if changed {
            Rc::new(rebuilt)
        } else {
            node.clone()
        }
    }
}

fn map_one<F>(child: &NodeRef, f: &mut F, changed: &mut bool) -> NodeRef
where
    F: FnMut(&NodeRef) -> Option<NodeRef>,
{
    match f(child) {
        Some(new) => {
            if !Rc::ptr_eq(&new, child) {
                *changed = true;
            }
            new
        }
        None => child.clone(),
    }
}

fn map_opt<F>(child: &Option<NodeRef>, f: &mut F, changed: &mut bool) -> Option<NodeRef>
where
    F: FnMut(&NodeRef) -> Option<NodeRef>,
{
    child.as_ref().map(|child| map_one(child, f, changed))
}

fn map_list<F>(children: &[NodeRef], f: &mut F, changed: &mut bool) -> Vec<NodeRef>
where
    F: FnMut(&NodeRef) -> Option<NodeRef>,
{
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        match f(child) {
            Some(new) => {
                if !Rc::ptr_eq(&new, child) {
                    *changed = true;
                }
                out.push(new);
            }
            None => *changed = true,
        }
    }
    out
}

impl SourceFile {
    pub fn new(file_name: impl Into<PathBuf>, statements: Vec<NodeRef>) -> Self {
        Self {
            file_name: file_name.into(),
            statements,
        }
    }

    /// Every identifier bound or referenced anywhere in the unit, including
    /// property names and identifier-like words of verbatim text.
    pub fn identifiers(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for statement in &self.statements {
            collect_identifiers(statement, &mut names);
        }
        names
    }
}

fn collect_identifiers(node: &NodeRef, names: &mut BTreeSet<String>) {
    let params_of = |params: &[Parameter]| params.iter().map(|p| p.name.clone()).collect::<Vec<_>>();

    match node.as_ref() {
        Node::Identifier { name }
        | Node::PropertyAccess { name, .. }
        | Node::ClassField { name, .. } => {
            names.insert(name.clone());
        }
        Node::Variable { declarations, .. } => {
            names.extend(declarations.iter().map(|d| d.name.clone()));
        }
        Node::Function { name, params, .. } | Node::Method { name, params, .. } => {
            names.insert(name.clone());
            names.extend(params_of(params));
        }
        Node::Arrow { params, .. } => names.extend(params_of(params)),
        Node::Class { name, .. } => names.extend(name.iter().cloned()),
        Node::ForOf { binding, .. } => {
            names.insert(binding.clone());
        }
        Node::Try { catch_param, .. } => names.extend(catch_param.iter().cloned()),
        Node::Import(import) => {
            if let Some(clause) = &import.clause {
                names.extend(clause.local_names().map(str::to_string));
            }
        }
        Node::Verbatim { text } | Node::Comment { text } => {
            names.extend(identifier_words(text).map(str::to_string));
        }
        _ => {}
    }

    node.for_each_child(&mut |child: &NodeRef| collect_identifiers(child, names));
}

/// Type syntax as written in the source (a property's declared type, a call's
/// type argument).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeNode {
    /// `T[]`
    Array { element: Box<TypeNode> },
    /// `Name` or `Name<Args>`
    Reference {
        name: String,
        #[serde(default)]
        args: Vec<TypeNode>,
    },
    /// `A | B`
    Union { members: Vec<TypeNode> },
    /// `A & B`
    Intersection { members: Vec<TypeNode> },
    /// `{ createdAt: Date; name: string }`
    TypeLiteral {
        #[serde(default)]
        members: Vec<Property>,
    },
    /// `(T)`
    Parenthesized { inner: Box<TypeNode> },
    /// `string`, `number`, `null`, ...
    Keyword { name: String },
    /// Type syntax with no structure this pass uses (mapped, conditional,
    /// template literal types, ...). Never resolves.
    Opaque { text: String },
}

impl TypeNode {
    pub fn reference(name: impl Into<String>) -> Self {
        TypeNode::Reference {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeNode>) -> Self {
        TypeNode::Reference {
            name: name.into(),
            args,
        }
    }

    pub fn array(element: TypeNode) -> Self {
        TypeNode::Array {
            element: Box::new(element),
        }
    }

    pub fn union(members: Vec<TypeNode>) -> Self {
        TypeNode::Union { members }
    }

    pub fn intersection(members: Vec<TypeNode>) -> Self {
        TypeNode::Intersection { members }
    }

    pub fn literal(members: Vec<Property>) -> Self {
        TypeNode::TypeLiteral { members }
    }

    pub fn parenthesized(inner: TypeNode) -> Self {
        TypeNode::Parenthesized {
            inner: Box::new(inner),
        }
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        TypeNode::Keyword { name: name.into() }
    }
}

fn join_types(f: &mut fmt::Formatter<'_>, members: &[TypeNode], separator: &str) -> fmt::Result {
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", member)?;
    }
    Ok(())
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNode::Array { element } => match element.as_ref() {
                TypeNode::Union { .. } | TypeNode::Intersection { .. } => {
                    write!(f, "({})[]", element)
                }
                _ => write!(f, "{}[]", element),
            },
            TypeNode::Reference { name, args } => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    join_types(f, args, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeNode::Union { members } => join_types(f, members, " | "),
            TypeNode::Intersection { members } => join_types(f, members, " & "),
            TypeNode::TypeLiteral { members } => {
                if members.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    match &member.declared_type {
                        Some(ty) => write!(f, "{}: {}", member.name, ty)?,
                        None => f.write_str(&member.name)?,
                    }
                }
                f.write_str(" }")
            }
            TypeNode::Parenthesized { inner } => write!(f, "({})", inner),
            TypeNode::Keyword { name } => f.write_str(name),
            TypeNode::Opaque { text } => f.write_str(text),
        }
    }
}
