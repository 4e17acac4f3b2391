//! TypeScript-flavored printer for syntax trees

use crate::syntax::{
    ImportDeclaration, Node, NodeRef, Parameter, SourceFile, TypeNode, VarKind,
    VariableDeclaration,
};
use crate::utils::is_identifier;

const INDENT: &str = "    ";

/// Render a whole unit, one statement per line.
pub fn print_source_file(file: &SourceFile) -> String {
    let mut printer = Printer::default();
    for statement in &file.statements {
        printer.statement(statement);
    }
    printer.out
}

/// Render a single node. Statements keep their `;` terminator, expressions
/// print bare.
pub fn print_node(node: &Node) -> String {
    let mut printer = Printer::default();
    if is_statement(node) {
        printer.statement_body(node);
    } else {
        printer.expression(node);
    }
    printer.out
}

fn is_statement(node: &Node) -> bool {
    matches!(
        node,
        Node::Import(_)
            | Node::Variable { .. }
            | Node::Expression { .. }
            | Node::Return { .. }
            | Node::Function { .. }
            | Node::Block { .. }
            | Node::Export { .. }
            | Node::ExportDefault { .. }
            | Node::If { .. }
            | Node::For { .. }
            | Node::ForOf { .. }
            | Node::While { .. }
            | Node::Try { .. }
            | Node::Throw { .. }
            | Node::Class { .. }
            | Node::Method { .. }
            | Node::ClassField { .. }
            | Node::Comment { .. }
            | Node::Verbatim { .. }
            | Node::Fragment { .. }
    )
}

fn string_literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        string_literal(name)
    }
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    fn statement(&mut self, node: &Node) {
        self.indent();
        self.statement_body(node);
        self.out.push('\n');
    }

    /// One statement without leading indentation or trailing newline.
    fn statement_body(&mut self, node: &Node) {
        match node {
            Node::Import(import) => self.import(import),
            Node::Variable {
                var_kind,
                declarations,
            } => {
                self.variable(*var_kind, declarations);
                self.out.push(';');
            }
            Node::Expression { expression } => {
                self.expression(expression);
                self.out.push(';');
            }
            Node::Return { value } => {
                self.out.push_str("return");
                if let Some(value) = value {
                    self.out.push(' ');
                    self.expression(value);
                }
                self.out.push(';');
            }
            Node::Throw { value } => {
                self.out.push_str("throw ");
                self.expression(value);
                self.out.push(';');
            }
            Node::Function {
                name,
                is_async,
                params,
                return_type,
                body,
            } => {
                if *is_async {
                    self.out.push_str("async ");
                }
                self.out.push_str("function ");
                self.out.push_str(name);
                self.signature(params, return_type.as_ref());
                self.out.push(' ');
                self.block(body);
            }
            Node::Block { statements } => self.block(statements),
            Node::Export { declaration } => {
                self.out.push_str("export ");
                self.statement_body(declaration);
            }
            Node::ExportDefault { expression } => {
                self.out.push_str("export default ");
                self.expression(expression);
                self.out.push(';');
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.out.push_str("if (");
                self.expression(condition);
                self.out.push_str(") ");
                self.statement_body(then_branch);
                if let Some(else_branch) = else_branch {
                    self.out.push_str(" else ");
                    self.statement_body(else_branch);
                }
            }
            Node::For {
                init,
                condition,
                update,
                body,
            } => {
                self.out.push_str("for (");
                match init.as_deref() {
                    Some(Node::Variable {
                        var_kind,
                        declarations,
                    }) => self.variable(*var_kind, declarations),
                    Some(init) => self.expression(init),
                    None => {}
                }
                self.out.push(';');
                if let Some(condition) = condition {
                    self.out.push(' ');
                    self.expression(condition);
                }
                self.out.push(';');
                if let Some(update) = update {
                    self.out.push(' ');
                    self.expression(update);
                }
                self.out.push_str(") ");
                self.statement_body(body);
            }
            Node::ForOf {
                var_kind,
                binding,
                iterable,
                body,
            } => {
                self.out
                    .push_str(&format!("for ({} {} of ", var_kind.keyword(), binding));
                self.expression(iterable);
                self.out.push_str(") ");
                self.statement_body(body);
            }
            Node::While { condition, body } => {
                self.out.push_str("while (");
                self.expression(condition);
                self.out.push_str(") ");
                self.statement_body(body);
            }
            Node::Try {
                block,
                catch_param,
                handler,
                finalizer,
            } => {
                self.out.push_str("try ");
                self.block(block);
                if let Some(handler) = handler {
                    self.out.push_str(" catch ");
                    if let Some(param) = catch_param {
                        self.out.push_str(&format!("({}) ", param));
                    }
                    self.block(handler);
                }
                if let Some(finalizer) = finalizer {
                    self.out.push_str(" finally ");
                    self.block(finalizer);
                }
            }
            Node::Class {
                name,
                extends,
                members,
            } => {
                self.out.push_str("class ");
                if let Some(name) = name {
                    self.out.push_str(name);
                    self.out.push(' ');
                }
                if let Some(base) = extends {
                    self.out.push_str("extends ");
                    self.expression(base);
                    self.out.push(' ');
                }
                self.block(members);
            }
            Node::Method {
                name,
                is_static,
                is_async,
                params,
                return_type,
                body,
            } => {
                if *is_static {
                    self.out.push_str("static ");
                }
                if *is_async {
                    self.out.push_str("async ");
                }
                self.out.push_str(name);
                self.signature(params, return_type.as_ref());
                self.out.push(' ');
                self.block(body);
            }
            Node::ClassField {
                name,
                is_static,
                type_annotation,
                initializer,
            } => {
                if *is_static {
                    self.out.push_str("static ");
                }
                self.out.push_str(name);
                self.type_annotation(type_annotation.as_ref());
                if let Some(init) = initializer {
                    self.out.push_str(" = ");
                    self.expression(init);
                }
                self.out.push(';');
            }
            Node::Comment { text } => {
                for (i, line) in text.lines().enumerate() {
                    if i > 0 {
                        self.out.push('\n');
                        self.indent();
                    }
                    self.out.push_str("// ");
                    self.out.push_str(line);
                }
            }
            Node::Verbatim { text } => self.out.push_str(text),
            Node::Fragment { parts } => self.parts(parts),
            expression => {
                self.expression(expression);
                self.out.push(';');
            }
        }
    }

    fn variable(&mut self, var_kind: VarKind, declarations: &[VariableDeclaration]) {
        self.out.push_str(var_kind.keyword());
        self.out.push(' ');
        for (i, declaration) in declarations.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(&declaration.name);
            self.type_annotation(declaration.type_annotation.as_ref());
            if let Some(init) = &declaration.initializer {
                self.out.push_str(" = ");
                self.expression(init);
            }
        }
    }

    fn import(&mut self, import: &ImportDeclaration) {
        let specifier = string_literal(&import.module_specifier);
        let Some(clause) = &import.clause else {
            self.out.push_str(&format!("import {};", specifier));
            return;
        };

        let mut parts = Vec::new();
        if let Some(default) = &clause.default {
            parts.push(default.clone());
        }
        if let Some(namespace) = &clause.namespace {
            parts.push(format!("* as {}", namespace));
        }
        if !clause.named.is_empty() || parts.is_empty() {
            let named: Vec<String> = clause
                .named
                .iter()
                .map(|s| match &s.alias {
                    Some(alias) => format!("{} as {}", s.name, alias),
                    None => s.name.clone(),
                })
                .collect();
            parts.push(if named.is_empty() {
                "{}".to_string()
            } else {
                format!("{{ {} }}", named.join(", "))
            });
        }

        self.out
            .push_str(&format!("import {} from {};", parts.join(", "), specifier));
    }

    fn block(&mut self, statements: &[NodeRef]) {
        if statements.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push_str("{\n");
        self.depth += 1;
        for statement in statements {
            self.statement(statement);
        }
        self.depth -= 1;
        self.indent();
        self.out.push('}');
    }

    fn signature(&mut self, params: &[Parameter], return_type: Option<&TypeNode>) {
        self.out.push('(');
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(&param.name);
            self.type_annotation(param.type_annotation.as_ref());
        }
        self.out.push(')');
        self.type_annotation(return_type);
    }

    fn type_annotation(&mut self, ty: Option<&TypeNode>) {
        if let Some(ty) = ty {
            self.out.push_str(": ");
            self.out.push_str(&ty.to_string());
        }
    }

    fn list(&mut self, nodes: &[NodeRef]) {
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expression(node);
        }
    }

    fn parts(&mut self, parts: &[NodeRef]) {
        for part in parts {
            match part.as_ref() {
                Node::Verbatim { text } => self.out.push_str(text),
                _ => self.expression(part),
            }
        }
    }

    /// Print `node`, parenthesized when it binds looser than an operand.
    fn operand(&mut self, node: &Node) {
        let wrap = matches!(
            node,
            Node::Arrow { .. } | Node::Conditional { .. } | Node::Binary { .. }
        );
        if wrap {
            self.out.push('(');
        }
        self.expression(node);
        if wrap {
            self.out.push(')');
        }
    }

    fn expression(&mut self, node: &Node) {
        match node {
            Node::Identifier { name } => self.out.push_str(name),
            Node::String { value } => self.out.push_str(&string_literal(value)),
            Node::Number { value } => self.out.push_str(value),
            Node::Verbatim { text } => self.out.push_str(text),
            Node::Fragment { parts } => self.parts(parts),
            Node::Array { elements } => {
                self.out.push('[');
                self.list(elements);
                self.out.push(']');
            }
            Node::Object { properties } => {
                if properties.is_empty() {
                    self.out.push_str("{}");
                    return;
                }
                self.out.push_str("{ ");
                for (i, property) in properties.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(&property_key(&property.name));
                    self.out.push_str(": ");
                    self.expression(&property.value);
                }
                self.out.push_str(" }");
            }
            Node::PropertyAccess { object, name } => {
                match object.as_ref() {
                    Node::Await { .. } | Node::Unary { .. } => {
                        self.out.push('(');
                        self.expression(object);
                        self.out.push(')');
                    }
                    other => self.operand(other),
                }
                self.out.push('.');
                self.out.push_str(name);
            }
            Node::ElementAccess { object, index } => {
                self.operand(object);
                self.out.push('[');
                self.expression(index);
                self.out.push(']');
            }
            Node::Call(call) => {
                self.operand(&call.callee);
                if !call.type_arguments.is_empty() {
                    let args: Vec<String> =
                        call.type_arguments.iter().map(|t| t.to_string()).collect();
                    self.out.push_str(&format!("<{}>", args.join(", ")));
                }
                self.out.push('(');
                self.list(&call.arguments);
                self.out.push(')');
            }
            Node::New { callee, arguments } => {
                self.out.push_str("new ");
                self.operand(callee);
                self.out.push('(');
                self.list(arguments);
                self.out.push(')');
            }
            Node::Await { expression } => {
                self.out.push_str("await ");
                self.operand(expression);
            }
            Node::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                self.operand(condition);
                self.out.push_str(" ? ");
                self.expression(when_true);
                self.out.push_str(" : ");
                self.expression(when_false);
            }
            Node::Binary {
                operator,
                left,
                right,
            } => {
                self.operand(left);
                self.out.push_str(&format!(" {} ", operator));
                self.operand(right);
            }
            Node::Unary { operator, operand } => {
                self.out.push_str(operator);
                if operator.chars().all(char::is_alphabetic) {
                    self.out.push(' ');
                }
                self.operand(operand);
            }
            Node::Arrow {
                is_async,
                params,
                body,
            } => {
                if *is_async {
                    self.out.push_str("async ");
                }
                self.signature(params, None);
                self.out.push_str(" => ");
                match body.as_ref() {
                    Node::Block { statements } => self.block(statements),
                    Node::Object { .. } => {
                        self.out.push('(');
                        self.expression(body);
                        self.out.push(')');
                    }
                    _ => self.expression(body),
                }
            }
            statement => {
                // Statement in expression position (class or function
                // expression): print it inline at the current depth.
                self.statement_body(statement);
            }
        }
    }
}
