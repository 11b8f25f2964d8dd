//! Debug dumps of a converted module.

use std::fmt::Write as _;

use crate::ast::{
    Ast, BinaryOp, ConstValue, CtorKind, Modifiers, ModuleNode, NodeId, NodeKind, WildcardBound,
};
use crate::visit::{Preorder, WalkEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DumpFormat {
    /// Groovy source regenerated from the AST.
    Source,
    /// Indented outline with ranges and recovery flags.
    Tree,
    /// The outline as nested HTML lists.
    Html,
}

impl DumpFormat {
    /// `source`/`groovy`, `tree`/`mindmap` or `html`, case-insensitively.
    pub fn from_name(name: &str) -> Option<DumpFormat> {
        match name.trim().to_ascii_lowercase().as_str() {
            "source" | "groovy" => Some(DumpFormat::Source),
            "tree" | "mindmap" => Some(DumpFormat::Tree),
            "html" => Some(DumpFormat::Html),
            _ => None,
        }
    }
}

impl std::str::FromStr for DumpFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DumpFormat::from_name(s).ok_or_else(|| format!("unknown dump format `{s}`"))
    }
}

pub fn dump(module: &ModuleNode, format: DumpFormat) -> String {
    match format {
        DumpFormat::Source => SourcePrinter::new(&module.ast).module(module),
        DumpFormat::Tree => tree(module),
        DumpFormat::Html => html(module),
    }
}

fn label(ast: &Ast, id: NodeId) -> String {
    let node = ast.node(id);
    let mut out = node.kind.name().to_string();
    match &node.kind {
        NodeKind::Constant(value) => {
            let _ = write!(out, " {}", value.text());
        }
        NodeKind::Binary { op, .. } => {
            let _ = write!(out, " {}", op.symbol());
        }
        NodeKind::Unary { op, .. } => {
            let _ = write!(out, " {}", op.symbol());
        }
        _ => {
            if let Some(name) = node.name() {
                let _ = write!(out, " {name}");
            }
        }
    }
    let _ = write!(
        out,
        " [{}..{}] {}:{}-{}:{}",
        node.pos.range.start,
        node.pos.range.end,
        node.pos.start.line,
        node.pos.start.col,
        node.pos.end.line,
        node.pos.end.col
    );
    if node.recovered {
        out.push_str(" (recovered)");
    }
    out
}

fn tree(module: &ModuleNode) -> String {
    let mut out = String::new();
    for root in module.roots() {
        let mut depth = 0usize;
        for event in Preorder::new(&module.ast, root) {
            match event {
                WalkEvent::Enter(id) => {
                    let _ = writeln!(out, "{}{}", "  ".repeat(depth), label(&module.ast, id));
                    depth += 1;
                }
                WalkEvent::Leave(_) => depth -= 1,
            }
        }
    }
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn html(module: &ModuleNode) -> String {
    let mut out = String::from("<html><body>\n<ul>\n");
    for root in module.roots() {
        for event in Preorder::new(&module.ast, root) {
            match event {
                WalkEvent::Enter(id) => {
                    let class = if module.ast.node(id).recovered {
                        " class=\"recovered\""
                    } else {
                        ""
                    };
                    let _ = write!(
                        out,
                        "<li{class}>{}",
                        escape_html(&label(&module.ast, id))
                    );
                    if !module.ast.children(id).is_empty() {
                        out.push_str("\n<ul>\n");
                    }
                }
                WalkEvent::Leave(id) => {
                    if !module.ast.children(id).is_empty() {
                        out.push_str("</ul>\n");
                    }
                    out.push_str("</li>\n");
                }
            }
        }
    }
    out.push_str("</ul>\n</body></html>\n");
    out
}

struct SourcePrinter<'a> {
    ast: &'a Ast,
    out: String,
    indent: usize,
}

impl<'a> SourcePrinter<'a> {
    fn new(ast: &'a Ast) -> Self {
        Self {
            ast,
            out: String::new(),
            indent: 0,
        }
    }

    fn module(mut self, module: &ModuleNode) -> String {
        for root in module.roots() {
            self.top_level(root);
        }
        self.out
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn top_level(&mut self, id: NodeId) {
        match self.ast.kind(id) {
            NodeKind::Package { name } => {
                let line = format!("package {name}");
                self.line(&line);
            }
            NodeKind::Import(decl) => {
                let mut line = String::from("import ");
                if decl.is_static {
                    line.push_str("static ");
                }
                line.push_str(&decl.name);
                if let Some(member) = &decl.member {
                    let _ = write!(line, ".{member}");
                }
                if decl.is_star {
                    line.push_str(".*");
                }
                if let Some(alias) = &decl.alias {
                    let _ = write!(line, " as {alias}");
                }
                self.line(&line);
            }
            _ => self.member(id),
        }
    }

    fn modifiers(mods: Modifiers, synthetic_public: bool) -> String {
        let mut mods = mods;
        if synthetic_public {
            mods.remove(Modifiers::PUBLIC);
        }
        let text = mods.to_string();
        if text.is_empty() {
            text
        } else {
            text + " "
        }
    }

    fn annotations(&mut self, annotations: &[NodeId]) {
        for &annotation in annotations {
            let text = self.expr(annotation);
            self.line(&text);
        }
    }

    fn member(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Type(decl) => {
                self.annotations(&decl.annotations);
                let mut mods = decl.modifiers;
                if decl.kind.is_interface_like() {
                    mods.remove(Modifiers::ABSTRACT);
                }
                let mut head = Self::modifiers(mods, decl.synthetic_public);
                let _ = write!(head, "{} {}", decl.kind.keyword(), decl.name);
                head.push_str(&self.type_params(&decl.type_params));
                if let Some(superclass) = decl.superclass {
                    let _ = write!(head, " extends {}", self.expr(superclass));
                }
                if !decl.interfaces.is_empty() {
                    let keyword = if decl.kind.is_interface_like() {
                        "extends"
                    } else {
                        "implements"
                    };
                    let _ = write!(head, " {keyword} {}", self.list(&decl.interfaces));
                }
                head.push_str(" {");
                self.line(&head);
                self.indent += 1;
                for &member in &decl.members {
                    self.member(member);
                }
                self.indent -= 1;
                self.line("}");
            }
            NodeKind::Method(decl) | NodeKind::Constructor(decl) => {
                self.annotations(&decl.annotations);
                let mut head = Self::modifiers(decl.modifiers, decl.synthetic_public);
                let tparams = self.type_params(&decl.type_params);
                if !tparams.is_empty() {
                    let _ = write!(head, "{tparams} ");
                }
                match decl.return_type {
                    Some(ty) => {
                        let _ = write!(head, "{} ", self.expr(ty));
                    }
                    None if matches!(ast.kind(id), NodeKind::Method(_)) => head.push_str("def "),
                    None => {}
                }
                let name = match (ast.kind(id), decl.declaring_type) {
                    (NodeKind::Constructor(_), Some(owner)) => ast
                        .node(owner)
                        .name()
                        .unwrap_or(decl.name.as_str())
                        .to_string(),
                    _ => decl.name.to_string(),
                };
                let _ = write!(head, "{name}({})", self.list(&decl.params));
                if !decl.throws.is_empty() {
                    let _ = write!(head, " throws {}", self.list(&decl.throws));
                }
                if let Some(default) = decl.annotation_default {
                    let _ = write!(head, " default {}", self.expr(default));
                }
                match decl.body {
                    Some(body) => self.block_after(head, body),
                    None => self.line(&head),
                }
            }
            NodeKind::Field(decl) => {
                self.annotations(&decl.annotations);
                let mods = decl.property.unwrap_or(decl.modifiers);
                let mut line = Self::modifiers(mods, false);
                match decl.ty {
                    Some(ty) => {
                        let _ = write!(line, "{} ", self.expr(ty));
                    }
                    None => line.push_str("def "),
                }
                line.push_str(&decl.name);
                if let Some(init) = decl.initializer {
                    let _ = write!(line, " = {}", self.expr(init));
                }
                self.line(&line);
            }
            NodeKind::Initializer { is_static, body } => {
                let head = if *is_static { "static" } else { "" };
                self.block_after(head.to_string(), *body);
            }
            NodeKind::EnumConstant { name, args, .. } => {
                let line = if args.is_empty() {
                    name.to_string()
                } else {
                    format!("{name}({})", self.list(args))
                };
                self.line(&line);
            }
            _ => self.statement(id),
        }
    }

    fn type_params(&self, params: &[NodeId]) -> String {
        if params.is_empty() {
            String::new()
        } else {
            format!("<{}>", self.list(params))
        }
    }

    fn list(&self, ids: &[NodeId]) -> String {
        ids.iter()
            .map(|id| self.expr(*id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `head {` + block statements + `}`.
    fn block_after(&mut self, head: String, body: NodeId) {
        let open = if head.is_empty() {
            "{".to_string()
        } else {
            format!("{head} {{")
        };
        self.line(&open);
        self.indent += 1;
        let ast = self.ast;
        match ast.kind(body) {
            NodeKind::Block { statements } => {
                for &stmt in statements {
                    self.statement(stmt);
                }
            }
            _ => self.statement(body),
        }
        self.indent -= 1;
        self.line("}");
    }

    fn statement(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Block { .. } => self.block_after(String::new(), id),
            NodeKind::ExprStmt { expr } => {
                let text = self.expr(*expr);
                self.line(&text);
            }
            NodeKind::If {
                cond,
                then,
                otherwise,
            } => {
                let head = format!("if ({})", self.expr(*cond));
                self.block_after(head, *then);
                if let Some(otherwise) = otherwise {
                    self.block_after("else".to_string(), *otherwise);
                }
            }
            NodeKind::ForIn {
                variable,
                iterable,
                body,
            } => {
                let head = format!("for ({} in {})", self.expr(*variable), self.expr(*iterable));
                self.block_after(head, *body);
            }
            NodeKind::ClassicFor {
                init,
                cond,
                update,
                body,
            } => {
                let cond = cond.map(|c| self.expr(c)).unwrap_or_default();
                let head = format!(
                    "for ({}; {cond}; {})",
                    self.list(init),
                    self.list(update)
                );
                self.block_after(head, *body);
            }
            NodeKind::While { cond, body } => {
                let head = format!("while ({})", self.expr(*cond));
                self.block_after(head, *body);
            }
            NodeKind::Switch {
                subject,
                cases,
                default,
            } => {
                let head = format!("switch ({}) {{", self.expr(*subject));
                self.line(&head);
                self.indent += 1;
                for &case in cases {
                    if let NodeKind::Case { value, body } = ast.kind(case) {
                        let label = format!("case {}:", self.expr(*value));
                        self.line(&label);
                        self.indent += 1;
                        self.statement(*body);
                        self.indent -= 1;
                    }
                }
                if let Some(default) = default {
                    self.line("default:");
                    self.indent += 1;
                    self.statement(*default);
                    self.indent -= 1;
                }
                self.indent -= 1;
                self.line("}");
            }
            NodeKind::Try {
                body,
                catches,
                finally,
            } => {
                self.block_after("try".to_string(), *body);
                for &catch in catches {
                    if let NodeKind::Catch { param, types, body } = ast.kind(catch) {
                        let param = if types.is_empty() {
                            self.expr(*param)
                        } else {
                            let types = types
                                .iter()
                                .map(|ty| self.expr(*ty))
                                .collect::<Vec<_>>()
                                .join(" | ");
                            format!("{types} {}", self.expr(*param))
                        };
                        self.block_after(format!("catch ({param})"), *body);
                    }
                }
                if let Some(finally) = finally {
                    self.block_after("finally".to_string(), *finally);
                }
            }
            NodeKind::Throw { expr } => {
                let line = format!("throw {}", self.expr(*expr));
                self.line(&line);
            }
            NodeKind::Synchronized { lock, body } => {
                let head = format!("synchronized ({})", self.expr(*lock));
                self.block_after(head, *body);
            }
            NodeKind::Assert { cond, message } => {
                let mut line = format!("assert {}", self.expr(*cond));
                if let Some(message) = message {
                    let _ = write!(line, " : {}", self.expr(*message));
                }
                self.line(&line);
            }
            NodeKind::Labeled { label, body } => {
                let line = format!("{label}:");
                self.line(&line);
                self.statement(*body);
            }
            NodeKind::Return { expr } => {
                let line = match expr {
                    Some(expr) => format!("return {}", self.expr(*expr)),
                    None => "return".to_string(),
                };
                self.line(&line);
            }
            NodeKind::Break { label } | NodeKind::Continue { label } => {
                let keyword = if matches!(ast.kind(id), NodeKind::Break { .. }) {
                    "break"
                } else {
                    "continue"
                };
                let line = match label {
                    Some(label) => format!("{keyword} {label}"),
                    None => keyword.to_string(),
                };
                self.line(&line);
            }
            NodeKind::Empty => {}
            NodeKind::Case { .. } | NodeKind::Catch { .. } => {}
            _ => {
                let text = self.expr(id);
                self.line(&text);
            }
        }
    }

    /// Identifier-like names (property and method names) print bare.
    fn name(&self, id: NodeId) -> String {
        match self.ast.kind(id) {
            NodeKind::Constant(ConstValue::String(name)) => name.to_string(),
            _ => self.expr(id),
        }
    }

    fn expr(&self, id: NodeId) -> String {
        match self.ast.kind(id) {
            NodeKind::Constant(ConstValue::String(value)) => format!("{value:?}"),
            NodeKind::Constant(value) => value.text(),
            NodeKind::GString { text, .. } => text.to_string(),
            NodeKind::Variable { name } => name.to_string(),
            NodeKind::Declaration(decl) => {
                let mut out = Self::modifiers(decl.modifiers, false);
                match decl.ty {
                    Some(ty) => {
                        let _ = write!(out, "{} ", self.expr(ty));
                    }
                    None if decl.modifiers.is_empty() => out.push_str("def "),
                    None => {}
                }
                out.push_str(&self.expr(decl.target));
                if let Some(value) = decl.value {
                    let _ = write!(out, " = {}", self.expr(value));
                }
                out
            }
            NodeKind::Binary { op, lhs, rhs } => match op {
                BinaryOp::Index => {
                    format!("{}[{}]", self.expr(*lhs), self.expr(*rhs))
                }
                op => format!("({} {} {})", self.expr(*lhs), op.symbol(), self.expr(*rhs)),
            },
            NodeKind::Unary { op, operand } => {
                if op.is_postfix() {
                    format!("{}{}", self.expr(*operand), op.symbol())
                } else {
                    format!("{}{}", op.symbol(), self.expr(*operand))
                }
            }
            NodeKind::Ternary {
                cond,
                then,
                otherwise,
            } => format!(
                "({} ? {} : {})",
                self.expr(*cond),
                self.expr(*then),
                self.expr(*otherwise)
            ),
            NodeKind::Elvis { cond, otherwise } => {
                format!("({} ?: {})", self.expr(*cond), self.expr(*otherwise))
            }
            NodeKind::Range {
                from,
                to,
                inclusive,
            } => {
                let op = if *inclusive { ".." } else { "..<" };
                format!("({}{op}{})", self.expr(*from), self.expr(*to))
            }
            NodeKind::Property {
                object,
                property,
                access,
                attribute,
            } => format!(
                "{}{}{}",
                self.expr(*object),
                access.symbol(*attribute),
                self.name(*property)
            ),
            NodeKind::MethodCall {
                receiver,
                method,
                args,
                safe,
                spread,
                implicit_this,
            } => {
                let mut out = String::new();
                if let (Some(receiver), false) = (receiver, implicit_this) {
                    out.push_str(&self.expr(*receiver));
                    out.push_str(match (safe, spread) {
                        (true, _) => "?.",
                        (_, true) => "*.",
                        _ => ".",
                    });
                }
                out.push_str(&self.name(*method));
                out.push_str(&self.expr(*args));
                out
            }
            NodeKind::CtorCall { kind, ty, args } => {
                let callee = match (kind, ty) {
                    (CtorKind::New, Some(ty)) => format!("new {}", self.expr(*ty)),
                    (CtorKind::New, None) => "new".to_string(),
                    (CtorKind::This, _) => "this".to_string(),
                    (CtorKind::Super, _) => "super".to_string(),
                };
                format!("{callee}{}", self.expr(*args))
            }
            NodeKind::ArrayNew {
                element_type,
                sizes,
                dimensions,
            } => {
                let mut out = format!("new {}", self.expr(*element_type));
                for size in sizes {
                    let _ = write!(out, "[{}]", self.expr(*size));
                }
                for _ in sizes.len()..*dimensions as usize {
                    out.push_str("[]");
                }
                out
            }
            NodeKind::Closure { params, body } => {
                let mut out = String::from("{ ");
                if let Some(params) = params {
                    let _ = write!(out, "{} -> ", self.list(params));
                }
                if let NodeKind::Block { statements } = self.ast.kind(*body) {
                    let stmts: Vec<String> = statements
                        .iter()
                        .map(|stmt| match self.ast.kind(*stmt) {
                            NodeKind::ExprStmt { expr } => self.expr(*expr),
                            _ => self.ast.kind(*stmt).name().to_string(),
                        })
                        .collect();
                    out.push_str(&stmts.join("; "));
                }
                out.push_str(" }");
                out
            }
            NodeKind::List { elements } => format!("[{}]", self.list(elements)),
            NodeKind::Map { entries } if entries.is_empty() => "[:]".to_string(),
            NodeKind::Map { entries } => format!("[{}]", self.list(entries)),
            NodeKind::MapEntry { key, value } => {
                format!("{}: {}", self.name(*key), self.expr(*value))
            }
            NodeKind::Args { args, .. } => {
                let inner: Vec<String> = args
                    .iter()
                    .map(|arg| match self.ast.kind(*arg) {
                        NodeKind::Map { entries } if !entries.is_empty() => self.list(entries),
                        _ => self.expr(*arg),
                    })
                    .collect();
                format!("({})", inner.join(", "))
            }
            NodeKind::Spread { expr } => format!("*{}", self.expr(*expr)),
            NodeKind::SpreadMap { expr } => format!("*:{}", self.expr(*expr)),
            NodeKind::MethodPointer { object, method } => {
                format!("{}.&{}", self.expr(*object), self.name(*method))
            }
            NodeKind::Cast { ty, expr, coerce } => {
                if *coerce {
                    format!("({} as {})", self.expr(*expr), self.expr(*ty))
                } else {
                    format!("(({}) {})", self.expr(*ty), self.expr(*expr))
                }
            }
            NodeKind::ClassExpr { ty } => self.expr(*ty),
            NodeKind::TypeRef(ty) => {
                let mut out = ty.name.to_string();
                if !ty.type_args.is_empty() {
                    let _ = write!(out, "<{}>", self.list(&ty.type_args));
                }
                for _ in 0..ty.dimensions {
                    out.push_str("[]");
                }
                out
            }
            NodeKind::TypeParam { name, bounds } => {
                if bounds.is_empty() {
                    name.to_string()
                } else {
                    let bounds = bounds
                        .iter()
                        .map(|b| self.expr(*b))
                        .collect::<Vec<_>>()
                        .join(" & ");
                    format!("{name} extends {bounds}")
                }
            }
            NodeKind::Wildcard { bound } => match bound {
                Some((WildcardBound::Extends, ty)) => format!("? extends {}", self.expr(*ty)),
                Some((WildcardBound::Super, ty)) => format!("? super {}", self.expr(*ty)),
                None => "?".to_string(),
            },
            NodeKind::Parameter(decl) => {
                let mut out = Self::modifiers(decl.modifiers, false);
                if let Some(ty) = decl.ty {
                    out.push_str(&self.expr(ty));
                    if decl.var_arg {
                        out.push_str("...");
                    }
                    out.push(' ');
                }
                out.push_str(&decl.name);
                if let Some(default) = decl.default_value {
                    let _ = write!(out, " = {}", self.expr(default));
                }
                out
            }
            NodeKind::Annotation { name, members } => {
                if members.is_empty() {
                    format!("@{name}")
                } else {
                    let members = members
                        .iter()
                        .map(|(key, value)| format!("{key} = {}", self.expr(*value)))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("@{name}({members})")
                }
            }
            kind => kind.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_and_aliases() {
        assert_eq!(DumpFormat::from_name("groovy"), Some(DumpFormat::Source));
        assert_eq!(DumpFormat::from_name("Source"), Some(DumpFormat::Source));
        assert_eq!(DumpFormat::from_name("mindmap"), Some(DumpFormat::Tree));
        assert_eq!(DumpFormat::from_name(" html "), Some(DumpFormat::Html));
        assert_eq!(DumpFormat::from_name("xml"), None);
        assert!("xml".parse::<DumpFormat>().is_err());
    }

    #[test]
    fn html_escapes_markup() {
        assert_eq!(escape_html("a < b && \"c\""), "a &lt; b &amp;&amp; &quot;c&quot;");
    }
}
