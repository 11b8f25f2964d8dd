//! The typed Groovy AST.
//!
//! Every node of a module lives in one flat [`Ast`] arena and is addressed
//! by a [`NodeId`]. Nodes share a common header ([`Node`]: position, name
//! range, metadata, recovered flag); the syntactic payload is a [`NodeKind`]
//! whose variants refer to their children by id.

use std::fmt;

use grove_core::{LineCol, SmolStr};
use grove_syntax::LiteralValue;
use grove_types::Span;
use serde::Serialize;

use crate::metadata::Metadata;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Offsets plus the matching 1-based line/column pairs.
///
/// `end.col` is exclusive, like the column of a raw node's end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub range: Span,
    pub start: LineCol,
    pub end: LineCol,
}

impl Position {
    /// Position of a node that has not been configured yet.
    pub const UNSET: Position = Position {
        range: Span { start: 0, end: 0 },
        start: LineCol { line: 0, col: 0 },
        end: LineCol { line: 0, col: 0 },
    };

    pub fn new(range: Span, start: LineCol, end: LineCol) -> Self {
        Self { range, start, end }
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.start.line != 0
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::UNSET
    }
}

/// JVM-style modifier bits.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u16);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const PUBLIC: Modifiers = Modifiers(0x0001);
    pub const PRIVATE: Modifiers = Modifiers(0x0002);
    pub const PROTECTED: Modifiers = Modifiers(0x0004);
    pub const STATIC: Modifiers = Modifiers(0x0008);
    pub const FINAL: Modifiers = Modifiers(0x0010);
    pub const SYNCHRONIZED: Modifiers = Modifiers(0x0020);
    pub const VOLATILE: Modifiers = Modifiers(0x0040);
    pub const TRANSIENT: Modifiers = Modifiers(0x0080);
    pub const NATIVE: Modifiers = Modifiers(0x0100);
    pub const INTERFACE: Modifiers = Modifiers(0x0200);
    pub const ABSTRACT: Modifiers = Modifiers(0x0400);
    pub const STRICT: Modifiers = Modifiers(0x0800);
    pub const DEFAULT: Modifiers = Modifiers(0x8000);

    const NAMES: &'static [(Modifiers, &'static str)] = &[
        (Modifiers::PUBLIC, "public"),
        (Modifiers::PROTECTED, "protected"),
        (Modifiers::PRIVATE, "private"),
        (Modifiers::ABSTRACT, "abstract"),
        (Modifiers::STATIC, "static"),
        (Modifiers::FINAL, "final"),
        (Modifiers::TRANSIENT, "transient"),
        (Modifiers::VOLATILE, "volatile"),
        (Modifiers::SYNCHRONIZED, "synchronized"),
        (Modifiers::NATIVE, "native"),
        (Modifiers::STRICT, "strictfp"),
        (Modifiers::DEFAULT, "default"),
    ];

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        Modifiers(bits)
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Modifiers) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Modifiers) {
        self.0 &= !other.0;
    }

    /// Modifier bit for a source keyword. `def` has no bit.
    pub fn from_keyword(keyword: &str) -> Option<Modifiers> {
        Self::NAMES
            .iter()
            .find(|(_, name)| *name == keyword)
            .map(|(bit, _)| *bit)
    }

    pub fn is_access(self) -> bool {
        self.intersects(Modifiers::PUBLIC | Modifiers::PRIVATE | Modifiers::PROTECTED)
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modifiers({self})")
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (bit, name) in Self::NAMES {
            if self.contains(*bit) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

// --- declarations -----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Trait,
}

impl TypeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Annotation => "@interface",
            TypeKind::Trait => "trait",
        }
    }

    pub fn is_interface_like(self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Annotation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    /// Imported class (or package, for a non-static star import).
    pub name: SmolStr,
    /// Member of a static import; `None` for static star imports.
    pub member: Option<SmolStr>,
    pub alias: Option<SmolStr>,
    pub is_static: bool,
    pub is_star: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: SmolStr,
    /// `pkg.Outer$Inner`.
    pub qualified_name: SmolStr,
    pub modifiers: Modifiers,
    pub synthetic_public: bool,
    pub annotations: Vec<NodeId>,
    pub type_params: Vec<NodeId>,
    pub superclass: Option<NodeId>,
    pub interfaces: Vec<NodeId>,
    pub members: Vec<NodeId>,
    /// Enclosing type declaration; not a child.
    pub outer: Option<NodeId>,
}

/// Methods and constructors. Constructors have no return type and are named
/// `<init>`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: SmolStr,
    pub modifiers: Modifiers,
    pub synthetic_public: bool,
    pub annotations: Vec<NodeId>,
    pub type_params: Vec<NodeId>,
    pub return_type: Option<NodeId>,
    pub params: Vec<NodeId>,
    pub throws: Vec<NodeId>,
    pub body: Option<NodeId>,
    pub annotation_default: Option<NodeId>,
    pub declaring_type: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: SmolStr,
    pub modifiers: Modifiers,
    pub annotations: Vec<NodeId>,
    pub ty: Option<NodeId>,
    pub initializer: Option<NodeId>,
    /// Set when the field backs a property; holds the property's modifiers.
    pub property: Option<Modifiers>,
    pub declaring_type: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: SmolStr,
    pub modifiers: Modifiers,
    pub annotations: Vec<NodeId>,
    pub ty: Option<NodeId>,
    pub default_value: Option<NodeId>,
    pub var_arg: bool,
}

/// A local variable declaration, `int x = 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalDecl {
    pub modifiers: Modifiers,
    pub annotations: Vec<NodeId>,
    pub ty: Option<NodeId>,
    /// The declared variable, a [`NodeKind::Variable`].
    pub target: NodeId,
    pub value: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub name: SmolStr,
    pub primitive: bool,
    pub type_args: Vec<NodeId>,
    pub dimensions: u32,
}

impl TypeRef {
    pub fn is_array(&self) -> bool {
        self.dimensions > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardBound {
    Extends,
    Super,
}

// --- expressions -------------------------------------------------------------

/// Text of the placeholder constant left where an expression is missing.
pub const ERROR_TEXT: &str = "ERROR";

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Null,
    Bool(bool),
    Number(LiteralValue),
    String(SmolStr),
    /// Placeholder for a missing or unreadable expression.
    Error,
}

impl ConstValue {
    pub fn text(&self) -> String {
        match self {
            ConstValue::Null => "null".to_string(),
            ConstValue::Bool(value) => value.to_string(),
            ConstValue::Number(value) => number_text(value),
            ConstValue::String(value) => value.to_string(),
            ConstValue::Error => ERROR_TEXT.to_string(),
        }
    }
}

fn number_text(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Int(v) => v.to_string(),
        LiteralValue::Long(v) => v.to_string(),
        LiteralValue::BigInteger { radix: 10, digits } => digits.to_string(),
        LiteralValue::BigInteger { radix, digits } => format!("{digits} (base {radix})"),
        LiteralValue::Float(v) => v.to_string(),
        LiteralValue::Double(v) => v.to_string(),
        LiteralValue::BigDecimal(v) => v.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Assign,
    PlusAssign,
    MinusAssign,
    MultiplyAssign,
    DivideAssign,
    ModAssign,
    Plus,
    Minus,
    Multiply,
    Divide,
    Mod,
    Power,
    Equal,
    NotEqual,
    CompareTo,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    RegexFind,
    RegexMatch,
    In,
    InstanceOf,
    /// `a[b]`
    Index,
}

impl BinaryOp {
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::PlusAssign
                | BinaryOp::MinusAssign
                | BinaryOp::MultiplyAssign
                | BinaryOp::DivideAssign
                | BinaryOp::ModAssign
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Assign => "=",
            BinaryOp::PlusAssign => "+=",
            BinaryOp::MinusAssign => "-=",
            BinaryOp::MultiplyAssign => "*=",
            BinaryOp::DivideAssign => "/=",
            BinaryOp::ModAssign => "%=",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Power => "**",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::CompareTo => "<=>",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::RegexFind => "=~",
            BinaryOp::RegexMatch => "==~",
            BinaryOp::In => "in",
            BinaryOp::InstanceOf => "instanceof",
            BinaryOp::Index => "[",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    BitNot,
    Minus,
    Plus,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
        }
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostIncrement | UnaryOp::PostDecrement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyAccess {
    Normal,
    Safe,
    Spread,
}

impl PropertyAccess {
    pub fn symbol(self, attribute: bool) -> &'static str {
        match (self, attribute) {
            (PropertyAccess::Normal, false) => ".",
            (PropertyAccess::Safe, false) => "?.",
            (PropertyAccess::Spread, false) => "*.",
            (PropertyAccess::Normal, true) => ".@",
            (PropertyAccess::Safe, true) => "?.@",
            (PropertyAccess::Spread, true) => "*.@",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CtorKind {
    New,
    This,
    Super,
}

// --- node -------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Package {
        name: SmolStr,
    },
    Import(ImportDecl),
    Type(TypeDecl),
    Method(MethodDecl),
    Constructor(MethodDecl),
    Field(FieldDecl),
    Initializer {
        is_static: bool,
        body: NodeId,
    },
    EnumConstant {
        name: SmolStr,
        annotations: Vec<NodeId>,
        args: Vec<NodeId>,
        declaring_type: Option<NodeId>,
    },
    Parameter(ParamDecl),
    Annotation {
        name: SmolStr,
        members: Vec<(SmolStr, NodeId)>,
    },
    TypeRef(TypeRef),
    TypeParam {
        name: SmolStr,
        bounds: Vec<NodeId>,
    },
    Wildcard {
        bound: Option<(WildcardBound, NodeId)>,
    },

    Block {
        statements: Vec<NodeId>,
    },
    ExprStmt {
        expr: NodeId,
    },
    If {
        cond: NodeId,
        then: NodeId,
        otherwise: Option<NodeId>,
    },
    ForIn {
        variable: NodeId,
        iterable: NodeId,
        body: NodeId,
    },
    ClassicFor {
        init: Vec<NodeId>,
        cond: Option<NodeId>,
        update: Vec<NodeId>,
        body: NodeId,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    Switch {
        subject: NodeId,
        cases: Vec<NodeId>,
        default: Option<NodeId>,
    },
    Case {
        value: NodeId,
        body: NodeId,
    },
    Try {
        body: NodeId,
        catches: Vec<NodeId>,
        finally: Option<NodeId>,
    },
    Catch {
        param: NodeId,
        types: Vec<NodeId>,
        body: NodeId,
    },
    Throw {
        expr: NodeId,
    },
    Synchronized {
        lock: NodeId,
        body: NodeId,
    },
    Assert {
        cond: NodeId,
        message: Option<NodeId>,
    },
    Labeled {
        label: SmolStr,
        body: NodeId,
    },
    Return {
        expr: Option<NodeId>,
    },
    Break {
        label: Option<SmolStr>,
    },
    Continue {
        label: Option<SmolStr>,
    },
    Empty,

    Constant(ConstValue),
    GString {
        text: SmolStr,
        strings: Vec<NodeId>,
        values: Vec<NodeId>,
    },
    Variable {
        name: SmolStr,
    },
    Declaration(LocalDecl),
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Ternary {
        cond: NodeId,
        then: NodeId,
        otherwise: NodeId,
    },
    Elvis {
        cond: NodeId,
        otherwise: NodeId,
    },
    Range {
        from: NodeId,
        to: NodeId,
        inclusive: bool,
    },
    Property {
        object: NodeId,
        property: NodeId,
        access: PropertyAccess,
        attribute: bool,
    },
    MethodCall {
        receiver: Option<NodeId>,
        method: NodeId,
        args: NodeId,
        safe: bool,
        spread: bool,
        implicit_this: bool,
    },
    CtorCall {
        kind: CtorKind,
        ty: Option<NodeId>,
        args: NodeId,
    },
    ArrayNew {
        element_type: NodeId,
        sizes: Vec<NodeId>,
        dimensions: u32,
    },
    Closure {
        params: Option<Vec<NodeId>>,
        body: NodeId,
    },
    List {
        elements: Vec<NodeId>,
    },
    Map {
        entries: Vec<NodeId>,
    },
    MapEntry {
        key: NodeId,
        value: NodeId,
    },
    /// Call arguments. `named` when every argument is a map entry.
    Args {
        args: Vec<NodeId>,
        named: bool,
    },
    Spread {
        expr: NodeId,
    },
    SpreadMap {
        expr: NodeId,
    },
    MethodPointer {
        object: NodeId,
        method: NodeId,
    },
    Cast {
        ty: NodeId,
        expr: NodeId,
        coerce: bool,
    },
    ClassExpr {
        ty: NodeId,
    },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Package { .. } => "Package",
            NodeKind::Import(_) => "Import",
            NodeKind::Type(_) => "Type",
            NodeKind::Method(_) => "Method",
            NodeKind::Constructor(_) => "Constructor",
            NodeKind::Field(_) => "Field",
            NodeKind::Initializer { .. } => "Initializer",
            NodeKind::EnumConstant { .. } => "EnumConstant",
            NodeKind::Parameter(_) => "Parameter",
            NodeKind::Annotation { .. } => "Annotation",
            NodeKind::TypeRef(_) => "TypeRef",
            NodeKind::TypeParam { .. } => "TypeParam",
            NodeKind::Wildcard { .. } => "Wildcard",
            NodeKind::Block { .. } => "Block",
            NodeKind::ExprStmt { .. } => "ExprStmt",
            NodeKind::If { .. } => "If",
            NodeKind::ForIn { .. } => "ForIn",
            NodeKind::ClassicFor { .. } => "ClassicFor",
            NodeKind::While { .. } => "While",
            NodeKind::Switch { .. } => "Switch",
            NodeKind::Case { .. } => "Case",
            NodeKind::Try { .. } => "Try",
            NodeKind::Catch { .. } => "Catch",
            NodeKind::Throw { .. } => "Throw",
            NodeKind::Synchronized { .. } => "Synchronized",
            NodeKind::Assert { .. } => "Assert",
            NodeKind::Labeled { .. } => "Labeled",
            NodeKind::Return { .. } => "Return",
            NodeKind::Break { .. } => "Break",
            NodeKind::Continue { .. } => "Continue",
            NodeKind::Empty => "Empty",
            NodeKind::Constant(_) => "Constant",
            NodeKind::GString { .. } => "GString",
            NodeKind::Variable { .. } => "Variable",
            NodeKind::Declaration(_) => "Declaration",
            NodeKind::Binary { .. } => "Binary",
            NodeKind::Unary { .. } => "Unary",
            NodeKind::Ternary { .. } => "Ternary",
            NodeKind::Elvis { .. } => "Elvis",
            NodeKind::Range { .. } => "Range",
            NodeKind::Property { .. } => "Property",
            NodeKind::MethodCall { .. } => "MethodCall",
            NodeKind::CtorCall { .. } => "CtorCall",
            NodeKind::ArrayNew { .. } => "ArrayNew",
            NodeKind::Closure { .. } => "Closure",
            NodeKind::List { .. } => "List",
            NodeKind::Map { .. } => "Map",
            NodeKind::MapEntry { .. } => "MapEntry",
            NodeKind::Args { .. } => "Args",
            NodeKind::Spread { .. } => "Spread",
            NodeKind::SpreadMap { .. } => "SpreadMap",
            NodeKind::MethodPointer { .. } => "MethodPointer",
            NodeKind::Cast { .. } => "Cast",
            NodeKind::ClassExpr { .. } => "ClassExpr",
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Block { .. }
                | NodeKind::ExprStmt { .. }
                | NodeKind::If { .. }
                | NodeKind::ForIn { .. }
                | NodeKind::ClassicFor { .. }
                | NodeKind::While { .. }
                | NodeKind::Switch { .. }
                | NodeKind::Case { .. }
                | NodeKind::Try { .. }
                | NodeKind::Catch { .. }
                | NodeKind::Throw { .. }
                | NodeKind::Synchronized { .. }
                | NodeKind::Assert { .. }
                | NodeKind::Labeled { .. }
                | NodeKind::Return { .. }
                | NodeKind::Break { .. }
                | NodeKind::Continue { .. }
                | NodeKind::Empty
        )
    }

    /// The placeholder constant produced for missing expressions.
    pub fn is_error_placeholder(&self) -> bool {
        matches!(self, NodeKind::Constant(ConstValue::Error))
    }

    /// Child ids in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::Package { .. }
            | NodeKind::Import(_)
            | NodeKind::Break { .. }
            | NodeKind::Continue { .. }
            | NodeKind::Empty
            | NodeKind::Constant(_)
            | NodeKind::Variable { .. } => {}
            NodeKind::Type(decl) => {
                out.extend(&decl.annotations);
                out.extend(&decl.type_params);
                out.extend(decl.superclass);
                out.extend(&decl.interfaces);
                out.extend(&decl.members);
            }
            NodeKind::Method(decl) | NodeKind::Constructor(decl) => {
                out.extend(&decl.annotations);
                out.extend(&decl.type_params);
                out.extend(decl.return_type);
                out.extend(&decl.params);
                out.extend(&decl.throws);
                out.extend(decl.body);
                out.extend(decl.annotation_default);
            }
            NodeKind::Field(decl) => {
                out.extend(&decl.annotations);
                out.extend(decl.ty);
                out.extend(decl.initializer);
            }
            NodeKind::Initializer { body, .. } => out.push(*body),
            NodeKind::EnumConstant {
                annotations, args, ..
            } => {
                out.extend(annotations);
                out.extend(args);
            }
            NodeKind::Parameter(decl) => {
                out.extend(&decl.annotations);
                out.extend(decl.ty);
                out.extend(decl.default_value);
            }
            NodeKind::Annotation { members, .. } => {
                out.extend(members.iter().map(|(_, value)| *value));
            }
            NodeKind::TypeRef(ty) => out.extend(&ty.type_args),
            NodeKind::TypeParam { bounds, .. } => out.extend(bounds),
            NodeKind::Wildcard { bound } => out.extend(bound.map(|(_, ty)| ty)),
            NodeKind::Block { statements } => out.extend(statements),
            NodeKind::ExprStmt { expr } | NodeKind::Throw { expr } => out.push(*expr),
            NodeKind::If {
                cond,
                then,
                otherwise,
            } => {
                out.push(*cond);
                out.push(*then);
                out.extend(*otherwise);
            }
            NodeKind::ForIn {
                variable,
                iterable,
                body,
            } => out.extend([*variable, *iterable, *body]),
            NodeKind::ClassicFor {
                init,
                cond,
                update,
                body,
            } => {
                out.extend(init);
                out.extend(*cond);
                out.extend(update);
                out.push(*body);
            }
            NodeKind::While { cond, body } => out.extend([*cond, *body]),
            NodeKind::Switch {
                subject,
                cases,
                default,
            } => {
                out.push(*subject);
                out.extend(cases);
                out.extend(*default);
            }
            NodeKind::Case { value, body } => out.extend([*value, *body]),
            NodeKind::Try {
                body,
                catches,
                finally,
            } => {
                out.push(*body);
                out.extend(catches);
                out.extend(*finally);
            }
            NodeKind::Catch { param, types, body } => {
                out.extend(types);
                out.push(*param);
                out.push(*body);
            }
            NodeKind::Synchronized { lock, body } => out.extend([*lock, *body]),
            NodeKind::Assert { cond, message } => {
                out.push(*cond);
                out.extend(*message);
            }
            NodeKind::Labeled { body, .. } => out.push(*body),
            NodeKind::Return { expr } => out.extend(*expr),
            NodeKind::GString {
                strings, values, ..
            } => {
                // Strings and values alternate, starting with a string.
                let mut strings = strings.iter();
                let mut values = values.iter();
                loop {
                    match (strings.next(), values.next()) {
                        (None, None) => break,
                        (s, v) => {
                            out.extend(s);
                            out.extend(v);
                        }
                    }
                }
            }
            NodeKind::Declaration(decl) => {
                out.extend(&decl.annotations);
                out.extend(decl.ty);
                out.push(decl.target);
                out.extend(decl.value);
            }
            NodeKind::Binary { lhs, rhs, .. } => out.extend([*lhs, *rhs]),
            NodeKind::Unary { operand, .. } => out.push(*operand),
            NodeKind::Ternary {
                cond,
                then,
                otherwise,
            } => out.extend([*cond, *then, *otherwise]),
            NodeKind::Elvis { cond, otherwise } => out.extend([*cond, *otherwise]),
            NodeKind::Range { from, to, .. } => out.extend([*from, *to]),
            NodeKind::Property {
                object, property, ..
            } => out.extend([*object, *property]),
            NodeKind::MethodCall {
                receiver,
                method,
                args,
                ..
            } => {
                out.extend(*receiver);
                out.push(*method);
                out.push(*args);
            }
            NodeKind::CtorCall { ty, args, .. } => {
                out.extend(*ty);
                out.push(*args);
            }
            NodeKind::ArrayNew {
                element_type,
                sizes,
                ..
            } => {
                out.push(*element_type);
                out.extend(sizes);
            }
            NodeKind::Closure { params, body } => {
                if let Some(params) = params {
                    out.extend(params);
                }
                out.push(*body);
            }
            NodeKind::List { elements } => out.extend(elements),
            NodeKind::Map { entries } => out.extend(entries),
            NodeKind::MapEntry { key, value } => out.extend([*key, *value]),
            NodeKind::Args { args, .. } => out.extend(args),
            NodeKind::Spread { expr } | NodeKind::SpreadMap { expr } => out.push(*expr),
            NodeKind::MethodPointer { object, method } => out.extend([*object, *method]),
            NodeKind::Cast { ty, expr, coerce } => {
                if *coerce {
                    out.extend([*expr, *ty]);
                } else {
                    out.extend([*ty, *expr]);
                }
            }
            NodeKind::ClassExpr { ty } => out.push(*ty),
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub pos: Position,
    /// Half-open range of the declared or referenced name.
    pub name_range: Option<Span>,
    pub meta: Metadata,
    /// Set by the recovery pass on nodes produced or altered by recovery.
    pub recovered: bool,
}

impl Node {
    pub fn range(&self) -> Span {
        self.pos.range
    }

    pub fn start(&self) -> usize {
        self.pos.range.start
    }

    pub fn end(&self) -> usize {
        self.pos.range.end
    }

    /// Name of a declaration or reference node.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Package { name }
            | NodeKind::Variable { name }
            | NodeKind::EnumConstant { name, .. }
            | NodeKind::Annotation { name, .. }
            | NodeKind::TypeParam { name, .. } => Some(name),
            NodeKind::Type(decl) => Some(&decl.name),
            NodeKind::Method(decl) | NodeKind::Constructor(decl) => Some(&decl.name),
            NodeKind::Field(decl) => Some(&decl.name),
            NodeKind::Parameter(decl) => Some(&decl.name),
            NodeKind::TypeRef(ty) => Some(&ty.name),
            NodeKind::Import(decl) => Some(&decl.name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub(crate) fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            pos: Position::UNSET,
            name_range: None,
            meta: Metadata::default(),
            recovered: false,
        });
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.idx()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.idx()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.idx()].kind
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId::from_raw(i as u32), node))
    }

    /// Pre-order walk of the subtree at `root`, `root` included.
    pub fn descendants(&self, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![root];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let mut children = self.children(id);
            children.reverse();
            stack.extend(children);
            Some(id)
        })
    }

    pub fn recovered_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, node)| node.recovered)
            .map(|(id, _)| id)
    }
}

impl std::ops::Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index.idx()]
    }
}

impl std::ops::IndexMut<NodeId> for Ast {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output {
        &mut self.nodes[index.idx()]
    }
}

/// A converted source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleNode {
    pub ast: Ast,
    pub package: Option<NodeId>,
    pub imports: Vec<NodeId>,
    /// Top-level type declarations; nested types hang off their outer type.
    pub types: Vec<NodeId>,
    /// Script-level methods.
    pub methods: Vec<NodeId>,
    /// Script-level statements.
    pub statements: Vec<NodeId>,
    /// Range of the script body, when there are statements.
    pub script_range: Option<Position>,
    /// `0..end` of the source.
    pub pos: Position,
}

impl ModuleNode {
    pub fn package_name(&self) -> Option<&str> {
        self.package.and_then(|id| self.ast.node(id).name())
    }

    /// Top-level nodes in source order.
    pub fn roots(&self) -> Vec<NodeId> {
        let mut roots: Vec<NodeId> = self
            .package
            .iter()
            .chain(&self.imports)
            .chain(&self.types)
            .chain(&self.methods)
            .chain(&self.statements)
            .copied()
            .collect();
        roots.sort_by_key(|id| (self.ast.node(*id).start(), *id));
        roots
    }

    /// Every type declaration, nested ones included, in pre-order.
    pub fn all_types(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.types.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let NodeKind::Type(decl) = self.ast.kind(id) {
                stack.extend(
                    decl.members
                        .iter()
                        .rev()
                        .copied()
                        .filter(|member| matches!(self.ast.kind(*member), NodeKind::Type(_))),
                );
            }
        }
        out
    }

    /// Type declaration with the given (`$`-separated) qualified name.
    pub fn find_type(&self, qualified_name: &str) -> Option<NodeId> {
        self.all_types().into_iter().find(|id| {
            matches!(self.ast.kind(*id), NodeKind::Type(decl) if decl.qualified_name == qualified_name)
        })
    }

    /// Member of `type_id` with the given name and a matching kind.
    pub fn find_member(
        &self,
        type_id: NodeId,
        name: &str,
        pred: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        let NodeKind::Type(decl) = self.ast.kind(type_id) else {
            return None;
        };
        decl.members.iter().copied().find(|member| {
            let node = self.ast.node(*member);
            pred(&node.kind) && node.name() == Some(name)
        })
    }
}
