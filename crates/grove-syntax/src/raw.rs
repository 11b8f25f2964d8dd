//! The raw parse tree handed from the recognizer to the tree converter.
//!
//! Nodes live in a flat arena and store their children as ordered id lists.
//! Consumers only rely on the depth-first, left-to-right traversal order.

use std::fmt;

use grove_core::{LineCol, SmolStr};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum RawKind {
    // --- Compilation unit level ---
    PackageDef,
    Import,
    StaticImport,
    ClassDef,
    InterfaceDef,
    TraitDef,
    EnumDef,
    AnnotationDef,
    EnumConstantDef,
    ObjBlock,
    MethodDef,
    CtorIdent,
    VariableDef,
    StaticInit,
    InstanceInit,

    // --- Declaration parts ---
    Modifiers,
    Modifier,
    Annotation,
    AnnotationMemberValuePair,
    Type,
    ArrayDeclarator,
    TypeArguments,
    TypeArgument,
    Wildcard,
    TypeParameters,
    TypeParameter,
    TypeUpperBounds,
    ExtendsClause,
    ImplementsClause,
    Parameters,
    ParameterDef,
    VariableParameterDef,
    ThrowsClause,

    // --- Statements ---
    Slist,
    If,
    For,
    ForInit,
    ForCondition,
    ForIterator,
    ForInIterable,
    While,
    Switch,
    CaseGroup,
    Case,
    Default,
    Try,
    Catch,
    Finally,
    Throw,
    Synchronized,
    Assert,
    LabeledStat,
    Return,
    Break,
    Continue,
    EmptyStat,
    UnusedDo,
    CtorCall,
    SuperCtorCall,

    // --- Expressions ---
    Expr,
    Elist,
    Ident,
    This,
    Super,
    NumInt,
    NumLong,
    NumBigInt,
    NumFloat,
    NumDouble,
    NumBigDecimal,
    StringLiteral,
    StringConstructor,
    True,
    False,
    Null,
    MethodCall,
    New,
    ClosableBlock,
    LabeledArg,
    SpreadArg,
    SpreadMapArg,
    ListConstructor,
    MapConstructor,
    Dot,
    OptionalDot,
    SpreadDot,
    SelectSlot,
    MemberPointer,
    IndexOp,
    Typecast,
    As,
    InstanceOf,
    Question,
    Elvis,
    RangeInclusive,
    RangeExclusive,

    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    DivAssign,
    ModAssign,

    Plus,
    Minus,
    Star,
    Div,
    Mod,
    StarStar,
    Equal,
    NotEqual,
    CompareTo,
    Lt,
    Le,
    Gt,
    Ge,
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

    LogicalNot,
    BitNot,
    UnaryMinus,
    UnaryPlus,
    Inc,
    Dec,
    PostInc,
    PostDec,
}

impl RawKind {
    /// Grammar-style display name used in converter error messages.
    pub fn name(self) -> &'static str {
        match self {
            RawKind::PackageDef => "PACKAGE_DEF",
            RawKind::Import => "IMPORT",
            RawKind::StaticImport => "STATIC_IMPORT",
            RawKind::ClassDef => "CLASS_DEF",
            RawKind::InterfaceDef => "INTERFACE_DEF",
            RawKind::TraitDef => "TRAIT_DEF",
            RawKind::EnumDef => "ENUM_DEF",
            RawKind::AnnotationDef => "ANNOTATION_DEF",
            RawKind::EnumConstantDef => "ENUM_CONSTANT_DEF",
            RawKind::ObjBlock => "OBJBLOCK",
            RawKind::MethodDef => "METHOD_DEF",
            RawKind::CtorIdent => "CTOR_IDENT",
            RawKind::VariableDef => "VARIABLE_DEF",
            RawKind::StaticInit => "STATIC_INIT",
            RawKind::InstanceInit => "INSTANCE_INIT",
            RawKind::Modifiers => "MODIFIERS",
            RawKind::Modifier => "MODIFIER",
            RawKind::Annotation => "ANNOTATION",
            RawKind::AnnotationMemberValuePair => "ANNOTATION_MEMBER_VALUE_PAIR",
            RawKind::Type => "TYPE",
            RawKind::ArrayDeclarator => "ARRAY_DECLARATOR",
            RawKind::TypeArguments => "TYPE_ARGUMENTS",
            RawKind::TypeArgument => "TYPE_ARGUMENT",
            RawKind::Wildcard => "WILDCARD_TYPE",
            RawKind::TypeParameters => "TYPE_PARAMETERS",
            RawKind::TypeParameter => "TYPE_PARAMETER",
            RawKind::TypeUpperBounds => "TYPE_UPPER_BOUNDS",
            RawKind::ExtendsClause => "EXTENDS_CLAUSE",
            RawKind::ImplementsClause => "IMPLEMENTS_CLAUSE",
            RawKind::Parameters => "PARAMETERS",
            RawKind::ParameterDef => "PARAMETER_DEF",
            RawKind::VariableParameterDef => "VARIABLE_PARAMETER_DEF",
            RawKind::ThrowsClause => "LITERAL_throws",
            RawKind::Slist => "SLIST",
            RawKind::If => "LITERAL_if",
            RawKind::For => "LITERAL_for",
            RawKind::ForInit => "FOR_INIT",
            RawKind::ForCondition => "FOR_CONDITION",
            RawKind::ForIterator => "FOR_ITERATOR",
            RawKind::ForInIterable => "FOR_IN_ITERABLE",
            RawKind::While => "LITERAL_while",
            RawKind::Switch => "LITERAL_switch",
            RawKind::CaseGroup => "CASE_GROUP",
            RawKind::Case => "LITERAL_case",
            RawKind::Default => "LITERAL_default",
            RawKind::Try => "LITERAL_try",
            RawKind::Catch => "LITERAL_catch",
            RawKind::Finally => "LITERAL_finally",
            RawKind::Throw => "LITERAL_throw",
            RawKind::Synchronized => "LITERAL_synchronized",
            RawKind::Assert => "LITERAL_assert",
            RawKind::LabeledStat => "LABELED_STAT",
            RawKind::Return => "LITERAL_return",
            RawKind::Break => "LITERAL_break",
            RawKind::Continue => "LITERAL_continue",
            RawKind::EmptyStat => "EMPTY_STAT",
            RawKind::UnusedDo => "UNUSED_DO",
            RawKind::CtorCall => "CTOR_CALL",
            RawKind::SuperCtorCall => "SUPER_CTOR_CALL",
            RawKind::Expr => "EXPR",
            RawKind::Elist => "ELIST",
            RawKind::Ident => "IDENT",
            RawKind::This => "LITERAL_this",
            RawKind::Super => "LITERAL_super",
            RawKind::NumInt => "NUM_INT",
            RawKind::NumLong => "NUM_LONG",
            RawKind::NumBigInt => "NUM_BIG_INT",
            RawKind::NumFloat => "NUM_FLOAT",
            RawKind::NumDouble => "NUM_DOUBLE",
            RawKind::NumBigDecimal => "NUM_BIG_DECIMAL",
            RawKind::StringLiteral => "STRING_LITERAL",
            RawKind::StringConstructor => "STRING_CONSTRUCTOR",
            RawKind::True => "LITERAL_true",
            RawKind::False => "LITERAL_false",
            RawKind::Null => "LITERAL_null",
            RawKind::MethodCall => "METHOD_CALL",
            RawKind::New => "LITERAL_new",
            RawKind::ClosableBlock => "CLOSABLE_BLOCK",
            RawKind::LabeledArg => "LABELED_ARG",
            RawKind::SpreadArg => "SPREAD_ARG",
            RawKind::SpreadMapArg => "SPREAD_MAP_ARG",
            RawKind::ListConstructor => "LIST_CONSTRUCTOR",
            RawKind::MapConstructor => "MAP_CONSTRUCTOR",
            RawKind::Dot => "DOT",
            RawKind::OptionalDot => "OPTIONAL_DOT",
            RawKind::SpreadDot => "SPREAD_DOT",
            RawKind::SelectSlot => "SELECT_SLOT",
            RawKind::MemberPointer => "MEMBER_POINTER",
            RawKind::IndexOp => "INDEX_OP",
            RawKind::Typecast => "TYPECAST",
            RawKind::As => "LITERAL_as",
            RawKind::InstanceOf => "LITERAL_instanceof",
            RawKind::Question => "QUESTION",
            RawKind::Elvis => "ELVIS_OPERATOR",
            RawKind::RangeInclusive => "RANGE_INCLUSIVE",
            RawKind::RangeExclusive => "RANGE_EXCLUSIVE",
            RawKind::Assign => "ASSIGN",
            RawKind::PlusAssign => "PLUS_ASSIGN",
            RawKind::MinusAssign => "MINUS_ASSIGN",
            RawKind::StarAssign => "STAR_ASSIGN",
            RawKind::DivAssign => "DIV_ASSIGN",
            RawKind::ModAssign => "MOD_ASSIGN",
            RawKind::Plus => "PLUS",
            RawKind::Minus => "MINUS",
            RawKind::Star => "STAR",
            RawKind::Div => "DIV",
            RawKind::Mod => "MOD",
            RawKind::StarStar => "STAR_STAR",
            RawKind::Equal => "EQUAL",
            RawKind::NotEqual => "NOT_EQUAL",
            RawKind::CompareTo => "COMPARE_TO",
            RawKind::Lt => "LT",
            RawKind::Le => "LE",
            RawKind::Gt => "GT",
            RawKind::Ge => "GE",
            RawKind::LogicalAnd => "LAND",
            RawKind::LogicalOr => "LOR",
            RawKind::BitAnd => "BAND",
            RawKind::BitOr => "BOR",
            RawKind::BitXor => "BXOR",
            RawKind::ShiftLeft => "SL",
            RawKind::ShiftRight => "SR",
            RawKind::RegexFind => "REGEX_FIND",
            RawKind::RegexMatch => "REGEX_MATCH",
            RawKind::In => "LITERAL_in",
            RawKind::LogicalNot => "LNOT",
            RawKind::BitNot => "BNOT",
            RawKind::UnaryMinus => "UNARY_MINUS",
            RawKind::UnaryPlus => "UNARY_PLUS",
            RawKind::Inc => "INC",
            RawKind::Dec => "DEC",
            RawKind::PostInc => "POST_INC",
            RawKind::PostDec => "POST_DEC",
        }
    }

    /// Sentinels the recognizer leaves where an expression could not be read.
    pub fn is_sentinel(self) -> bool {
        matches!(self, RawKind::EmptyStat | RawKind::UnusedDo)
    }

    pub fn is_type_definition(self) -> bool {
        matches!(
            self,
            RawKind::ClassDef
                | RawKind::InterfaceDef
                | RawKind::TraitDef
                | RawKind::EnumDef
                | RawKind::AnnotationDef
        )
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            RawKind::Assign
                | RawKind::PlusAssign
                | RawKind::MinusAssign
                | RawKind::StarAssign
                | RawKind::DivAssign
                | RawKind::ModAssign
        )
    }

    pub fn is_property_access(self) -> bool {
        matches!(
            self,
            RawKind::Dot | RawKind::OptionalDot | RawKind::SpreadDot
        )
    }
}

impl fmt::Display for RawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawNodeId(u32);

impl RawNodeId {
    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for RawNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawNodeId({})", self.0)
    }
}

/// One node of the raw tree.
///
/// `end` is `None` for "poor" nodes that only know where they start; the
/// column of a present `end` is the column just past the node's last
/// character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNode {
    pub kind: RawKind,
    pub text: SmolStr,
    pub start: LineCol,
    pub end: Option<LineCol>,
    children: Vec<RawNodeId>,
}

impl RawNode {
    pub fn children(&self) -> &[RawNodeId] {
        &self.children
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTree {
    nodes: Vec<RawNode>,
    roots: Vec<RawNodeId>,
}

impl RawTree {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Top-level nodes in source order.
    pub fn roots(&self) -> &[RawNodeId] {
        &self.roots
    }

    pub fn node(&self, id: RawNodeId) -> &RawNode {
        &self.nodes[id.idx()]
    }

    pub fn kind(&self, id: RawNodeId) -> RawKind {
        self.node(id).kind
    }

    pub fn text(&self, id: RawNodeId) -> &str {
        &self.node(id).text
    }

    pub fn children(&self, id: RawNodeId) -> &[RawNodeId] {
        &self.node(id).children
    }

    pub fn child(&self, id: RawNodeId, n: usize) -> Option<RawNodeId> {
        self.children(id).get(n).copied()
    }

    pub fn first_child(&self, id: RawNodeId) -> Option<RawNodeId> {
        self.child(id, 0)
    }

    /// First child of `id` with the given kind.
    pub fn child_of_kind(&self, id: RawNodeId, kind: RawKind) -> Option<RawNodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.kind(*child) == kind)
    }

    /// Depth-first, left-to-right walk over every node reachable from the
    /// roots. Uses an explicit stack so arbitrarily deep trees are safe.
    pub fn preorder(&self) -> Preorder<'_> {
        let mut stack: Vec<RawNodeId> = self.roots.clone();
        stack.reverse();
        Preorder { tree: self, stack }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack: Vec<(RawNodeId, usize)> = self.roots.iter().map(|id| (*id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(self.children(id).iter().map(|child| (*child, depth + 1)));
        }
        max
    }
}

pub struct Preorder<'a> {
    tree: &'a RawTree,
    stack: Vec<RawNodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = RawNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Append-only builder. Children must be allocated before their parent.
#[derive(Debug, Default)]
pub struct RawTreeBuilder {
    tree: RawTree,
}

impl RawTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(
        &mut self,
        kind: RawKind,
        text: impl Into<SmolStr>,
        start: LineCol,
        end: Option<LineCol>,
        children: Vec<RawNodeId>,
    ) -> RawNodeId {
        let id = RawNodeId(self.tree.nodes.len() as u32);
        self.tree.nodes.push(RawNode {
            kind,
            text: text.into(),
            start,
            end,
            children,
        });
        id
    }

    /// Convenience for a node without children.
    pub fn leaf(
        &mut self,
        kind: RawKind,
        text: impl Into<SmolStr>,
        start: LineCol,
        end: LineCol,
    ) -> RawNodeId {
        self.node(kind, text, start, Some(end), Vec::new())
    }

    pub fn push_child(&mut self, parent: RawNodeId, child: RawNodeId) {
        self.tree.nodes[parent.idx()].children.push(child);
    }

    pub fn set_end(&mut self, id: RawNodeId, end: LineCol) {
        self.tree.nodes[id.idx()].end = Some(end);
    }

    /// Deep-copy the subtree at `id`, keeping every position.
    pub fn duplicate(&mut self, id: RawNodeId) -> RawNodeId {
        let node = self.tree.nodes[id.idx()].clone();
        let children = node
            .children
            .iter()
            .map(|child| self.duplicate(*child))
            .collect();
        self.node(node.kind, node.text, node.start, node.end, children)
    }

    pub fn get(&self, id: RawNodeId) -> &RawNode {
        self.tree.node(id)
    }

    pub fn add_root(&mut self, id: RawNodeId) {
        self.tree.roots.push(id);
    }

    pub fn finish(self) -> RawTree {
        self.tree
    }
}
