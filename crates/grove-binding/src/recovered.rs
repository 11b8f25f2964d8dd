//! Bindings synthesized from syntax when the engine has nothing better.
//!
//! A recovered type answers name and array questions from what it wraps and
//! reports nothing else: no members, no interfaces, no modifiers. Recovered
//! bindings are not interned; two of them are equal when their keys are.

use std::sync::Arc;

use grove_ast::ast::{Ast, NodeId, NodeKind};
use grove_core::SmolStr;

use crate::binding::TypeBinding;
use crate::model::{SemanticModel, TypeId};

pub const JAVA_LANG_OBJECT: &str = "java.lang.Object";

/// A type as written in source: `java.util.Map<K, V>[]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyntaxType {
    pub name: SmolStr,
    pub args: Vec<SyntaxType>,
    pub dimensions: u32,
}

impl SyntaxType {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            dimensions: 0,
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<SyntaxType>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Read a `TypeRef` (or a wildcard, as `?`) out of the AST.
    pub fn from_ast(ast: &Ast, id: NodeId) -> Option<SyntaxType> {
        match ast.kind(id) {
            NodeKind::TypeRef(ty) => {
                let args = ty
                    .type_args
                    .iter()
                    .filter_map(|arg| SyntaxType::from_ast(ast, *arg))
                    .collect();
                Some(SyntaxType {
                    name: ty.name.clone(),
                    args,
                    dimensions: ty.dimensions,
                })
            }
            NodeKind::Wildcard { .. } => Some(SyntaxType::new("?")),
            _ => None,
        }
    }

    fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Name with type arguments, without dimensions.
    fn display(&self, qualified: bool) -> String {
        let mut out = if qualified {
            self.name.to_string()
        } else {
            self.simple_name().to_string()
        };
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(|a| a.full_display(qualified)).collect();
            out.push('<');
            out.push_str(&args.join(","));
            out.push('>');
        }
        out
    }

    fn full_display(&self, qualified: bool) -> String {
        format!("{}{}", self.display(qualified), brackets(self.dimensions))
    }
}

fn brackets(dimensions: u32) -> String {
    "[]".repeat(dimensions as usize)
}

/// What a recovered type binding was made from.
#[derive(Debug, Clone)]
pub enum RecoveredSource {
    /// The declared type of a variable; untyped (`def`) declarations are
    /// `java.lang.Object`.
    VariableDeclaration {
        name: SmolStr,
        ty: Option<SyntaxType>,
    },
    SyntacticType(SyntaxType),
    /// A type the engine referenced but could not find.
    InternalType(TypeId),
    /// Another binding with extra array dimensions.
    Inner {
        inner: Arc<TypeBinding>,
        dimensions: u32,
    },
}

impl RecoveredSource {
    /// Simple name with type arguments, without dimensions.
    fn base_name(&self, model: &SemanticModel) -> String {
        match self {
            RecoveredSource::VariableDeclaration { ty: Some(ty), .. }
            | RecoveredSource::SyntacticType(ty) => ty.display(false),
            RecoveredSource::VariableDeclaration { ty: None, .. } => "Object".to_string(),
            RecoveredSource::InternalType(id) => model.ty(*id).name.to_string(),
            RecoveredSource::Inner { inner, .. } => strip_brackets(inner.name()).to_string(),
        }
    }

    fn base_qualified_name(&self, model: &SemanticModel) -> String {
        match self {
            RecoveredSource::VariableDeclaration { ty: Some(ty), .. }
            | RecoveredSource::SyntacticType(ty) => ty.display(true),
            RecoveredSource::VariableDeclaration { ty: None, .. } => JAVA_LANG_OBJECT.to_string(),
            RecoveredSource::InternalType(id) => model.qualified_type_name(*id),
            RecoveredSource::Inner { inner, .. } => strip_brackets(inner.qualified_name()).to_string(),
        }
    }

    pub fn name(&self, model: &SemanticModel) -> String {
        format!("{}{}", self.base_name(model), brackets(self.dimensions()))
    }

    pub fn qualified_name(&self, model: &SemanticModel) -> String {
        format!("{}{}", self.base_qualified_name(model), brackets(self.dimensions()))
    }

    pub fn dimensions(&self) -> u32 {
        match self {
            RecoveredSource::VariableDeclaration { ty, .. } => ty.as_ref().map_or(0, |t| t.dimensions),
            RecoveredSource::SyntacticType(ty) => ty.dimensions,
            RecoveredSource::InternalType(_) => 0,
            RecoveredSource::Inner { inner, dimensions } => inner.dimensions() + dimensions,
        }
    }

    /// Written type arguments. Arrays have none.
    pub fn type_arguments(&self) -> &[SyntaxType] {
        match self {
            RecoveredSource::VariableDeclaration { ty: Some(ty), .. }
            | RecoveredSource::SyntacticType(ty)
                if ty.dimensions == 0 =>
            {
                &ty.args
            }
            RecoveredSource::VariableDeclaration { .. }
            | RecoveredSource::SyntacticType(_)
            | RecoveredSource::InternalType(_)
            | RecoveredSource::Inner { .. } => &[],
        }
    }

    /// `Recovered#<qualified name>#<dimensions>`.
    pub fn key(&self, model: &SemanticModel) -> String {
        format!("Recovered#{}#{}", self.base_qualified_name(model), self.dimensions())
    }

    /// The same source with `dimensions` array dimensions, when the source
    /// carries its own syntax.
    pub(crate) fn with_dimensions(&self, dimensions: u32) -> Option<RecoveredSource> {
        match self {
            RecoveredSource::VariableDeclaration { name, ty } => {
                let ty = ty
                    .clone()
                    .unwrap_or_else(|| SyntaxType::new(JAVA_LANG_OBJECT))
                    .with_dimensions(dimensions);
                Some(RecoveredSource::VariableDeclaration {
                    name: name.clone(),
                    ty: Some(ty),
                })
            }
            RecoveredSource::SyntacticType(ty) => Some(RecoveredSource::SyntacticType(
                ty.clone().with_dimensions(dimensions),
            )),
            RecoveredSource::InternalType(_) | RecoveredSource::Inner { .. } => None,
        }
    }
}

fn strip_brackets(name: &str) -> &str {
    name.trim_end_matches("[]")
}
