//! Binding resolution over a semantic engine's resolved program.
//!
//! [`model`] is the engine's object graph. [`BindingResolver`] maps it onto
//! public [`Binding`]s, one instance per internal object per session, and
//! falls back to [`recovered`] bindings for code the engine could not make
//! sense of.

pub mod binding;
pub mod key;
pub mod model;
pub mod recovered;
pub mod resolver;

pub use binding::{
    AnnotationBinding, Binding, BindingKind, MemberValuePairBinding, MethodBinding, ModuleBinding,
    PackageBinding, TypeBinding, VariableBinding,
};
pub use model::{
    AnnotationId, InternalRef, MemberValue, MethodId, ModuleId, PackageId, ProblemReason, ScopeId,
    SemanticModel, SemanticModelBuilder, TypeId, TypeKind, VarId,
};
pub use recovered::{RecoveredSource, SyntaxType};
pub use resolver::{BindingResolver, BindingTables};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("duplicate binding key `{0}`")]
    DuplicateKey(String),
    #[error("closest match of a {expected} problem is a {found}")]
    ClosestMatchKind {
        expected: &'static str,
        found: &'static str,
    },
    #[error("cannot resolve the first {n} segments of a {len}-segment name")]
    PrefixOutOfRange { n: usize, len: usize },
}
