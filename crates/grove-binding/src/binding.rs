//! Public bindings.
//!
//! Bindings are immutable snapshots built before they are published to the
//! session tables. Anything that needs other bindings (superclass, members,
//! declared types) is answered through the [`BindingResolver`] so that the
//! identity guarantees of the tables apply to it as well.

use std::fmt;
use std::sync::Arc;

use grove_ast::ast::Modifiers;
use grove_core::SmolStr;

use crate::key;
use crate::model::{
    AnnotationId, InternalRef, MemberValue, MethodId, ModuleId, PackageId, SemanticModel, TypeId,
    TypeKind, VarId, VarOwner,
};
use crate::recovered::{RecoveredSource, JAVA_LANG_OBJECT};
use crate::resolver::BindingResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Package,
    Module,
    Type,
    Method,
    Variable,
    MemberValuePair,
    Annotation,
}

#[derive(Clone)]
pub enum Binding {
    Package(Arc<PackageBinding>),
    Module(Arc<ModuleBinding>),
    Type(Arc<TypeBinding>),
    Method(Arc<MethodBinding>),
    Variable(Arc<VariableBinding>),
    MemberValuePair(Arc<MemberValuePairBinding>),
    Annotation(Arc<AnnotationBinding>),
}

impl Binding {
    pub fn kind(&self) -> BindingKind {
        match self {
            Binding::Package(_) => BindingKind::Package,
            Binding::Module(_) => BindingKind::Module,
            Binding::Type(_) => BindingKind::Type,
            Binding::Method(_) => BindingKind::Method,
            Binding::Variable(_) => BindingKind::Variable,
            Binding::MemberValuePair(_) => BindingKind::MemberValuePair,
            Binding::Annotation(_) => BindingKind::Annotation,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Binding::Package(b) => &b.key,
            Binding::Module(b) => &b.key,
            Binding::Type(b) => &b.key,
            Binding::Method(b) => &b.key,
            Binding::Variable(b) => &b.key,
            Binding::MemberValuePair(b) => &b.key,
            Binding::Annotation(b) => &b.key,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Binding::Package(b) => &b.name,
            Binding::Module(b) => &b.name,
            Binding::Type(b) => &b.name,
            Binding::Method(b) => &b.name,
            Binding::Variable(b) => &b.name,
            Binding::MemberValuePair(b) => &b.name,
            Binding::Annotation(b) => &b.name,
        }
    }

    pub fn is_recovered(&self) -> bool {
        match self {
            Binding::Type(b) => b.is_recovered(),
            Binding::Variable(b) => b.is_recovered(),
            _ => false,
        }
    }

    /// Same declaration: same kind and same key.
    pub fn is_equal_to(&self, other: &Binding) -> bool {
        self.kind() == other.kind() && self.key() == other.key()
    }

    /// Same published instance.
    pub fn same_instance(&self, other: &Binding) -> bool {
        match (self, other) {
            (Binding::Package(a), Binding::Package(b)) => Arc::ptr_eq(a, b),
            (Binding::Module(a), Binding::Module(b)) => Arc::ptr_eq(a, b),
            (Binding::Type(a), Binding::Type(b)) => Arc::ptr_eq(a, b),
            (Binding::Method(a), Binding::Method(b)) => Arc::ptr_eq(a, b),
            (Binding::Variable(a), Binding::Variable(b)) => Arc::ptr_eq(a, b),
            (Binding::MemberValuePair(a), Binding::MemberValuePair(b)) => Arc::ptr_eq(a, b),
            (Binding::Annotation(a), Binding::Annotation(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_type(&self) -> Option<&Arc<TypeBinding>> {
        match self {
            Binding::Type(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Arc<MethodBinding>> {
        match self {
            Binding::Method(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Arc<VariableBinding>> {
        match self {
            Binding::Variable(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_package(&self) -> Option<&Arc<PackageBinding>> {
        match self {
            Binding::Package(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind(), self.key())
    }
}

// --- types ------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) enum TypeOrigin {
    Resolved(TypeId),
    Recovered(RecoveredSource),
}

#[derive(Debug)]
pub struct TypeBinding {
    key: String,
    name: SmolStr,
    qualified_name: SmolStr,
    kind: TypeKind,
    modifiers: Modifiers,
    dimensions: u32,
    origin: TypeOrigin,
}

impl TypeBinding {
    pub(crate) fn resolved(model: &SemanticModel, id: TypeId) -> Self {
        let data = model.ty(id);
        let qualified_name = model.qualified_type_name(id);
        let mut name = match data.element {
            Some((_, dims)) => format!("{}{}", data.name, "[]".repeat(dims as usize)),
            None => data.name.to_string(),
        };
        if !data.type_arguments.is_empty() {
            let args: Vec<String> = data
                .type_arguments
                .iter()
                .map(|arg| model.ty(*arg).name.to_string())
                .collect();
            name = format!("{name}<{}>", args.join(","));
        }
        TypeBinding {
            key: key::type_key(model, id),
            name: name.into(),
            qualified_name: qualified_name.into(),
            kind: data.kind,
            modifiers: data.modifiers,
            dimensions: data.element.map_or(0, |(_, dims)| dims),
            origin: TypeOrigin::Resolved(id),
        }
    }

    pub(crate) fn recovered(model: &SemanticModel, source: RecoveredSource) -> Self {
        let dimensions = source.dimensions();
        TypeBinding {
            key: source.key(model),
            name: source.name(model).into(),
            qualified_name: source.qualified_name(model).into(),
            kind: if dimensions > 0 {
                TypeKind::Array
            } else {
                TypeKind::Class
            },
            modifiers: Modifiers::NONE,
            dimensions,
            origin: TypeOrigin::Recovered(source),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn dimensions(&self) -> u32 {
        self.dimensions
    }

    pub fn is_array(&self) -> bool {
        self.dimensions > 0
    }

    pub fn is_primitive(&self) -> bool {
        self.kind == TypeKind::Primitive
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self.origin, TypeOrigin::Recovered(_))
    }

    /// The engine's object, for resolved bindings.
    pub fn internal(&self) -> Option<TypeId> {
        match self.origin {
            TypeOrigin::Resolved(id) => Some(id),
            TypeOrigin::Recovered(_) => None,
        }
    }

    pub fn recovered_source(&self) -> Option<&RecoveredSource> {
        match &self.origin {
            TypeOrigin::Recovered(source) => Some(source),
            TypeOrigin::Resolved(_) => None,
        }
    }

    pub fn is_equal_to(&self, other: &TypeBinding) -> bool {
        self.key == other.key
    }

    pub fn superclass(&self, resolver: &BindingResolver) -> Option<Arc<TypeBinding>> {
        match &self.origin {
            TypeOrigin::Resolved(id) => {
                let superclass = resolver.model().ty(*id).superclass?;
                resolver.get_type_binding(superclass)
            }
            TypeOrigin::Recovered(_) => {
                if self.qualified_name == JAVA_LANG_OBJECT {
                    return None;
                }
                resolver.java_lang_object()
            }
        }
    }

    pub fn interfaces(&self, resolver: &BindingResolver) -> Vec<Arc<TypeBinding>> {
        match self.origin {
            TypeOrigin::Resolved(id) => resolver
                .model()
                .ty(id)
                .interfaces
                .iter()
                .filter_map(|i| resolver.get_type_binding(*i))
                .collect(),
            TypeOrigin::Recovered(_) => Vec::new(),
        }
    }

    pub fn declared_fields(&self, resolver: &BindingResolver) -> Vec<Arc<VariableBinding>> {
        match self.origin {
            TypeOrigin::Resolved(id) => resolver
                .model()
                .ty(id)
                .fields
                .iter()
                .filter_map(|f| resolver.get_variable_binding(*f))
                .collect(),
            TypeOrigin::Recovered(_) => Vec::new(),
        }
    }

    pub fn declared_methods(&self, resolver: &BindingResolver) -> Vec<Arc<MethodBinding>> {
        match self.origin {
            TypeOrigin::Resolved(id) => resolver
                .model()
                .ty(id)
                .methods
                .iter()
                .filter_map(|m| resolver.get_method_binding(*m))
                .collect(),
            TypeOrigin::Recovered(_) => Vec::new(),
        }
    }

    pub fn declared_types(&self, resolver: &BindingResolver) -> Vec<Arc<TypeBinding>> {
        match self.origin {
            TypeOrigin::Resolved(id) => resolver
                .model()
                .ty(id)
                .member_types
                .iter()
                .filter_map(|t| resolver.get_type_binding(*t))
                .collect(),
            TypeOrigin::Recovered(_) => Vec::new(),
        }
    }

    pub fn declaring_type(&self, resolver: &BindingResolver) -> Option<Arc<TypeBinding>> {
        match self.origin {
            TypeOrigin::Resolved(id) => resolver.get_type_binding(resolver.model().ty(id).outer?),
            TypeOrigin::Recovered(_) => None,
        }
    }

    pub fn package(&self, resolver: &BindingResolver) -> Option<Arc<PackageBinding>> {
        match self.origin {
            TypeOrigin::Resolved(id) => resolver.get_package_binding(resolver.model().ty(id).package?),
            TypeOrigin::Recovered(_) => None,
        }
    }

    pub fn annotations(&self, resolver: &BindingResolver) -> Vec<Arc<AnnotationBinding>> {
        match self.origin {
            TypeOrigin::Resolved(id) => resolver.annotations_of(InternalRef::Type(id)),
            TypeOrigin::Recovered(_) => Vec::new(),
        }
    }

    pub fn type_arguments(&self, resolver: &BindingResolver) -> Vec<Arc<TypeBinding>> {
        match &self.origin {
            TypeOrigin::Resolved(id) => resolver
                .model()
                .ty(*id)
                .type_arguments
                .iter()
                .filter_map(|arg| resolver.get_type_binding(*arg))
                .collect(),
            TypeOrigin::Recovered(source) => source
                .type_arguments()
                .iter()
                .filter_map(|arg| resolver.type_from_syntax(arg))
                .collect(),
        }
    }

    /// Innermost non-array type of an array.
    pub fn element_type(self: &Arc<Self>, resolver: &BindingResolver) -> Option<Arc<TypeBinding>> {
        if !self.is_array() {
            return None;
        }
        match &self.origin {
            TypeOrigin::Resolved(id) => {
                let (element, _) = resolver.model().ty(*id).element?;
                resolver.get_type_binding(element)
            }
            TypeOrigin::Recovered(RecoveredSource::Inner { inner, .. }) => {
                if inner.is_array() {
                    inner.element_type(resolver)
                } else {
                    Some(inner.clone())
                }
            }
            TypeOrigin::Recovered(source) => {
                Some(resolver.recovered_type(source.with_dimensions(0)?))
            }
        }
    }

    /// The array type with one dimension less.
    pub fn component_type(self: &Arc<Self>, resolver: &BindingResolver) -> Option<Arc<TypeBinding>> {
        match self.dimensions {
            0 => None,
            1 => self.element_type(resolver),
            dims => match &self.origin {
                TypeOrigin::Resolved(id) => {
                    let (element, _) = resolver.model().ty(*id).element?;
                    resolver.array_type(element, dims - 1)
                }
                TypeOrigin::Recovered(RecoveredSource::Inner { inner, dimensions }) => {
                    if *dimensions > 1 {
                        Some(resolver.recovered_type(RecoveredSource::Inner {
                            inner: inner.clone(),
                            dimensions: dimensions - 1,
                        }))
                    } else {
                        Some(inner.clone())
                    }
                }
                TypeOrigin::Recovered(source) => {
                    Some(resolver.recovered_type(source.with_dimensions(dims - 1)?))
                }
            },
        }
    }

    /// This type with `dimensions` more array dimensions.
    pub fn create_array_type(
        self: &Arc<Self>,
        resolver: &BindingResolver,
        dimensions: u32,
    ) -> Option<Arc<TypeBinding>> {
        if dimensions == 0 {
            return Some(self.clone());
        }
        match &self.origin {
            TypeOrigin::Resolved(id) => {
                let (element, dims) = resolver.model().ty(*id).element.unwrap_or((*id, 0));
                resolver.array_type(element, dims + dimensions).or_else(|| {
                    resolver.is_recovering().then(|| {
                        resolver.recovered_type(RecoveredSource::Inner {
                            inner: self.clone(),
                            dimensions,
                        })
                    })
                })
            }
            TypeOrigin::Recovered(source) => {
                let source = source
                    .with_dimensions(self.dimensions + dimensions)
                    .unwrap_or_else(|| RecoveredSource::Inner {
                        inner: self.clone(),
                        dimensions,
                    });
                Some(resolver.recovered_type(source))
            }
        }
    }
}

impl PartialEq for TypeBinding {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal_to(other)
    }
}

impl Eq for TypeBinding {}

// --- methods ----------------------------------------------------------------

#[derive(Debug)]
pub struct MethodBinding {
    key: String,
    name: SmolStr,
    modifiers: Modifiers,
    is_constructor: bool,
    id: MethodId,
}

impl MethodBinding {
    pub(crate) fn new(model: &SemanticModel, id: MethodId) -> Self {
        let data = model.method(id);
        MethodBinding {
            key: key::method_key(model, id),
            name: data.name.clone(),
            modifiers: data.modifiers,
            is_constructor: data.is_constructor(),
            id,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_constructor(&self) -> bool {
        self.is_constructor
    }

    pub fn internal(&self) -> MethodId {
        self.id
    }

    pub fn declaring_type(&self, resolver: &BindingResolver) -> Option<Arc<TypeBinding>> {
        resolver.get_type_binding(resolver.model().method(self.id).declaring_type)
    }

    pub fn parameters(&self, resolver: &BindingResolver) -> Vec<Arc<VariableBinding>> {
        resolver
            .model()
            .method(self.id)
            .params
            .iter()
            .filter_map(|p| resolver.get_variable_binding(*p))
            .collect()
    }

    pub fn parameter_types(&self, resolver: &BindingResolver) -> Vec<Arc<TypeBinding>> {
        let model = resolver.model();
        model
            .method(self.id)
            .params
            .iter()
            .filter_map(|p| resolver.get_type_binding(model.variable(*p).ty))
            .collect()
    }

    /// `None` for constructors.
    pub fn return_type(&self, resolver: &BindingResolver) -> Option<Arc<TypeBinding>> {
        resolver.get_type_binding(resolver.model().method(self.id).return_type?)
    }

    pub fn annotations(&self, resolver: &BindingResolver) -> Vec<Arc<AnnotationBinding>> {
        resolver.annotations_of(InternalRef::Method(self.id))
    }

    pub fn is_equal_to(&self, other: &MethodBinding) -> bool {
        self.key == other.key
    }
}

// --- variables --------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) enum VariableOrigin {
    Resolved(VarId),
    /// A declaration the engine never saw; its type is recovered too.
    Recovered(RecoveredSource),
}

#[derive(Debug)]
pub struct VariableBinding {
    key: String,
    name: SmolStr,
    modifiers: Modifiers,
    owner: Option<VarOwner>,
    origin: VariableOrigin,
}

impl VariableBinding {
    pub(crate) fn resolved(model: &SemanticModel, id: VarId) -> Self {
        let data = model.variable(id);
        VariableBinding {
            key: key::internal_key(model, InternalRef::Variable(id)),
            name: data.name.clone(),
            modifiers: data.modifiers,
            owner: Some(data.owner),
            origin: VariableOrigin::Resolved(id),
        }
    }

    pub(crate) fn recovered(model: &SemanticModel, name: SmolStr, source: RecoveredSource) -> Self {
        VariableBinding {
            key: format!("{}#{name}", source.key(model)),
            name,
            modifiers: Modifiers::NONE,
            owner: None,
            origin: VariableOrigin::Recovered(source),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_field(&self) -> bool {
        matches!(self.owner, Some(VarOwner::Field(_)))
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.owner, Some(VarOwner::Parameter(_)))
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self.origin, VariableOrigin::Recovered(_))
    }

    pub fn internal(&self) -> Option<VarId> {
        match self.origin {
            VariableOrigin::Resolved(id) => Some(id),
            VariableOrigin::Recovered(_) => None,
        }
    }

    /// Declared type.
    pub fn ty(&self, resolver: &BindingResolver) -> Option<Arc<TypeBinding>> {
        match &self.origin {
            VariableOrigin::Resolved(id) => resolver.get_type_binding(resolver.model().variable(*id).ty),
            VariableOrigin::Recovered(source) => Some(resolver.recovered_type(source.clone())),
        }
    }

    /// Type declaring a field.
    pub fn declaring_type(&self, resolver: &BindingResolver) -> Option<Arc<TypeBinding>> {
        match self.owner? {
            VarOwner::Field(owner) => resolver.get_type_binding(owner),
            VarOwner::Parameter(_) | VarOwner::Local(_) => None,
        }
    }

    /// Method declaring a parameter or local.
    pub fn declaring_method(&self, resolver: &BindingResolver) -> Option<Arc<MethodBinding>> {
        match self.owner? {
            VarOwner::Parameter(method) | VarOwner::Local(method) => resolver.get_method_binding(method),
            VarOwner::Field(_) => None,
        }
    }

    pub fn annotations(&self, resolver: &BindingResolver) -> Vec<Arc<AnnotationBinding>> {
        match self.origin {
            VariableOrigin::Resolved(id) => resolver.annotations_of(InternalRef::Variable(id)),
            VariableOrigin::Recovered(_) => Vec::new(),
        }
    }

    pub fn is_equal_to(&self, other: &VariableBinding) -> bool {
        self.key == other.key
    }
}

// --- packages and modules ---------------------------------------------------

#[derive(Debug)]
pub struct PackageBinding {
    key: String,
    name: SmolStr,
    id: PackageId,
}

impl PackageBinding {
    pub(crate) fn new(model: &SemanticModel, id: PackageId) -> Self {
        let name = model.package(id).name.clone();
        PackageBinding {
            key: name.to_string(),
            name,
            id,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn internal(&self) -> PackageId {
        self.id
    }

    pub fn is_unnamed(&self) -> bool {
        self.name.is_empty()
    }

    pub fn name_components(&self) -> Vec<&str> {
        if self.is_unnamed() {
            return Vec::new();
        }
        self.name.split('.').collect()
    }
}

#[derive(Debug)]
pub struct ModuleBinding {
    key: String,
    name: SmolStr,
    id: ModuleId,
}

impl ModuleBinding {
    pub(crate) fn new(model: &SemanticModel, id: ModuleId) -> Self {
        ModuleBinding {
            key: key::internal_key(model, InternalRef::Module(id)),
            name: model.module(id).name.clone(),
            id,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn packages(&self, resolver: &BindingResolver) -> Vec<Arc<PackageBinding>> {
        resolver
            .model()
            .module(self.id)
            .packages
            .iter()
            .filter_map(|p| resolver.get_package_binding(*p))
            .collect()
    }
}

// --- annotations ------------------------------------------------------------

#[derive(Debug)]
pub struct AnnotationBinding {
    key: String,
    /// Simple name of the annotation type.
    name: SmolStr,
    id: AnnotationId,
}

impl AnnotationBinding {
    pub(crate) fn new(model: &SemanticModel, id: AnnotationId) -> Self {
        AnnotationBinding {
            key: key::internal_key(model, InternalRef::Annotation(id)),
            name: model.ty(model.annotation(id).ty).name.clone(),
            id,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotation_type(&self, resolver: &BindingResolver) -> Option<Arc<TypeBinding>> {
        resolver.get_type_binding(resolver.model().annotation(self.id).ty)
    }

    pub fn member_value_pairs(&self, resolver: &BindingResolver) -> Vec<Arc<MemberValuePairBinding>> {
        let count = resolver.model().annotation(self.id).pairs.len();
        (0..count as u32)
            .filter_map(|index| resolver.get_member_value_pair_binding(self.id, index))
            .collect()
    }
}

#[derive(Debug)]
pub struct MemberValuePairBinding {
    key: String,
    name: SmolStr,
    value: MemberValue,
    annotation: AnnotationId,
}

impl MemberValuePairBinding {
    pub(crate) fn new(model: &SemanticModel, annotation: AnnotationId, index: u32) -> Option<Self> {
        let (name, value) = model.annotation(annotation).pairs.get(index as usize)?;
        Some(MemberValuePairBinding {
            key: key::internal_key(model, InternalRef::MemberValuePair { annotation, index }),
            name: name.clone(),
            value: value.clone(),
            annotation,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &MemberValue {
        &self.value
    }

    pub fn annotation(&self, resolver: &BindingResolver) -> Option<Arc<AnnotationBinding>> {
        resolver.get_annotation_binding(self.annotation)
    }
}
