//! The semantic engine's resolved object graph.
//!
//! Objects live in per-kind arenas and are identified by their index; the
//! bridge keys its caches on [`InternalRef`]. A model is immutable once
//! built and is shared between resolvers through an `Arc`.

use std::collections::HashMap;

use grove_ast::ast::Modifiers;
use grove_core::SmolStr;

use crate::key;
use crate::BindingError;

macro_rules! arena_id {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(u32);

            impl $name {
                #[must_use]
                pub fn idx(self) -> usize {
                    self.0 as usize
                }

                fn from_len(len: usize) -> Self {
                    Self(len as u32)
                }
            }
        )*
    };
}

arena_id!(TypeId, MethodId, VarId, PackageId, ModuleId, AnnotationId, ScopeId);

/// Identity of an internal semantic object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalRef {
    Type(TypeId),
    Method(MethodId),
    Variable(VarId),
    Package(PackageId),
    Module(ModuleId),
    Annotation(AnnotationId),
    MemberValuePair { annotation: AnnotationId, index: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Trait,
    Primitive,
    Array,
    /// A type the engine referenced but could not find on the classpath.
    Missing,
}

/// Why the engine could not produce a valid object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemReason {
    NotFound,
    NotVisible,
    NonStaticReferenceInStaticContext,
    Ambiguous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Problem {
    pub reason: ProblemReason,
    /// The engine's best guess, when it has one.
    pub closest_match: Option<InternalRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeData {
    pub name: SmolStr,
    pub package: Option<PackageId>,
    pub outer: Option<TypeId>,
    pub kind: TypeKind,
    pub modifiers: Modifiers,
    pub superclass: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub type_arguments: Vec<TypeId>,
    /// Element type and dimensions of an array type.
    pub element: Option<(TypeId, u32)>,
    pub fields: Vec<VarId>,
    pub methods: Vec<MethodId>,
    pub member_types: Vec<TypeId>,
    pub problem: Option<Problem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodData {
    /// `<init>` for constructors.
    pub name: SmolStr,
    pub declaring_type: TypeId,
    pub modifiers: Modifiers,
    pub params: Vec<VarId>,
    /// `None` for constructors.
    pub return_type: Option<TypeId>,
    pub locals: Vec<VarId>,
    pub problem: Option<Problem>,
}

impl MethodData {
    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }
}

pub const CONSTRUCTOR_NAME: &str = "<init>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarOwner {
    Field(TypeId),
    Parameter(MethodId),
    Local(MethodId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarData {
    pub name: SmolStr,
    pub owner: VarOwner,
    pub ty: TypeId,
    pub modifiers: Modifiers,
    pub problem: Option<Problem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageData {
    /// Dotted name; empty for the default package.
    pub name: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleData {
    pub name: SmolStr,
    pub packages: Vec<PackageId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberValue {
    Bool(bool),
    Int(i64),
    String(SmolStr),
    Class(TypeId),
    Array(Vec<MemberValue>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationData {
    pub ty: TypeId,
    /// The annotated declaration.
    pub owner: InternalRef,
    pub pairs: Vec<(SmolStr, MemberValue)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeData {
    pub parent: Option<ScopeId>,
    pub names: HashMap<SmolStr, InternalRef>,
}

#[derive(Debug, Default)]
pub struct SemanticModel {
    types: Vec<TypeData>,
    methods: Vec<MethodData>,
    variables: Vec<VarData>,
    packages: Vec<PackageData>,
    modules: Vec<ModuleData>,
    annotations: Vec<AnnotationData>,
    scopes: Vec<ScopeData>,
    by_key: HashMap<String, InternalRef>,
}

impl SemanticModel {
    pub fn builder() -> SemanticModelBuilder {
        SemanticModelBuilder::default()
    }

    pub fn ty(&self, id: TypeId) -> &TypeData {
        &self.types[id.idx()]
    }

    pub fn method(&self, id: MethodId) -> &MethodData {
        &self.methods[id.idx()]
    }

    pub fn variable(&self, id: VarId) -> &VarData {
        &self.variables[id.idx()]
    }

    pub fn package(&self, id: PackageId) -> &PackageData {
        &self.packages[id.idx()]
    }

    pub fn module(&self, id: ModuleId) -> &ModuleData {
        &self.modules[id.idx()]
    }

    pub fn annotation(&self, id: AnnotationId) -> &AnnotationData {
        &self.annotations[id.idx()]
    }

    pub fn scope(&self, id: ScopeId) -> &ScopeData {
        &self.scopes[id.idx()]
    }

    /// Dotted name, `p.Outer.Inner`; arrays end in `[]` per dimension.
    pub fn qualified_type_name(&self, id: TypeId) -> String {
        let data = self.ty(id);
        if let Some((element, dims)) = data.element {
            return format!("{}{}", self.qualified_type_name(element), "[]".repeat(dims as usize));
        }
        match (data.outer, data.package) {
            (Some(outer), _) => format!("{}.{}", self.qualified_type_name(outer), data.name),
            (None, Some(package)) if !self.package(package).name.is_empty() => {
                format!("{}.{}", self.package(package).name, data.name)
            }
            _ => data.name.to_string(),
        }
    }

    pub fn find_type(&self, qualified_name: &str) -> Option<TypeId> {
        (0..self.types.len())
            .map(TypeId::from_len)
            .find(|id| self.ty(*id).element.is_none() && self.qualified_type_name(*id) == qualified_name)
    }

    pub fn find_package(&self, name: &str) -> Option<PackageId> {
        self.packages
            .iter()
            .position(|p| p.name == name)
            .map(PackageId::from_len)
    }

    /// The array type `element[]...` with `dims` dimensions, if the engine
    /// created one.
    pub fn array_of(&self, element: TypeId, dims: u32) -> Option<TypeId> {
        self.types
            .iter()
            .position(|t| t.element == Some((element, dims)))
            .map(TypeId::from_len)
    }

    pub fn find_by_key(&self, key: &str) -> Option<InternalRef> {
        self.by_key.get(key).copied()
    }

    /// Innermost binding of `name` visible from `scope`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<InternalRef> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let data = self.scope(id);
            if let Some(found) = data.names.get(name) {
                return Some(*found);
            }
            current = data.parent;
        }
        None
    }

    /// `name` looked up as a member of `owner`: a sub-package or type of a
    /// package, a member type or field of a type, a field of a variable's
    /// type.
    pub fn member(&self, owner: InternalRef, name: &str) -> Option<InternalRef> {
        match owner {
            InternalRef::Package(package) => {
                let base = &self.package(package).name;
                let nested = if base.is_empty() {
                    name.to_string()
                } else {
                    format!("{base}.{name}")
                };
                if let Some(sub) = self.find_package(&nested) {
                    return Some(InternalRef::Package(sub));
                }
                self.types
                    .iter()
                    .position(|t| t.package == Some(package) && t.outer.is_none() && t.name == name)
                    .map(|idx| InternalRef::Type(TypeId::from_len(idx)))
            }
            InternalRef::Type(ty) => {
                let data = self.ty(ty);
                if let Some(inner) = data.member_types.iter().find(|t| self.ty(**t).name == name) {
                    return Some(InternalRef::Type(*inner));
                }
                data.fields
                    .iter()
                    .find(|f| self.variable(**f).name == name)
                    .map(|f| InternalRef::Variable(*f))
            }
            InternalRef::Variable(var) => self.member(InternalRef::Type(self.variable(var).ty), name),
            _ => None,
        }
    }

    pub(crate) fn refs(&self) -> impl Iterator<Item = InternalRef> + '_ {
        let types = (0..self.types.len()).map(|i| InternalRef::Type(TypeId::from_len(i)));
        let methods = (0..self.methods.len()).map(|i| InternalRef::Method(MethodId::from_len(i)));
        let variables = (0..self.variables.len()).map(|i| InternalRef::Variable(VarId::from_len(i)));
        let packages = (0..self.packages.len()).map(|i| InternalRef::Package(PackageId::from_len(i)));
        let modules = (0..self.modules.len()).map(|i| InternalRef::Module(ModuleId::from_len(i)));
        let annotations = self.annotations.iter().enumerate().flat_map(|(i, data)| {
            let annotation = AnnotationId::from_len(i);
            std::iter::once(InternalRef::Annotation(annotation)).chain(
                (0..data.pairs.len()).map(move |index| InternalRef::MemberValuePair {
                    annotation,
                    index: index as u32,
                }),
            )
        });
        types
            .chain(methods)
            .chain(variables)
            .chain(packages)
            .chain(modules)
            .chain(annotations)
    }
}

/// Incremental construction of a [`SemanticModel`].
#[derive(Debug, Default)]
pub struct SemanticModelBuilder {
    model: SemanticModel,
}

impl SemanticModelBuilder {
    pub fn package(&mut self, name: &str) -> PackageId {
        if let Some(existing) = self.model.find_package(name) {
            return existing;
        }
        let id = PackageId::from_len(self.model.packages.len());
        self.model.packages.push(PackageData { name: name.into() });
        id
    }

    pub fn module(&mut self, name: &str, packages: &[PackageId]) -> ModuleId {
        let id = ModuleId::from_len(self.model.modules.len());
        self.model.modules.push(ModuleData {
            name: name.into(),
            packages: packages.to_vec(),
        });
        id
    }

    fn push_type(&mut self, data: TypeData) -> TypeId {
        let id = TypeId::from_len(self.model.types.len());
        if let Some(outer) = data.outer {
            self.model.types[outer.idx()].member_types.push(id);
        }
        self.model.types.push(data);
        id
    }

    fn blank_type(name: &str, kind: TypeKind) -> TypeData {
        TypeData {
            name: name.into(),
            package: None,
            outer: None,
            kind,
            modifiers: Modifiers::NONE,
            superclass: None,
            interfaces: Vec::new(),
            type_arguments: Vec::new(),
            element: None,
            fields: Vec::new(),
            methods: Vec::new(),
            member_types: Vec::new(),
            problem: None,
        }
    }

    /// A top-level type in `package`.
    pub fn ty(&mut self, package: PackageId, name: &str, kind: TypeKind) -> TypeId {
        let mut data = Self::blank_type(name, kind);
        data.package = Some(package);
        data.modifiers = Modifiers::PUBLIC;
        self.push_type(data)
    }

    pub fn class(&mut self, package: PackageId, name: &str) -> TypeId {
        self.ty(package, name, TypeKind::Class)
    }

    pub fn member_type(&mut self, outer: TypeId, name: &str, kind: TypeKind) -> TypeId {
        let mut data = Self::blank_type(name, kind);
        data.package = self.model.ty(outer).package;
        data.outer = Some(outer);
        data.modifiers = Modifiers::PUBLIC | Modifiers::STATIC;
        self.push_type(data)
    }

    pub fn primitive(&mut self, name: &str) -> TypeId {
        if let Some(idx) = self
            .model
            .types
            .iter()
            .position(|t| t.kind == TypeKind::Primitive && t.name == name)
        {
            return TypeId::from_len(idx);
        }
        self.push_type(Self::blank_type(name, TypeKind::Primitive))
    }

    pub fn array(&mut self, element: TypeId, dims: u32) -> TypeId {
        if let Some(existing) = self.model.array_of(element, dims) {
            return existing;
        }
        let mut data = Self::blank_type(&self.model.ty(element).name.clone(), TypeKind::Array);
        data.package = self.model.ty(element).package;
        data.element = Some((element, dims));
        self.push_type(data)
    }

    /// A referenced type the engine could not find.
    pub fn missing_type(&mut self, package: Option<PackageId>, name: &str) -> TypeId {
        let mut data = Self::blank_type(name, TypeKind::Missing);
        data.package = package;
        self.push_type(data)
    }

    /// `base<args>`; shares members with `base`.
    pub fn parameterized(&mut self, base: TypeId, args: &[TypeId]) -> TypeId {
        let mut data = self.model.ty(base).clone();
        data.member_types.clear();
        data.outer = None;
        data.type_arguments = args.to_vec();
        data.package = self.model.ty(base).package;
        self.push_type(data)
    }

    pub fn set_modifiers(&mut self, ty: TypeId, modifiers: Modifiers) {
        self.model.types[ty.idx()].modifiers = modifiers;
    }

    pub fn set_superclass(&mut self, ty: TypeId, superclass: TypeId) {
        self.model.types[ty.idx()].superclass = Some(superclass);
    }

    pub fn add_interface(&mut self, ty: TypeId, interface: TypeId) {
        self.model.types[ty.idx()].interfaces.push(interface);
    }

    pub fn field(&mut self, owner: TypeId, name: &str, ty: TypeId) -> VarId {
        let id = self.push_var(name, VarOwner::Field(owner), ty);
        self.model.types[owner.idx()].fields.push(id);
        id
    }

    pub fn method(
        &mut self,
        owner: TypeId,
        name: &str,
        params: &[(&str, TypeId)],
        return_type: Option<TypeId>,
    ) -> MethodId {
        let id = MethodId::from_len(self.model.methods.len());
        self.model.methods.push(MethodData {
            name: name.into(),
            declaring_type: owner,
            modifiers: Modifiers::PUBLIC,
            params: Vec::new(),
            return_type,
            locals: Vec::new(),
            problem: None,
        });
        for (param, ty) in params {
            let var = self.push_var(param, VarOwner::Parameter(id), *ty);
            self.model.methods[id.idx()].params.push(var);
        }
        self.model.types[owner.idx()].methods.push(id);
        id
    }

    pub fn parameters(&self, method: MethodId) -> &[VarId] {
        &self.model.method(method).params
    }

    pub fn constructor(&mut self, owner: TypeId, params: &[(&str, TypeId)]) -> MethodId {
        self.method(owner, CONSTRUCTOR_NAME, params, None)
    }

    pub fn set_method_modifiers(&mut self, method: MethodId, modifiers: Modifiers) {
        self.model.methods[method.idx()].modifiers = modifiers;
    }

    pub fn local(&mut self, method: MethodId, name: &str, ty: TypeId) -> VarId {
        let id = self.push_var(name, VarOwner::Local(method), ty);
        self.model.methods[method.idx()].locals.push(id);
        id
    }

    pub fn set_variable_modifiers(&mut self, var: VarId, modifiers: Modifiers) {
        self.model.variables[var.idx()].modifiers = modifiers;
    }

    fn push_var(&mut self, name: &str, owner: VarOwner, ty: TypeId) -> VarId {
        let id = VarId::from_len(self.model.variables.len());
        self.model.variables.push(VarData {
            name: name.into(),
            owner,
            ty,
            modifiers: Modifiers::NONE,
            problem: None,
        });
        id
    }

    pub fn annotation(
        &mut self,
        owner: InternalRef,
        ty: TypeId,
        pairs: Vec<(&str, MemberValue)>,
    ) -> AnnotationId {
        let id = AnnotationId::from_len(self.model.annotations.len());
        self.model.annotations.push(AnnotationData {
            ty,
            owner,
            pairs: pairs.into_iter().map(|(name, value)| (name.into(), value)).collect(),
        });
        id
    }

    pub fn scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId::from_len(self.model.scopes.len());
        self.model.scopes.push(ScopeData {
            parent,
            names: HashMap::new(),
        });
        id
    }

    pub fn bind(&mut self, scope: ScopeId, name: &str, target: InternalRef) {
        self.model.scopes[scope.idx()].names.insert(name.into(), target);
    }

    /// Tag `target` as a problem object.
    pub fn problem(
        &mut self,
        target: InternalRef,
        reason: ProblemReason,
        closest_match: Option<InternalRef>,
    ) {
        let problem = Some(Problem {
            reason,
            closest_match,
        });
        match target {
            InternalRef::Type(id) => self.model.types[id.idx()].problem = problem,
            InternalRef::Method(id) => self.model.methods[id.idx()].problem = problem,
            InternalRef::Variable(id) => self.model.variables[id.idx()].problem = problem,
            _ => {}
        }
    }

    /// Validate closest matches and index every object by its key.
    pub fn build(mut self) -> Result<SemanticModel, BindingError> {
        let problems = self
            .model
            .types
            .iter()
            .map(|t| (t.problem, "type"))
            .chain(self.model.methods.iter().map(|m| (m.problem, "method")))
            .chain(self.model.variables.iter().map(|v| (v.problem, "variable")));
        for (problem, expected) in problems {
            let Some(closest) = problem.and_then(|p| p.closest_match) else {
                continue;
            };
            let found = match closest {
                InternalRef::Type(_) => "type",
                InternalRef::Method(_) => "method",
                InternalRef::Variable(_) => "variable",
                _ => "other",
            };
            if found != expected {
                return Err(BindingError::ClosestMatchKind { expected, found });
            }
        }

        let mut by_key = HashMap::new();
        for internal in self.model.refs() {
            let key = key::internal_key(&self.model, internal);
            if let Some(previous) = by_key.insert(key.clone(), internal) {
                if previous != internal {
                    return Err(BindingError::DuplicateKey(key));
                }
            }
        }
        self.model.by_key = by_key;
        tracing::debug!(
            target: "grove.binding",
            types = self.model.types.len(),
            methods = self.model.methods.len(),
            variables = self.model.variables.len(),
            "built semantic model"
        );
        Ok(self.model)
    }
}
