//! The binding resolver bridge.
//!
//! A [`BindingResolver`] serves one compilation unit. Its bindings are
//! published in [`BindingTables`], which all resolvers of a session share, so
//! asking any of them twice about one internal object yields the same
//! instance. Bindings are built completely before they are inserted, and
//! insertion keeps whichever instance got there first.

use std::collections::HashMap;
use std::sync::Arc;

use grove_ast::ast::{ModuleNode, NodeId, NodeKind};
use grove_core::SmolStr;
use parking_lot::{Mutex, RwLock};

use crate::binding::{
    AnnotationBinding, Binding, MemberValuePairBinding, MethodBinding, ModuleBinding,
    PackageBinding, TypeBinding, VariableBinding,
};
use crate::model::{
    AnnotationId, InternalRef, MethodId, ModuleId, PackageId, Problem, ProblemReason, ScopeId,
    SemanticModel, TypeId, TypeKind, VarId, VarOwner,
};
use crate::recovered::{RecoveredSource, SyntaxType, JAVA_LANG_OBJECT};
use crate::BindingError;

/// Binding caches of one compilation session.
#[derive(Default)]
pub struct BindingTables {
    by_internal: RwLock<HashMap<InternalRef, Binding>>,
    by_key: RwLock<HashMap<String, Binding>>,
    annotations: RwLock<HashMap<AnnotationId, Arc<AnnotationBinding>>>,
}

impl BindingTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of interned bindings, annotations included.
    pub fn len(&self) -> usize {
        self.by_internal.read().len() + self.annotations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, internal: InternalRef) -> Option<Binding> {
        self.by_internal.read().get(&internal).cloned()
    }

    fn by_key(&self, key: &str) -> Option<Binding> {
        self.by_key.read().get(key).cloned()
    }

    /// Insert-if-absent; returns the instance that won.
    fn publish(&self, internal: InternalRef, binding: Binding) -> Binding {
        let published = self
            .by_internal
            .write()
            .entry(internal)
            .or_insert(binding)
            .clone();
        self.by_key
            .write()
            .entry(published.key().to_string())
            .or_insert_with(|| published.clone());
        published
    }

    fn publish_annotation(
        &self,
        id: AnnotationId,
        binding: Arc<AnnotationBinding>,
    ) -> Arc<AnnotationBinding> {
        let published = self.annotations.write().entry(id).or_insert(binding).clone();
        self.by_key
            .write()
            .entry(published.key().to_string())
            .or_insert_with(|| Binding::Annotation(published.clone()));
        published
    }
}

#[derive(Debug, Default)]
struct ResolverState {
    correspondence: HashMap<NodeId, InternalRef>,
    nodes: HashMap<InternalRef, NodeId>,
    declarations: HashMap<String, NodeId>,
    scopes: HashMap<NodeId, ScopeId>,
}

pub struct BindingResolver {
    model: Arc<SemanticModel>,
    tables: Arc<BindingTables>,
    recovering: bool,
    state: Mutex<ResolverState>,
}

impl BindingResolver {
    /// A resolver with its own session tables.
    pub fn new(model: Arc<SemanticModel>) -> Self {
        Self::with_tables(model, Arc::new(BindingTables::new()))
    }

    /// A resolver joining an existing session.
    pub fn with_tables(model: Arc<SemanticModel>, tables: Arc<BindingTables>) -> Self {
        Self {
            model,
            tables,
            recovering: false,
            state: Mutex::new(ResolverState::default()),
        }
    }

    #[must_use]
    pub fn recovering(mut self, recovering: bool) -> Self {
        self.recovering = recovering;
        self
    }

    pub fn is_recovering(&self) -> bool {
        self.recovering
    }

    pub fn model(&self) -> &SemanticModel {
        &self.model
    }

    pub fn tables(&self) -> &Arc<BindingTables> {
        &self.tables
    }

    fn cached(
        &self,
        internal: InternalRef,
        build: impl FnOnce(&SemanticModel) -> Option<Binding>,
    ) -> Option<Binding> {
        if let Some(existing) = self.tables.get(internal) {
            return Some(existing);
        }
        let binding = build(self.model.as_ref())?;
        tracing::trace!(target: "grove.binding", key = binding.key(), "new binding");
        Some(self.tables.publish(internal, binding))
    }

    // --- internal objects ---------------------------------------------------

    pub fn get_type_binding(&self, id: TypeId) -> Option<Arc<TypeBinding>> {
        let data = self.model.ty(id);
        if let Some(problem) = data.problem {
            return self.problem_type(id, problem);
        }
        if data.kind == TypeKind::Missing {
            return self
                .recovering
                .then(|| self.recovered_type(RecoveredSource::InternalType(id)));
        }
        self.valid_type(id)
    }

    fn valid_type(&self, id: TypeId) -> Option<Arc<TypeBinding>> {
        let binding = self.cached(InternalRef::Type(id), |model| {
            Some(Binding::Type(Arc::new(TypeBinding::resolved(model, id))))
        })?;
        binding.as_type().cloned()
    }

    fn problem_type(&self, id: TypeId, problem: Problem) -> Option<Arc<TypeBinding>> {
        if !self.recovering {
            tracing::trace!(target: "grove.binding", reason = ?problem.reason, "problem type");
            return None;
        }
        match (problem.reason, problem.closest_match) {
            (ProblemReason::NotFound, _) => {
                Some(self.recovered_type(RecoveredSource::InternalType(id)))
            }
            (_, Some(InternalRef::Type(closest))) if self.model.ty(closest).problem.is_none() => {
                self.valid_type(closest)
            }
            _ => None,
        }
    }

    pub fn get_method_binding(&self, id: MethodId) -> Option<Arc<MethodBinding>> {
        let target = match self.model.method(id).problem {
            None => id,
            Some(_) if !self.recovering => return None,
            Some(Problem {
                closest_match: Some(InternalRef::Method(closest)),
                ..
            }) if self.model.method(closest).problem.is_none() => closest,
            Some(_) => return None,
        };
        let binding = self.cached(InternalRef::Method(target), |model| {
            Some(Binding::Method(Arc::new(MethodBinding::new(model, target))))
        })?;
        binding.as_method().cloned()
    }

    pub fn get_variable_binding(&self, id: VarId) -> Option<Arc<VariableBinding>> {
        let data = self.model.variable(id);
        let target = match data.problem {
            None => id,
            Some(_) if !self.recovering => return None,
            // The field exists; it is only out of reach from here.
            Some(Problem {
                reason: ProblemReason::NotVisible,
                ..
            }) if matches!(data.owner, VarOwner::Field(_)) => id,
            Some(Problem {
                closest_match: Some(InternalRef::Variable(closest)),
                ..
            }) if self.model.variable(closest).problem.is_none() => closest,
            Some(_) => return None,
        };
        let binding = self.cached(InternalRef::Variable(target), |model| {
            Some(Binding::Variable(Arc::new(VariableBinding::resolved(model, target))))
        })?;
        binding.as_variable().cloned()
    }

    pub fn get_package_binding(&self, id: PackageId) -> Option<Arc<PackageBinding>> {
        let binding = self.cached(InternalRef::Package(id), |model| {
            Some(Binding::Package(Arc::new(PackageBinding::new(model, id))))
        })?;
        binding.as_package().cloned()
    }

    pub fn get_module_binding(&self, id: ModuleId) -> Option<Arc<ModuleBinding>> {
        match self.cached(InternalRef::Module(id), |model| {
            Some(Binding::Module(Arc::new(ModuleBinding::new(model, id))))
        })? {
            Binding::Module(module) => Some(module),
            _ => None,
        }
    }

    pub fn get_annotation_binding(&self, id: AnnotationId) -> Option<Arc<AnnotationBinding>> {
        if let Some(existing) = self.tables.annotations.read().get(&id) {
            return Some(existing.clone());
        }
        let binding = Arc::new(AnnotationBinding::new(&self.model, id));
        Some(self.tables.publish_annotation(id, binding))
    }

    pub fn get_member_value_pair_binding(
        &self,
        annotation: AnnotationId,
        index: u32,
    ) -> Option<Arc<MemberValuePairBinding>> {
        let internal = InternalRef::MemberValuePair { annotation, index };
        match self.cached(internal, |model| {
            MemberValuePairBinding::new(model, annotation, index)
                .map(|pair| Binding::MemberValuePair(Arc::new(pair)))
        })? {
            Binding::MemberValuePair(pair) => Some(pair),
            _ => None,
        }
    }

    /// Binding of any internal object.
    pub fn binding_for(&self, internal: InternalRef) -> Option<Binding> {
        match internal {
            InternalRef::Type(id) => self.get_type_binding(id).map(Binding::Type),
            InternalRef::Method(id) => self.get_method_binding(id).map(Binding::Method),
            InternalRef::Variable(id) => self.get_variable_binding(id).map(Binding::Variable),
            InternalRef::Package(id) => self.get_package_binding(id).map(Binding::Package),
            InternalRef::Module(id) => self.get_module_binding(id).map(Binding::Module),
            InternalRef::Annotation(id) => self.get_annotation_binding(id).map(Binding::Annotation),
            InternalRef::MemberValuePair { annotation, index } => self
                .get_member_value_pair_binding(annotation, index)
                .map(Binding::MemberValuePair),
        }
    }

    /// Look a binding up by key, in the session tables first and then in the
    /// model.
    pub fn find_binding_by_key(&self, key: &str) -> Option<Binding> {
        if let Some(found) = self.tables.by_key(key) {
            return Some(found);
        }
        let internal = self.model.find_by_key(key)?;
        self.binding_for(internal)
    }

    pub(crate) fn annotations_of(&self, owner: InternalRef) -> Vec<Arc<AnnotationBinding>> {
        let ids: Vec<AnnotationId> = self
            .model
            .refs()
            .filter_map(|internal| match internal {
                InternalRef::Annotation(id) if self.model.annotation(id).owner == owner => Some(id),
                _ => None,
            })
            .collect();
        ids.into_iter()
            .filter_map(|id| self.get_annotation_binding(id))
            .collect()
    }

    // --- recovered bindings -------------------------------------------------

    pub fn recovered_type(&self, source: RecoveredSource) -> Arc<TypeBinding> {
        Arc::new(TypeBinding::recovered(&self.model, source))
    }

    pub fn java_lang_object(&self) -> Option<Arc<TypeBinding>> {
        self.get_type_binding(self.model.find_type(JAVA_LANG_OBJECT)?)
    }

    /// The model's `element` array with `dims` dimensions, if it has one.
    pub(crate) fn array_type(&self, element: TypeId, dims: u32) -> Option<Arc<TypeBinding>> {
        self.get_type_binding(self.model.array_of(element, dims)?)
    }

    /// A written type: the model's type of that name when it has one,
    /// otherwise a recovered binding.
    pub fn type_from_syntax(&self, syntax: &SyntaxType) -> Option<Arc<TypeBinding>> {
        if syntax.args.is_empty() {
            if let Some(found) = self.model.find_type(&syntax.name) {
                if syntax.dimensions == 0 {
                    return self.get_type_binding(found);
                }
                if let Some(array) = self.array_type(found, syntax.dimensions) {
                    return Some(array);
                }
            }
        }
        self.recovering
            .then(|| self.recovered_type(RecoveredSource::SyntacticType(syntax.clone())))
    }

    // --- AST entry points ---------------------------------------------------

    pub fn resolve_type(&self, module: &ModuleNode, node: NodeId) -> Option<Arc<TypeBinding>> {
        if !matches!(module.ast.kind(node), NodeKind::TypeRef(_)) {
            return None;
        }
        if let Some(InternalRef::Type(id)) = self.corresponding_internal(node) {
            return self.get_type_binding(id);
        }
        if !self.recovering {
            return None;
        }
        let syntax = SyntaxType::from_ast(&module.ast, node)?;
        Some(self.recovered_type(RecoveredSource::SyntacticType(syntax)))
    }

    /// Fields, parameters and local declarations.
    pub fn resolve_variable(&self, module: &ModuleNode, node: NodeId) -> Option<Arc<VariableBinding>> {
        let (name, ty) = declared_variable(module, node)?;
        if let Some(InternalRef::Variable(id)) = self.corresponding_internal(node) {
            return self.get_variable_binding(id);
        }
        if !self.recovering {
            return None;
        }
        let source = RecoveredSource::VariableDeclaration {
            name: name.clone(),
            ty,
        };
        Some(Arc::new(VariableBinding::recovered(&self.model, name, source)))
    }

    /// Methods and constructors.
    pub fn resolve_method(&self, module: &ModuleNode, node: NodeId) -> Option<Arc<MethodBinding>> {
        if !matches!(
            module.ast.kind(node),
            NodeKind::Method(_) | NodeKind::Constructor(_)
        ) {
            return None;
        }
        match self.corresponding_internal(node)? {
            InternalRef::Method(id) => self.get_method_binding(id),
            _ => None,
        }
    }

    /// A variable expression: its recorded correspondence, or a lookup of
    /// its name in the scope recorded for it.
    pub fn resolve_name(&self, module: &ModuleNode, node: NodeId) -> Option<Binding> {
        let NodeKind::Variable { name } = module.ast.kind(node) else {
            return None;
        };
        if let Some(internal) = self.corresponding_internal(node) {
            return self.binding_for(internal);
        }
        let scope = self.state.lock().scopes.get(&node).copied()?;
        let internal = self.model.lookup(scope, name)?;
        self.binding_for(internal)
    }

    /// Declared type of a field, parameter or local declaration.
    pub fn type_of_declaration(&self, module: &ModuleNode, node: NodeId) -> Option<Arc<TypeBinding>> {
        let (name, ty) = declared_variable(module, node)?;
        if let Some(InternalRef::Variable(id)) = self.corresponding_internal(node) {
            if let Some(variable) = self.get_variable_binding(id) {
                return variable.ty(self);
            }
        }
        self.recovering
            .then(|| self.recovered_type(RecoveredSource::VariableDeclaration { name, ty }))
    }

    // --- node maps ----------------------------------------------------------

    pub fn record_correspondence(&self, node: NodeId, internal: InternalRef) {
        let mut state = self.state.lock();
        state.correspondence.insert(node, internal);
        state.nodes.insert(internal, node);
    }

    pub fn corresponding_internal(&self, node: NodeId) -> Option<InternalRef> {
        self.state.lock().correspondence.get(&node).copied()
    }

    pub fn corresponding_node(&self, internal: InternalRef) -> Option<NodeId> {
        self.state.lock().nodes.get(&internal).copied()
    }

    pub fn record_declaration(&self, binding: &Binding, node: NodeId) {
        self.state
            .lock()
            .declarations
            .insert(binding.key().to_string(), node);
    }

    pub fn find_declaring_node(&self, binding: &Binding) -> Option<NodeId> {
        self.find_declaring_node_by_key(binding.key())
    }

    pub fn find_declaring_node_by_key(&self, key: &str) -> Option<NodeId> {
        self.state.lock().declarations.get(key).copied()
    }

    /// Remember the engine scope enclosing `node`.
    pub fn record_scope(&self, node: NodeId, scope: ScopeId) {
        self.state.lock().scopes.insert(node, scope);
    }

    /// Resolve the first `n` segments of the qualified name at `node` by
    /// replaying a lookup in the scope recorded for it: `a.b.c.D.e` with
    /// `n == 3` resolves `a.b.c`.
    pub fn resolve_qualified_prefix(
        &self,
        node: NodeId,
        segments: &[&str],
        n: usize,
    ) -> Result<Option<Binding>, BindingError> {
        if n == 0 || n > segments.len() {
            return Err(BindingError::PrefixOutOfRange {
                n,
                len: segments.len(),
            });
        }
        let Some(scope) = self.state.lock().scopes.get(&node).copied() else {
            return Ok(None);
        };
        let Some(mut current) = self.model.lookup(scope, segments[0]) else {
            return Ok(None);
        };
        for segment in &segments[1..n] {
            match self.model.member(current, segment) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(self.binding_for(current))
    }
}

fn declared_variable(module: &ModuleNode, node: NodeId) -> Option<(SmolStr, Option<SyntaxType>)> {
    let ast = &module.ast;
    let syntax = |ty: Option<NodeId>| ty.and_then(|ty| SyntaxType::from_ast(ast, ty));
    match ast.kind(node) {
        NodeKind::Field(decl) => Some((decl.name.clone(), syntax(decl.ty))),
        NodeKind::Parameter(decl) => Some((decl.name.clone(), syntax(decl.ty))),
        NodeKind::Declaration(decl) => {
            let name = ast.node(decl.target).name()?;
            Some((SmolStr::new(name), syntax(decl.ty)))
        }
        _ => None,
    }
}
