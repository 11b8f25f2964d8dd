use grove_core::SmolStr;
use grove_syntax::{RawKind, RawNodeId};
use grove_types::Span;

use crate::ast::{
    FieldDecl, ImportDecl, MethodDecl, Modifiers, NodeId, NodeKind, ParamDecl, TypeDecl, TypeKind,
};
use crate::error::ConvertError;
use crate::metadata::{keys, MetaValue};
use crate::positions;

use super::{codes, Converter, TypeFrame};

/// Modifiers written on a declaration.
pub(super) struct Written {
    pub(super) modifiers: Modifiers,
    pub(super) annotations: Vec<NodeId>,
    /// An access modifier was written.
    pub(super) access: bool,
}

impl Converter<'_> {
    pub(super) fn package_def(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let name = SmolStr::new(self.text_of(raw));
        let name_raw = self
            .child(raw, 0)
            .ok_or_else(|| self.missing_child(raw, RawKind::Ident))?;
        let id = self.alloc_at(NodeKind::Package { name: name.clone() }, raw);
        let name_range = self.pos(name_raw).range;
        self.set_name_range(id, name_range);
        self.package = Some(name);
        Ok(id)
    }

    pub(super) fn import(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let is_static = self.kind(raw) == RawKind::StaticImport;
        let dotted = self.text_of(raw);
        let name_raw = self
            .child(raw, 0)
            .ok_or_else(|| self.missing_child(raw, RawKind::Ident))?;
        let alias = match self.child(raw, 1) {
            Some(alias) => {
                self.assert_kind(alias, RawKind::Ident)?;
                Some(SmolStr::new(self.text_of(alias)))
            }
            None => None,
        };

        let (owner, last) = match dotted.rsplit_once('.') {
            Some((owner, last)) => (owner, last),
            None => ("", dotted),
        };
        let is_star = last == "*";
        let decl = match (is_static, is_star) {
            (_, true) => ImportDecl {
                name: SmolStr::new(owner),
                member: None,
                alias: None,
                is_static,
                is_star,
            },
            (true, false) => ImportDecl {
                name: SmolStr::new(owner),
                member: Some(SmolStr::new(last)),
                alias,
                is_static,
                is_star,
            },
            (false, false) => ImportDecl {
                name: SmolStr::new(dotted),
                member: None,
                alias,
                is_static,
                is_star,
            },
        };
        let id = self.alloc_at(NodeKind::Import(decl), raw);
        let name_range = self.pos(name_raw).range;
        self.set_name_range(id, name_range);
        Ok(id)
    }

    // --- types --------------------------------------------------------------

    /// `CLASS_DEF(MODIFIERS, IDENT, TYPE_PARAMETERS?, EXTENDS_CLAUSE?,
    /// IMPLEMENTS_CLAUSE?, OBJBLOCK)` and the other type definitions.
    pub(super) fn type_def(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let kind = match self.kind(raw) {
            RawKind::ClassDef => TypeKind::Class,
            RawKind::InterfaceDef => TypeKind::Interface,
            RawKind::EnumDef => TypeKind::Enum,
            RawKind::AnnotationDef => TypeKind::Annotation,
            RawKind::TraitDef => TypeKind::Trait,
            _ => return Err(self.unexpected(raw, RawKind::ClassDef)),
        };
        let mods_raw = self.expect_child(raw, 0, RawKind::Modifiers)?;
        let name_raw = self.expect_child(raw, 1, RawKind::Ident)?;
        let name = SmolStr::new(self.text_of(name_raw));

        let written = self.modifiers(mods_raw)?;
        let mut modifiers = written.modifiers;
        if !written.access {
            modifiers.insert(Modifiers::PUBLIC);
        }
        if kind.is_interface_like() {
            modifiers.insert(Modifiers::INTERFACE | Modifiers::ABSTRACT);
        }
        let outer = self.type_stack.last().cloned();
        if outer
            .as_ref()
            .is_some_and(|outer| outer.kind.is_interface_like())
        {
            modifiers.insert(Modifiers::STATIC);
        }
        let qualified_name = match (&outer, &self.package) {
            (Some(outer), _) => SmolStr::new(format!("{}${name}", outer.qualified_name)),
            (None, Some(package)) => SmolStr::new(format!("{package}.{name}")),
            (None, None) => name.clone(),
        };

        let id = self.alloc_at(
            NodeKind::Type(TypeDecl {
                kind,
                name: name.clone(),
                qualified_name: qualified_name.clone(),
                modifiers,
                synthetic_public: !written.access,
                annotations: written.annotations,
                type_params: Vec::new(),
                superclass: None,
                interfaces: Vec::new(),
                members: Vec::new(),
                outer: outer.as_ref().map(|outer| outer.id),
            }),
            raw,
        );
        let name_range = self.pos(name_raw).range;
        self.set_name_range(id, name_range);

        let mut type_params = Vec::new();
        let mut superclass = None;
        let mut interfaces = Vec::new();
        let mut body = None;
        for &child in &self.children(raw)[2..] {
            match self.kind(child) {
                RawKind::TypeParameters => type_params = self.type_parameters(child)?,
                RawKind::ExtendsClause => {
                    let mut types = self.type_list(child)?;
                    if matches!(kind, TypeKind::Class) && !types.is_empty() {
                        superclass = Some(types.remove(0));
                    }
                    interfaces.extend(types);
                }
                RawKind::ImplementsClause => interfaces.extend(self.type_list(child)?),
                RawKind::ObjBlock => body = Some(child),
                _ => self.assert_kind(child, RawKind::ObjBlock)?,
            }
        }
        let body = body.ok_or_else(|| self.missing_child(raw, RawKind::ObjBlock))?;

        self.type_stack.push(TypeFrame {
            id,
            kind,
            name,
            qualified_name,
        });
        let members = self.members(body);
        self.type_stack.pop();
        let members = members?;

        if let NodeKind::Type(decl) = &mut self.ast.node_mut(id).kind {
            decl.type_params = type_params;
            decl.superclass = superclass;
            decl.interfaces = interfaces;
            decl.members = members;
        }
        Ok(id)
    }

    fn members(&mut self, body: RawNodeId) -> Result<Vec<NodeId>, ConvertError> {
        let children = self.children(body);
        let mut members = Vec::with_capacity(children.len());
        for (i, &member) in children.iter().enumerate() {
            let id = match self.kind(member) {
                RawKind::VariableDef => self.field_def(member, children.get(i + 1).copied())?,
                RawKind::MethodDef => self.method_def(member)?,
                RawKind::CtorIdent => self.constructor_def(member)?,
                RawKind::StaticInit => self.initializer(member, true)?,
                RawKind::InstanceInit => self.initializer(member, false)?,
                RawKind::EnumConstantDef => self.enum_constant(member)?,
                kind if kind.is_type_definition() => self.type_def(member)?,
                _ => return Err(self.unexpected(member, RawKind::VariableDef)),
            };
            members.push(id);
        }
        Ok(members)
    }

    fn current_type(&self) -> Option<&TypeFrame> {
        self.type_stack.last()
    }

    fn in_interface(&self) -> bool {
        self.current_type()
            .is_some_and(|frame| frame.kind.is_interface_like())
    }

    // --- modifiers and annotations -------------------------------------------

    pub(super) fn modifiers(&mut self, raw: RawNodeId) -> Result<Written, ConvertError> {
        self.assert_kind(raw, RawKind::Modifiers)?;
        let mut written = Written {
            modifiers: Modifiers::NONE,
            annotations: Vec::new(),
            access: false,
        };
        for &child in self.children(raw) {
            match self.kind(child) {
                RawKind::Annotation => {
                    let annotation = self.annotation(child)?;
                    written.annotations.push(annotation);
                }
                RawKind::Modifier => {
                    let keyword = self.text_of(child);
                    let Some(bit) = Modifiers::from_keyword(keyword) else {
                        // `def` has no bit.
                        continue;
                    };
                    if written.modifiers.contains(bit) {
                        return Err(
                            self.structural(child, format!("Cannot repeat modifier: {keyword}"))
                        );
                    }
                    if bit.is_access() {
                        if written.access {
                            return Err(self.structural(
                                child,
                                format!("Cannot specify modifier: {keyword} when access scope has already been defined"),
                            ));
                        }
                        written.access = true;
                    }
                    written.modifiers.insert(bit);
                }
                _ => self.assert_kind(child, RawKind::Modifier)?,
            }
        }
        Ok(written)
    }

    fn annotation(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let name_raw = self
            .child(raw, 0)
            .ok_or_else(|| self.missing_child(raw, RawKind::Ident))?;
        let mut members: Vec<(SmolStr, NodeId)> = Vec::new();
        for &pair in &self.children(raw)[1..] {
            self.assert_kind(pair, RawKind::AnnotationMemberValuePair)?;
            let key_raw = self.expect_child(pair, 0, RawKind::Ident)?;
            let key = SmolStr::new(self.text_of(key_raw));
            let value_raw = self
                .child(pair, 1)
                .ok_or_else(|| self.missing_child(pair, RawKind::Expr))?;
            let value = self.expr(value_raw)?;
            if members.iter().any(|(existing, _)| *existing == key) {
                return Err(self.structural(
                    key_raw,
                    format!("Annotation member '{key}' has already been associated with a value"),
                ));
            }
            members.push((key, value));
        }
        let id = self.alloc_at(
            NodeKind::Annotation {
                name: SmolStr::new(self.text_of(raw)),
                members,
            },
            raw,
        );
        let name_range = self.pos(name_raw).range;
        self.set_name_range(id, name_range);
        positions::chomp(&mut self.ast, id, self.text, &self.index)?;
        Ok(id)
    }

    // --- members ------------------------------------------------------------

    /// `METHOD_DEF(TYPE_PARAMETERS?, MODIFIERS, TYPE?, IDENT, PARAMETERS,
    /// LITERAL_throws?, SLIST | default value?)`
    pub(super) fn method_def(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let children = self.children(raw);
        let mut i = 0;
        let type_params = match children.first() {
            Some(&tp) if self.kind(tp) == RawKind::TypeParameters => {
                i += 1;
                self.type_parameters(tp)?
            }
            _ => Vec::new(),
        };
        let mods_raw = self.expect_child(raw, i, RawKind::Modifiers)?;
        i += 1;
        let written = self.modifiers(mods_raw)?;
        if written.modifiers.contains(Modifiers::VOLATILE) {
            return Err(self.structural(raw, "Method has an incorrect modifier 'volatile'."));
        }
        let mut modifiers = written.modifiers;
        if !written.access {
            modifiers.insert(Modifiers::PUBLIC);
        }
        if self.in_interface() && !modifiers.intersects(Modifiers::DEFAULT | Modifiers::STATIC) {
            modifiers.insert(Modifiers::ABSTRACT);
        }

        let return_type = match children.get(i) {
            Some(&ty) if self.kind(ty) == RawKind::Type => {
                i += 1;
                Some(ty)
            }
            _ => None,
        };
        let name_raw = self.expect_child(raw, i, RawKind::Ident)?;
        i += 1;
        let name = SmolStr::new(self.text_of(name_raw));

        if let Some(frame) = self.current_type() {
            if frame.kind != TypeKind::Annotation && frame.name == name {
                if frame.kind.is_interface_like() {
                    return Err(self.structural(raw, "Constructor not permitted within an interface."));
                }
                let written_type = return_type.map(|ty| self.text_of(ty)).unwrap_or("def");
                return Err(self.structural(
                    raw,
                    format!("Invalid constructor format. Remove '{written_type}' as the return type if you want a constructor, or use a different name if you want a method."),
                ));
            }
        }
        let return_type = match return_type {
            Some(ty) => Some(self.type_ref(ty)?),
            None => None,
        };

        let params_raw = self.expect_child(raw, i, RawKind::Parameters)?;
        i += 1;
        let params = self.parameters(params_raw)?;
        let throws = match children.get(i) {
            Some(&clause) if self.kind(clause) == RawKind::ThrowsClause => {
                i += 1;
                self.type_list(clause)?
            }
            _ => Vec::new(),
        };

        let body_raw = children.get(i).copied();
        let mut body = None;
        let mut annotation_default = None;
        if !modifiers.contains(Modifiers::ABSTRACT) {
            match body_raw {
                Some(block) => {
                    self.assert_kind(block, RawKind::Slist)?;
                    body = Some(self.block(block)?);
                }
                None => {
                    let pos = self.pos(raw);
                    self.error_diagnostic(
                        codes::MISSING_METHOD_BODY,
                        "You defined a method without a body. Try adding a body, or declare it abstract.",
                        pos.range,
                    );
                    body = Some(self.alloc_pos(NodeKind::Block { statements: Vec::new() }, pos));
                }
            }
        } else if let Some(value) = body_raw {
            if self.current_type().map(|frame| frame.kind) == Some(TypeKind::Annotation) {
                annotation_default = Some(self.expr(value)?);
            } else {
                return Err(self.structural(raw, "Abstract methods do not define a body."));
            }
        }

        let declaring_type = self.current_type().map(|frame| frame.id);
        let id = self.alloc_at(
            NodeKind::Method(MethodDecl {
                name,
                modifiers,
                synthetic_public: !written.access,
                annotations: written.annotations,
                type_params,
                return_type,
                params,
                throws,
                body,
                annotation_default,
                declaring_type,
            }),
            raw,
        );
        let name_range = self.pos(name_raw).range;
        self.set_name_range(id, name_range);
        let rparen = self.pos(params_raw).range.end;
        self.ast
            .node_mut(id)
            .meta
            .insert(keys::RPAREN_OFFSET, MetaValue::Offset(rparen));
        Ok(id)
    }

    /// `CTOR_IDENT(MODIFIERS, PARAMETERS, LITERAL_throws?, SLIST)`
    fn constructor_def(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        if self.in_interface() {
            return Err(self.structural(raw, "Constructor not permitted within an interface."));
        }
        let mods_raw = self.expect_child(raw, 0, RawKind::Modifiers)?;
        let written = self.modifiers(mods_raw)?;
        for (bit, keyword) in [
            (Modifiers::STATIC, "static"),
            (Modifiers::FINAL, "final"),
            (Modifiers::ABSTRACT, "abstract"),
            (Modifiers::NATIVE, "native"),
        ] {
            if written.modifiers.contains(bit) {
                return Err(self.structural(
                    raw,
                    format!("Constructor has an incorrect modifier '{keyword}'."),
                ));
            }
        }
        let mut modifiers = written.modifiers;
        if !written.access {
            modifiers.insert(Modifiers::PUBLIC);
        }

        let params_raw = self.expect_child(raw, 1, RawKind::Parameters)?;
        let params = self.parameters(params_raw)?;
        let mut i = 2;
        let throws = match self.child(raw, i) {
            Some(clause) if self.kind(clause) == RawKind::ThrowsClause => {
                i += 1;
                self.type_list(clause)?
            }
            _ => Vec::new(),
        };
        let body_raw = self.expect_child(raw, i, RawKind::Slist)?;

        let first = self.child(body_raw, 0);
        let saved = std::mem::replace(&mut self.ctor_call_slot, first);
        let body = self.block(body_raw);
        self.ctor_call_slot = saved;
        let body = body?;

        let declaring_type = self.current_type().map(|frame| frame.id);
        let id = self.alloc_at(
            NodeKind::Constructor(MethodDecl {
                name: SmolStr::new_inline("<init>"),
                modifiers,
                synthetic_public: !written.access,
                annotations: written.annotations,
                type_params: Vec::new(),
                return_type: None,
                params,
                throws,
                body: Some(body),
                annotation_default: None,
                declaring_type,
            }),
            raw,
        );
        let params_pos = self.pos(params_raw);
        if let Some(name_range) = self.constructor_name_range(raw, params_pos.range.start) {
            self.set_name_range(id, name_range);
        }
        self.ast
            .node_mut(id)
            .meta
            .insert(keys::RPAREN_OFFSET, MetaValue::Offset(params_pos.range.end));
        Ok(id)
    }

    /// The constructor name is not a node of its own: it is the owner's name
    /// written just before the parameter list.
    fn constructor_name_range(&self, raw: RawNodeId, params_start: usize) -> Option<Span> {
        let owner = self.text_of(raw);
        let before = self.text.get(..params_start)?.trim_end();
        before
            .ends_with(owner)
            .then(|| Span::new(before.len() - owner.len(), before.len()))
    }

    /// `VARIABLE_DEF(MODIFIERS, TYPE?, IDENT, ASSIGN?)` inside a type body.
    fn field_def(
        &mut self,
        raw: RawNodeId,
        next: Option<RawNodeId>,
    ) -> Result<NodeId, ConvertError> {
        let mods_raw = self.expect_child(raw, 0, RawKind::Modifiers)?;
        let written = self.modifiers(mods_raw)?;
        let mut modifiers = written.modifiers;
        let mut access = written.access;
        if self.in_interface() {
            modifiers.insert(Modifiers::STATIC | Modifiers::FINAL);
            if !modifiers.intersects(Modifiers::PRIVATE | Modifiers::PROTECTED) {
                modifiers.insert(Modifiers::PUBLIC);
                access = true;
            }
        }

        let mut i = 1;
        let ty = match self.child(raw, i) {
            Some(ty) if self.kind(ty) == RawKind::Type => {
                i += 1;
                Some(self.type_ref(ty)?)
            }
            _ => None,
        };
        let name_raw = self.expect_child(raw, i, RawKind::Ident)?;
        let initializer = match self.child(raw, i + 1) {
            Some(assign) => {
                self.assert_kind(assign, RawKind::Assign)?;
                let value = self
                    .child(assign, 0)
                    .ok_or_else(|| self.missing_child(assign, RawKind::Expr))?;
                Some(self.expr(value)?)
            }
            None => None,
        };

        // Without an access modifier the field backs a property.
        let (field_modifiers, property) = if access {
            (modifiers, None)
        } else {
            let carried = Modifiers::STATIC | Modifiers::TRANSIENT | Modifiers::VOLATILE | Modifiers::FINAL;
            let field = Modifiers::from_bits(
                Modifiers::PRIVATE.bits() | (modifiers.bits() & carried.bits()),
            );
            (field, Some(modifiers | Modifiers::PUBLIC))
        };

        let declaring_type = self.current_type().map(|frame| frame.id);
        let id = self.alloc_at(
            NodeKind::Field(FieldDecl {
                name: SmolStr::new(self.text_of(name_raw)),
                modifiers: field_modifiers,
                annotations: written.annotations,
                ty,
                initializer,
                property,
                declaring_type,
            }),
            raw,
        );
        let name_range = self.pos(name_raw).range;
        self.set_name_range(id, name_range);

        if let Some(next) = next.filter(|next| self.same_declaration(raw, *next)) {
            let next_start = self.pos(next).range.start;
            self.ast.node_mut(id).meta.insert(
                keys::END2POS,
                MetaValue::Offset(next_start.saturating_sub(1)),
            );
        }
        Ok(id)
    }

    /// Declarators of one declaration share (copies of) the same modifiers.
    fn same_declaration(&self, raw: RawNodeId, next: RawNodeId) -> bool {
        if self.kind(next) != RawKind::VariableDef {
            return false;
        }
        match (self.child(raw, 0), self.child(next, 0)) {
            (Some(a), Some(b)) => {
                let (a, b) = (self.node(a), self.node(b));
                a.start == b.start && a.end == b.end
            }
            _ => false,
        }
    }

    fn initializer(&mut self, raw: RawNodeId, is_static: bool) -> Result<NodeId, ConvertError> {
        let block_raw = self.expect_child(raw, 0, RawKind::Slist)?;
        let body = self.block(block_raw)?;
        let id = self.alloc_at(NodeKind::Initializer { is_static, body }, raw);
        if is_static {
            let block_start = self.ast.node(body).start();
            self.ast
                .node_mut(id)
                .meta
                .insert(keys::STATIC_OFFSET, MetaValue::Offset(block_start));
        }
        Ok(id)
    }

    /// `ENUM_CONSTANT_DEF(MODIFIERS, IDENT, ELIST?)`
    fn enum_constant(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let mods_raw = self.expect_child(raw, 0, RawKind::Modifiers)?;
        let written = self.modifiers(mods_raw)?;
        let name_raw = self.expect_child(raw, 1, RawKind::Ident)?;
        let args = match self.child(raw, 2) {
            Some(elist) => {
                self.assert_kind(elist, RawKind::Elist)?;
                let mut args = Vec::new();
                for &arg in self.children(elist) {
                    args.push(self.expr(arg)?);
                }
                args
            }
            None => Vec::new(),
        };
        let declaring_type = self.current_type().map(|frame| frame.id);
        let id = self.alloc_at(
            NodeKind::EnumConstant {
                name: SmolStr::new(self.text_of(name_raw)),
                annotations: written.annotations,
                args,
                declaring_type,
            },
            raw,
        );
        let name_range = self.pos(name_raw).range;
        self.set_name_range(id, name_range);
        Ok(id)
    }

    // --- parameters -----------------------------------------------------------

    pub(super) fn parameters(&mut self, raw: RawNodeId) -> Result<Vec<NodeId>, ConvertError> {
        self.assert_kind(raw, RawKind::Parameters)?;
        let params = self.children(raw);
        let mut out = Vec::with_capacity(params.len());
        for (i, &param) in params.iter().enumerate() {
            let id = self.parameter(param)?;
            if let NodeKind::Parameter(decl) = self.ast.kind(id) {
                if decl.var_arg && i + 1 != params.len() {
                    let message = format!(
                        "The var-arg parameter {} must be the last parameter.",
                        decl.name
                    );
                    return Err(self.structural(param, message));
                }
            }
            out.push(id);
        }
        Ok(out)
    }

    /// `PARAMETER_DEF(MODIFIERS, TYPE?, IDENT, ASSIGN?)`
    pub(super) fn parameter(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let var_arg = match self.kind(raw) {
            RawKind::ParameterDef => false,
            RawKind::VariableParameterDef => true,
            _ => {
                self.assert_kind(raw, RawKind::ParameterDef)?;
                false
            }
        };
        let mods_raw = self.expect_child(raw, 0, RawKind::Modifiers)?;
        let written = self.modifiers(mods_raw)?;
        let mut i = 1;
        let ty = match self.child(raw, i) {
            Some(ty) if self.kind(ty) == RawKind::Type => {
                i += 1;
                Some(self.type_ref(ty)?)
            }
            _ => None,
        };
        let name_raw = self.expect_child(raw, i, RawKind::Ident)?;
        let name = SmolStr::new(self.text_of(name_raw));
        let default_value = match self.child(raw, i + 1) {
            Some(assign) => {
                self.assert_kind(assign, RawKind::Assign)?;
                let value_raw = self
                    .child(assign, 0)
                    .ok_or_else(|| self.missing_child(assign, RawKind::Expr))?;
                let value = self.expr(value_raw)?;
                if self.in_interface() {
                    let value_text = self.source(self.ast.node(value).range()).to_string();
                    return Err(self.structural(
                        assign,
                        format!("Cannot specify default value for method parameter '{name} = {value_text}' inside an interface"),
                    ));
                }
                Some(value)
            }
            None => None,
        };

        let id = self.alloc_at(
            NodeKind::Parameter(ParamDecl {
                name,
                modifiers: written.modifiers,
                annotations: written.annotations,
                ty,
                default_value,
                var_arg,
            }),
            raw,
        );
        let name_pos = self.pos(name_raw);
        self.set_name_range(id, name_pos.range);
        // The raw range runs up to the next token; stop at the name or the
        // default value instead.
        match default_value {
            Some(value) => positions::set_end_from(&mut self.ast, id, value),
            None => {
                let node = self.ast.node_mut(id);
                if node.pos.range.end > name_pos.range.end {
                    node.pos.range.end = name_pos.range.end;
                    node.pos.end = name_pos.end;
                }
            }
        }
        Ok(id)
    }
}
