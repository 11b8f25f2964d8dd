use grove_core::SmolStr;
use grove_syntax::{RawKind, RawNodeId};

use crate::ast::{LocalDecl, NodeId, NodeKind, ParamDecl};
use crate::error::ConvertError;

use super::Converter;

impl Converter<'_> {
    pub(super) fn statement(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        if let Some(pos) = self.descend(raw) {
            let expr = self.placeholder(pos);
            return Ok(self.alloc_pos(NodeKind::ExprStmt { expr }, pos));
        }
        let result = self.statement_inner(raw);
        self.ascend();
        result
    }

    /// Child `n` of `raw` as a statement; a missing child becomes an empty
    /// statement.
    fn statement_child(&mut self, raw: RawNodeId, n: usize) -> Result<NodeId, ConvertError> {
        match self.child(raw, n) {
            Some(child) => self.statement(child),
            None => {
                let pos = self.pos(raw);
                Ok(self.alloc_pos(NodeKind::Empty, pos))
            }
        }
    }

    fn statement_inner(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        match self.kind(raw) {
            kind if kind.is_sentinel() => Ok(self.alloc_at(NodeKind::Empty, raw)),
            RawKind::Slist => self.block(raw),
            RawKind::Expr => {
                let expr = self.expr(raw)?;
                Ok(self.alloc_at(NodeKind::ExprStmt { expr }, raw))
            }
            RawKind::VariableDef => {
                let expr = self.declaration(raw)?;
                Ok(self.alloc_at(NodeKind::ExprStmt { expr }, raw))
            }
            RawKind::CtorCall | RawKind::SuperCtorCall => {
                let expr = self.special_ctor_call(raw)?;
                Ok(self.alloc_at(NodeKind::ExprStmt { expr }, raw))
            }
            RawKind::If => {
                let cond = self.expr_child(raw, 0)?;
                let then = self.statement_child(raw, 1)?;
                let otherwise = match self.child(raw, 2) {
                    Some(otherwise) => Some(self.statement(otherwise)?),
                    None => None,
                };
                Ok(self.alloc_at(
                    NodeKind::If {
                        cond,
                        then,
                        otherwise,
                    },
                    raw,
                ))
            }
            RawKind::While => {
                let cond = self.expr_child(raw, 0)?;
                let body = self.statement_child(raw, 1)?;
                Ok(self.alloc_at(NodeKind::While { cond, body }, raw))
            }
            RawKind::For => self.for_statement(raw),
            RawKind::Switch => self.switch(raw),
            RawKind::Try => self.try_statement(raw),
            RawKind::Throw => {
                let expr = self.expr_child(raw, 0)?;
                Ok(self.alloc_at(NodeKind::Throw { expr }, raw))
            }
            RawKind::Synchronized => {
                let lock = self.expr_child(raw, 0)?;
                let body_raw = self.expect_child(raw, 1, RawKind::Slist)?;
                let body = self.block(body_raw)?;
                Ok(self.alloc_at(NodeKind::Synchronized { lock, body }, raw))
            }
            RawKind::Assert => {
                let cond = self.expr_child(raw, 0)?;
                let message = match self.child(raw, 1) {
                    Some(message) => Some(self.expr(message)?),
                    None => None,
                };
                Ok(self.alloc_at(NodeKind::Assert { cond, message }, raw))
            }
            RawKind::LabeledStat => {
                let label = SmolStr::new(self.text_of(raw));
                let label_raw = self.expect_child(raw, 0, RawKind::Ident)?;
                let body = self.statement_child(raw, 1)?;
                let id = self.alloc_at(NodeKind::Labeled { label, body }, raw);
                let label_range = self.pos(label_raw).range;
                self.set_name_range(id, label_range);
                Ok(id)
            }
            RawKind::Return => {
                let expr = match self.child(raw, 0) {
                    Some(value) => Some(self.expr(value)?),
                    None => None,
                };
                Ok(self.alloc_at(NodeKind::Return { expr }, raw))
            }
            RawKind::Break | RawKind::Continue => {
                let label = match self.child(raw, 0) {
                    Some(label) => {
                        self.assert_kind(label, RawKind::Ident)?;
                        Some(SmolStr::new(self.text_of(label)))
                    }
                    None => None,
                };
                let kind = if self.kind(raw) == RawKind::Break {
                    NodeKind::Break { label }
                } else {
                    NodeKind::Continue { label }
                };
                Ok(self.alloc_at(kind, raw))
            }
            _ => Err(self.unknown(raw)),
        }
    }

    pub(super) fn block(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        self.assert_kind(raw, RawKind::Slist)?;
        let children = self.children(raw);
        let mut statements = Vec::with_capacity(children.len());
        for &child in children {
            statements.push(self.statement(child)?);
        }
        Ok(self.alloc_at(NodeKind::Block { statements }, raw))
    }

    /// A local `VARIABLE_DEF` as a declaration expression.
    fn declaration(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
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
        let target = self.variable(name_raw);
        let value = match self.child(raw, i + 1) {
            Some(assign) => {
                self.assert_kind(assign, RawKind::Assign)?;
                Some(self.expr_child(assign, 0)?)
            }
            None => None,
        };
        let id = self.alloc_at(
            NodeKind::Declaration(LocalDecl {
                modifiers: written.modifiers,
                annotations: written.annotations,
                ty,
                target,
                value,
            }),
            raw,
        );
        let name_range = self.ast.node(target).range();
        self.set_name_range(id, name_range);
        Ok(id)
    }

    /// `for (x in xs)` or `for (init; cond; update)`.
    fn for_statement(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let head = self
            .child(raw, 0)
            .ok_or_else(|| self.missing_child(raw, RawKind::ForInit))?;

        if self.kind(head) == RawKind::ForInIterable {
            let param_raw = self
                .child(head, 0)
                .ok_or_else(|| self.missing_child(head, RawKind::ParameterDef))?;
            let variable = self.parameter(param_raw)?;
            let iterable = self.expr_child(head, 1)?;
            let body = self.statement_child(raw, 1)?;
            return Ok(self.alloc_at(
                NodeKind::ForIn {
                    variable,
                    iterable,
                    body,
                },
                raw,
            ));
        }

        self.assert_kind(head, RawKind::ForInit)?;
        let mut init = Vec::new();
        for &child in self.children(head) {
            let id = match self.kind(child) {
                RawKind::VariableDef => self.declaration(child)?,
                _ => self.expr(child)?,
            };
            init.push(id);
        }
        let cond_raw = self.expect_child(raw, 1, RawKind::ForCondition)?;
        let cond = match self.child(cond_raw, 0) {
            Some(cond) => Some(self.expr(cond)?),
            None => None,
        };
        let iter_raw = self.expect_child(raw, 2, RawKind::ForIterator)?;
        let elist = self.expect_child(iter_raw, 0, RawKind::Elist)?;
        let mut update = Vec::new();
        for &child in self.children(elist) {
            update.push(self.expr(child)?);
        }
        let body = self.statement_child(raw, 3)?;
        Ok(self.alloc_at(
            NodeKind::ClassicFor {
                init,
                cond,
                update,
                body,
            },
            raw,
        ))
    }

    /// Each `CASE_GROUP` holds its labels followed by one statement list.
    /// The list belongs to the group's last `case`, or to `default` when the
    /// group has one; the other labels fall through with an empty body.
    fn switch(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let subject = self.expr_child(raw, 0)?;
        let mut cases = Vec::new();
        let mut default = None;
        for &group in self.children(raw).iter().skip(1) {
            self.assert_kind(group, RawKind::CaseGroup)?;
            let Some((&body_raw, labels)) = self.children(group).split_last() else {
                return Err(self.missing_child(group, RawKind::Slist));
            };
            let body = self.block(body_raw)?;
            let has_default = labels
                .iter()
                .any(|label| self.kind(*label) == RawKind::Default);
            let last_case = labels
                .iter()
                .rposition(|label| self.kind(*label) == RawKind::Case);

            for (i, &label) in labels.iter().enumerate() {
                match self.kind(label) {
                    RawKind::Case => {
                        let value = self.expr_child(label, 0)?;
                        let case_body = if !has_default && last_case == Some(i) {
                            body
                        } else {
                            self.alloc_at(NodeKind::Empty, label)
                        };
                        cases.push(self.alloc_at(
                            NodeKind::Case {
                                value,
                                body: case_body,
                            },
                            label,
                        ));
                    }
                    RawKind::Default => {
                        if default.is_some() {
                            return Err(self.structural(raw, "The default case is already defined."));
                        }
                        default = Some(body);
                    }
                    _ => return Err(self.unexpected(label, RawKind::Case)),
                }
            }
        }
        Ok(self.alloc_at(
            NodeKind::Switch {
                subject,
                cases,
                default,
            },
            raw,
        ))
    }

    fn try_statement(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let body_raw = self.expect_child(raw, 0, RawKind::Slist)?;
        let body = self.block(body_raw)?;
        let mut catches = Vec::new();
        let mut finally = None;
        for &clause in self.children(raw).iter().skip(1) {
            match self.kind(clause) {
                RawKind::Catch => catches.push(self.catch_clause(clause)?),
                RawKind::Finally => {
                    let block = self.expect_child(clause, 0, RawKind::Slist)?;
                    finally = Some(self.block(block)?);
                }
                _ => return Err(self.unexpected(clause, RawKind::Catch)),
            }
        }
        if catches.is_empty() && finally.is_none() {
            return Err(self.structural(
                raw,
                "A try statement must have at least one catch or finally block.",
            ));
        }
        Ok(self.alloc_at(
            NodeKind::Try {
                body,
                catches,
                finally,
            },
            raw,
        ))
    }

    /// `catch (A | B e) { .. }`. A single caught type is the parameter's
    /// type; alternatives stay on the catch node.
    fn catch_clause(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let param_raw = self.expect_child(raw, 0, RawKind::ParameterDef)?;
        let mods_raw = self.expect_child(param_raw, 0, RawKind::Modifiers)?;
        let written = self.modifiers(mods_raw)?;

        let parts = self.children(param_raw);
        let Some((&name_raw, type_raws)) = parts[1..].split_last() else {
            return Err(self.missing_child(param_raw, RawKind::Ident));
        };
        self.assert_kind(name_raw, RawKind::Ident)?;
        let mut types = Vec::with_capacity(type_raws.len());
        for &ty in type_raws {
            types.push(self.type_ref(ty)?);
        }
        let ty = if types.len() == 1 { types.pop() } else { None };

        let param = self.alloc_at(
            NodeKind::Parameter(ParamDecl {
                name: SmolStr::new(self.text_of(name_raw)),
                modifiers: written.modifiers,
                annotations: written.annotations,
                ty,
                default_value: None,
                var_arg: false,
            }),
            param_raw,
        );
        let name_range = self.pos(name_raw).range;
        self.set_name_range(param, name_range);

        let body_raw = self.expect_child(raw, 1, RawKind::Slist)?;
        let body = self.block(body_raw)?;
        Ok(self.alloc_at(NodeKind::Catch { param, types, body }, raw))
    }
}
