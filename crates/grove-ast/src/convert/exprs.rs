use grove_core::SmolStr;
use grove_syntax::{parse_number, LiteralValue, RawKind, RawNodeId};

use crate::ast::{
    BinaryOp, ConstValue, CtorKind, NodeId, NodeKind, Position, PropertyAccess, TypeRef, UnaryOp,
};
use crate::error::ConvertError;
use crate::positions;

use super::types::is_primitive;
use super::{codes, Converter};

fn binary_op(kind: RawKind) -> Option<BinaryOp> {
    let op = match kind {
        RawKind::Assign => BinaryOp::Assign,
        RawKind::PlusAssign => BinaryOp::PlusAssign,
        RawKind::MinusAssign => BinaryOp::MinusAssign,
        RawKind::StarAssign => BinaryOp::MultiplyAssign,
        RawKind::DivAssign => BinaryOp::DivideAssign,
        RawKind::ModAssign => BinaryOp::ModAssign,
        RawKind::Plus => BinaryOp::Plus,
        RawKind::Minus => BinaryOp::Minus,
        RawKind::Star => BinaryOp::Multiply,
        RawKind::Div => BinaryOp::Divide,
        RawKind::Mod => BinaryOp::Mod,
        RawKind::StarStar => BinaryOp::Power,
        RawKind::Equal => BinaryOp::Equal,
        RawKind::NotEqual => BinaryOp::NotEqual,
        RawKind::CompareTo => BinaryOp::CompareTo,
        RawKind::Lt => BinaryOp::Less,
        RawKind::Le => BinaryOp::LessEqual,
        RawKind::Gt => BinaryOp::Greater,
        RawKind::Ge => BinaryOp::GreaterEqual,
        RawKind::LogicalAnd => BinaryOp::LogicalAnd,
        RawKind::LogicalOr => BinaryOp::LogicalOr,
        RawKind::BitAnd => BinaryOp::BitAnd,
        RawKind::BitOr => BinaryOp::BitOr,
        RawKind::BitXor => BinaryOp::BitXor,
        RawKind::ShiftLeft => BinaryOp::ShiftLeft,
        RawKind::ShiftRight => BinaryOp::ShiftRight,
        RawKind::RegexFind => BinaryOp::RegexFind,
        RawKind::RegexMatch => BinaryOp::RegexMatch,
        RawKind::In => BinaryOp::In,
        _ => return None,
    };
    Some(op)
}

fn unary_op(kind: RawKind) -> Option<UnaryOp> {
    let op = match kind {
        RawKind::LogicalNot => UnaryOp::Not,
        RawKind::BitNot => UnaryOp::BitNot,
        RawKind::UnaryMinus => UnaryOp::Minus,
        RawKind::UnaryPlus => UnaryOp::Plus,
        RawKind::Inc => UnaryOp::PreIncrement,
        RawKind::Dec => UnaryOp::PreDecrement,
        RawKind::PostInc => UnaryOp::PostIncrement,
        RawKind::PostDec => UnaryOp::PostDecrement,
        _ => return None,
    };
    Some(op)
}

fn is_number(kind: RawKind) -> bool {
    matches!(
        kind,
        RawKind::NumInt
            | RawKind::NumLong
            | RawKind::NumBigInt
            | RawKind::NumFloat
            | RawKind::NumDouble
            | RawKind::NumBigDecimal
    )
}

fn negate(value: LiteralValue) -> LiteralValue {
    match value {
        LiteralValue::Int(v) => LiteralValue::Int(v.wrapping_neg()),
        LiteralValue::Long(v) => LiteralValue::Long(v.wrapping_neg()),
        LiteralValue::BigInteger { radix, digits } => LiteralValue::BigInteger {
            radix,
            digits: SmolStr::new(format!("-{digits}")),
        },
        LiteralValue::Float(v) => LiteralValue::Float(-v),
        LiteralValue::Double(v) => LiteralValue::Double(-v),
        LiteralValue::BigDecimal(v) => LiteralValue::BigDecimal(SmolStr::new(format!("-{v}"))),
    }
}

impl Converter<'_> {
    pub(super) fn expr(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        if let Some(pos) = self.descend(raw) {
            return Ok(self.placeholder(pos));
        }
        let result = self.expr_inner(raw);
        self.ascend();
        result
    }

    /// Child `n` of `raw` as an expression; a missing child becomes a
    /// placeholder at the parent's position.
    pub(super) fn expr_child(&mut self, raw: RawNodeId, n: usize) -> Result<NodeId, ConvertError> {
        match self.child(raw, n) {
            Some(child) => self.expr(child),
            None => {
                let pos = self.pos(raw);
                Ok(self.placeholder(pos))
            }
        }
    }

    fn expr_inner(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let kind = self.kind(raw);
        if let Some(op) = binary_op(kind) {
            return self.binary(raw, op);
        }
        if let Some(op) = unary_op(kind) {
            return self.unary(raw, op);
        }
        match kind {
            kind if kind.is_sentinel() => {
                let pos = self.pos(raw);
                Ok(self.placeholder(pos))
            }
            RawKind::Expr => {
                let id = self.expr_child(raw, 0)?;
                let pos = self.pos(raw);
                positions::widen(&mut self.ast, id, pos);
                Ok(id)
            }
            RawKind::Ident => Ok(self.variable(raw)),
            RawKind::This | RawKind::Super => Ok(self.variable(raw)),
            kind if is_number(kind) => {
                let text = self.text_of(raw);
                let value = parse_number(kind, text)
                    .map_err(|err| self.structural(raw, err.message))?;
                Ok(self.alloc_at(NodeKind::Constant(ConstValue::Number(value)), raw))
            }
            RawKind::StringLiteral => Ok(self.string_constant(raw)),
            RawKind::True => Ok(self.alloc_at(NodeKind::Constant(ConstValue::Bool(true)), raw)),
            RawKind::False => Ok(self.alloc_at(NodeKind::Constant(ConstValue::Bool(false)), raw)),
            RawKind::Null => Ok(self.alloc_at(NodeKind::Constant(ConstValue::Null), raw)),
            RawKind::StringConstructor => self.gstring(raw),
            RawKind::MethodCall => self.method_call(raw),
            RawKind::New => self.new_expr(raw),
            RawKind::ClosableBlock => self.closure(raw),
            RawKind::ListConstructor => self.list(raw),
            RawKind::MapConstructor => self.map(raw),
            RawKind::LabeledArg => self.map_entry(raw),
            RawKind::SpreadArg => {
                let expr = self.expr_child(raw, 0)?;
                Ok(self.alloc_at(NodeKind::Spread { expr }, raw))
            }
            RawKind::SpreadMapArg => {
                let expr = self.expr_child(raw, 0)?;
                Ok(self.alloc_at(NodeKind::SpreadMap { expr }, raw))
            }
            RawKind::Dot | RawKind::OptionalDot | RawKind::SpreadDot => self.property(raw),
            RawKind::MemberPointer => self.method_pointer(raw),
            RawKind::IndexOp => self.index(raw),
            RawKind::Typecast => self.cast(raw),
            RawKind::As => self.coerce(raw),
            RawKind::InstanceOf => self.instance_of(raw),
            RawKind::Question => {
                let cond = self.expr_child(raw, 0)?;
                let then = self.expr_child(raw, 1)?;
                let otherwise = self.expr_child(raw, 2)?;
                let id = self.alloc_at(NodeKind::Ternary { cond, then, otherwise }, raw);
                positions::merge(&mut self.ast, id, cond, otherwise);
                Ok(id)
            }
            RawKind::Elvis => {
                let cond = self.expr_child(raw, 0)?;
                let otherwise = self.expr_child(raw, 1)?;
                let id = self.alloc_at(NodeKind::Elvis { cond, otherwise }, raw);
                positions::merge(&mut self.ast, id, cond, otherwise);
                Ok(id)
            }
            RawKind::RangeInclusive | RawKind::RangeExclusive => {
                let from = self.expr_child(raw, 0)?;
                let to = self.expr_child(raw, 1)?;
                let inclusive = kind == RawKind::RangeInclusive;
                let id = self.alloc_at(NodeKind::Range { from, to, inclusive }, raw);
                positions::merge(&mut self.ast, id, from, to);
                Ok(id)
            }
            _ => Err(self.unknown(raw)),
        }
    }

    /// Structural error for a raw kind that has no place here.
    pub(super) fn unknown(&self, raw: RawNodeId) -> ConvertError {
        match self.kind(raw) {
            kind if kind.is_type_definition() => self.structural(
                raw,
                "Class definition not expected here. Please define the class at an appropriate place or perhaps try using a block/Closure instead.",
            ),
            RawKind::MethodDef => self.structural(
                raw,
                "Method definition not expected here. Please define the method at an appropriate place or perhaps try using a block/Closure instead.",
            ),
            kind => self.structural(raw, format!("Unknown type: {kind}")),
        }
    }

    pub(super) fn variable(&mut self, raw: RawNodeId) -> NodeId {
        let name = SmolStr::new(self.text_of(raw));
        let id = self.alloc_at(NodeKind::Variable { name }, raw);
        let range = self.ast.node(id).range();
        self.set_name_range(id, range);
        id
    }

    fn string_constant(&mut self, raw: RawNodeId) -> NodeId {
        let value = SmolStr::new(self.text_of(raw));
        self.alloc_at(NodeKind::Constant(ConstValue::String(value)), raw)
    }

    /// A property or method name: identifiers and string literals become
    /// string constants.
    fn name_constant(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        match self.kind(raw) {
            RawKind::Ident | RawKind::StringLiteral => Ok(self.string_constant(raw)),
            _ => self.expr(raw),
        }
    }

    fn gstring(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let mut strings = Vec::new();
        let mut values = Vec::new();
        for (i, &part) in self.children(raw).iter().enumerate() {
            if i % 2 == 0 {
                self.assert_kind(part, RawKind::StringLiteral)?;
                strings.push(self.string_constant(part));
            } else {
                values.push(self.expr(part)?);
            }
        }
        let pos = self.pos(raw);
        let text = SmolStr::new(self.source(pos.range));
        Ok(self.alloc_pos(
            NodeKind::GString {
                text,
                strings,
                values,
            },
            pos,
        ))
    }

    // --- operators ------------------------------------------------------------

    fn binary(&mut self, raw: RawNodeId, op: BinaryOp) -> Result<NodeId, ConvertError> {
        if op.is_assignment() {
            let lhs = self.expr_child(raw, 0)?;
            self.check_assignment_target(raw, lhs)?;
            let rhs = self.expr_child(raw, 1)?;
            return Ok(self.binary_node(raw, op, lhs, rhs));
        }

        // `a + b + c` leans left without any nesting in the source, so the
        // left spine is folded in a loop and does not count toward the depth.
        let mut spine = vec![(raw, op)];
        let mut innermost = raw;
        while let Some(left) = self.child(innermost, 0) {
            match binary_op(self.kind(left)) {
                Some(left_op) if !left_op.is_assignment() => {
                    spine.push((left, left_op));
                    innermost = left;
                }
                _ => break,
            }
        }
        let mut lhs = self.expr_child(innermost, 0)?;
        for &(node, op) in spine.iter().rev() {
            let rhs = self.expr_child(node, 1)?;
            lhs = self.binary_node(node, op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn binary_node(&mut self, raw: RawNodeId, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        let id = self.alloc_at(NodeKind::Binary { op, lhs, rhs }, raw);
        positions::merge(&mut self.ast, id, lhs, rhs);
        id
    }

    fn check_assignment_target(&self, raw: RawNodeId, lhs: NodeId) -> Result<(), ConvertError> {
        let node = self.ast.node(lhs);
        let text = self.source(node.range());
        let message = match &node.kind {
            NodeKind::Variable { .. }
            | NodeKind::Property { .. }
            | NodeKind::Declaration(_)
            | NodeKind::Constant(ConstValue::Error) => return Ok(()),
            NodeKind::Binary { op, .. } if op.is_assignment() || *op == BinaryOp::Index => {
                return Ok(())
            }
            // Damage from an earlier syntax error, already reported.
            _ if self.touched_by_recovery(lhs) => return Ok(()),
            NodeKind::Constant(value) => format!(
                "[{}] is a constant expression, but it should be a variable expression",
                value.text()
            ),
            NodeKind::Binary { .. } => {
                format!("{text} is a binary expression, but it should be a variable expression")
            }
            NodeKind::GString { .. } => {
                format!("\"{text}\" is a GString expression, but it should be a variable expression")
            }
            NodeKind::MethodCall { .. } => format!(
                "\"{text}\" is a method call expression, but it should be a variable expression"
            ),
            NodeKind::Map { .. } => {
                format!("'{text}' is a map expression, but it should be a variable expression")
            }
            kind => format!(
                "{}, with its value '{text}', is a bad expression as the left hand side of an assignment operator",
                kind.name()
            ),
        };
        Err(self.structural(raw, message))
    }

    fn unary(&mut self, raw: RawNodeId, op: UnaryOp) -> Result<NodeId, ConvertError> {
        let operand_raw = self.child(raw, 0);

        // `-1` is a negative literal, not a negation.
        if let (UnaryOp::Minus, Some(number)) = (op, operand_raw) {
            let kind = self.kind(number);
            if is_number(kind) {
                let value = parse_number(kind, self.text_of(number))
                    .map_err(|err| self.structural(number, err.message))?;
                let id = self.alloc_at(NodeKind::Constant(ConstValue::Number(negate(value))), raw);
                let number_pos = self.pos(number);
                let node = self.ast.node_mut(id);
                node.pos.range.end = number_pos.range.end;
                node.pos.end = number_pos.end;
                return Ok(id);
            }
        }

        let operand = self.expr_child(raw, 0)?;
        let id = self.alloc_at(NodeKind::Unary { op, operand }, raw);
        if op.is_postfix() {
            positions::set_start_from(&mut self.ast, id, operand);
        } else {
            positions::set_end_from(&mut self.ast, id, operand);
        }
        Ok(id)
    }

    /// `a[b]`; the raw node reports only the brackets.
    fn index(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let lhs = self.expr_child(raw, 0)?;
        let rhs = self.expr_child(raw, 1)?;
        let id = self.alloc_at(
            NodeKind::Binary {
                op: BinaryOp::Index,
                lhs,
                rhs,
            },
            raw,
        );
        positions::set_start_from(&mut self.ast, id, lhs);
        Ok(id)
    }

    fn cast(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let ty_raw = self.expect_child(raw, 0, RawKind::Type)?;
        let ty = self.type_ref(ty_raw)?;
        let expr = self.expr_child(raw, 1)?;
        self.check_super_cast(expr);
        let id = self.alloc_at(
            NodeKind::Cast {
                ty,
                expr,
                coerce: false,
            },
            raw,
        );
        positions::set_end_from(&mut self.ast, id, expr);
        let ty_range = self.ast.node(ty).range();
        self.set_name_range(id, ty_range);
        Ok(id)
    }

    /// `expr as Type`
    fn coerce(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let expr = self.expr_child(raw, 0)?;
        self.check_super_cast(expr);
        let ty = self.target_type(raw)?;
        let id = self.alloc_at(
            NodeKind::Cast {
                ty,
                expr,
                coerce: true,
            },
            raw,
        );
        positions::merge(&mut self.ast, id, expr, ty);
        let ty_range = self.ast.node(ty).range();
        self.set_name_range(id, ty_range);
        Ok(id)
    }

    fn instance_of(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let lhs = self.expr_child(raw, 0)?;
        let ty = self.target_type(raw)?;
        let ty_pos = self.ast.node(ty).pos;
        let rhs = self.alloc_pos(NodeKind::ClassExpr { ty }, ty_pos);
        let id = self.alloc_at(
            NodeKind::Binary {
                op: BinaryOp::InstanceOf,
                lhs,
                rhs,
            },
            raw,
        );
        positions::merge(&mut self.ast, id, lhs, rhs);
        Ok(id)
    }

    /// Right-hand side of `as` and `instanceof`. A missing type is recorded
    /// by the recognizer as the recovery identifier.
    fn target_type(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let ty_raw = self
            .child(raw, 1)
            .ok_or_else(|| self.missing_child(raw, RawKind::Type))?;
        match self.kind(ty_raw) {
            RawKind::Type => self.type_ref(ty_raw),
            RawKind::Ident => {
                let name = SmolStr::new(self.text_of(ty_raw));
                let id = self.alloc_at(
                    NodeKind::TypeRef(TypeRef {
                        primitive: false,
                        name,
                        type_args: Vec::new(),
                        dimensions: 0,
                    }),
                    ty_raw,
                );
                let range = self.ast.node(id).range();
                self.set_name_range(id, range);
                Ok(id)
            }
            _ => Err(self.unexpected(ty_raw, RawKind::Type)),
        }
    }

    fn check_super_cast(&mut self, expr: NodeId) {
        let node = self.ast.node(expr);
        if matches!(&node.kind, NodeKind::Variable { name } if name == "super") {
            let range = node.range();
            self.error_diagnostic(codes::SUPER_CAST, "Cannot cast or coerce `super`", range);
        }
    }

    // --- member access --------------------------------------------------------

    /// `obj.name`, `obj?.name`, `obj*.name` and the `.@` attribute forms.
    fn property(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let access = match self.kind(raw) {
            RawKind::OptionalDot => PropertyAccess::Safe,
            RawKind::SpreadDot => PropertyAccess::Spread,
            _ => PropertyAccess::Normal,
        };
        let object = self.expr_child(raw, 0)?;
        let name_raw = self
            .child(raw, 1)
            .ok_or_else(|| self.missing_child(raw, RawKind::Ident))?;
        let (property, attribute) = match self.kind(name_raw) {
            RawKind::SelectSlot => {
                let slot = self.expect_child(name_raw, 0, RawKind::Ident)?;
                (self.string_constant(slot), true)
            }
            _ => (self.name_constant(name_raw)?, false),
        };
        let id = self.alloc_at(
            NodeKind::Property {
                object,
                property,
                access,
                attribute,
            },
            raw,
        );
        let name_range = self.ast.node(property).range();
        self.set_name_range(id, name_range);
        positions::chomp(&mut self.ast, id, self.text, &self.index)?;
        Ok(id)
    }

    fn method_pointer(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let object = self.expr_child(raw, 0)?;
        let name_raw = self.expect_child(raw, 1, RawKind::Ident)?;
        let method = self.string_constant(name_raw);
        let id = self.alloc_at(NodeKind::MethodPointer { object, method }, raw);
        let name_range = self.ast.node(method).range();
        self.set_name_range(id, name_range);
        Ok(id)
    }

    // --- calls ----------------------------------------------------------------

    /// `METHOD_CALL(callee, ELIST, CLOSABLE_BLOCK*)`.
    ///
    /// Command calls (`println x`) report only their name token; their end
    /// is taken from the arguments.
    fn method_call(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let callee = self
            .child(raw, 0)
            .ok_or_else(|| self.missing_child(raw, RawKind::Ident))?;
        let elist = self.expect_child(raw, 1, RawKind::Elist)?;

        let mut flags = CallFlags::default();
        let (receiver, method) = match self.kind(callee) {
            RawKind::Dot | RawKind::OptionalDot | RawKind::SpreadDot => {
                let name_raw = self
                    .child(callee, 1)
                    .ok_or_else(|| self.missing_child(callee, RawKind::Ident))?;
                match self.kind(name_raw) {
                    RawKind::SelectSlot => {
                        // `obj.@field(..)` calls the attribute's value.
                        let property = self.property(callee)?;
                        let pos = self.ast.node(property).pos;
                        let method = self.alloc_pos(call_constant(), pos);
                        return self.finish_method_call(raw, elist, Some(property), method, flags);
                    }
                    RawKind::Ident if is_primitive(self.text_of(name_raw)) => {
                        return Err(self.primitive_method_name(name_raw));
                    }
                    _ => {}
                }
                flags.safe = self.kind(callee) == RawKind::OptionalDot;
                flags.spread = self.kind(callee) == RawKind::SpreadDot;
                let object = self.expr_child(callee, 0)?;
                let method = self.name_constant(name_raw)?;
                (Some(object), method)
            }
            RawKind::This | RawKind::Super => {
                return Err(self.structural(
                    elist,
                    "Constructor call must be the first statement in a constructor.",
                ));
            }
            RawKind::Ident if is_primitive(self.text_of(callee)) => {
                return Err(self.primitive_method_name(callee));
            }
            RawKind::Ident | RawKind::StringLiteral => {
                flags.implicit_this = true;
                (None, self.string_constant(callee))
            }
            _ => {
                let object = self.expr(callee)?;
                let pos = self.ast.node(object).pos;
                let method = self.alloc_pos(call_constant(), pos);
                (Some(object), method)
            }
        };
        self.finish_method_call(raw, elist, receiver, method, flags)
    }

    fn finish_method_call(
        &mut self,
        raw: RawNodeId,
        elist: RawNodeId,
        receiver: Option<NodeId>,
        method: NodeId,
        flags: CallFlags,
    ) -> Result<NodeId, ConvertError> {
        let closures = &self.children(raw)[2..];
        let args = self.arguments(elist, closures)?;
        let id = self.alloc_at(
            NodeKind::MethodCall {
                receiver,
                method,
                args,
                safe: flags.safe,
                spread: flags.spread,
                implicit_this: flags.implicit_this,
            },
            raw,
        );
        if self.text_of(raw) == "<command>" {
            positions::set_end_from(&mut self.ast, id, args);
        }
        if let Some(receiver) = receiver {
            if self.ast.node(receiver).start() < self.ast.node(id).start() {
                positions::set_start_from(&mut self.ast, id, receiver);
            }
        }
        let name_range = self.ast.node(method).range();
        self.set_name_range(id, name_range);
        Ok(id)
    }

    fn primitive_method_name(&self, raw: RawNodeId) -> ConvertError {
        self.structural(
            raw,
            format!(
                "Primitive type literal: {} cannot be used as a method name",
                self.text_of(raw)
            ),
        )
    }

    /// Call arguments. Named arguments are gathered into one map placed
    /// first; trailing closures come last.
    pub(super) fn arguments(
        &mut self,
        elist: RawNodeId,
        closures: &[RawNodeId],
    ) -> Result<NodeId, ConvertError> {
        self.assert_kind(elist, RawKind::Elist)?;
        let mut entries = Vec::new();
        let mut positional = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        for &arg in self.children(elist) {
            let id = self.expr(arg)?;
            match &self.ast.node(id).kind {
                NodeKind::MapEntry { key, .. } => {
                    if let NodeKind::Constant(value) = self.ast.kind(*key) {
                        let name = value.text();
                        if seen.contains(&name) {
                            return Err(self.structural(
                                elist,
                                format!("Duplicate named parameter '{name}' found."),
                            ));
                        }
                        seen.push(name);
                    }
                    entries.push(id);
                }
                NodeKind::SpreadMap { .. } => entries.push(id),
                _ => positional.push(id),
            }
        }
        let mut trailing = Vec::with_capacity(closures.len());
        for &closure in closures {
            trailing.push(self.expr(closure)?);
        }

        let named = !entries.is_empty() && positional.is_empty() && trailing.is_empty();
        let mut args = Vec::with_capacity(1 + positional.len() + trailing.len());
        if let (Some(&first), Some(&last)) = (entries.first(), entries.last()) {
            let map = self.alloc_pos(NodeKind::Map { entries }, Position::UNSET);
            positions::merge(&mut self.ast, map, first, last);
            args.push(map);
        }
        args.extend(positional);
        args.extend(&trailing);

        let id = self.alloc_at(NodeKind::Args { args, named }, elist);
        if let Some(&last) = trailing.last() {
            positions::set_end_from(&mut self.ast, id, last);
        }
        Ok(id)
    }

    /// `key: value`; identifier keys are string constants.
    fn map_entry(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let key_raw = self
            .child(raw, 0)
            .ok_or_else(|| self.missing_child(raw, RawKind::Ident))?;
        let key = self.name_constant(key_raw)?;
        let value = self.expr_child(raw, 1)?;
        Ok(self.alloc_at(NodeKind::MapEntry { key, value }, raw))
    }

    /// `new T(args)` or `new T[n]..`.
    fn new_expr(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let ty_raw = self.expect_child(raw, 0, RawKind::Type)?;
        let ty = self.type_ref(ty_raw)?;
        let ty_range = self.ast.node(ty).range();
        let rest = &self.children(raw)[1..];

        let id = match rest.first() {
            Some(&first) if self.kind(first) == RawKind::ArrayDeclarator => {
                let mut sizes = Vec::new();
                for &declarator in rest {
                    self.assert_kind(declarator, RawKind::ArrayDeclarator)?;
                    if let Some(size) = self.child(declarator, 0) {
                        sizes.push(self.expr(size)?);
                    }
                }
                self.alloc_at(
                    NodeKind::ArrayNew {
                        element_type: ty,
                        sizes,
                        dimensions: rest.len() as u32,
                    },
                    raw,
                )
            }
            Some(&elist) => {
                let args = self.arguments(elist, &[])?;
                self.alloc_at(
                    NodeKind::CtorCall {
                        kind: CtorKind::New,
                        ty: Some(ty),
                        args,
                    },
                    raw,
                )
            }
            None => return Err(self.missing_child(raw, RawKind::Elist)),
        };
        self.set_name_range(id, ty_range);
        Ok(id)
    }

    /// `this(..)` / `super(..)` as the first statement of a constructor.
    pub(super) fn special_ctor_call(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let kind = match self.kind(raw) {
            RawKind::CtorCall => CtorKind::This,
            _ => CtorKind::Super,
        };
        let elist = self.expect_child(raw, 0, RawKind::Elist)?;
        if self.ctor_call_slot != Some(raw) {
            return Err(self.structural(
                elist,
                "Constructor call must be the first statement in a constructor.",
            ));
        }
        let args = self.arguments(elist, &[])?;
        let id = self.alloc_at(NodeKind::CtorCall { kind, ty: None, args }, raw);
        Ok(id)
    }

    fn closure(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let mut i = 0;
        let params = match self.child(raw, 0) {
            Some(params) if self.kind(params) == RawKind::Parameters => {
                i += 1;
                Some(self.parameters(params)?)
            }
            _ => None,
        };
        let body_raw = self.expect_child(raw, i, RawKind::Slist)?;
        // A constructor call in a closure body is never in constructor
        // position.
        let saved = self.ctor_call_slot.take();
        let body = self.block(body_raw);
        self.ctor_call_slot = saved;
        let body = body?;
        Ok(self.alloc_at(NodeKind::Closure { params, body }, raw))
    }

    fn list(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let mut elements = Vec::new();
        for &element in self.children(raw) {
            elements.push(self.expr(element)?);
        }
        Ok(self.alloc_at(NodeKind::List { elements }, raw))
    }

    fn map(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let mut entries = Vec::new();
        for &entry in self.children(raw) {
            if self.kind(entry) != RawKind::SpreadMapArg {
                self.assert_kind(entry, RawKind::LabeledArg)?;
            }
            entries.push(self.expr(entry)?);
        }
        Ok(self.alloc_at(NodeKind::Map { entries }, raw))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct CallFlags {
    safe: bool,
    spread: bool,
    implicit_this: bool,
}

fn call_constant() -> NodeKind {
    NodeKind::Constant(ConstValue::String(SmolStr::new_inline("call")))
}
