use grove_core::SmolStr;
use grove_syntax::{RawKind, RawNodeId};

use crate::ast::{NodeId, NodeKind, TypeRef, WildcardBound};
use crate::error::ConvertError;

use super::Converter;

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

pub(crate) fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

impl Converter<'_> {
    /// `TYPE(name, TYPE_ARGUMENTS?, ARRAY_DECLARATOR*)`
    pub(super) fn type_ref(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        self.assert_kind(raw, RawKind::Type)?;
        let name_raw = self
            .child(raw, 0)
            .ok_or_else(|| self.missing_child(raw, RawKind::Ident))?;
        let name = SmolStr::new(self.text_of(raw));

        let mut type_args = Vec::new();
        let mut dimensions = 0;
        for &child in &self.children(raw)[1..] {
            match self.kind(child) {
                RawKind::TypeArguments => type_args = self.type_arguments(child)?,
                RawKind::ArrayDeclarator => dimensions += 1,
                _ => self.assert_kind(child, RawKind::ArrayDeclarator)?,
            }
        }

        let id = self.alloc_at(
            NodeKind::TypeRef(TypeRef {
                primitive: is_primitive(&name),
                name,
                type_args,
                dimensions,
            }),
            raw,
        );
        let name_range = self.pos(name_raw).range;
        self.set_name_range(id, name_range);
        Ok(id)
    }

    fn type_arguments(&mut self, raw: RawNodeId) -> Result<Vec<NodeId>, ConvertError> {
        let mut out = Vec::new();
        for &arg in self.children(raw) {
            let id = match self.kind(arg) {
                RawKind::TypeArgument => {
                    let inner = self.expect_child(arg, 0, RawKind::Type)?;
                    self.type_ref(inner)?
                }
                RawKind::Wildcard => self.wildcard(arg)?,
                _ => {
                    self.assert_kind(arg, RawKind::TypeArgument)?;
                    continue;
                }
            };
            out.push(id);
        }
        Ok(out)
    }

    fn wildcard(&mut self, raw: RawNodeId) -> Result<NodeId, ConvertError> {
        let bound = match (self.text_of(raw), self.child(raw, 0)) {
            ("extends", Some(ty)) => Some((WildcardBound::Extends, self.type_ref(ty)?)),
            ("super", Some(ty)) => Some((WildcardBound::Super, self.type_ref(ty)?)),
            _ => None,
        };
        Ok(self.alloc_at(NodeKind::Wildcard { bound }, raw))
    }

    pub(super) fn type_parameters(&mut self, raw: RawNodeId) -> Result<Vec<NodeId>, ConvertError> {
        self.assert_kind(raw, RawKind::TypeParameters)?;
        let mut out = Vec::new();
        for &param in self.children(raw) {
            self.assert_kind(param, RawKind::TypeParameter)?;
            let name_raw = self.expect_child(param, 0, RawKind::Ident)?;
            let bounds = match self.child(param, 1) {
                Some(bounds) => {
                    self.assert_kind(bounds, RawKind::TypeUpperBounds)?;
                    self.type_list(bounds)?
                }
                None => Vec::new(),
            };
            let id = self.alloc_at(
                NodeKind::TypeParam {
                    name: SmolStr::new(self.text_of(param)),
                    bounds,
                },
                param,
            );
            let name_range = self.pos(name_raw).range;
            self.set_name_range(id, name_range);
            out.push(id);
        }
        Ok(out)
    }

    /// Children of an extends, implements, throws or bounds clause.
    pub(super) fn type_list(&mut self, raw: RawNodeId) -> Result<Vec<NodeId>, ConvertError> {
        self.children(raw)
            .iter()
            .map(|ty| self.type_ref(*ty))
            .collect()
    }
}
