//! Per-node metadata side-table.

use grove_core::SmolStr;

use crate::ast::Position;

/// Well-known metadata keys.
pub mod keys {
    /// Wide range of a variable or constant that was configured from a
    /// wrapping expression node.
    pub const SOURCE_OFFSETS: &str = "source.offsets";
    /// Offset just past the `)` closing a method's parameter list.
    pub const RPAREN_OFFSET: &str = "rparen.offset";
    /// For a field followed by another declarator: that declarator's start
    /// minus one.
    pub const END2POS: &str = "end2pos";
    /// Start of a static initializer's block.
    pub const STATIC_OFFSET: &str = "static.offset";
    /// Start of the `new` keyword of a constructor or array call whose range
    /// was widened by an enclosing expression.
    pub const NEW_OFFSET: &str = "new.offset";
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Offset(usize),
    Position(Position),
    Flag(bool),
    Text(SmolStr),
}

/// Small ordered map. Nodes rarely carry more than two entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(SmolStr, MetaValue)>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace; returns the previous value.
    pub fn insert(&mut self, key: impl Into<SmolStr>, value: MetaValue) -> Option<MetaValue> {
        let key = key.into();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn remove(&mut self, key: &str) -> Option<MetaValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn offset(&self, key: &str) -> Option<usize> {
        match self.get(key)? {
            MetaValue::Offset(offset) => Some(*offset),
            _ => None,
        }
    }

    pub fn position(&self, key: &str) -> Option<Position> {
        match self.get(key)? {
            MetaValue::Position(pos) => Some(*pos),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some(MetaValue::Flag(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_existing_key() {
        let mut meta = Metadata::default();
        assert_eq!(meta.insert(keys::RPAREN_OFFSET, MetaValue::Offset(3)), None);
        assert_eq!(
            meta.insert(keys::RPAREN_OFFSET, MetaValue::Offset(7)),
            Some(MetaValue::Offset(3))
        );
        assert_eq!(meta.len(), 1);
        assert_eq!(meta.offset(keys::RPAREN_OFFSET), Some(7));
        assert_eq!(meta.position(keys::RPAREN_OFFSET), None);
    }

    #[test]
    fn remove_keeps_other_entries_in_order() {
        let mut meta = Metadata::default();
        meta.insert("a", MetaValue::Flag(true));
        meta.insert("b", MetaValue::Text("x".into()));
        meta.insert("c", MetaValue::Offset(1));
        assert!(meta.remove("b").is_some());
        let keys: Vec<_> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "c"]);
        assert!(meta.flag("a"));
    }
}
