//! String interning for grammar symbols.
//!
//! Nonterminals and terminals live in separate tables so the two vocabularies
//! stay disjoint by construction. Interned ids give O(1) comparison in the
//! chart inner loops instead of string equality.

use rustc_hash::FxHashMap;

/// Interned nonterminal id. The start symbol is always id 0.
pub type NtId = u32;

/// Interned terminal (word) id.
pub type WordId = u32;

/// Symbol table mapping strings to dense integer ids.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    str_to_id: FxHashMap<Box<str>, u32>,
    id_to_str: Vec<Box<str>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its unique id.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.str_to_id.get(s) {
            return id;
        }

        let id = self.id_to_str.len() as u32;
        let boxed: Box<str> = s.into();
        self.str_to_id.insert(boxed.clone(), id);
        self.id_to_str.push(boxed);
        id
    }

    /// Look up the id for a string without interning it.
    pub fn get(&self, s: &str) -> Option<u32> {
        self.str_to_id.get(s).copied()
    }

    /// Resolve an id back to its string.
    pub fn resolve(&self, id: u32) -> &str {
        &self.id_to_str[id as usize]
    }

    /// Number of interned symbols.
    pub fn len(&self) -> usize {
        self.id_to_str.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_str.is_empty()
    }

    /// Iterate all interned strings in id order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.id_to_str.iter().map(|s| s.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let mut table = SymbolTable::new();
        let a = table.intern("NP");
        let b = table.intern("VP");
        let c = table.intern("NP");

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_resolve_roundtrip() {
        let mut table = SymbolTable::new();
        let id = table.intern("S");
        assert_eq!(table.resolve(id), "S");
        assert_eq!(table.get("S"), Some(id));
        assert_eq!(table.get("missing"), None);
    }

    #[test]
    fn test_ids_are_dense() {
        let mut table = SymbolTable::new();
        assert_eq!(table.intern("S"), 0);
        assert_eq!(table.intern("A"), 1);
        assert_eq!(table.intern("B"), 2);
        let names: Vec<_> = table.iter().collect();
        assert_eq!(names, vec!["S", "A", "B"]);
    }
}
