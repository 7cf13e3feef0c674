//! Identifier interning facility. Frontend identifiers are short-lived
//! tree-sitter text slices borrowed from the source buffer; the
//! interner hands back a stable owned `String` the first time a
//! spelling is seen and reuses the same allocation afterward.

use std::collections::HashSet;

#[derive(Default)]
pub struct Interner {
    table: HashSet<String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, text: &str) -> String {
        if let Some(existing) = self.table.get(text) {
            return existing.clone();
        }
        self.table.insert(text.to_string());
        text.to_string()
    }
}
