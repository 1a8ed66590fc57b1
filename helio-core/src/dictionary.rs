//! The word dictionary: a newest-first sequence of named entries.
//!
//! Redefinition shadows rather than replaces. Entries are never removed
//! or reordered, so `words` doubles as a definition history.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::interpreter::Interp;
use crate::quote::Quotation;
use crate::value::RuntimeError;

/// Calling convention for primitive words: a plain function returning a
/// boxed future, so async and wrapped-sync primitives share one table.
pub type PrimFn =
    fn(&mut Interp) -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + '_>>;

#[derive(Clone)]
pub enum WordKind {
    Prim(PrimFn),
    Colon(Rc<Quotation>),
}

#[derive(Clone)]
pub struct DictEntry {
    pub name: String,
    pub kind: WordKind,
}

#[derive(Default)]
pub struct Dictionary {
    // Stored oldest-first; lookups and listings walk it in reverse.
    entries: Vec<DictEntry>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest-first scan; the most recent definition of a name wins.
    pub fn lookup(&self, name: &str) -> Option<&DictEntry> {
        self.entries.iter().rev().find(|entry| entry.name == name)
    }

    pub fn add_prim(&mut self, name: &str, f: PrimFn) {
        self.entries.push(DictEntry {
            name: name.to_string(),
            kind: WordKind::Prim(f),
        });
    }

    pub fn add_colon(&mut self, name: String, body: Rc<Quotation>) {
        self.entries.push(DictEntry {
            name,
            kind: WordKind::Colon(body),
        });
    }

    /// All names, newest first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().rev().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
