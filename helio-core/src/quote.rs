//! Quotation storage.
//!
//! A quotation is an immutable vector of tokens, executed by feeding it
//! back to the interpreter. Quotations captured inside colon definitions
//! are interned in an append-only table; the enclosing body embeds a
//! `Token::QuoteRef` carrying the table id, so a definition compiled once
//! reuses the same quotation on every run. Interned entries live for the
//! process lifetime, which keeps every reference in a compiled body valid.

use std::fmt;
use std::rc::Rc;

use crate::tokenizer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuoteId(u32);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable, ordered vector of tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Quotation {
    pub tokens: Vec<Token>,
}

impl Quotation {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

/// Append-only intern table mapping monotonically increasing ids to
/// quotations.
#[derive(Debug, Default)]
pub struct QuoteTable {
    entries: Vec<Rc<Quotation>>,
}

impl QuoteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, quote: Rc<Quotation>) -> QuoteId {
        let id = QuoteId(self.entries.len() as u32);
        self.entries.push(quote);
        id
    }

    pub fn resolve(&self, id: QuoteId) -> Option<Rc<Quotation>> {
        self.entries.get(id.0 as usize).cloned()
    }
}
