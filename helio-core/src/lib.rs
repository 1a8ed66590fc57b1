//! # Helio Core
//!
//! Interpreter library for helio, a tiny stack language with first-class
//! event-loop integration: timers and TCP endpoints are values on the
//! data stack, and quotations attach to them as event callbacks.
//!
//! The interpreter is late-binding: quotations store raw tokens and
//! names resolve at invocation time. Event sources run as tokio tasks
//! feeding one channel; `uv:run` drains it, re-entering the interpreter
//! for each callback on the caller's own task.
//!
//! ## Example
//!
//! ```ignore
//! use helio_core::Interp;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut vm = Interp::new();
//!     vm.run_source(": greet \"Hello\" print cr ; greet").await.unwrap();
//! }
//! ```

pub mod builtins;
pub mod dictionary;
pub mod interpreter;
pub mod output;
pub mod primitives;
pub mod quote;
pub mod tokenizer;
pub mod uv;
pub mod value;

// Re-exports for convenience
pub use dictionary::{DictEntry, Dictionary, PrimFn, WordKind};
pub use interpreter::Interp;
pub use output::{AsyncOutput, StdoutOutput};
pub use quote::{QuoteId, QuoteTable, Quotation};
pub use tokenizer::{parse_int, tokenize, Token};
pub use uv::{HandleId, HandleKind};
pub use value::{RuntimeError, Value};
