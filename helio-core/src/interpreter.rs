//! The interpreter context and its token-walking state machine.
//!
//! One `Interp` owns the data stack, the dictionary, the quotation
//! table, and the event-loop registry. Execution is late-binding:
//! quotations hold raw tokens and names resolve against the dictionary
//! at the moment they run, so a word may call words defined after it.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::dictionary::{Dictionary, WordKind};
use crate::output::{AsyncOutput, StdoutOutput};
use crate::quote::{Quotation, QuoteTable};
use crate::tokenizer::{parse_int, tokenize, Token};
use crate::uv::{EventLoop, HandleId, HandleKind};
use crate::value::{RuntimeError, Value};

struct CompileState {
    name: String,
    body: Vec<Token>,
}

pub struct Interp {
    pub stack: Vec<Value>,
    pub dict: Dictionary,
    pub quotes: QuoteTable,
    pub(crate) uv: EventLoop,
    /// Cleared by `bye`. Only the prompt loop checks it; the event loop
    /// keeps running regardless.
    pub running: bool,
    output: Box<dyn AsyncOutput>,
}

impl Interp {
    pub fn new() -> Self {
        let mut vm = Self {
            stack: Vec::new(),
            dict: Dictionary::new(),
            quotes: QuoteTable::new(),
            uv: EventLoop::new(),
            running: true,
            output: Box::new(StdoutOutput::new()),
        };
        crate::builtins::register_core_words(&mut vm);
        vm
    }

    pub fn set_output(&mut self, output: Box<dyn AsyncOutput>) {
        self.output = output;
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    pub fn peek(&self) -> Result<&Value, RuntimeError> {
        self.stack.last().ok_or(RuntimeError::StackUnderflow)
    }

    pub fn pop_int(&mut self) -> Result<i64, RuntimeError> {
        match self.pop()? {
            Value::Int(n) => Ok(n),
            other => Err(RuntimeError::TypeError(format!(
                "expected int, got {}",
                other.type_name()
            ))),
        }
    }

    /// Pop a string, taking ownership of its bytes.
    pub fn pop_str(&mut self) -> Result<String, RuntimeError> {
        match self.pop()? {
            Value::Str(s) => Ok(s),
            other => Err(RuntimeError::TypeError(format!(
                "expected string, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn pop_quote(&mut self) -> Result<Rc<Quotation>, RuntimeError> {
        match self.pop()? {
            Value::Quote(q) => Ok(q),
            other => Err(RuntimeError::TypeError(format!(
                "expected quote, got {}",
                other.type_name()
            ))),
        }
    }

    /// Pop a handle, optionally checking its kind against the registry.
    /// A handle whose close has completed is unusable.
    pub fn pop_handle(&mut self, want: Option<HandleKind>) -> Result<HandleId, RuntimeError> {
        let id = match self.pop()? {
            Value::Handle(id) => id,
            other => {
                return Err(RuntimeError::TypeError(format!(
                    "expected handle, got {}",
                    other.type_name()
                )))
            }
        };
        match (self.uv.kind_of(id), want) {
            (None, _) => Err(RuntimeError::TypeError("handle is closed".into())),
            (Some(kind), Some(want)) if kind != want => Err(RuntimeError::TypeError(format!(
                "expected {} handle, got {} handle",
                want.name(),
                kind.name()
            ))),
            _ => Ok(id),
        }
    }

    // Output helpers used by the printing words.

    pub async fn write_bytes(&mut self, data: &[u8]) -> Result<(), RuntimeError> {
        self.output.write(data).await
    }

    pub async fn flush_output(&mut self) -> Result<(), RuntimeError> {
        self.output.flush().await
    }

    /// Tokenize and execute a chunk of source. Each call is one token
    /// stream: a colon definition left open at the end is discarded.
    pub async fn run_source(&mut self, source: &str) -> Result<(), RuntimeError> {
        let tokens = tokenize(source);
        self.run_quote(Rc::new(Quotation::new(tokens))).await
    }

    /// Walk a token vector, toggling between immediate execution and
    /// colon-definition compilation. Boxed so colon words and event
    /// callbacks can recurse.
    pub fn run_quote(
        &mut self,
        quote: Rc<Quotation>,
    ) -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + '_>> {
        Box::pin(async move {
            let tokens = &quote.tokens;
            let mut compiling: Option<CompileState> = None;
            let mut i = 0;

            while i < tokens.len() {
                let token = &tokens[i];

                if compiling.is_some() {
                    match token {
                        Token::Word(w) if w == ";" => {
                            if let Some(state) = compiling.take() {
                                self.dict.add_colon(
                                    state.name,
                                    Rc::new(Quotation::new(state.body)),
                                );
                            }
                        }
                        Token::Word(w) if w == "[" => {
                            // A nested quotation is captured once and
                            // embedded by id, so every invocation of the
                            // enclosing word reuses the same quotation.
                            let (inner, close) = collect_quotation(tokens, i)?;
                            let id = self.quotes.intern(Rc::new(Quotation::new(inner)));
                            if let Some(state) = compiling.as_mut() {
                                state.body.push(Token::QuoteRef(id));
                            }
                            i = close;
                        }
                        Token::Word(w) if w == "]" => {
                            return Err(RuntimeError::UnexpectedToken("]".into()));
                        }
                        Token::Word(w) if w == ":" => {
                            return Err(RuntimeError::NestedDefinition);
                        }
                        other => {
                            if let Some(state) = compiling.as_mut() {
                                state.body.push(other.clone());
                            }
                        }
                    }
                    i += 1;
                    continue;
                }

                match token {
                    Token::Str(s) => self.push(Value::Str(s.clone())),

                    Token::QuoteRef(id) => {
                        let q = self
                            .quotes
                            .resolve(*id)
                            .ok_or(RuntimeError::DanglingQuote)?;
                        self.push(Value::Quote(q));
                    }

                    Token::Word(w) => match w.as_str() {
                        ":" => {
                            i += 1;
                            let name = match tokens.get(i) {
                                Some(Token::Word(name)) => name.clone(),
                                _ => return Err(RuntimeError::MissingName),
                            };
                            compiling = Some(CompileState {
                                name,
                                body: Vec::new(),
                            });
                        }
                        "[" => {
                            // An immediate quotation is rebuilt from its
                            // raw tokens each time this stream runs.
                            let (inner, close) = collect_quotation(tokens, i)?;
                            self.push(Value::Quote(Rc::new(Quotation::new(inner))));
                            i = close;
                        }
                        "]" => return Err(RuntimeError::UnexpectedToken("]".into())),
                        ";" => return Err(RuntimeError::UnexpectedToken(";".into())),
                        _ => {
                            // Numbers before names: `: 5 ... ;` cannot
                            // shadow the literal 5.
                            if let Some(n) = parse_int(w) {
                                self.push(Value::Int(n));
                            } else if let Some(kind) =
                                self.dict.lookup(w).map(|entry| entry.kind.clone())
                            {
                                match kind {
                                    WordKind::Prim(f) => f(self).await?,
                                    WordKind::Colon(body) => self.run_quote(body).await?,
                                }
                            } else {
                                return Err(RuntimeError::UndefinedWord(w.clone()));
                            }
                        }
                    },
                }
                i += 1;
            }

            Ok(())
        })
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect the raw tokens between a `[` at `open` and its matching `]`,
/// respecting nesting. Inner brackets are kept verbatim. Returns the
/// inner tokens and the index of the closing bracket.
fn collect_quotation(tokens: &[Token], open: usize) -> Result<(Vec<Token>, usize), RuntimeError> {
    let mut inner = Vec::new();
    let mut depth = 1usize;
    let mut j = open + 1;
    while j < tokens.len() {
        match &tokens[j] {
            Token::Word(w) if w == "[" => depth += 1,
            Token::Word(w) if w == "]" => {
                depth -= 1;
                if depth == 0 {
                    return Ok((inner, j));
                }
            }
            _ => {}
        }
        inner.push(tokens[j].clone());
        j += 1;
    }
    Err(RuntimeError::UnclosedQuote)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_pop_roundtrip() {
        let mut vm = Interp::new();
        vm.push(Value::Int(42));
        assert_eq!(vm.pop_int().unwrap(), 42);
        assert!(matches!(vm.pop(), Err(RuntimeError::StackUnderflow)));
    }

    #[tokio::test]
    async fn test_typed_pop_mismatch() {
        let mut vm = Interp::new();
        vm.push(Value::Int(1));
        assert!(matches!(vm.pop_str(), Err(RuntimeError::TypeError(_))));
    }

    #[tokio::test]
    async fn test_number_literals() {
        let mut vm = Interp::new();
        vm.run_source("255 0xFF 0377").await.unwrap();
        assert_eq!(vm.pop_int().unwrap(), 255);
        assert_eq!(vm.pop_int().unwrap(), 255);
        assert_eq!(vm.pop_int().unwrap(), 255);
    }

    #[tokio::test]
    async fn test_immediate_quote_keeps_nested_brackets_raw() {
        let mut vm = Interp::new();
        vm.run_source("[ a [ b ] c ]").await.unwrap();
        let q = vm.pop_quote().unwrap();
        let words: Vec<String> = q.tokens.iter().map(|t| t.to_string()).collect();
        assert_eq!(words, ["a", "[", "b", "]", "c"]);
    }

    #[tokio::test]
    async fn test_immediate_quotes_are_fresh_each_time() {
        let mut vm = Interp::new();
        vm.run_source("[ dup ] [ dup ]").await.unwrap();
        let b = vm.pop_quote().unwrap();
        let a = vm.pop_quote().unwrap();
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_compiled_nested_quote_is_shared() {
        let mut vm = Interp::new();
        vm.run_source(": twice [ \"x\" print ] dup ; twice twice")
            .await
            .unwrap();
        let d = vm.pop_quote().unwrap();
        let c = vm.pop_quote().unwrap();
        let b = vm.pop_quote().unwrap();
        let a = vm.pop_quote().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(Rc::ptr_eq(&b, &c));
        assert!(Rc::ptr_eq(&c, &d));
    }

    #[tokio::test]
    async fn test_colon_definition_resolves_late() {
        // `inner` is defined after `outer` but before `outer` runs.
        let mut vm = Interp::new();
        vm.run_source(": outer inner ; : inner 7 ; outer").await.unwrap();
        assert_eq!(vm.pop_int().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_unknown_word_is_fatal() {
        let mut vm = Interp::new();
        let err = vm.run_source("no-such-word").await.unwrap_err();
        assert!(matches!(err, RuntimeError::UndefinedWord(w) if w == "no-such-word"));
    }

    #[tokio::test]
    async fn test_unexpected_close_bracket() {
        let mut vm = Interp::new();
        assert!(matches!(
            vm.run_source("]").await,
            Err(RuntimeError::UnexpectedToken(_))
        ));
        assert!(matches!(
            vm.run_source(": f ] ;").await,
            Err(RuntimeError::UnexpectedToken(_))
        ));
    }

    #[tokio::test]
    async fn test_unclosed_quote_is_fatal() {
        let mut vm = Interp::new();
        assert!(matches!(
            vm.run_source("[ 1 2").await,
            Err(RuntimeError::UnclosedQuote)
        ));
    }

    #[tokio::test]
    async fn test_colon_without_name_is_fatal() {
        let mut vm = Interp::new();
        assert!(matches!(
            vm.run_source(":").await,
            Err(RuntimeError::MissingName)
        ));
    }

    #[tokio::test]
    async fn test_nested_definition_rejected() {
        let mut vm = Interp::new();
        assert!(matches!(
            vm.run_source(": a : b ; ;").await,
            Err(RuntimeError::NestedDefinition)
        ));
    }

    #[tokio::test]
    async fn test_open_definition_is_discarded() {
        let mut vm = Interp::new();
        vm.run_source(": half-done 1 2").await.unwrap();
        assert!(vm.dict.lookup("half-done").is_none());
        assert!(vm.stack.is_empty());
    }

    #[tokio::test]
    async fn test_definition_shadows_but_keeps_history() {
        let mut vm = Interp::new();
        let before = vm.dict.len();
        vm.run_source(": n 1 ; : n 2 ; n").await.unwrap();
        assert_eq!(vm.pop_int().unwrap(), 2);
        assert_eq!(vm.dict.len(), before + 2);
    }
}
