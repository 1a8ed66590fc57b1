//! Output seam for the printing words.
//!
//! `print`, `cr`, and `words` write through this trait, so tests can
//! capture interpreter output and alternative front ends can redirect
//! it. A sink failure surfaces as `RuntimeError::Io` and is fatal like
//! any other script error.

use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;

use crate::value::RuntimeError;

/// Byte-oriented async sink used by the printing words.
///
/// Methods return boxed futures so the trait stays object safe; the
/// interpreter holds a `Box<dyn AsyncOutput>` and defaults to
/// [`StdoutOutput`].
pub trait AsyncOutput {
    /// Write bytes to the sink.
    fn write<'a>(&'a mut self, data: &'a [u8])
        -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + 'a>>;

    /// Flush anything the sink has buffered.
    fn flush<'a>(&'a mut self)
        -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + 'a>>;
}

/// The default sink: standard output. `print` and `cr` flush after
/// writing, so interleaved prompt output stays ordered.
pub struct StdoutOutput;

impl StdoutOutput {
    pub fn new() -> Self {
        StdoutOutput
    }
}

impl Default for StdoutOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncOutput for StdoutOutput {
    fn write<'a>(&'a mut self, data: &'a [u8])
        -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + 'a>>
    {
        Box::pin(async move {
            io::stdout()
                .write_all(data)
                .map_err(|error| RuntimeError::Io(error.to_string()))
        })
    }

    fn flush<'a>(&'a mut self)
        -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + 'a>>
    {
        Box::pin(async move {
            io::stdout()
                .flush()
                .map_err(|error| RuntimeError::Io(error.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockOutput {
        buffer: Vec<u8>,
        fail_writes: bool,
    }

    impl AsyncOutput for MockOutput {
        fn write<'a>(&'a mut self, data: &'a [u8])
            -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + 'a>>
        {
            Box::pin(async move {
                if self.fail_writes {
                    return Err(RuntimeError::Io("sink refused the write".into()));
                }
                self.buffer.extend_from_slice(data);
                Ok(())
            })
        }

        fn flush<'a>(&'a mut self)
            -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + 'a>>
        {
            Box::pin(async move { Ok(()) })
        }
    }

    #[tokio::test]
    async fn test_mock_output_accumulates() {
        let mut output = MockOutput { buffer: Vec::new(), fail_writes: false };

        output.write(b"Hello").await.unwrap();
        output.write(b" ").await.unwrap();
        output.write(b"World").await.unwrap();
        output.flush().await.unwrap();

        assert_eq!(output.buffer, b"Hello World");
    }

    #[tokio::test]
    async fn test_sink_failure_is_an_io_error() {
        let mut output = MockOutput { buffer: Vec::new(), fail_writes: true };
        assert!(matches!(
            output.write(b"x").await,
            Err(RuntimeError::Io(_))
        ));
    }
}
