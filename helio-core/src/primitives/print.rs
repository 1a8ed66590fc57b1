// Output words: print and cr.

use std::future::Future;
use std::pin::Pin;

use crate::interpreter::Interp;
use crate::value::RuntimeError;

// print: ( str -- ). Writes the bytes and releases the string.
pub fn print_builtin(
    vm: &mut Interp,
) -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + '_>> {
    Box::pin(async move {
        let s = vm.pop_str()?;
        vm.write_bytes(s.as_bytes()).await?;
        vm.flush_output().await
    })
}

// cr: ( -- ). Newline, flushed.
pub fn cr_builtin(
    vm: &mut Interp,
) -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + '_>> {
    Box::pin(async move {
        vm.write_bytes(b"\n").await?;
        vm.flush_output().await
    })
}
