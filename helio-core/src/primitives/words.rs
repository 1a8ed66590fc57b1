// words: ( -- ). List every dictionary name, newest first,
// space-separated, newline-terminated.

use std::future::Future;
use std::pin::Pin;

use crate::interpreter::Interp;
use crate::value::RuntimeError;

pub fn words_builtin(
    vm: &mut Interp,
) -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + '_>> {
    Box::pin(async move {
        let mut line = String::new();
        for name in vm.dict.names() {
            line.push_str(name);
            line.push(' ');
        }
        line.push('\n');
        vm.write_bytes(line.as_bytes()).await?;
        vm.flush_output().await
    })
}
