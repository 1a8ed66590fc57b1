// uv:run: ( -- ). Drive the event loop until no handle is active. The
// only suspension point in the interpreter; callbacks re-enter it from
// here.

use std::future::Future;
use std::pin::Pin;

use crate::interpreter::Interp;
use crate::value::RuntimeError;

pub fn uv_run_builtin(
    vm: &mut Interp,
) -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + '_>> {
    Box::pin(crate::uv::run_loop(vm))
}
