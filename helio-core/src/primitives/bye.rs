// bye: ( -- ). Clears the running flag; the prompt loop exits on its
// next check. Deliberately leaves the event loop alone, so a timer armed
// before `bye` keeps ticking while `uv:run` is active.

use crate::interpreter::Interp;
use crate::value::RuntimeError;

pub fn bye_impl(vm: &mut Interp) -> Result<(), RuntimeError> {
    vm.running = false;
    Ok(())
}
