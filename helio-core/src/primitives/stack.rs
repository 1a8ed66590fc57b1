// Stack manipulation words.

use crate::interpreter::Interp;
use crate::value::RuntimeError;

// dup: ( x -- x x ). Strings are deep-copied; quotes and handles share
// identity.
pub fn dup_impl(vm: &mut Interp) -> Result<(), RuntimeError> {
    let top = vm.peek()?.clone();
    vm.push(top);
    Ok(())
}

// drop: ( x -- ). Popping releases whatever the slot owned.
pub fn drop_impl(vm: &mut Interp) -> Result<(), RuntimeError> {
    vm.pop()?;
    Ok(())
}
