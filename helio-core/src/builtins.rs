//! Registers the core word set.
//!
//! Registration order is load-bearing: `words` lists the dictionary
//! newest-first, so the listing reads back-to-front from here.

use std::future::Future;
use std::pin::Pin;

use crate::interpreter::Interp;
use crate::primitives;
use crate::value::RuntimeError;

// Wrap a synchronous primitive body in the boxed-future calling
// convention.
macro_rules! sync_prim {
    ($func:path) => {
        |vm: &mut Interp| -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + '_>> {
            Box::pin(async move { $func(vm) })
        }
    };
}

pub fn register_core_words(vm: &mut Interp) {
    vm.dict.add_prim("dup", sync_prim!(primitives::stack::dup_impl));
    vm.dict.add_prim("drop", sync_prim!(primitives::stack::drop_impl));
    vm.dict.add_prim("cr", primitives::print::cr_builtin);
    vm.dict.add_prim("print", primitives::print::print_builtin);
    vm.dict.add_prim("bye", sync_prim!(primitives::bye::bye_impl));
    vm.dict.add_prim("words", primitives::words::words_builtin);

    vm.dict.add_prim("uv:run", primitives::uv_run::uv_run_builtin);
    vm.dict.add_prim("uv:timer", sync_prim!(primitives::uv_timer::uv_timer_impl));
    vm.dict.add_prim(
        "uv:timer-start",
        sync_prim!(primitives::uv_timer::uv_timer_start_impl),
    );
    vm.dict.add_prim(
        "uv:timer-stop",
        sync_prim!(primitives::uv_timer::uv_timer_stop_impl),
    );
    vm.dict.add_prim("uv:close", sync_prim!(primitives::uv_close::uv_close_impl));

    vm.dict.add_prim("uv:tcp", sync_prim!(primitives::uv_tcp::uv_tcp_impl));
    vm.dict.add_prim(
        "uv:tcp-bind",
        sync_prim!(primitives::uv_tcp::uv_tcp_bind_impl),
    );
    vm.dict.add_prim("uv:listen", sync_prim!(primitives::uv_listen::uv_listen_impl));
    vm.dict.add_prim(
        "uv:read-start",
        sync_prim!(primitives::uv_read::uv_read_start_impl),
    );
    vm.dict.add_prim(
        "uv:tcp-connect",
        sync_prim!(primitives::uv_connect::uv_tcp_connect_impl),
    );
    vm.dict.add_prim("uv:write", sync_prim!(primitives::uv_write::uv_write_impl));
}
