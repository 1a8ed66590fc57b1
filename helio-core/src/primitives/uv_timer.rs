// Timer words: uv:timer, uv:timer-start, uv:timer-stop.

use std::time::Duration;

use tokio::time;
use tracing::warn;

use crate::interpreter::Interp;
use crate::uv::{Event, HandleKind};
use crate::value::{RuntimeError, Value};

// uv:timer: ( -- h ). Register a fresh timer handle and push it.
pub fn uv_timer_impl(vm: &mut Interp) -> Result<(), RuntimeError> {
    let id = vm.uv.register(HandleKind::Timer);
    vm.push(Value::Handle(id));
    Ok(())
}

// uv:timer-start: ( h timeout-ms repeat-ms q -- ). Store the callback
// (displacing any prior one) and arm the timer. repeat-ms 0 is one-shot.
pub fn uv_timer_start_impl(vm: &mut Interp) -> Result<(), RuntimeError> {
    let quote = vm.pop_quote()?;
    let repeat = vm.pop_int()?;
    let timeout = vm.pop_int()?;
    let id = vm.pop_handle(Some(HandleKind::Timer))?;

    let events = vm.uv.events.clone();
    let Some(h) = vm.uv.handles.get_mut(&id) else {
        return Ok(());
    };
    if h.closing {
        warn!(handle = %id, "uv:timer-start on closing handle");
        return Ok(());
    }

    h.set_callback(quote);
    // Re-arming replaces the running timer.
    if let Some(task) = h.timer_task.take() {
        task.abort();
    }

    let timeout_ms = timeout.max(0) as u64;
    let repeat_ms = repeat.max(0) as u64;
    h.repeat_ms = repeat_ms;
    h.timer_task = Some(tokio::spawn(async move {
        time::sleep(Duration::from_millis(timeout_ms)).await;
        if events.send(Event::TimerTick(id)).is_err() {
            return;
        }
        if repeat_ms == 0 {
            return;
        }
        loop {
            time::sleep(Duration::from_millis(repeat_ms)).await;
            if events.send(Event::TimerTick(id)).is_err() {
                return;
            }
        }
    }));
    Ok(())
}

// uv:timer-stop: ( h -- ). Disarm; the callback stays for a re-arm.
pub fn uv_timer_stop_impl(vm: &mut Interp) -> Result<(), RuntimeError> {
    let id = vm.pop_handle(Some(HandleKind::Timer))?;
    if let Some(h) = vm.uv.handles.get_mut(&id) {
        if let Some(task) = h.timer_task.take() {
            task.abort();
        }
    }
    Ok(())
}
