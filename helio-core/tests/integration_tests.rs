// Integration tests: whole scripts through the interpreter, including
// the event-loop words against real tokio timers and loopback sockets.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use helio_core::{AsyncOutput, Interp, RuntimeError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Captures everything the printing words emit.
#[derive(Clone, Default)]
struct CaptureOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CaptureOutput {
    fn snapshot(&self) -> String {
        String::from_utf8(self.buffer.lock().unwrap().clone()).unwrap()
    }
}

impl AsyncOutput for CaptureOutput {
    fn write<'a>(&'a mut self, data: &'a [u8])
        -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + 'a>>
    {
        Box::pin(async move {
            self.buffer
                .lock()
                .map_err(|_| RuntimeError::Io("capture buffer poisoned".into()))?
                .extend_from_slice(data);
            Ok(())
        })
    }

    fn flush<'a>(&'a mut self)
        -> Pin<Box<dyn Future<Output = Result<(), RuntimeError>> + 'a>>
    {
        Box::pin(async move { Ok(()) })
    }
}

fn vm_with_capture() -> (Interp, CaptureOutput) {
    let mut vm = Interp::new();
    let capture = CaptureOutput::default();
    vm.set_output(Box::new(capture.clone()));
    (vm, capture)
}

#[tokio::test]
async fn test_definition_and_invocation() {
    let (mut vm, out) = vm_with_capture();
    vm.run_source(": greet \"Hello\" print cr ; greet").await.unwrap();
    assert_eq!(out.snapshot(), "Hello\n");
}

#[tokio::test]
async fn test_string_escape_decoding() {
    let (mut vm, out) = vm_with_capture();
    vm.run_source(r#""a\nb\tc\\d" print"#).await.unwrap();
    assert_eq!(out.snapshot(), "a\nb\tc\\d");
}

#[tokio::test]
async fn test_comments_are_skipped() {
    let (mut vm, out) = vm_with_capture();
    let script = "\
\\ whole-line comment
( a block
  comment ) \"ok\" print cr \\ trailing comment";
    vm.run_source(script).await.unwrap();
    assert_eq!(out.snapshot(), "ok\n");
}

#[tokio::test]
async fn test_words_lists_newest_first() {
    let (mut vm, out) = vm_with_capture();
    vm.run_source(": mine cr ; words").await.unwrap();
    let listing = out.snapshot();
    assert!(listing.starts_with("mine uv:write "));
    assert!(listing.ends_with("dup \n"));
}

#[tokio::test]
async fn test_print_requires_string() {
    let (mut vm, _out) = vm_with_capture();
    let err = vm.run_source("42 print").await.unwrap_err();
    assert!(matches!(err, RuntimeError::TypeError(_)));
}

#[tokio::test]
async fn test_drop_on_empty_stack_underflows() {
    let (mut vm, _out) = vm_with_capture();
    assert!(matches!(
        vm.run_source("drop").await,
        Err(RuntimeError::StackUnderflow)
    ));
}

#[tokio::test]
async fn test_one_shot_timer() {
    let (mut vm, out) = vm_with_capture();
    let script = "uv:timer 0 0 [ drop \"tick\" print cr bye ] uv:timer-start uv:run";
    timeout(Duration::from_secs(5), vm.run_source(script))
        .await
        .expect("uv:run did not settle")
        .unwrap();
    assert_eq!(out.snapshot(), "tick\n");
    assert!(!vm.running);
}

#[tokio::test]
async fn test_bye_does_not_stop_the_loop() {
    let (mut vm, out) = vm_with_capture();
    let script = "uv:timer 0 0 [ drop \"late\" print cr ] uv:timer-start bye uv:run";
    timeout(Duration::from_secs(5), vm.run_source(script))
        .await
        .expect("uv:run did not settle")
        .unwrap();
    // The flag is already down, but the armed timer still ticked.
    assert!(!vm.running);
    assert_eq!(out.snapshot(), "late\n");
}

#[tokio::test]
async fn test_timer_stop_disarms() {
    let (mut vm, out) = vm_with_capture();
    let script =
        "uv:timer dup 1 1 [ drop \"tick\" print ] uv:timer-start uv:timer-stop uv:run";
    timeout(Duration::from_secs(5), vm.run_source(script))
        .await
        .expect("uv:run did not settle with the timer disarmed")
        .unwrap();
    assert_eq!(out.snapshot(), "");
}

#[tokio::test]
async fn test_close_suppresses_pending_callbacks() {
    let (mut vm, out) = vm_with_capture();
    let script = "uv:timer dup 0 0 [ drop \"tick\" print ] uv:timer-start uv:close uv:run";
    timeout(Duration::from_secs(5), vm.run_source(script))
        .await
        .expect("uv:run did not settle after close")
        .unwrap();
    assert_eq!(out.snapshot(), "");
}

#[tokio::test]
async fn test_repeating_timer_closed_from_its_own_callback() {
    let (mut vm, out) = vm_with_capture();
    // The callback receives its own handle and closes it; the tick in
    // flight still completes, later ones are suppressed.
    let script = "uv:timer 0 2 [ uv:close \"t\" print ] uv:timer-start uv:run";
    timeout(Duration::from_secs(5), vm.run_source(script))
        .await
        .expect("uv:run did not settle after close")
        .unwrap();
    assert_eq!(out.snapshot(), "t");
}

#[tokio::test]
async fn test_echo_server() {
    let (mut vm, _out) = vm_with_capture();
    const PORT: u16 = 47911;
    let script = format!(
        "uv:tcp dup \"127.0.0.1\" {} uv:tcp-bind 16 [ [ uv:write ] uv:read-start ] uv:listen uv:run",
        PORT
    );

    let client = async {
        // Let the script reach uv:run with the listener armed.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let mut stream = TcpStream::connect(("127.0.0.1", PORT)).await.unwrap();
        stream.write_all(b"hello").await.unwrap();
        stream.shutdown().await.unwrap();

        let mut echoed = [0u8; 5];
        stream.read_exact(&mut echoed).await.unwrap();
        echoed
    };

    timeout(Duration::from_secs(10), async {
        tokio::select! {
            result = vm.run_source(&script) => {
                panic!("server loop ended unexpectedly: {:?}", result);
            }
            echoed = client => assert_eq!(&echoed, b"hello"),
        }
    })
    .await
    .expect("echo roundtrip timed out");
}

#[tokio::test]
async fn test_connect_and_read_between_two_script_handles() {
    let (mut vm, out) = vm_with_capture();
    const PORT: u16 = 47913;
    // An echo server and a client in one script: the client sends "ping"
    // and prints whatever comes back.
    let script = format!(
        "uv:tcp dup \"127.0.0.1\" {port} uv:tcp-bind 8 [ [ uv:write ] uv:read-start ] uv:listen \
         uv:tcp dup \"127.0.0.1\" {port} [ dup [ print bye ] uv:read-start \"ping\" uv:write ] uv:tcp-connect \
         uv:run",
        port = PORT
    );

    let watch = async {
        loop {
            tokio::time::sleep(Duration::from_millis(25)).await;
            if out.snapshot() == "ping" {
                break;
            }
        }
    };

    timeout(Duration::from_secs(10), async {
        tokio::select! {
            result = vm.run_source(&script) => {
                panic!("server loop ended unexpectedly: {:?}", result);
            }
            _ = watch => {}
        }
    })
    .await
    .expect("in-script roundtrip timed out");
}
