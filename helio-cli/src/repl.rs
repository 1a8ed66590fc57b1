// Interactive prompt loop. Each line is one token stream; `bye` clears
// the running flag and the loop exits on its next check. Script errors
// are fatal even here, matching file mode.

use std::io::Write;

use helio_core::{Interp, RuntimeError};
use tokio::io::AsyncBufReadExt;

pub async fn run(vm: &mut Interp) -> Result<(), RuntimeError> {
    println!("helio v{}", env!("CARGO_PKG_VERSION"));
    println!("type `words` to list words, `bye` to leave");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while vm.running {
        print!("> ");
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break, // EOF
            Err(error) => {
                eprintln!("input error: {}", error);
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        vm.run_source(trimmed).await?;

        if !vm.stack.is_empty() {
            let rendered: Vec<String> = vm.stack.iter().map(|v| v.to_string()).collect();
            println!("stack: {}", rendered.join(" "));
        }
    }

    Ok(())
}
