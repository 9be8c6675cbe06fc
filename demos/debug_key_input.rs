//! Key Debug Example - print every parsed key event
//!
//! Usage: cargo run --example debug_key_input
//! Press Ctrl+C to exit.

use rtprompt::{create_console_io, ConsoleResult, Key, KeyEvent};
use std::io::{self, Write};
use std::sync::mpsc;

/// Format raw bytes for display
fn format_bytes(bytes: &[u8]) -> String {
    let hex: String = bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ");

    let ascii: String = bytes
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect();

    format!("[{}] \"{}\"", hex, ascii)
}

fn describe(event: &KeyEvent) -> String {
    let mut line = format!(
        "KeyPress(key={:<20}, raw={:<25}",
        format!("'{:?}'", event.key),
        format_bytes(&event.raw_bytes)
    );
    if let Some(rune) = event.rune {
        line.push_str(&format!(", rune={rune:?}"));
    }
    // Raw mode: no newline translation
    line.push_str(")\r\n");
    line
}

fn main() -> ConsoleResult<()> {
    println!("Key Debug - ConsoleInput");
    println!("========================");
    println!("Press keys to see parsed events. Press Ctrl+C to exit.");
    println!();

    let (input, output) = create_console_io()?;
    let guard = input.enable_raw_mode()?;

    let (events, received) = mpsc::channel();
    input.start_reader(Box::new(move |read| {
        let _ = events.send(read);
    }))?;

    output.write_text("Ready for input...\r\n")?;
    output.flush()?;

    for read in received {
        match read {
            Ok(event) => {
                output.write_text(&describe(&event))?;
                output.flush()?;
                if event.key == Key::ControlC {
                    break;
                }
            }
            Err(e) => {
                output.write_text(&format!("error: {e}\r\n"))?;
                output.flush()?;
            }
        }
    }

    let _ = input.stop_reader();
    guard.restore();
    println!("Done. Goodbye!");
    io::stdout().flush()?;
    Ok(())
}
