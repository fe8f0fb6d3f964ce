//! An interactive line editor over `commands::run_line`, in the spirit
//! of a live-coding console: type a key and a quoted pattern, see it
//! take over on the next tick boundary.

use loom_daemon::Stream;
use owo_colors::OwoColorize;
use rustyline::DefaultEditor;

pub fn run(stream: &Stream) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("{} {}", "failed to start line editor:".red(), e);
            return;
        }
    };

    loop {
        match editor.readline("loom> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                if crate::commands::run_line(stream, &line) {
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{} {}", "input error:".red(), e);
                break;
            }
        }
    }
}
