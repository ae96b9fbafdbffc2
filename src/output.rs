//! User-facing one-line notices, separate from tracing output.
//! Colours are used only when stdout is a terminal.

use owo_colors::OwoColorize;

#[derive(Clone, Copy)]
enum Tone {
    Info,
    Warn,
    Error,
    Ok,
}

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn emit(tone: Tone, msg: &str) {
    let (label, to_stderr) = match tone {
        Tone::Info => ("info:", false),
        Tone::Warn => ("warn:", true),
        Tone::Error => ("error:", true),
        Tone::Ok => ("ok:", false),
    };
    let line = if is_tty() {
        let painted = match tone {
            Tone::Info => label.cyan().bold().to_string(),
            Tone::Warn => label.yellow().bold().to_string(),
            Tone::Error => label.red().bold().to_string(),
            Tone::Ok => label.green().bold().to_string(),
        };
        format!("{painted} {msg}")
    } else {
        format!("{label} {msg}")
    };
    if to_stderr {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

pub fn print_info(msg: &str) {
    emit(Tone::Info, msg);
}

pub fn print_warn(msg: &str) {
    emit(Tone::Warn, msg);
}

pub fn print_error(msg: &str) {
    emit(Tone::Error, msg);
}

pub fn print_success(msg: &str) {
    emit(Tone::Ok, msg);
}
