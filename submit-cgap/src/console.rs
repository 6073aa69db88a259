use std::io::{self, BufRead, Write};

use submit_cgap_core::contract::Console;

/// Console on the process's stdin/stdout.
#[derive(Debug, Default)]
pub struct TerminalConsole;

impl TerminalConsole {
    pub fn new() -> Self {
        TerminalConsole
    }
}

impl Console for TerminalConsole {
    fn show(&self, line: &str) {
        println!("{line}");
    }

    fn show_timed(&self, line: &str) {
        println!("{} {line}", chrono::Local::now().format("%H:%M:%S"));
    }

    fn yes_or_no(&self, question: &str) -> bool {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        loop {
            print!("{question} [yes/no]: ");
            let _ = io::stdout().flush();
            let mut answer = String::new();
            match input.read_line(&mut answer) {
                // End of input counts as a refusal.
                Ok(0) | Err(_) => return false,
                Ok(_) => {}
            }
            if let Some(answer) = parse_answer(&answer) {
                return answer;
            }
        }
    }
}

/// `y`/`yes` and `n`/`no`, in any case. Anything else is asked again.
pub fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
