//! Printers: coloured plain text for the command-line entry point.

use owo_colors::OwoColorize;

use crate::session::{Availability, ExecutionResult, Notice, RunRecord};

pub struct TextPrinter {
    pub color: bool,
}

impl Default for TextPrinter {
    fn default() -> Self {
        Self { color: true }
    }
}

impl TextPrinter {
    /// Program output to stdout, failures to stderr.
    pub fn print_run(&self, run: &RunRecord) {
        match &run.result {
            ExecutionResult::Success { output } => {
                if self.color {
                    print!("{}", output.green());
                } else {
                    print!("{}", output);
                }
                if !output.is_empty() && !output.ends_with('\n') {
                    println!();
                }
                if let Some(stderr) = &run.stderr {
                    eprint!("{}", stderr);
                }
            }
            ExecutionResult::Failure { message } => {
                if self.color {
                    eprintln!("{}", message.red());
                } else {
                    eprintln!("{}", message);
                }
            }
        }
    }

    pub fn print_notice(&self, notice: Notice) {
        let text = notice.message();
        match (self.color, notice.is_error()) {
            (true, true) => eprintln!("{}", text.red().bold()),
            (true, false) => eprintln!("{}", text.green().bold()),
            (false, _) => eprintln!("{}", text),
        }
    }

    pub fn print_availability(&self, url: &str, availability: Availability) {
        let label = availability.to_string();
        let label = match (self.color, availability) {
            (false, _) => label,
            (true, Availability::Available) => label.green().to_string(),
            (true, Availability::Unavailable) => label.red().to_string(),
            (true, Availability::Unknown) => label.yellow().to_string(),
        };
        println!("{}: {}", url, label);
    }

    pub fn print_heading(&self, text: &str) {
        if self.color {
            println!("{}", text.cyan().bold());
        } else {
            println!("{}", text);
        }
    }
}
