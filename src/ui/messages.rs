//! Console messages for interactive commands.
//! Diagnostics go through `tracing`; these are for the person at the terminal.

use ansi_term::{Colour, Style};
use std::fmt;

/// Icons
const ICON_INFO: &str = "ℹ️";
const ICON_OK: &str = "✅";
const ICON_WARN: &str = "⚠️";
const ICON_ERR: &str = "❌";
const ICON_SKIP: &str = "⏭️";

fn paint(colour: Colour, icon: &str) -> String {
    Style::new().bold().fg(colour).paint(icon).to_string()
}

pub fn info<T: fmt::Display>(msg: T) {
    println!("{} {}", paint(Colour::Blue, ICON_INFO), msg);
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{} {}", paint(Colour::Green, ICON_OK), msg);
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{} {}", paint(Colour::Yellow, ICON_WARN), msg);
}

pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{} {}", paint(Colour::Red, ICON_ERR), msg);
}

pub fn skipped<T: fmt::Display>(msg: T) {
    println!("{} {}", paint(Colour::Purple, ICON_SKIP), msg);
}
