use colored::*;
use serde_json::Value;

pub struct OutputStyle;

impl OutputStyle {
    pub fn link(text: &str) -> ColoredString {
        text.bright_cyan().underline()
    }

    pub fn value(text: &str) -> ColoredString {
        text.bright_green()
    }

    pub fn title(text: &str) -> ColoredString {
        text.bright_blue().bold()
    }

    pub fn label(text: &str) -> ColoredString {
        text.cyan()
    }

    pub fn success(text: &str) -> ColoredString {
        text.green()
    }

    pub fn error(text: &str) -> ColoredString {
        text.red()
    }

    pub fn warning(text: &str) -> ColoredString {
        text.yellow()
    }

    pub fn muted(text: &str) -> ColoredString {
        text.dimmed()
    }

    pub fn header_separator() -> String {
        "═".repeat(50)
    }

    pub fn print_header(title: &str) {
        println!("{}", Self::title(title));
        println!("{}", Self::header_separator());
    }

    pub fn print_field(label: &str, value: &str) {
        println!("{:>12}: {}", Self::label(label), Self::value(value));
    }
}

pub fn print_links(links: &[String]) {
    if links.is_empty() {
        println!("{}", OutputStyle::muted("No concert links stored."));
        return;
    }

    OutputStyle::print_header(&format!("🎵 Concert links ({})", links.len()));
    for (index, link) in links.iter().enumerate() {
        println!("{:>4}. {}", index, OutputStyle::link(link));
    }
}

/// Pretty-print a raw JSON value, or a muted marker for an absent path.
pub fn print_json(path: &str, value: Option<&Value>) {
    match value {
        Some(value) => {
            let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            println!("{}", rendered);
        }
        None => {
            let msg = format!("No data at '{}'", path);
            println!("{}", OutputStyle::muted(&msg));
        }
    }
}

pub fn print_warning(message: &str) {
    println!("⚠️  {}", OutputStyle::warning(message));
}

pub fn print_success(message: &str) {
    println!("✅ {}", OutputStyle::success(message));
}
