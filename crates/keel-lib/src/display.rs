//! Status output for the CLI
//!
//! Semantic helpers instead of raw `println!`, styled with `console` when
//! stdout supports it. The library core never calls these; only command
//! handlers do.

use console::style;

/// `✓ item: details`
pub fn success(item: &str, details: &str) {
    println!("{} {}", style("✓").green().bold(), join(item, details));
}

/// `✗ item: details`
pub fn error(item: &str, details: &str) {
    println!("{} {}", style("✗").red().bold(), join(item, details));
}

/// `! message`
pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// `· message`
pub fn info(message: &str) {
    println!("{} {}", style("·").cyan(), message);
}

pub fn message(text: &str) {
    println!("{text}");
}

pub fn subtle(text: &str) {
    println!("{}", style(text).dim());
}

/// Blank line, then an emphasized title
pub fn section(title: &str) {
    println!();
    println!("{}", style(title).bold().underlined());
}

/// Indented `key: 'value'` line
pub fn key_value(key: &str, value: &str) {
    println!("  {} {}: '{}'", style("-").dim(), key, value);
}

pub fn list(items: &[&str]) {
    for item in items {
        println!("  {} {}", style("•").dim(), item);
    }
}

fn join(item: &str, details: &str) -> String {
    if details.is_empty() {
        item.to_string()
    } else {
        format!("{item}: {details}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_omits_empty_details() {
        assert_eq!(join("store", ""), "store");
        assert_eq!(join("store", "local"), "store: local");
    }
}
