//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print one matched segment.
    pub fn matched_segment(rank: usize, dimension: &str, score: f32, range: &str, text: &str) {
        println!(
            "  {} {} {} (score: {:.2}, {})",
            style(format!("{:>2}.", rank)).dim(),
            style(dimension).bold(),
            style(range).cyan(),
            score,
            text_preview(text, 80)
        );
    }

    /// Create a progress bar.
    pub fn progress_bar(len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message(msg.to_string());
        pb
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format a time range in seconds as mm:ss-mm:ss.
pub fn format_range(start: f64, end: f64) -> String {
    format!("{}-{}", format_timestamp(start), format_timestamp(end))
}

fn format_timestamp(seconds: f64) -> String {
    let total = seconds as u32;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Truncate text to at most `max_len` characters with ellipsis.
///
/// Cuts on a character boundary, so multibyte transcript text never
/// lands mid-character.
fn text_preview(text: &str, max_len: usize) -> String {
    let text = text.replace('\n', " ");
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_range() {
        assert_eq!(format_range(0.0, 65.4), "00:00-01:05");
        assert_eq!(format_range(125.0, 130.9), "02:05-02:10");
    }

    #[test]
    fn test_text_preview_truncates() {
        assert_eq!(text_preview("short", 80), "short");
        let long = "x".repeat(100);
        assert_eq!(text_preview(&long, 10), format!("{}...", "x".repeat(10)));
    }

    #[test]
    fn test_text_preview_multibyte_cuts_on_char_boundary() {
        let text = "这款手机非常耐摔".repeat(5);
        let preview = text_preview(&text, 10);
        let expected: String = text.chars().take(10).collect();
        assert_eq!(preview, format!("{}...", expected));

        // Shorter than the limit comes back whole
        assert_eq!(text_preview("非常耐摔", 80), "非常耐摔");
    }
}
