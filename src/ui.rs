use colored::Colorize;

/// Width of the framed section banners
const BANNER_WIDTH: usize = 72;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a framed section banner
pub fn banner(title: &str) {
    let [top, middle, bottom] = banner_lines(title);
    println!("{}", top.dimmed());
    println!("{}", middle.cyan().bold());
    println!("{}", bottom.dimmed());
}

/// The three lines of a framed banner, title centred between `--` marks
pub fn banner_lines(title: &str) -> [String; 3] {
    let rule = "-".repeat(BANNER_WIDTH);
    let label = format!("- {} -", title.to_uppercase());
    let inner = BANNER_WIDTH.saturating_sub(4);
    let padding = inner.saturating_sub(label.chars().count());
    let left = padding / 2;
    let right = padding - left;
    let middle = format!("--{}{}{}--", " ".repeat(left), label, " ".repeat(right));
    [rule.clone(), middle, rule]
}

/// Pluralize a noun for a count
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_lines_width() {
        let [top, middle, bottom] = banner_lines("topics to create");
        assert_eq!(top.len(), BANNER_WIDTH);
        assert_eq!(bottom, top);
        assert_eq!(middle.len(), BANNER_WIDTH);
        assert!(middle.starts_with("--"));
        assert!(middle.ends_with("--"));
        assert!(middle.contains("- TOPICS TO CREATE -"));
    }

    #[test]
    fn test_banner_lines_centered() {
        let [_, middle, _] = banner_lines("ab");
        let label_start = middle.find("- AB -").unwrap();
        let label_end = label_start + "- AB -".len();
        let left = label_start - 2;
        let right = middle.len() - 2 - label_end;
        assert!(left.abs_diff(right) <= 1);
    }

    #[test]
    fn test_banner_long_title_is_not_truncated() {
        let title = "x".repeat(100);
        let [_, middle, _] = banner_lines(&title);
        assert!(middle.contains(&title.to_uppercase()));
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "topic"), "1 topic");
        assert_eq!(plural(0, "topic"), "0 topics");
        assert_eq!(plural(3, "change"), "3 changes");
    }
}
