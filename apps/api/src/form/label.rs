use once_cell::sync::Lazy;
use regex::Regex;

static CAPITAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z])").expect("valid regex"));

/// Display label for a field key: `jobTitle` → `Job Title`, `first_name` →
/// `First name`. Cosmetic only.
pub fn format_label(key: &str) -> String {
    let spaced = CAPITAL.replace_all(key, " $1").replace('_', " ");
    let trimmed = spaced.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
