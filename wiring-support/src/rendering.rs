//! Text rendering utilities for human-friendly diagnostics.
//!
//! Provides helpers to format resolution paths, type names,
//! "did you mean?" suggestions and verification report sections.

/// Renders a resolution path as a readable string.
///
/// # Examples
/// ```
/// use wiring_support::rendering::render_chain;
///
/// let chain = vec!["OrderService", "OrderRepo", "Database", "OrderService"];
/// let rendered = render_chain(&chain);
/// assert_eq!(rendered, "OrderService → OrderRepo → Database → OrderService");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Renders a titled, bulleted section of a report.
///
/// Empty sections render as nothing so callers can concatenate freely.
///
/// ```
/// use wiring_support::rendering::render_section;
///
/// let out = render_section("Errors", &["missing Database"]);
/// assert_eq!(out, "Errors (1):\n  - missing Database\n");
/// assert_eq!(render_section("Warnings", &Vec::<String>::new()), "");
/// ```
pub fn render_section(title: &str, items: &[impl AsRef<str>]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut out = format!("{title} ({}):\n", items.len());
    for item in items {
        out.push_str(&format!("  - {}\n", item.as_ref()));
    }
    out
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use wiring_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::services::user::UserService");
/// assert_eq!(short, "UserService");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    // "my_app::services::UserService" → "UserService"
    // "Arc<dyn my_app::Logger>" → "Arc<dyn Logger>"
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '&' | '[' | ']' | ';' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => {
                current_segment.push(ch);
            }
        }
    }

    result.push_str(&current_segment);
    result
}

/// Generates "did you mean?" suggestions based on registered type names.
///
/// Candidates are ranked by substring containment first, then by edit
/// distance between the shortened names.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter(|&&name| name != requested)
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            let name_short = shorten_type_name(name).to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 1000));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 800));
            }

            let distance = edit_distance(&name_short, &requested_short);
            let longest = name_short.chars().count().max(requested_short.chars().count());
            // Close enough if at most a third of the characters differ.
            if longest > 0 && distance * 3 <= longest {
                return Some((name, 500 - distance.min(500)));
            }

            None
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Levenshtein distance over characters.
fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}
