//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format dependency chains, cycle diagrams,
//! type names and "did you mean?" suggestions in error output.

use std::fmt::Write as _;

/// Renders a dependency chain on a single line.
///
/// # Examples
/// ```
/// use sandiq_support::rendering::render_chain;
///
/// let chain = vec!["userService", "userRepo", "database"];
/// assert_eq!(render_chain(&chain), "userService -> userRepo -> database");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// One participant of a dependency cycle, for [`render_cycle_diagram`].
#[derive(Debug, Clone)]
pub struct CycleEntry {
    /// Component name
    pub name: String,
    /// Implementation type name (shortened before display)
    pub type_name: String,
    /// Where the component was declared, if known
    pub location: Option<String>,
}

/// Renders a cycle as an ASCII box diagram.
///
/// The arrow on the first line marks where the cycle closes: the last
/// participant depends on the first one again.
///
/// ```text
/// +------>  a: ServiceA  (declared at src/app.rs:12:5)
/// |         |
/// |         v
/// |         b: ServiceB  (declared at src/app.rs:20:5)
/// |         |
/// +---------+
/// ```
pub fn render_cycle_diagram(entries: &[CycleEntry]) -> String {
    let mut out = String::new();

    for (i, entry) in entries.iter().enumerate() {
        if i == 0 {
            out.push_str("+------>  ");
        } else {
            out.push_str("|         |\n");
            out.push_str("|         v\n");
            out.push_str("|         ");
        }

        let _ = write!(out, "{}: {}", entry.name, shorten_type_name(&entry.type_name));
        if let Some(ref location) = entry.location {
            let _ = write!(out, "  (declared at {location})");
        }
        out.push('\n');
    }

    if !entries.is_empty() {
        out.push_str("|         |\n");
        out.push_str("+---------+");
    }

    out
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use sandiq_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("my_app::services::UserService"), "UserService");
/// assert_eq!(
///     shorten_type_name("dyn my_app::ports::Repository + Send + Sync"),
///     "dyn Repository + Send + Sync"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut segment = String::new();
    let mut chars = full_name.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                // path prefix, keep only the last segment
                segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                result.push_str(&segment);
                result.push(ch);
                segment.clear();
            }
            _ => segment.push(ch),
        }
    }

    result.push_str(&segment);
    result
}

/// How close a suggestion is; later variants always rank higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Closeness {
    /// Length of the shared prefix.
    Prefix(usize),
    Contains,
}

/// Suggests registered names close to `requested`, best match first.
///
/// Scoring: case-insensitive containment beats a shared prefix, and a
/// shared prefix needs at least three characters to count.
///
/// ```
/// use sandiq_support::rendering::suggest_similar;
///
/// let available = ["userService", "userRepository", "mailer"];
/// let suggestions = suggest_similar("userServise", &available, 2);
/// assert_eq!(suggestions.first().map(String::as_str), Some("userService"));
/// ```
pub fn suggest_similar(
    requested: &str,
    available: &[impl AsRef<str>],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();

    let mut scored: Vec<(&str, Closeness)> = available
        .iter()
        .map(|name| -> &str { name.as_ref() })
        .filter(|name| *name != requested)
        .filter_map(|name| {
            let name_lower = name.to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, Closeness::Contains));
            }

            let common = name_lower
                .chars()
                .zip(requested_lower.chars())
                .take_while(|(a, b)| a == b)
                .count();

            (common >= 3).then_some((name, Closeness::Prefix(common)))
        })
        .collect();

    // stable on equal scores: keep the caller's order
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, type_name: &str, location: Option<&str>) -> CycleEntry {
        CycleEntry {
            name: name.to_string(),
            type_name: type_name.to_string(),
            location: location.map(str::to_string),
        }
    }

    #[test]
    fn render_simple_chain() {
        assert_eq!(render_chain(&["a", "b", "c", "a"]), "a -> b -> c -> a");
    }

    #[test]
    fn render_single_element_chain() {
        assert_eq!(render_chain(&["a"]), "a");
    }

    #[test]
    fn render_empty_chain() {
        let chain: Vec<&str> = vec![];
        assert_eq!(render_chain(&chain), "");
    }

    #[test]
    fn cycle_diagram_lists_every_participant_in_order() {
        let rendered = render_cycle_diagram(&[
            entry("a", "app::ServiceA", Some("src/app.rs:1:1")),
            entry("b", "app::ServiceB", None),
            entry("c", "app::ServiceC", None),
        ]);

        let a = rendered.find("a: ServiceA").unwrap();
        let b = rendered.find("b: ServiceB").unwrap();
        let c = rendered.find("c: ServiceC").unwrap();
        assert!(a < b && b < c);
        assert!(rendered.contains("(declared at src/app.rs:1:1)"));
        assert!(rendered.starts_with("+------>  a"));
        assert!(rendered.ends_with("+---------+"));
        assert!(rendered.is_ascii());
    }

    #[test]
    fn self_cycle_diagram() {
        let rendered = render_cycle_diagram(&[entry("a", "ServiceA", None)]);
        assert_eq!(rendered, "+------>  a: ServiceA\n|         |\n+---------+");
    }

    #[test]
    fn empty_cycle_diagram() {
        assert_eq!(render_cycle_diagram(&[]), "");
    }

    #[test]
    fn shorten_simple_path() {
        assert_eq!(shorten_type_name("my_app::services::UserService"), "UserService");
    }

    #[test]
    fn shorten_with_generics() {
        assert_eq!(
            shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>"),
            "Arc<dyn Logger>"
        );
    }

    #[test]
    fn shorten_no_path() {
        assert_eq!(shorten_type_name("String"), "String");
    }

    #[test]
    fn suggest_similar_names() {
        let available = ["userService", "userRepository", "logger", "database"];
        let suggestions = suggest_similar("userServise", &available, 3);
        assert_eq!(suggestions[0], "userService");
        assert!(!suggestions.iter().any(|s| s == "logger"));
    }

    #[test]
    fn suggest_skips_exact_name() {
        let available = ["mailer"];
        assert!(suggest_similar("mailer", &available, 3).is_empty());
    }

    #[test]
    fn suggest_no_match() {
        let available = ["database"];
        assert!(suggest_similar("xyzAbcDef", &available, 3).is_empty());
    }

    #[test]
    fn suggest_respects_limit() {
        let available = ["userA", "userB", "userC"];
        assert_eq!(suggest_similar("user", &available, 2).len(), 2);
    }

    #[test]
    fn containment_outranks_long_prefix() {
        let available = ["userRepositoryImplOld", "Impl2"];
        let suggestions = suggest_similar("userRepositoryImpl2", &available, 2);
        assert_eq!(suggestions, vec!["Impl2", "userRepositoryImplOld"]);
    }
}
