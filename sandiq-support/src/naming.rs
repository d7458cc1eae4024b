//! Component name validation.
//!
//! Component names and aliases are used as map keys, in log fields and in
//! rendered diagnostics, so they must be non-blank and free of whitespace
//! and control characters.

use tracing::trace;

/// Why a component name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameProblem {
    /// The name is empty.
    #[error("name is empty")]
    Empty,

    /// The name contains a whitespace character.
    #[error("name contains whitespace at byte {index}")]
    Whitespace { index: usize },

    /// The name contains a control character.
    #[error("name contains control character {ch:?} at byte {index}")]
    Control { index: usize, ch: char },
}

/// Checks that `name` is usable as a component name or alias.
///
/// # Examples
/// ```
/// use sandiq_support::naming::{check_name, NameProblem};
///
/// assert!(check_name("userService").is_ok());
/// assert_eq!(check_name(""), Err(NameProblem::Empty));
/// assert!(check_name("user service").is_err());
/// ```
pub fn check_name(name: &str) -> Result<(), NameProblem> {
    if name.is_empty() {
        return Err(NameProblem::Empty);
    }

    for (index, ch) in name.char_indices() {
        // Control chars first: '\n' and '\t' are both, report the stronger one.
        if ch.is_control() {
            trace!(name, index, "Rejected name with control character");
            return Err(NameProblem::Control { index, ch });
        }
        if ch.is_whitespace() {
            trace!(name, index, "Rejected name with whitespace");
            return Err(NameProblem::Whitespace { index });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass() {
        assert!(check_name("a").is_ok());
        assert!(check_name("userRepository").is_ok());
        assert!(check_name("http.handler-1").is_ok());
        assert!(check_name("çà_ünïcode").is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        assert_eq!(check_name(""), Err(NameProblem::Empty));
    }

    #[test]
    fn blank_name_rejected() {
        assert_eq!(check_name("   "), Err(NameProblem::Whitespace { index: 0 }));
    }

    #[test]
    fn inner_whitespace_rejected() {
        assert_eq!(
            check_name("user service"),
            Err(NameProblem::Whitespace { index: 4 })
        );
        // non-breaking space
        assert!(check_name("user\u{a0}service").is_err());
    }

    #[test]
    fn control_characters_rejected() {
        assert_eq!(
            check_name("user\nservice"),
            Err(NameProblem::Control { index: 4, ch: '\n' })
        );
        assert!(matches!(
            check_name("\u{7}bell"),
            Err(NameProblem::Control { index: 0, .. })
        ));
    }

    #[test]
    fn problem_display() {
        let msg = NameProblem::Whitespace { index: 3 }.to_string();
        assert!(msg.contains("whitespace"));
        assert!(msg.contains('3'));
    }
}
