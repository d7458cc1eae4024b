//! Error types for Sandiq container operations.
//!
//! Every error names the offending component(s) and type(s); cycle errors
//! carry the participants with their declaration sites and render a diagram.

use std::fmt;

use sandiq_support::naming::NameProblem;
use sandiq_support::rendering::{CycleEntry, render_chain, render_cycle_diagram};

use crate::descriptor::{BoxError, DependencyRequirement, SourceLocation};
use crate::key::TypeKey;

/// Main error type for all Sandiq operations.
#[derive(Debug, thiserror::Error)]
pub enum SandiqError {
    /// Name already used by a descriptor or an alias.
    #[error("{}", .0)]
    DuplicateDescriptor(DuplicateDescriptorError),

    /// No descriptor, alias or instance under the requested name or type.
    #[error("{}", .0)]
    NotFound(NotFoundError),

    /// A qualified or typed lookup hit a component of the wrong type.
    #[error("{}", .0)]
    MismatchedType(MismatchedTypeError),

    /// A requirement has no candidate, or too many.
    #[error("{}", .0)]
    DependencyNotResolved(DependencyNotResolvedError),

    /// The descriptor graph contains a cycle.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// Blank name, or one containing whitespace/control characters.
    #[error("{}", .0)]
    InvalidName(InvalidNameError),

    /// An instantiable component declares an interface it cannot be cast to.
    #[error("{}", .0)]
    MissingCast(MissingCastError),

    /// The component's factory failed, or there is no factory.
    #[error("Failed to create component {name:?}: {source}")]
    InstanceCreation {
        name: String,
        #[source]
        source: BoxError,
    },
}

/// What a duplicate name collided with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameConflict {
    /// A registered descriptor already has this name.
    Descriptor,
    /// This name is already an alias for `target`.
    Alias { target: String },
}

/// Error when a name is registered twice.
#[derive(Debug)]
pub struct DuplicateDescriptorError {
    pub name: String,
    pub conflict: NameConflict,
}

impl fmt::Display for DuplicateDescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.conflict {
            NameConflict::Descriptor => write!(
                f,
                "Duplicate component name {:?}: a component with this name is already registered",
                self.name
            )?,
            NameConflict::Alias { ref target } => write!(
                f,
                "Duplicate component name {:?}: already used as an alias for {target:?}",
                self.name
            )?,
        }
        write!(f, "\n  Hint: Component names and aliases share one namespace")
    }
}

/// What was looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Name(String),
    Alias(String),
    Type(TypeKey),
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Name(name) => write!(f, "component {name:?}"),
            Lookup::Alias(alias) => write!(f, "alias {alias:?}"),
            Lookup::Type(key) => write!(f, "component of type {key}"),
        }
    }
}

/// Error when a lookup finds nothing.
#[derive(Debug)]
pub struct NotFoundError {
    pub lookup: Lookup,
    /// Registered names close to the requested one ("did you mean?")
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Not found: {}", self.lookup)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }
        Ok(())
    }
}

/// Error when a component's type does not fit where it was asked for.
#[derive(Debug)]
pub struct MismatchedTypeError {
    /// The component that was found
    pub name: String,
    /// What the caller asked for
    pub expected: TypeKey,
    /// What the component is
    pub actual: TypeKey,
    /// The component whose requirement was being resolved, if any
    pub required_by: Option<String>,
}

impl fmt::Display for MismatchedTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type mismatch: component {:?} is {}, which is not assignable to {}",
            self.name, self.actual, self.expected
        )?;
        if let Some(ref consumer) = self.required_by {
            write!(f, "\n  Required by: {consumer:?}")?;
        }
        write!(
            f,
            "\n  Hint: Check the qualifier, or declare the component with .provides()"
        )
    }
}

/// Why a requirement could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// The qualifier names no registered component.
    UnknownQualifier(String),
    /// No component is assignable to the required type.
    NoCandidates,
    /// Several candidates, and not exactly one of them is primary.
    Ambiguous {
        candidates: Vec<String>,
        primaries: Vec<String>,
    },
}

/// Error when a requirement has no unique match.
#[derive(Debug)]
pub struct DependencyNotResolvedError {
    pub requirement: DependencyRequirement,
    pub required_by: Option<String>,
    pub reason: Unresolved,
}

impl fmt::Display for DependencyNotResolvedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unresolved dependency: {}", self.requirement)?;

        if let Some(ref consumer) = self.required_by {
            write!(f, "\n  Required by: {consumer:?}")?;
        }

        match self.reason {
            Unresolved::UnknownQualifier(ref qualifier) => {
                write!(f, "\n  Qualifier {qualifier:?} names no registered component")
            }
            Unresolved::NoCandidates => write!(
                f,
                "\n  No registered component is assignable to {}",
                self.requirement.type_key()
            ),
            Unresolved::Ambiguous {
                ref candidates,
                ref primaries,
            } => {
                write!(f, "\n  Candidates: {}", candidates.join(", "))?;
                if primaries.is_empty() {
                    write!(f, "\n  Hint: Mark one candidate as primary, or add a qualifier")
                } else {
                    write!(
                        f,
                        "\n  Several primaries: {}\n  Hint: Keep a single primary, or add a qualifier",
                        primaries.join(", ")
                    )
                }
            }
        }
    }
}

/// One component taking part in a cycle.
#[derive(Debug, Clone)]
pub struct CycleParticipant {
    pub name: String,
    pub type_key: TypeKey,
    pub source: Option<SourceLocation>,
}

/// Error when the descriptor graph contains a cycle.
///
/// `participants` holds exactly the components on the cycle, in dependency
/// order: each one depends on the next, and the last depends on the first.
#[derive(Debug)]
pub struct CircularDependencyError {
    pub participants: Vec<CycleParticipant>,
}

impl CircularDependencyError {
    /// Participant names in cycle order.
    pub fn names(&self) -> Vec<&str> {
        self.participants.iter().map(|p| p.name.as_str()).collect()
    }
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chain = self.names();
        if let Some(first) = chain.first().copied() {
            chain.push(first);
        }
        writeln!(f, "Circular dependency detected: {}", render_chain(&chain))?;

        let entries: Vec<CycleEntry> = self
            .participants
            .iter()
            .map(|p| CycleEntry {
                name: p.name.clone(),
                type_name: p.type_key.type_name().to_string(),
                location: p.source.map(|s| s.to_string()),
            })
            .collect();
        writeln!(f, "{}", render_cycle_diagram(&entries))?;

        write!(
            f,
            "  Hint: Break the cycle by restructuring the components or moving shared state out"
        )
    }
}

/// Error when a name or alias is not usable.
#[derive(Debug)]
pub struct InvalidNameError {
    pub name: String,
    pub problem: NameProblem,
}

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid component name {:?}: {}", self.name, self.problem)
    }
}

/// Error when a component with a factory is declared assignable to an
/// interface through `assignable_to` alone.
#[derive(Debug)]
pub struct MissingCastError {
    pub name: String,
    pub actual: TypeKey,
    pub interface: TypeKey,
}

impl fmt::Display for MissingCastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Component {:?} ({}) is declared as {} without a cast",
            self.name,
            self.actual.short_name(),
            self.interface
        )?;
        write!(
            f,
            "\n  Hint: Use .provides(|c: Arc<{}>| c as Arc<{}>) instead of .assignable_to()",
            self.actual.short_name(),
            self.interface.short_name()
        )
    }
}

/// Convenient Result type for Sandiq operations.
pub type Result<T> = std::result::Result<T, SandiqError>;

#[cfg(test)]
mod tests {
    use super::*;

    struct ServiceA;
    struct ServiceB;

    #[test]
    fn duplicate_error_display() {
        let err = SandiqError::DuplicateDescriptor(DuplicateDescriptorError {
            name: "db".into(),
            conflict: NameConflict::Alias {
                target: "database".into(),
            },
        });

        let msg = format!("{err}");
        assert!(msg.contains("\"db\""));
        assert!(msg.contains("alias for \"database\""));
    }

    #[test]
    fn not_found_error_display() {
        let err = SandiqError::NotFound(NotFoundError {
            lookup: Lookup::Name("userServise".into()),
            suggestions: vec!["userService".into()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("Not found"));
        assert!(msg.contains("Did you mean"));
        assert!(msg.contains("userService"));
    }

    #[test]
    fn unresolved_ambiguous_display() {
        let err = SandiqError::DependencyNotResolved(DependencyNotResolvedError {
            requirement: DependencyRequirement::of::<ServiceA>(),
            required_by: Some("consumer".into()),
            reason: Unresolved::Ambiguous {
                candidates: vec!["a1".into(), "a2".into()],
                primaries: vec![],
            },
        });

        let msg = format!("{err}");
        assert!(msg.contains("ServiceA"));
        assert!(msg.contains("\"consumer\""));
        assert!(msg.contains("a1, a2"));
        assert!(msg.contains("primary"));
    }

    #[test]
    fn mismatched_type_display() {
        let err = SandiqError::MismatchedType(MismatchedTypeError {
            name: "b".into(),
            expected: TypeKey::of::<ServiceA>(),
            actual: TypeKey::of::<ServiceB>(),
            required_by: None,
        });

        let msg = format!("{err}");
        assert!(msg.contains("Type mismatch"));
        assert!(msg.contains("ServiceA"));
        assert!(msg.contains("ServiceB"));
    }

    #[test]
    fn missing_cast_display() {
        let err = SandiqError::MissingCast(MissingCastError {
            name: "adapter".into(),
            actual: TypeKey::of::<ServiceA>(),
            interface: TypeKey::of::<dyn std::fmt::Debug>(),
        });

        let msg = format!("{err}");
        assert!(msg.contains("\"adapter\""));
        assert!(msg.contains("without a cast"));
        assert!(msg.contains(".provides("));
        assert!(!msg.contains("not assignable"));
    }

    #[test]
    fn circular_dependency_error_display() {
        let err = SandiqError::CircularDependency(CircularDependencyError {
            participants: vec![
                CycleParticipant {
                    name: "a".into(),
                    type_key: TypeKey::of::<ServiceA>(),
                    source: Some(SourceLocation::new("src/app.rs", 10, 5)),
                },
                CycleParticipant {
                    name: "b".into(),
                    type_key: TypeKey::of::<ServiceB>(),
                    source: None,
                },
            ],
        });

        let msg = format!("{err}");
        assert!(msg.contains("Circular"));
        assert!(msg.contains("a -> b -> a"));
        assert!(msg.contains("src/app.rs:10:5"));
        assert!(msg.contains("+---------+"));
    }

    #[test]
    fn instance_creation_keeps_source() {
        use std::error::Error as _;

        let err = SandiqError::InstanceCreation {
            name: "db".into(),
            source: "connection refused".into(),
        };

        assert!(err.to_string().contains("connection refused"));
        assert!(err.source().is_some());
    }
}
