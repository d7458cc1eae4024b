//! Dependency graph validation.
//!
//! Walks every descriptor's requirements (through the
//! [`DependencyResolver`]) before anything is constructed:
//! - every requirement must resolve
//! - no component may reach itself again
//!
//! The walk is an iterative depth-first search with an explicit path stack,
//! so graph depth never turns into call-stack depth. A node is *unvisited*,
//! *on the current path* or *resolved*; meeting a node that is on the path
//! means the path from that node to the current one is a cycle.

use std::collections::HashMap;

use sandiq_support::rendering::render_chain;
use tracing::{debug, instrument, warn};

use crate::descriptor::ComponentDescriptor;
use crate::error::{CircularDependencyError, CycleParticipant, Result, SandiqError};
use crate::registry::DescriptorRegistry;
use crate::resolver::DependencyResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    OnPath,
    Resolved,
}

struct Frame<'r> {
    descriptor: &'r ComponentDescriptor,
    next_dependency: usize,
}

/// Validates a descriptor graph for resolvability and cycles.
///
/// Any edge can close a cycle, whether it was resolved by qualifier, name,
/// type or primary.
///
/// # Examples
/// ```
/// use sandiq_container::prelude::*;
///
/// struct A;
/// struct B;
///
/// let mut registry = DescriptorRegistry::new();
/// registry.register_descriptor(
///     ComponentDescriptor::of::<A>("a").depends_on(DependencyRequirement::of::<B>()),
/// ).unwrap();
/// registry.register_descriptor(
///     ComponentDescriptor::of::<B>("b").depends_on(DependencyRequirement::of::<A>()),
/// ).unwrap();
///
/// match CycleValidator::validate_all(&registry) {
///     Err(SandiqError::CircularDependency(err)) => assert_eq!(err.names(), vec!["a", "b"]),
///     other => panic!("expected a cycle, got {other:?}"),
/// }
/// ```
pub struct CycleValidator<'r> {
    resolver: DependencyResolver<'r>,
    state: HashMap<&'r str, Visit>,
    order: Vec<&'r str>,
}

impl<'r> CycleValidator<'r> {
    pub fn new(registry: &'r DescriptorRegistry) -> Self {
        Self {
            resolver: DependencyResolver::new(registry),
            state: HashMap::with_capacity(registry.len()),
            order: Vec::with_capacity(registry.len()),
        }
    }

    /// Validates every descriptor in `registry`.
    ///
    /// # Errors
    /// - [`SandiqError::CircularDependency`]: cycle detected
    /// - whatever the resolver reports for an unresolvable requirement
    pub fn validate_all(registry: &'r DescriptorRegistry) -> Result<()> {
        Self::new(registry).validate().map(|_| ())
    }

    /// Validates the whole graph and returns component names in dependency
    /// order: every component appears after all of its dependencies.
    #[instrument(skip(self), name = "cycle_validation")]
    pub fn validate(&mut self) -> Result<Vec<&'r str>> {
        let registry = self.resolver.registry();
        debug!(components = registry.len(), "Starting dependency graph validation");

        for descriptor in registry.all() {
            self.visit(descriptor)?;
        }

        debug!("Dependency graph validation passed");
        Ok(std::mem::take(&mut self.order))
    }

    /// Validates only the part of the graph reachable from `name`.
    pub fn validate_from(&mut self, name: &str) -> Result<Vec<&'r str>> {
        let descriptor = self.resolver.registry().get(name)?;
        self.visit(descriptor)?;
        Ok(std::mem::take(&mut self.order))
    }

    fn visit(&mut self, root: &'r ComponentDescriptor) -> Result<()> {
        if self.state.contains_key(root.name()) {
            return Ok(());
        }

        let mut path: Vec<Frame<'r>> = Vec::new();
        self.enter(root, &mut path);

        while let Some(frame) = path.last_mut() {
            let descriptor = frame.descriptor;
            let Some(requirement) = descriptor.dependencies().get(frame.next_dependency) else {
                // every dependency processed cleanly
                self.state.insert(descriptor.name(), Visit::Resolved);
                self.order.push(descriptor.name());
                path.pop();
                continue;
            };
            frame.next_dependency += 1;

            let dependency = self.resolver.resolve_for(Some(descriptor.name()), requirement)?;
            match self.state.get(dependency.name()) {
                Some(Visit::Resolved) => {}
                Some(Visit::OnPath) => return Err(cycle_error(&path, dependency)),
                None => self.enter(dependency, &mut path),
            }
        }

        Ok(())
    }

    fn enter(&mut self, descriptor: &'r ComponentDescriptor, path: &mut Vec<Frame<'r>>) {
        self.state.insert(descriptor.name(), Visit::OnPath);
        path.push(Frame {
            descriptor,
            next_dependency: 0,
        });
    }
}

/// Builds the error for re-entering `reentered`, which is on `path`.
///
/// Only the sub-path from `reentered` onwards is the cycle.
fn cycle_error(path: &[Frame<'_>], reentered: &ComponentDescriptor) -> SandiqError {
    let start = path
        .iter()
        .position(|frame| frame.descriptor.name() == reentered.name())
        .unwrap_or(0);

    let participants: Vec<CycleParticipant> = path[start..]
        .iter()
        .map(|frame| CycleParticipant {
            name: frame.descriptor.name().to_string(),
            type_key: frame.descriptor.type_key(),
            source: frame.descriptor.source(),
        })
        .collect();

    let mut chain: Vec<&str> = participants.iter().map(|p| p.name.as_str()).collect();
    chain.push(reentered.name());
    warn!(cycle = %render_chain(&chain), "Circular dependency detected");

    SandiqError::CircularDependency(CircularDependencyError { participants })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DependencyRequirement;
    use crate::error::Unresolved;
    use crate::key::TypeKey;

    // all nodes share one type; edges are qualified, so names drive the graph
    struct Node;

    fn node(name: &str, deps: &[&str]) -> ComponentDescriptor {
        deps.iter().fold(ComponentDescriptor::of::<Node>(name), |d, dep| {
            d.depends_on(DependencyRequirement::qualified::<Node>(*dep))
        })
    }

    fn registry(descriptors: Vec<ComponentDescriptor>) -> DescriptorRegistry {
        let mut reg = DescriptorRegistry::new();
        for d in descriptors {
            reg.register_descriptor(d).unwrap();
        }
        reg
    }

    fn cycle_of(reg: &DescriptorRegistry) -> Vec<String> {
        match CycleValidator::validate_all(reg) {
            Err(SandiqError::CircularDependency(err)) => {
                err.participants.into_iter().map(|p| p.name).collect()
            }
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }
    }

    fn sorted(mut names: Vec<String>) -> Vec<String> {
        names.sort();
        names
    }

    #[test]
    fn valid_simple_graph() {
        let reg = registry(vec![
            node("database", &[]),
            node("repo", &["database"]),
            node("service", &["repo"]),
        ]);

        let mut validator = CycleValidator::new(&reg);
        assert_eq!(validator.validate().unwrap(), vec!["database", "repo", "service"]);
    }

    #[test]
    fn detect_three_node_cycle() {
        let reg = registry(vec![node("a", &["b"]), node("b", &["c"]), node("c", &["a"])]);
        assert_eq!(cycle_of(&reg), vec!["a", "b", "c"]);
    }

    #[test]
    fn cycle_reported_the_same_from_any_entry_point() {
        // "0-entry" sorts first and enters the cycle at c
        let reg = registry(vec![
            node("a", &["b"]),
            node("b", &["c"]),
            node("c", &["a"]),
            node("0-entry", &["c"]),
        ]);
        let cycle = cycle_of(&reg);
        assert_eq!(cycle, vec!["c", "a", "b"]);
        assert_eq!(sorted(cycle), vec!["a", "b", "c"]);
    }

    #[test]
    fn cycle_excludes_the_lead_in_path() {
        let reg = registry(vec![
            node("a", &["b"]),
            node("b", &["c"]),
            node("c", &["d"]),
            node("d", &["b"]),
        ]);
        assert_eq!(cycle_of(&reg), vec!["b", "c", "d"]);
    }

    #[test]
    fn detect_self_dependency() {
        let reg = registry(vec![node("a", &["a"])]);
        assert_eq!(cycle_of(&reg), vec!["a"]);
    }

    #[test]
    fn cycle_through_type_and_primary_edges() {
        trait Port {}
        struct Adapter;
        struct Service;

        let reg = registry(vec![
            ComponentDescriptor::of::<Adapter>("adapter")
                .assignable_to(TypeKey::of::<dyn Port>())
                .primary()
                .depends_on(DependencyRequirement::of::<Service>()),
            ComponentDescriptor::of::<Adapter>("fallback").assignable_to(TypeKey::of::<dyn Port>()),
            ComponentDescriptor::of::<Service>("service").depends_on(DependencyRequirement::of::<dyn Port>()),
        ]);

        assert_eq!(sorted(cycle_of(&reg)), vec!["adapter", "service"]);
    }

    #[test]
    fn participants_carry_declaration_sites() {
        let reg = registry(vec![node("a", &["b"]), node("b", &["a"])]);
        match CycleValidator::validate_all(&reg) {
            Err(SandiqError::CircularDependency(err)) => {
                assert!(err.participants.iter().all(|p| p.source.is_some()));
                assert!(err.to_string().contains("graph.rs"));
            }
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }
    }

    #[test]
    fn detect_missing_dependency() {
        let reg = registry(vec![node("a", &["b"])]);

        match CycleValidator::validate_all(&reg) {
            Err(SandiqError::DependencyNotResolved(err)) => {
                assert_eq!(err.reason, Unresolved::UnknownQualifier("b".into()));
                assert_eq!(err.required_by.as_deref(), Some("a"));
            }
            other => panic!("Expected DependencyNotResolved, got: {other:?}"),
        }
    }

    #[test]
    fn ambiguous_interface_fails_validation() {
        trait Driver {}
        struct D1;
        struct D2;
        struct Consumer;

        let reg = registry(vec![
            ComponentDescriptor::of::<D1>("d1").assignable_to(TypeKey::of::<dyn Driver>()),
            ComponentDescriptor::of::<D2>("d2").assignable_to(TypeKey::of::<dyn Driver>()),
            ComponentDescriptor::of::<Consumer>("consumer")
                .depends_on(DependencyRequirement::of::<dyn Driver>()),
        ]);

        assert!(matches!(
            CycleValidator::validate_all(&reg),
            Err(SandiqError::DependencyNotResolved(_))
        ));
    }

    #[test]
    fn diamond_dependency_ok() {
        //     a
        //    / \
        //   b   c
        //    \ /
        //     d
        let reg = registry(vec![
            node("a", &["b", "c"]),
            node("b", &["d"]),
            node("c", &["d"]),
            node("d", &[]),
        ]);

        let order = CycleValidator::new(&reg).validate().unwrap();
        assert_eq!(order, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn order_puts_dependencies_first() {
        let reg = registry(vec![
            node("api", &["service", "config"]),
            node("config", &[]),
            node("service", &["repo", "config"]),
            node("repo", &["config"]),
        ]);

        let order = CycleValidator::new(&reg).validate().unwrap();
        let pos = |n: &str| order.iter().position(|o| *o == n).unwrap();
        assert_eq!(order.len(), 4);
        assert!(pos("config") < pos("repo"));
        assert!(pos("repo") < pos("service"));
        assert!(pos("service") < pos("api"));
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        // n00000 -> n00001 -> ... -> n19999, entered from the top
        let names: Vec<String> = (0..20_000).map(|i| format!("n{i:05}")).collect();
        let mut descriptors: Vec<ComponentDescriptor> = names
            .windows(2)
            .map(|pair| node(&pair[0], &[pair[1].as_str()]))
            .collect();
        descriptors.push(node(&names[names.len() - 1], &[]));
        let reg = registry(descriptors);

        let order = CycleValidator::new(&reg).validate().unwrap();
        assert_eq!(order.len(), names.len());
        assert_eq!(order[0], "n19999");
        assert_eq!(order[order.len() - 1], "n00000");
    }

    #[test]
    fn validate_from_only_walks_reachable_part() {
        let reg = registry(vec![
            node("a", &["b"]),
            node("b", &[]),
            node("x", &["y"]),
            node("y", &["x"]),
        ]);

        let mut validator = CycleValidator::new(&reg);
        assert_eq!(validator.validate_from("a").unwrap(), vec!["b", "a"]);
        assert!(matches!(
            CycleValidator::new(&reg).validate_from("x"),
            Err(SandiqError::CircularDependency(_))
        ));
        assert!(matches!(
            CycleValidator::new(&reg).validate_from("nope"),
            Err(SandiqError::NotFound(_))
        ));
    }
}
