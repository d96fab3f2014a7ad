//! Cycle-safe depth-first enumeration of ownership chains.
//!
//! The walk goes owner-ward: from an entity to the sources of its incoming
//! relationships, using an explicit stack of frames so path depth is bounded
//! by the heap rather than the thread stack. The walk tracks the entities on
//! the current path; an owner already on that path is never expanded again,
//! so each path is simple and the walk terminates on any finite graph. The
//! guard is path-scoped, not global: the same entity may sit on many
//! independent paths (diamonds).

use std::collections::HashSet;

use crate::graph::{ChainRelationship, GraphStore};
use crate::model::{EntityId, Relationship};
use crate::{OwnregError, Result};

/// What ends a successful path.
#[derive(Clone, Copy)]
enum Terminal<'a> {
    /// An owner with no owners of its own.
    UltimateSource,
    /// A specific owner; walking continues past it.
    Entity(&'a EntityId),
}

/// Unvisited incoming relationships of one entity on the current path.
type Frame = std::vec::IntoIter<Relationship>;

/// Mutable state of one top-level query.
struct Walk<'a> {
    start: &'a EntityId,
    terminal: Terminal<'a>,
    /// Entities on the current path, `start` first.
    path: Vec<EntityId>,
    on_path: HashSet<EntityId>,
    /// Edges on the current path, in walk order.
    edges: Vec<Relationship>,
    results: Vec<ChainRelationship>,
    max_results: usize,
}

impl Walk<'_> {
    fn emit(&mut self, owner: &EntityId, intermediates_end: usize) -> Result<()> {
        if self.max_results > 0 && self.results.len() >= self.max_results {
            log::warn!(
                "Chain query from {} exceeded {} results, aborting",
                self.start,
                self.max_results
            );
            return Err(OwnregError::ResultLimitExceeded(self.max_results));
        }
        let chain = ChainRelationship::from_path(
            self.start,
            owner,
            &self.path[1..intermediates_end],
            &self.edges,
        )?;
        self.results.push(chain);
        Ok(())
    }
}

/// Finds ultimate owners and ownership paths over a [`GraphStore`].
///
/// Edges are fetched lazily, one entity at a time. Queries share no state,
/// so one finder can serve any number of independent calls.
pub struct PathFinder<S> {
    store: S,
    max_results: usize,
}

impl<S: GraphStore> PathFinder<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_results: 0,
        }
    }

    /// Abort a query with [`OwnregError::ResultLimitExceeded`] once it would
    /// return more than `max_results` chains. `0` disables the limit.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every chain from `start` up to an owner that has no owner itself.
    ///
    /// An entity with no incoming relationships has no ultimate source, and
    /// a branch that only loops back onto its own path yields nothing.
    pub fn find_ultimate_sources(&self, start: &EntityId) -> Result<Vec<ChainRelationship>> {
        ensure_present(start, "start")?;
        log::debug!("Finding ultimate sources of {}", start);

        let results = self.run(start, Terminal::UltimateSource)?;

        log::debug!("Found {} ultimate source chain(s) for {}", results.len(), start);
        Ok(results)
    }

    /// Every distinct chain of edges from `start` up to `target`.
    ///
    /// Reaching `target` does not stop the walk: a cycle through `target`
    /// produces one further, longer chain that re-enters it.
    pub fn find_paths_to(
        &self,
        start: &EntityId,
        target: &EntityId,
    ) -> Result<Vec<ChainRelationship>> {
        ensure_present(start, "start")?;
        ensure_present(target, "target")?;
        log::debug!("Finding ownership paths from {} to {}", start, target);

        let results = self.run(start, Terminal::Entity(target))?;

        log::debug!(
            "Found {} path(s) from {} to {}",
            results.len(),
            start,
            target
        );
        Ok(results)
    }

    fn run(&self, start: &EntityId, terminal: Terminal<'_>) -> Result<Vec<ChainRelationship>> {
        let mut walk = Walk {
            start,
            terminal,
            path: vec![start.clone()],
            on_path: HashSet::from([start.clone()]),
            edges: Vec::new(),
            results: Vec::new(),
            max_results: self.max_results,
        };
        let mut stack = vec![self.enter(&mut walk)?];

        loop {
            let next = match stack.last_mut() {
                Some(frame) => frame.next(),
                None => break,
            };
            let Some(relationship) = next else {
                // frame exhausted: step back off its entity and the edge that led there
                stack.pop();
                if let Some(entity) = walk.path.pop() {
                    walk.on_path.remove(&entity);
                }
                walk.edges.pop();
                continue;
            };

            let owner = relationship.source.clone();
            walk.edges.push(relationship);

            if let Terminal::Entity(target) = walk.terminal {
                if &owner == target {
                    let end = walk.path.len();
                    walk.emit(&owner, end)?;
                }
            }

            if walk.on_path.contains(&owner) {
                log::trace!(
                    "Cycle at {} while walking from {}, abandoning branch",
                    owner,
                    walk.start
                );
                walk.edges.pop();
            } else {
                walk.on_path.insert(owner.clone());
                walk.path.push(owner);
                stack.push(self.enter(&mut walk)?);
            }
        }

        Ok(walk.results)
    }

    /// Fetch the owners of the last entity on `walk.path`.
    fn enter(&self, walk: &mut Walk<'_>) -> Result<Frame> {
        let current = match walk.path.last() {
            Some(entity) => entity.clone(),
            None => return Ok(Vec::new().into_iter()),
        };
        let incoming = self.store.incoming_relationships(&current)?;

        if incoming.is_empty()
            && matches!(walk.terminal, Terminal::UltimateSource)
            && !walk.edges.is_empty()
        {
            let end = walk.path.len() - 1;
            walk.emit(&current, end)?;
        }

        Ok(incoming.into_iter())
    }
}

fn ensure_present(id: &EntityId, role: &str) -> Result<()> {
    if id.is_blank() {
        return Err(OwnregError::InvalidArgument(format!(
            "{} entity id must not be blank",
            role
        )));
    }
    Ok(())
}
