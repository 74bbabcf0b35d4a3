//! Redirect edges of one organization, indexed by domain id.
//!
//! Every walk is iterative and bounded by the number of domains plus one, so
//! neither a malicious nor a corrupted graph can recurse or loop forever.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::app_error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
pub struct RedirectGraph {
    edges: HashMap<Uuid, Option<Uuid>>,
}

impl RedirectGraph {
    /// Build from `(domain_id, redirect_to)` pairs of a single organization.
    pub fn from_edges(edges: impl IntoIterator<Item = (Uuid, Option<Uuid>)>) -> Self {
        Self {
            edges: edges.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.edges.contains_key(&id)
    }

    fn hop_limit(&self) -> usize {
        self.edges.len() + 1
    }

    /// Validate pointing `source` at `target`.
    ///
    /// Fails with `NotFound` when either end is outside this organization,
    /// `RedirectCycle` for a self-redirect or when the chain starting at
    /// `target` leads back to `source`, and `CorruptChain` when the existing
    /// chain from `target` already loops without touching `source`.
    pub fn ensure_redirect_allowed(&self, source: Uuid, target: Uuid) -> AppResult<()> {
        if !self.contains(source) || !self.contains(target) {
            return Err(AppError::NotFound);
        }
        if source == target {
            return Err(AppError::RedirectCycle);
        }

        let mut cursor = Some(target);
        for _ in 0..self.hop_limit() {
            match cursor {
                None => return Ok(()),
                Some(id) if id == source => return Err(AppError::RedirectCycle),
                Some(id) => cursor = self.edges.get(&id).copied().flatten(),
            }
        }

        match cursor {
            None => Ok(()),
            Some(_) => Err(AppError::CorruptChain(target)),
        }
    }

    /// Ordered ids from `start` following `redirect_to` to the end of the chain.
    pub fn chain_from(&self, start: Uuid) -> AppResult<Vec<Uuid>> {
        let mut next = *self.edges.get(&start).ok_or(AppError::NotFound)?;
        let mut chain = vec![start];
        let mut seen = HashSet::from([start]);

        while let Some(id) = next {
            // A dangling edge or a revisit means the write path was bypassed.
            if !self.contains(id) || !seen.insert(id) || chain.len() >= self.hop_limit() {
                return Err(AppError::CorruptChain(start));
            }
            chain.push(id);
            next = self.edges.get(&id).copied().flatten();
        }

        Ok(chain)
    }
}
