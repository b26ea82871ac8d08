//! Process-wide run registry.

use crate::swarmserve::context::RunContext;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Maps run identifiers to their [`RunContext`].
///
/// Growth is an explicit, configured policy rather than unbounded: when an
/// insert would exceed `max_retained_runs`, the oldest *completed* contexts
/// are evicted first. In-flight runs are never evicted, so the map can still
/// exceed the cap while enough runs are concurrently active. An evicted
/// run's identifier subsequently reports not-found.
pub struct RunRegistry {
    runs: RwLock<HashMap<String, Arc<RunContext>>>,
    max_retained_runs: usize,
}

impl RunRegistry {
    /// A registry retaining at most `max_retained_runs` contexts
    /// (`0` disables eviction entirely).
    pub fn new(max_retained_runs: usize) -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            max_retained_runs,
        }
    }

    pub fn insert(&self, run_id: String, ctx: Arc<RunContext>) {
        let mut runs = self.runs.write().unwrap();
        if self.max_retained_runs > 0 && runs.len() >= self.max_retained_runs {
            let mut completed: Vec<(String, DateTime<Utc>)> = runs
                .iter()
                .filter(|(_, c)| c.is_done())
                .map(|(id, c)| (id.clone(), c.created_at()))
                .collect();
            completed.sort_by_key(|(_, created)| *created);
            let excess = runs.len() + 1 - self.max_retained_runs;
            for (id, _) in completed.into_iter().take(excess) {
                runs.remove(&id);
            }
        }
        runs.insert(run_id, ctx);
    }

    pub fn get(&self, run_id: &str) -> Option<Arc<RunContext>> {
        self.runs.read().unwrap().get(run_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.runs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.read().unwrap().is_empty()
    }
}
