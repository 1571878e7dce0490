//! Named counting semaphores for workflow concurrency groups.
//!
//! Capacity is fixed the first time a group name is seen within an
//! invocation; declaring different capacities for the same group across
//! workflows is an authoring bug and the first declaration wins. A
//! capacity of 0 means unlimited.

use crate::cancel::CancelToken;
use anyhow::{Result, bail};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

struct Group {
    capacity: u32,
    in_use: Mutex<u32>,
    freed: Condvar,
}

/// Registry of semaphores, keyed by `concurrency.group`.
#[derive(Default)]
pub struct ConcurrencyGroups {
    groups: Mutex<HashMap<String, Arc<Group>>>,
}

/// Holds one slot of a group; released on drop.
pub struct GroupGuard {
    group: Option<Arc<Group>>,
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if let Some(group) = self.group.take() {
            let mut in_use = group.in_use.lock().expect("group lock poisoned");
            *in_use = in_use.saturating_sub(1);
            group.freed.notify_one();
        }
    }
}

impl ConcurrencyGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until a slot in `name` frees up, or the token cancels.
    pub fn acquire(
        &self,
        name: &str,
        capacity: u32,
        cancel: &CancelToken,
    ) -> Result<GroupGuard> {
        let group = {
            let mut groups = self.groups.lock().expect("registry lock poisoned");
            groups
                .entry(name.to_string())
                .or_insert_with(|| {
                    Arc::new(Group {
                        capacity,
                        in_use: Mutex::new(0),
                        freed: Condvar::new(),
                    })
                })
                .clone()
        };

        if group.capacity == 0 {
            // Unlimited group: the guard is a no-op.
            return Ok(GroupGuard { group: None });
        }

        let mut in_use = group.in_use.lock().expect("group lock poisoned");
        loop {
            if cancel.is_cancelled() {
                bail!("cancelled while waiting for concurrency group '{name}'");
            }
            if *in_use < group.capacity {
                *in_use += 1;
                drop(in_use);
                return Ok(GroupGuard {
                    group: Some(group.clone()),
                });
            }
            let (guard, _timeout) = group
                .freed
                .wait_timeout(in_use, Duration::from_millis(50))
                .expect("group lock poisoned");
            in_use = guard;
        }
    }
}
