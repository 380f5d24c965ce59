//! Run-tree operations: execution ordering, child ownership, lifecycle and
//! traversal.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::run::Run;
use super::JsonMap;
use crate::errors::{SchemaError, SchemaResult};

/// Monotonic execution-order allocator for one trace.
///
/// Orders start at 1 and are handed out as runs start.
#[derive(Debug, Clone)]
pub struct ExecutionClock {
    next: u64,
}

impl Default for ExecutionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionClock {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Resume after the highest order already present in `runs`.
    pub fn resume_after(runs: &[Run]) -> Self {
        let highest = runs
            .iter()
            .flat_map(|root| root.walk())
            .map(|(_, run)| run.execution_order)
            .max()
            .unwrap_or(0);
        Self { next: highest + 1 }
    }

    pub fn tick(&mut self) -> u64 {
        let order = self.next;
        self.next += 1;
        order
    }

    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl Run {
    pub fn is_root(&self) -> bool {
        self.base.parent_run_id.is_none()
    }

    pub fn is_closed(&self) -> bool {
        self.base.end_time.is_some()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.base.end_time.map(|end| end - self.base.start_time)
    }

    /// Closes the run now with `outputs`.
    pub fn end(&mut self, outputs: JsonMap) -> SchemaResult<()> {
        self.end_at(Utc::now(), outputs)
    }

    pub fn end_at(&mut self, end_time: DateTime<Utc>, outputs: JsonMap) -> SchemaResult<()> {
        self.close(end_time)?;
        self.base.outputs = Some(outputs);
        Ok(())
    }

    /// Closes the run now with an error.
    pub fn fail(&mut self, error: impl Into<String>) -> SchemaResult<()> {
        self.fail_at(Utc::now(), error)
    }

    pub fn fail_at(&mut self, end_time: DateTime<Utc>, error: impl Into<String>) -> SchemaResult<()> {
        self.close(end_time)?;
        self.base.error = Some(error.into());
        Ok(())
    }

    fn close(&mut self, end_time: DateTime<Utc>) -> SchemaResult<()> {
        if self.is_closed() {
            return Err(SchemaError::AlreadyClosed {
                id: self.base.id.to_string(),
            });
        }
        if end_time < self.base.start_time {
            return Err(SchemaError::EndBeforeStart {
                start: self.base.start_time.to_rfc3339(),
                end: end_time.to_rfc3339(),
            });
        }
        self.base.end_time = Some(end_time);
        Ok(())
    }

    /// Takes ownership of `child`, keeping `child_runs` in execution order.
    ///
    /// The child's `parent_run_id` is pointed at this run and this run's
    /// `child_execution_order` is raised to cover the child's subtree.
    pub fn add_child(&mut self, mut child: Run) -> &mut Run {
        child.base.parent_run_id = Some(self.base.id);
        self.child_execution_order = self
            .child_execution_order
            .max(child.execution_order)
            .max(child.child_execution_order);

        let pos = self
            .child_runs
            .partition_point(|sibling| sibling.execution_order <= child.execution_order);
        self.child_runs.insert(pos, child);
        &mut self.child_runs[pos]
    }

    /// Recomputes `child_execution_order` bottom-up and returns this run's
    /// value. Needed after children were added below a direct child.
    pub fn refresh_child_execution_order(&mut self) -> u64 {
        let mut highest = self.execution_order.max(self.child_execution_order);
        for child in &mut self.child_runs {
            highest = highest.max(child.refresh_child_execution_order());
        }
        self.child_execution_order = highest;
        highest
    }

    /// Depth-first, pre-order traversal of this run and its descendants.
    /// The root is yielded at depth 0.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, self)],
        }
    }

    pub fn find(&self, id: Uuid) -> Option<&Run> {
        self.walk().map(|(_, run)| run).find(|run| run.base.id == id)
    }

    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut Run> {
        if self.base.id == id {
            return Some(self);
        }
        self.child_runs
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }

    /// Number of runs in this subtree, including this one.
    pub fn run_count(&self) -> usize {
        self.walk().count()
    }
}

pub struct Walk<'a> {
    stack: Vec<(usize, &'a Run)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Run);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, run) = self.stack.pop()?;
        self.stack
            .extend(run.child_runs.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, run))
    }
}
