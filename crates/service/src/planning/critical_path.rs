//! Longest-duration path through a project's task dependency graph.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Copy, Debug)]
pub struct TaskNode {
    pub id: Uuid,
    pub duration_days: i32,
}

/// `task_id` cannot start before `depends_on` is finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub task_id: Uuid,
    pub depends_on: Uuid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TaskSchedule {
    pub task_id: Uuid,
    pub earliest_start: i64,
    pub earliest_finish: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CriticalPath {
    /// First task to last.
    pub task_ids: Vec<Uuid>,
    pub total_duration_days: i64,
    /// Every task, in input order.
    pub schedule: Vec<TaskSchedule>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanError {
    /// The dependencies loop back through these tasks.
    Cycle(Vec<Uuid>),
    UnknownTask(Uuid),
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanError::Cycle(ids) => write!(f, "dependency cycle through {} task(s)", ids.len()),
            PlanError::UnknownTask(id) => write!(f, "dependency refers to unknown task {id}"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

struct Walker<'a> {
    durations: Vec<i64>,
    preds: Vec<Vec<usize>>,
    marks: Vec<Option<Mark>>,
    finish: Vec<i64>,
    /// Predecessor on the longest chain ending at each task.
    via: Vec<Option<usize>>,
    stack: Vec<usize>,
    ids: &'a [TaskNode],
}

impl Walker<'_> {
    /// Earliest finish of `i`: its duration after the latest-finishing predecessor.
    fn visit(&mut self, i: usize) -> Result<i64, PlanError> {
        match self.marks[i] {
            Some(Mark::Done) => return Ok(self.finish[i]),
            Some(Mark::Visiting) => {
                let from = self.stack.iter().position(|&s| s == i).unwrap_or(0);
                return Err(PlanError::Cycle(self.stack[from..].iter().map(|&s| self.ids[s].id).collect()));
            }
            None => {}
        }
        self.marks[i] = Some(Mark::Visiting);
        self.stack.push(i);

        let mut best: Option<(i64, usize)> = None;
        for k in 0..self.preds[i].len() {
            let p = self.preds[i][k];
            let f = self.visit(p)?;
            // strict comparison keeps the earliest task on ties
            if best.map_or(true, |(bf, bp)| f > bf || (f == bf && p < bp)) {
                best = Some((f, p));
            }
        }

        self.stack.pop();
        self.marks[i] = Some(Mark::Done);
        self.via[i] = best.map(|(_, p)| p);
        self.finish[i] = best.map_or(0, |(f, _)| f) + self.durations[i];
        Ok(self.finish[i])
    }
}

/// Compute the critical path with a memoised depth-first walk.
///
/// Ties between equally long chains go to the task listed first.
pub fn critical_path(tasks: &[TaskNode], deps: &[Edge]) -> Result<CriticalPath, PlanError> {
    let index: HashMap<Uuid, usize> = tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
    let mut preds = vec![Vec::new(); tasks.len()];
    for e in deps {
        let t = *index.get(&e.task_id).ok_or(PlanError::UnknownTask(e.task_id))?;
        let d = *index.get(&e.depends_on).ok_or(PlanError::UnknownTask(e.depends_on))?;
        preds[t].push(d);
    }
    for p in &mut preds {
        p.sort_unstable();
        p.dedup();
    }

    let mut w = Walker {
        durations: tasks.iter().map(|t| i64::from(t.duration_days.max(0))).collect(),
        preds,
        marks: vec![None; tasks.len()],
        finish: vec![0; tasks.len()],
        via: vec![None; tasks.len()],
        stack: Vec::new(),
        ids: tasks,
    };

    let mut end: Option<(i64, usize)> = None;
    for i in 0..tasks.len() {
        let f = w.visit(i)?;
        if end.map_or(true, |(bf, _)| f > bf) {
            end = Some((f, i));
        }
    }

    let mut path = Vec::new();
    let mut cursor = end.map(|(_, i)| i);
    while let Some(i) = cursor {
        path.push(tasks[i].id);
        cursor = w.via[i];
    }
    path.reverse();

    let schedule = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| TaskSchedule { task_id: t.id, earliest_start: w.finish[i] - w.durations[i], earliest_finish: w.finish[i] })
        .collect();
    Ok(CriticalPath { task_ids: path, total_duration_days: end.map_or(0, |(f, _)| f), schedule })
}

/// Whether adding `edge` to `deps` would close a loop.
pub fn creates_cycle(deps: &[Edge], edge: Edge) -> bool {
    if edge.task_id == edge.depends_on {
        return true;
    }
    // does `depends_on` already (transitively) wait on `task_id`?
    let mut stack = vec![edge.depends_on];
    let mut seen = std::collections::HashSet::new();
    while let Some(node) = stack.pop() {
        if node == edge.task_id {
            return true;
        }
        if seen.insert(node) {
            stack.extend(deps.iter().filter(|e| e.task_id == node).map(|e| e.depends_on));
        }
    }
    false
}
