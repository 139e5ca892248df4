//! FIFO scheduler for path searches.
use std::collections::VecDeque;

use bevy::log;

use crate::{
    error::PathError,
    graph::GraphRegistry,
    job::{PathOutcome, PathSearchJob, PathStatus},
    request::PathJobId,
    tile::{GridId, TileMap},
};

/// Runs queued [`PathSearchJob`]s a slice at a time, oldest first.
#[derive(Debug, Default)]
pub struct PathJobQueue {
    jobs: VecDeque<PathSearchJob>,
    max_concurrent: Option<usize>,
}

impl PathJobQueue {
    pub fn new(max_concurrent: Option<usize>) -> Self {
        PathJobQueue {
            jobs: VecDeque::new(),
            max_concurrent,
        }
    }

    pub fn enqueue(&mut self, job: PathSearchJob) {
        self.jobs.push_back(job);
    }

    /// Gives each queued job one slice. Jobs that reach a terminal status are removed
    /// and their outcomes returned in queue order.
    pub fn process<M: TileMap + ?Sized>(
        &mut self,
        graphs: &mut GraphRegistry,
        map: &M,
    ) -> Vec<PathOutcome> {
        let limit = self.max_concurrent.unwrap_or(usize::MAX);
        let mut outcomes = Vec::new();
        let mut remaining = VecDeque::with_capacity(self.jobs.len());

        for (i, mut job) in self.jobs.drain(..).enumerate() {
            if i >= limit {
                remaining.push_back(job);
                continue;
            }

            match job.run_slice(graphs, map) {
                Some(outcome) => outcomes.push(outcome),
                None => remaining.push_back(job),
            }
        }

        if !outcomes.is_empty() {
            log::debug!(
                "{} path jobs completed, {} still queued",
                outcomes.len(),
                remaining.len()
            );
        }

        self.jobs = remaining;
        outcomes
    }

    /// Status of a queued job. Jobs leave the queue once they're done.
    pub fn status(&self, id: PathJobId) -> Option<PathStatus> {
        self.get(id).map(|job| job.status())
    }

    pub fn get(&self, id: PathJobId) -> Option<&PathSearchJob> {
        self.jobs.iter().find(|job| job.id() == id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &PathSearchJob> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Cancels and removes every queued job.
    pub fn cancel_all(&mut self) -> Vec<PathOutcome> {
        self.jobs
            .drain(..)
            .map(|job| {
                job.token().cancel();
                PathOutcome {
                    id: job.id(),
                    result: Err(PathError::Cancelled),
                    stats: job.stats(),
                    telemetry: None,
                }
            })
            .collect()
    }

    /// Removes the jobs searching `grid`, failing them.
    pub fn remove_grid(&mut self, grid: GridId) -> Vec<PathOutcome> {
        let (removed, kept): (VecDeque<_>, VecDeque<_>) = self
            .jobs
            .drain(..)
            .partition(|job| job.args().start.grid == grid);
        self.jobs = kept;

        removed
            .into_iter()
            .map(|job| PathOutcome {
                id: job.id(),
                result: Err(PathError::GridRemoved(grid)),
                stats: job.stats(),
                telemetry: None,
            })
            .collect()
    }
}
