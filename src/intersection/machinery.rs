use std::{
    ops::Range,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use tracing::trace;

use crate::{
    error::{Error, Result},
    geometry::Ray,
};

use super::{IntersectionSettings, RayHit, worker::Worker};

/// Computes the nearest hit of every ray, spreading blocks of rays over worker threads.
/// Workers only share the read-only inputs; each block of results is copied into its own
/// slots of the output.
pub(super) fn compute_hits(
    worker: &Worker<'_>,
    rays: &[Option<Ray>],
    settings: &IntersectionSettings,
) -> Result<Vec<Option<RayHit>>> {
    let block_size = settings.ray_block_size.get();
    let block_count = rays.len().div_ceil(block_size);
    let worker_count = settings.worker_count.get().min(block_count);

    if worker_count <= 1 {
        return Ok(rays.iter().map(|ray| worker.nearest_hit(ray)).collect());
    }
    trace!(worker_count, block_count, "dispatching ray blocks");

    let state = ComputeState {
        ray_count: rays.len(),
        block_size,
        next_block_index: AtomicUsize::new(0),
        hits: Mutex::new(vec![None; rays.len()]),
    };
    let state = &state;

    thread::scope(|scope| -> Result<()> {
        for worker_id in 0..worker_count {
            thread::Builder::new()
                .name(format!("intersection{worker_id}"))
                .spawn_scoped(scope, move || {
                    let mut buffer = Vec::with_capacity(block_size);

                    while let Some(block) = state.get_next_block() {
                        buffer.clear();
                        buffer.extend(rays[block.clone()].iter().map(|ray| worker.nearest_hit(ray)));

                        state
                            .hits
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)[block]
                            .copy_from_slice(&buffer);
                    }
                })
                .map_err(|e| Error::WorkerSpawn {
                    message: e.to_string(),
                })?;
        }
        Ok(())
    })?;

    Ok(std::mem::take(
        &mut *state.hits.lock().unwrap_or_else(PoisonError::into_inner),
    ))
}

struct ComputeState {
    ray_count: usize,
    block_size: usize,
    next_block_index: AtomicUsize,
    hits: Mutex<Vec<Option<RayHit>>>,
}

impl ComputeState {
    /// Claims the next unprocessed block of rays.
    fn get_next_block(&self) -> Option<Range<usize>> {
        let id = self.next_block_index.fetch_add(1, Ordering::AcqRel);
        let start = id.checked_mul(self.block_size)?;
        (start < self.ray_count).then(|| start..(start + self.block_size).min(self.ray_count))
    }
}
