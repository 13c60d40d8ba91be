//! Reference [`FragmentProvider`] backed by a [`FragmentSource`].
//!
//! Fragments handed to the grid are registered as resident. New fragments
//! start empty and are filled by background tasks, so requesting one never
//! blocks on rendering. Layer repaints and the per-frame live refresh run
//! on the same workers and write into the shared content. Fragments coming
//! back from the grid go into an LRU pool keyed by coordinate and are
//! handed out again, content intact, when the same coordinate is requested
//! before eviction.

use crate::background::tasks::{BackgroundTaskManager, TaskManagerConfig};
use crate::core::{config::MapConfig, geo::FragmentCoord};
use crate::fragment::{
    fragment::{BasicFragment, Fragment, SharedContent},
    layer::{LayerClass, LayerDescriptor, LayerId},
};
use crate::tiles::{provider::FragmentProvider, source::FragmentSource};
use crate::MapError;
use fxhash::FxHashMap;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError};

/// Snapshot of the provider's bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolStats {
    pub resident: usize,
    pub recycled: usize,
    /// Jobs waiting for a free queue slot
    pub pending: usize,
    pub loads_started: usize,
    pub reused: usize,
}

/// Work for one fragment
#[derive(Clone)]
enum FragmentJob {
    /// Render every layer, objects and biomes
    Load,
    /// Re-render a single layer
    Repaint(LayerDescriptor),
}

/// A job the loader queue rejected, retried every frame
struct PendingJob {
    coord: FragmentCoord,
    content: SharedContent,
    job: FragmentJob,
}

pub struct PooledFragmentProvider<S: FragmentSource> {
    source: Arc<S>,
    layers: Arc<[LayerDescriptor]>,
    resident: FxHashMap<FragmentCoord, SharedContent>,
    recycled: LruCache<FragmentCoord, BasicFragment>,
    pending: Vec<PendingJob>,
    loader: BackgroundTaskManager,
    loads_started: usize,
    loads_finished: Arc<AtomicUsize>,
    reused: usize,
}

impl<S: FragmentSource> PooledFragmentProvider<S> {
    pub fn new(source: Arc<S>, recycle_capacity: usize, workers: &TaskManagerConfig) -> Self {
        let capacity = NonZeroUsize::new(recycle_capacity).unwrap_or(NonZeroUsize::MIN);
        let layers: Arc<[LayerDescriptor]> = source.layers().into();
        log::debug!(
            "pooled provider with {} layers, recycle capacity {}",
            layers.len(),
            capacity
        );
        Self {
            source,
            layers,
            resident: FxHashMap::default(),
            recycled: LruCache::new(capacity),
            pending: Vec::new(),
            loader: BackgroundTaskManager::new("fragment-loader", workers),
            loads_started: 0,
            loads_finished: Arc::new(AtomicUsize::new(0)),
            reused: 0,
        }
    }

    pub fn from_config(source: Arc<S>, config: &MapConfig) -> Self {
        Self::new(source, config.pool.recycle_capacity, &config.workers)
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    pub fn is_resident(&self, coord: FragmentCoord) -> bool {
        self.resident.contains_key(&coord)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            resident: self.resident.len(),
            recycled: self.recycled.len(),
            pending: self.pending.len(),
            loads_started: self.loads_started,
            reused: self.reused,
        }
    }

    /// Number of fragment loads that ran to completion
    pub fn completed_loads(&self) -> usize {
        self.loads_finished.load(Ordering::SeqCst)
    }

    /// Submits `job` for one fragment. A full queue parks it in `pending`.
    fn schedule(&mut self, coord: FragmentCoord, content: SharedContent, job: FragmentJob) {
        let source = self.source.clone();
        let layers = self.layers.clone();
        let task_content = content.clone();
        let task_job = job.clone();
        let finished = self.loads_finished.clone();
        let id = match &job {
            FragmentJob::Load => format!("load {coord}"),
            FragmentJob::Repaint(layer) => format!("repaint {} of {coord}", layer.id),
        };
        let submitted = self.loader.submit_fn(id, move || match task_job {
            FragmentJob::Load => {
                load_content(source.as_ref(), &layers, coord, &task_content);
                finished.fetch_add(1, Ordering::SeqCst);
            }
            FragmentJob::Repaint(layer) => {
                render_layers(source.as_ref(), &[layer], coord, 0.0, &task_content)
            }
        });
        match submitted {
            Ok(()) => {
                if matches!(job, FragmentJob::Load) {
                    self.loads_started += 1;
                }
            }
            Err(MapError::TaskQueueFull) => self.pending.push(PendingJob { coord, content, job }),
            Err(e) => log::warn!("could not schedule work for {}: {}", coord, e),
        }
    }

    fn retry_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for PendingJob { coord, content, job } in pending {
            // skip fragments that left the grid meanwhile
            let still_resident = self
                .resident
                .get(&coord)
                .map_or(false, |resident| Arc::ptr_eq(resident, &content));
            if still_resident {
                self.schedule(coord, content, job);
            }
        }
    }

    /// Drops the parked jobs of `content`. Returns whether there were any.
    fn cancel_pending(&mut self, content: &SharedContent) -> bool {
        let before = self.pending.len();
        self.pending
            .retain(|pending| !Arc::ptr_eq(&pending.content, content));
        self.pending.len() != before
    }
}

/// Fills `content` with everything the source has for `coord`
fn load_content<S: FragmentSource + ?Sized>(
    source: &S,
    layers: &[LayerDescriptor],
    coord: FragmentCoord,
    content: &SharedContent,
) {
    let images: Vec<_> = layers
        .iter()
        .map(|layer| (layer, source.render_layer(coord, layer.id, 0.0)))
        .collect();
    let objects = source.objects(coord);
    let biomes = source.biomes(coord);

    let mut content = content.write().unwrap_or_else(PoisonError::into_inner);
    for (layer, image) in images {
        content.set_layer(layer.id, layer.class, image);
    }
    content.set_objects(objects);
    content.set_biomes(biomes);
    content.mark_loaded();
    log::trace!("loaded fragment {}", coord);
}

/// Renders `layers` for `coord` and swaps them into `content`. The write
/// lock is only taken once the images exist.
fn render_layers<S: FragmentSource + ?Sized>(
    source: &S,
    layers: &[LayerDescriptor],
    coord: FragmentCoord,
    time: f32,
    content: &SharedContent,
) {
    let images: Vec<_> = layers
        .iter()
        .map(|layer| (layer, source.render_layer(coord, layer.id, time)))
        .collect();
    let mut content = content.write().unwrap_or_else(PoisonError::into_inner);
    for (layer, image) in images {
        content.set_layer(layer.id, layer.class, image);
    }
}

impl<S: FragmentSource> FragmentProvider for PooledFragmentProvider<S> {
    type Fragment = BasicFragment;

    fn request_fragment(&mut self, coord: FragmentCoord) -> BasicFragment {
        if let Some(content) = self.resident.get(&coord) {
            log::warn!("fragment {} requested while already resident", coord);
            let fragment = BasicFragment::new(coord);
            *fragment.write() = content.read().unwrap_or_else(PoisonError::into_inner).clone();
            return fragment;
        }

        if let Some(fragment) = self.recycled.pop(&coord) {
            self.reused += 1;
            self.resident.insert(coord, fragment.content_handle());
            return fragment;
        }

        let fragment = BasicFragment::new(coord);
        self.resident.insert(coord, fragment.content_handle());
        self.schedule(coord, fragment.content_handle(), FragmentJob::Load);
        fragment
    }

    fn recycle_fragment(&mut self, fragment: BasicFragment) {
        let coord = fragment.coord();
        let content = fragment.content_handle();
        let owned = self
            .resident
            .get(&coord)
            .map_or(false, |resident| Arc::ptr_eq(resident, &content));
        if !owned {
            log::warn!("fragment {} recycled but not resident", coord);
            return;
        }
        self.resident.remove(&coord);

        // a parked job would never run for a pooled fragment
        if self.cancel_pending(&content) {
            log::trace!("discarding fragment {} with deferred work", coord);
            return;
        }
        if let Some((evicted, _)) = self.recycled.push(coord, fragment) {
            if evicted != coord {
                log::trace!("evicted recycled fragment {}", evicted);
            }
        }
    }

    fn repaint_layer(&mut self, fragment: &BasicFragment, layer: LayerId) {
        let Some(descriptor) = self.layers.iter().find(|d| d.id == layer).cloned() else {
            log::warn!("repaint of unknown {} ignored", layer);
            return;
        };
        self.schedule(
            fragment.coord(),
            fragment.content_handle(),
            FragmentJob::Repaint(descriptor),
        );
    }

    fn refresh_live_layers(&mut self, time: f32) {
        self.retry_pending();

        let live: Vec<LayerDescriptor> = self
            .layers
            .iter()
            .filter(|layer| layer.class == LayerClass::Live)
            .cloned()
            .collect();
        if live.is_empty() || self.resident.is_empty() {
            return;
        }

        let targets: Vec<(FragmentCoord, SharedContent)> = self
            .resident
            .iter()
            .map(|(coord, content)| (*coord, content.clone()))
            .collect();
        let source = self.source.clone();
        let submitted = self.loader.submit_fn(format!("live refresh at {time}"), move || {
            for (coord, content) in &targets {
                render_layers(source.as_ref(), &live, *coord, time, content);
            }
        });
        match submitted {
            Ok(()) => {}
            // the next frame submits a newer refresh
            Err(MapError::TaskQueueFull) => log::trace!("live refresh at {} skipped", time),
            Err(e) => log::warn!("could not schedule live refresh: {}", e),
        }
    }

    fn reset(&mut self) {
        log::debug!(
            "resetting pooled provider ({} resident, {} recycled)",
            self.resident.len(),
            self.recycled.len()
        );
        self.resident.clear();
        self.recycled.clear();
        self.pending.clear();
    }
}

impl<S: FragmentSource> std::fmt::Debug for PooledFragmentProvider<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledFragmentProvider")
            .field("stats", &self.stats())
            .field("loader", &self.loader)
            .finish()
    }
}
