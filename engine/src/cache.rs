use std::collections::HashMap;

use crate::calligraphy::CalligraphyStroke;
use crate::geometry::Vec2;

#[derive(Clone, Debug, PartialEq)]
pub enum CachedGeometry {
    PerfectOutline { outline: Vec<Vec2>, path: String },
    Calligraphy(CalligraphyStroke),
}

/// Drawable geometry per history index, filled lazily by the renderer.
#[derive(Clone, Debug, Default)]
pub struct RenderCache {
    entries: HashMap<usize, CachedGeometry>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn get(&self, index: usize) -> Option<&CachedGeometry> {
        self.entries.get(&index)
    }

    /// Returns the entry for `index`, computing it on a miss. An entry at or
    /// past `history_len` belongs to an action that is gone and is replaced.
    pub fn get_or_compute(
        &mut self,
        index: usize,
        history_len: usize,
        compute: impl FnOnce() -> CachedGeometry,
    ) -> &CachedGeometry {
        if index >= history_len && self.entries.remove(&index).is_some() {
            log::warn!("dropping stale render cache entry {index} (history has {history_len})");
        }
        self.entries.entry(index).or_insert_with(compute)
    }

    pub fn invalidate(&mut self, index: usize) {
        self.entries.remove(&index);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
