//! Per-region active counts with a shared cap.

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct RegionSlots {
    cap: usize,
    active: HashMap<String, usize>,
    peaks: BTreeMap<String, usize>,
}

impl RegionSlots {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            active: HashMap::new(),
            peaks: BTreeMap::new(),
        }
    }

    pub fn active(&self, region: &str) -> usize {
        self.active.get(region).copied().unwrap_or(0)
    }

    /// Take a slot unless the region is already at the cap.
    pub fn try_acquire(&mut self, region: &str) -> bool {
        let count = self.active.entry(region.to_string()).or_insert(0);
        if *count >= self.cap {
            return false;
        }
        *count += 1;
        let now = *count;
        let peak = self.peaks.entry(region.to_string()).or_insert(0);
        *peak = (*peak).max(now);
        true
    }

    pub fn release(&mut self, region: &str) {
        if let Some(count) = self.active.get_mut(region) {
            *count = count.saturating_sub(1);
        }
    }

    /// Highest active count observed per region.
    pub fn peaks(&self) -> &BTreeMap<String, usize> {
        &self.peaks
    }

    pub fn into_peaks(self) -> BTreeMap<String, usize> {
        self.peaks
    }
}
