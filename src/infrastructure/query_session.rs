//! Per-query session context
//!
//! Owns the driver of one query and the cascade state the portal itself does not
//! expose: which levels are committed and which option lists are cached.

use std::collections::BTreeMap;
use std::fmt::Display;

use crate::error::AppResult;
use crate::infrastructure::portal_driver::{PortalDriver, SelectOption};
use crate::models::{CascadeSelection, SelectionLevel};

pub struct QuerySession<D> {
    driver: D,
    /// Query index, only used in log prefixes
    id: usize,
    portal_open: bool,
    /// Committed selections, contiguous from `State`
    committed: Vec<CascadeSelection>,
    option_cache: BTreeMap<SelectionLevel, Vec<SelectOption>>,
}

impl<D: PortalDriver> QuerySession<D> {
    pub fn new(driver: D, id: usize) -> Self {
        Self {
            driver,
            id,
            portal_open: false,
            committed: Vec::new(),
            option_cache: BTreeMap::new(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_portal_open(&self) -> bool {
        self.portal_open
    }

    pub fn mark_portal_open(&mut self) {
        self.portal_open = true;
    }

    /// Forget everything; used after (re)loading the portal page
    pub fn reset(&mut self) {
        self.portal_open = false;
        self.committed.clear();
        self.option_cache.clear();
    }

    /// Highest committed level
    pub fn committed_level(&self) -> Option<SelectionLevel> {
        self.committed.last().map(|s| s.level)
    }

    pub fn is_committed(&self, level: SelectionLevel) -> bool {
        self.committed.len() > level.index()
    }

    pub fn committed_selection(&self, level: SelectionLevel) -> Option<&CascadeSelection> {
        self.committed.get(level.index())
    }

    /// Record a committed selection. Everything above its level is invalidated.
    pub fn commit(&mut self, selection: CascadeSelection) {
        let level = selection.level;
        debug_assert!(
            level.index() <= self.committed.len(),
            "{} committed before its predecessor",
            level
        );
        self.committed.truncate(level.index());
        self.committed.push(selection);
        self.invalidate_above(level);
    }

    pub fn invalidate_above(&mut self, level: SelectionLevel) {
        self.option_cache.retain(|cached, _| *cached <= level);
        self.committed.truncate(level.index() + 1);
    }

    pub fn cached_options(&self, level: SelectionLevel) -> Option<&[SelectOption]> {
        self.option_cache.get(&level).map(|v| v.as_slice())
    }

    pub fn cache_options(&mut self, level: SelectionLevel, options: Vec<SelectOption>) {
        self.option_cache.insert(level, options);
    }

    /// Release the driver's resources
    pub async fn close(&mut self) -> AppResult<()> {
        self.reset();
        self.driver.close().await
    }
}

impl<D> Display for QuerySession<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[query {}]", self.id)
    }
}
