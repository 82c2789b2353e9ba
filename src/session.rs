//! Session-scoped access to the merged tables and the analyses built on them
//!
//! A [`DatasetStore`] owns the loader, the configuration and one
//! [`MergeCache`]. Each [`AnalysisSession`] opened from it gets its own cache
//! entries, which are evicted when the session is dropped.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::analysis;
use crate::errors::Result;
use crate::loader::PartitionLoader;
use crate::merger::{collect_partitions, merge_partitions};
use crate::models::{
    AggregateRow, Category, Config, Metric, PerFundSummary, RankedSubset, SegmentCount,
};
use crate::period::normalize;
use crate::table::CategoryTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

type Slot = Arc<Mutex<Option<Arc<CategoryTable>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Merged tables keyed by (session, category).
///
/// Callers asking for the same key wait on one in-flight build and share
/// its result. Failed builds leave the slot empty.
#[derive(Default)]
pub struct MergeCache {
    slots: Mutex<HashMap<(SessionId, Category), Slot>>,
}

impl MergeCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, session: SessionId, category: Category) -> Slot {
        Arc::clone(lock(&self.slots).entry((session, category)).or_default())
    }

    pub fn get_or_try_insert_with<F>(
        &self,
        session: SessionId,
        category: Category,
        build: F,
    ) -> Result<Arc<CategoryTable>>
    where
        F: FnOnce() -> Result<CategoryTable>,
    {
        let slot = self.slot(session, category);
        let mut cached = lock(&slot);
        if let Some(table) = cached.as_ref() {
            debug!("♻️  {} {} served from cache", session, category);
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(build()?);
        *cached = Some(Arc::clone(&table));
        Ok(table)
    }

    pub fn get(&self, session: SessionId, category: Category) -> Option<Arc<CategoryTable>> {
        let slot = lock(&self.slots).get(&(session, category)).cloned()?;
        let cached = lock(&slot).clone();
        cached
    }

    /// Drop one entry; returns whether a table was cached
    pub fn invalidate(&self, session: SessionId, category: Category) -> bool {
        let Some(slot) = lock(&self.slots).remove(&(session, category)) else {
            return false;
        };
        let was_cached = lock(&slot).is_some();
        was_cached
    }

    /// Drop every entry of a session; returns how many tables were cached
    pub fn invalidate_session(&self, session: SessionId) -> usize {
        let mut slots = lock(&self.slots);
        let keys: Vec<_> = slots.keys().filter(|(id, _)| *id == session).copied().collect();
        keys.into_iter()
            .filter_map(|key| slots.remove(&key))
            .filter(|slot| lock(slot).is_some())
            .count()
    }

    /// Number of cached tables across all sessions
    pub fn len(&self) -> usize {
        lock(&self.slots)
            .values()
            .filter(|slot| lock(slot).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared loader, configuration and cache for every session
pub struct DatasetStore {
    config: Config,
    loader: PartitionLoader,
    cache: MergeCache,
    next_session: AtomicU64,
}

impl DatasetStore {
    pub fn new(config: Config) -> Self {
        let loader = PartitionLoader::new(config.data_dir.clone());
        Self::with_loader(config, loader)
    }

    pub fn with_loader(config: Config, loader: PartitionLoader) -> Self {
        Self {
            config,
            loader,
            cache: MergeCache::new(),
            next_session: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn loader(&self) -> &PartitionLoader {
        &self.loader
    }

    pub fn cache(&self) -> &MergeCache {
        &self.cache
    }

    pub fn open_session(self: &Arc<Self>) -> AnalysisSession {
        let id = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed));
        debug!("Opened {}", id);
        AnalysisSession {
            id,
            store: Arc::clone(self),
        }
    }

    /// Load, merge and period-normalize one category, bypassing the cache
    pub fn build_category(&self, category: Category) -> Result<CategoryTable> {
        info!("📊 Building {} table for years {:?}", category, self.config.years);
        let partitions = collect_partitions(
            &self.loader,
            category,
            &self.config.years,
            self.config.missing_partitions,
        )?;
        let merged = merge_partitions(category, partitions)?;
        normalize(category, merged, &self.config.date_policy(category))
    }
}

/// One user's view of the datasets
pub struct AnalysisSession {
    id: SessionId,
    store: Arc<DatasetStore>,
}

impl AnalysisSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Merged table of a category, built once per session
    pub fn merged(&self, category: Category) -> Result<Arc<CategoryTable>> {
        self.store
            .cache
            .get_or_try_insert_with(self.id, category, || self.store.build_category(category))
    }

    pub fn merged_asset_liability(&self) -> Result<Arc<CategoryTable>> {
        self.merged(Category::AssetLiability)
    }

    pub fn merged_complement(&self) -> Result<Arc<CategoryTable>> {
        self.merged(Category::Complement)
    }

    pub fn merged_general(&self) -> Result<Arc<CategoryTable>> {
        self.merged(Category::General)
    }

    pub fn invalidate(&self, category: Category) -> bool {
        self.store.cache.invalidate(self.id, category)
    }

    pub fn invalidate_all(&self) -> usize {
        self.store.cache.invalidate_session(self.id)
    }

    pub fn top_assets_per_year(&self, n: usize) -> Result<RankedSubset> {
        let table = self.merged_asset_liability()?;
        let totals = analysis::asset_totals(&table)?;
        Ok(analysis::top_n_per_year(&totals, Metric::TotalAsset, n))
    }

    pub fn top_liabilities_per_year(&self, n: usize) -> Result<RankedSubset> {
        let table = self.merged_asset_liability()?;
        let totals = analysis::liability_totals(&table)?;
        Ok(analysis::top_n_per_year(&totals, Metric::TotalLiability, n))
    }

    pub fn segment_counts_per_year(&self) -> Result<Vec<SegmentCount>> {
        let table = self.merged_general()?;
        analysis::segment_counts(&table)
    }

    /// Yearly dividend yield of every fund
    pub fn dividend_yield_per_year(&self) -> Result<Vec<AggregateRow>> {
        let table = self.merged_complement()?;
        analysis::dividend_yield_totals(&table)
    }

    pub fn top_dividend_yield_funds(
        &self,
        n: usize,
    ) -> Result<(RankedSubset, Vec<PerFundSummary>)> {
        let yearly = self.dividend_yield_per_year()?;
        Ok(analysis::top_n_overall(&yearly, Metric::DividendYield, n))
    }
}

impl Drop for AnalysisSession {
    fn drop(&mut self) {
        let evicted = self.store.cache.invalidate_session(self.id);
        debug!("Closed {} ({} cached tables evicted)", self.id, evicted);
    }
}
