//! Taxonomy snapshot and category-slug resolution.
//!
//! The full provider taxonomy is held as an in-memory snapshot with a
//! 30-minute freshness window. Once 80% of the window has elapsed, reads
//! trigger a background refresh so the snapshot is usually replaced before
//! it expires; a failed refresh keeps the stale snapshot in service and
//! only logs. The snapshot is also persisted through the result cache so a
//! restarted process warms up without a provider round trip.

use crate::application::cache_service::{ttl, CacheService};
use crate::application::classifier;
use crate::domain::{CatalogProvider, CategoryEntry, Clock};
use anyhow::Result;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

const SNAPSHOT_SIGNATURE: &str = "taxonomy:all";

/// Refresh in the background once this share of the TTL has elapsed.
const REFRESH_THRESHOLD: f64 = 0.8;

struct Snapshot {
    entries: Arc<Vec<CategoryEntry>>,
    fetched_at: i64,
}

/// A taxonomy entry shaped for the UI's category navigation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryNode {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub count: i64,
    /// Icon token the UI maps to an asset; derived from the slug/name.
    pub icon: &'static str,
    pub children: Vec<CategoryNode>,
}

pub struct TaxonomyService {
    provider: Arc<dyn CatalogProvider>,
    cache: Arc<CacheService>,
    clock: Arc<dyn Clock>,
    snapshot: RwLock<Option<Snapshot>>,
    refreshing: AtomicBool,
}

impl TaxonomyService {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        cache: Arc<CacheService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            cache,
            clock,
            snapshot: RwLock::new(None),
            refreshing: AtomicBool::new(false),
        }
    }

    /// Current taxonomy entries, fetching on a cold start and scheduling a
    /// background refresh when the snapshot nears expiry.
    pub async fn entries(self: &Arc<Self>) -> Result<Arc<Vec<CategoryEntry>>> {
        let now = self.clock.now_unix();

        {
            let guard = self.snapshot.read().await;
            if let Some(snapshot) = guard.as_ref() {
                let age = now - snapshot.fetched_at;
                if age < ttl::TAXONOMY_SECS {
                    if age as f64 >= ttl::TAXONOMY_SECS as f64 * REFRESH_THRESHOLD {
                        self.spawn_refresh();
                    }
                    return Ok(snapshot.entries.clone());
                }
            }
        }

        // Cold or expired. Try the persisted tier before the provider; the
        // stored write timestamp keeps the freshness window honest.
        if let Some((entries, written_at)) = self
            .cache
            .get_aged::<Vec<CategoryEntry>>(SNAPSHOT_SIGNATURE, ttl::TAXONOMY_SECS)
        {
            let entries = Arc::new(entries);
            let mut guard = self.snapshot.write().await;
            *guard = Some(Snapshot { entries: entries.clone(), fetched_at: written_at });
            return Ok(entries);
        }

        self.refresh().await
    }

    /// Fetch the taxonomy from the provider and replace the snapshot.
    async fn refresh(self: &Arc<Self>) -> Result<Arc<Vec<CategoryEntry>>> {
        let categories = self.provider.fetch_categories().await?;
        info!(count = categories.len(), "taxonomy snapshot refreshed");
        self.cache.put(SNAPSHOT_SIGNATURE, &categories);

        let entries = Arc::new(categories);
        let mut guard = self.snapshot.write().await;
        *guard = Some(Snapshot {
            entries: entries.clone(),
            fetched_at: self.clock.now_unix(),
        });
        Ok(entries)
    }

    /// Fire-and-forget refresh. At most one runs at a time; failures keep
    /// the current snapshot in service.
    fn spawn_refresh(self: &Arc<Self>) {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(err) = service.refresh().await {
                warn!("background taxonomy refresh failed: {err:#}");
            }
            service.refreshing.store(false, Ordering::Release);
        });
    }

    /// Resolve a UI category slug to the provider's taxonomy id.
    ///
    /// Resolution is tiered from strict to loose and stops at the first
    /// hit: exact slug match, normalized-name or same-category alias
    /// match, singular/plural variants, then a guarded substring match.
    /// `Ok(None)` means the slug matched nothing; the caller serves an
    /// empty page rather than an error.
    pub async fn resolve_category_id(self: &Arc<Self>, slug: &str) -> Result<Option<i64>> {
        let entries = self.entries().await?;
        Ok(resolve_in(&entries, slug))
    }

    /// The taxonomy as a parent/child tree with UI icon tokens. Entries
    /// with zero products are dropped.
    pub async fn category_tree(self: &Arc<Self>) -> Result<Vec<CategoryNode>> {
        let entries = self.entries().await?;
        Ok(build_tree(&entries))
    }
}

fn resolve_in(entries: &[CategoryEntry], slug: &str) -> Option<i64> {
    let requested = slug.trim().to_lowercase();
    if requested.is_empty() {
        return None;
    }

    // 1. Exact slug match.
    if let Some(entry) = entries.iter().find(|e| e.slug.eq_ignore_ascii_case(&requested)) {
        return Some(entry.id);
    }

    // 2. Normalized display-name match, or an alias naming the same
    //    internal category (e.g. "power-supply" resolving a taxonomy
    //    entry slugged "backup-power").
    let requested_norm = normalize(&requested);
    let requested_category = classifier::lookup_slug_exact(&requested);
    for entry in entries {
        if normalize(&entry.name) == requested_norm {
            return Some(entry.id);
        }
        if let Some(wanted) = requested_category {
            let entry_token = normalize(&entry.name).replace(' ', "-");
            if classifier::lookup_slug_exact(&entry.slug.to_lowercase()) == Some(wanted)
                || classifier::lookup_slug_exact(&entry_token) == Some(wanted)
            {
                return Some(entry.id);
            }
        }
    }

    // 3. Singular/plural variants of the requested slug.
    for variant in plural_variants(&requested) {
        if let Some(entry) = entries.iter().find(|e| e.slug.eq_ignore_ascii_case(&variant)) {
            return Some(entry.id);
        }
    }

    // 4. Guarded substring match. Short tokens and wildly different
    //    lengths are excluded so "ram" never lands on "frames".
    if requested.len() > 3 {
        for entry in entries {
            let candidate = entry.slug.to_lowercase();
            let diff = candidate.len().abs_diff(requested.len());
            if diff < 5 && (candidate.contains(&requested) || requested.contains(&candidate)) {
                return Some(entry.id);
            }
        }
    }

    let prefix = requested.get(..3).unwrap_or(&requested);
    let near: Vec<&str> = entries
        .iter()
        .filter(|e| e.slug.starts_with(prefix))
        .map(|e| e.slug.as_str())
        .take(5)
        .collect();
    debug!(slug = requested, ?near, "category slug resolved to nothing");
    None
}

/// Lowercase, fold `&`/`&amp;` to "and", and squash separators so slugs
/// and display names compare on equal footing.
fn normalize(value: &str) -> String {
    let folded = value
        .to_lowercase()
        .replace("&amp;", " and ")
        .replace('&', " and ");
    folded
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn plural_variants(slug: &str) -> Vec<String> {
    let mut variants = vec![format!("{slug}s")];
    if let Some(stem) = slug.strip_suffix("ies") {
        variants.push(format!("{stem}y"));
    }
    if let Some(stem) = slug.strip_suffix('s') {
        variants.push(stem.to_string());
    }
    if let Some(stem) = slug.strip_suffix('y') {
        variants.push(format!("{stem}ies"));
    }
    variants
}

fn build_tree(entries: &[CategoryEntry]) -> Vec<CategoryNode> {
    let mut roots: Vec<CategoryNode> = entries
        .iter()
        .filter(|e| e.parent == 0 && e.count > 0)
        .map(|e| node_for(e, entries))
        .collect();
    roots.sort_by(|a, b| a.name.cmp(&b.name));
    roots
}

fn node_for(entry: &CategoryEntry, entries: &[CategoryEntry]) -> CategoryNode {
    let mut children: Vec<CategoryNode> = entries
        .iter()
        .filter(|e| e.parent == entry.id && e.count > 0)
        .map(|e| node_for(e, entries))
        .collect();
    children.sort_by(|a, b| a.name.cmp(&b.name));
    CategoryNode {
        id: entry.id,
        name: entry.name.clone(),
        slug: entry.slug.clone(),
        count: entry.count,
        icon: icon_for(entry),
        children,
    }
}

/// Icon token for the UI, keyed off the internal category the entry maps
/// to. Entries outside the known hardware taxonomy get a generic token.
fn icon_for(entry: &CategoryEntry) -> &'static str {
    use crate::domain::InternalCategory::*;
    let token = normalize(&entry.name).replace(' ', "-");
    let category = classifier::lookup_slug(&entry.slug).or_else(|| classifier::lookup_slug(&token));
    match category {
        Some(Cpu) => "cpu",
        Some(Gpu) => "gpu",
        Some(Motherboard) => "motherboard",
        Some(Ram) => "memory",
        Some(Storage) => "storage",
        Some(Psu) => "power",
        Some(Case) => "chassis",
        Some(Cooler) => "fan",
        Some(Monitor) => "display",
        Some(Mouse) => "mouse",
        Some(Keyboard) => "keyboard",
        Some(Headset) => "audio",
        None => "component",
    }
}
