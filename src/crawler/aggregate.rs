//! Per-profile result collection
//!
//! Every seeded profile gets a key before any request runs, so the final
//! result always lists each profile even when nothing was found for it.
//! Appends from concurrent workers are serialized per key.

use serde::Serialize;
use std::sync::Mutex;

/// A website found in a profile's bio and the feeds it advertises
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteResult {
    pub site_url: String,
    pub feed_urls: Vec<String>,
}

/// All websites recorded for one profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSites {
    pub profile_id: String,
    pub sites: Vec<SiteResult>,
}

/// Final crawl result, in seed order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CrawlResults {
    profiles: Vec<ProfileSites>,
}

impl CrawlResults {
    /// Sites recorded for a profile, or `None` for an unknown profile
    pub fn get(&self, profile_id: &str) -> Option<&[SiteResult]> {
        self.profiles
            .iter()
            .find(|p| p.profile_id == profile_id)
            .map(|p| p.sites.as_slice())
    }

    pub fn profile_ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.profile_id.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProfileSites> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Total number of websites across all profiles
    pub fn site_count(&self) -> usize {
        self.profiles.iter().map(|p| p.sites.len()).sum()
    }
}

impl<'a> IntoIterator for &'a CrawlResults {
    type Item = &'a ProfileSites;
    type IntoIter = std::slice::Iter<'a, ProfileSites>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

struct Slot {
    profile_id: String,
    sites: Mutex<Vec<SiteResult>>,
}

/// Shared collector that workers append site results into
///
/// The key set is fixed at construction; appends never add or remove keys.
pub struct ResultAggregate {
    slots: Vec<Slot>,
}

impl ResultAggregate {
    /// Creates an empty entry for each profile, keeping first-seen order
    ///
    /// Repeated profile IDs share a single entry.
    pub fn new<I, S>(profile_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut slots: Vec<Slot> = Vec::new();
        for id in profile_ids {
            let id = id.into();
            if slots.iter().any(|slot| slot.profile_id == id) {
                continue;
            }
            slots.push(Slot {
                profile_id: id,
                sites: Mutex::new(Vec::new()),
            });
        }
        Self { slots }
    }

    /// Appends a site result under a profile
    ///
    /// Returns false, dropping the result, if the profile was never seeded.
    pub fn append(&self, profile_id: &str, site: SiteResult) -> bool {
        let Some(slot) = self.slots.iter().find(|s| s.profile_id == profile_id) else {
            tracing::warn!("Dropping result for unknown profile {}", profile_id);
            return false;
        };

        let mut sites = slot.sites.lock().unwrap_or_else(|e| e.into_inner());
        sites.push(site);
        true
    }

    pub fn contains(&self, profile_id: &str) -> bool {
        self.slots.iter().any(|s| s.profile_id == profile_id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Takes a snapshot of everything recorded so far
    pub fn snapshot(&self) -> CrawlResults {
        let profiles = self
            .slots
            .iter()
            .map(|slot| ProfileSites {
                profile_id: slot.profile_id.clone(),
                sites: slot
                    .sites
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .clone(),
            })
            .collect();
        CrawlResults { profiles }
    }

    /// Consumes the aggregate into the final result
    pub fn finish(self) -> CrawlResults {
        let profiles = self
            .slots
            .into_iter()
            .map(|slot| ProfileSites {
                profile_id: slot.profile_id,
                sites: slot.sites.into_inner().unwrap_or_else(|e| e.into_inner()),
            })
            .collect();
        CrawlResults { profiles }
    }
}
