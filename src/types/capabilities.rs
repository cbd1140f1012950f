//! Camera capability flags

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single feature a camera backend may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Clips,
    Snapshots,
    Recordings,
    Live,
    Seek,
    FavoriteEvents,
    FavoriteRecordings,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 7] = [
        Capability::Clips,
        Capability::Snapshots,
        Capability::Recordings,
        Capability::Live,
        Capability::Seek,
        Capability::FavoriteEvents,
        Capability::FavoriteRecordings,
    ];

    /// Configuration name of this capability.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Clips => "clips",
            Capability::Snapshots => "snapshots",
            Capability::Recordings => "recordings",
            Capability::Live => "live",
            Capability::Seek => "seek",
            Capability::FavoriteEvents => "favorite-events",
            Capability::FavoriteRecordings => "favorite-recordings",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable set of capability flags for one camera (or an aggregate of several).
///
/// Stored as a bitset; capabilities not explicitly enabled are `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities {
    bits: u8,
}

impl Capabilities {
    /// Capabilities with every flag disabled.
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    /// Capabilities with every flag enabled. Identity element for [`intersect`](Self::intersect).
    pub fn all() -> Self {
        Self::from_iter(Capability::ALL)
    }

    /// Build from an explicit map. Missing keys are `false`.
    pub fn from_map(map: &BTreeMap<Capability, bool>) -> Self {
        map.iter().filter(|(_, enabled)| **enabled).map(|(cap, _)| *cap).collect()
    }

    /// Whether `capability` is supported.
    pub fn has(&self, capability: Capability) -> bool {
        self.bits & capability.bit() != 0
    }

    /// Whether any capability that allows browsing media is present.
    pub fn has_media(&self) -> bool {
        self.has(Capability::Clips) || self.has(Capability::Snapshots) || self.has(Capability::Recordings)
    }

    /// Per-key AND of two capability sets.
    pub fn intersect(&self, other: &Capabilities) -> Capabilities {
        Capabilities { bits: self.bits & other.bits }
    }

    /// Copy with `capability` removed.
    pub fn without(&self, capability: Capability) -> Capabilities {
        Capabilities { bits: self.bits & !capability.bit() }
    }

    /// Iterate the supported capabilities.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|cap| self.has(*cap))
    }

    /// Full map view, every key present.
    pub fn to_map(&self) -> BTreeMap<Capability, bool> {
        Capability::ALL.into_iter().map(|cap| (cap, self.has(cap))).collect()
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let bits = iter.into_iter().fold(0u8, |acc, cap| acc | cap.bit());
        Capabilities { bits }
    }
}
