//! Behavior plug-in surface and roster admission.
//!
//! A behavior is compiled code that drives one tank. It only ever sees a
//! [`TankHandle`], so the action surface and read-only accessors are the
//! whole of what it can do; there is no path to the world or its lock.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::pin::Pin;

use crate::config::RosterEntry;
use crate::error::AdmissionError;
use crate::executor::TankHandle;

/// Future returned by [`Behavior::act`].
pub type BehaviorFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// Code that drives a tank.
///
/// `act` is called over and over while the tank is alive. Returning an
/// error (or panicking) kills the tank and ends its task; other tanks are
/// unaffected.
pub trait Behavior: Send {
    /// Take one turn.
    fn act<'a>(&'a mut self, tank: &'a mut TankHandle) -> BehaviorFuture<'a>;
}

/// Builds a behavior from a seed.
pub type BehaviorFactory = fn(seed: u64) -> Box<dyn Behavior>;

/// A registered behavior kind.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Kind name used in rosters.
    pub kind: &'static str,
    /// One-line description.
    pub summary: &'static str,
    factory: BehaviorFactory,
}

/// Behavior kinds by name.
#[derive(Debug, Clone, Default)]
pub struct BehaviorCatalog {
    entries: BTreeMap<&'static str, CatalogEntry>,
}

impl BehaviorCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every built-in behavior.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        crate::behaviors::register_all(&mut catalog);
        catalog
    }

    /// Register a kind. Returns `false` if the kind was already taken.
    pub fn register(&mut self, kind: &'static str, summary: &'static str, factory: BehaviorFactory) -> bool {
        if self.entries.contains_key(kind) {
            return false;
        }
        self.entries.insert(
            kind,
            CatalogEntry {
                kind,
                summary,
                factory,
            },
        );
        true
    }

    /// Registered kinds in name order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    /// Whether `kind` is registered.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.entries.contains_key(kind)
    }

    /// Build a behavior of `kind`.
    #[must_use]
    pub fn create(&self, kind: &str, seed: u64) -> Option<Box<dyn Behavior>> {
        self.entries.get(kind).map(|entry| (entry.factory)(seed))
    }

    /// Screen a roster.
    ///
    /// Entries naming an unknown kind, or reusing an earlier entry's name,
    /// are rejected. Admitted entries keep their roster order.
    #[must_use]
    pub fn admit(&self, roster: &[RosterEntry]) -> AdmissionReport {
        let mut report = AdmissionReport::default();
        let mut names = BTreeSet::new();

        for entry in roster {
            if !self.contains(&entry.kind) {
                report.reject(entry.clone(), AdmissionError::UnknownKind(entry.kind.clone()));
                continue;
            }
            if !names.insert(entry.name.as_str()) {
                report.reject(entry.clone(), AdmissionError::DuplicateName(entry.name.clone()));
                continue;
            }
            report.admitted.push(entry.clone());
        }
        report
    }
}

/// A roster entry that will not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    /// The entry.
    pub entry: RosterEntry,
    /// Why.
    pub reason: AdmissionError,
}

/// Result of screening a roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionReport {
    /// Entries allowed to start.
    pub admitted: Vec<RosterEntry>,
    /// Entries turned away.
    pub rejected: Vec<Rejected>,
}

impl AdmissionReport {
    /// Number of rejected entries.
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// Move an admitted entry to the rejected list.
    pub(crate) fn revoke(&mut self, name: &str, reason: AdmissionError) {
        if let Some(index) = self.admitted.iter().position(|e| e.name == name) {
            let entry = self.admitted.remove(index);
            self.reject(entry, reason);
        }
    }

    fn reject(&mut self, entry: RosterEntry, reason: AdmissionError) {
        log::warn!("rejected {}={}: {reason}", entry.name, entry.kind);
        self.rejected.push(Rejected { entry, reason });
    }
}
