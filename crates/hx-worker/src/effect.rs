//! Effect log
//!
//! Ordered record of every host operation a handler performed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An operation performed against a host collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Fetch { url: String },
    CacheRead { cache: String, url: String, hit: bool },
    CacheWrite { cache: String, url: String },
    CacheDelete { cache: String },
    SkipWaiting,
    ClaimClients,
    ShowNotification { title: String },
    CloseNotification { title: String },
    OpenWindow { url: String },
    /// Response delivered to the page
    Respond { status: u16 },
}

/// Shared, append-only effect log
#[derive(Debug, Clone, Default)]
pub struct EffectLog {
    effects: Arc<Mutex<Vec<Effect>>>,
}

impl EffectLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, effect: Effect) {
        self.lock().push(effect);
    }

    pub fn snapshot(&self) -> Vec<Effect> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// URLs fetched from the network, in order
    pub fn fetches(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                Effect::Fetch { url } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// Index of the first effect equal to `effect`
    pub fn position(&self, effect: &Effect) -> Option<usize> {
        self.lock().iter().position(|e| e == effect)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Effect>> {
        self.effects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
