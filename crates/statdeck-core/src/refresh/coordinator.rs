//! Per-component refresh bookkeeping.
//!
//! Components register lazily by name on their first refresh. Starting a
//! refresh for a name cancels whatever was in flight for it, and only the
//! newest refresh may settle the registration.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct ActiveRefresh {
    generation: u64,
    token: CancellationToken,
}

/// Refresh status of one named component.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRegistration {
    pub loading: bool,
    pub last_refresh: Option<DateTime<Utc>>,
    pub error: Option<String>,
    #[serde(skip)]
    active: Option<ActiveRefresh>,
}

impl RefreshRegistration {
    pub fn is_in_flight(&self) -> bool {
        self.active.is_some()
    }
}

/// Proof of a started refresh. Carries the token the operation must honour.
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    name: String,
    generation: u64,
    token: CancellationToken,
}

impl RefreshTicket {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    registrations: Mutex<HashMap<String, RefreshRegistration>>,
    generations: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RefreshRegistration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a refresh for `name`, superseding any refresh already running.
    pub fn begin(&self, name: &str) -> RefreshTicket {
        let mut registrations = self.lock();
        self.begin_locked(&mut registrations, name)
    }

    /// Start a refresh for `name` unless one is already running.
    pub fn begin_if_idle(&self, name: &str) -> Option<RefreshTicket> {
        let mut registrations = self.lock();
        if registrations
            .get(name)
            .is_some_and(RefreshRegistration::is_in_flight)
        {
            debug!(event = "core.refresh.skipped_in_flight", component = name);
            return None;
        }
        Some(self.begin_locked(&mut registrations, name))
    }

    fn begin_locked(
        &self,
        registrations: &mut HashMap<String, RefreshRegistration>,
        name: &str,
    ) -> RefreshTicket {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();

        let registration = registrations.entry(name.to_string()).or_default();
        if let Some(previous) = registration.active.take() {
            previous.token.cancel();
            info!(
                event = "core.refresh.superseded",
                component = name,
                generation = previous.generation,
            );
        }
        registration.loading = true;
        registration.active = Some(ActiveRefresh {
            generation,
            token: token.clone(),
        });

        debug!(
            event = "core.refresh.started",
            component = name,
            generation = generation
        );

        RefreshTicket {
            name: name.to_string(),
            generation,
            token,
        }
    }

    /// Settle a refresh. Returns `false`, changing nothing, when the ticket
    /// has been superseded or cancelled.
    pub fn finish(&self, ticket: &RefreshTicket, result: Result<(), String>) -> bool {
        let mut registrations = self.lock();
        let Some(registration) = registrations.get_mut(&ticket.name) else {
            return false;
        };
        let current = registration
            .active
            .as_ref()
            .is_some_and(|active| active.generation == ticket.generation);
        if !current || ticket.token.is_cancelled() {
            debug!(
                event = "core.refresh.discarded",
                component = %ticket.name,
                generation = ticket.generation,
            );
            return false;
        }

        registration.active = None;
        registration.loading = false;
        match result {
            Ok(()) => {
                registration.last_refresh = Some(Utc::now());
                registration.error = None;
                debug!(event = "core.refresh.completed", component = %ticket.name);
            }
            Err(message) => {
                debug!(
                    event = "core.refresh.failed",
                    component = %ticket.name,
                    error = %message,
                );
                registration.error = Some(message);
            }
        }
        true
    }

    /// Run `operation` as the refresh for `name`.
    ///
    /// The operation receives the ticket's token and should stop writing
    /// once it is cancelled.
    pub async fn refresh<F, Fut>(&self, name: &str, operation: F) -> bool
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        let ticket = self.begin(name);
        let result = operation(ticket.token.clone()).await;
        self.finish(&ticket, result)
    }

    pub fn is_in_flight(&self, name: &str) -> bool {
        self.lock()
            .get(name)
            .is_some_and(RefreshRegistration::is_in_flight)
    }

    /// Cancel the in-flight refresh for `name` without replacing it.
    /// Returns whether anything was running.
    pub fn cancel(&self, name: &str) -> bool {
        let mut registrations = self.lock();
        let Some(registration) = registrations.get_mut(name) else {
            return false;
        };
        let Some(active) = registration.active.take() else {
            return false;
        };
        active.token.cancel();
        registration.loading = false;
        info!(
            event = "core.refresh.cancelled",
            component = name,
            generation = active.generation,
        );
        true
    }

    pub fn cancel_all(&self) {
        let mut registrations = self.lock();
        for registration in registrations.values_mut() {
            if let Some(active) = registration.active.take() {
                active.token.cancel();
                registration.loading = false;
            }
        }
    }

    pub fn registration(&self, name: &str) -> Option<RefreshRegistration> {
        self.lock().get(name).cloned()
    }
}
