// ── Status coordinator ──
//
// Owns the refresh lifecycle for one mirror: periodic and on-demand
// refresh cycles, the shared snapshot, optimistic command overrides and
// subscriber notification. Commands go through here so the UI can react
// immediately and the next cycle reconciles with the mirror.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use mmbridge_api::{Alert, MirrorClient, SystemAction};

use crate::config::CoordinatorConfig;
use crate::convert::{CycleResponses, MAX_BRIGHTNESS};
use crate::entity::{self, Entity, EntityKey, EntityState, UpdateState};
use crate::error::CoreError;
use crate::model::{Module, MonitorStatus, StatusSnapshot};

// ── RefreshState ─────────────────────────────────────────────────

/// Outcome of recent refresh cycles, observable by consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshState {
    /// Cycles finished so far, successful or not.
    pub completed_cycles: u64,
    pub refreshing: bool,
    pub last_success: Option<DateTime<Utc>>,
    /// Error of the most recent cycle; cleared by the next success.
    pub last_error: Option<CoreError>,
    pub consecutive_failures: u32,
    /// The mirror rejected the API key. Stays set until a cycle succeeds.
    pub reauth_required: bool,
}

impl RefreshState {
    /// Whether entities should be shown as available.
    pub fn is_available(&self) -> bool {
        self.last_success.is_some() && self.last_error.is_none()
    }
}

// ── Subscriptions ────────────────────────────────────────────────

/// What subscribers are told about.
#[derive(Debug, Clone)]
pub enum CoordinatorUpdate {
    /// A cycle succeeded and published this snapshot.
    Refreshed(Arc<StatusSnapshot>),
    /// A cycle failed; the previous snapshot is still current.
    Failed(CoreError),
    /// A command optimistically changed one entity.
    Override { key: EntityKey, state: EntityState },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type UpdateCallback = Arc<dyn Fn(&CoordinatorUpdate) + Send + Sync>;

/// An optimistic entity value awaiting confirmation by a refresh cycle.
#[derive(Debug, Clone)]
struct Override {
    state: EntityState,
    /// First cycle that started after the override was set.
    generation: u64,
}

// ── Coordinator ──────────────────────────────────────────────────

/// Polls one mirror and routes commands to it.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. At most one refresh
/// cycle runs at a time; concurrent requests wait and are served by a
/// single follow-up cycle.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    client: MirrorClient,
    config: CoordinatorConfig,
    snapshot: ArcSwapOption<StatusSnapshot>,
    overrides: DashMap<EntityKey, Override>,
    subscribers: DashMap<SubscriptionId, UpdateCallback>,
    next_subscription: AtomicU64,
    state: watch::Sender<RefreshState>,
    /// Single-flight guard; held for the duration of a cycle.
    flight: Mutex<()>,
    /// Number of cycles started. Only incremented under `flight`.
    started: AtomicU64,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    /// Create a coordinator with its own HTTP session.
    ///
    /// Does not fetch anything: call [`first_refresh()`](Self::first_refresh)
    /// and then [`start()`](Self::start).
    pub fn new(config: CoordinatorConfig) -> Result<Self, CoreError> {
        let client = MirrorClient::new(config.connection.clone(), &config.transport())?;
        Ok(Self::from_client(client, config))
    }

    /// Create a coordinator on top of a session owned by the host.
    pub fn with_session(config: CoordinatorConfig, http: reqwest::Client) -> Result<Self, CoreError> {
        let client = MirrorClient::with_client(config.connection.clone(), http)?;
        Ok(Self::from_client(client, config))
    }

    fn from_client(client: MirrorClient, config: CoordinatorConfig) -> Self {
        let (state, _) = watch::channel(RefreshState::default());
        Self {
            inner: Arc::new(CoordinatorInner {
                client,
                config,
                snapshot: ArcSwapOption::empty(),
                overrides: DashMap::new(),
                subscribers: DashMap::new(),
                next_subscription: AtomicU64::new(0),
                state,
                flight: Mutex::new(()),
                started: AtomicU64::new(0),
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// The underlying client, for endpoints that bypass the coordinator.
    pub fn client(&self) -> &MirrorClient {
        &self.inner.client
    }

    /// The mirror's own remote-control page.
    pub fn configuration_url(&self) -> Result<Url, CoreError> {
        Ok(self.inner.client.connection().remote_url()?)
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Initial fetch during setup. An error here means "not ready yet".
    pub async fn first_refresh(&self) -> Result<Arc<StatusSnapshot>, CoreError> {
        info!(
            host = self.inner.client.connection().host(),
            "fetching initial mirror status"
        );
        self.request_refresh().await
    }

    /// Spawn the periodic refresh task. No-op when already running or
    /// when the update interval is zero.
    pub async fn start(&self) {
        let period = self.inner.config.update_interval;
        if period.is_zero() {
            debug!("periodic refresh disabled");
            return;
        }

        let mut task = self.inner.task.lock().await;
        if task.is_some() {
            return;
        }

        let coordinator = self.clone();
        let cancel = self.inner.cancel.clone();
        *task = Some(tokio::spawn(refresh_task(coordinator, period, cancel)));
        info!(interval_secs = period.as_secs(), "periodic refresh started");
    }

    /// Stop the periodic task and wait for it to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        if let Some(handle) = self.inner.task.lock().await.take() {
            let _ = handle.await;
        }
        debug!("coordinator stopped");
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Refresh now, or wait for a cycle that covers this request.
    ///
    /// If a cycle is in flight the caller waits for it and then for one
    /// follow-up cycle. Every caller that queued behind the same in-flight
    /// cycle is served by that one follow-up.
    pub async fn request_refresh(&self) -> Result<Arc<StatusSnapshot>, CoreError> {
        let ticket = self.inner.started.load(Ordering::SeqCst);
        let _flight = self.inner.flight.lock().await;

        if self.inner.started.load(Ordering::SeqCst) > ticket {
            debug!("refresh served by a cycle that started after the request");
            return self.last_outcome();
        }

        let cycle = self.inner.started.fetch_add(1, Ordering::SeqCst) + 1;
        self.run_cycle(cycle).await
    }

    async fn run_cycle(&self, cycle: u64) -> Result<Arc<StatusSnapshot>, CoreError> {
        debug!(cycle, "refresh cycle started");
        self.inner.state.send_modify(|s| s.refreshing = true);

        let client = &self.inner.client;
        let deadline = self.inner.config.refresh_timeout;

        let fetched = tokio::time::timeout(deadline, async {
            let (monitor, brightness, modules, module_updates, mirror_update) = tokio::join!(
                client.monitor_status(),
                client.brightness(),
                client.modules(),
                client.update_available(),
                client.mm_update_available(),
            );
            Ok::<_, CoreError>(CycleResponses {
                monitor: monitor?,
                brightness: brightness?,
                modules: modules?,
                module_updates: module_updates?,
                mirror_update: mirror_update?,
            })
        })
        .await;

        let outcome = match fetched {
            Ok(Ok(raw)) => Ok(self.publish(cycle, StatusSnapshot::from(raw))),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CoreError::Timeout {
                after: Some(deadline),
            }),
        };

        if let Err(ref e) = outcome {
            self.record_failure(cycle, e);
        }
        outcome
    }

    fn publish(&self, cycle: u64, snapshot: StatusSnapshot) -> Arc<StatusSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.inner.snapshot.store(Some(Arc::clone(&snapshot)));

        // Overrides set after this cycle started are still pending.
        self.inner.overrides.retain(|_, o| o.generation > cycle);

        let fetched_at = snapshot.fetched_at;
        self.inner.state.send_modify(|s| {
            s.completed_cycles += 1;
            s.refreshing = false;
            s.last_success = Some(fetched_at);
            s.last_error = None;
            s.consecutive_failures = 0;
            s.reauth_required = false;
        });

        debug!(
            cycle,
            monitor = %snapshot.monitor,
            modules = snapshot.modules.len(),
            "refresh cycle complete"
        );
        self.notify(&CoordinatorUpdate::Refreshed(Arc::clone(&snapshot)));
        snapshot
    }

    fn record_failure(&self, cycle: u64, err: &CoreError) {
        error!(cycle, error = %err, "refresh cycle failed");

        let mut newly_rejected = false;
        self.inner.state.send_modify(|s| {
            s.completed_cycles += 1;
            s.refreshing = false;
            s.last_error = Some(err.clone());
            s.consecutive_failures = s.consecutive_failures.saturating_add(1);
            if err.is_auth_failure() && !s.reauth_required {
                s.reauth_required = true;
                newly_rejected = true;
            }
        });

        if newly_rejected {
            warn!("mirror rejected the API key -- reconfiguration required");
        }
        self.notify(&CoordinatorUpdate::Failed(err.clone()));
    }

    /// Result of the most recently finished cycle.
    fn last_outcome(&self) -> Result<Arc<StatusSnapshot>, CoreError> {
        if let Some(err) = self.inner.state.borrow().last_error.clone() {
            return Err(err);
        }
        self.snapshot().ok_or_else(|| CoreError::ConnectionFailed {
            url: self.inner.client.base_url().to_string(),
            reason: "no status fetched yet".into(),
        })
    }

    // ── State observation ────────────────────────────────────────

    /// Latest published snapshot, `None` before the first success.
    pub fn snapshot(&self) -> Option<Arc<StatusSnapshot>> {
        self.inner.snapshot.load_full()
    }

    /// Look up a configured module in the latest snapshot.
    pub fn module(&self, name: &str) -> Result<Module, CoreError> {
        self.snapshot()
            .and_then(|s| s.module(name).cloned())
            .ok_or_else(|| CoreError::ModuleNotFound { name: name.into() })
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to refresh state changes.
    pub fn watch_state(&self) -> watch::Receiver<RefreshState> {
        self.inner.state.subscribe()
    }

    /// Refresh state changes as a `Stream`.
    pub fn state_stream(&self) -> WatchStream<RefreshState> {
        WatchStream::new(self.watch_state())
    }

    /// Value of one entity: a pending override wins over the snapshot.
    pub fn entity_state(&self, key: &EntityKey) -> Option<EntityState> {
        if let Some(pending) = self.inner.overrides.get(key) {
            return Some(pending.state.clone());
        }
        let snapshot = self.snapshot()?;
        entity::reader(key)(&snapshot)
    }

    /// Entity set for the current snapshot, empty before the first success.
    pub fn entities(&self) -> Vec<Entity> {
        self.snapshot()
            .map(|s| entity::discover(&s))
            .unwrap_or_default()
    }

    /// Register a callback for every [`CoordinatorUpdate`].
    ///
    /// Callbacks run on the task that produced the update and must not block.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&CoordinatorUpdate) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.inner.subscribers.insert(id, Arc::new(callback));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.remove(&id).is_some()
    }

    fn notify(&self, update: &CoordinatorUpdate) {
        // Collect first so callbacks may (un)subscribe without deadlocking a shard.
        let callbacks: Vec<UpdateCallback> = self
            .inner
            .subscribers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for callback in callbacks {
            callback(update);
        }
    }

    fn set_override(&self, key: EntityKey, state: EntityState) {
        let generation = self.inner.started.load(Ordering::SeqCst) + 1;
        debug!(%key, %state, generation, "optimistic override");
        self.inner.overrides.insert(
            key.clone(),
            Override {
                state: state.clone(),
                generation,
            },
        );
        self.notify(&CoordinatorUpdate::Override { key, state });
    }

    // ── Commands ─────────────────────────────────────────────────

    pub async fn turn_monitor_on(&self) -> Result<(), CoreError> {
        let sent = self.inner.client.monitor_on().await.map(|r| r.success);
        self.command(
            "monitor on",
            sent,
            Some((EntityKey::MonitorPower, EntityState::Switch(true))),
        )
        .await
    }

    pub async fn turn_monitor_off(&self) -> Result<(), CoreError> {
        let sent = self.inner.client.monitor_off().await.map(|r| r.success);
        self.command(
            "monitor off",
            sent,
            Some((EntityKey::MonitorPower, EntityState::Switch(false))),
        )
        .await
    }

    /// Toggle the display. The new state comes from the mirror's answer,
    /// or is the inverse of the last known state.
    pub async fn toggle_monitor(&self) -> Result<(), CoreError> {
        let sent = self.inner.client.monitor_toggle().await;
        let reported = match &sent {
            Ok(resp) if resp.success => MonitorStatus::from(resp).as_bool(),
            _ => None,
        };
        let next = reported.or_else(|| match self.entity_state(&EntityKey::MonitorPower) {
            Some(EntityState::Switch(on)) => Some(!on),
            _ => None,
        });

        self.command(
            "monitor toggle",
            sent.map(|r| r.success),
            next.map(|on| (EntityKey::MonitorPower, EntityState::Switch(on))),
        )
        .await
    }

    pub async fn show_module(&self, name: &str) -> Result<(), CoreError> {
        let sent = self.inner.client.show_module(name).await.map(|r| r.success);
        self.command(
            "show module",
            sent,
            Some((EntityKey::Module(name.to_owned()), EntityState::Switch(true))),
        )
        .await
    }

    pub async fn hide_module(&self, name: &str) -> Result<(), CoreError> {
        let sent = self.inner.client.hide_module(name).await.map(|r| r.success);
        self.command(
            "hide module",
            sent,
            Some((EntityKey::Module(name.to_owned()), EntityState::Switch(false))),
        )
        .await
    }

    /// Pull the latest version of one module and mark it up to date.
    pub async fn install_module_update(&self, name: &str) -> Result<(), CoreError> {
        let release_url = self
            .snapshot()
            .and_then(|s| s.module_update(name).and_then(|u| u.remote.clone()));
        let sent = self.inner.client.update_module(name).await.map(|r| r.success);
        self.command(
            "module update",
            sent,
            Some((
                EntityKey::ModuleUpdate(name.to_owned()),
                EntityState::Update(UpdateState::new(false, release_url)),
            )),
        )
        .await
    }

    /// Set backlight brightness. Levels above 100 are rejected before
    /// anything is sent.
    pub async fn set_brightness(&self, level: u8) -> Result<(), CoreError> {
        if level > MAX_BRIGHTNESS {
            return Err(CoreError::ValidationFailed {
                message: format!("brightness must be between 0 and {MAX_BRIGHTNESS}, got {level}"),
            });
        }

        let sent = self
            .inner
            .client
            .set_brightness(level)
            .await
            .map(|r| r.success);
        self.command(
            "set brightness",
            sent,
            Some((EntityKey::Brightness, EntityState::Level(level))),
        )
        .await
    }

    pub async fn alert(&self, alert: &Alert) -> Result<(), CoreError> {
        let sent = self.inner.client.alert(alert).await.map(|r| r.success);
        self.command("alert", sent, None).await
    }

    /// Install a new module from a repository URL.
    pub async fn install_module(&self, repository: &str) -> Result<(), CoreError> {
        let sent = self
            .inner
            .client
            .install_module(repository)
            .await
            .map(|r| r.success);
        self.command("install module", sent, None).await
    }

    /// Fire a system command. No refresh is requested.
    pub async fn system(&self, action: SystemAction) {
        self.inner.client.system(action).await;
    }

    /// Shared command tail: log, apply the override, refresh, then report.
    ///
    /// The override and refresh happen regardless of the remote outcome;
    /// the next successful cycle reconciles.
    async fn command(
        &self,
        action: &str,
        sent: Result<bool, mmbridge_api::Error>,
        effect: Option<(EntityKey, EntityState)>,
    ) -> Result<(), CoreError> {
        match &sent {
            Ok(true) => debug!(action, "command acknowledged"),
            Ok(false) => warn!(action, "command not acknowledged by mirror"),
            Err(e) => error!(action, error = %e, "command failed"),
        }

        if let Some((key, state)) = effect {
            self.set_override(key, state);
        }

        if let Err(e) = self.request_refresh().await {
            debug!(action, error = %e, "refresh after command failed");
        }

        match sent {
            Ok(true) => Ok(()),
            Ok(false) => Err(CoreError::Rejected {
                message: format!("{action} was not acknowledged"),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically refresh the mirror status.
async fn refresh_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                // Failures are already logged and published to subscribers.
                let _ = coordinator.request_refresh().await;
            }
        }
    }
}
