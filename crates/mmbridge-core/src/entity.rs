// ── Host entity bindings ──
//
// Maps a `StatusSnapshot` onto the named entities a home-automation host
// registers: the monitor switch, brightness level, update indicators and
// one switch plus one update entity per module. Each entity resolves its
// accessor once, at construction, into a closure over the snapshot.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use strum::Display;

use crate::model::{Module, StatusSnapshot};

/// Where the mirror software publishes its releases.
pub const MIRROR_RELEASE_URL: &str = "https://github.com/MichMich/MagicMirror/releases/latest";

const LATEST: &str = "latest";

// ── Keys and states ──────────────────────────────────────────────────

/// Stable identity of one entity, independent of its current value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "entity", content = "module", rename_all = "snake_case")]
pub enum EntityKey {
    MonitorPower,
    Brightness,
    UpdateAvailable,
    MirrorUpdate,
    Module(String),
    ModuleUpdate(String),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MonitorPower => f.write_str("monitor"),
            Self::Brightness => f.write_str("brightness"),
            Self::UpdateAvailable => f.write_str("update_available"),
            Self::MirrorUpdate => f.write_str("mirror_update"),
            Self::Module(name) => write!(f, "module:{name}"),
            Self::ModuleUpdate(name) => write!(f, "module_update:{name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Switch,
    Sensor,
    BinarySensor,
    Update,
}

/// Current value of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EntityState {
    /// Monitor power or module visibility.
    Switch(bool),
    /// Brightness 0–100.
    Level(u8),
    /// Binary sensor.
    Flag(bool),
    Update(UpdateState),
}

/// Version info in the shape hosts expect from update entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateState {
    pub installed_version: String,
    pub latest_version: String,
    pub release_url: Option<String>,
}

impl UpdateState {
    pub fn new(update_available: bool, release_url: Option<String>) -> Self {
        let installed = if update_available { "outdated" } else { LATEST };
        Self {
            installed_version: installed.into(),
            latest_version: LATEST.into(),
            release_url,
        }
    }

    pub fn update_available(&self) -> bool {
        self.installed_version != self.latest_version
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch(on) | Self::Flag(on) => f.write_str(if *on { "on" } else { "off" }),
            Self::Level(level) => write!(f, "{level}"),
            Self::Update(u) if u.update_available() => f.write_str("update available"),
            Self::Update(_) => f.write_str("up to date"),
        }
    }
}

// ── Entity ───────────────────────────────────────────────────────────

type Reader = Arc<dyn Fn(&StatusSnapshot) -> Option<EntityState> + Send + Sync>;

/// One host entity bound to the snapshot.
#[derive(Clone)]
pub struct Entity {
    key: EntityKey,
    kind: EntityKind,
    name: String,
    unique_id: String,
    read: Reader,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("unique_id", &self.unique_id)
            .finish_non_exhaustive()
    }
}

impl Entity {
    pub fn monitor() -> Self {
        Self::bind(
            EntityKey::MonitorPower,
            EntityKind::Switch,
            "MagicMirror Monitor",
            "monitor_status",
        )
    }

    pub fn brightness() -> Self {
        Self::bind(
            EntityKey::Brightness,
            EntityKind::Sensor,
            "MagicMirror Brightness",
            "brightness",
        )
    }

    pub fn update_available() -> Self {
        Self::bind(
            EntityKey::UpdateAvailable,
            EntityKind::BinarySensor,
            "Update Available",
            "update_available",
        )
    }

    pub fn mirror_update() -> Self {
        Self::bind(
            EntityKey::MirrorUpdate,
            EntityKind::Update,
            "MagicMirror update",
            "mirror_update",
        )
    }

    /// Visibility switch for one module.
    pub fn module(module: &Module) -> Self {
        Self::bind(
            EntityKey::Module(module.name.clone()),
            EntityKind::Switch,
            &module.name,
            &format!("mm_module_{}", module.name),
        )
    }

    /// Update entity for one module, keyed by its instance identifier.
    pub fn module_update(module: &Module) -> Self {
        let unique_id = if module.identifier.is_empty() {
            format!("mm_update_{}", module.name)
        } else {
            module.identifier.clone()
        };
        Self::bind(
            EntityKey::ModuleUpdate(module.name.clone()),
            EntityKind::Update,
            &format!("{} update", module.name),
            &unique_id,
        )
    }

    fn bind(key: EntityKey, kind: EntityKind, name: &str, unique_id: &str) -> Self {
        let read = reader(&key);
        Self {
            key,
            kind,
            name: name.to_owned(),
            unique_id: unique_id.to_owned(),
            read,
        }
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Value in `snapshot`, `None` when the snapshot has nothing for it.
    pub fn state(&self, snapshot: &StatusSnapshot) -> Option<EntityState> {
        (self.read)(snapshot)
    }
}

/// Build the snapshot accessor for `key`.
pub(crate) fn reader(key: &EntityKey) -> Reader {
    match key {
        EntityKey::MonitorPower => {
            Arc::new(|s: &StatusSnapshot| s.monitor.as_bool().map(EntityState::Switch))
        }
        EntityKey::Brightness => Arc::new(|s: &StatusSnapshot| s.brightness.map(EntityState::Level)),
        EntityKey::UpdateAvailable => {
            Arc::new(|s: &StatusSnapshot| Some(EntityState::Flag(s.update_available)))
        }
        EntityKey::MirrorUpdate => Arc::new(|s: &StatusSnapshot| {
            Some(EntityState::Update(UpdateState::new(
                s.update_available,
                Some(MIRROR_RELEASE_URL.into()),
            )))
        }),
        EntityKey::Module(name) => {
            let name = name.clone();
            Arc::new(move |s: &StatusSnapshot| {
                s.module(&name)
                    .map(|m| EntityState::Switch(m.is_visible()))
            })
        }
        EntityKey::ModuleUpdate(name) => {
            let name = name.clone();
            Arc::new(move |s: &StatusSnapshot| {
                s.module_update(&name).map(|u| {
                    EntityState::Update(UpdateState::new(u.update_available, u.remote.clone()))
                })
            })
        }
    }
}

// ── Discovery ────────────────────────────────────────────────────────

/// The full entity set a host should register for `snapshot`.
///
/// Module switches are deduplicated by name; module update entities exist
/// only for modules that have a correlated update entry.
pub fn discover(snapshot: &StatusSnapshot) -> Vec<Entity> {
    let mut entities = vec![
        Entity::monitor(),
        Entity::brightness(),
        Entity::update_available(),
        Entity::mirror_update(),
    ];

    let mut seen = HashSet::new();
    entities.extend(
        snapshot
            .modules
            .iter()
            .filter(|m| seen.insert(m.name.as_str()))
            .map(Entity::module),
    );
    entities.extend(
        snapshot
            .correlated_updates()
            .into_iter()
            .map(|(module, _)| Entity::module_update(module)),
    );

    entities
}
