//! In-memory lifecycle used by the planner and executor tests

use crate::context::ApplyContext;
use crate::resource::{AttributeChange, Lifecycle};
use anyhow::{Result, bail};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub key: String,
    pub value: String,
}

impl Item {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemState {
    pub key: String,
    pub value: String,
    pub version: u32,
    pub present: bool,
}

/// Lifecycle over a map standing in for the outside world
#[derive(Default)]
pub struct MemoryLifecycle {
    world: Mutex<HashMap<String, (String, u32)>>,
    failing_creates: Mutex<HashSet<String>>,
    failing_reads: Mutex<HashSet<String>>,
    pub calls: Mutex<Vec<String>>,
}

impl MemoryLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump_version(&self, key: &str) {
        if let Some(entry) = self.world.lock().unwrap().get_mut(key) {
            entry.1 += 1;
        }
    }

    pub fn vanish(&self, key: &str) {
        self.world.lock().unwrap().remove(key);
    }

    pub fn fail_creates(&self, key: &str) {
        self.failing_creates.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_reads(&self, key: &str) {
        self.failing_reads.lock().unwrap().insert(key.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.world.lock().unwrap().contains_key(key)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str, key: &str) {
        self.calls.lock().unwrap().push(format!("{call}:{key}"));
    }
}

impl Lifecycle for MemoryLifecycle {
    type Config = Item;
    type State = ItemState;

    fn resource_type(&self) -> &'static str {
        "memory"
    }

    fn exists(&self, state: &ItemState) -> bool {
        state.present
    }

    fn create(&self, ctx: &ApplyContext, config: &Item) -> Result<ItemState> {
        ctx.checkpoint()?;
        self.record("create", &config.key);
        if self.failing_creates.lock().unwrap().contains(&config.key) {
            bail!("create of {} refused", config.key);
        }
        self.world
            .lock()
            .unwrap()
            .insert(config.key.clone(), (config.value.clone(), 1));
        Ok(ItemState {
            key: config.key.clone(),
            value: config.value.clone(),
            version: 1,
            present: true,
        })
    }

    fn read(&self, _ctx: &ApplyContext, state: &ItemState) -> Result<ItemState> {
        self.record("read", &state.key);
        if self.failing_reads.lock().unwrap().contains(&state.key) {
            bail!("read of {} refused", state.key);
        }
        let world = self.world.lock().unwrap();
        let mut current = state.clone();
        match world.get(&state.key) {
            Some((value, version)) => {
                current.value = value.clone();
                current.version = *version;
            }
            None => current.present = false,
        }
        Ok(current)
    }

    fn update(
        &self,
        _ctx: &ApplyContext,
        config: &Item,
        _prior: &ItemState,
        current: &ItemState,
    ) -> Result<ItemState> {
        self.record("update", &config.key);
        let mut world = self.world.lock().unwrap();
        let version = world.get(&config.key).map_or(current.version, |e| e.1);
        world.insert(config.key.clone(), (config.value.clone(), version));
        Ok(ItemState {
            key: config.key.clone(),
            value: config.value.clone(),
            version,
            present: true,
        })
    }

    fn delete(&self, _ctx: &ApplyContext, state: &ItemState) -> Result<ItemState> {
        self.record("delete", &state.key);
        if self.world.lock().unwrap().remove(&state.key).is_none() {
            bail!("{} not found", state.key);
        }
        Ok(ItemState {
            present: false,
            ..state.clone()
        })
    }

    fn diff(&self, config: &Item, prior: &ItemState, current: &ItemState) -> Vec<AttributeChange> {
        let mut changes = Vec::new();
        if config.key != prior.key {
            changes.push(AttributeChange::force_new("key", &prior.key, &config.key));
        }
        if config.value != current.value {
            changes.push(AttributeChange::update("value", &current.value, &config.value));
        }
        if prior.version != current.version {
            changes.push(AttributeChange::force_new(
                "version",
                prior.version,
                current.version,
            ));
        }
        changes
    }

    fn conflict_key(&self, config: &Item) -> Option<String> {
        Some(config.key.clone())
    }
}

/// Build a desired set from `(name, key, value)` triples
pub fn desired(items: &[(&str, &str, &str)]) -> BTreeMap<String, Item> {
    items
        .iter()
        .map(|(name, key, value)| (name.to_string(), Item::new(key, value)))
        .collect()
}
