//! Key map: a [`ConfigMapping`] built from configured targets
//!
//! Each target binds a `(device, key)` pair to a named value. Shaping
//! normalises the raw 0-127 value into the target's range and coerces it to
//! the target's type; applying stores the result for readers.

use crate::config::{Settings, TargetConfig, ValueType};
use crate::dispatch::ConfigMapping;
use log::{debug, info};
use std::collections::HashMap;

const MIDI_VALUE_MAX: f32 = 127.0;

/// Index of a target inside a [`KeyMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(usize);

#[derive(Debug, Default)]
pub struct KeyMap {
    targets: Vec<TargetConfig>,
    index: HashMap<(String, u8), usize>,
    values: HashMap<String, f32>,
    applied: u64,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut map = Self::new();
        for target in &settings.targets {
            map.add_target(target.clone());
        }
        info!("Key map ready with {} target(s)", map.targets.len());
        map
    }

    /// Registers a target, replacing any earlier one on the same device key
    pub fn add_target(&mut self, target: TargetConfig) -> TargetHandle {
        let slot = (target.device.clone(), target.key);
        let handle = match self.index.get(&slot) {
            Some(&existing) => {
                self.targets[existing] = target;
                existing
            }
            None => {
                self.targets.push(target);
                let handle = self.targets.len() - 1;
                self.index.insert(slot, handle);
                handle
            }
        };
        TargetHandle(handle)
    }

    pub fn target(&self, handle: TargetHandle) -> Option<&TargetConfig> {
        self.targets.get(handle.0)
    }

    /// Last applied value of a named target
    pub fn value(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }

    pub fn values(&self) -> &HashMap<String, f32> {
        &self.values
    }

    pub fn applied_count(&self) -> u64 {
        self.applied
    }
}

/// Normalises a raw value into the target range and coerces its type
pub fn shape_value(target: &TargetConfig, raw: f32) -> f32 {
    match target.value_type {
        ValueType::Bool => {
            if raw > 0.0 {
                1.0
            } else {
                0.0
            }
        }
        ValueType::Float => remap(target, raw),
        ValueType::Int => remap(target, raw).round(),
    }
}

fn remap(target: &TargetConfig, raw: f32) -> f32 {
    let normalized = raw / MIDI_VALUE_MAX;
    target.min + normalized * (target.max - target.min)
}

impl ConfigMapping for KeyMap {
    type Target = TargetHandle;

    fn exists(&self, device: &str, key: u8) -> bool {
        self.index.contains_key(&(device.to_string(), key))
    }

    fn get_target(&self, device: &str, key: u8) -> Option<TargetHandle> {
        self.index
            .get(&(device.to_string(), key))
            .map(|&handle| TargetHandle(handle))
    }

    fn shape(
        &mut self,
        target: &TargetHandle,
        _device: &str,
        kind: &str,
        _key: u8,
        value: &mut f32,
    ) -> bool {
        let Some(config) = self.targets.get(target.0) else {
            return false;
        };

        if let Some(expected) = config.kind {
            if expected.as_str() != kind {
                debug!(
                    "Target '{}' expects {} events, got {}",
                    config.name, expected, kind
                );
                return false;
            }
        }

        *value = shape_value(config, *value);
        true
    }

    fn apply(&mut self, target: &TargetHandle, _device: &str, _key: u8, value: f32) {
        if let Some(config) = self.targets.get(target.0) {
            self.values.insert(config.name.clone(), value);
            self.applied += 1;
        }
    }
}
