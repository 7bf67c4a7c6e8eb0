// src/graph/registry.rs
use std::collections::BTreeMap;

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use super::channel::{Channel, ChannelReader};
use super::error::GraphError;

pub type DataKey = i32;

/// Number of system channels occupying keys `0..COUNT_RESERVED`.
pub const COUNT_RESERVED: usize = 1;
pub const TIMESTAMP_KEY: DataKey = 0;

const SYSTEM_NAMES: [&str; COUNT_RESERVED] = ["Timestamp"];

/// Write-path policy of a [`ChannelRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryPolicy {
    /// Gate for every producer write.
    pub accept_data: bool,
    /// Create a channel on first use of an unknown non-negative key instead of
    /// rejecting it. Applies to writes and to [`ChannelRegistry::reader`].
    pub accept_unregistered_keys: bool,
}

impl Default for RegistryPolicy {
    fn default() -> Self {
        Self {
            accept_data: true,
            accept_unregistered_keys: false,
        }
    }
}

/// Channels addressed by integer key. The system slots always exist and are
/// never writable through [`ChannelRegistry::set_value`]; user channels are
/// kept sparse, so unoccupied keys below the span cost nothing.
#[derive(Debug)]
pub struct ChannelRegistry {
    system: [Channel; COUNT_RESERVED],
    user: BTreeMap<DataKey, Channel>,
    policy: RegistryPolicy,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(RegistryPolicy::default())
    }
}

impl ChannelRegistry {
    pub fn new(policy: RegistryPolicy) -> Self {
        Self {
            system: std::array::from_fn(|k| Channel::new(SYSTEM_NAMES[k])),
            user: BTreeMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> RegistryPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: RegistryPolicy) {
        self.policy = policy;
    }

    /// One past the highest occupied key.
    pub fn span(&self) -> usize {
        self.user
            .keys()
            .next_back()
            .map_or(COUNT_RESERVED, |&key| key as usize + 1)
    }

    pub fn is_reserved(key: DataKey) -> bool {
        0 <= key && (key as usize) < COUNT_RESERVED
    }

    pub fn is_valid(&self, key: DataKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: DataKey) -> Option<&Channel> {
        let slot = usize::try_from(key).ok()?;
        match self.system.get(slot) {
            Some(channel) => Some(channel),
            None => self.user.get(&key),
        }
    }

    fn get_mut(&mut self, key: DataKey) -> Option<&mut Channel> {
        let slot = usize::try_from(key).ok()?;
        match self.system.get_mut(slot) {
            Some(channel) => Some(channel),
            None => self.user.get_mut(&key),
        }
    }

    /// Inserts `channel` at `key`, replacing whatever was there. Keys between
    /// the old span and `key` stay unoccupied.
    pub fn register(&mut self, key: DataKey, channel: Channel) -> Result<(), GraphError> {
        Self::check_user_key(key)?;
        debug!("registered channel {key} ({})", channel.name());
        self.user.insert(key, channel);
        Ok(())
    }

    /// Removes a user channel. System channels cannot be removed.
    pub fn remove(&mut self, key: DataKey) -> Result<Option<Channel>, GraphError> {
        Self::check_user_key(key)?;
        Ok(self.user.remove(&key))
    }

    fn check_user_key(key: DataKey) -> Result<(), GraphError> {
        if key < 0 {
            Err(GraphError::NegativeKey(key))
        } else if Self::is_reserved(key) {
            Err(GraphError::ReservedKey(key))
        } else {
            Ok(())
        }
    }

    // Lazy creation on first use; only reachable when the policy allows it.
    fn admit_unregistered(&mut self, key: DataKey) -> bool {
        if key < 0 || !self.policy.accept_unregistered_keys {
            return false;
        }
        let name = format!("data {key}");
        info!("auto-registering channel {key}");
        self.register(key, Channel::new(name)).is_ok()
    }

    /// Writes the pending value of a user channel. Rejections are logged and
    /// reported as `false`; this never fails the caller.
    pub fn set_value(&mut self, key: DataKey, value: f32) -> bool {
        if !self.policy.accept_data {
            debug!("write to {key} dropped: registry is not accepting data");
            return false;
        }
        if key < 0 {
            error!("write to negative key {key} rejected");
            return false;
        }
        if Self::is_reserved(key) {
            error!("system channel {key} cannot be written by producers");
            return false;
        }
        if !self.is_valid(key) && !self.admit_unregistered(key) {
            error!("write to unregistered key {key} rejected");
            return false;
        }
        match self.get_mut(key) {
            Some(channel) => {
                channel.set_pending(value);
                true
            }
            None => false,
        }
    }

    /// Reader for `key`. Unknown keys are auto-registered when the policy
    /// allows it, otherwise this fails with [`GraphError::UnknownKey`].
    pub fn reader(&mut self, key: DataKey) -> Result<ChannelReader<'_>, GraphError> {
        if !self.is_valid(key) && !self.admit_unregistered(key) {
            return Err(GraphError::UnknownKey(key));
        }
        self.try_reader(key).ok_or(GraphError::UnknownKey(key))
    }

    /// Reader for `key` without any registration side effect.
    pub fn try_reader(&self, key: DataKey) -> Option<ChannelReader<'_>> {
        self.get(key).map(Channel::reader)
    }

    pub fn current_value(&self, key: DataKey) -> Option<f32> {
        self.try_reader(key).map(|r| r.current_value())
    }

    pub fn latest_value(&self, key: DataKey) -> Option<f32> {
        self.try_reader(key).and_then(|r| r.latest_value())
    }

    pub fn timestamp(&self) -> ChannelReader<'_> {
        self.system[TIMESTAMP_KEY as usize].reader()
    }

    pub(crate) fn set_timestamp(&mut self, elapsed_secs: f32) {
        self.system[TIMESTAMP_KEY as usize].set_pending(elapsed_secs);
    }

    pub fn rename(&mut self, key: DataKey, name: impl Into<String>) -> Result<(), GraphError> {
        Self::check_user_key(key)?;
        let channel = self.get_mut(key).ok_or(GraphError::UnknownKey(key))?;
        channel.rename(name);
        Ok(())
    }

    /// Occupied channels in key order, system channels first.
    pub fn iter(&self) -> impl Iterator<Item = (DataKey, &Channel)> {
        let system = self
            .system
            .iter()
            .enumerate()
            .map(|(slot, ch)| (slot as DataKey, ch));
        system.chain(self.user.iter().map(|(&key, ch)| (key, ch)))
    }

    /// Commits every channel's pending value, in key order.
    pub(crate) fn determine_all(&mut self) {
        for channel in self.channels_mut() {
            channel.determine();
        }
    }

    pub(crate) fn clear_all(&mut self) {
        for channel in self.channels_mut() {
            channel.clear();
        }
    }

    fn channels_mut(&mut self) -> impl Iterator<Item = &mut Channel> {
        self.system
            .iter_mut()
            .chain(self.user.values_mut())
    }
}
