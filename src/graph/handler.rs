// src/graph/handler.rs
use std::sync::mpsc::{channel, Receiver, Sender};

use log::{debug, info, warn};

use super::channel::{Channel, ChannelReader};
use super::clock::{Clock, SystemClock};
use super::error::GraphError;
use super::range::{resolve_index_range, IndexRange};
use super::registry::{ChannelRegistry, DataKey, RegistryPolicy, TIMESTAMP_KEY};
use super::scope::{GridParams, ScopeParams, ScopeRect};
use crate::config::GraphConfig;

/// Sent to every subscriber after each completed [`GraphHandler::update_graph`].
/// Carries nothing; subscribers read the new state back from the handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphUpdated;

/// Owns the channels and drives the commit / scope / index-range cycle.
///
/// Everything runs on the caller's thread. The host calls [`GraphHandler::on_tick`]
/// once per frame (or [`GraphHandler::determine`] by hand) and
/// [`GraphHandler::on_geometry_changed`] when its drawing area changes.
pub struct GraphHandler<C: Clock = SystemClock> {
    registry: ChannelRegistry,
    clock: C,
    session_start: f32,
    auto_commit_on_tick: bool,
    data_accepted: bool,
    scope: ScopeParams,
    grid: GridParams,
    scope_rect: ScopeRect,
    index_range: Option<IndexRange>,
    subscribers: Vec<Sender<GraphUpdated>>,
}

impl GraphHandler<SystemClock> {
    pub fn new(config: &GraphConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> GraphHandler<C> {
    pub fn with_clock(config: &GraphConfig, clock: C) -> Self {
        let config = config.sanitized();
        let session_start = clock.now_secs();
        let mut handler = Self {
            registry: ChannelRegistry::new(config.policy()),
            clock,
            session_start,
            auto_commit_on_tick: config.auto_commit_on_tick,
            data_accepted: false,
            scope: config.scope,
            grid: config.grid,
            scope_rect: config.scope.rect(),
            index_range: None,
            subscribers: Vec::new(),
        };
        for spec in &config.channels {
            if let Err(e) = handler.registry.register(spec.key, Channel::new(spec.name.clone())) {
                warn!("skipping configured channel {}: {e}", spec.key);
            }
        }
        handler.update_graph();
        handler
    }

    /// Replaces policy, scope and grid, keeps all recorded data.
    pub fn apply_config(&mut self, config: &GraphConfig) {
        let config = config.sanitized();
        self.registry.set_policy(config.policy());
        self.auto_commit_on_tick = config.auto_commit_on_tick;
        self.scope = config.scope;
        self.grid = config.grid;
        self.update_graph();
    }

    pub fn register(&mut self, key: DataKey, name: impl Into<String>) -> Result<(), GraphError> {
        self.registry.register(key, Channel::new(name))
    }

    pub fn remove(&mut self, key: DataKey) -> Result<Option<Channel>, GraphError> {
        self.registry.remove(key)
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn rename(&mut self, key: DataKey, name: impl Into<String>) -> Result<(), GraphError> {
        self.registry.rename(key, name)
    }

    /// Producer write path. Never fails; rejected writes are logged by the registry.
    pub fn set_value(&mut self, key: DataKey, value: f32) {
        if self.registry.set_value(key, value) {
            self.data_accepted = true;
        }
    }

    pub fn reader(&mut self, key: DataKey) -> Result<ChannelReader<'_>, GraphError> {
        self.registry.reader(key)
    }

    pub fn try_reader(&self, key: DataKey) -> Option<ChannelReader<'_>> {
        self.registry.try_reader(key)
    }

    pub fn timestamps(&self) -> ChannelReader<'_> {
        self.registry.timestamp()
    }

    /// Stamps the tick with the session time, commits every channel, then
    /// refreshes the graph.
    pub fn determine(&mut self) {
        let elapsed = self.clock.now_secs() - self.session_start;
        self.registry.set_timestamp(elapsed);
        self.registry.determine_all();
        self.data_accepted = false;
        self.update_graph();
    }

    /// Recomputes the scope window and the in-scope index range, then notifies
    /// subscribers.
    pub fn update_graph(&mut self) {
        if self.scope.follow_latest {
            if let Some(latest) = self.registry.latest_value(TIMESTAMP_KEY) {
                self.scope.offset_x = latest;
            }
        }
        self.scope_rect = self.scope.rect();
        self.index_range = resolve_index_range(
            self.registry.timestamp().samples(),
            self.scope_rect.x_min,
            self.scope_rect.x_max,
        );
        debug!(
            "graph updated: x [{}, {}] -> {:?}",
            self.scope_rect.x_min, self.scope_rect.x_max, self.index_range
        );
        self.notify();
    }

    /// Drops all recorded samples and restarts the session clock.
    pub fn clear_all(&mut self) {
        self.registry.clear_all();
        self.session_start = self.clock.now_secs();
        self.scope.offset_x = 0.0;
        self.data_accepted = false;
        info!("cleared all channels");
        self.update_graph();
    }

    /// Host tick. Commits only when auto-commit is on and a write was accepted
    /// since the last commit.
    pub fn on_tick(&mut self) {
        if self.auto_commit_on_tick && self.data_accepted {
            self.determine();
        }
    }

    pub fn on_geometry_changed(&mut self) {
        self.update_graph();
    }

    pub fn has_pending_data(&self) -> bool {
        self.data_accepted
    }

    pub fn policy(&self) -> RegistryPolicy {
        self.registry.policy()
    }

    pub fn set_policy(&mut self, policy: RegistryPolicy) {
        self.registry.set_policy(policy);
    }

    pub fn auto_commit_on_tick(&self) -> bool {
        self.auto_commit_on_tick
    }

    pub fn set_auto_commit_on_tick(&mut self, enabled: bool) {
        self.auto_commit_on_tick = enabled;
    }

    pub fn scope(&self) -> ScopeParams {
        self.scope
    }

    pub fn set_scope(&mut self, scope: ScopeParams) {
        self.scope = scope.clamped();
        self.update_graph();
    }

    pub fn grid(&self) -> GridParams {
        self.grid
    }

    pub fn set_grid(&mut self, grid: GridParams) {
        self.grid = grid.clamped();
        self.update_graph();
    }

    pub fn current_scope_rect(&self) -> ScopeRect {
        self.scope_rect
    }

    pub fn current_index_range(&self) -> Option<IndexRange> {
        self.index_range
    }

    pub fn in_scope_first_index(&self) -> i64 {
        IndexRange::signed(self.index_range).0
    }

    pub fn in_scope_last_index(&self) -> i64 {
        IndexRange::signed(self.index_range).1
    }

    pub fn in_scope_count(&self) -> usize {
        self.index_range.map_or(0, |r| r.count())
    }

    /// Registers a listener. Dropping the receiver unsubscribes it.
    pub fn subscribe(&mut self) -> Receiver<GraphUpdated> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self) {
        self.subscribers.retain(|tx| tx.send(GraphUpdated).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::clock::ManualClock;

    fn fixed_scope(offset_x: f32, width: f32) -> ScopeParams {
        ScopeParams {
            offset_x,
            width,
            follow_latest: false,
            ..ScopeParams::default()
        }
    }

    fn handler_at(clock: &ManualClock, config: GraphConfig) -> GraphHandler<ManualClock> {
        GraphHandler::with_clock(&config, clock.clone())
    }

    #[test]
    fn five_commits_then_clear() {
        let clock = ManualClock::new(0.0);
        let mut handler = handler_at(&clock, GraphConfig::default());
        handler.register(1, "data").unwrap();
        handler.set_scope(fixed_scope(3.0, 2.0));

        for (t, value) in [10.0, 20.0, 30.0, 40.0, 50.0].into_iter().enumerate() {
            clock.set(t as f32);
            handler.set_value(1, value);
            handler.determine();
        }

        let stamps: Vec<f32> = handler.timestamps().iter().map(|s| s.value).collect();
        assert_eq!(stamps, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(handler.current_index_range(), Some(IndexRange { first: 1, last: 3 }));
        let visible: Vec<f32> = {
            let range = handler.current_index_range().unwrap();
            handler.reader(1).unwrap().slice(range).iter().map(|s| s.value).collect()
        };
        assert_eq!(visible, vec![20.0, 30.0, 40.0]);

        handler.clear_all();
        assert_eq!(handler.current_index_range(), None);
        assert_eq!(handler.in_scope_first_index(), -1);
        assert_eq!(handler.in_scope_last_index(), -1);
        assert_eq!(handler.reader(1).unwrap().count(), 0);
    }

    #[test]
    fn history_grows_by_one_per_determine() {
        let clock = ManualClock::new(0.0);
        let mut handler = handler_at(&clock, GraphConfig::default());
        handler.register(1, "a").unwrap();
        for n in 1..=20 {
            clock.advance(0.1);
            handler.determine();
            assert_eq!(handler.timestamps().count(), n);
            assert_eq!(handler.reader(1).unwrap().count(), n);
        }
    }

    #[test]
    fn timestamps_are_relative_to_session_start() {
        let clock = ManualClock::new(100.0);
        let mut handler = handler_at(&clock, GraphConfig::default());
        clock.advance(1.5);
        handler.determine();
        assert_eq!(handler.registry().latest_value(TIMESTAMP_KEY), Some(1.5));

        clock.set(200.0);
        handler.clear_all();
        clock.set(202.0);
        handler.determine();
        assert_eq!(handler.registry().latest_value(TIMESTAMP_KEY), Some(2.0));
    }

    #[test]
    fn follow_latest_tracks_newest_timestamp() {
        let clock = ManualClock::new(0.0);
        let mut handler = handler_at(&clock, GraphConfig::default());
        assert!(handler.scope().follow_latest);
        assert_eq!(handler.current_scope_rect().x_max, 0.0);

        for t in 1..=10 {
            clock.set(t as f32);
            handler.determine();
        }
        let rect = handler.current_scope_rect();
        assert_eq!(rect.x_max, 10.0);
        assert_eq!(rect.x_min, 5.0);
        assert_eq!(handler.current_index_range(), Some(IndexRange { first: 4, last: 9 }));
        assert_eq!(handler.in_scope_count(), 6);

        handler.clear_all();
        assert_eq!(handler.scope().offset_x, 0.0);
        assert_eq!(handler.current_scope_rect().x_max, 0.0);
    }

    #[test]
    fn on_tick_commits_only_after_accepted_writes() {
        let clock = ManualClock::new(0.0);
        let mut handler = handler_at(&clock, GraphConfig::default());
        handler.register(1, "a").unwrap();

        handler.on_tick();
        assert_eq!(handler.timestamps().count(), 0);

        handler.set_value(TIMESTAMP_KEY, 5.0);
        handler.set_value(9, 5.0);
        handler.on_tick();
        assert_eq!(handler.timestamps().count(), 0);

        handler.set_value(1, 5.0);
        assert!(handler.has_pending_data());
        handler.on_tick();
        assert_eq!(handler.timestamps().count(), 1);
        assert!(!handler.has_pending_data());

        handler.on_tick();
        assert_eq!(handler.timestamps().count(), 1);
    }

    #[test]
    fn rename_leaves_pending_writes_to_the_tick() {
        let clock = ManualClock::new(0.0);
        let mut handler = handler_at(&clock, GraphConfig::default());
        handler.register(1, "a").unwrap();
        handler.set_value(1, 3.0);
        handler.rename(1, "pressure").unwrap();
        assert_eq!(handler.rename(TIMESTAMP_KEY, "x"), Err(GraphError::ReservedKey(0)));

        handler.on_tick();
        let reader = handler.reader(1).unwrap();
        assert_eq!(reader.name(), "pressure");
        assert_eq!(reader.latest_value(), Some(3.0));
    }

    #[test]
    fn manual_mode_ignores_ticks() {
        let clock = ManualClock::new(0.0);
        let config = GraphConfig {
            auto_commit_on_tick: false,
            ..GraphConfig::default()
        };
        let mut handler = handler_at(&clock, config);
        handler.register(1, "a").unwrap();
        handler.set_value(1, 1.0);
        handler.on_tick();
        assert_eq!(handler.timestamps().count(), 0);
        handler.determine();
        assert_eq!(handler.timestamps().count(), 1);
    }

    #[test]
    fn reserved_key_write_keeps_timestamp_pending() {
        let clock = ManualClock::new(0.0);
        let mut handler = handler_at(&clock, GraphConfig::default());
        let before = handler.timestamps().current_value();
        handler.set_value(TIMESTAMP_KEY, 42.0);
        assert_eq!(handler.timestamps().current_value(), before);
    }

    #[test]
    fn unregistered_key_policy() {
        let clock = ManualClock::new(0.0);
        let permissive = GraphConfig {
            accept_unregistered_keys: true,
            ..GraphConfig::default()
        };
        let mut handler = handler_at(&clock, permissive);
        handler.set_value(7, 3.0);
        assert_eq!(handler.reader(7).unwrap().current_value(), 3.0);

        let mut strict = handler_at(&clock, GraphConfig::default());
        strict.set_value(7, 3.0);
        assert_eq!(strict.reader(7).unwrap_err(), GraphError::UnknownKey(7));
    }

    #[test]
    fn subscribers_hear_every_update_until_dropped() {
        let clock = ManualClock::new(0.0);
        let mut handler = handler_at(&clock, GraphConfig::default());
        let first = handler.subscribe();
        let second = handler.subscribe();

        handler.determine();
        handler.on_geometry_changed();
        assert_eq!(first.try_iter().count(), 2);
        assert_eq!(second.try_recv(), Ok(GraphUpdated));

        drop(second);
        handler.update_graph();
        assert_eq!(first.try_iter().count(), 1);
        assert_eq!(handler.subscribers.len(), 1);
    }

    #[test]
    fn scope_and_grid_are_clamped_on_change() {
        let clock = ManualClock::new(0.0);
        let mut handler = handler_at(&clock, GraphConfig::default());
        handler.set_scope(ScopeParams {
            width: 0.0,
            height: -1.0,
            ..handler.scope()
        });
        let rect = handler.current_scope_rect();
        assert!(rect.width() > 0.0);
        assert!(rect.height() > 0.0);

        handler.set_grid(GridParams {
            subdivision_x: 0,
            cell_width: -2.0,
            ..handler.grid()
        });
        assert_eq!(handler.grid().subdivision_x, 1);
        assert!(handler.grid().cell_width > 0.0);
    }

    #[test]
    fn apply_config_keeps_recorded_data() {
        let clock = ManualClock::new(0.0);
        let mut handler = handler_at(&clock, GraphConfig::default());
        handler.register(1, "a").unwrap();
        handler.set_value(1, 2.0);
        handler.determine();

        handler.apply_config(&GraphConfig {
            accept_data: false,
            auto_commit_on_tick: false,
            ..GraphConfig::default()
        });
        assert!(!handler.policy().accept_data);
        assert!(!handler.auto_commit_on_tick());
        handler.set_value(1, 5.0);
        assert!(!handler.has_pending_data());
        assert_eq!(handler.reader(1).unwrap().latest_value(), Some(2.0));
    }

    #[test]
    fn configured_channels_are_registered() {
        let clock = ManualClock::new(0.0);
        let config: GraphConfig = serde_json::from_str(
            r#"{ "channels": [ { "key": 2, "name": "rpm" }, { "key": 0, "name": "bad" } ] }"#,
        )
        .unwrap();
        let handler = handler_at(&clock, config);
        assert_eq!(handler.registry().get(2).unwrap().name(), "rpm");
        assert_eq!(handler.registry().get(0).unwrap().name(), "Timestamp");
    }
}
