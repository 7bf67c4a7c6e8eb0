// src/graph/channel.rs
use std::ops::Index;

use serde::{Deserialize, Serialize};

use super::range::IndexRange;

/// One committed value. `index` is the commit ordinal inside its channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub index: usize,
    pub value: f32,
}

/// Append-only sample history plus the value pending for the current tick.
#[derive(Clone, Debug, Default)]
pub struct Channel {
    name: String,
    history: Vec<Sample>,
    pending: f32,
    dirty: bool,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Overwrites the pending value. History is untouched until [`Channel::determine`].
    pub fn set_pending(&mut self, value: f32) {
        self.pending = value;
        self.dirty = true;
    }

    /// Whether `set_pending` was called since the last commit.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Commits the pending value as the next sample. Meant to run once per tick;
    /// calling it again without a new write records the same value again.
    pub fn determine(&mut self) {
        let index = self.history.len();
        self.history.push(Sample {
            index,
            value: self.pending,
        });
        self.dirty = false;
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.pending = 0.0;
        self.dirty = false;
    }

    pub fn reader(&self) -> ChannelReader<'_> {
        ChannelReader { channel: self }
    }
}

/// Read-only view over a [`Channel`].
#[derive(Clone, Copy, Debug)]
pub struct ChannelReader<'a> {
    channel: &'a Channel,
}

impl<'a> ChannelReader<'a> {
    pub fn name(&self) -> &'a str {
        &self.channel.name
    }

    pub fn count(&self) -> usize {
        self.channel.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.history.is_empty()
    }

    pub fn current_value(&self) -> f32 {
        self.channel.pending
    }

    pub fn latest_value(&self) -> Option<f32> {
        self.channel.history.last().map(|s| s.value)
    }

    pub fn sample(&self, position: usize) -> Option<Sample> {
        self.channel.history.get(position).copied()
    }

    pub fn samples(&self) -> &'a [Sample] {
        &self.channel.history
    }

    /// Samples covered by `range`, clipped to what this channel holds. An
    /// inverted range yields an empty slice.
    pub fn slice(&self, range: IndexRange) -> &'a [Sample] {
        let history = &self.channel.history;
        let start = range.first.min(history.len());
        let end = range.last.saturating_add(1).min(history.len()).max(start);
        &history[start..end]
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Sample> {
        self.channel.history.iter()
    }
}

impl Index<usize> for ChannelReader<'_> {
    type Output = Sample;

    fn index(&self, position: usize) -> &Sample {
        &self.channel.history[position]
    }
}
