//! Event types and sinks for observing a running simulation.
//!
//! This module defines [`WeatherEvent`] and a set of sinks to emit, collect, or forward events
//! while stepping a [`crate::weather::WeatherSystem`] via
//! [`crate::weather::WeatherSystem::step_with_events`]. Events are a side channel: sending them
//! never changes simulation state.
use glam::Vec2;

use crate::particle::RetireReason;
use crate::preset::CloudTypeId;

/// Why a cloud was spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnReason {
    /// The cloud created when the system was constructed.
    Initial,
    /// The sky was empty at the start of a frame.
    Refill,
    /// Regular spawn policy.
    Scheduled,
    /// Forced at the end of a frame to keep at least one cloud alive.
    Forced,
}

/// Describes events emitted while stepping the simulation.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum WeatherEvent {
    /// A new cloud entered the domain.
    Spawned {
        cloud_type: CloudTypeId,
        position: Vec2,
        reason: SpawnReason,
    },

    /// A cloud was removed from the population.
    Retired {
        cloud_type: CloudTypeId,
        /// Last position of the cloud.
        position: Vec2,
        /// Age in frames at retirement.
        age: u32,
        reason: RetireReason,
    },

    /// A cloud broke up into fragments.
    Split {
        cloud_type: CloudTypeId,
        /// Position of the parent cloud.
        position: Vec2,
        /// Number of fragments created.
        fragments: usize,
    },

    /// Emitted at the end of every step.
    StepFinished {
        sim_time: f64,
        /// Population after the step.
        population: usize,
        /// Clouds retired during the step.
        retired: usize,
    },

    /// Non-fatal condition worth surfacing.
    Warning {
        /// Context string (e.g. frame number).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`WeatherEvent`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherEventKind {
    Spawned,
    Retired,
    Split,
    StepFinished,
    Warning,
}

impl WeatherEvent {
    pub fn kind(&self) -> WeatherEventKind {
        match self {
            Self::Spawned { .. } => WeatherEventKind::Spawned,
            Self::Retired { .. } => WeatherEventKind::Retired,
            Self::Split { .. } => WeatherEventKind::Split,
            Self::StepFinished { .. } => WeatherEventKind::StepFinished,
            Self::Warning { .. } => WeatherEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`WeatherEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: WeatherEvent);

    /// Whether the sink cares about events of `kind`. Producers skip building unwanted events.
    fn wants(&mut self, _kind: WeatherEventKind) -> bool {
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = WeatherEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: WeatherEvent) {}

    #[inline]
    fn wants(&mut self, _kind: WeatherEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(WeatherEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(WeatherEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(WeatherEvent),
{
    #[inline]
    fn send(&mut self, event: WeatherEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally restricted to some kinds.
#[derive(Default)]
pub struct VecSink {
    events: Vec<WeatherEvent>,
    only: Option<Vec<WeatherEventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
            only: None,
        }
    }

    /// Only record events of the given kinds.
    pub fn only(kinds: impl IntoIterator<Item = WeatherEventKind>) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.into_iter().collect()),
        }
    }

    pub fn into_inner(self) -> Vec<WeatherEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[WeatherEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: WeatherEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    fn wants(&mut self, kind: WeatherEventKind) -> bool {
        self.only.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: WeatherEvent) {
        if self.sinks.is_empty() {
            return;
        }
        let last_idx = self.sinks.len() - 1;
        for i in 0..last_idx {
            self.sinks[i].send(event.clone());
        }
        self.sinks[last_idx].send(event);
    }

    fn wants(&mut self, kind: WeatherEventKind) -> bool {
        self.sinks.iter_mut().any(|s| s.wants(kind))
    }
}
