//! Rubber regions and threshold-driven section navigation

use serde::{Deserialize, Serialize};

use super::bus::{KickBus, KickEvent, KickListener};
use super::spring::{RubberSpring, rubber};
use crate::sim::snapshot::RubberSnapshot;
use crate::tuning::{NavTuning, SpringTuning};

/// Page sections in navigation order
pub const DEFAULT_SECTIONS: [&str; 4] = ["home", "projects", "stack", "contact"];

/// A spring bound to one page section, publishing every kick
#[derive(Debug)]
pub struct RubberRegion {
    section: String,
    spring: RubberSpring,
    bus: KickBus,
}

impl RubberRegion {
    pub fn new(section: impl Into<String>, tuning: SpringTuning, bus: KickBus) -> Self {
        Self {
            section: section.into(),
            spring: RubberSpring::new(tuning),
            bus,
        }
    }

    /// Kick the spring and publish the resulting raw position
    pub fn kick(&mut self, delta: f32, now_ms: f64) -> f32 {
        let raw = self.spring.kick(delta);
        self.bus.publish(&KickEvent {
            section: self.section.clone(),
            raw,
            at_ms: now_ms,
        });
        raw
    }

    /// Returns whether another frame is wanted
    pub fn frame(&mut self, now_ms: f64) -> bool {
        self.spring.frame(now_ms)
    }

    pub fn suspend(&mut self) {
        self.spring.suspend();
    }

    pub fn snapshot(&self) -> RubberSnapshot {
        RubberSnapshot {
            display_displacement: self.spring.display(),
            raw_displacement: self.spring.raw(),
        }
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn spring(&self) -> &RubberSpring {
        &self.spring
    }

    /// Largest |raw| reached since the spring last rested
    pub fn peak(&self) -> f32 {
        self.spring.peak()
    }

    pub fn is_active(&self) -> bool {
        self.spring.is_active()
    }
}

/// A section change for the host to carry out (scroll, URL hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavRequest {
    pub index: usize,
    pub section: String,
}

/// Moves between sections when the rubber displacement crosses a threshold.
///
/// Mapped displacement is positive toward the next section. After any
/// transition further kicks only move the visual offset until the lock
/// expires.
#[derive(Debug, Clone)]
pub struct SectionNavigator {
    sections: Vec<String>,
    active: usize,
    tuning: NavTuning,
    /// Last mapped value that passed the change filter
    last_mapped: f32,
    offset: f32,
    last_event_ms: Option<f64>,
    locked_until_ms: f64,
    pending: Option<NavRequest>,
}

impl SectionNavigator {
    pub fn new<S: Into<String>>(sections: impl IntoIterator<Item = S>, tuning: NavTuning) -> Self {
        Self {
            sections: sections.into_iter().map(Into::into).collect(),
            active: 0,
            tuning,
            last_mapped: 0.0,
            offset: 0.0,
            last_event_ms: None,
            locked_until_ms: f64::NEG_INFINITY,
            pending: None,
        }
    }

    pub fn with_defaults(tuning: NavTuning) -> Self {
        Self::new(DEFAULT_SECTIONS, tuning)
    }

    /// Kick value mapped into navigation space
    pub fn map(&self, raw: f32) -> f32 {
        -rubber(raw, self.tuning.limit, self.tuning.softness)
    }

    pub fn active(&self) -> &str {
        self.sections.get(self.active).map_or("", String::as_str)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// Visual nudge at `now_ms`; returns to zero `return_ms` after the last kick
    pub fn offset_at(&self, now_ms: f64) -> f32 {
        match self.last_event_ms {
            Some(at) if now_ms - at < self.tuning.return_ms => self.offset,
            _ => 0.0,
        }
    }

    pub fn is_locked(&self, now_ms: f64) -> bool {
        now_ms < self.locked_until_ms
    }

    /// Hand the queued section change to the host
    pub fn take_request(&mut self) -> Option<NavRequest> {
        self.pending.take()
    }

    /// Navigate straight to `id` (menu click, hash change)
    pub fn jump_to(&mut self, id: &str, now_ms: f64) -> bool {
        match self.sections.iter().position(|s| s == id) {
            Some(index) => {
                self.go(index, now_ms);
                true
            }
            None => {
                log::warn!("Unknown section '{}'", id);
                false
            }
        }
    }

    fn go(&mut self, index: usize, now_ms: f64) {
        log::debug!("Section {} -> {}", self.active(), self.sections[index]);
        self.active = index;
        self.offset = 0.0;
        self.locked_until_ms = now_ms + self.tuning.unlock_ms;
        self.pending = Some(NavRequest {
            index,
            section: self.sections[index].clone(),
        });
    }

    fn neighbour(&self, forward: bool) -> Option<usize> {
        if forward {
            let next = self.active + 1;
            (next < self.sections.len()).then_some(next)
        } else {
            self.active.checked_sub(1)
        }
    }
}

impl KickListener for SectionNavigator {
    fn on_kick(&mut self, event: &KickEvent) {
        let mapped = self.map(event.raw);
        if (mapped - self.last_mapped).abs() < self.tuning.min_change {
            return;
        }
        self.last_mapped = mapped;
        self.offset = mapped;
        self.last_event_ms = Some(event.at_ms);

        if self.is_locked(event.at_ms) {
            return;
        }

        let target = if mapped > self.tuning.threshold {
            self.neighbour(true)
        } else if mapped < -self.tuning.threshold {
            self.neighbour(false)
        } else {
            None
        };
        if let Some(index) = target {
            self.go(index, event.at_ms);
        }
    }
}
