//! Selection state machine.
//!
//! `Uninitialized → Initializing → Resolving ⇄ Ready → Cleared`.
//!
//! Every selection bumps a generation counter and hands out a
//! [`ResolveTicket`]. A name is only accepted for the ticket of the current
//! selection, so a slow answer for an older coordinate is dropped.

use crate::location::{Coordinate, PlaceInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initializing,
    Resolving,
    Ready,
    Cleared,
}

/// Identifies one name resolution: the selection it was issued for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveTicket {
    generation: u64,
    coordinate: Coordinate,
}

impl ResolveTicket {
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

#[derive(Debug)]
pub struct SelectionState {
    coordinate: Option<Coordinate>,
    display_name: String,
    is_resolving_name: bool,
    is_initializing: bool,
    phase: Phase,
    generation: u64,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            coordinate: None,
            display_name: String::new(),
            is_resolving_name: false,
            is_initializing: false,
            phase: Phase::Uninitialized,
            generation: 0,
        }
    }

    pub fn begin_initializing(&mut self) {
        if self.phase == Phase::Uninitialized {
            self.phase = Phase::Initializing;
            self.is_initializing = true;
        }
    }

    /// Geolocation settled (success or fallback).
    pub fn finish_initializing(&mut self) {
        self.is_initializing = false;
    }

    /// Replace the selection. The previous name is dropped until the new
    /// resolution completes.
    pub fn select(&mut self, coordinate: Coordinate) -> ResolveTicket {
        self.generation += 1;
        self.coordinate = Some(coordinate);
        self.display_name.clear();
        self.is_resolving_name = true;
        self.is_initializing = false;
        self.phase = Phase::Resolving;
        ResolveTicket {
            generation: self.generation,
            coordinate,
        }
    }

    /// Apply a resolved name. Returns `false` if the ticket was superseded.
    pub fn complete(&mut self, ticket: ResolveTicket, name: String) -> bool {
        if !self.is_current(&ticket) {
            return false;
        }
        self.display_name = name;
        self.is_resolving_name = false;
        self.phase = Phase::Ready;
        true
    }

    pub fn is_current(&self, ticket: &ResolveTicket) -> bool {
        ticket.generation == self.generation && self.coordinate == Some(ticket.coordinate)
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.coordinate = None;
        self.display_name.clear();
        self.is_resolving_name = false;
        self.phase = Phase::Cleared;
    }

    /// Teardown: every outstanding ticket becomes stale.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.is_resolving_name = false;
        self.is_initializing = false;
    }

    /// The committable place, or `None` without a selection.
    pub fn place_info(&self, unnamed: &str) -> Option<PlaceInfo> {
        let coordinate = self.coordinate?;
        let name = if self.display_name.is_empty() {
            unnamed
        } else {
            self.display_name.as_str()
        };
        Some(PlaceInfo::new(name, coordinate))
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_resolving_name(&self) -> bool {
        self.is_resolving_name
    }

    pub fn is_initializing(&self) -> bool {
        self.is_initializing
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}
