//! Core type definitions used throughout the codebase

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Simulation time unit
pub type Step = u64;

/// The three actions an agent can take each step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    /// Situational awareness
    Patrol,
    /// Signalling / influence building
    Signal,
    /// Reinforcement, the forceful option
    Reinforce,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Patrol, ActionKind::Signal, ActionKind::Reinforce];

    pub fn index(self) -> usize {
        match self {
            ActionKind::Patrol => 0,
            ActionKind::Signal => 1,
            ActionKind::Reinforce => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Single-letter label used in step records
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Patrol => "P",
            ActionKind::Signal => "S",
            ActionKind::Reinforce => "R",
        }
    }

    pub fn is_forceful(self) -> bool {
        self == ActionKind::Reinforce
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed lookup table with one slot per action, ordered Patrol, Signal, Reinforce
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerAction<T>(pub [T; 3]);

impl<T: Copy> PerAction<T> {
    pub const fn new(patrol: T, signal: T, reinforce: T) -> Self {
        Self([patrol, signal, reinforce])
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionKind, T)> + '_ {
        ActionKind::ALL.iter().map(move |&a| (a, self.0[a.index()]))
    }
}

impl<T> Index<ActionKind> for PerAction<T> {
    type Output = T;
    fn index(&self, action: ActionKind) -> &T {
        &self.0[action.index()]
    }
}

impl<T> IndexMut<ActionKind> for PerAction<T> {
    fn index_mut(&mut self, action: ActionKind) -> &mut T {
        &mut self.0[action.index()]
    }
}
