//! Active rotation selection with sticky memory.
//!
//! The memory value is threaded through the caller's refresh loop: it is
//! passed into [`select_week_type`] and the updated value is handed back.
//! Nothing is stored globally.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::WeekType;

/// Rotation chosen when there is no override, no upstream signal and no
/// memory. Kept for compatibility with the existing portal; there is no
/// known business rule behind it.
pub const DEFAULT_WEEK_TYPE: WeekType = WeekType::A;

/// Last rotation decided for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionMemory(Option<WeekType>);

impl SelectionMemory {
    /// Empty memory, as at the start of a session.
    pub fn new() -> Self {
        Self(None)
    }

    pub fn remembering(week_type: WeekType) -> Self {
        Self(Some(week_type))
    }

    pub fn last(&self) -> Option<WeekType> {
        self.0
    }
}

/// Where the active rotation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionSource {
    /// Explicit user choice
    Override,
    /// Inferred from upstream day metadata on this refresh
    Upstream,
    /// Reused from a previous refresh
    Memory,
    /// First load with no signal at all
    Default,
}

/// Result of one selection decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub week_type: WeekType,
    pub source: SelectionSource,
}

/// Decide the active rotation for one refresh.
///
/// Order: explicit override, then the upstream inference, then memory,
/// then [`DEFAULT_WEEK_TYPE`]. The returned memory always holds the
/// decided letter, including defaults.
pub fn select_week_type(
    current: Option<WeekType>,
    external: Option<WeekType>,
    memory: SelectionMemory,
) -> (Selection, SelectionMemory) {
    let selection = match (current, external, memory.last()) {
        (Some(week_type), _, _) => Selection {
            week_type,
            source: SelectionSource::Override,
        },
        (None, Some(week_type), _) => Selection {
            week_type,
            source: SelectionSource::Upstream,
        },
        (None, None, Some(week_type)) => Selection {
            week_type,
            source: SelectionSource::Memory,
        },
        (None, None, None) => Selection {
            week_type: DEFAULT_WEEK_TYPE,
            source: SelectionSource::Default,
        },
    };

    debug!(
        "selected week {} ({:?}); previous memory {:?}",
        selection.week_type,
        selection.source,
        memory.last()
    );

    (selection, SelectionMemory::remembering(selection.week_type))
}
