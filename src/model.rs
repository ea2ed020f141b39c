//! The in-memory session model: [`Session`], [`Competitor`] and
//! [`RaceClass`], and the invariants that bind them.

use std::collections::HashMap;

use crate::time::{self, NO_TIME_SENTINEL};

/// Ordering strategy currently in effect for a [`Session`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Race,
    Qualifying,
}

impl SortMode {
    /// The string used in the session snapshot table's `SortMode` column.
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Race => "RACE",
            SortMode::Qualifying => "QUALIFYING",
        }
    }
}

/// One entrant in the current session.
///
/// Constructed with all fields empty/zero except `racer_id`; every other
/// field is populated incrementally by record handlers as data arrives.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Competitor {
    pub racer_id: String,
    pub number: String,
    pub transponder: String,

    pub first_name: String,
    pub last_name: String,
    pub nationality: String,
    pub category: String,
    /// Never populated by any record handler in the observed protocol;
    /// retained as a snapshot column for forward compatibility.
    pub category_description: String,
    pub additional_data: String,

    pub position: String,
    pub laps: String,
    pub total_time: String,
    pub total_time_ms: u64,

    pub best_position: String,
    pub best_lap: String,
    pub best_time: String,
    pub best_time_ms: u64,

    pub last_lap_time: String,
    /// Never populated by any record handler in the observed protocol;
    /// retained as a snapshot column for forward compatibility.
    pub last_split_time: String,

    /// Set when timing or position changed during the current batch;
    /// cleared by the snapshot builder once a batch has been published.
    pub data_updated: bool,

    pub calculated_gap: String,
    pub calculated_diff: String,
    /// Never populated by any record handler in the observed protocol;
    /// retained as a snapshot column for forward compatibility.
    pub display_position: String,
}

impl Competitor {
    fn new(racer_id: &str) -> Self {
        Competitor {
            racer_id: racer_id.to_owned(),
            ..Default::default()
        }
    }

    /// Sets `total_time`, re-deriving `total_time_ms` per the sentinel rule.
    pub fn set_total_time(&mut self, value: &str) {
        self.total_time = value.to_owned();
        self.total_time_ms = time::parse_time(value);
    }

    /// Sets `best_time`, re-deriving `best_time_ms` per the sentinel rule.
    pub fn set_best_time(&mut self, value: &str) {
        self.best_time = value.to_owned();
        self.best_time_ms = time::parse_time(value);
    }

    /// `int(laps)` when `laps` is all digits, else `0`.
    pub fn laps_int(&self) -> u64 {
        digits_or(&self.laps, 0)
    }
}

/// A race class as announced by a `$C` record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RaceClass {
    pub class_id: String,
    pub description: String,
}

/// The singleton session store owned by the handler.
#[derive(Debug, Default)]
pub struct Session {
    pub session_id: String,
    pub session_name: String,
    pub track_name: String,
    pub track_length: String,
    pub current_time: String,
    pub session_time: String,
    pub time_to_go: String,
    pub laps_to_go: String,
    pub flag_status: String,

    pub sort_mode: SortMode,

    pub competitors: HashMap<String, Competitor>,
    pub classes: HashMap<String, RaceClass>,
    pub sorted_competitors: Vec<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the competitor keyed by `racer_id`, creating a default entry
    /// on first reference.
    pub fn competitor_mut(&mut self, racer_id: &str) -> &mut Competitor {
        self.competitors
            .entry(racer_id.to_owned())
            .or_insert_with(|| Competitor::new(racer_id))
    }

    pub fn competitor(&self, racer_id: &str) -> Option<&Competitor> {
        self.competitors.get(racer_id)
    }

    /// All known competitors, in no particular order — callers that need
    /// the current display order should read `sorted_competitors` instead.
    pub fn all_competitors(&self) -> impl Iterator<Item = &Competitor> {
        self.competitors.values()
    }

    /// Resets everything except `sort_mode`, per the data-model invariant.
    pub fn reset(&mut self) {
        let sort_mode = self.sort_mode;
        *self = Session {
            sort_mode,
            ..Session::default()
        };
    }
}

/// `int(s)` when `s` is non-empty and all ASCII digits; otherwise the
/// "unpositioned" sentinel `9999`.
pub fn pos_key(s: &str) -> u64 {
    digits_or(s, 9999)
}

fn digits_or(s: &str, default: u64) -> u64 {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().unwrap_or(default)
    } else {
        default
    }
}

/// `true` iff `value` is empty or the no-time sentinel (used by callers
/// that need the raw string-level check rather than the derived `_ms`
/// field, e.g. when validating a freshly decoded record before storing).
pub fn is_no_time(value: &str) -> bool {
    value.is_empty() || value == NO_TIME_SENTINEL
}
