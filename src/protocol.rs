//! Protocol implementation for decoding RMonitor live-session records.
//!
//! # Example
//!
//! ```
//! use rmonitor_live::protocol::Record;
//!
//! let data = r#"$A,"1234BE","12X","52474","John","Johnson","USA","A""#;
//! let record = Record::decode(data);
//!
//! assert!(record.is_ok());
//! assert!(matches!(record, Ok(Record::Competitor(_))));
//! ```

use thiserror::Error;

/// RMonitor commands are represented in messages by ASCII strings.
pub mod command {
    pub const HEARTBEAT: &str = "$F";
    pub const COMPETITOR: &str = "$A";
    pub const RUN: &str = "$B";
    pub const CLASS: &str = "$C";
    pub const COMPETITOR_EXT: &str = "$COMP";
    pub const SETTING: &str = "$E";
    pub const RACE: &str = "$G";
    pub const PRAC_QUAL: &str = "$H";
    pub const INIT: &str = "$I";
    pub const PASSING: &str = "$J";
    pub const SORT_MODE: &str = "$RMS";
}

/// An error occurred while decoding a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The record prefix was not recognised as a valid record type.
    ///
    /// Per the protocol, unknown tags are not a hard failure for the
    /// dispatcher — they are simply ignored — but decoding still reports
    /// them distinctly so callers can choose a quieter log level for them.
    #[error("unknown record type {0}")]
    UnknownRecordType(String),
    /// The record had fewer fields than its tag requires.
    #[error("malformed record: fewer than {expected} fields")]
    MalformedRecord { expected: usize },
}

/// Implemented for types constructed from the comma-separated, quote-
/// stripped parts of an RMonitor line (`parts[0]` is always the tag).
trait FromParts: Sized {
    fn decode(parts: &[&str]) -> Result<Self, RecordError>;
}

macro_rules! decode_impl {
    ($type:ident, $count:expr, $($field:ident),+) => (
        impl FromParts for $type {
            fn decode(parts: &[&str]) -> Result<Self, RecordError> {
                if parts.len() < $count {
                    return Err(RecordError::MalformedRecord { expected: $count });
                }

                let mut idx = 0;
                $(
                    idx += 1;
                    let $field = parts[idx].to_owned();
                )*

                Ok(Self {
                    $(
                        $field,
                    )*
                })
            }
        }
    )
}

/// A single decoded unit from the RMonitor protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    Heartbeat(Heartbeat),
    Competitor(Competitor),
    CompetitorExt(CompetitorExt),
    Run(Run),
    Class(Class),
    Setting(Setting),
    Race(Race),
    PracticeQual(PracticeQual),
    Init(Init),
    Passing(Passing),
    SortMode(SortMode),
}

impl Record {
    /// Decodes a record from a single line of valid UTF-8 text.
    ///
    /// Tag dispatch is exact-match on the literal token, so `$COMP` is
    /// never confused with `$C`.
    pub fn decode(line: &str) -> Result<Self, RecordError> {
        let parts = tokenize(line);
        if parts.is_empty() {
            return Err(RecordError::MalformedRecord { expected: 1 });
        }

        match parts[0] {
            command::HEARTBEAT => Ok(Record::Heartbeat(Heartbeat::decode(&parts)?)),
            command::COMPETITOR => Ok(Record::Competitor(Competitor::decode(&parts)?)),
            command::COMPETITOR_EXT => Ok(Record::CompetitorExt(CompetitorExt::decode(&parts)?)),
            command::RUN => Ok(Record::Run(Run::decode(&parts)?)),
            command::CLASS => Ok(Record::Class(Class::decode(&parts)?)),
            command::SETTING => Ok(Record::Setting(Setting::decode(&parts)?)),
            command::RACE => Ok(Record::Race(Race::decode(&parts)?)),
            command::PRAC_QUAL => Ok(Record::PracticeQual(PracticeQual::decode(&parts)?)),
            command::INIT => Ok(Record::Init(Init::decode(&parts)?)),
            command::PASSING => Ok(Record::Passing(Passing::decode(&parts)?)),
            command::SORT_MODE => Ok(Record::SortMode(SortMode::decode(&parts)?)),
            other => Err(RecordError::UnknownRecordType(other.to_owned())),
        }
    }
}

/// Splits one line into comma-separated fields, stripping a single leading
/// and trailing ASCII double quote from each field when both are present.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split(',').map(strip_quotes).collect()
}

fn strip_quotes(field: &str) -> &str {
    let bytes = field.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"' {
        &field[1..field.len() - 1]
    } else {
        field
    }
}

/// `$F` — flag/timing state for the current session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heartbeat {
    pub laps_to_go: String,
    pub time_to_go: String,
    pub current_time: String,
    pub session_time: String,
    pub flag_status: String,
}

decode_impl!(
    Heartbeat,
    6,
    laps_to_go,
    time_to_go,
    current_time,
    session_time,
    flag_status
);

/// `$A` — competitor identity information.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Competitor {
    pub racer_id: String,
    pub number: String,
    pub transponder: String,
    pub first_name: String,
    pub last_name: String,
    pub nationality: String,
    pub category: String,
}

decode_impl!(
    Competitor,
    8,
    racer_id,
    number,
    transponder,
    first_name,
    last_name,
    nationality,
    category
);

/// `$COMP` — extended competitor identity information.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompetitorExt {
    pub racer_id: String,
    pub number: String,
    pub category: String,
    pub first_name: String,
    pub last_name: String,
    pub nationality: String,
    pub additional_data: String,
}

decode_impl!(
    CompetitorExt,
    8,
    racer_id,
    number,
    category,
    first_name,
    last_name,
    nationality,
    additional_data
);

/// `$B` — session header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub session_id: String,
    pub session_name: String,
}

decode_impl!(Run, 3, session_id, session_name);

/// `$C` — class definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Class {
    pub class_id: String,
    pub description: String,
}

decode_impl!(Class, 3, class_id, description);

/// `$E` — track setting (key/value). Only `TRACKNAME` and `TRACKLENGTH`
/// are recognised by the dispatcher; other keys are accepted here and
/// ignored downstream (see §9 Open Questions).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

decode_impl!(Setting, 3, key, value);

/// `$G` — race position/timing update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Race {
    pub position: String,
    pub racer_id: String,
    pub laps: String,
    pub total_time: String,
}

decode_impl!(Race, 5, position, racer_id, laps, total_time);

/// `$H` — practice/qualifying best-lap update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PracticeQual {
    pub best_position: String,
    pub racer_id: String,
    pub best_lap: String,
    pub best_time: String,
}

decode_impl!(PracticeQual, 5, best_position, racer_id, best_lap, best_time);

/// `$I` — reset the session. Carries no payload; the tag alone triggers
/// the reset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Init;

impl FromParts for Init {
    fn decode(parts: &[&str]) -> Result<Self, RecordError> {
        if parts.is_empty() {
            return Err(RecordError::MalformedRecord { expected: 1 });
        }
        Ok(Init)
    }
}

/// `$J` — last-lap passing update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Passing {
    pub racer_id: String,
    pub last_lap_time: String,
    pub total_time: String,
}

decode_impl!(Passing, 4, racer_id, last_lap_time, total_time);

/// `$RMS` — sort mode selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortMode {
    pub mode: String,
}

decode_impl!(SortMode, 2, mode);
