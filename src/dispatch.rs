//! Folds a decoded [`Record`](crate::protocol::Record) into the
//! [`Session`] model, per the per-tag semantics in the protocol table.
//!
//! Every handler here is infallible: the record has already cleared the
//! per-tag minimum field count at decode time, so applying it cannot fail.
//! Unknown tags never reach this module — [`Record::decode`] rejects them
//! before the caller gets here, and the batch driver logs and skips.

use crate::model::Session;
use crate::protocol::Record;

/// Applies one decoded record to the session, mutating it in place.
pub fn apply(session: &mut Session, record: Record) {
    match record {
        Record::Heartbeat(r) => {
            session.laps_to_go = r.laps_to_go;
            session.time_to_go = r.time_to_go;
            session.current_time = r.current_time;
            session.session_time = r.session_time;
            session.flag_status = r.flag_status.trim().to_owned();
        }
        Record::Competitor(r) => {
            let competitor = session.competitor_mut(&r.racer_id);
            competitor.number = r.number;
            competitor.transponder = r.transponder;
            competitor.first_name = r.first_name;
            competitor.last_name = r.last_name;
            competitor.nationality = r.nationality;
            competitor.category = r.category;
        }
        Record::Run(r) => {
            session.session_id = r.session_id;
            session.session_name = r.session_name;
        }
        Record::Class(r) => {
            session.classes.insert(
                r.class_id.clone(),
                crate::model::RaceClass {
                    class_id: r.class_id,
                    description: r.description,
                },
            );
        }
        Record::CompetitorExt(r) => {
            let competitor = session.competitor_mut(&r.racer_id);
            competitor.number = r.number;
            competitor.category = r.category;
            competitor.first_name = r.first_name;
            competitor.last_name = r.last_name;
            competitor.nationality = r.nationality;
            competitor.additional_data = r.additional_data;
        }
        Record::Setting(r) => match r.key.as_str() {
            "TRACKNAME" => session.track_name = r.value,
            "TRACKLENGTH" => session.track_length = r.value,
            _ => {}
        },
        Record::Race(r) => {
            let competitor = session.competitor_mut(&r.racer_id);
            if competitor.position != r.position
                || competitor.laps != r.laps
                || competitor.total_time != r.total_time
            {
                competitor.data_updated = true;
            }
            competitor.position = r.position;
            competitor.laps = r.laps;
            competitor.set_total_time(&r.total_time);
        }
        Record::PracticeQual(r) => {
            let competitor = session.competitor_mut(&r.racer_id);
            if competitor.best_position != r.best_position
                || competitor.best_lap != r.best_lap
                || competitor.best_time != r.best_time
            {
                competitor.data_updated = true;
            }
            competitor.best_position = r.best_position;
            competitor.best_lap = r.best_lap;
            competitor.set_best_time(&r.best_time);
        }
        Record::Init(_) => {
            session.reset();
        }
        Record::Passing(r) => {
            let competitor = session.competitor_mut(&r.racer_id);
            competitor.last_lap_time = r.last_lap_time;
            competitor.set_total_time(&r.total_time);
            competitor.data_updated = true;
        }
        Record::SortMode(r) => {
            session.sort_mode = if r.mode == "qualifying" {
                crate::model::SortMode::Qualifying
            } else {
                crate::model::SortMode::Race
            };
        }
    }
}
