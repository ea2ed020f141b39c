//! Sorts competitors per the session's [`SortMode`](crate::model::SortMode)
//! and computes gap (to predecessor) and diff (to leader).

use crate::model::{pos_key, Session};
use crate::time::format_diff;

/// Regenerates `session.sorted_competitors` from `session.competitors`,
/// then recomputes every competitor's `calculated_gap`/`calculated_diff`.
///
/// Sorting is a stable sort over a key derived from the current
/// [`SortMode`](crate::model::SortMode), so ties preserve the competitor
/// map's iteration order — callers that need deterministic output across
/// runs should not rely on HashMap iteration order for anything beyond
/// "some order", which is all the stability guarantee promises anyway.
pub fn resolve(session: &mut Session) {
    sort(session);
    calculate_gaps_and_diffs(session);
}

fn sort(session: &mut Session) {
    let mut ids: Vec<String> = session.competitors.keys().cloned().collect();

    match session.sort_mode {
        crate::model::SortMode::Qualifying => {
            ids.sort_by_key(|id| {
                let c = &session.competitors[id];
                let best = if c.best_time_ms > 0 {
                    c.best_time_ms
                } else {
                    u64::MAX
                };
                (best, pos_key(&c.best_position))
            });
        }
        crate::model::SortMode::Race => {
            ids.sort_by_key(|id| {
                let c = &session.competitors[id];
                let total = if c.total_time_ms > 0 {
                    c.total_time_ms
                } else {
                    u64::MAX
                };
                // Rust has no signed-negation trick needed here: laps sorts
                // descending by inverting via `u64::MAX - laps`.
                (pos_key(&c.position), u64::MAX - c.laps_int(), total)
            });
        }
    }

    session.sorted_competitors = ids;
}

fn calculate_gaps_and_diffs(session: &mut Session) {
    let order = session.sorted_competitors.clone();
    if order.is_empty() {
        return;
    }

    session.competitor_mut(&order[0]).calculated_gap = String::new();
    session.competitor_mut(&order[0]).calculated_diff = String::new();

    for i in 1..order.len() {
        let cur_id = &order[i];
        let prev_id = &order[i - 1];
        let leader_id = &order[0];

        let cur_total_ms = session.competitors[cur_id].total_time_ms;
        if cur_total_ms == 0 {
            let cur = session.competitor_mut(cur_id);
            cur.calculated_gap = String::new();
            cur.calculated_diff = String::new();
            continue;
        }

        let gap = diff_against(session, cur_id, prev_id);
        let diff = diff_against(session, cur_id, leader_id);

        let cur = session.competitor_mut(cur_id);
        cur.calculated_gap = gap;
        cur.calculated_diff = diff;
    }
}

/// The displayed gap/diff string from `slower` to `faster`.
fn diff_against(session: &Session, slower_id: &str, faster_id: &str) -> String {
    let slower = &session.competitors[slower_id];
    let faster = &session.competitors[faster_id];

    if faster.total_time_ms == 0 {
        return String::new();
    }

    let lap_diff = faster.laps_int() as i64 - slower.laps_int() as i64;

    if lap_diff > 0 && slower.best_time_ms > 0 {
        let time_diff_ms = slower.total_time_ms.saturating_sub(faster.total_time_ms);
        if time_diff_ms > slower.best_time_ms {
            return if lap_diff == 1 {
                "+1 LAP".to_owned()
            } else {
                format!("+{lap_diff} LAPS")
            };
        }
    }

    let time_diff_ms = slower.total_time_ms.abs_diff(faster.total_time_ms);
    format_diff(time_diff_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::apply;
    use crate::model::{Session, SortMode};
    use crate::protocol::Record;

    fn apply_line(session: &mut Session, line: &str) {
        apply(session, Record::decode(line).unwrap());
    }

    #[test]
    fn leader_has_no_gap_or_diff() {
        let mut session = Session::new();
        apply_line(&mut session, r#"$G,"1","1","10","00:20:00.000""#);
        apply_line(&mut session, r#"$G,"2","2","10","00:20:02.500""#);
        resolve(&mut session);

        let leader = &session.competitors[&session.sorted_competitors[0]];
        assert_eq!(leader.calculated_gap, "");
        assert_eq!(leader.calculated_diff, "");
    }

    #[test]
    fn two_car_race_gap_and_diff() {
        let mut session = Session::new();
        apply_line(&mut session, r#"$G,"1","1","10","00:20:00.000""#);
        apply_line(&mut session, r#"$G,"2","2","10","00:20:02.500""#);
        resolve(&mut session);

        assert_eq!(session.sorted_competitors, vec!["1", "2"]);
        let second = &session.competitors["2"];
        assert_eq!(second.calculated_gap, "+02.500");
        assert_eq!(second.calculated_diff, "+02.500");
    }

    #[test]
    fn lap_down_renders_as_laps() {
        let mut session = Session::new();
        apply_line(&mut session, r#"$G,"1","1","10","00:20:00.000""#);
        apply_line(&mut session, r#"$H,"1","1","5","00:01:30.000""#);
        apply_line(&mut session, r#"$G,"2","2","9","00:22:00.000""#);
        apply_line(&mut session, r#"$H,"2","2","4","00:01:35.000""#);
        resolve(&mut session);

        let prost = &session.competitors["2"];
        assert_eq!(prost.calculated_diff, "+1 LAP");
    }

    #[test]
    fn qualifying_reorders_by_best_time() {
        // Gap/diff (§4.4) are always derived from total_time_ms, even in
        // QUALIFYING mode — only the *ordering* key changes to best_time_ms.
        let mut session = Session::new();
        apply_line(&mut session, r#"$G,"1","1","10","00:20:00.000""#);
        apply_line(&mut session, r#"$G,"2","2","10","00:20:02.500""#);
        apply_line(&mut session, r#"$H,"2","2","8","00:01:28.100""#);
        apply_line(&mut session, r#"$H,"1","1","9","00:01:29.500""#);
        apply_line(&mut session, "$RMS,qualifying");

        resolve(&mut session);

        assert_eq!(session.sort_mode, SortMode::Qualifying);
        assert_eq!(session.sorted_competitors, vec!["2", "1"]);
        let second = &session.competitors["1"];
        assert_eq!(second.calculated_diff, format_diff(2_500));
    }

    #[test]
    fn zero_best_time_sinks_to_tail_in_qualifying() {
        let mut session = Session::new();
        session.sort_mode = SortMode::Qualifying;
        apply_line(&mut session, r#"$H,"1","1","1","00:01:30.000""#);
        // "2" never gets an $H record, so best_time_ms stays 0.
        session.competitor_mut("2");
        resolve(&mut session);

        assert_eq!(session.sorted_competitors, vec!["1", "2"]);
    }

    #[test]
    fn malformed_record_does_not_prevent_gap_computation() {
        let mut session = Session::new();
        for line in [
            r#"$G,"1","1","10","00:20:00.000""#,
            "$G,broken",
            r#"$G,"2","2","10","00:20:01.000""#,
        ] {
            if let Ok(record) = Record::decode(line) {
                apply(&mut session, record);
            }
        }
        resolve(&mut session);

        assert_eq!(session.sorted_competitors.len(), 2);
        assert_eq!(session.competitors["2"].calculated_gap, "+01.000");
    }
}
