//! Drives one frame of input (a WebSocket text message, typically several
//! newline-delimited records) through decode, dispatch and ordering, and
//! produces a snapshot when the frame changed anything.

use crate::model::Session;
use crate::protocol::Record;
use crate::snapshot::Snapshot;

/// Feeds every line of `frame` through [`Record::decode`] and
/// [`crate::dispatch::apply`], then — only if the frame held at least one
/// non-blank line — re-sorts the session and builds a fresh [`Snapshot`].
///
/// Only a wholly blank frame leaves `session` untouched and returns `None`.
/// An unknown tag or an under-minimum-arity line never raises — it is
/// logged and the line is skipped — so, matching the line-handler loop it
/// was distilled from, it still counts as a processed line and still
/// publishes a snapshot, even though it left the model itself unchanged
/// (see DESIGN.md's "Snapshot publication on unknown/malformed lines" Open
/// Question decision).
///
/// Per-line decode failures are logged at `warn` and do not abort the
/// frame; a single bad line among many good ones still yields a snapshot.
pub fn process(session: &mut Session, frame: &str) -> Option<Snapshot> {
    let mut saw_line = false;

    for line in frame.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        saw_line = true;

        match Record::decode(line) {
            Ok(record) => {
                crate::dispatch::apply(session, record);
            }
            Err(source) => {
                log::warn!("skipping invalid RMonitor record from line '{line}': {source}");
            }
        }
    }

    if !saw_line {
        return None;
    }

    crate::ordering::resolve(session);
    Some(crate::snapshot::build(session))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_frame_yields_no_snapshot() {
        let mut session = Session::new();
        assert!(process(&mut session, "").is_none());
        assert!(process(&mut session, "\r\n\r\n").is_none());
    }

    #[test]
    fn all_invalid_lines_still_publish_a_snapshot() {
        // Neither line touches the model (unknown tag, under-minimum arity),
        // but both are non-blank lines that didn't raise, so a snapshot is
        // still published — matching `original_source`'s per-line loop.
        let mut session = Session::new();
        let frame = "$ZZZ,bad\r\n$G,broken";
        let snap = process(&mut session, frame).expect("non-blank lines should still snapshot");
        assert!(snap.competitors.is_empty());
    }

    #[test]
    fn one_valid_line_among_invalid_ones_still_snapshots() {
        let mut session = Session::new();
        let frame = "$ZZZ,bad\r\n$G,\"1\",\"1\",\"10\",\"00:20:00.000\"\r\n$G,broken";
        let snap = process(&mut session, frame).expect("one valid record should snapshot");
        assert_eq!(snap.competitors.len(), 1);
        assert_eq!(snap.competitors[0].racer_id, "1");
    }

    #[test]
    fn multi_line_frame_produces_ordered_snapshot() {
        let mut session = Session::new();
        let frame = concat!(
            "$A,\"1\",\"11\",\"T1\",\"Ayrton\",\"Senna\",\"BR\",\"A\"\r\n",
            "$A,\"2\",\"22\",\"T2\",\"Alain\",\"Prost\",\"FR\",\"A\"\r\n",
            "$G,\"2\",\"2\",\"10\",\"00:20:02.500\"\r\n",
            "$G,\"1\",\"1\",\"10\",\"00:20:00.000\"\r\n",
        );
        let snap = process(&mut session, frame).unwrap();
        assert_eq!(snap.competitors[0].racer_id, "1");
        assert_eq!(snap.competitors[1].racer_id, "2");
        assert_eq!(snap.competitors[1].gap, "+02.500");
    }

    #[test]
    fn subsequent_empty_frame_leaves_session_unchanged() {
        let mut session = Session::new();
        process(&mut session, "$G,\"1\",\"1\",\"10\",\"00:20:00.000\"").unwrap();
        let before = session.sorted_competitors.clone();
        assert!(process(&mut session, "").is_none());
        assert_eq!(session.sorted_competitors, before);
    }
}
