//! Configuration extractor: locate a run's [`BuildRequest`] and cache it.

use tracing::debug;

use crate::history::History;
use crate::types::{BuildRequest, RunState};

/// Resolve the build request for `run`.
///
/// A request already cached on the run is returned as-is without touching
/// `history`. Otherwise the newest `start_build` record in `history` is
/// materialized and cached. `None` means the user has not supplied a
/// configuration yet.
pub fn resolve_config<'a, H>(run: &'a mut RunState, history: &H) -> Option<&'a BuildRequest>
where
    H: History + ?Sized,
{
    if run.build_request.is_none() {
        let record = history.latest_build_start()?;
        let request = BuildRequest::from_record(record);
        debug!(run = %run.run_id, project = %request.project_name(), "captured build request from history");
        run.build_request = Some(request);
    }
    run.build_request.as_ref()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeMap;

    use super::*;
    use crate::history::{BuildStartRecord, HistoryEvent};
    use crate::types::RunId;

    struct CountingHistory {
        events: Vec<HistoryEvent>,
        scans: Cell<usize>,
    }

    impl History for CountingHistory {
        fn events(&self) -> &[HistoryEvent] {
            self.scans.set(self.scans.get() + 1);
            &self.events
        }
    }

    fn record(name: &str) -> HistoryEvent {
        HistoryEvent::StartBuild(BuildStartRecord {
            project_name: name.to_string(),
            project_description: Some("desc".to_string()),
            platform_credentials: BTreeMap::from([("infra".to_string(), "t1".to_string())]),
        })
    }

    fn run() -> RunState {
        RunState::new(RunId::new("r1").unwrap())
    }

    #[test]
    fn second_resolve_does_not_rescan() {
        let history = CountingHistory {
            events: vec![record("demo")],
            scans: Cell::new(0),
        };
        let mut run = run();
        let first = resolve_config(&mut run, &history).cloned().expect("first");
        assert_eq!(history.scans.get(), 1);
        let second = resolve_config(&mut run, &history).cloned().expect("second");
        assert_eq!(history.scans.get(), 1, "cached request must not trigger a scan");
        assert_eq!(first, second);
    }

    #[test]
    fn cached_request_wins_over_history() {
        let mut run = RunState::with_request(
            RunId::new("r1").unwrap(),
            BuildRequest::new("cached", None, BTreeMap::new()),
        );
        let history = vec![record("from-history")];
        let got = resolve_config(&mut run, &history).expect("resolved");
        assert_eq!(got.project_name().0, "cached");
    }

    #[test]
    fn absent_everywhere_is_none_and_leaves_run_untouched() {
        let mut run = run();
        let before = run.clone();
        let history = vec![HistoryEvent::Message { text: "hello".into() }];
        assert!(resolve_config(&mut run, &history).is_none());
        assert_eq!(run, before);
    }
}
