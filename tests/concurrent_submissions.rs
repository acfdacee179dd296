//! Concurrent submitters sharing one engine.

use std::sync::Arc;
use std::thread;

use floodwatch_core::{
    ConsensusConfig, ConsensusEngine, ConsensusVariant, FloodState, InMemoryReportRepository,
    Report, ReportRepository,
};

const THREADS: usize = 8;
const REPORTS_PER_THREAD: usize = 250;

#[test]
fn no_report_is_lost_under_concurrent_submit() {
    let engine = ConsensusEngine::new(
        Arc::new(InMemoryReportRepository::new()),
        ConsensusConfig::for_variant(ConsensusVariant::Depth),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = engine.clone();
            thread::spawn(move || {
                for i in 0..REPORTS_PER_THREAD {
                    let report = if (t + i) % 4 == 0 {
                        Report::not_flooded()
                    } else {
                        Report::flooded_with_depth(0.5)
                    };
                    engine.submit(report).expect("in-memory submit");
                }
            })
        })
        .collect();

    // Readers run alongside the writers and always see a consistent prefix.
    let reader = {
        let engine = engine.clone();
        thread::spawn(move || {
            let mut last_total = 0;
            for _ in 0..200 {
                let snapshot = engine.current_status().expect("in-memory status");
                assert!(snapshot.tally.total >= last_total);
                assert!(snapshot.tally.flooded <= snapshot.tally.total);
                last_total = snapshot.tally.total;
            }
        })
    };

    for handle in handles {
        handle.join().expect("submitter panicked");
    }
    reader.join().expect("reader panicked");

    let stored = engine.repository().load_all().unwrap();
    assert_eq!(stored.len(), THREADS * REPORTS_PER_THREAD);

    let mut ids: Vec<u64> = stored.iter().map(|r| r.id).collect();
    let in_order = ids.windows(2).all(|w| w[0] < w[1]);
    assert!(in_order, "ids must increase in insertion order");
    ids.dedup();
    assert_eq!(ids.len(), THREADS * REPORTS_PER_THREAD);

    let snapshot = engine.current_status().unwrap();
    assert_eq!(snapshot.state, FloodState::Flooding);
    assert_eq!(snapshot.average_depth(), Some(0.5));
}
