use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use wheel_reconciler::{
    Applied, DiscardReason, FrameEvent, OutcomeReconciler, Phase, ReconcilerConfig, Resolution,
    TrajectoryDescriptor, WheelGeometry,
};
use wheel_shared::{Outcome, Segment, SubmitGuard};

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn sample_segments() -> Vec<Segment> {
    vec![
        Segment::new("A", 50.0),
        Segment::new("B", 30.0),
        Segment::losing("lose", 20.0),
    ]
}

fn seeded(seed: u64) -> OutcomeReconciler<StdRng> {
    let mut reconciler =
        OutcomeReconciler::with_rng(ReconcilerConfig::default(), StdRng::seed_from_u64(seed)).unwrap();
    reconciler.set_segments(sample_segments()).unwrap();
    reconciler
}

fn started(applied: Applied) -> TrajectoryDescriptor {
    match applied {
        Applied::Started(descriptor) => descriptor,
        other => panic!("expected a trajectory, got {:?}", other),
    }
}

fn random_segments(rng: &mut StdRng) -> Vec<Segment> {
    let count = rng.gen_range(1..=12);
    (0..count)
        .map(|i| Segment::new(format!("s{}", i), rng.gen_range(0.5..100.0)))
        .collect()
}

#[test]
fn geometry_partitions_the_circle() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let geometry = WheelGeometry::new(random_segments(&mut rng), 0.0).unwrap();
        let arcs = geometry.arcs();
        assert_eq!(arcs[0].start, 0.0);
        for pair in arcs.windows(2) {
            assert!((pair[0].end() - pair[1].start).abs() < 1e-9);
        }
        assert_eq!(arcs[arcs.len() - 1].end(), 360.0);
        let total: f64 = arcs.iter().map(|a| a.sweep).sum();
        assert!((total - 360.0).abs() < 1e-9);
    }
}

#[test]
fn landing_falls_inside_inset_range() {
    let config = ReconcilerConfig::default();
    let mut rng = StdRng::seed_from_u64(21);
    for seed in 0..200 {
        let segments = random_segments(&mut rng);
        let mut reconciler =
            OutcomeReconciler::with_rng(config.clone(), StdRng::seed_from_u64(seed)).unwrap();
        reconciler.set_segments(segments.clone()).unwrap();
        let pick = &segments[rng.gen_range(0..segments.len())];

        let token = reconciler.begin_request(ms(0)).unwrap();
        let descriptor = started(reconciler.apply_outcome(&Outcome::prize(pick.id.clone(), token), ms(0)).unwrap());

        let geometry = reconciler.geometry().unwrap();
        let index = geometry.index_of(&pick.id).unwrap();
        let (lo, hi) = geometry
            .landing_range(index, config.edge_margin_ratio, config.edge_margin_cap_deg)
            .unwrap();
        let residue = geometry.local_angle(descriptor.target_angle);
        assert!(residue >= lo - 1e-9 && residue <= hi + 1e-9, "{} not in [{}, {}]", residue, lo, hi);
        assert_eq!(geometry.segment_at(descriptor.target_angle), index);
    }
}

#[test]
fn unknown_outcome_falls_back_to_losing_then_first() {
    let mut reconciler = seeded(5);
    let token = reconciler.begin_request(ms(0)).unwrap();
    let descriptor = started(reconciler.apply_outcome(&Outcome::prize("gone", token), ms(0)).unwrap());
    assert_eq!(descriptor.resolution, Resolution::Fallback);
    assert_eq!(descriptor.segment_id, "lose");

    let mut no_loser =
        OutcomeReconciler::with_rng(ReconcilerConfig::default(), StdRng::seed_from_u64(5)).unwrap();
    no_loser
        .set_segments(vec![Segment::new("X", 1.0), Segment::new("Y", 3.0)])
        .unwrap();
    let token = no_loser.begin_request(ms(0)).unwrap();
    let descriptor = started(no_loser.apply_outcome(&Outcome::unresolvable(token), ms(0)).unwrap());
    assert_eq!(descriptor.resolution, Resolution::Fallback);
    assert_eq!(descriptor.segment_id, "X");
}

#[test]
fn consecutive_spins_are_continuous() {
    let mut reconciler = seeded(9);
    let ids = ["A", "B", "lose", "B", "B", "A"];
    let mut now = ms(0);
    let mut previous_end: Option<f64> = None;

    for (i, id) in ids.iter().enumerate() {
        let token = reconciler.begin_request(now).unwrap();
        let descriptor = started(reconciler.apply_outcome(&Outcome::prize(*id, token), now).unwrap());
        if let Some(end) = previous_end {
            assert_eq!(descriptor.start_angle, end);
        }
        assert!(descriptor.target_angle > descriptor.start_angle);

        if i % 2 == 0 {
            // Let it finish.
            now += descriptor.duration;
            reconciler.tick(now);
            assert_eq!(reconciler.displayed_angle(), descriptor.target_angle);
        } else {
            // Abandon it part way; the next spin continues from here.
            now += descriptor.duration / 3;
            let frame = reconciler.tick(now);
            assert!(frame.angle < descriptor.target_angle);
        }
        previous_end = Some(reconciler.displayed_angle());
    }
}

#[test]
fn stale_outcome_changes_nothing() {
    let mut reconciler = seeded(13);
    let completions = Rc::new(Cell::new(0));
    let counter = Rc::clone(&completions);
    reconciler.set_completion_handler(move |_| counter.set(counter.get() + 1));

    let token_a = reconciler.begin_request(ms(0)).unwrap();
    let token_b = reconciler.begin_request(ms(100)).unwrap();
    let before = reconciler.phase().clone();

    let applied = reconciler.apply_outcome(&Outcome::prize("A", token_a), ms(200)).unwrap();
    assert_eq!(applied, Applied::Discarded(DiscardReason::Stale));
    assert_eq!(reconciler.phase(), &before);
    assert_eq!(reconciler.active_request(), Some(token_b));
    assert_eq!(reconciler.tick(ms(300)).event, None);
    assert_eq!(completions.get(), 0);
}

#[test]
fn switching_cases_discards_in_flight_response() {
    let mut reconciler = seeded(17);
    let token = reconciler.begin_request(ms(0)).unwrap();
    reconciler
        .set_segments(vec![Segment::new("gold", 10.0), Segment::losing("dust", 90.0)])
        .unwrap();
    assert_eq!(reconciler.phase(), &Phase::Idle);
    assert_eq!(
        reconciler.apply_outcome(&Outcome::prize("B", token), ms(50)).unwrap(),
        Applied::Discarded(DiscardReason::Stale)
    );
}

#[test]
fn completion_fires_exactly_once() {
    let mut reconciler = seeded(19);
    let completions = Rc::new(Cell::new(0));
    let counter = Rc::clone(&completions);
    reconciler.set_completion_handler(move |_| counter.set(counter.get() + 1));

    let token = reconciler.begin_request(ms(0)).unwrap();
    let descriptor = started(reconciler.apply_outcome(&Outcome::prize("B", token), ms(0)).unwrap());

    let mut events = 0;
    let mut now = ms(0);
    while now <= descriptor.duration + ms(2000) {
        if let Some(FrameEvent::Completed(_)) = reconciler.tick(now).event {
            events += 1;
        }
        now += ms(16);
    }
    // Several frames past the end, all in the same instant.
    for _ in 0..5 {
        assert!(reconciler.tick(now).event.is_none());
    }
    assert!(!reconciler.mark_complete(descriptor.id));
    assert_eq!(events, 1);
    assert_eq!(completions.get(), 1);
}

#[test]
fn abandoned_trajectory_never_completes() {
    let mut reconciler = seeded(23);
    let completions = Rc::new(Cell::new(0));
    let counter = Rc::clone(&completions);
    reconciler.set_completion_handler(move |_| counter.set(counter.get() + 1));

    let token = reconciler.begin_request(ms(0)).unwrap();
    let first = started(reconciler.apply_outcome(&Outcome::prize("A", token), ms(0)).unwrap());
    let shown = reconciler.tick(ms(1000)).angle;

    reconciler.begin_request(ms(1000)).unwrap();
    assert_eq!(reconciler.phase(), &Phase::Pending { request: reconciler.active_request().unwrap(), issued_at: ms(1000) });
    assert!(!reconciler.mark_complete(first.id));
    assert_eq!(reconciler.displayed_angle(), shown);
    assert!(reconciler.tick(first.duration * 2).event.is_none());
    assert_eq!(completions.get(), 0);
}

#[test]
fn double_submit_guard() {
    let guard = SubmitGuard::new();
    assert!(guard.try_acquire(&"k"));
    assert!(!guard.try_acquire(&"k"));
    guard.release(&"k");
    assert!(guard.try_acquire(&"k"));
}

#[test]
fn end_to_end_example() {
    for seed in 0..50 {
        let mut reconciler = seeded(seed);
        let token = reconciler.begin_request(ms(0)).unwrap();
        let descriptor = started(reconciler.apply_outcome(&Outcome::prize("B", token), ms(0)).unwrap());

        assert!(descriptor.landing_angle > 180.0 && descriptor.landing_angle < 288.0);
        assert!(descriptor.target_angle > 1800.0);
        let residue = descriptor.target_angle % 360.0;
        assert!(residue > 180.0 && residue < 288.0);
    }
}
