//! End-to-end node behaviour driven through raw topics and payloads.

mod common;

use grid_nodes::nodes::{AveragingNode, NodeError};
use grid_nodes::runtime::Router;

#[test]
fn sink_publishes_running_mean() {
    let mut router = Router::new(AveragingNode::new("1"));
    for value in [10.0, 20.0] {
        let payload = format!(r#"{{"payload": {value}, "timestamp": "t{value}"}}"#);
        router
            .dispatch("chaossensor/1/data", payload.as_bytes())
            .expect("valid measurement");
    }

    let out = router
        .dispatch(
            "chaossensor/1/data",
            br#"{"payload": 30, "timestamp": "2024-05-01T08:07:00"}"#,
        )
        .expect("valid measurement");
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].topic, "sink/1/data");
    let reading = common::reading(&out[0]);
    assert_eq!(reading.payload, 20.0);
    assert_eq!(reading.timestamp, "2024-05-01T08:07:00");
}

#[test]
fn sink_window_forgets_old_samples() {
    let mut router = Router::new(AveragingNode::new("1"));
    let mut last = None;
    for i in 0..50 {
        let payload = format!(r#"{{"payload": {i}, "timestamp": "t"}}"#);
        last = router
            .dispatch("chaossensor/1/data", payload.as_bytes())
            .expect("valid measurement")
            .pop();
    }
    // mean of 8..=49
    let expected = (8..50).sum::<i32>() as f64 / 42.0;
    let last = last.expect("one output per measurement");
    assert!((common::reading(&last).payload - expected).abs() < 1e-9);
}

#[test]
fn demand_follows_profile_and_scale() {
    let mut router = Router::new(common::morning_demand_node());

    let out = router
        .dispatch("tickgen/tick", b"2024-05-01T08:07:00")
        .expect("slot exists");
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].topic, "consumer/h0/demand");
    let first = common::reading(&out[0]);
    assert!((first.payload - 0.2).abs() < 1e-12);
    assert_eq!(first.timestamp, "2024-05-01T08:07:00");

    let none = router
        .dispatch("consumer/h0/scale", b"2.5")
        .expect("valid scale");
    assert!(none.is_empty());

    let out = router
        .dispatch("tickgen/tick", b"2024-05-01T08:14:59")
        .expect("slot exists");
    assert!((common::reading(&out[0]).payload - 0.5).abs() < 1e-12);
}

#[test]
fn demand_covers_a_full_day() {
    let profile = grid_nodes::tables::LoadProfile::from_csv_reader(
        common::full_day_profile_csv().as_bytes(),
        1,
    )
    .expect("valid profile");
    let node = grid_nodes::nodes::DemandNode::new("consumer/h1", profile, 1, 0.05, Some(7));
    let mut router = Router::new(node);

    for minute in (0..24 * 60).step_by(7) {
        let tick = format!("2024-05-01T{:02}:{:02}:00", minute / 60, minute % 60);
        let out = router
            .dispatch("tickgen/tick", tick.as_bytes())
            .expect("every slot exists");
        let value = common::reading(&out[0]).payload;
        assert!((0.1899..=0.2101).contains(&value), "{tick}: {value}");
    }
}

#[test]
fn demand_stops_on_missing_slot() {
    let mut router = Router::new(common::morning_demand_node());
    match router.dispatch("tickgen/tick", b"2024-05-01T09:00:00") {
        Err(NodeError::MissingSlot { label }) => assert_eq!(label, "09:00:00"),
        other => panic!("expected missing slot, got {other:?}"),
    }
}

#[test]
fn demand_rejects_malformed_input() {
    let mut router = Router::new(common::morning_demand_node());
    assert!(matches!(
        router.dispatch("consumer/h0/scale", b"lots"),
        Err(NodeError::Decode { .. })
    ));
    assert!(matches!(
        router.dispatch("tickgen/tick", b"yesterday"),
        Err(NodeError::Decode { .. })
    ));
}

#[test]
fn dispatch_publishes_setpoints_while_managed() {
    let mut router = Router::new(common::dispatch_node());

    let out = router
        .dispatch("tickgen/tick", b"2024-05-01T05:30:00")
        .expect("hour in schedule");
    let sent: Vec<(&str, Option<&str>)> = out
        .iter()
        .map(|p| (p.topic.as_str(), p.payload_str()))
        .collect();
    assert_eq!(
        sent,
        [("producer/a", Some("500.0")), ("producer/b", Some("2000.0"))]
    );

    router
        .dispatch("sched/schedule_mode", b"off")
        .expect("any text is a mode");
    assert!(!router.node().is_managed());
    let out = router
        .dispatch("tickgen/tick", b"2024-05-01T05:45:00")
        .expect("unmanaged ticks are skipped");
    assert!(out.is_empty());

    router
        .dispatch("sched/schedule_mode", b"TRUE")
        .expect("any text is a mode");
    let out = router
        .dispatch("tickgen/tick", b"2024-05-01 06:00:00")
        .expect("hour in schedule");
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|p| p.payload_str() == Some("0.0")));
}

#[test]
fn dispatch_ignores_other_topics() {
    let mut router = Router::new(common::dispatch_node());
    let out = router
        .dispatch("other/schedule_mode", b"false")
        .expect("unrouted topics are ignored");
    assert!(out.is_empty());
    assert!(router.node().is_managed());
}
