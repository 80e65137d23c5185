//! Shared fixtures for integration tests.

#![allow(dead_code)]

use grid_nodes::codec::{Decode, Reading};
use grid_nodes::nodes::{DemandNode, DispatchNode, Publication};
use grid_nodes::tables::{LoadProfile, Schedule};

/// Profile with a single `08:00:00` slot at coefficient `0.05`.
pub const MORNING_PROFILE: &str = "\
time,h0
08:00:00,0.05
";

/// Full-day quarter-hourly profile, every slot at coefficient `0.1`.
pub fn full_day_profile_csv() -> String {
    let mut csv = String::from("time,h0\n");
    for hour in 0..24 {
        for minute in [0, 15, 30, 45] {
            csv.push_str(&format!("{hour:02}:{minute:02}:00,0.1\n"));
        }
    }
    csv
}

/// Two producers rated 1000 and 2000, at `[50, 100]` percent during hour 5
/// and idle otherwise.
pub fn two_producer_schedule() -> Schedule {
    let producers = vec!["producer/a".to_string(), "producer/b".to_string()];
    let rows = (0..24)
        .map(|h| if h == 5 { vec![50.0, 100.0] } else { vec![0.0, 0.0] })
        .collect();
    Schedule::new(producers, vec![1000.0, 2000.0], rows).expect("aligned tables")
}

/// Jitter-free demand node for household `consumer/h0`, population 2.
pub fn morning_demand_node() -> DemandNode {
    let profile =
        LoadProfile::from_csv_reader(MORNING_PROFILE.as_bytes(), 1).expect("valid profile");
    DemandNode::new("consumer/h0", profile, 2, 0.0, Some(42))
}

/// Dispatch node for `sched` over [`two_producer_schedule`].
pub fn dispatch_node() -> DispatchNode {
    DispatchNode::new("sched", two_producer_schedule())
}

/// Decodes a demand publication back into its envelope.
pub fn reading(publication: &Publication) -> Reading {
    Reading::decode(&publication.payload).expect("published readings decode")
}
