//! Policy evaluation integration tests
//!
//! These tests drive the public client against scripted endpoints and
//! assert both the returned value and how often each endpoint was
//! consulted.

use std::sync::Arc;

use tessera_quorum::{Aggregator, CallResult, Endpoint, QuorumClient, Settings};
use tessera_test_fixtures::{into_endpoints, ConnectionError, ScriptedEndpoint};

fn client() -> QuorumClient<ConnectionError> {
    QuorumClient::new()
}

fn mean() -> Aggregator<u64> {
    Arc::new(|values: &[u64]| values.iter().sum::<u64>() / values.len() as u64)
}

#[tokio::test]
async fn test_two_agreeing_responses_of_three() {
    let nodes = vec![
        ScriptedEndpoint::ok("node-a", 42u64),
        ScriptedEndpoint::ok("node-b", 42),
        ScriptedEndpoint::ok("node-c", 42),
    ];
    let settings = Settings::count(2).with_max_parallel(3);

    let value = client().query(&settings, (), into_endpoints(nodes.clone())).await.unwrap();

    assert_eq!(value, 42);
    let calls: usize = nodes.iter().map(|node| node.calls()).sum();
    assert!((2..=3).contains(&calls), "expected 2 or 3 calls, saw {calls}");
}

#[tokio::test]
async fn test_split_vote_majority_wins() {
    let nodes = vec![
        ScriptedEndpoint::ok("node-a", 1u64),
        ScriptedEndpoint::ok("node-b", 1),
        ScriptedEndpoint::ok("node-c", 2),
    ];
    let settings = Settings::count(2).with_max_parallel(3).with_inconsistency_retries(0);

    let value = client().query(&settings, (), into_endpoints(nodes)).await.unwrap();

    assert_eq!(value, 1);
}

#[tokio::test]
async fn test_average_of_three() {
    let nodes = vec![
        ScriptedEndpoint::ok("node-a", 10u64),
        ScriptedEndpoint::ok("node-b", 20),
        ScriptedEndpoint::ok("node-c", 30),
    ];
    let settings = Settings::average(3, mean()).with_max_parallel(3);

    let value = client().query(&settings, (), into_endpoints(nodes)).await.unwrap();

    assert_eq!(value, 20);
}

#[tokio::test]
async fn test_full_agreement_at_endpoint_total() {
    let nodes = vec![
        ScriptedEndpoint::ok("node-a", 8u64),
        ScriptedEndpoint::ok("node-b", 8),
        ScriptedEndpoint::ok("node-c", 8),
    ];
    let settings = Settings::count(3).with_max_parallel(3);

    let value = client().query(&settings, (), into_endpoints(nodes.clone())).await.unwrap();

    assert_eq!(value, 8);
    for node in &nodes {
        assert_eq!(node.calls(), 1);
    }
}

#[tokio::test]
async fn test_argument_flows_to_endpoints() {
    let double = |height: &u64| -> CallResult<u64, ConnectionError> { Ok(height * 2) };
    let endpoints: Vec<Arc<dyn Endpoint<u64, u64, ConnectionError>>> =
        vec![Arc::new(double), Arc::new(double)];
    let settings = Settings::count(2).with_max_parallel(2);

    let value = QuorumClient::new().query(&settings, 21u64, endpoints).await.unwrap();

    assert_eq!(value, 42);
}

#[tokio::test]
async fn test_more_endpoints_than_parallel_slots() {
    let nodes: Vec<_> =
        (0..6).map(|i| ScriptedEndpoint::ok(format!("node-{i}"), 5u64)).collect();
    let settings = Settings::count(2).with_max_parallel(2);

    let value = client().query(&settings, (), into_endpoints(nodes.clone())).await.unwrap();

    assert_eq!(value, 5);
    // The head of each of the two buckets answers first
    assert_eq!(nodes[0].calls(), 1);
    assert_eq!(nodes[3].calls(), 1);
    for node in &nodes {
        assert!(node.calls() <= 1);
    }
}

#[tokio::test]
async fn test_fewer_endpoints_than_parallel_slots() {
    let nodes =
        vec![ScriptedEndpoint::ok("node-a", 3u64), ScriptedEndpoint::ok("node-b", 3)];
    let settings = Settings::count(2).with_max_parallel(8);

    let value = client().query(&settings, (), into_endpoints(nodes)).await.unwrap();

    assert_eq!(value, 3);
}

#[tokio::test]
async fn test_single_slot_fails_over_serially() {
    let nodes = vec![
        ScriptedEndpoint::refusing("node-a"),
        ScriptedEndpoint::ok("node-b", 5u64),
    ];
    let settings = Settings::count(1).with_max_parallel(1).with_retries(0);

    let value = client().query(&settings, (), into_endpoints(nodes.clone())).await.unwrap();

    assert_eq!(value, 5);
    assert_eq!(nodes[0].calls(), 1);
    assert_eq!(nodes[1].calls(), 1);
}

#[tokio::test]
async fn test_hanging_endpoint_does_not_stall_the_query() {
    let nodes = vec![
        ScriptedEndpoint::hanging("node-a"),
        ScriptedEndpoint::ok("node-b", 9u64),
        ScriptedEndpoint::ok("node-c", 9),
    ];
    let settings = Settings::count(2).with_max_parallel(3);

    let value = client().query(&settings, (), into_endpoints(nodes)).await.unwrap();

    assert_eq!(value, 9);
}
