//! End-to-end runs through the thread driver

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fifoq_core::{ActorConfig, DelaySpec, ScenarioConfig};
use fifoq_exec::{Driver, Event, ExecError, Message, NullSink, RecordingSink, Role};

fn multiset(messages: &[Message]) -> HashMap<Message, usize> {
    let mut counts = HashMap::new();
    for m in messages {
        *counts.entry(m.clone()).or_insert(0) += 1;
    }
    counts
}

#[test]
fn test_no_loss_no_duplication() {
    let config = ScenarioConfig::new(4)
        .producer(ActorConfig::new("first", DelaySpec::fixed(0)).with_max_items(300))
        .producer(ActorConfig::new("second", DelaySpec::uniform(0, 1)).with_max_items(250))
        .producer(ActorConfig::new("third", DelaySpec::fixed(1)).with_max_items(100))
        .consumer(ActorConfig::new("consumer1", DelaySpec::fixed(0)))
        .consumer(ActorConfig::new("consumer2", DelaySpec::uniform(0, 1)))
        .consumer(ActorConfig::new("consumer3", DelaySpec::fixed(0)));

    let sink = Arc::new(RecordingSink::new());
    let mut driver = Driver::spawn(&config, sink.clone()).expect("spawn");
    driver.wait_producers().expect("producers");
    assert!(driver.wait_until_drained(Duration::from_secs(10)));
    let report = driver.shutdown().expect("shutdown");

    assert!(report.is_consistent(), "{report:?}");
    assert_eq!(report.produced, 650);
    assert_eq!(report.consumed, 650);
    assert_eq!(report.remaining, 0);
    assert!(report.queue.high_water <= 4);

    let produced = sink.produced();
    let consumed = sink.consumed();
    assert_eq!(produced.len(), 650);
    assert_eq!(multiset(&produced), multiset(&consumed));
    assert!(multiset(&consumed).values().all(|&n| n == 1));

    for label in ["first", "second", "third"] {
        let r = report.actor(label).expect("producer report");
        assert_eq!(r.role, Role::Producer);
        assert!(!r.cancelled);
    }
    for label in ["consumer1", "consumer2", "consumer3"] {
        let r = report.actor(label).expect("consumer report");
        assert_eq!(r.role, Role::Consumer);
        assert!(r.cancelled);
    }
}

#[test]
fn test_single_producer_single_consumer_order() {
    let config = ScenarioConfig::new(2)
        .producer(ActorConfig::new("p", DelaySpec::fixed(0)).with_max_items(200))
        .consumer(ActorConfig::new("c", DelaySpec::fixed(0)).with_max_items(200));

    let sink = Arc::new(RecordingSink::new());
    let mut driver = Driver::spawn(&config, sink.clone()).unwrap();
    driver.wait_producers().unwrap();
    assert!(driver.wait_until_drained(Duration::from_secs(10)));
    let report = driver.shutdown().unwrap();

    let expected: Vec<Message> = (0..200).map(|i| Message::new("p", i)).collect();
    assert_eq!(sink.consumed(), expected);
    assert_eq!(report.actor("c").unwrap().operations, 200);
    assert!(report.is_consistent());
}

#[test]
fn test_shutdown_unblocks_producers_without_consumers() {
    let config = ScenarioConfig::new(2)
        .producer(ActorConfig::new("a", DelaySpec::fixed(0)))
        .producer(ActorConfig::new("b", DelaySpec::fixed(0)));

    let driver = Driver::spawn(&config, Arc::new(NullSink)).unwrap();
    // Both producers end up parked on a full queue.
    let token = driver.token();
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while !(driver.queue().is_full() && token.registered_waiters() == 2) {
        assert!(std::time::Instant::now() < deadline, "producers never blocked");
        std::thread::sleep(Duration::from_millis(1));
    }

    let report = driver.shutdown().unwrap();
    assert_eq!(report.produced, 2);
    assert_eq!(report.consumed, 0);
    assert_eq!(report.remaining, 2);
    assert!(report.actors.iter().all(|a| a.cancelled));
    assert!(report.is_consistent());
}

#[test]
fn test_shutdown_unblocks_consumers_without_producers() {
    let config = ScenarioConfig::new(1)
        .consumer(ActorConfig::new("c1", DelaySpec::fixed(0)))
        .consumer(ActorConfig::new("c2", DelaySpec::fixed(0)));

    let report = Driver::run_for(&config, Arc::new(NullSink), Duration::from_millis(50)).unwrap();
    assert_eq!(report.consumed, 0);
    assert_eq!(report.actors.len(), 2);
    assert!(report.actors.iter().all(|a| a.cancelled && a.operations == 0));
}

#[test]
fn test_shutdown_interrupts_long_pauses() {
    let config = ScenarioConfig::new(4)
        .producer(ActorConfig::new("slow", DelaySpec::fixed(60_000)))
        .consumer(ActorConfig::new("sleepy", DelaySpec::fixed(60_000)));

    let started = std::time::Instant::now();
    let report = Driver::run_for(&config, Arc::new(NullSink), Duration::from_millis(100)).unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(report.produced, 1);
    assert!(report.is_consistent());
}

#[test]
fn test_invalid_scenario_is_rejected() {
    let config = ScenarioConfig::new(0).producer(ActorConfig::new("p", DelaySpec::fixed(1)));
    match Driver::spawn(&config, Arc::new(NullSink)) {
        Err(ExecError::Config(e)) => assert!(e.to_string().contains("capacity")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("capacity 0 must be rejected"),
    }

    let dup = ScenarioConfig::new(1)
        .producer(ActorConfig::new("x", DelaySpec::fixed(1)))
        .consumer(ActorConfig::new("x", DelaySpec::fixed(1)));
    let err = Driver::spawn(&dup, Arc::new(NullSink)).err().expect("duplicate labels");
    assert!(!err.suggestions().is_empty());
}

#[test]
fn test_events_carry_actor_and_stamp() {
    let config = ScenarioConfig::new(1)
        .producer(ActorConfig::new("tagger", DelaySpec::fixed(0)).with_max_items(3))
        .consumer(ActorConfig::new("reader", DelaySpec::fixed(0)).with_max_items(3));

    let sink = Arc::new(RecordingSink::new());
    let mut driver = Driver::spawn(&config, sink.clone()).unwrap();
    driver.wait_producers().unwrap();
    assert!(driver.wait_until_drained(Duration::from_secs(10)));
    driver.shutdown().unwrap();

    let events = sink.events();
    assert_eq!(events.len(), 6);
    for e in &events {
        assert!(e.stamp() < 100_000);
        match e {
            Event::Produced { actor, .. } => assert_eq!(actor, "tagger"),
            Event::Consumed { actor, .. } => assert_eq!(actor, "reader"),
        }
        assert_eq!(e.message().tag, "tagger");
    }
    assert_eq!(Message::new("tagger", 2).to_string(), "tagger 2");
}

#[test]
fn test_report_serializes_to_json() {
    let config = ScenarioConfig::new(2)
        .producer(ActorConfig::new("p", DelaySpec::fixed(0)).with_max_items(5))
        .consumer(ActorConfig::new("c", DelaySpec::fixed(0)).with_max_items(5));

    let mut driver = Driver::spawn(&config, Arc::new(NullSink)).unwrap();
    driver.wait_producers().unwrap();
    assert!(driver.wait_until_drained(Duration::from_secs(10)));
    let report = driver.shutdown().unwrap();

    let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
    assert_eq!(json["capacity"], 2);
    assert_eq!(json["produced"], 5);
    assert_eq!(json["queue"]["inserted"], 5);
    let roles: Vec<&str> = json["actors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["producer", "consumer"]);
}
