//! Gossip broker metrics.

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, register_int_gauge_vec, IntCounter, IntCounterVec, IntGaugeVec};
use std::sync::Mutex;

lazy_static! {
    pub static ref PUBLICATIONS_TOTAL: IntCounter = register_int_counter!(
        "gossip_publications_total",
        "Total messages published across all topics"
    )
    .expect("failed to register gossip_publications_total");
    pub static ref PUBLICATIONS_BY_TOPIC: IntCounterVec = register_int_counter_vec!(
        "gossip_publications_topic",
        "Messages published per topic",
        &["topic"]
    )
    .expect("failed to register gossip_publications_topic");
    pub static ref SUBSCRIBERS_BY_TOPIC: IntGaugeVec = register_int_gauge_vec!(
        "gossip_subscribers_topic",
        "Active subscribers per topic",
        &["topic"]
    )
    .expect("failed to register gossip_subscribers_topic");
    pub static ref SUBSCRIBERS_TOTAL: prometheus::IntGauge =
        prometheus::register_int_gauge!("gossip_subscribers_total", "Active subscribers across all topics")
            .expect("failed to register gossip_subscribers_total");
    pub static ref QUEUE_SIZE_BY_TOPIC: IntGaugeVec = register_int_gauge_vec!(
        "gossip_queue_size",
        "Observed queue depth at last publish, per topic",
        &["topic"]
    )
    .expect("failed to register gossip_queue_size");
    static ref TOTAL_SUBSCRIBERS: Mutex<i64> = Mutex::new(0);
}

pub fn record_publication(topic: &str) {
    PUBLICATIONS_TOTAL.inc();
    PUBLICATIONS_BY_TOPIC.with_label_values(&[topic]).inc();
}

pub fn set_queue_size(topic: &str, size: usize) {
    QUEUE_SIZE_BY_TOPIC
        .with_label_values(&[topic])
        .set(size as i64);
}

pub fn subscriber_joined(topic: &str, count_for_topic: usize) {
    SUBSCRIBERS_BY_TOPIC
        .with_label_values(&[topic])
        .set(count_for_topic as i64);
    let mut total = TOTAL_SUBSCRIBERS.lock().unwrap();
    *total += 1;
    SUBSCRIBERS_TOTAL.set(*total);
}

pub fn subscriber_left(topic: &str, count_for_topic: usize) {
    SUBSCRIBERS_BY_TOPIC
        .with_label_values(&[topic])
        .set(count_for_topic as i64);
    let mut total = TOTAL_SUBSCRIBERS.lock().unwrap();
    *total = (*total - 1).max(0);
    SUBSCRIBERS_TOTAL.set(*total);
}

pub fn reset_all_subscribers() {
    let mut total = TOTAL_SUBSCRIBERS.lock().unwrap();
    *total = 0;
    SUBSCRIBERS_TOTAL.set(0);
}
