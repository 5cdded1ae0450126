//! Mempool metrics, registered once via `lazy_static!` and `prometheus`.

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_gauge, IntCounter, IntGauge};

lazy_static! {
    pub static ref MEMPOOL_SIZE: IntGauge =
        register_int_gauge!("mempool_size", "Current number of pending transactions")
            .expect("failed to register mempool_size");
    pub static ref TX_ADDED_TOTAL: IntCounter = register_int_counter!(
        "mempool_tx_added_total",
        "Total transactions admitted to the mempool"
    )
    .expect("failed to register mempool_tx_added_total");
    pub static ref TX_DRAINED_TOTAL: IntCounter = register_int_counter!(
        "mempool_tx_drained_total",
        "Total transactions removed via drain()"
    )
    .expect("failed to register mempool_tx_drained_total");
    pub static ref EVICTIONS_TOTAL: IntCounter = register_int_counter!(
        "mempool_evictions_total",
        "Total transactions evicted to make room for a new one"
    )
    .expect("failed to register mempool_evictions_total");
}

pub fn record_added() {
    TX_ADDED_TOTAL.inc();
}

pub fn record_drained(count: usize) {
    TX_DRAINED_TOTAL.inc_by(count as u64);
}

pub fn record_evicted() {
    EVICTIONS_TOTAL.inc();
}

pub fn set_size(size: usize) {
    MEMPOOL_SIZE.set(size as i64);
}
