//! Priority ordering shared by both mempool back-ends.
//!
//! Orders by fee descending, FIFO among ties, and doubles as the eviction
//! order: the *last* element under this `Ord` is simultaneously the
//! lowest-fee entry and, among equal fees, the one with the latest
//! `received_at` — the correct eviction candidate.

use std::cmp::Ordering;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriorityKey {
    pub fee: u64,
    pub received_at: i64,
    pub tx_hash: String,
}

impl Ord for PriorityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fee
            .cmp(&self.fee)
            .then_with(|| self.received_at.cmp(&other.received_at))
            .then_with(|| self.tx_hash.cmp(&other.tx_hash))
    }
}

impl PartialOrd for PriorityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_fee_sorts_first() {
        let low = PriorityKey {
            fee: 1,
            received_at: 0,
            tx_hash: "a".into(),
        };
        let high = PriorityKey {
            fee: 5,
            received_at: 0,
            tx_hash: "b".into(),
        };
        assert!(high < low);
    }

    #[test]
    fn equal_fee_breaks_tie_by_earliest_received_at_for_priority() {
        let earlier = PriorityKey {
            fee: 1,
            received_at: 10,
            tx_hash: "a".into(),
        };
        let later = PriorityKey {
            fee: 1,
            received_at: 20,
            tx_hash: "b".into(),
        };
        assert!(earlier < later);
    }
}
