//! Initial population for the TATP schema.
//!
//! Records are produced subscriber by subscriber: the subscriber row first,
//! then its access infos, then its special facilities each followed by that
//! facility's call forwardings. A streaming loader therefore always sees a
//! parent before any of its children.
//!
//! Every row of a subscriber is drawn from an RNG seeded only by `s_id`, so
//! the sequence for a given subscriber count is fully reproducible.

use super::{
    AI_TYPES, SF_TYPES, SLOT_LENGTH, START_TIMES, SUB_NBR_WIDTH, random_digits, random_letters,
    sub_nbr,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

const RECORD_SEED: u64 = 0x7A7B_5EED_0000_0001;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberRecord {
    pub s_id: u64,
    pub sub_nbr: String,
    pub bit: [bool; 10],
    pub hex: [u8; 10],
    pub byte2: [u8; 10],
    pub msc_location: u32,
    pub vlr_location: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessInfoRecord {
    pub s_id: u64,
    pub ai_type: u8,
    pub data1: u8,
    pub data2: u8,
    pub data3: String,
    pub data4: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialFacilityRecord {
    pub s_id: u64,
    pub sf_type: u8,
    pub is_active: bool,
    pub error_cntrl: u8,
    pub data_a: u8,
    pub data_b: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallForwardingRecord {
    pub s_id: u64,
    pub sf_type: u8,
    pub start_time: u8,
    pub end_time: u8,
    pub numberx: String,
}

/// One row of the initial population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Subscriber(SubscriberRecord),
    AccessInfo(AccessInfoRecord),
    SpecialFacility(SpecialFacilityRecord),
    CallForwarding(CallForwardingRecord),
}

impl Record {
    pub fn s_id(&self) -> u64 {
        match self {
            Record::Subscriber(r) => r.s_id,
            Record::AccessInfo(r) => r.s_id,
            Record::SpecialFacility(r) => r.s_id,
            Record::CallForwarding(r) => r.s_id,
        }
    }

    /// Name of the table the record belongs to.
    pub fn table(&self) -> &'static str {
        match self {
            Record::Subscriber(_) => "subscriber",
            Record::AccessInfo(_) => "access_info",
            Record::SpecialFacility(_) => "special_facility",
            Record::CallForwarding(_) => "call_forwarding",
        }
    }
}

/// Lazily yields the population for subscribers `1..=n`.
///
/// Creating a new generator with the same `n` reproduces the same sequence.
#[derive(Debug, Clone)]
pub struct RecordGenerator {
    subscribers: u64,
    next_s_id: u64,
    pending: VecDeque<Record>,
}

impl RecordGenerator {
    pub fn new(subscribers: u64) -> Self {
        Self {
            subscribers,
            next_s_id: 1,
            pending: VecDeque::new(),
        }
    }

    /// All rows belonging to one subscriber, in emission order.
    pub fn records_for(s_id: u64) -> Vec<Record> {
        let mut rng = StdRng::seed_from_u64(RECORD_SEED ^ s_id.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut records = Vec::with_capacity(16);

        records.push(Record::Subscriber(subscriber(&mut rng, s_id)));

        for ai_type in choose_types(&mut rng, &AI_TYPES) {
            records.push(Record::AccessInfo(AccessInfoRecord {
                s_id,
                ai_type,
                data1: rng.gen_range(0..=255),
                data2: rng.gen_range(0..=255),
                data3: random_letters(&mut rng, 3),
                data4: random_letters(&mut rng, 5),
            }));
        }

        for sf_type in choose_types(&mut rng, &SF_TYPES) {
            records.push(Record::SpecialFacility(SpecialFacilityRecord {
                s_id,
                sf_type,
                is_active: rng.gen_bool(0.85),
                error_cntrl: rng.gen_range(0..=255),
                data_a: rng.gen_range(0..=255),
                data_b: random_letters(&mut rng, 5),
            }));

            // One in three facilities has no forwarding at all.
            let forwardings = if rng.gen_range(0..3) == 0 {
                0
            } else {
                rng.gen_range(1..=START_TIMES.len())
            };
            let mut slots = START_TIMES;
            slots.shuffle(&mut rng);
            let mut slots = slots[..forwardings].to_vec();
            slots.sort_unstable();

            for start_time in slots {
                records.push(Record::CallForwarding(CallForwardingRecord {
                    s_id,
                    sf_type,
                    start_time,
                    end_time: start_time + SLOT_LENGTH,
                    numberx: random_digits(&mut rng, SUB_NBR_WIDTH),
                }));
            }
        }

        records
    }
}

impl Iterator for RecordGenerator {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.pending.is_empty() && self.next_s_id <= self.subscribers {
            self.pending.extend(Self::records_for(self.next_s_id));
            self.next_s_id += 1;
        }
        self.pending.pop_front()
    }
}

fn subscriber(rng: &mut StdRng, s_id: u64) -> SubscriberRecord {
    let mut bit = [false; 10];
    let mut hex = [0u8; 10];
    let mut byte2 = [0u8; 10];
    for b in bit.iter_mut() {
        *b = rng.gen_bool(0.5);
    }
    for h in hex.iter_mut() {
        *h = rng.gen_range(0..=15);
    }
    for b in byte2.iter_mut() {
        *b = rng.gen_range(0..=255);
    }

    SubscriberRecord {
        s_id,
        sub_nbr: sub_nbr(s_id),
        bit,
        hex,
        byte2,
        msc_location: rng.gen_range(1..=u32::MAX),
        vlr_location: rng.gen_range(1..=u32::MAX),
    }
}

/// Picks 1 to `domain.len()` distinct values from `domain`, in ascending order.
fn choose_types(rng: &mut StdRng, domain: &[u8; 4]) -> Vec<u8> {
    let count = rng.gen_range(1..=domain.len());
    let mut chosen: Vec<u8> = domain.choose_multiple(rng, count).copied().collect();
    chosen.sort_unstable();
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn keys(records: &[Record]) -> Vec<(&'static str, u64, u8, u8)> {
        records
            .iter()
            .map(|r| match r {
                Record::Subscriber(s) => ("subscriber", s.s_id, 0, 0),
                Record::AccessInfo(a) => ("access_info", a.s_id, a.ai_type, 0),
                Record::SpecialFacility(f) => ("special_facility", f.s_id, f.sf_type, 0),
                Record::CallForwarding(c) => ("call_forwarding", c.s_id, c.sf_type, c.start_time),
            })
            .collect()
    }

    #[test]
    fn empty_population_yields_nothing() {
        assert_eq!(RecordGenerator::new(0).count(), 0);
    }

    #[test]
    fn subscribers_cover_range_contiguously() {
        let ids: Vec<u64> = RecordGenerator::new(500)
            .filter_map(|r| match r {
                Record::Subscriber(s) => Some(s.s_id),
                _ => None,
            })
            .collect();
        assert_eq!(ids, (1..=500).collect::<Vec<_>>());
    }

    #[test]
    fn children_follow_their_parents() {
        let mut subscribers = HashSet::new();
        let mut facilities = HashSet::new();
        let mut forwardings = HashSet::new();

        for record in RecordGenerator::new(300) {
            match record {
                Record::Subscriber(s) => assert!(subscribers.insert(s.s_id)),
                Record::AccessInfo(a) => assert!(subscribers.contains(&a.s_id)),
                Record::SpecialFacility(f) => {
                    assert!(subscribers.contains(&f.s_id));
                    assert!(facilities.insert((f.s_id, f.sf_type)));
                }
                Record::CallForwarding(c) => {
                    assert!(facilities.contains(&(c.s_id, c.sf_type)));
                    assert!(forwardings.insert((c.s_id, c.sf_type, c.start_time)));
                    assert!(c.end_time > c.start_time);
                }
            }
        }
    }

    #[test]
    fn child_counts_stay_in_bounds() {
        for s_id in 1..=200 {
            let records = RecordGenerator::records_for(s_id);
            let ai = records.iter().filter(|r| matches!(r, Record::AccessInfo(_))).count();
            let sf = records.iter().filter(|r| matches!(r, Record::SpecialFacility(_))).count();
            let cf = records.iter().filter(|r| matches!(r, Record::CallForwarding(_))).count();
            assert!((1..=4).contains(&ai), "s_id {s_id}: {ai} access infos");
            assert!((1..=4).contains(&sf), "s_id {s_id}: {sf} facilities");
            assert!(cf <= sf * START_TIMES.len());
        }
    }

    #[test]
    fn sequence_is_reproducible() {
        let first: Vec<Record> = RecordGenerator::new(100).collect();
        let second: Vec<Record> = RecordGenerator::new(100).collect();
        assert_eq!(keys(&first), keys(&second));
        assert_eq!(first, second);
    }

    #[test]
    fn two_subscribers_are_emitted_in_blocks() {
        let records: Vec<Record> = RecordGenerator::new(2).collect();
        let order: Vec<(&str, u64)> = records.iter().map(|r| (r.table(), r.s_id())).collect();

        let split = order
            .iter()
            .position(|&(table, s_id)| table == "subscriber" && s_id == 2)
            .expect("second subscriber");
        assert_eq!(order[0], ("subscriber", 1));
        assert!(order[..split].iter().all(|&(_, s_id)| s_id == 1));
        assert!(order[split..].iter().all(|&(_, s_id)| s_id == 2));

        // Within one block: access infos, then facilities each trailed by forwardings.
        for block in [&order[..split], &order[split..]] {
            let rank = |table: &str| match table {
                "subscriber" => 0,
                "access_info" => 1,
                _ => 2,
            };
            assert!(block.windows(2).all(|w| rank(w[0].0) <= rank(w[1].0)));
            assert_ne!(block[1].0, "special_facility");
        }
    }

    #[test]
    fn load_time_values_match_domains() {
        for record in RecordGenerator::new(200) {
            match record {
                Record::Subscriber(s) => {
                    assert_eq!(s.sub_nbr, sub_nbr(s.s_id));
                    assert!(s.hex.iter().all(|&h| h <= 15));
                    assert!(s.msc_location >= 1 && s.vlr_location >= 1);
                }
                Record::AccessInfo(a) => {
                    assert!(AI_TYPES.contains(&a.ai_type));
                    assert_eq!(a.data3.len(), 3);
                    assert_eq!(a.data4.len(), 5);
                }
                Record::SpecialFacility(f) => {
                    assert!(SF_TYPES.contains(&f.sf_type));
                    assert_eq!(f.data_b.len(), 5);
                }
                Record::CallForwarding(c) => {
                    assert!(START_TIMES.contains(&c.start_time));
                    assert_eq!(c.end_time, c.start_time + SLOT_LENGTH);
                    assert_eq!(c.numberx.len(), SUB_NBR_WIDTH);
                }
            }
        }
    }

    #[test]
    fn roughly_a_third_of_facilities_have_no_forwarding() {
        let mut facilities = 0usize;
        let mut bare = 0usize;
        for s_id in 1..=3000 {
            let records = RecordGenerator::records_for(s_id);
            for (i, record) in records.iter().enumerate() {
                if let Record::SpecialFacility(_) = record {
                    facilities += 1;
                    if !matches!(records.get(i + 1), Some(Record::CallForwarding(_))) {
                        bare += 1;
                    }
                }
            }
        }
        let fraction = bare as f64 / facilities as f64;
        assert!((fraction - 1.0 / 3.0).abs() < 0.03, "fraction without forwarding: {fraction}");
    }
}
