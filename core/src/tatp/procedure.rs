//! Transaction stream for the TATP run phase.

use super::{AI_TYPES, MAX_END_TIME, SF_TYPES, START_TIMES, SUB_NBR_WIDTH, random_digits, sub_nbr};
use anyhow::{Result, bail};
use rand::distributions::{Distribution, Uniform, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The seven TATP transaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcedureKind {
    GetSubscriberData,
    GetNewDestination,
    GetAccessData,
    UpdateSubscriberData,
    UpdateLocation,
    InsertCallForwarding,
    DeleteCallForwarding,
}

impl ProcedureKind {
    pub const ALL: [ProcedureKind; 7] = [
        ProcedureKind::GetSubscriberData,
        ProcedureKind::GetNewDestination,
        ProcedureKind::GetAccessData,
        ProcedureKind::UpdateSubscriberData,
        ProcedureKind::UpdateLocation,
        ProcedureKind::InsertCallForwarding,
        ProcedureKind::DeleteCallForwarding,
    ];

    /// Share of the transaction mix, in percent.
    pub fn weight(self) -> u32 {
        match self {
            ProcedureKind::GetSubscriberData => 35,
            ProcedureKind::GetNewDestination => 10,
            ProcedureKind::GetAccessData => 35,
            ProcedureKind::UpdateSubscriberData => 2,
            ProcedureKind::UpdateLocation => 14,
            ProcedureKind::InsertCallForwarding => 2,
            ProcedureKind::DeleteCallForwarding => 2,
        }
    }
}

/// One transaction request with all of its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Procedure {
    GetSubscriberData {
        s_id: u64,
    },
    GetNewDestination {
        s_id: u64,
        sf_type: u8,
        start_time: u8,
        end_time: u8,
    },
    GetAccessData {
        s_id: u64,
        ai_type: u8,
    },
    UpdateSubscriberData {
        s_id: u64,
        sf_type: u8,
        bit_1: bool,
        data_a: u8,
    },
    UpdateLocation {
        sub_nbr: String,
        vlr_location: u32,
    },
    InsertCallForwarding {
        sub_nbr: String,
        sf_type: u8,
        start_time: u8,
        end_time: u8,
        numberx: String,
    },
    DeleteCallForwarding {
        sub_nbr: String,
        sf_type: u8,
        start_time: u8,
    },
}

impl Procedure {
    pub fn kind(&self) -> ProcedureKind {
        match self {
            Procedure::GetSubscriberData { .. } => ProcedureKind::GetSubscriberData,
            Procedure::GetNewDestination { .. } => ProcedureKind::GetNewDestination,
            Procedure::GetAccessData { .. } => ProcedureKind::GetAccessData,
            Procedure::UpdateSubscriberData { .. } => ProcedureKind::UpdateSubscriberData,
            Procedure::UpdateLocation { .. } => ProcedureKind::UpdateLocation,
            Procedure::InsertCallForwarding { .. } => ProcedureKind::InsertCallForwarding,
            Procedure::DeleteCallForwarding { .. } => ProcedureKind::DeleteCallForwarding,
        }
    }
}

/// Endless, weighted-random stream of [`Procedure`]s over subscribers `1..=n`.
///
/// Each worker owns its own generator; nothing is shared between instances.
#[derive(Debug, Clone)]
pub struct ProcedureGenerator {
    rng: StdRng,
    s_id_dist: Uniform<u64>,
    kind_dist: WeightedIndex<u32>,
}

impl ProcedureGenerator {
    /// Generator with a fixed seed, for reproducible streams.
    pub fn new(subscribers: u64, seed: u64) -> Result<Self> {
        Self::with_rng(subscribers, StdRng::seed_from_u64(seed))
    }

    /// Generator seeded from OS entropy.
    pub fn from_entropy(subscribers: u64) -> Result<Self> {
        Self::with_rng(subscribers, StdRng::from_entropy())
    }

    fn with_rng(subscribers: u64, rng: StdRng) -> Result<Self> {
        if subscribers == 0 {
            bail!("procedure generator needs at least one subscriber");
        }
        let kind_dist = WeightedIndex::new(ProcedureKind::ALL.iter().map(|k| k.weight()))?;
        Ok(Self {
            rng,
            s_id_dist: Uniform::new_inclusive(1, subscribers),
            kind_dist,
        })
    }

    pub fn next_kind(&mut self) -> ProcedureKind {
        ProcedureKind::ALL[self.kind_dist.sample(&mut self.rng)]
    }

    /// Draws the inputs for a transaction of the given kind.
    pub fn generate(&mut self, kind: ProcedureKind) -> Procedure {
        match kind {
            ProcedureKind::GetSubscriberData => Procedure::GetSubscriberData { s_id: self.s_id() },
            ProcedureKind::GetNewDestination => Procedure::GetNewDestination {
                s_id: self.s_id(),
                sf_type: self.pick(&SF_TYPES),
                start_time: self.pick(&START_TIMES),
                end_time: self.end_time(),
            },
            ProcedureKind::GetAccessData => Procedure::GetAccessData {
                s_id: self.s_id(),
                ai_type: self.pick(&AI_TYPES),
            },
            ProcedureKind::UpdateSubscriberData => Procedure::UpdateSubscriberData {
                s_id: self.s_id(),
                sf_type: self.pick(&SF_TYPES),
                bit_1: self.rng.gen_bool(0.5),
                data_a: self.rng.gen_range(0..=255),
            },
            ProcedureKind::UpdateLocation => Procedure::UpdateLocation {
                sub_nbr: self.sub_nbr(),
                vlr_location: self.rng.gen_range(1..=u32::MAX),
            },
            ProcedureKind::InsertCallForwarding => Procedure::InsertCallForwarding {
                sub_nbr: self.sub_nbr(),
                sf_type: self.pick(&SF_TYPES),
                start_time: self.pick(&START_TIMES),
                end_time: self.end_time(),
                numberx: random_digits(&mut self.rng, SUB_NBR_WIDTH),
            },
            ProcedureKind::DeleteCallForwarding => Procedure::DeleteCallForwarding {
                sub_nbr: self.sub_nbr(),
                sf_type: self.pick(&SF_TYPES),
                start_time: self.pick(&START_TIMES),
            },
        }
    }

    fn s_id(&mut self) -> u64 {
        self.s_id_dist.sample(&mut self.rng)
    }

    fn sub_nbr(&mut self) -> String {
        sub_nbr(self.s_id())
    }

    fn end_time(&mut self) -> u8 {
        self.rng.gen_range(1..=MAX_END_TIME)
    }

    fn pick(&mut self, domain: &[u8]) -> u8 {
        domain[self.rng.gen_range(0..domain.len())]
    }
}

impl Iterator for ProcedureGenerator {
    type Item = Procedure;

    fn next(&mut self) -> Option<Procedure> {
        let kind = self.next_kind();
        Some(self.generate(kind))
    }
}
