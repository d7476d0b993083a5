//! TATP (Telecom Application Transaction Processing) workload.
//!
//! The schema has one parent entity (`subscriber`) with two dependent children
//! (`access_info`, `special_facility`) and one grandchild keyed off a facility
//! (`call_forwarding`). [`RecordGenerator`] produces the initial population and
//! [`ProcedureGenerator`] produces the transaction stream run against it.

mod procedure;
mod record;

pub use procedure::*;
pub use record::*;

use rand::Rng;
use rand::distributions::{Distribution, Uniform};

/// Values of `access_info.ai_type`.
pub const AI_TYPES: [u8; 4] = [1, 2, 3, 4];

/// Values of `special_facility.sf_type`.
pub const SF_TYPES: [u8; 4] = [1, 2, 3, 4];

/// Call forwarding time slots (`call_forwarding.start_time`).
pub const START_TIMES: [u8; 3] = [0, 8, 16];

/// Length of a call forwarding slot at load time.
pub const SLOT_LENGTH: u8 = 8;

/// Upper bound of the `end_time` drawn by transactions (`1..=24`).
pub const MAX_END_TIME: u8 = 24;

/// Width of `sub_nbr` and `numberx` strings.
pub const SUB_NBR_WIDTH: usize = 15;

/// Renders a subscriber id as its phone-number-like key.
///
/// Zero-padded to [`SUB_NBR_WIDTH`] digits, so it is unique and reversible for
/// every id below 10^15.
pub fn sub_nbr(s_id: u64) -> String {
    format!("{:0width$}", s_id, width = SUB_NBR_WIDTH)
}

/// Inverse of [`sub_nbr`].
pub fn parse_sub_nbr(sub_nbr: &str) -> Option<u64> {
    sub_nbr.parse().ok()
}

/// Random string of `len` uppercase ASCII letters.
pub(crate) fn random_letters<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    let letters = Uniform::new_inclusive(b'A', b'Z');
    (0..len).map(|_| letters.sample(rng) as char).collect()
}

/// Random string of `len` decimal digits.
pub(crate) fn random_digits<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    let digits = Uniform::new_inclusive(b'0', b'9');
    (0..len).map(|_| digits.sample(rng) as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn sub_nbr_is_zero_padded_and_reversible() {
        assert_eq!(sub_nbr(1), "000000000000001");
        assert_eq!(sub_nbr(1_000_000), "000000001000000");
        for s_id in [1, 42, 999_999, 123_456_789_012_345] {
            let rendered = sub_nbr(s_id);
            assert_eq!(rendered.len(), SUB_NBR_WIDTH);
            assert_eq!(parse_sub_nbr(&rendered), Some(s_id));
        }
    }

    #[test]
    fn random_strings_have_requested_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let letters = random_letters(&mut rng, 5);
        assert_eq!(letters.len(), 5);
        assert!(letters.bytes().all(|b| b.is_ascii_uppercase()));

        let digits = random_digits(&mut rng, SUB_NBR_WIDTH);
        assert_eq!(digits.len(), SUB_NBR_WIDTH);
        assert!(digits.bytes().all(|b| b.is_ascii_digit()));
    }
}
