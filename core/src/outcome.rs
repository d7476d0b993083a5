//! Classified results of a single completed worker operation.

use serde::Serialize;

/// How a completed operation ended.
///
/// Every variant counts as a completed operation for throughput. Failures the
/// executor cannot classify are returned as `Err` instead and abort the run.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The operation found and touched the rows it addressed.
    Success,
    /// The addressed key had no matching row.
    Missing,
    /// A write collided with an existing unique/primary key or a missing parent.
    Conflict,
}

impl Outcome {
    /// Maps a "did anything match" flag onto `Success` / `Missing`.
    pub fn hit_or_miss(hit: bool) -> Self {
        if hit { Outcome::Success } else { Outcome::Missing }
    }
}

#[cfg(test)]
mod tests {
    use super::Outcome;

    #[test]
    fn hit_or_miss_maps_flag() {
        assert_eq!(Outcome::hit_or_miss(true), Outcome::Success);
        assert_eq!(Outcome::hit_or_miss(false), Outcome::Missing);
    }
}
