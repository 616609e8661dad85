use std::{f64::consts::PI, sync::OnceLock};

/// Enumerations naming the record kinds and input formats of the event model.
pub mod enums;
/// Three- and four-vectors with the kinematic conversions used by every record.
pub mod vectors;

/// A random, nonzero value drawn once per process.
///
/// Identifiers which may be persisted ([`StoreId`](crate::refs::StoreId),
/// [`CandidateId`](crate::candidate::CandidateId)) are offset by it, so two processes with the
/// same allocation history never hand out the same identifiers.
pub(crate) fn process_salt() -> u64 {
    static SALT: OnceLock<u64> = OnceLock::new();
    *SALT.get_or_init(|| fastrand::u64(1..))
}

/// The signed difference `a - b` between two azimuthal angles, wrapped into $`(-\pi, \pi]`$.
pub fn delta_phi(a: f64, b: f64) -> f64 {
    let mut dphi = (a - b) % (2.0 * PI);
    if dphi > PI {
        dphi -= 2.0 * PI;
    } else if dphi <= -PI {
        dphi += 2.0 * PI;
    }
    dphi
}
