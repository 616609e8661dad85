//! Glue between [`Versioned`] records and the byte formats used to persist them.
//!
//! Two encodings are offered. The binary encoding ([`to_bytes`]/[`from_bytes`]) is compact
//! and positional, so it only reads back payloads written with exactly the current layout
//! version. The pickle encoding ([`to_pickle`]/[`from_pickle`]) stores fields by name, so a
//! payload written with an older layout reads back with the missing fields set to their
//! neutral defaults.
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{data::Versioned, TesseraError, TesseraResult};

/// A payload tagged with the record name and layout version it was written with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedRecord<P> {
    /// The persisted record name.
    pub name: String,
    /// The layout version the payload was written with.
    pub version: u16,
    /// The record (or collection of records) itself.
    pub payload: P,
}

impl<P: Versioned> VersionedRecord<P> {
    /// Tag a payload with its current name and layout version.
    pub fn new(payload: P) -> Self {
        Self {
            name: P::NAME.to_string(),
            version: P::VERSION,
            payload,
        }
    }
}

impl<P> VersionedRecord<P> {
    fn check<T: Versioned>(&self, exact: bool) -> TesseraResult<()> {
        let compatible = if exact {
            self.version == T::VERSION
        } else {
            self.version <= T::VERSION
        };
        if self.name == T::NAME && compatible {
            Ok(())
        } else {
            Err(TesseraError::LayoutError {
                found: self.name.clone(),
                found_version: self.version,
                expected: T::NAME.to_string(),
                expected_version: T::VERSION,
            })
        }
    }
}

/// Encode a record or a collection of records with the compact binary encoding.
pub fn to_bytes<T: Versioned + Serialize>(value: &T) -> TesseraResult<Vec<u8>> {
    let record = VersionedRecord {
        name: T::NAME.to_string(),
        version: T::VERSION,
        payload: value,
    };
    Ok(bincode::serialize(&record)?)
}

/// Decode a payload written by [`to_bytes`].
///
/// # Errors
///
/// Returns [`TesseraError::LayoutError`] unless the payload was written for the same record
/// name and exactly the current layout version.
pub fn from_bytes<T: Versioned + DeserializeOwned>(bytes: &[u8]) -> TesseraResult<T> {
    let header: VersionedRecord<()> = bincode::deserialize(bytes)?;
    header.check::<T>(true)?;
    let record: VersionedRecord<T> = bincode::deserialize(bytes)?;
    Ok(record.payload)
}

/// Encode a record or a collection of records with the self-describing pickle encoding.
pub fn to_pickle<T: Versioned + Serialize>(value: &T) -> TesseraResult<Vec<u8>> {
    let record = VersionedRecord {
        name: T::NAME.to_string(),
        version: T::VERSION,
        payload: value,
    };
    Ok(serde_pickle::to_vec(&record, serde_pickle::SerOptions::new())?)
}

/// Decode a payload written by [`to_pickle`], for the current or any older layout version.
///
/// # Errors
///
/// Returns [`TesseraError::LayoutError`] if the payload names another record or was written
/// with a newer layout than this build knows about.
pub fn from_pickle<T: Versioned + DeserializeOwned>(bytes: &[u8]) -> TesseraResult<T> {
    let record: VersionedRecord<serde_pickle::Value> =
        serde_pickle::from_slice(bytes, serde_pickle::DeOptions::new())?;
    record.check::<T>(false)?;
    Ok(serde_pickle::from_value(record.payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{GenParticle, Jet, Photon, Track},
        refs::Arena,
        utils::enums::RecordKind,
    };

    /// The version-2 layout of a photon, before isolation and timing were recorded.
    #[derive(Serialize)]
    struct PhotonV2 {
        pt: f64,
        eta: f64,
        phi: f64,
        e_had_over_e_em: f64,
    }

    impl Versioned for PhotonV2 {
        const NAME: &'static str = "Photon";
        const VERSION: u16 = 2;
    }

    #[test]
    fn test_binary_round_trip() {
        let mut particles = Arena::new(RecordKind::GenParticle);
        let truth = particles.insert(GenParticle::default());
        let tracks = vec![
            Track {
                pt: 10.0,
                eta: 0.5,
                particle: Some(truth),
                ..Default::default()
            },
            Track {
                pt: 5.0,
                ..Default::default()
            },
        ];
        let bytes = to_bytes(&tracks).unwrap();
        let decoded: Vec<Track> = from_bytes(&bytes).unwrap();
        assert_eq!(decoded[0].pt, 10.0);
        assert_eq!(decoded[1].pt, 5.0);
        assert!(decoded[1].particle.is_none());

        // a store of the next event, or of a process reading these bytes, holds a different
        // record in the same slot
        particles.clear();
        let other = particles.insert(GenParticle {
            pid: 22,
            ..Default::default()
        });
        let stale = decoded[0].particle.unwrap();
        assert_eq!(stale.index(), other.index());
        assert!(particles.get(stale).is_err());
        let mut fresh = Arena::new(RecordKind::GenParticle);
        let unrelated = fresh.insert(GenParticle::default());
        assert_eq!(stale.index(), unrelated.index());
        assert!(fresh.get(stale).is_err());
    }

    #[test]
    fn test_binary_rejects_other_record() {
        let bytes = to_bytes(&Jet::default()).unwrap();
        let result: TesseraResult<Track> = from_bytes(&bytes);
        assert!(matches!(result, Err(TesseraError::LayoutError { .. })));
    }

    #[test]
    fn test_pickle_older_layout_defaults_missing_fields() {
        let old = PhotonV2 {
            pt: 25.0,
            eta: 1.5,
            phi: -0.5,
            e_had_over_e_em: 0.1,
        };
        let bytes = to_pickle(&old).unwrap();
        let photon: Photon = from_pickle(&bytes).unwrap();
        assert_eq!(photon.pt, 25.0);
        assert_eq!(photon.e_had_over_e_em, 0.1);
        assert_eq!(photon.isolation_var, 0.0);
        assert_eq!(photon.t_outer, 0.0);
        assert!(photon.particles.is_empty());
    }

    #[test]
    fn test_pickle_rejects_newer_layout() {
        struct PhotonV9;
        impl Versioned for PhotonV9 {
            const NAME: &'static str = "Photon";
            const VERSION: u16 = 9;
        }
        let record = VersionedRecord::<Photon> {
            name: PhotonV9::NAME.to_string(),
            version: PhotonV9::VERSION,
            payload: Photon::default(),
        };
        let bytes = serde_pickle::to_vec(&record, serde_pickle::SerOptions::new()).unwrap();
        let result: TesseraResult<Photon> = from_pickle(&bytes);
        assert!(matches!(
            result,
            Err(TesseraError::LayoutError {
                found_version: 9,
                expected_version: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_gen_particle_relations_default_to_none() {
        #[derive(Serialize)]
        struct Bare {
            pid: i32,
        }
        impl Versioned for Bare {
            const NAME: &'static str = "GenParticle";
            const VERSION: u16 = 1;
        }
        let bytes = to_pickle(&Bare { pid: 11 }).unwrap();
        let particle: GenParticle = from_pickle(&bytes).unwrap();
        assert_eq!(particle.pid, 11);
        assert_eq!(particle.m1, -1);
        assert_eq!(particle.d2, -1);
    }

    #[test]
    fn test_versioned_record_new() {
        let record = VersionedRecord::new(Jet::default());
        assert_eq!(record.name, "Jet");
        assert_eq!(record.version, 4);
    }
}
