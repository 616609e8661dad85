//! # tessera-core
//!
//! This is an internal crate used by `tessera`.
#![warn(clippy::perf, clippy::style)]
#![allow(clippy::excessive_precision)]

#[cfg(feature = "python")]
use pyo3::PyErr;
use thiserror::Error;

/// The generic [`Candidate`](crate::candidate::Candidate) record and its aggregation tree.
pub mod candidate;
/// Fixed-layout physics records stored per event.
pub mod data;
/// Weak, generation-checked references between records of one event.
pub mod refs;
/// Installed per-type orderings and the utilities which sort with them.
pub mod sorting;
/// The per-event store which owns every record and candidate of one event.
pub mod store;
/// Utility functions, enums, and vectors
pub mod utils;
/// Useful traits for all crate structs
pub mod traits {
    pub use crate::data::Versioned;
    pub use crate::sorting::{Kinematics, Sortable};
}

pub use crate::candidate::{Candidate, CandidateId, Candidates};
pub use crate::data::{
    Electron, Event, EventDetails, EventInfo, GenParticle, HepMcInfo, IsoTrack, Jet, LhcoInfo,
    LhefInfo, MissingET, Muon, Photon, Rho, ScalarHT, Tower, Track, Weight,
};
pub use crate::refs::{Arena, Ref, RefList, StoreId};
pub use crate::sorting::{comparator_for, registry, Comparator, DeltaRComparator};
pub use crate::store::{EventStore, ObjectRef, ObjectView, StoreOptions};
pub use crate::utils::enums::{EventFormat, RecordKind};
pub use crate::utils::vectors::{Vec3, Vec4};

/// The result type used by all `tessera` internal methods.
pub type TesseraResult<T> = Result<T, TesseraError>;

/// The error type used by all `tessera` internal methods
#[derive(Error, Debug)]
pub enum TesseraError {
    /// A handle no longer resolves: its record was released, the event it belongs to has been
    /// torn down, or it names a different store.
    #[error("No live {kind} at slot {index} (generation {generation})!")]
    NotFound {
        /// The kind of record the handle refers to
        kind: RecordKind,
        /// The slot index named by the handle
        index: u32,
        /// The generation named by the handle
        generation: u64,
    },
    /// An error which occurs when the user tries to parse an invalid string of text, typically
    /// into an enum variant.
    #[error("Failed to parse string: \"{name}\" does not correspond to a valid \"{object}\"!")]
    ParseError {
        /// The string which was parsed
        name: String,
        /// The name of the object it failed to parse into
        object: String,
    },
    /// A persisted record whose name or layout version cannot be read into the requested type.
    #[error("Cannot read \"{found}\" (version {found_version}) as \"{expected}\" (version {expected_version})!")]
    LayoutError {
        /// The record name stored alongside the payload
        found: String,
        /// The layout version stored alongside the payload
        found_version: u16,
        /// The record name of the requested type
        expected: String,
        /// The layout version of the requested type
        expected_version: u16,
    },
    /// An error returned by the binary (de)serializer
    #[error("Serialization error: {0}")]
    SerdeError(#[from] bincode::Error),
    /// An error returned by the Python pickle (de)serializer
    #[error("Pickle conversion error: {0}")]
    PickleError(#[from] serde_pickle::Error),
    /// An error type for [`rayon`] thread pools
    #[cfg(feature = "rayon")]
    #[error("Error building thread pool: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),
    /// A custom fallback error for errors too complex or too infrequent to warrant their own error
    /// category.
    #[error("{0}")]
    Custom(String),
}

impl Clone for TesseraError {
    // Wrapped library errors are not cloneable, so clones collapse into their message
    fn clone(&self) -> Self {
        match self {
            TesseraError::NotFound {
                kind,
                index,
                generation,
            } => TesseraError::NotFound {
                kind: *kind,
                index: *index,
                generation: *generation,
            },
            _ => TesseraError::Custom(self.to_string()),
        }
    }
}

#[cfg(feature = "python")]
impl From<TesseraError> for PyErr {
    fn from(err: TesseraError) -> Self {
        use pyo3::exceptions::*;
        let err_string = err.to_string();
        match err {
            TesseraError::NotFound { .. } => PyKeyError::new_err(err_string),
            TesseraError::ParseError { .. } | TesseraError::LayoutError { .. } => {
                PyValueError::new_err(err_string)
            }
            TesseraError::SerdeError(_) | TesseraError::PickleError(_) => {
                PyIOError::new_err(err_string)
            }
            #[cfg(feature = "rayon")]
            TesseraError::ThreadPoolError(_) => PyException::new_err(err_string),
            TesseraError::Custom(_) => PyException::new_err(err_string),
        }
    }
}
