//! `tessera` is the per-event object model of a fast detector-simulation pipeline. It defines the
//! truth-level and reconstructed physics records produced while simulating one collision event,
//! the weak references which tie those records together, a generic aggregation record
//! ([`Candidate`]) which the reconstruction modules pass between each other, and one installed
//! ordering per record kind.
//!
//! <div class="warning">
//!
//! This crate is still in an early development phase, and the API is not stable. It can (and likely will) be subject to breaking changes before the 1.0.0 version release.
//!
//! </div>
//!
//! # Table of Contents
//! - [Key Features](#key-features)
//! - [Quick Start](#quick-start)
//!   - [Building Candidates](#building-candidates)
//!   - [Sorting](#sorting)
//! - [Event Lifetime](#event-lifetime)
//! - [Persistence](#persistence)
//!
//! # Key Features
//! * Flat, versioned physics records ([`GenParticle`], [`Photon`], [`Electron`], [`Muon`],
//!   [`IsoTrack`], [`Jet`], [`Track`], [`Tower`]) whose four-momenta are always derived from
//!   their stored fields.
//! * Generation-checked handles ([`Ref`], [`RefList`], [`ObjectRef`]) which can never resolve
//!   into a record of a later event.
//! * A [`Candidate`] tree with deep cloning and identity-based overlap detection.
//! * A read-only comparator registry, with parallel sorting through [`rayon`](https://github.com/rayon-rs/rayon).
//! * Python bindings for vectors and the event store behind the `python` feature.
//!
//! # Quick Start
//! ## Building Candidates
//! Every record of an event lives in an [`EventStore`]. Candidates are allocated in it and
//! composed from each other by handle:
//!
//! ```rust
//! use tessera::{EventStore, Vec4};
//!
//! let mut store = EventStore::new();
//! let t1 = store.new_candidate();
//! let t2 = store.new_candidate();
//! store.candidates.get_mut(t1)?.momentum = Vec4::from_pt_eta_phi_m(20.0, 0.1, 0.5, 0.0);
//! store.candidates.get_mut(t2)?.momentum = Vec4::from_pt_eta_phi_m(10.0, -0.4, 2.0, 0.0);
//!
//! let c1 = store.new_candidate();
//! let c2 = store.new_candidate();
//! let c3 = store.new_candidate();
//! store.candidates.get_mut(c1)?.add_candidate(t1);
//! store.candidates.get_mut(c2)?.add_candidate(t1);
//! store.candidates.get_mut(c2)?.add_candidate(t2);
//! store.candidates.get_mut(c3)?.add_candidate(t2);
//!
//! assert!(store.candidates.overlaps(c1, c2));
//! assert!(!store.candidates.overlaps(c1, c3));
//!
//! // a clone describes the same object but owns its own constituents
//! let copy = store.candidates.clone_candidate(c2)?;
//! assert!(store.candidates.overlaps(copy, c2));
//! assert_ne!(
//!     store.candidates.get(copy)?.candidates(),
//!     store.candidates.get(c2)?.candidates()
//! );
//! # Ok::<(), tessera::TesseraError>(())
//! ```
//!
//! ## Sorting
//! Each record kind has exactly one installed ordering: descending transverse energy for
//! [`Tower`]s and descending transverse momentum for everything else, with ties broken by
//! ascending $`|\eta|`$, then $`\eta`$, then $`\phi`$.
//!
//! ```rust
//! use tessera::{sorting::sort_by_comparator, Jet};
//!
//! let mut jets = vec![
//!     Jet { pt: 20.0, eta: 1.0, ..Default::default() },
//!     Jet { pt: 50.0, eta: -2.0, ..Default::default() },
//!     Jet { pt: 20.0, eta: -0.5, ..Default::default() },
//! ];
//! sort_by_comparator(&mut jets);
//! let order: Vec<(f64, f64)> = jets.iter().map(|j| (j.pt, j.eta)).collect();
//! assert_eq!(order, vec![(50.0, -2.0), (20.0, -0.5), (20.0, 1.0)]);
//! ```
//!
//! # Event Lifetime
//! References are only meaningful within the event they were created in.
//! [`EventStore::finish_event`] releases every record at once; any handle kept past that point
//! fails with [`TesseraError::NotFound`] instead of silently resolving into a record of the
//! next event:
//!
//! ```rust
//! use tessera::{EventStore, GenParticle};
//!
//! let mut store = EventStore::new();
//! let electron = store.particles.insert(GenParticle { pid: 11, ..Default::default() });
//! store.finish_event();
//! let _ = store.particles.insert(GenParticle { pid: 22, ..Default::default() });
//! assert!(store.particles.get(electron).is_err());
//! ```
//!
//! # Persistence
//! Each record type carries a persisted name and layout version through the
//! [`Versioned`](crate::traits::Versioned) trait. The helpers in [`io`] tag payloads with both;
//! the pickle encoding reads payloads written with older layouts, filling fields that did not
//! exist yet with their neutral defaults.
#![warn(clippy::perf, clippy::style, missing_docs)]

/// Fixed-layout physics records stored per event.
pub mod data {
    pub use tessera_core::data::{
        Electron, Event, EventDetails, EventInfo, GenParticle, HepMcInfo, IsoTrack, Jet,
        LhcoInfo, LhefInfo, MissingET, Muon, Photon, Rho, ScalarHT, Tower, Track, Weight,
    };
}

/// Versioned binary and pickle encodings of records.
pub mod io {
    pub use tessera_core::data::io::*;
}

/// Weak, generation-checked references between records.
pub mod refs {
    pub use tessera_core::refs::*;
}

/// Installed orderings and sort utilities.
pub mod sorting {
    pub use tessera_core::sorting::*;
}

/// Utility functions, enums, and vectors
pub mod utils {
    pub use tessera_core::utils::*;
}

/// Useful traits for all crate structs
pub mod traits {
    pub use tessera_core::traits::*;
}

pub use tessera_core::candidate::{Candidate, CandidateId, Candidates};
pub use tessera_core::data::{
    Electron, Event, EventDetails, EventInfo, GenParticle, HepMcInfo, IsoTrack, Jet, LhcoInfo,
    LhefInfo, MissingET, Muon, Photon, Rho, ScalarHT, Tower, Track, Weight,
};
pub use tessera_core::refs::{Arena, Ref, RefList, StoreId};
pub use tessera_core::sorting::{comparator_for, registry, Comparator, DeltaRComparator};
pub use tessera_core::store::{EventStore, ObjectRef, ObjectView, StoreOptions};
pub use tessera_core::utils::enums::{EventFormat, RecordKind};
pub use tessera_core::utils::vectors::{Vec3, Vec4};
pub use tessera_core::{TesseraError, TesseraResult};
pub use serde::{Deserialize, Serialize};
