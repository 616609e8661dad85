//! The per-event container which owns every record of one event.
//!
//! An [`EventStore`] holds one typed [`Arena`] per record kind plus the event header and the
//! per-event scalar summaries. Records are allocated into it while an event is processed and
//! released all at once by [`EventStore::finish_event`], after which every handle issued during
//! that event fails to resolve.
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    candidate::{Candidate, Candidates},
    data::{
        Electron, Event, GenParticle, IsoTrack, Jet, MissingET, Muon, Photon, Rho, ScalarHT,
        Tower, Track, Weight,
    },
    refs::{Arena, Ref},
    sorting::Kinematics,
    utils::{enums::RecordKind, vectors::Vec4},
    TesseraResult,
};

/// A handle to a record of any kind.
///
/// Used wherever a relation may point at records of different kinds, such as the
/// constituents of a [`Jet`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectRef {
    /// A generator particle.
    GenParticle(Ref<GenParticle>),
    /// A photon.
    Photon(Ref<Photon>),
    /// An electron.
    Electron(Ref<Electron>),
    /// A muon.
    Muon(Ref<Muon>),
    /// An isolated track.
    IsoTrack(Ref<IsoTrack>),
    /// A jet.
    Jet(Ref<Jet>),
    /// A track.
    Track(Ref<Track>),
    /// A calorimeter tower.
    Tower(Ref<Tower>),
    /// A candidate.
    Candidate(Ref<Candidate>),
}

/// A resolved [`ObjectRef`], borrowing the record from its [`EventStore`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ObjectView<'a> {
    /// A generator particle.
    GenParticle(&'a GenParticle),
    /// A photon.
    Photon(&'a Photon),
    /// An electron.
    Electron(&'a Electron),
    /// A muon.
    Muon(&'a Muon),
    /// An isolated track.
    IsoTrack(&'a IsoTrack),
    /// A jet.
    Jet(&'a Jet),
    /// A track.
    Track(&'a Track),
    /// A calorimeter tower.
    Tower(&'a Tower),
    /// A candidate.
    Candidate(&'a Candidate),
}

macro_rules! impl_object_kinds {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<Ref<$variant>> for ObjectRef {
                fn from(handle: Ref<$variant>) -> Self {
                    ObjectRef::$variant(handle)
                }
            }
        )*

        impl ObjectRef {
            /// The kind of record this handle refers to.
            pub fn kind(&self) -> RecordKind {
                match self {
                    $(ObjectRef::$variant(_) => RecordKind::$variant,)*
                }
            }
        }

        impl ObjectView<'_> {
            /// The kind of the viewed record.
            pub fn kind(&self) -> RecordKind {
                match self {
                    $(ObjectView::$variant(_) => RecordKind::$variant,)*
                }
            }

            fn as_kinematics(&self) -> &dyn Kinematics {
                match self {
                    $(ObjectView::$variant(record) => *record,)*
                }
            }
        }
    };
}

impl_object_kinds!(GenParticle, Photon, Electron, Muon, IsoTrack, Jet, Track, Tower, Candidate);

impl Kinematics for ObjectView<'_> {
    fn p4(&self) -> Vec4 {
        self.as_kinematics().p4()
    }
    fn pt(&self) -> f64 {
        self.as_kinematics().pt()
    }
    fn eta(&self) -> f64 {
        self.as_kinematics().eta()
    }
    fn phi(&self) -> f64 {
        self.as_kinematics().phi()
    }
    fn et(&self) -> f64 {
        self.as_kinematics().et()
    }
    fn energy(&self) -> f64 {
        self.as_kinematics().energy()
    }
}

/// Capacity hints for the arenas of an [`EventStore`].
///
/// Capacity is reserved once, when the store is built, and is kept across events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Expected number of candidates per event.
    pub candidate_capacity: usize,
    /// Expected number of generator particles per event.
    pub particle_capacity: usize,
    /// Expected number of records per event for each reconstructed kind.
    pub object_capacity: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            candidate_capacity: 1024,
            particle_capacity: 1024,
            object_capacity: 64,
        }
    }
}

/// Owns every record, candidate and summary of the event currently being processed.
#[derive(Debug)]
pub struct EventStore {
    options: StoreOptions,
    generation: u64,
    /// The event header.
    pub event: Event,
    /// Generator particles.
    pub particles: Arena<GenParticle>,
    /// Photons.
    pub photons: Arena<Photon>,
    /// Electrons.
    pub electrons: Arena<Electron>,
    /// Muons.
    pub muons: Arena<Muon>,
    /// Isolated tracks.
    pub iso_tracks: Arena<IsoTrack>,
    /// Jets.
    pub jets: Arena<Jet>,
    /// Tracks.
    pub tracks: Arena<Track>,
    /// Calorimeter towers.
    pub towers: Arena<Tower>,
    /// Working candidates.
    pub candidates: Candidates,
    /// Missing transverse energy, if computed.
    pub missing_et: Option<MissingET>,
    /// Scalar sum of transverse momenta, if computed.
    pub scalar_ht: Option<ScalarHT>,
    /// Pile-up density, one entry per pseudorapidity range.
    pub rho: Vec<Rho>,
    /// Event weights.
    pub weights: Vec<Weight>,
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore {
    /// Create a store with the default [`StoreOptions`].
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    /// Create a store, reserving room in each arena according to `options`.
    pub fn with_options(options: StoreOptions) -> Self {
        let objects = options.object_capacity;
        Self {
            options,
            generation: 0,
            event: Event::default(),
            particles: Arena::with_capacity(RecordKind::GenParticle, options.particle_capacity),
            photons: Arena::with_capacity(RecordKind::Photon, objects),
            electrons: Arena::with_capacity(RecordKind::Electron, objects),
            muons: Arena::with_capacity(RecordKind::Muon, objects),
            iso_tracks: Arena::with_capacity(RecordKind::IsoTrack, objects),
            jets: Arena::with_capacity(RecordKind::Jet, objects),
            tracks: Arena::with_capacity(RecordKind::Track, objects),
            towers: Arena::with_capacity(RecordKind::Tower, objects),
            candidates: Arena::with_capacity(RecordKind::Candidate, options.candidate_capacity),
            missing_et: None,
            scalar_ht: None,
            rho: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// The options this store was built with.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// The number of events finished so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Allocate a default candidate, with a fresh identity, scoped to the current event.
    pub fn new_candidate(&mut self) -> Ref<Candidate> {
        self.candidates.insert(Candidate::new())
    }

    /// The total number of live records and candidates in the current event.
    pub fn record_count(&self) -> usize {
        self.particles.len()
            + self.photons.len()
            + self.electrons.len()
            + self.muons.len()
            + self.iso_tracks.len()
            + self.jets.len()
            + self.tracks.len()
            + self.towers.len()
            + self.candidates.len()
    }

    /// Dereference a handle of any kind.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::NotFound`](crate::TesseraError::NotFound) if the handle does not
    /// resolve in this store.
    pub fn resolve(&self, handle: ObjectRef) -> TesseraResult<ObjectView<'_>> {
        Ok(match handle {
            ObjectRef::GenParticle(h) => ObjectView::GenParticle(self.particles.get(h)?),
            ObjectRef::Photon(h) => ObjectView::Photon(self.photons.get(h)?),
            ObjectRef::Electron(h) => ObjectView::Electron(self.electrons.get(h)?),
            ObjectRef::Muon(h) => ObjectView::Muon(self.muons.get(h)?),
            ObjectRef::IsoTrack(h) => ObjectView::IsoTrack(self.iso_tracks.get(h)?),
            ObjectRef::Jet(h) => ObjectView::Jet(self.jets.get(h)?),
            ObjectRef::Track(h) => ObjectView::Track(self.tracks.get(h)?),
            ObjectRef::Tower(h) => ObjectView::Tower(self.towers.get(h)?),
            ObjectRef::Candidate(h) => ObjectView::Candidate(self.candidates.get(h)?),
        })
    }

    /// Dereference every handle of a heterogeneous list, in list order.
    pub fn resolve_all<'a>(
        &'a self,
        handles: &'a [ObjectRef],
    ) -> impl Iterator<Item = TesseraResult<ObjectView<'a>>> + 'a {
        handles.iter().map(move |handle| self.resolve(*handle))
    }

    /// The summed four-momentum of a jet's constituents.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::NotFound`](crate::TesseraError::NotFound) if the jet or any of
    /// its constituents does not resolve.
    pub fn constituent_p4(&self, jet: Ref<Jet>) -> TesseraResult<Vec4> {
        self.resolve_all(&self.jets.get(jet)?.constituents)
            .map(|view| view.map(|view| view.p4()))
            .sum()
    }

    /// Handles to the mothers of a generator particle which are present in this event.
    ///
    /// A mother which was removed resolves to nothing, even if its slot now holds another
    /// particle.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::NotFound`](crate::TesseraError::NotFound) if `particle` does not
    /// resolve.
    pub fn mothers(&self, particle: Ref<GenParticle>) -> TesseraResult<Vec<Ref<GenParticle>>> {
        Ok(self
            .particles
            .get(particle)?
            .mother_indices()
            .into_iter()
            .filter_map(|index| self.particles.handle_at(index))
            .collect())
    }

    /// Handles to the daughters of a generator particle which are present in this event.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::NotFound`](crate::TesseraError::NotFound) if `particle` does not
    /// resolve.
    pub fn daughters(&self, particle: Ref<GenParticle>) -> TesseraResult<Vec<Ref<GenParticle>>> {
        Ok(self
            .particles
            .get(particle)?
            .daughter_indices()
            .into_iter()
            .filter_map(|index| self.particles.handle_at(index))
            .collect())
    }

    /// Release every record of the current event and start the next one.
    ///
    /// Every handle issued before the call fails with
    /// [`TesseraError::NotFound`](crate::TesseraError::NotFound) from then on.
    pub fn finish_event(&mut self) {
        let released = self.record_count();
        self.particles.clear();
        self.photons.clear();
        self.electrons.clear();
        self.muons.clear();
        self.iso_tracks.clear();
        self.jets.clear();
        self.tracks.clear();
        self.towers.clear();
        self.candidates.clear();
        self.event = Event::default();
        self.missing_et = None;
        self.scalar_ht = None;
        self.rho.clear();
        self.weights.clear();
        debug!(generation = self.generation, released, "finished event");
        self.generation += 1;
    }
}
