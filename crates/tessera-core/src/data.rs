use serde::{Deserialize, Serialize};

use crate::{
    refs::{Ref, RefList},
    store::ObjectRef,
    utils::{enums::EventFormat, vectors::Vec4},
};

/// Persistence helpers for versioned records.
pub mod io;

/// A record with a stable, named field layout.
///
/// The version is bumped whenever the layout changes and is never reused for an incompatible
/// layout. Fields missing from an older layout read back as their [`Default`] value (zero,
/// `false`, an empty list, or `-1` for "no relation" indices).
pub trait Versioned {
    /// The persisted name of the record type.
    const NAME: &'static str;
    /// The current layout version.
    const VERSION: u16;
}

macro_rules! impl_versioned {
    ($($ty:ty => ($name:literal, $version:literal)),* $(,)?) => {
        $(
            impl Versioned for $ty {
                const NAME: &'static str = $name;
                const VERSION: u16 = $version;
            }
        )*
    };
}

impl_versioned!(
    EventInfo => ("Event", 1),
    LhcoInfo => ("LHCOEvent", 1),
    LhefInfo => ("LHEFEvent", 2),
    HepMcInfo => ("HepMCEvent", 2),
    GenParticle => ("GenParticle", 1),
    MissingET => ("MissingET", 1),
    ScalarHT => ("ScalarHT", 1),
    Rho => ("Rho", 1),
    Weight => ("Weight", 1),
    Photon => ("Photon", 3),
    Electron => ("Electron", 3),
    Muon => ("Muon", 2),
    IsoTrack => ("IsoTrack", 3),
    Jet => ("Jet", 4),
    Track => ("Track", 2),
    Tower => ("Tower", 2),
);

impl<T: Versioned> Versioned for Vec<T> {
    const NAME: &'static str = T::NAME;
    const VERSION: u16 = T::VERSION;
}

/// Convert a stored mother/daughter index into a slot index, mapping negative sentinels to
/// [`None`].
pub(crate) fn relation(index: i32) -> Option<u32> {
    u32::try_from(index).ok()
}

/// Metadata common to every event, regardless of input format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventInfo {
    /// The event number.
    pub number: i64,
    /// Time spent reading the event, in seconds.
    pub read_time: f64,
    /// Time spent processing the event, in seconds.
    pub proc_time: f64,
}

/// Header fields specific to LHC Olympics input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LhcoInfo {
    /// The trigger word.
    pub trigger: i32,
}

/// Header fields specific to Les Houches Event File input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LhefInfo {
    /// Subprocess code for the event (`IDPRUP`).
    pub process_id: i32,
    /// Event weight (`XWGTUP`).
    pub weight: f64,
    /// Scale in GeV used in the calculation of the PDFs (`SCALUP`).
    pub scale_pdf: f64,
    /// Value of the QED coupling (`AQEDUP`).
    pub alpha_qed: f64,
    /// Value of the QCD coupling (`AQCDUP`).
    pub alpha_qcd: f64,
}

/// Header fields specific to HepMC input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HepMcInfo {
    /// Unique signal process id.
    pub process_id: i32,
    /// Number of multi-parton interactions.
    pub mpi: i32,
    /// Event weight.
    pub weight: f64,
    /// Energy scale.
    pub scale: f64,
    /// QED coupling.
    pub alpha_qed: f64,
    /// QCD coupling.
    pub alpha_qcd: f64,
    /// Flavour code of the first parton.
    pub id1: i32,
    /// Flavour code of the second parton.
    pub id2: i32,
    /// Fraction of beam momentum carried by the first parton ("beam side").
    pub x1: f64,
    /// Fraction of beam momentum carried by the second parton ("target side").
    pub x2: f64,
    /// Q-scale used in evaluation of the PDFs, in GeV.
    pub scale_pdf: f64,
    /// PDF value for (`id1`, `x1`, Q).
    pub pdf1: f64,
    /// PDF value for (`id2`, `x2`, Q).
    pub pdf2: f64,
}

/// The format-specific part of an [`Event`] header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum EventDetails {
    /// No format-specific information.
    #[default]
    Plain,
    /// LHC Olympics input.
    Lhco(LhcoInfo),
    /// Les Houches Event File input.
    Lhef(LhefInfo),
    /// HepMC input.
    HepMc(HepMcInfo),
}

/// Per-event metadata: the shared [`EventInfo`] plus the format-specific [`EventDetails`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    /// Fields common to every input format.
    pub info: EventInfo,
    /// Fields specific to the input format.
    pub details: EventDetails,
}

impl Event {
    /// The input format this header describes.
    pub fn format(&self) -> EventFormat {
        match self.details {
            EventDetails::Plain => EventFormat::Plain,
            EventDetails::Lhco(_) => EventFormat::Lhco,
            EventDetails::Lhef(_) => EventFormat::Lhef,
            EventDetails::HepMc(_) => EventFormat::HepMc,
        }
    }

    /// The generator weight, for formats which carry one.
    pub fn weight(&self) -> Option<f64> {
        match &self.details {
            EventDetails::Lhef(info) => Some(info.weight),
            EventDetails::HepMc(info) => Some(info.weight),
            EventDetails::Plain | EventDetails::Lhco(_) => None,
        }
    }

    /// The persisted name and layout version of this header's variant.
    pub fn layout(&self) -> (&'static str, u16) {
        match self.details {
            EventDetails::Plain => (EventInfo::NAME, EventInfo::VERSION),
            EventDetails::Lhco(_) => (LhcoInfo::NAME, LhcoInfo::VERSION),
            EventDetails::Lhef(_) => (LhefInfo::NAME, LhefInfo::VERSION),
            EventDetails::HepMc(_) => (HepMcInfo::NAME, HepMcInfo::VERSION),
        }
    }
}

/// A truth-level generator particle.
///
/// Mother and daughter fields are insertion positions in the same event's particle store (see
/// [`Arena::handle_at`](crate::refs::Arena::handle_at)), with `-1` meaning "no relation". Following the HEPEVT convention, `d1..=d2` is the range of
/// daughters. Kinematics are stored as $`(E, p_x, p_y, p_z)`$; transverse momentum,
/// pseudorapidity, azimuth and rapidity are derived from them on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenParticle {
    /// HEP ID number.
    pub pid: i32,
    /// Generator status code.
    pub status: i32,
    /// Whether the particle comes from a pile-up interaction.
    pub is_pu: bool,
    /// First mother.
    pub m1: i32,
    /// Second mother.
    pub m2: i32,
    /// First daughter.
    pub d1: i32,
    /// Last daughter.
    pub d2: i32,
    /// Electric charge.
    pub charge: i32,
    /// Generated mass.
    pub mass: f64,
    /// Energy.
    pub e: f64,
    /// Momentum, x-component.
    pub px: f64,
    /// Momentum, y-component.
    pub py: f64,
    /// Momentum, z-component.
    pub pz: f64,
    /// Production vertex, time component.
    pub t: f64,
    /// Production vertex, x-component.
    pub x: f64,
    /// Production vertex, y-component.
    pub y: f64,
    /// Production vertex, z-component.
    pub z: f64,
}

impl Default for GenParticle {
    fn default() -> Self {
        Self {
            pid: 0,
            status: 0,
            is_pu: false,
            m1: -1,
            m2: -1,
            d1: -1,
            d2: -1,
            charge: 0,
            mass: 0.0,
            e: 0.0,
            px: 0.0,
            py: 0.0,
            pz: 0.0,
            t: 0.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

impl GenParticle {
    /// The four-momentum $`(p_x, p_y, p_z, E)`$.
    pub fn p4(&self) -> Vec4 {
        Vec4::new(self.px, self.py, self.pz, self.e)
    }
    /// The transverse momentum.
    pub fn pt(&self) -> f64 {
        self.p4().pt()
    }
    /// The pseudorapidity.
    pub fn eta(&self) -> f64 {
        self.p4().eta()
    }
    /// The azimuthal angle.
    pub fn phi(&self) -> f64 {
        self.p4().phi()
    }
    /// The rapidity.
    pub fn rapidity(&self) -> f64 {
        self.p4().rapidity()
    }
    /// The production vertex $`(x, y, z, t)`$.
    pub fn vertex(&self) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, self.t)
    }
    /// Positions of the mothers which are set.
    pub fn mother_indices(&self) -> Vec<u32> {
        [self.m1, self.m2].into_iter().filter_map(relation).collect()
    }
    /// Positions of the daughters, `d1..=d2`. If only `d1` is set, it is the only daughter.
    pub fn daughter_indices(&self) -> Vec<u32> {
        match (relation(self.d1), relation(self.d2)) {
            (Some(first), Some(last)) if last >= first => (first..=last).collect(),
            (Some(first), _) => vec![first],
            (None, _) => Vec::new(),
        }
    }
}

/// Missing transverse energy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissingET {
    /// Missing transverse energy.
    pub met: f64,
    /// Azimuthal angle of the missing energy.
    pub phi: f64,
}

impl MissingET {
    /// The missing momentum as a massless, purely transverse four-vector.
    pub fn p4(&self) -> Vec4 {
        Vec4::from_pt_eta_phi_m(self.met, 0.0, self.phi, 0.0)
    }
}

/// Scalar sum of transverse momenta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalarHT {
    /// Scalar sum of transverse momenta.
    pub ht: f64,
}

/// Energy density of the event in a pseudorapidity range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rho {
    /// Energy density.
    pub rho: f64,
    /// Pseudorapidity range edges.
    pub edges: [f64; 2],
}

/// The weight given to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weight {
    /// The weight value.
    pub weight: f64,
}

/// A reconstructed photon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Photon {
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Ratio of hadronic to electromagnetic energy deposited in the calorimeter.
    pub e_had_over_e_em: f64,
    /// Isolation variable.
    pub isolation_var: f64,
    /// Time at the calorimeter face.
    pub t_outer: f64,
    /// Generated particles this photon was built from.
    pub particles: RefList<GenParticle>,
}

impl Photon {
    /// The (massless) four-momentum.
    pub fn p4(&self) -> Vec4 {
        Vec4::from_pt_eta_phi_m(self.pt, self.eta, self.phi, 0.0)
    }
}

/// A reconstructed electron.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Electron {
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Electric charge.
    pub charge: i32,
    /// Ratio of hadronic to electromagnetic energy deposited in the calorimeter.
    pub e_had_over_e_em: f64,
    /// Sum of charged-hadron, neutral-hadron and photon transverse energy in the isolation cone.
    pub isolation_var: f64,
    /// Time at the calorimeter face.
    pub t_outer: f64,
    /// The generated particle this electron was matched to.
    pub particle: Option<Ref<GenParticle>>,
}

impl Electron {
    /// The (massless) four-momentum.
    pub fn p4(&self) -> Vec4 {
        Vec4::from_pt_eta_phi_m(self.pt, self.eta, self.phi, 0.0)
    }
}

/// A reconstructed muon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Muon {
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Electric charge.
    pub charge: i32,
    /// Isolation variable.
    pub isolation_var: f64,
    /// The generated particle this muon was matched to.
    pub particle: Option<Ref<GenParticle>>,
}

impl Muon {
    /// The (massless) four-momentum.
    pub fn p4(&self) -> Vec4 {
        Vec4::from_pt_eta_phi_m(self.pt, self.eta, self.phi, 0.0)
    }
}

/// An isolated track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsoTrack {
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Electric charge.
    pub charge: i32,
    /// Isolation variable.
    pub isolation_var: f64,
    /// Whether the track is an electron or muon candidate.
    pub is_em_cand: bool,
    /// The generated particle this track was matched to.
    pub particle: Option<Ref<GenParticle>>,
}

impl IsoTrack {
    /// The (massless) four-momentum.
    pub fn p4(&self) -> Vec4 {
        Vec4::from_pt_eta_phi_m(self.pt, self.eta, self.phi, 0.0)
    }
}

/// A reconstructed jet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Jet {
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Invariant mass.
    pub mass: f64,
    /// Jet radius in pseudorapidity.
    pub delta_eta: f64,
    /// Jet radius in azimuthal angle.
    pub delta_phi: f64,
    /// W-boson tag.
    pub w_tag: u32,
    /// Top-quark tag.
    pub top_tag: u32,
    /// Higgs-boson tag.
    pub h_tag: u32,
    /// 1-subjettiness.
    pub tau1: f64,
    /// 2-subjettiness.
    pub tau2: f64,
    /// 3-subjettiness.
    pub tau3: f64,
    /// Number of subjets.
    pub n_sub_jets: u32,
    /// Mass-drop of the leading subjet.
    pub mass_drop: f64,
    /// Trimmed mass.
    pub trimmed_mass: f64,
    /// Fraction of charged transverse momentum from the primary vertex.
    pub beta: f64,
    /// Fraction of charged transverse momentum from pile-up vertices.
    pub beta_star: f64,
    /// $`p_T^2`$-weighted mean squared $`\Delta R`$ of the constituents.
    pub mean_sq_delta_r: f64,
    /// Transverse-momentum dispersion of the constituents.
    pub ptd: f64,
    /// Number of charged constituents.
    pub n_charged: i32,
    /// Number of neutral constituents.
    pub n_neutrals: i32,
    /// Transverse-momentum fraction in $`\Delta R`$ rings `[0, 0.1)`, `[0.1, 0.2)`, ... `[0.4, 0.5)`.
    pub frac_pt: [f64; 5],
    /// The jet-area four-vector.
    pub area: Vec4,
    /// Heavy-flavour tag bits.
    pub b_tag: u32,
    /// Tau tag bits.
    pub tau_tag: u32,
    /// Electric charge (for tau jets).
    pub charge: i32,
    /// Ratio of hadronic to electromagnetic energy deposited in the calorimeter.
    pub e_had_over_e_em: f64,
    /// The reconstructed objects the jet was clustered from, in clustering order.
    pub constituents: Vec<ObjectRef>,
    /// Generated particles matched to the jet.
    pub particles: RefList<GenParticle>,
}

impl Jet {
    /// The four-momentum built from $`(p_T, \eta, \phi, m)`$.
    pub fn p4(&self) -> Vec4 {
        Vec4::from_pt_eta_phi_m(self.pt, self.eta, self.phi, self.mass)
    }
    /// The jet-area four-vector.
    pub fn area_p4(&self) -> Vec4 {
        self.area
    }
}

/// A reconstructed charged-particle track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    /// HEP ID number.
    pub pid: i32,
    /// Electric charge.
    pub charge: i32,
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Pseudorapidity at the tracker edge.
    pub eta_outer: f64,
    /// Azimuthal angle at the tracker edge.
    pub phi_outer: f64,
    /// Vertex position, x-component.
    pub x: f64,
    /// Vertex position, y-component.
    pub y: f64,
    /// Vertex position, z-component.
    pub z: f64,
    /// Vertex time.
    pub t: f64,
    /// Position at the tracker edge, x-component.
    pub x_outer: f64,
    /// Position at the tracker edge, y-component.
    pub y_outer: f64,
    /// Position at the tracker edge, z-component.
    pub z_outer: f64,
    /// Time at the tracker edge.
    pub t_outer: f64,
    /// Set by charged-hadron subtraction when the track is attributed to pile-up.
    pub is_reco_pu: bool,
    /// Whether the track comes from a pile-up interaction.
    pub is_pu: bool,
    /// The generated particle this track was matched to.
    pub particle: Option<Ref<GenParticle>>,
}

impl Track {
    /// The (massless) four-momentum.
    pub fn p4(&self) -> Vec4 {
        Vec4::from_pt_eta_phi_m(self.pt, self.eta, self.phi, 0.0)
    }
    /// The vertex position $`(x, y, z, t)`$.
    pub fn vertex(&self) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, self.t)
    }
    /// The position at the tracker edge $`(x, y, z, t)`$.
    pub fn outer_position(&self) -> Vec4 {
        Vec4::new(self.x_outer, self.y_outer, self.z_outer, self.t_outer)
    }
}

/// A calorimeter tower.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tower {
    /// Transverse energy.
    pub et: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Energy.
    pub e: f64,
    /// Electromagnetic energy.
    pub eem: f64,
    /// Hadronic energy.
    pub ehad: f64,
    /// Tower edges: $`\eta_{min}, \eta_{max}, \phi_{min}, \phi_{max}`$.
    pub edges: [f64; 4],
    /// Electromagnetic deposit time, averaged over all particles.
    pub t_outer: f64,
    /// Number of timing measurements.
    pub n_times: i32,
    /// Generated particles which deposited energy in the tower.
    pub particles: RefList<GenParticle>,
}

impl Tower {
    /// The four-momentum built from $`(E_T, \eta, \phi, E)`$.
    pub fn p4(&self) -> Vec4 {
        Vec4::from_pt_eta_phi_e(self.et, self.eta, self.phi, self.e)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_gen_particle_derived_kinematics() {
        let particle = GenParticle {
            e: 5.0,
            px: 3.0,
            py: 0.0,
            pz: 4.0,
            ..Default::default()
        };
        let p4 = particle.p4();
        assert_eq!(p4, Vec4::new(3.0, 0.0, 4.0, 5.0));
        assert_relative_eq!(particle.pt(), 3.0);
        assert_relative_eq!(particle.eta(), (4.0_f64 / 3.0).asinh());
        assert_relative_eq!(particle.phi(), 0.0);
        assert_relative_eq!(p4.m(), 0.0);
        // repeated conversions are bitwise identical
        assert_eq!(particle.p4(), particle.p4());
    }

    #[test]
    fn test_gen_particle_relations() {
        let orphan = GenParticle::default();
        assert!(orphan.mother_indices().is_empty());
        assert!(orphan.daughter_indices().is_empty());
        let particle = GenParticle {
            m1: 0,
            m2: -1,
            d1: 3,
            d2: 5,
            ..Default::default()
        };
        assert_eq!(particle.mother_indices(), vec![0]);
        assert_eq!(particle.daughter_indices(), vec![3, 4, 5]);
        let single = GenParticle {
            d1: 7,
            ..Default::default()
        };
        assert_eq!(single.daughter_indices(), vec![7]);
    }

    #[test]
    fn test_reconstructed_p4() {
        let jet = Jet {
            pt: 50.0,
            eta: 0.0,
            phi: 0.0,
            mass: 10.0,
            area: Vec4::new(0.1, 0.2, 0.3, 0.5),
            ..Default::default()
        };
        let p4 = jet.p4();
        assert_relative_eq!(p4.px(), 50.0);
        assert_relative_eq!(p4.m(), 10.0, epsilon = 1e-9);
        assert_eq!(jet.area_p4(), Vec4::new(0.1, 0.2, 0.3, 0.5));

        let tower = Tower {
            et: 20.0,
            eta: 1.0,
            phi: 0.5,
            e: 20.0 * 1.0_f64.cosh(),
            ..Default::default()
        };
        assert_relative_eq!(tower.p4().pt(), 20.0, epsilon = 1e-9);
        assert_relative_eq!(tower.p4().m(), 0.0, epsilon = 1e-4);

        let track = Track {
            pt: 12.0,
            eta: -0.7,
            phi: 2.0,
            ..Default::default()
        };
        assert_relative_eq!(track.p4().eta(), -0.7, epsilon = 1e-12);
        assert_relative_eq!(track.p4().phi(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_et_is_transverse() {
        let met = MissingET {
            met: 30.0,
            phi: -1.0,
        };
        assert_relative_eq!(met.p4().pt(), 30.0, epsilon = 1e-12);
        assert_relative_eq!(met.p4().pz(), 0.0);
    }

    #[test]
    fn test_event_header_variants() {
        let plain = Event::default();
        assert_eq!(plain.format(), EventFormat::Plain);
        assert_eq!(plain.weight(), None);
        assert_eq!(plain.layout(), ("Event", 1));
        let hepmc = Event {
            info: EventInfo {
                number: 12,
                ..Default::default()
            },
            details: EventDetails::HepMc(HepMcInfo {
                weight: 0.25,
                ..Default::default()
            }),
        };
        assert_eq!(hepmc.format(), EventFormat::HepMc);
        assert_eq!(hepmc.weight(), Some(0.25));
        assert_eq!(hepmc.layout(), ("HepMCEvent", 2));
    }

    #[test]
    fn test_layout_versions() {
        assert_eq!(Jet::VERSION, 4);
        assert_eq!(Photon::VERSION, 3);
        assert_eq!(<Vec<Track>>::NAME, "Track");
        assert_eq!(<Vec<Track>>::VERSION, 2);
    }
}
