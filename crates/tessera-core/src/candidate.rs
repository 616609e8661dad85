//! The generic working record of the reconstruction pipeline.
//!
//! A [`Candidate`] carries the union of the fields of every reconstructed object kind, so
//! that isolation, tagging and clustering algorithms can treat all of them uniformly, plus an
//! owned, ordered list of constituent candidates. Candidates live in a [`Candidates`] arena
//! owned by the [`EventStore`](crate::store::EventStore); the constituent list holds handles
//! into that same arena.
//!
//! <div class="warning">
//!
//! The constituent graph must be acyclic. Nothing checks this: a candidate which transitively
//! contains itself makes every depth-first traversal ([`Candidates::overlaps`],
//! [`Candidates::clone_candidate`], [`Candidates::copy_candidate`]) recurse without bound.
//!
//! </div>
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    data::{GenParticle, Versioned},
    refs::{Arena, Ref},
    utils::{process_salt, vectors::Vec4},
    TesseraResult,
};

static NEXT_CANDIDATE_ID: AtomicU64 = AtomicU64::new(1);

/// The identity of the physics object a [`Candidate`] describes.
///
/// Every newly constructed or cleared candidate receives a fresh id. Clones and copies inherit
/// the id of their source, so a candidate and the copies made of it further down the pipeline
/// are recognised as the same object when checking for overlaps. Ids are offset by a random
/// per-process salt, so a candidate decoded from another process never shares an id with one
/// built here.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(u64);

impl CandidateId {
    fn next() -> Self {
        Self(process_salt().wrapping_add(NEXT_CANDIDATE_ID.fetch_add(1, Ordering::Relaxed)))
    }
}

impl Default for CandidateId {
    fn default() -> Self {
        Self::next()
    }
}

/// An arena of [`Candidate`]s, which is where the tree operations live.
pub type Candidates = Arena<Candidate>;

/// A mutable aggregate representing one reconstruction hypothesis.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Candidate {
    /// HEP ID number.
    pub pid: i32,
    /// Generator status code.
    pub status: i32,
    /// First mother index (`-1` if unset).
    pub m1: i32,
    /// Second mother index (`-1` if unset).
    pub m2: i32,
    /// First daughter index (`-1` if unset).
    pub d1: i32,
    /// Last daughter index (`-1` if unset).
    pub d2: i32,
    /// Electric charge.
    pub charge: i32,
    /// Mass.
    pub mass: f64,
    /// Isolation variable.
    pub isolation_var: f64,
    /// Track-based isolation variable.
    pub track_isolation_var: f64,
    /// Whether the candidate comes from a pile-up interaction.
    pub is_pu: bool,
    /// Set by charged-hadron subtraction when the candidate is attributed to pile-up.
    pub is_reco_pu: bool,
    /// Whether the candidate has been used as a constituent of another candidate.
    pub is_constituent: bool,
    /// Whether the candidate is an electron or muon candidate.
    pub is_em_cand: bool,
    /// Heavy-flavour tag bits.
    pub b_tag: u32,
    /// Tau tag bits.
    pub tau_tag: u32,
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
    /// Electromagnetic energy.
    pub eem: f64,
    /// Hadronic energy.
    pub ehad: f64,
    /// Calorimeter cell edges.
    pub edges: [f64; 4],
    /// Radius in pseudorapidity.
    pub delta_eta: f64,
    /// Radius in azimuthal angle.
    pub delta_phi: f64,
    /// Four-momentum.
    pub momentum: Vec4,
    /// Space-time position.
    pub position: Vec4,
    /// Area four-vector.
    pub area: Vec4,
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
    /// Transverse-momentum fraction in $`\Delta R`$ rings of width 0.1.
    pub frac_pt: [f64; 5],
    /// Number of timing measurements.
    pub n_times: i32,
    /// Electromagnetic calorimeter deposits as `(energy, time)` pairs.
    pub ecal_e_t: Vec<(f64, f64)>,
    /// The generated particle this candidate was matched to. Not owned.
    pub particle: Option<Ref<GenParticle>>,
    id: CandidateId,
    candidates: Vec<Ref<Candidate>>,
}

impl Default for Candidate {
    fn default() -> Self {
        Self {
            pid: 0,
            status: 0,
            m1: -1,
            m2: -1,
            d1: -1,
            d2: -1,
            charge: 0,
            mass: 0.0,
            isolation_var: 0.0,
            track_isolation_var: 0.0,
            is_pu: false,
            is_reco_pu: false,
            is_constituent: false,
            is_em_cand: false,
            b_tag: 0,
            tau_tag: 0,
            w_tag: 0,
            top_tag: 0,
            h_tag: 0,
            tau1: 0.0,
            tau2: 0.0,
            tau3: 0.0,
            n_sub_jets: 0,
            mass_drop: 0.0,
            trimmed_mass: 0.0,
            eem: 0.0,
            ehad: 0.0,
            edges: [0.0; 4],
            delta_eta: 0.0,
            delta_phi: 0.0,
            momentum: Vec4::default(),
            position: Vec4::default(),
            area: Vec4::default(),
            beta: 0.0,
            beta_star: 0.0,
            mean_sq_delta_r: 0.0,
            ptd: 0.0,
            n_charged: 0,
            n_neutrals: 0,
            frac_pt: [0.0; 5],
            n_times: 0,
            ecal_e_t: Vec::new(),
            particle: None,
            id: CandidateId::next(),
            candidates: Vec::new(),
        }
    }
}

impl Versioned for Candidate {
    const NAME: &'static str = "Candidate";
    const VERSION: u16 = 1;
}

impl Candidate {
    /// Construct a candidate with default fields and a fresh identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a candidate with the given four-momentum and a fresh identity.
    pub fn with_momentum(momentum: Vec4) -> Self {
        Self {
            momentum,
            ..Default::default()
        }
    }

    /// The identity of the physics object this candidate describes.
    pub fn id(&self) -> CandidateId {
        self.id
    }

    /// Append a constituent. The candidate takes ownership of `sub` within its event.
    ///
    /// No cycle check is performed; see the [module docs](self).
    pub fn add_candidate(&mut self, sub: Ref<Candidate>) {
        self.candidates.push(sub);
    }

    /// The owned constituents, in insertion order.
    pub fn candidates(&self) -> &[Ref<Candidate>] {
        &self.candidates
    }

    /// Release the constituent list and reset every field to its default. The candidate gets a
    /// fresh identity, so it no longer overlaps copies made of it before the call.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// A copy of every field except the constituent list, which is left empty.
    fn detached_copy(&self) -> Self {
        Self {
            pid: self.pid,
            status: self.status,
            m1: self.m1,
            m2: self.m2,
            d1: self.d1,
            d2: self.d2,
            charge: self.charge,
            mass: self.mass,
            isolation_var: self.isolation_var,
            track_isolation_var: self.track_isolation_var,
            is_pu: self.is_pu,
            is_reco_pu: self.is_reco_pu,
            is_constituent: self.is_constituent,
            is_em_cand: self.is_em_cand,
            b_tag: self.b_tag,
            tau_tag: self.tau_tag,
            w_tag: self.w_tag,
            top_tag: self.top_tag,
            h_tag: self.h_tag,
            tau1: self.tau1,
            tau2: self.tau2,
            tau3: self.tau3,
            n_sub_jets: self.n_sub_jets,
            mass_drop: self.mass_drop,
            trimmed_mass: self.trimmed_mass,
            eem: self.eem,
            ehad: self.ehad,
            edges: self.edges,
            delta_eta: self.delta_eta,
            delta_phi: self.delta_phi,
            momentum: self.momentum,
            position: self.position,
            area: self.area,
            beta: self.beta,
            beta_star: self.beta_star,
            mean_sq_delta_r: self.mean_sq_delta_r,
            ptd: self.ptd,
            n_charged: self.n_charged,
            n_neutrals: self.n_neutrals,
            frac_pt: self.frac_pt,
            n_times: self.n_times,
            ecal_e_t: self.ecal_e_t.clone(),
            particle: self.particle,
            id: self.id,
            candidates: Vec::new(),
        }
    }

    #[cfg(test)]
    fn same_fields(&self, other: &Candidate) -> bool {
        self.detached_copy() == other.detached_copy()
    }

    fn collect_closure(&self, arena: &Candidates, ids: &mut IndexSet<CandidateId>) {
        ids.insert(self.id);
        for sub in self.constituents(arena) {
            sub.collect_closure(arena, ids);
        }
    }

    fn closure_intersects(&self, arena: &Candidates, ids: &IndexSet<CandidateId>) -> bool {
        ids.contains(&self.id)
            || self
                .constituents(arena)
                .any(|sub| sub.closure_intersects(arena, ids))
    }

    /// Iterate over the constituents which still resolve in `arena`.
    pub fn constituents<'a>(&'a self, arena: &'a Candidates) -> impl Iterator<Item = &'a Candidate> {
        self.candidates
            .iter()
            .filter_map(move |sub| arena.get(*sub).ok())
    }

    /// Returns `true` if this candidate and `other` share a member of their constituent
    /// closures, each closure including the candidate itself.
    ///
    /// Members are compared by [`CandidateId`], never by value. Constituent handles which no
    /// longer resolve in `arena` are skipped.
    pub fn overlaps(&self, other: &Candidate, arena: &Candidates) -> bool {
        let mut ids = IndexSet::new();
        self.collect_closure(arena, &mut ids);
        other.closure_intersects(arena, &ids)
    }

    /// The sum of the four-momenta of the direct constituents.
    pub fn constituent_momentum(&self, arena: &Candidates) -> Vec4 {
        self.constituents(arena).map(|sub| sub.momentum).sum()
    }
}

impl Arena<Candidate> {
    /// Returns `true` if the candidates behind `a` and `b` overlap; see [`Candidate::overlaps`].
    /// A handle which does not resolve overlaps nothing.
    pub fn overlaps(&self, a: Ref<Candidate>, b: Ref<Candidate>) -> bool {
        match (self.get(a), self.get(b)) {
            (Ok(a), Ok(b)) => a.overlaps(b, self),
            _ => false,
        }
    }

    fn deep_copy(&mut self, source: Ref<Candidate>) -> TesseraResult<Candidate> {
        let (mut copy, subs) = {
            let candidate = self.get(source)?;
            (candidate.detached_copy(), candidate.candidates.clone())
        };
        for sub in subs {
            if !self.contains(sub) {
                trace!(?sub, "skipping released constituent");
                continue;
            }
            let cloned = self.clone_candidate(sub)?;
            copy.candidates.push(cloned);
        }
        Ok(copy)
    }

    /// Allocate an independent copy of `source`: every field is copied, and every owned
    /// constituent is recursively cloned so that the copy shares no constituent handle with
    /// its source. Weak fields such as [`Candidate::particle`] are copied as-is.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::NotFound`](crate::TesseraError::NotFound) if `source` does not
    /// resolve.
    pub fn clone_candidate(&mut self, source: Ref<Candidate>) -> TesseraResult<Ref<Candidate>> {
        let copy = self.deep_copy(source)?;
        Ok(self.insert(copy))
    }

    /// Overwrite the candidate behind `target` with a deep copy of `source`, with the same
    /// semantics as [`Candidates::clone_candidate`].
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::NotFound`](crate::TesseraError::NotFound) if either handle does
    /// not resolve.
    pub fn copy_candidate(
        &mut self,
        source: Ref<Candidate>,
        target: Ref<Candidate>,
    ) -> TesseraResult<()> {
        self.get(target)?;
        let copy = self.deep_copy(source)?;
        *self.get_mut(target)? = copy;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::enums::RecordKind;

    fn leaf(arena: &mut Candidates, pt: f64) -> Ref<Candidate> {
        arena.insert(Candidate::with_momentum(Vec4::from_pt_eta_phi_m(
            pt, 0.0, 0.0, 0.0,
        )))
    }

    fn composite(arena: &mut Candidates, pt: f64, subs: &[Ref<Candidate>]) -> Ref<Candidate> {
        let mut candidate = Candidate::with_momentum(Vec4::from_pt_eta_phi_m(pt, 0.0, 0.0, 0.0));
        for sub in subs {
            candidate.add_candidate(*sub);
        }
        arena.insert(candidate)
    }

    #[test]
    fn test_add_and_get_candidates() {
        let mut arena = Candidates::new(RecordKind::Candidate);
        let x = leaf(&mut arena, 1.0);
        let y = leaf(&mut arena, 2.0);
        let mut parent = Candidate::new();
        parent.add_candidate(x);
        parent.add_candidate(y);
        assert_eq!(parent.candidates(), &[x, y]);
        parent.clear();
        assert!(parent.candidates().is_empty());
        // constituents are still alive in the arena
        assert!(arena.contains(x) && arena.contains(y));
    }

    #[test]
    fn test_clear_resets_fields_and_identity() {
        let mut candidate = Candidate::with_momentum(Vec4::new(1.0, 2.0, 3.0, 4.0));
        candidate.charge = -1;
        candidate.b_tag = 1;
        candidate.m1 = 4;
        candidate.ecal_e_t.push((1.0, 0.5));
        let id = candidate.id();
        candidate.clear();
        assert_ne!(candidate.id(), id);
        assert_eq!(candidate.momentum, Vec4::default());
        assert_eq!(candidate.charge, 0);
        assert_eq!(candidate.b_tag, 0);
        assert_eq!(candidate.m1, -1);
        assert!(candidate.ecal_e_t.is_empty());
    }

    #[test]
    fn test_cleared_candidate_does_not_overlap_earlier_clones() {
        let mut arena = Candidates::new(RecordKind::Candidate);
        let t1 = leaf(&mut arena, 5.0);
        let c = composite(&mut arena, 5.0, &[t1]);
        let old_clone = arena.clone_candidate(c).unwrap();
        assert!(arena.overlaps(c, old_clone));
        let t2 = leaf(&mut arena, 7.0);
        let reused = arena.get_mut(c).unwrap();
        reused.clear();
        reused.add_candidate(t2);
        assert!(!arena.overlaps(c, old_clone));
        assert!(!arena.overlaps(old_clone, c));
    }

    #[test]
    fn test_decoded_candidate_from_another_process_does_not_overlap() {
        let mut arena = Candidates::new(RecordKind::Candidate);
        let unrelated = leaf(&mut arena, 9.0);
        let mut decoded = Candidate::new();
        // an id drawn at the same counter value by a process with a different salt
        let counter = arena.get(unrelated).unwrap().id().0.wrapping_sub(process_salt());
        decoded.id = CandidateId(counter);
        let mut foreign_arena = Candidates::new(RecordKind::Candidate);
        let foreign_sub = foreign_arena.insert(Candidate::new());
        decoded.add_candidate(foreign_sub);
        let decoded = arena.insert(decoded);
        assert!(arena.get(decoded).unwrap().constituents(&arena).next().is_none());
        assert!(!arena.overlaps(decoded, unrelated));
    }

    #[test]
    fn test_overlap_scenario() {
        let mut arena = Candidates::new(RecordKind::Candidate);
        let t1 = leaf(&mut arena, 20.0);
        let t2 = leaf(&mut arena, 10.0);
        let c1 = composite(&mut arena, 50.0, &[t1]);
        let c2 = composite(&mut arena, 30.0, &[t1, t2]);
        let c3 = composite(&mut arena, 10.0, &[t2]);
        assert!(arena.overlaps(c1, c2));
        assert!(arena.overlaps(c2, c1));
        assert!(!arena.overlaps(c1, c3));
        assert!(!arena.overlaps(c3, c1));
        assert!(arena.overlaps(c2, c3));
        assert!(arena.overlaps(c1, c1));
        assert!(arena.overlaps(t1, c1));
    }

    #[test]
    fn test_overlap_is_by_identity_not_value() {
        let mut arena = Candidates::new(RecordKind::Candidate);
        let a = leaf(&mut arena, 10.0);
        let b = leaf(&mut arena, 10.0);
        assert_eq!(arena.get(a).unwrap().momentum, arena.get(b).unwrap().momentum);
        assert!(!arena.get(a).unwrap().same_fields(arena.get(b).unwrap()));
        assert_ne!(arena.get(a).unwrap().id(), arena.get(b).unwrap().id());
        assert!(!arena.overlaps(a, b));
    }

    #[test]
    fn test_overlap_through_nested_constituents() {
        let mut arena = Candidates::new(RecordKind::Candidate);
        let t = leaf(&mut arena, 5.0);
        let inner = composite(&mut arena, 5.0, &[t]);
        let outer = composite(&mut arena, 5.0, &[inner]);
        let other = composite(&mut arena, 7.0, &[t]);
        assert!(arena.overlaps(outer, other));
        assert!(arena.overlaps(other, outer));
    }

    #[test]
    fn test_overlap_is_symmetric_on_random_forests() {
        let mut rng = fastrand::Rng::with_seed(42);
        let mut arena = Candidates::new(RecordKind::Candidate);
        let leaves: Vec<_> = (0..12).map(|i| leaf(&mut arena, i as f64)).collect();
        let mut nodes = leaves.clone();
        for _ in 0..30 {
            let n_subs = rng.usize(0..4);
            let subs: Vec<_> = (0..n_subs)
                .map(|_| nodes[rng.usize(0..nodes.len())])
                .collect();
            let node = composite(&mut arena, rng.f64(), &subs);
            nodes.push(node);
        }
        for &a in &nodes {
            for &b in &nodes {
                assert_eq!(arena.overlaps(a, b), arena.overlaps(b, a));
            }
        }
    }

    #[test]
    fn test_clone_is_deep() {
        let mut arena = Candidates::new(RecordKind::Candidate);
        let t1 = leaf(&mut arena, 20.0);
        let t2 = leaf(&mut arena, 10.0);
        let inner = composite(&mut arena, 30.0, &[t1, t2]);
        let source = composite(&mut arena, 30.0, &[inner]);
        arena.get_mut(source).unwrap().charge = 1;

        let clone = arena.clone_candidate(source).unwrap();
        let (original, copy) = (arena.get(source).unwrap(), arena.get(clone).unwrap());
        assert_ne!(source, clone);
        assert!(copy.same_fields(original));
        assert_eq!(copy.candidates().len(), original.candidates().len());
        assert_ne!(copy.candidates()[0], original.candidates()[0]);

        let copied_inner = arena.get(copy.candidates()[0]).unwrap();
        let original_inner = arena.get(inner).unwrap();
        assert_eq!(copied_inner.candidates().len(), 2);
        for (a, b) in copied_inner
            .candidates()
            .iter()
            .zip(original_inner.candidates())
        {
            assert_ne!(a, b);
        }
        assert_eq!(arena.len(), 8);
    }

    #[test]
    fn test_clone_is_independent_of_source() {
        let mut arena = Candidates::new(RecordKind::Candidate);
        let t1 = leaf(&mut arena, 20.0);
        let source = composite(&mut arena, 20.0, &[t1]);
        let clone = arena.clone_candidate(source).unwrap();
        arena.get_mut(source).unwrap().clear();
        arena.get_mut(t1).unwrap().charge = 5;
        let copy = arena.get(clone).unwrap();
        assert_eq!(copy.candidates().len(), 1);
        assert_eq!(arena.get(copy.candidates()[0]).unwrap().charge, 0);
        assert_eq!(copy.momentum.pt(), 20.0);
    }

    #[test]
    fn test_clone_keeps_weak_references_and_identity() {
        let mut particles = Arena::new(RecordKind::GenParticle);
        let truth = particles.insert(GenParticle::default());
        let mut arena = Candidates::new(RecordKind::Candidate);
        let mut candidate = Candidate::new();
        candidate.particle = Some(truth);
        let source = arena.insert(candidate);
        let clone = arena.clone_candidate(source).unwrap();
        let copy = arena.get(clone).unwrap();
        assert_eq!(copy.particle, Some(truth));
        assert_eq!(copy.id(), arena.get(source).unwrap().id());
        assert!(arena.overlaps(source, clone));
        assert_eq!(particles.len(), 1);
    }

    #[test]
    fn test_clone_skips_released_constituents() {
        let mut arena = Candidates::new(RecordKind::Candidate);
        let t1 = leaf(&mut arena, 1.0);
        let t2 = leaf(&mut arena, 2.0);
        let source = composite(&mut arena, 3.0, &[t1, t2]);
        arena.remove(t1).unwrap();
        let clone = arena.clone_candidate(source).unwrap();
        assert_eq!(arena.get(clone).unwrap().candidates().len(), 1);
        assert!(arena.overlaps(source, t2));
        assert!(!arena.overlaps(source, t1));
    }

    #[test]
    fn test_copy_candidate_overwrites_target() {
        let mut arena = Candidates::new(RecordKind::Candidate);
        let t1 = leaf(&mut arena, 1.0);
        let source = composite(&mut arena, 3.0, &[t1]);
        let target = leaf(&mut arena, 9.0);
        arena.copy_candidate(source, target).unwrap();
        let (original, copy) = (arena.get(source).unwrap(), arena.get(target).unwrap());
        assert!(copy.same_fields(original));
        assert_eq!(copy.candidates().len(), 1);
        assert_ne!(copy.candidates()[0], t1);
    }

    #[test]
    fn test_stale_handles() {
        let mut arena = Candidates::new(RecordKind::Candidate);
        let a = leaf(&mut arena, 1.0);
        let b = leaf(&mut arena, 1.0);
        arena.remove(a).unwrap();
        assert!(!arena.overlaps(a, b));
        assert!(arena.clone_candidate(a).is_err());
        assert!(arena.copy_candidate(b, a).is_err());
    }

    #[test]
    fn test_constituent_momentum() {
        let mut arena = Candidates::new(RecordKind::Candidate);
        let a = arena.insert(Candidate::with_momentum(Vec4::new(1.0, 0.0, 0.0, 1.0)));
        let b = arena.insert(Candidate::with_momentum(Vec4::new(0.0, 1.0, 0.0, 1.0)));
        let parent = composite(&mut arena, 0.0, &[a, b]);
        let sum = arena.get(parent).unwrap().constituent_momentum(&arena);
        assert_eq!(sum, Vec4::new(1.0, 1.0, 0.0, 2.0));
    }
}
