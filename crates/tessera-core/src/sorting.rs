use std::{cmp::Ordering, fmt::Debug, sync::OnceLock};

use indexmap::IndexMap;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::debug;

use crate::{
    candidate::Candidate,
    data::{Electron, GenParticle, IsoTrack, Jet, Muon, Photon, Tower, Track},
    refs::{Arena, Ref},
    utils::{delta_phi, enums::RecordKind, vectors::Vec4},
};
#[cfg(feature = "rayon")]
use crate::TesseraResult;

/// The kinematic quantities an ordering may inspect.
///
/// Only [`Kinematics::p4`] is required. Records which store their transverse momentum and
/// direction directly override the angular accessors so that orderings see the stored values
/// rather than values recomputed from the four-momentum.
pub trait Kinematics {
    /// The four-momentum, computed from the stored source fields.
    fn p4(&self) -> Vec4;
    /// Transverse momentum.
    fn pt(&self) -> f64 {
        self.p4().pt()
    }
    /// Pseudorapidity.
    fn eta(&self) -> f64 {
        self.p4().eta()
    }
    /// Azimuthal angle.
    fn phi(&self) -> f64 {
        self.p4().phi()
    }
    /// Transverse energy. Equal to [`Kinematics::pt`] unless the record measures it directly.
    fn et(&self) -> f64 {
        self.pt()
    }
    /// Energy.
    fn energy(&self) -> f64 {
        self.p4().e()
    }
}

/// A record kind with exactly one installed total ordering.
pub trait Sortable: Kinematics + Sized {
    /// The kind under which the ordering is registered.
    const KIND: RecordKind;
    /// The installed ordering for this kind.
    fn comparator() -> Comparator {
        comparator_for(Self::KIND)
    }
}

macro_rules! impl_stored_kinematics {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Kinematics for $ty {
                fn p4(&self) -> Vec4 {
                    $ty::p4(self)
                }
                fn pt(&self) -> f64 {
                    self.pt
                }
                fn eta(&self) -> f64 {
                    self.eta
                }
                fn phi(&self) -> f64 {
                    self.phi
                }
            }
            impl Sortable for $ty {
                const KIND: RecordKind = RecordKind::$ty;
            }
        )*
    };
}

impl_stored_kinematics!(Photon, Electron, Muon, IsoTrack, Jet, Track);

impl Kinematics for GenParticle {
    fn p4(&self) -> Vec4 {
        GenParticle::p4(self)
    }
}
impl Sortable for GenParticle {
    const KIND: RecordKind = RecordKind::GenParticle;
}

impl Kinematics for Tower {
    fn p4(&self) -> Vec4 {
        Tower::p4(self)
    }
    fn pt(&self) -> f64 {
        self.et
    }
    fn eta(&self) -> f64 {
        self.eta
    }
    fn phi(&self) -> f64 {
        self.phi
    }
    fn et(&self) -> f64 {
        self.et
    }
    fn energy(&self) -> f64 {
        self.e
    }
}
impl Sortable for Tower {
    const KIND: RecordKind = RecordKind::Tower;
}

impl Kinematics for Candidate {
    fn p4(&self) -> Vec4 {
        self.momentum
    }
}
impl Sortable for Candidate {
    const KIND: RecordKind = RecordKind::Candidate;
}

/// A named, total ordering over records.
#[derive(Copy, Clone)]
pub struct Comparator {
    name: &'static str,
    compare: fn(&dyn Kinematics, &dyn Kinematics) -> Ordering,
}

impl Debug for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Comparator").field(&self.name).finish()
    }
}

impl PartialEq for Comparator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Comparator {
    /// Descending transverse momentum.
    pub const PT_DESCENDING: Comparator = Comparator {
        name: "pt-descending",
        compare: pt_descending,
    };
    /// Descending transverse energy.
    pub const ET_DESCENDING: Comparator = Comparator {
        name: "et-descending",
        compare: et_descending,
    };

    /// The name the ordering is registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Compare two records of the same kind.
    pub fn compare<T: Kinematics>(&self, a: &T, b: &T) -> Ordering {
        (self.compare)(a, b)
    }

    /// Compare two type-erased records.
    ///
    /// Both records should be of the kind the ordering is registered for; mixing kinds is not
    /// checked and gives an ordering with no physical meaning.
    pub fn compare_dyn(&self, a: &dyn Kinematics, b: &dyn Kinematics) -> Ordering {
        (self.compare)(a, b)
    }
}

/// Ascending $`|\eta|`$, then ascending $`\eta`$, then ascending $`\phi`$.
fn tie_break(a: &dyn Kinematics, b: &dyn Kinematics) -> Ordering {
    let (eta_a, eta_b) = (a.eta(), b.eta());
    eta_a
        .abs()
        .total_cmp(&eta_b.abs())
        .then_with(|| eta_a.total_cmp(&eta_b))
        .then_with(|| a.phi().total_cmp(&b.phi()))
}

fn pt_descending(a: &dyn Kinematics, b: &dyn Kinematics) -> Ordering {
    b.pt().total_cmp(&a.pt()).then_with(|| tie_break(a, b))
}

fn et_descending(a: &dyn Kinematics, b: &dyn Kinematics) -> Ordering {
    b.et().total_cmp(&a.et()).then_with(|| tie_break(a, b))
}

fn installed(kind: RecordKind) -> Comparator {
    match kind {
        RecordKind::Tower => Comparator::ET_DESCENDING,
        _ => Comparator::PT_DESCENDING,
    }
}

static REGISTRY: OnceLock<IndexMap<RecordKind, Comparator>> = OnceLock::new();

/// The read-only registry of installed orderings, one per [`RecordKind`].
pub fn registry() -> &'static IndexMap<RecordKind, Comparator> {
    REGISTRY.get_or_init(|| {
        let registry: IndexMap<RecordKind, Comparator> = RecordKind::ALL
            .iter()
            .map(|&kind| (kind, installed(kind)))
            .collect();
        debug!(kinds = registry.len(), "built comparator registry");
        registry
    })
}

/// The installed ordering for `kind`.
pub fn comparator_for(kind: RecordKind) -> Comparator {
    registry()
        .get(&kind)
        .copied()
        .unwrap_or_else(|| installed(kind))
}

/// Sort a slice of records in place by their installed ordering.
pub fn sort_by_comparator<T: Sortable + Send>(items: &mut [T]) {
    let comparator = T::comparator();
    #[cfg(feature = "rayon")]
    items.par_sort_by(|a, b| comparator.compare(a, b));
    #[cfg(not(feature = "rayon"))]
    items.sort_by(|a, b| comparator.compare(a, b));
}

/// Sort a slice of records in place by their installed ordering on a dedicated pool of
/// `threads` threads.
///
/// # Errors
///
/// Returns [`TesseraError::ThreadPoolError`](crate::TesseraError::ThreadPoolError) if the
/// pool cannot be built.
#[cfg(feature = "rayon")]
pub fn sort_by_comparator_with_threads<T: Sortable + Send>(
    items: &mut [T],
    threads: usize,
) -> TesseraResult<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?
        .install(|| sort_by_comparator(items));
    Ok(())
}

/// Handles to every live record of `arena`, ordered by the installed ordering of `T`.
pub fn sorted_by_comparator<T: Sortable + Sync>(arena: &Arena<T>) -> Vec<Ref<T>> {
    let comparator = T::comparator();
    let mut entries: Vec<(Ref<T>, &T)> = arena.iter().collect();
    #[cfg(feature = "rayon")]
    entries.par_sort_by(|a, b| comparator.compare(a.1, b.1));
    #[cfg(not(feature = "rayon"))]
    entries.sort_by(|a, b| comparator.compare(a.1, b.1));
    entries.into_iter().map(|(handle, _)| handle).collect()
}

/// Orders records by ascending $`\Delta R`$ to a fixed reference direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DeltaRComparator {
    eta: f64,
    phi: f64,
}

impl DeltaRComparator {
    /// An ordering around the direction `(eta, phi)`.
    pub fn new(eta: f64, phi: f64) -> Self {
        Self { eta, phi }
    }

    /// An ordering around the direction of `reference`.
    pub fn around<K: Kinematics + ?Sized>(reference: &K) -> Self {
        Self::new(reference.eta(), reference.phi())
    }

    /// The distance of `item` from the reference direction.
    pub fn delta_r<K: Kinematics + ?Sized>(&self, item: &K) -> f64 {
        let deta = item.eta() - self.eta;
        let dphi = delta_phi(item.phi(), self.phi);
        deta.hypot(dphi)
    }

    /// Compare two records by their distance from the reference direction, closest first.
    pub fn compare<K: Kinematics + ?Sized>(&self, a: &K, b: &K) -> Ordering {
        self.delta_r(a).total_cmp(&self.delta_r(b)).then_with(|| {
            a.eta()
                .abs()
                .total_cmp(&b.eta().abs())
                .then_with(|| a.eta().total_cmp(&b.eta()))
                .then_with(|| a.phi().total_cmp(&b.phi()))
        })
    }

    /// Sort a slice of records in place, closest first.
    pub fn sort<T: Kinematics + Send>(&self, items: &mut [T]) {
        #[cfg(feature = "rayon")]
        items.par_sort_by(|a, b| self.compare(a, b));
        #[cfg(not(feature = "rayon"))]
        items.sort_by(|a, b| self.compare(a, b));
    }

    /// The record closest to the reference direction, if any.
    pub fn nearest<'a, T: Kinematics>(&self, items: &'a [T]) -> Option<&'a T> {
        items.iter().min_by(|a, b| self.compare(*a, *b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn jet(pt: f64, eta: f64, phi: f64) -> Jet {
        Jet {
            pt,
            eta,
            phi,
            ..Default::default()
        }
    }

    #[test]
    fn test_registry_covers_every_kind() {
        let registry = registry();
        assert_eq!(registry.len(), RecordKind::ALL.len());
        for (kind, expected) in registry.keys().zip(RecordKind::ALL) {
            assert_eq!(*kind, expected);
        }
        assert_eq!(comparator_for(RecordKind::Tower), Comparator::ET_DESCENDING);
        assert_eq!(comparator_for(RecordKind::Jet), Comparator::PT_DESCENDING);
        assert_eq!(Candidate::comparator().name(), "pt-descending");
    }

    #[test]
    fn test_jets_sort_descending_with_tie_break() {
        let mut jets = vec![
            jet(10.0, 0.0, 0.0),
            jet(30.0, -1.0, 0.0),
            jet(30.0, 0.5, 0.0),
            jet(30.0, -0.5, 1.0),
            jet(30.0, -0.5, -1.0),
            jet(20.0, 2.0, 0.0),
        ];
        sort_by_comparator(&mut jets);
        let order: Vec<(f64, f64, f64)> = jets.iter().map(|j| (j.pt, j.eta, j.phi)).collect();
        assert_eq!(
            order,
            vec![
                (30.0, -0.5, -1.0),
                (30.0, -0.5, 1.0),
                (30.0, 0.5, 0.0),
                (30.0, -1.0, 0.0),
                (20.0, 2.0, 0.0),
                (10.0, 0.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_sort_is_idempotent_and_descending() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut jets: Vec<Jet> = (0..500)
            .map(|_| {
                jet(
                    rng.u32(0..20) as f64,
                    rng.i32(-3..=3) as f64 * 0.5,
                    (rng.f64() * 2.0 - 1.0) * PI,
                )
            })
            .collect();
        sort_by_comparator(&mut jets);
        let once = jets.clone();
        sort_by_comparator(&mut jets);
        assert_eq!(jets, once);
        let comparator = Jet::comparator();
        for pair in jets.windows(2) {
            assert!(pair[0].pt >= pair[1].pt);
            assert_eq!(comparator.compare(&pair[0], &pair[1]), Ordering::Less);
        }
    }

    #[test]
    fn test_towers_sort_by_et() {
        let mut towers = vec![
            Tower {
                et: 5.0,
                e: 100.0,
                ..Default::default()
            },
            Tower {
                et: 8.0,
                e: 10.0,
                ..Default::default()
            },
        ];
        sort_by_comparator(&mut towers);
        assert_eq!(towers[0].et, 8.0);
        assert_eq!(towers[1].et, 5.0);
    }

    #[test]
    fn test_order_is_total_with_nan() {
        let mut jets = vec![jet(f64::NAN, 0.0, 0.0), jet(5.0, 0.0, 0.0), jet(7.0, 0.0, 0.0)];
        sort_by_comparator(&mut jets);
        let comparator = Jet::comparator();
        for a in &jets {
            assert_eq!(comparator.compare(a, a), Ordering::Equal);
        }
        assert_eq!(jets[1].pt, 7.0);
        assert_eq!(jets[2].pt, 5.0);
    }

    #[test]
    fn test_gen_particles_sort_by_derived_pt() {
        let slow = GenParticle {
            px: 1.0,
            e: 2.0,
            ..Default::default()
        };
        let fast = GenParticle {
            px: 3.0,
            py: 4.0,
            e: 6.0,
            ..Default::default()
        };
        let mut particles = vec![slow.clone(), fast.clone()];
        sort_by_comparator(&mut particles);
        assert_eq!(particles, vec![fast, slow]);
    }

    #[test]
    fn test_sorted_handles_from_arena() {
        let mut arena = Arena::new(RecordKind::Candidate);
        let low = arena.insert(Candidate::with_momentum(Vec4::from_pt_eta_phi_m(
            1.0, 0.0, 0.0, 0.0,
        )));
        let high = arena.insert(Candidate::with_momentum(Vec4::from_pt_eta_phi_m(
            9.0, 0.0, 0.0, 0.0,
        )));
        let mid = arena.insert(Candidate::with_momentum(Vec4::from_pt_eta_phi_m(
            4.0, 0.0, 0.0, 0.0,
        )));
        assert_eq!(sorted_by_comparator(&arena), vec![high, mid, low]);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_sort_on_dedicated_pool() {
        let mut jets: Vec<Jet> = (0..100).map(|i| jet(i as f64, 0.0, 0.0)).collect();
        sort_by_comparator_with_threads(&mut jets, 2).unwrap();
        assert_eq!(jets[0].pt, 99.0);
        assert_eq!(jets[99].pt, 0.0);
    }

    #[test]
    fn test_delta_r_ordering() {
        let reference = jet(50.0, 1.0, 3.0);
        let ordering = DeltaRComparator::around(&reference);
        let mut jets = vec![jet(1.0, 1.0, 0.0), jet(1.0, 1.0, -3.0), jet(1.0, 1.5, 3.0)];
        assert_relative_eq!(ordering.delta_r(&jets[1]), 2.0 * PI - 6.0, epsilon = 1e-12);
        ordering.sort(&mut jets);
        assert_eq!(jets[0].eta, 1.0);
        assert_eq!(jets[0].phi, -3.0);
        assert_eq!(jets[1].eta, 1.5);
        assert_eq!(ordering.nearest(&jets), Some(&jets[0]));
        assert_eq!(ordering.nearest::<Jet>(&[]), None);
    }
}
