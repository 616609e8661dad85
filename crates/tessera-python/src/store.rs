use pyo3::{prelude::*, types::PyBytes};
#[cfg(feature = "rayon")]
use rayon::ThreadPoolBuilder;
use tessera_core::{
    data::io::{from_bytes, to_bytes},
    sorting::sorted_by_comparator,
    Candidate, EventStore, Ref, StoreOptions, TesseraError,
};

use crate::vectors::PyVec4;

/// A handle to a Candidate held in an EventStore
///
/// Handles are only valid within the event they were created in. Once
/// ``EventStore.finish_event`` is called, every method taking this handle raises a KeyError.
///
#[pyclass(name = "CandidateRef", module = "tessera", frozen, eq, hash)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PyCandidateRef(pub Ref<Candidate>);

#[pymethods]
impl PyCandidateRef {
    /// The slot index of the handle
    ///
    #[getter]
    fn index(&self) -> u32 {
        self.0.index()
    }
    /// The generation stamped on the slot when the Candidate was allocated
    ///
    #[getter]
    fn generation(&self) -> u64 {
        self.0.generation()
    }
    fn __repr__(&self) -> String {
        format!("{:?}", self.0)
    }
}

/// The container which owns every Candidate of the event being processed
///
/// Parameters
/// ----------
/// candidate_capacity : int, optional
///     The number of Candidates to reserve room for
///
#[pyclass(name = "EventStore", module = "tessera")]
pub struct PyEventStore(pub EventStore);

#[pymethods]
impl PyEventStore {
    #[new]
    #[pyo3(signature = (candidate_capacity = None))]
    fn new(candidate_capacity: Option<usize>) -> Self {
        let mut options = StoreOptions::default();
        if let Some(capacity) = candidate_capacity {
            options.candidate_capacity = capacity;
        }
        Self(EventStore::with_options(options))
    }
    /// The number of events finished so far
    ///
    #[getter]
    fn generation(&self) -> u64 {
        self.0.generation()
    }
    fn __len__(&self) -> usize {
        self.0.record_count()
    }
    /// Allocate a new Candidate in the current event
    ///
    /// Parameters
    /// ----------
    /// momentum : Vec4, optional
    ///     The 4-momentum of the new Candidate
    ///
    /// Returns
    /// -------
    /// CandidateRef
    ///
    #[pyo3(signature = (momentum = None))]
    fn new_candidate(&mut self, momentum: Option<PyVec4>) -> PyResult<PyCandidateRef> {
        let handle = self.0.new_candidate();
        if let Some(momentum) = momentum {
            self.0.candidates.get_mut(handle)?.momentum = momentum.0;
        }
        Ok(PyCandidateRef(handle))
    }
    /// Append ``child`` to the constituents of ``parent``
    ///
    /// Raises
    /// ------
    /// KeyError
    ///     If ``parent`` no longer refers to a live Candidate
    ///
    fn add_candidate(&mut self, parent: PyCandidateRef, child: PyCandidateRef) -> PyResult<()> {
        self.0.candidates.get_mut(parent.0)?.add_candidate(child.0);
        Ok(())
    }
    /// The constituents of a Candidate, in insertion order
    ///
    /// Returns
    /// -------
    /// list of CandidateRef
    ///
    fn candidates(&self, parent: PyCandidateRef) -> PyResult<Vec<PyCandidateRef>> {
        Ok(self
            .0
            .candidates
            .get(parent.0)?
            .candidates()
            .iter()
            .map(|handle| PyCandidateRef(*handle))
            .collect())
    }
    /// Reset a Candidate to its default state, releasing its constituent list
    ///
    fn clear_candidate(&mut self, candidate: PyCandidateRef) -> PyResult<()> {
        self.0.candidates.get_mut(candidate.0)?.clear();
        Ok(())
    }
    /// Check whether two Candidates share a constituent
    ///
    /// Returns
    /// -------
    /// bool
    ///
    fn overlaps(&self, a: PyCandidateRef, b: PyCandidateRef) -> bool {
        self.0.candidates.overlaps(a.0, b.0)
    }
    /// Allocate a deep copy of a Candidate
    ///
    /// Returns
    /// -------
    /// CandidateRef
    ///
    fn clone_candidate(&mut self, source: PyCandidateRef) -> PyResult<PyCandidateRef> {
        Ok(PyCandidateRef(self.0.candidates.clone_candidate(source.0)?))
    }
    /// Overwrite ``target`` with a deep copy of ``source``
    ///
    fn copy_candidate(&mut self, source: PyCandidateRef, target: PyCandidateRef) -> PyResult<()> {
        Ok(self.0.candidates.copy_candidate(source.0, target.0)?)
    }
    /// The 4-momentum of a Candidate
    ///
    fn momentum(&self, candidate: PyCandidateRef) -> PyResult<PyVec4> {
        Ok(PyVec4(self.0.candidates.get(candidate.0)?.momentum))
    }
    /// Set the 4-momentum of a Candidate
    ///
    fn set_momentum(&mut self, candidate: PyCandidateRef, momentum: PyVec4) -> PyResult<()> {
        self.0.candidates.get_mut(candidate.0)?.momentum = momentum.0;
        Ok(())
    }
    /// Every live Candidate, ordered by the installed Candidate ordering
    ///
    /// Parameters
    /// ----------
    /// threads : int, optional
    ///     The number of threads to use (setting this to None will use all available CPUs)
    ///
    /// Returns
    /// -------
    /// list of CandidateRef
    ///
    #[pyo3(signature = (*, threads = None))]
    fn sorted_candidates(&self, threads: Option<usize>) -> PyResult<Vec<PyCandidateRef>> {
        #[cfg(feature = "rayon")]
        let sorted = ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or_else(num_cpus::get))
            .build()
            .map_err(TesseraError::from)?
            .install(|| sorted_by_comparator(&self.0.candidates));
        #[cfg(not(feature = "rayon"))]
        let sorted = {
            let _ = threads;
            sorted_by_comparator(&self.0.candidates)
        };
        Ok(sorted.into_iter().map(PyCandidateRef).collect())
    }
    /// Encode a Candidate's fields as bytes
    ///
    /// Constituent handles are written as-is. They never resolve in another event or another
    /// process, and the loaded Candidate only overlaps copies of the one that was saved.
    ///
    fn save_candidate<'py>(
        &self,
        py: Python<'py>,
        candidate: PyCandidateRef,
    ) -> PyResult<Bound<'py, PyBytes>> {
        let bytes = to_bytes(self.0.candidates.get(candidate.0)?)?;
        Ok(PyBytes::new(py, &bytes))
    }
    /// Decode a Candidate written by ``save_candidate`` into the current event
    ///
    /// Raises
    /// ------
    /// ValueError
    ///     If the bytes hold another record or an incompatible layout
    ///
    fn load_candidate(&mut self, state: Bound<'_, PyBytes>) -> PyResult<PyCandidateRef> {
        let candidate: Candidate = from_bytes(state.as_bytes())?;
        Ok(PyCandidateRef(self.0.candidates.insert(candidate)))
    }
    /// Release every record of the current event
    ///
    fn finish_event(&mut self) {
        self.0.finish_event()
    }
}
