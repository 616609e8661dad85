//! Python bindings for `tessera`, collected into the `tessera` extension module by `py-tessera`.
#![allow(clippy::new_without_default)]

use pyo3::prelude::*;
use tessera_core::{comparator_for, RecordKind};

/// Event store and candidate handles.
pub mod store;
/// Three- and four-vectors.
pub mod vectors;

pub use store::{PyCandidateRef, PyEventStore};
pub use vectors::{PyVec3, PyVec4};

/// The name of the ordering installed for a record kind
///
/// Parameters
/// ----------
/// kind : str
///     The name of a record kind, such as ``"Jet"`` or ``"tower"``
///
/// Returns
/// -------
/// str
///     The name of the installed ordering
///
/// Raises
/// ------
/// ValueError
///     If `kind` does not name a record kind
///
#[pyfunction]
pub fn comparator_name(kind: &str) -> PyResult<String> {
    let kind: RecordKind = kind.parse()?;
    Ok(comparator_for(kind).name().to_string())
}

/// Add every class and function of the bindings to `m`.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyVec3>()?;
    m.add_class::<PyVec4>()?;
    m.add_class::<PyCandidateRef>()?;
    m.add_class::<PyEventStore>()?;
    m.add_function(wrap_pyfunction!(comparator_name, m)?)?;
    Ok(())
}
