use bincode::{deserialize, serialize};
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyBytes};
use tessera_core::{TesseraError, Vec3, Vec4};

/// A 3-vector formed from Cartesian components
///
/// Parameters
/// ----------
/// px, py, pz : float
///     The Cartesian components of the 3-vector
///
#[pyclass(name = "Vec3", module = "tessera")]
#[derive(Clone)]
pub struct PyVec3(pub Vec3);

#[pymethods]
impl PyVec3 {
    #[new]
    #[pyo3(signature = (px = 0.0, py = 0.0, pz = 0.0))]
    fn new(px: f64, py: f64, pz: f64) -> Self {
        Self(Vec3::new(px, py, pz))
    }
    fn __add__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        if let Ok(other_vec) = other.extract::<PyRef<Self>>() {
            Ok(Self(self.0 + other_vec.0))
        } else if let Ok(other_int) = other.extract::<usize>() {
            if other_int == 0 {
                Ok(self.clone())
            } else {
                Err(PyTypeError::new_err(
                    "Addition with an integer for this type is only defined for 0",
                ))
            }
        } else {
            Err(PyTypeError::new_err("Unsupported operand type for +"))
        }
    }
    fn __radd__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        self.__add__(other)
    }
    fn __sub__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        if let Ok(other_vec) = other.extract::<PyRef<Self>>() {
            Ok(Self(self.0 - other_vec.0))
        } else {
            Err(PyTypeError::new_err("Unsupported operand type for -"))
        }
    }
    fn __mul__(&self, other: f64) -> Self {
        Self(self.0 * other)
    }
    fn __rmul__(&self, other: f64) -> Self {
        Self(self.0 * other)
    }
    fn __neg__(&self) -> Self {
        Self(-self.0)
    }
    /// The dot product
    ///
    /// Parameters
    /// ----------
    /// other : Vec3
    ///     A vector input with which the dot product is taken
    ///
    /// Returns
    /// -------
    /// float
    ///     The dot product of this vector and `other`
    ///
    fn dot(&self, other: Self) -> f64 {
        self.0.dot(&other.0)
    }
    /// The cross product
    ///
    /// Parameters
    /// ----------
    /// other : Vec3
    ///     A vector input with which the cross product is taken
    ///
    /// Returns
    /// -------
    /// Vec3
    ///     The cross product of this vector and `other`
    ///
    fn cross(&self, other: Self) -> Self {
        Self(self.0.cross(&other.0))
    }
    /// The magnitude of the 3-vector
    ///
    /// .. math:: |\vec{p}| = \sqrt{p_x^2 + p_y^2 + p_z^2}
    ///
    #[getter]
    fn mag(&self) -> f64 {
        self.0.mag()
    }
    /// The squared magnitude of the 3-vector
    ///
    #[getter]
    fn mag2(&self) -> f64 {
        self.0.mag2()
    }
    /// The transverse component of the 3-vector
    ///
    #[getter]
    fn perp(&self) -> f64 {
        self.0.perp()
    }
    /// The cosine of the polar angle
    ///
    #[getter]
    fn costheta(&self) -> f64 {
        self.0.costheta()
    }
    /// The polar angle
    ///
    #[getter]
    fn theta(&self) -> f64 {
        self.0.theta()
    }
    /// The azimuthal angle
    ///
    #[getter]
    fn phi(&self) -> f64 {
        self.0.phi()
    }
    /// The pseudorapidity
    ///
    /// Vectors along the beam axis have infinite pseudorapidity, signed by their direction.
    ///
    #[getter]
    fn eta(&self) -> f64 {
        self.0.eta()
    }
    /// The normalized unit vector pointing in the direction of this vector
    ///
    #[getter]
    fn unit(&self) -> Self {
        Self(self.0.unit())
    }
    /// The x-component of this vector
    ///
    #[getter]
    fn px(&self) -> f64 {
        self.0.x
    }
    /// The y-component of this vector
    ///
    #[getter]
    fn py(&self) -> f64 {
        self.0.y
    }
    /// The z-component of this vector
    ///
    #[getter]
    fn pz(&self) -> f64 {
        self.0.z
    }
    /// Convert a 3-vector momentum to a 4-momentum with the given mass
    ///
    /// Parameters
    /// ----------
    /// mass: float
    ///     The mass of the new 4-momentum
    ///
    /// Returns
    /// -------
    /// Vec4
    ///     A new 4-momentum with the given mass
    ///
    fn with_mass(&self, mass: f64) -> PyVec4 {
        PyVec4(self.0.with_mass(mass))
    }
    /// Convert a 3-vector momentum to a 4-momentum with the given energy
    ///
    /// Parameters
    /// ----------
    /// energy: float
    ///     The energy of the new 4-momentum
    ///
    /// Returns
    /// -------
    /// Vec4
    ///     A new 4-momentum with the given energy
    ///
    fn with_energy(&self, energy: f64) -> PyVec4 {
        PyVec4(self.0.with_energy(energy))
    }
    fn __repr__(&self) -> String {
        format!("{:?}", self.0)
    }
    fn __str__(&self) -> String {
        format!("{}", self.0)
    }
    fn __getstate__<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        Ok(PyBytes::new(
            py,
            serialize(&self.0)
                .map_err(TesseraError::SerdeError)?
                .as_slice(),
        ))
    }
    fn __setstate__(&mut self, state: Bound<'_, PyBytes>) -> PyResult<()> {
        *self = PyVec3(deserialize(state.as_bytes()).map_err(TesseraError::SerdeError)?);
        Ok(())
    }
}

/// A 4-momentum formed from Cartesian momentum components and an energy
///
/// Parameters
/// ----------
/// px, py, pz : float
///     The Cartesian components of the 3-momentum
/// e : float
///     The energy
///
#[pyclass(name = "Vec4", module = "tessera")]
#[derive(Clone)]
pub struct PyVec4(pub Vec4);

#[pymethods]
impl PyVec4 {
    #[new]
    #[pyo3(signature = (px = 0.0, py = 0.0, pz = 0.0, e = 0.0))]
    fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self(Vec4::new(px, py, pz, e))
    }
    /// Build a 4-momentum from transverse momentum, pseudorapidity, azimuthal angle, and mass
    ///
    /// A negative mass produces a space-like vector.
    ///
    /// Parameters
    /// ----------
    /// pt, eta, phi, mass : float
    ///
    /// Returns
    /// -------
    /// Vec4
    ///
    #[staticmethod]
    fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        Self(Vec4::from_pt_eta_phi_m(pt, eta, phi, mass))
    }
    /// Build a 4-momentum from transverse momentum, pseudorapidity, azimuthal angle, and energy
    ///
    /// Parameters
    /// ----------
    /// pt, eta, phi, e : float
    ///
    /// Returns
    /// -------
    /// Vec4
    ///
    #[staticmethod]
    fn from_pt_eta_phi_e(pt: f64, eta: f64, phi: f64, e: f64) -> Self {
        Self(Vec4::from_pt_eta_phi_e(pt, eta, phi, e))
    }
    fn __add__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        if let Ok(other_vec) = other.extract::<PyRef<Self>>() {
            Ok(Self(self.0 + other_vec.0))
        } else if let Ok(other_int) = other.extract::<usize>() {
            if other_int == 0 {
                Ok(self.clone())
            } else {
                Err(PyTypeError::new_err(
                    "Addition with an integer for this type is only defined for 0",
                ))
            }
        } else {
            Err(PyTypeError::new_err("Unsupported operand type for +"))
        }
    }
    fn __radd__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        self.__add__(other)
    }
    fn __sub__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        if let Ok(other_vec) = other.extract::<PyRef<Self>>() {
            Ok(Self(self.0 - other_vec.0))
        } else {
            Err(PyTypeError::new_err("Unsupported operand type for -"))
        }
    }
    fn __mul__(&self, other: f64) -> Self {
        Self(self.0 * other)
    }
    fn __rmul__(&self, other: f64) -> Self {
        Self(self.0 * other)
    }
    fn __neg__(&self) -> Self {
        Self(-self.0)
    }
    /// The x-component of the 3-momentum
    ///
    #[getter]
    fn px(&self) -> f64 {
        self.0.px()
    }
    /// The y-component of the 3-momentum
    ///
    #[getter]
    fn py(&self) -> f64 {
        self.0.py()
    }
    /// The z-component of the 3-momentum
    ///
    #[getter]
    fn pz(&self) -> f64 {
        self.0.pz()
    }
    /// The energy
    ///
    #[getter]
    fn e(&self) -> f64 {
        self.0.e()
    }
    /// The 3-momentum
    ///
    #[getter]
    fn vec3(&self) -> PyVec3 {
        PyVec3(self.0.vec3())
    }
    /// The transverse momentum
    ///
    #[getter]
    fn pt(&self) -> f64 {
        self.0.pt()
    }
    /// The pseudorapidity
    ///
    #[getter]
    fn eta(&self) -> f64 {
        self.0.eta()
    }
    /// The azimuthal angle
    ///
    #[getter]
    fn phi(&self) -> f64 {
        self.0.phi()
    }
    /// The rapidity
    ///
    #[getter]
    fn rapidity(&self) -> f64 {
        self.0.rapidity()
    }
    /// The transverse energy
    ///
    #[getter]
    fn et(&self) -> f64 {
        self.0.et()
    }
    /// The invariant mass
    ///
    /// Space-like vectors report a negative mass.
    ///
    #[getter]
    fn m(&self) -> f64 {
        self.0.m()
    }
    /// The squared invariant mass
    ///
    #[getter]
    fn m2(&self) -> f64 {
        self.0.m2()
    }
    /// The velocity 3-vector
    ///
    #[getter]
    fn beta(&self) -> PyVec3 {
        PyVec3(self.0.beta())
    }
    /// The Lorentz factor
    ///
    #[getter]
    fn gamma(&self) -> f64 {
        self.0.gamma()
    }
    /// Boost the given 4-momentum according to a boost velocity
    ///
    /// Parameters
    /// ----------
    /// beta : Vec3
    ///     The boost velocity
    ///
    /// Returns
    /// -------
    /// Vec4
    ///     The boosted 4-momentum
    ///
    fn boost(&self, beta: &PyVec3) -> Self {
        Self(self.0.boost(&beta.0))
    }
    /// The angular distance to another 4-momentum
    ///
    /// .. math:: \Delta R = \sqrt{\Delta\eta^2 + \Delta\phi^2}
    ///
    /// Parameters
    /// ----------
    /// other : Vec4
    ///
    /// Returns
    /// -------
    /// float
    ///
    fn delta_r(&self, other: &Self) -> f64 {
        self.0.delta_r(&other.0)
    }
    fn __repr__(&self) -> String {
        format!("{:?}", self.0)
    }
    fn __str__(&self) -> String {
        self.0.to_p4_string()
    }
    fn __getstate__<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        Ok(PyBytes::new(
            py,
            serialize(&self.0)
                .map_err(TesseraError::SerdeError)?
                .as_slice(),
        ))
    }
    fn __setstate__(&mut self, state: Bound<'_, PyBytes>) -> PyResult<()> {
        *self = PyVec4(deserialize(state.as_bytes()).map_err(TesseraError::SerdeError)?);
        Ok(())
    }
}
