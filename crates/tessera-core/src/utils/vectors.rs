use std::{fmt::Display, iter::Sum};

use auto_ops::{impl_op_ex, impl_op_ex_commutative};
use serde::{Deserialize, Serialize};

/// A Cartesian three-vector, typically a momentum or a position in space.
#[derive(Copy, Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct Vec3 {
    /// The x-component of the vector
    pub x: f64,
    /// The y-component of the vector
    pub y: f64,
    /// The z-component of the vector
    pub z: f64,
}

impl Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:6.3}, {:6.3}, {:6.3}]", self.x, self.y, self.z)
    }
}

impl Vec3 {
    /// Create a new three-vector from its Cartesian components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Interpret this vector as a three-momentum and attach a mass to form a [`Vec4`].
    pub fn with_mass(&self, mass: f64) -> Vec4 {
        let e = (mass.powi(2) + self.mag2()).sqrt();
        Vec4::new(self.x, self.y, self.z, e)
    }

    /// Interpret this vector as a three-momentum and attach an energy to form a [`Vec4`].
    pub fn with_energy(&self, energy: f64) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, energy)
    }

    /// The dot product of two three-vectors.
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// The cross product of two three-vectors.
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// The squared magnitude of the vector.
    pub fn mag2(&self) -> f64 {
        self.dot(self)
    }

    /// The magnitude of the vector.
    pub fn mag(&self) -> f64 {
        self.mag2().sqrt()
    }

    /// The component transverse to the $`z`$-axis.
    pub fn perp(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// The cosine of the polar angle.
    pub fn costheta(&self) -> f64 {
        self.z / self.mag()
    }

    /// The polar angle.
    pub fn theta(&self) -> f64 {
        self.perp().atan2(self.z)
    }

    /// The azimuthal angle in $`(-\pi, \pi]`$.
    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// The pseudorapidity $`\eta = \sinh^{-1}(p_z / p_T)`$.
    ///
    /// Along the beam axis the pseudorapidity diverges: a vector with zero transverse
    /// component yields $`\pm\infty`$ (or zero for the null vector).
    pub fn eta(&self) -> f64 {
        let perp = self.perp();
        if perp == 0.0 {
            if self.z == 0.0 {
                0.0
            } else {
                self.z.signum() * f64::INFINITY
            }
        } else {
            (self.z / perp).asinh()
        }
    }

    /// A unit vector in the same direction.
    pub fn unit(&self) -> Self {
        let mag = self.mag();
        Self::new(self.x / mag, self.y / mag, self.z / mag)
    }
}

impl_op_ex!(+ |a: &Vec3, b: &Vec3| -> Vec3 { Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z) });
impl_op_ex!(-|a: &Vec3, b: &Vec3| -> Vec3 { Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z) });
impl_op_ex!(-|a: &Vec3| -> Vec3 { Vec3::new(-a.x, -a.y, -a.z) });
impl_op_ex_commutative!(*|a: &Vec3, b: &f64| -> Vec3 { Vec3::new(a.x * b, a.y * b, a.z * b) });
impl_op_ex!(/ |a: &Vec3, b: &f64| -> Vec3 { Vec3::new(a.x / b, a.y / b, a.z / b) });

/// A four-vector with Cartesian spatial components and a time-like fourth component.
///
/// Used both as a four-momentum $`(p_x, p_y, p_z, E)`$ and as a space-time position
/// $`(x, y, z, t)`$.
#[derive(Copy, Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct Vec4 {
    /// The x-component of the vector
    pub x: f64,
    /// The y-component of the vector
    pub y: f64,
    /// The z-component of the vector
    pub z: f64,
    /// The time-like component of the vector
    pub t: f64,
}

impl Display for Vec4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:6.3}, {:6.3}, {:6.3}; {:6.3}]",
            self.x, self.y, self.z, self.t
        )
    }
}

impl Vec4 {
    /// Create a new four-vector from its Cartesian components, with the time-like
    /// component last.
    pub const fn new(x: f64, y: f64, z: f64, t: f64) -> Self {
        Self { x, y, z, t }
    }

    /// Build a four-momentum from transverse momentum, pseudorapidity, azimuthal angle, and
    /// mass.
    ///
    /// A negative mass is interpreted as a space-like vector with $`m^2 = -|m|^2`$, with the
    /// energy clamped at zero.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        let p3 = Vec3::new(pt * phi.cos(), pt * phi.sin(), pt * eta.sinh());
        if mass >= 0.0 {
            p3.with_mass(mass)
        } else {
            p3.with_energy((p3.mag2() - mass * mass).max(0.0).sqrt())
        }
    }

    /// Build a four-momentum from transverse momentum, pseudorapidity, azimuthal angle, and
    /// energy.
    pub fn from_pt_eta_phi_e(pt: f64, eta: f64, phi: f64, energy: f64) -> Self {
        Self::new(pt * phi.cos(), pt * phi.sin(), pt * eta.sinh(), energy)
    }

    /// The x-component of the momentum.
    pub fn px(&self) -> f64 {
        self.x
    }
    /// The y-component of the momentum.
    pub fn py(&self) -> f64 {
        self.y
    }
    /// The z-component of the momentum.
    pub fn pz(&self) -> f64 {
        self.z
    }
    /// The energy.
    pub fn e(&self) -> f64 {
        self.t
    }

    /// The spatial part of the four-vector.
    pub fn vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// The transverse momentum.
    pub fn pt(&self) -> f64 {
        self.vec3().perp()
    }

    /// The pseudorapidity.
    pub fn eta(&self) -> f64 {
        self.vec3().eta()
    }

    /// The azimuthal angle in $`(-\pi, \pi]`$.
    pub fn phi(&self) -> f64 {
        self.vec3().phi()
    }

    /// The rapidity $`y = \frac{1}{2}\ln\frac{E + p_z}{E - p_z}`$.
    pub fn rapidity(&self) -> f64 {
        0.5 * ((self.t + self.z) / (self.t - self.z)).ln()
    }

    /// The transverse energy $`E_T = E \, p_T / |\vec{p}|`$.
    pub fn et(&self) -> f64 {
        let p = self.vec3().mag();
        if p == 0.0 {
            0.0
        } else {
            self.t * self.pt() / p
        }
    }

    /// The squared Minkowski norm $`E^2 - |\vec{p}|^2`$.
    pub fn m2(&self) -> f64 {
        self.t * self.t - self.vec3().mag2()
    }

    /// The invariant mass. Space-like vectors return $`-\sqrt{-m^2}`$.
    pub fn m(&self) -> f64 {
        let m2 = self.m2();
        if m2 < 0.0 {
            -(-m2).sqrt()
        } else {
            m2.sqrt()
        }
    }

    /// The velocity $`\vec{\beta} = \vec{p} / E`$.
    pub fn beta(&self) -> Vec3 {
        self.vec3() / self.t
    }

    /// The Lorentz factor $`\gamma = E / m`$.
    pub fn gamma(&self) -> f64 {
        self.t / self.m2().sqrt()
    }

    /// Boost this four-vector by the velocity `beta`.
    pub fn boost(&self, beta: &Vec3) -> Self {
        let b2 = beta.mag2();
        if b2 == 0.0 {
            return *self;
        }
        let gamma = 1.0 / (1.0 - b2).sqrt();
        let p3 = self.vec3();
        let bp = beta.dot(&p3);
        let p3 = p3 + beta * ((gamma - 1.0) * bp / b2 + gamma * self.t);
        p3.with_energy(gamma * (self.t + bp))
    }

    /// The angular distance $`\Delta R = \sqrt{\Delta\eta^2 + \Delta\phi^2}`$ to another
    /// four-vector, with $`\Delta\phi`$ wrapped into $`(-\pi, \pi]`$.
    pub fn delta_r(&self, other: &Self) -> f64 {
        let deta = self.eta() - other.eta();
        let dphi = crate::utils::delta_phi(self.phi(), other.phi());
        deta.hypot(dphi)
    }

    /// A compact string representation of the four-momentum.
    pub fn to_p4_string(&self) -> String {
        format!(
            "[e = {:.5}; p = ({:.5}, {:.5}, {:.5}); m = {:.5}]",
            self.e(),
            self.px(),
            self.py(),
            self.pz(),
            self.m()
        )
    }
}

impl_op_ex!(+ |a: &Vec4, b: &Vec4| -> Vec4 { Vec4::new(a.x + b.x, a.y + b.y, a.z + b.z, a.t + b.t) });
impl_op_ex!(-|a: &Vec4, b: &Vec4| -> Vec4 { Vec4::new(a.x - b.x, a.y - b.y, a.z - b.z, a.t - b.t) });
impl_op_ex!(-|a: &Vec4| -> Vec4 { Vec4::new(-a.x, -a.y, -a.z, -a.t) });
impl_op_ex_commutative!(*|a: &Vec4, b: &f64| -> Vec4 { Vec4::new(a.x * b, a.y * b, a.z * b, a.t * b) });

impl Sum for Vec4 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Vec4::default(), |acc, v| acc + v)
    }
}

impl<'a> Sum<&'a Vec4> for Vec4 {
    fn sum<I: Iterator<Item = &'a Vec4>>(iter: I) -> Self {
        iter.fold(Vec4::default(), |acc, v| acc + v)
    }
}
