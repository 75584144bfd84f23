use std::ops::{Add, Index, Mul, Neg, Sub};
use units::{Angle, Area, Length, Ratio, mm, mm_, radian, radian_, ratio_};

/// Position of a detector element relative to the target, or the difference
/// between two such positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vector {
    pub x: Length,
    pub y: Length,
    pub z: Length,
}

pub trait Dot<RHS> {
    type Output;
    fn dot(self, other: RHS) -> Self::Output;
}

impl Dot<Vector> for Vector {
    type Output = Area;
    fn dot(self, other: Vector) -> Self::Output {
        self.x * other.x +
        self.y * other.y +
        self.z * other.z
    }
}

impl Add for Vector {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Vector {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for Vector {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Vector {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Neg for Vector {
    type Output = Self;
    fn neg(self) -> Self::Output { Vector { x: -self.x, y: -self.y, z: -self.z } }
}

impl Mul<f64> for Vector {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Vector {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl Index<usize> for Vector {
    type Output = Length;
    fn index(&self, index: usize) -> &Self::Output {
        match index {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("index {index} is out of bounds [0,2]")
        }
    }
}

impl Vector {

    pub fn new(x: Length, y: Length, z: Length) -> Self { Self { x, y, z } }

    /// Construct from `f64`s which are interpreted as lengths in `mm`
    pub fn from_mm(x: f64, y: f64, z: f64) -> Self { Self::new(mm(x), mm(y), mm(z)) }

    /// Vector of length `r` pointing in the direction given by polar angle
    /// `theta` (measured from the z-axis) and azimuth `phi`.
    pub fn from_spherical(r: Length, theta: Angle, phi: Angle) -> Self {
        let (theta, phi) = (radian_(theta), radian_(phi));
        Self::new(
            r * theta.sin() * phi.cos(),
            r * theta.sin() * phi.sin(),
            r * theta.cos(),
        )
    }

    pub fn magnitude(&self) -> Length {
        let &Self { x, y, z } = self;
        (x*x + y*y + z*z).sqrt()
    }

    /// Polar angle, measured from the z-axis.
    pub fn theta(&self) -> Angle {
        let rho = (self.x * self.x + self.y * self.y).sqrt();
        radian(mm_(rho).atan2(mm_(self.z)))
    }

    /// Azimuthal angle, measured from the x-axis.
    pub fn phi(&self) -> Angle { radian(mm_(self.y).atan2(mm_(self.x))) }

    /// Rotate about the y-axis by `angle`.
    pub fn rotate_y(self, angle: Angle) -> Self {
        let (s, c) = radian_(angle).sin_cos();
        let Self { x, y, z } = self;
        Self::new(x * c + z * s, y, z * c - x * s)
    }

    /// Rotate about the z-axis by `angle`.
    pub fn rotate_z(self, angle: Angle) -> Self {
        let (s, c) = radian_(angle).sin_cos();
        let Self { x, y, z } = self;
        Self::new(x * c - y * s, x * s + y * c, z)
    }

    /// Angle between `self` and `other`, in `[0, pi]`.
    ///
    /// Zero if either vector has zero length.
    pub fn angle(&self, other: &Self) -> Angle {
        let (a, b) = (self.magnitude(), other.magnitude());
        if mm_(a) == 0.0 || mm_(b) == 0.0 { return radian(0.0) }
        let cos: Ratio = self.dot(*other) / (a * b);
        radian(ratio_(cos).clamp(-1.0, 1.0).acos())
    }
}
