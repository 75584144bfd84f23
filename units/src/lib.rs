//! Physical quantities used throughout the analysis.
//!
//! Lengths, times and angles are `uom` quantities with `f64` storage. Energies
//! are plain `f64`s in keV: see [`todo`].

pub use uom;

pub use uom::si::Quantity;
pub use uom::si::f64::{Angle, Area, Length, Ratio, Time};

pub mod todo;

mod units {
  pub use uom::si::{length  ::{millimeter, centimeter},
                    time    ::{nanosecond, picosecond},
                    ratio   ::ratio,
                    angle   ::{radian, degree},
  };
}

// Making values from float literals is very long-winded, so provide some
// pithily-named convenience constructors.

/// Generate a function called NAME which returns QUANTITY by interpreting its
/// argument as UNIT
///
/// wrap!(NAME QUANTITY UNIT);
macro_rules! wrap {
  ($name:ident $quantity:ident $unit:ident ) => {
    pub fn $name(x: f64) -> $quantity { $quantity::new::<units::$unit>(x) }
  };
}

wrap!(cm     Length  centimeter);
wrap!(mm     Length  millimeter);
wrap!(ns     Time    nanosecond);
wrap!(ps     Time    picosecond);
wrap!(ratio  Ratio        ratio);
wrap!(radian Angle       radian);
wrap!(degree Angle       degree);

// Reverse direction of the above.
pub fn mm_    (x: Length) -> f64 { x.get::<units::millimeter>() }
pub fn ns_    (x: Time  ) -> f64 { x.get::<units::nanosecond>() }
pub fn ps_    (x: Time  ) -> f64 { x.get::<units::picosecond>() }
pub fn ratio_ (x: Ratio ) -> f64 { x.get::<units::ratio>() }
pub fn radian_(x: Angle ) -> f64 { x.get::<units::radian>() }
pub fn degree_(x: Angle ) -> f64 { x.get::<units::degree>() }

#[macro_export]
macro_rules! assert_uom_eq {
  ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
    float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
  };
}
