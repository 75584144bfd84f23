//! Nominal geometry of the gamma-ray array.
//!
//! 16 clover detectors of 4 crystals each, arranged on the square faces of a
//! rhombicuboctahedron around the target. Crystals are identified by their
//! array number `4 * (detector - 1) + crystal + 1`, i.e. `1..=64`.

use geometry::Vector;
use units::{Length, degree, mm};

pub const N_DETECTORS: u32 = 16;
pub const N_CRYSTALS : u32 =  4;

/// Clover directions `(theta, phi)` in degrees, for detectors `1..=16`
const CLOVER_DIRECTIONS: [(f64, f64); N_DETECTORS as usize] = [
    // Downstream lampshade
    ( 45.0,  67.5), ( 45.0, 157.5), ( 45.0, 247.5), ( 45.0, 337.5),
    // Corona
    ( 90.0,  22.5), ( 90.0,  67.5), ( 90.0, 112.5), ( 90.0, 157.5),
    ( 90.0, 202.5), ( 90.0, 247.5), ( 90.0, 292.5), ( 90.0, 337.5),
    // Upstream lampshade
    (135.0,  67.5), (135.0, 157.5), (135.0, 247.5), (135.0, 337.5),
];

/// Lateral offset of crystal centres from the clover axis, in mm
const CRYSTAL_CENTRE: f64 = 26.0;
/// Most likely interaction depth behind the clover face, in mm
const INTERACTION_DEPTH: f64 = 45.0;

/// The array, with all clover faces at the same distance from the target.
#[derive(Clone, Copy, Debug)]
pub struct Array {
    distance: Length,
}

impl Array {

    pub fn new(distance: Length) -> Self { Self { distance } }

    pub fn array_numbers() -> impl Iterator<Item = u32> + Clone {
        1..=N_DETECTORS * N_CRYSTALS
    }

    /// Split array number into `(detector, crystal)`, with detectors counted
    /// from 1 and crystals from 0
    pub fn detector_and_crystal(array_number: u32) -> Option<(u32, u32)> {
        if !(1..=N_DETECTORS * N_CRYSTALS).contains(&array_number) { return None }
        let n = array_number - 1;
        Some((n / N_CRYSTALS + 1, n % N_CRYSTALS))
    }

    /// Most likely interaction point in crystal `array_number`, relative to
    /// the target. `None` for array numbers which do not exist.
    pub fn position(&self, array_number: u32) -> Option<Vector> {
        let (detector, crystal) = Self::detector_and_crystal(array_number)?;
        let (theta, phi) = CLOVER_DIRECTIONS[(detector - 1) as usize];
        let (theta, phi) = (degree(theta), degree(phi));
        let (c, d) = (CRYSTAL_CENTRE, INTERACTION_DEPTH);
        let shift = match crystal {
            0 => Vector::from_mm(-c,  c, d),
            1 => Vector::from_mm( c,  c, d),
            2 => Vector::from_mm( c, -c, d),
            _ => Vector::from_mm(-c, -c, d),
        };
        let shift = shift.rotate_y(theta).rotate_z(phi);
        Some(Vector::from_spherical(self.distance, theta, phi) + shift)
    }

    /// Positions of all crystals, in array number order
    pub fn positions(&self) -> Vec<Vector> {
        Self::array_numbers()
            .filter_map(|n| self.position(n))
            .collect()
    }
}

impl Default for Array {
    fn default() -> Self { Self::new(mm(145.0)) }
}
