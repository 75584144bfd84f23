//! Hits and the events they belong to

use geometry::Vector;
use units::{Time, ns};
use units::todo::Energyf64;

use crate::detector::Array;

/// One gamma interaction in one crystal
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// Deposited energy in keV
    pub energy: Energyf64,
    pub time: Time,
    pub position: Vector,
    pub array_number: u32,
}

impl Hit {
    /// A hit at the nominal position of crystal `array_number`. `None` if the
    /// array has no such crystal.
    pub fn in_crystal(array: &Array, array_number: u32, energy: Energyf64, time: Time) -> Option<Self> {
        let position = array.position(array_number)?;
        Some(Self { energy, time, position, array_number })
    }
}

/// Hits sharing a common trigger
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Event {
    pub hits: Vec<Hit>,
}

impl Event {
    pub fn new(hits: Vec<Hit>) -> Self { Self { hits } }

    pub fn multiplicity(&self) -> usize { self.hits.len() }

    /// Build an event from `(array number, energy in keV, time in ns)` triples
    /// on the nominal array. Hits in unknown crystals are dropped.
    pub fn from_crystals(array: &Array, hits: impl IntoIterator<Item = (u32, f64, f64)>) -> Self {
        Self::new(hits.into_iter()
                  .filter_map(|(n, e, t)| Hit::in_crystal(array, n, e, ns(t)))
                  .collect())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_crystals_are_dropped() {
        let array = Array::default();
        let event = Event::from_crystals(&array, [(1, 100.0, 0.0), (0, 200.0, 1.0), (65, 300.0, 2.0), (64, 400.0, 3.0)]);
        assert_eq!(event.multiplicity(), 2);
        let numbers: Vec<_> = event.hits.iter().map(|h| h.array_number).collect();
        assert_eq!(numbers, vec![1, 64]);
        assert_eq!(event.hits[1].position, array.position(64).unwrap());
    }
}
