/// Quantities which are still plain `f64`s rather than `uom` `Quantity`s.

pub type Energyf64 = f64; // keV
