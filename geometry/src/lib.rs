mod vector;

pub use vector::{Vector, Dot};
