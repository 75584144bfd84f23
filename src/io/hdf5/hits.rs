//! Hit tables and their grouping into events

use std::path::Path;

use itertools::Itertools;

use units::ns;

use crate::detector::Array;
use crate::event::{Event, Hit};
use crate::utils::Bounds;

pub const DEFAULT_DATASET: &str = "gamma/hits";

#[derive(hdf5::H5Type, Clone, Copy, PartialEq, Debug)]
#[repr(C)]
pub struct Hdf5Hit {
    pub event_id: u32,
    pub array_number: u32,
    /// keV
    pub energy: f64,
    /// ns
    pub time: f64,
}

/// Events found in one hit table, and the number of hits which were dropped
/// because they could not be placed in the array or had a non-finite energy
/// or time.
#[derive(Clone, Debug, Default)]
pub struct EventBatch {
    pub events: Vec<Event>,
    pub n_hits: usize,
    pub n_dropped: usize,
}

pub fn read_hits(filename: &Path, dataset: &str, rows: Bounds<usize>) -> hdf5::Result<Vec<Hdf5Hit>> {
    Ok(super::read_table::<Hdf5Hit>(&filename, dataset, rows)?.to_vec())
}

/// Group consecutive rows with the same `event_id` into events. Hits in
/// crystals unknown to `array`, and hits whose energy or time is not finite,
/// are dropped and counted.
pub fn group_into_events(hits: impl IntoIterator<Item = Hdf5Hit>, array: &Array) -> EventBatch {
    let mut batch = EventBatch::default();
    let groups = hits.into_iter().group_by(|h| h.event_id);
    for (_, group) in &groups {
        let mut event = Event::default();
        for Hdf5Hit { array_number, energy, time, .. } in group {
            batch.n_hits += 1;
            if !(energy.is_finite() && time.is_finite()) {
                batch.n_dropped += 1;
                continue;
            }
            match Hit::in_crystal(array, array_number, energy, ns(time)) {
                Some(hit) => event.hits.push(hit),
                None      => batch.n_dropped += 1,
            }
        }
        batch.events.push(event);
    }
    batch
}

pub fn read_events(filename: &Path, dataset: &str, rows: Bounds<usize>, array: &Array) -> hdf5::Result<EventBatch> {
    Ok(group_into_events(read_hits(filename, dataset, rows)?, array))
}

/// Write hits to `dataset` (`group/name`) in a new file
pub fn write_hits(filename: &Path, dataset: &str, hits: &[Hdf5Hit]) -> hdf5::Result<()> {
    let file = hdf5::File::create(filename)?;
    let (group, name) = match dataset.rsplit_once('/') {
        Some((group, name)) => (file.create_group(group)?, name),
        None                => (file.group("/")?, dataset),
    };
    super::write_table(&group, name, hits, 1 << 14)?;
    Ok(())
}
