/// Read and write HDF5 tables

use std::path::Path;

use ndarray::{s, Array1};

use crate::utils::Bounds;

/// Read compound dataset `dataset` from `filename`, restricted to rows in
/// `rows`.
pub fn read_table<T: hdf5::H5Type>(filename: &dyn AsRef<Path>, dataset: &str, rows: Bounds<usize>) -> hdf5::Result<Array1<T>> {
    let file = ::hdf5::File::open(filename)?;
    let dataset = file.dataset(dataset)?;
    let Bounds { min, max } = rows;
    let data = match (min, max) {
        (None    , None    ) => dataset.read_slice_1d::<T,_>(s![  ..  ])?,
        (Some(lo), None    ) => dataset.read_slice_1d::<T,_>(s![lo..  ])?,
        (None    , Some(hi)) => dataset.read_slice_1d::<T,_>(s![  ..hi])?,
        (Some(lo), Some(hi)) => dataset.read_slice_1d::<T,_>(s![lo..hi])?,
     };
    Ok(data)
}

/// Write `data` as a new compound dataset `name` in `group`.
///
/// The dataset is chunked and resizable, so empty tables can be written too.
pub fn write_table<T: hdf5::H5Type>(group: &hdf5::Group, name: &str, data: &[T], chunk_size: usize) -> hdf5::Result<hdf5::Dataset> {
    let chunk_size = chunk_size.max(1);
    let dataset = group
        .new_dataset::<T>()
        .chunk(chunk_size)
        .shape(0..)
        .create(name)?;
    for chunk in data.chunks(chunk_size) {
        let old_size = dataset.shape()[0];
        dataset.resize(old_size + chunk.len())?;
        dataset.write_slice(chunk, old_size..)?
    }
    Ok(dataset)
}

// Specific table readers and writers
pub mod hits;
pub mod container;
