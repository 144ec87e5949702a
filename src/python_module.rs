//! Python bindings for concurrent-bloom using PyO3

use crate::config::{DEFAULT_NUM_HASHES, DEFAULT_SEED, DEFAULT_TABLE_SIZE_BYTES};
use crate::{BloomError, ConcurrentBloomFilter, WorkerPool};
use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

fn to_py_err(err: BloomError) -> PyErr {
    match err {
        BloomError::AllocationFailure { .. } => {
            PyErr::new::<pyo3::exceptions::PyMemoryError, _>(err.to_string())
        }
        _ => PyErr::new::<pyo3::exceptions::PyValueError, _>(err.to_string()),
    }
}

/// Python wrapper for ConcurrentBloomFilter.
///
/// Each instance owns its worker pool, so changing the worker count of one
/// filter never affects another.
#[pyclass(name = "ConcurrentBloomFilter")]
struct PyConcurrentBloomFilter {
    inner: ConcurrentBloomFilter,
    pool: WorkerPool,
}

#[pymethods]
impl PyConcurrentBloomFilter {
    #[new]
    #[pyo3(signature = (
        seed = DEFAULT_SEED,
        num_hashes = DEFAULT_NUM_HASHES,
        table_size_bytes = DEFAULT_TABLE_SIZE_BYTES,
        workers = 0
    ))]
    fn new(seed: u64, num_hashes: usize, table_size_bytes: u32, workers: usize) -> PyResult<Self> {
        let inner = ConcurrentBloomFilter::with_params(seed, num_hashes, table_size_bytes)
            .map_err(to_py_err)?;
        let pool = WorkerPool::new(workers).map_err(to_py_err)?;

        Ok(PyConcurrentBloomFilter { inner, pool })
    }

    /// Replace the worker pool used by insert and contains
    fn set_worker_count(&mut self, workers: usize) -> PyResult<()> {
        self.pool = WorkerPool::new(workers).map_err(to_py_err)?;
        Ok(())
    }

    fn worker_count(&self) -> usize {
        self.pool.num_workers()
    }

    fn insert(&mut self, keys: PyReadonlyArray1<u32>) -> PyResult<()> {
        let keys = keys
            .as_slice()
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;
        self.inner.insert(keys, &self.pool);
        Ok(())
    }

    fn insert_atomic(&self, keys: PyReadonlyArray1<u32>) -> PyResult<()> {
        let keys = keys
            .as_slice()
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;
        self.inner.insert_atomic(keys, &self.pool);
        Ok(())
    }

    fn contains<'py>(
        &self,
        py: Python<'py>,
        keys: PyReadonlyArray1<u32>,
    ) -> PyResult<&'py PyArray1<bool>> {
        let keys = keys
            .as_slice()
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;
        Ok(self.inner.contains(keys, &self.pool).into_pyarray(py))
    }

    fn contains_key(&self, key: u32) -> bool {
        self.inner.contains_key(key)
    }

    fn __contains__(&self, key: u32) -> bool {
        self.inner.contains_key(key)
    }

    fn __len__(&self) -> usize {
        self.inner.len() as usize
    }

    fn fill_ratio(&self) -> f64 {
        self.inner.fill_ratio()
    }

    fn estimated_fpr(&self) -> f64 {
        self.inner.estimated_fpr()
    }

    fn table_bytes<'py>(&self, py: Python<'py>) -> &'py PyArray1<u8> {
        self.inner.as_bytes().into_pyarray(py)
    }

    fn hash_keys(&self) -> Vec<u64> {
        self.inner.hash_keys().as_slice().to_vec()
    }

    fn stats(&self) -> String {
        self.inner.stats().to_string()
    }

    fn __str__(&self) -> String {
        format!(
            "ConcurrentBloomFilter(keys={}, fill={:.6}, fpr={:.6})",
            self.inner.len(),
            self.inner.fill_ratio(),
            self.inner.estimated_fpr()
        )
    }

    fn __repr__(&self) -> String {
        let config = self.inner.config();
        format!(
            "ConcurrentBloomFilter(seed={}, num_hashes={}, table_size_bytes={})",
            config.seed, config.num_hashes, config.table_size_bytes
        )
    }
}

/// The Jenkins 96-bit mix exposed for testing hash distributions from Python
#[pyfunction]
fn mix(key: u64, input: u32) -> u32 {
    crate::hash::mix(key, input)
}

/// Python module definition
#[pymodule]
fn concurrent_bloom(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyConcurrentBloomFilter>()?;

    m.add_function(wrap_pyfunction!(mix, m)?)?;

    // Add module constants
    m.add("DEFAULT_NUM_HASHES", DEFAULT_NUM_HASHES)?;
    m.add("DEFAULT_TABLE_SIZE_BYTES", DEFAULT_TABLE_SIZE_BYTES)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
