//! Native NetCDF access using the netcdf library.
//!
//! The netcdf library requires a file path (it wraps libnetcdf/HDF5 which need
//! file handles). When reading from bytes, we write to a temp file first.
//!
//! On Linux, we use `/dev/shm` (memory-backed tmpfs) to minimize I/O latency.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;

use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// HDF5 prints diagnostics for lookups that fail gracefully, e.g. an
/// optional attribute that is absent. Safe to call more than once.
///
/// Call early in `main()`, before any NetCDF operation.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable automatic error output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Write `data` to a temp file, run `f` on its path, then remove the file.
pub(crate) fn with_temp_file<T>(
    data: &[u8],
    f: impl FnOnce(&Path) -> NetCdfResult<T>,
) -> NetCdfResult<T> {
    let temp_file = get_optimal_temp_dir().join(generate_temp_filename());

    let mut file = std::fs::File::create(&temp_file)?;
    file.write_all(data)?;
    drop(file);

    let result = f(&temp_file);
    let _ = std::fs::remove_file(&temp_file);
    result
}

/// Open a file, mapping failures to [`NetCdfError::InvalidFormat`].
pub(crate) fn open(path: &Path) -> NetCdfResult<netcdf::File> {
    netcdf::open(path)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))
}

/// Read a variable as `f32`, flattened, with CF packing undone.
///
/// Entries equal to `_FillValue` or `missing_value` become NaN; the rest are
/// `raw * scale_factor + add_offset`.
pub(crate) fn read_unpacked(var: &netcdf::Variable) -> NetCdfResult<Vec<f32>> {
    let raw: Vec<f64> = var
        .get_values(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", var.name(), e)))?;

    let scale = get_f64_attr(var, "scale_factor").unwrap_or(1.0);
    let offset = get_f64_attr(var, "add_offset").unwrap_or(0.0);
    let fill = get_f64_attr(var, "_FillValue");
    let missing = get_f64_attr(var, "missing_value");

    Ok(raw
        .into_iter()
        .map(|v| {
            if Some(v) == fill || Some(v) == missing {
                f32::NAN
            } else {
                (v * scale + offset) as f32
            }
        })
        .collect())
}

/// Get the optimal temp directory for NetCDF file operations.
fn get_optimal_temp_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let shm_path = Path::new("/dev/shm");
        if shm_path.is_dir() {
            let test_path = shm_path.join(format!(".netcdf_test_{}", std::process::id()));
            if std::fs::write(&test_path, b"test").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return shm_path.to_path_buf();
            }
        }
    }

    std::env::temp_dir()
}

/// Unique per process, thread and call.
fn generate_temp_filename() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let pid = std::process::id();
    let tid = std::thread::current().id();
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("viirs_granule_{}_{:?}_{}.nc", pid, tid, count)
}

/// Check attribute presence without triggering HDF5 error output.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}
