//! Target directory checks.

use crate::error::{OrganizeError, OrganizeResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Resolve `path` to an absolute directory the process can read and write.
///
/// # Errors
///
/// * `NotFound` if nothing exists at `path`
/// * `NotADirectory` if it exists but is not a directory
/// * `PermissionDenied` if this process cannot read and write inside it
pub fn validate_directory(path: &Path) -> OrganizeResult<PathBuf> {
    let resolved = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(OrganizeError::NotFound {
                path: absolute_or_given(path),
            });
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            return Err(OrganizeError::PermissionDenied {
                path: absolute_or_given(path),
                reason: e.to_string(),
            });
        }
        Err(_) => {
            return Err(OrganizeError::NotFound {
                path: absolute_or_given(path),
            });
        }
    };

    let metadata = fs::metadata(&resolved).map_err(|e| OrganizeError::PermissionDenied {
        path: resolved.clone(),
        reason: e.to_string(),
    })?;

    if !metadata.is_dir() {
        return Err(OrganizeError::NotADirectory { path: resolved });
    }

    check_access(&resolved).map_err(|e| OrganizeError::PermissionDenied {
        path: resolved.clone(),
        reason: format!("need read and write access: {}", e),
    })?;

    Ok(resolved)
}

/// Ask the kernel whether this process may list, enter and modify `dir`.
#[cfg(unix)]
fn check_access(dir: &Path) -> io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(dir.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let rc = unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK | libc::X_OK) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn check_access(dir: &Path) -> io::Result<()> {
    fs::read_dir(dir)?;
    if fs::metadata(dir)?.permissions().readonly() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "directory is read-only",
        ));
    }
    Ok(())
}

fn absolute_or_given(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
