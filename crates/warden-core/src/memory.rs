//! Memory protection for decrypted key material
//!
//! Two hardening measures:
//!
//! 1. **Core dump prevention**: `setrlimit(RLIMIT_CORE, 0)` so a crash of the
//!    keeper process never writes an unlocked secret to disk.
//!
//! 2. **Memory locking**: [`SecretBuffer`] pins its pages with `mlock()` so the
//!    OS cannot swap them out, and zeroizes them on drop.
//!
//! Both are best-effort. Failures are logged, since containers and
//! unprivileged users often cannot raise these limits.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use zeroize::Zeroize;

static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable core dumps for the current process.
///
/// Returns `true` if core dumps are (now) disabled. Idempotent.
pub fn disable_core_dumps() -> bool {
    if CORE_DUMPS_DISABLED.swap(true, Ordering::SeqCst) {
        return true;
    }

    #[cfg(unix)]
    {
        unix::disable_core_dumps_impl()
    }

    #[cfg(not(unix))]
    {
        log::warn!("Core dump prevention not supported on this platform");
        false
    }
}

/// # Safety
///
/// `ptr` must point to a live allocation of at least `len` bytes.
unsafe fn mlock(ptr: *const u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }

    #[cfg(unix)]
    {
        unix::mlock_impl(ptr, len)
    }

    #[cfg(not(unix))]
    {
        let _ = (ptr, len);
        false
    }
}

/// # Safety
///
/// `ptr` and `len` must match a previous `mlock` call.
unsafe fn munlock(ptr: *const u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }

    #[cfg(unix)]
    {
        unix::munlock_impl(ptr, len)
    }

    #[cfg(not(unix))]
    {
        let _ = (ptr, len);
        true
    }
}

/// Fixed-size secret storage: mlocked on creation, zeroized and unlocked on drop.
///
/// The contents cannot be printed; `Debug` shows only the length.
pub struct SecretBuffer {
    data: Vec<u8>,
    locked: bool,
    locked_len: usize,
}

impl SecretBuffer {
    /// Copy `secret` into a freshly locked buffer.
    pub fn from_slice(secret: &[u8]) -> Self {
        let data = secret.to_vec();
        let locked = unsafe { mlock(data.as_ptr(), data.len()) };

        if !locked {
            log::warn!(
                "Failed to mlock {} bytes of key material; it may be swappable",
                data.len()
            );
        }

        let locked_len = data.len();
        Self {
            data,
            locked,
            locked_len,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBuffer([REDACTED; {}])", self.data.len())
    }
}

impl Drop for SecretBuffer {
    fn drop(&mut self) {
        // Zeroize before unlocking
        self.data.zeroize();

        if self.locked && self.locked_len > 0 {
            unsafe {
                munlock(self.data.as_ptr(), self.locked_len);
            }
        }
    }
}

#[cfg(unix)]
mod unix {
    pub fn disable_core_dumps_impl() -> bool {
        // SAFETY: setrlimit with RLIMIT_CORE=0 is a standard POSIX operation
        unsafe {
            let rlim = libc::rlimit {
                rlim_cur: 0,
                rlim_max: 0,
            };
            if libc::setrlimit(libc::RLIMIT_CORE, &rlim) != 0 {
                log::warn!(
                    "Failed to disable core dumps: {}",
                    std::io::Error::last_os_error()
                );
                return false;
            }
        }
        true
    }

    pub unsafe fn mlock_impl(ptr: *const u8, len: usize) -> bool {
        if libc::mlock(ptr as *const libc::c_void, len) != 0 {
            log::debug!(
                "mlock failed for {} bytes: {}",
                len,
                std::io::Error::last_os_error()
            );
            return false;
        }
        true
    }

    pub unsafe fn munlock_impl(ptr: *const u8, len: usize) -> bool {
        libc::munlock(ptr as *const libc::c_void, len) == 0
    }
}
