//! Open-file descriptor limit tuning.
//!
//! Some systems (macOS, Solaris, Cygwin) start processes with a soft
//! `RLIMIT_NOFILE` of 256, which a node opening many sockets at once can
//! exhaust. This runs once at startup, before any discovery.

use crate::utils::Result;

/// Outcome of [`raise_nofile_limit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitAdjustment {
    /// The soft limit was already high enough
    Unchanged {
        /// Current soft limit
        soft: u64,
    },
    /// The soft limit was raised
    Raised {
        /// Soft limit before
        from: u64,
        /// Soft limit after
        to: u64,
    },
    /// No candidate value was accepted by the kernel
    Rejected {
        /// Soft limit left in place
        soft: u64,
    },
    /// The platform has no `RLIMIT_NOFILE`
    Unsupported,
}

/// Raises the soft open-file limit if it is below `min`.
///
/// A finite hard limit below one million is used as the new soft limit.
/// Otherwise "unlimited" is tried first (accepted by BSDs), then 10240 and
/// finally 3200 for systems that silently ignore the unlimited request.
#[cfg(unix)]
#[allow(unsafe_code)]
pub fn raise_nofile_limit(min: u64) -> Result<LimitAdjustment> {
    let current = get_nofile()?;
    let soft = current.rlim_cur as u64;
    if soft >= min {
        return Ok(LimitAdjustment::Unchanged { soft });
    }

    let hard = current.rlim_max;
    let candidates: Vec<libc::rlim_t> = if hard != libc::RLIM_INFINITY && (hard as u64) < 1_000_000 {
        vec![hard]
    } else {
        vec![libc::RLIM_INFINITY, 10240, 3200]
    };

    for candidate in candidates {
        let wanted = libc::rlimit {
            rlim_cur: candidate,
            rlim_max: hard,
        };
        // SAFETY: `wanted` is a fully initialised rlimit living on the stack.
        let rc = unsafe { libc::setrlimit(libc::RLIMIT_NOFILE, &wanted) };
        if rc != 0 {
            log::debug!(
                "setrlimit(RLIMIT_NOFILE, {}) rejected: {}",
                candidate,
                std::io::Error::last_os_error()
            );
            continue;
        }

        let after = get_nofile()?.rlim_cur as u64;
        if after > soft {
            return Ok(LimitAdjustment::Raised { from: soft, to: after });
        }
    }

    log::warn!("unable to raise RLIMIT_NOFILE above {}", soft);
    Ok(LimitAdjustment::Rejected { soft })
}

/// Descriptor limits are not tunable this way on this platform.
#[cfg(not(unix))]
pub fn raise_nofile_limit(_min: u64) -> Result<LimitAdjustment> {
    Ok(LimitAdjustment::Unsupported)
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn get_nofile() -> Result<libc::rlimit> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: getrlimit only writes into the provided struct.
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(limit)
}
