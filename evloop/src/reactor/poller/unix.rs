use libc::{CLOCK_MONOTONIC, c_int, clock_gettime, nfds_t, poll, pollfd, timespec};
use std::io;
use std::mem;

const MICROS_PER_SEC: u64 = 1_000_000;
const NANOS_PER_MICRO: u64 = 1_000;

/// Waits for readiness on `fds` using `poll(2)`.
///
/// Returns the number of descriptors with non-zero `revents`. An
/// interrupted call is reported as [`io::ErrorKind::Interrupted`] so the
/// caller can recompute its timeout before retrying.
pub(crate) fn sys_poll(fds: &mut [pollfd], timeout_ms: c_int) -> io::Result<usize> {
    let rc = unsafe { poll(fds.as_mut_ptr(), fds.len() as nfds_t, timeout_ms) };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc as usize)
    }
}

/// Reads the monotonic clock in microseconds.
pub(crate) fn sys_monotonic_us() -> io::Result<u64> {
    let mut ts: timespec = unsafe { mem::zeroed() };

    let rc = unsafe { clock_gettime(CLOCK_MONOTONIC, &mut ts) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(timespec_to_micros(&ts))
}

/// Blocks until the monotonic clock reaches `deadline_us`.
///
/// Returns immediately for deadlines in the past. Signal interruptions
/// resume the sleep.
#[cfg(target_os = "linux")]
pub(crate) fn sys_sleep_until_us(deadline_us: u64) -> io::Result<()> {
    let ts = micros_to_timespec(deadline_us);

    loop {
        let rc = unsafe {
            libc::clock_nanosleep(CLOCK_MONOTONIC, libc::TIMER_ABSTIME, &ts, std::ptr::null_mut())
        };

        match rc {
            0 => return Ok(()),
            libc::EINTR => continue,
            errno => return Err(io::Error::from_raw_os_error(errno)),
        }
    }
}

/// Blocks until the monotonic clock reaches `deadline_us`.
///
/// Platforms without absolute `clock_nanosleep` sleep for the remaining
/// relative duration, re-checking the clock after each wake-up.
#[cfg(not(target_os = "linux"))]
pub(crate) fn sys_sleep_until_us(deadline_us: u64) -> io::Result<()> {
    loop {
        let now = sys_monotonic_us()?;
        if now >= deadline_us {
            return Ok(());
        }

        std::thread::sleep(std::time::Duration::from_micros(deadline_us - now));
    }
}

fn timespec_to_micros(ts: &timespec) -> u64 {
    (ts.tv_sec as u64) * MICROS_PER_SEC + (ts.tv_nsec as u64) / NANOS_PER_MICRO
}

#[cfg(target_os = "linux")]
fn micros_to_timespec(micros: u64) -> timespec {
    let mut ts: timespec = unsafe { mem::zeroed() };
    ts.tv_sec = (micros / MICROS_PER_SEC) as libc::time_t;
    ts.tv_nsec = ((micros % MICROS_PER_SEC) * NANOS_PER_MICRO) as libc::c_long;
    ts
}
