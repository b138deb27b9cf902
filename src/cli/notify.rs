use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{debug, warn};

/// Signal that tells the parent the diff file is ready.
pub const COMPLETION_SIGNAL: Signal = Signal::SIGUSR1;

/// Send the completion signal to `pid`. Returns whether it was delivered.
///
/// A parent that has gone away is not an error for this process; the
/// published diff stays on disk for the next reader.
pub fn notify_parent(pid: i32) -> bool {
    if pid <= 0 {
        warn!(pid, "Refusing to signal a non-positive pid");
        return false;
    }
    match kill(Pid::from_raw(pid), COMPLETION_SIGNAL) {
        Ok(()) => {
            debug!(pid, signal = %COMPLETION_SIGNAL, "Parent notified");
            true
        }
        Err(e) => {
            warn!(pid, error = %e, "Cannot notify parent");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_pids_are_never_signalled() {
        // 0 and -1 would target process groups
        assert!(!notify_parent(0));
        assert!(!notify_parent(-1));
    }

    #[test]
    fn missing_process_is_reported_not_fatal() {
        // above the default pid_max on Linux
        assert!(!notify_parent(i32::MAX));
    }
}
