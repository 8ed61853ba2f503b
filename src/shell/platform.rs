//! Platform-specific helpers.

use std::io;
use std::process::Child;

/// Script suffix for vendor CLIs under `${KCBASE}/bin`.
pub fn cli_suffix() -> &'static str {
    if cfg!(target_os = "windows") {
        "bat"
    } else {
        "sh"
    }
}

/// Check if running in a CI environment.
///
/// Used to force non-interactive output in `main()`.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}

/// Check if running as root/admin.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() is a simple syscall that returns the effective user ID
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Ask a child process to exit.
///
/// Sends SIGTERM on unix so the server can shut down cleanly; elsewhere
/// falls back to a hard kill.
pub fn terminate(child: &mut Child) -> io::Result<()> {
    #[cfg(unix)]
    {
        let pid = child.id() as libc::pid_t;
        // SAFETY: kill() with a pid we own and a valid signal number
        let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(unix))]
    {
        child.kill()
    }
}
