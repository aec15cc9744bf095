use anyhow::{Result, bail};

pub fn is_root() -> bool {
    // SAFETY: geteuid never fails and has no side effects.
    unsafe { libc::geteuid() == 0 }
}

/// Radio and interface changes need root, bail out before the screen is
/// taken over.
pub fn ensure_root() -> Result<()> {
    if !is_root() {
        bail!("netman must be run as root. Try: sudo netman");
    }
    Ok(())
}
