//! Ctrl-C handling.
//!
//! While a session is running, Ctrl-C stops it between frames and the
//! session reports its totals. Outside a session, Ctrl-C exits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct State {
    in_session: AtomicBool,
    stop: AtomicBool,
}

#[derive(Clone, Default)]
pub struct Interrupt(Arc<State>);

/// Marks a session as running until dropped.
pub struct SessionGuard(Interrupt);

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0 .0.in_session.store(false, Ordering::SeqCst);
    }
}

impl Interrupt {
    pub fn begin_session(&self) -> SessionGuard {
        self.0.stop.store(false, Ordering::SeqCst);
        self.0.in_session.store(true, Ordering::SeqCst);
        SessionGuard(self.clone())
    }

    pub fn should_stop(&self) -> bool {
        self.0.stop.load(Ordering::SeqCst)
    }

    /// Record a Ctrl-C. Returns `false` when no session was running.
    pub fn signal(&self) -> bool {
        if self.0.in_session.load(Ordering::SeqCst) {
            self.0.stop.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }
}

/// Listen for Ctrl-C for the life of the runtime.
pub fn spawn_listener(interrupt: Interrupt) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                return;
            }
            if interrupt.signal() {
                tracing::info!("interrupt received; stopping session");
            } else {
                tracing::info!("interrupt received; exiting");
                std::process::exit(130);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_outside_session() {
        let i = Interrupt::default();
        assert!(!i.signal());
        assert!(!i.should_stop());
    }

    #[test]
    fn test_signal_inside_session() {
        let i = Interrupt::default();
        {
            let _guard = i.begin_session();
            assert!(!i.should_stop());
            assert!(i.signal());
            assert!(i.should_stop());
        }
        assert!(!i.signal());
    }

    #[test]
    fn test_new_session_clears_stop() {
        let i = Interrupt::default();
        {
            let _guard = i.begin_session();
            i.signal();
        }
        let _guard = i.begin_session();
        assert!(!i.should_stop());
    }
}
