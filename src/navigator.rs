//! The navigation capability the client escalates authentication failures to.

use std::sync::Mutex;

/// Default path of the login entry point.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Something that can send the user back to the login entry point.
pub trait Navigator: Send + Sync {
    /// Navigate to `login_path`.
    fn go_to_login(&self, login_path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn go_to_login(&self, login_path: &str) {
        self(login_path)
    }
}

/// A navigator that only logs the redirect.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn go_to_login(&self, login_path: &str) {
        tracing::warn!(login_path, "session expired; redirecting to login");
    }
}

/// A navigator that remembers every redirect it was asked to perform.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Create a navigator with no recorded visits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths visited so far, in order.
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of redirects so far.
    pub fn count(&self) -> usize {
        self.visits.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to_login(&self, login_path: &str) {
        self.visits
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(login_path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn recording_navigator_records() {
        let navigator = RecordingNavigator::new();
        navigator.go_to_login(DEFAULT_LOGIN_PATH);
        navigator.go_to_login("/admin/login");
        assert_eq!(navigator.count(), 2);
        assert_eq!(navigator.visits(), vec!["/login", "/admin/login"]);
    }

    #[test]
    fn log_navigator_is_a_navigator() {
        let navigator: &dyn Navigator = &LogNavigator;
        navigator.go_to_login(DEFAULT_LOGIN_PATH);
    }

    #[test]
    fn closures_navigate() {
        let calls = AtomicUsize::new(0);
        let navigator = |_: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
        };
        navigator.go_to_login(DEFAULT_LOGIN_PATH);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
