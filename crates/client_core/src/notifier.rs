use std::{
    io::Write,
    sync::{Mutex, MutexGuard},
};

/// Where response text is shown to the user. In a browser this is the modal
/// alert dialog; it returns once the user has seen the message.
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// Prints each alert on its own line of standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn alert(&self, message: &str) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        // a closed stdout leaves nobody to alert
        let _ = writeln!(out, "{message}");
        let _ = out.flush();
    }
}

/// Keeps every alert in order of display, for headless hosts.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.alerts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.lock().push(message.to_string());
    }
}
