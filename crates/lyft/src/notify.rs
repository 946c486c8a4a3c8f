//! Desktop notifications.

use std::collections::HashSet;

/// Shows a notification. Failures are logged, never returned.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, title: &str, subtitle: &str);
}

/// `osascript` on macOS; a no-op elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNotifier;

impl Notifier for SystemNotifier {
    #[cfg(target_os = "macos")]
    fn notify(&self, message: &str, title: &str, subtitle: &str) {
        let script = applescript(message, title, subtitle);
        if let Err(e) = std::process::Command::new("osascript")
            .args(["-e", &script])
            .status()
        {
            tracing::warn!(error = %e, "notification failed");
        }
    }

    #[cfg(not(target_os = "macos"))]
    fn notify(&self, message: &str, title: &str, subtitle: &str) {
        tracing::debug!(text = message, title, subtitle, "notifications unsupported on this platform");
    }
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn applescript(message: &str, title: &str, subtitle: &str) -> String {
    let quote = |s: &str| s.replace('\\', "\\\\").replace('"', "\\\"");
    let mut script = format!("display notification \"{}\"", quote(message));
    if !title.is_empty() {
        script.push_str(&format!(" with title \"{}\"", quote(title)));
        if !subtitle.is_empty() {
            script.push_str(&format!(" subtitle \"{}\"", quote(subtitle)));
        }
    }
    script
}

/// Notifies at most once per key.
pub struct NotifyOnce<'a> {
    notifier: &'a dyn Notifier,
    seen: HashSet<String>,
}

impl<'a> NotifyOnce<'a> {
    pub fn new(notifier: &'a dyn Notifier) -> Self {
        Self {
            notifier,
            seen: HashSet::new(),
        }
    }

    /// Returns whether a notification was shown.
    pub fn notify(&mut self, key: &str, message: &str, title: &str) -> bool {
        if !self.seen.insert(key.to_string()) {
            return false;
        }
        self.notifier.notify(message, title, "");
        true
    }
}
