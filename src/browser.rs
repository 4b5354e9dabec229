// SPDX-License-Identifier: GPL-3.0-only

//! Browser launching for URL payloads
//!
//! A payload counts as a URL when it starts with `http`. Whether a detected
//! URL actually opens is governed by a [`UrlOpenPolicy`], so a code held in
//! front of the camera does not have to reopen the browser on every tick.

use crate::constants::URL_PREFIX;
use crate::scanner::ScanResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};

/// Check whether a payload should be treated as a URL
pub fn is_url_like(payload: &str) -> bool {
    payload.starts_with(URL_PREFIX)
}

/// Policy for opening URL payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UrlOpenPolicy {
    /// Open every URL payload on every frame it is detected in
    #[default]
    EveryDetection,
    /// Open each distinct URL once per application session
    OncePerSession,
    /// Never open URLs
    Never,
}

impl UrlOpenPolicy {
    pub const ALL: [UrlOpenPolicy; 3] = [
        UrlOpenPolicy::EveryDetection,
        UrlOpenPolicy::OncePerSession,
        UrlOpenPolicy::Never,
    ];

    /// Short name used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlOpenPolicy::EveryDetection => "always",
            UrlOpenPolicy::OncePerSession => "once",
            UrlOpenPolicy::Never => "never",
        }
    }
}

impl std::fmt::Display for UrlOpenPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UrlOpenPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UrlOpenPolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown URL policy '{}' (expected always, once or never)", s))
    }
}

/// Something that can open a URL
pub trait UrlOpener: Send {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Opens URLs in the desktop's default browser
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl UrlOpener for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        open::that_detached(url)
    }
}

/// Applies a [`UrlOpenPolicy`] to scan results
///
/// Clones share the policy and the set of opened URLs, so the capture thread
/// and the window launch against the same session.
#[derive(Clone)]
pub struct UrlLauncher {
    inner: Arc<Mutex<LauncherState>>,
}

struct LauncherState {
    policy: UrlOpenPolicy,
    opened: HashSet<String>,
    opener: Box<dyn UrlOpener>,
}

impl UrlLauncher {
    /// Launcher that opens URLs in the system browser
    pub fn new(policy: UrlOpenPolicy) -> Self {
        Self::with_opener(policy, Box::new(SystemBrowser))
    }

    pub fn with_opener(policy: UrlOpenPolicy, opener: Box<dyn UrlOpener>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LauncherState {
                policy,
                opened: HashSet::new(),
                opener,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, LauncherState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn policy(&self) -> UrlOpenPolicy {
        self.state().policy
    }

    /// Change the policy; the seen set survives so `OncePerSession` keeps its memory
    pub fn set_policy(&self, policy: UrlOpenPolicy) {
        let mut state = self.state();
        if state.policy != policy {
            info!(from = %state.policy, to = %policy, "URL open policy changed");
        }
        state.policy = policy;
    }

    /// Open the URL payloads of one scan result, returning the URLs that were opened
    pub fn launch(&self, result: &ScanResult) -> Vec<String> {
        let mut state = self.state();
        let mut launched = Vec::new();

        for payload in result.payloads().filter(|p| is_url_like(p)) {
            let should_open = match state.policy {
                UrlOpenPolicy::EveryDetection => true,
                UrlOpenPolicy::OncePerSession => state.opened.insert(payload.to_string()),
                UrlOpenPolicy::Never => false,
            };

            if !should_open {
                debug!(url = %payload, policy = %state.policy, "Skipping URL");
                continue;
            }

            info!(url = %payload, "Opening URL from barcode");
            match state.opener.open(payload) {
                Ok(()) => launched.push(payload.to_string()),
                Err(err) => error!(url = %payload, error = %err, "Failed to open URL"),
            }
        }

        launched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{BoundingRect, DecodedSymbol};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingOpener(Arc<Mutex<Vec<String>>>);

    impl UrlOpener for RecordingOpener {
        fn open(&self, url: &str) -> std::io::Result<()> {
            self.0.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn result_of(payloads: &[&str]) -> ScanResult {
        let symbols = payloads
            .iter()
            .map(|p| DecodedSymbol::new(*p, BoundingRect::new(0, 0, 10, 10)))
            .collect();
        ScanResult::from_symbols(symbols).unwrap()
    }

    #[test]
    fn test_is_url_like() {
        assert!(is_url_like("http://example.com"));
        assert!(is_url_like("https://example.com"));
        assert!(is_url_like("httpfoo"));
        assert!(!is_url_like("ABC"));
        assert!(!is_url_like(" http://example.com"));
    }

    #[test]
    fn test_every_detection_opens_each_tick() {
        let opener = RecordingOpener::default();
        let launcher =
            UrlLauncher::with_opener(UrlOpenPolicy::EveryDetection, Box::new(opener.clone()));
        let result = result_of(&["http://example.com"]);

        for _ in 0..3 {
            assert_eq!(launcher.launch(&result), vec!["http://example.com"]);
        }
        assert_eq!(opener.0.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_once_per_session_deduplicates() {
        let opener = RecordingOpener::default();
        let launcher =
            UrlLauncher::with_opener(UrlOpenPolicy::OncePerSession, Box::new(opener.clone()));

        launcher.launch(&result_of(&["http://a.example", "http://b.example"]));
        launcher.launch(&result_of(&["http://a.example"]));
        launcher.launch(&result_of(&["http://b.example", "http://c.example"]));

        assert_eq!(
            *opener.0.lock().unwrap(),
            vec!["http://a.example", "http://b.example", "http://c.example"]
        );
    }

    #[test]
    fn test_never_and_non_urls_do_not_open() {
        let opener = RecordingOpener::default();
        let launcher = UrlLauncher::with_opener(UrlOpenPolicy::Never, Box::new(opener.clone()));
        assert!(launcher.launch(&result_of(&["http://example.com"])).is_empty());

        launcher.set_policy(UrlOpenPolicy::EveryDetection);
        assert!(launcher.launch(&result_of(&["ABC"])).is_empty());
        assert!(opener.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clones_share_session() {
        let opener = RecordingOpener::default();
        let launcher =
            UrlLauncher::with_opener(UrlOpenPolicy::OncePerSession, Box::new(opener.clone()));
        let worker_side = launcher.clone();

        worker_side.launch(&result_of(&["http://a.example"]));
        launcher.launch(&result_of(&["http://a.example"]));
        assert_eq!(opener.0.lock().unwrap().len(), 1);

        launcher.set_policy(UrlOpenPolicy::Never);
        assert_eq!(worker_side.policy(), UrlOpenPolicy::Never);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("once".parse::<UrlOpenPolicy>(), Ok(UrlOpenPolicy::OncePerSession));
        assert_eq!("ALWAYS".parse::<UrlOpenPolicy>(), Ok(UrlOpenPolicy::EveryDetection));
        assert_eq!("never".parse::<UrlOpenPolicy>(), Ok(UrlOpenPolicy::Never));
        assert!("sometimes".parse::<UrlOpenPolicy>().is_err());
    }
}
