//! Live device positioning.
//!
//! The device API is abstracted behind [`PositionProvider`]; the
//! [`LivePositionSource`] applies the permission protocol and the
//! timeout/fix-reuse policy on top of it.

mod reported;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::Coordinate;

pub use reported::{NoPositioning, ReportedPosition};

/// Permission state as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    Granted,
    /// Not decided yet; asking will prompt the user
    Prompt,
    Denied,
    /// Device has no positioning capability
    Unsupported,
}

/// Fix request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// How old a cached fix may be and still be reused
    pub maximum_age: Duration,
}

impl FixOptions {
    /// Used when permission is already granted
    pub fn granted() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(30),
        }
    }

    /// Used for the fix taken as part of the permission prompt
    pub fn prompt() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Raw fix from the device, not yet validated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in metres, when known
    pub accuracy_m: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PositionError {
    #[error("positioning permission denied")]
    PermissionDenied,

    /// The user closed the prompt without answering
    #[error("permission prompt dismissed")]
    Dismissed,

    #[error("no fix within {0:?}")]
    Timeout(Duration),

    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// Device positioning primitives.
pub trait PositionProvider: Send + Sync {
    fn permission_state(&self) -> impl Future<Output = PermissionState> + Send;

    /// Request a fix; only valid once permission is granted.
    fn current_position(
        &self,
        options: &FixOptions,
    ) -> impl Future<Output = Result<PositionFix, PositionError>> + Send;

    /// Prompt for permission. The fix is taken within the same user
    /// gesture, so a successful prompt yields a position.
    fn request_permission(
        &self,
        options: &FixOptions,
    ) -> impl Future<Output = Result<PositionFix, PositionError>> + Send;
}

/// Result of a live acquisition attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveOutcome {
    pub coordinate: Option<Coordinate>,
    pub permission: PermissionState,
}

impl LiveOutcome {
    fn absent(permission: PermissionState) -> Self {
        Self {
            coordinate: None,
            permission,
        }
    }
}

/// Permission-gated live position acquisition
#[derive(Debug, Clone, Copy)]
pub struct LivePositionSource {
    granted: FixOptions,
    prompt: FixOptions,
}

impl Default for LivePositionSource {
    fn default() -> Self {
        Self::new(FixOptions::granted(), FixOptions::prompt())
    }
}

impl LivePositionSource {
    pub fn new(granted: FixOptions, prompt: FixOptions) -> Self {
        Self { granted, prompt }
    }

    /// Acquire a coordinate from the device. Never fails: every error
    /// becomes an absent coordinate with the resulting permission state.
    pub async fn acquire<P: PositionProvider>(&self, provider: &P) -> LiveOutcome {
        let state = provider.permission_state().await;
        debug!("Positioning permission state: {:?}", state);

        match state {
            PermissionState::Granted => {
                let fix = bounded(self.granted, provider.current_position(&self.granted)).await;
                match fix {
                    Ok(fix) => LiveOutcome {
                        coordinate: validate_fix(&fix),
                        permission: PermissionState::Granted,
                    },
                    Err(e) => {
                        warn!("Live fix failed: {}", e);
                        LiveOutcome::absent(PermissionState::Granted)
                    }
                }
            }
            PermissionState::Prompt => {
                let fix = bounded(self.prompt, provider.request_permission(&self.prompt)).await;
                match fix {
                    Ok(fix) => {
                        info!("Positioning permission granted");
                        LiveOutcome {
                            coordinate: validate_fix(&fix),
                            permission: PermissionState::Granted,
                        }
                    }
                    Err(PositionError::PermissionDenied) | Err(PositionError::Dismissed) => {
                        info!("Positioning permission refused");
                        LiveOutcome::absent(PermissionState::Denied)
                    }
                    Err(e) => {
                        warn!("Permission prompt produced no fix: {}", e);
                        LiveOutcome::absent(PermissionState::Prompt)
                    }
                }
            }
            PermissionState::Denied | PermissionState::Unsupported => {
                LiveOutcome::absent(PermissionState::Denied)
            }
        }
    }
}

/// Bound a provider call by the option's timeout even if the provider
/// ignores it.
async fn bounded<F>(options: FixOptions, fut: F) -> Result<PositionFix, PositionError>
where
    F: Future<Output = Result<PositionFix, PositionError>>,
{
    match tokio::time::timeout(options.timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(PositionError::Timeout(options.timeout)),
    }
}

fn validate_fix(fix: &PositionFix) -> Option<Coordinate> {
    let coordinate = Coordinate::new(fix.latitude, fix.longitude);
    if coordinate.is_none() {
        debug!(
            "Discarding invalid live fix ({}, {})",
            fix.latitude, fix.longitude
        );
    }
    coordinate
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedProvider {
        state: PermissionState,
        current: Result<PositionFix, PositionError>,
        prompt: Result<PositionFix, PositionError>,
        hang: bool,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(state: PermissionState) -> Self {
            Self {
                state,
                current: Ok(PositionFix::new(8.3686, 124.8634)),
                prompt: Ok(PositionFix::new(8.4290, 124.8140)),
                hang: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PositionProvider for ScriptedProvider {
        async fn permission_state(&self) -> PermissionState {
            self.state
        }

        async fn current_position(&self, options: &FixOptions) -> Result<PositionFix, PositionError> {
            assert_eq!(*options, FixOptions::granted());
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.current.clone()
        }

        async fn request_permission(&self, options: &FixOptions) -> Result<PositionFix, PositionError> {
            assert_eq!(options.timeout, Duration::from_secs(15));
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.prompt.clone()
        }
    }

    #[tokio::test]
    async fn test_granted_returns_fix() {
        let provider = ScriptedProvider::new(PermissionState::Granted);
        let outcome = LivePositionSource::default().acquire(&provider).await;
        assert_eq!(outcome.permission, PermissionState::Granted);
        assert_eq!(outcome.coordinate.unwrap().latitude(), 8.3686);
    }

    #[tokio::test]
    async fn test_granted_failure_keeps_permission() {
        let mut provider = ScriptedProvider::new(PermissionState::Granted);
        provider.current = Err(PositionError::Unavailable("no satellites".into()));
        let outcome = LivePositionSource::default().acquire(&provider).await;
        assert_eq!(outcome, LiveOutcome::absent(PermissionState::Granted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_provider_times_out() {
        let mut provider = ScriptedProvider::new(PermissionState::Granted);
        provider.hang = true;
        let outcome = LivePositionSource::default().acquire(&provider).await;
        assert_eq!(outcome, LiveOutcome::absent(PermissionState::Granted));
    }

    #[tokio::test]
    async fn test_prompt_success_grants() {
        let provider = ScriptedProvider::new(PermissionState::Prompt);
        let outcome = LivePositionSource::default().acquire(&provider).await;
        assert_eq!(outcome.permission, PermissionState::Granted);
        assert_eq!(outcome.coordinate.unwrap().latitude(), 8.429);
    }

    #[tokio::test]
    async fn test_prompt_dismissal_is_denial() {
        let mut provider = ScriptedProvider::new(PermissionState::Prompt);
        provider.prompt = Err(PositionError::Dismissed);
        let outcome = LivePositionSource::default().acquire(&provider).await;
        assert_eq!(outcome, LiveOutcome::absent(PermissionState::Denied));
    }

    #[tokio::test]
    async fn test_prompt_failure_keeps_prompt() {
        for error in [
            PositionError::Timeout(Duration::from_secs(15)),
            PositionError::Unavailable("no satellites".into()),
        ] {
            let mut provider = ScriptedProvider::new(PermissionState::Prompt);
            provider.prompt = Err(error);
            let outcome = LivePositionSource::default().acquire(&provider).await;
            assert_eq!(outcome, LiveOutcome::absent(PermissionState::Prompt));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_prompt_keeps_prompt() {
        let mut provider = ScriptedProvider::new(PermissionState::Prompt);
        provider.hang = true;
        let outcome = LivePositionSource::default().acquire(&provider).await;
        assert_eq!(outcome, LiveOutcome::absent(PermissionState::Prompt));
    }

    #[tokio::test]
    async fn test_denied_never_touches_device() {
        for state in [PermissionState::Denied, PermissionState::Unsupported] {
            let provider = ScriptedProvider::new(state);
            let outcome = LivePositionSource::default().acquire(&provider).await;
            assert_eq!(outcome, LiveOutcome::absent(PermissionState::Denied));
            assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_null_island_fix_is_discarded() {
        let mut provider = ScriptedProvider::new(PermissionState::Granted);
        provider.current = Ok(PositionFix::new(0.0, 0.0));
        let outcome = LivePositionSource::default().acquire(&provider).await;
        assert_eq!(outcome, LiveOutcome::absent(PermissionState::Granted));
    }
}
