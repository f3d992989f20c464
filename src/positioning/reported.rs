//! Providers for positions reported by a remote client.

use chrono::Utc;

use super::{FixOptions, PermissionState, PositionError, PositionFix, PositionProvider};

/// A position the client already obtained on the device and sent along
/// with the report. The permission state is whatever the client reported;
/// a prompt state is answered by the fix (or its absence).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedPosition {
    pub permission: PermissionState,
    pub fix: Option<PositionFix>,
}

impl ReportedPosition {
    pub fn new(permission: PermissionState, fix: Option<PositionFix>) -> Self {
        Self { permission, fix }
    }

    fn fix_or(&self, missing: PositionError) -> Result<PositionFix, PositionError> {
        self.fix.ok_or(missing)
    }
}

impl PositionProvider for ReportedPosition {
    async fn permission_state(&self) -> PermissionState {
        self.permission
    }

    async fn current_position(&self, options: &FixOptions) -> Result<PositionFix, PositionError> {
        let fix = self.fix_or(PositionError::Unavailable("client sent no fix".to_string()))?;

        // Fixes timestamped in the future count as fresh
        let age = (Utc::now() - fix.timestamp).to_std().unwrap_or_default();
        if age > options.maximum_age {
            return Err(PositionError::Unavailable(format!(
                "fix is {}s old, limit is {}s",
                age.as_secs(),
                options.maximum_age.as_secs()
            )));
        }
        Ok(fix)
    }

    async fn request_permission(&self, _options: &FixOptions) -> Result<PositionFix, PositionError> {
        // No fix after a prompt means the user did not allow it
        self.fix_or(PositionError::Dismissed)
    }
}

/// Provider for environments without positioning hardware
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPositioning;

impl PositionProvider for NoPositioning {
    async fn permission_state(&self) -> PermissionState {
        PermissionState::Unsupported
    }

    async fn current_position(&self, _options: &FixOptions) -> Result<PositionFix, PositionError> {
        Err(PositionError::Unavailable("positioning unsupported".to_string()))
    }

    async fn request_permission(&self, _options: &FixOptions) -> Result<PositionFix, PositionError> {
        Err(PositionError::Unavailable("positioning unsupported".to_string()))
    }
}
