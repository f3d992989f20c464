//! End-to-end resolution policy for a single report submission.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{LocalResolver, RemoteResolver};
use crate::catalog::SubdivisionCatalog;
use crate::config::Config;
use crate::geocoder::{GeocodeError, NominatimClient, ReverseGeocoder};
use crate::metadata;
use crate::models::{
    Coordinate, EvidenceSource, RawLocationEvidence, ResolutionResult, SubdivisionRecord,
    SubdivisionSource,
};
use crate::positioning::{LivePositionSource, PositionProvider};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// No coordinate evidence exists, so the reporter must pick a subdivision
    #[error("no location evidence; a subdivision must be selected manually")]
    ManualSubdivisionRequired,
}

/// Everything a report brings that bears on its location
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Raw photo bytes, uploaded or captured
    pub photo: Option<Vec<u8>>,
    /// Photo came from the live capture flow, so a device fix may be taken
    pub live_capture: bool,
    /// Subdivision chosen by the reporter
    pub manual_subdivision: Option<String>,
}

impl Submission {
    fn manual(&self) -> Option<&str> {
        self.manual_subdivision
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Turns a [`Submission`] into a [`ResolutionResult`].
///
/// Holds only read-only state, so one instance can serve concurrent
/// submissions.
pub struct LocationResolver<G> {
    catalog: Arc<SubdivisionCatalog>,
    local: LocalResolver,
    remote: Option<RemoteResolver<G>>,
    live: LivePositionSource,
    sentinel: Coordinate,
}

impl LocationResolver<NominatimClient> {
    /// Build from configuration, with Nominatim as the remote fallback
    /// unless it is disabled.
    pub fn from_config(
        config: &Config,
        catalog: Arc<SubdivisionCatalog>,
    ) -> Result<Self, GeocodeError> {
        let geocoder = if config.geocoder.enabled {
            Some(NominatimClient::new(&config.geocoder)?)
        } else {
            None
        };

        Ok(Self::new(
            catalog,
            geocoder,
            config.sentinel.coordinate,
            config.resolver.fallback_radius_km,
        ))
    }
}

impl<G: ReverseGeocoder> LocationResolver<G> {
    pub fn new(
        catalog: Arc<SubdivisionCatalog>,
        geocoder: Option<G>,
        sentinel: Coordinate,
        fallback_radius_km: f64,
    ) -> Self {
        Self {
            local: LocalResolver::new(Arc::clone(&catalog), fallback_radius_km),
            remote: geocoder.map(|g| RemoteResolver::new(g, Arc::clone(&catalog))),
            live: LivePositionSource::default(),
            catalog,
            sentinel,
        }
    }

    pub fn with_live_source(mut self, live: LivePositionSource) -> Self {
        self.live = live;
        self
    }

    pub fn catalog(&self) -> &SubdivisionCatalog {
        &self.catalog
    }

    pub fn sentinel(&self) -> Coordinate {
        self.sentinel
    }

    /// Resolve one submission. The only error is the missing manual
    /// subdivision when no coordinate evidence exists; every other failure
    /// degrades to an absent value.
    pub async fn resolve<P: PositionProvider>(
        &self,
        submission: Submission,
        positions: &P,
    ) -> Result<ResolutionResult, ResolveError> {
        let manual = submission.manual().map(String::from);
        let evidence = self.gather_evidence(submission, positions).await;

        let Some(coordinate) = evidence.coordinate() else {
            let manual = manual.ok_or(ResolveError::ManualSubdivisionRequired)?;
            info!(
                "No location evidence; using pending location {} with manual subdivision '{}'",
                self.sentinel, manual
            );
            return Ok(self.finish(self.sentinel, EvidenceSource::Sentinel, None, Some(manual)));
        };

        let resolved = self.resolve_subdivision(coordinate).await;
        Ok(self.finish(coordinate, evidence.source(), resolved, manual))
    }

    /// Photo metadata first; a live fix only if the photo gave nothing and
    /// the live capture flow was used.
    pub async fn gather_evidence<P: PositionProvider>(
        &self,
        submission: Submission,
        positions: &P,
    ) -> RawLocationEvidence {
        if let Some(photo) = submission.photo.filter(|p| !p.is_empty()) {
            let extracted =
                tokio::task::spawn_blocking(move || metadata::extract_coordinate(&photo)).await;
            match extracted {
                Ok(Some(coordinate)) => return RawLocationEvidence::Metadata(coordinate),
                Ok(None) => debug!("Photo carries no usable GPS"),
                Err(e) => warn!("Metadata extraction task failed: {}", e),
            }
        }

        if submission.live_capture {
            let outcome = self.live.acquire(positions).await;
            debug!("Live positioning permission: {:?}", outcome.permission);
            if let Some(coordinate) = outcome.coordinate {
                return RawLocationEvidence::Live(coordinate);
            }
        }

        RawLocationEvidence::None
    }

    /// Local catalog first; the remote geocoder only when that finds nothing.
    pub async fn resolve_subdivision(
        &self,
        coordinate: Coordinate,
    ) -> Option<(SubdivisionRecord, SubdivisionSource)> {
        if let Some(m) = self.local.resolve(&coordinate) {
            return Some((m.record.clone(), SubdivisionSource::Local));
        }

        let remote = self.remote.as_ref()?;
        remote
            .resolve(coordinate)
            .await
            .map(|m| (m.record, SubdivisionSource::Remote))
    }

    // A manual subdivision always wins and is never checked against the
    // coordinate.
    fn finish(
        &self,
        coordinate: Coordinate,
        evidence: EvidenceSource,
        resolved: Option<(SubdivisionRecord, SubdivisionSource)>,
        manual: Option<String>,
    ) -> ResolutionResult {
        let (subdivision_name, parent_region, subdivision_source) = match (manual, resolved) {
            (Some(manual), _) => match self.catalog.get(&manual) {
                Some(record) => (
                    record.name.clone(),
                    record.parent_region.clone(),
                    SubdivisionSource::Manual,
                ),
                None => (manual, String::new(), SubdivisionSource::Manual),
            },
            (None, Some((record, source))) => (record.name, record.parent_region, source),
            (None, None) => (String::new(), String::new(), SubdivisionSource::Unresolved),
        };

        let result = ResolutionResult {
            coordinate,
            subdivision_name,
            parent_region,
            has_direct_evidence: evidence.is_direct(),
            evidence,
            subdivision_source,
            resolved_at: Utc::now(),
        };

        info!(
            "Resolved {} via {:?}: subdivision '{}' ({:?})",
            result.coordinate, result.evidence, result.subdivision_name, result.subdivision_source
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoder::ReverseAddress;
    use crate::models::CENRO_OFFICE;
    use crate::positioning::{NoPositioning, PermissionState, PositionFix, ReportedPosition};
    use crate::resolver::DEFAULT_FALLBACK_RADIUS_KM;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGeocoder {
        subdivision: Option<&'static str>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl CountingGeocoder {
        fn answering(subdivision: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                subdivision,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                subdivision: None,
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ReverseGeocoder for CountingGeocoder {
        async fn reverse(&self, _coordinate: Coordinate) -> Result<ReverseAddress, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GeocodeError::Status(503));
            }
            Ok(ReverseAddress {
                municipality: Some("Manolo Fortich".to_string()),
                subdivision: self.subdivision.map(String::from),
                display_name: None,
            })
        }
    }

    fn resolver(geocoder: &Arc<CountingGeocoder>) -> LocationResolver<Arc<CountingGeocoder>> {
        LocationResolver::new(
            SubdivisionCatalog::builtin(),
            Some(Arc::clone(geocoder)),
            CENRO_OFFICE,
            DEFAULT_FALLBACK_RADIUS_KM,
        )
    }

    fn photo_at(lat: f64, lon: f64) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE1];
        bytes.extend_from_slice(
            format!(
                r#"<x:xmpmeta><rdf:Description geo:lat="{}" geo:long="{}"/></x:xmpmeta>"#,
                lat, lon
            )
            .as_bytes(),
        );
        bytes
    }

    // Cagayan de Oro, well outside every barangay of Manolo Fortich
    const FAR_AWAY: (f64, f64) = (8.4822, 124.6472);

    #[tokio::test]
    async fn test_no_evidence_uses_sentinel_and_manual() {
        let geocoder = CountingGeocoder::answering(None);
        let submission = Submission {
            manual_subdivision: Some("Alae".to_string()),
            ..Submission::default()
        };

        let result = resolver(&geocoder).resolve(submission, &NoPositioning).await.unwrap();
        assert_eq!(result.coordinate, CENRO_OFFICE);
        assert_eq!(result.subdivision_name, "Alae");
        assert_eq!(result.parent_region, "Manolo Fortich");
        assert!(!result.has_direct_evidence);
        assert_eq!(result.evidence, EvidenceSource::Sentinel);
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_evidence_requires_manual_subdivision() {
        let geocoder = CountingGeocoder::answering(None);
        let resolver = resolver(&geocoder);

        let err = resolver
            .resolve(Submission::default(), &NoPositioning)
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::ManualSubdivisionRequired);

        let blank = Submission {
            photo: Some(b"no metadata".to_vec()),
            manual_subdivision: Some("   ".to_string()),
            ..Submission::default()
        };
        assert!(resolver.resolve(blank, &NoPositioning).await.is_err());
    }

    #[tokio::test]
    async fn test_photo_gps_resolves_locally() {
        let geocoder = CountingGeocoder::answering(Some("Alae"));
        let submission = Submission {
            photo: Some(photo_at(8.3686, 124.8634)),
            ..Submission::default()
        };

        let result = resolver(&geocoder).resolve(submission, &NoPositioning).await.unwrap();
        assert_eq!(result.coordinate, Coordinate::new(8.3686, 124.8634).unwrap());
        assert_eq!(result.subdivision_name, "Tankulan (Pob.)");
        assert_eq!(result.subdivision_source, SubdivisionSource::Local);
        assert!(result.has_direct_evidence);
        assert_eq!(result.evidence, EvidenceSource::PhotoMetadata);
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_far_coordinate_falls_back_to_remote() {
        let geocoder = CountingGeocoder::answering(Some("Tankulan"));
        let submission = Submission {
            photo: Some(photo_at(FAR_AWAY.0, FAR_AWAY.1)),
            ..Submission::default()
        };

        let result = resolver(&geocoder).resolve(submission, &NoPositioning).await.unwrap();
        assert_eq!(result.subdivision_name, "Tankulan (Pob.)");
        assert_eq!(result.subdivision_source, SubdivisionSource::Remote);
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_leaves_subdivision_empty() {
        let geocoder = CountingGeocoder::failing();
        let submission = Submission {
            photo: Some(photo_at(FAR_AWAY.0, FAR_AWAY.1)),
            ..Submission::default()
        };

        let result = resolver(&geocoder).resolve(submission, &NoPositioning).await.unwrap();
        assert!(result.has_direct_evidence);
        assert_eq!(result.subdivision_name, "");
        assert_eq!(result.parent_region, "");
        assert_eq!(result.subdivision_source, SubdivisionSource::Unresolved);
        assert!(!result.is_finalizable());
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_manual_override_is_not_distance_checked() {
        let geocoder = CountingGeocoder::answering(None);
        // Photo taken in Tankulan, reporter says Dahilayan (~16 km away)
        let submission = Submission {
            photo: Some(photo_at(8.3686, 124.8634)),
            manual_subdivision: Some("dahilayan".to_string()),
            ..Submission::default()
        };

        let result = resolver(&geocoder).resolve(submission, &NoPositioning).await.unwrap();
        assert_eq!(result.coordinate.latitude(), 8.3686);
        assert_eq!(result.subdivision_name, "Dahilayan");
        assert_eq!(result.subdivision_source, SubdivisionSource::Manual);
        assert!(result.has_direct_evidence);
    }

    #[tokio::test]
    async fn test_manual_outside_catalog_is_kept_verbatim() {
        let geocoder = CountingGeocoder::answering(None);
        let submission = Submission {
            manual_subdivision: Some(" Sitio Mangima ".to_string()),
            ..Submission::default()
        };

        let result = resolver(&geocoder).resolve(submission, &NoPositioning).await.unwrap();
        assert_eq!(result.subdivision_name, "Sitio Mangima");
        assert_eq!(result.parent_region, "");
    }

    #[tokio::test]
    async fn test_live_fix_used_when_photo_has_no_gps() {
        let geocoder = CountingGeocoder::answering(None);
        let positions = ReportedPosition::new(
            PermissionState::Granted,
            Some(PositionFix::new(8.4290, 124.8140)),
        );
        let submission = Submission {
            photo: Some(b"captured frame without exif".to_vec()),
            live_capture: true,
            ..Submission::default()
        };

        let result = resolver(&geocoder).resolve(submission, &positions).await.unwrap();
        assert_eq!(result.evidence, EvidenceSource::LiveFix);
        assert_eq!(result.subdivision_name, "Alae");
        assert!(result.has_direct_evidence);
    }

    #[tokio::test]
    async fn test_live_fix_ignored_without_live_capture() {
        let geocoder = CountingGeocoder::answering(None);
        let positions = ReportedPosition::new(
            PermissionState::Granted,
            Some(PositionFix::new(8.4290, 124.8140)),
        );
        let submission = Submission {
            manual_subdivision: Some("Lingion".to_string()),
            ..Submission::default()
        };

        let result = resolver(&geocoder).resolve(submission, &positions).await.unwrap();
        assert_eq!(result.evidence, EvidenceSource::Sentinel);
        assert_eq!(result.subdivision_name, "Lingion");
    }

    #[tokio::test]
    async fn test_photo_gps_wins_over_live_fix() {
        let geocoder = CountingGeocoder::answering(None);
        let positions = ReportedPosition::new(
            PermissionState::Granted,
            Some(PositionFix::new(8.4290, 124.8140)),
        );
        let submission = Submission {
            photo: Some(photo_at(8.3686, 124.8634)),
            live_capture: true,
            ..Submission::default()
        };

        let result = resolver(&geocoder).resolve(submission, &positions).await.unwrap();
        assert_eq!(result.evidence, EvidenceSource::PhotoMetadata);
        assert_eq!(result.subdivision_name, "Tankulan (Pob.)");
    }

    #[tokio::test]
    async fn test_offline_resolver_skips_remote() {
        let resolver: LocationResolver<Arc<CountingGeocoder>> = LocationResolver::new(
            SubdivisionCatalog::builtin(),
            None,
            CENRO_OFFICE,
            DEFAULT_FALLBACK_RADIUS_KM,
        );
        let submission = Submission {
            photo: Some(photo_at(FAR_AWAY.0, FAR_AWAY.1)),
            ..Submission::default()
        };

        let result = resolver.resolve(submission, &NoPositioning).await.unwrap();
        assert_eq!(result.subdivision_source, SubdivisionSource::Unresolved);
    }

    #[test]
    fn test_from_config_respects_disabled_geocoder() {
        let mut config = Config::default();
        config.geocoder.enabled = false;
        let resolver = LocationResolver::from_config(&config, SubdivisionCatalog::builtin()).unwrap();
        assert!(resolver.remote.is_none());
        assert_eq!(resolver.sentinel(), CENRO_OFFICE);
    }
}
