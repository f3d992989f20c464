//! Location resolution: local catalog matching, remote fallback, and the
//! orchestrator that sequences evidence gathering and matching.

pub mod local;
pub mod orchestrator;
pub mod remote;

pub use local::{LocalMatch, LocalResolver, MatchKind, DEFAULT_FALLBACK_RADIUS_KM};
pub use orchestrator::{LocationResolver, ResolveError, Submission};
pub use remote::{match_subdivision, RemoteMatch, RemoteResolver};
