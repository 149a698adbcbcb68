//! Staleness check.
//!
//! A container is stale when the digest recorded for its bound image
//! differs from the digest the registry currently serves for the image's
//! tag.  Tags alone say nothing: `:latest` can point at a new manifest
//! without the local tag changing.

use crate::runtime::ContainerRuntime;
use crate::types::{Container, DecisionReason, Image, UpdateDecision};
use log::{info, warn};

/// Decides whether `container`, bound to `image`, should be updated.
///
/// Digests are compared as plain strings.  Missing local digests and
/// failed registry lookups never count as stale.
pub async fn decide<R>(runtime: &R, container: &Container, image: &Image, force: bool) -> UpdateDecision
where
    R: ContainerRuntime + ?Sized,
{
    if force {
        info!("  {}: forced update", container.name);
        return UpdateDecision::update(DecisionReason::Forced);
    }

    let Some(local) = image.local_digest() else {
        warn!("  {}: no local repo digest found", container.name);
        return UpdateDecision::keep(DecisionReason::DigestUnavailable);
    };
    let Some(tag) = image.primary_tag() else {
        warn!("  {}: image has no tag to query", container.name);
        return UpdateDecision::keep(DecisionReason::DigestUnavailable);
    };

    let remote = match runtime.registry_digest(tag).await {
        Ok(d) => d,
        Err(e) => {
            warn!("  {}: cannot retrieve remote digest: {}", container.name, e);
            return UpdateDecision::keep(DecisionReason::RemoteLookupFailed(e.to_string()));
        }
    };

    if local != remote {
        info!("  {}: digest mismatch, update needed", container.name);
        UpdateDecision::update(DecisionReason::DigestMismatch {
            local: local.to_string(),
            remote,
        })
    } else {
        info!("  {}: already up to date", container.name);
        UpdateDecision::keep(DecisionReason::UpToDate)
    }
}
