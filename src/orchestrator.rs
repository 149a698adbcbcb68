//! Update pass over compose-owned containers.
//!
//! Each container goes through a short guarded pipeline: ownership check,
//! bound image lookup, tag lookup, staleness decision, recreate.  Any step
//! may end the pipeline for that container; none of them stops the pass.

use crate::compose::ComposeUpdater;
use crate::digest;
use crate::process::CommandRunner;
use crate::runtime::ContainerRuntime;
use crate::types::{Container, ContainerOutcome, SkipReason, UpdateResult};
use log::{error, info, warn};

pub struct Orchestrator<R, C> {
    runtime: R,
    compose: ComposeUpdater<C>,
}

impl<R: ContainerRuntime, C: CommandRunner> Orchestrator<R, C> {
    pub fn new(runtime: R, compose: ComposeUpdater<C>) -> Self {
        Self { runtime, compose }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    #[cfg(test)]
    pub fn compose(&self) -> &ComposeUpdater<C> {
        &self.compose
    }

    /// Checks one container and updates it when its image is stale.
    ///
    /// `force` skips the digest comparison but not the ownership check.
    pub async fn process_one(&self, container: &Container, force: bool) -> ContainerOutcome {
        if !container.is_compose_owned() {
            info!("Skip {}: not created by Docker Compose", container.name);
            return ContainerOutcome::Skipped(SkipReason::NotComposeOwned);
        }

        // The bound id, not the configured reference: the tag may already
        // point at a newer local image than the one this container runs.
        let image = match self.runtime.get_image(&container.image_id).await {
            Ok(image) => image,
            Err(e) if e.is_not_found() => {
                warn!("Skip {}: image not found", container.name);
                return ContainerOutcome::Skipped(SkipReason::ImageNotFound);
            }
            Err(e) => {
                warn!("Skip {}: {}", container.name, e);
                return ContainerOutcome::Skipped(SkipReason::ImageLookupFailed(e.to_string()));
            }
        };

        let Some(image_ref) = image.primary_tag() else {
            warn!("Skip {}: no tag", container.name);
            return ContainerOutcome::Skipped(SkipReason::Untagged);
        };

        let state = if container.is_running() {
            "running".to_string()
        } else {
            format!("stopped ({})", container.status)
        };
        info!("Container: {} [{}]", container.name, state);
        info!("  Image: {} ({})", image_ref, image.short_id());

        let decision = digest::decide(&self.runtime, container, &image, force).await;
        if !decision.needs_update {
            return ContainerOutcome::Skipped(SkipReason::NotNeeded(decision.reason));
        }

        let Some(identity) = container.compose_identity() else {
            warn!("Skip {}: no compose service label", container.name);
            return ContainerOutcome::Skipped(SkipReason::MissingServiceLabel);
        };

        let updated = self
            .compose
            .apply(
                &identity.working_dir,
                &identity.config_files,
                image_ref,
                &identity.service_name,
                container.is_running(),
            )
            .await;

        if updated {
            info!("  ✓ Updated {}", container.name);
            ContainerOutcome::Updated {
                superseded_image_id: container.image_id.clone(),
            }
        } else {
            error!("  ✗ Update of {} failed", container.name);
            ContainerOutcome::Failed
        }
    }

    /// Runs one pass and returns the successfully updated containers.
    ///
    /// With `single` set only that container is considered; without
    /// `force` it must carry the filter label's key with value `true`.
    pub async fn run(&self, label: &str, single: Option<&str>, force: bool) -> Vec<UpdateResult> {
        match single {
            Some(name) => self.run_single(label, name, force).await,
            None => self.run_batch(label, force).await,
        }
    }

    async fn run_single(&self, label: &str, name: &str, force: bool) -> Vec<UpdateResult> {
        info!("Single-container update mode: {} (force: {})", name, force);

        let container = match self.runtime.get_container(name).await {
            Ok(c) => c,
            Err(e) if e.is_not_found() => {
                error!("Container '{}' not found", name);
                return Vec::new();
            }
            Err(e) => {
                error!("Unable to inspect container '{}': {}", name, e);
                return Vec::new();
            }
        };

        if !force {
            let key = label_key(label);
            if container.labels.get(key).map(String::as_str) != Some("true") {
                error!("Container '{}' does not have label '{}=true'", name, key);
                error!("Use --force to update anyway");
                return Vec::new();
            }
        }

        let outcome = self.process_one(&container, force).await;
        collect(&container, outcome).into_iter().collect()
    }

    async fn run_batch(&self, label: &str, force: bool) -> Vec<UpdateResult> {
        let filter = if force { None } else { Some(label) };
        let containers = match self.runtime.list_containers(filter).await {
            Ok(list) => list,
            Err(e) => {
                error!("Unable to list containers: {}", e);
                return Vec::new();
            }
        };
        info!("Found {} containers to check (force: {})", containers.len(), force);

        let mut results = Vec::new();
        for container in &containers {
            let outcome = self.process_one(container, force).await;
            results.extend(collect(container, outcome));
        }
        results
    }
}

/// Key part of a `key=value` label filter.
fn label_key(label: &str) -> &str {
    label.split_once('=').map_or(label, |(key, _)| key)
}

fn collect(container: &Container, outcome: ContainerOutcome) -> Option<UpdateResult> {
    let superseded = outcome.superseded_image_id()?.to_string();
    Some(UpdateResult {
        container_name: container.name.clone(),
        succeeded: true,
        superseded_image_id: Some(superseded),
    })
}
