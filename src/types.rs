//! Data structures used throughout the updater.
//!
//! Containers and images are snapshots taken from the container runtime
//! at the moment they were fetched.  Nothing here is persisted: decisions
//! and outcomes live for a single pass and are handed back to the caller
//! for cleanup and the final summary.

use std::collections::HashMap;
use std::fmt;

/// Label set by compose on every container it creates for a project.
pub const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";
/// Label holding the compose service name.
pub const COMPOSE_SERVICE_LABEL: &str = "com.docker.compose.service";
/// Label holding the compose version that created the container.
pub const COMPOSE_VERSION_LABEL: &str = "com.docker.compose.version";
/// Label holding the project's working directory.
pub const COMPOSE_WORKING_DIR_LABEL: &str = "com.docker.compose.project.working_dir";
/// Label holding the delimiter-joined list of compose files.
pub const COMPOSE_CONFIG_FILES_LABEL: &str = "com.docker.compose.project.config_files";

/// Any one of these marks a container as compose-owned.
pub const COMPOSE_OWNERSHIP_LABELS: [&str; 3] = [
    COMPOSE_PROJECT_LABEL,
    COMPOSE_SERVICE_LABEL,
    COMPOSE_VERSION_LABEL,
];

/// A container as reported by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    pub name: String,
    /// Runtime state, e.g. `running`, `exited`, `created`.
    pub status: String,
    pub labels: HashMap<String, String>,
    /// Exact id of the image the container was created from.
    pub image_id: String,
}

impl Container {
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }

    /// True when at least one of the compose ownership labels is present.
    pub fn is_compose_owned(&self) -> bool {
        COMPOSE_OWNERSHIP_LABELS
            .iter()
            .any(|key| self.labels.contains_key(*key))
    }

    /// Extracts the compose identity.  `None` when the service label is
    /// missing, since a service cannot be recreated without its name.
    pub fn compose_identity(&self) -> Option<ComposeIdentity> {
        let service_name = self.labels.get(COMPOSE_SERVICE_LABEL)?.clone();
        let label = |key: &str| self.labels.get(key).cloned().unwrap_or_default();
        Some(ComposeIdentity {
            working_dir: label(COMPOSE_WORKING_DIR_LABEL),
            config_files: label(COMPOSE_CONFIG_FILES_LABEL),
            service_name,
        })
    }
}

/// A local image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub id: String,
    pub tags: Vec<String>,
    /// Entries of the form `repository@algorithm:hex`.
    pub repo_digests: Vec<String>,
}

impl Image {
    /// Reference used to pull and to query the registry.
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    /// The `algorithm:hex` part of the first repo digest.
    ///
    /// Entries without an `@` carry no comparable digest and yield `None`.
    pub fn local_digest(&self) -> Option<&str> {
        let entry = self.repo_digests.first()?;
        entry.rsplit_once('@').map(|(_, digest)| digest)
    }

    /// Id shortened the way the docker CLI displays it.
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

/// Shortens `sha256:<hex>` ids to their first 12 hex characters.
pub fn short_id(id: &str) -> &str {
    let hex = id.strip_prefix("sha256:").unwrap_or(id);
    match hex.char_indices().nth(12) {
        Some((end, _)) => &hex[..end],
        None => hex,
    }
}

/// Where a container's compose project lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeIdentity {
    /// Empty when the label is absent.
    pub working_dir: String,
    /// Raw label value; may hold several paths.
    pub config_files: String,
    pub service_name: String,
}

/// Why a decision went the way it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionReason {
    Forced,
    DigestUnavailable,
    RemoteLookupFailed(String),
    DigestMismatch { local: String, remote: String },
    UpToDate,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionReason::Forced => write!(f, "forced"),
            DecisionReason::DigestUnavailable => write!(f, "digest unavailable"),
            DecisionReason::RemoteLookupFailed(e) => write!(f, "remote lookup failed: {}", e),
            DecisionReason::DigestMismatch { local, remote } => {
                write!(f, "digest mismatch (local {}, remote {})", local, remote)
            }
            DecisionReason::UpToDate => write!(f, "up to date"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDecision {
    pub needs_update: bool,
    pub reason: DecisionReason,
}

impl UpdateDecision {
    pub fn update(reason: DecisionReason) -> Self {
        Self {
            needs_update: true,
            reason,
        }
    }

    pub fn keep(reason: DecisionReason) -> Self {
        Self {
            needs_update: false,
            reason,
        }
    }
}

/// Why a container was left alone before any update was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotComposeOwned,
    ImageNotFound,
    ImageLookupFailed(String),
    Untagged,
    MissingServiceLabel,
    /// The digest comparator decided against an update.
    NotNeeded(DecisionReason),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotComposeOwned => write!(f, "not created by Docker Compose"),
            SkipReason::ImageNotFound => write!(f, "image not found"),
            SkipReason::ImageLookupFailed(e) => write!(f, "image lookup failed: {}", e),
            SkipReason::Untagged => write!(f, "no tag"),
            SkipReason::MissingServiceLabel => {
                write!(f, "missing label {}", COMPOSE_SERVICE_LABEL)
            }
            SkipReason::NotNeeded(reason) => write!(f, "{}", reason),
        }
    }
}

/// Result of processing one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerOutcome {
    Skipped(SkipReason),
    /// The service was recreated; the previously bound image may now be
    /// unreferenced.
    Updated { superseded_image_id: String },
    Failed,
}

impl ContainerOutcome {
    pub fn superseded_image_id(&self) -> Option<&str> {
        match self {
            ContainerOutcome::Updated {
                superseded_image_id,
            } => Some(superseded_image_id),
            _ => None,
        }
    }
}

/// One entry of a pass's result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    pub container_name: String,
    pub succeeded: bool,
    pub superseded_image_id: Option<String>,
}

/// What a cleanup run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    /// Ids that were already gone when removal was attempted.
    pub already_gone: Vec<String>,
    /// `(image id, message)` for every failed removal.
    pub errors: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(pairs: &[(&str, &str)]) -> Container {
        Container {
            labels: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn any_single_ownership_label_qualifies() {
        for key in COMPOSE_OWNERSHIP_LABELS {
            assert!(labelled(&[(key, "x")]).is_compose_owned(), "{}", key);
        }
        assert!(!labelled(&[("autoupdate.enable", "true")]).is_compose_owned());
        assert!(!Container::default().is_compose_owned());
    }

    #[test]
    fn compose_identity_requires_service() {
        let c = labelled(&[(COMPOSE_PROJECT_LABEL, "web")]);
        assert_eq!(c.compose_identity(), None);

        let c = labelled(&[
            (COMPOSE_SERVICE_LABEL, "api"),
            (COMPOSE_WORKING_DIR_LABEL, "/srv/web"),
        ]);
        let identity = c.compose_identity().unwrap();
        assert_eq!(identity.service_name, "api");
        assert_eq!(identity.working_dir, "/srv/web");
        assert_eq!(identity.config_files, "");
    }

    #[test]
    fn local_digest_uses_text_after_last_at() {
        let image = Image {
            repo_digests: vec![
                "registry.local/team@web@sha256:aaa".into(),
                "other@sha256:bbb".into(),
            ],
            ..Default::default()
        };
        assert_eq!(image.local_digest(), Some("sha256:aaa"));
    }

    #[test]
    fn local_digest_absent_without_at_or_entries() {
        assert_eq!(Image::default().local_digest(), None);
        let image = Image {
            repo_digests: vec!["sha256:aaa".into()],
            ..Default::default()
        };
        assert_eq!(image.local_digest(), None);
    }

    #[test]
    fn short_id_strips_algorithm() {
        assert_eq!(short_id("sha256:0123456789abcdef"), "0123456789ab");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn status_running_only_for_running() {
        let mut c = Container {
            status: "running".into(),
            ..Default::default()
        };
        assert!(c.is_running());
        c.status = "exited".into();
        assert!(!c.is_running());
    }
}
