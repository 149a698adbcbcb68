use super::{ContainerRuntime, Result};
use crate::error::RuntimeError;
use crate::types::{Container, Image};
use async_trait::async_trait;
use bollard::container::ListContainersOptions;
use bollard::image::{ListImagesOptions, RemoveImageOptions};
use bollard::models::{ContainerInspectResponse, ContainerSummary, ImageInspect, ImageSummary};
use bollard::Docker;
use log::debug;
use std::collections::HashMap;

/// Timeout in seconds for socket connections.
const CONNECT_TIMEOUT: u64 = 120;

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connects to the local daemon, or to `socket` when given.
    pub fn connect(socket: Option<&str>) -> Result<Self> {
        let docker = match socket {
            Some(path) => {
                Docker::connect_with_socket(path, CONNECT_TIMEOUT, bollard::API_DEFAULT_VERSION)
                    .map_err(|e| RuntimeError::Connection(format!("{}: {}", path, e)))?
            }
            // This handles DOCKER_HOST and the unix socket on Linux.
            None => Docker::connect_with_local_defaults()
                .map_err(|e| RuntimeError::Connection(e.to_string()))?,
        };
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn get_container(&self, name: &str) -> Result<Container> {
        let detail = self
            .docker
            .inspect_container(name, None)
            .await
            .map_err(|e| RuntimeError::from_bollard(name, e))?;
        Ok(container_from_inspect(detail))
    }

    async fn list_containers(&self, label_filter: Option<&str>) -> Result<Vec<Container>> {
        let mut filters = HashMap::new();
        if let Some(label) = label_filter {
            filters.insert("label".to_string(), vec![label.to_string()]);
        }
        let opts = ListContainersOptions::<String> {
            all: true,
            filters,
            ..Default::default()
        };
        let containers = self
            .docker
            .list_containers(Some(opts))
            .await
            .map_err(|e| RuntimeError::from_bollard("containers", e))?;
        debug!("Runtime returned {} containers", containers.len());
        Ok(containers.into_iter().map(container_from_summary).collect())
    }

    async fn get_image(&self, id: &str) -> Result<Image> {
        let detail = self
            .docker
            .inspect_image(id)
            .await
            .map_err(|e| RuntimeError::from_bollard(id, e))?;
        Ok(image_from_inspect(detail, id))
    }

    async fn list_dangling_images(&self) -> Result<Vec<Image>> {
        let mut filters = HashMap::new();
        filters.insert("dangling".to_string(), vec!["true".to_string()]);
        let opts = ListImagesOptions::<String> {
            all: false,
            filters,
            ..Default::default()
        };
        let images = self
            .docker
            .list_images(Some(opts))
            .await
            .map_err(|e| RuntimeError::from_bollard("images", e))?;
        Ok(images.into_iter().map(image_from_summary).collect())
    }

    async fn registry_digest(&self, image_ref: &str) -> Result<String> {
        let inspect = self
            .docker
            .inspect_registry_image(image_ref, None)
            .await
            .map_err(|e| RuntimeError::Registry(format!("{}: {}", image_ref, e)))?;
        inspect
            .descriptor
            .digest
            .filter(|d| !d.is_empty())
            .ok_or_else(|| RuntimeError::Registry(format!("{}: descriptor has no digest", image_ref)))
    }

    async fn remove_image(&self, id: &str) -> Result<()> {
        let opts = RemoveImageOptions {
            force: false,
            noprune: false,
        };
        self.docker
            .remove_image(id, Some(opts), None)
            .await
            .map_err(|e| RuntimeError::from_bollard(id, e))?;
        Ok(())
    }
}

fn container_from_inspect(detail: ContainerInspectResponse) -> Container {
    let id = detail.id.unwrap_or_default();
    let name = detail
        .name
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.clone());
    let status = detail
        .state
        .and_then(|s| s.status)
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let labels = detail.config.and_then(|c| c.labels).unwrap_or_default();
    Container {
        id,
        name,
        status,
        labels,
        image_id: detail.image.unwrap_or_default(),
    }
}

fn container_from_summary(summary: ContainerSummary) -> Container {
    let id = summary.id.unwrap_or_default();
    let name = summary
        .names
        .as_ref()
        .and_then(|n| n.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.clone());
    Container {
        id,
        name,
        status: summary.state.unwrap_or_else(|| "unknown".to_string()),
        labels: summary.labels.unwrap_or_default(),
        image_id: summary.image_id.unwrap_or_default(),
    }
}

fn image_from_inspect(detail: ImageInspect, requested_id: &str) -> Image {
    Image {
        id: detail.id.unwrap_or_else(|| requested_id.to_string()),
        tags: detail.repo_tags.unwrap_or_default(),
        repo_digests: detail.repo_digests.unwrap_or_default(),
    }
}

fn image_from_summary(summary: ImageSummary) -> Image {
    Image {
        id: summary.id,
        tags: summary.repo_tags,
        repo_digests: summary.repo_digests,
    }
}
