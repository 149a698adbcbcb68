use crate::error::RuntimeError;
use crate::types::{Container, Image};
use async_trait::async_trait;

pub mod docker;
pub use docker::DockerRuntime;

#[cfg(test)]
pub mod mock;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Access to the container runtime and the image registry behind it.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Looks up a container by name or id.
    async fn get_container(&self, name: &str) -> Result<Container>;

    /// Lists all containers, stopped ones included.  A `Some` filter is
    /// passed to the runtime as a label filter (`key` or `key=value`).
    async fn list_containers(&self, label_filter: Option<&str>) -> Result<Vec<Container>>;

    /// Looks up a local image by its exact id.
    async fn get_image(&self, id: &str) -> Result<Image>;

    /// Lists untagged images not used as a parent of any tagged image.
    async fn list_dangling_images(&self) -> Result<Vec<Image>>;

    /// Digest of the registry descriptor currently published for `image_ref`.
    async fn registry_digest(&self, image_ref: &str) -> Result<String>;

    /// Removes a local image without forcing.
    async fn remove_image(&self, id: &str) -> Result<()>;
}
