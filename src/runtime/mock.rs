//! In-memory runtime used by tests.
//!
//! Responses are configured up front with the `with_*` builders and every
//! call is appended to [`MockRuntime::calls`] so tests can assert on what
//! was (or was not) asked of the runtime.

use super::{ContainerRuntime, Result};
use crate::error::RuntimeError;
use crate::types::{Container, Image};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct MockRuntime {
    pub containers: Vec<Container>,
    pub images: HashMap<String, Image>,
    pub dangling: Vec<Image>,
    /// Remote digest by image reference; missing entries fail the lookup.
    pub remote_digests: HashMap<String, String>,
    /// Image ids whose removal fails with a conflict.
    pub in_use: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.containers.push(container);
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.images.insert(image.id.clone(), image);
        self
    }

    pub fn with_dangling(mut self, image: Image) -> Self {
        self.dangling.push(image);
        self
    }

    pub fn with_remote_digest(mut self, image_ref: &str, digest: &str) -> Self {
        self.remote_digests
            .insert(image_ref.to_string(), digest.to_string());
        self
    }

    pub fn with_image_in_use(mut self, id: &str) -> Self {
        self.in_use.insert(id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls whose name starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn get_container(&self, name: &str) -> Result<Container> {
        self.record(format!("get_container {}", name));
        self.containers
            .iter()
            .find(|c| c.name == name || c.id == name)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(name.to_string()))
    }

    async fn list_containers(&self, label_filter: Option<&str>) -> Result<Vec<Container>> {
        self.record(format!("list_containers {:?}", label_filter));
        let matches = |c: &Container| match label_filter {
            None => true,
            Some(filter) => match filter.split_once('=') {
                Some((key, value)) => c.labels.get(key).map(String::as_str) == Some(value),
                None => c.labels.contains_key(filter),
            },
        };
        Ok(self.containers.iter().filter(|c| matches(c)).cloned().collect())
    }

    async fn get_image(&self, id: &str) -> Result<Image> {
        self.record(format!("get_image {}", id));
        self.images
            .get(id)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))
    }

    async fn list_dangling_images(&self) -> Result<Vec<Image>> {
        self.record("list_dangling_images".to_string());
        Ok(self.dangling.clone())
    }

    async fn registry_digest(&self, image_ref: &str) -> Result<String> {
        self.record(format!("registry_digest {}", image_ref));
        self.remote_digests
            .get(image_ref)
            .cloned()
            .ok_or_else(|| RuntimeError::Registry(format!("{}: unreachable", image_ref)))
    }

    async fn remove_image(&self, id: &str) -> Result<()> {
        self.record(format!("remove_image {}", id));
        if self.in_use.contains(id) {
            return Err(RuntimeError::Api(format!(
                "{}: image is being used by running container",
                id
            )));
        }
        let known = self.images.contains_key(id) || self.dangling.iter().any(|i| i.id == id);
        if known {
            Ok(())
        } else {
            Err(RuntimeError::NotFound(id.to_string()))
        }
    }
}
