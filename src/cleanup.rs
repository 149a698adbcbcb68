//! Removal of images left behind by updates.

use crate::runtime::ContainerRuntime;
use crate::types::{short_id, CleanupReport, UpdateResult};
use log::{error, info};

/// Removes `specific_image_id`, or every dangling image when `None`.
///
/// Removal is never forced, so images still used by a container stay and
/// show up in the report's errors.  Failures never stop the remaining
/// removals.
pub async fn cleanup<R>(runtime: &R, specific_image_id: Option<&str>) -> CleanupReport
where
    R: ContainerRuntime + ?Sized,
{
    info!("Cleaning up old images");
    let mut report = CleanupReport::default();

    let targets = match specific_image_id {
        Some(id) => vec![id.to_string()],
        None => match runtime.list_dangling_images().await {
            Ok(images) if images.is_empty() => {
                info!("No dangling images to remove");
                return report;
            }
            Ok(images) => {
                info!("Found {} dangling images to remove", images.len());
                images.into_iter().map(|i| i.id).collect()
            }
            Err(e) => {
                error!("Unable to list dangling images: {}", e);
                report.errors.push((String::new(), e.to_string()));
                return report;
            }
        },
    };

    for id in targets {
        info!("  Removing image {}...", short_id(&id));
        match runtime.remove_image(&id).await {
            Ok(()) => {
                info!("  ✓ Removed");
                report.removed.push(id);
            }
            Err(e) if e.is_not_found() && specific_image_id.is_some() => {
                info!("  Image {} not found (probably already removed)", short_id(&id));
                report.already_gone.push(id);
            }
            Err(e) => {
                error!("  ✗ Error: {}", e);
                report.errors.push((id, e.to_string()));
            }
        }
    }
    report
}

/// Cleanup following an update pass.
///
/// A targeted pass (`update` set) removes only the image its container
/// was moved off, and nothing when no update happened.  A batch pass
/// sweeps all dangling images.  `None` means cleanup was skipped.
pub async fn after_pass<R>(
    runtime: &R,
    update: Option<&str>,
    updated: &[UpdateResult],
) -> Option<CleanupReport>
where
    R: ContainerRuntime + ?Sized,
{
    if update.is_none() {
        return Some(cleanup(runtime, None).await);
    }
    let Some(id) = updated
        .first()
        .and_then(|r| r.superseded_image_id.as_deref())
    else {
        info!("No containers updated, skipping cleanup");
        return None;
    };
    Some(cleanup(runtime, Some(id)).await)
}
