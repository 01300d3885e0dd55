use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        image::{resolve_image, UploadResult},
        project::{Project, ProjectFields},
    },
    errors::AppError,
    repositories::{asset_store::AssetStore, project::ProjectRepository},
    utils::valid_uuid::valid_uuid,
};

/// Store failures that prove nothing was written. An uploaded blob can be
/// discarded after these; any other failure may have committed the record.
fn is_definite_rejection(err: &AppError) -> bool {
    matches!(
        err,
        AppError::ValidationError(_) | AppError::NotFound(_) | AppError::Conflict(_)
    )
}

pub struct ProjectHandler<R, A>
where
    R: ProjectRepository,
    A: AssetStore,
{
    pub project_repo: R,
    pub asset_store: A,
}

impl<R, A> ProjectHandler<R, A>
where
    R: ProjectRepository,
    A: AssetStore,
{
    pub fn new(project_repo: R, asset_store: A) -> Self {
        ProjectHandler { project_repo, asset_store }
    }

    /// Creates a project. `upload` is an image the request layer already stored;
    /// it is deleted again if the project is rejected.
    pub async fn create_project(
        &self,
        fields: ProjectFields,
        upload: Option<UploadResult>,
    ) -> Result<Project, AppError> {
        let fields = fields.normalized();

        if let Err(errors) = fields.validate_for_create() {
            self.discard_upload(upload.as_ref()).await;
            return Err(errors.into());
        }

        let insert = fields.into_insert(resolve_image(upload.as_ref()));

        match self.project_repo.create_project(&insert).await {
            Ok(project) => {
                info!(project_id = %project.id, has_image = project.image.is_some(), "Project created");
                Ok(project)
            }
            Err(e) => {
                if is_definite_rejection(&e) {
                    self.discard_upload(upload.as_ref()).await;
                }
                Err(e)
            }
        }
    }

    /// Applies the supplied fields to an existing project. A new image replaces
    /// the old one, whose blob is removed only once the record write succeeded.
    pub async fn update_project(
        &self,
        id: &str,
        fields: ProjectFields,
        upload: Option<UploadResult>,
    ) -> Result<Project, AppError> {
        let existing = match self.find_project(id).await {
            Ok(project) => project,
            Err(e) => {
                self.discard_upload(upload.as_ref()).await;
                return Err(e);
            }
        };

        let fields = fields.normalized();
        if let Err(errors) = fields.validate() {
            self.discard_upload(upload.as_ref()).await;
            return Err(errors.into());
        }

        let image = resolve_image(upload.as_ref());
        let replaced = match (&image, &existing.image) {
            (Some(new), Some(old)) if new.public_id != old.public_id && !old.public_id.is_empty() => {
                Some(old.public_id.clone())
            }
            _ => None,
        };

        let patch = fields.into_patch(image);

        let updated = match self.project_repo.update_project(&existing.id, &patch).await {
            Ok(project) => project,
            Err(e) => {
                if is_definite_rejection(&e) {
                    self.discard_upload(upload.as_ref()).await;
                }
                return Err(e);
            }
        };

        if let Some(old_identifier) = replaced {
            if let Err(e) = self.asset_store.delete(&old_identifier).await {
                error!(
                    project_id = %updated.id,
                    identifier = %old_identifier,
                    error = %e,
                    "Failed to delete replaced project image"
                );
            }
        }

        info!(project_id = %updated.id, "Project updated");
        Ok(updated)
    }

    /// Deletes a project. The image blob is removed on a best-effort basis and
    /// never keeps the record alive.
    pub async fn delete_project(&self, id: &str) -> Result<(), AppError> {
        let existing = self.find_project(id).await?;

        if let Some(image) = existing.image.as_ref().filter(|i| !i.public_id.is_empty()) {
            if let Err(e) = self.asset_store.delete(&image.public_id).await {
                warn!(
                    project_id = %existing.id,
                    identifier = %image.public_id,
                    error = %e,
                    "Could not delete project image, removing record anyway"
                );
            }
        }

        self.project_repo
            .delete_project(&existing.id)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound("Project not found".to_string()),
                _ => e,
            })?;

        info!(project_id = %existing.id, "Project deleted");
        Ok(())
    }

    pub async fn get_project_by_id(&self, id: &str) -> Result<Project, AppError> {
        self.find_project(id).await
    }

    pub async fn list_projects(&self, search: Option<String>) -> Result<Vec<Project>, AppError> {
        self.project_repo.list_projects(search).await
    }

    pub async fn list_featured_projects(&self, limit: i64) -> Result<Vec<Project>, AppError> {
        self.project_repo.list_featured_projects(limit).await
    }

    pub async fn list_recent_projects(&self, limit: i64) -> Result<Vec<Project>, AppError> {
        self.project_repo.list_recent_projects(limit).await
    }

    pub async fn count_projects(&self) -> Result<i64, AppError> {
        self.project_repo.count_projects().await
    }

    pub async fn check_store(&self) -> Result<(), AppError> {
        self.project_repo.check_connection().await
    }

    async fn find_project(&self, id: &str) -> Result<Project, AppError> {
        let id: Uuid = valid_uuid(id, "Project")?;

        self.project_repo
            .get_project_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
    }

    /// Compensating delete for an upload whose project was rejected. Failures
    /// are logged and never replace the original error.
    async fn discard_upload(&self, upload: Option<&UploadResult>) {
        let Some(upload) = upload else {
            return;
        };

        match self.asset_store.delete(&upload.identifier).await {
            Ok(()) => info!(identifier = %upload.identifier, "Discarded upload of rejected project"),
            Err(e) => error!(
                identifier = %upload.identifier,
                error = %e,
                "Failed to discard upload of rejected project"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use mockall::{predicate::eq, Sequence};

    use crate::{
        entities::{
            image::ImageDescriptor,
            project::{FeaturedFlag, ProjectPatch, Technologies},
        },
        errors::FieldError,
        repositories::{asset_store::MockAssetStore, project::MockProjectRepository},
    };

    fn handler(
        repo: MockProjectRepository,
        store: MockAssetStore,
    ) -> ProjectHandler<MockProjectRepository, MockAssetStore> {
        ProjectHandler::new(repo, store)
    }

    fn upload(identifier: &str) -> UploadResult {
        UploadResult {
            location: format!("https://res.cloudinary.com/demo/image/upload/{identifier}.png"),
            identifier: identifier.to_string(),
            width: Some(640),
            height: Some(480),
            encoding: Some("png".into()),
            size_bytes: Some(1024),
        }
    }

    fn stored_project(image: Option<ImageDescriptor>) -> Project {
        let created = Utc::now() - Duration::days(1);
        Project {
            id: Uuid::new_v4(),
            title: "Existing".into(),
            description: "An existing project description".into(),
            image,
            technologies: vec!["Rust".into()],
            github_url: "https://github.com/someone/existing".into(),
            live_url: String::new(),
            featured: false,
            created_at: created,
            updated_at: created,
        }
    }

    fn valid_fields() -> ProjectFields {
        ProjectFields {
            title: Some("  New project ".into()),
            description: Some("Description long enough".into()),
            technologies: Some(Technologies::Csv("Rust, actix-web".into())),
            ..ProjectFields::default()
        }
    }

    fn persisted_from(insert: &crate::entities::project::ProjectInsert) -> Project {
        Project {
            id: Uuid::new_v4(),
            title: insert.title.clone(),
            description: insert.description.clone(),
            image: insert.image.clone(),
            technologies: insert.technologies.clone(),
            github_url: insert.github_url.clone(),
            live_url: insert.live_url.clone(),
            featured: insert.featured,
            created_at: insert.created_at,
            updated_at: insert.updated_at,
        }
    }

    #[tokio::test]
    async fn create_without_file_persists_record_with_no_image() {
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        repo.expect_create_project()
            .withf(|insert| {
                insert.image.is_none()
                    && insert.title == "New project"
                    && insert.technologies == vec!["Rust".to_string(), "actix-web".to_string()]
            })
            .times(1)
            .returning(|insert| Ok(persisted_from(insert)));
        store.expect_delete().never();

        let project = handler(repo, store)
            .create_project(valid_fields(), None)
            .await
            .unwrap();

        assert!(project.image.is_none());
        assert_eq!(project.created_at, project.updated_at);
    }

    #[tokio::test]
    async fn create_with_file_attaches_resolved_descriptor() {
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        repo.expect_create_project()
            .withf(|insert| {
                insert.image.as_ref().map(|i| i.public_id.as_str()) == Some("portfolio/new")
            })
            .times(1)
            .returning(|insert| Ok(persisted_from(insert)));
        store.expect_delete().never();

        let project = handler(repo, store)
            .create_project(valid_fields(), Some(upload("portfolio/new")))
            .await
            .unwrap();

        let image = project.image.unwrap();
        assert_eq!(image.width, Some(640));
        assert_eq!(image.format.as_deref(), Some("png"));
    }

    #[tokio::test]
    async fn create_with_invalid_fields_discards_upload_before_failing() {
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        repo.expect_create_project().never();
        store
            .expect_delete()
            .withf(|identifier: &str| identifier == "portfolio/orphan")
            .times(1)
            .returning(|_| Ok(()));

        let fields = ProjectFields {
            title: Some("".into()),
            ..valid_fields()
        };

        let err = handler(repo, store)
            .create_project(fields, Some(upload("portfolio/orphan")))
            .await
            .unwrap_err();

        match err {
            AppError::ValidationError(errors) => {
                assert_eq!(errors[0].field, "title");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_compensation_does_not_mask_validation_error() {
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        repo.expect_create_project().never();
        store
            .expect_delete()
            .times(1)
            .returning(|_| Err(AppError::UpstreamStore("media host down".into())));

        let err = handler(repo, store)
            .create_project(ProjectFields::default(), Some(upload("portfolio/orphan")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn create_store_outage_keeps_upload() {
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        repo.expect_create_project()
            .times(1)
            .returning(|_| Err(AppError::UpstreamStore("connection reset".into())));
        store.expect_delete().never();

        let err = handler(repo, store)
            .create_project(valid_fields(), Some(upload("portfolio/kept")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UpstreamStore(_)));
    }

    #[tokio::test]
    async fn create_constraint_rejection_discards_upload() {
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        repo.expect_create_project().times(1).returning(|_| {
            Err(AppError::ValidationError(vec![FieldError {
                field: "title".into(),
                message: "title violates a record constraint".into(),
            }]))
        });
        store
            .expect_delete()
            .withf(|identifier: &str| identifier == "portfolio/rejected")
            .times(1)
            .returning(|_| Ok(()));

        let result = handler(repo, store)
            .create_project(valid_fields(), Some(upload("portfolio/rejected")))
            .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn update_with_only_featured_touches_nothing_else() {
        let existing = stored_project(None);
        let id = existing.id;
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        let found = existing.clone();
        repo.expect_get_project_by_id()
            .with(eq(id))
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));

        let before = existing.clone();
        repo.expect_update_project()
            .withf(move |patch_id, patch| {
                *patch_id == id
                    && *patch
                        == ProjectPatch {
                            featured: Some(true),
                            updated_at: patch.updated_at,
                            ..ProjectPatch::default()
                        }
            })
            .times(1)
            .returning(move |_, patch| {
                let mut updated = before.clone();
                updated.featured = patch.featured.unwrap_or(updated.featured);
                updated.updated_at = patch.updated_at;
                Ok(updated)
            });
        store.expect_delete().never();

        let fields = ProjectFields {
            featured: Some(FeaturedFlag::Bool(true)),
            ..ProjectFields::default()
        };

        let updated = handler(repo, store)
            .update_project(&id.to_string(), fields, None)
            .await
            .unwrap();

        assert!(updated.featured);
        assert_eq!(updated.title, existing.title);
        assert_eq!(updated.description, existing.description);
        assert_eq!(updated.technologies, existing.technologies);
        assert_eq!(updated.github_url, existing.github_url);
        assert!(updated.updated_at > existing.updated_at);
    }

    #[tokio::test]
    async fn update_deletes_old_image_only_after_successful_write() {
        let existing = stored_project(Some(ImageDescriptor::from(&upload("portfolio/old"))));
        let id = existing.id;
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();
        let mut seq = Sequence::new();

        let found = existing.clone();
        repo.expect_get_project_by_id()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(found.clone())));

        let before = existing.clone();
        repo.expect_update_project()
            .withf(|_, patch| {
                patch.image.as_ref().map(|i| i.public_id.as_str()) == Some("portfolio/new")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, patch| {
                let mut updated = before.clone();
                updated.image = patch.image.clone();
                Ok(updated)
            });

        store
            .expect_delete()
            .withf(|identifier: &str| identifier == "portfolio/old")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let updated = handler(repo, store)
            .update_project(&id.to_string(), ProjectFields::default(), Some(upload("portfolio/new")))
            .await
            .unwrap();

        assert_eq!(updated.image.unwrap().public_id, "portfolio/new");
    }

    #[tokio::test]
    async fn failed_update_write_never_deletes_old_image() {
        let existing = stored_project(Some(ImageDescriptor::from(&upload("portfolio/old"))));
        let id = existing.id;
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        let found = existing.clone();
        repo.expect_get_project_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_update_project()
            .times(1)
            .returning(|_, _| Err(AppError::UpstreamStore("write timed out".into())));
        store.expect_delete().never();

        let err = handler(repo, store)
            .update_project(&id.to_string(), ProjectFields::default(), Some(upload("portfolio/new")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UpstreamStore(_)));
    }

    #[tokio::test]
    async fn rejected_update_write_discards_new_upload_but_keeps_old() {
        let existing = stored_project(Some(ImageDescriptor::from(&upload("portfolio/old"))));
        let id = existing.id;
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        let found = existing.clone();
        repo.expect_get_project_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_update_project()
            .times(1)
            .returning(|_, _| Err(AppError::NotFound("Project not found".into())));
        store
            .expect_delete()
            .withf(|identifier: &str| identifier == "portfolio/new")
            .times(1)
            .returning(|_| Ok(()));

        let err = handler(repo, store)
            .update_project(&id.to_string(), ProjectFields::default(), Some(upload("portfolio/new")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_of_unknown_project_discards_upload() {
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        repo.expect_get_project_by_id().times(1).returning(|_| Ok(None));
        repo.expect_update_project().never();
        store
            .expect_delete()
            .withf(|identifier: &str| identifier == "portfolio/stray")
            .times(1)
            .returning(|_| Ok(()));

        let err = handler(repo, store)
            .update_project(
                &Uuid::new_v4().to_string(),
                valid_fields(),
                Some(upload("portfolio/stray")),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(msg) if msg == "Project not found"));
    }

    #[tokio::test]
    async fn update_with_malformed_id_is_not_found() {
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        repo.expect_get_project_by_id().never();
        store.expect_delete().times(1).returning(|_| Ok(()));

        let err = handler(repo, store)
            .update_project("not-a-uuid", valid_fields(), Some(upload("portfolio/stray")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn invalid_update_discards_upload_and_skips_write() {
        let existing = stored_project(None);
        let id = existing.id;
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        repo.expect_get_project_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_update_project().never();
        store
            .expect_delete()
            .withf(|identifier: &str| identifier == "portfolio/new")
            .times(1)
            .returning(|_| Ok(()));

        let fields = ProjectFields {
            live_url: Some("javascript:alert(1)".into()),
            ..ProjectFields::default()
        };

        let err = handler(repo, store)
            .update_project(&id.to_string(), fields, Some(upload("portfolio/new")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn delete_removes_record_even_when_image_delete_fails() {
        let existing = stored_project(Some(ImageDescriptor::from(&upload("portfolio/doomed"))));
        let id = existing.id;
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        repo.expect_get_project_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        store
            .expect_delete()
            .withf(|identifier: &str| identifier == "portfolio/doomed")
            .times(1)
            .returning(|_| Err(AppError::UpstreamStore("media host down".into())));
        repo.expect_delete_project()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(()));

        let result = handler(repo, store).delete_project(&id.to_string()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn delete_of_unknown_project_makes_no_other_calls() {
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        repo.expect_get_project_by_id().times(1).returning(|_| Ok(None));
        repo.expect_delete_project().never();
        store.expect_delete().never();

        let err = handler(repo, store)
            .delete_project(&Uuid::new_v4().to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn second_delete_reports_not_found() {
        let existing = stored_project(None);
        let id = existing.id;
        let mut repo = MockProjectRepository::new();
        let mut store = MockAssetStore::new();

        let mut lookups = 0;
        repo.expect_get_project_by_id().times(2).returning(move |_| {
            lookups += 1;
            if lookups == 1 {
                Ok(Some(existing.clone()))
            } else {
                Ok(None)
            }
        });
        repo.expect_delete_project().times(1).returning(|_| Ok(()));
        store.expect_delete().never();

        let handler = handler(repo, store);
        assert!(handler.delete_project(&id.to_string()).await.is_ok());

        let second = handler.delete_project(&id.to_string()).await;
        assert!(matches!(second, Err(AppError::NotFound(_))));
    }
}
