use crate::{
    entities::contact_me::{
        ContactListQuery, ContactMeForm, ContactMeInsert, ContactMeMessage, ContactPage,
        ContactStatus, ContactStatusUpdate, Pagination,
    },
    errors::AppError,
    repositories::contact_me::ContactMeRepository,
    utils::valid_uuid::valid_uuid,
};

pub struct ContactHandler<R>
where
    R: ContactMeRepository,
{
    pub contact_repo: R,
}

impl<R> ContactHandler<R>
where
    R: ContactMeRepository,
{
    pub fn new(contact_repo: R) -> Self {
        ContactHandler { contact_repo }
    }

    /// Handles the creation of a new contact message
    pub async fn create_contact_message(&self, form: ContactMeForm) -> Result<ContactMeMessage, AppError> {
        let new_msg = ContactMeInsert::try_from(form)?;

        let contact = self.contact_repo.create_contact_message(&new_msg).await?;
        tracing::info!(contact_id = %contact.id, "Contact message stored");

        Ok(contact)
    }

    /// One page of messages, newest first, optionally filtered by status
    pub async fn list_contact_messages(&self, query: &ContactListQuery) -> Result<ContactPage, AppError> {
        let status = query.status_filter();
        let page = query.page();
        let limit = query.limit();

        let (contacts, total) = futures::try_join!(
            self.contact_repo.list_contact_messages(status, page, limit),
            self.contact_repo.count_contact_messages(status),
        )?;

        Ok(ContactPage {
            contacts,
            pagination: Pagination::new(page, limit, total),
        })
    }

    pub async fn list_recent_contact_messages(&self, limit: i64) -> Result<Vec<ContactMeMessage>, AppError> {
        self.contact_repo.list_recent_contact_messages(limit).await
    }

    pub async fn count_contact_messages(&self) -> Result<i64, AppError> {
        self.contact_repo.count_contact_messages(None).await
    }

    pub async fn update_contact_status(
        &self,
        id: &str,
        update: ContactStatusUpdate,
    ) -> Result<ContactMeMessage, AppError> {
        let status: ContactStatus = update.status.parse()?;
        let valid_id = valid_uuid(id, "Contact message")?;

        self.contact_repo.update_contact_status(&valid_id, status).await
    }

    /// Deletes a contact message by its ID
    pub async fn delete_contact_message(&self, id: &str) -> Result<(), AppError> {
        let valid_id = valid_uuid(id, "Contact message")?;

        self.contact_repo
            .delete_contact_message(&valid_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound("Contact message not found".to_string()),
                _ => e,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mockall::predicate::eq;
    use uuid::Uuid;

    use crate::repositories::contact_me::MockContactMeRepository;

    fn message(status: ContactStatus) -> ContactMeMessage {
        ContactMeMessage {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            subject: "Hello".into(),
            message: "Let's build something".into(),
            status,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_stores_normalized_message() {
        let mut repo = MockContactMeRepository::new();
        repo.expect_create_contact_message()
            .withf(|insert| insert.email == "ada@example.com" && insert.name == "Ada")
            .times(1)
            .returning(|_| Ok(message(ContactStatus::New)));

        let form = ContactMeForm {
            name: " Ada ".into(),
            email: "ADA@example.com".into(),
            subject: "Hello".into(),
            message: "Let's build something".into(),
        };

        let stored = ContactHandler::new(repo).create_contact_message(form).await.unwrap();
        assert_eq!(stored.status, ContactStatus::New);
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_the_store() {
        let mut repo = MockContactMeRepository::new();
        repo.expect_create_contact_message().never();

        let form = ContactMeForm {
            name: "".into(),
            email: "ada@example.com".into(),
            subject: "Hello".into(),
            message: "Hi".into(),
        };

        let err = ContactHandler::new(repo).create_contact_message(form).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn listing_applies_filter_and_paginates() {
        let mut repo = MockContactMeRepository::new();
        repo.expect_list_contact_messages()
            .with(eq(Some(ContactStatus::Read)), eq(2), eq(5))
            .times(1)
            .returning(|_, _, _| Ok(vec![message(ContactStatus::Read)]));
        repo.expect_count_contact_messages()
            .with(eq(Some(ContactStatus::Read)))
            .times(1)
            .returning(|_| Ok(6));

        let query = ContactListQuery {
            status: Some("read".into()),
            page: Some(2),
            limit: Some(5),
        };

        let page = ContactHandler::new(repo).list_contact_messages(&query).await.unwrap();

        assert_eq!(page.contacts.len(), 1);
        assert_eq!(page.pagination, Pagination { current: 2, pages: 2, total: 6 });
    }

    #[tokio::test]
    async fn invalid_status_is_a_validation_error() {
        let mut repo = MockContactMeRepository::new();
        repo.expect_update_contact_status().never();

        let err = ContactHandler::new(repo)
            .update_contact_status(&Uuid::new_v4().to_string(), ContactStatusUpdate { status: "spam".into() })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn deleting_unknown_message_is_not_found() {
        let mut repo = MockContactMeRepository::new();
        repo.expect_delete_contact_message()
            .times(1)
            .returning(|_| Err(AppError::NotFound("Record not found".into())));

        let err = ContactHandler::new(repo)
            .delete_contact_message(&Uuid::new_v4().to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(msg) if msg == "Contact message not found"));
    }
}
