//! SeaORM implementation of ContactRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::domain::{
    Contact, ContactPatch, ContactRepository, DomainError, NewContact, Owner, Pagination,
};
use crate::models::contact::{ActiveModel, Column, Entity as ContactEntity, Model};

impl From<Model> for Contact {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            birthday: model.birthday,
            additional_data: model.additional_data,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// SeaORM-based implementation of ContactRepository
pub struct SeaOrmContactRepository {
    db: DatabaseConnection,
}

impl SeaOrmContactRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_owned(
        txn: &DatabaseTransaction,
        owner: &Owner,
        id: i32,
    ) -> Result<Option<Model>, DomainError> {
        let contact = ContactEntity::find_by_id(id)
            .filter(Column::UserId.eq(owner.user_id))
            .one(txn)
            .await?;
        Ok(contact)
    }
}

/// Case-insensitive substring match on first name, last name or email.
/// Folding happens here rather than in SQL: SQLite's `LOWER` only folds
/// ASCII and `LIKE` would treat `%` and `_` in the term as wildcards.
fn matches_filter(contact: &Model, needle: &str) -> bool {
    [&contact.first_name, &contact.last_name, &contact.email]
        .into_iter()
        .any(|field| field.to_lowercase().contains(needle))
}

#[async_trait]
impl ContactRepository for SeaOrmContactRepository {
    async fn find_all(
        &self,
        owner: &Owner,
        filter: Option<&str>,
        page: Pagination,
    ) -> Result<Vec<Contact>, DomainError> {
        let txn = self.db.begin().await?;
        let query = ContactEntity::find()
            .filter(Column::UserId.eq(owner.user_id))
            .order_by_asc(Column::Id);

        let contacts = match filter.map(str::trim).filter(|t| !t.is_empty()) {
            Some(term) => {
                let needle = term.to_lowercase();
                let owned = query.all(&txn).await?;
                page.slice(
                    owned
                        .into_iter()
                        .filter(|c| matches_filter(c, &needle))
                        .collect(),
                )
            }
            None => query.offset(page.skip).limit(page.limit).all(&txn).await?,
        };
        txn.commit().await?;

        Ok(contacts.into_iter().map(Contact::from).collect())
    }

    async fn find_all_by_owner(&self, owner: &Owner) -> Result<Vec<Contact>, DomainError> {
        let txn = self.db.begin().await?;
        let contacts = ContactEntity::find()
            .filter(Column::UserId.eq(owner.user_id))
            .order_by_asc(Column::Id)
            .all(&txn)
            .await?;
        txn.commit().await?;

        Ok(contacts.into_iter().map(Contact::from).collect())
    }

    async fn find_by_id(&self, owner: &Owner, id: i32) -> Result<Option<Contact>, DomainError> {
        let txn = self.db.begin().await?;
        let contact = Self::find_owned(&txn, owner, id).await?;
        txn.commit().await?;

        Ok(contact.map(Contact::from))
    }

    async fn create(&self, owner: &Owner, input: NewContact) -> Result<Contact, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.db.begin().await?;

        let new_contact = ActiveModel {
            user_id: Set(owner.user_id),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            phone: Set(input.phone),
            birthday: Set(input.birthday),
            additional_data: Set(input.additional_data),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = new_contact.insert(&txn).await?;
        txn.commit().await?;

        Ok(Contact::from(result))
    }

    async fn update(
        &self,
        owner: &Owner,
        id: i32,
        patch: ContactPatch,
    ) -> Result<Contact, DomainError> {
        let txn = self.db.begin().await?;
        let existing = Self::find_owned(&txn, owner, id)
            .await?
            .ok_or(DomainError::NotFound)?;

        if patch.is_empty() {
            txn.commit().await?;
            return Ok(Contact::from(existing));
        }

        let mut active: ActiveModel = existing.into();

        if let Some(first_name) = patch.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = patch.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(email) = patch.email {
            active.email = Set(email);
        }
        if let Some(phone) = patch.phone {
            active.phone = Set(phone);
        }
        if let Some(birthday) = patch.birthday {
            active.birthday = Set(birthday);
        }
        if let Some(additional_data) = patch.additional_data {
            active.additional_data = Set(additional_data);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let result = active.update(&txn).await?;
        txn.commit().await?;

        Ok(Contact::from(result))
    }

    async fn delete(&self, owner: &Owner, id: i32) -> Result<Contact, DomainError> {
        let txn = self.db.begin().await?;
        let existing = Self::find_owned(&txn, owner, id)
            .await?
            .ok_or(DomainError::NotFound)?;

        let result = ContactEntity::delete_by_id(existing.id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }
        txn.commit().await?;

        Ok(Contact::from(existing))
    }
}
