//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};

use crate::domain::{DomainError, NewUser, User, UserRepository};
use crate::models::user::{ActiveModel, Column, Entity as UserEntity, Model};

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

/// SeaORM-based implementation of UserRepository
pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DomainError> {
        let user = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(user.map(User::from))
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, DomainError> {
        let user = UserEntity::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(user.map(|u| {
            let hash = u.password_hash.clone();
            (User::from(u), hash)
        }))
    }

    async fn create(&self, input: NewUser) -> Result<User, DomainError> {
        let txn = self.db.begin().await?;

        let taken = UserEntity::find()
            .filter(Column::Email.eq(input.email.as_str()))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(DomainError::Conflict("Account already exists".to_string()));
        }

        let user = ActiveModel {
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(input.password_hash),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let result = user.insert(&txn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                DomainError::Conflict("Account already exists".to_string())
            }
            _ => DomainError::from(e),
        })?;
        txn.commit().await?;

        Ok(User::from(result))
    }
}
