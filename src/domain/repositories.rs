//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::{DomainError, FieldError};

const MAX_NAME_LEN: usize = 50;
const MAX_PHONE_LEN: usize = 30;

/// Authenticated identity every contact operation is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub user_id: i32,
}

/// Contact data for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Contact {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[schema(value_type = String, format = Date)]
    pub birthday: NaiveDate,
    pub additional_data: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a contact
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[schema(value_type = String, format = Date)]
    pub birthday: NaiveDate,
    #[serde(default)]
    pub additional_data: Option<String>,
}

impl NewContact {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Vec::new();
        check_name("first_name", &self.first_name, &mut errors);
        check_name("last_name", &self.last_name, &mut errors);
        check_email(&self.email, &mut errors);
        check_phone(&self.phone, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }
}

/// Input for updating a contact. Absent fields keep their stored value;
/// `additional_data: null` clears the note.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct ContactPatch {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub birthday: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub additional_data: Option<Option<String>>,
}

impl ContactPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.birthday.is_none()
            && self.additional_data.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Vec::new();
        if let Some(first_name) = &self.first_name {
            check_name("first_name", first_name, &mut errors);
        }
        if let Some(last_name) = &self.last_name {
            check_name("last_name", last_name, &mut errors);
        }
        if let Some(email) = &self.email {
            check_email(email, &mut errors);
        }
        if let Some(phone) = &self.phone {
            check_phone(phone, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn check_name(field: &str, value: &str, errors: &mut Vec<FieldError>) {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, "must not be empty"));
    } else if value.chars().count() > MAX_NAME_LEN {
        errors.push(FieldError::new(
            field,
            format!("must be at most {} characters", MAX_NAME_LEN),
        ));
    }
}

fn check_email(value: &str, errors: &mut Vec<FieldError>) {
    if !is_valid_email(value) {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
}

fn check_phone(value: &str, errors: &mut Vec<FieldError>) {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new("phone", "must not be empty"));
    } else if value.chars().count() > MAX_PHONE_LEN {
        errors.push(FieldError::new(
            "phone",
            format!("must be at most {} characters", MAX_PHONE_LEN),
        ));
    }
}

/// Structural check only: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Offset pagination over an ordered result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub skip: u64,
    pub limit: u64,
}

impl Pagination {
    pub const DEFAULT_LIST_LIMIT: u64 = 100;
    pub const DEFAULT_BIRTHDAY_LIMIT: u64 = 20;

    /// Build from raw query values, rejecting `skip < 0` and `limit <= 0`.
    pub fn from_query(
        skip: Option<i64>,
        limit: Option<i64>,
        default_limit: u64,
    ) -> Result<Self, DomainError> {
        let mut errors = Vec::new();

        let skip = match skip {
            None => 0,
            Some(s) if s >= 0 => s as u64,
            Some(_) => {
                errors.push(FieldError::new("skip", "must be greater than or equal to 0"));
                0
            }
        };
        let limit = match limit {
            None => default_limit,
            Some(l) if l > 0 => l as u64,
            Some(_) => {
                errors.push(FieldError::new("limit", "must be greater than 0"));
                default_limit
            }
        };

        if errors.is_empty() {
            Ok(Self { skip, limit })
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    /// Apply to an already materialised, ordered sequence
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.skip as usize)
            .take(self.limit as usize)
            .collect()
    }
}

/// Repository trait for Contact entity. Every method is scoped to an owner;
/// rows belonging to other users behave as if they did not exist.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Owned contacts in id order, optionally filtered by name/email substring
    async fn find_all(
        &self,
        owner: &Owner,
        filter: Option<&str>,
        page: Pagination,
    ) -> Result<Vec<Contact>, DomainError>;

    /// Every contact of the owner in id order
    async fn find_all_by_owner(&self, owner: &Owner) -> Result<Vec<Contact>, DomainError>;

    /// Find an owned contact by ID
    async fn find_by_id(&self, owner: &Owner, id: i32) -> Result<Option<Contact>, DomainError>;

    /// Create a new contact
    async fn create(&self, owner: &Owner, input: NewContact) -> Result<Contact, DomainError>;

    /// Apply a partial update
    async fn update(
        &self,
        owner: &Owner,
        id: i32,
        patch: ContactPatch,
    ) -> Result<Contact, DomainError>;

    /// Hard-delete a contact, returning what was removed
    async fn delete(&self, owner: &Owner, id: i32) -> Result<Contact, DomainError>;
}

/// Registered account, as seen by the contact service
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

impl User {
    pub fn owner(&self) -> Owner {
        Owner { user_id: self.id }
    }
}

/// Input for registering a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Repository trait for User entity
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DomainError>;

    /// Find a user and their password hash by email
    async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, DomainError>;

    /// Create a new user; `Conflict` if the email is taken
    async fn create(&self, input: NewUser) -> Result<User, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_contact() -> NewContact {
        NewContact {
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: "ann@example.com".to_string(),
            phone: "555-0100".to_string(),
            birthday: NaiveDate::from_ymd_opt(1990, 4, 2).unwrap(),
            additional_data: None,
        }
    }

    #[test]
    fn accepts_well_formed_contact() {
        assert!(new_contact().validate().is_ok());
    }

    #[test]
    fn reports_every_bad_field() {
        let mut input = new_contact();
        input.first_name = "  ".to_string();
        input.email = "not-an-email".to_string();

        match input.validate() {
            Err(DomainError::Validation(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["first_name", "email"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a.b@mail.example.org"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ann@localhost"));
        assert!(!is_valid_email("ann@@example.com"));
        assert!(!is_valid_email("ann lee@example.com"));
        assert!(!is_valid_email("ann@example."));
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let absent: ContactPatch = serde_json::from_str("{}").unwrap();
        assert!(absent.is_empty());
        assert_eq!(absent.additional_data, None);

        let cleared: ContactPatch = serde_json::from_str(r#"{"additional_data": null}"#).unwrap();
        assert!(!cleared.is_empty());
        assert_eq!(cleared.additional_data, Some(None));

        let set: ContactPatch =
            serde_json::from_str(r#"{"additional_data": "met at conf"}"#).unwrap();
        assert_eq!(set.additional_data, Some(Some("met at conf".to_string())));
    }

    #[test]
    fn patch_only_validates_supplied_fields() {
        let patch = ContactPatch {
            phone: Some("555-0199".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());

        let patch = ContactPatch {
            last_name: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(patch.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn pagination_defaults_and_bounds() {
        let page = Pagination::from_query(None, None, Pagination::DEFAULT_LIST_LIMIT).unwrap();
        assert_eq!(page, Pagination { skip: 0, limit: 100 });

        assert!(Pagination::from_query(Some(-1), None, 20).is_err());
        assert!(Pagination::from_query(None, Some(0), 20).is_err());
        assert_eq!(
            Pagination::from_query(Some(3), Some(2), 20).unwrap(),
            Pagination { skip: 3, limit: 2 }
        );
    }

    #[test]
    fn slice_skips_then_limits() {
        let page = Pagination { skip: 2, limit: 2 };
        assert_eq!(page.slice(vec![1, 2, 3, 4, 5]), vec![3, 4]);

        let past_end = Pagination { skip: 10, limit: 2 };
        assert!(past_end.slice(vec![1, 2, 3]).is_empty());
    }
}
