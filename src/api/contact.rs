//! Contact API handlers
//!
//! Each handler resolves the caller, hands the owner to the contact service
//! explicitly, and maps the result. Rate limiting has already run by the
//! time any of these are invoked.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::error::{ApiError, ValidJson, ValidPath, ValidQuery};
use crate::domain::{Contact, ContactPatch, NewContact, Pagination};
use crate::infrastructure::auth::CurrentUser;
use crate::infrastructure::AppState;
use crate::services::contact_service;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContactsQuery {
    /// Case-insensitive match on first name, last name or email
    pub filter: Option<String>,
    /// Rows to skip (default 0)
    pub skip: Option<i64>,
    /// Maximum rows to return (default 100)
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BirthdaysQuery {
    /// Rows to skip (default 0)
    pub skip: Option<i64>,
    /// Maximum rows to return (default 20)
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/contacts/",
    params(ContactsQuery),
    responses(
        (status = 200, description = "Contacts owned by the caller", body = [Contact]),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Invalid pagination"),
        (status = 429, description = "No more than 10 requests per minute")
    ),
    security(("bearer_auth" = [])),
    tag = "contacts"
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidQuery(params): ValidQuery<ContactsQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let page = Pagination::from_query(params.skip, params.limit, Pagination::DEFAULT_LIST_LIMIT)?;
    let contacts = contact_service::list_contacts(
        state.contact_repo.as_ref(),
        &user.owner(),
        params.filter.as_deref(),
        page,
    )
    .await?;
    Ok(Json(contacts))
}

#[utoipa::path(
    get,
    path = "/contacts/{id}",
    params(("id" = i32, Path, description = "Contact id")),
    responses(
        (status = 200, description = "The contact", body = Contact),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Contact not found"),
        (status = 429, description = "No more than 10 requests per minute")
    ),
    security(("bearer_auth" = [])),
    tag = "contacts"
)]
pub async fn get_contact(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidPath(id): ValidPath<i32>,
) -> Result<Json<Contact>, ApiError> {
    let contact =
        contact_service::get_contact(state.contact_repo.as_ref(), &user.owner(), id).await?;
    Ok(Json(contact))
}

#[utoipa::path(
    get,
    path = "/contacts/birthdays/",
    params(BirthdaysQuery),
    responses(
        (status = 200, description = "Contacts with a birthday in the next 7 days", body = [Contact]),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Invalid pagination"),
        (status = 429, description = "No more than 10 requests per minute")
    ),
    security(("bearer_auth" = [])),
    tag = "contacts"
)]
pub async fn upcoming_birthdays(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidQuery(params): ValidQuery<BirthdaysQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let page = Pagination::from_query(
        params.skip,
        params.limit,
        Pagination::DEFAULT_BIRTHDAY_LIMIT,
    )?;
    let today = chrono::Local::now().date_naive();
    let contacts = contact_service::upcoming_birthdays(
        state.contact_repo.as_ref(),
        &user.owner(),
        today,
        page,
    )
    .await?;
    Ok(Json(contacts))
}

#[utoipa::path(
    post,
    path = "/contacts/",
    request_body = NewContact,
    responses(
        (status = 201, description = "Contact created", body = Contact),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Malformed body"),
        (status = 429, description = "No more than 10 requests per minute")
    ),
    security(("bearer_auth" = [])),
    tag = "contacts"
)]
pub async fn create_contact(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(input): ValidJson<NewContact>,
) -> Result<impl IntoResponse, ApiError> {
    let contact =
        contact_service::create_contact(state.contact_repo.as_ref(), &user.owner(), input)
            .await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

#[utoipa::path(
    patch,
    path = "/contacts/{id}",
    params(("id" = i32, Path, description = "Contact id")),
    request_body = ContactPatch,
    responses(
        (status = 200, description = "Contact updated", body = Contact),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Contact not found"),
        (status = 422, description = "Malformed body"),
        (status = 429, description = "No more than 10 requests per minute")
    ),
    security(("bearer_auth" = [])),
    tag = "contacts"
)]
pub async fn update_contact(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidPath(id): ValidPath<i32>,
    ValidJson(patch): ValidJson<ContactPatch>,
) -> Result<Json<Contact>, ApiError> {
    let contact =
        contact_service::update_contact(state.contact_repo.as_ref(), &user.owner(), id, patch)
            .await?;
    Ok(Json(contact))
}

#[utoipa::path(
    delete,
    path = "/contacts/{id}",
    params(("id" = i32, Path, description = "Contact id")),
    responses(
        (status = 200, description = "Contact deleted; body is the removed record", body = Contact),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Contact not found"),
        (status = 429, description = "No more than 10 requests per minute")
    ),
    security(("bearer_auth" = [])),
    tag = "contacts"
)]
pub async fn delete_contact(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidPath(id): ValidPath<i32>,
) -> Result<Json<Contact>, ApiError> {
    let contact =
        contact_service::delete_contact(state.contact_repo.as_ref(), &user.owner(), id).await?;
    Ok(Json(contact))
}
