use crate::api;
use crate::domain::{Contact, ContactPatch, FieldError, NewContact, User};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::auth::signup,
        api::auth::login,
        api::contact::list_contacts,
        api::contact::get_contact,
        api::contact::upcoming_birthdays,
        api::contact::create_contact,
        api::contact::update_contact,
        api::contact::delete_contact,
    ),
    components(
        schemas(
            Contact,
            NewContact,
            ContactPatch,
            FieldError,
            User,
            api::auth::SignupRequest,
            api::auth::LoginRequest,
            api::auth::TokenResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "contacts", description = "Per-user address book"),
        (name = "auth", description = "Accounts and bearer tokens")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
