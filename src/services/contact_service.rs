//! Contact Service - Pure business logic without HTTP layer
//!
//! Every operation takes the caller's [`Owner`] explicitly; nothing here
//! reads request-scoped or global state. Storage access goes through the
//! [`ContactRepository`] port, which opens one transaction per call.

use chrono::{Datelike, NaiveDate};

use crate::domain::{
    Contact, ContactPatch, ContactRepository, DomainError, NewContact, Owner, Pagination,
};

/// Length of the upcoming-birthday window, today included
pub const BIRTHDAY_WINDOW_DAYS: i64 = 7;

/// List owned contacts, optionally filtered by name or email
pub async fn list_contacts(
    repo: &dyn ContactRepository,
    owner: &Owner,
    filter: Option<&str>,
    page: Pagination,
) -> Result<Vec<Contact>, DomainError> {
    let contacts = repo.find_all(owner, filter, page).await?;
    tracing::debug!(
        "Listed {} contacts for user {} (filter: {:?})",
        contacts.len(),
        owner.user_id,
        filter
    );
    Ok(contacts)
}

/// Get a single owned contact by ID
pub async fn get_contact(
    repo: &dyn ContactRepository,
    owner: &Owner,
    id: i32,
) -> Result<Contact, DomainError> {
    repo.find_by_id(owner, id).await?.ok_or(DomainError::NotFound)
}

/// Owned contacts whose birthday falls within the next week of `today`
pub async fn upcoming_birthdays(
    repo: &dyn ContactRepository,
    owner: &Owner,
    today: NaiveDate,
    page: Pagination,
) -> Result<Vec<Contact>, DomainError> {
    let upcoming: Vec<Contact> = repo
        .find_all_by_owner(owner)
        .await?
        .into_iter()
        .filter(|c| is_upcoming_birthday(c.birthday, today))
        .collect();

    Ok(page.slice(upcoming))
}

/// Create a new contact owned by the caller
pub async fn create_contact(
    repo: &dyn ContactRepository,
    owner: &Owner,
    input: NewContact,
) -> Result<Contact, DomainError> {
    input.validate()?;
    let contact = repo.create(owner, input).await?;
    tracing::info!("Created contact {} for user {}", contact.id, owner.user_id);
    Ok(contact)
}

/// Replace only the supplied fields of an owned contact
pub async fn update_contact(
    repo: &dyn ContactRepository,
    owner: &Owner,
    id: i32,
    patch: ContactPatch,
) -> Result<Contact, DomainError> {
    patch.validate()?;
    let contact = repo.update(owner, id, patch).await?;
    tracing::info!("Updated contact {} for user {}", id, owner.user_id);
    Ok(contact)
}

/// Permanently remove an owned contact, returning its last state
pub async fn delete_contact(
    repo: &dyn ContactRepository,
    owner: &Owner,
    id: i32,
) -> Result<Contact, DomainError> {
    let contact = repo.delete(owner, id).await?;
    tracing::info!("Deleted contact {} for user {}", id, owner.user_id);
    Ok(contact)
}

/// The birthday's month/day in `year`. Feb 29 maps to Feb 28 outside leap years.
fn occurrence_in(year: i32, birthday: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day() - 1))
}

/// Next anniversary of `birthday` on or after `today`
pub fn next_birthday(birthday: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    match occurrence_in(today.year(), birthday) {
        Some(date) if date >= today => Some(date),
        _ => occurrence_in(today.year() + 1, birthday),
    }
}

/// Whether the next anniversary is less than [`BIRTHDAY_WINDOW_DAYS`] away
pub fn is_upcoming_birthday(birthday: NaiveDate, today: NaiveDate) -> bool {
    next_birthday(birthday, today)
        .map(|next| (next - today).num_days())
        .is_some_and(|days| (0..BIRTHDAY_WINDOW_DAYS).contains(&days))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_is_today_through_six_days() {
        let today = date(2024, 6, 10);
        assert!(is_upcoming_birthday(date(1980, 6, 10), today));
        assert!(is_upcoming_birthday(date(1980, 6, 13), today));
        assert!(is_upcoming_birthday(date(1980, 6, 16), today));
        assert!(!is_upcoming_birthday(date(1980, 6, 17), today));
        assert!(!is_upcoming_birthday(date(1980, 6, 20), today));
    }

    #[test]
    fn past_birthdays_wait_for_next_year() {
        let today = date(2024, 6, 10);
        assert!(!is_upcoming_birthday(date(1980, 6, 9), today));
        assert_eq!(next_birthday(date(1980, 6, 9), today), Some(date(2025, 6, 9)));
    }

    #[test]
    fn wraps_across_new_year() {
        let today = date(2023, 12, 28);
        assert!(is_upcoming_birthday(date(1990, 1, 2), today));
        assert!(is_upcoming_birthday(date(1990, 12, 31), today));
        assert!(is_upcoming_birthday(date(1990, 1, 3), today));
        assert!(!is_upcoming_birthday(date(1990, 1, 4), today));
        assert!(!is_upcoming_birthday(date(1990, 12, 27), today));
    }

    #[test]
    fn leap_day_birthdays() {
        let leap_born = date(2000, 2, 29);
        assert_eq!(next_birthday(leap_born, date(2023, 2, 1)), Some(date(2023, 2, 28)));
        assert_eq!(next_birthday(leap_born, date(2024, 2, 1)), Some(date(2024, 2, 29)));
        assert!(is_upcoming_birthday(leap_born, date(2023, 2, 25)));
        assert!(!is_upcoming_birthday(leap_born, date(2023, 3, 1)));
    }

    #[test]
    fn birth_year_is_ignored() {
        let today = date(2024, 6, 10);
        assert!(is_upcoming_birthday(date(2024, 6, 12), today));
        assert!(is_upcoming_birthday(date(1901, 6, 12), today));
    }
}
