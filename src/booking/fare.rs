//! Booking form validation and fare calculation.

use super::profile::BookingProfile;
use crate::constants::MAX_TICKETS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fields collected on the booking form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingForm {
    pub name: String,
    pub origin: String,
    pub destination: String,
    pub tickets: u32,
    pub cab: bool,
    pub drop_off: String,
}

/// Why a form was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("passenger name is required")]
    EmptyName,

    #[error("unknown station: {0}")]
    UnknownStation(String),

    #[error("origin and destination must differ")]
    SameStation,

    #[error("ticket count must be between 1 and {max}, got {0}", max = MAX_TICKETS)]
    TicketCount(u32),

    #[error("a drop-off location is required when booking a cab")]
    MissingDropOff,
}

/// A form that passed validation, with its computed total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidForm {
    pub form: BookingForm,
    pub total: u32,
}

/// Validate a form against a profile and compute the total.
///
/// An empty name is reported first, regardless of the other fields.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate(form: &BookingForm, profile: &BookingProfile) -> Result<ValidForm, ValidationError> {
    if form.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    for station in [&form.origin, &form.destination] {
        if !profile.serves(station) {
            return Err(ValidationError::UnknownStation(station.clone()));
        }
    }
    if form.origin == form.destination {
        return Err(ValidationError::SameStation);
    }
    if !(1..=MAX_TICKETS).contains(&form.tickets) {
        return Err(ValidationError::TicketCount(form.tickets));
    }
    if form.cab && form.drop_off.trim().is_empty() {
        return Err(ValidationError::MissingDropOff);
    }

    let mut form = form.clone();
    form.name = form.name.trim().to_string();
    form.drop_off = if form.cab {
        form.drop_off.trim().to_string()
    } else {
        String::new()
    };

    let total = profile.fares.total(form.tickets, form.cab);
    Ok(ValidForm { form, total })
}
