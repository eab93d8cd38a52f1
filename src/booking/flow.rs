//! Booking session state machine.
//!
//! `Form --submit--> Payment --confirm--> Ticket --reset--> Form`, with
//! `Payment --cancel--> Form`. All state lives in the session object.

use super::{
    fare::{validate, BookingForm},
    profile::BookingProfile,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::fmt;
use uuid::Uuid;

/// Immutable record of one submitted booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    id: String,
    name: String,
    origin: String,
    destination: String,
    tickets: u32,
    drop_off: Option<String>,
    total: u32,
    created_at: DateTime<Utc>,
}

impl Booking {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    #[must_use]
    pub const fn tickets(&self) -> u32 {
        self.tickets
    }

    #[must_use]
    pub const fn cab_requested(&self) -> bool {
        self.drop_off.is_some()
    }

    /// Drop-off location, present iff a cab was requested
    #[must_use]
    pub fn drop_off(&self) -> Option<&str> {
        self.drop_off.as_deref()
    }

    /// Total fare in rupees
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// `<prefix>-` followed by 12 uppercase hex digits of a random UUID
#[must_use]
pub fn new_booking_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{prefix}-{}", &hex[..12])
}

/// Which screen the session is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    Form,
    Payment,
    Ticket,
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Form => "form",
            Self::Payment => "payment",
            Self::Ticket => "ticket",
        })
    }
}

/// Session state with the data each step owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Form { draft: BookingForm },
    Payment { booking: Booking, draft: BookingForm },
    Ticket { booking: Booking },
}

impl FlowState {
    #[must_use]
    pub const fn step(&self) -> FlowStep {
        match self {
            Self::Form { .. } => FlowStep::Form,
            Self::Payment { .. } => FlowStep::Payment,
            Self::Ticket { .. } => FlowStep::Ticket,
        }
    }
}

impl Default for FlowState {
    fn default() -> Self {
        Self::Form {
            draft: BookingForm::default(),
        }
    }
}

/// One browser-session worth of booking state
#[derive(Debug, Clone)]
pub struct BookingSession {
    profile: BookingProfile,
    state: FlowState,
}

impl BookingSession {
    #[must_use]
    pub fn new(profile: BookingProfile) -> Self {
        Self {
            profile,
            state: FlowState::default(),
        }
    }

    #[must_use]
    pub const fn profile(&self) -> &BookingProfile {
        &self.profile
    }

    #[must_use]
    pub const fn state(&self) -> &FlowState {
        &self.state
    }

    #[must_use]
    pub const fn step(&self) -> FlowStep {
        self.state.step()
    }

    /// Current booking, in the payment and ticket steps
    #[must_use]
    pub const fn booking(&self) -> Option<&Booking> {
        match &self.state {
            FlowState::Form { .. } => None,
            FlowState::Payment { booking, .. } | FlowState::Ticket { booking } => Some(booking),
        }
    }

    /// Form fields as last entered, in the form and payment steps
    #[must_use]
    pub const fn draft(&self) -> Option<&BookingForm> {
        match &self.state {
            FlowState::Form { draft } | FlowState::Payment { draft, .. } => Some(draft),
            FlowState::Ticket { .. } => None,
        }
    }

    /// Validate the form and move to payment.
    ///
    /// On rejection the session stays on the form with the entered fields
    /// kept as the draft.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside the form step, `Validation` for a bad form.
    pub fn submit(&mut self, form: BookingForm) -> Result<&Booking> {
        self.expect_step(FlowStep::Form, "submit")?;

        let valid = match validate(&form, &self.profile) {
            Ok(valid) => valid,
            Err(e) => {
                debug!("Form rejected: {e}");
                self.state = FlowState::Form { draft: form };
                return Err(e.into());
            }
        };

        let booking = Booking {
            id: new_booking_id(&self.profile.id_prefix),
            name: valid.form.name.clone(),
            origin: valid.form.origin.clone(),
            destination: valid.form.destination.clone(),
            tickets: valid.form.tickets,
            drop_off: valid.form.cab.then(|| valid.form.drop_off.clone()),
            total: valid.total,
            created_at: Utc::now(),
        };
        info!("Booking {} created, total {}", booking.id, booking.total);

        self.state = FlowState::Payment { booking, draft: form };
        self.booking()
            .ok_or_else(|| Error::InvalidInput("Booking missing after submit".to_string()))
    }

    /// Abandon payment and return to the form, keeping the entered fields.
    /// The booking, its id and total are discarded.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside the payment step.
    pub fn cancel(&mut self) -> Result<()> {
        self.expect_step(FlowStep::Payment, "cancel")?;
        if let FlowState::Payment { booking, draft } = std::mem::take(&mut self.state) {
            info!("Booking {} cancelled", booking.id);
            self.state = FlowState::Form { draft };
        }
        Ok(())
    }

    /// Mark payment complete. No settlement is verified.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside the payment step.
    pub fn confirm(&mut self) -> Result<&Booking> {
        self.expect_step(FlowStep::Payment, "confirm payment")?;
        if let FlowState::Payment { booking, .. } = std::mem::take(&mut self.state) {
            info!("Booking {} confirmed", booking.id);
            self.state = FlowState::Ticket { booking };
        }
        self.booking()
            .ok_or_else(|| Error::InvalidInput("Booking missing after confirm".to_string()))
    }

    /// Drop everything and start a new form
    pub fn reset(&mut self) {
        debug!("Session reset from {} step", self.step());
        self.state = FlowState::default();
    }

    fn expect_step(&self, expected: FlowStep, action: &'static str) -> Result<()> {
        if self.step() == expected {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                from: self.step(),
                action,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{fare::ValidationError, profile::Variant};

    fn form() -> BookingForm {
        BookingForm {
            name: "Asha".to_string(),
            origin: "Ameerpet".to_string(),
            destination: "Kukatpally".to_string(),
            tickets: 2,
            cab: false,
            drop_off: String::new(),
        }
    }

    #[test]
    fn test_full_cycle() {
        let mut session = BookingSession::new(BookingProfile::preset(Variant::Classic));
        assert_eq!(session.step(), FlowStep::Form);

        let total = session.submit(form()).unwrap().total();
        assert_eq!(total, 90);
        assert_eq!(session.step(), FlowStep::Payment);

        session.confirm().unwrap();
        assert_eq!(session.step(), FlowStep::Ticket);
        assert!(session.draft().is_none());

        session.reset();
        assert_eq!(session.step(), FlowStep::Form);
        assert_eq!(session.draft(), Some(&BookingForm::default()));
        assert!(session.booking().is_none());
    }

    #[test]
    fn test_rejected_submit_keeps_draft() {
        let mut session = BookingSession::new(BookingProfile::default());
        let mut bad = form();
        bad.name.clear();

        let err = session.submit(bad.clone()).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyName)));
        assert_eq!(session.step(), FlowStep::Form);
        assert_eq!(session.draft(), Some(&bad));
    }

    #[test]
    fn test_cancel_discards_booking_keeps_fields() {
        let mut session = BookingSession::new(BookingProfile::default());
        let first_id = session.submit(form()).unwrap().id().to_string();

        session.cancel().unwrap();
        assert_eq!(session.step(), FlowStep::Form);
        assert!(session.booking().is_none());
        assert_eq!(session.draft(), Some(&form()));

        let mut fewer = form();
        fewer.tickets = 1;
        let booking = session.submit(fewer).unwrap();
        assert_eq!(booking.total(), 45);
        assert_ne!(booking.id(), first_id);
    }

    #[test]
    fn test_invalid_transitions_leave_state() {
        let mut session = BookingSession::new(BookingProfile::default());
        assert!(matches!(
            session.confirm(),
            Err(Error::InvalidTransition {
                from: FlowStep::Form,
                ..
            })
        ));
        assert!(session.cancel().is_err());
        assert_eq!(session.step(), FlowStep::Form);

        session.submit(form()).unwrap();
        assert!(session.submit(form()).is_err());
        session.confirm().unwrap();
        assert!(session.cancel().is_err());
        assert_eq!(session.step(), FlowStep::Ticket);
    }

    #[test]
    fn test_booking_id_format() {
        let id = new_booking_id("MTR");
        assert_eq!(id.len(), 16);
        assert!(id.starts_with("MTR-"));
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(id, new_booking_id("MTR"));
    }

    #[test]
    fn test_cab_booking_keeps_drop_off() {
        let mut session = BookingSession::new(BookingProfile::default());
        let mut with_cab = form();
        with_cab.cab = true;
        with_cab.drop_off = "Cyber Towers".to_string();

        let booking = session.submit(with_cab).unwrap();
        assert!(booking.cab_requested());
        assert_eq!(booking.drop_off(), Some("Cyber Towers"));
        assert_eq!(booking.total(), 90 + 150);
    }
}
