//! Metro ticket booking with an optional cab add-on.
//!
//! A [`BookingSession`] walks a passenger through form, payment and ticket.
//! Everything that differs between flows lives in a [`BookingProfile`].

pub mod fare;
pub mod flow;
pub mod payment;
pub mod profile;
pub mod ticket;

pub use fare::{validate, BookingForm, ValidForm, ValidationError};
pub use flow::{new_booking_id, Booking, BookingSession, FlowState, FlowStep};
pub use payment::{upi_link, PaymentRequest};
pub use profile::{BookingProfile, FareTable, PayloadFormat, PaymentMode, Variant, DEFAULT_STATIONS};
pub use ticket::{qr_image, ticket_payload, TicketView};
