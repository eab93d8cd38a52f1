//! Payment step: a fixed delay or a UPI payment-request link.
//!
//! Nothing here talks to a payment provider. A UPI link is only displayed;
//! whether it was paid is never checked.

use super::{
    flow::Booking,
    profile::{BookingProfile, PaymentMode},
    ticket::qr_image,
};
use crate::Result;
use image::GrayImage;
use log::info;
use std::time::Duration;

/// Payment request presented for one booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRequest {
    /// Succeeds after blocking for `delay`
    Simulated { delay: Duration },
    /// Deep link the user scans with a UPI app
    Upi { link: String },
}

impl PaymentRequest {
    #[must_use]
    pub fn for_booking(profile: &BookingProfile, booking: &Booking) -> Self {
        match &profile.payment {
            PaymentMode::Simulated { delay_ms } => Self::Simulated {
                delay: Duration::from_millis(*delay_ms),
            },
            PaymentMode::Upi {
                scheme,
                merchant_id,
                payee_name,
            } => Self::Upi {
                link: upi_link(
                    scheme,
                    merchant_id,
                    payee_name,
                    booking.total(),
                    &format!("Metro ticket {}", booking.id()),
                ),
            },
        }
    }

    /// Whether confirmation waits for the user rather than a timer
    #[must_use]
    pub const fn needs_manual_confirmation(&self) -> bool {
        matches!(self, Self::Upi { .. })
    }

    /// Block for the simulated processing time. Returns immediately for UPI.
    pub fn settle(&self) {
        if let Self::Simulated { delay } = self {
            info!("Processing payment ({} ms)", delay.as_millis());
            std::thread::sleep(*delay);
        }
    }

    /// QR code of the UPI link
    ///
    /// # Errors
    ///
    /// Returns `QrCode` when the link cannot be encoded.
    pub fn qr_code(&self) -> Result<Option<GrayImage>> {
        match self {
            Self::Simulated { .. } => Ok(None),
            Self::Upi { link } => qr_image(link).map(Some),
        }
    }
}

/// `<scheme>://pay?pa=..&pn=..&am=..&tn=..&cu=INR`
#[must_use]
pub fn upi_link(scheme: &str, merchant_id: &str, payee_name: &str, amount: u32, note: &str) -> String {
    format!(
        "{scheme}://pay?pa={merchant_id}&pn={}&am={amount}&tn={}&cu=INR",
        urlencoding::encode(payee_name),
        urlencoding::encode(note)
    )
}
