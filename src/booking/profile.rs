//! Booking profiles: fare table, stations, payload and payment settings.
//!
//! The four presets differ only in fares, payload layout, payment mode and
//! whether the ticket card is written to disk.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fares in whole rupees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareTable {
    /// Price of one metro ticket
    pub base: u32,
    /// Flat price of the cab add-on
    pub cab: u32,
}

impl FareTable {
    /// `base × tickets + cab` (cab only when requested)
    #[must_use]
    pub fn total(&self, tickets: u32, cab_requested: bool) -> u32 {
        let cab = if cab_requested { self.cab } else { 0 };
        self.base.saturating_mul(tickets).saturating_add(cab)
    }
}

/// Layout of the string encoded into the ticket QR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// `KEY:value|KEY:value`
    Pipe,
    /// One `Key: value` per line
    Lines,
}

/// How the payment step behaves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentMode {
    /// Blocking delay, then success
    Simulated { delay_ms: u64 },
    /// UPI deep link shown as a QR code; the user confirms by hand
    Upi {
        scheme: String,
        merchant_id: String,
        payee_name: String,
    },
}

/// Named preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Classic,
    Express,
    Upi,
    UpiLite,
}

impl Variant {
    pub const ALL: [Self; 4] = [Self::Classic, Self::Express, Self::Upi, Self::UpiLite];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Express => "express",
            Self::Upi => "upi",
            Self::UpiLite => "upi-lite",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "classic" => Ok(Self::Classic),
            "express" => Ok(Self::Express),
            "upi" => Ok(Self::Upi),
            "upi-lite" | "upilite" => Ok(Self::UpiLite),
            _ => Err(Error::InvalidInput(format!("Unknown booking variant: {s}"))),
        }
    }
}

/// Everything that varies between booking flows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingProfile {
    /// Title shown on the ticket
    pub name: String,
    /// Stations a passenger may pick
    pub stations: Vec<String>,
    pub fares: FareTable,
    pub payload_format: PayloadFormat,
    pub payment: PaymentMode,
    /// Prefix of generated booking ids
    pub id_prefix: String,
    /// Write the ticket card to disk after confirmation
    pub download_ticket: bool,
}

/// Stations served by the default profiles
pub const DEFAULT_STATIONS: &[&str] = &[
    "Miyapur",
    "JNTU College",
    "KPHB Colony",
    "Kukatpally",
    "Balanagar",
    "Moosapet",
    "Bharat Nagar",
    "Erragadda",
    "ESI Hospital",
    "SR Nagar",
    "Ameerpet",
    "Punjagutta",
    "Irrum Manzil",
    "Khairatabad",
    "Lakdikapul",
    "Assembly",
    "Nampally",
    "Gandhi Bhavan",
    "Osmania Medical College",
    "MG Bus Station",
    "Malakpet",
    "Dilsukhnagar",
    "LB Nagar",
    "Madhapur",
    "Hitec City",
    "Raidurg",
    "Secunderabad",
    "Uppal",
    "Nagole",
];

fn default_stations() -> Vec<String> {
    DEFAULT_STATIONS.iter().map(ToString::to_string).collect()
}

fn upi_payment() -> PaymentMode {
    PaymentMode::Upi {
        scheme: "upi".to_string(),
        merchant_id: "metrorail@upi".to_string(),
        payee_name: "Metro Rail".to_string(),
    }
}

impl BookingProfile {
    /// Build a named preset
    #[must_use]
    pub fn preset(variant: Variant) -> Self {
        let (name, fares, payload_format, payment, download_ticket) = match variant {
            Variant::Classic => (
                "Metro Ticket Booking",
                FareTable { base: 45, cab: 150 },
                PayloadFormat::Pipe,
                PaymentMode::Simulated { delay_ms: 2000 },
                false,
            ),
            Variant::Express => (
                "Metro Express Booking",
                FareTable { base: 60, cab: 200 },
                PayloadFormat::Lines,
                PaymentMode::Simulated { delay_ms: 1500 },
                true,
            ),
            Variant::Upi => (
                "Metro Ticket + Cab (UPI)",
                FareTable { base: 45, cab: 150 },
                PayloadFormat::Pipe,
                upi_payment(),
                false,
            ),
            Variant::UpiLite => (
                "Metro Lite (UPI)",
                FareTable { base: 30, cab: 100 },
                PayloadFormat::Lines,
                upi_payment(),
                false,
            ),
        };

        Self {
            name: name.to_string(),
            stations: default_stations(),
            fares,
            payload_format,
            payment,
            id_prefix: "MTR".to_string(),
            download_ticket,
        }
    }

    /// Whether `station` is one of the profile's stations
    #[must_use]
    pub fn serves(&self, station: &str) -> bool {
        self.stations.iter().any(|s| s == station)
    }

    /// Check that the profile can produce bookings
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for fewer than two stations, a zero base fare,
    /// an empty id prefix, or an incomplete UPI payee.
    pub fn validate(&self) -> Result<()> {
        if self.stations.len() < 2 {
            return Err(Error::ConfigError("A booking profile needs at least two stations".to_string()));
        }
        if self.fares.base == 0 {
            return Err(Error::ConfigError("Base fare must be greater than 0".to_string()));
        }
        if self.id_prefix.trim().is_empty() {
            return Err(Error::ConfigError("Booking id prefix must not be empty".to_string()));
        }
        if let PaymentMode::Upi {
            scheme,
            merchant_id,
            payee_name,
        } = &self.payment
        {
            if scheme.is_empty() || merchant_id.is_empty() || payee_name.is_empty() {
                return Err(Error::ConfigError(
                    "UPI payment needs a scheme, merchant id and payee name".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for BookingProfile {
    fn default() -> Self {
        Self::preset(Variant::Classic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fare_total() {
        let fares = FareTable { base: 45, cab: 150 };
        assert_eq!(fares.total(1, false), 45);
        assert_eq!(fares.total(3, true), 3 * 45 + 150);
        assert_eq!(fares.total(0, false), 0);
    }

    #[test]
    fn test_fare_total_saturates() {
        let fares = FareTable { base: u32::MAX, cab: 1 };
        assert_eq!(fares.total(2, true), u32::MAX);
    }

    #[test]
    fn test_presets_are_valid() {
        for variant in Variant::ALL {
            let profile = BookingProfile::preset(variant);
            assert!(profile.validate().is_ok(), "{variant} preset should validate");
        }
    }

    #[test]
    fn test_only_express_downloads() {
        let downloads: Vec<Variant> = Variant::ALL
            .into_iter()
            .filter(|&v| BookingProfile::preset(v).download_ticket)
            .collect();
        assert_eq!(downloads, vec![Variant::Express]);
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("classic".parse::<Variant>().unwrap(), Variant::Classic);
        assert_eq!("UPI_LITE".parse::<Variant>().unwrap(), Variant::UpiLite);
        assert!("deluxe".parse::<Variant>().is_err());
    }

    #[test]
    fn test_validate_rejects_incomplete_upi() {
        let mut profile = BookingProfile::preset(Variant::Upi);
        profile.payment = PaymentMode::Upi {
            scheme: "upi".to_string(),
            merchant_id: String::new(),
            payee_name: "Metro".to_string(),
        };
        assert!(matches!(profile.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_serves() {
        let profile = BookingProfile::default();
        assert!(profile.serves("Ameerpet"));
        assert!(!profile.serves("ameerpet"));
    }
}
