//! Ticket payloads, QR codes and the rendered ticket card.

use super::{
    flow::Booking,
    profile::{BookingProfile, PayloadFormat},
};
use crate::{
    utils::{u32_to_i32, usize_to_i32},
    Error, Result,
};
use image::{GrayImage, Luma};
use log::info;
use opencv::{
    core::{Mat, Point, Scalar, Vec3b, Vector, CV_8UC3},
    imgcodecs,
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_AA},
    prelude::*,
};
use qrcode::QrCode;
use std::fmt;
use std::path::{Path, PathBuf};

/// Smallest side of a generated QR image in pixels
const QR_MIN_SIZE: u32 = 240;

/// Space reserved left of the QR code for the ticket fields
const CARD_TEXT_WIDTH: i32 = 400;
const CARD_MARGIN: i32 = 30;

/// Widest a title or field line may render before it is shortened
const CARD_LINE_MAX_WIDTH: i32 = CARD_TEXT_WIDTH - CARD_MARGIN;

const TITLE_SCALE: f64 = 0.8;
const TITLE_THICKNESS: i32 = 2;
const FIELD_SCALE: f64 = 0.6;
const FIELD_THICKNESS: i32 = 1;

fn text_width(text: &str, font_scale: f64, thickness: i32) -> Result<i32> {
    let mut baseline = 0;
    Ok(imgproc::get_text_size(text, FONT_HERSHEY_SIMPLEX, font_scale, thickness, &mut baseline)?.width)
}

/// Make `text` drawable within `max_width` pixels.
///
/// Hershey fonts only cover printable ASCII, so anything else becomes `?`.
/// Text that is still too wide is cut and ends in `...`.
///
/// # Errors
///
/// Propagates `OpenCV` text measurement errors.
pub fn fit_card_line(text: &str, max_width: i32, font_scale: f64, thickness: i32) -> Result<String> {
    let printable: String = text
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '?' })
        .collect();
    if text_width(&printable, font_scale, thickness)? <= max_width {
        return Ok(printable);
    }

    for kept in (0..printable.len()).rev() {
        let candidate = format!("{}...", printable[..kept].trim_end());
        if text_width(&candidate, font_scale, thickness)? <= max_width {
            return Ok(candidate);
        }
    }
    Ok(String::new())
}

/// String encoded into the ticket QR
#[must_use]
pub fn ticket_payload(booking: &Booking, format: PayloadFormat) -> String {
    match format {
        PayloadFormat::Pipe => {
            let mut fields = vec![
                format!("ID:{}", booking.id()),
                format!("NAME:{}", booking.name()),
                format!("FROM:{}", booking.origin()),
                format!("TO:{}", booking.destination()),
                format!("TICKETS:{}", booking.tickets()),
                format!("CAB:{}", if booking.cab_requested() { "YES" } else { "NO" }),
            ];
            if let Some(drop_off) = booking.drop_off() {
                fields.push(format!("DROP:{drop_off}"));
            }
            fields.push(format!("TOTAL:{}", booking.total()));
            fields.join("|")
        }
        PayloadFormat::Lines => {
            let mut lines = vec![
                format!("Ticket ID: {}", booking.id()),
                format!("Name: {}", booking.name()),
                format!("From: {}", booking.origin()),
                format!("To: {}", booking.destination()),
                format!("Tickets: {}", booking.tickets()),
                format!("Cab: {}", if booking.cab_requested() { "Yes" } else { "No" }),
            ];
            if let Some(drop_off) = booking.drop_off() {
                lines.push(format!("Drop-off: {drop_off}"));
            }
            lines.push(format!("Total: INR {}", booking.total()));
            lines.join("\n")
        }
    }
}

/// Encode text as a black-on-white QR image
///
/// # Errors
///
/// Returns `QrCode` when the data does not fit in a QR code.
pub fn qr_image(data: &str) -> Result<GrayImage> {
    let code = QrCode::new(data.as_bytes())?;
    Ok(code
        .render::<Luma<u8>>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .build())
}

/// Typed view of a confirmed ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketView {
    pub title: String,
    pub id: String,
    pub name: String,
    pub origin: String,
    pub destination: String,
    pub tickets: u32,
    pub drop_off: Option<String>,
    pub total: u32,
    pub issued_at: String,
    pub payload: String,
}

impl TicketView {
    #[must_use]
    pub fn new(profile: &BookingProfile, booking: &Booking) -> Self {
        Self {
            title: profile.name.clone(),
            id: booking.id().to_string(),
            name: booking.name().to_string(),
            origin: booking.origin().to_string(),
            destination: booking.destination().to_string(),
            tickets: booking.tickets(),
            drop_off: booking.drop_off().map(ToString::to_string),
            total: booking.total(),
            issued_at: booking.created_at().format("%Y-%m-%d %H:%M UTC").to_string(),
            payload: ticket_payload(booking, profile.payload_format),
        }
    }

    /// File name of the saved card
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("ticket_{}.png", self.id)
    }

    /// Field lines shown on the card, top to bottom
    #[must_use]
    pub fn field_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Ticket: {}", self.id),
            format!("Passenger: {}", self.name),
            format!("{} -> {}", self.origin, self.destination),
            format!("Tickets: {}", self.tickets),
        ];
        match &self.drop_off {
            Some(drop_off) => lines.push(format!("Cab to: {drop_off}")),
            None => lines.push("Cab: not booked".to_string()),
        }
        lines.push(format!("Total: Rs. {}", self.total));
        lines.push(format!("Issued: {}", self.issued_at));
        lines
    }

    /// QR code of the payload
    ///
    /// # Errors
    ///
    /// Propagates QR encoding errors.
    pub fn qr(&self) -> Result<GrayImage> {
        qr_image(&self.payload)
    }

    /// White card with the title and fields on the left and the QR on the right
    ///
    /// # Errors
    ///
    /// Propagates QR and `OpenCV` drawing errors.
    pub fn render_card(&self) -> Result<Mat> {
        let qr = self.qr()?;
        let qr_w = u32_to_i32(qr.width())?;
        let qr_h = u32_to_i32(qr.height())?;

        let width = CARD_TEXT_WIDTH + qr_w + 2 * CARD_MARGIN;
        let height = (qr_h + 2 * CARD_MARGIN).max(400);
        let mut card = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(255.0))?;

        let black = Scalar::new(0.0, 0.0, 0.0, 0.0);
        let accent = Scalar::new(140.0, 60.0, 0.0, 0.0);

        let title = fit_card_line(&self.title, CARD_LINE_MAX_WIDTH, TITLE_SCALE, TITLE_THICKNESS)?;
        imgproc::put_text(
            &mut card,
            &title,
            Point::new(CARD_MARGIN, CARD_MARGIN + 20),
            FONT_HERSHEY_SIMPLEX,
            TITLE_SCALE,
            accent,
            TITLE_THICKNESS,
            LINE_AA,
            false,
        )?;

        for (i, line) in self.field_lines().iter().enumerate() {
            let y = CARD_MARGIN + 70 + usize_to_i32(i)? * 36;
            let line = fit_card_line(line, CARD_LINE_MAX_WIDTH, FIELD_SCALE, FIELD_THICKNESS)?;
            imgproc::put_text(
                &mut card,
                &line,
                Point::new(CARD_MARGIN, y),
                FONT_HERSHEY_SIMPLEX,
                FIELD_SCALE,
                black,
                FIELD_THICKNESS,
                LINE_AA,
                false,
            )?;
        }

        let qr_x = CARD_TEXT_WIDTH + CARD_MARGIN;
        let qr_y = (height - qr_h) / 2;
        for (x, y, pixel) in qr.enumerate_pixels() {
            let value = pixel[0];
            let row = qr_y + u32_to_i32(y)?;
            let col = qr_x + u32_to_i32(x)?;
            let dst = card.at_2d_mut::<Vec3b>(row, col)?;
            dst[0] = value;
            dst[1] = value;
            dst[2] = value;
        }

        Ok(card)
    }

    /// Render the card and write it as `ticket_<id>.png` under `dir`
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn save_card(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::InvalidInput(format!("Non UTF-8 output path: {}", path.display())))?;

        let card = self.render_card()?;
        if !imgcodecs::imwrite(path_str, &card, &Vector::new())? {
            return Err(Error::InvalidInput(format!("OpenCV could not write {path_str}")));
        }

        info!("Ticket saved to {}", path.display());
        Ok(path)
    }
}

impl fmt::Display for TicketView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==== {} ====", self.title)?;
        for line in self.field_lines() {
            writeln!(f, "  {line}")?;
        }
        write!(f, "==========={}", "=".repeat(self.title.chars().count()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{fare::BookingForm, flow::BookingSession, profile::Variant};

    fn booking(cab: bool) -> Booking {
        let mut session = BookingSession::new(BookingProfile::default());
        session
            .submit(BookingForm {
                name: "Asha".to_string(),
                origin: "Ameerpet".to_string(),
                destination: "Kukatpally".to_string(),
                tickets: 2,
                cab,
                drop_off: if cab { "JNTU gate".to_string() } else { String::new() },
            })
            .unwrap()
            .clone()
    }

    #[test]
    fn test_pipe_payload() {
        let b = booking(false);
        let payload = ticket_payload(&b, PayloadFormat::Pipe);
        assert_eq!(
            payload,
            format!("ID:{}|NAME:Asha|FROM:Ameerpet|TO:Kukatpally|TICKETS:2|CAB:NO|TOTAL:90", b.id())
        );
    }

    #[test]
    fn test_lines_payload_with_cab() {
        let b = booking(true);
        let payload = ticket_payload(&b, PayloadFormat::Lines);
        let lines: Vec<&str> = payload.lines().collect();
        assert_eq!(lines[0], format!("Ticket ID: {}", b.id()));
        assert!(lines.contains(&"Cab: Yes"));
        assert!(lines.contains(&"Drop-off: JNTU gate"));
        assert_eq!(lines.last(), Some(&"Total: INR 240"));
    }

    #[test]
    fn test_qr_image_is_square() {
        let qr = qr_image("ID:MTR-000000000000").unwrap();
        assert_eq!(qr.width(), qr.height());
        assert!(qr.width() >= QR_MIN_SIZE);
    }

    #[test]
    fn test_ticket_view_text() {
        let profile = BookingProfile::preset(Variant::Express);
        let view = TicketView::new(&profile, &booking(false));
        let text = view.to_string();
        assert!(text.contains("Metro Express Booking"));
        assert!(text.contains("Ameerpet -> Kukatpally"));
        assert!(text.contains("Cab: not booked"));
        assert_eq!(view.file_name(), format!("ticket_{}.png", view.id));
    }

    #[test]
    fn test_render_card_dimensions() {
        let view = TicketView::new(&BookingProfile::default(), &booking(true));
        let card = view.render_card().unwrap();
        assert!(card.cols() > CARD_TEXT_WIDTH);
        assert!(card.rows() >= 400);
    }

    #[test]
    fn test_short_line_unchanged() {
        let line = "Passenger: Asha";
        assert_eq!(fit_card_line(line, CARD_LINE_MAX_WIDTH, FIELD_SCALE, FIELD_THICKNESS).unwrap(), line);
    }

    #[test]
    fn test_long_line_is_ellipsized_within_text_column() {
        let line = format!("Passenger: {}", "Venkata Subrahmanya ".repeat(8));
        let fitted = fit_card_line(&line, CARD_LINE_MAX_WIDTH, FIELD_SCALE, FIELD_THICKNESS).unwrap();

        assert!(fitted.ends_with("..."));
        assert!(fitted.starts_with("Passenger: Venkata"));
        assert!(text_width(&fitted, FIELD_SCALE, FIELD_THICKNESS).unwrap() <= CARD_LINE_MAX_WIDTH);
    }

    #[test]
    fn test_non_ascii_replaced_before_drawing() {
        let fitted = fit_card_line("Cab to: Gachibowli ₹ ✓", CARD_LINE_MAX_WIDTH, FIELD_SCALE, FIELD_THICKNESS).unwrap();
        assert_eq!(fitted, "Cab to: Gachibowli ? ?");
    }

    #[test]
    fn test_card_with_long_fields_renders() {
        let long = "Rajiv Gandhi International Airport Departures Terminal Gate 4";
        let mut session = BookingSession::new(BookingProfile::default());
        let booking = session
            .submit(BookingForm {
                name: long.to_string(),
                origin: "Ameerpet".to_string(),
                destination: "Kukatpally".to_string(),
                tickets: 1,
                cab: true,
                drop_off: long.to_string(),
            })
            .unwrap()
            .clone();
        let view = TicketView::new(&BookingProfile::preset(Variant::Express), &booking);
        let card = view.render_card().unwrap();

        let qr = view.qr().unwrap();
        let expected_width = CARD_TEXT_WIDTH + u32_to_i32(qr.width()).unwrap() + 2 * CARD_MARGIN;
        assert_eq!(card.cols(), expected_width);
        for line in view.field_lines() {
            let fitted = fit_card_line(&line, CARD_LINE_MAX_WIDTH, FIELD_SCALE, FIELD_THICKNESS).unwrap();
            assert!(CARD_MARGIN + text_width(&fitted, FIELD_SCALE, FIELD_THICKNESS).unwrap() < CARD_TEXT_WIDTH + CARD_MARGIN);
        }
    }
}
