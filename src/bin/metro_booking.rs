//! Terminal metro ticket booking with an optional cab add-on.

use anyhow::{Context, Result};
use blink_mouse::{
    booking::{BookingForm, BookingProfile, BookingSession, FlowStep, PaymentRequest, TicketView, Variant},
    config::Config,
    Error,
};
use clap::Parser;
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Booking preset (classic, express, upi, upi-lite)
    #[arg(long, default_value = "classic")]
    variant: String,

    /// Configuration file; its booking section, if any, replaces the preset
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Directory for QR and ticket images
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

/// Line-oriented prompts; `None` means stdin is closed
struct Prompter<R> {
    input: R,
}

impl<R: BufRead> Prompter<R> {
    fn ask(&mut self, label: &str, default: &str) -> Result<Option<String>> {
        if default.is_empty() {
            print!("{label}: ");
        } else {
            print!("{label} [{default}]: ");
        }
        io::stdout().flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let answer = line.trim();
        Ok(Some(if answer.is_empty() { default.to_string() } else { answer.to_string() }))
    }

    fn choose(&mut self, label: &str, options: &[char]) -> Result<Option<char>> {
        loop {
            let Some(answer) = self.ask(label, "")? else {
                return Ok(None);
            };
            if let Some(c) = answer.chars().next().map(|c| c.to_ascii_lowercase()) {
                if options.contains(&c) {
                    return Ok(Some(c));
                }
            }
            println!("Please answer one of: {}", options.iter().collect::<String>());
        }
    }
}

fn yes_no(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "y" | "yes" | "true" | "1")
}

fn load_profile(args: &Args) -> Result<BookingProfile> {
    let variant: Variant = args.variant.parse()?;
    let profile = match &args.config {
        Some(path) => {
            info!("Loading booking profile from: {}", path.display());
            let config = Config::from_file(path).with_context(|| format!("reading {}", path.display()))?;
            if config.booking.is_none() {
                info!("{} has no booking section, using the {variant} preset", path.display());
            }
            config.booking_profile(variant)
        }
        None => BookingProfile::preset(variant),
    };
    profile.validate()?;
    Ok(profile)
}

fn ask_tickets<R: BufRead>(prompter: &mut Prompter<R>, default: &str) -> Result<Option<u32>> {
    loop {
        let Some(answer) = prompter.ask("Tickets", default)? else {
            return Ok(None);
        };
        match answer.parse() {
            Ok(count) => return Ok(Some(count)),
            Err(_) => println!("'{answer}' is not a ticket count, enter a whole number"),
        }
    }
}

fn fill_form<R: BufRead>(prompter: &mut Prompter<R>, profile: &BookingProfile, draft: &BookingForm) -> Result<Option<BookingForm>> {
    println!();
    println!("== {} ==", profile.name);
    println!("Stations: {}", profile.stations.join(", "));
    println!(
        "Fare: Rs. {} per ticket, cab Rs. {}",
        profile.fares.base, profile.fares.cab
    );

    let tickets_default = if draft.tickets == 0 { "1".to_string() } else { draft.tickets.to_string() };
    let cab_default = if draft.cab { "y" } else { "n" };

    let Some(name) = prompter.ask("Passenger name", &draft.name)? else { return Ok(None) };
    let Some(origin) = prompter.ask("From", &draft.origin)? else { return Ok(None) };
    let Some(destination) = prompter.ask("To", &draft.destination)? else { return Ok(None) };
    let Some(tickets) = ask_tickets(prompter, &tickets_default)? else { return Ok(None) };
    let Some(cab) = prompter.ask("Add a cab? (y/n)", cab_default)? else { return Ok(None) };
    let cab = yes_no(&cab);
    let drop_off = if cab {
        let Some(drop_off) = prompter.ask("Cab drop-off", &draft.drop_off)? else { return Ok(None) };
        drop_off
    } else {
        String::new()
    };

    Ok(Some(BookingForm {
        name,
        origin,
        destination,
        tickets,
        cab,
        drop_off,
    }))
}

fn save_payment_qr(request: &PaymentRequest, out_dir: &Path, booking_id: &str) -> Result<()> {
    if let Some(qr) = request.qr_code()? {
        std::fs::create_dir_all(out_dir)?;
        let path = out_dir.join(format!("payment_{booking_id}.png"));
        qr.save(&path).map_err(Error::from)?;
        println!("Scan the QR saved at {}", path.display());
    }
    Ok(())
}

fn run<R: BufRead>(session: &mut BookingSession, prompter: &mut Prompter<R>, out_dir: &Path) -> Result<()> {
    loop {
        match session.step() {
            FlowStep::Form => {
                let draft = session.draft().cloned().unwrap_or_default();
                let Some(form) = fill_form(prompter, session.profile(), &draft)? else {
                    return Ok(());
                };
                match session.submit(form) {
                    Ok(booking) => println!("Booking {} created, total Rs. {}", booking.id(), booking.total()),
                    Err(Error::Validation(e)) => println!("Cannot book: {e}"),
                    Err(e) => return Err(e.into()),
                }
            }
            FlowStep::Payment => {
                let booking = session
                    .booking()
                    .cloned()
                    .context("payment step without a booking")?;
                let request = PaymentRequest::for_booking(session.profile(), &booking);

                println!();
                println!("Amount due: Rs. {}", booking.total());
                let choice = if let PaymentRequest::Upi { link } = &request {
                    println!("UPI link: {link}");
                    save_payment_qr(&request, out_dir, booking.id())?;
                    prompter.choose("[p]aid / [c]ancel", &['p', 'c'])?
                } else {
                    prompter.choose("[p]ay / [c]ancel", &['p', 'c'])?
                };

                match choice {
                    Some('p') => {
                        request.settle();
                        session.confirm()?;
                    }
                    Some(_) => session.cancel()?,
                    None => return Ok(()),
                }
            }
            FlowStep::Ticket => {
                let booking = session
                    .booking()
                    .cloned()
                    .context("ticket step without a booking")?;
                let ticket = TicketView::new(session.profile(), &booking);

                println!();
                println!("{ticket}");
                println!("QR payload:\n{}", ticket.payload);
                if session.profile().download_ticket {
                    match ticket.save_card(out_dir) {
                        Ok(path) => println!("Ticket saved to {}", path.display()),
                        Err(e) => warn!("Could not save ticket: {e}"),
                    }
                }

                match prompter.choose("[n]ew booking / [q]uit", &['n', 'q'])? {
                    Some('n') => session.reset(),
                    _ => return Ok(()),
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let profile = load_profile(&args)?;
    info!("Using booking profile '{}'", profile.name);

    let mut session = BookingSession::new(profile);
    let stdin = io::stdin();
    let mut prompter = Prompter { input: stdin.lock() };
    run(&mut session, &mut prompter, &args.out_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blink_mouse::booking::PaymentMode;
    use std::io::Cursor;

    fn instant(variant: Variant) -> BookingProfile {
        let mut profile = BookingProfile::preset(variant);
        if let PaymentMode::Simulated { delay_ms } = &mut profile.payment {
            *delay_ms = 0;
        }
        profile
    }

    fn drive(profile: BookingProfile, script: &str, out_dir: &Path) -> BookingSession {
        let mut session = BookingSession::new(profile);
        let mut prompter = Prompter {
            input: Cursor::new(script.as_bytes().to_vec()),
        };
        run(&mut session, &mut prompter, out_dir).unwrap();
        session
    }

    #[test]
    fn test_cancel_then_blank_answers_reuse_entries() {
        let dir = tempfile::tempdir().unwrap();
        let script = "Asha\nAmeerpet\nKukatpally\n2\nn\nc\n\n\n\n\n\np\nq\n";
        let session = drive(instant(Variant::Classic), script, dir.path());

        assert_eq!(session.step(), FlowStep::Ticket);
        let booking = session.booking().unwrap();
        assert_eq!(booking.name(), "Asha");
        assert_eq!(booking.origin(), "Ameerpet");
        assert_eq!(booking.destination(), "Kukatpally");
        assert_eq!(booking.tickets(), 2);
        assert!(!booking.cab_requested());
        assert_eq!(booking.total(), 90);
    }

    #[test]
    fn test_upi_waits_for_manual_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let script = "Ravi\nMiyapur\nAmeerpet\n1\ny\nHitec City\nx\np\nq\n";
        let session = drive(BookingProfile::preset(Variant::Upi), script, dir.path());

        assert_eq!(session.step(), FlowStep::Ticket);
        let booking = session.booking().unwrap();
        assert_eq!(booking.drop_off(), Some("Hitec City"));
        assert_eq!(booking.total(), 195);
        assert!(dir.path().join(format!("payment_{}.png", booking.id())).exists());
    }

    #[test]
    fn test_upi_left_unconfirmed_stays_in_payment() {
        let dir = tempfile::tempdir().unwrap();
        let script = "Ravi\nMiyapur\nAmeerpet\n1\nn\n";
        let session = drive(BookingProfile::preset(Variant::UpiLite), script, dir.path());

        assert_eq!(session.step(), FlowStep::Payment);
        assert!(session.booking().is_some());
    }

    #[test]
    fn test_end_of_input_mid_form_stops_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let session = drive(instant(Variant::Classic), "Asha\nAmeerpet\n", dir.path());

        assert_eq!(session.step(), FlowStep::Form);
        assert!(session.booking().is_none());
        assert_eq!(session.draft(), Some(&BookingForm::default()));
    }

    #[test]
    fn test_end_of_input_on_empty_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let session = drive(instant(Variant::Express), "", dir.path());
        assert_eq!(session.step(), FlowStep::Form);
    }

    #[test]
    fn test_non_numeric_ticket_count_is_asked_again() {
        let dir = tempfile::tempdir().unwrap();
        let script = "Asha\nAmeerpet\nKukatpally\nabc\n3\nn\np\nq\n";
        let session = drive(instant(Variant::Classic), script, dir.path());

        assert_eq!(session.step(), FlowStep::Ticket);
        assert_eq!(session.booking().unwrap().tickets(), 3);
        assert_eq!(session.booking().unwrap().total(), 135);
    }

    #[test]
    fn test_ask_tickets_rejects_words_and_negatives() {
        let mut prompter = Prompter {
            input: Cursor::new(b"two\n-1\n\n".to_vec()),
        };
        assert_eq!(ask_tickets(&mut prompter, "4").unwrap(), Some(4));

        let mut prompter = Prompter {
            input: Cursor::new(b"many\n".to_vec()),
        };
        assert_eq!(ask_tickets(&mut prompter, "1").unwrap(), None);
    }

    #[test]
    fn test_zero_tickets_reaches_validation() {
        let dir = tempfile::tempdir().unwrap();
        let script = "Asha\nAmeerpet\nKukatpally\n0\nn\n";
        let session = drive(instant(Variant::Classic), script, dir.path());

        assert_eq!(session.step(), FlowStep::Form);
        assert_eq!(session.draft().unwrap().tickets, 0);
    }

    #[test]
    fn test_new_booking_starts_from_blank_form() {
        let dir = tempfile::tempdir().unwrap();
        let script = "Asha\nAmeerpet\nKukatpally\n1\nn\np\nn\nMeena\n";
        let session = drive(instant(Variant::Classic), script, dir.path());

        assert_eq!(session.step(), FlowStep::Form);
        assert!(session.booking().is_none());
        assert_eq!(session.draft(), Some(&BookingForm::default()));
    }

    fn args(variant: &str, config: Option<PathBuf>) -> Args {
        Args {
            variant: variant.to_string(),
            config,
            out_dir: PathBuf::from("."),
            debug: false,
        }
    }

    #[test]
    fn test_variant_kept_when_config_has_no_booking_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaze.yaml");
        std::fs::write(&path, "tracker:\n  camera_index: 1\n").unwrap();

        let profile = load_profile(&args("upi", Some(path))).unwrap();
        assert_eq!(profile, BookingProfile::preset(Variant::Upi));
    }

    #[test]
    fn test_config_booking_section_replaces_variant() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("booking.yaml");
        let mut config = Config::default();
        config.booking = Some(BookingProfile::preset(Variant::Express));
        config.to_file(&path).unwrap();

        let profile = load_profile(&args("upi", Some(path))).unwrap();
        assert_eq!(profile, BookingProfile::preset(Variant::Express));
    }

    #[test]
    fn test_unknown_variant_rejected() {
        assert!(load_profile(&args("platinum", None)).is_err());
    }
}
