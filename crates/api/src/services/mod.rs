//! Application services.

pub mod check_in;
pub mod mailer;
pub mod registration;
pub mod roster;
pub mod scanner;
pub mod tickets;

pub use check_in::CheckInService;
pub use mailer::{build_mailer, ConsoleTicketMailer, HttpTicketMailer, TicketMailer};
pub use registration::{RegistrationError, RegistrationService};
pub use roster::{export_xlsx, ArrivalGuard};
pub use scanner::{ScanEvent, ScanInput, ScannerSession};
pub use tickets::{DispatchOutcome, Ticket, TicketError, TicketIssuer};
