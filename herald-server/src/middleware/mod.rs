//! Request extractors shared by handlers

mod recipient;

pub use recipient::{RECIPIENT_HEADER, Recipient};
