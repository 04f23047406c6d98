mod controller;
mod inputs;

pub use controller::{FormController, SubmitOutcome};
pub use inputs::{parse_amount, parse_date, FormInputs, DECIMAL_PLACES, MAX_DIGITS};
