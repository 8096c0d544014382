pub mod constants;
pub mod outcome;
pub mod segment;
pub mod submit_guard;

pub use outcome::{Outcome, Prize, RequestToken, SpinRequest, SpinResponse, SpinStatus};
pub use segment::{Chance, PrizeCase, Segment};
pub use submit_guard::{SubmitGuard, SubmitPermit};
