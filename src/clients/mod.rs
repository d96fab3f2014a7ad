//! External registry clients used to enrich imported records.

pub mod opencorporates;

pub use opencorporates::{Company, OpencorporatesClient};
