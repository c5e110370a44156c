//! Types shared between the Almanac API server and its tooling.

pub mod caller;
pub mod params;
pub mod range;
pub mod views;
