pub mod filters;
pub mod pairing;
