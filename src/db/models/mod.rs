pub mod listing;
pub mod profile;
pub mod vote;
