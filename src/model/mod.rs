pub mod api;
pub mod nullifier;
pub mod registry;
pub mod session;
pub mod vote;
