pub mod classify;
pub mod send;
