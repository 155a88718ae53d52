pub mod cleanup;
pub mod notify;
