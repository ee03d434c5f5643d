pub mod account;
pub mod space;
