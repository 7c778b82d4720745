//! Ferrous Resolver Infrastructure Layer
pub mod dns;
