//! Stored document shapes.

mod document;

pub use document::{AddressRecord, CardRecord, CustomerRecord, Document, Entity, Kind};
