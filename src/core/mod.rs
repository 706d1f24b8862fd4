pub mod city;
pub mod dispatcher;
pub mod filter;
pub mod monitor;
pub mod parser;
pub mod seen_store;

pub use crate::domain::model::{CycleResult, Message, Offer, RawListing};
pub use crate::domain::ports::{ListingsSource, NotifierSink, Storage};
pub use crate::utils::error::Result;
