//! Amazon page access and field extraction.

pub mod client;
pub mod extract;
pub mod regions;
pub mod selectors;

pub use client::{FetchError, PageSession, ProductPages, SessionFactory, WreqSessionFactory};
pub use extract::{Candidate, Extractor};
pub use regions::Region;
