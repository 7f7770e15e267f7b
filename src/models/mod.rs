//! Domain models and the DTOs used for HTTP request and response bodies.

pub mod ad;
pub mod requests;
pub mod responses;

pub use ad::{Ad, AdDraft};
pub use requests::{AdRequest, ListAdsQuery};
pub use responses::{AdPage, DeleteResponse, ErrorResponse, HealthResponse};
