//! Domain layer for the flightdeck client.
//!
//! This module contains the core value types exchanged between the session and
//! the data service, independent of the transport, storage, or display. It
//! keeps the query model isolated from any runtime concerns.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`query`]: Query requests, responses, filters, sorting and cursors
//! - [`row`]: Result rows and cell values
//! - [`fields`]: The aircraft state-vector field catalogue
//!
//! # Examples
//!
//! ```
//! use flightdeck::domain::{Filters, FilterValue, QueryRequest};
//!
//! let mut filters = Filters::new();
//! filters.insert("origin_country", FilterValue::Text("Germany".into()));
//! let request = QueryRequest::new(filters, None, 50, None);
//! assert!(request.cursor.is_none());
//! ```

pub mod error;
pub mod fields;
pub mod query;
pub mod row;

pub use error::{FlightdeckError, Result};
pub use fields::UnitSystem;
pub use query::{
    Cursor, FilterPatch, FilterValue, Filters, QueryRequest, QueryResponse, SortModel, SortOrder,
};
pub use row::{FieldValue, Row};
