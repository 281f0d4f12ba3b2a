//! sweetie: read-only access to Nightscout-style CGM data in MongoDB.
//!
//! Open a [`MongoConnection`], then query through [`DataService`] or the
//! individual repositories. Every query takes optional ISO 8601 bounds and
//! returns plain documents with timestamps normalized to UTC.
//!
//! ```rust,ignore
//! use sweetie::{DataService, MongoConnection};
//!
//! let mut conn = MongoConnection::new(
//!     "mongodb+srv://<db_username>:<db_password>@cluster.example.com",
//!     "user",
//!     "secret",
//! );
//! conn.connect()?;
//! let readings = DataService::new(&conn).get_glucose_readings(None, None)?;
//! conn.close();
//! ```

pub mod data;
pub mod service;

pub use data::{DataError, MongoConnection, Record, Result, TimeRange};
pub use service::DataService;
