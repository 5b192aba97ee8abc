//! Signal Routes - persisted route cache for the CommNet relay network
//!
//! Routes planned for each satellite are kept in a [`RouteStore`] and written
//! to a hierarchical key/value document between sessions. Loading validates
//! every unit against the current network and drops only the smallest unit
//! that fails, so a partially corrupt or stale cache still restores whatever
//! is intact.

pub mod document;
pub mod fixture;
pub mod load;
mod save;
pub mod store;

pub use document::{read_document, write_document, ConfigNode};
pub use fixture::{NetworkFixture, Session};
pub use load::{LoadReport, Skip, SkipReason, SkipScope};
pub use store::RouteStore;

use serde::Serialize;
use thiserror::Error;

/// The only document version this build reads and writes
pub const SUPPORTED_VERSION: &str = "1";

/// Name of the document root node
pub const DOCUMENT_NODE: &str = "SIGNAL_ROUTES";

pub(crate) mod keys {
    pub const VERSION: &str = "Version";
    pub const SATELLITE: &str = "Satellite";
    pub const ROUTE: &str = "Route";
    pub const LINK: &str = "Link";
    pub const TRANSMITTER: &str = "Transmitter";
    pub const RECEIVER: &str = "Receiver";
    pub const NAME: &str = "Name";
    pub const GUID: &str = "Guid";
    pub const GOAL: &str = "Goal";
    pub const DELAY: &str = "Delay";
    pub const COST: &str = "Cost";
    pub const LINK_TYPE: &str = "LinkType";
    pub const TARGET_NAME: &str = "Target Name";
    pub const TARGET_GUID: &str = "Target Guid";
    pub const PART_ID: &str = "Part ID";
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: '}}' without an open node")]
    UnexpectedClose { line: usize },

    #[error("line {line}: '{{' without a node name")]
    UnexpectedOpen { line: usize },

    #[error("line {line}: node '{name}' is not followed by '{{'")]
    MissingOpenBrace { name: String, line: usize },

    #[error("node '{name}' is never closed")]
    UnclosedNode { name: String },

    #[error("line {line}: malformed entry")]
    Malformed { line: usize },

    #[error("expected a single root node, found {nodes} nodes and {values} values")]
    NotSingleRoot { nodes: usize, values: usize },
}

pub type Result<T> = std::result::Result<T, DocumentError>;

/// Document-level failures. Any of these aborts the load and leaves the
/// store empty.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum LoadError {
    #[error("route document has no version")]
    MissingVersion,

    #[error("route document version '{0}' is not supported (expected 1)")]
    UnsupportedVersion(String),

    #[error("route document has no satellite data")]
    NoSatellites,

    /// The file exists but does not parse, typically a save cut short
    #[error("route document could not be read: {0}")]
    Unreadable(String),
}

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid network fixture: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Station(#[from] ground_stations::StationError),

    #[error("invalid planner settings: {0}")]
    Planner(#[from] beam_routing::RoutingError),
}
