//! Satellite Registry
//!
//! Tracks which nodes have working comms hardware. A node is either
//! simulated (live signal processors) or dormant (a proto processor built
//! from its last snapshot), never both.

pub mod processor;
pub mod registry;
pub mod satellite;
pub mod vessel;

pub use processor::{LiveProcessor, ProcessorHandle, ProcessorId, ProtoProcessor, SignalProcessor};
pub use registry::{ListenerId, RegistryEvent, Representation, SatelliteRegistry};
pub use satellite::Satellite;
pub use vessel::{VesselCatalog, VesselSnapshot, VesselSource};
