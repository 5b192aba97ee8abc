//! Per-session route cache

use crate::document::{read_document, write_document, ConfigNode};
use crate::load::{read_routes, LoadReport};
use crate::save::write_routes;
use crate::{DocumentError, LoadError, Result};
use beam_routing::Route;
use network_core::{NetworkDirectory, NodeId};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Routes keyed by the satellite they start from.
///
/// Ordered by id so saved documents are stable.
#[derive(Debug, Clone, Default)]
pub struct RouteStore {
    routes: BTreeMap<NodeId, Vec<Route>>,
}

impl RouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes from `source`, best first. Empty when nothing is cached.
    pub fn routes(&self, source: NodeId) -> &[Route] {
        self.routes.get(&source).map(Vec::as_slice).unwrap_or_default()
    }

    /// First usable route from `source`.
    pub fn best(&self, source: NodeId) -> Option<&Route> {
        self.routes(source).iter().find(|r| !r.is_tombstoned())
    }

    pub fn set(&mut self, source: NodeId, routes: Vec<Route>) {
        self.routes.insert(source, routes);
    }

    pub fn remove(&mut self, source: NodeId) -> Option<Vec<Route>> {
        self.routes.remove(&source)
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[Route])> + '_ {
        self.routes.iter().map(|(id, routes)| (*id, routes.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Replace the cached routes of every planned satellite.
    pub fn apply_plan(&mut self, plan: BTreeMap<NodeId, Vec<Route>>) -> usize {
        let planned = plan.len();
        for (source, routes) in plan {
            debug!("RouteStore: {} route(s) for {}", routes.len(), source);
            self.routes.insert(source, routes);
        }
        planned
    }

    /// Tombstone every cached route passing through `node`. Returns how many
    /// were cleared.
    pub fn tombstone_through(&mut self, node: NodeId) -> usize {
        let mut cleared = 0;
        for route in self.routes.values_mut().flatten() {
            if !route.is_tombstoned() && route.contains(node) {
                route.tombstone();
                cleared += 1;
            }
        }
        cleared
    }

    /// Rebuild the store from `document`, validated against `network`.
    ///
    /// Existing contents are discarded even when the load aborts.
    pub fn on_load(&mut self, document: &ConfigNode, network: &dyn NetworkDirectory) -> LoadReport {
        self.routes.clear();

        let mut report = LoadReport::default();
        match read_routes(document, network, &mut report) {
            Ok(routes) => {
                self.routes = routes;
                info!(
                    "Loaded {} satellite(s), {} route(s), {} link(s); {} unit(s) skipped",
                    report.satellites,
                    report.routes,
                    report.links,
                    report.skipped.len()
                );
            }
            Err(e) => {
                warn!("Route data not loaded: {}", e);
                report.aborted = Some(e);
            }
        }
        report
    }

    pub fn on_save(&self) -> ConfigNode {
        let document = write_routes(&self.routes);
        info!(
            "Saved route data for {} satellite(s)",
            document.nodes(crate::keys::SATELLITE).count()
        );
        document
    }

    /// Load the document at `path`.
    ///
    /// The store is emptied first. A file that cannot be parsed aborts the
    /// load like any other document-level failure; only I/O errors (missing
    /// file, permissions) are returned as `Err`.
    pub fn load_file(
        &mut self,
        path: impl AsRef<Path>,
        network: &dyn NetworkDirectory,
    ) -> Result<LoadReport> {
        self.routes.clear();

        let path = path.as_ref();
        match read_document(path) {
            Ok(document) => Ok(self.on_load(&document, network)),
            Err(e @ DocumentError::Io(_)) => Err(e),
            Err(e) => {
                warn!("Route data in {:?} not loaded: {}", path, e);
                Ok(LoadReport {
                    aborted: Some(LoadError::Unreadable(e.to_string())),
                    ..LoadReport::default()
                })
            }
        }
    }

    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        write_document(path, &self.on_save())
    }
}
