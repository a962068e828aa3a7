// Application state module
// Shared runtime state: configuration, data access, sessions, routes and views

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use super::types::Config;
use crate::dao::{DepartmentDao, EmployeeDao};
use crate::handler::{self, Endpoint};
use crate::routing::RouteTable;
use crate::session::SessionStore;
use crate::view::ViewResolverChain;

/// Application state
pub struct AppState {
    pub config: Config,
    pub employees: EmployeeDao,
    pub departments: DepartmentDao,
    pub sessions: SessionStore,
    pub routes: RouteTable<Endpoint>,
    pub views: ViewResolverChain,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    /// Create `AppState` with the seeded demo data
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            employees: EmployeeDao::seeded(),
            departments: DepartmentDao::seeded(),
            sessions: SessionStore::new(Duration::from_secs(config.session.timeout_secs)),
            routes: handler::build_routes(config),
            views: ViewResolverChain::standard(),
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
        }
    }
}
