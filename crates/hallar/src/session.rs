//! The document-scoped entry point.

use std::sync::Arc;

use crate::driver::Driver;
use crate::element::Scope;
use crate::finder::Finder;

/// A session wraps one driver and serves as the document-root query scope.
///
/// Navigation and window management belong to the driver's own surface;
/// the session only provides the [`Finder`] facade at document scope.
#[derive(Debug, Clone)]
pub struct Session {
    driver: Arc<dyn Driver>,
}

impl Session {
    /// Create a session over a driver
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    /// The underlying driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }
}

impl Finder for Session {
    fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    fn scope(&self) -> Scope {
        Scope::Document
    }
}
