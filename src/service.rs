pub mod allocator;
pub mod configs;
pub mod enroll;
pub mod error;
pub mod keys;
pub mod setup;

#[cfg(test)]
pub(crate) mod fake;

pub use configs::*;
pub use enroll::*;
pub use error::*;
pub use setup::*;

use crate::traits::RouterApi;

/// Runs the provisioning workflows against one router.
pub struct Provisioner<R> {
    router: R,
}

impl<R: RouterApi> Provisioner<R> {
    pub fn new(router: R) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &R {
        &self.router
    }
}
