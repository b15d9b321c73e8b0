//! Read-only collaborators shared by every reducer call.

use std::rc::Rc;

use platform_host::{Clock, SystemClock};

use crate::{catalog::ShellCatalog, config::ShellConfig};

#[derive(Clone)]
/// Configuration, catalog, and time source injected into [`crate::reducer::reduce_shell`].
pub struct ShellEnv {
    pub config: ShellConfig,
    pub catalog: ShellCatalog,
    pub clock: Rc<dyn Clock>,
}

impl ShellEnv {
    pub fn new(config: ShellConfig, catalog: ShellCatalog, clock: Rc<dyn Clock>) -> Self {
        Self {
            config,
            catalog,
            clock,
        }
    }

    /// Default configuration, the embedded catalog, and the wall clock.
    ///
    /// # Errors
    ///
    /// Returns an error when the embedded catalog fails to parse.
    pub fn builtin() -> Result<Self, String> {
        Ok(Self::new(
            ShellConfig::default(),
            ShellCatalog::builtin()?,
            Rc::new(SystemClock),
        ))
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

impl std::fmt::Debug for ShellEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellEnv")
            .field("config", &self.config)
            .field("now_ms", &self.now_ms())
            .finish_non_exhaustive()
    }
}
