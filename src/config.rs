use embassy_time::Duration;

use crate::modules::Module;
use crate::text::UnicodeFallback;

/// Longest command line, prefix and terminator included, that
/// [`AtClient::send_at`] can format.
///
/// [`AtClient::send_at`]: crate::client::AtClient::send_at
pub const MAX_COMMAND_LEN: usize = 256;

/// Session configuration, resolved once when the client is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub(crate) module: Module,
    pub(crate) response_timeout: Duration,
    pub(crate) skip_timeout: Duration,
    pub(crate) network_poll_interval: Duration,
    pub(crate) unicode_fallback: UnicodeFallback,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            module: Module::default(),
            response_timeout: Duration::from_millis(1000),
            skip_timeout: Duration::from_millis(1000),
            network_poll_interval: Duration::from_millis(250),
            unicode_fallback: UnicodeFallback::Placeholder,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new(module: Module) -> Self {
        Self {
            module,
            ..Self::default()
        }
    }

    /// Default timeout used by [`AtClient::wait_response`].
    ///
    /// [`AtClient::wait_response`]: crate::client::AtClient::wait_response
    #[must_use]
    pub const fn response_timeout(mut self, ms: u64) -> Self {
        self.response_timeout = Duration::from_millis(ms);
        self
    }

    #[must_use]
    pub const fn skip_timeout(mut self, ms: u64) -> Self {
        self.skip_timeout = Duration::from_millis(ms);
        self
    }

    #[must_use]
    pub const fn network_poll_interval(mut self, ms: u64) -> Self {
        self.network_poll_interval = Duration::from_millis(ms);
        self
    }

    #[must_use]
    pub const fn unicode_fallback(mut self, fallback: UnicodeFallback) -> Self {
        self.unicode_fallback = fallback;
        self
    }

    pub const fn module(&self) -> Module {
        self.module
    }
}
