use crate::config::types::*;
use crate::constants::DEFAULT_CONN_TIMEOUT;

// Config and the backend sections derive Default

impl Default for ConnectTimeout {
    fn default() -> Self {
        Self(DEFAULT_CONN_TIMEOUT)
    }
}
