mod prefix;

pub use prefix::{absolute_key, normalize_prefix};

/// Default Consul HTTP API address
pub const DEFAULT_CONSUL_ADDR: &str = "http://127.0.0.1:8500";

/// Default glue used to join array values into a single value
pub const DEFAULT_ARRAY_GLUE: &str = "\n";

/// Render a stored value for human-readable output
pub fn printable(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}
