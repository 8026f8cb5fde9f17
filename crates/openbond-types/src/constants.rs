//! System-wide constants for the OpenBond engines.

/// Seconds a buyer must wait after a purchase before selling.
pub const SELL_COOLDOWN_SECS: u64 = 60;

/// Seconds after a deposit at which the seller may withdraw without
/// buyer approval (3 days).
pub const ESCROW_WITHDRAW_TIMEOUT_SECS: u64 = 3 * 24 * 60 * 60;

/// Basis-point denominator used for transfer fees.
pub const MAX_BPS: u16 = 10_000;

/// Domain separator for the event-log digest.
pub const EVENT_ROOT_DOMAIN: &[u8] = b"openbond:event_root:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenBond";
