//! # Protocol Configuration & Constants
//!
//! Every magic number in Solera lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! These values define the economics of the deposit program. Changing them
//! after the lock period opens is somewhere between "difficult" and
//! "career-ending", so choose wisely during devnet.

use crate::rate::Rate;

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// Mainnet — the real deal. Mistakes here cost real money.
pub const NETWORK_ID_MAINNET: u32 = 0x534F4C52; // "SOLR" in ASCII hex. Yes, we're that cute.

/// Testnet — where we break things on purpose and call it "testing."
pub const NETWORK_ID_TESTNET: u32 = 0x534F4C54; // "SOLT"

/// Devnet — the wild west. Reset weekly, no promises, no survivors.
pub const NETWORK_ID_DEVNET: u32 = 0x534F4C44; // "SOLD"

/// Human-readable network prefixes for addresses.
/// Bech32 HRP values — short enough to type, long enough to be unambiguous.
pub const MAINNET_HRP: &str = "slr";
pub const TESTNET_HRP: &str = "tslr";
pub const DEVNET_HRP: &str = "dslr";

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Protocol fingerprint for deployment identification. Reported by the
/// status endpoint so operators can tell at a glance which program
/// generation is serving them. Also the seed prefix for the derived
/// custody and escrow accounts.
pub const PROTOCOL_FINGERPRINT: &str = "ALAS-SOLERA-2026";

/// Major version — bump on breaking accounting changes. A.k.a. migrations.
pub const PROTOCOL_VERSION_MAJOR: u16 = 0;

/// Minor version — bump on backward-compatible additions.
pub const PROTOCOL_VERSION_MINOR: u16 = 1;

/// Patch version — bump on non-accounting bug fixes.
pub const PROTOCOL_VERSION_PATCH: u16 = 0;

/// The full version string, assembled at compile time so we don't allocate
/// for something this trivial at runtime.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Rate Parameters
// ---------------------------------------------------------------------------

/// Default number of display decimals for the rebasing token.
/// 8 decimals, same as Bitcoin. We're not reinventing this wheel.
pub const DISPLAY_DECIMALS: u8 = 8;

/// Upper bound on display decimals. Twelve is already more precision than
/// any exchange UI will render; beyond that the fixed-point base starts
/// eating into the headroom we rely on for conversion arithmetic.
pub const MAX_DECIMALS: u8 = 12;

/// Hard ceiling on the share rate, in fixed-point rate units.
///
/// With rates capped here and amounts capped at `u64::MAX`, every
/// multiply-before-divide product in the conversion and interpolation
/// paths fits in a `u128`. The ceiling is absurdly far above any rate a
/// sane rebase schedule can reach — it exists so the arithmetic has a
/// provable bound, not to constrain yield.
pub const MAX_RATE: Rate = 1_000_000_000_000_000_000; // 10^18

/// Seconds in a (non-leap) year. APR math uses the flat 365-day year —
/// the same convention as every fixed-income desk since the abacus.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Default ceiling for APR-style rebases, in basis points. 20% a year is
/// generous for a yield-bearing deposit receipt; anything above that is
/// either a typo or a governance compromise, and both should bounce.
pub const DEFAULT_MAX_APR_BPS: u32 = 2_000;

/// Basis-point denominator. 1 bp = 0.01%.
pub const BPS_DENOMINATOR: u64 = 10_000;

// ---------------------------------------------------------------------------
// Network Parameters
// ---------------------------------------------------------------------------

/// Default RPC API port.
pub const DEFAULT_RPC_PORT: u16 = 9750;

/// Default metrics (Prometheus) port.
pub const DEFAULT_METRICS_PORT: u16 = 9751;

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns the fixed-point base for a given number of display decimals.
///
/// The base is the rate at which one share equals exactly one asset unit.
/// Callers clamp `decimals` to [`MAX_DECIMALS`] before reaching this point,
/// but the `u32` exponent keeps even a wild input inside `u64` range.
pub fn rate_base(decimals: u8) -> Rate {
    10u64.pow(u32::from(decimals.min(MAX_DECIMALS)))
}

/// Converts an APR expressed in basis points to fixed-point rate units
/// for a token with the given base. Clamped to [`MAX_RATE`] so a fat-
/// fingered bps value cannot smuggle an unrepresentable rate downstream.
pub fn apr_from_bps(bps: u32, base: Rate) -> Rate {
    let scaled = u128::from(base) * u128::from(bps) / u128::from(BPS_DENOMINATOR);
    scaled.min(u128::from(MAX_RATE)) as Rate
}

/// Returns the human-readable prefix for a given network ID.
/// Returns `None` for unrecognized networks — we don't guess.
pub fn hrp_for_network(network_id: u32) -> Option<&'static str> {
    match network_id {
        NETWORK_ID_MAINNET => Some(MAINNET_HRP),
        NETWORK_ID_TESTNET => Some(TESTNET_HRP),
        NETWORK_ID_DEVNET => Some(DEVNET_HRP),
        _ => None,
    }
}

/// Returns a friendly name for a network ID, mainly for logging.
/// Unknown networks get a hex dump because we're helpful like that.
pub fn network_name(network_id: u32) -> String {
    match network_id {
        NETWORK_ID_MAINNET => "mainnet".to_string(),
        NETWORK_ID_TESTNET => "testnet".to_string(),
        NETWORK_ID_DEVNET => "devnet".to_string(),
        other => format!("unknown(0x{:08X})", other),
    }
}

/// Resolves a network name (as typed on a CLI) to its network ID.
/// Case-sensitive on purpose: "Mainnet" is a typo, not a network.
pub fn network_id(name: &str) -> Option<u32> {
    match name {
        "mainnet" => Some(NETWORK_ID_MAINNET),
        "testnet" => Some(NETWORK_ID_TESTNET),
        "devnet" => Some(NETWORK_ID_DEVNET),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_ids_are_distinct() {
        // If these collide, someone has been editing hex while sleep-deprived.
        assert_ne!(NETWORK_ID_MAINNET, NETWORK_ID_TESTNET);
        assert_ne!(NETWORK_ID_MAINNET, NETWORK_ID_DEVNET);
        assert_ne!(NETWORK_ID_TESTNET, NETWORK_ID_DEVNET);
    }

    #[test]
    fn test_network_ids_are_valid_ascii() {
        // Each ID should decode to a readable 4-char ASCII tag.
        for id in [NETWORK_ID_MAINNET, NETWORK_ID_TESTNET, NETWORK_ID_DEVNET] {
            let bytes = id.to_be_bytes();
            assert!(bytes.iter().all(|b| b.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_protocol_fingerprint_format() {
        // Fingerprint must be non-empty and contain the program family name.
        assert!(!PROTOCOL_FINGERPRINT.is_empty());
        assert!(PROTOCOL_FINGERPRINT.contains("SOLERA"));
    }

    #[test]
    fn test_hrp_for_known_networks() {
        assert_eq!(hrp_for_network(NETWORK_ID_MAINNET), Some("slr"));
        assert_eq!(hrp_for_network(NETWORK_ID_TESTNET), Some("tslr"));
        assert_eq!(hrp_for_network(NETWORK_ID_DEVNET), Some("dslr"));
    }

    #[test]
    fn test_hrp_for_unknown_network() {
        assert_eq!(hrp_for_network(0xDEADBEEF), None);
    }

    #[test]
    fn test_network_name_formatting() {
        assert_eq!(network_name(NETWORK_ID_MAINNET), "mainnet");
        assert_eq!(network_name(0xCAFEBABE), "unknown(0xCAFEBABE)");
    }

    #[test]
    fn test_network_id_resolves_names() {
        assert_eq!(network_id("mainnet"), Some(NETWORK_ID_MAINNET));
        assert_eq!(network_id("testnet"), Some(NETWORK_ID_TESTNET));
        assert_eq!(network_id("devnet"), Some(NETWORK_ID_DEVNET));
        assert_eq!(network_id("Mainnet"), None);
        assert_eq!(network_id("localhost"), None);
    }

    #[test]
    fn test_rate_base_scales_with_decimals() {
        assert_eq!(rate_base(0), 1);
        assert_eq!(rate_base(2), 100);
        assert_eq!(rate_base(DISPLAY_DECIMALS), 100_000_000);
        // Out-of-range decimals clamp instead of overflowing.
        assert_eq!(rate_base(200), rate_base(MAX_DECIMALS));
    }

    #[test]
    fn test_seconds_per_year_matches_flat_convention() {
        assert_eq!(SECONDS_PER_YEAR, 365 * 24 * 60 * 60);
    }

    #[test]
    fn test_apr_from_bps_scaling() {
        let base = rate_base(DISPLAY_DECIMALS);
        // 100 bps = 1% of the base.
        assert_eq!(apr_from_bps(100, base), base / 100);
        // The default ceiling is 20% of the base.
        assert_eq!(apr_from_bps(DEFAULT_MAX_APR_BPS, base), base / 5);
        // Garbage bps values clamp at the rate ceiling rather than wrapping.
        assert_eq!(apr_from_bps(u32::MAX, MAX_RATE), MAX_RATE);
    }

    #[test]
    fn test_rate_ceiling_leaves_conversion_headroom() {
        // The worst-case conversion product must fit in a u128, or the
        // checked arithmetic downstream stops being a formality.
        let worst = u128::from(MAX_RATE).checked_mul(u128::from(u64::MAX));
        assert!(worst.is_some());
    }

    #[test]
    fn test_default_ports_are_distinct() {
        assert_ne!(DEFAULT_RPC_PORT, DEFAULT_METRICS_PORT);
    }
}
