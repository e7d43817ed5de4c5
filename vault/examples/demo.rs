//! Interactive CLI demo of a full Solera deployment lifecycle.
//!
//! Walks through bootstrap, depositor funding, locked deposits, a
//! scheduled rebase observed through time-travel balance queries, an
//! APR follow-up, the freeze-and-bridge sweep, display suppression, and
//! the redemption window. The clock is an explicit parameter, so the
//! demo fast-forwards weeks in microseconds. The output uses ANSI escape
//! codes for colored, storytelling-style terminal rendering.
//!
//! Run with:
//!   cargo run --example demo --release

use std::time::Instant;

use solera_ledger::config;
use solera_ledger::identity::Address;
use solera_vault::base_asset::BaseAsset;
use solera_vault::bridge::{BridgeSink, Destination};
use solera_vault::deployment::{Deployment, DeploymentConfig};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const ITALIC: &str = "\x1b[3m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

const BG_BLUE: &str = "\x1b[44m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn banner() {
    println!();
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    SOLERA  --  Rebasing Lock Vault Lifecycle Demo                  {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    Version 0.1.0  |  shares x rate, one custody pool, one bridge   {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!();
}

fn section(num: u32, title: &str) {
    println!();
    println!(
        "{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]=============================================================={RESET}"
    );
    println!("{BOLD}{WHITE}  {title}{RESET}");
    println!(
        "{CYAN}------------------------------------------------------------------------{RESET}"
    );
}

fn subsection(text: &str) {
    println!("{DIM}{CYAN}  >> {text}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn timing(label: &str, elapsed: std::time::Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    println!("{DIM}{MAGENTA}  [{label}: {ms:.2} ms]{RESET}");
}

fn address_display(name: &str, addr: &str, color: &str) {
    let prefix = &addr[..7];
    let suffix = &addr[addr.len().saturating_sub(8)..];
    println!(
        "  {color}{BOLD}{name}{RESET}  {DIM}{prefix}...{suffix}{RESET}  {DIM}({} chars){RESET}",
        addr.len()
    );
}

fn balance_row(name: &str, balance: u64, unit: &str, color: &str) {
    println!("  {color}{BOLD}{name:<12}{RESET}  {WHITE}{balance:>12}{RESET} {DIM}{unit}{RESET}");
}

fn rate_row(label: &str, rate: u64, base: u64) {
    let whole = rate / base;
    let frac = rate % base;
    println!(
        "  {WHITE}{BOLD}{label:<24}{RESET} {YELLOW}{whole}.{frac:08}{RESET} {DIM}assets per share{RESET}"
    );
}

fn separator() {
    println!(
        "{DIM}{CYAN}  . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . {RESET}"
    );
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

const DAY: u64 = 86_400;

fn main() {
    let demo_start = Instant::now();
    banner();

    // Day zero of the deployment; every later instant is an offset.
    let t0: u64 = 1_767_225_600; // 2026-01-01 00:00:00 UTC

    // -----------------------------------------------------------------------
    // Step 1: Deployment Bootstrap
    // -----------------------------------------------------------------------

    section(1, "Deployment Bootstrap");
    subsection("Deriving system accounts and wiring the four components...");

    let governor = Address::derive("demo/governor");
    let rate_setter = Address::derive("demo/rate-setter");

    let t = Instant::now();
    let mut d = Deployment::bootstrap(DeploymentConfig::devnet(governor, rate_setter), t0);
    timing("bootstrap", t.elapsed());

    let base = d.token().base();
    let custody = *d.vault().custody();
    let escrow = *d.sink().escrow();

    println!();
    address_display("Custody ", &custody.to_bech32(), CYAN);
    address_display("Escrow  ", &escrow.to_bech32(), MAGENTA);
    println!();

    info("Network", &config::network_name(d.network()));
    info("Token", &format!("{} ({})", d.token().name(), d.token().symbol()));
    info("Fingerprint", config::PROTOCOL_FINGERPRINT);
    rate_row("Rate at genesis", d.token().share_rate(t0), base);
    success("Deployment bootstrapped; custody holds the minter role");

    // -----------------------------------------------------------------------
    // Step 2: Depositor Funding
    // -----------------------------------------------------------------------

    section(2, "Depositor Funding (devnet faucet)");
    subsection("Minting base asset to three depositors...");

    let alice = Address::derive("demo/alice");
    let bob = Address::derive("demo/bob");
    let carol = Address::derive("demo/carol");

    d.fund(&alice, 500_000).unwrap();
    d.fund(&bob, 300_000).unwrap();
    d.fund(&carol, 150_000).unwrap();

    println!();
    println!("  {BOLD}{WHITE}--- Initial SLR Balances ---{RESET}");
    balance_row("Alice", d.asset().balance_of(&alice), "drams", BLUE);
    balance_row("Bob", d.asset().balance_of(&bob), "drams", GREEN);
    balance_row("Carol", d.asset().balance_of(&carol), "drams", MAGENTA);
    println!();
    success("Depositors funded and ready to lock");

    // -----------------------------------------------------------------------
    // Step 3: Locked Deposits
    // -----------------------------------------------------------------------

    section(3, "Locked Deposits with Bridge Designations");
    subsection("Each depositor locks SLR and names where bridged value should land...");

    let t = Instant::now();
    let r1 = d
        .deposit(&alice, 400_000, Destination::from_bytes([0xA1; 32]), t0)
        .unwrap();
    let r2 = d
        .deposit(&bob, 250_000, Destination::from_bytes([0xB2; 32]), t0)
        .unwrap();
    let r3 = d
        .deposit(&carol, 100_000, Destination::from_bytes([0xC3; 32]), t0)
        .unwrap();
    timing("3 deposits", t.elapsed());

    info("Alice's receipt", &r1.id.to_string());
    info("Shares minted", &format!("{} + {} + {}", r1.shares_minted, r2.shares_minted, r3.shares_minted));
    info("Custody pool", &format!("{} drams", d.asset().balance_of(&custody)));
    info(
        "vSLR supply",
        &format!("{} (1:1 with shares at the base rate)", d.token().total_supply(t0).unwrap()),
    );
    success("Deposits pulled into one custody pool; receipts minted 1:1");

    // -----------------------------------------------------------------------
    // Step 4: Scheduled Rebase, Observed by Time Travel
    // -----------------------------------------------------------------------

    section(4, "Rebase by Rate: +8% over 30 days");
    subsection("The rate-setter arms a schedule; balances grow with the clock alone...");

    let target = base + 8 * base / 100;
    let note = d
        .rebase_by_rate(&rate_setter, target, t0 + 30 * DAY, t0)
        .unwrap();

    info("Rebase note", &note.id.to_string());
    rate_row("Anchored rate", note.anchored_rate, base);
    rate_row("Target rate", note.target_rate, base);
    info("Settles at", &format!("t0 + {} days", (note.update_end - t0) / DAY));

    separator();
    println!();
    println!("  {BOLD}{WHITE}--- Alice's vSLR Balance Through the Window ---{RESET}");
    let mut previous = 0;
    for days in [0u64, 10, 15, 30, 45] {
        let now = t0 + days * DAY;
        let balance = d.token().balance_of(&alice, now).unwrap();
        assert!(balance >= previous, "accrual must be monotone");
        previous = balance;
        println!(
            "  {WHITE}t0 + {days:>2} days{RESET}  {YELLOW}{balance:>12}{RESET} {DIM}vSLR  (phase: {}){RESET}",
            d.token().schedule_phase(now)
        );
    }
    println!();
    success("No ledger mutation occurred between those five queries");

    // -----------------------------------------------------------------------
    // Step 5: APR Follow-Up
    // -----------------------------------------------------------------------

    section(5, "Rebase by APR: 5% per year for the next 90 days");
    subsection("The APR path computes its target from the live rate...");

    let now = t0 + 45 * DAY;
    let apr = config::apr_from_bps(500, base);
    let note = d
        .rebase_by_apr(&rate_setter, apr, now + 90 * DAY, now)
        .unwrap();

    rate_row("Anchored (live) rate", note.anchored_rate, base);
    rate_row("Computed target", note.target_rate, base);

    let settle = now + 90 * DAY;
    println!();
    println!("  {BOLD}{WHITE}--- vSLR Balances at Settlement (t0 + 135 days) ---{RESET}");
    balance_row("Alice", d.token().balance_of(&alice, settle).unwrap(), "vSLR", BLUE);
    balance_row("Bob", d.token().balance_of(&bob, settle).unwrap(), "vSLR", GREEN);
    balance_row("Carol", d.token().balance_of(&carol, settle).unwrap(), "vSLR", MAGENTA);
    println!();
    success("Yield accrued to every holder without touching a single balance entry");

    // -----------------------------------------------------------------------
    // Step 6: Freeze and Bridge Sweep
    // -----------------------------------------------------------------------

    section(6, "Freeze, then Sweep Custody to the Bridge");
    subsection("Governance freezes inflow, then forwards the whole pool...");

    let now = settle + DAY;
    d.set_frozen(&governor, true).unwrap();

    // Frozen means frozen: new deposits bounce.
    let refused = d
        .deposit(&alice, 1_000, Destination::from_bytes([0xA1; 32]), now)
        .unwrap_err();
    info("Deposit while frozen", &format!("refused ({refused})"));

    let t = Instant::now();
    let ticket = d
        .bridge(&governor, &Destination::from_bytes([0xD4; 32]), None, now)
        .unwrap();
    timing("bridge sweep", t.elapsed());

    info("Ticket", &ticket.id.to_string());
    info("Destination", &ticket.destination.to_string()[..16]);
    info("Forwarded", &format!("{} drams", ticket.amount));
    info("Custody after sweep", &format!("{} drams", d.asset().balance_of(&custody)));
    assert_eq!(d.asset().balance_of(&escrow), 750_000);
    success("Entire pool moved to the bridge escrow in one ticket");

    // -----------------------------------------------------------------------
    // Step 7: Display Suppression
    // -----------------------------------------------------------------------

    section(7, "Display Suppression (migration switch)");
    subsection("Holder balances go dark; the supply keeps telling the truth...");

    d.set_display_suppressed(&rate_setter, true).unwrap();
    balance_row("Alice (suppressed)", d.token().balance_of(&alice, now).unwrap(), "vSLR", BLUE);
    info(
        "Total supply",
        &format!("{} vSLR (unaffected)", d.token().total_supply(now).unwrap()),
    );

    d.set_display_suppressed(&rate_setter, false).unwrap();
    balance_row("Alice (restored)", d.token().balance_of(&alice, now).unwrap(), "vSLR", BLUE);
    success("Suppression is a display flag, not a balance mutation");

    // -----------------------------------------------------------------------
    // Step 8: Redemption Window
    // -----------------------------------------------------------------------

    section(8, "Redemption Window");
    subsection("Principal plus yield returns to custody; governance opens redemptions...");

    // The relayer brings value back for the window (devnet shortcut).
    d.fund(&custody, 820_000).unwrap();
    d.set_frozen(&governor, false).unwrap();
    d.set_redemptions_open(&governor, true).unwrap();

    let bob_display = d.token().balance_of(&bob, now).unwrap();
    info("Bob's display balance", &format!("{bob_display} vSLR"));

    let receipt = d.redeem(&bob, &bob, 200_000, now).unwrap();
    info("Requested", &format!("{} vSLR", receipt.requested));
    info("Shares burned", &receipt.shares_burned.to_string());
    info("Paid out", &format!("{} drams", receipt.paid_out));
    println!(
        "  {ITALIC}{DIM}Floor conversions keep the dust ({} dram) in custody, never overpaying.{RESET}",
        receipt.requested - receipt.paid_out
    );
    balance_row("Bob (SLR)", d.asset().balance_of(&bob), "drams", GREEN);
    balance_row("Bob (vSLR)", d.token().balance_of(&bob, now).unwrap(), "vSLR", GREEN);
    success("Redemption burned the receipt and paid from custody");

    // -----------------------------------------------------------------------
    // Final Summary
    // -----------------------------------------------------------------------

    let status = d.status(now).unwrap();
    let total_elapsed = demo_start.elapsed();

    println!();
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    DEMO COMPLETE -- Final Summary                                  {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!();

    println!("  {BOLD}{WHITE}Deployment Statistics:{RESET}");
    println!("  {DIM}----------------------------------------------{RESET}");
    info("Network", &status.network);
    info("Schedule phase", &status.schedule_phase.to_string());
    rate_row("Live rate", status.current_rate, base);
    info("Share holders", &status.holders.to_string());
    info("Total shares", &status.total_shares.to_string());
    info("vSLR supply", &status.total_supply.to_string());
    info("Bridge tickets", &status.bridge_transfers.to_string());
    info("Designations", &status.designations.to_string());
    info("Custody balance", &format!("{} drams", status.custody_balance));
    println!();

    println!("  {BOLD}{WHITE}Invariants Demonstrated:{RESET}");
    println!("  {DIM}----------------------------------------------{RESET}");
    println!("  {GREEN}[1]{RESET} Accrual is monotone and needs no ledger writes");
    println!("  {GREEN}[2]{RESET} Conversions floor both ways; round trips never overpay");
    println!("  {GREEN}[3]{RESET} Freeze gates inflow but never the bridge");
    println!("  {GREEN}[4]{RESET} Suppression hides balances without touching supply");
    println!("  {GREEN}[5]{RESET} Every privileged call names its caller and checks a role");

    println!();
    println!(
        "  {BOLD}{GREEN}Total demo time: {:.2}s (simulated span: 136 days){RESET}",
        total_elapsed.as_secs_f64()
    );
    println!();
}
