//! Config validation command implementation.

use std::path::Path;

use anyhow::{Context, bail};
use tankland::{ArenaConfig, BehaviorCatalog};

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or any roster entry
/// would be turned away.
pub(crate) fn execute(path: &Path) -> anyhow::Result<()> {
    println!("Validating: {}", path.display());
    println!();

    let loaded = ArenaConfig::load(path);
    print_check("Config parses and is in range", loaded.is_ok());
    let config = loaded.with_context(|| format!("invalid config {}", path.display()))?;

    let cells = usize::from(config.board_size) * usize::from(config.board_size);
    print_check("Roster fits on the board", config.roster.len() <= cells);
    print_check("Roster has at least two tanks", config.roster.len() >= 2);

    let report = BehaviorCatalog::builtin().admit(&config.roster);
    for entry in &report.admitted {
        print_check(&format!("{} ({})", entry.name, entry.kind), true);
    }
    for rejected in &report.rejected {
        print_check(
            &format!("{} ({}): {}", rejected.entry.name, rejected.entry.kind, rejected.reason),
            false,
        );
    }

    println!();
    println!("Summary:");
    println!("  Board:        {0}x{0} ({1:?})", config.board_size, config.addressing);
    println!("  Tick:         {}ms", config.timescale_ms);
    println!("  Energy:       {} of {}", config.starting_energy, config.max_energy);
    println!("  Admitted:     {}", report.admitted.len());
    println!("  Rejected:     {}", report.rejected_count());

    if report.rejected_count() > 0 {
        bail!("{} roster entries would be rejected", report.rejected_count());
    }

    println!();
    println!("Validation successful!");
    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}
