//! Behaviors command implementation.

use tankland::BehaviorCatalog;

/// Execute the behaviors command.
pub(crate) fn execute() {
    let catalog = BehaviorCatalog::builtin();

    println!("Built-in behaviors:");
    println!();
    for entry in catalog.entries() {
        println!("  {:<10} {}", entry.kind, entry.summary);
    }
    println!();
    println!("Use them in a roster as --tank NAME=KIND or a [[tank]] table.");
}
