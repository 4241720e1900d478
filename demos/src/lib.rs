//! qtape Demo Suite
//!
//! Demonstrations of recording tapes, expanding measurements, and preparing
//! tapes for devices with different capabilities.

pub mod circuits;

use console::style;
use qtape_ir::prelude::*;
use qtape_ir::TapeSpecs;

const RULE_WIDTH: usize = 56;

/// Print a boxed title.
pub fn print_header(title: &str) {
    let rule = style("═".repeat(RULE_WIDTH)).cyan();
    println!("\n{rule}\n{}\n{rule}", style(format!("  {title}")).cyan().bold());
}

/// Print a section title followed by a thin rule.
pub fn print_section(title: &str) {
    println!("\n{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(RULE_WIDTH / 2)).dim());
}

/// Print one `label: value` line.
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<12} {value}", style(format!("{label}:")).dim());
}

/// Print the size summary of a tape.
pub fn print_specs(specs: &TapeSpecs) {
    print_field("wires", specs.num_wires);
    print_field("operations", specs.num_operations);
    print_field("depth", specs.depth);
    let counts: Vec<String> = specs
        .gate_counts
        .iter()
        .map(|(name, count)| format!("{name}×{count}"))
        .collect();
    print_field("gates", counts.join(" "));
}

/// Print one line per measurement, showing the observable or the eigenvalues
/// that replaced it.
pub fn print_measurements(tape: &Tape) {
    for m in tape.measurements() {
        let detail = match (m.observable(), m.eigvals()) {
            (Some(obs), _) => format!("{} on {}", obs.name(), m.wires()),
            (None, Some(eigvals)) => format!("{} eigvals {eigvals:?}", m.wires()),
            (None, None) => format!("{}", m.wires()),
        };
        print_field(m.return_type().name(), detail);
    }
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("\n{} {message}", style("✓").green().bold());
}
