//! Plain-text rendering of processed requests.

use std::fmt::Write;

use koscheck_engine::{EntryReport, TailEntry};

pub const DIVIDER: &str = "----------------------------------------";

/// Render one request and its results as plain text.
///
/// ```text
/// [12:00:01] Alice > gf
/// KOS: 1  Not KOS: 1
/// [-] Bob (character: Bob)
/// [+] Carol
/// ----------------------------------------
/// ```
pub fn render(entry: &TailEntry, report: &EntryReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", entry.comment);

    if !report.kos.is_empty() || !report.clear.is_empty() {
        let _ = writeln!(out, "KOS: {}  Not KOS: {}", report.kos.len(), report.clear.len());
    }
    for (name, reason) in &report.kos {
        let _ = writeln!(out, "[-] {} ({})", name, reason);
    }
    for name in &report.clear {
        let _ = writeln!(out, "[+] {}", name);
    }
    if !report.errored.is_empty() {
        let _ = writeln!(out, "Error: {}", report.errored.len());
        for failure in &report.errored {
            let _ = writeln!(out, "{}: {}", failure.name, failure.error);
        }
    }

    out.push_str(DIVIDER);
    out.push('\n');
    out
}
