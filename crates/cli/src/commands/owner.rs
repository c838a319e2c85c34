//! Ownership check report.

use basket_storefront::sync::SyncOutcome;

fn describe(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::FirstRun { current } => {
            format!("Owner: {current} (first run, cart kept)")
        }
        SyncOutcome::Unchanged { current } => format!("Owner: {current} (unchanged)"),
        SyncOutcome::Invalidated { previous, current } => {
            format!("Owner: {current} (was {previous}, cart cleared)")
        }
        SyncOutcome::Skipped { reason } => format!("Owner: unknown (check skipped: {reason})"),
    }
}

/// Print the outcome of the ownership check.
#[allow(clippy::print_stdout)]
pub fn print(outcome: &SyncOutcome) {
    println!("{}", describe(outcome));
}
