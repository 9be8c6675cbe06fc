//! Closest Match Example - pick an issue by typing part of its summary
//!
//! Usage: cargo run --example closest_match
//! Type to filter, <TAB> to cycle through the matches, <ENTER> to choose.

use rtprompt::prelude::*;
use std::sync::{Arc, Mutex};

const ISSUES: [&str; 9] = [
    "[#1011] LSPs too optimized",
    "[#1112] Dry runs too dry",
    "[#1213] All hands on deck",
    "[#1314] Leak in the Enterprise",
    "[#1415] Exception thrown during cardio",
    "[#1516] Panic when frying eggs",
    "[#1617] Frying eggs when panicking",
    "[#1618] Nothing to report, just lonely",
    "[#1619] Bloody onions when expecting uncontaminated ones",
];

fn main() -> PromptResult<()> {
    let selected = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&selected);

    let matcher = ClosestMatch::new()
        .candidates(ISSUES.iter().map(|title| (*title, "")))
        .on_select(move |s| *sink.lock().unwrap() = s)
        .max_shown(7)
        .show_instructions(true);

    let prompt = Prompt::builder()
        .with_prefix("Summary: ")
        .with_matcher(matcher)
        .build()?;

    match prompt.spawn().wait()? {
        Outcome::Submitted(_) => {
            println!("Woohoo! You selected: {}", selected.lock().unwrap());
        }
        Outcome::Cancelled | Outcome::Interrupted => println!("Nothing selected"),
    }
    Ok(())
}
