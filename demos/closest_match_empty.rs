//! Closest Match Example with no candidates
//!
//! Usage: cargo run --example closest_match_empty
//! Nothing is rendered below the prompt; <ENTER> hands back what was typed.

use rtprompt::prelude::*;
use std::sync::{Arc, Mutex};

fn main() -> PromptResult<()> {
    let selected = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&selected);

    let matcher = ClosestMatch::new()
        .on_select(move |s| *sink.lock().unwrap() = s)
        .max_shown(7)
        .show_instructions(true);

    let outcome = Prompt::builder()
        .with_prefix("Summary: ")
        .with_matcher(matcher)
        .build()?
        .spawn()
        .wait()?;

    if let Outcome::Submitted(_) = outcome {
        println!("Woohoo! You selected: {}", selected.lock().unwrap());
    }
    Ok(())
}
