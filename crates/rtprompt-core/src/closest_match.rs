//! Pick-from-a-list callback built on the similarity index.
//!
//! [`ClosestMatch`] holds the candidate titles and display options. Calling
//! [`ClosestMatch::callback`] turns it into a [`MatchCallback`], which owns
//! the current ranking and Tab selection between invocations.

use crate::console::{Color, TextStyle};
use crate::pipeline::Callback;
use crate::similarity::{SubstringIndex, DEFAULT_BAG_SIZES};
use log::debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DEFAULT_INSTRUCTIONS: &str =
    "Use <TAB> and <ENTER> to select from below. Otherwise press <ENTER> when ready";

/// Receives the final choice on Enter.
pub type SelectHandler = Box<dyn FnMut(String) + Send>;

/// Configuration for a closest-match selection prompt.
///
/// ```
/// use rtprompt_core::closest_match::ClosestMatch;
/// use rtprompt_core::pipeline::Callback;
///
/// let callback = ClosestMatch::new()
///     .candidate("[#1516] Panic when frying eggs", "")
///     .candidate("[#1112] Dry runs too dry", "")
///     .max_shown(7)
///     .callback();
///
/// let output = callback.call("panic", false, false);
/// assert!(output.starts_with("[#1516] Panic when frying eggs\n"));
/// ```
pub struct ClosestMatch {
    /// `(title, secondary ranking text)` in display order
    candidates: Vec<(String, String)>,
    on_select: Option<SelectHandler>,
    max_shown: usize,
    instructions: String,
    show_instructions: bool,
    selected_style: TextStyle,
    instruction_style: TextStyle,
}

impl ClosestMatch {
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
            on_select: None,
            max_shown: 10,
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            show_instructions: false,
            selected_style: TextStyle::fg(Color::Blue),
            instruction_style: TextStyle::fg(Color::BrightBlack),
        }
    }

    /// Add a candidate. `secondary` is matched against but never shown.
    /// Re-adding a title replaces its secondary text in place.
    pub fn candidate(mut self, title: impl Into<String>, secondary: impl Into<String>) -> Self {
        let title = title.into();
        let secondary = secondary.into();
        match self.candidates.iter_mut().find(|(t, _)| *t == title) {
            Some(existing) => existing.1 = secondary,
            None => self.candidates.push((title, secondary)),
        }
        self
    }

    pub fn candidates<I, T, S>(self, candidates: I) -> Self
    where
        I: IntoIterator<Item = (T, S)>,
        T: Into<String>,
        S: Into<String>,
    {
        candidates
            .into_iter()
            .fold(self, |cm, (title, secondary)| cm.candidate(title, secondary))
    }

    pub fn on_select<F>(mut self, handler: F) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        self.on_select = Some(Box::new(handler));
        self
    }

    pub fn max_shown(mut self, max_shown: usize) -> Self {
        self.max_shown = max_shown;
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn show_instructions(mut self, show: bool) -> Self {
        self.show_instructions = show;
        self
    }

    /// Style for the selected line; `TextStyle::default()` leaves it plain.
    pub fn selected_style(mut self, style: TextStyle) -> Self {
        self.selected_style = style;
        self
    }

    pub fn instruction_style(mut self, style: TextStyle) -> Self {
        self.instruction_style = style;
        self
    }

    /// Build the prompt callback.
    pub fn callback(self) -> MatchCallback {
        let ClosestMatch {
            candidates,
            on_select,
            max_shown,
            instructions,
            show_instructions,
            selected_style,
            instruction_style,
        } = self;
        let index = SubstringIndex::new(
            candidates.iter().map(|(title, secondary)| {
                if secondary.is_empty() {
                    title.clone()
                } else {
                    format!("{title} {secondary}")
                }
            }),
            &DEFAULT_BAG_SIZES,
        );
        let titles = candidates.into_iter().map(|(title, _)| title).collect();
        MatchCallback {
            titles,
            index,
            max_shown,
            instructions: show_instructions.then_some(instructions),
            selected_style,
            instruction_style,
            state: Mutex::new(Selection {
                shown: Vec::new(),
                selected: None,
                on_select,
            }),
        }
    }
}

impl Default for ClosestMatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Ranking and Tab selection carried between invocations.
struct Selection {
    /// Candidate indices currently on screen, best first
    shown: Vec<usize>,
    /// Position in `shown` picked with Tab
    selected: Option<usize>,
    on_select: Option<SelectHandler>,
}

impl Selection {
    fn cycle(&mut self) {
        let count = self.shown.len();
        self.selected = match self.selected {
            _ if count == 0 => None,
            Some(i) if i + 1 < count => Some(i + 1),
            _ => Some(0),
        };
    }
}

/// Stateful callback produced by [`ClosestMatch::callback`].
pub struct MatchCallback {
    titles: Vec<String>,
    index: SubstringIndex,
    max_shown: usize,
    /// Shown above the list when set
    instructions: Option<String>,
    selected_style: TextStyle,
    instruction_style: TextStyle,
    state: Mutex<Selection>,
}

impl MatchCallback {
    fn state(&self) -> MutexGuard<'_, Selection> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn selected(&self) -> Option<usize> {
        self.state().selected
    }

    /// Title of the currently selected candidate
    pub fn selected_title(&self) -> Option<String> {
        let state = self.state();
        self.title_at(&state).map(str::to_string)
    }

    fn title_at(&self, state: &Selection) -> Option<&str> {
        let id = *state.shown.get(state.selected?)?;
        self.titles.get(id).map(String::as_str)
    }

    fn select(&self, text: &str) {
        let mut state = self.state();
        let choice = self
            .title_at(&state)
            .map_or_else(|| text.to_string(), str::to_string);
        debug!("closest match selected {choice:?}");
        state.selected = None;
        if let Some(handler) = state.on_select.as_mut() {
            handler(choice);
        }
    }

    fn render(&self, state: &Selection) -> String {
        let mut output = String::new();
        if let Some(instructions) = &self.instructions {
            output.push_str(&self.instruction_style.paint(instructions));
            output.push('\n');
        }
        for (position, &id) in state.shown.iter().enumerate() {
            let title = &self.titles[id];
            if state.selected == Some(position) {
                output.push_str(&self.selected_style.paint(title));
                output.push_str(" (selected)\n");
            } else {
                output.push_str(title);
                output.push('\n');
            }
        }
        output
    }
}

impl Callback for MatchCallback {
    fn call(&self, text: &str, tab: bool, enter: bool) -> String {
        if enter {
            self.select(text);
            return String::new();
        }

        if self.titles.is_empty() {
            return String::new();
        }

        let mut state = self.state();
        if text.is_empty() {
            let n = self.titles.len().min(self.max_shown);
            state.shown = (0..n).collect();
        } else if !tab {
            state.shown = self.index.closest_n(text, self.max_shown);
        }

        if tab {
            state.cycle();
        } else {
            state.selected = None;
        }

        self.render(&state)
    }
}
