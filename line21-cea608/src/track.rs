// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-channel caption state machine.
//!
//! Each logical channel runs one [`TrackState`]. Global control codes switch the presentation
//! mode and manipulate the displayed/non-displayed memories; everything else is data that lands
//! in the buffer selected by the current mode. Output-format policy (what to emit and when)
//! belongs to the caller: [`TrackState::process`] performs the state transition and reports it
//! as a [`GlobalAction`] the caller acts on.

use crate::classify::{ClassifiedRow, RowContent};
use crate::code::{ChannelCode, ChannelId, Command, ControlCode, PacKind};

/// Capacity of the text-mode row buffer, in columns.
pub const TEXT_COLUMNS: usize = 32;

/// The caption presentation mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CaptionMode {
    PopOn,
    PaintOn,
    RollUp,
    Text,
}

/// The state transition performed for one row.
#[derive(Clone, Debug, PartialEq)]
pub enum GlobalAction {
    /// An all-zero stuffing row; nothing happened.
    Skip,
    /// Not a global control code; the row is data for the current mode. Carries whether the
    /// row is a carriage return repeating the immediately preceding code (the doubled control
    /// transmission), which text mode uses as its flush trigger.
    NotGlobal { repeated_carriage_return: bool },
    /// A global code repeating the immediately preceding one; already acted on.
    Duplicate,
    ResumeCaptionLoading,
    ResumeDirectCaptioning,
    /// Roll-up started; carries the undisplayed remainder of a previous roll-up session.
    StartRollUp { cleared: Vec<ClassifiedRow> },
    ResumeTextDisplay,
    TextRestart,
    /// Displayed and non-displayed memories were swapped.
    FlipBuffers,
    /// The displayed memory (or the roll-up buffer, in roll-up mode) was erased; carries its
    /// contents from before the erase.
    EraseDisplayed { cleared: Vec<ClassifiedRow> },
    EraseNonDisplayed,
}

/// The state of one logical caption channel.
pub struct TrackState {
    channel: ChannelId,
    pub mode: CaptionMode,
    pub displayed: Vec<ClassifiedRow>,
    pub non_displayed: Vec<ClassifiedRow>,
    pub roll_up: Vec<ClassifiedRow>,
    pub roll_up_len: usize,
    text: Vec<Option<ClassifiedRow>>,
    text_cursor: usize,
    prev_code: Option<ChannelCode>,
}

impl TrackState {
    pub fn new(channel: ChannelId) -> TrackState {
        TrackState {
            channel,
            mode: CaptionMode::PopOn,
            displayed: Vec::new(),
            non_displayed: Vec::new(),
            roll_up: Vec::new(),
            roll_up_len: 2,
            text: vec![None; TEXT_COLUMNS],
            text_cursor: 0,
            prev_code: None,
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Applies one row to the state machine and reports the transition taken.
    ///
    /// Global codes are debounced: of the doubled transmission only the first acts, the second
    /// reports [`GlobalAction::Duplicate`].
    pub fn process(&mut self, row: &ClassifiedRow) -> GlobalAction {
        if row.is_stuffing() {
            return GlobalAction::Skip;
        }

        let (action, update_prev) = self.evaluate(row);

        if update_prev {
            self.prev_code = row.channel_code().copied();
        }

        action
    }

    fn evaluate(&mut self, row: &ClassifiedRow) -> (GlobalAction, bool) {
        let code = match row.content {
            RowContent::Control(ref code) => code,
            RowContent::Text(_) => {
                return (GlobalAction::NotGlobal { repeated_carriage_return: false }, true);
            }
        };

        // A control code with both bytes corrupt cannot be trusted at all: treat it as data
        // and leave the debounce state untouched.
        if !row.byte1_parity_ok && !row.byte2_parity_ok {
            return (GlobalAction::NotGlobal { repeated_carriage_return: false }, false);
        }

        let repeated = self.prev_code.as_ref() == Some(code);

        let command = match code.command() {
            Some(command) => command,
            None => {
                let cr = repeated && code.is_carriage_return();
                return (GlobalAction::NotGlobal { repeated_carriage_return: cr }, true);
            }
        };

        let action = match command {
            Command::ResumeCaptionLoading if !repeated => {
                self.mode = CaptionMode::PopOn;
                GlobalAction::ResumeCaptionLoading
            }
            Command::ResumeDirectCaptioning if !repeated => {
                self.mode = CaptionMode::PaintOn;
                GlobalAction::ResumeDirectCaptioning
            }
            Command::RollUp(rows) if !repeated => {
                self.mode = CaptionMode::RollUp;
                self.roll_up_len = usize::from(rows);
                // Starting a roll-up wipes both memories; report what was pending.
                let cleared = std::mem::take(&mut self.roll_up);
                self.non_displayed.clear();
                GlobalAction::StartRollUp { cleared }
            }
            Command::ResumeTextDisplay if !repeated => {
                self.mode = CaptionMode::Text;
                GlobalAction::ResumeTextDisplay
            }
            Command::TextRestart if !repeated => {
                self.mode = CaptionMode::Text;
                GlobalAction::TextRestart
            }
            Command::EndOfCaption if !repeated => {
                std::mem::swap(&mut self.displayed, &mut self.non_displayed);
                GlobalAction::FlipBuffers
            }
            Command::EraseDisplayedMemory if !repeated => {
                let cleared = if self.mode == CaptionMode::RollUp {
                    std::mem::take(&mut self.roll_up)
                }
                else {
                    std::mem::take(&mut self.displayed)
                };
                GlobalAction::EraseDisplayed { cleared }
            }
            Command::EraseNonDisplayedMemory if !repeated => {
                self.non_displayed.clear();
                GlobalAction::EraseNonDisplayed
            }
            Command::ResumeCaptionLoading
            | Command::ResumeDirectCaptioning
            | Command::RollUp(_)
            | Command::ResumeTextDisplay
            | Command::TextRestart
            | Command::EndOfCaption
            | Command::EraseDisplayedMemory
            | Command::EraseNonDisplayedMemory => GlobalAction::Duplicate,
            // The remaining commands (carriage return, backspace, tab, and friends) are data
            // for the current mode.
            _ => {
                let cr = repeated && command == Command::CarriageReturn;
                GlobalAction::NotGlobal { repeated_carriage_return: cr }
            }
        };

        (action, true)
    }

    pub fn push_displayed(&mut self, row: &ClassifiedRow) {
        self.displayed.push(row.clone());
    }

    pub fn push_non_displayed(&mut self, row: &ClassifiedRow) {
        self.non_displayed.push(row.clone());
    }

    /// Appends a row to the roll-up buffer, enforcing the display geometry: the buffer holds at
    /// most `roll_up_len` display lines, dropping the oldest on carriage return. A carriage
    /// return identical to the last buffered row is the doubled transmission and is ignored.
    pub fn push_roll_up(&mut self, row: &ClassifiedRow) {
        if row.is_carriage_return() {
            if self.roll_up.last().map_or(false, |last| last.content == row.content) {
                return;
            }

            self.roll_up.push(row.clone());

            let breaks = self.roll_up.iter().filter(|r| r.is_carriage_return()).count();
            if breaks >= self.roll_up_len {
                // Scroll: drop everything up to and including the oldest line break.
                let first = self.roll_up.iter().position(|r| r.is_carriage_return()).unwrap();
                self.roll_up.drain(..=first);
            }
        }
        else {
            self.roll_up.push(row.clone());
        }
    }

    /// Applies a text-mode row to the cursor buffer.
    ///
    /// Indent preambles reposition the cursor without a line break (TeleCaption I data
    /// interruption recovery). A carriage return repeating the previous code flushes; the
    /// flushed rows are returned.
    pub fn text_apply(
        &mut self,
        row: &ClassifiedRow,
        repeated_carriage_return: bool,
    ) -> Option<Vec<ClassifiedRow>> {
        if let Some(ChannelCode { code: ControlCode::Preamble(pac), .. }) = row.channel_code() {
            if let PacKind::Indent(column) = pac.kind {
                self.text_cursor = usize::from(column).min(TEXT_COLUMNS - 1);
            }
        }

        if repeated_carriage_return && row.is_carriage_return() {
            Some(self.take_text())
        }
        else {
            self.text_insert(row);
            None
        }
    }

    /// Writes a row at the text cursor; the cursor saturates at the last column.
    pub fn text_insert(&mut self, row: &ClassifiedRow) {
        self.text[self.text_cursor] = Some(row.clone());
        self.text_cursor = (self.text_cursor + 1).min(TEXT_COLUMNS - 1);
    }

    /// Takes the written prefix of the text buffer and resets the cursor.
    pub fn take_text(&mut self) -> Vec<ClassifiedRow> {
        let rows = self.text[..self.text_cursor].iter().filter_map(|slot| slot.clone()).collect();
        self.clear_text();
        rows
    }

    pub fn clear_text(&mut self) {
        self.text.iter_mut().for_each(|slot| *slot = None);
        self.text_cursor = 0;
    }
}
