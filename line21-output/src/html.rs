// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The HTML sink.
//!
//! A styled rendition of the text-mode channels: color and style codes become `<span>`
//! transitions, line breaks become `<br>`, and runs of spaces are preserved with `&nbsp;`.

use std::fmt::Write;

use line21_cea608::classify::{ClassifiedRow, FrameRows};
use line21_cea608::code::{ChannelCode, ChannelId, Color, ControlCode, MidRowStyle, PacKind};
use line21_cea608::demux::{CaptionTrack, TrackDemux};
use line21_cea608::render::{render_caption, CaptionStyler, Styles};
use line21_cea608::track::{CaptionMode, GlobalAction, TrackState};
use line21_core::errors::Result;
use line21_core::units::FrameIndex;

use crate::writer::{OutputTarget, TrackWriter};
use crate::Sink;

const STYLE_TAG: &str = "
<style>
:root {
  /* color variables */
  --white: white;
  --green: green;
  --blue: blue;
  --cyan: cyan;
  --red: red;
  --yellow: yellow;
  --magenta: magenta;
  --black: black;
}

body { font-family: monospace, monospace; background-color: black; }

.text-white { color: var(--white); }
.text-green { color: var(--green); }
.text-blue { color: var(--blue); }
.text-cyan { color: var(--cyan); }
.text-red { color: var(--red); }
.text-yellow { color: var(--yellow); }
.text-magenta { color: var(--magenta); }
.text-black { color: var(--black); }

.background-transparent { background-color: none; }
.background-white { background-color: var(--white); }
.background-green { background-color: var(--green); }
.background-blue { background-color: var(--blue); }
.background-cyan { background-color: var(--cyan); }
.background-red { background-color: var(--red); }
.background-yellow { background-color: var(--yellow); }
.background-magenta { background-color: var(--magenta); }
.background-black { background-color: var(--black); }

.background-white-semi-transparent { background-color: rgb(var(--white) / 0.5); }
.background-green-semi-transparent { background-color: rgb(var(--green) / 0.5); }
.background-blue-semi-transparent { background-color: rgb(var(--blue) / 0.5); }
.background-cyan-semi-transparent { background-color: rgb(var(--cyan) / 0.5); }
.background-red-semi-transparent { background-color: rgb(var(--red) / 0.5); }
.background-yellow-semi-transparent { background-color: rgb(var(--yellow) / 0.5); }
.background-magenta-semi-transparent { background-color: rgb(var(--magenta) / 0.5); }
.background-black-semi-transparent { background-color: rgb(var(--black) / 0.5); }

.underline { text-decoration: underline; }
.italics { font-style: italic; }
</style>
";

/// The styler producing `<span>` class transitions for color and style codes.
struct HtmlStyler {
    background: String,
    text_color: String,
    styles: Styles,
}

impl HtmlStyler {
    fn new() -> HtmlStyler {
        HtmlStyler {
            background: "background-black".to_string(),
            text_color: "text-white".to_string(),
            styles: Styles::empty(),
        }
    }

    /// The class attribute for the current state.
    fn classes(&self) -> String {
        let mut styles = String::new();
        if self.styles.contains(Styles::ITALICS) {
            styles.push_str("italics");
        }
        if self.styles.contains(Styles::UNDERLINE) {
            if !styles.is_empty() {
                styles.push(' ');
            }
            styles.push_str("underline");
        }
        format!("{} {} {}", self.background, self.text_color, styles)
    }

    fn span_open(&self) -> String {
        format!("<span class='{}'>", self.classes())
    }
}

impl CaptionStyler for HtmlStyler {
    fn line_break(&self) -> &'static str {
        "<br>"
    }

    fn space(&self) -> &'static str {
        "&nbsp;"
    }

    fn push_char(&mut self, ch: char, out: &mut String) {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }

    fn apply_style(&mut self, code: &ChannelCode, out: &mut String) {
        let mut background = self.background.clone();
        let mut text_color = self.text_color.clone();
        let mut styles = self.styles;

        match code.code {
            ControlCode::MidRow { style, underline } => {
                styles = Styles::empty();
                if underline {
                    styles |= Styles::UNDERLINE;
                }
                match style {
                    MidRowStyle::Color(color) => text_color = text_class(color),
                    MidRowStyle::Italics => styles |= Styles::ITALICS,
                }
            }
            ControlCode::Preamble(pac) => {
                match pac.kind {
                    PacKind::Color(color) => {
                        styles = Styles::empty();
                        text_color = text_class(color);
                    }
                    PacKind::WhiteItalics => {
                        styles = Styles::ITALICS;
                        text_color = text_class(Color::White);
                    }
                    PacKind::Indent(_) => (),
                }
                if pac.underline {
                    styles |= Styles::UNDERLINE;
                }
            }
            ControlCode::Background { color, semi_transparent } => {
                background = if semi_transparent {
                    format!("background-{}-semi-transparent", color.css_name())
                }
                else {
                    format!("background-{}", color.css_name())
                };
            }
            ControlCode::BackgroundTransparent => {
                background = "background-transparent".to_string();
            }
            ControlCode::ForegroundBlack { underline } => {
                styles = Styles::empty();
                if underline {
                    styles |= Styles::UNDERLINE;
                }
                text_color = text_class(Color::Black);
            }
            _ => (),
        }

        if background != self.background || text_color != self.text_color || styles != self.styles
        {
            self.background = background;
            self.text_color = text_color;
            self.styles = styles;
            let _ = write!(out, "</span>{}", self.span_open());
        }
    }
}

fn text_class(color: Color) -> String {
    format!("text-{}", color.css_name())
}

pub struct HtmlSink {
    demux: TrackDemux<HtmlTrack>,
}

impl HtmlSink {
    pub fn new(target: &OutputTarget) -> HtmlSink {
        let target = target.clone();
        HtmlSink { demux: TrackDemux::new(move |channel| Ok(HtmlTrack::new(channel, &target))) }
    }
}

impl Sink for HtmlSink {
    fn process(&mut self, rows: &FrameRows) -> Result<()> {
        self.demux.push_frame(rows)
    }

    fn finish(&mut self) -> Result<()> {
        self.demux.finish()
    }
}

struct HtmlTrack {
    state: TrackState,
    text_out: TrackWriter,
    styler: HtmlStyler,
    header_written: bool,
}

impl HtmlTrack {
    fn new(channel: ChannelId, target: &OutputTarget) -> HtmlTrack {
        HtmlTrack {
            state: TrackState::new(channel),
            text_out: TrackWriter::new(target, format!("{}.html", channel.text_name())),
            styler: HtmlStyler::new(),
            header_written: false,
        }
    }

    fn write_header(&mut self) -> Result<()> {
        if !self.header_written {
            self.text_out.write_line(&format!(
                "<html><head>{}</head><body>{}",
                STYLE_TAG,
                self.styler.span_open()
            ))?;
            self.header_written = true;
        }
        Ok(())
    }

    fn write_text(&mut self, rows: &[ClassifiedRow]) -> Result<()> {
        let rendered = render_caption(rows, &mut self.styler);

        if rendered.has_writable {
            self.write_header()?;
            self.text_out.write_line(&preserve_space_runs(&rendered.text))?;
        }

        Ok(())
    }
}

/// Replaces every space in a run of two or more with `&nbsp;`.
fn preserve_space_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_spaces = 0usize;

    for ch in text.chars() {
        if ch == ' ' {
            pending_spaces += 1;
            continue;
        }

        if pending_spaces == 1 {
            out.push(' ');
        }
        else {
            for _ in 0..pending_spaces {
                out.push_str("&nbsp;");
            }
        }
        pending_spaces = 0;

        out.push(ch);
    }

    if pending_spaces == 1 {
        out.push(' ');
    }
    else {
        for _ in 0..pending_spaces {
            out.push_str("&nbsp;");
        }
    }

    out
}

impl CaptionTrack for HtmlTrack {
    fn push(&mut self, row: &ClassifiedRow, _frame: FrameIndex) -> Result<()> {
        match self.state.process(row) {
            GlobalAction::ResumeTextDisplay => self.write_header()?,
            GlobalAction::TextRestart => {
                self.write_header()?;
                self.state.clear_text();
            }
            GlobalAction::NotGlobal { repeated_carriage_return }
                if self.state.mode == CaptionMode::Text =>
            {
                if let Some(flushed) = self.state.text_apply(row, repeated_carriage_return) {
                    self.write_text(&flushed)?;
                }
            }
            _ => (),
        }

        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.header_written {
            self.text_out.write_line("</span></body></html>")?;
        }
        self.text_out.flush()
    }
}
