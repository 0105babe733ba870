// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use clap::Arg;
use crossbeam_channel::{unbounded, Sender};
use log::{error, info, warn};

use line21_cea608::classify::{classify_row, FrameRows};
use line21_core::errors::{unsupported_error, Line21Error, Result};
use line21_core::raster::FrameReader;
use line21_output::{make_sink, OutputTarget, FORMAT_NAMES};
use line21_vbi::VbiDecoder;

mod status;

use status::StatusReporter;

/// Scanline width the video decoder is asked to produce.
const FRAME_WIDTH: usize = 720;

struct Options {
    input: String,
    output: PathBuf,
    formats: Vec<String>,
    start_line: usize,
    end_line: usize,
    deinterlaced: bool,
    ffmpeg_path: String,
    ffmpeg_pre_scale: Option<String>,
    ffmpeg_hw_accel: Option<String>,
    quiet: bool,
}

/// Builds the ffmpeg command producing cropped 8-bit grayscale frames on stdout.
fn build_ffmpeg_command(opts: &Options) -> Command {
    let height = opts.end_line + 1;

    let mut filter = String::from("format=gray8,");
    if let Some(ref pre_scale) = opts.ffmpeg_pre_scale {
        filter.push_str(pre_scale);
        filter.push(',');
    }
    filter.push_str(&format!("scale={}:-1:flags=neighbor", FRAME_WIDTH));
    if opts.deinterlaced {
        // Progressive sources are re-interlaced so both fields' lines are present.
        filter.push_str(",interlace=lowpass=off");
    }
    filter.push_str(&format!(",crop=iw:{}:0:0", height));

    let mut cmd = Command::new(&opts.ffmpeg_path);

    cmd.arg("-loglevel").arg("error");

    if let Some(ref hw_accel) = opts.ffmpeg_hw_accel {
        cmd.arg("-hwaccel").arg(hw_accel);
    }

    cmd.arg("-i")
        .arg(&opts.input)
        .arg("-vf")
        .arg(filter)
        .arg("-f")
        .arg("rawvideo")
        .arg("-pix_fmt")
        .arg("gray8")
        .arg("pipe:1")
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());

    cmd
}

/// Reads frames from the video decoder, recovers and classifies caption rows, and broadcasts
/// them to every sink. Returns the number of frames decoded.
fn run_decoder(
    opts: &Options,
    senders: Vec<Sender<FrameRows>>,
    status_tx: Option<Sender<FrameRows>>,
) -> Result<u64> {
    let mut child = build_ffmpeg_command(opts).spawn().map_err(|err| {
        error!("could not start the video decoder at {}", opts.ffmpeg_path);
        Line21Error::from(err)
    })?;

    let stdout = child.stdout.take().unwrap();

    let height = opts.end_line + 1;
    let search_lines = opts.end_line - opts.start_line + 1;

    // The template bank is computed once, before the first frame.
    let vbi = VbiDecoder::try_new(FRAME_WIDTH, opts.start_line, search_lines)?;

    let mut reader = FrameReader::new(stdout, FRAME_WIDTH, height);
    let mut frame_index = 0u64;

    while let Some(frame) = reader.next_frame()? {
        let mut rows = FrameRows::new(frame_index);

        for decoded in vbi.decode_frame(&frame) {
            if let Some(classified) = classify_row(decoded) {
                rows.rows.push(classified);
            }
        }

        // Broadcast to all sinks. A sink that has gone away does not stop the others.
        for tx in &senders {
            let _ = tx.send(rows.clone());
        }
        if let Some(ref tx) = status_tx {
            let _ = tx.send(rows);
        }

        frame_index += 1;
    }

    if let Ok(exit) = child.wait() {
        if !exit.success() {
            warn!("video decoder exited with {}", exit);
        }
    }

    Ok(frame_index)
}

fn run(opts: Options) -> Result<()> {
    let target = OutputTarget::File(opts.output.clone());

    // One worker and one unbounded queue per requested output format.
    let mut senders = Vec::new();
    let mut workers = Vec::new();

    for format in &opts.formats {
        let mut sink = make_sink(format, &target)?;
        let (tx, rx) = unbounded::<FrameRows>();

        let worker = thread::Builder::new()
            .name(format!("line21-{}", format))
            .spawn(move || -> Result<()> {
                for rows in rx.iter() {
                    sink.process(&rows)?;
                }
                sink.finish()
            })
            .map_err(Line21Error::from)?;

        senders.push(tx);
        workers.push((format.clone(), worker));
    }

    let status_tx = if opts.quiet {
        None
    }
    else {
        let (tx, rx) = unbounded::<FrameRows>();

        let worker = thread::Builder::new()
            .name("line21-status".to_string())
            .spawn(move || -> Result<()> {
                let mut status = StatusReporter::new();
                for rows in rx.iter() {
                    status.update(&rows);
                }
                status.done();
                Ok(())
            })
            .map_err(Line21Error::from)?;

        workers.push(("status".to_string(), worker));
        Some(tx)
    };

    info!("decoding captions...");

    // Decoding runs on this thread; dropping the senders afterwards is the end-of-stream
    // signal for every worker.
    let decoded = run_decoder(&opts, senders, status_tx);

    let mut failed = false;

    for (name, worker) in workers {
        match worker.join() {
            Ok(Ok(())) => (),
            Ok(Err(err)) => {
                error!("{} worker failed: {}", name, err);
                failed = true;
            }
            Err(_) => {
                error!("{} worker panicked", name);
                failed = true;
            }
        }
    }

    match decoded {
        Ok(frames) => info!("done, {} frames", frames),
        Err(err) => return Err(err),
    }

    if failed {
        return unsupported_error("one or more output workers failed");
    }

    Ok(())
}

fn parse_options() -> Result<Options> {
    let matches = clap::Command::new("Line21 Extract")
        .version("1.0")
        .author("The Project Line21 Developers")
        .about("Extracts CEA-608 (line 21) closed captions from a video file")
        .arg(
            Arg::new("output")
                .short('o')
                .takes_value(true)
                .required(true)
                .help("Output subtitle filename without extension"),
        )
        .arg(
            Arg::new("ccformat")
                .long("ccformat")
                .takes_value(true)
                .default_value("srt")
                .help("Comma separated output formats (srt, scc, txt, html, xds, raw, debug)"),
        )
        .arg(
            Arg::new("start-line")
                .long("start-line")
                .takes_value(true)
                .default_value("0")
                .help("Topmost scanline searched for caption data"),
        )
        .arg(
            Arg::new("end-line")
                .long("end-line")
                .takes_value(true)
                .default_value("10")
                .help("Last scanline searched for caption data"),
        )
        .arg(
            Arg::new("deinterlaced")
                .long("deinterlaced")
                .help("The input video is progressive (i.e. de-interlaced)"),
        )
        .arg(
            Arg::new("ffmpeg")
                .long("ffmpeg")
                .takes_value(true)
                .default_value("ffmpeg")
                .help("Path to the ffmpeg binary"),
        )
        .arg(
            Arg::new("ffmpeg-pre-scale")
                .long("ffmpeg-pre-scale")
                .takes_value(true)
                .help("ffmpeg video filter inserted before scaling"),
        )
        .arg(
            Arg::new("ffmpeg-hw-accel")
                .long("ffmpeg-hw-accel")
                .takes_value(true)
                .help("ffmpeg hwaccel mode (e.g. auto, vaapi, nvdec)"),
        )
        .arg(Arg::new("quiet").short('q').long("quiet").help("Suppress status output"))
        .arg(Arg::new("INPUT").help("The input video file path").required(true).index(1))
        .get_matches();

    let start_line: usize = matches
        .value_of("start-line")
        .unwrap()
        .parse()
        .map_err(|_| Line21Error::Unsupported("extract: invalid start line"))?;

    let end_line: usize = matches
        .value_of("end-line")
        .unwrap()
        .parse()
        .map_err(|_| Line21Error::Unsupported("extract: invalid end line"))?;

    if start_line > end_line {
        return unsupported_error("extract: start line cannot be greater than end line");
    }

    let formats: Vec<String> =
        matches.value_of("ccformat").unwrap().split(',').map(|s| s.trim().to_string()).collect();

    for format in &formats {
        if !FORMAT_NAMES.contains(&format.as_str()) && format != "text" {
            return unsupported_error("extract: unknown output format");
        }
    }

    Ok(Options {
        input: matches.value_of("INPUT").unwrap().to_string(),
        output: PathBuf::from(matches.value_of("output").unwrap()),
        formats,
        start_line,
        end_line,
        deinterlaced: matches.is_present("deinterlaced"),
        ffmpeg_path: matches.value_of("ffmpeg").unwrap().to_string(),
        ffmpeg_pre_scale: matches.value_of("ffmpeg-pre-scale").map(str::to_string),
        ffmpeg_hw_accel: matches.value_of("ffmpeg-hw-accel").map(str::to_string),
        quiet: matches.is_present("quiet"),
    })
}

fn main() {
    pretty_env_logger::init();

    let ret = match parse_options().and_then(run) {
        Ok(()) => 0,
        Err(err) => {
            error!("{}", err);
            1
        }
    };

    std::process::exit(ret);
}
