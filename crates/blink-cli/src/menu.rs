//! Interactive menu: live stream, recorded file, or exit.

use crate::config::Config;
use crate::session::{count_blinks, open_landmarks, print_summary};
use crate::signal::Interrupt;
use anyhow::Result;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Live,
    File,
    Exit,
    Invalid,
}

impl Choice {
    fn parse(input: &str) -> Self {
        match input.trim() {
            "1" => Self::Live,
            "2" => Self::File,
            "3" => Self::Exit,
            _ => Self::Invalid,
        }
    }
}

/// Read one trimmed line; `None` at end of input.
fn prompt<I: BufRead>(input: &mut I, out: &mut dyn Write, text: &str) -> Result<Option<String>> {
    write!(out, "{text}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Run the menu until the user exits or input ends. Each session starts
/// from a fresh blink count.
pub fn run_menu<I: BufRead>(
    mut input: I,
    out: &mut dyn Write,
    config: &Config,
    interrupt: &Interrupt,
) -> Result<()> {
    writeln!(out, "Welcome to Eye Blink Detection Counting!\n")?;

    loop {
        writeln!(out, "Options:")?;
        writeln!(out, "1. Live video\n2. Video file\n3. Exit\n")?;
        let Some(answer) = prompt(&mut input, out, "Your option: ")? else {
            break;
        };

        let (source, live) = match Choice::parse(&answer) {
            Choice::Live => {
                if config.live_source == "-" {
                    writeln!(
                        out,
                        "Live source is stdin, which the menu is reading. Set live_source to a FIFO or file.\n"
                    )?;
                    continue;
                }
                writeln!(out, "You have chosen live video, reading {} ...", config.live_source)?;
                (config.live_source.clone(), true)
            }
            Choice::File => {
                let Some(path) = prompt(&mut input, out, "File Path: ")? else {
                    break;
                };
                writeln!(out, "Reading file at path: {path} ...")?;
                (path, false)
            }
            Choice::Exit => break,
            Choice::Invalid => {
                writeln!(out, "You have chosen a wrong option value! Kindly re-enter your choice\n")?;
                continue;
            }
        };

        let reader = match open_landmarks(&source) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "cannot open landmark source");
                if live {
                    writeln!(
                        out,
                        "No live landmark stream at {source}. Start a landmark provider writing to it (mkfifo {source}).\n"
                    )?;
                } else {
                    writeln!(out, "No file present at the specified location: {source}\n")?;
                }
                continue;
            }
        };

        // A broken stream ends the session but not the menu.
        match count_blinks(reader, config, interrupt, out) {
            Ok(summary) => {
                print_summary(&summary, out)?;
                writeln!(out, "Total number of eye blinks detected: {}\n", summary.blinks)?;
            }
            Err(e) => {
                tracing::warn!(error = %e, "session failed");
                writeln!(out, "Session failed: {e:#}\n")?;
            }
        }
    }

    writeln!(out, "\nThank you for using Eye Blink Detection Counting. Goodbye!")?;
    Ok(())
}
