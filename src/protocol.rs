//! Inbound control message decoding
//!
//! The control grammar is plain text, one command per message:
//!
//! | Message               | Command                      |
//! |-----------------------|------------------------------|
//! | `"<W>,<H>,<FPS>"`     | [`Command::Resize`]          |
//! | `"start"`             | [`Command::Start`]           |
//! | `"quit"`              | [`Command::Quit`]            |
//! | anything else         | ignored                      |
//!
//! No acknowledgement is ever sent back for a command.

use crate::types::{FrameRate, Geometry};
use crate::{Result, StreamError};

const START: &str = "start";
const QUIT: &str = "quit";

/// A decoded control command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Change frame geometry and target rate, regenerating the frame pool
    Resize { geometry: Geometry, rate: FrameRate },
    /// Begin (or restart) playback from index zero
    Start,
    /// Stop playback and reset the sent counter
    Quit,
}

impl Command {
    /// Decode one inbound text message.
    ///
    /// Returns:
    /// - `Ok(Some(command))` - A recognised command
    /// - `Ok(None)` - Unrecognised message, to be ignored
    /// - `Err(e)` - A Resize-shaped message that failed to parse
    pub fn parse(message: &str) -> Result<Option<Command>> {
        match message {
            START => Ok(Some(Command::Start)),
            QUIT => Ok(Some(Command::Quit)),
            resize if resize.contains(',') => parse_resize(resize).map(Some),
            _ => Ok(None),
        }
    }
}

fn parse_resize(message: &str) -> Result<Command> {
    let fields: Vec<&str> = message.split(',').map(str::trim).collect();
    let [width, height, fps] = fields.as_slice() else {
        return Err(StreamError::protocol(
            message,
            format!("expected 3 comma-separated fields, found {}", fields.len()),
        ));
    };

    let width: u32 = width
        .parse()
        .map_err(|e| StreamError::protocol(message, format!("invalid width: {}", e)))?;
    let height: u32 = height
        .parse()
        .map_err(|e| StreamError::protocol(message, format!("invalid height: {}", e)))?;
    let fps: f64 =
        fps.parse().map_err(|e| StreamError::protocol(message, format!("invalid fps: {}", e)))?;

    let geometry = Geometry::new(width, height);
    if width == 0 || height == 0 {
        return Err(StreamError::protocol(message, format!("empty geometry {}", geometry)));
    }
    let rate = FrameRate::new(fps).ok_or_else(|| {
        StreamError::protocol(message, format!("fps must be positive, got {}", fps))
    })?;

    Ok(Command::Resize { geometry, rate })
}
