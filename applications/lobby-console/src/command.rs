//! Console input parsing
//!
//! One command per line. Track arguments take the form
//! `<id>[:<seconds>] <title> [artist...]`, e.g. `load intro:215 Intro The Band`.
//! Underscores in a title become spaces.

use crate::error::ParseError;
use lobby_core::types::{Track, TrackId, UserId};
use lobby_playback::{Activation, Command, SeekEvent};

/// Artist shown when none is given
const UNKNOWN_ARTIST: &str = "Unknown Artist";

pub const HELP: &str = "\
Commands:
  play | pause | toggle           transport
  vol <0-100> | mute              volume
  seek <pct> | scrub <pct>        commit or preview a seek (percent of track)
  next                            play the head of the queue
  enqueue <id>[:<secs>] <title> [artist]
  load <id>[:<secs>] <title> [artist]
  like                            toggle like for the current track
  user <id> | user none           sign in or out
  lock | unlock                   revoke or grant transport control
  ready | fail                    media for the current track loaded or failed
  status | queue | help | quit";

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Forwarded to the session as a command
    Session(Command),
    SetUser(Option<UserId>),
    Lock(bool),
    MediaReady,
    MediaFailed,
    Status,
    Queue,
    Help,
    Quit,
}

/// Parse one line; blank lines yield `None`
pub fn parse(line: &str) -> Result<Option<Input>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let input = match name.to_ascii_lowercase().as_str() {
        "play" => Input::Session(Command::Play),
        "pause" => Input::Session(Command::Pause),
        "toggle" => Input::Session(Command::TogglePlayback),
        "vol" | "volume" => {
            let value = first(&rest, "vol", "a level")?;
            Input::Session(Command::SetVolume(parse_number(value, "volume")?))
        }
        "mute" => Input::Session(Command::ToggleMute),
        "seek" => Input::Session(Command::Seek {
            slider: parse_number(first(&rest, "seek", "a percentage")?, "percentage")?,
            event: SeekEvent::Commit,
        }),
        "scrub" => Input::Session(Command::Seek {
            slider: parse_number(first(&rest, "scrub", "a percentage")?, "percentage")?,
            event: SeekEvent::Preview,
        }),
        "next" => Input::Session(Command::Next),
        "enqueue" => Input::Session(Command::Enqueue(parse_track("enqueue", &rest)?)),
        "load" => Input::Session(Command::ChangeMusic(parse_track("load", &rest)?)),
        "like" => Input::Session(Command::ActivateLike(Activation::Click)),
        "user" => match first(&rest, "user", "an id or 'none'")? {
            "none" => Input::SetUser(None),
            id => Input::SetUser(Some(UserId::new(id))),
        },
        "lock" => Input::Lock(true),
        "unlock" => Input::Lock(false),
        "ready" => Input::MediaReady,
        "fail" => Input::MediaFailed,
        "status" => Input::Status,
        "queue" => Input::Queue,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };

    Ok(Some(input))
}

fn first<'a>(rest: &[&'a str], command: &'static str, argument: &'static str) -> Result<&'a str, ParseError> {
    rest.first()
        .copied()
        .ok_or(ParseError::MissingArgument { command, argument })
}

fn parse_number<T: std::str::FromStr>(value: &str, expected: &'static str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        value: value.to_string(),
        expected,
    })
}

fn parse_track(command: &'static str, rest: &[&str]) -> Result<Track, ParseError> {
    let id_arg = first(rest, command, "a track id")?;
    let title = rest
        .get(1)
        .ok_or(ParseError::MissingArgument {
            command,
            argument: "a title",
        })?
        .replace('_', " ");
    let artist = if rest.len() > 2 {
        rest[2..].join(" ")
    } else {
        UNKNOWN_ARTIST.to_string()
    };

    let track = match id_arg.split_once(':') {
        Some((id, seconds)) => {
            let seconds: f64 = parse_number(seconds, "duration")?;
            Track::new(TrackId::new(id), title, artist).with_duration(seconds)
        }
        None => Track::new(TrackId::new(id_arg), title, artist),
    };
    Ok(track)
}
