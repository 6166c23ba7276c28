//! Line commands accepted by the terminal front end.

use std::str::FromStr;

use crate::config::Cutoff;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Start a new recording
    Record,
    /// Stop the current recording and filter it
    Stop,
    PlayOriginal,
    PlayFiltered,
    SetHighpass(Cutoff),
    SetLowpass(Cutoff),
    /// Filter the last recording again with the current cutoffs
    Refilter,
    Info,
    Save,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  r, record          start recording
  <enter>, s, stop   stop recording and filter
  o, original        play original audio
  f, filtered        play filtered audio
  hp <freq>          set high-pass cutoff (e.g. hp 250, hp 0.3khz)
  lp <freq>          set low-pass cutoff
  a, apply           re-filter last recording with current cutoffs
  i, info            show recording summary
  w, save            write WAV files to the save directory
  h, help            show this help
  q, quit            exit";

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(Command::Stop);
        };
        let argument = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments: {}", s.trim()));
        }

        let cutoff = || -> Result<Cutoff, String> {
            argument
                .ok_or_else(|| format!("{} needs a frequency", word))?
                .parse()
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "r" | "record" => Command::Record,
            "s" | "stop" => Command::Stop,
            "o" | "original" => Command::PlayOriginal,
            "f" | "filtered" => Command::PlayFiltered,
            "hp" | "highpass" => return cutoff().map(Command::SetHighpass),
            "lp" | "lowpass" => return cutoff().map(Command::SetLowpass),
            "a" | "apply" => Command::Refilter,
            "i" | "info" => Command::Info,
            "w" | "save" => Command::Save,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command: {}", other)),
        };

        match argument {
            Some(extra) => Err(format!("unexpected argument: {}", extra)),
            None => Ok(command),
        }
    }
}
