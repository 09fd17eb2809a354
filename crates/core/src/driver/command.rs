use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User actions. None take arguments.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    Stop,
    Pause,
    Resume,
    ChangeEmotion,
    RandomSong,
    Exit,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Stop,
        Command::Pause,
        Command::Resume,
        Command::ChangeEmotion,
        Command::RandomSong,
        Command::Exit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Stop => "stop",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::ChangeEmotion => "change",
            Command::RandomSong => "random",
            Command::Exit => "exit",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown command: {0}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stop" => Ok(Command::Stop),
            "pause" => Ok(Command::Pause),
            "resume" => Ok(Command::Resume),
            "change" | "change-emotion" => Ok(Command::ChangeEmotion),
            "random" | "random-song" => Ok(Command::RandomSong),
            "exit" | "quit" | "q" => Ok(Command::Exit),
            _ => Err(UnknownCommand(s.trim().to_owned())),
        }
    }
}
