//! Inbound commands
//!
//! The paired phone sends plain text lines. Lookup is exact and
//! case-sensitive after trimming transport whitespace; anything else is
//! ignored without a reply.

use core::fmt;

/// Command understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Current readings and overlay
    Status,
    /// Liveness check
    Ping,
    /// Replay the persistent log
    GetAnalytics,
}

const COMMAND_TABLE: [(&str, Command); 3] = [
    ("STATUS", Command::Status),
    ("PING", Command::Ping),
    ("GET_ANALYTICS", Command::GetAnalytics),
];

impl Command {
    /// Resolve a received line, `None` for anything unrecognized
    pub fn parse(line: &str) -> Option<Self> {
        let keyword = line.trim();
        COMMAND_TABLE
            .iter()
            .find(|(text, _)| *text == keyword)
            .map(|(_, command)| *command)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Status => "STATUS",
            Command::Ping => "PING",
            Command::GetAnalytics => "GET_ANALYTICS",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
