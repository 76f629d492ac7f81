use chrono::{DateTime, Utc};

const DELIMITER: char = '\u{1}';

const SUPPORTED: [&str; 6] = ["CLIENTINFO", "FINGER", "PING", "TIME", "USERINFO", "VERSION"];

#[derive(Debug, PartialEq, Eq)]
pub struct CtcpRequest<'a> {
    pub command: &'a str,
    pub argument: &'a str,
}

impl<'a> CtcpRequest<'a> {
    /// Parses a `\x01COMMAND args\x01` PRIVMSG body.
    pub fn parse(text: &'a str) -> Option<Self> {
        let body = text.strip_prefix(DELIMITER)?;
        let body = body.strip_suffix(DELIMITER).unwrap_or(body);
        let (command, argument) = body.split_once(' ').unwrap_or((body, ""));
        if command.is_empty() {
            return None;
        }
        Some(CtcpRequest { command, argument })
    }
}

/// Answers CTCP queries with the identity configured on the bot.
#[derive(Debug, Clone, Default)]
pub struct CtcpResponder {
    pub nick: String,
    pub user_name: String,
    pub real_name: String,
    pub version: String,
    pub finger: Option<String>,
}

impl CtcpResponder {
    /// The reply for `request`, already wrapped in `\x01`, or `None` for
    /// commands the bot does not answer.
    pub fn respond(&self, request: &CtcpRequest<'_>) -> Option<String> {
        self.respond_at(request, Utc::now())
    }

    fn respond_at(&self, request: &CtcpRequest<'_>, now: DateTime<Utc>) -> Option<String> {
        let body = match request.command.to_ascii_uppercase().as_str() {
            "VERSION" => format!("VERSION {}", self.version),
            "FINGER" => match &self.finger {
                Some(finger) => format!("FINGER {}", finger),
                None => format!("FINGER {} ({})", self.real_name, self.user_name),
            },
            "PING" if request.argument.is_empty() => "PING".to_owned(),
            "PING" => format!("PING {}", request.argument),
            "TIME" => format!("TIME {}", now.format("%c")),
            "USERINFO" => format!("USERINFO {} ({})", self.nick, self.real_name),
            "CLIENTINFO" => format!("CLIENTINFO {}", SUPPORTED.join(" ")),
            _ => return None,
        };
        Some(format!("{DELIMITER}{body}{DELIMITER}"))
    }
}
