//! IRC line parsing with Twitch's message-tag extension.
//!
//! ```text
//! ['@' <tags> SPACE] [':' <prefix> SPACE] <command> <params>
//! ```
//!
//! The parser is a single left-to-right scan driven by an explicit state
//! machine. End of input is fed to the machine as `None`, so every state
//! decides for itself whether the line may stop there. Errors carry the
//! token category that was expected, the byte that was found, and its
//! offset, which is what makes a bad server line diagnosable from a log.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config::Capability;
use crate::error::Error;

/// Tag key to raw (still escaped) tag value.
pub type Tags = HashMap<String, String>;

/// Sender identity: `<host>` or `<nick> ['!' <user>] ['@' <host>]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefix {
    pub nick: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
}

/// One parsed protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// `None` when the line had no tag section at all. `Some` (possibly
    /// empty) when it had one, which only happens with the tags capability.
    pub tags: Option<Tags>,
    pub prefix: Option<Prefix>,
    /// An alphabetic word or an exact three-digit numeric.
    pub command: String,
    /// Middle parameters followed by the trailing one, in wire order.
    pub params: Vec<String>,
}

/// Token category the parser was looking for when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Begin,
    TagKey,
    TagValue,
    PrefixOrCommand,
    PrefixNick,
    PrefixUser,
    PrefixHost,
    Command,
    CommandLetter,
    CommandNumber,
    Params,
    Middle,
    Trailing,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Expected::Begin => "begin",
            Expected::TagKey => "tag key",
            Expected::TagValue => "tag value",
            Expected::PrefixOrCommand => "prefix or command",
            Expected::PrefixNick => "prefix nick",
            Expected::PrefixUser => "prefix user",
            Expected::PrefixHost => "prefix host",
            Expected::Command => "command",
            Expected::CommandLetter => "command letter",
            Expected::CommandNumber => "command number",
            Expected::Params => "params",
            Expected::Middle => "middle",
            Expected::Trailing => "trailing",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub expected: Expected,
    /// `None` means the line ended.
    pub byte: Option<u8>,
    pub offset: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse: want {}, got ", self.expected)?;
        match self.byte {
            None => f.write_str("end of input")?,
            Some(b) if b.is_ascii_graphic() || b == b' ' => write!(f, "{:?}", b as char)?,
            Some(b) => write!(f, "0x{b:02x}")?,
        }
        write!(f, " at byte {}", self.offset)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Begin,
    TagKey,
    TagValue,
    /// After the tag section: only a prefix or a command may follow.
    AfterTags,
    PrefixNick,
    PrefixUser,
    PrefixHost,
    Command,
    CommandLetter,
    /// One digit seen.
    NumericSecond,
    /// Two digits seen.
    NumericThird,
    Params,
    ParamsMiddle,
    ParamsTrailing,
}

fn is_forbidden(b: u8) -> bool {
    matches!(b, 0x00 | b'\r' | b'\n')
}

struct Parser<'a> {
    input: &'a [u8],
    state: State,
    start: usize,
    key: String,
    tags: Option<Tags>,
    prefix: Option<Prefix>,
    command: String,
    params: Vec<String>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            state: State::Begin,
            start: 0,
            key: String::new(),
            tags: None,
            prefix: None,
            command: String::new(),
            params: Vec::new(),
        }
    }

    fn span(&self, end: usize) -> String {
        String::from_utf8_lossy(&self.input[self.start..end]).into_owned()
    }

    fn prefix_mut(&mut self) -> &mut Prefix {
        self.prefix.get_or_insert_with(Prefix::default)
    }

    fn insert_tag(&mut self, key: String, value: String) {
        if key.is_empty() {
            return;
        }
        self.tags.get_or_insert_with(Tags::new).insert(key, value);
    }

    fn enter_command(&mut self, i: usize, b: u8) -> bool {
        if b.is_ascii_alphabetic() {
            self.state = State::CommandLetter;
        } else if b.is_ascii_digit() {
            self.state = State::NumericSecond;
        } else {
            return false;
        }
        self.start = i;
        true
    }

    /// Feed byte `b` at offset `i`; `None` marks end of input.
    fn step(&mut self, i: usize, b: Option<u8>) -> Result<(), ParseError> {
        let fail = |expected| ParseError { expected, byte: b, offset: i };

        match self.state {
            State::Begin => match b {
                Some(b'@') => {
                    self.tags = Some(Tags::new());
                    self.state = State::TagKey;
                    self.start = i + 1;
                }
                Some(b':') => {
                    self.state = State::PrefixNick;
                    self.start = i + 1;
                }
                Some(b) if self.enter_command(i, b) => {}
                _ => return Err(fail(Expected::Begin)),
            },
            State::TagKey => match b {
                Some(b'=') => {
                    self.key = self.span(i);
                    self.state = State::TagValue;
                    self.start = i + 1;
                }
                Some(b';') => {
                    let key = self.span(i);
                    self.insert_tag(key, String::new());
                    self.start = i + 1;
                }
                Some(b' ') => {
                    let key = self.span(i);
                    self.insert_tag(key, String::new());
                    self.state = State::AfterTags;
                }
                None => return Err(fail(Expected::TagKey)),
                Some(_) => {}
            },
            State::TagValue => match b {
                Some(b';') => {
                    let key = std::mem::take(&mut self.key);
                    let value = self.span(i);
                    self.insert_tag(key, value);
                    self.state = State::TagKey;
                    self.start = i + 1;
                }
                Some(b' ') => {
                    let key = std::mem::take(&mut self.key);
                    let value = self.span(i);
                    self.insert_tag(key, value);
                    self.state = State::AfterTags;
                }
                Some(b) if !is_forbidden(b) => {}
                _ => return Err(fail(Expected::TagValue)),
            },
            State::AfterTags => match b {
                Some(b':') => {
                    self.state = State::PrefixNick;
                    self.start = i + 1;
                }
                Some(b) if self.enter_command(i, b) => {}
                _ => return Err(fail(Expected::PrefixOrCommand)),
            },
            State::PrefixNick => match b {
                Some(b'!') => {
                    let nick = self.span(i);
                    self.prefix_mut().nick = Some(nick);
                    self.state = State::PrefixUser;
                    self.start = i + 1;
                }
                Some(b'@') => {
                    let nick = self.span(i);
                    self.prefix_mut().nick = Some(nick);
                    self.state = State::PrefixHost;
                    self.start = i + 1;
                }
                Some(b' ') => {
                    // A lone token is a server name.
                    let host = self.span(i);
                    self.prefix_mut().host = Some(host);
                    self.state = State::Command;
                }
                None => return Err(fail(Expected::PrefixNick)),
                Some(_) => {}
            },
            State::PrefixUser => match b {
                Some(b'@') => {
                    let user = self.span(i);
                    self.prefix_mut().user = Some(user);
                    self.state = State::PrefixHost;
                    self.start = i + 1;
                }
                Some(b' ') => {
                    let user = self.span(i);
                    self.prefix_mut().user = Some(user);
                    self.state = State::Command;
                }
                None => return Err(fail(Expected::PrefixUser)),
                Some(_) => {}
            },
            State::PrefixHost => match b {
                Some(b' ') => {
                    let host = self.span(i);
                    self.prefix_mut().host = Some(host);
                    self.state = State::Command;
                }
                None => return Err(fail(Expected::PrefixHost)),
                Some(_) => {}
            },
            State::Command => match b {
                Some(b) if self.enter_command(i, b) => {}
                _ => return Err(fail(Expected::Command)),
            },
            State::CommandLetter => match b {
                Some(b) if b.is_ascii_alphabetic() => {}
                Some(b' ') => {
                    self.command = self.span(i);
                    self.state = State::Params;
                }
                None => self.command = self.span(i),
                Some(_) => return Err(fail(Expected::CommandLetter)),
            },
            State::NumericSecond => match b {
                Some(b) if b.is_ascii_digit() => self.state = State::NumericThird,
                _ => return Err(fail(Expected::CommandNumber)),
            },
            State::NumericThird => match b {
                Some(b) if b.is_ascii_digit() => {
                    self.command = self.span(i + 1);
                    self.state = State::Params;
                }
                _ => return Err(fail(Expected::CommandNumber)),
            },
            State::Params => match b {
                Some(b' ') | None => {}
                Some(b':') => {
                    self.state = State::ParamsTrailing;
                    self.start = i + 1;
                }
                Some(b) if is_forbidden(b) => return Err(fail(Expected::Params)),
                Some(_) => {
                    self.state = State::ParamsMiddle;
                    self.start = i;
                }
            },
            State::ParamsMiddle => match b {
                Some(b' ') => {
                    let param = self.span(i);
                    self.params.push(param);
                    self.state = State::Params;
                }
                None => {
                    let param = self.span(i);
                    self.params.push(param);
                }
                Some(b) if is_forbidden(b) => return Err(fail(Expected::Middle)),
                Some(_) => {}
            },
            State::ParamsTrailing => match b {
                None => {
                    let param = self.span(i);
                    self.params.push(param);
                }
                Some(b) if is_forbidden(b) => return Err(fail(Expected::Trailing)),
                Some(_) => {}
            },
        }
        Ok(())
    }

    fn finish(self) -> Message {
        Message {
            tags: self.tags,
            prefix: self.prefix,
            command: self.command,
            params: self.params,
        }
    }
}

impl Message {
    /// Parse one line, delimiter already stripped.
    pub fn parse(line: impl AsRef<[u8]>) -> Result<Message, ParseError> {
        let input = line.as_ref();
        let mut parser = Parser::new(input);
        for i in 0..=input.len() {
            parser.step(i, input.get(i).copied())?;
        }
        Ok(parser.finish())
    }

    pub fn param(&self, n: usize) -> Option<&str> {
        self.params.get(n).map(String::as_str)
    }

    /// Raw tag value. `Ok(None)` if the tag is missing from a tag section
    /// that exists; an error if there is no tag section at all.
    pub fn tag(&self, key: &str) -> Result<Option<&str>, Error> {
        let tags = self
            .tags
            .as_ref()
            .ok_or(Error::MissingCapability(Capability::Tags))?;
        Ok(tags.get(key).map(String::as_str))
    }

    /// Like [`Message::tag`], with IRCv3 escapes (`\s`, `\:` ...) resolved.
    pub fn tag_unescaped(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.tag(key)?.map(unescape_tag_value))
    }

    pub fn nick(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(|p| p.nick.as_deref())
    }
}

impl FromStr for Message {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Message::parse(s)
    }
}

/// Serialize back to wire form (no line delimiter). Tag order is unspecified.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tags) = &self.tags {
            f.write_str("@")?;
            for (n, (key, value)) in tags.iter().enumerate() {
                if n > 0 {
                    f.write_str(";")?;
                }
                write!(f, "{key}={value}")?;
            }
            f.write_str(" ")?;
        }
        if let Some(prefix) = &self.prefix {
            f.write_str(":")?;
            match (&prefix.nick, &prefix.user, &prefix.host) {
                (None, None, Some(host)) => f.write_str(host)?,
                (nick, user, host) => {
                    f.write_str(nick.as_deref().unwrap_or(""))?;
                    if let Some(user) = user {
                        write!(f, "!{user}")?;
                    }
                    if let Some(host) = host {
                        write!(f, "@{host}")?;
                    }
                }
            }
            f.write_str(" ")?;
        }
        f.write_str(&self.command)?;
        if let Some((last, middle)) = self.params.split_last() {
            for param in middle {
                write!(f, " {param}")?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{last}")?;
            } else {
                write!(f, " {last}")?;
            }
        }
        Ok(())
    }
}

/// Resolve IRCv3 tag value escapes. Unknown escapes drop the backslash,
/// a trailing lone backslash is removed.
pub fn unescape_tag_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(nick: Option<&str>, user: Option<&str>, host: Option<&str>) -> Option<Prefix> {
        Some(Prefix {
            nick: nick.map(String::from),
            user: user.map(String::from),
            host: host.map(String::from),
        })
    }

    fn params(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_command() {
        let msg = Message::parse("PRIVMSG").unwrap();
        assert_eq!(msg.command, "PRIVMSG");
        assert!(msg.params.is_empty());
        assert!(msg.tags.is_none());
        assert!(msg.prefix.is_none());
    }

    #[test]
    fn command_middle_trailing() {
        let cases: &[(&str, &[&str])] = &[
            ("PRIVMSG #nymn", &["#nymn"]),
            ("PRIVMSG #nymn :nobody knows", &["#nymn", "nobody knows"]),
            ("PRIVMSG #nymn :", &["#nymn", ""]),
            ("PRIVMSG :nobody knows", &["nobody knows"]),
            ("PRIVMSG :", &[""]),
            ("PRIVMSG #a  b   :c d", &["#a", "b", "c d"]),
            ("PRIVMSG #a :x :y", &["#a", "x :y"]),
            ("PRIVMSG #a ", &["#a"]),
        ];
        for (line, want) in cases {
            let msg = Message::parse(line).unwrap();
            assert_eq!(msg.command, "PRIVMSG", "{line}");
            assert_eq!(msg.params, params(want), "{line}");
        }
    }

    #[test]
    fn numeric_command_with_host() {
        let msg = Message::parse(":tmi.twitch.tv 421 justinfan64537 WHO :Unknown command").unwrap();
        assert_eq!(msg.prefix, prefix(None, None, Some("tmi.twitch.tv")));
        assert_eq!(msg.command, "421");
        assert_eq!(msg.params, params(&["justinfan64537", "WHO", "Unknown command"]));
    }

    #[test]
    fn numeric_without_params() {
        let msg = Message::parse("001").unwrap();
        assert_eq!(msg.command, "001");
        assert!(msg.params.is_empty());
    }

    #[test]
    fn host_prefix() {
        let msg = Message::parse(":tmi.twitch.tv CLEARMSG #dallas :HeyGuys").unwrap();
        assert_eq!(msg.prefix, prefix(None, None, Some("tmi.twitch.tv")));
        assert_eq!(msg.command, "CLEARMSG");
        assert_eq!(msg.params, params(&["#dallas", "HeyGuys"]));
    }

    #[test]
    fn tags_with_empty_value() {
        let msg = Message::parse(
            "@badge-info=;badges=staff/1;color=#0D4200;display-name=ronni;emote-sets=0,33,50,237,793,2126,3517,4578,5569,9400,10337,12239;mod=1;subscriber=1;turbo=1;user-type=staff :tmi.twitch.tv USERSTATE #dallas",
        )
        .unwrap();
        let tags = msg.tags.as_ref().unwrap();
        assert_eq!(tags.len(), 9);
        assert_eq!(tags["badge-info"], "");
        assert_eq!(tags["badges"], "staff/1");
        assert_eq!(tags["color"], "#0D4200");
        assert_eq!(tags["emote-sets"], "0,33,50,237,793,2126,3517,4578,5569,9400,10337,12239");
        assert_eq!(tags["user-type"], "staff");
        assert_eq!(msg.prefix, prefix(None, None, Some("tmi.twitch.tv")));
        assert_eq!(msg.command, "USERSTATE");
        assert_eq!(msg.params, params(&["#dallas"]));
    }

    #[test]
    fn tag_keys_without_value_are_recorded_empty() {
        let msg = Message::parse("@login;target-msg-id :tmi.twitch.tv CLEARMSG #dallas :HeyGuys").unwrap();
        let tags = msg.tags.as_ref().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["login"], "");
        assert_eq!(tags["target-msg-id"], "");
        assert_eq!(msg.command, "CLEARMSG");
        assert_eq!(msg.params, params(&["#dallas", "HeyGuys"]));
    }

    #[test]
    fn empty_tag_section_is_present() {
        let msg = Message::parse("@ PING :tmi.twitch.tv").unwrap();
        assert_eq!(msg.tags, Some(Tags::new()));
        assert_eq!(msg.tag("anything").unwrap(), None);

        let msg = Message::parse("PING :tmi.twitch.tv").unwrap();
        assert!(matches!(
            msg.tag("anything"),
            Err(Error::MissingCapability(Capability::Tags))
        ));
    }

    #[test]
    fn prefix_forms() {
        let msg = Message::parse(
            ":justinfan64537!justinfan64537@justinfan64537.tmi.twitch.tv JOIN #nymn",
        )
        .unwrap();
        assert_eq!(
            msg.prefix,
            prefix(
                Some("justinfan64537"),
                Some("justinfan64537"),
                Some("justinfan64537.tmi.twitch.tv")
            )
        );
        assert_eq!(msg.command, "JOIN");
        assert_eq!(msg.params, params(&["#nymn"]));

        let msg = Message::parse(":nick!user JOIN #nymn").unwrap();
        assert_eq!(msg.prefix, prefix(Some("nick"), Some("user"), None));

        let msg = Message::parse(":nick@host JOIN #nymn").unwrap();
        assert_eq!(msg.prefix, prefix(Some("nick"), None, Some("host")));

        let msg = Message::parse(":nick!user@host JOIN #nymn").unwrap();
        assert_eq!(msg.prefix, prefix(Some("nick"), Some("user"), Some("host")));
        assert_eq!(msg.nick(), Some("nick"));
    }

    #[test]
    fn real_privmsg_with_unicode() {
        let msg = Message::parse(
            "@badge-info=subscriber/52;badges=moderator/1,subscriber/48;color=#2E8B57;display-name=pajbot;emotes=80481_/3:7-14;flags=;id=1ec936d3-7853-4113-9984-664ac5c42694;mod=1;room-id=11148817;subscriber=1;tmi-sent-ts=1589640131796;turbo=0;user-id=82008718;user-type=mod :pajbot!pajbot@pajbot.tmi.twitch.tv PRIVMSG #pajlada :\u{e0000}-tags pajaW_/3.0",
        )
        .unwrap();
        let tags = msg.tags.as_ref().unwrap();
        assert_eq!(tags.len(), 14);
        assert_eq!(tags["emotes"], "80481_/3:7-14");
        assert_eq!(tags["flags"], "");
        assert_eq!(tags["id"], "1ec936d3-7853-4113-9984-664ac5c42694");
        assert_eq!(msg.prefix, prefix(Some("pajbot"), Some("pajbot"), Some("pajbot.tmi.twitch.tv")));
        assert_eq!(msg.params, params(&["#pajlada", "\u{e0000}-tags pajaW_/3.0"]));
    }

    fn err(line: &[u8]) -> ParseError {
        Message::parse(line).unwrap_err()
    }

    #[test]
    fn errors_carry_category_byte_and_offset() {
        assert_eq!(err(b""), ParseError { expected: Expected::Begin, byte: None, offset: 0 });
        assert_eq!(err(b" PING"), ParseError { expected: Expected::Begin, byte: Some(b' '), offset: 0 });
        assert_eq!(err(b"@a=b"), ParseError { expected: Expected::TagValue, byte: None, offset: 4 });
        assert_eq!(err(b"@abc"), ParseError { expected: Expected::TagKey, byte: None, offset: 4 });
        assert_eq!(err(b"@a=\rb PING"), ParseError { expected: Expected::TagValue, byte: Some(b'\r'), offset: 3 });
        assert_eq!(err(b"@a=b "), ParseError { expected: Expected::PrefixOrCommand, byte: None, offset: 5 });
        assert_eq!(err(b"@a=b @c=d PING"), ParseError { expected: Expected::PrefixOrCommand, byte: Some(b'@'), offset: 5 });
        assert_eq!(err(b":host"), ParseError { expected: Expected::PrefixNick, byte: None, offset: 5 });
        assert_eq!(err(b":n!u"), ParseError { expected: Expected::PrefixUser, byte: None, offset: 4 });
        assert_eq!(err(b":n!u@h"), ParseError { expected: Expected::PrefixHost, byte: None, offset: 6 });
        assert_eq!(err(b":host  PING"), ParseError { expected: Expected::Command, byte: Some(b' '), offset: 6 });
        assert_eq!(err(b"PRIV-MSG"), ParseError { expected: Expected::CommandLetter, byte: Some(b'-'), offset: 4 });
        assert_eq!(err(b"42"), ParseError { expected: Expected::CommandNumber, byte: None, offset: 2 });
        assert_eq!(err(b"4x1"), ParseError { expected: Expected::CommandNumber, byte: Some(b'x'), offset: 1 });
        assert_eq!(err(b"PING \n"), ParseError { expected: Expected::Params, byte: Some(b'\n'), offset: 5 });
        assert_eq!(err(b"PING a\0b"), ParseError { expected: Expected::Middle, byte: Some(0), offset: 6 });
        assert_eq!(err(b"PING :a\rb"), ParseError { expected: Expected::Trailing, byte: Some(b'\r'), offset: 7 });
    }

    #[test]
    fn error_display() {
        let e = err(b"PRIV-MSG");
        assert_eq!(e.to_string(), "parse: want command letter, got '-' at byte 4");
        let e = err(b"42");
        assert_eq!(e.to_string(), "parse: want command number, got end of input at byte 2");
        let e = err(b"PING :\r");
        assert_eq!(e.to_string(), "parse: want trailing, got 0x0d at byte 6");
    }

    #[test]
    fn invalid_utf8_is_passed_through_lossily() {
        let msg = Message::parse(b"@k=\xff\xfe PRIVMSG #c :\xc3\xa9").unwrap();
        assert_eq!(msg.tags.as_ref().unwrap()["k"], "\u{fffd}\u{fffd}");
        assert_eq!(msg.params, params(&["#c", "é"]));
    }

    /// Parsing terminates, and an error points inside the input.
    fn check_total(input: &[u8]) {
        if let Err(e) = Message::parse(input) {
            assert!(e.offset <= input.len(), "{input:?}: offset {} past end", e.offset);
            match e.byte {
                Some(b) => assert_eq!(input.get(e.offset), Some(&b), "{input:?}"),
                None => assert_eq!(e.offset, input.len(), "{input:?}"),
            }
        }
    }

    #[test]
    fn parsing_is_total_over_short_inputs() {
        check_total(b"");
        for a in 0..=u8::MAX {
            check_total(&[a]);
            for b in 0..=u8::MAX {
                check_total(&[a, b]);
            }
        }
    }

    #[test]
    fn parsing_is_total_over_delimiter_combinations() {
        // Every string of up to five bytes drawn from the bytes that drive transitions.
        const ALPHABET: &[u8] = b"@;= :!\r\na1#\xff";
        for len in 0..=5 {
            let mut digits = vec![0usize; len];
            loop {
                let input: Vec<u8> = digits.iter().map(|&d| ALPHABET[d]).collect();
                check_total(&input);
                let Some(pos) = digits.iter().rposition(|&d| d + 1 < ALPHABET.len()) else {
                    break;
                };
                digits[pos] += 1;
                digits[pos + 1..].fill(0);
            }
        }
    }

    #[test]
    fn parsing_is_total_over_pseudo_random_lines() {
        let seeds: &[&[u8]] = &[
            b"@badge-info=;badges=staff/1 :tmi.twitch.tv USERSTATE #dallas",
            b":nick!user@host PRIVMSG #chan :hello there",
            b"@a;b;c=;d=e :x 123 y :z",
        ];
        // xorshift64; fixed seed so failures reproduce.
        let mut state = 0x9e37_79b9_7f4a_7c15_u64;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };
        for seed in seeds {
            for _ in 0..2000 {
                let mut line = seed.to_vec();
                for _ in 0..(next() % 4 + 1) {
                    let at = next() as usize % line.len();
                    line[at] = next() as u8;
                }
                let end = next() as usize % (line.len() + 1);
                check_total(&line[..end]);
            }
        }
    }

    #[test]
    fn display_reserializes() {
        let line = ":nick!user@host PRIVMSG #nymn :nobody knows";
        assert_eq!(Message::parse(line).unwrap().to_string(), line);

        let line = "@badges=staff/1 :tmi.twitch.tv USERSTATE #dallas";
        assert_eq!(Message::parse(line).unwrap().to_string(), line);

        let msg: Message = "PRIVMSG #a :".parse().unwrap();
        assert_eq!(msg.to_string(), "PRIVMSG #a :");
    }

    #[test]
    fn tag_unescaping() {
        assert_eq!(unescape_tag_value(r"hello\sworld"), "hello world");
        assert_eq!(unescape_tag_value(r"a\:b\\c"), "a;b\\c");
        assert_eq!(unescape_tag_value(r"x\ry\n"), "x\ry\n");
        assert_eq!(unescape_tag_value(r"odd\q"), "oddq");
        assert_eq!(unescape_tag_value("tail\\"), "tail");

        let msg = Message::parse(r"@system-msg=5\sraiders USERNOTICE #c").unwrap();
        assert_eq!(msg.tag_unescaped("system-msg").unwrap().as_deref(), Some("5 raiders"));
    }
}
