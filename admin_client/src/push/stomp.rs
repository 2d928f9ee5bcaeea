//! Just enough STOMP 1.2 to follow a broker topic over a WebSocket.
use std::fmt::Write;

use crate::FeedError;

pub const ACCEPT_VERSION: &str = "1.2";
pub const SUBSCRIPTION_ID: &str = "sub-0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new<S: Into<String>>(command: S) -> Self {
        Self { command: command.into(), headers: Vec::new(), body: String::new() }
    }

    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body<S: Into<String>>(mut self, body: S) -> Self {
        self.body = body.into();
        self
    }

    /// Heart-beats are disabled in both directions; the WebSocket layer already pings.
    pub fn connect(host: &str) -> Self {
        Self::new("CONNECT")
            .with_header("accept-version", ACCEPT_VERSION)
            .with_header("host", host)
            .with_header("heart-beat", "0,0")
    }

    pub fn subscribe(destination: &str) -> Self {
        Self::new("SUBSCRIBE")
            .with_header("id", SUBSCRIPTION_ID)
            .with_header("destination", destination)
            .with_header("ack", "auto")
    }

    pub fn disconnect() -> Self {
        Self::new("DISCONNECT")
    }

    /// The first value for `key`. Repeated headers are allowed, and only the first one counts.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn is(&self, command: &str) -> bool {
        self.command == command
    }

    pub fn encode(&self) -> String {
        let escape = escapes_headers(&self.command);
        let mut out = String::with_capacity(self.command.len() + self.body.len() + 64);
        out.push_str(&self.command);
        out.push('\n');
        for (k, v) in &self.headers {
            if escape {
                let _ = writeln!(out, "{}:{}", escape_header(k), escape_header(v));
            } else {
                let _ = writeln!(out, "{k}:{v}");
            }
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Decodes the first frame of a message. Messages that only hold end-of-line heart-beats decode to `None`.
    pub fn decode(text: &str) -> Result<Option<Self>, FeedError> {
        Ok(Self::decode_next(text)?.map(|(frame, _)| frame))
    }

    /// Decodes every frame in a message. A WebSocket message may carry several NUL-terminated frames.
    pub fn decode_all(text: &str) -> Result<Vec<Self>, FeedError> {
        let mut frames = Vec::new();
        let mut rest = text;
        while let Some((frame, tail)) = Self::decode_next(rest)? {
            frames.push(frame);
            rest = tail;
        }
        Ok(frames)
    }

    /// Decodes one frame and returns it with whatever follows its terminating NUL.
    fn decode_next(text: &str) -> Result<Option<(Self, &str)>, FeedError> {
        let text = text.trim_start_matches(['\r', '\n']);
        if text.is_empty() {
            return Ok(None);
        }
        let (head, rest) =
            split_head(text).ok_or_else(|| FeedError::Protocol("Frame has no header terminator".into()))?;
        let mut lines = head.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));
        let command = lines.next().unwrap_or_default().to_string();
        if command.is_empty() {
            return Err(FeedError::Protocol("Frame has no command".into()));
        }
        let unescape = escapes_headers(&command);
        let mut headers = Vec::new();
        for line in lines {
            let (k, v) =
                line.split_once(':').ok_or_else(|| FeedError::Protocol(format!("Malformed header: {line}")))?;
            if unescape {
                headers.push((unescape_header(k)?, unescape_header(v)?));
            } else {
                headers.push((k.to_string(), v.to_string()));
            }
        }
        let mut frame = Self { command, headers, body: String::new() };
        let content_length = frame.header("content-length").and_then(|v| v.trim().parse::<usize>().ok());
        let (body, tail) = match content_length {
            Some(n) if n <= rest.len() && rest.is_char_boundary(n) => {
                let tail = &rest[n..];
                (&rest[..n], tail.strip_prefix('\0').unwrap_or(tail))
            },
            _ => match rest.find('\0') {
                Some(i) => (&rest[..i], &rest[i + 1..]),
                None => (rest, ""),
            },
        };
        frame.body = body.to_string();
        Ok(Some((frame, tail)))
    }
}

/// CONNECT and CONNECTED frames are exchanged before escaping is negotiated, so their headers are sent raw.
fn escapes_headers(command: &str) -> bool {
    command != "CONNECT" && command != "CONNECTED"
}

/// Splits a frame into its command and header lines, and the rest. A NUL before any blank line ends a frame that has
/// no body.
fn split_head(text: &str) -> Option<(&str, &str)> {
    let nul = text.find('\0');
    let lf = text.find("\n\n").map(|i| (i, 2));
    let crlf = text.find("\r\n\r\n").map(|i| (i, 4));
    let blank = match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 < b.0 { a } else { b }),
        (a, b) => a.or(b),
    };
    match (blank, nul) {
        (Some((i, len)), Some(end)) if i < end => Some((&text[..i], &text[i + len..])),
        (Some((i, len)), None) => Some((&text[..i], &text[i + len..])),
        (_, Some(end)) => Some((text[..end].trim_end_matches(['\r', '\n']), &text[end..])),
        (None, None) => None,
    }
}

pub fn escape_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

pub fn unescape_header(value: &str) -> Result<String, FeedError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            Some(other) => return Err(FeedError::Protocol(format!("Undefined escape sequence \\{other} in header"))),
            None => return Err(FeedError::Protocol("Header ends with a dangling backslash".into())),
        }
    }
    Ok(out)
}
