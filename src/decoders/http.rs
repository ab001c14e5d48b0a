//! HTTP/1.x — request/status line plus header fields, up to the first blank
//! line; the remainder of the buffer is the body, untouched (§4.I: "no
//! chunked/length reassembly in core").

use crate::error::{Error, Result};
use crate::id::Id;
use crate::layer::{DecodeConfig, DecodeContext, Decoder, Layer, LayerData};

const CRLFCRLF: &[u8] = b"\r\n\r\n";

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum HttpStartLine {
    Request {
        method: String,
        uri: String,
        version: String,
    },
    Response {
        version: String,
        status_code: u16,
        reason_phrase: String,
    },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HttpHeaderField {
    pub name: String,
    pub value: String,
}

#[derive(Clone, PartialEq, Debug)]
pub struct HttpMessage<'a> {
    pub start_line: HttpStartLine,
    pub headers: Vec<HttpHeaderField>,
    pub body: &'a [u8],
}

impl<'a> HttpMessage<'a> {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
            .map(|field| field.value.as_str())
    }
}

pub struct HttpDecoder;

impl Decoder for HttpDecoder {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    fn decode<'a>(
        &self,
        buf: &'a [u8],
        _config: DecodeConfig,
        _ctx: Option<&DecodeContext>,
    ) -> Result<Option<Layer<'a>>> {
        let header_end = match find(buf, CRLFCRLF) {
            Some(pos) => pos,
            None => return Ok(None),
        };
        let head = String::from_utf8_lossy(&buf[..header_end]);
        let mut lines = head.split("\r\n");

        let first_line = lines.next().unwrap_or("");
        if first_line.is_empty() {
            return Err(Error::structural(0, "HTTP message is missing a start line"));
        }
        let start_line = parse_start_line(first_line)?;

        let mut headers: Vec<HttpHeaderField> = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            if line.starts_with(' ') || line.starts_with('\t') {
                // Obsolete line folding: continuation of the previous field.
                match headers.last_mut() {
                    Some(field) => {
                        field.value.push(' ');
                        field.value.push_str(line.trim());
                    }
                    None => {
                        return Err(Error::structural(
                            0,
                            "HTTP header continuation with no preceding header field",
                        ));
                    }
                }
                continue;
            }
            let colon = line.find(':').ok_or_else(|| {
                Error::structural(0, format!("HTTP header line missing ':': {:?}", line))
            })?;
            let name = line[..colon].trim().to_string();
            let value = line[colon + 1..].trim().to_string();
            if name.is_empty() {
                return Err(Error::structural(0, "HTTP header has an empty field name"));
            }
            match headers.iter_mut().find(|f| f.name.eq_ignore_ascii_case(&name)) {
                Some(existing) => {
                    existing.value.push_str(", ");
                    existing.value.push_str(&value);
                }
                None => headers.push(HttpHeaderField { name, value }),
            }
        }

        let body_start = header_end + CRLFCRLF.len();
        let body = &buf[body_start..];
        Ok(Some(Layer::new(
            self.name(),
            body_start,
            LayerData::Http(HttpMessage {
                start_line,
                headers,
                body,
            }),
            buf,
            body,
        )))
    }

    fn next_protocol(&self, _decoded: &LayerData<'_>) -> Option<Id> {
        None
    }
}

fn parse_start_line(line: &str) -> Result<HttpStartLine> {
    if line.starts_with("HTTP/") {
        let mut parts = line.splitn(3, ' ');
        let version = parts.next().unwrap_or("").to_string();
        let status_code_str = parts
            .next()
            .ok_or_else(|| Error::structural(0, "HTTP status line is missing a status code"))?;
        let status_code: u16 = status_code_str.parse().map_err(|_| {
            Error::structural(0, format!("HTTP status code {:?} is not numeric", status_code_str))
        })?;
        let reason_phrase = parts.next().unwrap_or("").to_string();
        Ok(HttpStartLine::Response {
            version,
            status_code,
            reason_phrase,
        })
    } else {
        let mut parts = line.splitn(3, ' ');
        let method = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::structural(0, "HTTP request line is missing a method"))?
            .to_string();
        let uri = parts
            .next()
            .ok_or_else(|| Error::structural(0, "HTTP request line is missing a URI"))?
            .to_string();
        let version = parts
            .next()
            .ok_or_else(|| Error::structural(0, "HTTP request line is missing a version"))?
            .to_string();
        if !version.starts_with("HTTP/") {
            return Err(Error::structural(
                0,
                format!("HTTP request line version {:?} does not start with HTTP/", version),
            ));
        }
        Ok(HttpStartLine::Request {
            method,
            uri,
            version,
        })
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_status_line_headers_and_body() {
        let buf = b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nabc";
        let layer = HttpDecoder
            .decode(buf, DecodeConfig::default(), None)
            .unwrap()
            .unwrap();
        match &layer.data {
            LayerData::Http(msg) => {
                match &msg.start_line {
                    HttpStartLine::Response {
                        version,
                        status_code,
                        reason_phrase,
                    } => {
                        assert_eq!(version, "HTTP/1.1");
                        assert_eq!(*status_code, 200);
                        assert_eq!(reason_phrase, "OK");
                    }
                    _ => panic!("wrong start line"),
                }
                assert_eq!(msg.header("content-length"), Some("3"));
                assert_eq!(msg.body, b"abc");
            }
            _ => panic!("wrong variant"),
        }
        assert_eq!(layer.payload, b"abc");
        assert_eq!(layer.bytes, buf.as_slice());
    }

    #[test]
    fn decodes_request_line() {
        let buf = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let layer = HttpDecoder
            .decode(buf, DecodeConfig::default(), None)
            .unwrap()
            .unwrap();
        match &layer.data {
            LayerData::Http(msg) => match &msg.start_line {
                HttpStartLine::Request { method, uri, version } => {
                    assert_eq!(method, "GET");
                    assert_eq!(uri, "/index.html");
                    assert_eq!(version, "HTTP/1.1");
                }
                _ => panic!("wrong start line"),
            },
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn duplicate_headers_are_joined_with_comma_space() {
        let buf = b"GET / HTTP/1.1\r\nX-Tag: a\r\nX-Tag: b\r\n\r\n";
        let layer = HttpDecoder
            .decode(buf, DecodeConfig::default(), None)
            .unwrap()
            .unwrap();
        match &layer.data {
            LayerData::Http(msg) => assert_eq!(msg.header("x-tag"), Some("a, b")),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn obsolete_line_folding_appends_to_previous_header() {
        let buf = b"GET / HTTP/1.1\r\nX-Long: first\r\n second\r\n\r\n";
        let layer = HttpDecoder
            .decode(buf, DecodeConfig::default(), None)
            .unwrap()
            .unwrap();
        match &layer.data {
            LayerData::Http(msg) => assert_eq!(msg.header("x-long"), Some("first second")),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn missing_colon_in_header_is_structural_error() {
        let buf = b"GET / HTTP/1.1\r\nbroken-header\r\n\r\n";
        assert!(HttpDecoder
            .decode(buf, DecodeConfig::default(), None)
            .is_err());
    }

    #[test]
    fn no_blank_line_yet_is_not_applicable() {
        let buf = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
        assert!(HttpDecoder
            .decode(buf, DecodeConfig::default(), None)
            .unwrap()
            .is_none());
    }
}
