//! Marlin Response Parser
//!
//! Classifies the reply lines of the arm's Marlin firmware and extracts the
//! pose from `M114` reports.

use penarm_core::Position;
use std::fmt;

/// Marlin response types
#[derive(Debug, Clone, PartialEq)]
pub enum MarlinResponse {
    /// OK acknowledgment
    Ok,
    /// Error report (`Error:...`)
    Error(String),
    /// Position report (`X:.. Y:.. Z:.. ...`)
    Position(Position),
    /// Firmware is still working on a long command (`echo:busy: ...`)
    Busy(String),
    /// Informational echo (`echo:...`)
    Echo(String),
    /// Startup banner or other text
    Message(String),
}

impl fmt::Display for MarlinResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error(msg) => write!(f, "error:{}", msg),
            Self::Position(p) => write!(f, "position:{}", p),
            Self::Busy(msg) => write!(f, "busy:{}", msg),
            Self::Echo(msg) => write!(f, "echo:{}", msg),
            Self::Message(msg) => write!(f, "message:{}", msg),
        }
    }
}

/// Parse one reply line; blank lines yield `None`
pub fn parse_response(line: &str) -> Option<MarlinResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line == "ok" {
        return Some(MarlinResponse::Ok);
    }

    if line.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("error")) {
        let msg = line.get(5..).unwrap_or_default();
        let msg = msg.trim_start_matches(':').trim();
        return Some(MarlinResponse::Error(msg.to_string()));
    }

    if let Some(echo) = line.strip_prefix("echo:") {
        let echo = echo.trim();
        return Some(match echo.strip_prefix("busy:") {
            Some(busy) => MarlinResponse::Busy(busy.trim().to_string()),
            None => MarlinResponse::Echo(echo.to_string()),
        });
    }

    if line.starts_with("X:") {
        if let Some(position) = parse_position(line) {
            return Some(MarlinResponse::Position(position));
        }
    }

    Some(MarlinResponse::Message(line.to_string()))
}

/// Parse an `M114` report line such as `X:200.00 Y:0.00 Z:0.00 E:0.00 Count ...`
///
/// Only the first `X:`, `Y:` and `Z:` tokens count, so the step counts that
/// follow `Count` are ignored. Returns `None` unless all three axes parse.
pub fn parse_position(line: &str) -> Option<Position> {
    if !line.trim_start().starts_with("X:") {
        return None;
    }

    let (mut x, mut y, mut z) = (None, None, None);
    for token in line.split_whitespace() {
        let Some((axis, value)) = token.split_once(':') else {
            continue;
        };
        let slot = match axis.to_ascii_uppercase().as_str() {
            "X" => &mut x,
            "Y" => &mut y,
            "Z" => &mut z,
            _ => continue,
        };
        if slot.is_none() {
            *slot = value.parse::<f64>().ok().filter(|v| v.is_finite());
        }
    }

    Some(Position::new(x?, y?, z?))
}

/// First position found in a block of reply lines
pub fn find_position<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<Position> {
    lines.into_iter().find_map(parse_position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok() {
        assert_eq!(parse_response("ok"), Some(MarlinResponse::Ok));
        assert_eq!(parse_response("  ok\r"), Some(MarlinResponse::Ok));
        assert_eq!(parse_response(""), None);
    }

    #[test]
    fn test_parse_error() {
        assert_eq!(
            parse_response("Error:Printer halted. kill() called!"),
            Some(MarlinResponse::Error(
                "Printer halted. kill() called!".to_string()
            ))
        );
        assert!(matches!(
            parse_response("error: bad"),
            Some(MarlinResponse::Error(_))
        ));
    }

    #[test]
    fn test_parse_echo_and_busy() {
        assert_eq!(
            parse_response("echo:busy: processing"),
            Some(MarlinResponse::Busy("processing".to_string()))
        );
        assert_eq!(
            parse_response("echo:Unknown command: \"G999\""),
            Some(MarlinResponse::Echo("Unknown command: \"G999\"".to_string()))
        );
        assert_eq!(
            parse_response("start"),
            Some(MarlinResponse::Message("start".to_string()))
        );
    }

    #[test]
    fn test_parse_position_report() {
        let line = "X:200.00 Y:-3.50 Z:12.25 E:0.00 Count X: 10 Y:20 Z:30";
        assert_eq!(
            parse_position(line),
            Some(Position::new(200.0, -3.5, 12.25))
        );
        assert!(matches!(
            parse_response(line),
            Some(MarlinResponse::Position(_))
        ));
    }

    #[test]
    fn test_parse_position_missing_axis() {
        assert_eq!(parse_position("X:1.00 Y:2.00 E:0.00"), None);
        assert_eq!(parse_position("X:abc Y:2.00 Z:3.00"), None);
        assert_eq!(parse_position("ok"), None);
        assert_eq!(
            parse_response("X:1.00 Y:2.00"),
            Some(MarlinResponse::Message("X:1.00 Y:2.00".to_string()))
        );
    }

    #[test]
    fn test_find_position_skips_other_lines() {
        let lines = ["echo:busy: processing", "X:1.00 Y:2.00 Z:3.00 E:0.00", "ok"];
        assert_eq!(find_position(lines), Some(Position::new(1.0, 2.0, 3.0)));
        assert_eq!(find_position(["ok"]), None);
    }
}
