//! AT-command dialogue with the Wi-Fi modem.
//!
//! The sequencer issues one command per slow tick:
//!
//! ```text
//! SESSION_START    AT+CIPSTART="TCP","<host>",<port>
//! ANNOUNCE_LENGTH  AT+CIPSEND=<bytes of request incl. CRLF>
//! SEND_PAYLOAD     GET <path>?api_key=<key>&<f1>=<h>.<hd>&<f2>=<t>.<td>
//! ```
//!
//! Bring-up (`AT`, `AT+CWMODE=1`, `AT+CWJAP=...`) runs once at startup
//! before any tick is delivered; the settling delays between those
//! commands are the caller's concern.

use core::fmt::Write;

use heapless::String;
use log::info;

use crate::app::ports::LineTransport;
use crate::config::ModemConfig;
use crate::error::ConfigError;
use crate::sensors::dht12::Reading;

/// Appended by every [`LineTransport`] after the line text.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Longest line the transport buffer accepts, terminator excluded.
pub const LINE_CAPACITY: usize = 80;

pub type Line = String<LINE_CAPACITY>;

/// Bytes the modem will receive for `line`, terminator included.
pub fn wire_len(line: &str) -> usize {
    line.len() + LINE_TERMINATOR.len()
}

/// Format the collector request carrying one reading.
pub fn format_request(cfg: &ModemConfig, reading: &Reading) -> Result<Line, ConfigError> {
    let mut line = Line::new();
    write!(
        line,
        "GET {}?api_key={}&{}={}.{}&{}={}.{}",
        cfg.path,
        cfg.api_key,
        cfg.humidity_field,
        reading.humidity_integer,
        reading.humidity_decimal,
        cfg.temperature_field,
        reading.temperature_integer,
        reading.temperature_decimal,
    )
    .map_err(|_| ConfigError::PayloadTooLong)?;
    Ok(line)
}

/// `AT+CIPSTART` for the configured collector.
pub fn session_open(cfg: &ModemConfig) -> Result<Line, ConfigError> {
    let mut line = Line::new();
    write!(line, "AT+CIPSTART=\"TCP\",\"{}\",{}", cfg.host, cfg.port)
        .map_err(|_| ConfigError::PayloadTooLong)?;
    Ok(line)
}

/// `AT+CIPSEND` announcing `bytes` to follow.
pub fn announce_length(bytes: usize) -> Line {
    let mut line = Line::new();
    // At most 20 digits; always fits.
    let _ = write!(line, "AT+CIPSEND={bytes}");
    line
}

/// Send the bring-up dialogue: attention, station mode, join network.
pub fn bring_up<T: LineTransport>(transport: &mut T, cfg: &ModemConfig) -> Result<(), ConfigError> {
    let mut join = Line::new();
    write!(join, "AT+CWJAP=\"{}\",\"{}\"", cfg.ssid, cfg.passphrase)
        .map_err(|_| ConfigError::PayloadTooLong)?;

    transport.send_line("AT");
    transport.send_line("AT+CWMODE=1");
    transport.send_line(&join);
    info!("modem: joining '{}'", cfg.ssid);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Inverse of [`format_request`], for round-trip checks only.
    pub(crate) fn parse_request(cfg: &ModemConfig, line: &str) -> Option<Reading> {
        let query = line.strip_prefix("GET ")?.strip_prefix(cfg.path.as_str())?;
        let query = query.strip_prefix("?api_key=")?.strip_prefix(cfg.api_key.as_str())?;

        let mut humidity = None;
        let mut temperature = None;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=')?;
            let (int, dec) = value.split_once('.')?;
            let parsed = (int.parse::<u8>().ok()?, dec.parse::<u8>().ok()?);
            if key == cfg.humidity_field.as_str() {
                humidity = Some(parsed);
            } else if key == cfg.temperature_field.as_str() {
                temperature = Some(parsed);
            } else {
                return None;
            }
        }
        let (humidity_integer, humidity_decimal) = humidity?;
        let (temperature_integer, temperature_decimal) = temperature?;
        Some(Reading {
            humidity_integer,
            humidity_decimal,
            temperature_integer,
            temperature_decimal,
        })
    }

    #[derive(Default)]
    struct Recorder(Vec<std::string::String>);

    impl LineTransport for Recorder {
        fn send_line(&mut self, text: &str) {
            self.0.push(text.into());
        }
    }

    #[test]
    fn request_matches_collector_format() {
        let cfg = ModemConfig::default();
        let r = Reading {
            humidity_integer: 45,
            humidity_decimal: 12,
            temperature_integer: 21,
            temperature_decimal: 0,
        };
        let line = format_request(&cfg, &r).unwrap();
        assert_eq!(
            line.as_str(),
            "GET /update?api_key=0000000000000000&field1=45.12&field2=21.0"
        );
        assert_eq!(wire_len(&line), line.len() + 2);
    }

    #[test]
    fn session_and_length_commands() {
        let cfg = ModemConfig::default();
        assert_eq!(
            session_open(&cfg).unwrap().as_str(),
            "AT+CIPSTART=\"TCP\",\"api.thingspeak.com\",80"
        );
        assert_eq!(announce_length(66).as_str(), "AT+CIPSEND=66");
    }

    #[test]
    fn bring_up_sends_three_commands() {
        let mut rec = Recorder::default();
        bring_up(&mut rec, &ModemConfig::default()).unwrap();
        assert_eq!(
            rec.0,
            vec!["AT", "AT+CWMODE=1", "AT+CWJAP=\"sensor-net\",\"changeme\""]
        );
    }

    #[test]
    fn parse_rejects_foreign_lines() {
        let cfg = ModemConfig::default();
        assert_eq!(parse_request(&cfg, "AT+CIPSEND=12"), None);
        assert_eq!(
            parse_request(&cfg, "GET /update?api_key=0000000000000000&field9=1.1"),
            None
        );
    }
}
