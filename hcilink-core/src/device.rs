/*!
 * Discovered device records
 * Parsed from the adapter-control tool's inquiry output
 */

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b[0-9a-f]{2}(?::[0-9a-f]{2}){5}\b").expect("address pattern is valid")
    })
}

/// Six-octet Bluetooth device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BdAddr([u8; 6]);

impl BdAddr {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for BdAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.trim().split(':');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(|| format!("invalid address: {}", s))?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(format!("invalid address: {}", s));
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| format!("invalid address: {}", s))?;
        }
        if parts.next().is_some() {
            return Err(format!("invalid address: {}", s));
        }
        Ok(Self(octets))
    }
}

impl TryFrom<String> for BdAddr {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BdAddr> for String {
    fn from(addr: BdAddr) -> Self {
        addr.to_string()
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}", a, b, c, d, e, g)
    }
}

/// One line of inquiry output. `raw` is kept verbatim; the rest is best effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub raw: String,
    pub address: Option<BdAddr>,
    pub name: Option<String>,
}

impl DeviceRecord {
    pub fn from_line(line: &str) -> Self {
        let raw = line.trim_end_matches('\r').to_string();

        let (address, name) = match address_pattern().find(&raw) {
            Some(matched) => {
                let name = raw[matched.end()..].trim();
                (
                    matched.as_str().parse::<BdAddr>().ok(),
                    (!name.is_empty()).then(|| name.to_string()),
                )
            }
            None => (None, None),
        };

        Self { raw, address, name }
    }

    /// Display label for lists: the raw line, as the tool printed it.
    pub fn label(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One record per non-empty line, in the order the tool reported them.
pub fn parse_inquiry_output(stdout: &str) -> Vec<DeviceRecord> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(DeviceRecord::from_line)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_address_and_name() {
        let record = DeviceRecord::from_line("00:11:22:33:44:55 DeviceA");

        assert_eq!(record.raw, "00:11:22:33:44:55 DeviceA");
        assert_eq!(
            record.address.map(|a| a.octets()),
            Some([0x00, 0x11, 0x22, 0x33, 0x44, 0x55])
        );
        assert_eq!(record.name.as_deref(), Some("DeviceA"));
    }

    #[test]
    fn address_is_found_inside_tool_prefixes() {
        let record = DeviceRecord::from_line("\tBD_ADDR: 00:1f:e1:dd:08:3d");

        assert_eq!(record.address.unwrap().to_string(), "00:1F:E1:DD:08:3D");
        assert_eq!(record.name, None);
        assert_eq!(record.raw, "\tBD_ADDR: 00:1f:e1:dd:08:3d");
    }

    #[test]
    fn unparseable_lines_keep_raw_text_only() {
        let record = DeviceRecord::from_line("Inquiry complete. Status: No error [00]");

        assert_eq!(record.address, None);
        assert_eq!(record.name, None);
        assert_eq!(record.label(), "Inquiry complete. Status: No error [00]");
    }

    #[test]
    fn output_keeps_order_and_skips_blank_lines() {
        let stdout = "00:11:22:33:44:55 DeviceA\n\n   \n66:77:88:99:AA:BB DeviceB\r\n";
        let records = parse_inquiry_output(stdout);

        let raw: Vec<_> = records.iter().map(|r| r.raw.as_str()).collect();
        assert_eq!(raw, ["00:11:22:33:44:55 DeviceA", "66:77:88:99:AA:BB DeviceB"]);
    }

    #[test]
    fn empty_output_yields_no_records() {
        assert!(parse_inquiry_output("").is_empty());
        assert!(parse_inquiry_output("\n\n").is_empty());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!("00:11:22:33:44".parse::<BdAddr>().is_err());
        assert!("00:11:22:33:44:55:66".parse::<BdAddr>().is_err());
        assert!("0g:11:22:33:44:55".parse::<BdAddr>().is_err());
    }
}
