//! Parsers for the platform tools that list listening sockets.
//!
//! These live outside the platform modules so every parser is tested on
//! every platform.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

pub struct Utils;

impl Utils {
    /// Parse an address:port string.
    ///
    /// Handles multiple address formats:
    /// - IPv4: "127.0.0.1:3000" or "*:8080"
    /// - IPv6: "\[::1]:3000" or "\[fe80::1]:8080"
    pub fn parse_address(address: &str) -> Option<(String, u16)> {
        if address.starts_with('[') {
            let bracket_end = address.find(']')?;
            if bracket_end + 1 >= address.len() || address.as_bytes()[bracket_end + 1] != b':' {
                return None;
            }
            let addr = &address[..=bracket_end];
            let port: u16 = address[bracket_end + 2..].parse().ok()?;
            Some((addr.to_string(), port))
        } else {
            let last_colon = address.rfind(':')?;
            let addr = &address[..last_colon];
            let port: u16 = address[last_colon + 1..].parse().ok()?;
            let addr = if addr.is_empty() { "*" } else { addr };
            Some((addr.to_string(), port))
        }
    }

    /// PIDs listening on `port` in `ss -Htlnp` output.
    ///
    /// ```text
    /// LISTEN 0 511 127.0.0.1:6006 0.0.0.0:* users:(("node",pid=4242,fd=21),("node",pid=4243,fd=21))
    /// ```
    pub fn parse_ss_pids(output: &str, port: u16) -> Vec<u32> {
        static PID_RE: OnceLock<Regex> = OnceLock::new();
        let regex = PID_RE.get_or_init(|| Regex::new(r"pid=(\d+)").expect("valid regex"));

        let mut pids = BTreeSet::new();
        for line in output.lines() {
            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < 6 {
                continue;
            }

            match Self::parse_address(components[3]) {
                Some((_, p)) if p == port => {}
                _ => continue,
            }

            let users = components[5..].join(" ");
            for caps in regex.captures_iter(&users) {
                if let Ok(pid) = caps[1].parse() {
                    pids.insert(pid);
                }
            }
        }

        pids.into_iter().collect()
    }

    /// PIDs printed one per line by `lsof -t`.
    pub fn parse_lsof_pids(output: &str) -> Vec<u32> {
        let pids: BTreeSet<u32> = output
            .lines()
            .filter_map(|line| line.trim().parse().ok())
            .collect();
        pids.into_iter().collect()
    }

    /// PIDs listening on `port` in Windows `netstat -ano` output.
    ///
    /// ```text
    ///   Proto  Local Address          Foreign Address        State           PID
    ///   TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1020
    ///   TCP    [::]:445               [::]:0                 LISTENING       4
    /// ```
    pub fn parse_netstat_pids(output: &str, port: u16) -> Vec<u32> {
        let mut pids = BTreeSet::new();

        for line in output.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 5 || parts[0] != "TCP" || parts[3] != "LISTENING" {
                continue;
            }

            match Self::parse_address(parts[1]) {
                Some((_, p)) if p == port => {}
                _ => continue,
            }

            // PID 0 is the System Idle Process, never a real listener.
            if let Ok(pid) = parts[4].parse::<u32>() {
                if pid != 0 {
                    pids.insert(pid);
                }
            }
        }

        pids.into_iter().collect()
    }
}
