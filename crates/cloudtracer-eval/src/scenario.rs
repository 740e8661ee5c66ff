// Evaluation scenarios - static ground-truth fixtures, never mutated

use chrono::{Duration, TimeZone, Utc};
use cloudtracer_core::{LogEntry, LogLevel, LogWindow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("malformed scenario '{scenario_id}': {reason}")]
pub struct MalformedScenario {
    pub scenario_id: String,
    pub reason: String,
}

/// One ground-truth test case for the RCA pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationScenario {
    pub scenario_id: String,
    pub issue_description: String,
    pub expected_root_cause: String,
    pub expected_category: String,

    #[serde(default)]
    pub keywords: BTreeSet<String>,
}

impl EvaluationScenario {
    /// Reject malformed fixtures before any analysis starts
    pub fn validate(&self) -> Result<(), MalformedScenario> {
        let fail = |reason: &str| MalformedScenario {
            scenario_id: self.scenario_id.clone(),
            reason: reason.to_string(),
        };

        if self.scenario_id.trim().is_empty() {
            return Err(MalformedScenario {
                scenario_id: "<unnamed>".to_string(),
                reason: "scenario_id is empty".to_string(),
            });
        }
        if self.issue_description.trim().is_empty() {
            return Err(fail("issue_description is empty"));
        }
        if self.expected_root_cause.trim().is_empty() {
            return Err(fail("expected_root_cause is empty"));
        }
        if self.expected_category.trim().is_empty() {
            return Err(fail("expected_category is empty"));
        }
        Ok(())
    }
}

fn keywords(words: &[&str]) -> BTreeSet<String> {
    words.iter().map(|s| s.to_string()).collect()
}

/// The standard scenario set: disk exhaustion, DHCP failure, token expiry
pub fn builtin_scenarios() -> Vec<EvaluationScenario> {
    vec![
        EvaluationScenario {
            scenario_id: "disk_space_exhaustion".to_string(),
            issue_description:
                "Instance launch failing with \"No valid host was found\" and disk space warnings in scheduler logs"
                    .to_string(),
            expected_root_cause: "insufficient disk space available compute hosts scheduler".to_string(),
            expected_category: "resource_shortage".to_string(),
            keywords: keywords(&["disk", "space", "insufficient", "storage", "host", "scheduler"]),
        },
        EvaluationScenario {
            scenario_id: "network_connectivity_dhcp".to_string(),
            issue_description:
                "Instances cannot obtain IP addresses and network configuration is timing out with DHCP errors"
                    .to_string(),
            expected_root_cause: "dhcp lease allocation failed network configuration timeout".to_string(),
            expected_category: "network_issues".to_string(),
            keywords: keywords(&["dhcp", "network", "neutron", "ip", "configuration", "timeout"]),
        },
        EvaluationScenario {
            scenario_id: "authentication_token_validation".to_string(),
            issue_description:
                "Service requests failing with authentication errors and token validation failures across platform components"
                    .to_string(),
            expected_root_cause: "token validation failed authentication expired keystone".to_string(),
            expected_category: "authentication_issues".to_string(),
            keywords: keywords(&["authentication", "token", "keystone", "validation", "expired"]),
        },
    ]
}

/// Realistic log window covering all builtin scenarios
pub fn sample_log_window() -> LogWindow {
    let base = Utc.with_ymd_and_hms(2017, 5, 16, 1, 0, 0).unwrap();
    let disk_instance = "c4f2a8b2-7d1e-4e9f-9c5a-1a2b3c4d5e6f";
    let disk_request = "req-9bc36dd9-91c5-4314-898a-47625eb93b09";
    let net_instance = "a1b2c3d4-5e6f-7890-abcd-ef1234567890";

    LogWindow::from_entries(vec![
        // disk space exhaustion
        LogEntry::new(base, "nova-api", LogLevel::Info, "POST /v2/servers HTTP/1.1 status: 202")
            .with_instance_id(disk_instance)
            .with_request_id(disk_request)
            .with_source_file("nova-api.log"),
        LogEntry::new(
            base + Duration::minutes(1),
            "nova-scheduler",
            LogLevel::Warning,
            "Host cp-1 has insufficient disk space: required 20GB, available 2GB",
        )
        .with_instance_id(disk_instance)
        .with_request_id(disk_request)
        .with_source_file("nova-scheduler.log"),
        LogEntry::new(
            base + Duration::minutes(2),
            "nova-scheduler",
            LogLevel::Error,
            "No valid host was found. There are not enough hosts available.",
        )
        .with_instance_id(disk_instance)
        .with_request_id(disk_request)
        .with_source_file("nova-scheduler.log"),
        LogEntry::new(
            base + Duration::minutes(3),
            "nova-compute",
            LogLevel::Error,
            "Instance failed to spawn due to insufficient disk space",
        )
        .with_instance_id(disk_instance)
        .with_request_id(disk_request)
        .with_source_file("nova-compute.log"),
        LogEntry::new(
            base + Duration::minutes(4),
            "nova-compute",
            LogLevel::Error,
            "Disk allocation failed: [Errno 28] No space left on device",
        )
        .with_instance_id(disk_instance)
        .with_request_id(disk_request)
        .with_source_file("nova-compute.log"),
        // network connectivity
        LogEntry::new(
            base + Duration::minutes(10),
            "neutron-dhcp-agent",
            LogLevel::Error,
            "DHCP lease allocation failed for network subnet-123",
        )
        .with_instance_id(net_instance)
        .with_request_id("req-network-001")
        .with_source_file("neutron-dhcp-agent.log"),
        LogEntry::new(
            base + Duration::minutes(11),
            "nova-network",
            LogLevel::Warning,
            "Network interface configuration timeout for instance",
        )
        .with_instance_id(net_instance)
        .with_request_id("req-network-001")
        .with_source_file("nova-network.log"),
        LogEntry::new(
            base + Duration::minutes(12),
            "neutron-openvswitch-agent",
            LogLevel::Error,
            "Failed to configure port for instance: network namespace not found",
        )
        .with_instance_id(net_instance)
        .with_request_id("req-network-001")
        .with_source_file("neutron-openvswitch-agent.log"),
        // authentication
        LogEntry::new(
            base + Duration::minutes(20),
            "keystone",
            LogLevel::Error,
            "Token validation failed: token expired at 2017-05-16T01:15:00Z",
        )
        .with_request_id("req-auth-001")
        .with_source_file("keystone.log"),
        LogEntry::new(
            base + Duration::minutes(21),
            "nova-api",
            LogLevel::Error,
            "Authentication failed for service request: invalid token",
        )
        .with_request_id("req-auth-001")
        .with_source_file("nova-api.log"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_scenarios_are_valid() {
        let scenarios = builtin_scenarios();
        assert_eq!(scenarios.len(), 3);
        for scenario in &scenarios {
            scenario.validate().unwrap();
        }
    }

    #[test]
    fn test_sample_window_is_time_ordered() {
        let window = sample_log_window();
        assert_eq!(window.len(), 10);
        for pair in window.entries().windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_malformed_scenario_rejected() {
        let scenario = EvaluationScenario {
            scenario_id: "broken".to_string(),
            issue_description: "  ".to_string(),
            expected_root_cause: "something".to_string(),
            expected_category: "resource_shortage".to_string(),
            keywords: BTreeSet::new(),
        };
        let err = scenario.validate().unwrap_err();
        assert_eq!(err.scenario_id, "broken");
        assert!(err.reason.contains("issue_description"));
    }
}
