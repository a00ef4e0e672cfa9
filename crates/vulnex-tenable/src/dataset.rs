//! Dataset definitions for the three Tenable export pipelines

use serde_json::{Value, json};

use crate::config::ExportSettings;

/// Exportable dataset on the Tenable.io API
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dataset {
    VmVulns,
    WasFindings,
    Assets,
}

impl Dataset {
    /// Parse CLI/config string into enum
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "vm" => Some(Self::VmVulns),
            "was" => Some(Self::WasFindings),
            "assets" => Some(Self::Assets),
            _ => None,
        }
    }

    /// Short label for logs and progress bars
    pub fn label(self) -> &'static str {
        match self {
            Self::VmVulns => "VM",
            Self::WasFindings => "WAS",
            Self::Assets => "Assets",
        }
    }

    /// Output table / sheet name
    pub fn table_name(self) -> &'static str {
        match self {
            Self::VmVulns => "VM_Vulnerabilities",
            Self::WasFindings => "WAS_Vulnerabilities",
            Self::Assets => "Tenable_VM_Assets",
        }
    }

    /// Endpoint that starts the export job
    pub fn export_path(self) -> &'static str {
        match self {
            Self::VmVulns => "/vulns/export",
            Self::WasFindings => "/was/v1/export/vulns",
            // chunk_size is only valid here, not on the vuln endpoints
            Self::Assets => "/assets/v2/export",
        }
    }

    /// Base path for status and chunk endpoints.
    ///
    /// Assets jobs are started under /assets/v2 but polled under /assets.
    fn status_base(self) -> &'static str {
        match self {
            Self::VmVulns => "/vulns/export",
            Self::WasFindings => "/was/v1/export/vulns",
            Self::Assets => "/assets/export",
        }
    }

    pub fn status_path(self, uuid: &str) -> String {
        format!("{}/{uuid}/status", self.status_base())
    }

    pub fn chunk_path(self, uuid: &str, chunk_id: u64) -> String {
        format!("{}/{uuid}/chunks/{chunk_id}", self.status_base())
    }

    /// Whether a 403 on job start means "no license, skip" rather than "fail"
    pub fn is_optional(self) -> bool {
        matches!(self, Self::WasFindings)
    }

    /// Request body for the export start call
    pub fn start_body(self, settings: &ExportSettings) -> Value {
        match self {
            Self::VmVulns => json!({
                "num_assets": settings.vm_num_assets,
                "include_unlicensed": settings.vm_include_unlicensed,
                "filters": {
                    // Informational severity excluded by default
                    "severity": ["LOW", "MEDIUM", "HIGH", "CRITICAL"],
                    "state": ["OPEN", "REOPENED", "FIXED"],
                },
            }),
            Self::WasFindings => json!({
                "num_assets": settings.was_num_assets,
                "include_unlicensed": settings.was_include_unlicensed,
                "filters": {
                    "severity": ["LOW", "MEDIUM", "HIGH", "CRITICAL"],
                    "state": ["OPEN", "REOPENED"],
                },
            }),
            Self::Assets => json!({
                "chunk_size": settings.assets_chunk_size,
                "filters": {
                    // Both VM hosts and WAS web applications
                    "types": ["host", "webapp"],
                },
            }),
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
