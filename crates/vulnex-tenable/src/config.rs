//! Export job tuning knobs

use std::time::Duration;

/// Per-run export settings with Tenable-documented defaults.
///
/// `num_assets` is only valid on the vulnerability endpoints; `chunk_size`
/// only on the assets v2 endpoint.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub vm_num_assets: u32,
    pub vm_include_unlicensed: bool,
    pub was_num_assets: u32,
    pub was_include_unlicensed: bool,
    pub assets_chunk_size: u32,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            vm_num_assets: 200,
            vm_include_unlicensed: true,
            was_num_assets: 50,
            was_include_unlicensed: true,
            assets_chunk_size: 4000,
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 360,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_api_docs() {
        let s = ExportSettings::default();
        assert_eq!(s.vm_num_assets, 200);
        assert_eq!(s.was_num_assets, 50);
        assert_eq!(s.assets_chunk_size, 4000);
        assert_eq!(s.poll_interval, Duration::from_secs(5));
        assert_eq!(s.max_poll_attempts, 360);
    }
}
