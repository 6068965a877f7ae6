//! Per-deployment tuning for a Room (§6 configuration table).

use usion_net::payloads::DeployProfile;

#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub sim_tick_hz: u32,
    pub network_hz: u32,
    pub full_snapshot_interval_net_ticks: u32,
    pub deploy_region: String,
}

impl RoomConfig {
    pub fn deploy_profile(&self) -> DeployProfile {
        DeployProfile {
            deploy_region: self.deploy_region.clone(),
            sim_hz: self.sim_tick_hz,
            net_hz: self.network_hz,
        }
    }

    /// Every how many simulation ticks a network frame is produced.
    /// Spec default is 60/60 = 1 (a frame every tick).
    pub fn net_frame_every_sim_ticks(&self) -> u64 {
        (self.sim_tick_hz / self.network_hz).max(1) as u64
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            sim_tick_hz: 60,
            network_hz: 60,
            full_snapshot_interval_net_ticks: 60,
            deploy_region: "local".to_string(),
        }
    }
}
