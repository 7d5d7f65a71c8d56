//! depth_model.rs — Device depth & ascent physics
//!
//! Pure per-tick update of depth, distance from the buoy and motion status.
//! Distance is a fixed multiple of depth that differs by direction of travel,
//! a stand-in for lateral drift rather than a modelled current.

use recovery_types::DeviceStatus;

use crate::config::MissionConfig;

/// Distance/depth ratio while sinking
pub const DESCENT_DRIFT_FACTOR: f64 = 1.3;
/// Distance/depth ratio while rising
pub const ASCENT_DRIFT_FACTOR: f64 = 1.5;

/// Slack on the max-depth and threshold comparisons. Repeated float steps
/// (50 − 50×0.8) land a hair off the boundary and must still transition.
pub const DEPTH_EPSILON_M: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStep {
    pub status: DeviceStatus,
    pub depth_m: f64,
    pub distance_m: f64,
    /// Status changed during this step
    pub transitioned: bool,
}

/// Advance the device by `dt` simulated seconds.
///
/// - descending: sinks at `descent_rate`, stops at `max_depth` and goes idle
/// - ascending: rises at `ascent_rate`, goes idle at or above `ascent_threshold`
/// - idle / offline: no motion
///
/// Returned depth is always within `[0, max_depth]`.
pub fn advance(
    status: DeviceStatus,
    depth_m: f64,
    distance_m: f64,
    dt: f64,
    cfg: &MissionConfig,
) -> DepthStep {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    let max_depth = cfg.max_depth_m;

    match status {
        DeviceStatus::Descending => {
            let mut depth = depth_m + cfg.descent_rate_mps * dt;
            let mut next = status;
            if depth >= max_depth - DEPTH_EPSILON_M {
                depth = max_depth;
                next = DeviceStatus::Idle;
            }
            let depth = depth.clamp(0.0, max_depth);
            DepthStep {
                status: next,
                depth_m: depth,
                distance_m: depth * DESCENT_DRIFT_FACTOR,
                transitioned: next != status,
            }
        }
        DeviceStatus::Ascending => {
            let mut depth = depth_m - cfg.ascent_rate_mps * dt;
            let mut next = status;
            if depth <= cfg.ascent_threshold_m + DEPTH_EPSILON_M {
                depth = depth.min(cfg.ascent_threshold_m).max(0.0);
                next = DeviceStatus::Idle;
            }
            let depth = depth.clamp(0.0, max_depth);
            DepthStep {
                status: next,
                depth_m: depth,
                distance_m: depth * ASCENT_DRIFT_FACTOR,
                transitioned: next != status,
            }
        }
        DeviceStatus::Idle | DeviceStatus::Offline => DepthStep {
            status,
            depth_m: depth_m.clamp(0.0, max_depth),
            distance_m,
            transitioned: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> MissionConfig {
        MissionConfig::default()
    }

    #[test]
    fn test_descent_step() {
        let s = advance(DeviceStatus::Descending, 10.0, 13.0, 1.0, &cfg());
        assert_eq!(s.status, DeviceStatus::Descending);
        assert_eq!(s.depth_m, 11.0);
        assert!((s.distance_m - 11.0 * 1.3).abs() < 1e-12);
        assert!(!s.transitioned);
    }

    #[test]
    fn test_descent_clamps_at_max_depth() {
        let s = advance(DeviceStatus::Descending, 244.5, 0.0, 1.0, &cfg());
        assert_eq!(s.status, DeviceStatus::Idle);
        assert_eq!(s.depth_m, 245.0);
        assert!(s.transitioned);
    }

    #[test]
    fn test_ascent_goes_idle_at_threshold() {
        let s = advance(DeviceStatus::Ascending, 10.5, 0.0, 1.0, &cfg());
        assert_eq!(s.status, DeviceStatus::Idle);
        assert!((s.depth_m - 9.7).abs() < 1e-9);
        assert!((s.distance_m - 9.7 * 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_ascent_never_goes_negative() {
        let c = MissionConfig { ascent_threshold_m: 0.0, ascent_rate_mps: 5.0, ..cfg() };
        let s = advance(DeviceStatus::Ascending, 2.0, 3.0, 1.0, &c);
        assert_eq!(s.depth_m, 0.0);
        assert_eq!(s.distance_m, 0.0);
        assert_eq!(s.status, DeviceStatus::Idle);
    }

    #[test]
    fn test_accumulated_ascent_error_still_transitions() {
        let c = MissionConfig { max_depth_m: 50.0, ..cfg() };
        let mut depth = 50.0;
        let mut status = DeviceStatus::Ascending;
        for _ in 0..50 {
            let s = advance(status, depth, 0.0, 1.0, &c);
            depth = s.depth_m;
            status = s.status;
        }
        assert_eq!(status, DeviceStatus::Idle);
        assert!(depth <= 10.0);
    }

    #[test]
    fn test_idle_and_offline_do_not_move() {
        for status in [DeviceStatus::Idle, DeviceStatus::Offline] {
            let s = advance(status, 100.0, 42.0, 1.0, &cfg());
            assert_eq!((s.status, s.depth_m, s.distance_m), (status, 100.0, 42.0));
        }
    }

    #[test]
    fn test_bad_dt_is_ignored() {
        let s = advance(DeviceStatus::Descending, 5.0, 0.0, f64::NAN, &cfg());
        assert_eq!(s.depth_m, 5.0);
        let s = advance(DeviceStatus::Descending, 5.0, 0.0, -3.0, &cfg());
        assert_eq!(s.depth_m, 5.0);
    }
}
