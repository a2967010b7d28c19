//! Response curves applied to accumulated target vectors

use serde::Deserialize;

use rigstream_core::Vec3;

/// Log base of the signed-log profile
pub const DEFAULT_LOG_BASE: f32 = 3.5;

fn default_log_base() -> f32 {
    DEFAULT_LOG_BASE
}

/// Per-component compression of accumulated values
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResponseCurve {
    /// Values pass through unchanged
    #[default]
    Linear,
    /// `sign(v) * log_base(1 + |v|)`, each axis independently
    SignedLog {
        #[serde(default = "default_log_base")]
        base: f32,
    },
}

impl ResponseCurve {
    pub fn signed_log() -> Self {
        ResponseCurve::SignedLog {
            base: DEFAULT_LOG_BASE,
        }
    }

    #[inline]
    pub fn apply(self, v: f32) -> f32 {
        match self {
            ResponseCurve::Linear => v,
            ResponseCurve::SignedLog { base } => v.signum() * v.abs().ln_1p() / base.ln(),
        }
    }

    pub fn apply_vec(self, v: Vec3) -> Vec3 {
        match self {
            ResponseCurve::Linear => v,
            _ => v.map(|c| self.apply(c)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_is_identity() {
        let v = Vec3::new(-2.0, 0.5, 10.0);
        assert_eq!(ResponseCurve::Linear.apply_vec(v), v);
    }

    #[test]
    fn test_signed_log_values() {
        let curve = ResponseCurve::signed_log();
        // log_3.5(1 + 2.5) == 1
        assert!((curve.apply(2.5) - 1.0).abs() < 1e-6);
        assert!((curve.apply(-2.5) + 1.0).abs() < 1e-6);
        assert_eq!(curve.apply(0.0), 0.0);

        let v = curve.apply_vec(Vec3::new(2.5, -2.5, 0.0));
        assert!((v.x - 1.0).abs() < 1e-6);
        assert!((v.y + 1.0).abs() < 1e-6);
        assert_eq!(v.z, 0.0);
    }

    #[test]
    fn test_signed_log_compresses() {
        let curve = ResponseCurve::signed_log();
        for x in [0.1f32, 0.5, 1.0, 4.0] {
            assert!(curve.apply(x) < x);
            assert!(curve.apply(x) > 0.0);
        }
    }

    #[test]
    fn test_deserialize() {
        let linear: ResponseCurve = serde_json::from_str(r#"{"kind":"linear"}"#).unwrap();
        assert_eq!(linear, ResponseCurve::Linear);
        let log: ResponseCurve = serde_json::from_str(r#"{"kind":"signed-log"}"#).unwrap();
        assert_eq!(log, ResponseCurve::signed_log());
        let log: ResponseCurve =
            serde_json::from_str(r#"{"kind":"signed-log","base":10.0}"#).unwrap();
        assert_eq!(log, ResponseCurve::SignedLog { base: 10.0 });
    }
}
