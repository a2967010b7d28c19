//! Channel mapper
//!
//! Every target starts at zero; each channel adds its calibrated row scaled
//! by its intensity. Names absent from the table have no effect. Intensities
//! are used as given, without clamping.

use std::sync::Arc;

use rigstream_core::{MappingError, Vec3};

use crate::{
    eyelid_table, facial_table, MappingTable, ResponseCurve, JAW_LEFT, JAW_LEFT_DEGREES,
    JAW_RIGHT, JAW_RIGHT_DEGREES,
};

/// Degrees of jaw yaw per unit of the two jaw channels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JawCalibration {
    pub left_degrees: f32,
    pub right_degrees: f32,
}

impl Default for JawCalibration {
    fn default() -> Self {
        Self {
            left_degrees: JAW_LEFT_DEGREES,
            right_degrees: JAW_RIGHT_DEGREES,
        }
    }
}

/// Output of one mapping pass
#[derive(Clone, Debug, PartialEq)]
pub struct MappedTargets {
    /// Index-aligned with the table's targets
    pub targets: Vec<Vec3>,
    pub jaw_yaw_degrees: f32,
}

impl MappedTargets {
    fn zero(width: usize) -> Self {
        MappedTargets {
            targets: vec![Vec3::ZERO; width],
            jaw_yaw_degrees: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChannelMapper {
    table: Arc<MappingTable>,
    /// `None` disables the jaw special case; jaw channels then go through
    /// the table like any other
    jaw: Option<JawCalibration>,
    curve: ResponseCurve,
}

impl ChannelMapper {
    pub fn new(table: Arc<MappingTable>) -> Self {
        ChannelMapper {
            table,
            jaw: Some(JawCalibration::default()),
            curve: ResponseCurve::Linear,
        }
    }

    /// Facial displacement mapper with the default calibration
    pub fn facial() -> Result<Self, MappingError> {
        Ok(ChannelMapper::new(Arc::new(facial_table()?)))
    }

    /// Eyelid rotation mapper. Jaw channels are not special here.
    pub fn eyelids() -> Result<Self, MappingError> {
        Ok(ChannelMapper::new(Arc::new(eyelid_table()?)).with_jaw(None))
    }

    pub fn with_jaw(mut self, jaw: Option<JawCalibration>) -> Self {
        self.jaw = jaw;
        self
    }

    pub fn with_curve(mut self, curve: ResponseCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    pub fn curve(&self) -> ResponseCurve {
        self.curve
    }

    pub fn width(&self) -> usize {
        self.table.width()
    }

    /// Accumulate and apply the response curve
    pub fn map<'a, I>(&self, channels: I) -> MappedTargets
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut out = self.accumulate(channels);
        if self.curve != ResponseCurve::Linear {
            for target in &mut out.targets {
                *target = self.curve.apply_vec(*target);
            }
        }
        out
    }

    /// Weighted superposition only, before the response curve
    pub fn accumulate<'a, I>(&self, channels: I) -> MappedTargets
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut out = MappedTargets::zero(self.table.width());
        for (name, intensity) in channels {
            if let Some(jaw) = &self.jaw {
                if name == JAW_LEFT {
                    out.jaw_yaw_degrees += intensity * jaw.left_degrees;
                    continue;
                }
                if name == JAW_RIGHT {
                    out.jaw_yaw_degrees += intensity * jaw.right_degrees;
                    continue;
                }
            }
            let Some(row) = self.table.get(name) else {
                continue;
            };
            for (target, v) in out.targets.iter_mut().zip(row) {
                *target += *v * intensity;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rigstream_core::FACIAL_TARGET_COUNT;

    use crate::FACIAL_ROWS;

    const EPS: f32 = 1e-5;

    /// Summation order changes rounding, not the result
    fn close(a: &MappedTargets, b: &MappedTargets) -> bool {
        const TOLERANCE: f32 = 1e-4;
        a.targets.len() == b.targets.len()
            && a.targets
                .iter()
                .zip(&b.targets)
                .all(|(x, y)| x.max_abs_diff(*y) < TOLERANCE)
            && (a.jaw_yaw_degrees - b.jaw_yaw_degrees).abs() < TOLERANCE
    }

    fn channel_names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = FACIAL_ROWS.iter().map(|(n, _)| *n).collect();
        names.extend([JAW_LEFT, JAW_RIGHT, "NotAChannel"]);
        names
    }

    #[test]
    fn test_empty_input_is_zero() {
        let mapper = ChannelMapper::facial().unwrap();
        let out = mapper.map(std::iter::empty::<(&str, f32)>());
        assert_eq!(out.targets, vec![Vec3::ZERO; FACIAL_TARGET_COUNT]);
        assert_eq!(out.jaw_yaw_degrees, 0.0);
    }

    #[test]
    fn test_single_channel_reproduces_row() {
        let mapper = ChannelMapper::facial().unwrap();
        let out = mapper.map([("JawOpen", 1.0)]);
        assert_eq!(out.targets.as_slice(), mapper.table().get("JawOpen").unwrap());
    }

    #[test]
    fn test_jaw_channels() {
        let mapper = ChannelMapper::facial().unwrap();
        let out = mapper.map([(JAW_LEFT, 0.5), (JAW_RIGHT, 0.25)]);
        assert!((out.jaw_yaw_degrees - 2.0).abs() < EPS);
        assert!(out.targets.iter().all(|v| *v == Vec3::ZERO));
    }

    #[test]
    fn test_unknown_channel_ignored() {
        let mapper = ChannelMapper::facial().unwrap();
        let with = mapper.map([("BrowsU_C", 0.3), ("NoSuchChannel", 1.0)]);
        let without = mapper.map([("BrowsU_C", 0.3)]);
        assert_eq!(with, without);
    }

    #[test]
    fn test_no_clamping() {
        let mapper = ChannelMapper::facial().unwrap();
        let out = mapper.map([("BrowsU_L", 2.0)]);
        assert!((out.targets[3].z + 0.3).abs() < EPS);
    }

    #[test]
    fn test_signed_log_curve() {
        let mapper = ChannelMapper::facial()
            .unwrap()
            .with_curve(ResponseCurve::signed_log());
        let raw = mapper.accumulate([("JawOpen", 1.0)]);
        let out = mapper.map([("JawOpen", 1.0)]);
        for (r, o) in raw.targets.iter().zip(&out.targets) {
            let expected = ResponseCurve::signed_log().apply_vec(*r);
            assert!(o.max_abs_diff(expected) < EPS);
        }
        assert!(out.targets[24].z < raw.targets[24].z);
    }

    #[test]
    fn test_eyelids() {
        let mapper = ChannelMapper::eyelids().unwrap();
        let out = mapper.map([("EyeBlink_L", 1.0), ("EyeBlink_R", 0.5), (JAW_LEFT, 1.0)]);
        assert_eq!(out.targets.len(), 4);
        assert!((out.targets[0].x - 0.436).abs() < EPS);
        assert!((out.targets[1].x - 0.218).abs() < EPS);
        assert_eq!(out.jaw_yaw_degrees, 0.0);
    }

    fn channel_list() -> impl Strategy<Value = Vec<(usize, f32)>> {
        proptest::collection::vec((0..channel_names().len(), 0.0f32..1.0), 0..30)
    }

    proptest! {
        #[test]
        fn prop_order_does_not_matter(
            (list, permuted) in channel_list()
                .prop_flat_map(|list| (Just(list.clone()), Just(list).prop_shuffle())),
        ) {
            let names = channel_names();
            let mapper = ChannelMapper::facial().unwrap();
            let forward: Vec<(&str, f32)> = list.iter().map(|&(i, v)| (names[i], v)).collect();
            let shuffled: Vec<(&str, f32)> =
                permuted.iter().map(|&(i, v)| (names[i], v)).collect();
            prop_assert!(close(&mapper.map(forward), &mapper.map(shuffled)));
        }

        #[test]
        fn prop_linear_in_intensity(
            index in 0..FACIAL_ROWS.len(),
            intensity in 0.0f32..1.0,
            k in -4.0f32..4.0,
        ) {
            let mapper = ChannelMapper::facial().unwrap();
            let name = FACIAL_ROWS[index].0;
            let scaled = mapper.accumulate([(name, k * intensity)]);
            let base = mapper.accumulate([(name, intensity)]);
            for (s, b) in scaled.targets.iter().zip(&base.targets) {
                prop_assert!(s.max_abs_diff(*b * k) < EPS);
            }
        }

        #[test]
        fn prop_jaw_isolation(list in channel_list(), jaw in 0.0f32..1.0) {
            let names = channel_names();
            let mapper = ChannelMapper::facial().unwrap();
            let base: Vec<(&str, f32)> = list
                .iter()
                .map(|&(i, v)| (names[i], v))
                .filter(|(n, _)| *n != JAW_LEFT && *n != JAW_RIGHT)
                .collect();
            let without = mapper.map(base.iter().copied());
            prop_assert_eq!(without.jaw_yaw_degrees, 0.0);

            let mut with_jaw = base.clone();
            with_jaw.push((JAW_LEFT, jaw));
            with_jaw.push((JAW_RIGHT, jaw / 2.0));
            let with = mapper.map(with_jaw);
            prop_assert_eq!(&with.targets, &without.targets);
            prop_assert!((with.jaw_yaw_degrees - jaw * 4.0).abs() < EPS);
        }
    }
}
