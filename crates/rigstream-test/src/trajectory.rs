//! Synthetic hand trajectories
//!
//! Positions in mm, time in seconds. Noise is seeded so every run of a
//! scenario sees the same samples.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use rigstream_core::Vec3;

#[derive(Clone, Debug, PartialEq)]
pub enum Trajectory {
    Still {
        at: Vec3,
    },
    /// Constant velocity, mm/s
    Linear {
        from: Vec3,
        velocity: Vec3,
    },
    /// Moves with `velocity` until `turn_at`, then moves back twice as fast
    CarriageReturn {
        from: Vec3,
        velocity: Vec3,
        turn_at: f64,
    },
    /// Circle in the XY plane
    Circle {
        center: Vec3,
        radius: f32,
        period: f64,
    },
}

impl Trajectory {
    pub fn position(&self, t: f64) -> Vec3 {
        match self {
            Trajectory::Still { at } => *at,
            Trajectory::Linear { from, velocity } => *from + *velocity * t as f32,
            Trajectory::CarriageReturn {
                from,
                velocity,
                turn_at,
            } => {
                if t <= *turn_at {
                    *from + *velocity * t as f32
                } else {
                    let turn = *from + *velocity * *turn_at as f32;
                    turn - *velocity * (2.0 * (t - turn_at)) as f32
                }
            }
            Trajectory::Circle {
                center,
                radius,
                period,
            } => {
                let angle = (t / period * std::f64::consts::TAU) as f32;
                *center + Vec3::new(angle.cos(), angle.sin(), 0.0) * *radius
            }
        }
    }
}

/// Trajectory plus uniform per-axis noise
pub struct NoisyTrajectory {
    trajectory: Trajectory,
    noise: Option<Uniform<f32>>,
    rng: StdRng,
}

impl NoisyTrajectory {
    /// `noise_mm` is the half-width of the per-axis noise
    pub fn new(trajectory: Trajectory, noise_mm: f32, seed: u64) -> Self {
        NoisyTrajectory {
            trajectory,
            noise: (noise_mm > 0.0).then(|| Uniform::new_inclusive(-noise_mm, noise_mm)),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn sample(&mut self, t: f64) -> Vec3 {
        let clean = self.trajectory.position(t);
        match &self.noise {
            Some(noise) => {
                clean
                    + Vec3::new(
                        noise.sample(&mut self.rng),
                        noise.sample(&mut self.rng),
                        noise.sample(&mut self.rng),
                    )
            }
            None => clean,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carriage_return_comes_back() {
        let traj = Trajectory::CarriageReturn {
            from: Vec3::ZERO,
            velocity: Vec3::new(100.0, 0.0, 0.0),
            turn_at: 1.0,
        };
        assert_eq!(traj.position(1.0), Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(traj.position(1.5), Vec3::ZERO);
    }

    #[test]
    fn test_noise_is_bounded_and_seeded() {
        let still = Trajectory::Still {
            at: Vec3::new(0.0, 200.0, 0.0),
        };
        let mut a = NoisyTrajectory::new(still.clone(), 0.5, 7);
        let mut b = NoisyTrajectory::new(still, 0.5, 7);
        for i in 0..100 {
            let t = i as f64 * 0.02;
            let pa = a.sample(t);
            assert_eq!(pa, b.sample(t));
            assert!(pa.max_abs_diff(Vec3::new(0.0, 200.0, 0.0)) <= 0.5);
        }
    }
}
