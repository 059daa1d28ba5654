//! Constant-velocity Kalman filter over the XYAH box space.
//!
//! The state is `[cx, cy, a, h, vx, vy, va, vh]`; only the first four
//! components are observed.

use nalgebra::{Matrix4, SMatrix, SVector, Vector4};

pub type Mean = SVector<f64, 8>;
pub type Covariance = SMatrix<f64, 8, 8>;

type Observation = SMatrix<f64, 4, 8>;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Covariance,
    update_mat: Observation,
    std_weight_position: f64,
    std_weight_velocity: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
        let mut motion_mat = Covariance::identity();
        let mut update_mat = Observation::zeros();
        for i in 0..4 {
            motion_mat[(i, 4 + i)] = 1.0;
            update_mat[(i, i)] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
        }
    }

    fn motion_noise(&self, h: f64, position_scale: f64, velocity_scale: f64) -> Covariance {
        let p = position_scale * self.std_weight_position * h;
        let v = velocity_scale * self.std_weight_velocity * h;
        let std = Mean::from([p, p, 1e-2, p, v, v, 1e-5, v]);
        Covariance::from_diagonal(&std.component_mul(&std))
    }

    pub fn initiate(&self, measurement: Vector4<f64>) -> (Mean, Covariance) {
        let mut mean = Mean::zeros();
        mean.fixed_rows_mut::<4>(0).copy_from(&measurement);

        let covariance = self.motion_noise(measurement[3], 2.0, 10.0);
        (mean, covariance)
    }

    pub fn predict(&self, mean: &Mean, covariance: &Covariance) -> (Mean, Covariance) {
        let motion_cov = self.motion_noise(mean[3], 1.0, 1.0);

        let mean = self.motion_mat * mean;
        let covariance = self.motion_mat * covariance * self.motion_mat.transpose() + motion_cov;
        (mean, covariance)
    }

    pub fn project(&self, mean: &Mean, covariance: &Covariance) -> (Vector4<f64>, Matrix4<f64>) {
        let p = self.std_weight_position * mean[3];
        let std = Vector4::new(p, p, 1e-1, p);
        let innovation_cov = Matrix4::from_diagonal(&std.component_mul(&std));

        let mean = self.update_mat * mean;
        let covariance = self.update_mat * covariance * self.update_mat.transpose() + innovation_cov;
        (mean, covariance)
    }

    /// Correct the state with a new XYAH measurement.
    ///
    /// Returns `None` when the projected covariance cannot be inverted.
    pub fn update(
        &self,
        mean: &Mean,
        covariance: &Covariance,
        measurement: Vector4<f64>,
    ) -> Option<(Mean, Covariance)> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);
        let projected_inv = projected_cov.try_inverse()?;

        let kalman_gain = covariance * self.update_mat.transpose() * projected_inv;
        let innovation = measurement - projected_mean;

        let mean = mean + kalman_gain * innovation;
        let covariance = covariance - kalman_gain * projected_cov * kalman_gain.transpose();
        Some((mean, covariance))
    }
}
