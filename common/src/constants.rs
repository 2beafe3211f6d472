/// Default time step (in units of the inverse chemical potential)
pub const DEFAULT_DT: f64 = 0.1;

/// Default uniform dissipation γ
pub const DEFAULT_GAMMA: f64 = 0.1;

/// Default amplitude of the disordered initial state
pub const DEFAULT_NOISE_STRENGTH: f64 = 0.01;

/// Net charge below which a defect-density peak is no longer counted as a vortex
pub const DEFAULT_CHARGE_TOLERANCE: f64 = 0.2;

/// Radius of the ball the defect density is integrated over around a peak
pub const DEFAULT_BALL_RADIUS: f64 = 1.0;

/// Width of the tanh interface of the dissipative frame
pub const DEFAULT_FRAME_WIDTH: f64 = 7.0;
