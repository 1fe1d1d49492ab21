//! GPIO / peripheral pin assignments for the smart-home controller board.
//!
//! Single source of truth: the bring-up code references this module rather
//! than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Two-level outputs (relay drivers, active HIGH)
// ---------------------------------------------------------------------------

/// Heating pad relay.
pub const HEATING_PAD_GPIO: i32 = 5;
/// Temperature sensor supply relay.
pub const TEMPERATURE_SENSOR_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// Servo outputs (LEDC PWM)
// ---------------------------------------------------------------------------

pub const CAMERA_X_SERVO_GPIO: i32 = 25;
pub const CAMERA_Y_SERVO_GPIO: i32 = 26;
pub const LASER_X_SERVO_GPIO: i32 = 27;
pub const LASER_Y_SERVO_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Hobby servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC timer resolution for the servo timer.  14 bits at 50 Hz gives
/// ~1.2 µs per step, well below servo dead-band.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
