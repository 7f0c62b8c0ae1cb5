// Licensed under the Apache-2.0 license

//! Timer-period (MTPR) divisor computation.
//!
//! `divisor = ceil(system_clock / (duty * bus_rate)) - 1`, where `duty` is
//! `2 * (SCL_LP + SCL_HP)`: 20 for the standard, fast and fast-plus classes
//! and 6 for high speed.

use fugit::HertzU32;

use crate::i2c::common::I2cSpeed;

/// Largest divisor the hardware accepts.
pub const MAX_DIVISOR: i64 = 128;

struct SpeedClass {
    duty: u64,
    rate_hz: u64,
}

const fn class(speed: I2cSpeed) -> SpeedClass {
    match speed {
        I2cSpeed::Standard => SpeedClass {
            duty: 20,
            rate_hz: 100_000,
        },
        I2cSpeed::Fast => SpeedClass {
            duty: 20,
            rate_hz: 400_000,
        },
        I2cSpeed::FastPlus => SpeedClass {
            duty: 20,
            rate_hz: 1_000_000,
        },
        // 33.3 kHz scaled by 100: 3.33 MHz.
        I2cSpeed::HighSpeed => SpeedClass {
            duty: 6,
            rate_hz: 3_330_000,
        },
    }
}

/// Raw divisor for `speed`, which may be outside the valid range.
#[must_use]
pub fn timer_period(system_clock: HertzU32, speed: I2cSpeed) -> i64 {
    let SpeedClass { duty, rate_hz } = class(speed);
    let dividend = u64::from(system_clock.raw());
    let quotient = dividend.div_ceil(duty * rate_hz);
    // Quotient of a u32 dividend always fits.
    i64::try_from(quotient).unwrap_or(i64::MAX) - 1
}

/// Whether `divisor` can be programmed: exclusive lower bound 0, inclusive
/// upper bound 128.
#[must_use]
pub fn is_valid_divisor(divisor: i64) -> bool {
    divisor > 0 && divisor <= MAX_DIVISOR
}
