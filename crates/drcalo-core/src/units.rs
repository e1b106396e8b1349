//! Internal unit system and conversions to the output contract
//!
//! Quantities inside the core use the transport engine's conventions:
//! millimetre, nanosecond and MeV are 1. Output records are written in
//! GeV, mm and ns regardless of the internal system, so every conversion
//! goes through the helpers below.

/// Millimetre
pub const MM: f64 = 1.0;
/// Centimetre
pub const CM: f64 = 10.0 * MM;
/// Nanosecond
pub const NS: f64 = 1.0;
/// Mega electron-volt
pub const MEV: f64 = 1.0;
/// Giga electron-volt
pub const GEV: f64 = 1000.0 * MEV;

/// Energy, momentum or mass in GeV
pub fn to_gev(value: f64) -> f64 {
    value / GEV
}

/// Length in mm
pub fn to_mm(value: f64) -> f64 {
    value / MM
}

/// Time in ns
pub fn to_ns(value: f64) -> f64 {
    value / NS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(to_gev(2500.0 * MEV), 2.5);
        assert_eq!(to_mm(1.5 * CM), 15.0);
        assert_eq!(to_ns(10.0 * NS), 10.0);
    }
}
