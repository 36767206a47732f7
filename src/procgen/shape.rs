//! Shape ratio profiles from Weber & Penn, "Creation and Rendering of
//! Realistic Trees" (section 4.3).

/// Taper multiplier for a species shape id at a normalized position along the
/// trunk.
///
/// | id | profile |
/// |----|---------|
/// | 0 | conical |
/// | 1 | spherical |
/// | 2 | hemispherical |
/// | 3 | cylindrical |
/// | 4 | tapered cylindrical |
/// | 5 | flame |
/// | 6 | inverse conical |
/// | 7 | tend flame |
///
/// Unknown ids return 0.
pub fn shape_ratio(shape: u8, ratio: f32) -> f32 {
    use std::f32::consts::PI;

    match shape {
        0 => 0.2 + 0.8 * ratio,
        1 => 0.2 + 0.8 * (PI * ratio).sin(),
        2 => 0.2 + 0.8 * (0.5 * PI * ratio).sin(),
        3 => 1.0,
        4 => 0.5 + 0.5 * ratio,
        5 => {
            if ratio <= 0.7 {
                ratio / 0.7
            } else {
                (1.0 - ratio) / 0.3
            }
        }
        6 => 1.0 - 0.8 * ratio,
        7 => {
            if ratio <= 0.7 {
                0.5 + 0.5 * ratio / 0.7
            } else {
                0.5 + 0.5 * (1.0 - ratio) / 0.3
            }
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cylindrical_is_constant() {
        for i in 0..=20 {
            assert_eq!(shape_ratio(3, i as f32 / 20.0), 1.0);
        }
    }

    #[test]
    fn test_conical_endpoints() {
        assert!((shape_ratio(0, 0.0) - 0.2).abs() < 1e-6);
        assert!((shape_ratio(0, 1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_flame_peaks_at_seven_tenths() {
        let peak = shape_ratio(5, 0.7);
        assert!((peak - 1.0).abs() < 1e-6);
        for i in 0..=100 {
            assert!(shape_ratio(5, i as f32 / 100.0) <= peak + 1e-6);
        }
    }

    #[test]
    fn test_tend_flame_stays_in_upper_half() {
        for i in 0..=100 {
            let r = shape_ratio(7, i as f32 / 100.0);
            assert!((0.5..=1.0 + 1e-6).contains(&r), "ratio {} gave {}", i, r);
        }
    }

    #[test]
    fn test_unknown_shape_is_zero() {
        assert_eq!(shape_ratio(8, 0.5), 0.0);
        assert_eq!(shape_ratio(255, 0.1), 0.0);
    }
}
