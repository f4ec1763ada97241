//! Unit tests for percent/pixel projection

use flipcache::geometry::{percent_to_pixels, pixels_to_percent, snap_rect, snap_to_grid, Size};
use flipcache::{PercentRect, PixelRect};

#[test]
fn projects_into_container() {
    let rect = percent_to_pixels(
        &PercentRect::new(10.0, 20.0, 30.0, 40.0),
        Size::new(800.0, 600.0),
    );
    assert!(rect.approx_eq(&PixelRect::new(80.0, 120.0, 240.0, 240.0), 1e-9));
}

#[test]
fn out_of_range_fields_clamp_independently() {
    let rect = percent_to_pixels(
        &PercentRect::new(150.0, -10.0, 50.0, 50.0),
        Size::new(100.0, 100.0),
    );
    assert_eq!(rect, PixelRect::new(100.0, 0.0, 50.0, 50.0));
    // Width is not re-clamped against x
    assert!(rect.x + rect.width > 100.0);
}

#[test]
fn zero_container_yields_zero_percent() {
    let rect = pixels_to_percent(&PixelRect::new(5.0, 5.0, 5.0, 5.0), Size::new(0.0, 400.0));
    assert_eq!(rect, PercentRect::zero());
}

#[test]
fn pixels_back_to_percent() {
    let rect = pixels_to_percent(
        &PixelRect::new(80.0, 120.0, 240.0, 240.0),
        Size::new(800.0, 600.0),
    );
    assert!(rect.approx_eq(&PercentRect::new(10.0, 20.0, 30.0, 40.0), 1e-9));
}

#[test]
fn snapping_rounds_to_half_units() {
    assert_eq!(snap_to_grid(10.26, true), 10.5);
    assert_eq!(snap_to_grid(10.24, true), 10.0);
    assert_eq!(snap_to_grid(10.26, false), 10.26);

    let snapped = snap_rect(&PercentRect::new(1.2, 3.7, 49.9, 0.3), true);
    assert_eq!(snapped, PercentRect::new(1.0, 3.5, 50.0, 0.5));
}

#[test]
fn display_uses_units() {
    assert_eq!(
        PercentRect::new(1.0, 2.0, 3.0, 4.5).to_string(),
        "x=1.00% y=2.00% w=3.00% h=4.50%"
    );
}
