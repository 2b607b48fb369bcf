//! Property tests for viewport clamping.

use hudkit_core::{Point, Rect, Size, Viewport};
use proptest::prelude::*;

const EPS: f64 = 1e-9;

proptest! {
    #[test]
    fn clamp_origin_lands_in_the_free_range(
        vw in 1.0f64..4000.0,
        vh in 1.0f64..4000.0,
        w in 0.0f64..5000.0,
        h in 0.0f64..5000.0,
        x in -10_000.0f64..10_000.0,
        y in -10_000.0f64..10_000.0,
    ) {
        let vp = Viewport::new(vw, vh);
        let origin = vp.clamp_origin(Point::new(x, y), Size::new(w, h));
        prop_assert!(origin.x >= 0.0 && origin.x <= (vw - w).max(0.0));
        prop_assert!(origin.y >= 0.0 && origin.y <= (vh - h).max(0.0));
        // Points already in range are left alone.
        if (0.0..=vw - w).contains(&x) {
            prop_assert_eq!(origin.x, x);
        }
    }

    #[test]
    fn containment_offset_brings_fitting_bounds_inside(
        vw in 10.0f64..4000.0,
        vh in 10.0f64..4000.0,
        fw in 0.0f64..1.0,
        fh in 0.0f64..1.0,
        x in -10_000.0f64..10_000.0,
        y in -10_000.0f64..10_000.0,
    ) {
        let vp = Viewport::new(vw, vh);
        let bounds = Rect::new(x, y, vw * fw, vh * fh);
        let offset = vp.containment_offset(&bounds);
        let moved = bounds.translate(offset.x, offset.y);
        prop_assert!(moved.x >= -EPS && moved.y >= -EPS, "{:?}", moved);
        prop_assert!(moved.right <= vw + EPS && moved.bottom <= vh + EPS, "{:?}", moved);
    }
}
