mod common;

use common::*;
use fragmap::prelude::*;
use std::sync::Arc;

/// Structural checks of the fragment grid under long randomized
/// interaction sequences, plus the disposal contract
#[cfg(test)]
mod grid_invariant_tests {
    use super::*;

    fn strict_map(scale: f64) -> (Map<StrictProvider>, Arc<FixedZoom>) {
        init_logging();
        let zoom = Arc::new(FixedZoom::new(scale));
        let map = Map::from_profile(StrictProvider::default(), zoom.clone(), &MapProfile::Testing)
            .expect("testing profile is valid");
        (map, zoom)
    }

    fn expected_dimensions(viewer: (f64, f64), scale: f64) -> GridDimensions {
        let scaled = FRAGMENT_SIZE as f64 * scale;
        GridDimensions::new(
            (viewer.1 / scaled).ceil() as usize + 2,
            (viewer.0 / scaled).ceil() as usize + 2,
        )
    }

    fn assert_consistent(map: &Map<StrictProvider>) {
        map.inspect_grid(|grid| {
            if let Err(violation) = grid.validate() {
                panic!("grid invariant broken: {violation}");
            }
            let markers = grid.iter().filter(|cell| cell.end_of_line).count();
            assert_eq!(markers, grid.rows(), "one line-end marker per row");
            assert_eq!(grid.iter().count(), grid.len());
        });
        let resident = map.with_provider(|provider| provider.resident.len());
        assert_eq!(resident, map.dimensions().area(), "provider and grid disagree");
    }

    #[test]
    fn test_invariants_hold_under_random_interaction() {
        let (map, zoom) = strict_map(1.0);
        let mut rng = Lcg::new(0x5eed);
        let mut context = RenderContext::new(800.0, 600.0);

        for step in 0..400 {
            match rng.next_u32() % 10 {
                0..=4 => map.pan_by(rng.range(-1500.0, 1500.0), rng.range(-1500.0, 1500.0)),
                5 | 6 => map.resize_viewport(rng.range(0.0, 2000.0), rng.range(0.0, 1500.0)),
                7 | 8 => zoom.set(rng.range(0.25, 4.0)),
                _ => map.center_on(
                    rng.range(-1.0e6, 1.0e6) as i64,
                    rng.range(-1.0e6, 1.0e6) as i64,
                ),
            }
            map.draw(&mut context, step as f32);

            assert_consistent(&map);
            assert_eq!(
                map.dimensions(),
                expected_dimensions(map.viewer_size(), map.scale()),
                "step {step}"
            );
            let origin = map.origin();
            let scaled = FRAGMENT_SIZE as f64 * map.scale();
            assert!(origin.x <= 1e-9 && origin.x > -scaled - 1e-9, "step {step}: {origin:?}");
            assert!(origin.y <= 1e-9 && origin.y > -scaled - 1e-9, "step {step}: {origin:?}");
        }
    }

    #[test]
    fn test_pure_pans_keep_fragment_count() {
        let (map, _) = strict_map(0.75);
        let mut rng = Lcg::new(7);
        let mut context = RenderContext::new(800.0, 600.0);
        map.draw(&mut context, 0.0);
        let count = map.dimensions().area();

        for _ in 0..200 {
            map.pan_by(rng.range(-900.0, 900.0), rng.range(-900.0, 900.0));
            map.draw(&mut context, 0.0);
            assert_eq!(map.dimensions().area(), count);
            assert_consistent(&map);
        }
    }

    #[test]
    fn test_pan_crosses_one_edge_per_fragment() {
        let (map, _) = strict_map(1.0);
        let mut context = RenderContext::new(800.0, 600.0);
        map.draw(&mut context, 0.0);
        let first = || map.inspect_grid(|grid| grid.first().map(|f| f.coord()));

        map.pan_by(-500.0, 0.0);
        map.draw(&mut context, 0.0);
        assert_eq!(first(), Some(FragmentCoord::new(0, 0)));

        map.pan_by(-30.0, 0.0);
        map.draw(&mut context, 0.0);
        assert_eq!(first(), Some(FragmentCoord::new(512, 0)));

        map.pan_by(0.0, 3.0 * 512.0);
        map.draw(&mut context, 0.0);
        assert_eq!(first(), Some(FragmentCoord::new(512, -1536)));
        assert_eq!(map.dimensions(), GridDimensions::new(4, 4));
        assert_consistent(&map);
    }

    #[test]
    fn test_dispose_returns_each_fragment_once() {
        let (map, _) = strict_map(1.0);
        let mut context = RenderContext::new(800.0, 600.0);
        map.draw(&mut context, 0.0);
        let resident: Vec<FragmentCoord> =
            map.with_provider(|provider| provider.resident.keys().copied().collect());
        assert_eq!(resident.len(), 16);
        let recycled_before = map.with_provider(|provider| provider.recycled.len());

        map.dispose();

        map.with_provider(|provider| {
            assert!(provider.resident.is_empty());
            assert_eq!(provider.resets, 1);
            for coord in &resident {
                assert_eq!(provider.recycled.get(coord), Some(&1), "{coord}");
            }
            assert_eq!(provider.recycled.len(), recycled_before + resident.len());
        });

        context.begin_frame();
        assert_eq!(map.draw(&mut context, 1.0), 0);
        assert!(context.commands().is_empty());
        assert_eq!(map.dimensions(), GridDimensions::new(0, 0));
        assert_eq!(map.screen_to_world(Point::new(1.0, 1.0)), None);
        assert_eq!(map.object_near(Point::new(1.0, 1.0), 100.0), None);
    }

    #[test]
    fn test_recenter_after_dispose_rebuilds_grid() {
        let (map, _) = strict_map(1.0);
        map.dispose();

        map.center_on(5000, -5000);
        assert_eq!(map.dimensions(), GridDimensions::new(1, 1));
        map.draw(&mut RenderContext::new(800.0, 600.0), 0.0);
        assert_eq!(map.dimensions(), GridDimensions::new(4, 4));
        assert_consistent(&map);
    }
}
