mod common;

use common::*;
use fragmap::prelude::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Background work: threaded fragment loading, fire-and-forget layer
/// repaints, and concurrent use of one map from several threads
#[cfg(test)]
mod background_tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn threaded_config() -> MapConfig {
        let mut config = MapConfig::default();
        config.workers = TaskManagerConfig {
            max_concurrent_tasks: 2,
            max_queue_size: None,
            test_mode: false,
        };
        config
    }

    fn image_pixels(map: &Map<PooledFragmentProvider<ScriptedSource>>) -> Vec<Option<u32>> {
        map.inspect_grid(|grid| {
            grid.iter()
                .map(|cell| {
                    cell.fragment
                        .layer_image(IMAGE_LAYER)
                        .and_then(|image| image.pixel(0, 0))
                })
                .collect()
        })
    }

    fn wait_for_loads(map: &Map<PooledFragmentProvider<ScriptedSource>>) {
        let loaded = wait_for(TIMEOUT, || {
            map.with_provider(|provider| provider.completed_loads() == provider.stats().loads_started)
        });
        assert!(loaded, "fragment loads did not finish");
    }

    #[test]
    fn test_fragments_load_off_thread() {
        init_logging();
        let (map, _) = pooled_map(ScriptedSource::new(), 1.0, threaded_config());
        map.draw(&mut RenderContext::new(800.0, 600.0), 0.0);
        wait_for_loads(&map);

        let loaded = map.inspect_grid(|grid| grid.iter().all(|cell| cell.fragment.is_loaded()));
        assert!(loaded);
        assert_eq!(map.with_provider(|provider| provider.stats().loads_started), 16);
    }

    #[test]
    fn test_background_repaint_reaches_every_fragment() {
        init_logging();
        let (map, _) = pooled_map(ScriptedSource::new(), 1.0, threaded_config());
        map.draw(&mut RenderContext::new(800.0, 600.0), 0.0);
        wait_for_loads(&map);
        assert!(image_pixels(&map).iter().all(|pixel| *pixel == Some(0)));

        map.with_provider(|provider| provider.source().generation.store(2, Ordering::SeqCst));
        map.repaint_layer_in_background(IMAGE_LAYER).unwrap();

        assert!(wait_for(TIMEOUT, || map.completed_background_tasks() == 1));
        // the provider renders the repaint on its own workers
        let repainted = wait_for(TIMEOUT, || {
            image_pixels(&map).iter().all(|pixel| *pixel == Some(2))
        });
        let pixels = image_pixels(&map);
        assert_eq!(pixels.len(), 16);
        assert!(repainted, "{pixels:?}");
    }

    #[test]
    fn test_repaint_can_run_while_drawing() {
        init_logging();
        let (map, _) = pooled_map(ScriptedSource::new(), 1.0, threaded_config());
        let map = Arc::new(map);
        map.draw(&mut RenderContext::new(800.0, 600.0), 0.0);

        for _ in 0..5 {
            map.repaint_layer_in_background(IMAGE_LAYER).unwrap();
        }
        let mut context = RenderContext::new(800.0, 600.0);
        for frame in 0..20 {
            map.pan_by(-37.0, 11.0);
            map.draw(&mut context, frame as f32);
        }

        assert!(wait_for(TIMEOUT, || map.completed_background_tasks() == 5));
        map.inspect_grid(|grid| grid.validate()).unwrap();
    }

    #[test]
    fn test_concurrent_callers_keep_grid_consistent() {
        init_logging();
        let config = MapProfile::Testing.resolve();
        let (map, zoom) = pooled_map(ScriptedSource::new(), 1.0, config);
        let map = Arc::new(map);

        let handles: Vec<_> = (0..4u64)
            .map(|seed| {
                let map = Arc::clone(&map);
                let zoom = Arc::clone(&zoom);
                std::thread::spawn(move || {
                    let mut rng = Lcg::new(seed + 1);
                    let mut context = RenderContext::new(800.0, 600.0);
                    for frame in 0..100 {
                        match rng.next_u32() % 4 {
                            0 | 1 => map.pan_by(rng.range(-800.0, 800.0), rng.range(-800.0, 800.0)),
                            2 => map.resize_viewport(rng.range(100.0, 1600.0), rng.range(100.0, 1200.0)),
                            _ => zoom.set(rng.range(0.5, 2.0)),
                        }
                        map.draw(&mut context, frame as f32);
                        let _ = map.object_near(Point::new(400.0, 300.0), 50.0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker thread panicked");
        }

        map.draw(&mut RenderContext::new(800.0, 600.0), 0.0);
        map.inspect_grid(|grid| grid.validate()).unwrap();
        let resident = map.with_provider(|provider| provider.stats().resident);
        assert_eq!(resident, map.dimensions().area());
    }
}
