mod common;

use common::*;
use fragmap::prelude::*;
use std::sync::atomic::Ordering;

/// Recycle pool behaviour of the pooled provider as seen through a map
#[cfg(test)]
mod pooled_provider_tests {
    use super::*;

    fn drawn_map() -> Map<PooledFragmentProvider<ScriptedSource>> {
        init_logging();
        let (map, _) = pooled_map(ScriptedSource::new(), 1.0, MapProfile::Testing.resolve());
        map.draw(&mut RenderContext::new(800.0, 600.0), 0.0);
        map
    }

    fn stats(map: &Map<PooledFragmentProvider<ScriptedSource>>) -> PoolStats {
        map.with_provider(|provider| provider.stats())
    }

    fn renders(map: &Map<PooledFragmentProvider<ScriptedSource>>) -> usize {
        map.with_provider(|provider| provider.source().renders.load(Ordering::SeqCst))
    }

    #[test]
    fn test_panning_back_reuses_recycled_fragments() {
        let map = drawn_map();
        let mut context = RenderContext::new(800.0, 600.0);
        assert_eq!(stats(&map).loads_started, 16);

        map.pan_by(-(FRAGMENT_SIZE as f64), 0.0);
        map.draw(&mut context, 0.0);
        assert_eq!(stats(&map).loads_started, 20);
        assert_eq!(stats(&map).recycled, 4);

        map.pan_by(FRAGMENT_SIZE as f64, 0.0);
        map.draw(&mut context, 0.0);

        let stats = stats(&map);
        assert_eq!(stats.loads_started, 20);
        assert_eq!(stats.reused, 4);
        assert_eq!(stats.resident, 16);
        assert_eq!(stats.recycled, 4);
    }

    #[test]
    fn test_reused_fragments_keep_their_content() {
        let map = drawn_map();
        let mut context = RenderContext::new(800.0, 600.0);
        map.pan_by(-(FRAGMENT_SIZE as f64), 0.0);
        map.draw(&mut context, 0.0);
        map.pan_by(FRAGMENT_SIZE as f64, 0.0);
        let before = renders(&map);
        map.draw(&mut context, 0.0);

        // only the live layer of the sixteen resident fragments is rendered
        assert_eq!(renders(&map) - before, 16);
        let loaded = map.inspect_grid(|grid| grid.iter().all(|cell| cell.fragment.is_loaded()));
        assert!(loaded);
    }

    #[test]
    fn test_pool_is_bounded_by_capacity() {
        let map = drawn_map();
        let capacity = MapProfile::Testing.resolve().pool.recycle_capacity;

        map.pan_by(-3.0 * FRAGMENT_SIZE as f64, 0.0);
        map.draw(&mut RenderContext::new(800.0, 600.0), 0.0);

        let stats = stats(&map);
        assert_eq!(stats.recycled, capacity);
        assert_eq!(stats.resident, 16);
    }

    #[test]
    fn test_dispose_clears_provider() {
        let map = drawn_map();
        map.pan_by(-(FRAGMENT_SIZE as f64), 0.0);
        map.draw(&mut RenderContext::new(800.0, 600.0), 0.0);

        map.dispose();

        let stats = stats(&map);
        assert_eq!(stats.resident, 0);
        assert_eq!(stats.recycled, 0);
    }
}
