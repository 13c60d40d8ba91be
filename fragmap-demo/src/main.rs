use anyhow::{Context, Result};
use fragmap::{constants::BIOME_SIZE, prelude::*};
use std::sync::Arc;

const TERRAIN: LayerId = LayerId(0);
const GRID_LINES: LayerId = LayerId(1);
const BEACON: LayerId = LayerId(2);

/// Cheap integer hash for deterministic procedural content
fn hash2(x: i64, y: i64, salt: u64) -> u64 {
    let mut h = (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ salt;
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^ (h >> 33)
}

/// World generator stand-in: hashed terrain, a grid overlay, a pulsing
/// beacon layer and a few villages per fragment
struct ProceduralSource {
    seed: u64,
}

impl ProceduralSource {
    fn biome(&self, sample_x: i64, sample_y: i64) -> BiomeId {
        (hash2(sample_x / 8, sample_y / 8, self.seed) % 40) as BiomeId
    }
}

impl FragmentSource for ProceduralSource {
    fn layers(&self) -> Vec<LayerDescriptor> {
        vec![
            LayerDescriptor::new(TERRAIN.0, LayerClass::Image, "terrain"),
            LayerDescriptor::new(GRID_LINES.0, LayerClass::Image, "grid"),
            LayerDescriptor::new(BEACON.0, LayerClass::Live, "beacon"),
        ]
    }

    fn render_layer(&self, coord: FragmentCoord, layer: LayerId, time: f32) -> LayerImage {
        let size = BIOME_SIZE as u32;
        let pixels: Vec<u32> = match layer {
            TERRAIN => (0..size * size)
                .map(|i| {
                    let biome = self.biome(
                        coord.x / BIOME_SCALE + (i % size) as i64,
                        coord.y / BIOME_SCALE + (i / size) as i64,
                    );
                    0xFF00_0000 | (biome as u32 * 0x0006_0402)
                })
                .collect(),
            GRID_LINES => (0..size * size)
                .map(|i| {
                    let edge = i % size == 0 || i / size == 0;
                    if edge {
                        0x8000_0000
                    } else {
                        0
                    }
                })
                .collect(),
            _ => {
                let alpha = ((time.sin() * 0.5 + 0.5) * 255.0) as u32;
                return LayerImage::solid(1, 1, (alpha << 24) | 0x00FF_4040);
            }
        };
        LayerImage::from_pixels(size, size, pixels).unwrap_or_else(|e| {
            log::warn!("could not render {} of {}: {}", layer, coord, e);
            LayerImage::solid(1, 1, 0)
        })
    }

    fn objects(&self, coord: FragmentCoord) -> Vec<MapObject> {
        let h = hash2(coord.index_x(), coord.index_y(), self.seed ^ 0xA5A5);
        (0..h % 3)
            .map(|n| {
                let local = hash2(coord.index_x(), coord.index_y(), n);
                MapObject::new(
                    h.wrapping_add(n),
                    "village",
                    (local % FRAGMENT_SIZE as u64) as i32,
                    ((local >> 16) % FRAGMENT_SIZE as u64) as i32,
                )
            })
            .collect()
    }

    fn biomes(&self, coord: FragmentCoord) -> Option<Vec<BiomeId>> {
        let origin_x = coord.x / BIOME_SCALE;
        let origin_y = coord.y / BIOME_SCALE;
        Some(
            (0..BIOME_SIZE * BIOME_SIZE)
                .map(|i| {
                    self.biome(
                        origin_x + (i % BIOME_SIZE) as i64,
                        origin_y + (i / BIOME_SIZE) as i64,
                    )
                })
                .collect(),
        )
    }
}

fn load_config() -> Result<MapConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            MapConfig::load(&path).with_context(|| format!("loading config from {path}"))
        }
        None => Ok(MapProfile::Balanced.resolve()),
    }
}

fn log_frame(
    label: &str,
    map: &Map<PooledFragmentProvider<ProceduralSource>>,
    context: &RenderContext,
) {
    let dims = map.dimensions();
    log::info!(
        "{label}: {}x{} fragments, scale {:.3}, origin ({:.1}, {:.1}), {} images, {} markers, {} culled",
        dims.rows,
        dims.cols,
        map.scale(),
        map.origin().x,
        map.origin().y,
        context.image_count(),
        context.marker_count(),
        context.culled_count()
    );
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let zoom = Arc::new(MapZoom::new(config.zoom.clone()));
    let source = Arc::new(ProceduralSource { seed: 0x00C0_FFEE });
    let provider = PooledFragmentProvider::from_config(source, &config);
    let map = Map::with_config(provider, zoom.clone(), config.clone())?;

    let (width, height) = (1024.0, 768.0);
    let mut context = RenderContext::new(width, height);
    context.clip_to_viewer();
    map.resize_viewport(width, height);
    let mut time = 0.0_f32;
    let frame = |context: &mut RenderContext, time: &mut f32| {
        *time += 1.0 / 60.0;
        context.begin_frame();
        map.draw(context, *time)
    };

    frame(&mut context, &mut time);
    log_frame("initial", &map, &context);

    // drag right and down for two seconds
    for _ in 0..120 {
        map.pan_by(-23.0, -9.5);
        frame(&mut context, &mut time);
    }
    log_frame("after drag", &map, &context);

    // zoom in three notches around the cursor
    let cursor = Point::new(700.0, 300.0);
    zoom.adjust(3);
    while let Some((old, new)) = zoom.update() {
        let offset = map.scaled_offset(old, new, cursor);
        map.pan_by(offset.x, offset.y);
        frame(&mut context, &mut time);
    }
    log_frame("after zoom", &map, &context);

    if let Some(world) = map.screen_to_world(cursor) {
        log::info!(
            "cursor at world ({:.0}, {:.0}), biome {:?}",
            world.x,
            world.y,
            map.biome_at(world)
        );
    }

    let picked = map.object_near(cursor, 200.0);
    log::info!("picked {:?}", picked.as_ref().map(|object| object.id));
    map.set_selected_object(picked);

    map.center_on(-40_000, 12_345);
    frame(&mut context, &mut time);
    log_frame("after recenter", &map, &context);

    map.repaint_layer_in_background(TERRAIN)
        .context("queueing terrain repaint")?;
    frame(&mut context, &mut time);

    let stats = map.with_provider(|provider| provider.stats());
    println!("{}", serde_json::to_string_pretty(&stats)?);

    map.dispose();
    log::info!("disposed, next draw visits {} fragments", frame(&mut context, &mut time));
    Ok(())
}
