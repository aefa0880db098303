use asset_pack_core::prelude::*;
use image::RgbaImage;

fn sprite(id: &str, w: u32, h: u32) -> Sprite {
    Sprite::new(id, RgbaImage::new(w, h)).expect("sprite")
}

#[test]
fn test_pack_stats_basic() {
    let cfg = PackerConfig::builder().margin(0).max_dimension(256).build();

    // 4 tiles of 64x64 with no margin leave no gaps
    let sprites: Vec<Sprite> = (0..4).map(|i| sprite(&format!("tex_{}", i), 64, 64)).collect();
    let out = build_atlas(sprites, &cfg).expect("packing should succeed");
    let stats = out.stats;

    assert_eq!(stats.num_sprites, 4);
    assert_eq!(stats.num_joins, 0);
    assert_eq!(stats.used_area, 4 * 64 * 64);
    assert_eq!((stats.canvas_width, stats.canvas_height), (out.width, out.height));
    assert_eq!(stats.canvas_area, 128 * 128);
    assert!((stats.occupancy - 1.0).abs() < f64::EPSILON);
    assert_eq!(stats.wasted_area(), 0);
}

#[test]
fn test_pack_stats_margin_counts_as_waste() {
    let cfg = PackerConfig::builder().margin(4).max_dimension(512).build();
    let out = build_atlas(vec![sprite("a", 32, 32), sprite("b", 16, 48)], &cfg)
        .expect("packing should succeed");
    let stats = out.stats;

    assert_eq!(stats.used_area, 32 * 32 + 16 * 48);
    assert!(stats.occupancy > 0.0 && stats.occupancy < 1.0, "Occupancy: {}", stats.occupancy);
    assert_eq!(stats.wasted_area() + stats.used_area, stats.canvas_area);
}

#[test]
fn test_pack_stats_counts_joins() {
    let cfg = PackerConfig::default();
    let parent = sprite("sheet", 64, 32)
        .with_join(Join::new("left", 0, 0, 32, 32))
        .and_then(|s| s.with_join(Join::new("right", 32, 0, 32, 32)))
        .expect("joins");
    let out = build_atlas(vec![parent], &cfg).expect("packing should succeed");

    assert_eq!(out.stats.num_sprites, 1);
    assert_eq!(out.stats.num_joins, 2);
    // joins do not add to the used area
    assert_eq!(out.stats.used_area, 64 * 32);
    assert_eq!(out.manifest.len(), 3);
}

#[test]
fn test_pack_stats_summary() {
    let out = build_atlas(vec![sprite("test", 32, 32)], &PackerConfig::default())
        .expect("packing should succeed");
    let summary = out.stats.summary();

    assert!(summary.contains("Canvas: 40x40"), "{}", summary);
    assert!(summary.contains("Sprites: 1"));
    assert!(summary.contains("Occupancy:"));
}

#[test]
fn test_pack_stats_empty() {
    let stats = PackStats::from_sprites(&[], 0, 0, 0);

    assert_eq!(stats.num_sprites, 0);
    assert_eq!(stats.canvas_area, 0);
    assert_eq!(stats.used_area, 0);
    assert_eq!(stats.occupancy, 0.0);
    assert_eq!(stats.wasted_area(), 0);
}
