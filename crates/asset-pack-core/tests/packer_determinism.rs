use asset_pack_core::prelude::*;
use image::RgbaImage;
use rand::{Rng, SeedableRng};

fn cfg() -> PackerConfig {
    PackerConfig::builder().margin(4).max_dimension(4096).build()
}

fn random_sprites(seed: u64, count: usize) -> Vec<Sprite> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(4..=64);
            let h = rng.gen_range(4..=64);
            Sprite::new(format!("r{}", i), RgbaImage::new(w, h)).expect("sprite")
        })
        .collect()
}

#[test]
fn repeatable_layout() {
    let base = random_sprites(42, 120);

    let mut first = base.clone();
    let size1 = pack_sprites(&mut first, &cfg()).expect("pack");
    let mut second = base.clone();
    let size2 = pack_sprites(&mut second, &cfg()).expect("pack");

    assert_eq!(size1, size2);
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.origin, b.origin);
    }
}

#[test]
fn equal_sizes_keep_input_order() {
    // identical squares: the first input takes the corner
    let mut sprites: Vec<Sprite> = (0..5)
        .map(|i| Sprite::new(format!("sq{}", i), RgbaImage::new(10, 10)).expect("sprite"))
        .collect();
    let cfg = PackerConfig::builder().margin(0).max_dimension(128).build();
    pack_sprites(&mut sprites, &cfg).expect("pack");
    assert_eq!(sprites[0].origin, Some((0, 0)));
    assert_eq!(sprites[1].origin, Some((10, 0)));
}

#[test]
fn largest_side_is_attempted_first() {
    // "wide" has the longest side even though "small" comes first in the input
    let mut sprites = vec![
        Sprite::new("small", RgbaImage::new(8, 8)).expect("sprite"),
        Sprite::new("wide", RgbaImage::new(100, 4)).expect("sprite"),
        Sprite::new("tall", RgbaImage::new(4, 60)).expect("sprite"),
    ];
    let cfg = PackerConfig::builder().margin(0).max_dimension(256).build();
    pack_sprites(&mut sprites, &cfg).expect("pack");
    assert_eq!(sprites[1].origin, Some((0, 0)));
}

#[test]
fn layout_api_matches_sprite_api() {
    let sizes = vec![("a", 40, 20), ("b", 16, 32), ("c", 10, 10), ("d", 8, 48)];
    let cfg = PackerConfig::builder().margin(2).max_dimension(256).build();

    let (lw, lh, frames) = pack_layout(sizes.clone(), &cfg).expect("layout");

    let mut sprites: Vec<Sprite> = sizes
        .iter()
        .map(|(k, w, h)| Sprite::new(*k, RgbaImage::new(*w, *h)).expect("sprite"))
        .collect();
    let (sw, sh) = pack_sprites(&mut sprites, &cfg).expect("pack");

    assert_eq!((lw, lh), (sw, sh));
    assert_eq!(frames.len(), sprites.len());
    for ((key, rect), s) in frames.iter().zip(sprites.iter()) {
        assert_eq!(key, &s.id);
        assert_eq!(Some(*rect), s.frame(), "frame mismatch for key={}", key);
    }
}
