use asset_pack_core::compositing::blit_rgba;
use asset_pack_core::prelude::*;
use image::{GenericImageView, Rgba, RgbaImage};
use rand::{Rng, SeedableRng};

/// Sprite filled with seeded noise, alpha included.
fn noisy(id: &str, w: u32, h: u32, seed: u64) -> Sprite {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let img = RgbaImage::from_fn(w, h, |_, _| Rgba([rng.r#gen(), rng.r#gen(), rng.r#gen(), rng.r#gen()]));
    Sprite::new(id, img).expect("sprite")
}

fn inputs() -> Vec<Sprite> {
    vec![
        noisy("hero", 48, 64, 1),
        noisy("tile", 32, 32, 2),
        noisy("bar", 100, 6, 3),
        noisy("dot", 1, 1, 4),
        noisy("column", 5, 70, 5),
    ]
}

#[test]
fn every_region_reads_back_its_source_pixels() {
    let cfg = PackerConfig::builder().margin(3).max_dimension(512).build();
    let originals = inputs();
    let out = build_atlas(originals.clone(), &cfg).expect("atlas");
    assert_eq!(out.canvas.dimensions(), (out.width, out.height));

    for s in &originals {
        let e = out.manifest.get(&s.id).expect("entry");
        let region = out.canvas.view(e.x, e.y, e.w, e.h).to_image();
        assert_eq!(region.dimensions(), s.pixels().dimensions());
        assert!(region == *s.pixels(), "pixels differ for {}", s.id);
    }
}

#[test]
fn uncovered_pixels_stay_transparent() {
    let cfg = PackerConfig::builder().margin(2).max_dimension(512).build();
    let out = build_atlas(inputs(), &cfg).expect("atlas");
    let regions: Vec<Rect> = out.manifest.iter().map(|(_, e)| e.rect()).collect();
    for (x, y, px) in out.canvas.enumerate_pixels() {
        let covered = regions.iter().any(|r| r.contains(&Rect::new(x, y, 1, 1)));
        if !covered {
            assert_eq!(*px, Rgba([0, 0, 0, 0]), "background at {},{}", x, y);
        }
    }
}

#[test]
fn join_region_is_a_crop_of_its_parent() {
    let cfg = PackerConfig::default();
    let parent = noisy("sheet", 40, 20, 9)
        .with_join(Join::new("right_half", 20, 0, 20, 20))
        .expect("join");
    let expected = parent.pixels().view(20, 0, 20, 20).to_image();
    let out = build_atlas(vec![parent, noisy("other", 30, 30, 10)], &cfg).expect("atlas");

    let e = out.manifest.get("right_half").expect("join entry");
    assert!(out.canvas.view(e.x, e.y, e.w, e.h).to_image() == expected);
}

#[test]
fn blit_copies_alpha_verbatim() {
    let src = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 7]));
    let mut canvas = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
    blit_rgba(&src, &mut canvas, 1, 1);
    assert_eq!(*canvas.get_pixel(1, 1), Rgba([10, 20, 30, 7]));
    assert_eq!(*canvas.get_pixel(2, 2), Rgba([10, 20, 30, 7]));
    assert_eq!(*canvas.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    assert_eq!(*canvas.get_pixel(3, 3), Rgba([255, 255, 255, 255]));
}

#[test]
fn blit_clips_at_canvas_edge() {
    let src = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 4]));
    let mut canvas = RgbaImage::new(5, 5);
    blit_rgba(&src, &mut canvas, 3, 3);
    assert_eq!(*canvas.get_pixel(4, 4), Rgba([1, 2, 3, 4]));
    assert_eq!(*canvas.get_pixel(2, 2), Rgba([0, 0, 0, 0]));
}

#[test]
fn compose_rejects_unplaced_or_out_of_bounds() {
    let mut s = noisy("s", 8, 8, 11);
    assert!(compose(16, 16, std::slice::from_ref(&s), false).is_err());
    s.origin = Some((10, 10));
    assert!(compose(16, 16, std::slice::from_ref(&s), false).is_err());
    s.origin = Some((8, 8));
    assert!(compose(16, 16, std::slice::from_ref(&s), false).is_ok());
}

#[test]
fn adjacent_sprites_keep_their_own_frames() {
    let red = Sprite::new("red", RgbaImage::from_pixel(5, 5, Rgba([255, 0, 0, 255]))).expect("red");
    let green =
        Sprite::new("green", RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255]))).expect("green");
    let blue = Sprite::new("blue", RgbaImage::from_pixel(3, 6, Rgba([0, 0, 255, 255]))).expect("blue");
    let cfg = PackerConfig::builder().margin(0).max_dimension(64).build();
    let out = build_atlas(vec![red, green, blue], &cfg).expect("atlas");

    for (id, color) in [
        ("red", Rgba([255, 0, 0, 255])),
        ("green", Rgba([0, 255, 0, 255])),
        ("blue", Rgba([0, 0, 255, 255])),
    ] {
        let e = out.manifest.get(id).expect("entry");
        for y in e.y..e.y + e.h {
            for x in e.x..e.x + e.w {
                assert_eq!(*out.canvas.get_pixel(x, y), color, "{} at {},{}", id, x, y);
            }
        }
    }
}

#[test]
fn sprite_size_follows_its_pixel_buffer() {
    let s = noisy("s", 7, 3, 12);
    assert_eq!((s.width(), s.height()), s.pixels().dimensions());
    let mut placed = s.clone();
    placed.origin = Some((2, 1));
    assert_eq!(placed.frame(), Some(Rect::new(2, 1, 7, 3)));
}

#[test]
fn compose_is_order_independent() {
    let cfg = PackerConfig::builder().margin(1).max_dimension(256).build();
    let mut sprites = inputs();
    let (w, h) = pack_sprites(&mut sprites, &cfg).expect("pack");
    let forward = compose(w, h, &sprites, false).expect("compose");
    sprites.reverse();
    let backward = compose(w, h, &sprites, false).expect("compose");
    assert!(forward == backward);
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_compose_matches_sequential() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(77);
    let mut sprites: Vec<Sprite> = (0..60)
        .map(|i| {
            let w = rng.gen_range(1..=40);
            let h = rng.gen_range(1..=40);
            noisy(&format!("n{}", i), w, h, i)
        })
        .collect();
    let cfg = PackerConfig::builder().margin(2).max_dimension(1024).build();
    let (w, h) = pack_sprites(&mut sprites, &cfg).expect("pack");
    let seq = compose(w, h, &sprites, false).expect("sequential");
    let par = compose(w, h, &sprites, true).expect("parallel");
    assert!(seq == par);
}
