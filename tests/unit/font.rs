use super::*;
use crate::error::RenderError;
use crate::render::cpu::CpuContext;
use crate::render::{Affine, RenderContext};
use crate::testing::FakeSource;

const WHITE: u32 = 0xFFFFFF;

fn open(ctx: &mut CpuContext, source: &Rc<FakeSource>) -> Font {
    Font::new(ctx, source.clone(), FontOptions::default()).expect("font opens")
}

fn small_pages() -> FontOptions {
    FontOptions {
        layout: PageLayout {
            width: 32,
            height: 32,
            padding: 1,
        },
        ..FontOptions::default()
    }
}

/// 'A' advances 10, space advances 4, everything else the 8px default.
fn scenario_source() -> Rc<FakeSource> {
    Rc::new(
        FakeSource::outline()
            .with_glyph('A', 10, 10, 10)
            .with_glyph(' ', 0, 0, 4),
    )
}

// ── Construction ─────────────────────────────────────────────────────

#[test]
fn outline_source_opens_outline_font() {
    let mut ctx = CpuContext::new(1, 1);
    let source = Rc::new(FakeSource::outline().with_height(20));
    let mut font = open(&mut ctx, &source);

    assert_eq!(font.kind(), FontKind::Outline);
    assert_eq!(font.height(), 20.0);
    assert_eq!(font.line_height(), 1.0);
    assert_eq!(font.spacing(), 1.0);
    assert_eq!(source.calls(' '), 1);
    assert_eq!(font.atlas().page_count(), 1);
    assert_eq!(font.atlas().format(), PixelFormat::LuminanceAlpha);

    assert_eq!(font.width(&mut ctx, " ").unwrap(), 8);
    assert_eq!(source.calls(' '), 1);
    assert_eq!(font.atlas().glyph_count(), 1);
}

#[test]
fn rgba_source_opens_image_font() {
    let mut ctx = CpuContext::new(1, 1);
    let source = Rc::new(FakeSource::new(PixelFormat::Rgba));
    let font = open(&mut ctx, &source);
    assert_eq!(font.kind(), FontKind::Image);
    assert_eq!(font.atlas().format(), PixelFormat::Rgba);
}

#[test]
fn setters_round_trip() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &Rc::new(FakeSource::outline()));
    font.set_line_height(1.5);
    font.set_spacing(0.75);
    assert_eq!(font.line_height(), 1.5);
    assert_eq!(font.spacing(), 0.75);
}

#[test]
fn font_fails_to_open_without_a_texture() {
    let mut ctx = CpuContext::new(1, 1).with_texture_limit(0);
    let result = Font::new(&mut ctx, Rc::new(FakeSource::outline()), FontOptions::default());
    assert!(matches!(
        result,
        Err(FontError::Render(RenderError::TextureUnavailable(_)))
    ));
}

// ── Measurement ──────────────────────────────────────────────────────

#[test]
fn empty_string_has_zero_width() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    assert_eq!(font.width(&mut ctx, "").unwrap(), 0);
}

#[test]
fn string_width_is_sum_of_char_widths() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    let text = "A Ab é";
    let expected: i32 = text
        .chars()
        .map(|c| font.char_width(&mut ctx, c).unwrap())
        .sum();
    assert_eq!(font.width(&mut ctx, text).unwrap(), expected);
    assert_eq!(expected, 10 + 4 + 10 + 8 + 4 + 8);
}

#[test]
fn spacing_scales_and_truncates_each_advance() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    font.set_spacing(1.25);
    // 10 × 1.25 = 12.5 → 12, 4 × 1.25 = 5.
    assert_eq!(font.char_width(&mut ctx, 'A').unwrap(), 12);
    assert_eq!(font.width(&mut ctx, "A A").unwrap(), 12 + 5 + 12);
}

#[test]
fn measuring_populates_the_atlas() {
    let mut ctx = CpuContext::new(1, 1);
    let source = scenario_source();
    let mut font = open(&mut ctx, &source);
    assert_eq!(font.atlas().glyph_count(), 1);

    font.width(&mut ctx, "xyz").unwrap();
    assert_eq!(font.atlas().glyph_count(), 4);
    font.width(&mut ctx, "zyx").unwrap();
    assert_eq!(source.calls('x'), 1);
}

#[test]
fn invalid_utf8_width_is_an_encoding_error() {
    let mut ctx = CpuContext::new(1, 1);
    let source = scenario_source();
    let mut font = open(&mut ctx, &source);
    let err = font.width(&mut ctx, b"AA\xC3").unwrap_err();
    assert!(matches!(err, FontError::Encoding { offset: 2 }));
    assert_eq!(source.calls('A'), 0);
}

// ── Wrapping ─────────────────────────────────────────────────────────

#[test]
fn wraps_two_long_words_onto_separate_lines() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    let wrapped = font
        .wrap(&mut ctx, "AAAAAAAAAA AAAAAAAAAA", 50.0)
        .unwrap();
    assert_eq!(wrapped.lines, vec!["AAAAAAAAAA", "AAAAAAAAAA"]);
    assert_eq!(wrapped.max_width, 100);
}

#[test]
fn greedy_fill_keeps_words_that_stay_under_the_limit() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    // "AA AA" = 44, adding " AA" reaches 68.
    let wrapped = font.wrap(&mut ctx, "AA AA AA", 50.0).unwrap();
    assert_eq!(wrapped.lines, vec!["AA AA", "AA"]);
    assert_eq!(wrapped.max_width, 44);
}

#[test]
fn reaching_the_limit_exactly_breaks_the_line() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    let wrapped = font.wrap(&mut ctx, "AA AA", 44.0).unwrap();
    assert_eq!(wrapped.lines, vec!["AA", "AA"]);
    let wrapped = font.wrap(&mut ctx, "AA AA", 44.5).unwrap();
    assert_eq!(wrapped.lines, vec!["AA AA"]);
}

#[test]
fn wide_wrap_needs_room_beyond_the_natural_width() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &Rc::new(FakeSource::outline()));
    let text = "one two";
    let natural = font.width(&mut ctx, text).unwrap();
    let at_width = font.wrap(&mut ctx, text, natural as f32).unwrap();
    assert_eq!(at_width.lines, vec!["one", "two"]);
    let past_width = font.wrap(&mut ctx, text, natural as f32 + 1.0).unwrap();
    assert_eq!(past_width.lines, vec![text]);
    assert_eq!(past_width.max_width, natural);
}

#[test]
fn wrap_gap_uses_the_unscaled_space_advance() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    font.set_spacing(2.0);
    // Words scale to 20 each, the joining space stays 4.
    assert_eq!(font.width(&mut ctx, "A A").unwrap(), 48);
    let wrapped = font.wrap(&mut ctx, "A A", 46.0).unwrap();
    assert_eq!(wrapped.lines, vec!["A A"]);
    assert_eq!(wrapped.max_width, 44);
    let wrapped = font.wrap(&mut ctx, "A A", 44.0).unwrap();
    assert_eq!(wrapped.lines, vec!["A", "A"]);
}

#[test]
fn overlong_word_sits_alone_and_whole() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &Rc::new(FakeSource::outline()));
    let wrapped = font
        .wrap(&mut ctx, "hi supercalifragilistic yo", 40.0)
        .unwrap();
    assert_eq!(wrapped.lines, vec!["hi", "supercalifragilistic", "yo"]);
    assert_eq!(wrapped.max_width, 160);
}

#[test]
fn newline_segments_wrap_independently() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    let wrapped = font.wrap(&mut ctx, "AA\n\nAA AA AA\n", 50.0).unwrap();
    assert_eq!(wrapped.lines, vec!["AA", "", "AA AA", "AA"]);
}

#[test]
fn empty_text_produces_no_lines() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    let wrapped = font.wrap(&mut ctx, "", 50.0).unwrap();
    assert!(wrapped.lines.is_empty());
    assert_eq!(wrapped.max_width, 0);
}

#[test]
fn whitespace_collapses_and_is_trimmed() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    let wrapped = font.wrap(&mut ctx, "  A \t  A  ", 1000.0).unwrap();
    assert_eq!(wrapped.lines, vec!["A A"]);
    assert_eq!(wrapped.max_width, 24);
}

#[test]
fn wide_wrap_gives_one_line_per_segment() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &Rc::new(FakeSource::outline()));
    let text = "the quick brown\nfox jumps\nover the lazy dog";
    let wrapped = font.wrap(&mut ctx, text, 10_000.0).unwrap();
    assert_eq!(wrapped.lines, text.split('\n').collect::<Vec<_>>());
    assert_eq!(wrapped.max_width, font.width(&mut ctx, "over the lazy dog").unwrap());
}

#[test]
fn rejoining_wrapped_lines_restores_each_segment() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    let text = "the quick  brown\tfox AAAA\njumps over\n  the lazy dog AAAAAAAAAAAA ";
    for wrap_width in [1.0, 30.0, 50.0, 75.0, 120.0, 500.0] {
        let whole = font.wrap(&mut ctx, text, wrap_width).unwrap();
        let mut from_segments = Vec::new();
        for segment in text.split_terminator('\n') {
            let normalized = segment.split_ascii_whitespace().collect::<Vec<_>>().join(" ");
            let wrapped = font.wrap(&mut ctx, segment, wrap_width).unwrap();
            assert_eq!(wrapped.lines.join(" ").trim(), normalized, "wrap width {wrap_width}");
            from_segments.extend(wrapped.lines);
        }
        assert_eq!(whole.lines, from_segments, "wrap width {wrap_width}");
    }
}

#[test]
fn invalid_utf8_wrap_is_an_encoding_error() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    let err = font.wrap(&mut ctx, b"AA \xFF", 50.0).unwrap_err();
    assert!(matches!(err, FontError::Encoding { offset: 3 }));
}

// ── Printing ─────────────────────────────────────────────────────────
//
// Default fake glyphs are 8×10 solid white with bearing_y = 10. With a
// 16px outline font the ascent correction is round(16 / 1.25) = 13, so a
// glyph printed at pen y = 0 covers rows 3..13.

#[test]
fn print_draws_glyph_below_the_ascent_line() {
    let mut ctx = CpuContext::new(32, 32);
    let mut font = open(&mut ctx, &Rc::new(FakeSource::outline()));
    font.print(&mut ctx, "A", &PrintParams::at(0.0, 0.0)).unwrap();

    assert_eq!(ctx.pixel(0, 3), WHITE);
    assert_eq!(ctx.pixel(7, 12), WHITE);
    assert_eq!(ctx.pixel(0, 2), 0);
    assert_eq!(ctx.pixel(0, 13), 0);
    assert_eq!(ctx.pixel(8, 5), 0);
}

#[test]
fn image_fonts_skip_the_ascent_correction() {
    let mut ctx = CpuContext::new(32, 32);
    let mut font = open(&mut ctx, &Rc::new(FakeSource::new(PixelFormat::Rgba)));
    font.print(&mut ctx, "A", &PrintParams::at(0.0, 0.0)).unwrap();
    assert_eq!(ctx.pixel(0, 0), WHITE);
    assert_eq!(ctx.pixel(0, 9), WHITE);
    assert_eq!(ctx.pixel(0, 10), 0);
}

#[test]
fn print_position_is_rounded_up() {
    let mut ctx = CpuContext::new(32, 32);
    let mut font = open(&mut ctx, &Rc::new(FakeSource::outline()));
    font.print(&mut ctx, "A", &PrintParams::at(10.3, 0.0)).unwrap();
    assert_eq!(ctx.pixel(10, 5), 0);
    assert_eq!(ctx.pixel(11, 5), WHITE);
    assert_eq!(ctx.pixel(18, 5), WHITE);
    assert_eq!(ctx.pixel(19, 5), 0);
}

#[test]
fn print_applies_scale() {
    let mut ctx = CpuContext::new(32, 32);
    let mut font = open(&mut ctx, &Rc::new(FakeSource::outline()));
    font.print(&mut ctx, "A", &PrintParams::at(0.0, 0.0).scaled(2.0, 1.0))
        .unwrap();
    assert_eq!(ctx.pixel(14, 5), WHITE);
    assert_eq!(ctx.pixel(16, 5), 0);
}

#[test]
fn newline_resets_x_and_moves_down_by_ceiled_line_height() {
    let mut ctx = CpuContext::new(64, 64);
    let mut font = open(&mut ctx, &Rc::new(FakeSource::outline()));
    font.set_line_height(1.1);
    // ceil(16 × 1.1) = 18, so the second line covers rows 21..31.
    font.print(&mut ctx, "AA\nA", &PrintParams::at(0.0, 0.0)).unwrap();

    assert_eq!(ctx.pixel(0, 21), WHITE);
    assert_eq!(ctx.pixel(0, 30), WHITE);
    assert_eq!(ctx.pixel(0, 20), 0);
    assert_eq!(ctx.pixel(0, 31), 0);
    assert_eq!(ctx.pixel(8, 25), 0);
    assert_eq!(ctx.quads_drawn(), 3);
}

#[test]
fn spacing_changes_width_but_not_print_advance() {
    let mut ctx = CpuContext::new(64, 32);
    let mut font = open(&mut ctx, &Rc::new(FakeSource::outline().with_default(4, 10, 8)));
    font.set_spacing(2.0);

    assert_eq!(font.width(&mut ctx, "AB").unwrap(), 32);
    font.print(&mut ctx, "AB", &PrintParams::at(0.0, 0.0)).unwrap();
    // 'B' starts at the raw advance of 8, not the measured 16.
    assert_eq!(ctx.pixel(8, 5), WHITE);
    assert_eq!(ctx.pixel(16, 5), 0);
}

#[test]
fn print_restores_the_transform() {
    let mut ctx = CpuContext::new(16, 16);
    let mut font = open(&mut ctx, &Rc::new(FakeSource::outline()));
    ctx.push_transform(Affine::translate((2.0, 2.0)));
    let before = ctx.transform();

    font.print(&mut ctx, "hi\nthere", &PrintParams::at(3.0, 4.0).rotated(0.5))
        .unwrap();
    assert_eq!(ctx.transform(), before);
    assert_eq!(ctx.transform_depth(), 1);
}

#[test]
fn malformed_print_draws_nothing_and_restores_the_transform() {
    let mut ctx = CpuContext::new(16, 16);
    let source = Rc::new(FakeSource::outline());
    let mut font = open(&mut ctx, &source);
    let before = ctx.transform();

    let err = font
        .print(&mut ctx, b"ok\x80ok", &PrintParams::at(1.0, 1.0).scaled(3.0, 3.0))
        .unwrap_err();
    assert!(matches!(err, FontError::Encoding { offset: 2 }));
    assert_eq!(ctx.transform(), before);
    assert_eq!(ctx.transform_depth(), 0);
    assert_eq!(ctx.quads_drawn(), 0);
    assert_eq!(source.total_calls(), 1);
}

#[test]
fn exhaustion_mid_print_fails_and_restores_the_transform() {
    let mut ctx = CpuContext::new(64, 64).with_texture_limit(1);
    let source = Rc::new(FakeSource::outline().with_default(14, 14, 14));
    let mut font = Font::new(&mut ctx, source.clone(), small_pages()).unwrap();

    let err = font
        .print(&mut ctx, "abcde", &PrintParams::at(0.0, 0.0))
        .unwrap_err();
    assert!(matches!(
        err,
        FontError::Render(RenderError::TextureUnavailable(_))
    ));
    assert_eq!(ctx.transform_depth(), 0);
    assert_eq!(font.atlas().glyph_count(), 4);
}

#[test]
fn print_char_places_glyph_without_ascent_correction() {
    let mut ctx = CpuContext::new(32, 32);
    let mut font = open(&mut ctx, &Rc::new(FakeSource::outline()));
    // Baseline at round(2 + 16) = 18; the 10px glyph spans rows 8..18.
    font.print_char(&mut ctx, 'A', 5.0, 2.0).unwrap();
    assert_eq!(ctx.pixel(5, 8), WHITE);
    assert_eq!(ctx.pixel(12, 17), WHITE);
    assert_eq!(ctx.pixel(5, 7), 0);
    assert_eq!(ctx.pixel(4, 10), 0);
    assert_eq!(ctx.transform_depth(), 0);
}

// ── Volatile resources ───────────────────────────────────────────────

#[test]
fn release_then_recreate_rebuilds_glyphs_lazily() {
    let mut ctx = CpuContext::new(32, 32);
    let source = Rc::new(FakeSource::outline());
    let mut font = open(&mut ctx, &source);
    let before = font.glyph(&mut ctx, 'A').unwrap();

    font.release_resources(&mut ctx);
    assert_eq!(ctx.texture_count(), 0);
    assert_eq!(font.atlas().glyph_count(), 0);
    assert_eq!(font.atlas().page_count(), 0);

    font.recreate_resources(&mut ctx).unwrap();
    assert_eq!(ctx.texture_count(), 1);
    assert_eq!(source.calls('A'), 1);

    let after = font.glyph(&mut ctx, 'A').unwrap();
    assert_eq!(source.calls('A'), 2);
    assert_eq!(
        (after.rect().w, after.rect().h),
        (before.rect().w, before.rect().h)
    );
    assert_eq!(after.advance(), before.advance());
    assert_eq!(after.bearing(), before.bearing());
    assert_ne!(after.page().id, before.page().id);

    font.print(&mut ctx, "A", &PrintParams::at(0.0, 0.0)).unwrap();
    assert_eq!(ctx.pixel(0, 3), WHITE);
}

#[test]
fn repeated_recreate_keeps_a_single_page() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    font.release_resources(&mut ctx);
    font.recreate_resources(&mut ctx).unwrap();
    font.recreate_resources(&mut ctx).unwrap();
    assert_eq!(font.atlas().page_count(), 1);
    assert_eq!(ctx.texture_count(), 1);

    font.recreate_resources(&mut ctx).unwrap();
    font.width(&mut ctx, "AAA").unwrap();
    assert_eq!(font.atlas().page_count(), 1);
    assert_eq!(ctx.texture_count(), 1);
}

#[test]
fn font_settings_survive_resource_loss() {
    let mut ctx = CpuContext::new(1, 1);
    let mut font = open(&mut ctx, &scenario_source());
    font.set_spacing(2.0);
    font.release_resources(&mut ctx);
    font.recreate_resources(&mut ctx).unwrap();
    assert_eq!(font.spacing(), 2.0);
    assert_eq!(font.kind(), FontKind::Outline);
    assert_eq!(font.width(&mut ctx, "A").unwrap(), 20);
}
