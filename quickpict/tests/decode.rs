//! End-to-end decodes of hand-assembled picture streams.

use quickpict::{Color, DecodeError, DrawCommand, Framing, Rect, Verb, decode};

/// Assemble a version 1 picture with a 200x200 frame around the given
/// opcode bytes.
fn v1_picture(ops: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&0u16.to_be_bytes());
    for coord in [0i16, 0, 200, 200] {
        data.extend_from_slice(&coord.to_be_bytes());
    }
    data.extend_from_slice(&[0x11, 0x01]);
    data.extend_from_slice(ops);
    data.push(0xff);
    data
}

/// Assemble a version 2 picture with a 200x200 frame around the given
/// opcode bytes. Opcodes must be supplied pre-padded to even sizes.
fn v2_picture(ops: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&0u16.to_be_bytes());
    for coord in [0i16, 0, 200, 200] {
        data.extend_from_slice(&coord.to_be_bytes());
    }
    // Version and header opcodes, headerOp variant -1.
    data.extend_from_slice(&[0x00, 0x11, 0x02, 0xff, 0x0c, 0x00]);
    data.extend_from_slice(&(-1i16).to_be_bytes());
    data.extend_from_slice(&0i16.to_be_bytes());
    data.extend_from_slice(&[0; 20]);
    data.extend_from_slice(ops);
    data.extend_from_slice(&[0x00, 0xff]);
    data
}

fn rect_operand(left: i16, top: i16, right: i16, bottom: i16) -> Vec<u8> {
    let mut v = Vec::new();
    for coord in [top, left, bottom, right] {
        v.extend_from_slice(&coord.to_be_bytes());
    }
    v
}

#[test]
fn empty_picture_decodes_to_no_commands() {
    let picture = decode(&v1_picture(&[]));
    assert_eq!(picture.error, None);
    assert_eq!(picture.commands.len(), 0);
    assert_eq!(picture.framing, Framing::Legacy);
    assert_eq!(picture.frame, Rect::new(0, 0, 200, 200));
}

#[test]
fn paint_rect_in_foreground_color() {
    let mut ops = Vec::new();
    // RGBFgCol: pure red.
    ops.push(0x1a);
    ops.extend_from_slice(&[0xff, 0xff, 0x00, 0x00, 0x00, 0x00]);
    // paintRect.
    ops.push(0x31);
    ops.extend_from_slice(&rect_operand(0, 0, 10, 10));

    let picture = decode(&v1_picture(&ops));
    assert_eq!(picture.error, None);
    assert_eq!(picture.commands.len(), 1);
    match &picture.commands[0] {
        DrawCommand::Rect { bounds, verb, style } => {
            assert_eq!(*bounds, Rect::new(0, 0, 10, 10));
            assert_eq!(*verb, Verb::Paint);
            assert_eq!(style.color, Color::new(0xff, 0, 0));
        }
        other => panic!("expected a rect, got {other:?}"),
    }
}

#[test]
fn inverted_rect_aborts_but_keeps_prior_commands() {
    let mut ops = Vec::new();
    ops.push(0x31);
    ops.extend_from_slice(&rect_operand(0, 0, 10, 10));
    ops.push(0x31);
    ops.extend_from_slice(&rect_operand(10, 10, 0, 0));

    let picture = decode(&v1_picture(&ops));
    assert_eq!(picture.error, Some(DecodeError::MalformedGeometry));
    assert_eq!(picture.commands.len(), 1);
}

#[test]
fn empty_pen_suppresses_framed_shapes() {
    let mut ops = Vec::new();
    // pnSize 0x0.
    ops.push(0x07);
    ops.extend_from_slice(&[0, 0, 0, 0]);
    // frameRect: operands still consumed.
    ops.push(0x30);
    ops.extend_from_slice(&rect_operand(0, 0, 10, 10));
    // paintRect still draws.
    ops.push(0x31);
    ops.extend_from_slice(&rect_operand(0, 0, 10, 10));

    let picture = decode(&v1_picture(&ops));
    assert_eq!(picture.error, None);
    assert_eq!(picture.commands.len(), 1);
    assert!(matches!(picture.commands[0], DrawCommand::Rect { verb: Verb::Paint, .. }));
}

#[test]
fn pen_mode_23_disables_all_drawing() {
    let mut ops = Vec::new();
    ops.push(0x08);
    ops.extend_from_slice(&23u16.to_be_bytes());
    ops.push(0x31);
    ops.extend_from_slice(&rect_operand(0, 0, 10, 10));
    ops.push(0x28);
    ops.extend_from_slice(&[0, 5, 0, 5]);
    ops.extend_from_slice(&[2, b'h', b'i']);

    let picture = decode(&v1_picture(&ops));
    assert_eq!(picture.error, None);
    assert_eq!(picture.commands.len(), 0);
}

#[test]
fn same_shape_opcodes_reuse_last_bounds() {
    let mut ops = Vec::new();
    // frameRect records the bounds.
    ops.push(0x30);
    ops.extend_from_slice(&rect_operand(5, 5, 20, 20));
    // paintSameRect has no operands.
    ops.push(0x39);

    let picture = decode(&v1_picture(&ops));
    assert_eq!(picture.error, None);
    assert_eq!(picture.commands.len(), 2);
    for (command, expected) in picture.commands.iter().zip([Verb::Frame, Verb::Paint]) {
        match command {
            DrawCommand::Rect { bounds, verb, .. } => {
                assert_eq!(*bounds, Rect::new(5, 5, 20, 20));
                assert_eq!(*verb, expected);
            }
            other => panic!("expected a rect, got {other:?}"),
        }
    }
}

#[test]
fn line_opcodes_chain_the_pen_position() {
    let mut ops = Vec::new();
    // line (10, 10) to (20, 10).
    ops.push(0x20);
    ops.extend_from_slice(&[0, 10, 0, 10, 0, 10, 0, 20]);
    // lineFrom to (20, 30).
    ops.push(0x21);
    ops.extend_from_slice(&[0, 30, 0, 20]);
    // shortLineFrom by (-5, 1).
    ops.push(0x23);
    ops.extend_from_slice(&[0xfb, 0x01]);

    let picture = decode(&v1_picture(&ops));
    assert_eq!(picture.error, None);

    let segments: Vec<_> = picture
        .commands
        .iter()
        .map(|c| match c {
            DrawCommand::Line { from, to, .. } => ((from.x, from.y), (to.x, to.y)),
            other => panic!("expected a line, got {other:?}"),
        })
        .collect();
    assert_eq!(
        segments,
        [
            ((10, 10), (20, 10)),
            ((20, 10), (20, 30)),
            ((20, 30), (15, 31)),
        ]
    );
}

#[test]
fn text_runs_accumulate_offsets() {
    let mut ops = Vec::new();
    // longText at (40, 12).
    ops.push(0x28);
    ops.extend_from_slice(&[0, 12, 0, 40]);
    ops.extend_from_slice(&[5, b'h', b'e', b'l', b'l', b'o']);
    // DHText moves right by 30.
    ops.push(0x29);
    ops.push(30);
    ops.extend_from_slice(&[5, b'w', b'o', b'r', b'l', b'd']);

    let picture = decode(&v1_picture(&ops));
    assert_eq!(picture.error, None);
    assert_eq!(picture.commands.len(), 2);
    match (&picture.commands[0], &picture.commands[1]) {
        (
            DrawCommand::Text { position: p0, text: t0, .. },
            DrawCommand::Text { position: p1, text: t1, .. },
        ) => {
            assert_eq!((p0.x, p0.y), (40, 12));
            assert_eq!(t0, "hello");
            assert_eq!((p1.x, p1.y), (70, 12));
            assert_eq!(t1, "world");
        }
        other => panic!("expected two text runs, got {other:?}"),
    }
}

#[test]
fn font_names_keep_bytes_that_text_runs_strip() {
    let mut ops = Vec::new();
    // fontName record whose name ends in a control byte.
    ops.push(0x2c);
    ops.extend_from_slice(&10u16.to_be_bytes());
    ops.extend_from_slice(&3u16.to_be_bytes());
    ops.extend_from_slice(&[7, b'G', b'e', b'n', b'e', b'v', b'a', 0x01]);
    // longText padded with the same control byte.
    ops.push(0x28);
    ops.extend_from_slice(&[0, 10, 0, 10]);
    ops.extend_from_slice(&[3, b'h', b'i', 0x01]);

    let picture = decode(&v1_picture(&ops));
    assert_eq!(picture.error, None);
    assert_eq!(picture.commands.len(), 1);
    match &picture.commands[0] {
        DrawCommand::Text { text, font, .. } => {
            assert_eq!(text, "hi");
            assert_eq!(font.name.as_deref(), Some("Geneva\u{1}"));
            assert_eq!(font.id, 3);
        }
        other => panic!("expected a text run, got {other:?}"),
    }
}

#[test]
fn v2_odd_sized_opcode_stays_word_aligned() {
    let mut ops = Vec::new();
    // LongComment with a 1-byte payload, padded to even length.
    ops.extend_from_slice(&[0x00, 0xa1]);
    ops.extend_from_slice(&100u16.to_be_bytes());
    ops.extend_from_slice(&1u16.to_be_bytes());
    ops.push(0xee);
    ops.push(0x00); // alignment pad
    // paintRect must still decode after the comment.
    ops.extend_from_slice(&[0x00, 0x31]);
    ops.extend_from_slice(&rect_operand(1, 2, 3, 4));

    let picture = decode(&v2_picture(&ops));
    assert_eq!(picture.error, None);
    assert_eq!(picture.framing, Framing::Extended);
    assert_eq!(picture.commands.len(), 1);
    assert!(matches!(
        picture.commands[0],
        DrawCommand::Rect { bounds: Rect { left: 1, top: 2, right: 3, bottom: 4 }, .. }
    ));
}

#[test]
fn bitmap_blit_is_decoded() {
    let mut ops = Vec::new();
    // bitsRect with a 1-bit, 8x2 bitmap.
    ops.push(0x90);
    ops.extend_from_slice(&1u16.to_be_bytes()); // row bytes, top bit clear
    ops.extend_from_slice(&rect_operand(0, 0, 8, 2)); // bounds (top,left,bottom,right order)
    ops.extend_from_slice(&[0, 0, 0, 0, 0, 2, 0, 8]); // src rect
    ops.extend_from_slice(&[0, 20, 0, 20, 0, 22, 0, 28]); // dst rect
    ops.extend_from_slice(&0u16.to_be_bytes()); // mode
    ops.push(0xf0);
    ops.push(0x0f);

    let picture = decode(&v1_picture(&ops));
    assert_eq!(picture.error, None);
    assert_eq!(picture.commands.len(), 1);
    match &picture.commands[0] {
        DrawCommand::Bitmap { image, src, dst } => {
            assert_eq!((image.width, image.height), (8, 2));
            assert_eq!(image.pixel(0, 0), Color::BLACK);
            assert_eq!(image.pixel(7, 0), Color::WHITE);
            assert_eq!(image.pixel(0, 1), Color::WHITE);
            assert_eq!(image.pixel(7, 1), Color::BLACK);
            assert_eq!(*src, Rect::new(0, 0, 8, 2));
            assert_eq!(*dst, Rect::new(20, 20, 28, 22));
        }
        other => panic!("expected a bitmap, got {other:?}"),
    }
}

#[test]
fn blit_with_absurd_bounds_fails_cleanly() {
    let mut ops = Vec::new();
    // packBitsRect claiming a 65535-pixel-wide row in a 4-byte stride.
    ops.push(0x98);
    ops.extend_from_slice(&(0x8000u16 | 4).to_be_bytes());
    ops.extend_from_slice(&[0, 0, 0, 0, 0, 1, 0xff, 0xff]); // bounds
    ops.extend_from_slice(&[0, 0]); // version
    ops.extend_from_slice(&[0, 0]); // pack type
    ops.extend_from_slice(&[0; 12]);
    ops.extend_from_slice(&[0, 0]); // pixel type
    ops.extend_from_slice(&8u16.to_be_bytes()); // pixel size
    ops.extend_from_slice(&1u16.to_be_bytes());
    ops.extend_from_slice(&8u16.to_be_bytes());
    ops.extend_from_slice(&[0; 12]);
    // One-entry color table.
    ops.extend_from_slice(&[0; 6]);
    ops.extend_from_slice(&0u16.to_be_bytes());
    ops.extend_from_slice(&[0; 8]);
    // Source and destination rects plus mode.
    ops.extend_from_slice(&[0; 8]);
    ops.extend_from_slice(&[0; 8]);
    ops.extend_from_slice(&[0; 2]);

    let picture = decode(&v1_picture(&ops));
    assert_eq!(picture.error, Some(DecodeError::InconsistentRowStride));
    assert_eq!(picture.commands.len(), 0);
}

#[test]
fn unknown_opcodes_are_skipped_by_size() {
    let mut ops = Vec::new();
    // An opcode from the reserved 2-byte-size family.
    ops.push(0xa3);
    ops.extend_from_slice(&3u16.to_be_bytes());
    ops.extend_from_slice(&[1, 2, 3]);
    ops.push(0x31);
    ops.extend_from_slice(&rect_operand(0, 0, 4, 4));

    let picture = decode(&v1_picture(&ops));
    assert_eq!(picture.error, None);
    assert_eq!(picture.commands.len(), 1);
}

#[test]
fn pixel_pattern_color_feeds_the_pen() {
    let mut ops = Vec::new();
    // PnPixPat type 2: classic pattern bytes plus an explicit color.
    ops.push(0x13);
    ops.extend_from_slice(&2u16.to_be_bytes());
    ops.extend_from_slice(&[0xff; 8]);
    ops.extend_from_slice(&[0x12, 0x00, 0x34, 0x00, 0x56, 0x00]);
    ops.push(0x31);
    ops.extend_from_slice(&rect_operand(0, 0, 10, 10));

    let picture = decode(&v1_picture(&ops));
    assert_eq!(picture.error, None);
    assert_eq!(picture.commands.len(), 1);
    match &picture.commands[0] {
        DrawCommand::Rect { style, .. } => {
            assert_eq!(style.color, Color::new(0x12, 0x34, 0x56));
        }
        other => panic!("expected a rect, got {other:?}"),
    }
}

#[test]
fn fallback_sizes_cover_the_reserved_ranges() {
    let mut ops = Vec::new();
    // One representative opcode per size category.
    ops.extend_from_slice(&[0x01, 0x10, 0xaa, 0xbb]); // fixed 2
    ops.extend_from_slice(&[0x02, 0x34, 1, 2, 3, 4]); // fixed 4
    ops.extend_from_slice(&[0x0b, 0xff]);
    ops.extend_from_slice(&[0u8; 22]); // fixed 22
    ops.extend_from_slice(&[0x00, 0xd0]);
    ops.extend_from_slice(&2u32.to_be_bytes());
    ops.extend_from_slice(&[9, 9]); // payload counted by the prefix
    ops.extend_from_slice(&[0x80, 0x55]); // fixed 0
    ops.extend_from_slice(&[0x82, 0x34]);
    ops.extend_from_slice(&2u32.to_be_bytes());
    ops.extend_from_slice(&[7, 7]); // payload counted by the prefix
    ops.extend_from_slice(&[0x00, 0x31]);
    ops.extend_from_slice(&rect_operand(0, 0, 4, 4));

    let picture = decode(&v2_picture(&ops));
    assert_eq!(picture.error, None);
    assert_eq!(picture.commands.len(), 1);
}

#[test]
fn truncated_stream_reports_out_of_data() {
    let mut data = v1_picture(&[]);
    data.pop(); // drop the end marker
    data.push(0x31); // rect opcode with no operands

    let picture = decode(&data);
    assert_eq!(picture.error, Some(DecodeError::OutOfData));
    assert_eq!(picture.commands.len(), 0);
}

#[test]
fn short_input_has_no_header() {
    let picture = decode(&[0x11, 0x01]);
    assert_eq!(picture.error, Some(DecodeError::HeaderNotFound));
    assert_eq!(picture.commands.len(), 0);
}

#[test]
fn application_block_is_skipped() {
    let mut data = vec![0u8; 512];
    let mut ops = Vec::new();
    ops.push(0x31);
    ops.extend_from_slice(&rect_operand(0, 0, 10, 10));
    data.extend_from_slice(&v1_picture(&ops));

    let picture = decode(&data);
    assert_eq!(picture.error, None);
    assert_eq!(picture.commands.len(), 1);
    assert_eq!(picture.stopped_at, data.len());
}
