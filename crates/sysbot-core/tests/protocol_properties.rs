//! Integration tests for the sysbot-core public API.
//!
//! These tests exercise the framing codec, image conversion and macro parser
//! together, through the crate root re-exports, the way the client crate uses
//! them.

use sysbot_core::{
    encode_command, parse_macro,
    protocol::{binary_to_hex_text, hex_text_to_binary, is_complete, looks_like_hex_image},
    Button, Command, DecodeError, ImageEncoding, ImagePayload, ImageResponse, SequenceError,
    SequenceStep, StickName, StickVector,
};

fn jpeg_of_len(len: usize) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8];
    bytes.extend((0..len.saturating_sub(4)).map(|i| (i % 251) as u8));
    bytes.extend([0xFF, 0xD9]);
    bytes
}

#[test]
fn test_every_builder_encodes_with_single_crlf() {
    let commands = [
        Command::get_title_id(),
        Command::game_name(),
        Command::game_version(),
        Command::game_author(),
        Command::game_icon(),
        Command::pixel_peek(),
        Command::configure_controller_type(3),
        Command::configure_button_click_sleep_time(50),
        Command::configure_main_loop_sleep_time(50),
        Command::press(Button::A),
        Command::release(Button::RStick),
        Command::click(Button::Capture),
        Command::set_stick(StickName::Left, StickVector::FULL_DOWN),
    ];

    for cmd in commands {
        let bytes = encode_command(&cmd);
        let mut expected = cmd.as_str().as_bytes().to_vec();
        expected.extend_from_slice(b"\r\n");
        assert_eq!(bytes, expected, "command {cmd}");
    }
}

#[test]
fn test_hex_and_binary_renderings_of_one_image_agree() {
    // Arrange
    let jpeg = jpeg_of_len(40_000);
    let hex_text = binary_to_hex_text(&jpeg);

    // Act
    let from_hex = ImagePayload::try_from_response(ImageResponse::Hex(hex_text.into_bytes()))
        .expect("hex rendering must convert");
    let from_binary = ImagePayload::try_from_response(ImageResponse::Binary(jpeg.clone()))
        .expect("binary rendering must convert");

    // Assert
    assert_eq!(from_hex.as_bytes(), jpeg.as_slice());
    assert_eq!(from_hex, from_binary);
}

#[test]
fn test_hex_detection_distinguishes_encodings_of_the_same_image() {
    let jpeg = jpeg_of_len(64);
    let hex_text = binary_to_hex_text(&jpeg);

    assert!(looks_like_hex_image(hex_text.as_bytes()));
    assert!(!looks_like_hex_image(&jpeg));
    assert!(is_complete(hex_text.as_bytes(), ImageEncoding::Hex));
    assert!(is_complete(&jpeg, ImageEncoding::Binary));
}

#[test]
fn test_hex_text_to_binary_round_trip_for_jpeg_shaped_bytes() {
    for len in [4, 5, 100, 4096, 50_000] {
        let jpeg = jpeg_of_len(len);
        assert_eq!(
            hex_text_to_binary(&binary_to_hex_text(&jpeg)),
            Ok(jpeg),
            "length {len}"
        );
    }
}

#[test]
fn test_truncated_image_fails_final_marker_check() {
    let mut jpeg = jpeg_of_len(1000);
    jpeg.truncate(600);
    assert_eq!(
        ImagePayload::try_from_response(ImageResponse::Binary(jpeg)),
        Err(DecodeError::MissingEndMarker)
    );
}

#[test]
fn test_macro_steps_map_to_expected_wire_lines() {
    // Arrange
    let steps = parse_macro("+ZL,B,W1000,-ZL,%7FFF,0").unwrap();

    // Act
    let lines: Vec<String> = steps
        .iter()
        .filter_map(SequenceStep::to_command)
        .map(|c| c.to_string())
        .collect();

    // Assert – the wait step is local and produces no wire line
    assert_eq!(
        lines,
        vec![
            "press ZL",
            "click B",
            "release ZL",
            "setStick LEFT 0x7FFF 0x0",
        ]
    );
}

#[test]
fn test_macro_with_unknown_button_is_rejected_whole() {
    let result = parse_macro("A,B,QQ,X");
    assert!(matches!(result, Err(SequenceError::Parse { position: 2, .. })));
}
