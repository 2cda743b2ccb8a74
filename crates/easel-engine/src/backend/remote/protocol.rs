//! Line protocol spoken with the browser client.
//!
//! Every line is an opcode padded to [`OPCODE_WIDTH`] characters, one space,
//! then comma-separated operands. Free text (strings, paths, families) is
//! always the last operand so it may itself contain commas.

use std::fmt::{self, Write as _};

use crate::coords::Vec2;
use crate::error::{EngineError, EngineResult};
use crate::input::{InputEvent, InputId, KeyId, MouseButton};
use crate::paint::PaintState;
use crate::scene::{CommandBuffer, DrawCmd, ImageCmd};

pub const OPCODE_WIDTH: usize = 8;

// ── outbound ──────────────────────────────────────────────────────────────

/// Lines sent once, before the first frame.
pub fn encode_handshake(title: &str, width: u32, height: u32) -> String {
    let mut out = String::new();
    line(&mut out, "setTitle", format_args!("{}", escape_text(title)));
    line(&mut out, "setSize", format_args!("{width},{height}"));
    out
}

pub fn encode_title(title: &str) -> String {
    let mut out = String::new();
    line(&mut out, "setTitle", format_args!("{}", escape_text(title)));
    out
}

/// One frame batch: a `clear` followed by every command of `buffer`.
pub fn encode_frame(buffer: &CommandBuffer) -> String {
    let mut out = String::with_capacity(buffer.len() * 24 + 16);
    line(&mut out, "clear", format_args!(""));
    for cmd in buffer {
        encode_command(cmd, &mut out);
    }
    out
}

/// Appends the line(s) for one command.
pub fn encode_command(cmd: &DrawCmd, out: &mut String) {
    match cmd {
        DrawCmd::ApplySettings(state) => encode_settings(state, out),
        DrawCmd::SetColor(c) => line(out, "setColor", format_args!("{},{},{},{}", c.r, c.g, c.b, c.a)),
        DrawCmd::SetAlpha(a) => line(out, "setAlpha", format_args!("{a}")),
        DrawCmd::SetStrokeWidth(w) => line(out, "setStrkW", format_args!("{w}")),
        DrawCmd::SetStrokeRound(r) => line(out, "setStrkR", format_args!("{}", flag(*r))),
        DrawCmd::SetFont { size, bold, italic } => {
            line(out, "setFont", format_args!("{size},{},{}", flag(*bold), flag(*italic)))
        }
        DrawCmd::SetFontFamily(f) => line(out, "setFontF", format_args!("{}", escape_text(f))),
        DrawCmd::SetTextAlign(a) => line(out, "setTxtAl", format_args!("{}", a.as_str())),
        DrawCmd::SetLineSpacing(s) => line(out, "setLnSp", format_args!("{s}")),

        DrawCmd::Clear => line(out, "clear", format_args!("")),
        DrawCmd::DrawRect(r) => line(out, "drawRect", format_args!("{},{},{},{}", r.x, r.y, r.width, r.height)),
        DrawCmd::FillRect(r) => line(out, "fillRect", format_args!("{},{},{},{}", r.x, r.y, r.width, r.height)),
        DrawCmd::DrawOval(r) => line(out, "drawOval", format_args!("{},{},{},{}", r.x, r.y, r.width, r.height)),
        DrawCmd::FillOval(r) => line(out, "fillOval", format_args!("{},{},{},{}", r.x, r.y, r.width, r.height)),
        DrawCmd::DrawArc { bounds: r, start, extent } => line(
            out,
            "drawArc",
            format_args!("{},{},{},{},{start},{extent}", r.x, r.y, r.width, r.height),
        ),
        DrawCmd::FillArc { bounds: r, start, extent } => line(
            out,
            "fillArc",
            format_args!("{},{},{},{},{start},{extent}", r.x, r.y, r.width, r.height),
        ),
        DrawCmd::DrawLine { from, to } => {
            line(out, "drawLine", format_args!("{},{},{},{}", from.x, from.y, to.x, to.y))
        }
        DrawCmd::DrawPath(pts) => line(out, "drawPath", format_args!("{}", Points(pts))),
        DrawCmd::DrawPoly(pts) => line(out, "drawPoly", format_args!("{}", Points(pts))),
        DrawCmd::FillPoly(pts) => line(out, "fillPoly", format_args!("{}", Points(pts))),
        DrawCmd::DrawString { at, text } => {
            line(out, "drawStr", format_args!("{},{},{}", at.x, at.y, escape_text(text)))
        }
        DrawCmd::DrawImage(img) => encode_image(img, out),
    }
}

/// `reset` plus one line per attribute that differs from the default.
fn encode_settings(state: &PaintState, out: &mut String) {
    let d = PaintState::default();
    line(out, "reset", format_args!(""));

    if state.color != d.color {
        encode_command(&DrawCmd::SetColor(state.color), out);
    }
    if state.alpha != d.alpha {
        encode_command(&DrawCmd::SetAlpha(state.alpha), out);
    }
    if state.stroke_width != d.stroke_width {
        encode_command(&DrawCmd::SetStrokeWidth(state.stroke_width), out);
    }
    if state.stroke_round != d.stroke_round {
        encode_command(&DrawCmd::SetStrokeRound(state.stroke_round), out);
    }
    if (state.font_size, state.bold, state.italic) != (d.font_size, d.bold, d.italic) {
        let cmd = DrawCmd::SetFont { size: state.font_size, bold: state.bold, italic: state.italic };
        encode_command(&cmd, out);
    }
    if state.font_family != d.font_family {
        encode_command(&DrawCmd::SetFontFamily(state.font_family.clone()), out);
    }
    if state.align != d.align {
        encode_command(&DrawCmd::SetTextAlign(state.align), out);
    }
    if state.line_spacing != d.line_spacing {
        encode_command(&DrawCmd::SetLineSpacing(state.line_spacing), out);
    }
}

fn encode_image(img: &ImageCmd, out: &mut String) {
    let op = if img.centered { "drawImgC" } else { "drawImg" };
    line(
        out,
        op,
        format_args!("{},{},{},{},{}", img.at.x, img.at.y, img.scale, img.angle, escape_text(&img.path)),
    );
}

/// Binary image message: 4-byte big-endian name length, UTF-8 name, raw bytes.
pub fn encode_image_payload(name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + name.len() + bytes.len());
    out.extend_from_slice(&(name.len() as u32).to_be_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(bytes);
    out
}

/// Escapes backslashes and newlines so a string stays on one line.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

fn line(out: &mut String, opcode: &str, operands: fmt::Arguments<'_>) {
    if !out.is_empty() {
        out.push('\n');
    }
    // Writing into a String cannot fail.
    let _ = write!(out, "{opcode:<OPCODE_WIDTH$} {operands}");
}

#[inline]
fn flag(b: bool) -> u8 {
    b as u8
}

struct Points<'a>(&'a [Vec2]);

impl fmt::Display for Points<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{},{}", p.x, p.y)?;
        }
        Ok(())
    }
}

// ── inbound ───────────────────────────────────────────────────────────────

/// Parses one line sent by the client into an input event.
///
/// Key and button names outside the recognized vocabulary come back as
/// [`EngineError::InvalidInput`]; anything structurally wrong as
/// [`EngineError::Protocol`].
pub fn parse_inbound(raw: &str) -> EngineResult<InputEvent> {
    let malformed = || EngineError::Protocol(format!("malformed line `{raw}`"));

    let (opcode, operands) = match raw.split_once(' ') {
        Some((op, rest)) => (op, rest.trim_start_matches(' ')),
        None => (raw, ""),
    };

    match opcode {
        "keyDown" | "keyUp" => {
            let (name, ch) = split_key_operands(operands).ok_or_else(malformed)?;
            let id = InputId::Key(KeyId::parse(name, ch)?);
            Ok(if opcode == "keyDown" { InputEvent::Press(id) } else { InputEvent::Release(id) })
        }
        "mouseDwn" | "mouseUp" => {
            let id = InputId::Mouse(MouseButton::from_wire(operands.trim())?);
            Ok(if opcode == "mouseDwn" { InputEvent::Press(id) } else { InputEvent::Release(id) })
        }
        "mouseMov" => {
            let (x, y) = operands.split_once(',').ok_or_else(malformed)?;
            let x: f32 = x.trim().parse().map_err(|_| malformed())?;
            let y: f32 = y.trim().parse().map_err(|_| malformed())?;
            if !x.is_finite() || !y.is_finite() {
                return Err(malformed());
            }
            Ok(InputEvent::MouseMoved { x, y })
        }
        _ => Err(EngineError::Protocol(format!("unknown opcode `{opcode}`"))),
    }
}

/// Splits `name,char`, where `char` is a single (possibly empty) character and
/// `name` may itself be a comma.
fn split_key_operands(operands: &str) -> Option<(&str, Option<char>)> {
    let last = operands.chars().next_back()?;
    let head = &operands[..operands.len() - last.len_utf8()];

    if let Some(name) = head.strip_suffix(',') {
        if !name.is_empty() {
            return Some((name, Some(last)));
        }
    }
    if last == ',' && !head.is_empty() {
        return Some((head, None));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::paint::{Color, TextAlign};

    fn encoded(cmd: DrawCmd) -> String {
        let mut out = String::new();
        encode_command(&cmd, &mut out);
        out
    }

    #[test]
    fn opcodes_are_padded_to_a_fixed_width() {
        assert_eq!(encoded(DrawCmd::FillRect(Rect::new(1.0, 2.0, 3.5, 4.0))), "fillRect 1,2,3.5,4");
        assert_eq!(encoded(DrawCmd::SetAlpha(0.5)), "setAlpha 0.5");
        assert_eq!(encoded(DrawCmd::SetLineSpacing(1.5)), "setLnSp  1.5");
        assert_eq!(encoded(DrawCmd::Clear), "clear    ");
    }

    #[test]
    fn style_lines() {
        assert_eq!(encoded(DrawCmd::SetColor(Color::rgba(10, 20, 30, 40))), "setColor 10,20,30,40");
        assert_eq!(encoded(DrawCmd::SetFont { size: 24.0, bold: true, italic: false }), "setFont  24,1,0");
        assert_eq!(encoded(DrawCmd::SetTextAlign(TextAlign::Center)), "setTxtAl center");
        assert_eq!(encoded(DrawCmd::SetStrokeRound(true)), "setStrkR 1");
    }

    #[test]
    fn geometry_lines() {
        let arc = DrawCmd::FillArc { bounds: Rect::new(0.0, 0.0, 10.0, 10.0), start: 90.0, extent: -45.0 };
        assert_eq!(encoded(arc), "fillArc  0,0,10,10,90,-45");

        let pts = vec![Vec2::new(0.0, 0.0), Vec2::new(5.0, 1.0), Vec2::new(2.0, 7.5)];
        assert_eq!(encoded(DrawCmd::FillPoly(pts)), "fillPoly 0,0,5,1,2,7.5");

        let line = DrawCmd::DrawLine { from: Vec2::new(1.0, 1.0), to: Vec2::new(9.0, 2.0) };
        assert_eq!(encoded(line), "drawLine 1,1,9,2");
    }

    #[test]
    fn strings_are_escaped() {
        let cmd = DrawCmd::DrawString { at: Vec2::new(3.0, 4.0), text: "a\\b\nc, d".into() };
        assert_eq!(encoded(cmd), "drawStr  3,4,a\\\\b\\nc, d");
    }

    #[test]
    fn images_keep_the_path_last() {
        let img = ImageCmd { at: Vec2::new(5.0, 6.0), scale: 2.0, angle: 30.0, path: "img/a,b.png".into(), centered: true };
        assert_eq!(encoded(DrawCmd::DrawImage(img)), "drawImgC 5,6,2,30,img/a,b.png");
    }

    #[test]
    fn settings_expand_to_reset_plus_differences() {
        let mut state = PaintState::default();
        assert_eq!(encoded(DrawCmd::ApplySettings(state.clone())), "reset    ");

        state.set_stroke_width(3.0);
        state.set_align(TextAlign::Right);
        assert_eq!(
            encoded(DrawCmd::ApplySettings(state)),
            "reset    \nsetStrkW 3\nsetTxtAl right"
        );
    }

    #[test]
    fn frames_start_with_clear() {
        let mut buffer = CommandBuffer::seeded(&PaintState::default());
        buffer.push(DrawCmd::FillOval(Rect::new(0.0, 0.0, 2.0, 2.0)));
        let frame = encode_frame(&buffer);
        let lines: Vec<&str> = frame.lines().collect();
        assert_eq!(lines, ["clear    ", "reset    ", "fillOval 0,0,2,2"]);
    }

    #[test]
    fn handshake_sets_title_and_size() {
        assert_eq!(encode_handshake("pong", 640, 480), "setTitle pong\nsetSize  640,480");
    }

    #[test]
    fn image_payload_layout() {
        let payload = encode_image_payload("a.png", &[1, 2, 3]);
        assert_eq!(&payload[..4], &[0, 0, 0, 5]);
        assert_eq!(&payload[4..9], b"a.png");
        assert_eq!(&payload[9..], &[1, 2, 3]);
    }

    #[test]
    fn parses_key_lines() {
        let ev = parse_inbound("keyDown  a,A").unwrap();
        let InputEvent::Press(InputId::Key(k)) = ev else { panic!("expected key press") };
        assert_eq!((k.name(), k.ch()), ("a", Some('A')));

        let ev = parse_inbound("keyUp    enter,").unwrap();
        let InputEvent::Release(InputId::Key(k)) = ev else { panic!("expected key release") };
        assert_eq!((k.name(), k.ch()), ("enter", None));

        let ev = parse_inbound("keyDown  ,,,").unwrap();
        let InputEvent::Press(InputId::Key(k)) = ev else { panic!("expected key press") };
        assert_eq!((k.name(), k.ch()), (",", Some(',')));

        let ev = parse_inbound("keyDown  space, ").unwrap();
        let InputEvent::Press(InputId::Key(k)) = ev else { panic!("expected key press") };
        assert_eq!(k.name(), "space");
    }

    #[test]
    fn parses_mouse_lines() {
        assert_eq!(parse_inbound("mouseDwn 0").unwrap(), InputEvent::Press(InputId::Mouse(MouseButton::Left)));
        assert_eq!(parse_inbound("mouseUp  1").unwrap(), InputEvent::Release(InputId::Mouse(MouseButton::Right)));
        assert_eq!(parse_inbound("mouseMov 12.5,40").unwrap(), InputEvent::MouseMoved { x: 12.5, y: 40.0 });
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(parse_inbound("warp     1,2"), Err(EngineError::Protocol(_))));
        assert!(matches!(parse_inbound("mouseMov 12"), Err(EngineError::Protocol(_))));
        assert!(matches!(parse_inbound("mouseMov a,b"), Err(EngineError::Protocol(_))));
        assert!(matches!(parse_inbound("keyDown"), Err(EngineError::Protocol(_))));
        assert!(matches!(parse_inbound("mouseDwn 2"), Err(EngineError::InvalidInput(_))));
        assert!(matches!(parse_inbound("keyDown  hyperdrive,"), Err(EngineError::InvalidInput(_))));
    }
}
