//! Inbound commands to the application service.
//!
//! These represent messages arriving on the pub/sub bus that the
//! [`AppService`](super::service::AppService) interprets and acts upon.
//! Payload parsing is deliberately forgiving: anything it cannot make sense
//! of is dropped, never turned into a fault.

/// Commands that bus adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Desired hot-water state was set.
    SetHotWater(bool),

    /// Calibration: drive the servo to an absolute angle, bypassing the FSM.
    MoveServo(u8),
}

/// Interpret a desired-state payload.
///
/// - empty (property deleted) → `None`
/// - `null…` / `false…` → `false`
/// - a payload starting with `0` whose numeric prefix is zero (`0`, `0.0`,
///   `0e5`, `0x0`, `0..1`) → `false`
/// - anything else → `true`
pub fn parse_state_payload(payload: &str) -> Option<bool> {
    let payload = payload.trim_start();
    match payload.as_bytes().first()? {
        b'n' | b'f' => Some(false),
        b'0' => Some(leading_number(payload) != 0.0),
        _ => Some(true),
    }
}

/// Interpret a move-servo payload as an angle, clamped to 0–180.
pub fn parse_servo_payload(payload: &str) -> Option<u8> {
    let payload = payload.trim();
    let value: f64 = payload.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.round().clamp(0.0, 180.0) as u8)
}

/// Value of the numeric prefix of `s`, read the way C's `strtod` reads it:
/// decimal digits with an optional fraction and exponent, or `0x` hex.
/// `0.0` when there is no number at all.
fn leading_number(s: &str) -> f64 {
    let b = s.as_bytes();
    if let [b'0', b'x' | b'X', rest @ ..] = b {
        if let Some(v) = hex_mantissa(rest) {
            return v;
        }
    }
    let mut end = skip_digits(b, 0, u8::is_ascii_digit);
    if b.get(end) == Some(&b'.') {
        end = skip_digits(b, end + 1, u8::is_ascii_digit);
    }
    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(b.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let after = skip_digits(b, exp, u8::is_ascii_digit);
        if after > exp {
            end = after;
        }
    }
    s[..end].parse().unwrap_or(0.0)
}

/// Hex digits with an optional fraction. The binary exponent is not applied.
fn hex_mantissa(b: &[u8]) -> Option<f64> {
    let int_end = skip_digits(b, 0, u8::is_ascii_hexdigit);
    let (frac_start, frac_end) = if b.get(int_end) == Some(&b'.') {
        (int_end + 1, skip_digits(b, int_end + 1, u8::is_ascii_hexdigit))
    } else {
        (int_end, int_end)
    };
    if int_end == 0 && frac_end == frac_start {
        return None;
    }
    let hex = |c: &u8| f64::from((*c as char).to_digit(16).unwrap_or(0));
    let int = b[..int_end].iter().fold(0.0, |v, c| v * 16.0 + hex(c));
    let frac = b[frac_start..frac_end]
        .iter()
        .rev()
        .fold(0.0, |v, c| (v + hex(c)) / 16.0);
    Some(int + frac)
}

fn skip_digits(b: &[u8], from: usize, is_digit: fn(&u8) -> bool) -> usize {
    from + b.get(from..).map_or(0, |tail| tail.iter().take_while(|&c| is_digit(c)).count())
}
