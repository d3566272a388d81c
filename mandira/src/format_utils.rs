use std::fmt::Write;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{Error, ErrorKind};
use crate::value::{Value, ValueRepr};

/// Parsed flags, width and precision of a single directive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Spec {
    left_align: bool,
    zero_padded: bool,
    plus_sign: bool,
    space_sign: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

fn invalid_format(msg: impl Into<std::borrow::Cow<'static, str>>) -> Error {
    Error::new(ErrorKind::InvalidOperation, msg)
}

fn read_number(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let mut rv: Option<usize> = None;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        rv = Some(rv.unwrap_or(0).saturating_mul(10).saturating_add(digit as usize));
    }
    rv
}

fn parse_spec(chars: &mut Peekable<Chars<'_>>) -> Spec {
    let mut spec = Spec::default();
    while let Some(&c) = chars.peek() {
        match c {
            '-' => spec.left_align = true,
            '0' => spec.zero_padded = true,
            '+' => spec.plus_sign = true,
            ' ' => spec.space_sign = true,
            _ => break,
        }
        chars.next();
    }
    spec.width = read_number(chars);
    if chars.peek() == Some(&'.') {
        chars.next();
        spec.precision = Some(read_number(chars).unwrap_or(0));
    }
    spec
}

impl Spec {
    fn sign(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.plus_sign {
            "+"
        } else if self.space_sign {
            " "
        } else {
            ""
        }
    }

    fn pad_into(&self, out: &mut String, sign: &str, body: &str, zero_allowed: bool) {
        let len = sign.chars().count() + body.chars().count();
        let fill = self.width.map_or(0, |width| width.saturating_sub(len));
        if self.left_align {
            out.push_str(sign);
            out.push_str(body);
            out.extend(std::iter::repeat(' ').take(fill));
        } else if self.zero_padded && zero_allowed {
            out.push_str(sign);
            out.extend(std::iter::repeat('0').take(fill));
            out.push_str(body);
        } else {
            out.extend(std::iter::repeat(' ').take(fill));
            out.push_str(sign);
            out.push_str(body);
        }
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value.0 {
        ValueRepr::I64(val) => Some(val),
        ValueRepr::F64(val) if val.fract() == 0.0 && val.abs() < i64::MAX as f64 => Some(val as i64),
        ValueRepr::Bool(val) => Some(val as i64),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value.0 {
        ValueRepr::I64(val) => Some(val as f64),
        ValueRepr::F64(val) => Some(val),
        _ => None,
    }
}

/// Formats a float in exponent notation with a signed two digit exponent
/// (`1.500000e+02`).
fn format_exp(val: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, val);
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let (exp_sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, exp_sign, digits)
        }
        None => raw,
    }
}

fn format_one(out: &mut String, verb: char, spec: &Spec, value: &Value) -> Result<(), Error> {
    match verb {
        's' | 'v' => {
            let s = value.to_string();
            let s = match spec.precision {
                Some(prec) => s.chars().take(prec).collect(),
                None => s,
            };
            spec.pad_into(out, "", &s, true);
        }
        'q' => {
            let s = format!("{:?}", value.to_string());
            spec.pad_into(out, "", &s, false);
        }
        'd' | 'o' | 'b' | 'x' | 'X' => {
            if let (Some(s), 'x' | 'X') = (value.as_str(), verb) {
                let mut body = String::with_capacity(s.len() * 2);
                for b in s.bytes() {
                    if verb == 'x' {
                        write!(body, "{:02x}", b).ok();
                    } else {
                        write!(body, "{:02X}", b).ok();
                    }
                }
                spec.pad_into(out, "", &body, true);
                return Ok(());
            }
            let int = ok!(as_integer(value).ok_or_else(|| {
                invalid_format(format!("%{} expects an integer, got {}", verb, value.kind()))
            }));
            let abs = int.unsigned_abs();
            let mut body = match verb {
                'o' => format!("{:o}", abs),
                'b' => format!("{:b}", abs),
                'x' => format!("{:x}", abs),
                'X' => format!("{:X}", abs),
                _ => abs.to_string(),
            };
            if let Some(prec) = spec.precision {
                if body.len() < prec {
                    body.insert_str(0, &"0".repeat(prec - body.len()));
                }
            }
            spec.pad_into(out, spec.sign(int < 0), &body, spec.precision.is_none());
        }
        'f' | 'F' | 'e' | 'E' => {
            let float = ok!(as_float(value).ok_or_else(|| {
                invalid_format(format!("%{} expects a number, got {}", verb, value.kind()))
            }));
            let precision = spec.precision.unwrap_or(6);
            let body = if float.is_nan() {
                "NaN".to_string()
            } else if float.is_infinite() {
                "Inf".to_string()
            } else if matches!(verb, 'e' | 'E') {
                format_exp(float.abs(), precision)
            } else {
                format!("{:.*}", precision, float.abs())
            };
            let body = if verb == 'E' { body.to_uppercase() } else { body };
            let negative = float.is_sign_negative() && !float.is_nan();
            spec.pad_into(out, spec.sign(negative), &body, float.is_finite());
        }
        other => return Err(invalid_format(format!("unsupported format verb %{}", other))),
    }
    Ok(())
}

/// Formats `args` into a printf style format string.
///
/// Supported verbs are `%s`, `%v`, `%q`, `%d`, `%o`, `%b`, `%x`, `%X`,
/// `%f`, `%e` and `%%`.  Directives may carry the flags `-`, `0`, `+` and
/// space followed by a width and a precision.
pub fn sprintf(fmt: &str, args: &[Value]) -> Result<String, Error> {
    let mut rv = String::with_capacity(fmt.len());
    let mut chars = fmt.chars().peekable();
    let mut args = args.iter();

    while let Some(c) = chars.next() {
        if c != '%' {
            rv.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            rv.push('%');
            continue;
        }
        let spec = parse_spec(&mut chars);
        let verb = ok!(chars
            .next()
            .ok_or_else(|| invalid_format("incomplete format directive")));
        let value = ok!(args.next().ok_or_else(|| Error::new(
            ErrorKind::MissingArgument,
            format!("missing argument for %{}", verb)
        )));
        ok!(format_one(&mut rv, verb, &spec, value));
    }

    if args.next().is_some() {
        return Err(Error::new(
            ErrorKind::InvalidArguments,
            "too many arguments for format string",
        ));
    }
    Ok(rv)
}
