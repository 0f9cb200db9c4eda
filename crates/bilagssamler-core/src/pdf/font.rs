//! Text metrics and encoding for the built-in Helvetica font.
//!
//! All generated pages (dividers, table of contents, watermark, page-number
//! stamps) use Standard-14 Helvetica with WinAnsiEncoding. Standard-14 fonts
//! need no embedded font program, so the crate ships no binary assets; the
//! advance widths below come from Adobe's Helvetica AFM, expressed in
//! 1/1000ths of the em square.
//!
//! Measurement is fatal on characters outside the supported repertoire:
//! a title the font cannot represent aborts generation rather than
//! rendering a wrong-width line (see `Error::UnsupportedChar`).

use crate::error::{Error, Result};

/// Advance widths for the ASCII printable range (U+0020 ..= U+007E).
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, // space ! " # $ % & '
    333, 333, 389, 584, 278, 333, 278, 278, // ( ) * + , - . /
    556, 556, 556, 556, 556, 556, 556, 556, // 0 1 2 3 4 5 6 7
    556, 556, 278, 278, 584, 584, 584, 556, // 8 9 : ; < = > ?
    1015, 667, 667, 722, 722, 667, 611, 778, // @ A B C D E F G
    722, 278, 500, 667, 556, 833, 722, 778, // H I J K L M N O
    667, 778, 722, 667, 611, 722, 667, 944, // P Q R S T U V W
    667, 667, 611, 278, 278, 278, 469, 556, // X Y Z [ \ ] ^ _
    333, 556, 556, 500, 556, 556, 278, 556, // ` a b c d e f g
    556, 222, 222, 500, 222, 833, 556, 556, // h i j k l m n o
    556, 556, 333, 500, 278, 556, 500, 722, // p q r s t u v w
    500, 500, 500, 334, 260, 334, 584, // x y z { | } ~
];

/// Metrics for Standard-14 Helvetica.
///
/// Zero-sized: the width tables are compile-time constants. Kept as a type
/// so the layout and rendering code take metrics explicitly instead of
/// reaching for globals.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontMetrics;

impl FontMetrics {
    pub const fn new() -> Self {
        Self
    }

    /// Advance width of a character in 1/1000ths of the em square.
    ///
    /// Returns `None` for characters outside WinAnsiEncoding's Latin
    /// repertoire.
    pub fn char_width(self, c: char) -> Option<u16> {
        let cp = c as u32;
        if (0x20..=0x7E).contains(&cp) {
            return Some(ASCII_WIDTHS[(cp - 0x20) as usize]);
        }
        latin1_width(c)
    }

    /// Width of a string in PDF points at the given font size.
    ///
    /// Fails on the first unmeasurable character; no fallback width is
    /// substituted.
    #[allow(clippy::cast_precision_loss)] // widths are <= 1015, exact in f32
    pub fn string_width(self, text: &str, font_size: f32) -> Result<f32> {
        let mut total: u32 = 0;
        for c in text.chars() {
            let w = self.char_width(c).ok_or(Error::UnsupportedChar {
                ch: c,
                codepoint: c as u32,
            })?;
            total += u32::from(w);
        }
        Ok(total as f32 * font_size / 1000.0)
    }

    /// Encode a string as WinAnsi bytes for a PDF string object.
    ///
    /// WinAnsiEncoding coincides with Latin-1 for everything this crate
    /// accepts, so encoding succeeds exactly when measurement does.
    pub fn encode_text(self, text: &str) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(text.len());
        for c in text.chars() {
            // Measurement support implies a Latin-1 codepoint
            self.char_width(c).ok_or(Error::UnsupportedChar {
                ch: c,
                codepoint: c as u32,
            })?;
            #[allow(clippy::cast_possible_truncation)] // checked: codepoint <= 0xFF
            bytes.push(c as u8);
        }
        Ok(bytes)
    }
}

/// Widths for the Latin-1 supplement (U+00A0 ..= U+00FF).
///
/// Accented letters share the advance of their base letter in Helvetica.
fn latin1_width(c: char) -> Option<u16> {
    let w = match c {
        '\u{00A0}' => 278,                              // no-break space
        '¡' => 333,
        '¢' | '£' | '¤' | '¥' => 556,
        '¦' => 260,
        '§' => 556,
        '¨' => 333,
        '©' | '®' => 737,
        'ª' => 370,
        '«' | '»' => 556,
        '¬' => 584,
        '\u{00AD}' => 333,                              // soft hyphen
        '¯' => 333,
        '°' => 400,
        '±' | '×' | '÷' => 584,
        '²' | '³' | '¹' => 333,
        '´' => 333,
        'µ' => 556,
        '¶' => 537,
        '·' => 278,
        '¸' => 333,
        'º' => 365,
        '¼' | '½' | '¾' => 834,
        '¿' => 611,
        'À'..='Å' => 667,
        'Æ' => 1000,
        'Ç' => 722,
        'È'..='Ë' => 667,
        'Ì'..='Ï' => 278,
        'Ð' | 'Ñ' => 722,
        'Ò'..='Ö' => 778,
        'Ø' => 778,
        'Ù'..='Ü' => 722,
        'Ý' | 'Þ' => 667,
        'ß' => 611,
        'à'..='å' => 556,
        'æ' => 889,
        'ç' => 500,
        'è'..='ë' => 556,
        'ì'..='ï' => 278,
        'ð' | 'ñ' => 556,
        'ò'..='ö' => 556,
        'ø' => 611,
        'ù'..='ü' => 556,
        'ý' | 'ÿ' => 500,
        'þ' => 556,
        _ => return None,
    };
    Some(w)
}
