/// Code page 437 as Unicode, with the control range shown as its glyphs.
pub const CP437: [char; 256] = [
    '\0', '☺', '☻', '♥', '♦', '♣', '♠', '•', '◘', '○', '◙', '♂', '♀', '♪', '♫', '☼', //
    '►', '◄', '↕', '‼', '¶', '§', '▬', '↨', '↑', '↓', '→', '←', '∟', '↔', '▲', '▼', //
    ' ', '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '@', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '[', '\\', ']', '^', '_', //
    '`', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '{', '|', '}', '~', '⌂', //
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{A0}',
];

/// Replacement for characters with no code page 437 glyph.
pub const UNMAPPED: u8 = b'?';

pub fn decode(code: u8) -> char {
    CP437[code as usize]
}

pub fn encode(ch: char) -> u8 {
    if (' '..='~').contains(&ch) {
        return ch as u8;
    }

    // look-alikes that ratatui borders and common text produce
    let ch = match ch {
        '╭' => '┌',
        '╮' => '┐',
        '╰' => '└',
        '╯' => '┘',
        '━' => '─',
        '┃' => '│',
        'β' => 'ß',
        'μ' => 'µ',
        '∑' => 'Σ',
        '\u{22C5}' => '∙',
        other => other,
    };

    CP437
        .iter()
        .position(|&c| c == ch)
        .map_or(UNMAPPED, |index| index as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_identity() {
        for code in 0x20u8..0x7F {
            assert_eq!(decode(code) as u32, code as u32);
            assert_eq!(encode(code as char), code);
        }
    }

    #[test]
    fn table_round_trips() {
        for code in 0..=255u8 {
            assert_eq!(encode(decode(code)), code, "code {code:#04x}");
        }
    }

    #[test]
    fn box_drawing_and_aliases() {
        assert_eq!(encode('═'), 0xCD);
        assert_eq!(encode('╔'), 0xC9);
        assert_eq!(encode('█'), 0xDB);
        assert_eq!(encode('╭'), 0xDA);
        assert_eq!(encode('β'), 0xE1);
    }

    #[test]
    fn unknown_becomes_question_mark() {
        assert_eq!(encode('€'), UNMAPPED);
        assert_eq!(encode('漢'), UNMAPPED);
    }
}
