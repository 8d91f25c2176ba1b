/// Percent-encodes the components of the IRIs built by the direct mapping.
///
/// ASCII letters, digits, `_` and `~` are always kept. Whether `.` and `-` are kept, and whether
/// non-ASCII characters allowed in IRIs (`ucschar`) are kept or encoded as UTF-8 octets, depends
/// on the draft and on whether a name or a value is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PercentEncoder {
    keep_period: bool,
    keep_hyphen: bool,
    keep_ucschar: bool,
}

impl PercentEncoder {
    /// Keeps the RFC 3986 `unreserved` set except `.`.
    pub const UNRESERVED_WITHOUT_PERIOD: Self = Self {
        keep_period: false,
        keep_hyphen: true,
        keep_ucschar: false,
    };

    /// Keeps the RFC 3987 `iunreserved` set except `-`.
    pub const IUNRESERVED_WITHOUT_HYPHEN: Self = Self {
        keep_period: true,
        keep_hyphen: false,
        keep_ucschar: true,
    };

    /// Keeps the RFC 3987 `iunreserved` set.
    pub const IUNRESERVED: Self = Self {
        keep_period: true,
        keep_hyphen: true,
        keep_ucschar: true,
    };

    pub fn encode(&self, value: &str) -> String {
        let mut encoded = String::with_capacity(value.len());
        for c in value.chars() {
            if self.keeps(c) {
                encoded.push(c);
            } else {
                let mut buffer = [0; 4];
                for byte in c.encode_utf8(&mut buffer).bytes() {
                    encoded.push('%');
                    encoded.push_str(&hex::encode_upper([byte]));
                }
            }
        }
        encoded
    }

    fn keeps(&self, c: char) -> bool {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '_' | '~' => true,
            '.' => self.keep_period,
            '-' => self.keep_hyphen,
            c => self.keep_ucschar && is_ucschar(c),
        }
    }
}

/// The `ucschar` production of RFC 3987.
fn is_ucschar(c: char) -> bool {
    matches!(c,
        '\u{A0}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFEF}'
        | '\u{10000}'..='\u{1FFFD}'
        | '\u{20000}'..='\u{2FFFD}'
        | '\u{30000}'..='\u{3FFFD}'
        | '\u{40000}'..='\u{4FFFD}'
        | '\u{50000}'..='\u{5FFFD}'
        | '\u{60000}'..='\u{6FFFD}'
        | '\u{70000}'..='\u{7FFFD}'
        | '\u{80000}'..='\u{8FFFD}'
        | '\u{90000}'..='\u{9FFFD}'
        | '\u{A0000}'..='\u{AFFFD}'
        | '\u{B0000}'..='\u{BFFFD}'
        | '\u{C0000}'..='\u{CFFFD}'
        | '\u{D0000}'..='\u{DFFFD}'
        | '\u{E1000}'..='\u{EFFFD}'
    )
}
