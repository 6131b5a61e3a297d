//! Number formats

/// Currency symbols recognised in display formats
pub const CURRENCY_SYMBOLS: [char; 4] = ['$', '£', '€', '¥'];

/// Display format of a numeric cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,
    /// Built-in format by ID
    BuiltIn(u32),
    /// Custom format string
    Custom(String),
}

impl NumberFormat {
    /// Resolve a `numFmtId`, preferring a custom definition from the styles part
    pub fn from_id(id: u32) -> Self {
        match id {
            0 => NumberFormat::General,
            id => NumberFormat::BuiltIn(id),
        }
    }

    /// Get the format string
    pub fn format_string(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => Self::builtin_format_string(*id),
            NumberFormat::Custom(s) => s,
        }
    }

    fn builtin_format_string(id: u32) -> &'static str {
        match id {
            1 => "0",
            2 => "0.00",
            3 => "#,##0",
            4 => "#,##0.00",
            5 => "\"$\"#,##0_);(\"$\"#,##0)",
            6 => "\"$\"#,##0_);[Red](\"$\"#,##0)",
            7 => "\"$\"#,##0.00_);(\"$\"#,##0.00)",
            8 => "\"$\"#,##0.00_);[Red](\"$\"#,##0.00)",
            9 => "0%",
            10 => "0.00%",
            11 => "0.00E+00",
            12 => "# ?/?",
            13 => "# ??/??",
            14 => "mm-dd-yy",
            15 => "d-mmm-yy",
            16 => "d-mmm",
            17 => "mmm-yy",
            18 => "h:mm AM/PM",
            19 => "h:mm:ss AM/PM",
            20 => "h:mm",
            21 => "h:mm:ss",
            22 => "m/d/yy h:mm",
            37 => "#,##0 ;(#,##0)",
            38 => "#,##0 ;[Red](#,##0)",
            39 => "#,##0.00;(#,##0.00)",
            40 => "#,##0.00;[Red](#,##0.00)",
            45 => "mm:ss",
            46 => "[h]:mm:ss",
            47 => "mmss.0",
            48 => "##0.0E+0",
            49 => "@",
            _ => "General",
        }
    }

    /// Check if this is a date/time format
    ///
    /// Quoted literals, `\x` escapes and bracketed sections (`[Red]`,
    /// `[$-409]`) are ignored; elapsed-time sections like `[h]` still count.
    pub fn is_date_format(&self) -> bool {
        match self {
            NumberFormat::General => false,
            NumberFormat::BuiltIn(id) => matches!(id, 14..=22 | 45..=47),
            NumberFormat::Custom(s) => {
                let mut in_quotes = false;
                let mut in_brackets = false;
                let mut bracket = String::new();
                let mut chars = s.chars();
                while let Some(c) = chars.next() {
                    match c {
                        '"' => in_quotes = !in_quotes,
                        _ if in_quotes => {}
                        '\\' => {
                            chars.next();
                        }
                        '[' => {
                            in_brackets = true;
                            bracket.clear();
                        }
                        ']' if in_brackets => {
                            in_brackets = false;
                            let lower = bracket.to_ascii_lowercase();
                            if !lower.is_empty() && lower.chars().all(|c| matches!(c, 'h' | 'm' | 's')) {
                                return true;
                            }
                        }
                        _ if in_brackets => bracket.push(c),
                        'y' | 'Y' | 'd' | 'D' | 'h' | 'H' | 'm' | 'M' | 's' | 'S' => return true,
                        _ => {}
                    }
                }
                false
            }
        }
    }

    /// Check if the display format ends with a percent sign
    pub fn is_percent(&self) -> bool {
        self.format_string().ends_with('%')
    }

    /// Check if the display format contains a currency symbol
    pub fn has_currency_symbol(&self) -> bool {
        self.format_string().contains(&CURRENCY_SYMBOLS[..])
    }
}
