use chrono::format::{Parsed, StrftimeItems};
use chrono::{FixedOffset, NaiveDateTime};
use std::fmt;

/// Date layouts accepted before the time part.
const DATE_FORMATS: &[&str] = &["%Y:%m:%d", "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
/// Time layouts accepted after the date part.
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H-%M-%S"];

/// A capture date/time as stored in `DateTimeOriginal`-style tags.
///
/// The fractional seconds are kept verbatim (`"500"` stays `"500"`, not `"5"`)
/// because they end up in file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTimestamp {
    date_time: NaiveDateTime,
    sub_seconds: Option<String>,
    offset: Option<FixedOffset>,
}

impl CaptureTimestamp {
    /// Parse `YYYY:MM:DD HH:MM:SS[.fff][zone]` and its common variants.
    ///
    /// Date separators may be `:`, `-`, `/` or `.`; time separators `:` or `-`.
    /// Date and time are split by whitespace or `T`. A trailing zone (`Z`,
    /// `+02:00`, `-0500`) is kept as [`offset`](Self::offset).
    ///
    /// ```rust
    /// use exif_tagger::exif::CaptureTimestamp;
    ///
    /// let ts = CaptureTimestamp::parse("2023-05-01 12:30:45.500").unwrap();
    /// assert_eq!(ts.file_stem(), "2023-05-01 12-30-45(500)");
    /// assert!(CaptureTimestamp::parse("0000:00:00 00:00:00").is_none());
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        let (date_time, mut rest) = parse_date_time(&normalized)?;

        let mut sub_seconds = None;
        if let Some(frac) = rest.strip_prefix(['.', ',']) {
            let digits = frac.len() - frac.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits == 0 {
                return None;
            }
            sub_seconds = Some(frac[..digits].to_string());
            rest = &frac[digits..];
        }

        let offset = match rest.trim() {
            "" => None,
            zone => Some(parse_offset(zone)?),
        };

        Some(Self {
            date_time,
            sub_seconds,
            offset,
        })
    }

    /// Fractional seconds exactly as written, without the leading dot.
    pub fn sub_seconds(&self) -> Option<&str> {
        self.sub_seconds.as_deref()
    }

    /// The UTC offset written after the time, if any. `Z` is `+00:00`.
    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    /// `YYYY:MM:DD HH:MM:SS`, the form EXIF date tags use.
    pub fn exif_date_time(&self) -> String {
        self.date_time.format("%Y:%m:%d %H:%M:%S").to_string()
    }

    /// File stem used for renaming: `YYYY-MM-DD HH-MM-SS[(fff)]`.
    pub fn file_stem(&self) -> String {
        let mut stem = self.date_time.format("%Y-%m-%d %H-%M-%S").to_string();
        if let Some(ref frac) = self.sub_seconds {
            stem.push('(');
            stem.push_str(frac);
            stem.push(')');
        }
        stem
    }
}

impl fmt::Display for CaptureTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.exif_date_time())?;
        if let Some(ref frac) = self.sub_seconds {
            write!(f, ".{frac}")?;
        }
        Ok(())
    }
}

/// Try every date/time layout and return the first match with the unparsed tail.
fn parse_date_time(s: &str) -> Option<(NaiveDateTime, &str)> {
    for date in DATE_FORMATS {
        for time in TIME_FORMATS {
            for joiner in [" ", "T"] {
                let format = format!("{date}{joiner}{time}");
                if let Ok(parsed) = NaiveDateTime::parse_and_remainder(s, &format) {
                    return Some(parsed);
                }
            }
        }
    }
    None
}

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    if zone == "Z" {
        return FixedOffset::east_opt(0);
    }
    let format = if zone.contains(':') { "%:z" } else { "%z" };
    let mut parsed = Parsed::new();
    chrono::format::parse(&mut parsed, zone, StrftimeItems::new(format)).ok()?;
    parsed.to_fixed_offset().ok()
}
