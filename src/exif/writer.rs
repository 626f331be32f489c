use super::TagValues;
use super::timestamp::CaptureTimestamp;

/// Build the exiftool arguments that write `values` in place.
///
/// Strategy:
/// 1. Blank fields are not passed at all (an empty `-Tag=` would delete the tag)
/// 2. The keyword uses `+=` so it is appended to the existing list
/// 3. A capture time also sets `SubSecTimeOriginal` (cleared when there is no
///    fraction) and, when a zone was given, `OffsetTimeOriginal`
/// 4. `-overwrite_original` replaces the file instead of keeping `<name>_original`
///
/// The file path itself is appended by the caller.
///
/// ```rust
/// use exif_tagger::exif::{write_args, TagValues};
///
/// let args = write_args(&TagValues { keyword: "beach".into(), ..Default::default() });
/// assert_eq!(args, ["-Keywords+=beach", "-overwrite_original"]);
/// ```
pub fn write_args(values: &TagValues) -> Vec<String> {
    let mut args = Vec::new();

    let subject = values.hierarchical_subject.trim();
    if !subject.is_empty() {
        args.push(format!("-HierarchicalSubject={subject}"));
    }

    let keyword = values.keyword.trim();
    if !keyword.is_empty() {
        args.push(format!("-Keywords+={keyword}"));
    }

    // Descriptions may legitimately span lines; only drop surrounding blanks.
    let description = values.description.trim();
    if !description.is_empty() {
        args.push(format!("-Description={description}"));
    }

    let date_time = values.date_time_original.trim();
    if !date_time.is_empty() {
        match CaptureTimestamp::parse(date_time) {
            Some(ts) => {
                args.push(format!("-DateTimeOriginal={}", ts.exif_date_time()));
                let frac = ts.sub_seconds().unwrap_or_default();
                args.push(format!("-SubSecTimeOriginal={frac}"));
                if let Some(offset) = ts.offset() {
                    args.push(format!("-OffsetTimeOriginal={offset}"));
                }
            }
            None => {
                // exiftool has its own date parsing; let it decide.
                log::debug!("Passing unrecognised date/time through verbatim: {date_time}");
                args.push(format!("-DateTimeOriginal={date_time}"));
            }
        }
    }

    args.push("-overwrite_original".to_string());
    args
}
