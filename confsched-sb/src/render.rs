//! Schedule Rendering
//!
//! Pure functions from the sorted talk and author lists to the final
//! `ScheduleDocument` and its HTML form. No network, no I/O; the binary
//! writes the HTML string to disk.
//!
//! The directory serves text that has been through one mojibake round
//! trip too many, so author and title strings pass through small repair
//! tables before they are emitted.

use crate::types::{
    AuthorIdentity, AuthorIndexEntry, DayGroup, ScheduleDocument, TalkRecord,
};
use confsched_common::config::OutputConfig;
use std::fmt::Write;

/// Intro paragraph used when the configuration provides none
const DEFAULT_INTRO: &str =
    "Here is a schedule of who from our group is presenting at this year's meeting, and when:";

/// Day header format; calendar-day granularity, no clock time
const DAY_HEADER_FORMAT: &str = "%A, %d %B %Y";

/// Mojibake repairs applied to author names
const AUTHOR_REPAIRS: &[(&str, &str)] = &[("Ã±", "ñ"), ("Â", ""), ("Ã§", "ç")];

/// Mojibake repairs applied to titles; also strips embedded line noise
const TITLE_REPAIRS: &[(&str, &str)] = &[
    ("â", "-"),
    ("Ë", "˚"),
    ("\n", ""),
    ("\t", ""),
    ("\r", ""),
    ("Ã", "í"),
];

fn apply_repairs(text: &str, repairs: &[(&str, &str)]) -> String {
    let mut repaired = text.to_string();
    for (from, to) in repairs {
        repaired = repaired.replace(from, to);
    }
    repaired
}

/// Repair a directory-rendered author name
pub fn repair_author_text(text: &str) -> String {
    apply_repairs(text, AUTHOR_REPAIRS)
}

/// Repair a directory-rendered title
pub fn repair_title_text(text: &str) -> String {
    apply_repairs(text, TITLE_REPAIRS)
}

/// Escape text for HTML element and attribute contexts
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Day header for a talk; falls back to the raw date text when the
/// timestamp is absent
fn day_header(talk: &TalkRecord) -> String {
    match talk.canonical_timestamp {
        Some(timestamp) => timestamp.format(DAY_HEADER_FORMAT).to_string(),
        None => talk.raw_date.clone(),
    }
}

/// Build the schedule document from sorted inputs
///
/// A new day group starts whenever a talk's calendar day differs from the
/// previous talk's. The author index lists every identity, talks or not.
/// Never fails; missing optional fields become empty segments.
pub fn build_document(
    talks: &[TalkRecord],
    authors: &[AuthorIdentity],
    output: &OutputConfig,
) -> ScheduleDocument {
    let mut days: Vec<DayGroup> = Vec::new();

    for talk in talks {
        let header = day_header(talk);
        match days.last_mut() {
            Some(group) if group.header == header => group.talks.push(talk.clone()),
            _ => days.push(DayGroup {
                header,
                talks: vec![talk.clone()],
            }),
        }
    }

    let author_index = authors
        .iter()
        .map(|author| AuthorIndexEntry {
            display_name: author.display_name.clone(),
            profile_ref: author.profile_ref.clone(),
        })
        .collect();

    ScheduleDocument {
        intro_text: output
            .intro_text
            .clone()
            .unwrap_or_else(|| DEFAULT_INTRO.to_string()),
        timezone_label: output.timezone_label.clone(),
        days,
        author_index,
    }
}

/// Render the document as an HTML fragment
///
/// Structure, in order: introductory text, the chronologically grouped
/// schedule table (day header rows, then per-talk author / raw time +
/// timezone label / type / title link), and the alphabetical author index
/// with profile links.
pub fn to_html(document: &ScheduleDocument) -> String {
    let mut html = String::new();
    let tz = escape_html(&document.timezone_label);

    let _ = write!(html, "<p>{}</p>", escape_html(&document.intro_text));
    let _ = write!(
        html,
        "<p>Only the first author is listed for each presentation below. \
         All times listed are in {}. Be sure to click through to the talk for more information. \
         Click <a href=\"#section2\">here</a> for the list of all authors.</p>",
        tz
    );

    html.push_str("<table>");
    for day in &document.days {
        let _ = write!(
            html,
            "<tr><td><h1>{}</h1></td></tr>",
            escape_html(&day.header)
        );
        for talk in &day.talks {
            let author = escape_html(&repair_author_text(&talk.first_author_name));
            let title = escape_html(&repair_title_text(&talk.title));
            let url = escape_html(&talk.talk_ref);

            html.push_str("<tr><td>");
            let _ = write!(html, "<strong>{}</strong><br>", author);
            let _ = write!(
                html,
                "<em>{} - {} {}</em>",
                escape_html(&talk.raw_date),
                escape_html(&talk.raw_time),
                tz
            );
            let _ = write!(
                html,
                "<br><em>{}:</em>  <a href=\"{}\" target=\"_blank\">{}</a><br>",
                talk.talk_type, url, title
            );
            html.push_str("</td></tr>");
        }
    }
    html.push_str("</table>");

    html.push_str("<h1 id=\"section2\">List of all authors</h1>");
    html.push_str("<ul>");
    for entry in &document.author_index {
        let _ = write!(
            html,
            "<li><a href=\"{}\">{}</a></li>",
            escape_html(&entry.profile_ref),
            escape_html(&repair_author_text(&entry.display_name))
        );
    }
    html.push_str("</ul>");

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TalkType;
    use chrono::NaiveDate;

    fn output_config() -> OutputConfig {
        OutputConfig {
            timezone_label: "EST".to_string(),
            intro_text: None,
        }
    }

    fn talk_on(day: u32, hour: u32, talk_ref: &str) -> TalkRecord {
        let mut talk = TalkRecord::new(talk_ref, "A Title", TalkType::Talk, "Jane Doe");
        talk.canonical_timestamp = Some(
            NaiveDate::from_ymd_opt(2021, 12, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
        );
        talk.raw_date = format!("{} December 2021", day);
        talk.raw_time = format!("{}:00 - {}:15", hour, hour);
        talk
    }

    #[test]
    fn author_mojibake_is_repaired() {
        assert_eq!(repair_author_text("MuÃ±oz"), "Muñoz");
        assert_eq!(repair_author_text("FranÃ§ois"), "François");
        assert_eq!(repair_author_text("JaneÂ Doe"), "Jane Doe");
    }

    #[test]
    fn title_control_characters_are_stripped() {
        assert_eq!(repair_title_text("Line\none\ttwo\r"), "Lineonetwo");
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(
            escape_html(r#"<b>"x" & 'y'</b>"#),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn day_groups_split_on_calendar_day() {
        let talks = vec![
            talk_on(13, 9, "https://x/1"),
            talk_on(13, 14, "https://x/2"),
            talk_on(17, 9, "https://x/3"),
        ];
        let document = build_document(&talks, &[], &output_config());

        assert_eq!(document.days.len(), 2);
        assert_eq!(document.days[0].header, "Monday, 13 December 2021");
        assert_eq!(document.days[0].talks.len(), 2);
        assert_eq!(document.days[1].header, "Friday, 17 December 2021");
        assert_eq!(document.days[1].talks.len(), 1);
    }

    #[test]
    fn document_carries_intro_and_index() {
        let authors = vec![
            AuthorIdentity::new("Ada Doe", "https://x/P2"),
            AuthorIdentity::new("John Smith", "https://x/P1"),
        ];
        let document = build_document(&[], &authors, &output_config());

        assert_eq!(document.intro_text, DEFAULT_INTRO);
        assert_eq!(document.author_index.len(), 2);
        assert_eq!(document.author_index[0].display_name, "Ada Doe");
        assert_eq!(document.author_index[0].profile_ref, "https://x/P2");
    }

    #[test]
    fn configured_intro_overrides_default() {
        let output = OutputConfig {
            timezone_label: "CST".to_string(),
            intro_text: Some("Our lab at the meeting.".to_string()),
        };
        let document = build_document(&[], &[], &output);
        assert_eq!(document.intro_text, "Our lab at the meeting.");
        assert_eq!(document.timezone_label, "CST");
    }

    #[test]
    fn html_structure_is_intro_schedule_index_in_order() {
        let talks = vec![talk_on(17, 14, "https://x/1")];
        let authors = vec![AuthorIdentity::new("Jane Doe", "https://x/P1")];
        let document = build_document(&talks, &authors, &output_config());
        let html = to_html(&document);

        let intro_at = html.find(DEFAULT_INTRO).unwrap();
        let table_at = html.find("<table>").unwrap();
        let day_at = html.find("Friday, 17 December 2021").unwrap();
        let index_at = html.find("id=\"section2\"").unwrap();

        assert!(intro_at < table_at);
        assert!(table_at < day_at);
        assert!(day_at < index_at);
        assert!(html.contains("<em>Talk:</em>"));
        assert!(html.contains("All times listed are in EST."));
        assert!(html.contains("href=\"https://x/1\""));
        assert!(html.contains("href=\"https://x/P1\""));
    }

    #[test]
    fn missing_fields_render_as_empty_segments() {
        let mut talk = TalkRecord::new("https://x/1", "", TalkType::Event, "");
        talk.canonical_timestamp = Some(
            NaiveDate::from_ymd_opt(2021, 12, 17)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        );
        let document = build_document(&[talk], &[], &output_config());
        let html = to_html(&document);

        // renders without panicking, with empty author/title segments
        assert!(html.contains("<strong></strong>"));
        assert!(html.contains("<em>Event:</em>"));
    }
}
