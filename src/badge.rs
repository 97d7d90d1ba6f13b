use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::warn;

/// The view count is the text of the badge's 4th `<text>` element.
const COUNT_TEXT_INDEX: usize = 4;

/// Extract the view count from a profile-views badge, e.g. `1,234` → 1234.
/// Returns `None` when the badge has no numeric 4th `<text>` element or
/// cannot be read up to it.
pub fn parse_profile_views(svg: &str) -> Option<u64> {
    let mut reader = Reader::from_str(svg);
    let mut text_count = 0usize;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                warn!("Stopped reading malformed profile views badge: {e}");
                return None;
            }
        };

        match event {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"text" => {
                text_count += 1;
            }
            Event::Text(t) if text_count == COUNT_TEXT_INDEX => {
                let text = match t.unescape() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Invalid text in profile views badge: {e}");
                        return None;
                    }
                };
                if let Ok(value) = text.trim().replace(',', "").parse::<u64>() {
                    return Some(value);
                }
            }
            Event::Eof => return None,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BADGE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="140" height="20">
  <g fill="#fff" text-anchor="middle" font-size="11">
    <text x="45" y="15" fill="#010101" fill-opacity=".3">Profile views</text>
    <text x="45" y="14">Profile views</text>
    <text x="110" y="15" fill="#010101" fill-opacity=".3">12,345</text>
    <text x="110" y="14">12,345</text>
  </g>
</svg>"##;

    #[test]
    fn reads_fourth_text_element() {
        assert_eq!(parse_profile_views(BADGE), Some(12345));
    }

    #[test]
    fn missing_count_is_none() {
        let svg = r#"<svg><text>Profile views</text><text>oops</text></svg>"#;
        assert_eq!(parse_profile_views(svg), None);
    }

    #[test]
    fn skips_non_numeric_text_until_a_number() {
        let svg = r#"<svg><text>a</text><text>b</text><text>c</text><text><tspan>views:</tspan> 7</text></svg>"#;
        assert_eq!(parse_profile_views(svg), Some(7));
    }

    #[test]
    fn malformed_badge_is_none() {
        let mismatched = "<svg><text>a</text><text>b</text><text>c</text><g></svg>";
        assert_eq!(parse_profile_views(mismatched), None);

        let unknown_entity =
            "<svg><text>a</text><text>b</text><text>c</text><text>&nbsp;5</text></svg>";
        assert_eq!(parse_profile_views(unknown_entity), None);
    }
}
