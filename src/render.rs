use crate::model::LanguageStat;
use crate::stats::Stats;
use std::collections::HashMap;

const DELAY_STEP_MS: u32 = 50;

// Card markup toggled when the profile-views row is shown
const HIDDEN_PROFILE_VIEWS: &str = r#" class="hide-profile-views""#;
const CARD_HEIGHT: &str = r#" height="210""#;
const CARD_HEIGHT_WITH_PROFILE_VIEWS: &str = r#" height="234""#;

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// `12345` → `"12,345"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Replace the first occurrence of `placeholder` only.
fn fill(template: String, placeholder: &str, value: &str) -> String {
    template.replacen(placeholder, value, 1)
}

pub fn render_overview(template: &str, stats: &Stats) -> String {
    let mut out = fill(template.to_string(), "{{ name }}", &escape_xml(&stats.name));

    for (placeholder, value) in [
        ("{{ stars }}", stats.stars),
        ("{{ forks }}", stats.forks),
        ("{{ contributions }}", stats.contributions),
        ("{{ lines_changed }}", stats.lines_changed),
        ("{{ repos }}", stats.repos),
        ("{{ views }}", stats.views),
    ] {
        out = fill(out, placeholder, &group_thousands(value));
    }

    if let Some(profile_views) = stats.profile_views {
        out = fill(out, "{{ profile_views }}", &group_thousands(profile_views));
        out = fill(out, HIDDEN_PROFILE_VIEWS, "");
        out = fill(out, CARD_HEIGHT, CARD_HEIGHT_WITH_PROFILE_VIEWS);
    }

    out
}

/// Languages by descending byte size, ties broken by name.
pub fn sort_languages(languages: &HashMap<String, LanguageStat>) -> Vec<(&str, &LanguageStat)> {
    let mut sorted: Vec<(&str, &LanguageStat)> = languages
        .iter()
        .map(|(name, stat)| (name.as_str(), stat))
        .collect();
    sorted.sort_by(|a, b| b.1.size.cmp(&a.1.size).then_with(|| a.0.cmp(b.0)));
    sorted
}

fn build_progress_item(stat: &LanguageStat) -> String {
    format!(
        r#"<span style="background-color: {}; width: {:.3}%;" class="progress-item"></span>"#,
        stat.color, stat.share
    )
}

fn build_lang_row(name: &str, stat: &LanguageStat, delay_ms: u32) -> String {
    format!(
        r#"<li style="animation-delay: {delay_ms}ms;">
<svg xmlns="http://www.w3.org/2000/svg" class="octicon" style="fill:{color};" viewBox="0 0 16 16" version="1.1" width="16" height="16"><path fill-rule="evenodd" d="M8 4a4 4 0 100 8 4 4 0 000-8z"></path></svg>
<span class="lang">{name}</span> <span class="percent">{share:.2}%</span>
</li>
"#,
        color = stat.color,
        name = escape_xml(name),
        share = stat.share
    )
}

pub fn render_languages(
    template: &str,
    languages: &HashMap<String, LanguageStat>,
    include_profile_views: bool,
) -> String {
    let mut progress = String::new();
    let mut lang_list = String::new();
    let mut delay_ms = DELAY_STEP_MS;

    for (name, stat) in sort_languages(languages) {
        progress.push_str(&build_progress_item(stat));
        lang_list.push_str(&build_lang_row(name, stat, delay_ms));
        delay_ms += DELAY_STEP_MS;
    }

    let mut out = fill(template.to_string(), "{{ progress }}", &progress);
    out = fill(out, "{{ lang_list }}", &lang_list);

    if include_profile_views {
        out = fill(out, CARD_HEIGHT, CARD_HEIGHT_WITH_PROFILE_VIEWS);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(size: u64, share: f64, color: &str) -> LanguageStat {
        LanguageStat {
            size,
            occurrences: 1,
            color: color.to_string(),
            share,
        }
    }

    fn stats() -> Stats {
        Stats {
            name: "Octo <Cat>".into(),
            stars: 12345,
            forks: 7,
            contributions: 1_000_000,
            lines_changed: 999,
            repos: 1000,
            views: 0,
            profile_views: None,
        }
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(12345), "12,345");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn fills_each_overview_placeholder_once() {
        let template = "{{ name }}|{{ stars }}|{{ forks }}|{{ contributions }}|\
                        {{ lines_changed }}|{{ repos }}|{{ views }}|{{ stars }}|{{ unknown }}";

        let out = render_overview(template, &stats());

        assert_eq!(
            out,
            "Octo &lt;Cat&gt;|12,345|7|1,000,000|999|1,000|0|{{ stars }}|{{ unknown }}"
        );
    }

    #[test]
    fn profile_views_row_is_revealed_only_when_enabled() {
        let template = r#"<svg height="210"><tr class="hide-profile-views"><td>{{ profile_views }}</td></tr></svg>"#;

        let hidden = render_overview(template, &stats());
        assert_eq!(hidden, template);

        let shown = render_overview(
            template,
            &Stats {
                profile_views: Some(4321),
                ..stats()
            },
        );
        assert_eq!(shown, r#"<svg height="234"><tr><td>4,321</td></tr></svg>"#);
    }

    #[test]
    fn sorts_languages_by_size_then_name() {
        let languages = HashMap::from([
            ("Go".to_string(), lang(10, 0.0, "#00ADD8")),
            ("Rust".to_string(), lang(30, 0.0, "#dea584")),
            ("C".to_string(), lang(10, 0.0, "#555555")),
        ]);

        let names: Vec<&str> = sort_languages(&languages)
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["Rust", "C", "Go"]);
    }

    #[test]
    fn builds_progress_and_rows_in_size_order() {
        let languages = HashMap::from([
            ("Rust".to_string(), lang(75, 75.0, "#dea584")),
            ("Shell".to_string(), lang(25, 25.0, "#89e051")),
        ]);
        let template = r#"<svg height="210"><div>{{ progress }}</div><ul>{{ lang_list }}</ul></svg>"#;

        let out = render_languages(template, &languages, false);

        assert!(out.contains(
            r#"<span style="background-color: #dea584; width: 75.000%;" class="progress-item"></span><span style="background-color: #89e051; width: 25.000%;" class="progress-item"></span>"#
        ));
        let rust = out.find(r#"<span class="lang">Rust</span>"#).unwrap();
        let shell = out.find(r#"<span class="lang">Shell</span>"#).unwrap();
        assert!(rust < shell);
        assert!(out.contains(r#"<li style="animation-delay: 50ms;">"#));
        assert!(out.contains(r#"<li style="animation-delay: 100ms;">"#));
        assert!(out.contains(r#"<span class="percent">75.00%</span>"#));
        assert!(out.contains(r#"height="210""#));
        assert!(!out.contains("{{ progress }}"));
        assert!(!out.contains("{{ lang_list }}"));

        let taller = render_languages(template, &languages, true);
        assert!(taller.contains(r#"height="234""#));
    }

    #[test]
    fn empty_languages_leave_empty_sections() {
        let out = render_languages("[{{ progress }}][{{ lang_list }}]", &HashMap::new(), false);
        assert_eq!(out, "[][]");
    }
}
