//! Best-effort check that a fetched script body is really script.
//!
//! CDNs that gate a library behind a membership wall answer with an HTML
//! landing page and a 200 status. Injecting that as a script breaks the
//! page, so the head of the payload is scanned for a few telltale
//! markers. This is a heuristic and says nothing about content types.

pub const SNIFF_PREFIX_CHARS: usize = 200;

pub const HTML_MARKERS: &[&str] = &["<!doctype", "<html", "oops!", "requires-membership"];

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("payload looks like an html page (found {marker:?})")]
pub struct PayloadRejected {
    pub marker: &'static str,
}

pub fn sniff_script_payload(text: &str) -> Result<(), PayloadRejected> {
    let head: String = text
        .chars()
        .take(SNIFF_PREFIX_CHARS)
        .flat_map(char::to_lowercase)
        .collect();
    match HTML_MARKERS.iter().find(|marker| head.contains(*marker)) {
        Some(marker) => Err(PayloadRejected { marker }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_script_passes() {
        assert!(sniff_script_payload("/*! GSAP 3.12 */ !function(t){}(this);").is_ok());
        assert!(sniff_script_payload("").is_ok());
    }

    #[test]
    fn markup_inside_a_script_head_still_trips() {
        assert!(sniff_script_payload("window.gsap = {};\nconsole.log('<html>')").is_err());
    }

    #[test]
    fn doctype_is_case_insensitive() {
        let err = sniff_script_payload("  <!DOCTYPE html><html><body>").expect_err("html");
        assert_eq!(err.marker, "<!doctype");
    }

    #[test]
    fn landing_page_markers() {
        assert_eq!(
            sniff_script_payload("Oops! This plugin requires membership").map_err(|err| err.marker),
            Err("oops!")
        );
        assert_eq!(
            sniff_script_payload("<div class=\"requires-membership\">").map_err(|err| err.marker),
            Err("requires-membership")
        );
    }

    #[test]
    fn markers_past_the_prefix_are_ignored() {
        let mut text = "x".repeat(SNIFF_PREFIX_CHARS);
        text.push_str("<html>");
        assert!(sniff_script_payload(&text).is_ok());

        let mut straddling = "x".repeat(SNIFF_PREFIX_CHARS - 3);
        straddling.push_str("<html>");
        assert!(sniff_script_payload(&straddling).is_ok());
    }

    #[test]
    fn prefix_counts_characters_not_bytes() {
        let mut text = "é".repeat(SNIFF_PREFIX_CHARS - 6);
        text.push_str("<html>");
        assert!(sniff_script_payload(&text).is_err());
    }
}
