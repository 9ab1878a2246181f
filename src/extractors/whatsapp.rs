//! WhatsApp Web group member extractor
//!
//! Group info renders members in a virtualized modal. Saved contacts show a
//! name only; unknown numbers show the phone and an optional `~ pushname`.
//! One member row may carry several numbers, each becoming its own lead.

use scraper::{ElementRef, Selector};

use super::filters::{has_letter, is_audio_label, is_placeholder_name, is_short_name, phone_runs};
use super::profile::{ExtractContext, Extractor, ListProfile, owned};
use super::selectors::{FieldSelector, parse_all};
use crate::leads::{LeadKind, LeadRecord, Platform, SkipReason, looks_like_phone, normalize_phone};
use crate::scroll::{ListSelectors, LoadMore};
use crate::utils::{clean_display_name, collapse_whitespace};

pub struct GroupMembersExtractor {
    profile: ListProfile,
    member: Vec<Selector>,
    media: Vec<Selector>,
    phone_title: FieldSelector,
    phone_text: FieldSelector,
    name: FieldSelector,
}

impl GroupMembersExtractor {
    #[must_use]
    pub fn new() -> Self {
        let profile = ListProfile {
            list: ListSelectors {
                // Empty: the surface falls back to the first item's scrollable ancestor
                container: Vec::new(),
                items: owned(&[
                    r#"div[data-animate-modal-popup="true"] [role="listitem"]"#,
                    r#"[role="listitem"]"#,
                ]),
                load_more: vec![
                    LoadMore::new(&[r#"div[data-animate-modal-popup="true"] button"#])
                        .with_text("ancien|older|past|previous|more"),
                ],
            },
            prepare: vec![owned(&[
                r#"div[title="View all"]"#,
                r#"div[role="button"][aria-label*="members"]"#,
            ])],
            expected_total: owned(&[
                r#"div[data-animate-modal-popup="true"] header"#,
                r#"header span[title]"#,
                "header",
            ]),
            context_label: owned(&["._alcd", r#"[role="heading"]"#, "header span[title]"]),
            enrich: false,
        };
        Self {
            profile,
            member: parse_all("member", &[r#"div[role="button"]"#]),
            media: parse_all(
                "media",
                &[r#"[data-testid^="msg-audio"]"#, r#"[data-testid^="msg-video"]"#, r#"[data-icon="audio-play"]"#],
            ),
            phone_title: FieldSelector::attr("phone", &["span[title]"], "title"),
            phone_text: FieldSelector::text("phone", &["span", r#"[role="gridcell"]"#]),
            name: FieldSelector::text(
                "name",
                &[
                    ".copyable-text",
                    r#"[data-testid="selectable-text"]"#,
                    r#"[aria-colindex="2"]"#,
                    r#"[role="gridcell"]"#,
                ],
            ),
        }
    }

    fn member_scope<'a>(&self, item: ElementRef<'a>) -> ElementRef<'a> {
        self.member
            .iter()
            .find_map(|sel| item.select(sel).next())
            .unwrap_or(item)
    }

    /// Normalized numbers in first-seen order
    fn phones(&self, scope: ElementRef<'_>) -> Vec<String> {
        let mut sources = self.phone_title.all(scope);
        sources.extend(self.phone_text.all(scope));
        sources.extend(scope.text().map(str::to_string));

        let mut phones: Vec<String> = Vec::new();
        for source in &sources {
            for run in phone_runs(source) {
                if let Some(phone) = normalize_phone(&run)
                    && !phones.contains(&phone)
                {
                    phones.push(phone);
                }
            }
        }
        phones
    }

    /// First label that reads like a name rather than a number
    fn display_name(&self, scope: ElementRef<'_>) -> Option<String> {
        let is_name = |s: &str| has_letter(s) && !looks_like_phone(s);
        self.name
            .all(scope)
            .into_iter()
            .find(|s| is_name(s))
            .or_else(|| {
                scope
                    .text()
                    .map(collapse_whitespace)
                    .find(|s| is_name(s))
            })
            .map(|s| {
                clean_display_name(&s)
                    .trim_start_matches(['~', ' '])
                    .to_string()
            })
            .filter(|s| !s.is_empty())
    }
}

impl Default for GroupMembersExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for GroupMembersExtractor {
    fn platform(&self) -> Platform {
        Platform::WhatsApp
    }

    fn kind(&self) -> LeadKind {
        LeadKind::GroupMembership
    }

    fn profile(&self) -> &ListProfile {
        &self.profile
    }

    fn extract(&self, item: ElementRef<'_>, ctx: &ExtractContext) -> Result<Vec<LeadRecord>, SkipReason> {
        let scope = self.member_scope(item);
        let label = collapse_whitespace(&scope.text().collect::<Vec<_>>().join(" "));
        if is_audio_label(&label) || self.media.iter().any(|sel| scope.select(sel).next().is_some()) {
            return Err(SkipReason::Audio);
        }

        let phones = self.phones(scope);
        let name = self.display_name(scope).unwrap_or_default();

        if phones.is_empty() {
            if is_placeholder_name(&name) {
                return Err(SkipReason::Placeholder);
            }
            if is_short_name(&name) {
                return Err(SkipReason::ShortName);
            }
            return Ok(vec![ctx.record(name)]);
        }

        Ok(phones
            .into_iter()
            .map(|phone| {
                let display = if name.is_empty() { phone.clone() } else { name.clone() };
                ctx.record(display).with_phone(phone)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::IdentityKey;
    use scraper::Html;

    fn item(html: &Html) -> ElementRef<'_> {
        html.root_element()
            .children()
            .find_map(ElementRef::wrap)
            .expect("item element")
    }

    fn ctx() -> ExtractContext {
        let mut ctx = ExtractContext::new(Platform::WhatsApp, LeadKind::GroupMembership, "https://web.whatsapp.com/");
        ctx.group_name = Some("Founders".into());
        ctx
    }

    #[test]
    fn unknown_number_with_pushname() {
        let html = Html::parse_fragment(
            r#"<div role="listitem"><div role="button">
                 <span title="+33 6 12 34 56 78">+33 6 12 34 56 78</span>
                 <span class="copyable-text">~ Marie 🌸</span>
               </div></div>"#,
        );
        let records = GroupMembersExtractor::new().extract(item(&html), &ctx()).expect("member");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Marie");
        assert_eq!(records[0].phone.as_deref(), Some("+33612345678"));
        assert_eq!(records[0].group_name.as_deref(), Some("Founders"));
    }

    #[test]
    fn saved_contact_keyed_by_name() {
        let html = Html::parse_fragment(
            r#"<div role="listitem"><div role="button"><span title="Paul Martin">Paul Martin</span></div></div>"#,
        );
        let records = GroupMembersExtractor::new().extract(item(&html), &ctx()).expect("member");
        assert_eq!(records[0].name, "Paul Martin");
        assert!(records[0].phone.is_none());
        assert_eq!(records[0].identity_key(), Some(IdentityKey::Name("paul martin".into())));
    }

    #[test]
    fn several_numbers_become_several_records() {
        let html = Html::parse_fragment(
            r#"<div role="listitem"><span>+44 7700 900123</span><span>+1 555 010 9999</span></div>"#,
        );
        let records = GroupMembersExtractor::new().extract(item(&html), &ctx()).expect("member");
        let phones: Vec<_> = records.iter().filter_map(|r| r.phone.clone()).collect();
        assert_eq!(phones, vec!["+447700900123", "+15550109999"]);
    }

    #[test]
    fn drops_audio_and_short_rows() {
        let ex = GroupMembersExtractor::new();
        let audio = Html::parse_fragment(r#"<div role="listitem"><span>Voice note 0:12</span></div>"#);
        assert_eq!(ex.extract(item(&audio), &ctx()), Err(SkipReason::Audio));
        let short = Html::parse_fragment(r#"<div role="listitem"><span>J</span></div>"#);
        assert_eq!(ex.extract(item(&short), &ctx()), Err(SkipReason::ShortName));
    }
}
