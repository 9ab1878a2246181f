//! LinkedIn list extractors: comments, reactions, connections, followers,
//! and people search results.

use scraper::ElementRef;
use url::Url;

use super::filters::{is_placeholder_name, is_short_name};
use super::profile::{ExtractContext, Extractor, ListProfile, owned};
use super::selectors::{FieldSelector, dedupe_doubled};
use crate::leads::{LeadKind, LeadRecord, Platform, SkipReason};
use crate::scroll::{ListSelectors, LoadMore};
use crate::utils::{clean_display_name, resolve_link};

/// Canonical feed URL of a post
#[must_use]
pub fn post_url(urn: &str) -> String {
    format!("https://www.linkedin.com/feed/update/{}", urn.trim())
}

/// Absolute profile link without tracking query or fragment
fn clean_profile_link(ctx: &ExtractContext, href: &str) -> Option<String> {
    let absolute = resolve_link(ctx.platform.base_url(), href)?;
    let mut url = Url::parse(&absolute).ok()?;
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

/// Selector chains for the person block every LinkedIn row shares
struct PersonFields {
    name: FieldSelector,
    link: FieldSelector,
    picture: FieldSelector,
    caption: FieldSelector,
}

impl PersonFields {
    fn read(&self, item: ElementRef<'_>, ctx: &ExtractContext) -> Result<LeadRecord, SkipReason> {
        let name = self
            .name
            .first(item)
            .map(|n| clean_display_name(&dedupe_doubled(&n)))
            .unwrap_or_default();
        if is_placeholder_name(&name) {
            return Err(SkipReason::Placeholder);
        }
        let link = self
            .link
            .first(item)
            .and_then(|href| clean_profile_link(ctx, &href));

        match (&link, is_short_name(&name)) {
            (None, true) if name.is_empty() => return Err(SkipReason::InvalidIdentity),
            (None, true) => return Err(SkipReason::ShortName),
            _ => {}
        }

        let mut record = ctx.record(name);
        record.profile_link = link;
        record.picture = self.picture.first(item);
        record.caption = self.caption.first(item).map(|c| dedupe_doubled(&c));
        Ok(record)
    }
}

/// People who commented on a post
pub struct CommentsExtractor {
    profile: ListProfile,
    person: PersonFields,
    text: FieldSelector,
}

impl CommentsExtractor {
    #[must_use]
    pub fn new() -> Self {
        let profile = ListProfile {
            list: ListSelectors {
                container: Vec::new(),
                items: owned(&[
                    r#"div[data-view-name="comment-container"]"#,
                    "article.comments-comment-entity",
                    r#"div[data-id^="comment-"]"#,
                    "div.comments-comment-item",
                    "li.comments-comment-item",
                ]),
                load_more: vec![LoadMore::new(&[
                    ".comments-comment-list__load-more-container button",
                    r#"button[data-view-name="more-comments"]"#,
                    "button.comments-comments-list__load-more-comments-button",
                ])],
            },
            prepare: vec![owned(&[
                r#"button[data-view-name="feed-comment-button"]"#,
                "button.comment-button",
                ".social-details-social-counts__comments button",
            ])],
            expected_total: owned(&[
                ".social-details-social-counts__comments",
                r#"button[aria-label*="comment"]"#,
            ]),
            context_label: Vec::new(),
            enrich: true,
        };
        Self {
            profile,
            person: PersonFields {
                name: FieldSelector::text(
                    "name",
                    &[
                        r#"a[data-view-name="comment-actor-description"] p"#,
                        "h3.comments-comment-meta__description span",
                        "span.comments-comment-meta__description-title",
                        ".comments-post-meta__name-text",
                    ],
                ),
                link: FieldSelector::attr(
                    "profileLink",
                    &[
                        r#"a[data-view-name="comment-actor-description"]"#,
                        ".comments-comment-meta__actor a",
                        "a.comments-post-meta__actor-link",
                        r#"a[href*="/in/"]"#,
                    ],
                    "href",
                ),
                picture: FieldSelector::attr(
                    "picture",
                    &[
                        r#"a[data-view-name="comment-actor-picture"] figure img"#,
                        ".ivm-view-attr__img-wrapper img",
                    ],
                    "src",
                ),
                caption: FieldSelector::text(
                    "caption",
                    &[
                        r#"a[data-view-name="comment-actor-description"] p:nth-of-type(2)"#,
                        ".comments-comment-meta__description-subtitle",
                        ".comments-post-meta__headline",
                    ],
                ),
            },
            text: FieldSelector::text(
                "text",
                &[
                    r#"p[data-view-name="comment-commentary"]"#,
                    ".update-components-text",
                    ".comments-comment-item__main-content",
                ],
            ),
        }
    }
}

impl Default for CommentsExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for CommentsExtractor {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    fn kind(&self) -> LeadKind {
        LeadKind::Comment
    }

    fn profile(&self) -> &ListProfile {
        &self.profile
    }

    fn extract(&self, item: ElementRef<'_>, ctx: &ExtractContext) -> Result<Vec<LeadRecord>, SkipReason> {
        let mut record = self.person.read(item, ctx)?;
        record.text = self.text.first(item);
        Ok(vec![record])
    }
}

/// People who reacted to a post, read from the reactions dialog
pub struct ReactionsExtractor {
    profile: ListProfile,
    person: PersonFields,
    reaction: FieldSelector,
    reaction_alt: FieldSelector,
}

impl ReactionsExtractor {
    #[must_use]
    pub fn new() -> Self {
        let profile = ListProfile {
            list: ListSelectors {
                container: owned(&[
                    "div.artdeco-modal__content",
                    ".social-details-reactors-modal__content",
                    r#"[role="dialog"] .scaffold-finite-scroll__content"#,
                ]),
                items: owned(&[
                    r#"[data-view-name="view-likers"]"#,
                    "li.social-details-reactors-tab-body-list-item",
                    "ul.artdeco-list li",
                    "li.artdeco-list__item",
                ]),
                load_more: vec![LoadMore::new(&[
                    "button.scaffold-finite-scroll__load-button",
                    "._6f7bab93.e363551a button",
                ])],
            },
            prepare: vec![owned(&[
                "button.social-details-social-counts__count-value",
                "button[data-reaction-details]",
                "li.social-details-social-counts__reactions button",
            ])],
            expected_total: owned(&[
                "button.social-details-social-counts__count-value",
                ".social-details-social-counts__reactions-count",
            ]),
            context_label: Vec::new(),
            enrich: true,
        };
        Self {
            profile,
            person: PersonFields {
                name: FieldSelector::text(
                    "name",
                    &[
                        "span.text-view-model",
                        "p:nth-of-type(1)",
                        r#"div.artdeco-entity-lockup__title span[aria-hidden="true"]"#,
                        "div.artdeco-entity-lockup__title",
                    ],
                ),
                link: FieldSelector::attr("profileLink", &["a[href]"], "href"),
                picture: FieldSelector::attr(
                    "picture",
                    &["div.ivm-image-view-model > div > img", "img:not(.reactions-icon)"],
                    "src",
                ),
                caption: FieldSelector::text(
                    "caption",
                    &[
                        "div.artdeco-entity-lockup__caption",
                        "p:nth-of-type(2)",
                        "span.text-view-model--secondary",
                    ],
                ),
            },
            reaction: FieldSelector::attr(
                "reactionType",
                &["img.reactions-icon[data-test-reactions-icon-type]"],
                "data-test-reactions-icon-type",
            ),
            reaction_alt: FieldSelector::attr("reactionType", &["img.reactions-icon[alt]"], "alt"),
        }
    }
}

impl Default for ReactionsExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for ReactionsExtractor {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    fn kind(&self) -> LeadKind {
        LeadKind::Reaction
    }

    fn profile(&self) -> &ListProfile {
        &self.profile
    }

    fn extract(&self, item: ElementRef<'_>, ctx: &ExtractContext) -> Result<Vec<LeadRecord>, SkipReason> {
        let mut record = self.person.read(item, ctx)?;
        record.reaction_type = self
            .reaction
            .first(item)
            .or_else(|| self.reaction_alt.first(item))
            .map(|r| r.to_ascii_uppercase());
        Ok(vec![record])
    }
}

/// "My Network" connections or a followers page
pub struct NetworkListExtractor {
    kind: LeadKind,
    profile: ListProfile,
    person: PersonFields,
}

impl NetworkListExtractor {
    #[must_use]
    pub fn connections() -> Self {
        Self::build(LeadKind::Connection)
    }

    #[must_use]
    pub fn followers() -> Self {
        Self::build(LeadKind::Follower)
    }

    fn build(kind: LeadKind) -> Self {
        let profile = ListProfile {
            list: ListSelectors {
                container: Vec::new(),
                items: owned(&[
                    "li.reusable-search__result-container",
                    r#"div[data-view-name="search-entity-result-universal-template"]"#,
                    "li.mn-connection-card",
                ]),
                load_more: vec![LoadMore::new(&["button.scaffold-finite-scroll__load-button"])],
            },
            prepare: Vec::new(),
            expected_total: owned(&["header h1", ".mn-connections__header h1", "h1", "h2"]),
            context_label: Vec::new(),
            enrich: true,
        };
        Self {
            kind,
            profile,
            person: PersonFields {
                name: FieldSelector::text(
                    "name",
                    &[
                        r#"a[data-test-app-aware-link] span[aria-hidden="true"]"#,
                        "a[data-test-app-aware-link] span",
                        ".mn-connection-card__name",
                    ],
                ),
                link: FieldSelector::attr(
                    "profileLink",
                    &[
                        "a[data-test-app-aware-link]",
                        "a.mn-connection-card__link",
                        r#"a[href*="/in/"]"#,
                    ],
                    "href",
                ),
                picture: FieldSelector::attr(
                    "picture",
                    &[".ivm-view-attr__img-wrapper img", "img.presence-entity__image"],
                    "src",
                ),
                caption: FieldSelector::text(
                    "caption",
                    &[
                        ".entity-result__primary-subtitle",
                        ".mn-connection-card__occupation",
                        "div.t-14.t-black.t-normal",
                    ],
                ),
            },
        }
    }
}

impl Extractor for NetworkListExtractor {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    fn kind(&self) -> LeadKind {
        self.kind
    }

    fn profile(&self) -> &ListProfile {
        &self.profile
    }

    fn extract(&self, item: ElementRef<'_>, ctx: &ExtractContext) -> Result<Vec<LeadRecord>, SkipReason> {
        let record = self.person.read(item, ctx)?;
        if record.profile_link.is_none() {
            return Err(SkipReason::InvalidIdentity);
        }
        Ok(vec![record])
    }
}

/// People search results; the "next page" button acts as load-more
pub struct SearchPeopleExtractor {
    profile: ListProfile,
    person: PersonFields,
    location: FieldSelector,
    first_label: FieldSelector,
}

impl SearchPeopleExtractor {
    #[must_use]
    pub fn new() -> Self {
        let profile = ListProfile {
            list: ListSelectors {
                container: Vec::new(),
                items: owned(&[
                    r#"div[data-view-name="people-search-result"]"#,
                    "li.reusable-search__result-container",
                ]),
                load_more: vec![LoadMore::new(&[
                    ".artdeco-pagination ul > li.active + li button",
                    "button.artdeco-pagination__button--next",
                    r#"button[data-testid="pagination-controls-next-button-visible"]"#,
                ])],
            },
            prepare: Vec::new(),
            expected_total: owned(&[".search-results-container h2", "h2.pb2", "main h2"]),
            context_label: Vec::new(),
            enrich: true,
        };
        Self {
            profile,
            person: PersonFields {
                name: FieldSelector::text(
                    "name",
                    &[
                        r#"a[data-test-app-aware-link] span[aria-hidden="true"]"#,
                        "a[data-test-app-aware-link] span",
                        r#"div[data-view-name="search-entity-result-universal-template"] h3"#,
                        r#"p a[data-view-name="search-result-lockup-title"]"#,
                    ],
                ),
                link: FieldSelector::attr(
                    "profileLink",
                    &[
                        "a[data-test-app-aware-link]",
                        r#"p a[data-view-name="search-result-lockup-title"]"#,
                        r#"a[href*="/in/"]"#,
                    ],
                    "href",
                ),
                picture: FieldSelector::attr(
                    "picture",
                    &[".ivm-view-attr__img-wrapper img", "figure img"],
                    "src",
                ),
                caption: FieldSelector::text(
                    "caption",
                    &[".entity-result__primary-subtitle", "p:nth-of-type(2)"],
                ),
            },
            location: FieldSelector::text(
                "location",
                &[".entity-result__secondary-subtitle", "p:nth-of-type(3)"],
            ),
            first_label: FieldSelector::text("label", &["p", "a"]),
        }
    }
}

impl Default for SearchPeopleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for SearchPeopleExtractor {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    fn kind(&self) -> LeadKind {
        LeadKind::SearchPerson
    }

    fn profile(&self) -> &ListProfile {
        &self.profile
    }

    fn extract(&self, item: ElementRef<'_>, ctx: &ExtractContext) -> Result<Vec<LeadRecord>, SkipReason> {
        if item.value().attr("data-view-name") == Some("premium-upsell-card") {
            return Err(SkipReason::Placeholder);
        }
        if self
            .first_label
            .first(item)
            .is_some_and(|label| is_placeholder_name(&label))
        {
            return Err(SkipReason::Placeholder);
        }
        let mut record = self.person.read(item, ctx)?;
        record.location = self.location.first(item);
        Ok(vec![record])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn item(html: &Html) -> ElementRef<'_> {
        html.root_element()
            .children()
            .find_map(ElementRef::wrap)
            .expect("item element")
    }

    fn ctx(kind: LeadKind) -> ExtractContext {
        ExtractContext::new(Platform::LinkedIn, kind, "https://www.linkedin.com/feed/update/urn:li:activity:1")
    }

    #[test]
    fn extracts_comment_author_and_text() {
        let html = Html::parse_fragment(
            r#"<div data-view-name="comment-container">
                 <a data-view-name="comment-actor-picture" href="/in/jane/"><figure><img src="https://img/jane.jpg"></figure></a>
                 <a data-view-name="comment-actor-description" href="/in/jane/?trk=c">
                   <p>Jane Doe</p><p>Head of Growth at Acme</p>
                 </a>
                 <p data-view-name="comment-commentary">Great post!</p>
               </div>"#,
        );
        let records = CommentsExtractor::new()
            .extract(item(&html), &ctx(LeadKind::Comment))
            .expect("comment");
        let r = &records[0];
        assert_eq!(r.name, "Jane Doe");
        assert_eq!(r.profile_link.as_deref(), Some("https://www.linkedin.com/in/jane/"));
        assert_eq!(r.caption.as_deref(), Some("Head of Growth at Acme"));
        assert_eq!(r.text.as_deref(), Some("Great post!"));
        assert_eq!(r.picture.as_deref(), Some("https://img/jane.jpg"));
    }

    #[test]
    fn extracts_reaction_type() {
        let html = Html::parse_fragment(
            r#"<li class="social-details-reactors-tab-body-list-item">
                 <a href="https://www.linkedin.com/in/bob">
                   <div class="artdeco-entity-lockup__title">Bob Martin</div>
                   <div class="artdeco-entity-lockup__caption">CTO</div>
                   <img class="reactions-icon" data-test-reactions-icon-type="praise" src="r.svg">
                 </a>
               </li>"#,
        );
        let records = ReactionsExtractor::new()
            .extract(item(&html), &ctx(LeadKind::Reaction))
            .expect("reaction");
        assert_eq!(records[0].name, "Bob Martin");
        assert_eq!(records[0].reaction_type.as_deref(), Some("PRAISE"));
        assert_eq!(records[0].caption.as_deref(), Some("CTO"));
        assert!(records[0].picture.is_none());
    }

    #[test]
    fn skips_anonymized_search_results() {
        let html = Html::parse_fragment(
            r#"<div data-view-name="people-search-result"><p>LinkedIn Member</p></div>"#,
        );
        let err = SearchPeopleExtractor::new()
            .extract(item(&html), &ctx(LeadKind::SearchPerson))
            .expect_err("placeholder");
        assert_eq!(err, SkipReason::Placeholder);
    }

    #[test]
    fn connection_without_link_is_invalid() {
        let html = Html::parse_fragment(
            r#"<li class="reusable-search__result-container"><span>Nobody</span></li>"#,
        );
        let err = NetworkListExtractor::connections()
            .extract(item(&html), &ctx(LeadKind::Connection))
            .expect_err("no link");
        assert_eq!(err, SkipReason::InvalidIdentity);
    }

    #[test]
    fn builds_post_url_from_urn() {
        assert_eq!(
            post_url("urn:li:activity:42"),
            "https://www.linkedin.com/feed/update/urn:li:activity:42"
        );
    }
}
