//! Extract job listings from a rendered search page.
//!
//! The browser hands over a snapshot of the rendered DOM (`outerHTML` plus
//! the page URL); everything from there on is parsed here with the `scraper`
//! crate. Detail links are visited in document order, each one is mapped to
//! its nearest listing container, and the container is mined for title,
//! description, meta fragments, skills, and classifier fields.

use crate::classify::{self, ClientInfo};
use crate::types::{JobRecord, NO_TITLE};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Substring every job detail URL contains.
pub const DETAIL_LINK_MARKER: &str = "/jobs/~";

/// Maximum number of fragments joined into the `meta` string.
pub const MAX_META_FRAGMENTS: usize = 15;

/// Delimiter between `meta` fragments.
pub const META_DELIMITER: &str = " | ";

/// A listing before it is numbered and timestamped.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCard {
    pub title: String,
    pub url: String,
    pub description: String,
    pub meta: String,
    pub budget: String,
    pub experience_level: String,
    pub posted: String,
    pub skills: Vec<String>,
    pub client_info: String,
}

struct Selectors {
    link: Selector,
    heading: Selector,
    description: Selector,
    fragments: Selector,
    labels: Selector,
    skills: Selector,
    budget: Selector,
    experience: Selector,
    posted: Selector,
    payment: Selector,
    rating: Selector,
    spent: Selector,
    location: Selector,
}

impl Selectors {
    fn new() -> Self {
        let parse = |css: &str| Selector::parse(css).expect("static selector is valid");
        Self {
            link: parse(r#"a[href*="/jobs/"]"#),
            heading: parse("h3, h4"),
            description: parse(
                r#"[data-test="UpCLineClamp JobDescription"] p, [data-test="job-description-text"], .air3-line-clamp p"#,
            ),
            fragments: parse("li, small, span"),
            labels: parse("li, small, span, strong"),
            skills: parse(r#"[data-test="token"] span, .air3-token span"#),
            budget: parse(
                r#"[data-test="job-type-label"], [data-test="is-fixed-price"], [data-test="budget"]"#,
            ),
            experience: parse(r#"[data-test="experience-level"], [data-test="contractor-tier"]"#),
            posted: parse(r#"[data-test="job-pubilshed-date"], [data-test="posted-on"]"#),
            payment: parse(
                r#"[data-test="payment-verified"], [data-test="payment-verification-status"]"#,
            ),
            rating: parse(
                r#".air3-rating-value-text, [data-test="client-rating"], [data-test="total-feedback"]"#,
            ),
            spent: parse(r#"[data-test="total-spent"], [data-test="client-spendings"]"#),
            location: parse(r#"[data-test="location"], [data-test="client-country"]"#),
        }
    }
}

/// Extract at most `max_jobs` listings from `html`, in document order and
/// deduplicated by absolute URL.
///
/// Relative hrefs are resolved against `page_url`. Links that do not point
/// at a job detail page are skipped. Missing fields become sentinels.
pub fn extract_jobs(html: &str, page_url: &str, max_jobs: usize) -> Vec<JobCard> {
    if max_jobs == 0 {
        return Vec::new();
    }

    let document = Html::parse_document(html);
    let sel = Selectors::new();
    let base = Url::parse(page_url).ok();

    let mut seen = HashSet::new();
    let mut cards = Vec::new();

    for link in document.select(&sel.link) {
        let Some(url) = resolve_href(&link, base.as_ref()) else {
            continue;
        };
        if !url.contains(DETAIL_LINK_MARKER) || !seen.insert(url.clone()) {
            continue;
        }

        let container = listing_container(link);
        cards.push(build_card(link, container, url, &sel));

        if cards.len() >= max_jobs {
            break;
        }
    }

    cards
}

/// Number and timestamp a batch of cards.
pub fn finalize(cards: Vec<JobCard>, scraped_at: DateTime<Utc>) -> Vec<JobRecord> {
    cards
        .into_iter()
        .enumerate()
        .map(|(idx, card)| JobRecord {
            id: idx as u32 + 1,
            title: card.title,
            url: card.url,
            description: card.description,
            meta: card.meta,
            budget: card.budget,
            experience_level: card.experience_level,
            posted: card.posted,
            skills: card.skills,
            client_info: card.client_info,
            scraped_at,
        })
        .collect()
}

fn resolve_href(link: &ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    let href = link.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    match base {
        Some(base) => base.join(href).ok().map(|u| u.to_string()),
        None => Url::parse(href).ok().map(|u| u.to_string()),
    }
}

/// Nearest `article` ancestor, else `section`, else `div`.
fn listing_container(link: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let ancestors: Vec<ElementRef<'_>> = link.ancestors().filter_map(ElementRef::wrap).collect();
    ["article", "section", "div"].iter().find_map(|tag| {
        ancestors
            .iter()
            .copied()
            .find(|el| el.value().name() == *tag)
    })
}

fn build_card(
    link: ElementRef<'_>,
    container: Option<ElementRef<'_>>,
    url: String,
    sel: &Selectors,
) -> JobCard {
    let first_text = |selector: &Selector| -> Option<String> {
        container?
            .select(selector)
            .map(|el| element_text(&el))
            .find(|t| !t.is_empty())
    };
    let all_texts = |selector: &Selector| -> Vec<String> {
        container
            .map(|root| {
                root.select(selector)
                    .map(|el| element_text(&el))
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    };

    let title = Some(element_text(&link))
        .filter(|t| !t.is_empty())
        .or_else(|| first_text(&sel.heading))
        .unwrap_or_else(|| NO_TITLE.to_string());

    let description = first_text(&sel.description).unwrap_or_default();

    let meta = all_texts(&sel.fragments)
        .into_iter()
        .take(MAX_META_FRAGMENTS)
        .collect::<Vec<_>>()
        .join(META_DELIMITER);

    let skills = all_texts(&sel.skills);
    let labels = all_texts(&sel.labels);

    let budget = classify::budget(first_text(&sel.budget).as_deref(), &labels);
    let experience_level =
        classify::experience_level(first_text(&sel.experience).as_deref(), &labels);
    let posted = classify::posted(first_text(&sel.posted).as_deref(), &labels);
    let client_info = ClientInfo::from_raw(
        first_text(&sel.payment).as_deref(),
        first_text(&sel.rating).as_deref(),
        first_text(&sel.spent).as_deref(),
        first_text(&sel.location).as_deref(),
    )
    .to_string();

    JobCard {
        title,
        url,
        description,
        meta,
        budget,
        experience_level,
        posted,
        skills,
        client_info,
    }
}

/// Text content with runs of whitespace collapsed to single spaces.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
