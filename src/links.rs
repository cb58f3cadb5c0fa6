use std::sync::OnceLock;

use anyhow::Context;
use chrono::NaiveDate;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::calendar::{week_marker, weekday_marker};
use crate::config::Config;
use crate::error::MenuError;

/// An anchor scraped from the menu listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLink {
    /// Anchor text, whitespace collapsed.
    pub text: String,
    /// The `href` attribute exactly as written in the page.
    pub href: String,
    /// `href` resolved against the listing page.
    pub url: Url,
}

impl MenuLink {
    fn matches(&self, week_marker: &str, weekday_marker: &str) -> bool {
        let contains_both = |haystack: &str| {
            let haystack = haystack.to_lowercase();
            haystack.contains(week_marker) && haystack.contains(weekday_marker)
        };
        contains_both(&self.href) || contains_both(&self.text)
    }
}

fn anchor_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(e) => panic!("Error parsing static selector a[href]: {e:?}"),
    })
}

pub async fn fetch_listing_page(client: &Client, url: &Url) -> anyhow::Result<String> {
    let resp = client
        .get(url.clone())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(resp)
}

/// Every link on the page in document order.
pub fn extract_links(html: &str, base: &Url) -> Vec<MenuLink> {
    let doc = Html::parse_document(html);

    let mut links = Vec::new();
    for element in doc.select(anchor_selector()) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let url = match base.join(href) {
            Ok(url) => url,
            Err(_) => continue,
        };
        let text = element
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");
        links.push(MenuLink {
            text,
            href: href.to_string(),
            url,
        });
    }

    links
}

/// Picks the first link carrying both markers.
///
/// Markers are expected in lower case; hrefs and anchor texts are lowered
/// before comparing.
pub fn select_menu_link<'a>(
    links: &'a [MenuLink],
    week_marker: &str,
    weekday_marker: &str,
) -> Result<&'a MenuLink, MenuError> {
    links
        .iter()
        .find(|link| link.matches(week_marker, weekday_marker))
        .ok_or_else(|| MenuError::LinkNotFound {
            week_marker: week_marker.to_string(),
            weekday_marker: weekday_marker.to_string(),
            candidates: links.iter().map(|link| link.url.to_string()).collect(),
        })
}

pub async fn locate_menu_link(
    client: &Client,
    config: &Config,
    date: NaiveDate,
) -> anyhow::Result<MenuLink> {
    let week = week_marker(date);
    let weekday = weekday_marker(date, config.weekday_style);
    info!(%week, %weekday, url = %config.menu_url, "looking for menu link");

    let html = fetch_listing_page(client, &config.menu_url)
        .await
        .with_context(|| format!("fetching menu listing {}", config.menu_url))?;
    let links = extract_links(&html, &config.menu_url);
    debug!(count = links.len(), "scraped links");

    let link = select_menu_link(&links, &week, &weekday)?;
    Ok(link.clone())
}
