//! Prints every page of a local menu PDF, to find which page holds which menu.

use std::fs;

use anyhow::Context;
use noon_menu_bot::pdf::{extract_pages, extract_text, page_count};

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .context("usage: inspect-menu <menu.pdf>")?;
    let bytes = fs::read(&path).with_context(|| format!("reading {path}"))?;

    let pages = page_count(&bytes)?;
    println!("{path}: {pages} pages");

    for index in 0..pages {
        let page = extract_pages(&bytes, &[index])?;
        println!("=== PAGE {index} ===");
        match extract_text(&page) {
            Ok(text) => {
                for (i, line) in text.lines().enumerate() {
                    if !line.trim().is_empty() {
                        println!("{}: {:?}", i, line);
                    }
                }
            }
            Err(e) => println!("(no text: {e})"),
        }
    }

    Ok(())
}
