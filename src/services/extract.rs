use scraper::{ElementRef, Html, Selector};

use crate::domain::directive::ExtractionDirective;
use crate::domain::page::{FieldValue, ImageEntry, LinkEntry, PageData};

/// Run a directive's extraction over an HTML document. Both fetch
/// strategies funnel through here so a selector means the same thing
/// whether the page was rendered or fetched statically.
pub fn extract_page_data(html: &str, directive: &ExtractionDirective) -> PageData {
    let document = Html::parse_document(html);
    let mut data = PageData::default();

    for (field, selector) in directive.selectors.iter() {
        data.fields
            .insert(field.clone(), select_field(&document, field, selector));
    }

    if directive.extract_text {
        data.all_text = Some(full_text(&document));
    }
    if directive.extract_links {
        data.all_links = Some(collect_links(&document));
    }
    if directive.extract_images {
        data.all_images = Some(collect_images(&document));
    }
    if directive.extract_tables {
        data.all_tables = Some(collect_tables(&document));
    }

    data
}

// Exactly one match -> scalar, several -> list, none -> null. An
// unparsable selector counts as no match.
fn select_field(document: &Html, field: &str, selector: &str) -> FieldValue {
    let selector = match Selector::parse(selector) {
        Ok(parsed) => parsed,
        Err(_) => {
            log::warn!("Unparsable selector {:?} for field {}", selector, field);
            return FieldValue::Null;
        }
    };

    let mut texts: Vec<String> = document.select(&selector).map(element_text).collect();
    match texts.len() {
        0 => FieldValue::Null,
        1 => FieldValue::Scalar(texts.remove(0)),
        _ => FieldValue::List(texts),
    }
}

fn element_text(element: ElementRef) -> String {
    let text: Vec<&str> = element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect();
    text.join(" ")
}

fn full_text(document: &Html) -> String {
    let body_selector = Selector::parse("body").unwrap();
    match document.select(&body_selector).next() {
        Some(body) => element_text(body),
        None => element_text(document.root_element()),
    }
}

fn collect_links(document: &Html) -> Vec<LinkEntry> {
    let link_selector = Selector::parse("a[href]").unwrap();
    document
        .select(&link_selector)
        .filter_map(|a_tag| {
            let href = a_tag.value().attr("href")?;
            if href.is_empty() || href == "#" || href.starts_with("javascript:") {
                return None;
            }
            Some(LinkEntry {
                href: href.to_string(),
                text: element_text(a_tag),
                title: a_tag.value().attr("title").unwrap_or("").to_string(),
            })
        })
        .collect()
}

fn collect_images(document: &Html) -> Vec<ImageEntry> {
    let img_selector = Selector::parse("img[src]").unwrap();
    document
        .select(&img_selector)
        .filter_map(|img_tag| {
            let src = img_tag.value().attr("src")?;
            if src.is_empty() {
                return None;
            }
            Some(ImageEntry {
                src: src.to_string(),
                alt: img_tag.value().attr("alt").unwrap_or("").to_string(),
                title: img_tag.value().attr("title").unwrap_or("").to_string(),
                width: img_tag.value().attr("width").and_then(|w| w.parse().ok()),
                height: img_tag.value().attr("height").and_then(|h| h.parse().ok()),
            })
        })
        .collect()
}

fn collect_tables(document: &Html) -> Vec<Vec<Vec<String>>> {
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td, th").unwrap();

    document
        .select(&table_selector)
        .map(|table| {
            table
                .select(&row_selector)
                .map(|row| row.select(&cell_selector).map(element_text).collect())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::domain::directive::ExtractionDirective;
    use crate::domain::page::FieldValue;

    use super::extract_page_data;

    const PRODUCT_PAGE: &str = r##"
        <html><head><title>Organic Green Tea</title></head><body>
            <h1>Hello</h1>
            <ul>
                <li class="perk">Free shipping</li>
                <li class="perk">Non-GMO</li>
                <li class="perk">Fair trade</li>
            </ul>
            <a href="/products/green-tea-organic" title="Shop">Green tea</a>
            <a href="https://www.healthline.com/nutrition/green-tea">Research</a>
            <a href="javascript:void(0)">Popup</a>
            <a href="#">Top</a>
            <img src="/images/tea.jpg" alt="Loose leaf" width="640" height="480">
            <table>
                <tr><th>Size</th><th>Price</th></tr>
                <tr><td>100g</td><td>$8</td></tr>
            </table>
        </body></html>
    "##;

    fn directive_with_selectors() -> ExtractionDirective {
        let mut directive = ExtractionDirective::for_url("https://example.com");
        directive
            .selectors
            .insert("title".to_string(), "h1".to_string());
        directive
            .selectors
            .insert("perks".to_string(), "li.perk".to_string());
        directive
            .selectors
            .insert("missing".to_string(), ".does-not-exist".to_string());
        directive
            .selectors
            .insert("broken".to_string(), "li..perk".to_string());
        directive
    }

    #[test]
    fn single_match_yields_scalar() {
        let data = extract_page_data(PRODUCT_PAGE, &directive_with_selectors());

        assert_eq!(
            data.fields["title"],
            FieldValue::Scalar("Hello".to_string())
        );
    }

    #[test]
    fn multiple_matches_yield_list() {
        let data = extract_page_data(PRODUCT_PAGE, &directive_with_selectors());

        assert_eq!(
            data.fields["perks"],
            FieldValue::List(vec![
                "Free shipping".to_string(),
                "Non-GMO".to_string(),
                "Fair trade".to_string(),
            ])
        );
    }

    #[test]
    fn zero_matches_and_broken_selectors_yield_null() {
        let data = extract_page_data(PRODUCT_PAGE, &directive_with_selectors());

        assert_eq!(data.fields["missing"], FieldValue::Null);
        assert_eq!(data.fields["broken"], FieldValue::Null);
    }

    #[test]
    fn link_capture_drops_anchor_noise() {
        let directive = ExtractionDirective::for_url("https://example.com").with_full_capture();
        let data = extract_page_data(PRODUCT_PAGE, &directive);

        let links = data.all_links.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "/products/green-tea-organic");
        assert_eq!(links[0].title, "Shop");
        assert_eq!(links[1].text, "Research");
    }

    #[test]
    fn image_capture_parses_dimensions() {
        let directive = ExtractionDirective::for_url("https://example.com").with_full_capture();
        let data = extract_page_data(PRODUCT_PAGE, &directive);

        let images = data.all_images.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].alt, "Loose leaf");
        assert_eq!(images[0].width, Some(640));
        assert_eq!(images[0].height, Some(480));
    }

    #[test]
    fn table_capture_is_row_major_cell_text() {
        let directive = ExtractionDirective::for_url("https://example.com").with_full_capture();
        let data = extract_page_data(PRODUCT_PAGE, &directive);

        let tables = data.all_tables.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0][0], vec!["Size", "Price"]);
        assert_eq!(tables[0][1], vec!["100g", "$8"]);
    }

    #[test]
    fn text_capture_collapses_whitespace() {
        let directive = ExtractionDirective::for_url("https://example.com");
        let data = extract_page_data("<body>  Hello \n\n  world </body>", &directive);

        assert_eq!(data.all_text.unwrap(), "Hello world");
    }
}
