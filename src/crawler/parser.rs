//! HTML parser for person record pages
//!
//! This module turns one fetched record page into a `Record`:
//! - Name and external author id from the header
//! - Descendant ids from the students table
//! - Degrees, each with institution, year, countries, dissertation,
//!   subject classification, and labelled advisor ids
//!
//! A page announcing that the id does not exist parses to `None`. Any other
//! page missing an expected element is an extraction error.

use crate::state::{Advisor, Degree, NodeId, Record};
use crate::HarvestError;
use scraper::{ElementRef, Html, Selector};

/// Body text the directory serves for ids with no entity
const NOT_FOUND_MESSAGE: &str =
    "You have specified an ID that does not exist in the database. Please back up and try again.";

/// Link prefix identifying the external author id
const AUTHOR_ID_MARKER: &str = "www.ams.org/mathscinet/MRAuthorID/";

/// Parses a record page
///
/// # Returns
///
/// * `Ok(Some(Record))` - The page describes a person
/// * `Ok(None)` - The directory has no entity with this id
/// * `Err(HarvestError::Extraction)` - The page is not in the expected shape
///
/// # Example
///
/// ```
/// use genealogy_harvest::crawler::parse_person;
///
/// let html = "You have specified an ID that does not exist in the database. Please back up and try again.";
/// assert!(parse_person(html, 7).unwrap().is_none());
/// ```
pub fn parse_person(html: &str, id: NodeId) -> Result<Option<Record>, HarvestError> {
    let document = Html::parse_document(html);
    let extract = Extractor { id };

    let name_selector = extract.selector("#mainContent h2")?;
    let Some(heading) = document.select(&name_selector).next() else {
        let text = collapse_whitespace(&document.root_element().text().collect::<String>());
        if text == NOT_FOUND_MESSAGE {
            tracing::info!("found no entry for id {}", id);
            return Ok(None);
        }
        return Err(extract.error("page has no #mainContent heading"));
    };

    let name = collapse_whitespace(&heading.text().collect::<String>());
    let msn_id = extract.author_id(&document)?;
    let descendants = extract.descendants(&document)?;
    let degrees = extract.degrees(&document)?;

    tracing::debug!("fetched {}", id);
    Ok(Some(Record {
        name,
        id,
        msn_id,
        descendants,
        degrees,
        rank: None,
    }))
}

/// Carries the record id into every extraction error
struct Extractor {
    id: NodeId,
}

impl Extractor {
    fn error(&self, message: impl Into<String>) -> HarvestError {
        HarvestError::Extraction {
            id: self.id,
            message: message.into(),
        }
    }

    fn selector(&self, css: &str) -> Result<Selector, HarvestError> {
        Selector::parse(css).map_err(|e| self.error(format!("bad selector '{}': {}", css, e)))
    }

    fn author_id(&self, document: &Html) -> Result<Option<u64>, HarvestError> {
        let selector = self.selector(&format!("#mainContent a[href*=\"{}\"]", AUTHOR_ID_MARKER))?;
        let Some(link) = document.select(&selector).next() else {
            return Ok(None);
        };

        let href = link.value().attr("href").unwrap_or_default();
        href.trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse().ok())
            .map(Some)
            .ok_or_else(|| self.error(format!("unparseable author link '{}'", href)))
    }

    fn descendants(&self, document: &Html) -> Result<Vec<NodeId>, HarvestError> {
        let selector = self.selector("#mainContent table tr td:first-child a")?;
        document
            .select(&selector)
            .map(|link| self.linked_id(link))
            .collect()
    }

    fn degrees(&self, document: &Html) -> Result<Vec<Degree>, HarvestError> {
        let selector = self.selector("#mainContent #thesisTitle")?;
        document
            .select(&selector)
            .map(|title| self.degree(title))
            .collect()
    }

    /// Parses one degree around its dissertation title
    ///
    /// The title sits in its own block. The block before it carries the
    /// degree line and country flags; the blocks after it, up to and
    /// including the first `<p>`, are classification lines followed by the
    /// advisor paragraph.
    fn degree(&self, title: ElementRef<'_>) -> Result<Degree, HarvestError> {
        let block = title
            .parent()
            .and_then(ElementRef::wrap)
            .ok_or_else(|| self.error("dissertation title has no enclosing block"))?;

        let header = block
            .prev_siblings()
            .find_map(ElementRef::wrap)
            .ok_or_else(|| self.error("dissertation has no degree line"))?;

        let mut classification = None;
        let mut advisor_paragraph = None;
        for sibling in block.next_siblings().filter_map(ElementRef::wrap) {
            if sibling.value().name() == "p" {
                advisor_paragraph = Some(sibling);
                break;
            }
            classification.get_or_insert(sibling);
        }
        let advisor_paragraph =
            advisor_paragraph.ok_or_else(|| self.error("dissertation has no advisor paragraph"))?;

        let (degree, university, years) = self.degree_line(header)?;
        let (subject_id, subject) = classification.map(parse_classification).unwrap_or_default();

        Ok(Degree {
            degree,
            university,
            years,
            country: countries(header),
            dissertation: collapse_whitespace(&title.text().collect::<String>()),
            subject_id,
            subject,
            advisors: self.advisors(advisor_paragraph)?,
        })
    }

    /// Splits `<span>DEGREE <span>UNIVERSITY</span> YEAR</span>`
    fn degree_line(&self, header: ElementRef<'_>) -> Result<(String, String, String), HarvestError> {
        let line = header
            .children()
            .find_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "span")
            .ok_or_else(|| self.error("degree line has no span"))?;

        let mut degree = String::new();
        let mut university = None;
        let mut years = String::new();
        for node in line.children() {
            if let Some(text) = node.value().as_text() {
                match university {
                    None => degree.push_str(text),
                    Some(_) => years.push_str(text),
                }
            } else if let Some(element) = ElementRef::wrap(node) {
                if university.is_some() {
                    break;
                }
                university = Some(element.text().collect::<String>());
            }
        }

        Ok((
            collapse_whitespace(&degree),
            collapse_whitespace(&university.unwrap_or_default()),
            collapse_whitespace(&years),
        ))
    }

    /// Pairs each advisor link with the label text that precedes it
    fn advisors(&self, paragraph: ElementRef<'_>) -> Result<Vec<Advisor>, HarvestError> {
        let mut advisors = Vec::new();
        let mut label = String::new();

        for node in paragraph.children() {
            if let Some(text) = node.value().as_text() {
                label.push_str(text);
            } else if let Some(element) = ElementRef::wrap(node) {
                if element.value().name() == "a" {
                    let relation = collapse_whitespace(&label).trim_end_matches(':').to_string();
                    advisors.push(Advisor {
                        relation,
                        id: self.linked_id(element)?,
                    });
                }
                label.clear();
            }
        }

        Ok(advisors)
    }

    /// Reads the id from a `id.php?id=N` link
    fn linked_id(&self, link: ElementRef<'_>) -> Result<NodeId, HarvestError> {
        let href = link.value().attr("href").unwrap_or_default();
        href.split_once('=')
            .and_then(|(_, value)| value.trim().parse().ok())
            .ok_or_else(|| self.error(format!("unparseable record link '{}'", href)))
    }
}

/// Country names from the flag images' titles
fn countries(header: ElementRef<'_>) -> Vec<String> {
    header
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "img")
        .filter_map(|img| img.value().attr("title"))
        .map(titleize)
        .collect()
}

/// Parses `Mathematics Subject Classification: 01—History and biography`
fn parse_classification(block: ElementRef<'_>) -> (Option<u32>, String) {
    let text = collapse_whitespace(&block.text().collect::<String>());
    let value = text.split_once(':').map(|(_, rest)| rest).unwrap_or(&text);

    match value.split_once('—') {
        Some((code, subject)) => (code.trim().parse().ok(), subject.trim().to_string()),
        None => (None, value.trim().to_string()),
    }
}

/// Collapses every run of whitespace to one space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `united_states` / `UNITED STATES` -> `United States`
fn titleize(text: &str) -> String {
    text.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
