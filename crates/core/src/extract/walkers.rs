//! Node walkers for the built-in XML schemas.
//!
//! Every walker returns `None` when a required part is missing, never an
//! empty or placeholder string.

use super::xml::XmlNode;

/// `Surname, Given` from a JATS/BITS `contrib`, `name`, or `string-name`
pub fn person_name(node: XmlNode<'_>) -> Option<String> {
    let name = if node.name() == Some("name") { Some(node) } else { node.child("name") };

    if let Some(name) = name {
        let surname = name.child_text("surname")?;
        return Some(match name.child_text("given-names") {
            Some(given) => format!("{}, {}", surname, given),
            None => surname,
        });
    }

    node.child_text("string-name").or_else(|| node.child_text("collab"))
}

/// `YYYY[-MM[-DD]]` from a JATS/BITS date element; requires a year
pub fn jats_date(node: XmlNode<'_>) -> Option<String> {
    let year = node.child_text("year")?;
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let Some(month) = node.child_text("month").and_then(|m| two_digits(&m)) else {
        return Some(year);
    };

    match node.child_text("day").and_then(|d| two_digits(&d)) {
        Some(day) => Some(format!("{}-{}-{}", year, month, day)),
        None => Some(format!("{}-{}", year, month)),
    }
}

/// Title joined with its subtitle, from a JATS `title-group` or BITS
/// `book-title-group`
pub fn title_with_subtitle(node: XmlNode<'_>) -> Option<String> {
    let title = ["article-title", "book-title", "title"]
        .iter()
        .find_map(|name| node.child_text(name))?;

    Some(match node.child_text("subtitle") {
        Some(subtitle) => format!("{}: {}", title, subtitle),
        None => title,
    })
}

/// ONIX 3 `TitleElement`: `TitleText` plus optional `Subtitle`
pub fn onix_title(node: XmlNode<'_>) -> Option<String> {
    let title = node.child_text("TitleText").or_else(|| {
        let without_prefix = node.child_text("TitleWithoutPrefix")?;
        Some(match node.child_text("TitlePrefix") {
            Some(prefix) => format!("{} {}", prefix, without_prefix),
            None => without_prefix,
        })
    })?;

    Some(match node.child_text("Subtitle") {
        Some(subtitle) => format!("{}: {}", title, subtitle),
        None => title,
    })
}

/// ONIX 3 `Contributor` as `Surname, Given`
pub fn onix_contributor(node: XmlNode<'_>) -> Option<String> {
    if let Some(inverted) = node.child_text("PersonNameInverted") {
        return Some(inverted);
    }

    if let Some(key) = node.child_text("KeyNames") {
        return Some(match node.child_text("NamesBeforeKey") {
            Some(given) => format!("{}, {}", key, given),
            None => key,
        });
    }

    node.child_text("PersonName").or_else(|| node.child_text("CorporateName"))
}

/// ONIX 3 `ProductIdentifier` / `CollectionIdentifier` value
pub fn onix_id_value(node: XmlNode<'_>) -> Option<String> {
    node.child_text("IDValue").or_else(|| node.child_text("b244"))
}

/// ONIX `Date` (`YYYYMMDD`, `YYYYMM`, or `YYYY`) as an ISO date
pub fn onix_date(node: XmlNode<'_>) -> Option<String> {
    let raw = if node.name() == Some("Date") { node.text() } else { node.child_text("Date") }?;
    if !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    match raw.len() {
        8 => Some(format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..])),
        6 => Some(format!("{}-{}", &raw[..4], &raw[4..])),
        4 => Some(raw),
        _ => None,
    }
}

fn two_digits(value: &str) -> Option<String> {
    let n: u8 = value.trim().parse().ok()?;
    (1..=31).contains(&n).then(|| format!("{:02}", n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use sxd_document::parser;
    use sxd_xpath::nodeset::Node;

    fn with_root<T>(xml: &str, f: impl FnOnce(XmlNode<'_>) -> T) -> T {
        let package = parser::parse(xml).unwrap();
        let document = package.as_document();
        let root: Node<'_> = document.root().into();
        let element = XmlNode::from_node(root).children().into_iter().next().unwrap();
        f(element)
    }

    #[rstest]
    #[case("<contrib><name><surname>Smith</surname><given-names>J.</given-names></name></contrib>", Some("Smith, J."))]
    #[case("<name><surname>Smith</surname></name>", Some("Smith"))]
    #[case("<contrib><name><given-names>J.</given-names></name></contrib>", None)]
    #[case("<contrib><string-name>J. Smith</string-name></contrib>", Some("J. Smith"))]
    #[case("<contrib><collab>IPCC</collab></contrib>", Some("IPCC"))]
    #[case("<contrib/>", None)]
    fn test_person_name(#[case] xml: &str, #[case] expected: Option<&str>) {
        assert_eq!(with_root(xml, person_name).as_deref(), expected);
    }

    #[rstest]
    #[case("<pub-date><day>3</day><month>1</month><year>2012</year></pub-date>", Some("2012-01-03"))]
    #[case("<pub-date><month>11</month><year>2012</year></pub-date>", Some("2012-11"))]
    #[case("<pub-date><year>2012</year></pub-date>", Some("2012"))]
    #[case("<pub-date><day>3</day><month>1</month></pub-date>", None)]
    #[case("<pub-date><year>12</year></pub-date>", None)]
    #[case("<pub-date><day>3</day><month>Jan</month><year>2012</year></pub-date>", Some("2012"))]
    fn test_jats_date(#[case] xml: &str, #[case] expected: Option<&str>) {
        assert_eq!(with_root(xml, jats_date).as_deref(), expected);
    }

    #[test]
    fn test_title_with_subtitle() {
        let xml = "<title-group><article-title>Ice</article-title><subtitle>A history</subtitle></title-group>";
        assert_eq!(with_root(xml, title_with_subtitle).as_deref(), Some("Ice: A history"));
        assert_eq!(with_root("<title-group/>", title_with_subtitle), None);
    }

    #[test]
    fn test_onix_title() {
        let xml = "<TitleElement><TitlePrefix>The</TitlePrefix><TitleWithoutPrefix>Book</TitleWithoutPrefix></TitleElement>";
        assert_eq!(with_root(xml, onix_title).as_deref(), Some("The Book"));
    }

    #[rstest]
    #[case("<Contributor><PersonNameInverted>Smith, J.</PersonNameInverted></Contributor>", Some("Smith, J."))]
    #[case("<Contributor><NamesBeforeKey>Jane</NamesBeforeKey><KeyNames>Doe</KeyNames></Contributor>", Some("Doe, Jane"))]
    #[case("<Contributor><ContributorRole>A01</ContributorRole></Contributor>", None)]
    fn test_onix_contributor(#[case] xml: &str, #[case] expected: Option<&str>) {
        assert_eq!(with_root(xml, onix_contributor).as_deref(), expected);
    }

    #[test]
    fn test_onix_id_value() {
        let xml = "<ProductIdentifier><ProductIDType>15</ProductIDType><IDValue>9780000000002</IDValue></ProductIdentifier>";
        assert_eq!(with_root(xml, onix_id_value).as_deref(), Some("9780000000002"));
        assert_eq!(with_root("<ProductIdentifier/>", onix_id_value), None);
    }

    #[rstest]
    #[case("<PublishingDate><Date>20120501</Date></PublishingDate>", Some("2012-05-01"))]
    #[case("<Date>201205</Date>", Some("2012-05"))]
    #[case("<Date>2012</Date>", Some("2012"))]
    #[case("<Date>May 2012</Date>", None)]
    fn test_onix_date(#[case] xml: &str, #[case] expected: Option<&str>) {
        assert_eq!(with_root(xml, onix_date).as_deref(), expected);
    }
}
