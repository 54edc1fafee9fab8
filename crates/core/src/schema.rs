//! Built-in metadata schemas.
//!
//! A schema bundles everything the resolver needs to turn the metadata files
//! of an article into cooked records: the source format, the cook map, which
//! roles carry metadata, and the de-duplication/consolidation rules.
//! Schemas are immutable and shared through a process-wide registry.

use crate::article::Role;
use crate::consolidate::{AuthorityOrder, FilenameCheck};
use crate::error::{QuireError, Result};
use crate::extract::SourceFormat;
use crate::metadata::{CookMap, MetadataField};
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

#[cfg(feature = "xml")]
use crate::extract::{ValueExtractor, XmlSchema, walkers};

/// Everything needed to extract and cook one kind of metadata file
#[derive(Debug, Clone)]
pub struct MetadataSchema {
    pub id: String,
    pub version: u32,
    pub format: SourceFormat,
    pub cook_map: CookMap,
    /// Roles whose URLs are read, most authoritative first
    pub metadata_roles: Vec<Role>,
    pub dedup_key: Option<String>,
    pub consolidation_key: Option<String>,
    pub authority: AuthorityOrder,
    pub filename_check: Option<FilenameCheck>,
}

impl MetadataSchema {
    pub fn new(id: &str, format: SourceFormat, cook_map: CookMap) -> Self {
        Self {
            id: id.to_string(),
            version: 1,
            format,
            cook_map,
            metadata_roles: vec![Role::ArticleMetadata],
            dedup_key: None,
            consolidation_key: None,
            authority: AuthorityOrder::Declaration,
            filename_check: None,
        }
    }

    pub fn with_metadata_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.metadata_roles = roles.into_iter().collect();
        self
    }

    pub fn with_dedup_key(mut self, key: &str) -> Self {
        self.dedup_key = Some(key.to_lowercase());
        self
    }

    pub fn with_consolidation(mut self, key: &str, authority: AuthorityOrder) -> Self {
        self.consolidation_key = Some(key.to_lowercase());
        self.authority = authority;
        self
    }

    pub fn with_filename_check(mut self, check: FilenameCheck) -> Self {
        self.filename_check = Some(check);
        self
    }

    /// Check the schema's tables before it is used
    pub fn validate(&self) -> Result<()> {
        if self.metadata_roles.is_empty() {
            return Err(QuireError::ConfigError(format!("Schema '{}' has no metadata roles", self.id)));
        }

        match &self.format {
            #[cfg(feature = "xml")]
            SourceFormat::Xml(xml) => xml.validate(),
            _ => Ok(()),
        }
    }
}

/// Immutable, lazily built table of the built-in schemas
#[derive(Debug)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Arc<MetadataSchema>>,
}

impl SchemaRegistry {
    fn builtin() -> Self {
        let mut schemas = vec![highwire(), ris()];
        #[cfg(feature = "xml")]
        schemas.extend([jats(), onix3(), bits()]);

        Self { schemas: schemas.into_iter().map(|s| (s.id.clone(), Arc::new(s))).collect() }
    }

    pub fn get(&self, id: &str) -> Option<Arc<MetadataSchema>> {
        self.schemas.get(&id.to_ascii_lowercase()).cloned()
    }

    /// Like [`get`](Self::get), failing with `UnknownSchema`
    pub fn lookup(&self, id: &str) -> Result<Arc<MetadataSchema>> {
        self.get(id).ok_or_else(|| QuireError::UnknownSchema(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }
}

static REGISTRY: LazyLock<SchemaRegistry> = LazyLock::new(SchemaRegistry::builtin);

/// The process-wide schema registry
pub fn registry() -> &'static SchemaRegistry {
    &REGISTRY
}

/// HTML landing pages carrying Highwire `citation_*` and Dublin Core tags
fn highwire() -> MetadataSchema {
    let cook_map = CookMap::builder()
        .map("citation_doi", MetadataField::Doi)
        .map("dc.identifier", MetadataField::Doi)
        .map("citation_issn", MetadataField::Issn)
        .map("citation_isbn", MetadataField::Isbn)
        .map("citation_publisher", MetadataField::Publisher)
        .map("dc.publisher", MetadataField::Publisher)
        .map("citation_journal_title", MetadataField::PublicationTitle)
        .map("citation_title", MetadataField::ArticleTitle)
        .map("dc.title", MetadataField::ArticleTitle)
        .map("citation_author", MetadataField::Author)
        .map("dc.creator", MetadataField::Author)
        .map("citation_volume", MetadataField::Volume)
        .map("citation_issue", MetadataField::Issue)
        .map("citation_firstpage", MetadataField::StartPage)
        .map("citation_lastpage", MetadataField::EndPage)
        .map("citation_publication_date", MetadataField::Date)
        .map("citation_date", MetadataField::Date)
        .map("dc.date", MetadataField::Date)
        .map("citation_keywords", MetadataField::Keywords)
        .map("citation_language", MetadataField::Language)
        .map("dc.language", MetadataField::Language)
        .build();

    MetadataSchema::new("highwire", SourceFormat::HtmlMeta, cook_map).with_metadata_roles([
        Role::ArticleMetadata,
        Role::Abstract,
        Role::FullTextHtml,
    ])
}

fn ris() -> MetadataSchema {
    let cook_map = CookMap::builder()
        .map("DO", MetadataField::Doi)
        .map("SN", MetadataField::Issn)
        .map("PB", MetadataField::Publisher)
        .map("JO", MetadataField::PublicationTitle)
        .map("JF", MetadataField::PublicationTitle)
        .map("T2", MetadataField::PublicationTitle)
        .map("TI", MetadataField::ArticleTitle)
        .map("T1", MetadataField::ArticleTitle)
        .map("AU", MetadataField::Author)
        .map("A1", MetadataField::Author)
        .map("VL", MetadataField::Volume)
        .map("IS", MetadataField::Issue)
        .map("SP", MetadataField::StartPage)
        .map("EP", MetadataField::EndPage)
        .map("DA", MetadataField::Date)
        .map("PY", MetadataField::Date)
        .map("Y1", MetadataField::Date)
        .map("KW", MetadataField::Keywords)
        .map("LA", MetadataField::Language)
        .build();

    MetadataSchema::new("ris", SourceFormat::Ris, cook_map)
        .with_metadata_roles([Role::CitationRis, Role::ArticleMetadata])
        .with_dedup_key("DO")
}

#[cfg(feature = "xml")]
const JATS_DOI: &str = "front/article-meta/article-id[@pub-id-type='doi']";

/// JATS journal articles, one record per `<article>`
#[cfg(feature = "xml")]
fn jats() -> MetadataSchema {
    use ValueExtractor::{Text, Walker};

    const ISSN: &str = "front/journal-meta/issn[@pub-type='ppub']";
    const EISSN: &str = "front/journal-meta/issn[@pub-type='epub']";
    const JOURNAL_TITLE: &str = "front/journal-meta/journal-title-group/journal-title";
    const JOURNAL_ID: &str = "front/journal-meta/journal-id[@journal-id-type='publisher-id']";
    const PUBLISHER: &str = "front/journal-meta/publisher/publisher-name";
    const TITLE: &str = "front/article-meta/title-group";
    const CONTRIB: &str = "front/article-meta/contrib-group/contrib";
    const VOLUME: &str = "front/article-meta/volume";
    const ISSUE: &str = "front/article-meta/issue";
    const FPAGE: &str = "front/article-meta/fpage";
    const LPAGE: &str = "front/article-meta/lpage";
    const PUB_DATE: &str = "front/article-meta/pub-date";
    const KEYWORDS: &str = "front/article-meta/kwd-group/kwd";

    let xml = XmlSchema::new()
        .article_node("/article")
        .article(ISSN, Text)
        .article(EISSN, Text)
        .article(JOURNAL_TITLE, Text)
        .article(JOURNAL_ID, Text)
        .article(PUBLISHER, Text)
        .article(JATS_DOI, Text)
        .article(TITLE, Walker(walkers::title_with_subtitle))
        .article(CONTRIB, Walker(walkers::person_name))
        .article(VOLUME, Text)
        .article(ISSUE, Text)
        .article(FPAGE, Text)
        .article(LPAGE, Text)
        .article(PUB_DATE, Walker(walkers::jats_date))
        .article(KEYWORDS, Text);

    let cook_map = CookMap::builder()
        .map(ISSN, MetadataField::Issn)
        .map(EISSN, MetadataField::Eissn)
        .map(JATS_DOI, MetadataField::Doi)
        .map(VOLUME, MetadataField::Volume)
        .map(ISSUE, MetadataField::Issue)
        .map(FPAGE, MetadataField::StartPage)
        .map(LPAGE, MetadataField::EndPage)
        .map(JOURNAL_TITLE, MetadataField::PublicationTitle)
        .map(TITLE, MetadataField::ArticleTitle)
        .map(CONTRIB, MetadataField::Author)
        .map(PUBLISHER, MetadataField::Publisher)
        .map(PUB_DATE, MetadataField::Date)
        .map(KEYWORDS, MetadataField::Keywords)
        .map(JOURNAL_ID, MetadataField::ProprietaryIdentifier)
        .build();

    MetadataSchema::new("jats", SourceFormat::Xml(xml), cook_map).with_dedup_key(JATS_DOI)
}

#[cfg(feature = "xml")]
const ONIX_ISBN13: &str = "ProductIdentifier[ProductIDType='15'] | productidentifier[b221='15']";

/// ONIX 3 book feeds: one record per `<Product>`, each backed by a
/// `<isbn>.pdf` or `<isbn>.epub` next to the feed
#[cfg(feature = "xml")]
fn onix3() -> MetadataSchema {
    use ValueExtractor::{Text, Walker};

    const RECORD_REF: &str = "RecordReference | a001";
    const DOI: &str = "ProductIdentifier[ProductIDType='06'] | productidentifier[b221='06']";
    const PROPRIETARY: &str = "ProductIdentifier[ProductIDType='01'] | productidentifier[b221='01']";
    const FORM: &str = "DescriptiveDetail/ProductFormDetail | descriptivedetail/b333";
    const TITLE: &str = "DescriptiveDetail/TitleDetail[TitleType='01' or TitleType='1']/TitleElement[TitleElementLevel='01']";
    const CHAPTER_TITLE: &str =
        "DescriptiveDetail/TitleDetail[TitleType='01' or TitleType='1']/TitleElement[TitleElementLevel='04']";
    const CONTRIB: &str = "DescriptiveDetail/Contributor | descriptivedetail/contributor";
    const SERIES_TITLE: &str = "DescriptiveDetail/Collection/TitleDetail/TitleElement[TitleElementLevel='01']";
    const PUBLISHER: &str = "PublishingDetail/Publisher/PublisherName | publishingdetail/publisher/b081";
    const PUB_DATE: &str = "PublishingDetail/PublishingDate | publishingdetail/publishingdate";
    const LANGUAGE: &str = "DescriptiveDetail/Language/LanguageCode";

    let xml = XmlSchema::new()
        .article_node("//Product | //product")
        .article(RECORD_REF, Text)
        .article(ONIX_ISBN13, Walker(walkers::onix_id_value))
        .article(DOI, Walker(walkers::onix_id_value))
        .article(PROPRIETARY, Walker(walkers::onix_id_value))
        .article(FORM, Text)
        .article(TITLE, Walker(walkers::onix_title))
        .article(CHAPTER_TITLE, Walker(walkers::onix_title))
        .article(CONTRIB, Walker(walkers::onix_contributor))
        .article(SERIES_TITLE, Walker(walkers::onix_title))
        .article(PUBLISHER, Text)
        .article(PUB_DATE, Walker(walkers::onix_date))
        .article(LANGUAGE, Text);

    let cook_map = CookMap::builder()
        .map(ONIX_ISBN13, MetadataField::Isbn)
        .map(DOI, MetadataField::Doi)
        .map(TITLE, MetadataField::PublicationTitle)
        .map(CHAPTER_TITLE, MetadataField::ArticleTitle)
        .map(SERIES_TITLE, MetadataField::SeriesTitle)
        .map(CONTRIB, MetadataField::Author)
        .map(PUB_DATE, MetadataField::Date)
        .map(PUBLISHER, MetadataField::Publisher)
        .map(LANGUAGE, MetadataField::Language)
        .map(PROPRIETARY, MetadataField::ProprietaryIdentifier)
        .build();

    MetadataSchema::new("onix3", SourceFormat::Xml(xml), cook_map)
        .with_dedup_key(ONIX_ISBN13)
        .with_filename_check(FilenameCheck::new(ONIX_ISBN13, "", [".pdf", ".epub"]))
}

#[cfg(feature = "xml")]
pub(crate) const BITS_KIND: &str = "name(/*)";
#[cfg(feature = "xml")]
pub(crate) const BITS_BOOK_ID: &str = "book-meta/book-id[@book-id-type='publisher-id']";

/// BITS book deliveries: a `<book>` file plus `<book-part-wrapper>` chapter
/// files, consolidated on the book id with the book file authoritative
#[cfg(feature = "xml")]
fn bits() -> MetadataSchema {
    use ValueExtractor::{Text, Walker};

    const BOOK_TITLE: &str = "book-meta/book-title-group";
    const ISBN: &str = "book-meta/isbn";
    const PUBLISHER: &str = "book-meta/publisher/publisher-name";
    const BOOK_CONTRIB: &str = "book-meta/contrib-group/contrib";
    const BOOK_DATE: &str = "book-meta/pub-date";
    const SERIES: &str = "collection-meta/title-group";
    const PART_TITLE: &str = "book-part/book-part-meta/title-group";
    const PART_CONTRIB: &str = "book-part/book-part-meta/contrib-group/contrib";
    const PART_DATE: &str = "book-part/book-part-meta/pub-date";
    const FPAGE: &str = "book-part/book-part-meta/fpage";
    const LPAGE: &str = "book-part/book-part-meta/lpage";
    const PART_DOI: &str = "book-part/book-part-meta/book-part-id[@book-part-id-type='doi']";

    let xml = XmlSchema::new()
        .global(BITS_KIND, Text)
        .article_node("/*")
        .article(BITS_BOOK_ID, Text)
        .article(BOOK_TITLE, Walker(walkers::title_with_subtitle))
        .article(ISBN, Text)
        .article(PUBLISHER, Text)
        .article(BOOK_CONTRIB, Walker(walkers::person_name))
        .article(BOOK_DATE, Walker(walkers::jats_date))
        .article(SERIES, Walker(walkers::title_with_subtitle))
        .article(PART_TITLE, Walker(walkers::title_with_subtitle))
        .article(PART_CONTRIB, Walker(walkers::person_name))
        .article(PART_DATE, Walker(walkers::jats_date))
        .article(FPAGE, Text)
        .article(LPAGE, Text)
        .article(PART_DOI, Text);

    let cook_map = CookMap::builder()
        .map(ISBN, MetadataField::Isbn)
        .map(PART_DOI, MetadataField::Doi)
        .map(PUBLISHER, MetadataField::Publisher)
        .map(BOOK_TITLE, MetadataField::PublicationTitle)
        .map(SERIES, MetadataField::SeriesTitle)
        .map(PART_TITLE, MetadataField::ArticleTitle)
        .map(PART_CONTRIB, MetadataField::Author)
        .map(BOOK_CONTRIB, MetadataField::Author)
        .map(PART_DATE, MetadataField::Date)
        .map(BOOK_DATE, MetadataField::Date)
        .map(FPAGE, MetadataField::StartPage)
        .map(LPAGE, MetadataField::EndPage)
        .map(BITS_BOOK_ID, MetadataField::ProprietaryIdentifier)
        .build();

    MetadataSchema::new("bits", SourceFormat::Xml(xml), cook_map)
        .with_metadata_roles([Role::ArticleMetadata, Role::IssueMetadata])
        .with_consolidation(BITS_BOOK_ID, AuthorityOrder::by_raw_value(BITS_KIND, ["book", "book-part-wrapper"]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_schemas_validate() {
        for id in registry().ids() {
            let schema = registry().lookup(id).unwrap();
            assert!(schema.validate().is_ok(), "schema {} failed validation", id);
            assert!(!schema.cook_map.is_empty());
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(registry().lookup("RIS").unwrap().id, "ris");
        assert!(matches!(registry().lookup("nope"), Err(QuireError::UnknownSchema(_))));
    }

    #[test]
    fn test_registry_shares_instances() {
        let a = registry().lookup("highwire").unwrap();
        let b = registry().lookup("highwire").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_schema_without_roles_is_invalid() {
        let schema = MetadataSchema::new("x", SourceFormat::Ris, CookMap::default()).with_metadata_roles([]);
        assert!(schema.validate().is_err());
    }

    #[cfg(feature = "xml")]
    #[test]
    fn test_jats_extract_and_cook() {
        use crate::extract::extract_raw;

        let xml = r#"<article>
  <front>
    <journal-meta>
      <journal-title-group><journal-title>Climate of the Past</journal-title></journal-title-group>
      <issn pub-type="epub">1814-9332</issn>
      <publisher><publisher-name>Copernicus</publisher-name></publisher>
    </journal-meta>
    <article-meta>
      <article-id pub-id-type="doi">10.5194/cp-8-1-2012</article-id>
      <title-group><article-title>Ice cores</article-title></title-group>
      <contrib-group><contrib><name><surname>Smith</surname><given-names>J.</given-names></name></contrib></contrib-group>
      <pub-date><year>2012</year></pub-date>
      <volume>8</volume><fpage>1</fpage><lpage>12</lpage>
    </article-meta>
  </front>
</article>"#;

        let schema = registry().lookup("jats").unwrap();
        let raw = extract_raw(&schema.format, "http://x.org/a.xml", xml).unwrap();
        assert_eq!(raw.len(), 1);

        let cooked = schema.cook_map.cook(&raw[0]);
        assert!(cooked.errors.is_empty());
        let md = cooked.metadata;
        assert_eq!(md.get(MetadataField::Doi), Some("10.5194/cp-8-1-2012"));
        assert_eq!(md.get(MetadataField::Eissn), Some("1814-9332"));
        assert_eq!(md.get(MetadataField::ArticleTitle), Some("Ice cores"));
        assert_eq!(md.get(MetadataField::PublicationTitle), Some("Climate of the Past"));
        assert_eq!(md.get_list(MetadataField::Author), &["Smith, J.".to_string()]);
        assert_eq!(md.get(MetadataField::Date), Some("2012"));
        assert_eq!(md.get(MetadataField::EndPage), Some("12"));
    }

    #[cfg(feature = "xml")]
    #[test]
    fn test_onix_products_become_records() {
        use crate::extract::extract_raw;

        let xml = r#"<ONIXMessage>
  <Product>
    <RecordReference>rec-1</RecordReference>
    <ProductIdentifier><ProductIDType>15</ProductIDType><IDValue>9780000000002</IDValue></ProductIdentifier>
    <DescriptiveDetail>
      <TitleDetail><TitleType>01</TitleType>
        <TitleElement><TitleElementLevel>01</TitleElementLevel><TitleText>A Book</TitleText></TitleElement>
      </TitleDetail>
      <Contributor><PersonNameInverted>Doe, Jane</PersonNameInverted></Contributor>
    </DescriptiveDetail>
    <PublishingDetail>
      <Publisher><PublisherName>Example Press</PublisherName></Publisher>
      <PublishingDate><Date>20120501</Date></PublishingDate>
    </PublishingDetail>
  </Product>
  <Product>
    <ProductIdentifier><ProductIDType>15</ProductIDType><IDValue>9781111111113</IDValue></ProductIdentifier>
  </Product>
</ONIXMessage>"#;

        let schema = registry().lookup("onix3").unwrap();
        let raw = extract_raw(&schema.format, "http://x.org/onix.xml", xml).unwrap();
        assert_eq!(raw.len(), 2);

        let md = schema.cook_map.cook(&raw[0]).metadata;
        assert_eq!(md.get(MetadataField::Isbn), Some("9780000000002"));
        assert_eq!(md.get(MetadataField::PublicationTitle), Some("A Book"));
        assert_eq!(md.get(MetadataField::Date), Some("2012-05-01"));
        assert_eq!(md.get(MetadataField::Publisher), Some("Example Press"));
        assert!(schema.filename_check.is_some());
    }
}
