//! PubMed `efetch` XML to [`ArticleDetail`].
//!
//! Walks the event stream keeping the element path relative to the current
//! `PubmedArticle`, and collects only the leaves we need. Missing fields get
//! display defaults rather than errors.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::models::ArticleDetail;

const NOT_AVAILABLE: &str = "Not available";
const NO_ABSTRACT: &str = "No abstract available";

const PMID: &[&str] = &["MedlineCitation", "PMID"];
const TITLE: &[&str] = &["MedlineCitation", "Article", "ArticleTitle"];
const ABSTRACT_TEXT: &[&str] = &["MedlineCitation", "Article", "Abstract", "AbstractText"];
const AUTHOR: &[&str] = &["MedlineCitation", "Article", "AuthorList", "Author"];
const AUTHOR_LAST: &[&str] = &["MedlineCitation", "Article", "AuthorList", "Author", "LastName"];
const AUTHOR_FORE: &[&str] = &["MedlineCitation", "Article", "AuthorList", "Author", "ForeName"];
const JOURNAL_TITLE: &[&str] = &["MedlineCitation", "Article", "Journal", "Title"];
const PUB_YEAR: &[&str] = &["MedlineCitation", "Article", "Journal", "JournalIssue", "PubDate", "Year"];
const PUB_MEDLINE_DATE: &[&str] = &[
    "MedlineCitation",
    "Article",
    "Journal",
    "JournalIssue",
    "PubDate",
    "MedlineDate",
];
const MESH_DESCRIPTOR: &[&str] = &["MedlineCitation", "MeshHeadingList", "MeshHeading", "DescriptorName"];

fn is(path: &[String], expected: &[&str]) -> bool {
    path.len() == expected.len() && under(path, expected)
}

fn under(path: &[String], prefix: &[&str]) -> bool {
    path.len() >= prefix.len() && path.iter().zip(prefix).all(|(a, b)| a == b)
}

fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Default)]
struct ArticleBuilder {
    pmid: String,
    title: String,
    abstract_parts: Vec<String>,
    abstract_buf: String,
    authors: Vec<String>,
    fore_name: String,
    last_name: String,
    journal: String,
    year: String,
    medline_date: String,
    mesh_terms: Vec<String>,
    mesh_buf: String,
}

impl ArticleBuilder {
    fn text(&mut self, path: &[String], text: &str) {
        let target = if is(path, PMID) {
            &mut self.pmid
        } else if under(path, TITLE) {
            // Titles and abstracts carry inline markup (<i>, <sup>, ...).
            &mut self.title
        } else if under(path, ABSTRACT_TEXT) {
            &mut self.abstract_buf
        } else if is(path, AUTHOR_LAST) {
            &mut self.last_name
        } else if is(path, AUTHOR_FORE) {
            &mut self.fore_name
        } else if is(path, JOURNAL_TITLE) {
            &mut self.journal
        } else if is(path, PUB_YEAR) {
            &mut self.year
        } else if is(path, PUB_MEDLINE_DATE) {
            &mut self.medline_date
        } else if under(path, MESH_DESCRIPTOR) {
            &mut self.mesh_buf
        } else {
            return;
        };
        target.push_str(text);
    }

    /// `path` still includes the element being closed.
    fn close(&mut self, path: &[String]) {
        if is(path, ABSTRACT_TEXT) {
            let part = squash(&std::mem::take(&mut self.abstract_buf));
            if !part.is_empty() {
                self.abstract_parts.push(part);
            }
        } else if is(path, AUTHOR) {
            let fore = std::mem::take(&mut self.fore_name);
            let last = std::mem::take(&mut self.last_name);
            let name = squash(&format!("{} {}", fore, last));
            if !name.is_empty() {
                self.authors.push(name);
            }
        } else if is(path, MESH_DESCRIPTOR) {
            let term = squash(&std::mem::take(&mut self.mesh_buf));
            if !term.is_empty() {
                self.mesh_terms.push(term);
            }
        }
    }

    fn finish(self) -> ArticleDetail {
        let or_default = |value: String, default: &str| {
            let value = squash(&value);
            if value.is_empty() {
                default.to_string()
            } else {
                value
            }
        };

        let pmid = squash(&self.pmid);
        let abstract_text = if self.abstract_parts.is_empty() {
            NO_ABSTRACT.to_string()
        } else {
            self.abstract_parts.join(" ")
        };
        let publication_year = if squash(&self.year).is_empty() {
            or_default(self.medline_date, NOT_AVAILABLE)
        } else {
            squash(&self.year)
        };
        let authors = if self.authors.is_empty() {
            vec![NOT_AVAILABLE.to_string()]
        } else {
            self.authors
        };
        let mesh_terms = if self.mesh_terms.is_empty() {
            vec![NOT_AVAILABLE.to_string()]
        } else {
            self.mesh_terms
        };

        ArticleDetail {
            id: pmid.clone(),
            pmid: or_default(pmid, NOT_AVAILABLE),
            title: or_default(self.title, NOT_AVAILABLE),
            publication_year,
            journal: or_default(self.journal, NOT_AVAILABLE),
            authors,
            abstract_text,
            mesh_terms,
        }
    }
}

/// Parse a `PubmedArticleSet` document. Articles come back in document
/// order.
pub fn parse_pubmed_articles(xml: &str) -> Result<Vec<ArticleDetail>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<ArticleBuilder> = None;
    let mut articles = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "PubmedArticle" {
                    current = Some(ArticleBuilder::default());
                    path.clear();
                } else if current.is_some() {
                    path.push(name);
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "PubmedArticle" {
                    if let Some(builder) = current.take() {
                        articles.push(builder.finish());
                    }
                    path.clear();
                } else if let Some(builder) = current.as_mut() {
                    builder.close(&path);
                    path.pop();
                }
            }
            Event::Text(t) => {
                if let Some(builder) = current.as_mut() {
                    let text = t.unescape()?;
                    builder.text(&path, &text);
                }
            }
            Event::CData(c) => {
                if let Some(builder) = current.as_mut() {
                    builder.text(&path, &String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"<?xml version="1.0" ?>
<!DOCTYPE PubmedArticleSet PUBLIC "-//NLM//DTD PubMedArticle, 1st January 2024//EN" "https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_240101.dtd">
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation Status="MEDLINE" Owner="NLM">
      <PMID Version="1">31452104</PMID>
      <Article PubModel="Print">
        <Journal>
          <Title>Nature reviews. Cancer</Title>
          <JournalIssue CitedMedium="Internet">
            <PubDate><Year>2019</Year><Month>Sep</Month></PubDate>
          </JournalIssue>
        </Journal>
        <ArticleTitle>The role of <i>TP53</i> in tumour &amp; stroma.</ArticleTitle>
        <Abstract>
          <AbstractText Label="BACKGROUND">Mutations are common.</AbstractText>
          <AbstractText Label="RESULTS">They drive
            progression.</AbstractText>
        </Abstract>
        <AuthorList CompleteYN="Y">
          <Author ValidYN="Y"><LastName>Levine</LastName><ForeName>Arnold J</ForeName><Initials>AJ</Initials></Author>
          <Author ValidYN="Y"><CollectiveName>TP53 Consortium</CollectiveName></Author>
          <Author ValidYN="Y"><LastName>Oren</LastName><ForeName>Moshe</ForeName></Author>
        </AuthorList>
      </Article>
      <MeshHeadingList>
        <MeshHeading><DescriptorName UI="D009369" MajorTopicYN="N">Neoplasms</DescriptorName></MeshHeading>
        <MeshHeading><DescriptorName UI="D016159">Tumor Suppressor Protein p53</DescriptorName><QualifierName>genetics</QualifierName></MeshHeading>
      </MeshHeadingList>
      <CommentsCorrectionsList>
        <CommentsCorrections RefType="Cites"><PMID Version="1">1111</PMID></CommentsCorrections>
      </CommentsCorrectionsList>
    </MedlineCitation>
    <PubmedData><ArticleIdList><ArticleId IdType="pubmed">31452104</ArticleId></ArticleIdList></PubmedData>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn test_parse_full_article() {
        let articles = parse_pubmed_articles(FULL).unwrap();
        assert_eq!(articles.len(), 1);
        let a = &articles[0];
        assert_eq!(a.pmid, "31452104");
        assert_eq!(a.id, "31452104");
        assert_eq!(a.title, "The role of TP53 in tumour & stroma.");
        assert_eq!(a.journal, "Nature reviews. Cancer");
        assert_eq!(a.publication_year, "2019");
        assert_eq!(a.abstract_text, "Mutations are common. They drive progression.");
        assert_eq!(a.authors, vec!["Arnold J Levine".to_string(), "Moshe Oren".to_string()]);
        assert_eq!(
            a.mesh_terms,
            vec!["Neoplasms".to_string(), "Tumor Suppressor Protein p53".to_string()]
        );
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let xml = r#"<PubmedArticleSet><PubmedArticle><MedlineCitation>
            <PMID>42</PMID>
            <Article>
              <Journal><JournalIssue><PubDate><MedlineDate>1998 Dec-1999 Jan</MedlineDate></PubDate></JournalIssue></Journal>
              <ArticleTitle>Only a title</ArticleTitle>
            </Article>
        </MedlineCitation></PubmedArticle></PubmedArticleSet>"#;

        let a = &parse_pubmed_articles(xml).unwrap()[0];
        assert_eq!(a.pmid, "42");
        assert_eq!(a.publication_year, "1998 Dec-1999 Jan");
        assert_eq!(a.abstract_text, NO_ABSTRACT);
        assert_eq!(a.journal, NOT_AVAILABLE);
        assert_eq!(a.authors, vec![NOT_AVAILABLE.to_string()]);
        assert_eq!(a.mesh_terms, vec![NOT_AVAILABLE.to_string()]);
    }

    #[test]
    fn test_multiple_articles_in_order() {
        let xml = r#"<PubmedArticleSet>
            <PubmedArticle><MedlineCitation><PMID>2</PMID></MedlineCitation></PubmedArticle>
            <PubmedArticle><MedlineCitation><PMID>1</PMID></MedlineCitation></PubmedArticle>
        </PubmedArticleSet>"#;
        let ids: Vec<_> = parse_pubmed_articles(xml)
            .unwrap()
            .into_iter()
            .map(|a| a.pmid)
            .collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_empty_set_and_malformed_input() {
        assert!(parse_pubmed_articles("<PubmedArticleSet></PubmedArticleSet>")
            .unwrap()
            .is_empty());
        assert!(parse_pubmed_articles("<PubmedArticleSet><PubmedArticle></Oops>").is_err());
    }
}
