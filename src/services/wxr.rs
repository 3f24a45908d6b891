//! WXR export document assembly.
//!
//! One channel with the `chapter-type` taxonomy term, then an item per part
//! followed by an item per subsection of that part. Subsection items point at
//! their part through `wp:post_parent`.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::FeedConfig;
use crate::error::ExportError;
use crate::models::{Book, Part, Subsection};

pub const WXR_VERSION: &str = "1.2";
pub const CHAPTER_TAXONOMY: &str = "chapter-type";
pub const CHAPTER_TERM_SLUG: &str = "standard";
pub const CHAPTER_TERM_NAME: &str = "Standard";

const NAMESPACES: &[(&str, &str)] = &[
    ("version", "2.0"),
    ("xmlns:excerpt", "http://wordpress.org/export/1.2/excerpt/"),
    ("xmlns:content", "http://purl.org/rss/1.0/modules/content/"),
    ("xmlns:wfw", "http://wellformedweb.org/CommentAPI/"),
    ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
    ("xmlns:wp", "http://wordpress.org/export/1.2/"),
];

/// Fields shared by part and subsection items
struct ItemFields<'a> {
    id: u32,
    title: &'a str,
    link: &'a str,
    slug: &'a str,
    content: &'a str,
    parent: u32,
    order: usize,
    post_type: &'a str,
    categorized: bool,
}

/// Serializes `book` as a WXR feed. Every item carries the same `published` stamp.
pub fn build_export(
    book: &Book,
    feed: &FeedConfig,
    published: DateTime<Utc>,
) -> Result<String, ExportError> {
    let mut out = FeedWriter::new(feed, published);
    out.writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    out.start("rss", NAMESPACES)?;
    out.start("channel", &[])?;

    out.text("title", &book.title)?;
    out.text("link", &book.source_url)?;
    out.text("description", &feed.description)?;
    let pub_date = out.rfc2822.clone();
    out.text("pubDate", &pub_date)?;
    out.text("language", &feed.language)?;
    out.text("wp:wxr_version", WXR_VERSION)?;
    out.text("wp:base_site_url", &book.source_url)?;

    out.start("wp:term", &[])?;
    out.text("wp:term_id", "1")?;
    out.text("wp:term_taxonomy", CHAPTER_TAXONOMY)?;
    out.text("wp:term_slug", CHAPTER_TERM_SLUG)?;
    out.text("wp:term_name", CHAPTER_TERM_NAME)?;
    out.end("wp:term")?;

    for part in &book.parts {
        out.item(&part_fields(part, &book.source_url, &part.display_title()))?;
        for subsection in &part.subsections {
            out.item(&subsection_fields(subsection, part.id))?;
        }
    }

    out.end("channel")?;
    out.end("rss")?;

    let bytes = out.writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

fn part_fields<'a>(part: &'a Part, link: &'a str, title: &'a str) -> ItemFields<'a> {
    ItemFields {
        id: part.id,
        title,
        link,
        slug: &part.slug,
        content: "",
        parent: 0,
        order: part.order,
        post_type: "part",
        categorized: false,
    }
}

fn subsection_fields(subsection: &Subsection, part_id: u32) -> ItemFields<'_> {
    ItemFields {
        id: subsection.id,
        title: &subsection.title,
        link: &subsection.url,
        slug: &subsection.slug,
        content: &subsection.content,
        parent: part_id,
        order: subsection.order,
        post_type: "chapter",
        categorized: true,
    }
}

struct FeedWriter<'f> {
    writer: Writer<Cursor<Vec<u8>>>,
    feed: &'f FeedConfig,
    rfc2822: String,
    post_date: String,
}

impl<'f> FeedWriter<'f> {
    fn new(feed: &'f FeedConfig, published: DateTime<Utc>) -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
            feed,
            rfc2822: published.to_rfc2822(),
            post_date: published.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(start))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), ExportError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text(&mut self, name: &str, value: &str) -> Result<(), ExportError> {
        self.text_with(name, &[], value)
    }

    fn text_with(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        value: &str,
    ) -> Result<(), ExportError> {
        if value.is_empty() {
            let empty = BytesStart::new(name).with_attributes(attrs.iter().copied());
            self.writer.write_event(Event::Empty(empty))?;
            return Ok(());
        }
        self.start(name, attrs)?;
        self.writer.write_event(Event::Text(BytesText::new(value)))?;
        self.end(name)
    }

    /// Writes `value` as CDATA, splitting around any `]]>` it contains.
    /// Empty values still get an (empty) CDATA section.
    fn cdata(&mut self, name: &str, value: &str) -> Result<(), ExportError> {
        self.start(name, &[])?;
        let pieces: Vec<&str> = value.split("]]>").collect();
        let last = pieces.len() - 1;
        for (i, piece) in pieces.iter().enumerate() {
            let mut chunk = String::with_capacity(piece.len() + 3);
            if i > 0 {
                chunk.push('>');
            }
            chunk.push_str(piece);
            if i < last {
                chunk.push_str("]]");
            }
            self.writer
                .write_event(Event::CData(BytesCData::new(chunk.as_str())))?;
        }
        self.end(name)
    }

    fn item(&mut self, item: &ItemFields<'_>) -> Result<(), ExportError> {
        let id = item.id.to_string();
        let author = self.feed.author.clone();
        let rfc2822 = self.rfc2822.clone();
        let post_date = self.post_date.clone();

        self.start("item", &[])?;
        self.text("title", item.title)?;
        self.text("link", item.link)?;
        self.text("pubDate", &rfc2822)?;
        self.text("dc:creator", &author)?;
        self.text_with("guid", &[("isPermaLink", "false")], item.link)?;
        self.text("description", "")?;
        self.cdata("content:encoded", item.content)?;
        self.cdata("excerpt:encoded", "")?;
        self.text("wp:post_id", &id)?;
        self.text("wp:post_date", &post_date)?;
        self.text("wp:post_date_gmt", &post_date)?;
        self.text("wp:comment_status", "closed")?;
        self.text("wp:ping_status", "closed")?;
        self.text("wp:post_name", item.slug)?;
        self.text("wp:status", "publish")?;
        self.text("wp:post_parent", &item.parent.to_string())?;
        self.text("wp:menu_order", &item.order.to_string())?;
        self.text("wp:post_type", item.post_type)?;
        self.text("wp:post_password", "")?;
        self.text("wp:is_sticky", "0")?;
        if item.categorized {
            self.text_with(
                "category",
                &[("domain", CHAPTER_TAXONOMY), ("nicename", CHAPTER_TERM_SLUG)],
                CHAPTER_TERM_NAME,
            )?;
        }
        self.end("item")
    }
}
