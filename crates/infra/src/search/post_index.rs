use std::path::Path;

use ss4r_core::domain::post::Post;
use ss4r_core::domain::search::SearchQuery;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{
    FAST, Field, IndexRecordOption, STORED, STRING, Schema, SchemaBuilder, TEXT, Value,
};
use tantivy::{DocAddress, Index, IndexReader, ReloadPolicy, Searcher, TantivyDocument, Term};
use thiserror::Error;
use tracing::debug;

use crate::render::html_to_text;
use crate::search::SearchSort;

const WRITER_HEAP_BYTES: usize = 50_000_000;

#[derive(Debug, Error)]
pub enum SearchIndexError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),
    #[error("missing field in schema: {0}")]
    MissingField(&'static str),
    #[error("missing stored value: {0}")]
    MissingValue(&'static str),
}

#[derive(Debug, Clone)]
struct PostFields {
    id: Field,
    title: Field,
    content: Field,
    subreddit: Field,
    kind: Field,
    position: Field,
}

/// Ids of matching posts, in result order, plus the total match count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexHits {
    pub total: usize,
    pub ids: Vec<String>,
}

pub struct PostIndex {
    index: Index,
    reader: IndexReader,
    fields: PostFields,
}

impl PostIndex {
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self, SearchIndexError> {
        let dir = path.as_ref();
        std::fs::create_dir_all(dir)?;

        let index = if dir.join("meta.json").exists() {
            Index::open_in_dir(dir)?
        } else {
            Index::create_in_dir(dir, build_schema())?
        };
        Self::from_index(index)
    }

    pub fn open_in_memory() -> Result<Self, SearchIndexError> {
        Self::from_index(Index::create_in_ram(build_schema()))
    }

    fn from_index(index: Index) -> Result<Self, SearchIndexError> {
        let schema = index.schema();
        let fields = PostFields::from_schema(&schema)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(Self {
            index,
            reader,
            fields,
        })
    }

    /// Replaces the indexed documents with `posts`.
    pub fn rebuild(&self, posts: &[Post]) -> Result<(), SearchIndexError> {
        let mut writer = self.index.writer::<TantivyDocument>(WRITER_HEAP_BYTES)?;
        writer.delete_all_documents()?;
        for (position, post) in posts.iter().enumerate() {
            writer.add_document(self.post_to_document(post, position))?;
        }
        writer.commit()?;
        self.reader.reload()?;
        debug!(documents = posts.len(), "post index rebuilt");
        Ok(())
    }

    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn search(
        &self,
        query: &SearchQuery,
        sort: SearchSort,
        limit: usize,
        offset: usize,
    ) -> Result<IndexHits, SearchIndexError> {
        let searcher = self.reader.searcher();
        let tantivy_query = build_query(&self.index, &self.fields, query);
        let total = searcher.search(&tantivy_query, &Count)?;
        if total == 0 || limit == 0 || offset >= total {
            return Ok(IndexHits {
                total,
                ids: Vec::new(),
            });
        }

        let ids = if query.has_keywords() && sort == SearchSort::Relevance {
            let docs = searcher.search(
                &tantivy_query,
                &TopDocs::with_limit(offset.saturating_add(limit).min(total)),
            )?;
            let mut ids = Vec::new();
            for (_, address) in docs.into_iter().skip(offset) {
                ids.push(self.stored_id(&searcher, address)?);
            }
            ids
        } else {
            let docs = searcher.search(&tantivy_query, &TopDocs::with_limit(total))?;
            let mut ordered = Vec::with_capacity(docs.len());
            for (_, address) in docs {
                let doc: TantivyDocument = searcher.doc(address)?;
                let id = get_string(&doc, self.fields.id)
                    .ok_or(SearchIndexError::MissingValue("id"))?;
                let position = doc
                    .get_first(self.fields.position)
                    .and_then(|value| value.as_i64())
                    .ok_or(SearchIndexError::MissingValue("position"))?;
                ordered.push((position, id));
            }
            ordered.sort_by_key(|(position, _)| *position);
            ordered
                .into_iter()
                .skip(offset)
                .take(limit)
                .map(|(_, id)| id)
                .collect()
        };

        Ok(IndexHits { total, ids })
    }

    fn stored_id(
        &self,
        searcher: &Searcher,
        address: DocAddress,
    ) -> Result<String, SearchIndexError> {
        let doc: TantivyDocument = searcher.doc(address)?;
        get_string(&doc, self.fields.id).ok_or(SearchIndexError::MissingValue("id"))
    }

    fn post_to_document(&self, post: &Post, position: usize) -> TantivyDocument {
        let mut document = TantivyDocument::default();
        document.add_text(self.fields.id, &post.id);
        document.add_text(self.fields.title, html_to_text(&post.title));
        if let Some(content) = &post.content {
            document.add_text(self.fields.content, html_to_text(content));
        }
        document.add_text(self.fields.subreddit, post.subreddit.to_ascii_lowercase());
        document.add_text(self.fields.kind, post.post_type.as_str());
        document.add_i64(self.fields.position, position as i64);
        document
    }
}

impl PostFields {
    fn from_schema(schema: &Schema) -> Result<Self, SearchIndexError> {
        let field = |name: &'static str| {
            schema
                .get_field(name)
                .map_err(|_| SearchIndexError::MissingField(name))
        };
        Ok(Self {
            id: field("id")?,
            title: field("title")?,
            content: field("content")?,
            subreddit: field("subreddit")?,
            kind: field("kind")?,
            position: field("position")?,
        })
    }
}

fn build_schema() -> Schema {
    let mut builder = SchemaBuilder::default();
    builder.add_text_field("id", STRING | STORED);
    builder.add_text_field("title", TEXT);
    builder.add_text_field("content", TEXT);
    builder.add_text_field("subreddit", STRING);
    builder.add_text_field("kind", STRING);
    builder.add_i64_field("position", STORED | FAST);
    builder.build()
}

fn build_query(index: &Index, fields: &PostFields, query: &SearchQuery) -> Box<dyn Query> {
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

    if query.has_keywords() {
        let mut parser = QueryParser::for_index(index, vec![fields.title, fields.content]);
        parser.set_conjunction_by_default();
        let query_str = query.keywords.join(" ");
        let (keyword_query, errors) = parser.parse_query_lenient(&query_str);
        if !errors.is_empty() {
            debug!(query = %query_str, errors = errors.len(), "lenient query parse dropped terms");
        }
        clauses.push((Occur::Must, keyword_query));
    }

    if let Some(subreddit) = &query.subreddit {
        let term = Term::from_field_text(fields.subreddit, &subreddit.to_ascii_lowercase());
        clauses.push((
            Occur::Must,
            Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
        ));
    }

    if let Some(post_type) = query.post_type {
        let term = Term::from_field_text(fields.kind, post_type.as_str());
        clauses.push((
            Occur::Must,
            Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
        ));
    }

    if clauses.is_empty() {
        Box::new(AllQuery)
    } else {
        Box::new(BooleanQuery::from(clauses))
    }
}

fn get_string(doc: &TantivyDocument, field: Field) -> Option<String> {
    doc.get_first(field)?.as_str().map(|val| val.to_string())
}
