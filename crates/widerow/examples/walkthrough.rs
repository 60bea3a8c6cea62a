//! End-to-end tour of the mapper against the in-memory store.
//!
//! Run with `cargo run --example walkthrough -p widerow`.

use widerow::store::{Direction, MemoryStore};
use widerow::{record, Bound, EnsureOptions, Mapper, WriteOptions};

record! {
    struct Article {
        "pk:author,hash table:articles" author: String,
        "pk:id,auto_inc" id: i64,
        "col:title" title: String,
        "col:views,atomic" views: i64,
        "prefix:tag_" tags: std::collections::HashMap<String, String>,
    }
}

#[tokio::main]
async fn main() -> widerow::Result<()> {
    tracing_subscriber::fmt::init();

    let mapper = Mapper::new(MemoryStore::new());
    mapper
        .ensure_table(&Article::default(), &EnsureOptions::new())
        .await?;

    // Write a few rows. The store assigns each `id`.
    for n in 1..=3 {
        let mut article = Article {
            author: "ada".to_string(),
            title: format!("post {n}"),
            ..Article::default()
        };
        article.tags.insert("lang".to_string(), "en".to_string());
        mapper.put_row(&mut article, &WriteOptions::new()).await?;
        println!("stored `{}` as id {}", article.title, article.id);
    }

    // Bump a counter without reading first.
    let mut first = Article {
        author: "ada".to_string(),
        ..Article::default()
    };
    // Range bounds take stored key values, so a hash-prefixed column needs
    // the same transform the writer applied.
    let author_key = widerow::keys::add_hash_prefix("ada");
    let mut rows = mapper.range::<Article>(
        &[Bound::value(author_key.as_str()), Bound::Min],
        &[Bound::value(author_key.as_str()), Bound::Max],
        Direction::Forward,
        1,
    )?;
    rows.next(&mut first).await?;

    let mut bump = Article {
        author: first.author.clone(),
        id: first.id,
        views: 10,
        ..Article::default()
    };
    mapper.update_row(&mut bump, &WriteOptions::new()).await?;
    println!("article {} now has {} views", bump.id, bump.views);

    // Scan everything back.
    let mut rows = mapper.range::<Article>(
        &[Bound::value(author_key.as_str()), Bound::Min],
        &[Bound::value(author_key.as_str()), Bound::Max],
        Direction::Forward,
        -1,
    )?;
    loop {
        let mut article = Article::default();
        if !rows.next(&mut article).await? {
            break;
        }
        println!(
            "id={} title={:?} views={} tags={:?}",
            article.id, article.title, article.views, article.tags
        );
    }

    mapper.delete_row(&first, &WriteOptions::new()).await?;
    println!("deleted article {}", first.id);

    Ok(())
}
